//! Loading of rig assets: skeleton files, attachment weights and
//! Wavefront OBJ surface meshes.
//!
//! The skeleton and weight formats are whitespace-separated number
//! streams with no framing. Parsing is deliberately permissive and
//! stops at the first token that fails to parse, treating everything
//! up to that point as the payload; a trailing comment or junk line
//! therefore terminates the stream instead of failing the load.

use std::{fs, io, path};

use mint;
use obj;

use geometry::Geometry;
use rig::Rig;
use skeleton::JointRecord;
use skinning::Weights;

fn read_file_to_string<P: AsRef<path::Path>>(path: P) -> io::Result<String> {
    use self::io::Read;
    let file = fs::File::open(path)?;
    let len = file.metadata()?.len() as usize;
    let mut contents = String::with_capacity(len);
    let _ = io::BufReader::new(file).read_to_string(&mut contents)?;
    Ok(contents)
}

quick_error! {
    #[doc = "Error loading a rig asset from disk."]
    #[derive(Debug)]
    pub enum Error {
        #[doc = "Standard I/O error."]
        Io(err: io::Error) {
            from()
            description("I/O error")
            display("I/O error")
            cause(err)
        }

        #[doc = "Wavefront OBJ parsing error."]
        Obj(err: obj::ObjError) {
            from()
            description("OBJ parsing error")
            display("OBJ parsing error")
            cause(err)
        }
    }
}

/// Parse skeleton records from a whitespace-separated token stream.
///
/// Each record is four tokens: the x, y, z offset from the parent and
/// the parent index (`-1` for the root). Reading stops at the first
/// token that is not a number and at the first incomplete record.
pub fn parse_skeleton(source: &str) -> Vec<JointRecord> {
    let mut records = Vec::new();
    let mut tokens = source.split_whitespace();
    loop {
        let mut coords = [0.0f32; 3];
        let mut complete = true;
        for c in coords.iter_mut() {
            match tokens.next().and_then(|t| t.parse().ok()) {
                Some(value) => *c = value,
                None => {
                    complete = false;
                    break;
                }
            }
        }
        if !complete {
            break;
        }
        let parent: i32 = match tokens.next().and_then(|t| t.parse().ok()) {
            Some(value) => value,
            None => break,
        };
        records.push(JointRecord {
            position: mint::Point3 {
                x: coords[0],
                y: coords[1],
                z: coords[2],
            },
            parent,
        });
    }
    records
}

/// Read and parse a skeleton file.
pub fn load_skeleton<P: AsRef<path::Path>>(path: P) -> Result<Vec<JointRecord>, Error> {
    let contents = read_file_to_string(path)?;
    let records = parse_skeleton(&contents);
    info!("loaded {} joints", records.len());
    Ok(records)
}

/// Parse attachment weights from a whitespace-separated float stream.
///
/// The stream is chunked into rows of `influences` scalars, one row per
/// vertex; reading stops at the first non-numeric token and any
/// incomplete trailing row is dropped.
pub fn parse_weights(source: &str, influences: usize) -> Weights {
    let values: Vec<f32> = source
        .split_whitespace()
        .map(|t| t.parse::<f32>())
        .take_while(Result::is_ok)
        .filter_map(Result::ok)
        .collect();
    Weights::from_flat(&values, influences)
}

/// Read and parse an attachment weight file.
pub fn load_weights<P: AsRef<path::Path>>(path: P, influences: usize) -> Result<Weights, Error> {
    let contents = read_file_to_string(path)?;
    Ok(parse_weights(&contents, influences))
}

/// Load the surface mesh from a Wavefront OBJ file.
///
/// Only positions and face indices are taken; normals are recomputed
/// from the triangles once the rig assembles. Polygons with more than
/// three corners are fan-triangulated around their first corner.
pub fn load_obj<P: AsRef<path::Path>>(path: P) -> Result<Geometry, Error> {
    let obj = obj::Obj::load(path.as_ref())?;
    let vertices = obj
        .data
        .position
        .iter()
        .map(|p| mint::Point3 {
            x: p[0],
            y: p[1],
            z: p[2],
        })
        .collect();

    let mut faces = Vec::new();
    for object in &obj.data.objects {
        for group in &object.groups {
            for poly in &group.polys {
                let corners = &poly.0;
                for i in 2 .. corners.len() {
                    faces.push([
                        corners[0].0 as u32,
                        corners[i - 1].0 as u32,
                        corners[i].0 as u32,
                    ]);
                }
            }
        }
    }

    Ok(Geometry {
        vertices,
        normals: Vec::new(),
        faces,
    })
}

/// Load a complete rig from `<prefix>.skel`, `<prefix>.obj` and
/// `<prefix>.attach`.
///
/// The weight row width is derived from the skeleton: one column per
/// joint, the root excluded. A weight table shorter than the vertex
/// count is accepted and leaves the uncovered tail of the mesh at bind
/// pose.
pub fn load_rig<P: AsRef<path::Path>>(prefix: P) -> Result<Rig, Error> {
    let prefix = prefix.as_ref();
    let records = load_skeleton(prefix.with_extension("skel"))?;
    let geometry = load_obj(prefix.with_extension("obj"))?;
    let influences = records.len().saturating_sub(1);
    let weights = load_weights(prefix.with_extension("attach"), influences)?;
    if weights.len() < geometry.vertices.len() {
        warn!(
            "weight table covers {} of {} vertices",
            weights.len(),
            geometry.vertices.len(),
        );
    }
    Ok(Rig::new(&records, geometry, weights))
}
