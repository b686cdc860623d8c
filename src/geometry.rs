//! Surface geometry: bind-pose meshes, adjacency and vertex normals.

use genmesh::generators::{self, IndexedPolygon, SharedVertex};
use genmesh::{EmitTriangles, Triangulate, Vertex as GenVertex};
use cgmath::{InnerSpace, Point3, Vector3};
use mint;

/// Radius of the bone cylinder visuals connecting parent and child
/// joints; the cylinder height is scaled to the bone length.
pub const BONE_RADIUS: f32 = 0.015;

/// A collection of vertices, their normals, and the triangles that
/// define the shape of a polyhedral object.
///
/// Position and normal arrays are replaced, never appended, after each
/// deformation pass; a render collaborator is expected to re-upload
/// them wholesale.
#[derive(Clone, Debug)]
pub struct Geometry {
    /// Vertex positions.
    pub vertices: Vec<mint::Point3<f32>>,
    /// Per-vertex normals, parallel to `vertices`.
    pub normals: Vec<mint::Vector3<f32>>,
    /// Triangle index triples.
    pub faces: Vec<[u32; 3]>,
}

impl Geometry {
    /// Create new `Geometry` without any data in it.
    pub fn empty() -> Self {
        Geometry {
            vertices: Vec::new(),
            normals: Vec::new(),
            faces: Vec::new(),
        }
    }

    /// Create `Geometry` from a vector of vertices.
    pub fn with_vertices(vertices: Vec<mint::Point3<f32>>) -> Self {
        Geometry {
            vertices,
            .. Geometry::empty()
        }
    }

    fn generate<P, G, Fpos, Fnor>(gen: G, fpos: Fpos, fnor: Fnor) -> Self
    where
        P: EmitTriangles<Vertex = usize>,
        G: IndexedPolygon<P> + SharedVertex<GenVertex>,
        Fpos: Fn(GenVertex) -> mint::Point3<f32>,
        Fnor: Fn(GenVertex) -> mint::Vector3<f32>,
    {
        Geometry {
            vertices: gen.shared_vertex_iter().map(fpos).collect(),
            normals: gen.shared_vertex_iter().map(fnor).collect(),
            faces: gen.indexed_polygon_iter()
                .triangulate()
                .map(|t| [t.x as u32, t.y as u32, t.z as u32])
                .collect(),
        }
    }

    /// Create a new sphere with the desired radius and segment counts.
    ///
    /// Used for the joint proxy and gizmo handle visuals.
    pub fn sphere(radius: f32, width_segments: usize, height_segments: usize) -> Self {
        Self::generate(
            generators::SphereUv::new(width_segments, height_segments),
            |GenVertex { pos, .. }| [pos.x * radius, pos.y * radius, pos.z * radius].into(),
            |v| v.normal.into(),
        )
    }

    /// Create a new cylinder with the desired radius, height and
    /// number of radial segments, axis along Y.
    ///
    /// Used for the bone visuals connecting a joint to its children.
    pub fn cylinder(radius: f32, height: f32, radius_segments: usize) -> Self {
        Self::generate(
            generators::Cylinder::new(radius_segments),
            // Height along the Y axis, matching the bone convention.
            |GenVertex { pos, .. }| {
                [pos.y * radius, pos.z * 0.5 * height, pos.x * radius].into()
            },
            |GenVertex { normal, .. }| [normal.y, normal.z, normal.x].into(),
        )
    }

    /// Recompute per-vertex normals from the current positions.
    pub fn recompute_normals(&mut self, adjacency: &Adjacency) {
        self.normals = vertex_normals(&self.vertices, &self.faces, adjacency);
    }
}

/// Table mapping each vertex to the triangles incident on it.
///
/// Built once after mesh load and reused every frame: skinning only
/// moves positions, never changes topology.
#[derive(Clone, Debug)]
pub struct Adjacency {
    incident: Vec<Vec<usize>>,
}

impl Adjacency {
    /// Scan all triangles and record, per vertex, those containing it.
    pub fn new(vertex_count: usize, faces: &[[u32; 3]]) -> Self {
        let mut incident = vec![Vec::new(); vertex_count];
        for (t, face) in faces.iter().enumerate() {
            for k in 0 .. 3 {
                let v = face[k] as usize;
                // A degenerate triangle still counts only once.
                if face[.. k].iter().any(|&c| c as usize == v) {
                    continue;
                }
                if v < vertex_count {
                    incident[v].push(t);
                }
            }
        }
        Adjacency { incident }
    }

    /// Triangles incident on vertex `v`, in face order.
    pub fn incident(&self, v: usize) -> &[usize] {
        match self.incident.get(v) {
            Some(list) => list,
            None => &[],
        }
    }

    /// Number of vertices covered by the table.
    pub fn len(&self) -> usize {
        self.incident.len()
    }

    /// Whether the table covers no vertices.
    pub fn is_empty(&self) -> bool {
        self.incident.is_empty()
    }
}

/// Smooth area-weighted vertex normals.
///
/// For every vertex, the normalized face normal of each incident
/// triangle is accumulated, weighted by that triangle's area (half the
/// magnitude of the edge cross product), and the sum is normalized.
/// A vertex with no incident triangles keeps a zero normal.
pub fn vertex_normals(
    vertices: &[mint::Point3<f32>],
    faces: &[[u32; 3]],
    adjacency: &Adjacency,
) -> Vec<mint::Vector3<f32>> {
    (0 .. vertices.len())
        .map(|v| {
            let mut sum = Vector3::new(0.0, 0.0, 0.0);
            for &t in adjacency.incident(v) {
                let face = faces[t];
                let a = Point3::from(vertices[face[0] as usize]);
                let b = Point3::from(vertices[face[1] as usize]);
                let c = Point3::from(vertices[face[2] as usize]);
                let cross = (b - a).cross(c - a);
                let magnitude = cross.magnitude();
                if magnitude > 0.0 {
                    let area = magnitude / 2.0;
                    sum += (cross / magnitude) * area;
                }
            }
            let magnitude = sum.magnitude();
            if magnitude > 0.0 {
                (sum / magnitude).into()
            } else {
                [0.0, 0.0, 0.0].into()
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use cgmath::{InnerSpace, Vector3};
    use super::{Adjacency, Geometry};

    fn flat_triangle() -> Geometry {
        Geometry {
            vertices: vec![
                [0.0, 0.0, 0.0].into(),
                [1.0, 0.0, 0.0].into(),
                [0.0, 1.0, 0.0].into(),
            ],
            normals: Vec::new(),
            faces: vec![[0, 1, 2]],
        }
    }

    #[test]
    fn lone_triangle_normals_match_face_normal() {
        let mut geometry = flat_triangle();
        let adjacency = Adjacency::new(geometry.vertices.len(), &geometry.faces);
        geometry.recompute_normals(&adjacency);
        for normal in &geometry.normals {
            let n = Vector3::from(*normal);
            assert!((n - Vector3::unit_z()).magnitude() < 1e-6);
        }
    }

    #[test]
    fn cyclic_vertex_order_keeps_the_same_normal() {
        let mut geometry = flat_triangle();
        geometry.faces = vec![[1, 2, 0]];
        let adjacency = Adjacency::new(geometry.vertices.len(), &geometry.faces);
        geometry.recompute_normals(&adjacency);
        for normal in &geometry.normals {
            let n = Vector3::from(*normal);
            assert!((n - Vector3::unit_z()).magnitude() < 1e-6);
        }
    }

    #[test]
    fn adjacency_lists_every_incident_triangle() {
        let faces = vec![[0, 1, 2], [0, 2, 3]];
        let adjacency = Adjacency::new(4, &faces);
        assert_eq!(adjacency.incident(0), &[0, 1]);
        assert_eq!(adjacency.incident(1), &[0]);
        assert_eq!(adjacency.incident(2), &[0, 1]);
        assert_eq!(adjacency.incident(3), &[1]);
        assert!(adjacency.incident(9).is_empty());
    }

    #[test]
    fn sphere_vertices_sit_on_the_radius() {
        let geometry = Geometry::sphere(0.025, 8, 8);
        assert!(!geometry.vertices.is_empty());
        assert!(!geometry.faces.is_empty());
        for vertex in &geometry.vertices {
            let r = Vector3::new(vertex.x, vertex.y, vertex.z).magnitude();
            assert!((r - 0.025).abs() < 1e-5, "off-sphere vertex radius {}", r);
        }
    }

    #[test]
    fn cylinder_spans_the_requested_height() {
        let geometry = Geometry::cylinder(0.015, 1.0, 12);
        let mut min_y = ::std::f32::MAX;
        let mut max_y = ::std::f32::MIN;
        for vertex in &geometry.vertices {
            min_y = min_y.min(vertex.y);
            max_y = max_y.max(vertex.y);
        }
        assert!((min_y + 0.5).abs() < 1e-5);
        assert!((max_y - 0.5).abs() < 1e-5);
    }
}
