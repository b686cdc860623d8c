//! Load a rig from `<prefix>.skel` / `.obj` / `.attach`, bend one
//! joint with the gizmo path and print the deformed mesh bounds.
//!
//! ```text
//! cargo run --example pose -- assets/model 1
//! ```

extern crate armature;
extern crate env_logger;

use std::env;
use std::f32::consts::FRAC_PI_4;

use armature::{Axis, Geometry};

fn bounds(geometry: &Geometry) -> ([f32; 3], [f32; 3]) {
    let mut min = [::std::f32::MAX; 3];
    let mut max = [::std::f32::MIN; 3];
    for v in &geometry.vertices {
        for (axis, &value) in [v.x, v.y, v.z].iter().enumerate() {
            min[axis] = min[axis].min(value);
            max[axis] = max[axis].max(value);
        }
    }
    (min, max)
}

fn main() {
    env_logger::init();

    let mut args = env::args().skip(1);
    let prefix = args.next().unwrap_or_else(|| "assets/model".to_string());
    let joint: usize = args
        .next()
        .and_then(|a| a.parse().ok())
        .unwrap_or(1);

    let mut rig = armature::loader::load_rig(&prefix)
        .unwrap_or_else(|e| panic!("failed to load {}.*: {}", prefix, e));
    println!(
        "{}: {} joints, {} vertices, {} faces",
        prefix,
        rig.joint_count(),
        rig.skinned().vertices.len(),
        rig.skinned().faces.len(),
    );

    let (min, max) = bounds(rig.skinned());
    println!("bind bounds: {:?} .. {:?}", min, max);

    rig.rotate_joint(joint, Axis::Z, FRAC_PI_4);
    let (min, max) = bounds(rig.skinned());
    println!("posed bounds: {:?} .. {:?}", min, max);
}
