//! Skeleton-driven character rig.
//!
//! `armature` implements the host-side core of an articulated character
//! model: a joint hierarchy built from a flat parent-index list, linear
//! blend skinning of a bind-pose surface mesh, and ray-cast picking of
//! on-screen rotation handles ("gizmos") for posing individual joints.
//!
//! Rendering, windowing and GUI widgets are deliberately out of scope.
//! The crate exposes a [`Rig`](rig/struct.Rig.html) whose deformed
//! geometry is replaced wholesale after every pose change, and a
//! [`Picker`](picking/struct.Picker.html) that is fed a per-frame
//! [`Input`](input/struct.Input.html) snapshot by the windowing layer.

extern crate cgmath;
extern crate genmesh;
#[macro_use]
extern crate log;
extern crate mint;
extern crate obj;
#[macro_use]
extern crate quick_error;

pub mod camera;
pub mod geometry;
pub mod input;
pub mod loader;
pub mod picking;
pub mod rig;
pub mod skeleton;
pub mod skinning;

pub use camera::{Orthographic, Perspective, Projection};
pub use geometry::{Adjacency, Geometry};
pub use input::{Button, Input, Key, MouseButton, KEY_ESCAPE, MOUSE_LEFT};
pub use loader::Error;
pub use picking::{Axis, Picker, PickState, Ray, RootFormula};
pub use rig::{DrawMode, Rig};
pub use skeleton::{JointRecord, Pose, Skeleton};
pub use skinning::{Skinner, Weights};

/// A point in world space.
pub type Position = cgmath::Point3<f32>;
/// A displacement in world space.
pub type Vector = cgmath::Vector3<f32>;
/// A surface normal.
pub type Normal = cgmath::Vector3<f32>;
/// A rotation.
pub type Orientation = cgmath::Quaternion<f32>;
/// A rigid transform: rotation followed by translation.
pub type Transform = cgmath::Decomposed<Vector, Orientation>;
