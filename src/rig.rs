//! The composite character rig.
//!
//! A [`Rig`](struct.Rig.html) owns the skeleton, the bind-pose
//! geometry, the weight table and the matrix palette, and drives the
//! forward-kinematics + skinning pass whenever the pose changes. The
//! two pose entry points encode the update protocol: slider input
//! overwrites every joint rotation wholesale, while gizmo input applies
//! an incremental rotation and leaves the other joints alone, so a
//! gizmo-posed joint is never reverted by stale slider values.

use cgmath::{Euler, Matrix4, Quaternion, Rad, Transform as Transform_};
use mint;

use geometry::{Adjacency, Geometry};
use picking::{self, Axis, HANDLE_OFFSET};
use skeleton::{JointRecord, Pose, Skeleton};
use skinning::{Skinner, Weights};
use Position;

/// What the render collaborator should draw.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum DrawMode {
    /// Joint spheres and bone cylinders.
    Skeleton,
    /// The deformed surface mesh.
    Skinned,
}

/// An articulated character: skeleton, bind-pose mesh and skin weights.
#[derive(Debug)]
pub struct Rig {
    skeleton: Skeleton,
    pose: Pose,
    weights: Weights,
    bind: Geometry,
    adjacency: Adjacency,
    skinned: Geometry,
    skinner: Skinner,
    draw_mode: DrawMode,
}

impl Rig {
    /// Assemble a rig from loaded parts and run the initial
    /// deformation pass.
    ///
    /// The skeleton must be in its rest configuration: the bind-pose
    /// inverses are captured here, once, and never again.
    pub fn new(records: &[JointRecord], mut geometry: Geometry, weights: Weights) -> Self {
        let skeleton = Skeleton::new(records);
        let adjacency = Adjacency::new(geometry.vertices.len(), &geometry.faces);
        geometry.recompute_normals(&adjacency);
        let pose = Pose::bind(&skeleton);
        let skinned = geometry.clone();
        let mut rig = Rig {
            skeleton,
            pose,
            weights,
            bind: geometry,
            adjacency,
            skinned,
            skinner: Skinner::new(),
            draw_mode: DrawMode::Skeleton,
        };
        // Force the initial update.
        rig.refresh();
        rig
    }

    /// The joint hierarchy.
    pub fn skeleton(&self) -> &Skeleton {
        &self.skeleton
    }

    /// Number of joints, the root included.
    pub fn joint_count(&self) -> usize {
        self.skeleton.len()
    }

    /// The deformed mesh. Position and normal arrays are replaced
    /// wholesale after every pose change; upload, don't diff.
    pub fn skinned(&self) -> &Geometry {
        &self.skinned
    }

    /// The rest-pose mesh.
    pub fn bind(&self) -> &Geometry {
        &self.bind
    }

    /// What the renderer should currently draw.
    pub fn draw_mode(&self) -> DrawMode {
        self.draw_mode
    }

    /// Switch between skeleton decorations and the skinned surface.
    pub fn toggle_draw_mode(&mut self) {
        self.draw_mode = match self.draw_mode {
            DrawMode::Skeleton => DrawMode::Skinned,
            DrawMode::Skinned => DrawMode::Skeleton,
        };
        debug!("rig: draw mode {:?}", self.draw_mode);
    }

    /// Overwrite every joint's rotation from an ordered list of Euler
    /// triples (radians, aligned with skeleton-file order), then rerun
    /// forward kinematics and skinning.
    ///
    /// This is the slider path: entries beyond the joint count are
    /// ignored, joints beyond the list keep their rotation.
    pub fn set_pose(&mut self, angles: &[mint::Vector3<f32>]) {
        for (index, a) in angles.iter().enumerate().take(self.skeleton.len()) {
            let q = Quaternion::from(Euler::new(Rad(a.x), Rad(a.y), Rad(a.z)));
            self.skeleton.set_orientation(index, q);
        }
        self.refresh();
    }

    /// Apply an incremental gizmo rotation of `angle` radians about the
    /// joint's local `axis` mapped into world space, then rerun forward
    /// kinematics and skinning.
    ///
    /// Unlike [`set_pose`](#method.set_pose), no other joint is
    /// touched. Out-of-range joints are a no-op.
    pub fn rotate_joint(&mut self, joint: usize, axis: Axis, angle: f32) {
        let world = match self.skeleton.world_transform(joint) {
            Some(tf) => Matrix4::from(tf),
            None => return,
        };
        if let Some(rotation) = picking::axis_rotation(world, axis, angle) {
            self.skeleton.pre_rotate(joint, rotation);
            self.refresh();
        }
    }

    /// World-space centers of the joint proxy spheres, index-aligned
    /// with the skeleton.
    pub fn joint_proxies(&self) -> Vec<mint::Point3<f32>> {
        (0 .. self.skeleton.len())
            .filter_map(|j| self.skeleton.world_position(j))
            .collect()
    }

    /// World-space centers of the three axis-handle spheres of a
    /// joint, in [`Axis::ALL`](../picking/enum.Axis.html) order.
    pub fn handle_proxies(&self, joint: usize) -> Option<[mint::Point3<f32>; 3]> {
        let world = self.skeleton.world_transform(joint)?;
        let mut handles = [mint::Point3 { x: 0.0, y: 0.0, z: 0.0 }; 3];
        for (slot, axis) in handles.iter_mut().zip(Axis::ALL.iter()) {
            let offset = axis.unit() * HANDLE_OFFSET;
            let p = world.transform_point(Position::new(offset.x, offset.y, offset.z));
            *slot = mint::Point3 { x: p.x, y: p.y, z: p.z };
        }
        Some(handles)
    }

    /// Recompute the matrix palette and the deformed mesh.
    fn refresh(&mut self) {
        self.pose.update(&self.skeleton);
        self.skinner.deform(
            &self.bind,
            &self.weights,
            &self.pose,
            &self.adjacency,
            &mut self.skinned,
        );
    }
}
