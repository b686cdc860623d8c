//! Joint hierarchy and forward kinematics.
//!
//! A [`Skeleton`](struct.Skeleton.html) owns an arena of joints indexed
//! by small integers; parent/child linkage is stored as indices into
//! the arena, so nothing else in the crate ever holds a reference into
//! the tree. A [`Pose`](struct.Pose.html) carries the per-joint matrix
//! palette consumed by the skinning pass: the current world transforms,
//! recomputed unconditionally on every change, and the bind-pose
//! inverses, captured exactly once at load time.

use cgmath::{Matrix4, Quaternion, SquareMatrix, Transform as Transform_};
use mint;

use {Orientation, Transform, Vector};

/// A single joint record as read from a skeleton description file.
///
/// Record order defines the joint index; a `parent` of `-1` denotes
/// the root.
#[derive(Clone, Copy, Debug)]
pub struct JointRecord {
    /// Position relative to the parent joint.
    pub position: mint::Point3<f32>,
    /// Index of the parent record, or `-1` for the root.
    pub parent: i32,
}

#[derive(Clone, Debug)]
struct Joint {
    parent: Option<usize>,
    children: Vec<usize>,
    position: Vector,
    orientation: Orientation,
}

impl Joint {
    fn local_transform(&self) -> Transform {
        Transform {
            disp: self.position,
            rot: self.orientation,
            scale: 1.0,
        }
    }
}

/// Arena of joints built from a flat parent-index list.
///
/// Joints are created once at construction and mutated in place, either
/// by wholesale Euler-angle updates from a UI collaborator or by
/// incremental gizmo rotations. Operations on out-of-range indices are
/// silent no-ops.
#[derive(Clone, Debug)]
pub struct Skeleton {
    joints: Vec<Joint>,
}

impl Skeleton {
    /// Build the joint arena from skeleton-file records.
    ///
    /// Children are attached in record order, so traversal order is
    /// stable and deterministic.
    pub fn new(records: &[JointRecord]) -> Self {
        let mut joints: Vec<Joint> = records
            .iter()
            .map(|r| Joint {
                parent: if r.parent < 0 { None } else { Some(r.parent as usize) },
                children: Vec::new(),
                position: Vector::new(r.position.x, r.position.y, r.position.z),
                orientation: Quaternion::new(1.0, 0.0, 0.0, 0.0),
            })
            .collect();
        for index in 0 .. joints.len() {
            match joints[index].parent {
                Some(parent) if parent < joints.len() => {
                    joints[parent].children.push(index);
                }
                _ => {}
            }
        }
        Skeleton { joints }
    }

    /// Number of joints, the root included.
    pub fn len(&self) -> usize {
        self.joints.len()
    }

    /// Whether the skeleton holds no joints at all.
    pub fn is_empty(&self) -> bool {
        self.joints.is_empty()
    }

    /// Parent of a joint. `None` for the root or an out-of-range index.
    pub fn parent(&self, index: usize) -> Option<usize> {
        self.joints.get(index).and_then(|j| j.parent)
    }

    /// Children of a joint, in record order.
    pub fn children(&self, index: usize) -> &[usize] {
        match self.joints.get(index) {
            Some(joint) => &joint.children,
            None => &[],
        }
    }

    /// Position of a joint relative to its parent.
    pub fn local_position(&self, index: usize) -> Option<mint::Point3<f32>> {
        self.joints.get(index).map(|j| {
            mint::Point3 {
                x: j.position.x,
                y: j.position.y,
                z: j.position.z,
            }
        })
    }

    /// Local orientation of a joint.
    pub fn orientation(&self, index: usize) -> Option<mint::Quaternion<f32>> {
        self.joints.get(index).map(|j| j.orientation.into())
    }

    /// Overwrite the local orientation of a joint.
    pub fn set_orientation<Q>(
        &mut self,
        index: usize,
        orientation: Q,
    ) where
        Q: Into<mint::Quaternion<f32>>,
    {
        if let Some(joint) = self.joints.get_mut(index) {
            joint.orientation = orientation.into().into();
        }
    }

    /// Pre-multiply an incremental rotation onto a joint's orientation.
    ///
    /// Used by the gizmo drag: `new = rotation * old`.
    pub fn pre_rotate<Q>(
        &mut self,
        index: usize,
        rotation: Q,
    ) where
        Q: Into<mint::Quaternion<f32>>,
    {
        if let Some(joint) = self.joints.get_mut(index) {
            let rotation: Orientation = rotation.into().into();
            joint.orientation = rotation * joint.orientation;
        }
    }

    /// World transform of a joint: the product of local transforms
    /// along the ancestor chain, root innermost.
    pub fn world_transform(&self, index: usize) -> Option<Transform> {
        let joint = self.joints.get(index)?;
        let mut transform = joint.local_transform();
        let mut parent = joint.parent;
        while let Some(up) = parent {
            let ancestor = &self.joints[up];
            transform = ancestor.local_transform().concat(&transform);
            parent = ancestor.parent;
        }
        Some(transform)
    }

    /// World-space position of a joint's origin.
    pub fn world_position(&self, index: usize) -> Option<mint::Point3<f32>> {
        self.world_transform(index).map(|tf| {
            mint::Point3 {
                x: tf.disp.x,
                y: tf.disp.y,
                z: tf.disp.z,
            }
        })
    }
}

/// Matrix palette for skinning.
///
/// Joint index space here excludes the root: slot `j` maps to joint
/// `j + 1`, consistent with the weight table, which carries
/// `joint_count - 1` columns.
#[derive(Clone, Debug)]
pub struct Pose {
    current: Vec<Matrix4<f32>>,
    inverse_bind: Vec<Matrix4<f32>>,
}

impl Pose {
    /// Capture the bind pose of a freshly loaded skeleton.
    ///
    /// The inverse-bind transforms computed here are never recomputed;
    /// the skeleton must still be in its rest configuration.
    pub fn bind(skeleton: &Skeleton) -> Self {
        let current = Pose::palette(skeleton);
        let inverse_bind = current
            .iter()
            .map(|m| m.invert().unwrap_or_else(Matrix4::identity))
            .collect();
        Pose { current, inverse_bind }
    }

    fn palette(skeleton: &Skeleton) -> Vec<Matrix4<f32>> {
        (1 .. skeleton.len())
            .map(|j| {
                skeleton
                    .world_transform(j)
                    .map(Matrix4::from)
                    .unwrap_or_else(Matrix4::identity)
            })
            .collect()
    }

    /// Recompute every current world transform from the present local
    /// rotations. Full and unconditional: no dirty tracking, which is
    /// acceptable at tens of joints.
    pub fn update(&mut self, skeleton: &Skeleton) {
        self.current = Pose::palette(skeleton);
    }

    /// Number of deforming joints (the root excluded).
    pub fn joint_count(&self) -> usize {
        self.current.len()
    }

    /// Current world transform of deforming joint `j` (joint `j + 1`).
    pub fn current(&self, j: usize) -> Matrix4<f32> {
        self.current[j]
    }

    /// Bind-pose inverse of deforming joint `j` (joint `j + 1`).
    pub fn inverse_bind(&self, j: usize) -> Matrix4<f32> {
        self.inverse_bind[j]
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{InnerSpace, Point3, Quaternion, Rad, Rotation3, Transform as Transform_, Vector3};
    use super::{JointRecord, Pose, Skeleton};

    fn record(x: f32, y: f32, z: f32, parent: i32) -> JointRecord {
        JointRecord {
            position: [x, y, z].into(),
            parent,
        }
    }

    fn two_joint_chain() -> Skeleton {
        Skeleton::new(&[record(0.0, 0.0, 0.0, -1), record(1.0, 2.0, 3.0, 0)])
    }

    #[test]
    fn child_world_translation_equals_offset() {
        let skeleton = two_joint_chain();
        let world = skeleton.world_transform(1).unwrap();
        assert!((world.disp - Vector3::new(1.0, 2.0, 3.0)).magnitude() < 1e-6);
    }

    #[test]
    fn rotated_root_moves_child_rigidly() {
        let mut skeleton = two_joint_chain();
        // 90 degrees about Z maps (1, 2, 3) to (-2, 1, 3).
        let quarter = Quaternion::from_angle_z(Rad(::std::f32::consts::FRAC_PI_2));
        skeleton.set_orientation(0, quarter);
        let world = skeleton.world_transform(1).unwrap();
        assert!((world.disp - Vector3::new(-2.0, 1.0, 3.0)).magnitude() < 1e-5);
    }

    #[test]
    fn children_attach_in_record_order() {
        let skeleton = Skeleton::new(&[
            record(0.0, 0.0, 0.0, -1),
            record(1.0, 0.0, 0.0, 0),
            record(0.0, 1.0, 0.0, 0),
            record(0.0, 0.0, 1.0, 1),
        ]);
        assert_eq!(skeleton.children(0), &[1, 2]);
        assert_eq!(skeleton.children(1), &[3]);
        assert_eq!(skeleton.parent(3), Some(1));
        assert_eq!(skeleton.parent(0), None);
    }

    #[test]
    fn out_of_range_operations_are_no_ops() {
        let mut skeleton = two_joint_chain();
        skeleton.set_orientation(9, Quaternion::from_angle_x(Rad(1.0)));
        skeleton.pre_rotate(9, Quaternion::from_angle_x(Rad(1.0)));
        assert!(skeleton.world_transform(9).is_none());
        assert!(skeleton.world_position(9).is_none());
        // The valid joints are untouched.
        let world = skeleton.world_transform(1).unwrap();
        assert!((world.disp - Vector3::new(1.0, 2.0, 3.0)).magnitude() < 1e-6);
    }

    #[test]
    fn pose_excludes_root_and_inverts_bind() {
        let skeleton = two_joint_chain();
        let pose = Pose::bind(&skeleton);
        assert_eq!(pose.joint_count(), 1);
        // T * B is the identity while the skeleton stays in bind pose.
        let round_trip = pose.current(0) * pose.inverse_bind(0);
        let p = round_trip.transform_point(Point3::new(0.5, -0.5, 2.0));
        assert!((p - Point3::new(0.5, -0.5, 2.0)).magnitude() < 1e-5);
    }

    #[test]
    fn update_tracks_new_rotations() {
        let mut skeleton = two_joint_chain();
        let mut pose = Pose::bind(&skeleton);
        skeleton.set_orientation(0, Quaternion::from_angle_z(Rad(::std::f32::consts::FRAC_PI_2)));
        pose.update(&skeleton);
        let moved = pose.current(0).transform_point(Point3::new(0.0, 0.0, 0.0));
        assert!((moved - Point3::new(-2.0, 1.0, 3.0)).magnitude() < 1e-5);
    }
}
