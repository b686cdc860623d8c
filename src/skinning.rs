//! Linear blend skinning.

use cgmath::{Matrix4, Vector4};
use mint;

use geometry::{Adjacency, Geometry};
use skeleton::Pose;

/// Dense per-vertex, per-joint attachment weights.
///
/// The root joint carries no deformation influence of its own and is
/// excluded: each row holds `joint_count - 1` scalars, column `j`
/// matching joint `j + 1`. Rows are kept exactly as loaded; the legacy
/// file format never guarantees they sum to 1, and
/// [`normalize`](#method.normalize) is opt-in.
#[derive(Clone, Debug)]
pub struct Weights {
    rows: Vec<Vec<f32>>,
    influences: usize,
}

impl Weights {
    /// Chunk a flat float stream into weight rows, one per vertex.
    ///
    /// A trailing chunk shorter than `influences` is dropped, matching
    /// the permissive legacy loader.
    pub fn from_flat(values: &[f32], influences: usize) -> Self {
        let rows = if influences == 0 {
            Vec::new()
        } else {
            values
                .chunks(influences)
                .filter(|chunk| chunk.len() == influences)
                .map(|chunk| chunk.to_vec())
                .collect()
        };
        Weights { rows, influences }
    }

    /// Weight rows in vertex order.
    pub fn rows(&self) -> &[Vec<f32>] {
        &self.rows
    }

    /// Number of complete rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table holds no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of deforming joints each row covers.
    pub fn influences(&self) -> usize {
        self.influences
    }

    /// Rescale every row to sum to 1.
    ///
    /// Restores the affine-blend invariant for files that ship
    /// non-normalized weights. Rows summing to zero are left alone.
    pub fn normalize(&mut self) {
        for row in &mut self.rows {
            let total: f32 = row.iter().sum();
            if total > 0.0 {
                for w in row.iter_mut() {
                    *w /= total;
                }
            }
        }
    }
}

/// The skinning engine: blends the matrix palette into deformed vertex
/// positions and recomputes normals from the deformed triangles.
#[derive(Debug)]
pub struct Skinner {
    palette: Vec<Matrix4<f32>>,
}

impl Skinner {
    /// Create an engine with an empty scratch palette.
    pub fn new() -> Self {
        Skinner { palette: Vec::new() }
    }

    /// Deform `bind` into `target` under the given pose.
    ///
    /// For every bind-pose vertex `i`:
    ///
    /// ```text
    /// deformed[i] = sum over j of weight[i][j] * T_j * B_j * bind[i]
    /// ```
    ///
    /// The full vertex set is reprocessed on every call; weights can be
    /// nonzero for many joints per vertex, so there is no incremental
    /// path. Vertices beyond a truncated weight table keep their bind
    /// positions. Afterwards `target`'s normals are recomputed from
    /// scratch against `adjacency`.
    pub fn deform(
        &mut self,
        bind: &Geometry,
        weights: &Weights,
        pose: &Pose,
        adjacency: &Adjacency,
        target: &mut Geometry,
    ) {
        self.palette.clear();
        for j in 0 .. pose.joint_count() {
            self.palette.push(pose.current(j) * pose.inverse_bind(j));
        }

        let mut positions = Vec::with_capacity(bind.vertices.len());
        for (vertex, row) in bind.vertices.iter().zip(weights.rows()) {
            let p = Vector4::new(vertex.x, vertex.y, vertex.z, 1.0);
            let mut sum = Vector4::new(0.0, 0.0, 0.0, 0.0);
            for (j, &w) in row.iter().enumerate().take(self.palette.len()) {
                sum += self.palette[j] * p * w;
            }
            positions.push(mint::Point3 {
                x: sum.x,
                y: sum.y,
                z: sum.z,
            });
        }
        for vertex in &bind.vertices[positions.len() ..] {
            positions.push(*vertex);
        }

        target.vertices = positions;
        target.recompute_normals(adjacency);
    }
}

#[cfg(test)]
mod tests {
    use cgmath::{InnerSpace, Point3, Quaternion, Rad, Rotation3, Vector3};
    use geometry::{Adjacency, Geometry};
    use skeleton::{JointRecord, Pose, Skeleton};
    use super::{Skinner, Weights};

    fn record(x: f32, y: f32, z: f32, parent: i32) -> JointRecord {
        JointRecord {
            position: [x, y, z].into(),
            parent,
        }
    }

    fn triangle_near(offset: f32) -> Geometry {
        Geometry {
            vertices: vec![
                [offset + 1.0, 0.0, 0.0].into(),
                [offset + 2.0, 0.0, 0.0].into(),
                [offset + 1.0, 1.0, 0.0].into(),
            ],
            normals: Vec::new(),
            faces: vec![[0, 1, 2]],
        }
    }

    #[test]
    fn single_influence_moves_vertices_rigidly() {
        // Root at the origin, one deforming joint offset along X.
        let mut skeleton = Skeleton::new(&[record(0.0, 0.0, 0.0, -1), record(1.0, 0.0, 0.0, 0)]);
        let bind = triangle_near(0.0);
        let adjacency = Adjacency::new(bind.vertices.len(), &bind.faces);
        let mut pose = Pose::bind(&skeleton);
        let weights = Weights::from_flat(&[1.0, 1.0, 1.0], 1);

        let joint_origin = Point3::new(1.0, 0.0, 0.0);
        let bind_distances: Vec<f32> = bind.vertices
            .iter()
            .map(|v| (Point3::from(*v) - joint_origin).magnitude())
            .collect();

        skeleton.set_orientation(1, Quaternion::from_angle_z(Rad(::std::f32::consts::FRAC_PI_2)));
        pose.update(&skeleton);

        let mut skinned = bind.clone();
        Skinner::new().deform(&bind, &weights, &pose, &adjacency, &mut skinned);

        // Rigid motion: distance to the joint origin is preserved.
        for (vertex, bind_distance) in skinned.vertices.iter().zip(&bind_distances) {
            let d = (Point3::from(*vertex) - joint_origin).magnitude();
            assert!((d - bind_distance).abs() < 1e-5);
        }
        // And the vertex at the joint origin rotates to the expected spot:
        // (2, 0, 0) about (1, 0, 0) by 90 degrees around Z lands at (1, 1, 0).
        let moved = Point3::from(skinned.vertices[1]);
        assert!((moved - Point3::new(1.0, 1.0, 0.0)).magnitude() < 1e-5);
    }

    #[test]
    fn truncated_weight_table_leaves_tail_at_bind_pose() {
        let mut skeleton = Skeleton::new(&[record(0.0, 0.0, 0.0, -1), record(1.0, 0.0, 0.0, 0)]);
        let bind = triangle_near(0.0);
        let adjacency = Adjacency::new(bind.vertices.len(), &bind.faces);
        let mut pose = Pose::bind(&skeleton);
        // Only the first vertex has a weight row.
        let weights = Weights::from_flat(&[1.0], 1);

        skeleton.set_orientation(1, Quaternion::from_angle_z(Rad(1.0)));
        pose.update(&skeleton);

        let mut skinned = bind.clone();
        Skinner::new().deform(&bind, &weights, &pose, &adjacency, &mut skinned);

        assert!((Point3::from(skinned.vertices[1]) - Point3::from(bind.vertices[1])).magnitude() < 1e-6);
        assert!((Point3::from(skinned.vertices[2]) - Point3::from(bind.vertices[2])).magnitude() < 1e-6);
    }

    #[test]
    fn bind_pose_deformation_is_identity_for_normalized_rows() {
        let skeleton = Skeleton::new(&[
            record(0.0, 0.0, 0.0, -1),
            record(1.0, 0.0, 0.0, 0),
            record(0.0, 1.0, 0.0, 0),
        ]);
        let bind = triangle_near(0.0);
        let adjacency = Adjacency::new(bind.vertices.len(), &bind.faces);
        let pose = Pose::bind(&skeleton);
        let weights = Weights::from_flat(&[0.5, 0.5, 0.25, 0.75, 1.0, 0.0], 2);

        let mut skinned = bind.clone();
        Skinner::new().deform(&bind, &weights, &pose, &adjacency, &mut skinned);

        for (vertex, original) in skinned.vertices.iter().zip(&bind.vertices) {
            assert!((Point3::from(*vertex) - Point3::from(*original)).magnitude() < 1e-5);
        }
        // Normals were recomputed for the flat triangle.
        let n = Vector3::from(skinned.normals[0]);
        assert!((n - Vector3::unit_z()).magnitude() < 1e-5);
    }

    #[test]
    fn normalize_rescales_rows_to_unit_sum() {
        let mut weights = Weights::from_flat(&[2.0, 2.0, 0.0, 0.0], 2);
        weights.normalize();
        assert_eq!(weights.rows()[0], vec![0.5, 0.5]);
        // A zero row stays untouched rather than dividing by zero.
        assert_eq!(weights.rows()[1], vec![0.0, 0.0]);
    }

    #[test]
    fn flat_stream_drops_incomplete_trailing_chunk() {
        let weights = Weights::from_flat(&[0.1, 0.9, 0.3], 2);
        assert_eq!(weights.len(), 1);
        assert_eq!(weights.influences(), 2);
    }
}
