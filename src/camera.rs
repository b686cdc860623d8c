//! Camera projections consumed by the picker.
//!
//! The crate never owns a camera; the render collaborator does. What
//! picking needs from it is a projection matrix and a view matrix, and
//! these helpers produce them.

use cgmath::{ortho as cgmath_ortho, perspective as cgmath_perspective, Deg, Matrix4, Point3, Vector3};
use mint;

/// Generic trait for different graphics projections.
pub trait Projection {
    /// Represents the projection as a projection matrix.
    fn matrix(&self, aspect: f32) -> mint::ColumnMatrix4<f32>;
}

/// Orthographic projection parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct Orthographic {
    /// The center of the projection.
    pub center: mint::Point2<f32>,
    /// Vertical extent from the center point. The height is double the
    /// extent; the width is derived from the aspect ratio.
    pub extent_y: f32,
    /// Distance to the near clip plane.
    pub near: f32,
    /// Distance to the far clip plane.
    pub far: f32,
}

impl Projection for Orthographic {
    fn matrix(&self, aspect: f32) -> mint::ColumnMatrix4<f32> {
        let extent_x = aspect * self.extent_y;
        cgmath_ortho(
            self.center.x - extent_x,
            self.center.x + extent_x,
            self.center.y - self.extent_y,
            self.center.y + self.extent_y,
            self.near,
            self.far,
        ).into()
    }
}

/// Perspective projection parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct Perspective {
    /// Vertical field of view in degrees. The horizontal FOV follows
    /// from the aspect ratio.
    pub fov_y: f32,
    /// Distance to the near clip plane.
    pub near: f32,
    /// Distance to the far clip plane.
    pub far: f32,
}

impl Projection for Perspective {
    fn matrix(&self, aspect: f32) -> mint::ColumnMatrix4<f32> {
        cgmath_perspective(Deg(self.fov_y), aspect, self.near, self.far).into()
    }
}

/// Right-handed look-at view matrix.
pub fn view_matrix<E, T, U>(eye: E, target: T, up: U) -> mint::ColumnMatrix4<f32>
where
    E: Into<mint::Point3<f32>>,
    T: Into<mint::Point3<f32>>,
    U: Into<mint::Vector3<f32>>,
{
    Matrix4::look_at_rh(
        Point3::from(eye.into()),
        Point3::from(target.into()),
        Vector3::from(up.into()),
    ).into()
}

#[cfg(test)]
mod tests {
    use cgmath::{InnerSpace, Matrix4, Point3, SquareMatrix, Transform, Vector3};
    use super::{view_matrix, Perspective, Projection};

    #[test]
    fn view_matrix_translation_column_recovers_the_eye() {
        let view = view_matrix([0.0, 0.0, 5.0], [0.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        let inverted = Matrix4::from(view).invert().unwrap();
        let eye = Point3::new(inverted.w.x, inverted.w.y, inverted.w.z);
        assert!((eye - Point3::new(0.0, 0.0, 5.0)).magnitude() < 1e-5);
    }

    #[test]
    fn perspective_maps_the_view_axis_to_ndc_center() {
        let projection = Perspective { fov_y: 60.0, near: 0.1, far: 100.0 };
        let m = Matrix4::from(projection.matrix(1.0));
        let projected = m.transform_point(Point3::new(0.0, 0.0, -1.0));
        assert!(Vector3::new(projected.x, projected.y, 0.0).magnitude() < 1e-5);
    }
}
