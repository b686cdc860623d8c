//! Ray-cast joint picking and gizmo dragging.
//!
//! A [`Picker`] turns cursor input into joint selection and incremental
//! joint rotation. Each fresh press of the control button casts one ray
//! through the cursor: gizmo handle spheres of the selected joint are
//! tested first, then every joint proxy sphere, nearest hit winning.
//! While the button stays held on a grabbed handle, no further rays are
//! cast; the horizontal cursor delta drives rotation about the handle's
//! axis instead.
//!
//! [`Picker`]: struct.Picker.html

use cgmath::{InnerSpace, Matrix4, Point3, Quaternion, Rad, Rotation3, SquareMatrix, Vector3, Vector4};
use mint;

use input::{Button, Input, KEY_ESCAPE, MOUSE_LEFT};
use rig::Rig;
use Orientation;

/// Radius of the proxy sphere around every joint.
pub const JOINT_PROXY_RADIUS: f32 = 0.025;
/// Radius of each gizmo axis-handle sphere.
pub const HANDLE_RADIUS: f32 = 0.01;
/// Offset of each handle sphere from the joint, along its axis.
pub const HANDLE_OFFSET: f32 = 0.075;

/// Default cursor-distance-to-angle divisor: pixels per radian.
const DEFAULT_DRAG_SCALE: f32 = 10.0;

/// The nearest-root formula used by the ray-sphere test.
///
/// The legacy picker computed `(-b - sqrt(disc)) / 2 * a`, multiplying
/// by `a` where the quadratic solution divides by `2a`. Both behaviors
/// are kept; they agree whenever the ray direction is unit length
/// (`a == 1`), which the picker guarantees.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RootFormula {
    /// The historical behavior: `(-b - sqrt(disc)) / 2 * a`.
    Legacy,
    /// The textbook quadratic root: `(-b - sqrt(disc)) / (2 * a)`.
    Corrected,
}

/// A world-space ray with a unit direction.
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    /// The ray origin: the camera's world-space position.
    pub origin: mint::Point3<f32>,
    /// The normalized ray direction.
    pub direction: mint::Vector3<f32>,
}

impl Ray {
    /// Cast a ray from the camera through a cursor position.
    ///
    /// The cursor is normalized to device coordinates (vertical axis
    /// flipped from screen to clip orientation), unprojected through
    /// the inverse projection to an eye-space direction, then mapped to
    /// world space through the inverse view. The origin is the
    /// translation column of the inverted view.
    pub fn from_cursor(
        cursor: mint::Point2<f32>,
        viewport: mint::Vector2<f32>,
        projection: mint::ColumnMatrix4<f32>,
        view: mint::ColumnMatrix4<f32>,
    ) -> Self {
        let ndc_x = 2.0 * cursor.x / viewport.x - 1.0;
        let ndc_y = -(2.0 * cursor.y / viewport.y - 1.0);
        let clip = Vector4::new(ndc_x, ndc_y, -1.0, 1.0);

        let inv_projection = Matrix4::from(projection)
            .invert()
            .unwrap_or_else(Matrix4::identity);
        let eye = inv_projection * clip;
        let eye = Vector4::new(eye.x / eye.w, eye.y / eye.w, eye.z / eye.w, 0.0);

        let inv_view = Matrix4::from(view)
            .invert()
            .unwrap_or_else(Matrix4::identity);
        let world = inv_view * eye;
        let direction = Vector3::new(world.x, world.y, world.z).normalize();

        Ray {
            origin: mint::Point3 {
                x: inv_view.w.x,
                y: inv_view.w.y,
                z: inv_view.w.z,
            },
            direction: direction.into(),
        }
    }

    /// Distance along the ray to a sphere, or `-1.0` on a miss.
    ///
    /// Solves `a t^2 + b t + c = 0` with `a = D.D`,
    /// `b = 2 (O - C).D`, `c = (O - C).(O - C) - r^2` and reports the
    /// nearer root per `formula`.
    pub fn hit_distance(
        &self,
        center: mint::Point3<f32>,
        radius: f32,
        formula: RootFormula,
    ) -> f32 {
        let d = Vector3::from(self.direction);
        let oc = Point3::from(self.origin) - Point3::from(center);
        let a = d.dot(d);
        let b = 2.0 * oc.dot(d);
        let c = oc.dot(oc) - radius * radius;
        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return -1.0;
        }
        match formula {
            RootFormula::Legacy => (-b - discriminant.sqrt()) / 2.0 * a,
            RootFormula::Corrected => (-b - discriminant.sqrt()) / (2.0 * a),
        }
    }
}

/// A rotation axis of the gizmo, in the selected joint's local frame.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Axis {
    /// The joint's local X axis.
    X,
    /// The joint's local Y axis.
    Y,
    /// The joint's local Z axis.
    Z,
}

impl Axis {
    /// All three axes, in handle order.
    pub const ALL: [Axis; 3] = [Axis::X, Axis::Y, Axis::Z];

    /// The unit vector of this axis in the joint's local frame.
    pub fn unit(&self) -> Vector3<f32> {
        match *self {
            Axis::X => Vector3::unit_x(),
            Axis::Y => Vector3::unit_y(),
            Axis::Z => Vector3::unit_z(),
        }
    }
}

/// Interaction state of the picker.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum PickState {
    /// Nothing selected.
    Idle,
    /// A joint is selected and its gizmo handles are visible.
    Selected {
        /// Index of the selected joint.
        joint: usize,
    },
    /// A handle is grabbed; cursor motion rotates the joint.
    Dragging {
        /// Index of the joint being rotated.
        joint: usize,
        /// The grabbed handle's axis.
        axis: Axis,
    },
}

/// Helper struct to construct a [`Picker`](struct.Picker.html) with
/// desired settings.
#[derive(Clone, Debug)]
pub struct Builder {
    button: Button,
    deselect: Button,
    drag_scale: f32,
    formula: RootFormula,
}

impl Builder {
    /// Create a new `Builder` with default values.
    pub fn new() -> Self {
        Builder {
            button: MOUSE_LEFT,
            deselect: KEY_ESCAPE,
            drag_scale: DEFAULT_DRAG_SCALE,
            formula: RootFormula::Legacy,
        }
    }

    /// Setup the control button. Default is `MOUSE_LEFT`.
    pub fn button(&mut self, button: Button) -> &mut Self {
        self.button = button;
        self
    }

    /// Setup the deselect key. Default is `KEY_ESCAPE`.
    pub fn deselect(&mut self, button: Button) -> &mut Self {
        self.deselect = button;
        self
    }

    /// Setup how many pixels of horizontal drag make one radian.
    /// Default is 10.
    pub fn drag_scale(&mut self, scale: f32) -> &mut Self {
        self.drag_scale = scale;
        self
    }

    /// Setup the ray-sphere root formula. Default is
    /// `RootFormula::Legacy`.
    pub fn formula(&mut self, formula: RootFormula) -> &mut Self {
        self.formula = formula;
        self
    }

    /// Finalize the builder and create a new `Picker`.
    pub fn build(&mut self) -> Picker {
        Picker {
            state: PickState::Idle,
            button: self.button,
            deselect: self.deselect,
            drag_scale: self.drag_scale,
            formula: self.formula,
            last_cursor_x: 0.0,
        }
    }
}

/// Joint selection and gizmo interaction state machine.
///
/// States: `Idle` -> `Selected` when a ray hits a joint proxy,
/// `Selected` -> `Dragging` when a ray hits one of the selected
/// joint's three handles, `Dragging` -> `Selected` on button release,
/// anything -> `Idle` on the deselect key. Lives for the scene's
/// duration; there is no terminal state.
#[derive(Clone, Debug)]
pub struct Picker {
    state: PickState,
    button: Button,
    deselect: Button,
    drag_scale: f32,
    formula: RootFormula,
    last_cursor_x: f32,
}

impl Picker {
    /// Create a new `Builder` with default values.
    pub fn builder() -> Builder {
        Builder::new()
    }

    /// Create a picker with default settings.
    pub fn new() -> Self {
        Builder::new().build()
    }

    /// Current interaction state.
    pub fn state(&self) -> PickState {
        self.state
    }

    /// Index of the selected joint, if any.
    pub fn selected_joint(&self) -> Option<usize> {
        match self.state {
            PickState::Idle => None,
            PickState::Selected { joint } | PickState::Dragging { joint, .. } => Some(joint),
        }
    }

    /// Process one frame of input against the rig.
    ///
    /// Expects `input` to have been advanced and fed this frame's
    /// events. Joint rotations applied here go through
    /// [`Rig::rotate_joint`](../rig/struct.Rig.html#method.rotate_joint),
    /// so slider-driven pose updates never revert them.
    pub fn update(
        &mut self,
        input: &Input,
        projection: mint::ColumnMatrix4<f32>,
        view: mint::ColumnMatrix4<f32>,
        rig: &mut Rig,
    ) {
        if input.edge(self.deselect) {
            if self.state != PickState::Idle {
                debug!("picker: deselect");
            }
            self.state = PickState::Idle;
            return;
        }

        if input.edge(self.button) {
            let ray = Ray::from_cursor(input.cursor_pos(), input.viewport(), projection, view);
            self.on_press(&ray, input.cursor_pos().x, rig);
        } else if input.hit(self.button) {
            self.on_drag(input.cursor_pos().x, rig);
        } else if let PickState::Dragging { joint, .. } = self.state {
            // Button released: the drag ends, the selection stays.
            self.state = PickState::Selected { joint };
        }
    }

    fn on_press(&mut self, ray: &Ray, cursor_x: f32, rig: &mut Rig) {
        // Handles of the current selection take precedence over
        // selecting another joint.
        if let Some(joint) = self.selected_joint() {
            if let Some(handles) = rig.handle_proxies(joint) {
                let mut nearest: Option<(Axis, f32)> = None;
                for (axis, center) in Axis::ALL.iter().zip(handles.iter()) {
                    let t = ray.hit_distance(*center, HANDLE_RADIUS, self.formula);
                    if t >= 0.0 && nearest.map_or(true, |(_, best)| t < best) {
                        nearest = Some((*axis, t));
                    }
                }
                if let Some((axis, _)) = nearest {
                    debug!("picker: grab axis {:?} of joint {}", axis, joint);
                    self.state = PickState::Dragging { joint, axis };
                    self.last_cursor_x = cursor_x;
                    return;
                }
            }
        }

        let mut nearest: Option<(usize, f32)> = None;
        for (joint, center) in rig.joint_proxies().iter().enumerate() {
            let t = ray.hit_distance(*center, JOINT_PROXY_RADIUS, self.formula);
            if t >= 0.0 && nearest.map_or(true, |(_, best)| t < best) {
                nearest = Some((joint, t));
            }
        }
        if let Some((joint, t)) = nearest {
            debug!("picker: select joint {} at distance {}", joint, t);
            self.state = PickState::Selected { joint };
        }
    }

    fn on_drag(&mut self, cursor_x: f32, rig: &mut Rig) {
        if let PickState::Dragging { joint, axis } = self.state {
            let distance = self.last_cursor_x - cursor_x;
            if distance != 0.0 {
                rig.rotate_joint(joint, axis, distance / self.drag_scale);
                self.last_cursor_x = cursor_x;
            }
        }
    }
}

/// Build the incremental world-axis rotation applied during a drag.
pub(crate) fn axis_rotation(local_to_world: Matrix4<f32>, axis: Axis, angle: f32) -> Option<Orientation> {
    let world_axis = (local_to_world * axis.unit().extend(0.0)).truncate();
    let magnitude = world_axis.magnitude();
    if magnitude > 0.0 {
        Some(Quaternion::from_axis_angle(world_axis / magnitude, Rad(angle)))
    } else {
        None
    }
}
