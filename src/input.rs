//! Frame-sampled user input.
//!
//! The windowing collaborator feeds events into an [`Input`] once per
//! frame; the picker then queries it. Press edges are detected by
//! keeping the previous frame's state alongside the current one, so
//! the interaction state machine stays fully inspectable, with no
//! hidden "was the button already down" statics.
//!
//! [`Input`]: struct.Input.html

use std::collections::HashSet;

use mint;

/// Mouse button.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum MouseButton {
    /// The primary (left) button.
    Left,
    /// The middle button or wheel click.
    Middle,
    /// The secondary (right) button.
    Right,
}

/// Keyboard key.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Key {
    /// The escape key.
    Escape,
    /// A printable character key.
    Character(char),
}

/// Keyboard or mouse button.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
pub enum Button {
    /// Keyboard button.
    Key(Key),
    /// Mouse button.
    Mouse(MouseButton),
}

/// Left mouse button.
pub const MOUSE_LEFT: Button = Button::Mouse(MouseButton::Left);
/// `Escape` keyboard button.
pub const KEY_ESCAPE: Button = Button::Key(Key::Escape);

#[derive(Clone, Debug)]
struct State {
    keys_pressed: HashSet<Key>,
    mouse_pressed: HashSet<MouseButton>,
    cursor_pos: mint::Point2<f32>,
    viewport: mint::Vector2<f32>,
}

impl State {
    fn new() -> Self {
        State {
            keys_pressed: HashSet::new(),
            mouse_pressed: HashSet::new(),
            cursor_pos: [0.0, 0.0].into(),
            viewport: [1.0, 1.0].into(),
        }
    }
}

/// Controls user input from keyboard and mouse.
///
/// Queried, never pushed: the owner calls [`advance_frame`] at the top
/// of each update tick, applies the window events received since the
/// last tick, and hands a shared reference to whoever wants to react.
///
/// [`advance_frame`]: #method.advance_frame
#[derive(Clone, Debug)]
pub struct Input {
    state: State,
    previous: State,
}

impl Input {
    /// Create an input tracker with nothing pressed.
    pub fn new() -> Self {
        Input {
            state: State::new(),
            previous: State::new(),
        }
    }

    /// Start a new frame: the current state becomes the previous one.
    pub fn advance_frame(&mut self) {
        self.previous = self.state.clone();
    }

    /// Apply a keyboard press or release.
    pub fn keyboard_input(&mut self, pressed: bool, key: Key) {
        if pressed {
            self.state.keys_pressed.insert(key);
        } else {
            self.state.keys_pressed.remove(&key);
        }
    }

    /// Apply a mouse button press or release.
    pub fn mouse_input(&mut self, pressed: bool, button: MouseButton) {
        if pressed {
            self.state.mouse_pressed.insert(button);
        } else {
            self.state.mouse_pressed.remove(&button);
        }
    }

    /// Record the cursor position in pixels from the top-left corner.
    pub fn cursor_moved<P: Into<mint::Point2<f32>>>(&mut self, pos: P) {
        self.state.cursor_pos = pos.into();
    }

    /// Record the viewport size in pixels.
    pub fn viewport_resized<V: Into<mint::Vector2<f32>>>(&mut self, size: V) {
        self.state.viewport = size.into();
    }

    /// Current cursor position in pixels from the top-left corner.
    pub fn cursor_pos(&self) -> mint::Point2<f32> {
        self.state.cursor_pos
    }

    /// Current viewport size in pixels.
    pub fn viewport(&self) -> mint::Vector2<f32> {
        self.state.viewport
    }

    /// Whether `button` is held down this frame.
    pub fn hit(&self, button: Button) -> bool {
        match button {
            Button::Key(key) => self.state.keys_pressed.contains(&key),
            Button::Mouse(mouse) => self.state.mouse_pressed.contains(&mouse),
        }
    }

    /// Whether `button` went down this frame: held now, but not on the
    /// previous frame.
    pub fn edge(&self, button: Button) -> bool {
        let was = match button {
            Button::Key(key) => self.previous.keys_pressed.contains(&key),
            Button::Mouse(mouse) => self.previous.mouse_pressed.contains(&mouse),
        };
        self.hit(button) && !was
    }
}

impl Default for Input {
    fn default() -> Self {
        Input::new()
    }
}
