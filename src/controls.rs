//! Control bindings for the launcher.
//!
//! Raw input from the renderer's event loop (key names, joystick buttons and
//! axis motion) is mapped to the handful of actions the launcher supports.

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_AXIS_DEADZONE;

/// An action the launcher performs in response to input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Move the selection to the previous card
    Previous,
    /// Move the selection to the next card
    Next,
    /// Launch the selected card
    Launch,
    /// Quit the launcher
    Quit,
}

/// Raw input delivered by the event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputEvent {
    /// A key press, identified by name (e.g. "Left", "Space")
    Key(String),
    /// A joystick button press
    Button(u8),
    /// Joystick axis motion
    Axis { axis: u8, value: i32 },
}

/// Keys and joystick buttons bound to one control.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    /// Key names, matched case-insensitively
    #[serde(default)]
    pub keys: Vec<String>,
    /// Joystick button indices
    #[serde(default)]
    pub buttons: Vec<u8>,
}

impl Binding {
    /// Binding for the given key names.
    pub fn keys(keys: &[&str]) -> Self {
        Self {
            keys: keys.iter().map(|k| k.to_string()).collect(),
            buttons: Vec::new(),
        }
    }

    /// Add joystick buttons to the binding.
    pub fn with_buttons(mut self, buttons: &[u8]) -> Self {
        self.buttons.extend_from_slice(buttons);
        self
    }

    fn matches_key(&self, key: &str) -> bool {
        self.keys.iter().any(|k| k.eq_ignore_ascii_case(key))
    }

    fn matches_button(&self, button: u8) -> bool {
        self.buttons.contains(&button)
    }
}

/// Control bindings in effect for the session.
#[derive(Debug, Clone)]
pub struct ControlBindings {
    /// Moves to the previous card
    pub previous: Binding,
    /// Moves to the next card
    pub next: Binding,
    /// Launches the selected card
    pub launch: Binding,
    /// Quits the launcher
    pub quit: Binding,
    /// Axis values within +/- this range are ignored
    pub axis_deadzone: i32,
}

impl Default for ControlBindings {
    fn default() -> Self {
        Self {
            previous: Binding::keys(&["Left"]),
            next: Binding::keys(&["Right"]),
            launch: Binding::keys(&["Space", "Return"]).with_buttons(&[0]),
            quit: Binding::keys(&["Escape"]).with_buttons(&[1]),
            axis_deadzone: DEFAULT_AXIS_DEADZONE,
        }
    }
}

impl ControlBindings {
    /// Map an input event to a control, if it is bound.
    ///
    /// Horizontal motion on axis 0 beyond the deadzone steps the selection;
    /// other axes are ignored.
    pub fn control_for(&self, event: &InputEvent) -> Option<Control> {
        match event {
            InputEvent::Key(key) => self.control_for_key(key),
            InputEvent::Button(button) => self.control_for_button(*button),
            InputEvent::Axis { axis: 0, value } => {
                if *value < -self.axis_deadzone {
                    Some(Control::Previous)
                } else if *value > self.axis_deadzone {
                    Some(Control::Next)
                } else {
                    None
                }
            }
            InputEvent::Axis { .. } => None,
        }
    }

    fn control_for_key(&self, key: &str) -> Option<Control> {
        self.bindings()
            .into_iter()
            .find(|(_, binding)| binding.matches_key(key))
            .map(|(control, _)| control)
    }

    fn control_for_button(&self, button: u8) -> Option<Control> {
        self.bindings()
            .into_iter()
            .find(|(_, binding)| binding.matches_button(button))
            .map(|(control, _)| control)
    }

    /// Bindings in precedence order when the same input is bound twice.
    fn bindings(&self) -> [(Control, &Binding); 4] {
        [
            (Control::Quit, &self.quit),
            (Control::Previous, &self.previous),
            (Control::Next, &self.next),
            (Control::Launch, &self.launch),
        ]
    }
}
