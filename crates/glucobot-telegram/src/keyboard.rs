//! Persistent reply keyboard with the Start and Stop buttons.

use teloxide::types::{KeyboardButton, KeyboardMarkup};

/// Button label routed like `/start`.
pub const START_LABEL: &str = "Start";
/// Button label routed like `/stop`.
pub const STOP_LABEL: &str = "Stop";

/// Two-row keyboard attached to the welcome prompt.
pub fn main_keyboard() -> KeyboardMarkup {
    KeyboardMarkup::new([
        vec![KeyboardButton::new(START_LABEL)],
        vec![KeyboardButton::new(STOP_LABEL)],
    ])
    .resize_keyboard()
    .input_field_placeholder("Pick an option…".to_string())
}
