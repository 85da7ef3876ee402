//! Protocol constants for the Luxafor Flag busylight.
//!
//! The Flag is a HID device with a single interrupt OUT endpoint. Every command
//! is a fixed 8-byte frame:
//!
//! ```text
//! [opcode, target, R, G, B, 0x00, 0x00, 0x00]
//! ```
//!
//! Only the static-color command is used here; fade, strobe and wave opcodes
//! exist on the device but are never sent.

use crate::color::Color;

// ── USB identifiers ──

pub const LUXAFOR_FLAG_VID: u16 = 0x04d8;
pub const LUXAFOR_FLAG_PID: u16 = 0xf372;

/// Upper bound on a single OUT transfer.
pub const USB_TIMEOUT_MS: u64 = 1000;

// ── Command frame ──

/// Length of every command frame the device accepts.
pub const FRAME_LEN: usize = 8;

/// Set a solid color on the selected LEDs.
pub const CMD_STATIC_COLOR: u8 = 0x01;

/// Target selector: apply to every LED on the device.
pub const TARGET_ALL_LEDS: u8 = 0xFF;

/// Encode a "set all LEDs to `color`" frame.
pub fn encode_static_color(color: Color) -> [u8; FRAME_LEN] {
    [
        CMD_STATIC_COLOR,
        TARGET_ALL_LEDS,
        color.red,
        color.green,
        color.blue,
        0x00,
        0x00,
        0x00,
    ]
}
