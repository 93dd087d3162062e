//! Gamepad sampling subsystem
//!
//! The decode core is pure and keeps no state between frames:
//!
//! 1. [`frame`] - The fixed 8-byte report
//! 2. [`frame_decoder`] - Report layout, sticks, D-pad and buttons
//! 3. [`axis_remapper`] - Stick bytes to thrust/steering magnitudes
//!
//! Around it sit the collaborators that touch the outside world:
//!
//! 4. [`device_discovery`] - Locate the hidraw node by USB ids
//! 5. [`frame_reader`] - Blocking frame source over a byte stream
//! 6. [`sample_loop`] - Read, decode, publish
//! 7. [`controller_handle`] - Unified API and lifecycle management
//!
//! # Architecture
//!
//! ```text
//! /dev/hidrawN ──► FrameReader ──► decode ──► remap ──► Sample (watch)
//!                  (RawFrame)     (ControlState) (ActuatorCommand)
//! ```

pub mod axis_remapper;
pub mod controller_handle;
pub mod device_discovery;
pub mod frame;
pub mod frame_decoder;
pub mod frame_reader;
pub mod sample_loop;

use axis_remapper::ActuatorCommand;
use frame::RawFrame;
use frame_decoder::ControlState;

/// Run one frame through the whole core.
pub fn process_frame(frame: &RawFrame) -> (ControlState, ActuatorCommand) {
    let state = frame_decoder::decode(frame);
    let command = ActuatorCommand::from_state(&state);
    (state, command)
}
