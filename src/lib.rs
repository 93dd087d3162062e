pub mod cli;
pub mod config;
pub mod controller;
pub mod display;

pub use controller::axis_remapper::{ActuatorCommand, SteerDirection, ThrustDirection};
pub use controller::frame::{FrameError, RawFrame, FRAME_LEN};
pub use controller::frame_decoder::{decode, Button, ControlState, Dpad};
pub use controller::process_frame;
