//! Stick byte to actuator magnitude conversion.
//!
//! Each axis is split around [`AXIS_CENTER`] into two linear ranges:
//!
//! ```text
//! raw      0 ─────────── 128 │ 129 ─────────── 255
//! output 255 ───────────   0 │   0 ─────────── 255
//!          (low side, /128)  │  (high side, /126)
//! ```
//!
//! The two halves use different denominators, so the curve is slightly
//! steeper above the center. Downstream motor calibration was done against
//! this curve; keep it as is.

use serde::{Deserialize, Serialize};

use crate::controller::frame_decoder::{ControlState, AXIS_CENTER};

const OUTPUT_MAX: u32 = 0xFF;
const HIGH_SIDE_MIN: u32 = 129;
const HIGH_SIDE_MAX: u32 = 255;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ThrustDirection {
    #[default]
    Forward,
    Reverse,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum SteerDirection {
    #[default]
    Straight,
    Left,
    Right,
}

/// Which half of the axis a raw value falls in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AxisSide {
    Low,
    High,
}

/// Magnitude on the low side, `raw` in `0..=128`. 0 maps to 255, 128 to 0.
fn remap_low(raw: u8) -> u8 {
    let raw = raw as u32;
    (OUTPUT_MAX - raw * OUTPUT_MAX / AXIS_CENTER as u32) as u8
}

/// Magnitude on the high side, `raw` in `129..=255`. 129 maps to 0, 255 to 255.
fn remap_high(raw: u8) -> u8 {
    let raw = raw as u32;
    ((raw - HIGH_SIDE_MIN) * OUTPUT_MAX / (HIGH_SIDE_MAX - HIGH_SIDE_MIN)) as u8
}

/// Split a raw axis byte into its side and a 0..=255 magnitude.
/// The center value belongs to the low side.
pub fn remap(raw: u8) -> (AxisSide, u8) {
    if raw <= AXIS_CENTER {
        (AxisSide::Low, remap_low(raw))
    } else {
        (AxisSide::High, remap_high(raw))
    }
}

pub fn remap_thrust(raw: u8) -> (ThrustDirection, u8) {
    match remap(raw) {
        (AxisSide::Low, magnitude) => (ThrustDirection::Forward, magnitude),
        (AxisSide::High, magnitude) => (ThrustDirection::Reverse, magnitude),
    }
}

/// Steering has a dead center: exactly 128 means straight ahead.
pub fn remap_steering(raw: u8) -> (SteerDirection, u8) {
    if raw == AXIS_CENTER {
        return (SteerDirection::Straight, 0);
    }
    match remap(raw) {
        (AxisSide::Low, magnitude) => (SteerDirection::Left, magnitude),
        (AxisSide::High, magnitude) => (SteerDirection::Right, magnitude),
    }
}

/// Thrust and steering derived from one decoded frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ActuatorCommand {
    pub thrust_magnitude: u8,
    pub thrust_direction: ThrustDirection,
    pub steer_magnitude: u8,
    pub steer_direction: SteerDirection,
}

impl ActuatorCommand {
    /// Thrust follows the left stick Y axis, steering the right stick X axis.
    pub fn from_state(state: &ControlState) -> Self {
        let (thrust_direction, thrust_magnitude) = remap_thrust(state.left_stick_y);
        let (steer_direction, steer_magnitude) = remap_steering(state.right_stick_x);
        Self {
            thrust_magnitude,
            thrust_direction,
            steer_magnitude,
            steer_direction,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn endpoints() {
        assert_eq!(remap(0), (AxisSide::Low, 255));
        assert_eq!(remap(128), (AxisSide::Low, 0));
        assert_eq!(remap(129), (AxisSide::High, 0));
        assert_eq!(remap(255), (AxisSide::High, 255));
    }

    #[test]
    fn thrust_center_is_forward() {
        assert_eq!(remap_thrust(128), (ThrustDirection::Forward, 0));
        assert_eq!(remap_thrust(0), (ThrustDirection::Forward, 255));
        assert_eq!(remap_thrust(129), (ThrustDirection::Reverse, 0));
        assert_eq!(remap_thrust(255), (ThrustDirection::Reverse, 255));
    }

    #[test]
    fn steering_center_is_straight() {
        assert_eq!(remap_steering(128), (SteerDirection::Straight, 0));
        assert_eq!(remap_steering(127), (SteerDirection::Left, 2));
        assert_eq!(remap_steering(0), (SteerDirection::Left, 255));
        assert_eq!(remap_steering(129), (SteerDirection::Right, 0));
        assert_eq!(remap_steering(255), (SteerDirection::Right, 255));
    }

    #[test]
    fn integer_truncation_matches_calibration() {
        // 255 - 64 * 255 / 128 = 255 - 127
        assert_eq!(remap(64), (AxisSide::Low, 128));
        assert_eq!(remap(1), (AxisSide::Low, 254));
        // (192 - 129) * 255 / 126 = 127
        assert_eq!(remap(192), (AxisSide::High, 127));
        assert_eq!(remap(130), (AxisSide::High, 2));
    }

    #[test]
    fn command_uses_left_y_and_right_x() {
        let state = ControlState {
            right_stick_x: 255,
            left_stick_y: 0,
            ..ControlState::default()
        };
        let command = ActuatorCommand::from_state(&state);
        assert_eq!(command.thrust_direction, ThrustDirection::Forward);
        assert_eq!(command.thrust_magnitude, 255);
        assert_eq!(command.steer_direction, SteerDirection::Right);
        assert_eq!(command.steer_magnitude, 255);
    }

    #[test]
    fn resting_sticks_give_zero_command() {
        let command = ActuatorCommand::from_state(&ControlState::default());
        assert_eq!(command, ActuatorCommand::default());
    }

    proptest! {
        #[test]
        fn side_follows_center(raw in any::<u8>()) {
            let (side, _) = remap(raw);
            prop_assert_eq!(side == AxisSide::Low, raw <= AXIS_CENTER);
        }

        #[test]
        fn magnitude_grows_away_from_center(a in any::<u8>(), b in any::<u8>()) {
            let (side_a, mag_a) = remap(a);
            let (side_b, mag_b) = remap(b);
            if side_a == side_b {
                let dist_a = (a as i16 - AXIS_CENTER as i16).abs();
                let dist_b = (b as i16 - AXIS_CENTER as i16).abs();
                if dist_a <= dist_b {
                    prop_assert!(mag_a <= mag_b);
                }
            }
        }
    }
}
