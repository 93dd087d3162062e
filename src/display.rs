//! Console rendering of samples.
//!
//! Replaces the window UI with a plain terminal readout: raw bytes, the two
//! actuator values and every button as ON/OFF. Rendering is a pure function
//! of the sample so the caller decides where the text goes.

use serde::{Deserialize, Serialize};
use std::fmt::Write;

use crate::controller::axis_remapper::{SteerDirection, ThrustDirection};
use crate::controller::frame_decoder::{Button, Dpad};
use crate::controller::sample_loop::Sample;

/// ANSI "clear screen, cursor home".
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";

#[derive(Deserialize, Serialize, Clone, Debug)]
#[serde(default)]
pub struct DisplaySettings {
    /// Print the frame as hex before the decoded values
    pub show_raw: bool,
    /// Redraw in place instead of scrolling
    pub clear_screen: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_raw: true,
            clear_screen: true,
        }
    }
}

fn on_off(pressed: bool) -> &'static str {
    if pressed {
        "ON "
    } else {
        "OFF"
    }
}

fn thrust_label(direction: ThrustDirection) -> &'static str {
    match direction {
        ThrustDirection::Forward => "FORWARD",
        ThrustDirection::Reverse => "REVERSE",
    }
}

fn steer_label(direction: SteerDirection) -> &'static str {
    match direction {
        SteerDirection::Straight => "STRAIGHT",
        SteerDirection::Left => "LEFT",
        SteerDirection::Right => "RIGHT",
    }
}

fn dpad_label(dpad: Dpad) -> &'static str {
    match dpad {
        Dpad::Up => "UP",
        Dpad::Down => "DOWN",
        Dpad::Left => "LEFT",
        Dpad::Right => "RIGHT",
        Dpad::Idle => "IDLE",
    }
}

pub fn render(sample: &Sample, settings: &DisplaySettings) -> String {
    let mut out = String::new();
    let state = &sample.state;
    let command = &sample.command;
    let pressed = |button| on_off(state.is_pressed(button));

    if settings.clear_screen {
        out.push_str(CLEAR_SCREEN);
    }

    // Writing into a String cannot fail
    if settings.show_raw {
        let bytes = sample.frame.as_bytes();
        let _ = writeln!(
            out,
            "Data:\t{:02X} {:02X} {:02X} {:02X}",
            bytes[0], bytes[1], bytes[2], bytes[3]
        );
        let _ = writeln!(
            out,
            "\t{:02X} {:02X} {:02X} {:02X}",
            bytes[4], bytes[5], bytes[6], bytes[7]
        );
        let _ = writeln!(out);
    }

    let _ = writeln!(
        out,
        "LS Y: {}\t\tThrust:\t\t{}\t{}",
        state.left_stick_y,
        command.thrust_magnitude,
        thrust_label(command.thrust_direction)
    );
    let _ = writeln!(
        out,
        "RS X: {}\t\tDirection:\t{}\t{}",
        state.right_stick_x,
        command.steer_magnitude,
        steer_label(command.steer_direction)
    );
    let _ = writeln!(out);

    let _ = writeln!(
        out,
        "L1: {}\tL2: {}\nR1: {}\tR2: {}",
        pressed(Button::L1),
        pressed(Button::L2),
        pressed(Button::R1),
        pressed(Button::R2)
    );
    let _ = writeln!(
        out,
        "Triangle: {}\tCircle: {}\tCross: {}\tSquare: {}",
        pressed(Button::Triangle),
        pressed(Button::Circle),
        pressed(Button::Cross),
        pressed(Button::Square)
    );
    let _ = writeln!(
        out,
        "Sel: {}\tStart: {}\tLSbut: {}\tRSbut: {}",
        pressed(Button::Select),
        pressed(Button::Start),
        pressed(Button::LeftStickClick),
        pressed(Button::RightStickClick)
    );
    let _ = writeln!(out, "D-pad: {}", dpad_label(state.dpad));

    out
}
