use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::controller::frame::{FrameError, RawFrame};

// Byte positions inside the 8-byte report
pub const RIGHT_STICK_Y_BYTE: usize = 1;
pub const RIGHT_STICK_X_BYTE: usize = 2;
pub const LEFT_STICK_X_BYTE: usize = 3;
pub const LEFT_STICK_Y_BYTE: usize = 4;
pub const DPAD_FACE_BYTE: usize = 5;
pub const SHOULDER_MENU_BYTE: usize = 6;

/// Raw axis value of a stick at rest.
pub const AXIS_CENTER: u8 = 128;

// D-pad position
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Dpad {
    Up,
    Down,
    Left,
    Right,
    #[default]
    Idle,
}

impl Dpad {
    /// Strict lookup of the low nibble of byte 5.
    pub fn try_from_nibble(nibble: u8) -> Result<Self, FrameError> {
        match nibble & 0x0F {
            0x0 => Ok(Dpad::Up),
            0x2 => Ok(Dpad::Right),
            0x4 => Ok(Dpad::Down),
            0x6 => Ok(Dpad::Left),
            0xF => Ok(Dpad::Idle),
            other => Err(FrameError::MalformedDpadValue(other)),
        }
    }

    /// Same as [`Dpad::try_from_nibble`] but unknown values decode to `Idle`.
    /// The pad never reports them, so they are not worth surfacing.
    pub fn from_nibble(nibble: u8) -> Self {
        Self::try_from_nibble(nibble).unwrap_or_else(|e| {
            trace!("{}, treating as idle", e);
            Dpad::Idle
        })
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct FaceButtons: u8 {
        const TRIANGLE = 1 << 0;
        const CIRCLE = 1 << 1;
        const CROSS = 1 << 2;
        const SQUARE = 1 << 3;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct ShoulderButtons: u8 {
        const L1 = 1 << 0;
        const L2 = 1 << 1;
        const R1 = 1 << 2;
        const R2 = 1 << 3;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct MenuButtons: u8 {
        const SELECT = 1 << 0;
        const START = 1 << 1;
        const LEFT_STICK_CLICK = 1 << 2;
        const RIGHT_STICK_CLICK = 1 << 3;
    }
}

// Every digital button on the pad
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Button {
    Triangle,
    Circle,
    Cross,
    Square,
    L1,
    L2,
    R1,
    R2,
    Select,
    Start,
    LeftStickClick,
    RightStickClick,
}

/// Where a button lives in the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ButtonBit {
    pub button: Button,
    pub byte: usize,
    pub mask: u8,
}

impl ButtonBit {
    const fn new(button: Button, byte: usize, mask: u8) -> Self {
        Self { button, byte, mask }
    }

    /// Position of the bit when the frame is read as one little-endian bit string.
    pub fn bit_index(&self) -> usize {
        self.byte * 8 + self.mask.trailing_zeros() as usize
    }
}

/// Button layout of the report. Byte 5 shares its low nibble with the D-pad.
pub static BUTTON_LAYOUT: [ButtonBit; 12] = [
    ButtonBit::new(Button::Triangle, DPAD_FACE_BYTE, 0x10),
    ButtonBit::new(Button::Circle, DPAD_FACE_BYTE, 0x20),
    ButtonBit::new(Button::Cross, DPAD_FACE_BYTE, 0x40),
    ButtonBit::new(Button::Square, DPAD_FACE_BYTE, 0x80),
    ButtonBit::new(Button::L2, SHOULDER_MENU_BYTE, 0x01),
    ButtonBit::new(Button::R2, SHOULDER_MENU_BYTE, 0x02),
    ButtonBit::new(Button::L1, SHOULDER_MENU_BYTE, 0x04),
    ButtonBit::new(Button::R1, SHOULDER_MENU_BYTE, 0x08),
    ButtonBit::new(Button::Select, SHOULDER_MENU_BYTE, 0x10),
    ButtonBit::new(Button::Start, SHOULDER_MENU_BYTE, 0x20),
    ButtonBit::new(Button::LeftStickClick, SHOULDER_MENU_BYTE, 0x40),
    ButtonBit::new(Button::RightStickClick, SHOULDER_MENU_BYTE, 0x80),
];

/// Decoded snapshot of a single frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ControlState {
    pub right_stick_y: u8,
    pub right_stick_x: u8,
    pub left_stick_x: u8,
    pub left_stick_y: u8,
    pub dpad: Dpad,
    pub face_buttons: FaceButtons,
    pub shoulder_buttons: ShoulderButtons,
    pub menu_buttons: MenuButtons,
}

impl Default for ControlState {
    fn default() -> Self {
        Self {
            right_stick_y: AXIS_CENTER,
            right_stick_x: AXIS_CENTER,
            left_stick_x: AXIS_CENTER,
            left_stick_y: AXIS_CENTER,
            dpad: Dpad::Idle,
            face_buttons: FaceButtons::empty(),
            shoulder_buttons: ShoulderButtons::empty(),
            menu_buttons: MenuButtons::empty(),
        }
    }
}

impl ControlState {
    pub fn is_pressed(&self, button: Button) -> bool {
        match button {
            Button::Triangle => self.face_buttons.contains(FaceButtons::TRIANGLE),
            Button::Circle => self.face_buttons.contains(FaceButtons::CIRCLE),
            Button::Cross => self.face_buttons.contains(FaceButtons::CROSS),
            Button::Square => self.face_buttons.contains(FaceButtons::SQUARE),
            Button::L1 => self.shoulder_buttons.contains(ShoulderButtons::L1),
            Button::L2 => self.shoulder_buttons.contains(ShoulderButtons::L2),
            Button::R1 => self.shoulder_buttons.contains(ShoulderButtons::R1),
            Button::R2 => self.shoulder_buttons.contains(ShoulderButtons::R2),
            Button::Select => self.menu_buttons.contains(MenuButtons::SELECT),
            Button::Start => self.menu_buttons.contains(MenuButtons::START),
            Button::LeftStickClick => self.menu_buttons.contains(MenuButtons::LEFT_STICK_CLICK),
            Button::RightStickClick => self.menu_buttons.contains(MenuButtons::RIGHT_STICK_CLICK),
        }
    }

    pub fn pressed_buttons(&self) -> impl Iterator<Item = Button> + '_ {
        BUTTON_LAYOUT
            .iter()
            .map(|bit| bit.button)
            .filter(|button| self.is_pressed(*button))
    }

    fn press(&mut self, button: Button) {
        match button {
            Button::Triangle => self.face_buttons.insert(FaceButtons::TRIANGLE),
            Button::Circle => self.face_buttons.insert(FaceButtons::CIRCLE),
            Button::Cross => self.face_buttons.insert(FaceButtons::CROSS),
            Button::Square => self.face_buttons.insert(FaceButtons::SQUARE),
            Button::L1 => self.shoulder_buttons.insert(ShoulderButtons::L1),
            Button::L2 => self.shoulder_buttons.insert(ShoulderButtons::L2),
            Button::R1 => self.shoulder_buttons.insert(ShoulderButtons::R1),
            Button::R2 => self.shoulder_buttons.insert(ShoulderButtons::R2),
            Button::Select => self.menu_buttons.insert(MenuButtons::SELECT),
            Button::Start => self.menu_buttons.insert(MenuButtons::START),
            Button::LeftStickClick => self.menu_buttons.insert(MenuButtons::LEFT_STICK_CLICK),
            Button::RightStickClick => self.menu_buttons.insert(MenuButtons::RIGHT_STICK_CLICK),
        }
    }
}

/// Decode a frame into its control state. Bytes 0 and 7 are status markers
/// and carry nothing.
pub fn decode(frame: &RawFrame) -> ControlState {
    let mut state = ControlState {
        right_stick_y: frame.byte(RIGHT_STICK_Y_BYTE),
        right_stick_x: frame.byte(RIGHT_STICK_X_BYTE),
        left_stick_x: frame.byte(LEFT_STICK_X_BYTE),
        left_stick_y: frame.byte(LEFT_STICK_Y_BYTE),
        dpad: Dpad::from_nibble(frame.byte(DPAD_FACE_BYTE) & 0x0F),
        ..ControlState::default()
    };

    for bit in &BUTTON_LAYOUT {
        if frame.byte(bit.byte) & bit.mask != 0 {
            state.press(bit.button);
        }
    }

    state
}
