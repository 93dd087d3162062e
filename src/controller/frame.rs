use std::fmt;

/// Number of bytes in one report read from the gamepad.
pub const FRAME_LEN: usize = 8;

// Frame errors
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    #[error("Incomplete frame: got {got} of 8 bytes")]
    IncompleteFrame { got: usize },

    #[error("Malformed D-pad value: {0:#x}")]
    MalformedDpadValue(u8),

    #[error("Failed to read frame: {0}")]
    Io(#[from] std::io::Error),
}

/// One raw 8-byte report as handed over by the device stream.
///
/// The length is part of the type, so a `RawFrame` is always a complete frame.
/// Short buffers are rejected at construction with [`FrameError::IncompleteFrame`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct RawFrame([u8; FRAME_LEN]);

impl RawFrame {
    pub const fn new(bytes: [u8; FRAME_LEN]) -> Self {
        Self(bytes)
    }

    pub fn byte(&self, index: usize) -> u8 {
        self.0[index]
    }

    pub fn as_bytes(&self) -> &[u8; FRAME_LEN] {
        &self.0
    }
}

impl From<[u8; FRAME_LEN]> for RawFrame {
    fn from(bytes: [u8; FRAME_LEN]) -> Self {
        Self(bytes)
    }
}

impl TryFrom<&[u8]> for RawFrame {
    type Error = FrameError;

    // Only the first FRAME_LEN bytes are taken when the buffer is longer
    fn try_from(buf: &[u8]) -> Result<Self, Self::Error> {
        if buf.len() < FRAME_LEN {
            return Err(FrameError::IncompleteFrame { got: buf.len() });
        }
        let mut bytes = [0u8; FRAME_LEN];
        bytes.copy_from_slice(&buf[..FRAME_LEN]);
        Ok(Self(bytes))
    }
}

impl fmt::Debug for RawFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RawFrame({})", self)
    }
}

impl fmt::Display for RawFrame {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, byte) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, " ")?;
            }
            write!(f, "{:02X}", byte)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_buffer_is_incomplete() {
        let buf: &[u8] = &[0x01, 0x80, 0x80];
        let err = RawFrame::try_from(buf).unwrap_err();
        assert!(matches!(err, FrameError::IncompleteFrame { got: 3 }));
    }

    #[test]
    fn empty_buffer_is_incomplete() {
        let buf: &[u8] = &[];
        let err = RawFrame::try_from(buf).unwrap_err();
        assert!(matches!(err, FrameError::IncompleteFrame { got: 0 }));
    }

    #[test]
    fn exact_buffer_is_accepted() {
        let bytes: [u8; 8] = [0x01, 0x80, 0xFF, 0x80, 0x00, 0x0F, 0x00, 0xF0];
        let frame = RawFrame::try_from(&bytes[..]).unwrap();
        assert_eq!(frame.as_bytes(), &bytes);
        assert_eq!(frame.byte(2), 0xFF);
    }

    #[test]
    fn displays_as_hex_bytes() {
        let frame = RawFrame::new([0x01, 0x80, 0x80, 0x80, 0x80, 0x0F, 0x00, 0xF0]);
        assert_eq!(frame.to_string(), "01 80 80 80 80 0F 00 F0");
    }
}
