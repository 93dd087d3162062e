use std::fmt::Debug;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read};
use std::path::Path;
use tracing::{debug, info};

use crate::controller::frame::{FrameError, RawFrame, FRAME_LEN};

/// Anything that can hand over one complete frame per call.
pub trait FrameSource: Debug + Send + 'static {
    /// Block until a full frame is available.
    fn read_frame(&mut self) -> Result<RawFrame, FrameError>;
}

/// Reads frames from a blocking byte stream such as `/dev/hidrawN`.
#[derive(Debug)]
pub struct StreamFrameReader<R> {
    stream: R,
}

impl StreamFrameReader<File> {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FrameError> {
        let path = path.as_ref();
        info!("Opening gamepad stream at {}", path.display());
        let file = OpenOptions::new().read(true).open(path)?;
        Ok(Self::new(file))
    }
}

impl<R: Read> StreamFrameReader<R> {
    pub fn new(stream: R) -> Self {
        Self { stream }
    }

    fn read_exact_frame(&mut self) -> Result<RawFrame, FrameError> {
        let mut buf = [0u8; FRAME_LEN];
        let mut filled = 0;

        // hidraw hands out one report per read, other streams may split it
        while filled < FRAME_LEN {
            match self.stream.read(&mut buf[filled..]) {
                Ok(0) => {
                    debug!("Stream ended after {} bytes", filled);
                    return Err(FrameError::IncompleteFrame { got: filled });
                }
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(FrameError::Io(e)),
            }
        }

        Ok(RawFrame::new(buf))
    }
}

impl<R: Read + Debug + Send + 'static> FrameSource for StreamFrameReader<R> {
    fn read_frame(&mut self) -> Result<RawFrame, FrameError> {
        self.read_exact_frame()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    /// Hands out at most `chunk` bytes per read.
    #[derive(Debug)]
    struct Trickle {
        data: Vec<u8>,
        pos: usize,
        chunk: usize,
    }

    impl Read for Trickle {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            let end = (self.pos + self.chunk).min(self.data.len());
            let n = (end - self.pos).min(buf.len());
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn reads_consecutive_frames() {
        let bytes = vec![
            0x01, 0x80, 0x80, 0x80, 0x80, 0x0F, 0x00, 0xF0, //
            0x01, 0x80, 0xFF, 0x80, 0x00, 0x0F, 0x00, 0xF0,
        ];
        let mut reader = StreamFrameReader::new(Cursor::new(bytes));
        assert_eq!(reader.read_frame().unwrap().byte(2), 0x80);
        assert_eq!(reader.read_frame().unwrap().byte(2), 0xFF);
        assert!(matches!(
            reader.read_frame(),
            Err(FrameError::IncompleteFrame { got: 0 })
        ));
    }

    #[test]
    fn short_stream_is_incomplete() {
        let mut reader = StreamFrameReader::new(Cursor::new(vec![0x01, 0x80, 0x80, 0x80, 0x80]));
        assert!(matches!(
            reader.read_frame(),
            Err(FrameError::IncompleteFrame { got: 5 })
        ));
    }

    #[test]
    fn reassembles_split_reads() {
        let data = vec![0x01, 0x80, 0xFF, 0x80, 0x00, 0x0F, 0x00, 0xF0];
        let mut reader = StreamFrameReader::new(Trickle {
            data: data.clone(),
            pos: 0,
            chunk: 3,
        });
        assert_eq!(reader.read_frame().unwrap().as_bytes()[..], data[..]);
    }

    #[test]
    fn open_missing_device_fails_with_io() {
        let err = StreamFrameReader::open("/nonexistent/hidraw-test").unwrap_err();
        assert!(matches!(err, FrameError::Io(_)));
    }
}
