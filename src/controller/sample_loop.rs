use chrono::{DateTime, Local};
use statum::{machine, state};
use std::time::Duration;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::controller::axis_remapper::ActuatorCommand;
use crate::controller::frame::{FrameError, RawFrame};
use crate::controller::frame_decoder::{decode, ControlState};
use crate::controller::frame_reader::FrameSource;

/// One decoded frame as published to subscribers.
#[derive(Clone, Debug, PartialEq)]
pub struct Sample {
    pub sequence: u64,
    pub timestamp: DateTime<Local>,
    pub frame: RawFrame,
    pub state: ControlState,
    pub command: ActuatorCommand,
}

impl Sample {
    pub fn from_frame(sequence: u64, frame: RawFrame) -> Self {
        let state = decode(&frame);
        let command = ActuatorCommand::from_state(&state);
        Self {
            sequence,
            timestamp: Local::now(),
            frame,
            state,
            command,
        }
    }
}

// Sampler settings
#[derive(Clone, Debug)]
pub struct SamplerSettings {
    pub poll_interval_ms: u64,
    pub max_consecutive_errors: u32,
    pub stats_interval_secs: u32,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            poll_interval_ms: 50,
            max_consecutive_errors: 10,
            stats_interval_secs: 10,
        }
    }
}

// Sample loop errors
#[derive(Debug, thiserror::Error)]
pub enum SampleLoopError {
    #[error("Giving up after {count} consecutive frame errors, last: {last}")]
    TooManyErrors { count: u32, last: FrameError },

    #[error("Missing state data: {0}")]
    MissingStateData(&'static str),
}

/// Why the loop ended without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    Cancelled,
    EndOfStream,
}

#[state]
#[derive(Debug, Clone)]
pub enum SampleState {
    Reading,
    Decoding(RawFrame),
    Publishing(Sample),
}

#[machine]
#[derive(Debug)]
pub struct SampleLoop<S: SampleState> {
    // Where frames come from
    source: Box<dyn FrameSource>,

    settings: SamplerSettings,

    // Latest sample for subscribers
    sample_sender: watch::Sender<Option<Sample>>,

    // Sequence number of the next sample
    sequence: u64,
}

impl<S: SampleState> SampleLoop<S> {
    pub fn subscribe(&self) -> watch::Receiver<Option<Sample>> {
        self.sample_sender.subscribe()
    }

    pub fn settings(&self) -> &SamplerSettings {
        &self.settings
    }
}

impl SampleLoop<Reading> {
    pub fn create(source: Box<dyn FrameSource>, settings: Option<SamplerSettings>) -> Self {
        let settings = settings.unwrap_or_default();
        info!("Creating sample loop with settings: {:?}", settings);

        let (sample_sender, _) = watch::channel(None);
        Self::new(source, settings, sample_sender, 0)
    }

    /// Block on the source for the next frame.
    pub fn read_frame(&mut self) -> Result<RawFrame, FrameError> {
        self.source.read_frame()
    }

    pub fn accept(self, frame: RawFrame) -> SampleLoop<Decoding> {
        debug!("Accepted frame {}", frame);
        self.transition_with(frame)
    }
}

impl SampleLoop<Decoding> {
    pub fn decode(mut self) -> Result<SampleLoop<Publishing>, SampleLoopError> {
        let frame = match self.get_state_data() {
            Some(frame) => *frame,
            None => {
                error!("Decoding state entered without a frame");
                return Err(SampleLoopError::MissingStateData("frame"));
            }
        };

        let sample = Sample::from_frame(self.sequence, frame);
        self.sequence += 1;
        debug!(
            "Sample {}: thrust {} {:?}, steer {} {:?}",
            sample.sequence,
            sample.command.thrust_magnitude,
            sample.command.thrust_direction,
            sample.command.steer_magnitude,
            sample.command.steer_direction
        );

        Ok(self.transition_with(sample))
    }
}

impl SampleLoop<Publishing> {
    pub fn publish(self) -> Result<SampleLoop<Reading>, SampleLoopError> {
        let sample = match self.get_state_data() {
            Some(sample) => sample.clone(),
            None => return Err(SampleLoopError::MissingStateData("sample")),
        };

        // Kept even with no receivers, a later subscriber sees the latest sample
        self.sample_sender.send_replace(Some(sample));

        Ok(self.transition())
    }
}

/// Drive the loop until cancelled, the stream ends, or errors pile up.
///
/// Blocks the calling thread. Cancellation is checked between frames, so a
/// source that never delivers another frame keeps the loop parked in `read_frame`.
pub fn run_sample_loop(
    mut sampler: SampleLoop<Reading>,
    cancel: CancellationToken,
) -> Result<LoopExit, SampleLoopError> {
    let settings = sampler.settings().clone();
    let poll_interval = Duration::from_millis(settings.poll_interval_ms);
    info!(
        "Starting sample loop with {}ms interval",
        settings.poll_interval_ms
    );

    let mut consecutive_errors = 0u32;
    let mut samples = 0u64;
    let mut last_stats_time = Local::now();
    let stats_interval = chrono::Duration::seconds(i64::from(settings.stats_interval_secs.max(1)));

    loop {
        if cancel.is_cancelled() {
            info!("Sample loop cancelled");
            return Ok(LoopExit::Cancelled);
        }

        match sampler.read_frame() {
            Ok(frame) => {
                consecutive_errors = 0;
                let decoding = sampler.accept(frame);
                let publishing = decoding.decode()?;
                sampler = publishing.publish()?;
                samples += 1;
            }
            Err(FrameError::IncompleteFrame { got: 0 }) => {
                info!("Gamepad stream closed");
                return Ok(LoopExit::EndOfStream);
            }
            Err(e) => {
                consecutive_errors += 1;
                warn!(
                    "Skipping sample ({} of {} allowed): {}",
                    consecutive_errors, settings.max_consecutive_errors, e
                );
                if consecutive_errors >= settings.max_consecutive_errors {
                    error!("Too many consecutive frame errors, stopping");
                    return Err(SampleLoopError::TooManyErrors {
                        count: consecutive_errors,
                        last: e,
                    });
                }
            }
        }

        let now = Local::now();
        if now - last_stats_time > stats_interval {
            let elapsed = (now - last_stats_time).num_seconds().max(1);
            info!(
                "Sampler stats: {} samples in {} seconds (avg {:.2}/sec)",
                samples,
                elapsed,
                samples as f64 / elapsed as f64
            );
            samples = 0;
            last_stats_time = now;
        }

        if !poll_interval.is_zero() {
            std::thread::sleep(poll_interval);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::axis_remapper::{SteerDirection, ThrustDirection};
    use crate::controller::frame_reader::StreamFrameReader;
    use std::collections::VecDeque;
    use std::io::Cursor;

    #[derive(Debug)]
    struct Scripted(VecDeque<Result<RawFrame, FrameError>>);

    impl FrameSource for Scripted {
        fn read_frame(&mut self) -> Result<RawFrame, FrameError> {
            self.0
                .pop_front()
                .unwrap_or(Err(FrameError::IncompleteFrame { got: 0 }))
        }
    }

    fn fast() -> Option<SamplerSettings> {
        Some(SamplerSettings {
            poll_interval_ms: 0,
            max_consecutive_errors: 3,
            stats_interval_secs: 10,
        })
    }

    #[test]
    fn single_cycle_publishes_sample() {
        let reader = StreamFrameReader::new(Cursor::new(vec![
            0x01, 0x80, 0xFF, 0x80, 0x00, 0x0F, 0x00, 0xF0,
        ]));
        let mut sampler = SampleLoop::create(Box::new(reader), fast());
        let receiver = sampler.subscribe();

        let frame = sampler.read_frame().unwrap();
        let sampler = sampler.accept(frame).decode().unwrap().publish().unwrap();

        let sample = receiver.borrow().clone().unwrap();
        assert_eq!(sample.sequence, 0);
        assert_eq!(sample.state.right_stick_x, 255);
        assert_eq!(sample.command.steer_direction, SteerDirection::Right);
        assert_eq!(sample.command.thrust_direction, ThrustDirection::Forward);
        assert_eq!(sample.command.thrust_magnitude, 255);
        drop(sampler);
    }

    #[test]
    fn runs_until_end_of_stream() {
        let mut bytes = Vec::new();
        for _ in 0..3 {
            bytes.extend_from_slice(&[0x01, 0x80, 0x80, 0x80, 0x80, 0x0F, 0x00, 0xF0]);
        }
        let sampler = SampleLoop::create(Box::new(StreamFrameReader::new(Cursor::new(bytes))), fast());
        let receiver = sampler.subscribe();

        let exit = run_sample_loop(sampler, CancellationToken::new()).unwrap();
        assert_eq!(exit, LoopExit::EndOfStream);
        assert_eq!(receiver.borrow().as_ref().unwrap().sequence, 2);
    }

    #[test]
    fn publishes_without_subscribers() {
        let reader = StreamFrameReader::new(Cursor::new(vec![
            0x01, 0x80, 0x80, 0x80, 0x80, 0x0F, 0x00, 0xF0,
        ]));
        let mut sampler = SampleLoop::create(Box::new(reader), fast());

        let frame = sampler.read_frame().unwrap();
        let sampler = sampler.accept(frame).decode().unwrap().publish().unwrap();

        let late = sampler.subscribe();
        assert_eq!(late.borrow().as_ref().unwrap().sequence, 0);
    }

    #[test]
    fn runs_without_subscribers() {
        let mut bytes = Vec::new();
        for _ in 0..2 {
            bytes.extend_from_slice(&[0x01, 0x80, 0x80, 0x80, 0x80, 0x0F, 0x00, 0xF0]);
        }
        let sampler = SampleLoop::create(Box::new(StreamFrameReader::new(Cursor::new(bytes))), fast());

        let exit = run_sample_loop(sampler, CancellationToken::new()).unwrap();
        assert_eq!(exit, LoopExit::EndOfStream);
    }

    #[test]
    fn zero_stats_interval_still_runs() {
        let source = Scripted(VecDeque::from(vec![Ok(RawFrame::new([
            0x01, 0x80, 0x80, 0x80, 0x80, 0x0F, 0x00, 0xF0,
        ]))]));
        let sampler = SampleLoop::create(
            Box::new(source),
            Some(SamplerSettings {
                stats_interval_secs: 0,
                ..fast().unwrap()
            }),
        );

        assert_eq!(
            run_sample_loop(sampler, CancellationToken::new()).unwrap(),
            LoopExit::EndOfStream
        );
    }

    #[test]
    fn short_frames_are_skipped() {
        let frame = RawFrame::new([0x01, 0x80, 0x80, 0x80, 0x00, 0x0F, 0x00, 0xF0]);
        let source = Scripted(VecDeque::from(vec![
            Err(FrameError::IncompleteFrame { got: 4 }),
            Ok(frame),
        ]));
        let sampler = SampleLoop::create(Box::new(source), fast());
        let receiver = sampler.subscribe();

        let exit = run_sample_loop(sampler, CancellationToken::new()).unwrap();
        assert_eq!(exit, LoopExit::EndOfStream);
        let sample = receiver.borrow().clone().unwrap();
        assert_eq!(sample.sequence, 0);
        assert_eq!(sample.command.thrust_magnitude, 255);
    }

    #[test]
    fn gives_up_after_repeated_errors() {
        let source = Scripted(VecDeque::from(vec![
            Err(FrameError::IncompleteFrame { got: 1 }),
            Err(FrameError::IncompleteFrame { got: 2 }),
            Err(FrameError::IncompleteFrame { got: 3 }),
        ]));
        let sampler = SampleLoop::create(Box::new(source), fast());
        let _receiver = sampler.subscribe();

        let err = run_sample_loop(sampler, CancellationToken::new()).unwrap_err();
        assert!(matches!(err, SampleLoopError::TooManyErrors { count: 3, .. }));
    }

    #[test]
    fn stops_when_cancelled() {
        let source = Scripted(VecDeque::new());
        let sampler = SampleLoop::create(Box::new(source), fast());
        let cancel = CancellationToken::new();
        cancel.cancel();

        assert_eq!(run_sample_loop(sampler, cancel).unwrap(), LoopExit::Cancelled);
    }
}
