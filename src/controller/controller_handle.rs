use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

pub use crate::controller::frame::FrameError;
pub use crate::controller::sample_loop::{
    LoopExit, Sample, SampleLoop, SampleLoopError, SamplerSettings,
};

use crate::controller::frame_reader::{FrameSource, StreamFrameReader};
use crate::controller::sample_loop::run_sample_loop;

// Controller errors
#[derive(Debug, thiserror::Error)]
pub enum ControllerError {
    #[error("Frame error: {0}")]
    FrameError(#[from] FrameError),

    #[error("Sample loop error: {0}")]
    SampleLoopError(#[from] SampleLoopError),

    #[error("Task error: {0}")]
    TaskError(String),
}

// Public handle for the sampling pipeline
pub struct ControllerHandle {
    sample_receiver: watch::Receiver<Option<Sample>>,
    cancel: CancellationToken,
    task: JoinHandle<Result<LoopExit, SampleLoopError>>,
}

impl ControllerHandle {
    /// Open the device node and start sampling it.
    pub fn open(
        path: impl AsRef<std::path::Path>,
        settings: Option<SamplerSettings>,
    ) -> Result<Self, ControllerError> {
        let reader = StreamFrameReader::open(path)?;
        Ok(Self::spawn(settings, Box::new(reader)))
    }

    /// Start sampling `source` on a blocking thread. Must be called from
    /// within a tokio runtime.
    pub fn spawn(settings: Option<SamplerSettings>, source: Box<dyn FrameSource>) -> Self {
        info!("Initializing sampler with settings: {:?}", settings);

        let sampler = SampleLoop::create(source, settings);
        let sample_receiver = sampler.subscribe();
        let cancel = CancellationToken::new();

        let loop_cancel = cancel.clone();
        let task = tokio::task::spawn_blocking(move || {
            let result = run_sample_loop(sampler, loop_cancel);
            match &result {
                Ok(exit) => info!("Sample loop finished: {:?}", exit),
                Err(e) => error!("Sample loop terminated with error: {}", e),
            }
            result
        });

        debug!("Sampler task spawned");
        Self {
            sample_receiver,
            cancel,
            task,
        }
    }

    // Get a receiver for the latest sample
    pub fn subscribe(&self) -> watch::Receiver<Option<Sample>> {
        debug!("New subscriber to samples");
        self.sample_receiver.clone()
    }

    /// Ask the loop to stop after the current frame.
    ///
    /// A read already parked on a silent device is not interrupted. Callers
    /// that exit afterwards should shut their runtime down with a timeout
    /// rather than wait for the blocking thread.
    pub fn shutdown(&self) {
        info!("Shutting down sampler");
        self.cancel.cancel();
    }

    /// Wait for the loop to end and report why it did.
    pub async fn join(self) -> Result<LoopExit, ControllerError> {
        let result = self
            .task
            .await
            .map_err(|e| ControllerError::TaskError(e.to_string()))?;
        Ok(result?)
    }
}
