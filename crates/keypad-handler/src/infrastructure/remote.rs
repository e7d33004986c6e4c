//! Detached adapters for remote screenshot and vibration services.
//!
//! Both services sit behind a remote call that can be slow or fail.  The
//! gesture engine calls its boundaries synchronously on the dispatch task, so
//! these adapters spawn the real call onto the tokio runtime, bound it with a
//! timeout, and log the outcome.  The engine sees `Ok(())` as soon as the
//! request is submitted and is never stalled by the remote side.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use keypad_core::CaptureRegion;
use tokio::runtime::Handle;
use tokio::time::{error::Elapsed, timeout};
use tracing::{debug, warn};

use crate::application::boundary::{BoundaryError, ScreenshotService, Vibrator};

/// Upper bound on any single remote call.
pub const REMOTE_CALL_TIMEOUT: Duration = Duration::from_secs(2);

/// The real screenshot service.
#[async_trait]
pub trait ScreenshotBackend: Send + Sync + 'static {
    async fn capture(&self, region: CaptureRegion) -> Result<(), BoundaryError>;
}

/// The real vibration service.
#[async_trait]
pub trait VibratorBackend: Send + Sync + 'static {
    /// Whether the hardware has a vibration motor at all.
    fn has_vibrator(&self) -> bool;

    async fn vibrate(&self, duration: Duration) -> Result<(), BoundaryError>;
}

fn current_runtime() -> Result<Handle, BoundaryError> {
    Handle::try_current().map_err(|_| BoundaryError::RuntimeUnavailable)
}

fn log_outcome(what: &'static str, limit: Duration, outcome: Result<Result<(), BoundaryError>, Elapsed>) {
    match outcome {
        Ok(Ok(())) => debug!("{what} request completed"),
        Ok(Err(e)) => warn!("{what} request failed: {e}"),
        Err(_) => warn!("{what} request failed: {}", BoundaryError::Timeout(limit)),
    }
}

/// [`ScreenshotService`] that runs captures in the background.
pub struct DetachedScreenshot<B> {
    backend: Arc<B>,
    runtime: Handle,
    timeout: Duration,
}

impl<B: ScreenshotBackend> DetachedScreenshot<B> {
    pub fn new(backend: Arc<B>, runtime: Handle) -> Self {
        Self {
            backend,
            runtime,
            timeout: REMOTE_CALL_TIMEOUT,
        }
    }

    /// Binds to the runtime of the calling context.
    ///
    /// # Errors
    ///
    /// Returns [`BoundaryError::RuntimeUnavailable`] outside a tokio runtime.
    pub fn on_current_runtime(backend: Arc<B>) -> Result<Self, BoundaryError> {
        Ok(Self::new(backend, current_runtime()?))
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl<B: ScreenshotBackend> ScreenshotService for DetachedScreenshot<B> {
    fn capture(&self, region: CaptureRegion) -> Result<(), BoundaryError> {
        let backend = Arc::clone(&self.backend);
        let limit = self.timeout;
        self.runtime.spawn(async move {
            let outcome = timeout(limit, backend.capture(region)).await;
            log_outcome("screenshot", limit, outcome);
        });
        Ok(())
    }
}

/// [`Vibrator`] that runs vibration requests in the background.
pub struct DetachedVibrator<B> {
    backend: Arc<B>,
    runtime: Handle,
    timeout: Duration,
}

impl<B: VibratorBackend> DetachedVibrator<B> {
    /// Returns `None` when the hardware reports no vibration motor, so the
    /// handler disables haptics entirely.
    pub fn detect(backend: Arc<B>, runtime: Handle) -> Option<Self> {
        if !backend.has_vibrator() {
            debug!("no vibrator present, haptic feedback disabled");
            return None;
        }
        Some(Self {
            backend,
            runtime,
            timeout: REMOTE_CALL_TIMEOUT,
        })
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

impl<B: VibratorBackend> Vibrator for DetachedVibrator<B> {
    fn vibrate(&self, duration: Duration) -> Result<(), BoundaryError> {
        let backend = Arc::clone(&self.backend);
        let limit = self.timeout;
        self.runtime.spawn(async move {
            let outcome = timeout(limit, backend.vibrate(duration)).await;
            log_outcome("vibration", limit, outcome);
        });
        Ok(())
    }
}
