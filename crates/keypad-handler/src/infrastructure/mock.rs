//! Recording test doubles for every boundary trait.
//!
//! Allows unit and integration tests to drive the handler without a real
//! input pipeline, screenshot service or vibration motor, and to assert on
//! exactly what the handler asked each collaborator to do.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use keypad_core::{CaptureRegion, KeyAction, KeyCode, VirtualKeyEvent};

use crate::application::boundary::{BoundaryError, KeyInjector, ScreenshotService, Vibrator};
use crate::application::gesture::Boundaries;
use crate::infrastructure::devices::StaticDeviceDirectory;
use crate::infrastructure::system::{SharedHapticSettings, SharedPowerState};

/// Records every injected event in order.
#[derive(Debug, Default)]
pub struct RecordingInjector {
    events: Mutex<Vec<VirtualKeyEvent>>,
}

impl RecordingInjector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of all injected events.
    pub fn events(&self) -> Vec<VirtualKeyEvent> {
        self.events.lock().expect("lock poisoned").clone()
    }

    /// Injected events carrying `code`.
    pub fn events_for(&self, code: KeyCode) -> Vec<VirtualKeyEvent> {
        self.events()
            .into_iter()
            .filter(|event| event.code == code)
            .collect()
    }

    /// Number of injected key-down events carrying `code`.
    pub fn downs(&self, code: KeyCode) -> usize {
        self.events_for(code)
            .iter()
            .filter(|event| event.action == KeyAction::Down)
            .count()
    }

    /// Forgets everything recorded so far.
    pub fn clear(&self) {
        self.events.lock().expect("lock poisoned").clear();
    }
}

impl KeyInjector for RecordingInjector {
    fn inject(&self, event: VirtualKeyEvent) {
        self.events.lock().expect("lock poisoned").push(event);
    }
}

/// Records every capture request; optionally fails each one.
#[derive(Debug, Default)]
pub struct RecordingScreenshots {
    captures: Mutex<Vec<CaptureRegion>>,
    should_fail: bool,
}

impl RecordingScreenshots {
    pub fn new() -> Self {
        Self::default()
    }

    /// A double whose every capture returns a remote failure.
    pub fn failing() -> Self {
        Self {
            captures: Mutex::new(Vec::new()),
            should_fail: true,
        }
    }

    /// All capture requests received, including failed ones.
    pub fn captures(&self) -> Vec<CaptureRegion> {
        self.captures.lock().expect("lock poisoned").clone()
    }
}

impl ScreenshotService for RecordingScreenshots {
    fn capture(&self, region: CaptureRegion) -> Result<(), BoundaryError> {
        self.captures.lock().expect("lock poisoned").push(region);
        if self.should_fail {
            return Err(BoundaryError::Remote("injected failure".to_string()));
        }
        Ok(())
    }
}

/// Records every vibration request; optionally fails each one.
#[derive(Debug, Default)]
pub struct RecordingVibrator {
    pulses: Mutex<Vec<Duration>>,
    should_fail: bool,
}

impl RecordingVibrator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self {
            pulses: Mutex::new(Vec::new()),
            should_fail: true,
        }
    }

    /// All vibration requests received, including failed ones.
    pub fn pulses(&self) -> Vec<Duration> {
        self.pulses.lock().expect("lock poisoned").clone()
    }
}

impl Vibrator for RecordingVibrator {
    fn vibrate(&self, duration: Duration) -> Result<(), BoundaryError> {
        self.pulses.lock().expect("lock poisoned").push(duration);
        if self.should_fail {
            return Err(BoundaryError::Remote("injected failure".to_string()));
        }
        Ok(())
    }
}

/// A full set of recording collaborators with handles kept for assertions.
pub struct MockBoundaries {
    pub injector: Arc<RecordingInjector>,
    pub screenshots: Arc<RecordingScreenshots>,
    pub vibrator: Arc<RecordingVibrator>,
    pub settings: Arc<SharedHapticSettings>,
    pub power: Arc<SharedPowerState>,
    pub devices: Arc<StaticDeviceDirectory>,
    /// When `false`, [`MockBoundaries::boundaries`] reports no vibrator.
    pub has_vibrator: bool,
}

impl MockBoundaries {
    /// Interactive device with a working vibrator and default settings.
    pub fn new() -> Self {
        Self {
            injector: Arc::new(RecordingInjector::new()),
            screenshots: Arc::new(RecordingScreenshots::new()),
            vibrator: Arc::new(RecordingVibrator::new()),
            settings: Arc::new(SharedHapticSettings::unset()),
            power: Arc::new(SharedPowerState::new(true)),
            devices: Arc::new(StaticDeviceDirectory::new()),
            has_vibrator: true,
        }
    }

    /// Builds the trait-object bundle the gesture engine consumes.
    pub fn boundaries(&self) -> Boundaries {
        Boundaries {
            injector: Arc::clone(&self.injector) as Arc<dyn KeyInjector>,
            screenshots: Arc::clone(&self.screenshots) as Arc<dyn ScreenshotService>,
            vibrator: if self.has_vibrator {
                Some(Arc::clone(&self.vibrator) as Arc<dyn Vibrator>)
            } else {
                None
            },
            settings: Arc::clone(&self.settings) as _,
            power: Arc::clone(&self.power) as _,
        }
    }
}

impl Default for MockBoundaries {
    fn default() -> Self {
        Self::new()
    }
}
