//! GestureEngine: the timing state machine behind every synthesized key.
//!
//! The engine receives already-classified key events and turns them into
//! synthesized key events, haptic pulses and screenshot requests.  It owns
//! all transient gesture state and a [`TimerService`] whose actions are plain
//! [`TimerAction`] values; when one falls due the engine dispatches it to a
//! method that takes the slot and cluster identifiers as explicit arguments.
//! No closure ever captures engine state.
//!
//! # Gestures (for beginners)
//!
//! - **Home/power key** ([`home`]): a quick press is HOME; a press held past
//!   the long-press timeout becomes a POWER click; a press held past the
//!   long-hold threshold additionally starts a POWER long-press that ends
//!   when the key is released.
//! - **Left/right clusters** ([`cluster`]): each press is debounced for a
//!   short tap window before its key-down is synthesized, auto-repeats while
//!   held, and combines with a press on the opposite cluster into a
//!   screenshot.
//!
//! # Threading
//!
//! Every method takes `&mut self` and the current [`Instant`].  The owner is
//! responsible for calling [`GestureEngine::fire_due_timers`] and the key
//! handlers from one serialized context (see
//! [`crate::infrastructure::dispatch`]).

pub mod cluster;
pub mod home;

use std::sync::Arc;
use std::time::{Duration, Instant};

use keypad_core::{
    CaptureRegion, KeyAction, KeyCode, Side, SlotId, SlotRole, TimerService, VirtualKeyEvent,
};
use tracing::{debug, trace, warn};

use super::boundary::{HapticSettings, KeyInjector, PowerState, ScreenshotService, Vibrator};
use super::classify::ClassifiedKey;

pub use cluster::ClusterState;
pub use home::HomePhase;

/// Thresholds that drive every gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureTiming {
    /// Short hold threshold: home becomes a power click, combos become a
    /// partial screenshot.
    pub long_press_timeout: Duration,
    /// Home/power hold threshold that starts a power long-press.
    pub long_hold: Duration,
    /// Debounce window before a cluster press is committed as a key-down.
    pub tap_window: Duration,
    /// Delay before auto-repeat begins.
    pub key_repeat_timeout: Duration,
    /// Period of auto-repeat down/up pairs.
    pub key_repeat_interval: Duration,
    /// Length of one haptic pulse.
    pub haptic_duration: Duration,
}

impl Default for GestureTiming {
    fn default() -> Self {
        Self {
            long_press_timeout: Duration::from_millis(500),
            long_hold: Duration::from_millis(2000),
            tap_window: Duration::from_millis(150),
            key_repeat_timeout: Duration::from_millis(500),
            key_repeat_interval: Duration::from_millis(50),
            haptic_duration: Duration::from_millis(50),
        }
    }
}

/// The external collaborators the engine drives.
#[derive(Clone)]
pub struct Boundaries {
    pub injector: Arc<dyn KeyInjector>,
    pub screenshots: Arc<dyn ScreenshotService>,
    /// `None` when the device has no vibration motor.
    pub vibrator: Option<Arc<dyn Vibrator>>,
    pub settings: Arc<dyn HapticSettings>,
    pub power: Arc<dyn PowerState>,
}

/// Tags under which engine timers are scheduled and cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerTag {
    /// Home key: short threshold (power click).
    HomeTap,
    /// Home key: long threshold (power long-press).
    HomeHold,
    /// Cluster slot: tap confirmation.
    Tap(Side, SlotId),
    /// Cluster slot: auto-repeat start and every repetition.
    Repeat(Side, SlotId),
    /// Two-sided hold: partial screenshot.
    PartialScreenshot,
}

impl TimerTag {
    /// The cluster a tap or repeat tag belongs to.
    fn side(&self) -> Option<Side> {
        match self {
            TimerTag::Tap(side, _) | TimerTag::Repeat(side, _) => Some(*side),
            _ => None,
        }
    }
}

/// What to do when a timer falls due.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerAction {
    HomeTap,
    HomeHold,
    ConfirmTap { side: Side, slot: SlotId, code: KeyCode },
    StartRepeat { side: Side, slot: SlotId, code: KeyCode },
    Repeat { side: Side, slot: SlotId, code: KeyCode },
    PartialScreenshot,
}

/// The gesture state machine.
pub struct GestureEngine {
    timing: GestureTiming,
    boundaries: Boundaries,
    timers: TimerService<TimerTag, TimerAction>,
    home: HomePhase,
    left: ClusterState,
    right: ClusterState,
}

impl GestureEngine {
    pub fn new(timing: GestureTiming, boundaries: Boundaries) -> Self {
        Self {
            timing,
            boundaries,
            timers: TimerService::new(),
            home: HomePhase::Idle,
            left: ClusterState::default(),
            right: ClusterState::default(),
        }
    }

    pub fn timing(&self) -> &GestureTiming {
        &self.timing
    }

    /// Current phase of the home/power key.
    pub fn home_phase(&self) -> HomePhase {
        self.home
    }

    /// Snapshot of a cluster's state.
    pub fn cluster(&self, side: Side) -> &ClusterState {
        match side {
            Side::Left => &self.left,
            Side::Right => &self.right,
        }
    }

    /// Returns `true` if a timer is pending under `tag`.
    pub fn is_timer_pending(&self, tag: TimerTag) -> bool {
        self.timers.is_pending(&tag)
    }

    /// The earliest pending timer deadline, if any.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.next_deadline()
    }

    /// Handles a classified key event.
    pub fn on_key(&mut self, now: Instant, key: ClassifiedKey, action: KeyAction) {
        match key.role {
            SlotRole::HomePower => match action {
                KeyAction::Down => self.home_down(now),
                KeyAction::Up => self.home_up(),
            },
            SlotRole::Cluster(side) => match action {
                KeyAction::Down => self.cluster_down(now, side, key.slot, key.key_code),
                KeyAction::Up => self.cluster_up(side, key.slot, key.key_code),
            },
        }
    }

    /// Executes every timer due at or before `now`, in time order.
    ///
    /// Each action runs with its own scheduled fire time so that recurring
    /// timers reschedule without drift.
    pub fn fire_due_timers(&mut self, now: Instant) {
        while let Some(entry) = self.timers.pop_due(now) {
            trace!(tag = ?entry.tag, "timer fired");
            self.on_timer(entry.fire_at, entry.action);
        }
    }

    fn on_timer(&mut self, fired_at: Instant, action: TimerAction) {
        match action {
            TimerAction::HomeTap => self.home_tap_elapsed(),
            TimerAction::HomeHold => self.home_hold_elapsed(),
            TimerAction::ConfirmTap { side, slot, code } => self.tap_elapsed(side, slot, code),
            TimerAction::StartRepeat { side, slot, code } => {
                self.repeat_started(fired_at, side, slot, code)
            }
            TimerAction::Repeat { side, slot, code } => self.repeat_elapsed(fired_at, side, slot, code),
            TimerAction::PartialScreenshot => self.partial_screenshot_elapsed(),
        }
    }

    // ── Shared helpers ───────────────────────────────────────────────────────

    fn cluster_mut(&mut self, side: Side) -> &mut ClusterState {
        match side {
            Side::Left => &mut self.left,
            Side::Right => &mut self.right,
        }
    }

    fn schedule(&mut self, now: Instant, tag: TimerTag, delay: Duration, action: TimerAction) {
        self.timers.schedule_after(now, tag, delay, action);
    }

    fn cancel(&mut self, tag: TimerTag) {
        self.timers.cancel(&tag);
    }

    /// Cancels every tap and repeat timer belonging to `side`.
    fn cancel_cluster_timers(&mut self, side: Side) {
        self.timers.cancel_where(|tag| tag.side() == Some(side));
    }

    fn emit(&self, event: VirtualKeyEvent) {
        debug!(code = event.code, action = ?event.action, canceled = event.flags.is_canceled(), "inject");
        self.boundaries.injector.inject(event);
    }

    /// Emits a full key stroke: down immediately followed by up.
    fn emit_stroke(&self, code: KeyCode) {
        self.emit(VirtualKeyEvent::down(code));
        self.emit(VirtualKeyEvent::up(code));
    }

    fn is_interactive(&self) -> bool {
        self.boundaries.power.is_interactive()
    }

    /// Pulses the vibrator unless it is missing or disabled in settings.
    fn haptic_feedback(&self) {
        let Some(vibrator) = self.boundaries.vibrator.as_ref() else {
            return;
        };
        let enabled = self
            .boundaries
            .settings
            .haptic_feedback_enabled()
            .unwrap_or(true);
        if !enabled {
            return;
        }
        if let Err(e) = vibrator.vibrate(self.timing.haptic_duration) {
            warn!("haptic feedback failed: {e}");
        }
    }

    fn capture(&self, region: CaptureRegion) {
        debug!(?region, "screenshot requested");
        if let Err(e) = self.boundaries.screenshots.capture(region) {
            warn!("screenshot capture failed: {e}");
        }
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn test_default_timing_matches_platform_values() {
        let timing = GestureTiming::default();
        assert_eq!(timing.long_press_timeout, ms(500));
        assert_eq!(timing.long_hold, ms(2000));
        assert_eq!(timing.tap_window, ms(150));
        assert_eq!(timing.key_repeat_timeout, ms(500));
        assert_eq!(timing.key_repeat_interval, ms(50));
        assert_eq!(timing.haptic_duration, ms(50));
    }

    #[test]
    fn test_haptic_feedback_defaults_to_enabled_when_unset() {
        // Arrange
        let (engine, mocks) = engine();

        // Act
        engine.haptic_feedback();

        // Assert
        assert_eq!(mocks.vibrator.pulses(), vec![ms(50)]);
    }

    #[test]
    fn test_haptic_feedback_respects_disabled_setting() {
        let (engine, mocks) = engine();
        mocks.settings.set_enabled(false);

        engine.haptic_feedback();

        assert!(mocks.vibrator.pulses().is_empty());
    }

    #[test]
    fn test_haptic_feedback_skipped_without_vibrator() {
        let mut mocks = crate::infrastructure::mock::MockBoundaries::new();
        mocks.has_vibrator = false;
        let engine = GestureEngine::new(GestureTiming::default(), mocks.boundaries());

        engine.haptic_feedback();

        assert!(mocks.vibrator.pulses().is_empty());
    }

    #[test]
    fn test_idle_engine_has_no_deadline() {
        let (engine, _) = engine();
        assert_eq!(engine.next_deadline(), None);
        assert_eq!(engine.home_phase(), HomePhase::Idle);
    }
}
