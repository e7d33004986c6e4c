//! Left/right clusters: debounced taps, auto-repeat and two-sided combos.
//!
//! Each cluster groups one or more slots (for example an "up" and a "down"
//! sub-key on the same side) of which at most one counts as pressed.
//!
//! On every event for a slot, before anything else:
//!
//! 1. A *different* pressed slot in the same cluster is force-released with a
//!    canceled key-up and its timers are dropped.
//! 2. The opposite cluster's pending tap is invalidated and its tap/repeat
//!    timers are dropped, since the two sides are about to be evaluated as a
//!    combo.
//!
//! A press while the opposite cluster is held arms a partial screenshot;
//! releasing one side of such a hold before the threshold takes a full
//! screenshot instead.  Either way both presses are consumed and their later
//! releases are swallowed.
//!
//! A repeated press of a slot that is already held is ignored.
//!
//! Pressed slots are only recorded while the device is interactive, so combos
//! cannot arm while the screen is off; taps and repeats still work.

use std::mem;
use std::time::{Duration, Instant};

use keypad_core::{CaptureRegion, KeyCode, Side, SlotId, VirtualKeyEvent};
use tracing::debug;

use super::{GestureEngine, TimerAction, TimerTag};

/// Lower bound on the auto-repeat period.
const MIN_REPEAT_INTERVAL: Duration = Duration::from_millis(1);

/// The slot currently held in a cluster and its virtual key code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PressedSlot {
    pub slot: SlotId,
    pub code: KeyCode,
}

/// Transient state of one cluster.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClusterState {
    pressed: Option<PressedSlot>,
    pending_tap: bool,
    consumed: bool,
    /// A key-down was synthesized for the held slot and no release followed.
    key_down_sent: bool,
}

impl ClusterState {
    /// The held slot, if any (only tracked while interactive).
    pub fn pressed(&self) -> Option<PressedSlot> {
        self.pressed
    }

    /// `true` while a press waits for its tap window to elapse.
    pub fn has_pending_tap(&self) -> bool {
        self.pending_tap
    }

    /// `true` when a combo consumed the current press.
    pub fn is_consumed(&self) -> bool {
        self.consumed
    }
}

impl GestureEngine {
    pub(super) fn cluster_down(&mut self, now: Instant, side: Side, slot: SlotId, code: KeyCode) {
        if self.is_slot_held(side, slot) {
            debug!(?side, slot = slot.0, "ignoring repeated press");
            return;
        }
        self.release_previous_slot(side, slot);
        self.invalidate_opposite(side);

        let combo = self.cluster(side.other()).pressed.is_some();
        let timing = self.timing;
        {
            let state = self.cluster_mut(side);
            state.consumed = false;
            state.pending_tap = !combo;
            state.key_down_sent = false;
        }

        if combo {
            debug!(?side, "two-sided hold, arming partial screenshot");
            self.schedule(
                now,
                TimerTag::PartialScreenshot,
                timing.long_press_timeout,
                TimerAction::PartialScreenshot,
            );
        } else {
            self.schedule(
                now,
                TimerTag::Tap(side, slot),
                timing.tap_window,
                TimerAction::ConfirmTap { side, slot, code },
            );
            self.schedule(
                now,
                TimerTag::Repeat(side, slot),
                timing.key_repeat_timeout,
                TimerAction::StartRepeat { side, slot, code },
            );
        }

        if self.is_interactive() {
            self.cluster_mut(side).pressed = Some(PressedSlot { slot, code });
        }
    }

    pub(super) fn cluster_up(&mut self, side: Side, slot: SlotId, code: KeyCode) {
        self.release_previous_slot(side, slot);
        self.invalidate_opposite(side);

        let other = side.other();
        let consumed = mem::take(&mut self.cluster_mut(side).consumed);
        let pending_tap = mem::take(&mut self.cluster_mut(side).pending_tap);
        let key_down_sent = mem::take(&mut self.cluster_mut(side).key_down_sent);

        if consumed {
            debug!(?side, "swallowing release of consumed press");
        } else if let Some(held) = self.cluster(other).pressed {
            // Keys already reported down are released as canceled.
            if key_down_sent {
                self.emit(VirtualKeyEvent::canceled_up(code));
            }
            if self.cluster(other).key_down_sent {
                self.emit(VirtualKeyEvent::canceled_up(held.code));
            }
            let opposite = self.cluster_mut(other);
            opposite.pressed = None;
            opposite.consumed = true;
            opposite.key_down_sent = false;
            self.capture(CaptureRegion::Full);
        } else {
            if pending_tap {
                self.cancel(TimerTag::Tap(side, slot));
                self.emit(VirtualKeyEvent::down(code));
            }
            self.emit(VirtualKeyEvent::up(code));
        }

        self.cancel(TimerTag::Repeat(side, slot));
        self.cancel(TimerTag::PartialScreenshot);
        self.cluster_mut(side).pressed = None;
    }

    /// `true` if `slot` is already the held slot of `side`, or still has
    /// timers from an earlier press (presses are not recorded while the
    /// screen is off).
    fn is_slot_held(&self, side: Side, slot: SlotId) -> bool {
        self.cluster(side).pressed.is_some_and(|p| p.slot == slot)
            || self.timers.is_pending(&TimerTag::Tap(side, slot))
            || self.timers.is_pending(&TimerTag::Repeat(side, slot))
    }

    /// Step 1: force-release a different slot held in the same cluster.
    fn release_previous_slot(&mut self, side: Side, slot: SlotId) {
        let Some(previous) = self.cluster(side).pressed else {
            return;
        };
        if previous.slot == slot {
            return;
        }
        debug!(?side, from = previous.slot.0, to = slot.0, "switching pressed slot");
        self.emit(VirtualKeyEvent::canceled_up(previous.code));
        self.cancel(TimerTag::Repeat(side, previous.slot));
        self.cancel(TimerTag::Tap(side, previous.slot));
        let state = self.cluster_mut(side);
        state.pressed = None;
        state.pending_tap = false;
        state.key_down_sent = false;
    }

    /// Step 2: drop the opposite cluster's in-flight tap classification.
    fn invalidate_opposite(&mut self, side: Side) {
        let other = side.other();
        self.cluster_mut(other).pending_tap = false;
        self.cancel_cluster_timers(other);
    }

    pub(super) fn tap_elapsed(&mut self, side: Side, slot: SlotId, code: KeyCode) {
        let state = self.cluster_mut(side);
        if !state.pending_tap {
            return;
        }
        state.pending_tap = false;
        state.key_down_sent = true;
        debug!(?side, slot = slot.0, "tap confirmed");
        self.emit(VirtualKeyEvent::down(code));
    }

    pub(super) fn repeat_started(&mut self, fired_at: Instant, side: Side, slot: SlotId, code: KeyCode) {
        let state = self.cluster_mut(side);
        state.pending_tap = false;
        state.key_down_sent = false;
        self.cancel(TimerTag::Tap(side, slot));
        self.emit(VirtualKeyEvent::up(code));
        self.schedule_repeat(fired_at, side, slot, code);
    }

    pub(super) fn repeat_elapsed(&mut self, fired_at: Instant, side: Side, slot: SlotId, code: KeyCode) {
        self.emit_stroke(code);
        self.schedule_repeat(fired_at, side, slot, code);
    }

    fn schedule_repeat(&mut self, from: Instant, side: Side, slot: SlotId, code: KeyCode) {
        let interval = self.timing.key_repeat_interval.max(MIN_REPEAT_INTERVAL);
        self.schedule(
            from,
            TimerTag::Repeat(side, slot),
            interval,
            TimerAction::Repeat { side, slot, code },
        );
    }

    pub(super) fn partial_screenshot_elapsed(&mut self) {
        let (Some(left), Some(right)) = (self.left.pressed, self.right.pressed) else {
            return;
        };
        self.emit(VirtualKeyEvent::canceled_up(left.code));
        self.emit(VirtualKeyEvent::canceled_up(right.code));
        for side in [Side::Left, Side::Right] {
            self.cancel_cluster_timers(side);
            let state = self.cluster_mut(side);
            state.pressed = None;
            state.pending_tap = false;
            state.consumed = true;
            state.key_down_sent = false;
        }
        self.capture(CaptureRegion::Partial);
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use keypad_core::KeyAction;

    const LEFT: KeyCode = 19;
    const LEFT_ALT: KeyCode = 20;
    const RIGHT: KeyCode = 22;

    fn left() -> crate::application::classify::ClassifiedKey {
        cluster_key(Side::Left, 1, LEFT)
    }

    fn left_alt() -> crate::application::classify::ClassifiedKey {
        cluster_key(Side::Left, 2, LEFT_ALT)
    }

    fn right() -> crate::application::classify::ClassifiedKey {
        cluster_key(Side::Right, 3, RIGHT)
    }

    #[test]
    fn test_press_arms_tap_and_repeat_and_marks_pressed() {
        // Arrange
        let (mut engine, mocks) = engine();
        let t0 = Instant::now();

        // Act
        engine.on_key(t0, left(), KeyAction::Down);

        // Assert – nothing emitted until the tap window elapses
        assert!(mocks.injector.events().is_empty());
        let state = engine.cluster(Side::Left);
        assert!(state.has_pending_tap());
        assert_eq!(state.pressed().map(|p| p.slot), Some(SlotId(1)));
        assert!(engine.is_timer_pending(TimerTag::Tap(Side::Left, SlotId(1))));
        assert!(engine.is_timer_pending(TimerTag::Repeat(Side::Left, SlotId(1))));
    }

    #[test]
    fn test_tap_window_elapsing_emits_key_down() {
        let (mut engine, mocks) = engine();
        let t0 = Instant::now();
        engine.on_key(t0, left(), KeyAction::Down);

        engine.fire_due_timers(t0 + ms(150));

        assert_eq!(mocks.injector.events(), vec![VirtualKeyEvent::down(LEFT)]);
        assert!(!engine.cluster(Side::Left).has_pending_tap());
    }

    #[test]
    fn test_release_after_tap_window_emits_only_key_up() {
        // Arrange
        let (mut engine, mocks) = engine();
        let t0 = Instant::now();
        engine.on_key(t0, left(), KeyAction::Down);
        engine.fire_due_timers(t0 + ms(200));

        // Act
        engine.on_key(t0 + ms(200), left(), KeyAction::Up);

        // Assert
        assert_eq!(
            mocks.injector.events(),
            vec![VirtualKeyEvent::down(LEFT), VirtualKeyEvent::up(LEFT)]
        );
        assert_eq!(engine.next_deadline(), None);
    }

    #[test]
    fn test_repeat_cadence_is_anchored_to_schedule() {
        // Arrange
        let (mut engine, mocks) = engine();
        let t0 = Instant::now();
        engine.on_key(t0, left(), KeyAction::Down);

        // Act – one late drain still yields every period exactly once
        engine.fire_due_timers(t0 + ms(600));

        // Assert – down (tap), up (repeat start), then two down/up pairs
        assert_eq!(
            mocks.injector.events(),
            vec![
                VirtualKeyEvent::down(LEFT),
                VirtualKeyEvent::up(LEFT),
                VirtualKeyEvent::down(LEFT),
                VirtualKeyEvent::up(LEFT),
                VirtualKeyEvent::down(LEFT),
                VirtualKeyEvent::up(LEFT),
            ]
        );
        assert_eq!(engine.next_deadline(), Some(t0 + ms(650)));
    }

    #[test]
    fn test_repeated_press_of_held_slot_is_ignored() {
        // Arrange
        let (mut engine, mocks) = engine();
        let t0 = Instant::now();
        engine.on_key(t0, left(), KeyAction::Down);

        // Act
        engine.on_key(t0 + ms(10), left(), KeyAction::Down);
        engine.fire_due_timers(t0 + ms(600));

        // Assert – identical to a single press held for 600 ms
        assert_eq!(mocks.injector.downs(LEFT), 3);
        assert_eq!(mocks.injector.events_for(LEFT).len(), 6);
        assert_eq!(engine.next_deadline(), Some(t0 + ms(650)));
    }

    #[test]
    fn test_repeated_press_while_screen_off_is_ignored() {
        let (mut engine, mocks) = engine();
        mocks.power.set_interactive(false);
        let t0 = Instant::now();

        engine.on_key(t0, left(), KeyAction::Down);
        engine.on_key(t0 + ms(10), left(), KeyAction::Down);
        engine.fire_due_timers(t0 + ms(600));

        assert_eq!(mocks.injector.downs(LEFT), 3);
        assert_eq!(mocks.injector.events_for(LEFT).len(), 6);
    }

    #[test]
    fn test_press_after_release_is_handled_again() {
        let (mut engine, mocks) = engine();
        let t0 = Instant::now();

        engine.on_key(t0, left(), KeyAction::Down);
        engine.on_key(t0 + ms(50), left(), KeyAction::Up);
        engine.on_key(t0 + ms(100), left(), KeyAction::Down);
        engine.on_key(t0 + ms(150), left(), KeyAction::Up);

        assert_eq!(mocks.injector.downs(LEFT), 2);
    }

    #[test]
    fn test_zero_repeat_interval_still_drains() {
        // Arrange
        let mocks = crate::infrastructure::mock::MockBoundaries::new();
        let timing = super::super::GestureTiming {
            key_repeat_interval: std::time::Duration::ZERO,
            ..Default::default()
        };
        let mut engine = GestureEngine::new(timing, mocks.boundaries());
        let t0 = Instant::now();
        engine.on_key(t0, left(), KeyAction::Down);

        // Act – repeats at 501..=510 ms
        engine.fire_due_timers(t0 + ms(510));

        // Assert
        assert_eq!(mocks.injector.downs(LEFT), 1 + 10);
        assert_eq!(engine.next_deadline(), Some(t0 + ms(511)));
    }

    #[test]
    fn test_opposite_press_invalidates_pending_tap() {
        // Arrange
        let (mut engine, mocks) = engine();
        let t0 = Instant::now();
        engine.on_key(t0, left(), KeyAction::Down);

        // Act
        engine.on_key(t0 + ms(50), right(), KeyAction::Down);
        engine.fire_due_timers(t0 + ms(300));

        // Assert
        assert!(!engine.cluster(Side::Left).has_pending_tap());
        assert!(!engine.is_timer_pending(TimerTag::Tap(Side::Left, SlotId(1))));
        assert!(!engine.is_timer_pending(TimerTag::Repeat(Side::Left, SlotId(1))));
        assert!(engine.is_timer_pending(TimerTag::PartialScreenshot));
        assert!(mocks.injector.events().is_empty());
    }

    #[test]
    fn test_slot_switch_force_releases_previous_slot() {
        // Arrange
        let (mut engine, mocks) = engine();
        let t0 = Instant::now();
        engine.on_key(t0, left(), KeyAction::Down);
        engine.fire_due_timers(t0 + ms(200));

        // Act
        engine.on_key(t0 + ms(200), left_alt(), KeyAction::Down);

        // Assert
        assert_eq!(
            mocks.injector.events(),
            vec![VirtualKeyEvent::down(LEFT), VirtualKeyEvent::canceled_up(LEFT)]
        );
        assert!(!engine.is_timer_pending(TimerTag::Repeat(Side::Left, SlotId(1))));
        assert_eq!(engine.cluster(Side::Left).pressed().map(|p| p.slot), Some(SlotId(2)));
    }

    #[test]
    fn test_slot_switch_inside_tap_window_never_emits_old_down() {
        let (mut engine, mocks) = engine();
        let t0 = Instant::now();
        engine.on_key(t0, left(), KeyAction::Down);

        engine.on_key(t0 + ms(50), left_alt(), KeyAction::Down);
        engine.fire_due_timers(t0 + ms(250));

        assert_eq!(
            mocks.injector.events(),
            vec![VirtualKeyEvent::canceled_up(LEFT), VirtualKeyEvent::down(LEFT_ALT)]
        );
    }

    #[test]
    fn test_full_screenshot_cancels_confirmed_release_side() {
        // Arrange – left's tap is confirmed before right joins
        let (mut engine, mocks) = engine();
        let t0 = Instant::now();
        engine.on_key(t0, left(), KeyAction::Down);
        engine.fire_due_timers(t0 + ms(200));
        engine.on_key(t0 + ms(200), right(), KeyAction::Down);

        // Act
        engine.on_key(t0 + ms(250), left(), KeyAction::Up);
        engine.on_key(t0 + ms(300), right(), KeyAction::Up);

        // Assert
        assert_eq!(
            mocks.injector.events(),
            vec![VirtualKeyEvent::down(LEFT), VirtualKeyEvent::canceled_up(LEFT)]
        );
        assert_eq!(mocks.screenshots.captures(), vec![CaptureRegion::Full]);
    }

    #[test]
    fn test_full_screenshot_cancels_confirmed_opposite_side() {
        // Arrange – right's tap is confirmed before left joins
        let (mut engine, mocks) = engine();
        let t0 = Instant::now();
        engine.on_key(t0, right(), KeyAction::Down);
        engine.fire_due_timers(t0 + ms(200));
        engine.on_key(t0 + ms(200), left(), KeyAction::Down);

        // Act
        engine.on_key(t0 + ms(250), left(), KeyAction::Up);
        engine.on_key(t0 + ms(300), right(), KeyAction::Up);

        // Assert
        assert_eq!(
            mocks.injector.events(),
            vec![VirtualKeyEvent::down(RIGHT), VirtualKeyEvent::canceled_up(RIGHT)]
        );
        assert_eq!(mocks.screenshots.captures(), vec![CaptureRegion::Full]);
    }

    #[test]
    fn test_full_screenshot_before_any_tap_emits_nothing() {
        let (mut engine, mocks) = engine();
        let t0 = Instant::now();
        engine.on_key(t0, left(), KeyAction::Down);
        engine.on_key(t0 + ms(20), right(), KeyAction::Down);

        engine.on_key(t0 + ms(100), left(), KeyAction::Up);

        assert!(mocks.injector.events().is_empty());
        assert_eq!(mocks.screenshots.captures(), vec![CaptureRegion::Full]);
    }

    #[test]
    fn test_not_interactive_press_is_not_recorded() {
        // Arrange
        let (mut engine, mocks) = engine();
        mocks.power.set_interactive(false);
        let t0 = Instant::now();

        // Act
        engine.on_key(t0, left(), KeyAction::Down);
        engine.fire_due_timers(t0 + ms(150));

        // Assert – tap still emitted, combo not armed
        assert_eq!(engine.cluster(Side::Left).pressed(), None);
        assert_eq!(mocks.injector.events(), vec![VirtualKeyEvent::down(LEFT)]);
    }

    #[test]
    fn test_not_interactive_hold_does_not_arm_combo() {
        let (mut engine, mocks) = engine();
        mocks.power.set_interactive(false);
        let t0 = Instant::now();

        engine.on_key(t0, left(), KeyAction::Down);
        engine.on_key(t0 + ms(10), right(), KeyAction::Down);

        assert!(!engine.is_timer_pending(TimerTag::PartialScreenshot));
        assert!(engine.is_timer_pending(TimerTag::Tap(Side::Right, SlotId(3))));
    }

    #[test]
    fn test_partial_screenshot_requires_both_sides_still_pressed() {
        // Arrange
        let (mut engine, mocks) = engine();
        let t0 = Instant::now();
        engine.on_key(t0, left(), KeyAction::Down);
        engine.on_key(t0 + ms(10), right(), KeyAction::Down);

        // Act – the timer fires after left's marker was dropped by a switch
        engine.left.pressed = None;
        engine.fire_due_timers(t0 + ms(600));

        // Assert
        assert!(mocks.screenshots.captures().is_empty());
    }

    #[test]
    fn test_failed_capture_still_consumes_presses() {
        // Arrange
        let mut mocks = crate::infrastructure::mock::MockBoundaries::new();
        mocks.screenshots =
            std::sync::Arc::new(crate::infrastructure::mock::RecordingScreenshots::failing());
        let mut engine = GestureEngine::new(Default::default(), mocks.boundaries());
        let t0 = Instant::now();
        engine.on_key(t0, left(), KeyAction::Down);
        engine.on_key(t0, right(), KeyAction::Down);

        // Act
        engine.fire_due_timers(t0 + ms(500));

        // Assert
        assert_eq!(mocks.screenshots.captures(), vec![CaptureRegion::Partial]);
        assert!(engine.cluster(Side::Left).is_consumed());
        assert!(engine.cluster(Side::Right).is_consumed());
    }
}
