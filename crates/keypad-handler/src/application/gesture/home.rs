//! Home/power key: one physical key, three meanings by hold time.
//!
//! ```text
//!            DOWN: HOME down, arm tap + hold timers
//!   Idle ───────────────────────────────────────────► Pressed
//!    ▲                                                 │  │
//!    │ UP: HOME up, disarm                             │  │ long_press_timeout:
//!    ├─────────────────────────────────────────────────┘  │ HOME up (canceled),
//!    │                                                    │ POWER down+up, haptic
//!    │ UP: disarm                                         ▼
//!    ├──────────────────────────────────────────────  TapAsPower
//!    │                                                    │ long_hold:
//!    │ UP: POWER up                                       │ POWER down, haptic
//!    └──────────────────────────────────────────────  LongHold ◄┘
//! ```
//!
//! The tap and hold timers are independent: the hold timer is not cancelled
//! when the tap timer completes its power click, so a press held past the
//! long-hold threshold produces the power click *and* a power long-press.

use std::time::Instant;

use keypad_core::{VirtualKeyEvent, KEYCODE_HOME, KEYCODE_POWER};
use tracing::debug;

use super::{GestureEngine, TimerAction, TimerTag};

/// Where the home/power key is in its tiered hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HomePhase {
    #[default]
    Idle,
    /// Held, no threshold reached yet.
    Pressed,
    /// The short threshold elapsed and a power click was synthesized.
    TapAsPower,
    /// The long threshold elapsed; a synthesized POWER is being held.
    LongHold,
}

impl HomePhase {
    /// Returns `true` while a synthesized POWER long-press is in progress.
    pub fn is_power_long_press(&self) -> bool {
        matches!(self, HomePhase::LongHold)
    }
}

impl GestureEngine {
    pub(super) fn home_down(&mut self, now: Instant) {
        if self.home != HomePhase::Idle {
            debug!(phase = ?self.home, "ignoring repeated home press");
            return;
        }
        self.emit(VirtualKeyEvent::down(KEYCODE_HOME));
        self.home = HomePhase::Pressed;
        let (tap, hold) = (self.timing.long_press_timeout, self.timing.long_hold);
        self.schedule(now, TimerTag::HomeTap, tap, TimerAction::HomeTap);
        self.schedule(now, TimerTag::HomeHold, hold, TimerAction::HomeHold);
    }

    pub(super) fn home_up(&mut self) {
        match self.home {
            HomePhase::LongHold => {
                self.emit(VirtualKeyEvent::up(KEYCODE_POWER));
            }
            HomePhase::Pressed => {
                self.emit(VirtualKeyEvent::up(KEYCODE_HOME));
                self.cancel(TimerTag::HomeTap);
                self.cancel(TimerTag::HomeHold);
            }
            HomePhase::TapAsPower => {
                // HOME was already released (canceled) by the power click.
                self.cancel(TimerTag::HomeTap);
                self.cancel(TimerTag::HomeHold);
            }
            HomePhase::Idle => {
                debug!("ignoring home release without press");
            }
        }
        self.home = HomePhase::Idle;
    }

    pub(super) fn home_tap_elapsed(&mut self) {
        if self.home != HomePhase::Pressed {
            return;
        }
        self.emit(VirtualKeyEvent::canceled_up(KEYCODE_HOME));
        self.emit_stroke(KEYCODE_POWER);
        self.haptic_feedback();
        self.home = HomePhase::TapAsPower;
    }

    pub(super) fn home_hold_elapsed(&mut self) {
        if !matches!(self.home, HomePhase::Pressed | HomePhase::TapAsPower) {
            return;
        }
        self.emit(VirtualKeyEvent::down(KEYCODE_POWER));
        self.haptic_feedback();
        self.home = HomePhase::LongHold;
    }
}
