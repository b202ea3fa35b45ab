//! Visibility state machine for the notification panel.
//!
//! Rendering layers see two flags: `visible` (the panel is in the render
//! tree) and `open` (the panel is in its shown pose). On open, `visible`
//! turns on one frame before `open`; on close, `open` turns off at once and
//! `visible` follows after the exit delay.

use std::time::{Duration, Instant};

/// Default exit-animation delay before a closing panel leaves the render tree.
pub const DEFAULT_CLOSE_DELAY: Duration = Duration::from_millis(200);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelPhase {
  Closed,
  /// Mounted, waiting one tick before entering the open pose.
  Opening,
  Open,
  /// Leaving the open pose; unmounts once the delay since `since` elapses.
  Closing { since: Instant },
}

#[derive(Debug, Clone)]
pub struct Panel {
  phase:       PanelPhase,
  close_delay: Duration,
}

impl Default for Panel {
  fn default() -> Self { Self::new(DEFAULT_CLOSE_DELAY) }
}

impl Panel {
  pub fn new(close_delay: Duration) -> Self {
    Self {
      phase: PanelPhase::Closed,
      close_delay,
    }
  }

  pub fn phase(&self) -> PanelPhase { self.phase }

  pub fn is_visible(&self) -> bool { !matches!(self.phase, PanelPhase::Closed) }

  pub fn is_open(&self) -> bool { matches!(self.phase, PanelPhase::Open) }

  /// Begin opening. Reopening during the exit delay cancels the unmount.
  pub fn open(&mut self) {
    if matches!(self.phase, PanelPhase::Closed | PanelPhase::Closing { .. }) {
      self.phase = PanelPhase::Opening;
    }
  }

  /// Begin closing at `now`.
  pub fn close(&mut self, now: Instant) {
    if matches!(self.phase, PanelPhase::Open | PanelPhase::Opening) {
      self.phase = PanelPhase::Closing { since: now };
    }
  }

  pub fn toggle(&mut self, now: Instant) {
    match self.phase {
      PanelPhase::Open | PanelPhase::Opening => self.close(now),
      PanelPhase::Closed | PanelPhase::Closing { .. } => self.open(),
    }
  }

  /// Advance pending transitions. Call once per rendered frame.
  pub fn tick(&mut self, now: Instant) {
    match self.phase {
      PanelPhase::Opening => self.phase = PanelPhase::Open,
      PanelPhase::Closing { since } if now.saturating_duration_since(since) >= self.close_delay => {
        self.phase = PanelPhase::Closed;
      }
      _ => {}
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  const DELAY: Duration = Duration::from_millis(200);

  #[test]
  fn starts_closed_and_stays_closed_on_tick() {
    let mut p = Panel::new(DELAY);
    p.tick(Instant::now());
    assert_eq!(p.phase(), PanelPhase::Closed);
    assert!(!p.is_visible());
    assert!(!p.is_open());
  }

  #[test]
  fn visible_precedes_open() {
    let mut p = Panel::new(DELAY);
    p.open();
    assert!(p.is_visible());
    assert!(!p.is_open());
    p.tick(Instant::now());
    assert!(p.is_open());
  }

  #[test]
  fn open_clears_before_visible_and_waits_for_the_delay() {
    let t0 = Instant::now();
    let mut p = Panel::new(DELAY);
    p.open();
    p.tick(t0);
    p.close(t0);
    assert!(!p.is_open());
    assert!(p.is_visible());

    p.tick(t0 + Duration::from_millis(50));
    assert!(p.is_visible());
    p.tick(t0 + DELAY);
    assert!(!p.is_visible());
  }

  #[test]
  fn reopening_during_exit_keeps_the_panel_mounted() {
    let t0 = Instant::now();
    let mut p = Panel::new(DELAY);
    p.open();
    p.tick(t0);
    p.close(t0);
    p.open();
    assert_eq!(p.phase(), PanelPhase::Opening);
    p.tick(t0 + DELAY * 2);
    assert!(p.is_open());
  }

  #[test]
  fn close_on_a_closed_panel_is_a_no_op() {
    let mut p = Panel::new(DELAY);
    p.close(Instant::now());
    assert_eq!(p.phase(), PanelPhase::Closed);
  }

  #[test]
  fn toggle_alternates() {
    let t0 = Instant::now();
    let mut p = Panel::new(DELAY);
    p.toggle(t0);
    p.tick(t0);
    assert!(p.is_open());
    p.toggle(t0);
    assert!(matches!(p.phase(), PanelPhase::Closing { .. }));
  }
}
