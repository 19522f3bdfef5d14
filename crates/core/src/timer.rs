//! Exam countdown.
//!
//! [`CountdownTimer`] is a pure state machine advanced by [`CountdownTimer::tick`],
//! one call per wall-clock second. Scheduling the ticks is the caller's job.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::{ExamMeta, ExamSettings};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TimerError {
    #[error("countdown needs a duration > 0 minutes")]
    NoDuration,
}

/// Snapshot of the countdown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimerState {
    pub remaining_secs: u32,
    pub total_secs: u32,
    pub is_paused: bool,
}

impl TimerState {
    /// Seconds consumed so far.
    #[must_use]
    pub fn elapsed_secs(&self) -> u32 {
        self.total_secs.saturating_sub(self.remaining_secs)
    }
}

/// Event produced by a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    /// Emitted on every second that was actually counted down.
    Tick(TimerState),
    /// Remaining time reached a configured second-mark.
    Warning { mark: u32 },
    /// Remaining time reached zero. Emitted once.
    Expired,
}

#[derive(Debug, Clone)]
pub struct CountdownTimer {
    total_secs: u32,
    remaining_secs: u32,
    paused: bool,
    stopped: bool,
    thresholds: Vec<u32>,
    fired: Vec<u32>,
}

impl CountdownTimer {
    /// Create a countdown of `duration_minutes` with warning marks in seconds.
    ///
    /// # Errors
    ///
    /// Returns `TimerError::NoDuration` for a zero duration. Untimed exams must
    /// not build a timer at all.
    pub fn new(duration_minutes: u32, thresholds: &[u32]) -> Result<Self, TimerError> {
        if duration_minutes == 0 {
            return Err(TimerError::NoDuration);
        }
        let total_secs = duration_minutes.saturating_mul(60);
        Ok(Self {
            total_secs,
            remaining_secs: total_secs,
            paused: false,
            stopped: false,
            thresholds: thresholds.to_vec(),
            fired: Vec::new(),
        })
    }

    /// Timer for an exam, or `None` when the exam is untimed.
    #[must_use]
    pub fn for_exam(meta: &ExamMeta, settings: &ExamSettings) -> Option<Self> {
        let minutes = meta.timed_minutes()?;
        Self::new(minutes, settings.warning_thresholds()).ok()
    }

    /// Announce a mark equal to the full duration, before the first tick.
    ///
    /// Returns at most one `Warning`. [`Self::tick`] does the same on the
    /// first tick if this was never called.
    pub fn begin(&mut self) -> Vec<TimerEvent> {
        if self.stopped || self.remaining_secs != self.total_secs {
            return Vec::new();
        }
        self.check_mark().into_iter().collect()
    }

    /// Count down one second.
    ///
    /// Does nothing while paused, stopped or already at zero. Decrement and
    /// threshold checks happen together, so a mark can never be skipped.
    pub fn tick(&mut self) -> Vec<TimerEvent> {
        if self.paused || self.stopped || self.remaining_secs == 0 {
            return Vec::new();
        }

        let mut events = Vec::new();
        if self.remaining_secs == self.total_secs {
            events.extend(self.check_mark());
        }

        self.remaining_secs -= 1;
        events.push(TimerEvent::Tick(self.state()));
        events.extend(self.check_mark());

        if self.remaining_secs == 0 {
            events.push(TimerEvent::Expired);
        }

        events
    }

    fn check_mark(&mut self) -> Option<TimerEvent> {
        let mark = self.remaining_secs;
        if mark == 0 || !self.thresholds.contains(&mark) || self.fired.contains(&mark) {
            return None;
        }
        self.fired.push(mark);
        Some(TimerEvent::Warning { mark })
    }

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    /// Stop for good. A stopped timer never ticks or expires.
    pub fn stop(&mut self) {
        self.stopped = true;
    }

    #[must_use]
    pub fn state(&self) -> TimerState {
        TimerState {
            remaining_secs: self.remaining_secs,
            total_secs: self.total_secs,
            is_paused: self.paused,
        }
    }

    #[must_use]
    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    #[must_use]
    pub fn is_paused(&self) -> bool {
        self.paused
    }

    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.remaining_secs == 0
    }

    /// True while further ticks can still change the state.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.stopped && self.remaining_secs > 0
    }

    /// Marks already announced, in firing order.
    #[must_use]
    pub fn fired_warnings(&self) -> &[u32] {
        &self.fired
    }
}

/// Render seconds as `MM:SS`; minutes are not wrapped into hours.
#[must_use]
pub fn format_remaining(seconds: u32) -> String {
    let minutes = seconds / 60;
    let remainder = seconds % 60;
    format!("{minutes:02}:{remainder:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run(timer: &mut CountdownTimer, ticks: u32) -> Vec<TimerEvent> {
        (0..ticks).flat_map(|_| timer.tick()).collect()
    }

    fn warnings(events: &[TimerEvent]) -> Vec<u32> {
        events
            .iter()
            .filter_map(|e| match e {
                TimerEvent::Warning { mark } => Some(*mark),
                _ => None,
            })
            .collect()
    }

    fn expiries(events: &[TimerEvent]) -> usize {
        events
            .iter()
            .filter(|e| matches!(e, TimerEvent::Expired))
            .count()
    }

    #[test]
    fn zero_duration_is_rejected() {
        assert_eq!(CountdownTimer::new(0, &[]).unwrap_err(), TimerError::NoDuration);
    }

    #[test]
    fn one_minute_expires_once_after_sixty_ticks() {
        let mut timer = CountdownTimer::new(1, &[30]).unwrap();
        assert_eq!(timer.state().total_secs, 60);

        let events = run(&mut timer, 59);
        assert_eq!(expiries(&events), 0);
        assert_eq!(timer.remaining_secs(), 1);

        let events = run(&mut timer, 1);
        assert_eq!(expiries(&events), 1);
        assert!(timer.is_expired());

        let events = run(&mut timer, 10);
        assert!(events.is_empty());
        assert_eq!(timer.remaining_secs(), 0);
    }

    #[test]
    fn each_warning_fires_once_at_its_mark() {
        let mut timer = CountdownTimer::new(6, &[300, 120, 60, 30]).unwrap();

        let events = run(&mut timer, 60);
        assert_eq!(warnings(&events), vec![300]);
        assert_eq!(timer.remaining_secs(), 300);

        let events = run(&mut timer, 300);
        assert_eq!(warnings(&events), vec![120, 60, 30]);
        assert_eq!(timer.fired_warnings(), &[300, 120, 60, 30]);
    }

    #[test]
    fn warning_is_emitted_after_its_tick() {
        let mut timer = CountdownTimer::new(1, &[59]).unwrap();
        let events = timer.tick();
        assert_eq!(events.len(), 2);
        assert!(matches!(events[0], TimerEvent::Tick(state) if state.remaining_secs == 59));
        assert_eq!(events[1], TimerEvent::Warning { mark: 59 });
    }

    #[test]
    fn mark_equal_to_full_duration_fires_at_start() {
        let mut timer = CountdownTimer::new(5, &[300, 120]).unwrap();
        assert_eq!(timer.begin(), vec![TimerEvent::Warning { mark: 300 }]);
        assert!(timer.begin().is_empty());

        let events = run(&mut timer, 180);
        assert_eq!(warnings(&events), vec![120]);
        assert_eq!(timer.fired_warnings(), &[300, 120]);
    }

    #[test]
    fn first_tick_announces_full_duration_mark_without_begin() {
        let mut timer = CountdownTimer::new(1, &[60, 30]).unwrap();
        let events = timer.tick();
        assert_eq!(events[0], TimerEvent::Warning { mark: 60 });
        assert!(matches!(events[1], TimerEvent::Tick(state) if state.remaining_secs == 59));

        let events = run(&mut timer, 59);
        assert_eq!(warnings(&events), vec![30]);
        assert_eq!(expiries(&events), 1);
    }

    #[test]
    fn pause_and_resume_lose_nothing() {
        let mut timer = CountdownTimer::new(1, &[50]).unwrap();
        run(&mut timer, 10);
        assert_eq!(timer.remaining_secs(), 50);

        timer.pause();
        assert!(run(&mut timer, 25).is_empty());
        assert_eq!(timer.remaining_secs(), 50);
        assert!(timer.state().is_paused);

        timer.resume();
        timer.resume();
        let events = run(&mut timer, 50);
        assert!(warnings(&events).is_empty());
        assert_eq!(expiries(&events), 1);
    }

    #[test]
    fn expiry_survives_any_pause_pattern() {
        let mut timer = CountdownTimer::new(1, &[]).unwrap();
        let mut expired = 0;
        for i in 0..200 {
            if i % 7 == 0 {
                timer.pause();
            } else if i % 7 == 3 {
                timer.resume();
            }
            expired += expiries(&timer.tick());
        }
        timer.resume();
        expired += expiries(&run(&mut timer, 120));
        assert_eq!(expired, 1);
        assert_eq!(timer.remaining_secs(), 0);
    }

    #[test]
    fn stopped_timer_never_expires() {
        let mut timer = CountdownTimer::new(1, &[]).unwrap();
        run(&mut timer, 30);
        timer.stop();
        assert!(run(&mut timer, 60).is_empty());
        assert!(!timer.is_running());
        assert_eq!(timer.remaining_secs(), 30);
    }

    #[test]
    fn untimed_exam_builds_no_timer() {
        let settings = ExamSettings::default();
        assert!(CountdownTimer::for_exam(&ExamMeta::new("Quiz", None), &settings).is_none());
        assert!(CountdownTimer::for_exam(&ExamMeta::new("Quiz", Some(0)), &settings).is_none());
        let timer = CountdownTimer::for_exam(&ExamMeta::new("Quiz", Some(2)), &settings).unwrap();
        assert_eq!(timer.state().total_secs, 120);
    }

    #[test]
    fn formats_minutes_and_seconds() {
        assert_eq!(format_remaining(0), "00:00");
        assert_eq!(format_remaining(65), "01:05");
        assert_eq!(format_remaining(5400), "90:00");
    }
}
