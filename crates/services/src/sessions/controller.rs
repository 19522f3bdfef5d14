use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use exam_core::Clock;
use exam_core::banner::Banner;
use exam_core::model::{ExamResult, IntegrityEvent, IntegrityLog, SessionLifecycle};
use exam_core::monitor::{EnvironmentSignal, ExamEnvironment, IntegrityMonitor, SignalResponse};
use exam_core::timer::{CountdownTimer, TimerEvent, TimerState};
use storage::repository::ResultRepository;

use super::host::ExamHost;
use super::progress::ReviewSummary;
use super::service::{AnswerOutcome, ExamSession};
use super::timer_task::{self, TimerEvents, TimerHandle};
use super::view::ResultId;
use crate::error::SessionError;

/// How a submission request ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// The result was scored and stored; the attempt is completed.
    Completed { result_id: ResultId },
    /// The attempt had already left the active phases. Nothing happened.
    Ignored,
}

/// What triggered a submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubmitCause {
    User,
    TimeUp,
}

/// Drives one attempt: owns the session record, the countdown task and the
/// integrity monitor, and hands the finished result to the persistence sink.
///
/// All methods run to completion on the caller's task; the countdown only
/// talks to the controller through the events returned by `confirm_start`.
pub struct ExamController {
    session: ExamSession,
    monitor: IntegrityMonitor,
    env: Box<dyn ExamEnvironment>,
    timer: Option<TimerHandle>,
    last_tick: Option<TimerState>,
    warning_banner: Banner<u32>,
    integrity_banner: Banner<IntegrityEvent>,
    results: Arc<dyn ResultRepository>,
    host: Arc<dyn ExamHost>,
    clock: Clock,
    pending: Option<ExamResult>,
    result_id: Option<ResultId>,
}

impl ExamController {
    #[must_use]
    pub fn new(
        session: ExamSession,
        env: Box<dyn ExamEnvironment>,
        results: Arc<dyn ResultRepository>,
        host: Arc<dyn ExamHost>,
        clock: Clock,
    ) -> Self {
        let settings = session.settings();
        let warning_banner = Banner::new(settings.warning_display_secs());
        let integrity_banner = Banner::new(settings.integrity_banner_secs());
        Self {
            session,
            monitor: IntegrityMonitor::new(),
            env,
            timer: None,
            last_tick: None,
            warning_banner,
            integrity_banner,
            results,
            host,
            clock,
            pending: None,
            result_id: None,
        }
    }

    #[must_use]
    pub fn session(&self) -> &ExamSession {
        &self.session
    }

    #[must_use]
    pub fn lifecycle(&self) -> SessionLifecycle {
        self.session.lifecycle()
    }

    #[must_use]
    pub fn integrity_log(&self) -> &IntegrityLog {
        self.monitor.log()
    }

    #[must_use]
    pub fn violation_count(&self) -> u32 {
        self.monitor.violation_count()
    }

    /// Latest countdown snapshot, or `None` for an untimed attempt.
    #[must_use]
    pub fn timer_state(&self) -> Option<TimerState> {
        self.timer
            .as_ref()
            .map(TimerHandle::state)
            .or(self.last_tick)
    }

    /// Listeners currently registered with the environment.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.monitor.listener_count()
    }

    /// Countdown tasks still alive. Zero after teardown.
    #[must_use]
    pub fn running_timers(&self) -> usize {
        self.timer.iter().filter(|t| t.is_running()).count()
    }

    #[must_use]
    pub fn result_id(&self) -> Option<ResultId> {
        self.result_id
    }

    /// Result held for persistence, or the stored one once completed.
    #[must_use]
    pub fn result(&self) -> Option<&ExamResult> {
        self.pending.as_ref()
    }

    /// Current time on the controller's clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Move a fixed clock forward. No effect on the system clock.
    pub fn advance_clock(&mut self, delta: Duration) {
        self.clock.advance(delta);
    }

    #[must_use]
    pub fn visible_warning(&self, now: DateTime<Utc>) -> Option<u32> {
        self.warning_banner.visible(now).copied()
    }

    #[must_use]
    pub fn visible_integrity_banner(&self, now: DateTime<Utc>) -> Option<&IntegrityEvent> {
        self.integrity_banner.visible(now)
    }

    //
    // ─── LIFECYCLE ─────────────────────────────────────────────────────────────
    //

    pub fn request_start(&mut self) -> bool {
        self.session.request_start()
    }

    pub fn cancel_start(&mut self) -> bool {
        self.session.cancel_start()
    }

    /// Start the attempt: validate, start the countdown and the monitor.
    ///
    /// Returns the countdown's event stream, or `None` for an untimed exam.
    /// The stream is the only way expiry reaches [`Self::on_timer_event`].
    ///
    /// # Errors
    ///
    /// Returns `SessionError::InvalidExamConfiguration` or
    /// `SessionError::AlreadyStarted`; nothing is started in that case.
    #[must_use = "the countdown's expiry is only delivered through the returned stream"]
    pub fn confirm_start(&mut self) -> Result<Option<TimerEvents>, SessionError> {
        let now = self.clock.now();
        self.session.confirm_start(now)?;

        let skipped = self.monitor.start(self.env.as_mut());
        if !skipped.is_empty() {
            tracing::info!(
                skipped = skipped.len(),
                "integrity monitoring running with reduced coverage"
            );
        }

        let countdown = CountdownTimer::for_exam(self.session.exam().meta(), self.session.settings());
        let events = countdown.map(|timer| {
            tracing::debug!(total_secs = timer.state().total_secs, "countdown started");
            self.last_tick = Some(timer.state());
            let (handle, events) = timer_task::spawn(timer);
            self.timer = Some(handle);
            events
        });
        Ok(events)
    }

    //
    // ─── USER INPUT ────────────────────────────────────────────────────────────
    //

    pub fn record_answer(&mut self, index: usize, value: impl Into<String>) -> AnswerOutcome {
        let outcome = self.session.record_answer(index, value);
        if let Some(milestone) = outcome.milestone() {
            tracing::debug!(?milestone, "milestone reached");
            self.host.on_milestone(milestone);
        }
        outcome
    }

    pub fn toggle_flag(&mut self, index: usize) -> Option<bool> {
        self.session.toggle_flag(index)
    }

    pub fn navigate(&mut self, index: usize) -> bool {
        self.session.navigate(index)
    }

    pub fn next_question(&mut self) -> bool {
        self.session.next_question()
    }

    pub fn previous_question(&mut self) -> bool {
        self.session.previous_question()
    }

    pub fn enter_review(&mut self) -> Option<ReviewSummary> {
        self.session.enter_review()
    }

    pub fn resume_from_review(&mut self) -> bool {
        self.session.resume_from_review()
    }

    /// Ask the countdown to pause. Ignored outside an active timed attempt.
    pub fn pause_timer(&mut self) -> bool {
        match &self.timer {
            Some(timer) if self.session.lifecycle().is_active() => {
                timer.pause();
                true
            }
            _ => false,
        }
    }

    pub fn resume_timer(&mut self) -> bool {
        match &self.timer {
            Some(timer) if self.session.lifecycle().is_active() => {
                timer.resume();
                true
            }
            _ => false,
        }
    }

    //
    // ─── TIMER & INTEGRITY ─────────────────────────────────────────────────────
    //

    /// React to one countdown event.
    ///
    /// # Errors
    ///
    /// Propagates submission errors when the event is the expiry.
    pub async fn on_timer_event(&mut self, event: TimerEvent) -> Result<SubmitOutcome, SessionError> {
        if !self.session.lifecycle().is_active() {
            return Ok(SubmitOutcome::Ignored);
        }
        match event {
            TimerEvent::Tick(state) => {
                self.last_tick = Some(state);
                Ok(SubmitOutcome::Ignored)
            }
            TimerEvent::Warning { mark } => {
                tracing::info!(mark, "time warning");
                self.warning_banner.show(mark, self.clock.now());
                self.host.on_timer_warning(mark);
                Ok(SubmitOutcome::Ignored)
            }
            TimerEvent::Expired => self.on_timer_expired().await,
        }
    }

    /// Forced submission at time-up. Skips any confirmation step.
    ///
    /// # Errors
    ///
    /// See [`Self::request_submit`].
    pub async fn on_timer_expired(&mut self) -> Result<SubmitOutcome, SessionError> {
        if !self.session.lifecycle().is_active() {
            return Ok(SubmitOutcome::Ignored);
        }
        if let Some(state) = self.last_tick.as_mut() {
            state.remaining_secs = 0;
        }
        tracing::info!("time is up");
        self.host.on_time_up();
        self.submit(SubmitCause::TimeUp).await
    }

    /// Classify an environment signal and notify the host of any violation.
    pub fn handle_signal(&mut self, signal: &EnvironmentSignal) -> SignalResponse {
        let now = self.clock.now();
        let response =
            self.monitor
                .handle(self.env.as_mut(), signal, self.session.lifecycle(), now);
        if let Some(event) = response.event {
            self.integrity_banner.show(event, now);
            self.host.on_integrity_event(&event);
        }
        response
    }

    //
    // ─── SUBMISSION ────────────────────────────────────────────────────────────
    //

    /// User-initiated submission. Never refused while the attempt is active;
    /// a repeated call returns `SubmitOutcome::Ignored`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Storage` when the sink rejects the result. The
    /// attempt then stays in `Submitting` with the result held for
    /// [`Self::finalize_result`].
    pub async fn request_submit(&mut self) -> Result<SubmitOutcome, SessionError> {
        self.submit(SubmitCause::User).await
    }

    async fn submit(&mut self, cause: SubmitCause) -> Result<SubmitOutcome, SessionError> {
        let now = self.clock.now();
        let time_taken_secs = self.time_taken_secs();
        if !self.session.begin_submission(now) {
            return Ok(SubmitOutcome::Ignored);
        }
        if let Some(timer) = &self.timer {
            timer.stop();
        }

        self.host.on_submit(self.session.answers());
        let result =
            self.session
                .build_result(now, time_taken_secs, self.monitor.violation_count())?;
        tracing::info!(
            ?cause,
            score = result.score(),
            correct = result.correct_count(),
            total = result.total_questions(),
            violations = result.integrity_violation_count(),
            "exam submitted"
        );
        self.pending = Some(result);
        self.persist().await
    }

    /// Retry persisting a held result without rescoring.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotSubmitting` if nothing is awaiting
    /// persistence, or `SessionError::Storage` if the sink fails again.
    pub async fn finalize_result(&mut self) -> Result<ResultId, SessionError> {
        if let Some(id) = self.result_id {
            return Ok(id);
        }
        if self.session.lifecycle() != SessionLifecycle::Submitting || self.pending.is_none() {
            return Err(SessionError::NotSubmitting);
        }
        match self.persist().await? {
            SubmitOutcome::Completed { result_id } => Ok(result_id),
            SubmitOutcome::Ignored => Err(SessionError::NotSubmitting),
        }
    }

    async fn persist(&mut self) -> Result<SubmitOutcome, SessionError> {
        let Some(result) = self.pending.as_ref() else {
            return Err(SessionError::NotSubmitting);
        };
        let id = match self.results.append_result(result).await {
            Ok(id) => id,
            Err(err) => {
                tracing::warn!(attempt = %result.attempt_id(), "result not persisted: {err}");
                return Err(err.into());
            }
        };

        self.result_id = Some(id);
        self.session.complete();
        self.teardown().await;
        tracing::info!(result_id = id, "exam completed");
        Ok(SubmitOutcome::Completed { result_id: id })
    }

    fn time_taken_secs(&self) -> u32 {
        match self.timer_state() {
            Some(state) => state.elapsed_secs(),
            None => self
                .session
                .started_at()
                .map_or(0, |started| self.clock.seconds_since(started)),
        }
    }

    //
    // ─── TEARDOWN ──────────────────────────────────────────────────────────────
    //

    /// Stop the countdown task and unregister every listener. Idempotent.
    pub async fn teardown(&mut self) {
        if let Some(timer) = self.timer.take() {
            self.last_tick = Some(timer.state());
            timer.shutdown().await;
        }
        self.monitor.stop(self.env.as_mut());
        self.warning_banner.clear();
        self.integrity_banner.clear();
    }

    /// Abandon the attempt through an approved exit without submitting.
    pub async fn discard(&mut self) {
        if !self.session.is_complete() {
            tracing::info!(lifecycle = %self.session.lifecycle(), "exam session discarded");
        }
        self.teardown().await;
    }
}

impl Drop for ExamController {
    fn drop(&mut self) {
        self.monitor.stop(self.env.as_mut());
    }
}
