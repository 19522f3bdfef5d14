//! Integrity monitoring.
//!
//! The monitor listens to host environment signals (visibility, history,
//! link clicks, unload) while an attempt runs and records the ones that
//! suggest the user left the exam. It only observes: exam data is never
//! touched, and whether to warn the user is up to the caller.

use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

use crate::model::{IntegrityEvent, IntegrityEventKind, IntegrityLog, SessionLifecycle};

/// Environment signal source the monitor can subscribe to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SignalKind {
    Visibility,
    History,
    LinkClick,
    BeforeUnload,
    PageHide,
}

impl SignalKind {
    pub const ALL: [SignalKind; 5] = [
        SignalKind::Visibility,
        SignalKind::History,
        SignalKind::LinkClick,
        SignalKind::BeforeUnload,
        SignalKind::PageHide,
    ];
}

impl fmt::Display for SignalKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SignalKind::Visibility => "visibility",
            SignalKind::History => "history",
            SignalKind::LinkClick => "link-click",
            SignalKind::BeforeUnload => "before-unload",
            SignalKind::PageHide => "page-hide",
        };
        f.write_str(label)
    }
}

/// The host cannot deliver a signal kind. Non-fatal: that signal is skipped.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
#[error("{0} signals are not available in this environment")]
pub struct CapabilityUnavailable(pub SignalKind);

/// Handle returned by the environment for a registered listener.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Host environment hooks used by the monitor.
pub trait ExamEnvironment: Send {
    /// Register a listener for `kind`.
    ///
    /// # Errors
    ///
    /// Returns `CapabilityUnavailable` when the host cannot deliver `kind`.
    fn add_listener(&mut self, kind: SignalKind) -> Result<ListenerId, CapabilityUnavailable>;

    fn remove_listener(&mut self, id: ListenerId);

    /// Undo a back/forward navigation by restoring the exam location.
    fn reassert_location(&mut self);
}

/// Signal raised by the host environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnvironmentSignal {
    VisibilityChanged { hidden: bool },
    HistoryNavigated,
    LinkActivated { href: String, exam_exit: bool },
    /// The user asked to close or leave; they may still cancel.
    BeforeUnload,
    /// The page is actually going away.
    PageHide,
}

impl EnvironmentSignal {
    #[must_use]
    pub fn kind(&self) -> SignalKind {
        match self {
            EnvironmentSignal::VisibilityChanged { .. } => SignalKind::Visibility,
            EnvironmentSignal::HistoryNavigated => SignalKind::History,
            EnvironmentSignal::LinkActivated { .. } => SignalKind::LinkClick,
            EnvironmentSignal::BeforeUnload => SignalKind::BeforeUnload,
            EnvironmentSignal::PageHide => SignalKind::PageHide,
        }
    }
}

/// What the host should do with the signal it just reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalAction {
    None,
    PreventDefault,
    /// Location was restored through [`ExamEnvironment::reassert_location`].
    ReassertLocation,
    /// Ask the user to confirm before leaving.
    ConfirmLeave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SignalResponse {
    pub event: Option<IntegrityEvent>,
    pub action: SignalAction,
}

impl SignalResponse {
    fn ignored() -> Self {
        Self {
            event: None,
            action: SignalAction::None,
        }
    }
}

/// Listener registry and append-only integrity log for one attempt.
#[derive(Debug, Default)]
pub struct IntegrityMonitor {
    listeners: Vec<(SignalKind, ListenerId)>,
    log: IntegrityLog,
    started: bool,
}

impl IntegrityMonitor {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to every signal the environment supports.
    ///
    /// Returns the kinds that could not be monitored. Calling `start` on a
    /// running monitor does nothing.
    pub fn start(&mut self, env: &mut dyn ExamEnvironment) -> Vec<SignalKind> {
        if self.started {
            return Vec::new();
        }
        self.started = true;

        let mut skipped = Vec::new();
        for kind in SignalKind::ALL {
            match env.add_listener(kind) {
                Ok(id) => self.listeners.push((kind, id)),
                Err(err) => {
                    tracing::warn!(signal = %kind, "integrity signal not monitored: {err}");
                    skipped.push(kind);
                }
            }
        }
        skipped
    }

    /// Unsubscribe every listener. Safe to call repeatedly.
    pub fn stop(&mut self, env: &mut dyn ExamEnvironment) {
        for (_, id) in self.listeners.drain(..) {
            env.remove_listener(id);
        }
        self.started = false;
    }

    #[must_use]
    pub fn is_monitoring(&self, kind: SignalKind) -> bool {
        self.listeners.iter().any(|(k, _)| *k == kind)
    }

    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    #[must_use]
    pub fn log(&self) -> &IntegrityLog {
        &self.log
    }

    #[must_use]
    pub fn violation_count(&self) -> u32 {
        self.log.violation_count()
    }

    /// Classify one environment signal.
    ///
    /// Every qualifying signal is logged as its own event, however quickly
    /// they repeat.
    pub fn handle(
        &mut self,
        env: &mut dyn ExamEnvironment,
        signal: &EnvironmentSignal,
        lifecycle: SessionLifecycle,
        at: DateTime<Utc>,
    ) -> SignalResponse {
        if !self.is_monitoring(signal.kind()) {
            return SignalResponse::ignored();
        }

        let active = lifecycle.is_active();
        match signal {
            EnvironmentSignal::VisibilityChanged { hidden: true } if active => {
                self.record(IntegrityEventKind::TabHidden, SignalAction::None, at)
            }
            EnvironmentSignal::HistoryNavigated if active => {
                env.reassert_location();
                self.record(
                    IntegrityEventKind::HistoryNavigation,
                    SignalAction::ReassertLocation,
                    at,
                )
            }
            EnvironmentSignal::LinkActivated {
                exam_exit: false,
                href,
            } if active => {
                tracing::debug!(%href, "outbound link blocked");
                self.record(
                    IntegrityEventKind::OutboundLink,
                    SignalAction::PreventDefault,
                    at,
                )
            }
            EnvironmentSignal::BeforeUnload if !lifecycle.is_terminal() => SignalResponse {
                event: None,
                action: SignalAction::ConfirmLeave,
            },
            EnvironmentSignal::PageHide if !lifecycle.is_terminal() => {
                self.record(IntegrityEventKind::UnloadAttempt, SignalAction::None, at)
            }
            _ => SignalResponse::ignored(),
        }
    }

    fn record(
        &mut self,
        kind: IntegrityEventKind,
        action: SignalAction,
        at: DateTime<Utc>,
    ) -> SignalResponse {
        let event = IntegrityEvent::new(kind, at);
        self.log.append(event);
        tracing::debug!(kind = %kind, total = self.log.violation_count(), "integrity event");
        SignalResponse {
            event: Some(event),
            action,
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::collections::HashSet;

    /// Environment double that tracks live listeners.
    #[derive(Debug, Default)]
    pub struct RecordingEnvironment {
        pub unsupported: HashSet<SignalKind>,
        pub live: Vec<(ListenerId, SignalKind)>,
        pub reasserts: usize,
        next_id: u64,
    }

    impl ExamEnvironment for RecordingEnvironment {
        fn add_listener(&mut self, kind: SignalKind) -> Result<ListenerId, CapabilityUnavailable> {
            if self.unsupported.contains(&kind) {
                return Err(CapabilityUnavailable(kind));
            }
            self.next_id += 1;
            let id = ListenerId(self.next_id);
            self.live.push((id, kind));
            Ok(id)
        }

        fn remove_listener(&mut self, id: ListenerId) {
            self.live.retain(|(live, _)| *live != id);
        }

        fn reassert_location(&mut self) {
            self.reasserts += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::RecordingEnvironment;
    use super::*;
    use crate::time::fixed_now;

    fn started() -> (IntegrityMonitor, RecordingEnvironment) {
        let mut env = RecordingEnvironment::default();
        let mut monitor = IntegrityMonitor::new();
        assert!(monitor.start(&mut env).is_empty());
        (monitor, env)
    }

    #[test]
    fn start_and_stop_balance_listeners() {
        let (mut monitor, mut env) = started();
        assert_eq!(env.live.len(), SignalKind::ALL.len());
        assert_eq!(monitor.listener_count(), SignalKind::ALL.len());

        monitor.start(&mut env);
        assert_eq!(env.live.len(), SignalKind::ALL.len());

        monitor.stop(&mut env);
        monitor.stop(&mut env);
        assert!(env.live.is_empty());
        assert_eq!(monitor.listener_count(), 0);
    }

    #[test]
    fn every_hidden_tab_is_recorded() {
        let (mut monitor, mut env) = started();
        for _ in 0..3 {
            let hidden = EnvironmentSignal::VisibilityChanged { hidden: true };
            let shown = EnvironmentSignal::VisibilityChanged { hidden: false };
            monitor.handle(&mut env, &hidden, SessionLifecycle::InProgress, fixed_now());
            monitor.handle(&mut env, &shown, SessionLifecycle::InProgress, fixed_now());
        }
        assert_eq!(monitor.log().count_of(IntegrityEventKind::TabHidden), 3);
        assert_eq!(monitor.violation_count(), 3);
    }

    #[test]
    fn hidden_tab_outside_active_phases_is_ignored() {
        let (mut monitor, mut env) = started();
        let hidden = EnvironmentSignal::VisibilityChanged { hidden: true };
        let response = monitor.handle(&mut env, &hidden, SessionLifecycle::Submitting, fixed_now());
        assert_eq!(response.event, None);
        assert_eq!(monitor.violation_count(), 0);
    }

    #[test]
    fn history_navigation_is_neutralised() {
        let (mut monitor, mut env) = started();
        let response = monitor.handle(
            &mut env,
            &EnvironmentSignal::HistoryNavigated,
            SessionLifecycle::Reviewing,
            fixed_now(),
        );
        assert_eq!(response.action, SignalAction::ReassertLocation);
        assert_eq!(env.reasserts, 1);
        assert_eq!(
            response.event.map(|e| e.kind),
            Some(IntegrityEventKind::HistoryNavigation)
        );
    }

    #[test]
    fn only_unapproved_links_are_blocked() {
        let (mut monitor, mut env) = started();
        let outbound = EnvironmentSignal::LinkActivated {
            href: "https://example.com".into(),
            exam_exit: false,
        };
        let exit = EnvironmentSignal::LinkActivated {
            href: "/exams".into(),
            exam_exit: true,
        };

        let blocked = monitor.handle(&mut env, &outbound, SessionLifecycle::InProgress, fixed_now());
        let allowed = monitor.handle(&mut env, &exit, SessionLifecycle::InProgress, fixed_now());

        assert_eq!(blocked.action, SignalAction::PreventDefault);
        assert_eq!(allowed.action, SignalAction::None);
        assert_eq!(monitor.violation_count(), 1);
    }

    #[test]
    fn unload_asks_for_confirmation_and_logs_only_when_it_proceeds() {
        let (mut monitor, mut env) = started();
        let ask = monitor.handle(
            &mut env,
            &EnvironmentSignal::BeforeUnload,
            SessionLifecycle::Submitting,
            fixed_now(),
        );
        assert_eq!(ask.action, SignalAction::ConfirmLeave);
        assert_eq!(monitor.violation_count(), 0);

        let gone = monitor.handle(
            &mut env,
            &EnvironmentSignal::PageHide,
            SessionLifecycle::InProgress,
            fixed_now(),
        );
        assert_eq!(
            gone.event.map(|e| e.kind),
            Some(IntegrityEventKind::UnloadAttempt)
        );

        let done = monitor.handle(
            &mut env,
            &EnvironmentSignal::BeforeUnload,
            SessionLifecycle::Completed,
            fixed_now(),
        );
        assert_eq!(done.action, SignalAction::None);
    }

    #[test]
    fn missing_capability_degrades_to_remaining_signals() {
        let mut env = RecordingEnvironment::default();
        env.unsupported.insert(SignalKind::Visibility);
        let mut monitor = IntegrityMonitor::new();

        let skipped = monitor.start(&mut env);
        assert_eq!(skipped, vec![SignalKind::Visibility]);
        assert!(!monitor.is_monitoring(SignalKind::Visibility));

        let hidden = EnvironmentSignal::VisibilityChanged { hidden: true };
        monitor.handle(&mut env, &hidden, SessionLifecycle::InProgress, fixed_now());
        monitor.handle(
            &mut env,
            &EnvironmentSignal::HistoryNavigated,
            SessionLifecycle::InProgress,
            fixed_now(),
        );
        assert_eq!(monitor.violation_count(), 1);
    }

    #[test]
    fn stopped_monitor_ignores_signals() {
        let (mut monitor, mut env) = started();
        monitor.stop(&mut env);
        let response = monitor.handle(
            &mut env,
            &EnvironmentSignal::HistoryNavigated,
            SessionLifecycle::InProgress,
            fixed_now(),
        );
        assert_eq!(response, SignalResponse::ignored());
        assert_eq!(env.reasserts, 0);
    }
}
