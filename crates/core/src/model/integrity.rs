use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kind of signal suggesting the user left, or tried to leave, the exam.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IntegrityEventKind {
    TabHidden,
    HistoryNavigation,
    OutboundLink,
    UnloadAttempt,
}

impl IntegrityEventKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            IntegrityEventKind::TabHidden => "tab-hidden",
            IntegrityEventKind::HistoryNavigation => "history-navigation",
            IntegrityEventKind::OutboundLink => "outbound-link",
            IntegrityEventKind::UnloadAttempt => "unload-attempt",
        }
    }
}

impl fmt::Display for IntegrityEventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegrityEvent {
    pub kind: IntegrityEventKind,
    pub at: DateTime<Utc>,
}

impl IntegrityEvent {
    #[must_use]
    pub fn new(kind: IntegrityEventKind, at: DateTime<Utc>) -> Self {
        Self { kind, at }
    }
}

/// Append-only record of integrity events for one attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IntegrityLog {
    events: Vec<IntegrityEvent>,
}

impl IntegrityLog {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, event: IntegrityEvent) {
        self.events.push(event);
    }

    #[must_use]
    pub fn events(&self) -> &[IntegrityEvent] {
        &self.events
    }

    /// Every recorded event counts as one violation.
    #[must_use]
    pub fn violation_count(&self) -> u32 {
        u32::try_from(self.events.len()).unwrap_or(u32::MAX)
    }

    #[must_use]
    pub fn count_of(&self, kind: IntegrityEventKind) -> usize {
        self.events.iter().filter(|e| e.kind == kind).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn repeated_events_are_kept_separately() {
        let mut log = IntegrityLog::new();
        for _ in 0..3 {
            log.append(IntegrityEvent::new(IntegrityEventKind::TabHidden, fixed_now()));
        }
        log.append(IntegrityEvent::new(
            IntegrityEventKind::OutboundLink,
            fixed_now(),
        ));

        assert_eq!(log.violation_count(), 4);
        assert_eq!(log.count_of(IntegrityEventKind::TabHidden), 3);
        assert_eq!(log.events()[3].kind, IntegrityEventKind::OutboundLink);
    }

    #[test]
    fn kind_labels_use_kebab_case() {
        assert_eq!(IntegrityEventKind::HistoryNavigation.to_string(), "history-navigation");
        assert_eq!(IntegrityEventKind::UnloadAttempt.as_str(), "unload-attempt");
    }
}
