use chrono::{DateTime, Duration, Utc};

/// Transient UI hint that hides itself after a fixed interval.
///
/// Showing a new value replaces the current one and restarts the interval.
/// Only the display coalesces; callers keep their own event history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner<T> {
    visible_for: Duration,
    current: Option<(T, DateTime<Utc>)>,
}

impl<T> Banner<T> {
    #[must_use]
    pub fn new(visible_secs: u32) -> Self {
        Self {
            visible_for: Duration::seconds(i64::from(visible_secs)),
            current: None,
        }
    }

    pub fn show(&mut self, value: T, at: DateTime<Utc>) {
        self.current = Some((value, at));
    }

    pub fn clear(&mut self) {
        self.current = None;
    }

    /// The value on display at `now`, if it has not expired yet.
    #[must_use]
    pub fn visible(&self, now: DateTime<Utc>) -> Option<&T> {
        match &self.current {
            Some((value, shown_at)) if now < *shown_at + self.visible_for => Some(value),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;

    #[test]
    fn hides_after_interval() {
        let mut banner = Banner::new(6);
        let now = fixed_now();
        banner.show(300_u32, now);

        assert_eq!(banner.visible(now + Duration::seconds(5)), Some(&300));
        assert_eq!(banner.visible(now + Duration::seconds(6)), None);
    }

    #[test]
    fn new_value_restarts_interval() {
        let mut banner = Banner::new(5);
        let now = fixed_now();
        banner.show("first", now);
        banner.show("second", now + Duration::seconds(4));

        assert_eq!(banner.visible(now + Duration::seconds(8)), Some(&"second"));
        banner.clear();
        assert_eq!(banner.visible(now + Duration::seconds(8)), None);
    }
}
