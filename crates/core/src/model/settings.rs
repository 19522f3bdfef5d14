use thiserror::Error;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("warning thresholds must be strictly descending")]
    UnorderedThresholds,

    #[error("warning thresholds must be > 0")]
    ZeroThreshold,

    #[error("warning display seconds must be between 1 and 60")]
    InvalidWarningDisplaySeconds,

    #[error("integrity banner seconds must be between 1 and 60")]
    InvalidBannerSeconds,

    #[error("milestone interval must be > 0")]
    InvalidMilestoneInterval,
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Default second-marks at which a remaining-time warning is raised.
pub const DEFAULT_WARNING_THRESHOLDS: [u32; 4] = [300, 120, 60, 30];

/// Tunables for a single exam attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamSettings {
    warning_thresholds: Vec<u32>,
    warning_display_secs: u32,
    integrity_banner_secs: u32,
    milestone_every: usize,
    require_duration: bool,
}

impl Default for ExamSettings {
    /// Defaults used by the exam front end:
    /// - warnings at 5 min, 2 min, 1 min and 30 s
    /// - warnings stay visible for 6 s, integrity banners for 5 s
    /// - a milestone every 5 answers
    /// - untimed exams allowed
    fn default() -> Self {
        Self {
            warning_thresholds: DEFAULT_WARNING_THRESHOLDS.to_vec(),
            warning_display_secs: 6,
            integrity_banner_secs: 5,
            milestone_every: 5,
            require_duration: false,
        }
    }
}

impl ExamSettings {
    /// Creates custom exam settings.
    ///
    /// # Errors
    ///
    /// Returns `SettingsError` if thresholds are not strictly descending and
    /// positive, or if any interval is out of range.
    pub fn new(
        warning_thresholds: Vec<u32>,
        warning_display_secs: u32,
        integrity_banner_secs: u32,
        milestone_every: usize,
        require_duration: bool,
    ) -> Result<Self, SettingsError> {
        if warning_thresholds.contains(&0) {
            return Err(SettingsError::ZeroThreshold);
        }
        if warning_thresholds.windows(2).any(|pair| pair[0] <= pair[1]) {
            return Err(SettingsError::UnorderedThresholds);
        }
        if !(1..=60).contains(&warning_display_secs) {
            return Err(SettingsError::InvalidWarningDisplaySeconds);
        }
        if !(1..=60).contains(&integrity_banner_secs) {
            return Err(SettingsError::InvalidBannerSeconds);
        }
        if milestone_every == 0 {
            return Err(SettingsError::InvalidMilestoneInterval);
        }

        Ok(Self {
            warning_thresholds,
            warning_display_secs,
            integrity_banner_secs,
            milestone_every,
            require_duration,
        })
    }

    #[must_use]
    pub fn warning_thresholds(&self) -> &[u32] {
        &self.warning_thresholds
    }

    #[must_use]
    pub fn warning_display_secs(&self) -> u32 {
        self.warning_display_secs
    }

    #[must_use]
    pub fn integrity_banner_secs(&self) -> u32 {
        self.integrity_banner_secs
    }

    #[must_use]
    pub fn milestone_every(&self) -> usize {
        self.milestone_every
    }

    /// When true, an exam without a positive duration cannot be started.
    #[must_use]
    pub fn require_duration(&self) -> bool {
        self.require_duration
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_front_end_behaviour() {
        let settings = ExamSettings::default();
        assert_eq!(settings.warning_thresholds(), &[300, 120, 60, 30]);
        assert_eq!(settings.warning_display_secs(), 6);
        assert_eq!(settings.milestone_every(), 5);
        assert!(!settings.require_duration());
    }

    #[test]
    fn ascending_thresholds_are_rejected() {
        let err = ExamSettings::new(vec![30, 60], 6, 5, 5, false).unwrap_err();
        assert_eq!(err, SettingsError::UnorderedThresholds);
    }

    #[test]
    fn duplicate_thresholds_are_rejected() {
        let err = ExamSettings::new(vec![60, 60], 6, 5, 5, false).unwrap_err();
        assert_eq!(err, SettingsError::UnorderedThresholds);
    }

    #[test]
    fn zero_threshold_is_rejected() {
        let err = ExamSettings::new(vec![60, 0], 6, 5, 5, false).unwrap_err();
        assert_eq!(err, SettingsError::ZeroThreshold);
    }

    #[test]
    fn empty_thresholds_are_allowed() {
        let settings = ExamSettings::new(Vec::new(), 6, 5, 1, true).unwrap();
        assert!(settings.warning_thresholds().is_empty());
        assert!(settings.require_duration());
    }
}
