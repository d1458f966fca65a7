use std::env;
use std::time::Duration;

/// Section length used when the backend sends no remaining time (42 minutes).
pub const DEFAULT_SECTION_SECONDS: u32 = 2520;

/// Tunables for exam sessions.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExamConfig {
    pub default_section_seconds: u32,
    pub tick_period: Duration,
}

impl Default for ExamConfig {
    fn default() -> Self {
        Self {
            default_section_seconds: DEFAULT_SECTION_SECONDS,
            tick_period: Duration::from_secs(1),
        }
    }
}

impl ExamConfig {
    /// Defaults overridden by `EXAM_DEFAULT_SECTION_SECONDS` and `EXAM_TICK_MILLIS`.
    ///
    /// Unparsable or zero values are ignored.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(secs) = read_positive("EXAM_DEFAULT_SECTION_SECONDS") {
            config.default_section_seconds = u32::try_from(secs).unwrap_or(u32::MAX);
        }
        if let Some(millis) = read_positive("EXAM_TICK_MILLIS") {
            config.tick_period = Duration::from_millis(millis);
        }
        config
    }
}

fn read_positive(key: &str) -> Option<u64> {
    env::var(key)
        .ok()
        .and_then(|raw| raw.trim().parse::<u64>().ok())
        .filter(|value| *value > 0)
}
