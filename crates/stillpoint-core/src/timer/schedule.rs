use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, ValidationError};

/// Shortest custom meditation length, in minutes.
pub const MIN_MEDITATION_MINUTES: u64 = 1;
/// Longest custom meditation length, in minutes.
pub const MAX_MEDITATION_MINUTES: u64 = 60;
/// Lengths offered in the meditation picker.
pub const MEDITATION_PRESETS: [u64; 7] = [1, 3, 5, 10, 15, 20, 30];

pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(1000);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PhaseKind {
    Meditation,
    Work,
    ShortBreak,
    LongBreak,
}

impl PhaseKind {
    pub fn default_label(self) -> &'static str {
        match self {
            PhaseKind::Meditation => "Meditation",
            PhaseKind::Work => "Work",
            PhaseKind::ShortBreak => "Short Break",
            PhaseKind::LongBreak => "Long Break",
        }
    }

    pub fn is_break(self) -> bool {
        matches!(self, PhaseKind::ShortBreak | PhaseKind::LongBreak)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            PhaseKind::Meditation => "meditation",
            PhaseKind::Work => "work",
            PhaseKind::ShortBreak => "shortBreak",
            PhaseKind::LongBreak => "longBreak",
        }
    }
}

impl std::fmt::Display for PhaseKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub kind: PhaseKind,
    pub duration_secs: u64,
    pub label: String,
}

impl Phase {
    pub fn new(kind: PhaseKind, duration_secs: u64) -> Self {
        Self {
            kind,
            duration_secs,
            label: kind.default_label().to_string(),
        }
    }

    pub fn minutes(kind: PhaseKind, minutes: u64) -> Self {
        Self::new(kind, minutes.saturating_mul(60))
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }
}

/// How the controller moves on once a phase runs out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "camelCase")]
pub enum CyclePolicy {
    /// Run the first phase once, then complete.
    Single,
    /// Work, then a short break, or a long break after every
    /// `long_break_every`-th completed work phase; after any break, work again.
    Cyclic { long_break_every: u32 },
}

/// Immutable description of one session, validated at construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionConfig {
    phases: Vec<Phase>,
    policy: CyclePolicy,
    #[serde(serialize_with = "serialize_millis")]
    tick_interval: Duration,
}

impl SessionConfig {
    /// Validate and build a session configuration.
    ///
    /// # Errors
    ///
    /// Rejects an empty phase list, zero durations, duplicate phase kinds,
    /// a zero tick interval, and cyclic schedules without all three pomodoro
    /// phases or with a zero long-break cadence.
    pub fn new(
        phases: Vec<Phase>,
        policy: CyclePolicy,
        tick_interval: Duration,
    ) -> Result<Self, ConfigError> {
        if phases.is_empty() {
            return Err(ConfigError::EmptySchedule);
        }
        if tick_interval.is_zero() {
            return Err(ConfigError::ZeroTickInterval);
        }
        for (i, phase) in phases.iter().enumerate() {
            if phase.duration_secs == 0 {
                return Err(ConfigError::ZeroDuration {
                    label: phase.label.clone(),
                });
            }
            if phases[..i].iter().any(|p| p.kind == phase.kind) {
                return Err(ConfigError::DuplicatePhase {
                    kind: phase.kind.to_string(),
                });
            }
        }
        if let CyclePolicy::Cyclic { long_break_every } = policy {
            if long_break_every == 0 {
                return Err(ConfigError::ZeroCadence);
            }
            for kind in [PhaseKind::Work, PhaseKind::ShortBreak, PhaseKind::LongBreak] {
                if !phases.iter().any(|p| p.kind == kind) {
                    return Err(ConfigError::MissingPhase {
                        kind: kind.to_string(),
                    });
                }
            }
        }
        Ok(Self {
            phases,
            policy,
            tick_interval,
        })
    }

    /// Single-phase meditation of `minutes` length.
    pub fn meditation(minutes: u64) -> Result<Self, ConfigError> {
        Self::new(
            vec![Phase::minutes(PhaseKind::Meditation, minutes)],
            CyclePolicy::Single,
            DEFAULT_TICK_INTERVAL,
        )
    }

    /// Work/break cycle. Work comes first.
    pub fn pomodoro(
        work_min: u64,
        short_break_min: u64,
        long_break_min: u64,
        long_break_every: u32,
    ) -> Result<Self, ConfigError> {
        Self::new(
            vec![
                Phase::minutes(PhaseKind::Work, work_min),
                Phase::minutes(PhaseKind::ShortBreak, short_break_min),
                Phase::minutes(PhaseKind::LongBreak, long_break_min),
            ],
            CyclePolicy::Cyclic { long_break_every },
            DEFAULT_TICK_INTERVAL,
        )
    }

    pub fn with_tick_interval(mut self, tick_interval: Duration) -> Result<Self, ConfigError> {
        if tick_interval.is_zero() {
            return Err(ConfigError::ZeroTickInterval);
        }
        self.tick_interval = tick_interval;
        Ok(self)
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn policy(&self) -> CyclePolicy {
        self.policy
    }

    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    pub fn first(&self) -> &Phase {
        // Non-empty by construction.
        &self.phases[0]
    }

    pub fn phase(&self, kind: PhaseKind) -> Option<&Phase> {
        self.phases.iter().find(|p| p.kind == kind)
    }

    /// Phase that follows `finished`, given the number of work phases
    /// completed so far (already including `finished` when it was work).
    ///
    /// Returns `None` under the single policy: the session is over.
    pub fn next_after(&self, finished: PhaseKind, completed_work: u32) -> Option<&Phase> {
        match self.policy {
            CyclePolicy::Single => None,
            CyclePolicy::Cyclic { long_break_every } => {
                let next = match finished {
                    PhaseKind::Work if completed_work % long_break_every == 0 => {
                        PhaseKind::LongBreak
                    }
                    PhaseKind::Work => PhaseKind::ShortBreak,
                    PhaseKind::ShortBreak | PhaseKind::LongBreak | PhaseKind::Meditation => {
                        PhaseKind::Work
                    }
                };
                self.phase(next)
            }
        }
    }
}

/// Check a user-entered meditation length.
pub fn validate_meditation_minutes(minutes: u64) -> Result<u64, ValidationError> {
    if (MIN_MEDITATION_MINUTES..=MAX_MEDITATION_MINUTES).contains(&minutes) {
        Ok(minutes)
    } else {
        Err(ValidationError::MeditationMinutes {
            value: minutes,
            min: MIN_MEDITATION_MINUTES,
            max: MAX_MEDITATION_MINUTES,
        })
    }
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis() as u64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn meditation_is_single_phase() {
        let cfg = SessionConfig::meditation(5).unwrap();
        assert_eq!(cfg.phases().len(), 1);
        assert_eq!(cfg.first().duration_secs, 300);
        assert_eq!(cfg.policy(), CyclePolicy::Single);
        assert!(cfg.next_after(PhaseKind::Meditation, 0).is_none());
    }

    #[test]
    fn rejects_empty_and_zero_duration() {
        assert!(matches!(
            SessionConfig::new(vec![], CyclePolicy::Single, DEFAULT_TICK_INTERVAL),
            Err(ConfigError::EmptySchedule)
        ));
        assert!(matches!(
            SessionConfig::meditation(0),
            Err(ConfigError::ZeroDuration { .. })
        ));
        assert!(matches!(
            SessionConfig::meditation(5).unwrap().with_tick_interval(Duration::ZERO),
            Err(ConfigError::ZeroTickInterval)
        ));
    }

    #[test]
    fn cyclic_requires_all_pomodoro_phases() {
        let result = SessionConfig::new(
            vec![
                Phase::minutes(PhaseKind::Work, 25),
                Phase::minutes(PhaseKind::ShortBreak, 5),
            ],
            CyclePolicy::Cyclic { long_break_every: 4 },
            DEFAULT_TICK_INTERVAL,
        );
        assert!(matches!(result, Err(ConfigError::MissingPhase { kind }) if kind == "longBreak"));
        assert!(matches!(
            SessionConfig::pomodoro(25, 5, 15, 0),
            Err(ConfigError::ZeroCadence)
        ));
    }

    #[test]
    fn rejects_duplicate_kinds() {
        let result = SessionConfig::new(
            vec![
                Phase::minutes(PhaseKind::Meditation, 5),
                Phase::minutes(PhaseKind::Meditation, 10),
            ],
            CyclePolicy::Single,
            DEFAULT_TICK_INTERVAL,
        );
        assert!(matches!(result, Err(ConfigError::DuplicatePhase { .. })));
    }

    #[test]
    fn cycle_rule_routes_every_fourth_work_to_long_break() {
        let cfg = SessionConfig::pomodoro(25, 5, 15, 4).unwrap();
        let routes: Vec<PhaseKind> = (1..=8)
            .map(|n| cfg.next_after(PhaseKind::Work, n).unwrap().kind)
            .collect();
        assert_eq!(
            routes,
            vec![
                PhaseKind::ShortBreak,
                PhaseKind::ShortBreak,
                PhaseKind::ShortBreak,
                PhaseKind::LongBreak,
                PhaseKind::ShortBreak,
                PhaseKind::ShortBreak,
                PhaseKind::ShortBreak,
                PhaseKind::LongBreak,
            ]
        );
        assert_eq!(
            cfg.next_after(PhaseKind::LongBreak, 4).unwrap().kind,
            PhaseKind::Work
        );
        assert_eq!(
            cfg.next_after(PhaseKind::ShortBreak, 1).unwrap().kind,
            PhaseKind::Work
        );
    }

    #[test]
    fn meditation_minutes_bounds() {
        assert!(validate_meditation_minutes(0).is_err());
        assert_eq!(validate_meditation_minutes(1).unwrap(), 1);
        assert_eq!(validate_meditation_minutes(60).unwrap(), 60);
        assert!(validate_meditation_minutes(61).is_err());
    }

    #[test]
    fn config_serializes_tick_interval_as_millis() {
        let cfg = SessionConfig::meditation(1).unwrap();
        let json = serde_json::to_value(&cfg).unwrap();
        assert_eq!(json["tick_interval"], 1000);
        assert_eq!(json["policy"]["policy"], "single");
    }
}
