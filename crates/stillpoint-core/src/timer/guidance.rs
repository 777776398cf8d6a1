//! Meditation guidance text and breathing patterns.
//!
//! Guidance is derived from remaining/total only; the engine does not store it.

use serde::{Deserialize, Serialize};

/// Units the completion message stays up before reverting to the idle prompt.
pub const COMPLETE_HOLD_UNITS: u64 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Guidance {
    Ready,
    /// Shown once when a meditation begins, before the first tick.
    Starting,
    Early,
    MidEarly,
    MidLate,
    Closing,
    Complete,
    Paused,
    Restarting,
}

impl Guidance {
    /// Instruction for a running phase with `remaining` of `total` units left.
    ///
    /// Breakpoints: above 80% early, above 50% mid-early, above 20% mid-late,
    /// then closing until zero.
    pub fn for_progress(remaining: u64, total: u64) -> Self {
        if remaining == 0 {
            return Guidance::Complete;
        }
        // Integer form of `remaining > k * total / 10`.
        let r = remaining.saturating_mul(10);
        if r > total.saturating_mul(8) {
            Guidance::Early
        } else if r > total.saturating_mul(5) {
            Guidance::MidEarly
        } else if r > total.saturating_mul(2) {
            Guidance::MidLate
        } else {
            Guidance::Closing
        }
    }

    /// What to show `units_since` units after a session completed.
    pub fn after_completion(units_since: u64) -> Self {
        if units_since < COMPLETE_HOLD_UNITS {
            Guidance::Complete
        } else {
            Guidance::Ready
        }
    }

    pub fn text(self) -> &'static str {
        match self {
            Guidance::Ready => "Ready for another mindful journey?",
            Guidance::Starting => "Find your center, breathe deeply...",
            Guidance::Early => "Focus on your breath...",
            Guidance::MidEarly => "Let your thoughts drift away...",
            Guidance::MidLate => "Feel the peace within...",
            Guidance::Closing => "Preparing to return...",
            Guidance::Complete => "Session complete. Well done!",
            Guidance::Paused => "Paused - Take your time",
            Guidance::Restarting => "Restarting your journey...",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum BreathStage {
    Inhale,
    Hold,
    Exhale,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BreathingPattern {
    #[serde(rename = "4-7-8")]
    #[default]
    Relaxing,
    #[serde(rename = "box")]
    Box,
    #[serde(rename = "calm")]
    CalmFocus,
}

impl BreathingPattern {
    pub const ALL: [BreathingPattern; 3] = [
        BreathingPattern::Relaxing,
        BreathingPattern::Box,
        BreathingPattern::CalmFocus,
    ];

    /// (inhale, hold, exhale) seconds.
    pub fn counts(self) -> (u64, u64, u64) {
        match self {
            BreathingPattern::Relaxing => (4, 7, 8),
            BreathingPattern::Box => (4, 4, 4),
            BreathingPattern::CalmFocus => (6, 2, 6),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            BreathingPattern::Relaxing => "4-7-8 Relaxing",
            BreathingPattern::Box => "Box Breathing",
            BreathingPattern::CalmFocus => "Calm Focus",
        }
    }

    pub fn cycle_secs(self) -> u64 {
        let (inhale, hold, exhale) = self.counts();
        inhale + hold + exhale
    }

    /// Stage and seconds left in it, `elapsed` seconds into the session.
    pub fn stage_at(self, elapsed: u64) -> (BreathStage, u64) {
        let (inhale, hold, _) = self.counts();
        let pos = elapsed % self.cycle_secs();
        if pos < inhale {
            (BreathStage::Inhale, inhale - pos)
        } else if pos < inhale + hold {
            (BreathStage::Hold, inhale + hold - pos)
        } else {
            (BreathStage::Exhale, self.cycle_secs() - pos)
        }
    }
}

impl std::str::FromStr for BreathingPattern {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "4-7-8" | "relaxing" => Ok(BreathingPattern::Relaxing),
            "4-4-4" | "box" => Ok(BreathingPattern::Box),
            "6-2-6" | "calm" => Ok(BreathingPattern::CalmFocus),
            other => Err(format!("unknown breathing pattern: {other}")),
        }
    }
}
