//! Severity classification of posterior failure probabilities.
//!
//! The ladder is a pure step function over the posterior: total, deterministic
//! and monotonic. Break points come from configuration (`[severity]`) and can
//! be replaced per cohort through `severity_thresholds` in the catalog.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Ordered severity tiers, `Low < Moderate < High < Critical < Severe`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeverityTier {
    Low,
    Moderate,
    High,
    Critical,
    Severe,
}

impl SeverityTier {
    pub const ALL: [SeverityTier; 5] = [
        SeverityTier::Low,
        SeverityTier::Moderate,
        SeverityTier::High,
        SeverityTier::Critical,
        SeverityTier::Severe,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            SeverityTier::Low => "low",
            SeverityTier::Moderate => "moderate",
            SeverityTier::High => "high",
            SeverityTier::Critical => "critical",
            SeverityTier::Severe => "severe",
        }
    }
}

impl fmt::Display for SeverityTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_moderate() -> f64 {
    0.03
}
fn default_high() -> f64 {
    0.07
}
fn default_critical() -> f64 {
    0.12
}
fn default_severe() -> f64 {
    0.20
}

/// Lower bounds (inclusive) of each tier above `Low`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeverityLadder {
    #[serde(default = "default_moderate")]
    pub moderate: f64,
    #[serde(default = "default_high")]
    pub high: f64,
    #[serde(default = "default_critical")]
    pub critical: f64,
    #[serde(default = "default_severe")]
    pub severe: f64,
}

impl Default for SeverityLadder {
    fn default() -> Self {
        Self {
            moderate: default_moderate(),
            high: default_high(),
            critical: default_critical(),
            severe: default_severe(),
        }
    }
}

impl SeverityLadder {
    pub fn new(moderate: f64, high: f64, critical: f64, severe: f64) -> Self {
        Self {
            moderate,
            high,
            critical,
            severe,
        }
    }

    /// Break points in ascending tier order.
    pub fn break_points(&self) -> [f64; 4] {
        [self.moderate, self.high, self.critical, self.severe]
    }

    /// Map a posterior probability onto its tier.
    ///
    /// NaN is treated as the lowest tier so the function stays total.
    pub fn classify(&self, probability: f64) -> SeverityTier {
        match probability {
            p if p >= self.severe => SeverityTier::Severe,
            p if p >= self.critical => SeverityTier::Critical,
            p if p >= self.high => SeverityTier::High,
            p if p >= self.moderate => SeverityTier::Moderate,
            _ => SeverityTier::Low,
        }
    }

    /// Check that break points are finite, inside (0, 1) and strictly ascending.
    pub fn validate(&self) -> Result<(), String> {
        let points = self.break_points();
        if let Some(p) = points.iter().find(|p| !p.is_finite() || **p <= 0.0 || **p >= 1.0) {
            return Err(format!("severity threshold {} must lie in (0, 1)", p));
        }
        if points.windows(2).any(|w| w[0] >= w[1]) {
            return Err(format!(
                "severity thresholds must be strictly ascending, got {:?}",
                points
            ));
        }
        Ok(())
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn classification_is_monotonic(a in 0.0..1.0f64, b in 0.0..1.0f64) {
            let ladder = SeverityLadder::default();
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(ladder.classify(lo) <= ladder.classify(hi));
        }
    }
}
