//! Thermal risk classification
//!
//! Maps a scalar temperature estimate to a discrete risk tier, a cooling
//! recommendation, and a bounded cooling-demand score. The mapping is pure
//! and total: every finite estimate produces exactly one tier.

use crate::error::{CoolsenseError, Result};
use serde::{Deserialize, Serialize};

/// Span (°C) over which the demand score ramps from 0 to 100 past `safe_max`.
const DEMAND_SPAN: f64 = 20.0;

/// Tier boundaries. Tiers are half-open and contiguous:
/// `[.., safe_max)` → Safe, `[safe_max, critical_min)` → Moderate,
/// `[critical_min, ..)` → Critical.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    pub safe_max: f64,
    pub critical_min: f64,
}

impl Thresholds {
    /// Canonical thresholds (70/80 °C).
    pub const STANDARD: Thresholds = Thresholds {
        safe_max: 70.0,
        critical_min: 80.0,
    };

    /// Relaxed thresholds (75/85 °C) used by earlier deployments; kept as an
    /// enumerated preset rather than silently merged with the canonical pair.
    pub const LENIENT: Thresholds = Thresholds {
        safe_max: 75.0,
        critical_min: 85.0,
    };

    /// Custom thresholds; `safe_max` must lie strictly below `critical_min`.
    pub fn custom(safe_max: f64, critical_min: f64) -> Result<Self> {
        if !safe_max.is_finite() || !critical_min.is_finite() || safe_max >= critical_min {
            return Err(CoolsenseError::ValidationError(format!(
                "thresholds require safe_max < critical_min, got {safe_max} / {critical_min}"
            )));
        }
        Ok(Self {
            safe_max,
            critical_min,
        })
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self::STANDARD
    }
}

/// Discrete thermal risk tier, ascending severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum RiskTier {
    Safe,
    Moderate,
    Critical,
}

impl RiskTier {
    /// Fixed cooling recommendation for the tier.
    pub fn recommendation(&self) -> &'static str {
        match self {
            RiskTier::Safe => "No intervention required; normal airflow is sufficient.",
            RiskTier::Moderate => {
                "High load: increase active cooling and monitor temperatures closely."
            }
            RiskTier::Critical => {
                "Critical: engage secondary cooling immediately and reduce workload or CPU frequency."
            }
        }
    }
}

impl std::fmt::Display for RiskTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RiskTier::Safe => write!(f, "SAFE"),
            RiskTier::Moderate => write!(f, "MODERATE"),
            RiskTier::Critical => write!(f, "CRITICAL"),
        }
    }
}

/// Tier, recommendation, and demand score for one estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    pub tier: RiskTier,
    pub recommendation: String,
    /// Bounded [0, 100] indicator of overshoot past the safe threshold,
    /// saturating at 20 °C over it.
    pub demand_score: u8,
}

/// Classify a temperature estimate against the given thresholds.
pub fn classify(estimate: f64, thresholds: &Thresholds) -> RiskAssessment {
    let tier = if estimate < thresholds.safe_max {
        RiskTier::Safe
    } else if estimate < thresholds.critical_min {
        RiskTier::Moderate
    } else {
        RiskTier::Critical
    };

    RiskAssessment {
        tier,
        recommendation: tier.recommendation().to_string(),
        demand_score: demand_score(estimate, thresholds),
    }
}

/// Linear cooling-demand indicator: 0 at or below `safe_max`, 100 at
/// `safe_max + 20 °C`, clamped to [0, 100].
pub fn demand_score(estimate: f64, thresholds: &Thresholds) -> u8 {
    let raw = ((estimate - thresholds.safe_max) / DEMAND_SPAN * 100.0).round();
    raw.clamp(0.0, 100.0) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_tier_boundaries_half_open() {
        let t = Thresholds::STANDARD;
        assert_eq!(classify(69.99, &t).tier, RiskTier::Safe);
        assert_eq!(classify(70.0, &t).tier, RiskTier::Moderate);
        assert_eq!(classify(79.99, &t).tier, RiskTier::Moderate);
        assert_eq!(classify(80.0, &t).tier, RiskTier::Critical);
    }

    #[test]
    fn test_demand_score_anchor_points() {
        let t = Thresholds::STANDARD;
        assert_eq!(demand_score(50.0, &t), 0);
        assert_eq!(demand_score(70.0, &t), 0);
        assert_eq!(demand_score(80.0, &t), 50);
        assert_eq!(demand_score(90.0, &t), 100);
        assert_eq!(demand_score(120.0, &t), 100);
    }

    #[test]
    fn test_demand_score_monotone() {
        let t = Thresholds::STANDARD;
        let mut prev = 0u8;
        for step in 0..200 {
            let estimate = 40.0 + step as f64 * 0.5;
            let score = demand_score(estimate, &t);
            assert!(score >= prev, "score not monotone at {estimate}");
            prev = score;
        }
    }

    #[test]
    fn test_lenient_preset_shifts_boundaries() {
        let t = Thresholds::LENIENT;
        assert_eq!(classify(74.9, &t).tier, RiskTier::Safe);
        assert_eq!(classify(75.0, &t).tier, RiskTier::Moderate);
        assert_eq!(classify(85.0, &t).tier, RiskTier::Critical);
    }

    #[test]
    fn test_custom_thresholds_validated() {
        assert!(Thresholds::custom(80.0, 70.0).is_err());
        assert!(Thresholds::custom(70.0, 70.0).is_err());
        assert!(Thresholds::custom(f64::NAN, 80.0).is_err());
        let t = Thresholds::custom(65.0, 90.0).unwrap();
        assert_eq!(t.safe_max, 65.0);
    }

    #[test]
    fn test_recommendation_matches_tier() {
        let t = Thresholds::STANDARD;
        let assessment = classify(95.0, &t);
        assert_eq!(assessment.tier, RiskTier::Critical);
        assert!(assessment.recommendation.contains("secondary cooling"));
        assert_eq!(assessment.recommendation, RiskTier::Critical.recommendation());
    }

    #[test]
    fn test_tiers_ordered_by_severity() {
        assert!(RiskTier::Safe < RiskTier::Moderate);
        assert!(RiskTier::Moderate < RiskTier::Critical);
    }
}
