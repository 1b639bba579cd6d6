use std::fmt;

use serde::Serialize;

/// Above this the student is high risk.
pub const HIGH_RISK_THRESHOLD: f64 = 0.7;
/// At or below this the student is low risk.
pub const LOW_RISK_THRESHOLD: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn from_risk(risk: f64) -> Self {
        if risk > HIGH_RISK_THRESHOLD {
            RiskLevel::High
        } else if risk > LOW_RISK_THRESHOLD {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }

    pub fn headline(self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW RISK",
            RiskLevel::Medium => "MEDIUM RISK",
            RiskLevel::High => "HIGH RISK",
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            RiskLevel::Low => "Continue monitoring",
            RiskLevel::Medium => "Monitor and support",
            RiskLevel::High => "Immediate intervention needed",
        }
    }

    pub fn action(self) -> &'static str {
        match self {
            RiskLevel::Low => "Continue Monitoring",
            RiskLevel::Medium => "Proactive Support",
            RiskLevel::High => "Immediate Action Required",
        }
    }

    pub fn recommendations(self) -> &'static [&'static str] {
        match self {
            RiskLevel::Low => &["Regular progress reviews", "Maintain support systems"],
            RiskLevel::Medium => &[
                "Schedule check-in meeting",
                "Monitor progress closely",
                "Offer tutoring",
            ],
            RiskLevel::High => &[
                "Contact student within 24 hours",
                "Assign academic advisor",
                "Review financial aid",
            ],
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_band_boundaries() {
        assert_eq!(RiskLevel::from_risk(0.71), RiskLevel::High);
        assert_eq!(RiskLevel::from_risk(0.70), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_risk(0.31), RiskLevel::Medium);
        assert_eq!(RiskLevel::from_risk(0.30), RiskLevel::Low);
        assert_eq!(RiskLevel::from_risk(0.0), RiskLevel::Low);
        assert_eq!(RiskLevel::from_risk(1.0), RiskLevel::High);
    }

    #[test]
    fn test_labels_serialize_lowercase() {
        assert_eq!(serde_json::to_string(&RiskLevel::Medium).unwrap(), "\"medium\"");
        assert_eq!(RiskLevel::High.to_string(), "high");
    }

    #[test]
    fn test_every_band_has_recommendations() {
        for level in [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High] {
            assert!(!level.recommendations().is_empty());
        }
    }
}
