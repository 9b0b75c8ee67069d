use std::fmt;

use serde::{Deserialize, Serialize};

use crate::app::config::DensityThresholds;

/// Coarse congestion bucket for one lane, ordered by severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Density {
    Low,
    Medium,
    High,
}

impl fmt::Display for Density {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Density::Low => write!(f, "Low"),
            Density::Medium => write!(f, "Medium"),
            Density::High => write!(f, "High"),
        }
    }
}

pub fn classify(vehicle_count: u32, thresholds: &DensityThresholds) -> Density {
    if vehicle_count < thresholds.medium {
        Density::Low
    } else if vehicle_count < thresholds.high {
        Density::Medium
    } else {
        Density::High
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thresholds() -> DensityThresholds {
        DensityThresholds {
            medium: 5,
            high: 15,
        }
    }

    #[test]
    fn boundary_counts() {
        let t = thresholds();
        assert_eq!(classify(0, &t), Density::Low);
        assert_eq!(classify(4, &t), Density::Low);
        assert_eq!(classify(5, &t), Density::Medium);
        assert_eq!(classify(14, &t), Density::Medium);
        assert_eq!(classify(15, &t), Density::High);
        assert_eq!(classify(1000, &t), Density::High);
    }

    #[test]
    fn classification_is_monotonic() {
        let t = thresholds();
        let mut previous = classify(0, &t);
        for count in 1..50 {
            let current = classify(count, &t);
            assert!(current >= previous, "regressed at count {}", count);
            previous = current;
        }
    }

    #[test]
    fn severity_ordering() {
        assert!(Density::Low < Density::Medium);
        assert!(Density::Medium < Density::High);
    }
}
