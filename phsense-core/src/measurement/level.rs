//! pH level classification

use core::fmt;

/// pH of pure water at 25°C
pub const NEUTRAL_PH: f64 = 7.0;

/// Qualitative pH category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PhLevel {
    Acid,
    Neutral,
    Base,
}

impl PhLevel {
    /// Lower-case label
    pub const fn label(self) -> &'static str {
        match self {
            PhLevel::Acid => "acid",
            PhLevel::Neutral => "neutral",
            PhLevel::Base => "base",
        }
    }
}

impl fmt::Display for PhLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Classify a pH value
///
/// `Neutral` only on exact equality with 7.0. Readings computed from a
/// noisy analog voltage are almost never exactly 7.0, so in practice this
/// returns `Acid` or `Base`. NaN falls through to `Base`.
pub fn classify(ph: f64) -> PhLevel {
    if ph < NEUTRAL_PH {
        PhLevel::Acid
    } else if ph == NEUTRAL_PH {
        PhLevel::Neutral
    } else {
        PhLevel::Base
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_boundaries() {
        assert_eq!(classify(7.0), PhLevel::Neutral);
        assert_eq!(classify(6.99), PhLevel::Acid);
        assert_eq!(classify(7.01), PhLevel::Base);
    }

    #[test]
    fn test_classify_extremes() {
        assert_eq!(classify(0.0), PhLevel::Acid);
        assert_eq!(classify(14.0), PhLevel::Base);
        assert_eq!(classify(-2.0), PhLevel::Acid);
    }

    #[test]
    fn test_near_neutral_is_not_neutral() {
        assert_eq!(classify(7.0 + 1e-12), PhLevel::Base);
        assert_eq!(classify(7.0 - 1e-12), PhLevel::Acid);
    }

    #[test]
    fn test_nan_is_base() {
        assert_eq!(classify(f64::NAN), PhLevel::Base);
    }

    #[test]
    fn test_labels() {
        assert_eq!(PhLevel::Acid.label(), "acid");
        assert_eq!(PhLevel::Neutral.label(), "neutral");
        assert_eq!(PhLevel::Base.label(), "base");
    }
}
