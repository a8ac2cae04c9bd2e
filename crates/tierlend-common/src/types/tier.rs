//! Tier - Reputation-derived borrower risk class
//!
//! A borrower's reputation score (0-1000) maps onto one of five ordered tiers.
//! The tier determines:
//! - Loan-to-value ceiling per collateral asset
//! - Interest rate per collateral asset
//! - Maximum borrowable amount in USD
//!
//! Scores come from an external provider and are untrusted; they are clamped
//! into range before classification.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::error::ConfigError;

const MAX_SCORE: u16 = crate::MAX_REPUTATION_SCORE;
const MIN_SCORE: u16 = crate::MIN_REPUTATION_SCORE;

/// Borrower tier, ordered by ascending benefit (Diamond is maximal)
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Tier {
    Bronze,
    Silver,
    Gold,
    Platinum,
    Diamond,
}

/// Tier floors, ascending. The only breakpoint table in the crate.
const TIER_FLOORS: [(Tier, u16); 5] = [
    (Tier::Bronze, 0),
    (Tier::Silver, 400),
    (Tier::Gold, 600),
    (Tier::Platinum, 750),
    (Tier::Diamond, 900),
];

impl Tier {
    /// All tiers in ascending order
    pub const ALL: [Tier; 5] = [
        Tier::Bronze,
        Tier::Silver,
        Tier::Gold,
        Tier::Platinum,
        Tier::Diamond,
    ];

    /// Lowest score that classifies into this tier
    pub fn min_score(self) -> u16 {
        TIER_FLOORS[self.index()].1
    }

    /// Position of the tier in ascending order (Bronze = 0)
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// The next tier up, if any
    pub fn next(self) -> Option<Tier> {
        Tier::ALL.get(self.index() + 1).copied()
    }

    /// Next tier and the score span separating this tier's floor from it
    ///
    /// Returns `None` for Diamond.
    pub fn ceiling_for_next_tier(self) -> Option<(Tier, u16)> {
        self.next()
            .map(|next| (next, next.min_score() - self.min_score()))
    }

    /// Tier name as shown to borrowers
    pub fn name(self) -> &'static str {
        match self {
            Tier::Bronze => "Bronze",
            Tier::Silver => "Silver",
            Tier::Gold => "Gold",
            Tier::Platinum => "Platinum",
            Tier::Diamond => "Diamond",
        }
    }
}

impl std::fmt::Display for Tier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Tier {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tier::ALL
            .into_iter()
            .find(|tier| tier.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ConfigError::UnknownTier(s.to_string()))
    }
}

/// Borrower reputation score, always within [0, 1000]
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReputationScore(u16);

impl ReputationScore {
    /// Create a score from an untrusted integer, clamping into range
    pub fn new(raw: i64) -> Self {
        Self(raw.clamp(MIN_SCORE as i64, MAX_SCORE as i64) as u16)
    }

    /// Create a score from an untrusted float (NaN maps to zero)
    pub fn from_untrusted(raw: f64) -> Self {
        if raw.is_nan() {
            return Self(MIN_SCORE);
        }
        Self(raw.clamp(MIN_SCORE as f64, MAX_SCORE as f64).floor() as u16)
    }

    /// Raw score value
    #[inline]
    pub fn value(&self) -> u16 {
        self.0
    }

    /// Tier this score classifies into
    pub fn tier(&self) -> Tier {
        classify(*self)
    }

    /// Progress toward the next tier
    pub fn progress(&self) -> TierProgress {
        let current = self.tier();
        let next = current.next();
        TierProgress {
            score: *self,
            current,
            next,
            points_needed: next.map(|t| t.min_score().saturating_sub(self.0)),
        }
    }
}

impl From<u16> for ReputationScore {
    fn from(raw: u16) -> Self {
        Self::new(raw as i64)
    }
}

impl std::fmt::Display for ReputationScore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.0, MAX_SCORE)
    }
}

/// Where a score sits relative to the tier breakpoints
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierProgress {
    pub score: ReputationScore,
    pub current: Tier,
    /// `None` once Diamond is reached
    pub next: Option<Tier>,
    /// Points still missing to reach `next`
    pub points_needed: Option<u16>,
}

/// Classify a reputation score into its tier
///
/// Total and monotonic non-decreasing in the score.
pub fn classify(score: ReputationScore) -> Tier {
    TIER_FLOORS
        .iter()
        .rev()
        .find(|(_, floor)| score.value() >= *floor)
        .map(|(tier, _)| *tier)
        .unwrap_or(Tier::Bronze)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_boundary_classification() {
        let cases = [
            (0, Tier::Bronze),
            (399, Tier::Bronze),
            (400, Tier::Silver),
            (599, Tier::Silver),
            (600, Tier::Gold),
            (749, Tier::Gold),
            (750, Tier::Platinum),
            (899, Tier::Platinum),
            (900, Tier::Diamond),
            (1000, Tier::Diamond),
        ];
        for (score, expected) in cases {
            assert_eq!(classify(ReputationScore::new(score)), expected, "score {score}");
        }
    }

    #[test]
    fn test_untrusted_scores_are_clamped() {
        assert_eq!(ReputationScore::new(-50).value(), 0);
        assert_eq!(ReputationScore::new(5000).value(), 1000);
        assert_eq!(ReputationScore::from_untrusted(f64::NAN).value(), 0);
        assert_eq!(ReputationScore::from_untrusted(-1.5).value(), 0);
        assert_eq!(ReputationScore::from_untrusted(f64::INFINITY).value(), 1000);
        assert_eq!(ReputationScore::from_untrusted(750.9).tier(), Tier::Platinum);
    }

    #[test]
    fn test_ceiling_for_next_tier() {
        assert_eq!(
            Tier::Bronze.ceiling_for_next_tier(),
            Some((Tier::Silver, 400))
        );
        assert_eq!(Tier::Gold.ceiling_for_next_tier(), Some((Tier::Platinum, 150)));
        assert_eq!(Tier::Diamond.ceiling_for_next_tier(), None);
    }

    #[test]
    fn test_progress() {
        let progress = ReputationScore::new(720).progress();
        assert_eq!(progress.current, Tier::Gold);
        assert_eq!(progress.next, Some(Tier::Platinum));
        assert_eq!(progress.points_needed, Some(30));

        let top = ReputationScore::new(950).progress();
        assert_eq!(top.next, None);
        assert_eq!(top.points_needed, None);
    }

    #[test]
    fn test_tier_parse() {
        assert_eq!("gold".parse::<Tier>().unwrap(), Tier::Gold);
        assert_eq!(" Diamond ".parse::<Tier>().unwrap(), Tier::Diamond);
        assert!(matches!(
            "Iron".parse::<Tier>(),
            Err(ConfigError::UnknownTier(_))
        ));
    }

    #[test]
    fn test_tier_ordering() {
        assert!(Tier::Bronze < Tier::Silver);
        assert!(Tier::Platinum < Tier::Diamond);
        assert_eq!(Tier::ALL.iter().max(), Some(&Tier::Diamond));
    }

    proptest! {
        #[test]
        fn classify_is_monotonic(a in 0i64..=1000, b in 0i64..=1000) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            prop_assert!(classify(ReputationScore::new(lo)) <= classify(ReputationScore::new(hi)));
        }

        #[test]
        fn classify_agrees_with_floors(raw in -2000i64..3000) {
            let score = ReputationScore::new(raw);
            let tier = classify(score);
            prop_assert!(score.value() >= tier.min_score());
            if let Some(next) = tier.next() {
                prop_assert!(score.value() < next.min_score());
            }
        }
    }
}
