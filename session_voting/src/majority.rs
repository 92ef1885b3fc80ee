use log::debug;
use num_traits::ToPrimitive;
use snafu::ensure;

use std::cmp::Ordering;
use std::str::FromStr;

use crate::config::*;
use crate::fraction::Fraction;

/// Description of the simple majority, as stored by the sessions.
pub const SIMPLE_MAJORITY: &str = "50";
/// Description of the two-thirds majority, as stored by the sessions.
pub const TWO_THIRDS_MAJORITY: &str = "2/3";

/// The majority required for a voting to pass.
///
/// A majority of 1/2 means that strictly more than half of the votes are required.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum Majority {
    /// More than 1/2 of the votes.
    Simple,
    /// More than 2/3 of the votes.
    TwoThirds,
    /// More than the given share of the votes. Must be between 0 and 1.
    Fraction(Fraction),
}

impl Majority {
    /// Parses one of the named majorities ("50" or "2/3").
    pub fn from_description(description: &str) -> Result<Majority, TabulationError> {
        match description {
            SIMPLE_MAJORITY => Ok(Majority::Simple),
            TWO_THIRDS_MAJORITY => Ok(Majority::TwoThirds),
            _ => InvalidMajoritySpecificationSnafu { description }.fail(),
        }
    }

    pub fn description(&self) -> String {
        match self {
            Majority::Simple => SIMPLE_MAJORITY.to_string(),
            Majority::TwoThirds => TWO_THIRDS_MAJORITY.to_string(),
            Majority::Fraction(f) => f.to_string(),
        }
    }

    /// The share of the votes that must be exceeded.
    pub fn fraction(&self) -> Result<Fraction, TabulationError> {
        match self {
            Majority::Simple => Fraction::new(1, 2),
            Majority::TwoThirds => Fraction::new(2, 3),
            Majority::Fraction(f) => {
                let in_range = f.value_cmp(&Fraction::from_integer(0)) != Ordering::Less
                    && f.value_cmp(&Fraction::from_integer(1)) != Ordering::Greater;
                ensure!(in_range, MajorityOutOfRangeSnafu { fraction: f.clone() });
                Ok(f.clone())
            }
        }
    }

    /// See [majority_threshold].
    pub fn threshold(&self, total_weight: u64) -> Result<u64, TabulationError> {
        majority_threshold(self, total_weight)
    }
}

impl FromStr for Majority {
    type Err = TabulationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Majority::from_description(s)
    }
}

/// Computes the number of votes that must be exceeded for a majority.
///
/// The result is `floor(majority * total_weight)`, computed without rounding errors:
/// with 51 voters and a simple majority the threshold is 25, that is more than 25
/// votes are required. Use [passes] to compare a count of votes with the threshold.
pub fn majority_threshold(majority: &Majority, total_weight: u64) -> Result<u64, TabulationError> {
    let fraction = majority.fraction()?;
    let required = &fraction * &Fraction::from_integer(total_weight);
    let (votes_required, rest) = required.split();
    debug!(
        "majority_threshold: majority: {} total_weight: {} required: {} rest: {}",
        fraction, total_weight, votes_required, rest
    );
    // The majority is at most 1, so the threshold is at most the total weight.
    Ok(votes_required.to_u64().unwrap_or(total_weight))
}

/// True if the votes strictly exceed the threshold.
///
/// Reaching the threshold exactly is not enough, also when the exact share is a whole number.
pub fn passes(votes_for: u64, threshold: u64) -> bool {
    votes_for > threshold
}

#[cfg(test)]
mod tests {
    use super::*;

    fn custom(n: i64, d: i64) -> Majority {
        Majority::Fraction(Fraction::new(n, d).unwrap())
    }

    #[test]
    fn simple_majority_needs_more_than_half() {
        assert_eq!(majority_threshold(&Majority::Simple, 51).unwrap(), 25);
        let threshold = majority_threshold(&Majority::Simple, 10).unwrap();
        assert_eq!(threshold, 5);
        assert!(!passes(5, threshold));
        assert!(passes(6, threshold));
    }

    #[test]
    fn two_thirds_majority() {
        assert_eq!(Majority::TwoThirds.threshold(30).unwrap(), 20);
        assert!(!passes(20, 20));
        assert_eq!(Majority::TwoThirds.threshold(10).unwrap(), 6);
        assert!(passes(7, 6));
    }

    #[test]
    fn custom_majorities() {
        assert_eq!(custom(3, 4).threshold(100).unwrap(), 75);
        assert_eq!(custom(1, 1).threshold(17).unwrap(), 17);
        assert_eq!(custom(0, 5).threshold(17).unwrap(), 0);
        // Non reduced fractions behave like the reduced ones.
        assert_eq!(custom(50, 100).threshold(51).unwrap(), 25);
        assert_eq!(custom(-1, -2).threshold(51).unwrap(), 25);
    }

    #[test]
    fn zero_weight_has_zero_threshold() {
        for m in [Majority::Simple, Majority::TwoThirds, custom(3, 4)] {
            assert_eq!(m.threshold(0).unwrap(), 0);
        }
    }

    #[test]
    fn threshold_is_monotonic() {
        for m in [Majority::Simple, Majority::TwoThirds, custom(5, 7)] {
            let mut previous = 0;
            for w in 0..500u64 {
                let t = m.threshold(w).unwrap();
                assert!(previous <= t, "{:?} {} {} {}", m, w, previous, t);
                assert!(t <= w);
                previous = t;
            }
        }
    }

    #[test]
    fn large_weights() {
        assert_eq!(Majority::Simple.threshold(u64::MAX).unwrap(), u64::MAX / 2);
        assert_eq!(custom(1, 1).threshold(u64::MAX).unwrap(), u64::MAX);
    }

    #[test]
    fn invalid_specifications() {
        assert!(matches!(
            Majority::from_description("60"),
            Err(TabulationError::InvalidMajoritySpecification { .. })
        ));
        assert!(matches!(
            "".parse::<Majority>(),
            Err(TabulationError::InvalidMajoritySpecification { .. })
        ));
        assert!(matches!(
            custom(3, 2).threshold(10),
            Err(TabulationError::MajorityOutOfRange { .. })
        ));
        assert!(matches!(
            custom(-1, 2).threshold(10),
            Err(TabulationError::MajorityOutOfRange { .. })
        ));
    }

    #[test]
    fn descriptions_round_trip() {
        assert_eq!("50".parse::<Majority>().unwrap(), Majority::Simple);
        assert_eq!("2/3".parse::<Majority>().unwrap(), Majority::TwoThirds);
        assert_eq!(Majority::TwoThirds.description(), "2/3");
        assert_eq!(custom(3, 4).description(), "3 / 4");
    }
}
