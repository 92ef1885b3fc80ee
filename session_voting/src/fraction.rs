use num_bigint::BigInt;
use num_integer::Integer;
use num_traits::{One, Signed, Zero};
use snafu::ensure;

use std::cmp::Ordering;
use std::fmt::Display;
use std::ops::{Add, Mul, Sub};

use crate::config::{DivisionByZeroSnafu, TabulationError};

/// A fraction of two arbitrary-precision integers.
///
/// Majorities are computed with fractions to avoid rounding errors of floating point numbers.
/// The arithmetic operators cross-multiply both operands and never reduce the result,
/// use [Fraction::normalize] for that.
///
/// ```
/// use session_voting::{BigInt, Fraction};
///
/// let half = Fraction::new(1, 2)?;
/// let (votes, rest) = (half * Fraction::from_integer(51)).split();
/// assert_eq!(votes, BigInt::from(25));
/// assert!(!rest.is_zero());
/// # Ok::<(), session_voting::TabulationError>(())
/// ```
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct Fraction {
    numerator: BigInt,
    // Invariant: never zero.
    denominator: BigInt,
}

impl Fraction {
    pub fn new<N: Into<BigInt>, D: Into<BigInt>>(
        numerator: N,
        denominator: D,
    ) -> Result<Fraction, TabulationError> {
        let denominator: BigInt = denominator.into();
        ensure!(!denominator.is_zero(), DivisionByZeroSnafu);
        Ok(Fraction {
            numerator: numerator.into(),
            denominator,
        })
    }

    pub fn from_integer<N: Into<BigInt>>(value: N) -> Fraction {
        Fraction {
            numerator: value.into(),
            denominator: BigInt::one(),
        }
    }

    pub fn numerator(&self) -> &BigInt {
        &self.numerator
    }

    pub fn denominator(&self) -> &BigInt {
        &self.denominator
    }

    /// Returns the reduced fraction, for example 50/100 => 1/2.
    ///
    /// The sign is carried by the numerator of the result.
    pub fn normalize(&self) -> Fraction {
        // The gcd is never zero because the denominator is not.
        let gcd = self.numerator.gcd(&self.denominator);
        let mut numerator = &self.numerator / &gcd;
        let mut denominator = &self.denominator / &gcd;
        if denominator.is_negative() {
            numerator = -numerator;
            denominator = -denominator;
        }
        Fraction {
            numerator,
            denominator,
        }
    }

    /// Splits the fraction into its integer part (rounded down) and the rest.
    ///
    /// For example 10/3 is split into 3 and 1/3. The rest is never negative.
    pub fn split(&self) -> (BigInt, Fraction) {
        let div = self.numerator.div_floor(&self.denominator);
        let rest = self - &Fraction::from_integer(div.clone());
        (div, rest)
    }

    pub fn is_zero(&self) -> bool {
        self.numerator.is_zero()
    }

    pub fn checked_div(&self, other: &Fraction) -> Result<Fraction, TabulationError> {
        Fraction::new(
            &self.numerator * &other.denominator,
            &self.denominator * &other.numerator,
        )
    }

    /// Compares the values of two fractions, 1/2 and 2/4 are equal in this order.
    pub fn value_cmp(&self, other: &Fraction) -> Ordering {
        let a = self.normalize();
        let b = other.normalize();
        (&a.numerator * &b.denominator).cmp(&(&b.numerator * &a.denominator))
    }
}

impl<'a> Add<&'a Fraction> for &'a Fraction {
    type Output = Fraction;
    fn add(self, rhs: &'a Fraction) -> Fraction {
        Fraction {
            numerator: &self.numerator * &rhs.denominator + &rhs.numerator * &self.denominator,
            denominator: &self.denominator * &rhs.denominator,
        }
    }
}

impl<'a> Sub<&'a Fraction> for &'a Fraction {
    type Output = Fraction;
    fn sub(self, rhs: &'a Fraction) -> Fraction {
        Fraction {
            numerator: &self.numerator * &rhs.denominator - &rhs.numerator * &self.denominator,
            denominator: &self.denominator * &rhs.denominator,
        }
    }
}

impl<'a> Mul<&'a Fraction> for &'a Fraction {
    type Output = Fraction;
    fn mul(self, rhs: &'a Fraction) -> Fraction {
        Fraction {
            numerator: &self.numerator * &rhs.numerator,
            denominator: &self.denominator * &rhs.denominator,
        }
    }
}

impl Add for Fraction {
    type Output = Fraction;
    fn add(self, rhs: Fraction) -> Fraction {
        &self + &rhs
    }
}

impl Sub for Fraction {
    type Output = Fraction;
    fn sub(self, rhs: Fraction) -> Fraction {
        &self - &rhs
    }
}

impl Mul for Fraction {
    type Output = Fraction;
    fn mul(self, rhs: Fraction) -> Fraction {
        &self * &rhs
    }
}

impl Display for Fraction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} / {}", self.numerator, self.denominator)
    }
}
