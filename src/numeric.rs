//! Extended integers: `ℤ ∪ {−∞, +∞}`.
//!
//! Interval endpoints are drawn from the integers extended with two
//! infinities. Finite values are arbitrary-precision ([`BigInt`]), so
//! branch thresholds wider than a machine word are represented exactly.
//!
//! # Total order
//!
//! `−∞ < every finite value < +∞`; two infinities of the same sign
//! compare equal.

use std::cmp::Ordering;
use std::fmt;

use num_bigint::BigInt;
use num_traits::Zero;

/// An extended integer: finite (arbitrary precision) or `±∞`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Numeric {
    Finite(BigInt),
    Infinity { negative: bool },
}

impl Numeric {
    pub const INF: Self = Numeric::Infinity { negative: false };
    pub const NEG_INF: Self = Numeric::Infinity { negative: true };

    pub fn finite(value: impl Into<BigInt>) -> Self {
        Numeric::Finite(value.into())
    }

    pub fn is_finite(&self) -> bool {
        matches!(self, Numeric::Finite(_))
    }

    pub fn is_pos_inf(&self) -> bool {
        matches!(self, Numeric::Infinity { negative: false })
    }

    pub fn is_neg_inf(&self) -> bool {
        matches!(self, Numeric::Infinity { negative: true })
    }

    /// Sign test used by the overflow collapse in the `+` transfer.
    /// Zero counts as non-negative.
    pub fn is_negative(&self) -> bool {
        match self {
            Numeric::Finite(n) => n.sign() == num_bigint::Sign::Minus,
            Numeric::Infinity { negative } => *negative,
        }
    }

    /// Extended addition.
    ///
    /// `+∞ + x = +∞` for any `x ≠ −∞`, and symmetrically for `−∞`.
    /// Finite operands add exactly, without wrap.
    ///
    /// # Panics
    ///
    /// Panics on `+∞ + −∞`, which has no defined value and must never
    /// arise from the transfer functions.
    pub fn add(&self, other: &Numeric) -> Numeric {
        match (self, other) {
            (Numeric::Infinity { negative: a }, Numeric::Infinity { negative: b }) if a != b => {
                panic!("∞ + -∞ is not defined")
            }
            (inf @ Numeric::Infinity { .. }, _) => inf.clone(),
            (_, inf @ Numeric::Infinity { .. }) => inf.clone(),
            (Numeric::Finite(x), Numeric::Finite(y)) => Numeric::Finite(x + y),
        }
    }

    pub fn neg(&self) -> Numeric {
        match self {
            Numeric::Finite(n) => Numeric::Finite(-n),
            Numeric::Infinity { negative } => Numeric::Infinity { negative: !negative },
        }
    }

    /// Extended multiplication, used by the `*` transfer's corner
    /// products. Finite zero absorbs an infinity: `0 · ±∞ = 0`.
    pub fn mul(&self, other: &Numeric) -> Numeric {
        match (self, other) {
            (Numeric::Finite(x), Numeric::Finite(y)) => Numeric::Finite(x * y),
            (Numeric::Finite(z), Numeric::Infinity { .. }) if z.is_zero() => Numeric::finite(0),
            (Numeric::Infinity { .. }, Numeric::Finite(z)) if z.is_zero() => Numeric::finite(0),
            (Numeric::Infinity { negative: a }, Numeric::Infinity { negative: b }) => {
                Numeric::Infinity { negative: a != b }
            }
            (Numeric::Infinity { negative }, fin @ Numeric::Finite(_))
            | (fin @ Numeric::Finite(_), Numeric::Infinity { negative }) => {
                Numeric::Infinity { negative: *negative != fin.is_negative() }
            }
        }
    }
}

impl Ord for Numeric {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Numeric::Infinity { negative: a }, Numeric::Infinity { negative: b }) => b.cmp(a),
            (Numeric::Infinity { negative: true }, Numeric::Finite(_)) => Ordering::Less,
            (Numeric::Infinity { negative: false }, Numeric::Finite(_)) => Ordering::Greater,
            (Numeric::Finite(_), Numeric::Infinity { negative: true }) => Ordering::Greater,
            (Numeric::Finite(_), Numeric::Infinity { negative: false }) => Ordering::Less,
            (Numeric::Finite(x), Numeric::Finite(y)) => x.cmp(y),
        }
    }
}

impl PartialOrd for Numeric {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl From<i64> for Numeric {
    fn from(value: i64) -> Self {
        Numeric::finite(value)
    }
}

impl fmt::Display for Numeric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Numeric::Finite(n) => write!(f, "{}", n),
            Numeric::Infinity { negative: true } => write!(f, "-∞"),
            Numeric::Infinity { negative: false } => write!(f, "∞"),
        }
    }
}
