//! The interval lattice over extended integers.
//!
//! An [`Interval`] is one of three things:
//!
//! - **Undefined (⊥)**: no information yet. The initial binding of every
//!   constraint-graph node.
//! - **Empty**: `hi < lo`, canonically `[+∞, −∞]`. Absorbing for
//!   intersection.
//! - **Proper**: `lo ≤ hi`, either endpoint possibly infinite.
//!
//! # Lattice Structure
//!
//! - **Union** (`⊔`): convex hull; ⊥ and Empty are identities.
//! - **Intersect** (`⊓`): `[max(lo₁, lo₂), min(hi₁, hi₂)]`; Empty is
//!   absorbing; ⊥ is the identity.
//!
//! Endpoint presence is all-or-nothing: the one-sided state is not
//! representable.

use std::fmt;

use num_bigint::BigInt;

use crate::numeric::Numeric;

/// An interval `[lo, hi]` over `ℤ ∪ {−∞, +∞}`, or ⊥.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    bounds: Option<(Numeric, Numeric)>,
}

impl Interval {
    /// The canonical empty interval `[+∞, −∞]`.
    pub const EMPTY: Self = Interval {
        bounds: Some((Numeric::INF, Numeric::NEG_INF)),
    };

    /// ⊥, the "no information yet" element.
    pub const fn undefined() -> Self {
        Interval { bounds: None }
    }

    pub fn new(lo: Numeric, hi: Numeric) -> Self {
        Interval { bounds: Some((lo, hi)) }
    }

    /// `[−∞, +∞]`, the full range.
    pub const fn top() -> Self {
        Interval {
            bounds: Some((Numeric::NEG_INF, Numeric::INF)),
        }
    }

    /// The singleton interval `[n, n]`.
    pub fn point(n: impl Into<BigInt>) -> Self {
        let n = n.into();
        Interval::new(Numeric::Finite(n.clone()), Numeric::Finite(n))
    }

    pub fn lo(&self) -> Option<&Numeric> {
        self.bounds.as_ref().map(|(lo, _)| lo)
    }

    pub fn hi(&self) -> Option<&Numeric> {
        self.bounds.as_ref().map(|(_, hi)| hi)
    }

    pub fn is_undefined(&self) -> bool {
        self.bounds.is_none()
    }

    /// `hi < lo`. ⊥ is not empty.
    pub fn is_empty(&self) -> bool {
        match &self.bounds {
            None => false,
            Some((lo, hi)) => hi < lo,
        }
    }

    /// Convex hull. ⊥ and Empty are identities.
    pub fn union(&self, other: &Interval) -> Interval {
        if self.is_empty() || self.is_undefined() {
            return other.clone();
        }
        if other.is_empty() || other.is_undefined() {
            return self.clone();
        }
        let (a, b) = self.bounds.as_ref().unwrap();
        let (c, d) = other.bounds.as_ref().unwrap();
        Interval::new(a.min(c).clone(), b.max(d).clone())
    }

    /// `[max(lo₁, lo₂), min(hi₁, hi₂)]`. Empty is absorbing, ⊥ is the
    /// identity. May produce an empty result.
    pub fn intersect(&self, other: &Interval) -> Interval {
        if self.is_empty() || other.is_empty() {
            return Interval::EMPTY;
        }
        if self.is_undefined() {
            return other.clone();
        }
        if other.is_undefined() {
            return self.clone();
        }
        let (a, b) = self.bounds.as_ref().unwrap();
        let (c, d) = other.bounds.as_ref().unwrap();
        let lo = a.max(c).clone();
        let hi = b.min(d).clone();
        if hi < lo {
            // Canonical form for the empty result.
            Interval::EMPTY
        } else {
            Interval::new(lo, hi)
        }
    }

    /// Membership test for a concrete value. False for ⊥ and Empty.
    pub fn contains(&self, n: &BigInt) -> bool {
        match &self.bounds {
            None => false,
            Some((lo, hi)) => {
                let n = Numeric::Finite(n.clone());
                *lo <= n && n <= *hi
            }
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.bounds {
            None => write!(f, "[⊥, ⊥]"),
            Some((lo, hi)) => write!(f, "[{}, {}]", lo, hi),
        }
    }
}
