//! Constraints attached to σ-nodes.
//!
//! A σ-node refines its input with the knowledge of the branch it sits
//! on. That knowledge is either a concrete interval derived at
//! graph-build time (constant-bounded branch), or a *future*: a bound
//! expressed in terms of another value whose range is not known yet.

use std::fmt;

use crate::interval::Interval;
use crate::ir::{CmpOp, ValueId};
use crate::numeric::Numeric;

/// Constraint a σ-node intersects its input with.
#[derive(Debug, Clone)]
pub enum Intersection {
    Basic(Interval),
    /// A bound expressed against another value's yet-unknown range,
    /// e.g. `[−∞, v3−1]` for the true branch of `x < v3`. Resolved to
    /// `Basic` once the range of `value` stabilizes. `Ne` never occurs
    /// here; it collapses to `Basic([−∞, +∞])` at derivation time.
    Symbolic { op: CmpOp, value: ValueId },
}

impl Intersection {
    /// The concrete interval of this constraint. ⊥ for a still-pending
    /// symbolic constraint, which makes it the identity under
    /// intersection.
    pub fn interval(&self) -> Interval {
        match self {
            Intersection::Basic(ival) => ival.clone(),
            Intersection::Symbolic { .. } => Interval::undefined(),
        }
    }

    /// The value a symbolic constraint is waiting on.
    pub fn future(&self) -> Option<ValueId> {
        match self {
            Intersection::Basic(_) => None,
            Intersection::Symbolic { value, .. } => Some(*value),
        }
    }

    /// Resolve a symbolic constraint against the now-known range of its
    /// referenced value. A still-undefined range resolves to the full
    /// range.
    ///
    /// # Panics
    ///
    /// Panics when called on a `Basic` intersection or on a symbolic
    /// `Ne`, neither of which can arise from a well-formed graph.
    pub fn resolve(&self, referenced: &Interval) -> Interval {
        let op = match self {
            Intersection::Symbolic { op, .. } => *op,
            Intersection::Basic(_) => panic!("resolving a basic intersection"),
        };
        if referenced.is_undefined() {
            return Interval::top();
        }
        let lo = referenced.lo().unwrap();
        let hi = referenced.hi().unwrap();
        match op {
            CmpOp::Lt => Interval::new(Numeric::NEG_INF, hi.add(&Numeric::finite(-1))),
            CmpOp::Gt => Interval::new(lo.add(&Numeric::finite(1)), Numeric::INF),
            CmpOp::Le => Interval::new(Numeric::NEG_INF, hi.clone()),
            CmpOp::Ge => Interval::new(lo.clone(), Numeric::INF),
            CmpOp::Eq => Interval::new(lo.clone(), hi.clone()),
            CmpOp::Ne => panic!("≠ cannot be kept as a symbolic intersection"),
        }
    }
}

impl fmt::Display for Intersection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Intersection::Basic(ival) => write!(f, "{}", ival),
            Intersection::Symbolic { op, value } => match op {
                CmpOp::Lt => write!(f, "[-∞, {}-1]", value),
                CmpOp::Gt => write!(f, "[{}+1, ∞]", value),
                CmpOp::Le => write!(f, "[-∞, {}]", value),
                CmpOp::Ge => write!(f, "[{}, ∞]", value),
                CmpOp::Eq => write!(f, "[{}, {}]", value, value),
                CmpOp::Ne => panic!("≠ cannot be kept as a symbolic intersection"),
            },
        }
    }
}
