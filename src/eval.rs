//! Abstract transfer functions.
//!
//! [`eval`] computes a candidate interval for a node from the current
//! bindings of its operands. Every transfer is monotone on the lattice
//! ordered by ⊥ ⊑ x ⊑ `[−∞, +∞]`; that is what makes the fixpoint
//! exist. A binary operator without a precise transfer degrades to the
//! full range of its type rather than failing.

use crate::graph::ConstraintGraph;
use crate::interval::Interval;
use crate::ir::{BinOpKind, Function, Instr, Ty, ValueId};
use crate::numeric::Numeric;

/// Evaluate the constraint of `v` against the graph's current
/// intervals.
pub fn eval(func: &Function, cg: &ConstraintGraph, v: ValueId) -> Interval {
    match func.instr(v) {
        Instr::Param => type_top(func.ty(v)),
        Instr::Const(c) => Interval::point(c.clone()),
        Instr::BinOp { op, x, y } => {
            let xval = cg.interval(*x);
            let yval = cg.interval(*y);
            if xval.is_undefined() || yval.is_undefined() {
                return Interval::undefined();
            }
            if xval.is_empty() || yval.is_empty() {
                return Interval::EMPTY;
            }
            match op {
                BinOpKind::Add => add(&xval, &yval),
                BinOpKind::Sub => add(&xval, &negate(&yval)),
                BinOpKind::Mul => mul(&xval, &yval),
                BinOpKind::Min => min_max(&xval, &yval, true),
                BinOpKind::Max => min_max(&xval, &yval, false),
                op => {
                    log::debug!("no transfer for {}, {} degrades to top", op, v);
                    type_top(func.ty(v))
                }
            }
        }
        Instr::Phi { edges } => edges
            .iter()
            .fold(Interval::undefined(), |acc, &e| acc.union(&cg.interval(e))),
        Instr::Sigma { x, .. } => {
            let isec = cg
                .intersection(v)
                .unwrap_or_else(|| panic!("σ {} has no intersection", v));
            cg.interval(*x).intersect(&isec.interval())
        }
        Instr::Cmp { .. } => panic!("boolean {} cannot be a constraint node", v),
    }
}

/// Full range of a type. Unsigned integers never go below zero.
pub fn type_top(ty: Ty) -> Interval {
    match ty {
        Ty::Int { signed: false } => Interval::new(Numeric::finite(0), Numeric::INF),
        _ => Interval::top(),
    }
}

/// `[a, b] + [c, d] = [a + c, b + d]`.
///
/// An endpoint sum whose sign contradicts its same-signed operands
/// indicates wrap-around and collapses to the corresponding infinity.
fn add(x: &Interval, y: &Interval) -> Interval {
    let (a, b) = (x.lo().unwrap(), x.hi().unwrap());
    let (c, d) = (y.lo().unwrap(), y.hi().unwrap());

    let mut lo = Numeric::NEG_INF;
    if !a.is_neg_inf() && !c.is_neg_inf() {
        lo = a.add(c);
        if a.is_negative() == c.is_negative() && a.is_negative() != lo.is_negative() {
            lo = Numeric::NEG_INF;
        }
    }

    let mut hi = Numeric::INF;
    if !b.is_pos_inf() && !d.is_pos_inf() {
        hi = b.add(d);
        if b.is_negative() == d.is_negative() && b.is_negative() != hi.is_negative() {
            hi = Numeric::INF;
        }
    }

    Interval::new(lo, hi)
}

/// `−[a, b] = [−b, −a]`. Subtraction is addition of the negation.
fn negate(x: &Interval) -> Interval {
    let (a, b) = (x.lo().unwrap(), x.hi().unwrap());
    Interval::new(b.neg(), a.neg())
}

/// `[a, b] * [c, d]`: hull of the four corner products.
fn mul(x: &Interval, y: &Interval) -> Interval {
    let (a, b) = (x.lo().unwrap(), x.hi().unwrap());
    let (c, d) = (y.lo().unwrap(), y.hi().unwrap());

    let corners = [a.mul(c), a.mul(d), b.mul(c), b.mul(d)];
    let lo = corners.iter().min().unwrap().clone();
    let hi = corners.iter().max().unwrap().clone();
    Interval::new(lo, hi)
}

/// Pointwise `min`/`max` of the endpoints.
fn min_max(x: &Interval, y: &Interval, is_min: bool) -> Interval {
    let (a, b) = (x.lo().unwrap(), x.hi().unwrap());
    let (c, d) = (y.lo().unwrap(), y.hi().unwrap());

    if is_min {
        Interval::new(a.min(c).clone(), b.min(d).clone())
    } else {
        Interval::new(a.max(c).clone(), b.max(d).clone())
    }
}
