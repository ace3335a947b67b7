//! Constraint-graph construction.
//!
//! The graph's nodes are the integer-typed values of a function. Edges
//! are not stored: the def→use relation of the IR, filtered to admitted
//! nodes, is the edge set, extended by implicit *future* edges from a
//! value to every σ-node whose symbolic intersection references it.
//!
//! Each σ-node carries an [`Intersection`] derived from the controlling
//! branch of the block it was renamed out of. Only conditionals produce
//! intersections; in SSI form conditionals are exactly what σ-nodes are
//! inserted for.

use std::collections::{BTreeSet, HashMap};

use num_bigint::BigInt;

use crate::intersection::Intersection;
use crate::interval::Interval;
use crate::ir::{BlockId, CmpOp, Control, Function, Instr, ValueId};

pub struct ConstraintGraph {
    /// Admitted values, ascending. Iteration order is the analysis
    /// order, so it must be deterministic.
    nodes: BTreeSet<ValueId>,
    /// σ-node constraints. Every admitted σ has an entry.
    intersections: HashMap<ValueId, Intersection>,
    /// Current interval binding per node; absent means ⊥.
    intervals: HashMap<ValueId, Interval>,
}

impl ConstraintGraph {
    /// Walk the function and admit every integer-typed value. For each
    /// admitted σ-node, derive its intersection from the controlling
    /// branch.
    pub fn build(func: &Function) -> Self {
        let mut cg = ConstraintGraph {
            nodes: BTreeSet::new(),
            intersections: HashMap::new(),
            intervals: HashMap::new(),
        };

        for b in func.block_ids() {
            for &v in func.block(b).instrs() {
                if !func.ty(v).is_integer() {
                    continue;
                }
                cg.nodes.insert(v);

                if let Instr::Sigma { x, from } = *func.instr(v) {
                    let isec = derive_intersection(func, v, x, from, b);
                    log::debug!("{}: σ {} gets {}", func.name(), v, isec);
                    cg.intersections.insert(v, isec);
                }
            }
        }

        cg
    }

    pub fn contains(&self, v: ValueId) -> bool {
        self.nodes.contains(&v)
    }

    pub fn nodes(&self) -> impl Iterator<Item = ValueId> + '_ {
        self.nodes.iter().copied()
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    /// Current binding of `v`; ⊥ when nothing is known yet.
    pub fn interval(&self, v: ValueId) -> Interval {
        self.intervals.get(&v).cloned().unwrap_or_else(Interval::undefined)
    }

    pub(crate) fn set_interval(&mut self, v: ValueId, ival: Interval) {
        self.intervals.insert(v, ival);
    }

    pub fn intersection(&self, v: ValueId) -> Option<&Intersection> {
        self.intersections.get(&v)
    }

    pub(crate) fn set_intersection(&mut self, v: ValueId, isec: Intersection) {
        self.intersections.insert(v, isec);
    }

    /// Pending futures: `(σ-node, referenced value)` pairs, ascending
    /// by σ-node.
    pub(crate) fn pending_futures(&self) -> Vec<(ValueId, ValueId)> {
        let mut futures: Vec<(ValueId, ValueId)> = self
            .intersections
            .iter()
            .filter_map(|(&sigma, isec)| isec.future().map(|u| (sigma, u)))
            .collect();
        futures.sort_unstable();
        futures
    }

    pub(crate) fn into_intervals(self) -> HashMap<ValueId, Interval> {
        self.intervals
    }

    /// Render the constraint set, one line per node, for debugging.
    pub fn constraints_string(&self, func: &Function) -> String {
        use std::fmt::Write as _;

        let mut out = String::new();
        for v in self.nodes() {
            match func.instr(v) {
                Instr::Param => writeln!(out, "{} = param", v),
                Instr::Const(c) => writeln!(out, "{} = {}", v, c),
                Instr::BinOp { op, x, y } => writeln!(out, "{} = {} {} {}", v, x, op, y),
                Instr::Phi { edges } => {
                    let args: Vec<String> = edges.iter().map(|e| e.to_string()).collect();
                    writeln!(out, "{} = φ({})", v, args.join(", "))
                }
                Instr::Sigma { x, .. } => {
                    writeln!(out, "{} = {} ∩ {}", v, x, self.intersections[&v])
                }
                Instr::Cmp { .. } => Ok(()),
            }
            .unwrap();
        }
        out
    }
}

/// Derive the intersection of σ-node `sigma` (renaming `x`, placed in
/// `block`) from the controlling branch of `from`.
fn derive_intersection(
    func: &Function,
    sigma: ValueId,
    x: ValueId,
    from: BlockId,
    block: BlockId,
) -> Intersection {
    let top = Intersection::Basic(Interval::top());

    let cond = match func.block(from).control() {
        Control::If { cond, .. } => cond,
        // A σ whose origin block does not branch gives us nothing to
        // refine with.
        _ => {
            log::debug!("σ {} from non-branching {}", sigma, from);
            return top;
        }
    };

    let (op, cx, cy) = match *func.instr(cond) {
        Instr::Cmp { op, x, y } => (op, x, y),
        // We do not know how to derive information from other
        // condition shapes.
        _ => return top,
    };

    // The σ is on the else branch iff its block is the second successor
    // of the branching block.
    let on_else = func.block(from).succs().get(1) == Some(&block);

    match (func.const_value(cx), func.const_value(cy)) {
        (Some(_), Some(_)) => {
            // Comparing two constants tells us nothing about x.
            top
        }
        (lc, rc) if lc.is_some() != rc.is_some() => {
            // Variable against constant. A constant on the left flips
            // the operator.
            let (variable, k, op) = if let Some(k) = lc {
                (cy, k, op.flip())
            } else {
                (cx, rc.unwrap(), op)
            };
            if variable != x {
                return top;
            }
            let op = if on_else { op.negate() } else { op };
            Intersection::Basic(constant_bound(op, k))
        }
        _ => {
            // Variable against variable.
            if cx == cy || (cx != x && cy != x) {
                return top;
            }
            let (other, op) = if cx == x { (cy, op) } else { (cx, op.flip()) };
            let op = if on_else { op.negate() } else { op };
            match op {
                // We cannot represent exclusion of a single range.
                CmpOp::Ne => top,
                _ => Intersection::Symbolic { op, value: other },
            }
        }
    }
}

/// The interval implied by `x ⊕ k` for a constant threshold `k`.
fn constant_bound(op: CmpOp, k: &BigInt) -> Interval {
    use crate::numeric::Numeric;

    let one = BigInt::from(1);
    match op {
        CmpOp::Lt => Interval::new(Numeric::NEG_INF, Numeric::Finite(k - &one)),
        CmpOp::Gt => Interval::new(Numeric::Finite(k + &one), Numeric::INF),
        CmpOp::Le => Interval::new(Numeric::NEG_INF, Numeric::Finite(k.clone())),
        CmpOp::Ge => Interval::new(Numeric::Finite(k.clone()), Numeric::INF),
        CmpOp::Eq => Interval::new(Numeric::Finite(k.clone()), Numeric::Finite(k.clone())),
        // Not representable in a single interval.
        CmpOp::Ne => Interval::top(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Ty;
    use crate::numeric::Numeric;

    fn ival(lo: Numeric, hi: Numeric) -> Interval {
        Interval::new(lo, hi)
    }

    /// `if a ⊕ k` with σ-nodes for `a` on both branches; returns
    /// `(func, then σ, else σ)`.
    fn branch_on_const(op: CmpOp, k: i64, const_on_left: bool) -> (Function, ValueId, ValueId) {
        let mut f = Function::new("f");
        let b0 = f.add_block();
        let b1 = f.add_block();
        let b2 = f.add_block();
        let a = f.param(b0, Ty::INT);
        let k = f.const_int(b0, k);
        let c = if const_on_left {
            f.cmp(b0, op, k, a)
        } else {
            f.cmp(b0, op, a, k)
        };
        f.br_if(b0, c, b1, b2);
        let s_then = f.sigma(b1, a, b0);
        let s_else = f.sigma(b2, a, b0);
        f.ret(b1, Some(s_then));
        f.ret(b2, Some(s_else));
        (f, s_then, s_else)
    }

    #[test]
    fn test_admits_only_integers() {
        let mut f = Function::new("f");
        let b0 = f.add_block();
        let a = f.param(b0, Ty::INT);
        let k = f.const_int(b0, 0);
        let c = f.cmp(b0, CmpOp::Lt, a, k);
        f.ret(b0, None);

        let cg = ConstraintGraph::build(&f);
        assert!(cg.contains(a));
        assert!(cg.contains(k));
        assert!(!cg.contains(c));
        assert_eq!(cg.num_nodes(), 2);
    }

    #[test]
    fn test_lt_const_both_branches() {
        let (f, s_then, s_else) = branch_on_const(CmpOp::Lt, 100, false);
        let cg = ConstraintGraph::build(&f);

        // a < 100: then [−∞, 99], else (a ≥ 100) [100, ∞].
        assert_eq!(
            cg.intersection(s_then).unwrap().interval(),
            ival(Numeric::NEG_INF, Numeric::finite(99))
        );
        assert_eq!(
            cg.intersection(s_else).unwrap().interval(),
            ival(Numeric::finite(100), Numeric::INF)
        );
    }

    #[test]
    fn test_const_on_left_flips() {
        // 100 > a is a < 100.
        let (f, s_then, s_else) = branch_on_const(CmpOp::Gt, 100, true);
        let cg = ConstraintGraph::build(&f);

        assert_eq!(
            cg.intersection(s_then).unwrap().interval(),
            ival(Numeric::NEG_INF, Numeric::finite(99))
        );
        assert_eq!(
            cg.intersection(s_else).unwrap().interval(),
            ival(Numeric::finite(100), Numeric::INF)
        );
    }

    #[test]
    fn test_eq_and_ne_const() {
        let (f, s_then, s_else) = branch_on_const(CmpOp::Eq, 7, false);
        let cg = ConstraintGraph::build(&f);

        // a == 7: then [7, 7]; else is a ≠ 7, not representable.
        assert_eq!(cg.intersection(s_then).unwrap().interval(), Interval::point(7));
        assert_eq!(cg.intersection(s_else).unwrap().interval(), Interval::top());

        let (f, s_then, s_else) = branch_on_const(CmpOp::Ne, 0, false);
        let cg = ConstraintGraph::build(&f);
        assert_eq!(cg.intersection(s_then).unwrap().interval(), Interval::top());
        assert_eq!(cg.intersection(s_else).unwrap().interval(), Interval::point(0));
    }

    #[test]
    fn test_le_ge_const() {
        let (f, s_then, s_else) = branch_on_const(CmpOp::Le, 10, false);
        let cg = ConstraintGraph::build(&f);
        assert_eq!(
            cg.intersection(s_then).unwrap().interval(),
            ival(Numeric::NEG_INF, Numeric::finite(10))
        );
        assert_eq!(
            cg.intersection(s_else).unwrap().interval(),
            ival(Numeric::finite(11), Numeric::INF)
        );
    }

    #[test]
    fn test_unrelated_condition() {
        let mut f = Function::new("f");
        let b0 = f.add_block();
        let b1 = f.add_block();
        let a = f.param(b0, Ty::INT);
        let b = f.param(b0, Ty::INT);
        let k = f.const_int(b0, 5);
        let c = f.cmp(b0, CmpOp::Lt, b, k);
        f.br_if(b0, c, b1, b1);
        // The branch talks about b, not a.
        let s = f.sigma(b1, a, b0);
        f.ret(b1, Some(s));

        let cg = ConstraintGraph::build(&f);
        assert_eq!(cg.intersection(s).unwrap().interval(), Interval::top());
    }

    #[test]
    fn test_var_var_symbolic() {
        let mut f = Function::new("f");
        let b0 = f.add_block();
        let b1 = f.add_block();
        let b2 = f.add_block();
        let a = f.param(b0, Ty::INT);
        let b = f.param(b0, Ty::INT);
        let c = f.cmp(b0, CmpOp::Lt, a, b);
        f.br_if(b0, c, b1, b2);
        let sa = f.sigma(b1, a, b0);
        let sb = f.sigma(b1, b, b0);
        let sa_else = f.sigma(b2, a, b0);
        f.ret(b1, None);
        f.ret(b2, Some(sa_else));

        let cg = ConstraintGraph::build(&f);

        // a < b: σ(a) waits on b with <, σ(b) waits on a with > (sides
        // flipped), and the else σ(a) waits on b with ≥.
        match cg.intersection(sa).unwrap() {
            Intersection::Symbolic { op, value } => {
                assert_eq!(*op, CmpOp::Lt);
                assert_eq!(*value, b);
            }
            other => panic!("expected symbolic, got {}", other),
        }
        match cg.intersection(sb).unwrap() {
            Intersection::Symbolic { op, value } => {
                assert_eq!(*op, CmpOp::Gt);
                assert_eq!(*value, a);
            }
            other => panic!("expected symbolic, got {}", other),
        }
        match cg.intersection(sa_else).unwrap() {
            Intersection::Symbolic { op, value } => {
                assert_eq!(*op, CmpOp::Ge);
                assert_eq!(*value, b);
            }
            other => panic!("expected symbolic, got {}", other),
        }
    }

    #[test]
    fn test_var_var_ne_collapses() {
        let mut f = Function::new("f");
        let b0 = f.add_block();
        let b1 = f.add_block();
        let b2 = f.add_block();
        let a = f.param(b0, Ty::INT);
        let b = f.param(b0, Ty::INT);
        let c = f.cmp(b0, CmpOp::Ne, a, b);
        f.br_if(b0, c, b1, b2);
        let s_then = f.sigma(b1, a, b0);
        let s_else = f.sigma(b2, a, b0);
        f.ret(b1, Some(s_then));
        f.ret(b2, Some(s_else));

        let cg = ConstraintGraph::build(&f);
        // a ≠ b is not representable; a == b on the else branch is.
        assert_eq!(cg.intersection(s_then).unwrap().interval(), Interval::top());
        match cg.intersection(s_else).unwrap() {
            Intersection::Symbolic { op, value } => {
                assert_eq!(*op, CmpOp::Eq);
                assert_eq!(*value, b);
            }
            other => panic!("expected symbolic, got {}", other),
        }
    }

    #[test]
    fn test_self_comparison() {
        let mut f = Function::new("f");
        let b0 = f.add_block();
        let b1 = f.add_block();
        let a = f.param(b0, Ty::INT);
        let c = f.cmp(b0, CmpOp::Lt, a, a);
        f.br_if(b0, c, b1, b1);
        let s = f.sigma(b1, a, b0);
        f.ret(b1, Some(s));

        let cg = ConstraintGraph::build(&f);
        assert_eq!(cg.intersection(s).unwrap().interval(), Interval::top());
    }

    #[test]
    fn test_non_comparison_condition() {
        let mut f = Function::new("f");
        let b0 = f.add_block();
        let b1 = f.add_block();
        let a = f.param(b0, Ty::INT);
        let p = f.param(b0, Ty::Bool);
        f.br_if(b0, p, b1, b1);
        let s = f.sigma(b1, a, b0);
        f.ret(b1, Some(s));

        let cg = ConstraintGraph::build(&f);
        assert_eq!(cg.intersection(s).unwrap().interval(), Interval::top());
    }

    #[test]
    fn test_constraints_string() {
        let (f, _, _) = branch_on_const(CmpOp::Lt, 10, false);
        let cg = ConstraintGraph::build(&f);
        let s = cg.constraints_string(&f);

        assert!(s.contains("v0 = param"), "{}", s);
        assert!(s.contains("v1 = 10"), "{}", s);
        assert!(s.contains("∩ [-∞, 9]"), "{}", s);
    }
}
