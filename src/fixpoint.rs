//! The per-SCC fixpoint engine.
//!
//! Components are processed in topological order, so every value a
//! component depends on from the outside already holds its final
//! interval. Within a component three passes run in sequence:
//!
//! 1. **Widening** to a coarse fixpoint. The meet widening operator
//!    sends a growing endpoint straight to the corresponding infinity,
//!    so each endpoint moves through at most three states
//!    (⊥ → finite → ±∞) and the loop terminates.
//! 2. **Future resolution**. The component's σ-nodes trade their
//!    symbolic intersections for concrete intervals computed from the
//!    referenced ranges (final for predecessor components, approximate
//!    for this one), so narrowing has real bounds to push against.
//! 3. **Narrowing** to the final fixpoint. Bounds only ever move
//!    inwards: an infinite endpoint may become finite, a finite one may
//!    tighten, never the reverse.

use std::collections::{HashMap, HashSet};

use log::{debug, warn};

use crate::eval::eval;
use crate::graph::ConstraintGraph;
use crate::intersection::Intersection;
use crate::interval::Interval;
use crate::ir::{Function, ValueId};
use crate::numeric::Numeric;
use crate::scc::condense;

/// Backstop for the per-SCC loops. Widening converges long before
/// this; narrowing could in principle walk a large constant range.
const MAX_ROUNDS: usize = 10_000;

/// Computed ranges of a function's integer values.
#[derive(Debug)]
pub struct Analysis {
    intervals: HashMap<ValueId, Interval>,
}

impl Analysis {
    /// The interval of `v`. Absent for values outside the analysis
    /// domain (non-integer or unreached).
    pub fn interval(&self, v: ValueId) -> Option<&Interval> {
        self.intervals.get(&v)
    }

    pub fn iter(&self) -> impl Iterator<Item = (ValueId, &Interval)> {
        self.intervals.iter().map(|(&v, ival)| (v, ival))
    }

    pub fn len(&self) -> usize {
        self.intervals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }
}

/// Run the range analysis on one function.
pub fn analyze(func: &Function) -> Analysis {
    let mut cg = ConstraintGraph::build(func);
    let sccs = condense(func, &cg);
    debug!(
        "{}: {} constraint nodes in {} components",
        func.name(),
        cg.num_nodes(),
        sccs.len()
    );

    for scc in &sccs {
        widen(func, &mut cg, scc);
        resolve_futures(&mut cg, scc);
        narrow(func, &mut cg, scc);
    }

    Analysis { intervals: cg.into_intervals() }
}

fn widen(func: &Function, cg: &mut ConstraintGraph, scc: &[ValueId]) {
    let mut rounds = 0;
    loop {
        let mut changed = false;
        for &v in scc {
            let old = cg.interval(v);
            let new = eval(func, cg, v);
            let next = widen_step(&old, &new);
            if next != old {
                debug!("widen {}: {} -> {}", v, old, next);
                cg.set_interval(v, next);
                changed = true;
            }
        }
        if !changed {
            break;
        }
        rounds += 1;
        if rounds >= MAX_ROUNDS {
            warn!("{}: widening did not settle after {} rounds", func.name(), rounds);
            break;
        }
    }
}

/// The meet widening operator: adopt the first observation, then jump
/// any growing endpoint to its infinity.
fn widen_step(old: &Interval, new: &Interval) -> Interval {
    if old.is_undefined() {
        return new.clone();
    }
    if new.is_undefined() {
        return old.clone();
    }
    let (ol, oh) = (old.lo().unwrap(), old.hi().unwrap());
    let (nl, nh) = (new.lo().unwrap(), new.hi().unwrap());

    match (nl < ol, nh > oh) {
        (true, true) => Interval::top(),
        (true, false) => Interval::new(Numeric::NEG_INF, oh.clone()),
        (false, true) => Interval::new(ol.clone(), Numeric::INF),
        (false, false) => old.clone(),
    }
}

/// Replace the symbolic intersections of this component's σ-nodes with
/// the concrete intervals their referenced ranges imply. A referenced
/// value lives in this component (approximate, post-widening) or in a
/// predecessor component (final), never later.
fn resolve_futures(cg: &mut ConstraintGraph, scc: &[ValueId]) {
    let members: HashSet<ValueId> = scc.iter().copied().collect();

    for (sigma, u) in cg.pending_futures() {
        if !members.contains(&sigma) {
            continue;
        }
        let range = cg.interval(u);
        let isec = cg.intersection(sigma).unwrap();
        let resolved = isec.resolve(&range);
        debug!("resolve {}: {} with {} -> {}", sigma, isec, range, resolved);
        cg.set_intersection(sigma, Intersection::Basic(resolved));
    }
}

fn narrow(func: &Function, cg: &mut ConstraintGraph, scc: &[ValueId]) {
    let mut rounds = 0;
    loop {
        let mut changed = false;
        for &v in scc {
            let old = cg.interval(v);
            let new = eval(func, cg, v);
            let next = narrow_step(&old, &new);
            if next != old {
                debug!("narrow {}: {} -> {}", v, old, next);
                cg.set_interval(v, next);
                changed = true;
            }
        }
        if !changed {
            break;
        }
        rounds += 1;
        if rounds >= MAX_ROUNDS {
            warn!("{}: narrowing did not settle after {} rounds", func.name(), rounds);
            break;
        }
    }
}

/// Keep each endpoint unless the new one strictly tightens it; an
/// endpoint never moves outwards again.
fn narrow_step(old: &Interval, new: &Interval) -> Interval {
    if old.is_undefined() {
        return new.clone();
    }
    if new.is_undefined() {
        return old.clone();
    }
    let (ol, oh) = (old.lo().unwrap(), old.hi().unwrap());
    let (nl, nh) = (new.lo().unwrap(), new.hi().unwrap());

    let lo = if nl > ol { nl } else { ol };
    let hi = if nh < oh { nh } else { oh };
    Interval::new(lo.clone(), hi.clone())
}
