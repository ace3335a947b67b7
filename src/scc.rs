//! Strongly connected components of the constraint graph (Tarjan).
//!
//! Successors of a node are its in-graph referrers plus the *future*
//! edges: every σ-node whose symbolic intersection references the node.
//! Future edges matter because they can tie components together in ways
//! the def→use relation alone would miss, and the fixpoint engine
//! depends on processing a value's component no later than the σ-nodes
//! waiting on it.
//!
//! The walk keeps an explicit work stack instead of recursing, so deep
//! constraint graphs cannot overflow the call stack. Components come
//! out in topological order (predecessor components first).

use std::collections::HashMap;

use crate::graph::ConstraintGraph;
use crate::ir::{Function, ValueId};

#[derive(Debug, Clone, Copy)]
struct NodeState {
    index: u32,
    lowlink: u32,
    on_stack: bool,
}

/// Condense the constraint graph into SCCs, topologically ordered.
pub fn condense(func: &Function, cg: &ConstraintGraph) -> Vec<Vec<ValueId>> {
    // Future edges, keyed by the referenced value.
    let mut futures_used_by: HashMap<ValueId, Vec<ValueId>> = HashMap::new();
    for (sigma, u) in cg.pending_futures() {
        futures_used_by.entry(u).or_default().push(sigma);
    }

    // Successor lists, deduplicated and sorted for determinism.
    let mut succs: HashMap<ValueId, Vec<ValueId>> = HashMap::new();
    for v in cg.nodes() {
        let mut s: Vec<ValueId> = func
            .referrers(v)
            .iter()
            .copied()
            .filter(|&w| cg.contains(w))
            .collect();
        if let Some(sigmas) = futures_used_by.get(&v) {
            s.extend(sigmas.iter().copied());
        }
        s.sort_unstable();
        s.dedup();
        succs.insert(v, s);
    }

    let mut state: HashMap<ValueId, NodeState> = HashMap::new();
    let mut next_index = 0u32;
    let mut stack: Vec<ValueId> = Vec::new();
    let mut sccs: Vec<Vec<ValueId>> = Vec::new();
    // (node, next successor to look at)
    let mut work: Vec<(ValueId, usize)> = Vec::new();

    for root in cg.nodes() {
        if state.contains_key(&root) {
            continue;
        }
        work.push((root, 0));

        while let Some(frame) = work.last_mut() {
            let (v, i) = (frame.0, frame.1);

            if i == 0 {
                state.insert(
                    v,
                    NodeState { index: next_index, lowlink: next_index, on_stack: true },
                );
                next_index += 1;
                stack.push(v);
            }

            if let Some(&w) = succs[&v].get(i) {
                frame.1 += 1;
                match state.get(&w) {
                    None => work.push((w, 0)),
                    Some(ws) if ws.on_stack => {
                        let wi = ws.index;
                        let vs = state.get_mut(&v).unwrap();
                        vs.lowlink = vs.lowlink.min(wi);
                    }
                    Some(_) => {}
                }
            } else {
                work.pop();

                let vs = state[&v];
                if vs.lowlink == vs.index {
                    let mut component = Vec::new();
                    loop {
                        let w = stack.pop().unwrap();
                        state.get_mut(&w).unwrap().on_stack = false;
                        component.push(w);
                        if w == v {
                            break;
                        }
                    }
                    component.sort_unstable();
                    sccs.push(component);
                }

                if let Some(parent) = work.last() {
                    let low = state[&v].lowlink;
                    let ps = state.get_mut(&parent.0).unwrap();
                    ps.lowlink = ps.lowlink.min(low);
                }
            }
        }
    }

    // Tarjan emits components in reverse topological order.
    sccs.reverse();
    sccs
}
