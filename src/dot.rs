use std::fmt::Write as _;

use crate::graph::ConstraintGraph;
use crate::intersection::Intersection;
use crate::ir::{Function, Instr, ValueId};

/// Render the constraint graph as Graphviz `dot`, one cluster per SCC.
///
/// Solid edges are the def→use relation; dashed edges are futures from
/// a value to the σ-nodes waiting on it.
pub fn to_dot(
    func: &Function,
    cg: &ConstraintGraph,
    sccs: &[Vec<ValueId>],
) -> Result<String, std::fmt::Error> {
    let mut dot = String::new();
    writeln!(dot, "digraph {{")?;

    for (n, scc) in sccs.iter().enumerate() {
        writeln!(dot, "subgraph cluster_{} {{", n)?;
        for &v in scc {
            writeln!(dot, "{} [label=\"{}\\n{}\"];", v, v, node_label(func, cg, v))?;
        }
        writeln!(dot, "}}")?;
    }

    for v in cg.nodes() {
        for &w in func.referrers(v) {
            if !cg.contains(w) {
                continue;
            }
            writeln!(dot, "{} -> {};", v, w)?;
        }
    }
    for (sigma, u) in cg.pending_futures() {
        writeln!(dot, "{} -> {} [style=dashed];", u, sigma)?;
    }

    writeln!(dot, "}}")?;
    Ok(dot)
}

fn node_label(func: &Function, cg: &ConstraintGraph, v: ValueId) -> String {
    match func.instr(v) {
        Instr::Param => "param".to_string(),
        Instr::Const(c) => c.to_string(),
        Instr::BinOp { op, x, y } => format!("{} {} {}", x, op, y),
        Instr::Phi { edges } => {
            let args: Vec<String> = edges.iter().map(|e| e.to_string()).collect();
            format!("φ({})", args.join(", "))
        }
        Instr::Sigma { x, .. } => match cg.intersection(v) {
            Some(isec @ Intersection::Symbolic { .. }) => format!("{} ∩ {}", x, isec),
            Some(Intersection::Basic(ival)) => format!("{} ∩ {}", x, ival),
            None => format!("σ({})", x),
        },
        Instr::Cmp { op, x, y } => format!("{} {} {}", x, op, y),
    }
}
