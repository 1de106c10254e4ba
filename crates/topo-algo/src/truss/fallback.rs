//! Degraded truss construction: shortest candidate paths from the root
//! required node to every other required node, each member at its maximum
//! area. Forces are not computed, so equilibrium is never claimed.

use super::{MemberDesign, TrussDesign, TrussProblem};
use crate::driver::SolveOutcome;
use crate::report::DesignStatus;
use std::collections::BTreeSet;
use tracing::warn;
use topo_core::{shortest_link_path, LinkId};

/// Build the degraded design. Deterministic; never fails.
pub fn synthesize_fallback(problem: &TrussProblem, outcome: SolveOutcome) -> TrussDesign {
    let topology = &problem.topology;
    let required = problem.required_nodes();
    let mut chosen: BTreeSet<LinkId> = BTreeSet::new();

    if let Some((root, rest)) = required.split_first() {
        for target in rest {
            match shortest_link_path(topology, *root, *target) {
                Some(path) => chosen.extend(path),
                None => warn!(
                    root = %root,
                    target = %target,
                    "no candidate path; required node left unattached"
                ),
            }
        }
    }

    let members = chosen
        .into_iter()
        .map(|id| {
            let link = topology.link(id);
            let area = problem.area_bounds(link.bounds).max;
            MemberDesign {
                link: id,
                area,
                force: 0.0,
                stress: 0.0,
                length: link.length,
                mass: problem.params.density * area * link.length,
            }
        })
        .collect();

    TrussDesign::assemble(problem, DesignStatus::Fallback, outcome, members, false)
}
