//! Response distribution normalization and bottom-up propagation

use rtv_common::events::{EventBus, TreeEvent};
use rtv_common::node::{Node, ResponseDistribution};

/// Progress event interval, in visited internal nodes
const PROGRESS_EVERY: u64 = 100;

/// Best-effort normalization of a raw `{yes, no, maybe}` estimate.
///
/// With zero decisive evidence (`yes + no == 0`) the estimate is returned
/// unchanged, incomplete `maybe` included: there is no ratio to scale by.
/// Otherwise the unallocated remainder `1 - yes - no - maybe` (which may
/// be negative near zero for malformed estimates) is split between `yes`
/// and `no` in proportion to their current ratio; `maybe` is never
/// touched. The result is not forced to sum to exactly 1, and consumers
/// must tolerate small deviations.
pub fn normalize(rd: ResponseDistribution) -> ResponseDistribution {
    if rd.yes + rd.no == 0.0 {
        return rd;
    }
    let remainder = 1.0 - rd.yes - rd.no - rd.maybe;
    ResponseDistribution {
        yes: rd.yes + remainder * rd.yes / (rd.yes + rd.no),
        no: rd.no + remainder * rd.no / (rd.yes + rd.no),
        maybe: rd.maybe,
    }
}

/// Fill in `response_distribution` on every internal node, bottom-up.
///
/// Each child that carries a distribution (after its own subtree has been
/// propagated) contributes its normalized distribution weighted by the
/// child's own `prob`; children without one are excluded from both
/// numerator and denominator. A node whose children carry no distribution
/// information propagates none. Leaves are left untouched: their
/// distributions, if any, are terminal.
///
/// Emits a coarse progress event every [`PROGRESS_EVERY`] visited internal
/// nodes against `node_count`; observability only, not a correctness
/// concern.
pub fn propagate(root: &mut Node, node_count: u64, events: &EventBus) {
    let mut visited = 0u64;
    propagate_node(root, node_count, &mut visited, events);
}

fn propagate_node(node: &mut Node, total: u64, visited: &mut u64, events: &EventBus) {
    if node.next.is_empty() {
        return;
    }

    if *visited % PROGRESS_EVERY == 0 && total > 0 {
        events.emit(TreeEvent::progress(*visited as f64 / total as f64));
    }
    *visited += 1;

    let mut total_weight = 0.0;
    let mut weighted_yes = 0.0;
    let mut weighted_no = 0.0;
    let mut weighted_maybe = 0.0;

    for child in node.next.values_mut() {
        propagate_node(child, total, visited, events);

        if let Some(rd) = child.response_distribution {
            let normalized = normalize(rd);
            total_weight += child.prob;
            weighted_yes += normalized.yes * child.prob;
            weighted_no += normalized.no * child.prob;
            weighted_maybe += normalized.maybe * child.prob;
        }
    }

    if total_weight > 0.0 {
        node.response_distribution = Some(ResponseDistribution {
            yes: weighted_yes / total_weight,
            no: weighted_no / total_weight,
            maybe: weighted_maybe / total_weight,
        });
    }
}
