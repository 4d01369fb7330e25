//! CAMO partner pairing
//!
//! Pairs eligible instances into symmetric failover-partner links. The walk
//! is crude by design: filter to unpaired eligible instances in list order
//! and link consecutive pairs. An odd-sized eligible set leaves the last
//! instance unpaired, which is not an error.
//!
//! Re-invoking over an unchanged list is a no-op because already-paired
//! instances are excluded by the filter. If new eligible instances appear
//! between invocations, a leftover singleton will pair with the first new
//! arrival on the next call. That incremental behavior is deliberate.

use crate::spec::Instance;
use std::collections::BTreeSet;

/// Pair unpaired eligible instances consecutively; returns pairs formed
///
/// For each linked pair (a, b), `a` records `b`'s name as its partner and
/// vice versa, set simultaneously. An instance never acquires more than one
/// partner, and an existing partner link is never rewritten.
pub fn pair(instances: &mut [Instance], eligible: &BTreeSet<String>) -> usize {
    let candidates: Vec<usize> = instances
        .iter()
        .enumerate()
        .filter(|(_, i)| i.roles_intersect(eligible) && i.camo_partner().is_none())
        .map(|(idx, _)| idx)
        .collect();

    let mut pairs = 0;
    for chunk in candidates.chunks_exact(2) {
        let (a, b) = (chunk[0], chunk[1]);
        let a_name = instances[a].name.clone();
        let b_name = instances[b].name.clone();
        instances[a].set_camo_partner(&b_name);
        instances[b].set_camo_partner(&a_name);
        pairs += 1;
    }
    pairs
}
