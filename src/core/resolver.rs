// ZoneLens - core/resolver.rs
//
// Zone resolver: computes which tree paths belong to which zones.
//
// A zone claims the union of
//   - its explicit paths, each expanded to itself plus every descendant
//     currently present in the tree, and
//   - whatever its pattern matches.
// Zones are informational, not a partition: a path may belong to any number
// of zones, and no ranking between zones is computed.
//
// A pattern failure in one zone is logged and recorded as skipped; the zone
// keeps its explicit paths and the remaining zones resolve normally.

use crate::core::model::{SkippedZone, TreeNode, Zone, ZoneHighlights};
use crate::core::pattern::{self, PatternMatcher};
use crate::core::tree::{flatten_paths, is_under, normalize_path};
use std::collections::{BTreeSet, HashSet};

/// Resolve `zones` against `tree`, evaluating patterns through `matcher`.
///
/// Output is deterministic for fixed inputs and a deterministic matcher;
/// each `path_to_zones` value lists zone names in `zones` order.
pub fn resolve(zones: &[Zone], tree: &TreeNode, matcher: &dyn PatternMatcher) -> ZoneHighlights {
    let all_tree_paths = flatten_paths(tree);
    let known: HashSet<&str> = all_tree_paths.iter().copied().collect();

    let mut highlights = ZoneHighlights::default();

    for zone in zones {
        // Set semantics per zone: a path qualifying twice under the same zone
        // is recorded once.
        let mut claimed: BTreeSet<String> = BTreeSet::new();

        for raw in &zone.explicit_paths {
            let explicit = normalize_path(raw);
            claimed.extend(
                all_tree_paths
                    .iter()
                    .filter(|p| is_under(p, &explicit))
                    .map(|p| (*p).to_string()),
            );
            if !known.contains(explicit.as_str()) {
                tracing::trace!(zone = %zone.name, path = %explicit, "Explicit path not in tree");
                claimed.insert(explicit);
            }
        }

        if zone.has_pattern() {
            match pattern::evaluate(&zone.pattern, matcher) {
                Ok(paths) => {
                    tracing::trace!(zone = %zone.name, matches = paths.len(), "Pattern evaluated");
                    claimed.extend(paths);
                }
                Err(e) => {
                    tracing::warn!(
                        zone = %zone.name,
                        pattern = %zone.pattern,
                        error = %e,
                        "Zone pattern evaluation failed; using explicit paths only"
                    );
                    highlights.skipped.push(SkippedZone {
                        zone: zone.name.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        for path in claimed {
            highlights
                .path_to_zones
                .entry(path.clone())
                .or_default()
                .push(zone.name.clone());
            highlights.highlight_paths.insert(path);
        }
    }

    tracing::debug!(
        zones = zones.len(),
        highlighted = highlights.highlight_paths.len(),
        skipped = highlights.skipped.len(),
        "Zones resolved"
    );

    highlights
}
