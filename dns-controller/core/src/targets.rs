/// Sorts `targets` and removes duplicates.
///
/// A gateway with several listeners matching the same hostname contributes its addresses once per
/// listener; DNS values are unordered, so the sorted set is returned.
pub fn dedupe(mut targets: Vec<String>) -> Vec<String> {
    if targets.len() < 2 {
        return targets;
    }
    targets.sort_unstable();
    targets.dedup();
    targets
}
