//! Shared helpers for state event handlers.

use quaero_core::Job;
use std::collections::HashMap;

/// Look up by exact id, or by a unique suffix (the id with its type
/// prefix stripped — what a UI typically displays).
pub(crate) fn find_by_prefix<'a, V>(map: &'a HashMap<String, V>, id: &str) -> Option<&'a V> {
    if let Some(val) = map.get(id) {
        return Some(val);
    }
    let matches: Vec<_> = map
        .iter()
        .filter(|(k, _)| k.ends_with(id) || k.as_str() == id)
        .collect();
    if matches.len() == 1 {
        Some(matches[0].1)
    } else {
        None
    }
}

/// Apply a mutation to a job only if it hasn't reached a terminal state,
/// guarding against events that arrive after cancellation or completion.
pub(crate) fn apply_if_not_terminal(
    jobs: &mut HashMap<String, Job>,
    job_id: &str,
    f: impl FnOnce(&mut Job),
) {
    if let Some(job) = jobs.get_mut(job_id) {
        if !job.is_terminal() {
            f(job);
        }
    }
}
