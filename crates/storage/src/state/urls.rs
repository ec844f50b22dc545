//! Seen-URL dedup event handlers (per-job, spec section 4.B `MarkURLSeen`).

use super::MaterializedState;
use quaero_core::Event;

pub(crate) fn apply(state: &mut MaterializedState, event: &Event) {
    if let Event::UrlSeen { job_id, url_hash } = event {
        state
            .seen_urls
            .entry(job_id.to_string())
            .or_default()
            .insert(url_hash.clone());
    }
}

impl MaterializedState {
    pub fn has_seen_url(&self, job_id: &str, url_hash: &str) -> bool {
        self.seen_urls
            .get(job_id)
            .map(|set| set.contains(url_hash))
            .unwrap_or(false)
    }
}
