//! Package repository resolution
//!
//! Derives the final repository list from caller-supplied repositories plus
//! the channels an architecture requires for the resolved version and
//! feature flags. Caller-supplied entries always take precedence: they are
//! never removed, reordered, or deduplicated. The resolver only appends
//! synthesized entries for channels not already covered.

/// A repository channel an architecture requires
///
/// `token` is a substring marker: any caller-supplied repository containing
/// it already satisfies this channel. An empty token means any
/// caller-supplied repository at all covers the channel (the caller has
/// taken over repository selection entirely).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Channel {
    pub token: String,
    pub repository: String,
}

impl Channel {
    pub fn new(token: &str, repository: &str) -> Self {
        Self {
            token: token.to_string(),
            repository: repository.to_string(),
        }
    }
}

/// Resolve the final repository list
///
/// Starts from `existing` verbatim and appends the canonical repository of
/// every channel no existing entry covers. Synthesized appends are
/// deduplicated against each other, so two channels naming the same
/// repository contribute one entry. Running the resolver again over its own
/// output appends nothing.
pub fn resolve(channels: &[Channel], existing: &[String]) -> Vec<String> {
    let mut repositories = existing.to_vec();
    let mut synthesized: Vec<&str> = Vec::new();

    for channel in channels {
        let covered = !existing.is_empty()
            && existing.iter().any(|repo| repo.contains(&channel.token));
        if covered || synthesized.contains(&channel.repository.as_str()) {
            continue;
        }
        synthesized.push(&channel.repository);
        repositories.push(channel.repository.clone());
    }

    repositories
}
