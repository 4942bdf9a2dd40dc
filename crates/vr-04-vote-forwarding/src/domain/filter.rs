//! # Server Filter
//!
//! Decides which backend servers take part in fan-out and player replay.

use std::collections::HashSet;

/// Predicate over backend server names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ServerFilter {
    /// Every server is allowed.
    #[default]
    AllowAll,
    /// Only the listed servers are allowed.
    Allow(HashSet<String>),
    /// Every server except the listed ones is allowed.
    Deny(HashSet<String>),
}

impl ServerFilter {
    /// Build a filter from a server list. `whitelist` selects allow-list mode,
    /// otherwise the list is a deny-list.
    pub fn from_list<I, S>(servers: I, whitelist: bool) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let servers: HashSet<String> = servers.into_iter().map(Into::into).collect();
        if whitelist {
            Self::Allow(servers)
        } else {
            Self::Deny(servers)
        }
    }

    pub fn is_allowed(&self, server: &str) -> bool {
        match self {
            Self::AllowAll => true,
            Self::Allow(servers) => servers.contains(server),
            Self::Deny(servers) => !servers.contains(server),
        }
    }
}
