//! # Outbound Ports
//!
//! The view never computes trust itself; it asks an oracle whether a viewer
//! wants to see an author's messages.

use parking_lot::RwLock;
use shared_types::IdentityId;
use std::collections::{HashMap, HashSet};

/// Decides whether `viewer` wants messages written by `author`.
///
/// Implementations must be cheap: the view calls this once per message on
/// every query.
pub trait TrustOracle: Send + Sync {
    fn wants(&self, viewer: &IdentityId, author: &IdentityId) -> bool;
}

/// Wants every author.
#[derive(Debug, Clone, Copy, Default)]
pub struct TrustEveryone;

impl TrustOracle for TrustEveryone {
    fn wants(&self, _viewer: &IdentityId, _author: &IdentityId) -> bool {
        true
    }
}

/// Per-viewer block lists, editable at runtime.
#[derive(Debug, Default)]
pub struct StaticTrustOracle {
    blocked: RwLock<HashMap<IdentityId, HashSet<IdentityId>>>,
}

impl StaticTrustOracle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hide `author` from `viewer`. Returns false if already hidden.
    pub fn block(&self, viewer: IdentityId, author: IdentityId) -> bool {
        self.blocked.write().entry(viewer).or_default().insert(author)
    }

    pub fn unblock(&self, viewer: &IdentityId, author: &IdentityId) -> bool {
        let mut blocked = self.blocked.write();
        let Some(set) = blocked.get_mut(viewer) else {
            return false;
        };
        let removed = set.remove(author);
        if set.is_empty() {
            blocked.remove(viewer);
        }
        removed
    }
}

impl TrustOracle for StaticTrustOracle {
    fn wants(&self, viewer: &IdentityId, author: &IdentityId) -> bool {
        !self
            .blocked
            .read()
            .get(viewer)
            .is_some_and(|set| set.contains(author))
    }
}
