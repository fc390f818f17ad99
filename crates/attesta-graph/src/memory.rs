//! In-memory, append-only chain log.
//!
//! `InMemoryChainLog` threads `prevLinkHash` automatically: every appended
//! link points at the hash of the link appended before it.  It keeps all
//! links in a `Vec` behind a `Mutex`, so a single log can be shared across
//! threads.  Nothing is persisted.

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use tracing::debug;

use attesta_contracts::error::AttestaResult;
use attesta_crypto::Hashed;

use crate::{
    chain::{create_chain_link, verify_sealed_chain, ChainLink},
    edge::Edge,
};

#[derive(Default)]
pub(crate) struct ChainState {
    /// All links appended so far, in order.
    pub(crate) links: Vec<Hashed<ChainLink>>,
}

/// An append-only sequence of hash-linked chain links.
#[derive(Clone, Default)]
pub struct InMemoryChainLog {
    pub(crate) state: Arc<Mutex<ChainState>>,
}

impl InMemoryChainLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Build a link over `edges` that points at the current head, append it,
    /// and return it with its hash.
    pub fn append(
        &self,
        link_id: &str,
        edges: Vec<Edge>,
        created_at: DateTime<Utc>,
    ) -> AttestaResult<Hashed<ChainLink>> {
        let mut state = self.state();
        let prev = state.links.last().map(|l| l.hash.clone());
        let sealed = create_chain_link(link_id, prev, edges, created_at)?;

        debug!(
            link_id = %link_id,
            position = state.links.len(),
            link_hash = %sealed.hash,
            "chain link appended"
        );

        state.links.push(sealed.clone());
        Ok(sealed)
    }

    /// Hash of the most recent link, or `None` for an empty log.
    pub fn head_hash(&self) -> Option<String> {
        self.state().links.last().map(|l| l.hash.clone())
    }

    /// Snapshot of every link in append order.
    pub fn links(&self) -> Vec<Hashed<ChainLink>> {
        self.state().links.clone()
    }

    pub fn len(&self) -> usize {
        self.state().links.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().links.is_empty()
    }

    /// Recompute every link hash and check the linkage.
    pub fn verify_integrity(&self) -> bool {
        verify_sealed_chain(&self.state().links)
    }
}
