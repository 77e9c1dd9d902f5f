//! Round access settings.
//!
//! Round data itself (books, ballots, suggestions) belongs to the main site
//! database. The gate only needs each round's access password and closing
//! time, which admins set through `/api/admin/rounds`.

use crate::auth::session::Realm;
use crate::models::RoundAccess;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// Shared in-memory map of `(realm, round id)` to access settings.
#[derive(Clone, Default)]
pub struct RoundStore {
    rounds: Arc<RwLock<HashMap<(Realm, u64), RoundAccess>>>,
}

impl RoundStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, realm: Realm, id: u64) -> Option<RoundAccess> {
        self.rounds
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&(realm, id))
            .cloned()
    }

    /// Insert or replace a round's access settings.
    ///
    /// Returns true if the round was already present.
    pub fn upsert(&self, realm: Realm, id: u64, access: RoundAccess) -> bool {
        self.rounds
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert((realm, id), access)
            .is_some()
    }

    /// Remove a round. Returns true if it existed.
    pub fn remove(&self, realm: Realm, id: u64) -> bool {
        self.rounds
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .remove(&(realm, id))
            .is_some()
    }

    /// All rounds in `realm`, ordered by id.
    pub fn list(&self, realm: Realm) -> Vec<(u64, RoundAccess)> {
        let rounds = self.rounds.read().unwrap_or_else(|e| e.into_inner());
        let mut listed: Vec<(u64, RoundAccess)> = rounds
            .iter()
            .filter(|((r, _), _)| *r == realm)
            .map(|((_, id), access)| (*id, access.clone()))
            .collect();
        listed.sort_by_key(|(id, _)| *id);
        listed
    }
}

impl std::fmt::Debug for RoundStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let len = self.rounds.read().map(|r| r.len()).unwrap_or(0);
        f.debug_struct("RoundStore").field("rounds", &len).finish()
    }
}
