//! Expiring one-shot store of minted tunnel handles.
//!
//! A tunnel id is redeemable exactly once: `take` removes the plan, so two
//! concurrent GETs for the same id cannot both start a stream. Unredeemed
//! entries expire after a TTL and are purged lazily on access.

use std::time::{Duration, Instant};

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use uuid::Uuid;

use sluice_plan::StreamPlan;

struct StoredTunnel {
    plan: StreamPlan,
    expires_at: Instant,
}

pub struct TunnelStore {
    ttl: Duration,
    entries: Mutex<FxHashMap<Uuid, StoredTunnel>>,
}

impl TunnelStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: Mutex::new(FxHashMap::default()),
        }
    }

    pub fn mint(&self, plan: StreamPlan) -> Uuid {
        let id = Uuid::new_v4();
        let mut entries = self.entries.lock();
        let now = Instant::now();
        entries.retain(|_, entry| entry.expires_at > now);
        entries.insert(
            id,
            StoredTunnel {
                plan,
                expires_at: now + self.ttl,
            },
        );
        id
    }

    /// Redeem an id. Expired and already-taken ids both come back `None`.
    pub fn take(&self, id: &Uuid) -> Option<StreamPlan> {
        let entry = self.entries.lock().remove(id)?;
        (entry.expires_at > Instant::now()).then_some(entry.plan)
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}
