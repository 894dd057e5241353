//! Bookkeeping of in-flight streaming operations.
//!
//! Purely observational: entries are inserted when an operation starts and
//! removed by the runner's cleanup routine on every exit path. An entry left
//! behind after a terminal event is a leak by definition.

use parking_lot::Mutex;
use rustc_hash::FxHashMap;
use std::time::Instant;
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct OperationEntry {
    /// Plan kind label, for logs and introspection.
    pub kind: &'static str,
    pub started_at: Instant,
}

#[derive(Debug, Default)]
pub struct OperationRegistry {
    ops: Mutex<FxHashMap<Uuid, OperationEntry>>,
}

impl OperationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, kind: &'static str) -> Uuid {
        let id = Uuid::new_v4();
        self.ops.lock().insert(
            id,
            OperationEntry {
                kind,
                started_at: Instant::now(),
            },
        );
        id
    }

    /// Safe to call more than once for the same id.
    pub fn deregister(&self, id: &Uuid) {
        self.ops.lock().remove(id);
    }

    pub fn contains(&self, id: &Uuid) -> bool {
        self.ops.lock().contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.ops.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.lock().is_empty()
    }
}
