//! Entities claimed by queued or running commands.

use std::collections::HashSet;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::command::Entity;

#[derive(Debug, Default)]
pub struct BusySet {
    inner: Mutex<HashSet<Entity>>,
}

impl BusySet {
    /// Claim all of `entities` or none of them. Returns the first entity
    /// already taken on conflict.
    pub fn try_claim(self: &Arc<Self>, entities: &'static [Entity]) -> Result<BusyGuard, Entity> {
        let mut busy = self.inner.lock();
        if let Some(taken) = entities.iter().find(|e| busy.contains(*e)) {
            return Err(*taken);
        }
        busy.extend(entities.iter().copied());
        Ok(BusyGuard {
            set: Arc::clone(self),
            entities,
        })
    }

    pub fn is_busy(&self, entity: Entity) -> bool {
        self.inner.lock().contains(&entity)
    }

    /// Sorted list of claimed entities.
    pub fn snapshot(&self) -> Vec<Entity> {
        let mut list: Vec<Entity> = self.inner.lock().iter().copied().collect();
        list.sort();
        list
    }
}

/// Releases its entities when dropped.
#[derive(Debug)]
pub struct BusyGuard {
    set: Arc<BusySet>,
    entities: &'static [Entity],
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        let mut busy = self.set.inner.lock();
        for entity in self.entities {
            busy.remove(entity);
        }
    }
}
