/// Connection registry - identity map plus per-user connection lists
///
/// Mutation is reserved for the hub's dispatch loop (single writer). Readers
/// take point-in-time snapshots so no lock is held while frames are queued.
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use super::connection::{ConnectionId, ConnectionInfo, ConnectionSlot};

#[derive(Debug, Default)]
struct RegistryMaps {
    /// connection_id -> slot
    connections: HashMap<ConnectionId, Arc<ConnectionSlot>>,

    /// user_address -> that user's slots; entry removed once empty
    users: HashMap<String, Vec<Arc<ConnectionSlot>>>,
}

#[derive(Debug, Default)]
pub struct ConnectionRegistry {
    inner: RwLock<RegistryMaps>,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert into both maps. Ids are issued by the hub and never reused.
    pub(super) fn register(&self, slot: Arc<ConnectionSlot>) {
        let mut maps = self.inner.write();
        maps.users
            .entry(slot.user_address.clone())
            .or_default()
            .push(slot.clone());
        maps.connections.insert(slot.id, slot);
    }

    /// Remove from both maps; None when already absent
    pub(super) fn unregister(&self, id: ConnectionId) -> Option<Arc<ConnectionSlot>> {
        let mut maps = self.inner.write();
        let slot = maps.connections.remove(&id)?;

        if let Some(list) = maps.users.get_mut(&slot.user_address) {
            list.retain(|s| s.id != id);
            if list.is_empty() {
                maps.users.remove(&slot.user_address);
            }
        }

        Some(slot)
    }

    /// Drop every connection; returns how many were registered
    pub(super) fn clear(&self) -> usize {
        let mut maps = self.inner.write();
        let count = maps.connections.len();
        maps.connections.clear();
        maps.users.clear();
        count
    }

    /// Snapshot of a user's connections for fan-out
    pub fn lookup(&self, user_address: &str) -> Vec<Arc<ConnectionSlot>> {
        self.inner
            .read()
            .users
            .get(user_address)
            .cloned()
            .unwrap_or_default()
    }

    pub fn connection_count(&self) -> usize {
        self.inner.read().connections.len()
    }

    pub fn user_connection_count(&self, user_address: &str) -> usize {
        self.inner
            .read()
            .users
            .get(user_address)
            .map(Vec::len)
            .unwrap_or(0)
    }

    pub fn user_count(&self) -> usize {
        self.inner.read().users.len()
    }

    pub fn contains(&self, id: ConnectionId) -> bool {
        self.inner.read().connections.contains_key(&id)
    }

    /// Descriptions of every registered connection, ordered by id
    pub fn connections(&self) -> Vec<ConnectionInfo> {
        let mut infos: Vec<ConnectionInfo> = self
            .inner
            .read()
            .connections
            .values()
            .map(|slot| slot.info())
            .collect();
        infos.sort_by_key(|info| info.id);
        infos
    }

    /// Identity map and user lists describe the same set of connections
    pub fn is_consistent(&self) -> bool {
        let maps = self.inner.read();

        let listed: usize = maps.users.values().map(Vec::len).sum();
        if listed != maps.connections.len() {
            return false;
        }

        maps.users.iter().all(|(user, list)| {
            !list.is_empty()
                && list.iter().all(|slot| {
                    &slot.user_address == user
                        && maps.connections.get(&slot.id).map(|s| s.id) == Some(slot.id)
                })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::push::connection::TransportKind;
    use crate::push::metrics::ConnectionMetrics;
    use chrono::Utc;
    use tokio::sync::mpsc;

    fn slot(id: ConnectionId, user: &str) -> Arc<ConnectionSlot> {
        let (sender, _rx) = mpsc::channel(4);
        Arc::new(ConnectionSlot {
            id,
            user_address: user.to_string(),
            kind: TransportKind::Duplex,
            connected_at: Utc::now(),
            sender,
            metrics: ConnectionMetrics::new(),
        })
    }

    #[test]
    fn test_register_and_lookup() {
        let registry = ConnectionRegistry::new();
        registry.register(slot(1, "alice"));
        registry.register(slot(2, "alice"));
        registry.register(slot(3, "bob"));

        assert_eq!(registry.connection_count(), 3);
        assert_eq!(registry.user_connection_count("alice"), 2);
        assert_eq!(registry.user_count(), 2);
        assert!(registry.lookup("carol").is_empty());

        let ids: Vec<_> = registry.lookup("alice").iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(registry.is_consistent());
    }

    #[test]
    fn test_register_then_unregister_restores_state() {
        let registry = ConnectionRegistry::new();
        registry.register(slot(1, "alice"));

        registry.register(slot(2, "bob"));
        assert!(registry.unregister(2).is_some());

        assert_eq!(registry.connection_count(), 1);
        assert_eq!(registry.user_count(), 1);
        assert_eq!(registry.user_connection_count("bob"), 0);
        assert!(!registry.contains(2));
        assert!(registry.is_consistent());
    }

    #[test]
    fn test_unregister_is_idempotent() {
        let registry = ConnectionRegistry::new();
        registry.register(slot(5, "alice"));

        assert!(registry.unregister(5).is_some());
        assert!(registry.unregister(5).is_none());
        assert!(registry.unregister(99).is_none());
        assert_eq!(registry.connection_count(), 0);
        assert!(registry.is_consistent());
    }

    #[test]
    fn test_interleaved_operations_stay_consistent() {
        let registry = ConnectionRegistry::new();
        let users = ["a", "b", "c"];

        for id in 0..30u64 {
            registry.register(slot(id, users[(id % 3) as usize]));
            if id % 4 == 0 {
                registry.unregister(id / 2);
            }
            assert!(registry.is_consistent());
        }
        for id in (0..30u64).rev() {
            registry.unregister(id);
            assert!(registry.is_consistent());
        }
        assert_eq!(registry.user_count(), 0);
    }

    #[test]
    fn test_snapshot_survives_unregister() {
        let registry = ConnectionRegistry::new();
        registry.register(slot(1, "alice"));

        let snapshot = registry.lookup("alice");
        registry.unregister(1);

        assert_eq!(snapshot.len(), 1);
        assert_eq!(registry.user_connection_count("alice"), 0);
    }

    #[test]
    fn test_clear() {
        let registry = ConnectionRegistry::new();
        registry.register(slot(1, "alice"));
        registry.register(slot(2, "bob"));

        assert_eq!(registry.clear(), 2);
        assert_eq!(registry.connection_count(), 0);
        assert!(registry.connections().is_empty());
    }
}
