/// Typed JSON values over the storage adapter
///
/// [`LocalStorage`] is a long-lived handle on one key: it reads once on
/// open, writes through on every change and follows changes made by other
/// holders of the same store. The free functions are the stateless
/// counterparts used for one-off reads and writes.

use crate::adapters::{SharedStorage, StorageEvent};
use arc_swap::ArcSwap;
use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use std::{
    collections::VecDeque,
    sync::{Arc, Mutex, PoisonError},
};
use tokio::{
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
};

/// Typed handle on one storage key with cross-context sync
///
/// The in-memory value is authoritative for this handle: persistence
/// failures are logged and never roll it back. Dropping the handle stops
/// the sync task.
pub struct LocalStorage<T> {
    key: String,
    initial: T,
    state: Arc<ArcSwap<T>>,
    storage: Option<SharedStorage>,
    own_writes: OwnWrites,
    sync: Option<JoinHandle<()>>,
}

/// Raw values this handle wrote whose change events are still in flight
///
/// The store echoes every write to all subscribers, the writer included;
/// the sync task drops an event that matches the oldest pending write.
#[derive(Clone, Default)]
struct OwnWrites(Arc<Mutex<VecDeque<Option<String>>>>);

impl OwnWrites {
    fn push(&self, raw: Option<String>) {
        self.0.lock().unwrap_or_else(PoisonError::into_inner).push_back(raw);
    }

    /// Forget a write that never reached the store
    fn cancel(&self, raw: &Option<String>) {
        let mut pending = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(index) = pending.iter().rposition(|written| written == raw) {
            pending.remove(index);
        }
    }

    /// Whether `raw` is the echo of this handle's oldest pending write
    fn take_echo(&self, raw: &Option<String>) -> bool {
        let mut pending = self.0.lock().unwrap_or_else(PoisonError::into_inner);
        if pending.front() == Some(raw) {
            pending.pop_front();
            true
        } else {
            false
        }
    }
}

impl<T> LocalStorage<T>
where
    T: Serialize + DeserializeOwned + Clone + Send + Sync + 'static,
{
    /// Open a handle, reading the current value or falling back to `initial`
    pub async fn open(storage: Option<SharedStorage>, key: impl Into<String>, initial: T) -> Self {
        let key = key.into();

        let (current, sync) = match &storage {
            None => (initial.clone(), None),
            Some(adapter) => {
                // Subscribe first so nothing written after the read is missed
                let events = adapter.subscribe();
                let current = read_initial(adapter, &key, &initial).await;
                (current, Some(events))
            }
        };

        let state = Arc::new(ArcSwap::from_pointee(current));
        let own_writes = OwnWrites::default();
        let sync = sync.map(|events| spawn_sync(events, key.clone(), state.clone(), own_writes.clone()));

        Self {
            key,
            initial,
            state,
            storage,
            own_writes,
            sync,
        }
    }

    /// Current value snapshot
    pub fn value(&self) -> Arc<T> {
        self.state.load_full()
    }

    /// Replace the value and persist it
    pub async fn set(&self, value: T) {
        let encoded = serde_json::to_string(&value);
        self.state.store(Arc::new(value));

        let Some(storage) = &self.storage else {
            return;
        };
        match encoded {
            Ok(raw) => {
                self.own_writes.push(Some(raw.clone()));
                if let Err(e) = storage.set_item(&self.key, &raw).await {
                    self.own_writes.cancel(&Some(raw));
                    tracing::error!("Error setting storage key \"{}\": {}", self.key, e);
                }
            }
            Err(e) => tracing::error!("Error encoding storage key \"{}\": {}", self.key, e),
        }
    }

    /// Derive the next value from the current one and persist it
    pub async fn update<F>(&self, updater: F)
    where
        F: FnOnce(&T) -> T,
    {
        let next = updater(&self.state.load());
        self.set(next).await;
    }

    /// Reset to the initial value and delete the key
    pub async fn remove(&self) {
        self.state.store(Arc::new(self.initial.clone()));

        if let Some(storage) = &self.storage {
            self.own_writes.push(None);
            if let Err(e) = storage.remove_item(&self.key).await {
                self.own_writes.cancel(&None);
                tracing::error!("Error removing storage key \"{}\": {}", self.key, e);
            }
        }
    }
}

impl<T> Drop for LocalStorage<T> {
    fn drop(&mut self) {
        if let Some(sync) = self.sync.take() {
            sync.abort();
        }
    }
}

async fn read_initial<T: DeserializeOwned + Clone>(storage: &SharedStorage, key: &str, initial: &T) -> T {
    match storage.get_item(key).await {
        Ok(Some(raw)) if !raw.is_empty() => serde_json::from_str(&raw).unwrap_or_else(|e| {
            tracing::warn!("⚠️ Error reading storage key \"{}\": {}", key, e);
            initial.clone()
        }),
        Ok(_) => initial.clone(),
        Err(e) => {
            tracing::error!("Error reading storage key \"{}\": {}", key, e);
            initial.clone()
        }
    }
}

/// Adopt values written for `key` by other holders of the store
fn spawn_sync<T>(
    mut events: broadcast::Receiver<StorageEvent>,
    key: String,
    state: Arc<ArcSwap<T>>,
    own_writes: OwnWrites,
) -> JoinHandle<()>
where
    T: DeserializeOwned + Send + Sync + 'static,
{
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(StorageEvent { key: changed, new_value }) => {
                    if changed != key || own_writes.take_echo(&new_value) {
                        continue;
                    }
                    let Some(raw) = new_value.filter(|raw| !raw.is_empty()) else {
                        continue;
                    };
                    match serde_json::from_str::<T>(&raw) {
                        Ok(value) => state.store(Arc::new(value)),
                        Err(e) => tracing::error!("Error parsing storage event for key \"{}\": {}", key, e),
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!("⚠️ Storage sync for \"{}\" skipped {} events", key, skipped);
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}

/// Read and decode `key`, falling back to `default`
///
/// Values written before JSON encoding was adopted are plain strings. A raw
/// value that fails to decode is returned as-is when it does not look like
/// JSON and `T` accepts a string; otherwise `default` is returned.
pub async fn get_local_storage_item<T: DeserializeOwned>(storage: Option<&SharedStorage>, key: &str, default: T) -> T {
    let Some(storage) = storage else {
        return default;
    };

    let raw = match storage.get_item(key).await {
        Ok(Some(raw)) if !raw.is_empty() => raw,
        Ok(_) => return default,
        Err(e) => {
            tracing::error!("Error reading storage key \"{}\": {}", key, e);
            return default;
        }
    };

    match serde_json::from_str(&raw) {
        Ok(value) => value,
        Err(_) => legacy_value(key, raw, default),
    }
}

fn legacy_value<T: DeserializeOwned>(key: &str, raw: String, default: T) -> T {
    let trimmed = raw.trim_start();
    if trimmed.starts_with('{') || trimmed.starts_with('[') {
        tracing::warn!("⚠️ Invalid JSON in storage key \"{}\", using default", key);
        return default;
    }

    match serde_json::from_value(Value::String(raw)) {
        Ok(value) => value,
        Err(_) => {
            tracing::warn!(
                "⚠️ Storage key \"{}\" holds a plain string but a non-string value was expected, using default",
                key
            );
            default
        }
    }
}

/// Encode and write `value`; false when it could not be persisted
pub async fn set_local_storage_item<T: Serialize + ?Sized>(storage: Option<&SharedStorage>, key: &str, value: &T) -> bool {
    let Some(storage) = storage else {
        return false;
    };

    let raw = match serde_json::to_string(value) {
        Ok(raw) => raw,
        Err(e) => {
            tracing::error!("Error encoding storage key \"{}\": {}", key, e);
            return false;
        }
    };

    match storage.set_item(key, &raw).await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("Error setting storage key \"{}\": {}", key, e);
            false
        }
    }
}

/// Delete `key`; false when the store is absent or the delete failed
pub async fn remove_local_storage_item(storage: Option<&SharedStorage>, key: &str) -> bool {
    let Some(storage) = storage else {
        return false;
    };

    match storage.remove_item(key).await {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("Error removing storage key \"{}\": {}", key, e);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::{MemoryStorage, StorageAdapter};
    use std::time::Duration;

    fn memory() -> SharedStorage {
        Arc::new(MemoryStorage::new())
    }

    async fn eventually(mut check: impl FnMut() -> bool) {
        let waited = tokio::time::timeout(Duration::from_secs(1), async {
            while !check() {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await;
        assert!(waited.is_ok(), "condition not reached in time");
    }

    #[tokio::test]
    async fn broken_json_like_value_returns_default() {
        let storage = memory();
        storage.set_item("k", "{broken").await.unwrap();

        let value = get_local_storage_item(Some(&storage), "k", "default".to_string()).await;
        assert_eq!(value, "default");
    }

    #[tokio::test]
    async fn legacy_plain_string_is_returned_for_string_defaults() {
        let storage = memory();
        storage.set_item("k", "plainstring").await.unwrap();

        let as_string = get_local_storage_item(Some(&storage), "k", "default".to_string()).await;
        assert_eq!(as_string, "plainstring");

        let as_option: Option<String> = get_local_storage_item(Some(&storage), "k", None).await;
        assert_eq!(as_option.as_deref(), Some("plainstring"));

        let as_number = get_local_storage_item(Some(&storage), "k", 7_u32).await;
        assert_eq!(as_number, 7);
    }

    #[tokio::test]
    async fn stateless_helpers_round_trip_json() {
        let storage = memory();
        assert!(set_local_storage_item(Some(&storage), "flag", "true").await);
        assert_eq!(storage.get_item("flag").await.unwrap().as_deref(), Some("\"true\""));

        let read: String = get_local_storage_item(Some(&storage), "flag", String::new()).await;
        assert_eq!(read, "true");

        assert!(remove_local_storage_item(Some(&storage), "flag").await);
        assert_eq!(get_local_storage_item(Some(&storage), "flag", 0_i32).await, 0);
        assert!(!set_local_storage_item(None, "flag", &1).await);
    }

    #[tokio::test]
    async fn handle_reads_writes_and_resets() {
        let storage = memory();
        storage.set_item("count", "3").await.unwrap();

        let handle = LocalStorage::open(Some(storage.clone()), "count", 0_i64).await;
        assert_eq!(*handle.value(), 3);

        handle.update(|current| current + 1).await;
        assert_eq!(*handle.value(), 4);
        assert_eq!(storage.get_item("count").await.unwrap().as_deref(), Some("4"));

        handle.remove().await;
        assert_eq!(*handle.value(), 0);
        assert_eq!(storage.get_item("count").await.unwrap(), None);
    }

    #[tokio::test]
    async fn handle_without_storage_keeps_value_in_memory() {
        let handle = LocalStorage::open(None, "name", "initial".to_string()).await;
        handle.set("changed".to_string()).await;
        assert_eq!(handle.value().as_str(), "changed");
    }

    #[tokio::test]
    async fn none_is_persisted_as_null() {
        let storage = memory();
        let handle = LocalStorage::open(Some(storage.clone()), "maybe", Some(1_u8)).await;
        handle.set(None).await;
        assert_eq!(storage.get_item("maybe").await.unwrap().as_deref(), Some("null"));
    }

    #[tokio::test]
    async fn handle_follows_writes_from_other_holders() {
        let storage = memory();
        let handle = LocalStorage::open(Some(storage.clone()), "theme", "light".to_string()).await;

        storage.set_item("other", "\"ignored\"").await.unwrap();
        storage.set_item("theme", "not json").await.unwrap();
        storage.set_item("theme", "\"dark\"").await.unwrap();

        eventually(|| handle.value().as_str() == "dark").await;
    }

    #[tokio::test]
    async fn own_writes_are_not_adopted_back() {
        let storage = memory();
        let handle = LocalStorage::open(Some(storage.clone()), "theme", "light".to_string()).await;

        handle.set("dark".to_string()).await;
        handle.remove().await;
        assert_eq!(handle.value().as_str(), "light");

        tokio::time::sleep(Duration::from_millis(50)).await;
        assert_eq!(handle.value().as_str(), "light");
        assert_eq!(storage.get_item("theme").await.unwrap(), None);

        storage.set_item("theme", "\"sepia\"").await.unwrap();
        eventually(|| handle.value().as_str() == "sepia").await;
    }

    #[tokio::test]
    async fn unreadable_initial_value_falls_back() {
        let storage = memory();
        storage.set_item("list", "[1, 2").await.unwrap();
        let handle = LocalStorage::open(Some(storage), "list", vec![9_u8]).await;
        assert_eq!(*handle.value(), vec![9]);
    }
}
