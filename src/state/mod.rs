pub mod room_flow;
mod sse;

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock, watch};
use uuid::Uuid;

use crate::{config::AppConfig, dao::room_store::RoomStore, error::ServiceError};

pub use self::sse::SseHub;

pub type SharedState = Arc<AppState>;

/// Central application state: storage handle, event hub, and per-room gates.
pub struct AppState {
    config: AppConfig,
    room_store: RwLock<Option<Arc<dyn RoomStore>>>,
    events: SseHub,
    room_gates: DashMap<Uuid, Arc<Mutex<()>>>,
    degraded: watch::Sender<bool>,
}

impl AppState {
    /// Construct a new [`AppState`] wrapped in an [`Arc`] so it can be cloned cheaply.
    ///
    /// The application starts in degraded mode until a storage backend is installed.
    pub fn new(config: AppConfig) -> SharedState {
        let (degraded_tx, _rx) = watch::channel(true);
        Arc::new(Self {
            events: SseHub::new(config.event_channel_capacity),
            config,
            room_store: RwLock::new(None),
            room_gates: DashMap::new(),
            degraded: degraded_tx,
        })
    }

    /// Runtime configuration loaded at startup.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Obtain a handle to the current room store, if one is installed.
    pub async fn room_store(&self) -> Option<Arc<dyn RoomStore>> {
        let guard = self.room_store.read().await;
        guard.as_ref().cloned()
    }

    /// Obtain the room store or fail with [`ServiceError::Degraded`].
    pub async fn require_room_store(&self) -> Result<Arc<dyn RoomStore>, ServiceError> {
        if self.is_degraded() {
            return Err(ServiceError::Degraded);
        }
        self.room_store().await.ok_or(ServiceError::Degraded)
    }

    /// Install a new room store implementation and leave degraded mode.
    pub async fn install_room_store(&self, store: Arc<dyn RoomStore>) {
        {
            let mut guard = self.room_store.write().await;
            *guard = Some(store);
        }
        self.update_degraded(false);
    }

    /// Remove the current room store and enter degraded mode.
    pub async fn clear_room_store(&self) {
        {
            let mut guard = self.room_store.write().await;
            guard.take();
        }
        self.update_degraded(true);
    }

    /// Current degraded flag.
    pub fn is_degraded(&self) -> bool {
        *self.degraded.borrow()
    }

    /// Subscribe to degraded mode updates.
    pub fn degraded_watcher(&self) -> watch::Receiver<bool> {
        self.degraded.subscribe()
    }

    /// Update and broadcast the degraded flag when the value changes.
    pub fn update_degraded(&self, value: bool) {
        self.degraded.send_if_modified(|current| {
            if *current == value {
                return false;
            }
            *current = value;
            true
        });
    }

    /// Broadcast hub used for the room SSE streams.
    pub fn events(&self) -> &SseHub {
        &self.events
    }

    /// Serialise join, ready, and complete calls on one room until the returned lock drops.
    pub async fn lock_room(&self, room_id: Uuid) -> RoomLock<'_> {
        let gate = self
            .room_gates
            .entry(room_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .value()
            .clone();
        // Built before waiting so a cancelled caller still prunes the gate.
        let mut lock = RoomLock {
            gates: &self.room_gates,
            room_id,
            guard: None,
        };
        lock.guard = Some(gate.lock_owned().await);
        lock
    }

    #[cfg(test)]
    pub(crate) fn room_gate_count(&self) -> usize {
        self.room_gates.len()
    }
}

/// Exclusive access to one room. The gate is dropped from the map once nobody else waits on it.
pub struct RoomLock<'a> {
    gates: &'a DashMap<Uuid, Arc<Mutex<()>>>,
    room_id: Uuid,
    guard: Option<OwnedMutexGuard<()>>,
}

impl Drop for RoomLock<'_> {
    fn drop(&mut self) {
        self.guard.take();
        // Waiters hold their own clone, so a count of one means only the map is left.
        self.gates.remove_if(&self.room_id, |_, gate| Arc::strong_count(gate) == 1);
    }
}
