use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use uuid::Uuid;

use super::state::ConversationState;

const MIN_SWEEP_PERIOD: Duration = Duration::from_secs(1);
const MAX_SWEEP_PERIOD: Duration = Duration::from_secs(60);

/// One session's state. Holding the lock serializes that session's
/// interactions.
pub type SessionHandle = Arc<Mutex<ConversationState>>;

struct SessionEntry {
    handle: SessionHandle,
    last_active: Instant,
}

#[derive(Clone, Default)]
pub struct SessionRegistry {
    sessions: Arc<RwLock<HashMap<String, SessionEntry>>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn create(&self) -> (String, SessionHandle) {
        let id = Uuid::new_v4().to_string();
        let handle: SessionHandle = Arc::new(Mutex::new(ConversationState::default()));
        self.sessions.write().await.insert(
            id.clone(),
            SessionEntry {
                handle: handle.clone(),
                last_active: Instant::now(),
            },
        );
        tracing::info!("Created session {}", id);
        (id, handle)
    }

    /// Looks up a session and marks it active.
    pub async fn get(&self, id: &str) -> Option<SessionHandle> {
        let mut sessions = self.sessions.write().await;
        let entry = sessions.get_mut(id)?;
        entry.last_active = Instant::now();
        Some(entry.handle.clone())
    }

    pub async fn remove(&self, id: &str) -> bool {
        let removed = self.sessions.write().await.remove(id).is_some();
        if removed {
            tracing::info!("Ended session {}", id);
        }
        removed
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    /// Drops sessions untouched for at least `idle`. A session whose handle
    /// is still held elsewhere (a request in flight) is kept.
    pub async fn evict_idle(&self, idle: Duration) -> usize {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|id, entry| {
            let keep =
                entry.last_active.elapsed() < idle || Arc::strong_count(&entry.handle) > 1;
            if !keep {
                tracing::info!("Evicted idle session {}", id);
            }
            keep
        });
        before - sessions.len()
    }

    /// Evicts idle sessions on a timer until the runtime shuts down.
    pub fn spawn_idle_sweeper(&self, idle: Duration) -> JoinHandle<()> {
        let registry = self.clone();
        let period = (idle / 2).clamp(MIN_SWEEP_PERIOD, MAX_SWEEP_PERIOD);
        tracing::info!(
            "Session idle timeout {}s, sweeping every {}s",
            idle.as_secs(),
            period.as_secs()
        );

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                ticker.tick().await;
                let evicted = registry.evict_idle(idle).await;
                if evicted > 0 {
                    tracing::debug!("Swept {} idle sessions, {} left", evicted, registry.len().await);
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn sessions_are_isolated_and_removable() {
        let registry = SessionRegistry::new();
        let (first, handle) = registry.create().await;
        let (second, _) = registry.create().await;
        assert_ne!(first, second);
        assert_eq!(registry.len().await, 2);

        handle.lock().await.detailed_mode = true;
        let other = registry.get(&second).await.unwrap();
        assert!(!other.lock().await.detailed_mode);

        assert!(registry.remove(&first).await);
        assert!(!registry.remove(&first).await);
        assert!(registry.get(&first).await.is_none());
    }

    #[tokio::test]
    async fn idle_sessions_are_evicted_unless_in_use() {
        let registry = SessionRegistry::new();
        let (idle, _) = registry.create().await;
        let (busy, busy_handle) = registry.create().await;

        assert_eq!(registry.evict_idle(Duration::from_secs(60)).await, 0);
        assert_eq!(registry.len().await, 2);

        assert_eq!(registry.evict_idle(Duration::ZERO).await, 1);
        assert!(registry.get(&idle).await.is_none());
        assert!(registry.get(&busy).await.is_some());

        drop(busy_handle);
        assert_eq!(registry.evict_idle(Duration::ZERO).await, 1);
        assert_eq!(registry.len().await, 0);
    }

    #[tokio::test]
    async fn sweeper_clears_abandoned_sessions() {
        let registry = SessionRegistry::new();
        registry.create().await;

        let sweeper = registry.spawn_idle_sweeper(Duration::ZERO);
        // The first tick fires immediately.
        tokio::time::sleep(Duration::from_millis(50)).await;
        sweeper.abort();

        assert_eq!(registry.len().await, 0);
    }
}
