use std::fmt;
use std::future::Future;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use dashmap::DashMap;
use smol_str::SmolStr;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{Instrument, info_span, warn};

use super::policy::{OffloadConfig, TimeoutPolicy};

/// Identifies one piece of offloaded work, e.g. `feed_load#12`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OffloadKey {
    /// Label given at spawn time.
    pub kind: SmolStr,
    /// Sequence number, unique per manager.
    pub id: u64,
}

impl fmt::Display for OffloadKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.kind, self.id)
    }
}

#[derive(Debug)]
struct Registry {
    config: OffloadConfig,
    running: DashMap<u64, JoinHandle<()>>,
    next_id: AtomicU64,
}

/// Runs loader work on tokio tasks and keeps track of it.
///
/// Clones share one registry, so a loader and the test driving it can hold
/// separate clones and still [`wait_all`](Self::wait_all) on the same work.
/// Every task runs inside an `offload_task` span carrying its kind and id.
///
/// Spawning requires a running tokio runtime.
#[derive(Clone, Debug)]
pub struct OffloadManager {
    registry: Arc<Registry>,
}

impl OffloadManager {
    /// Manager applying `config` to every task it spawns.
    pub fn new(config: OffloadConfig) -> Self {
        Self {
            registry: Arc::new(Registry {
                config,
                running: DashMap::new(),
                next_id: AtomicU64::new(0),
            }),
        }
    }

    /// Manager with [`OffloadConfig::default`].
    pub fn with_defaults() -> Self {
        Self::new(OffloadConfig::default())
    }

    /// Settings applied to spawned tasks.
    pub fn config(&self) -> &OffloadConfig {
        &self.registry.config
    }

    /// Spawns `work` labelled with `kind`.
    pub fn spawn<F>(&self, kind: impl Into<SmolStr>, work: F) -> OffloadKey
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let key = OffloadKey {
            kind: kind.into(),
            id: self.registry.next_id.fetch_add(1, Ordering::Relaxed),
        };
        let span = info_span!("offload_task", kind = %key.kind, id = key.id);
        let policy = self.registry.config.timeout_policy;
        let registry = Arc::clone(&self.registry);
        let task_key = key.clone();
        // The task only starts once its handle is registered, so its own
        // removal always comes after the insert.
        let (registered, started) = oneshot::channel::<()>();

        let handle = tokio::spawn(
            async move {
                let _ = started.await;
                supervise(policy, &task_key, work).await;
                registry.running.remove(&task_key.id);
            }
            .instrument(span),
        );
        self.registry.running.insert(key.id, handle);
        let _ = registered.send(());
        key
    }

    /// Number of tasks still running.
    pub fn pending(&self) -> usize {
        self.registry
            .running
            .iter()
            .filter(|handle| !handle.is_finished())
            .count()
    }

    /// Aborts the task behind `key`. Returns `false` if it already finished.
    pub fn abort(&self, key: &OffloadKey) -> bool {
        match self.registry.running.get(&key.id) {
            Some(handle) if !handle.is_finished() => {
                handle.abort();
                true
            }
            _ => false,
        }
    }

    /// Aborts every running task. Their pending completions are released
    /// without being called.
    pub fn abort_all(&self) {
        for handle in self.registry.running.iter() {
            handle.abort();
        }
    }

    /// Waits until no task is running, including tasks spawned meanwhile.
    pub async fn wait_all(&self) {
        loop {
            self.registry
                .running
                .retain(|_, handle| !handle.is_finished());
            if self.registry.running.is_empty() {
                return;
            }
            tokio::task::yield_now().await;
        }
    }

    /// Like [`wait_all`](Self::wait_all), giving up after `limit`.
    ///
    /// Returns `false` if work was still running.
    pub async fn wait_all_for(&self, limit: Duration) -> bool {
        tokio::time::timeout(limit, self.wait_all()).await.is_ok()
    }
}

async fn supervise<F>(policy: TimeoutPolicy, key: &OffloadKey, work: F)
where
    F: Future<Output = ()>,
{
    match policy {
        TimeoutPolicy::None => work.await,
        TimeoutPolicy::Cancel(limit) => {
            if tokio::time::timeout(limit, work).await.is_err() {
                warn!(task = %key, limit_ms = limit.as_millis(), "offloaded work timed out and was dropped");
            }
        }
        TimeoutPolicy::Warn(limit) => {
            let started = Instant::now();
            work.await;
            let elapsed = started.elapsed();
            if elapsed > limit {
                warn!(
                    task = %key,
                    elapsed_ms = elapsed.as_millis(),
                    limit_ms = limit.as_millis(),
                    "offloaded work finished late"
                );
            }
        }
    }
}

impl Default for OffloadManager {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl feedcache_core::Offload for OffloadManager {
    fn spawn<F>(&self, kind: impl Into<SmolStr>, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        OffloadManager::spawn(self, kind, future);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, AtomicUsize};

    #[tokio::test]
    async fn wait_all_waits_for_spawned_work() {
        let manager = OffloadManager::with_defaults();
        let done = Arc::new(AtomicUsize::new(0));

        for _ in 0..3 {
            let done = Arc::clone(&done);
            manager.spawn("feed_load", async move {
                tokio::task::yield_now().await;
                done.fetch_add(1, Ordering::SeqCst);
            });
        }
        manager.wait_all().await;

        assert_eq!(done.load(Ordering::SeqCst), 3);
        assert_eq!(manager.pending(), 0);
    }

    #[tokio::test]
    async fn wait_all_sees_work_spawned_by_work() {
        let manager = OffloadManager::with_defaults();
        let done = Arc::new(AtomicBool::new(false));

        let nested = manager.clone();
        let flag = Arc::clone(&done);
        manager.spawn("feed_save", async move {
            nested.spawn("feed_save", async move {
                tokio::task::yield_now().await;
                flag.store(true, Ordering::SeqCst);
            });
        });
        manager.wait_all().await;

        assert!(done.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn keys_carry_kind_and_distinct_ids() {
        let manager = OffloadManager::with_defaults();

        let first = manager.spawn("image_load", async {});
        let second = manager.spawn("image_load", async {});

        assert_eq!(first.kind, "image_load");
        assert_ne!(first.id, second.id);
        assert_eq!(first.to_string(), format!("image_load#{}", first.id));
        manager.wait_all().await;
    }

    #[tokio::test]
    async fn cancel_policy_drops_slow_work() {
        let config = OffloadConfig::builder()
            .timeout(Duration::from_millis(10))
            .build();
        let manager = OffloadManager::new(config);
        let finished = Arc::new(AtomicBool::new(false));

        let flag = Arc::clone(&finished);
        manager.spawn("feed_load", async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            flag.store(true, Ordering::SeqCst);
        });
        manager.wait_all().await;

        assert!(!finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn abort_stops_running_work() {
        let manager = OffloadManager::with_defaults();

        let key = manager.spawn("feed_load", async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        });
        assert!(manager.abort(&key));
        manager.wait_all().await;

        assert!(!manager.abort(&key));
        assert_eq!(manager.pending(), 0);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn finished_work_leaves_the_registry() {
        let manager = OffloadManager::with_defaults();

        for _ in 0..500 {
            manager.spawn("feed_load", async {});
        }
        let drained = tokio::time::timeout(Duration::from_secs(5), async {
            while !manager.registry.running.is_empty() {
                tokio::task::yield_now().await;
            }
        })
        .await;

        assert!(drained.is_ok(), "finished tasks still registered");
    }

    #[tokio::test]
    async fn wait_all_for_reports_unfinished_work() {
        let manager = OffloadManager::with_defaults();
        manager.spawn("feed_load", async {
            tokio::time::sleep(Duration::from_secs(60)).await;
        });

        assert!(!manager.wait_all_for(Duration::from_millis(5)).await);

        manager.abort_all();
        assert!(manager.wait_all_for(Duration::from_secs(1)).await);
    }
}
