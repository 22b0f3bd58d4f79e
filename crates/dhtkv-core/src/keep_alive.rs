use std::sync::Arc;
use std::time::Duration;

use dhtkv_store::Storer;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::connected::ConnectedStore;

/// Lifecycle of a [`KeepAlive`] loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeepAliveState {
    Running,
    Stopped,
}

/// State plus the generation of the loop that owns it. Each `start` bumps
/// the generation, which retires any loop spawned by an earlier `start`.
#[derive(Clone, Copy, Debug)]
struct Lifecycle {
    state: KeepAliveState,
    generation: u64,
}

/// Periodic re-publication of every ledger entry.
///
/// Each round resets the per-key statistics and re-puts the key at its last
/// sequence and CAS, so replication counts always describe the latest round.
/// Failures are logged and never abort the round.
pub struct KeepAlive<S> {
    store: ConnectedStore<S>,
    refresh: Duration,
    lifecycle: watch::Sender<Lifecycle>,
}

impl<S: Storer + 'static> KeepAlive<S> {
    pub fn new(store: ConnectedStore<S>, refresh: Duration) -> Self {
        let (lifecycle, _) = watch::channel(Lifecycle {
            state: KeepAliveState::Stopped,
            generation: 0,
        });
        Self {
            store,
            refresh,
            lifecycle,
        }
    }

    pub fn state(&self) -> KeepAliveState {
        self.lifecycle.borrow().state
    }

    pub fn refresh(&self) -> Duration {
        self.refresh
    }

    /// Switch to [`KeepAliveState::Running`] and spawn a loop that runs a
    /// round every `refresh`, the first one interval from now.
    ///
    /// The state changes before this returns, so a [`stop`](Self::stop)
    /// issued right after is never lost. The handle completes once the loop
    /// has observed the stop. Starting again retires the previous loop.
    pub fn start(self: &Arc<Self>) -> JoinHandle<()> {
        let mut generation = 0;
        self.lifecycle.send_modify(|lifecycle| {
            lifecycle.generation += 1;
            lifecycle.state = KeepAliveState::Running;
            generation = lifecycle.generation;
        });
        let lifecycle = self.lifecycle.subscribe();
        let this = Arc::clone(self);
        tokio::spawn(async move { this.run(generation, lifecycle).await })
    }

    /// Make the running loop return.
    pub fn stop(&self) {
        self.lifecycle
            .send_modify(|lifecycle| lifecycle.state = KeepAliveState::Stopped);
    }

    async fn run(&self, generation: u64, mut lifecycle: watch::Receiver<Lifecycle>) {
        let mut ticker = interval_at(Instant::now() + self.refresh, self.refresh);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(refresh_ms = self.refresh.as_millis() as u64, generation, "keep-alive started");

        loop {
            let current = *lifecycle.borrow_and_update();
            if current.state == KeepAliveState::Stopped || current.generation != generation {
                break;
            }
            tokio::select! {
                _ = ticker.tick() => {
                    self.run_round();
                }
                changed = lifecycle.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }
        info!(generation, "keep-alive stopped");
    }

    /// One re-publication round. Returns how many puts were launched.
    pub fn run_round(&self) -> usize {
        let entries = self.store.map();
        if entries.is_empty() {
            debug!("keep-alive round skipped: ledger empty");
            return 0;
        }

        let mut launched = 0;
        for (key, value) in entries {
            if !self.store.clear_stat(&key) {
                warn!(key = %key.short_hex(), "entry vanished before re-publish");
                continue;
            }
            let Some(stat) = self.store.stat(&key) else {
                warn!(key = %key.short_hex(), "entry vanished before re-publish");
                continue;
            };
            let copies = (stat.wish_replication_count > 0).then_some(stat.wish_replication_count);
            let store = self.store.clone();
            tokio::spawn(async move {
                if let Err(err) = store
                    .put(&stat.name, &value, stat.last_seq, stat.last_cas, copies)
                    .await
                {
                    warn!(key = %key.short_hex(), error = %err, "re-publish failed");
                }
            });
            launched += 1;
        }
        info!(launched, "keep-alive round");
        launched
    }
}

impl<S: Storer + 'static> std::fmt::Debug for KeepAlive<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeepAlive")
            .field("refresh", &self.refresh)
            .field("state", &self.state())
            .finish()
    }
}
