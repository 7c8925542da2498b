use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use chrono::{DateTime, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use uuid::Uuid;

use super::hold_timer::{Clock, HoldState, HoldTimer};

struct HoldWatch {
    generation: Uuid,
    expires_at: Option<DateTime<Utc>>,
    tx: Arc<watch::Sender<HoldState>>,
    task: JoinHandle<()>,
}

type WatchMap = Arc<Mutex<HashMap<i64, HoldWatch>>>;

/// One countdown task per observed booking. A task stops when its hold
/// reaches a terminal state, when every receiver is gone, or on `unwatch`.
pub struct HoldRegistry {
    clock: Arc<dyn Clock>,
    tick: Duration,
    watches: WatchMap,
}

impl HoldRegistry {
    pub fn new(clock: Arc<dyn Clock>, tick: Duration) -> Self {
        Self {
            clock,
            tick,
            watches: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn watch(
        &self,
        booking_id: i64,
        expires_at: Option<DateTime<Utc>>,
    ) -> watch::Receiver<HoldState> {
        let mut timer = HoldTimer::new(expires_at);
        let initial = timer.poll(self.clock.now());

        let mut watches = match self.watches.lock() {
            Ok(w) => w,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(existing) = watches.get(&booking_id) {
            if existing.expires_at == expires_at && !existing.task.is_finished() {
                return existing.tx.subscribe();
            }
        }
        if let Some(stale) = watches.remove(&booking_id) {
            stale.task.abort();
        }

        let (tx, rx) = watch::channel(initial);
        if initial.is_terminal() {
            return rx;
        }

        let tx = Arc::new(tx);
        let generation = Uuid::new_v4();
        let task = tokio::spawn(run_countdown(
            booking_id,
            generation,
            timer,
            Arc::clone(&self.clock),
            Arc::clone(&tx),
            self.tick,
            Arc::clone(&self.watches),
        ));

        tracing::debug!(booking_id, %generation, "hold watch started");
        watches.insert(
            booking_id,
            HoldWatch {
                generation,
                expires_at,
                tx,
                task,
            },
        );

        rx
    }

    pub fn unwatch(&self, booking_id: i64) -> bool {
        let removed = match self.watches.lock() {
            Ok(mut w) => w.remove(&booking_id),
            Err(poisoned) => poisoned.into_inner().remove(&booking_id),
        };
        match removed {
            Some(watch) => {
                watch.task.abort();
                tracing::debug!(booking_id, "hold watch stopped");
                true
            }
            None => false,
        }
    }

    pub fn active_count(&self) -> usize {
        match self.watches.lock() {
            Ok(w) => w.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        }
    }

    pub fn shutdown(&self) {
        let drained: Vec<HoldWatch> = match self.watches.lock() {
            Ok(mut w) => w.drain().map(|(_, v)| v).collect(),
            Err(poisoned) => poisoned.into_inner().drain().map(|(_, v)| v).collect(),
        };
        for watch in drained {
            watch.task.abort();
        }
    }
}

impl Drop for HoldRegistry {
    fn drop(&mut self) {
        self.shutdown();
    }
}

async fn run_countdown(
    booking_id: i64,
    generation: Uuid,
    mut timer: HoldTimer,
    clock: Arc<dyn Clock>,
    tx: Arc<watch::Sender<HoldState>>,
    tick: Duration,
    watches: WatchMap,
) {
    let mut interval = tokio::time::interval(tick);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let state = timer.poll(clock.now());
                tx.send_if_modified(|current| {
                    if *current == state {
                        false
                    } else {
                        *current = state;
                        true
                    }
                });
                if state.is_terminal() {
                    tracing::info!(booking_id, "hold expired");
                    break;
                }
            }
            _ = tx.closed() => break,
        }
    }

    // Only remove our own entry; a newer watch may have replaced it.
    let mut map = match watches.lock() {
        Ok(w) => w,
        Err(poisoned) => poisoned.into_inner(),
    };
    if map.get(&booking_id).map(|w| w.generation) == Some(generation) {
        map.remove(&booking_id);
        tracing::debug!(booking_id, %generation, "hold watch finished");
    }
}
