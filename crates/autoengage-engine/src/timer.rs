//! Process-local timer service.
//!
//! One slot per [`TimerClass`]; arming a class replaces whatever was in it,
//! which is what collapses duplicate tab-load signals into a single settle
//! fire. Cancellation flips a validity flag, so a sleep that already
//! finished delivers nothing.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::debug;

use crate::event::{EngineEvent, TimerClass, TimerEvent};

/// A single armed timer.
struct TimerSlot {
    /// Whether the timer is valid (not cancelled or replaced).
    valid: AtomicBool,
}

/// Arms, replaces, and cancels the engine's three timer classes.
pub struct TimerService {
    events: mpsc::Sender<EngineEvent>,
    slots: Mutex<HashMap<TimerClass, Arc<TimerSlot>>>,
}

impl TimerService {
    /// New service injecting fires into `events`.
    pub fn new(events: mpsc::Sender<EngineEvent>) -> Self {
        Self {
            events,
            slots: Mutex::new(HashMap::new()),
        }
    }

    /// Arm `event` to fire after `delay`, replacing the class's previous
    /// timer if one was pending.
    pub fn arm(&self, delay: Duration, event: TimerEvent) {
        let class = event.class();
        let slot = Arc::new(TimerSlot {
            valid: AtomicBool::new(true),
        });

        {
            let mut slots = self.slots.lock();
            if let Some(previous) = slots.insert(class, slot.clone()) {
                previous.valid.store(false, Ordering::SeqCst);
                debug!("Timer {} replaced", class);
            }
        }

        debug!("Timer {} armed for {:?}", class, delay);

        let events = self.events.clone();
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            if slot.valid.load(Ordering::SeqCst) {
                let _ = events.send(event.into_event()).await;
            }
        });
    }

    /// Cancel the class's pending timer, if any. Idempotent.
    pub fn cancel(&self, class: TimerClass) {
        let mut slots = self.slots.lock();
        if let Some(slot) = slots.remove(&class) {
            slot.valid.store(false, Ordering::SeqCst);
            debug!("Timer {} cancelled", class);
        }
    }

    /// Cancel every pending timer.
    pub fn cancel_all(&self) {
        let mut slots = self.slots.lock();
        for (class, slot) in slots.drain() {
            slot.valid.store(false, Ordering::SeqCst);
            debug!("Timer {} cancelled", class);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use autoengage_protocols::TabId;

    #[tokio::test(start_paused = true)]
    async fn test_timer_fires() {
        let (tx, mut rx) = mpsc::channel(8);
        let timers = TimerService::new(tx);

        timers.arm(Duration::from_secs(5), TimerEvent::Advance { index: 2 });

        tokio::time::advance(Duration::from_secs(6)).await;
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, EngineEvent::AdvanceDue { index: 2 }));
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_suppresses_fire() {
        let (tx, mut rx) = mpsc::channel(8);
        let timers = TimerService::new(tx);

        timers.arm(Duration::from_secs(5), TimerEvent::Watchdog { index: 0 });
        timers.cancel(TimerClass::Watchdog);

        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_arming_replaces_previous() {
        let (tx, mut rx) = mpsc::channel(8);
        let timers = TimerService::new(tx);

        timers.arm(
            Duration::from_secs(2),
            TimerEvent::Settle {
                index: 0,
                tab_id: TabId(1),
            },
        );
        // A second load signal re-arms the settle; only one fire results.
        timers.arm(
            Duration::from_secs(2),
            TimerEvent::Settle {
                index: 0,
                tab_id: TabId(1),
            },
        );

        tokio::time::advance(Duration::from_secs(5)).await;
        assert!(matches!(
            rx.recv().await.unwrap(),
            EngineEvent::SettleElapsed { index: 0, .. }
        ));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_all() {
        let (tx, mut rx) = mpsc::channel(8);
        let timers = TimerService::new(tx);

        timers.arm(Duration::from_secs(3), TimerEvent::Watchdog { index: 0 });
        timers.arm(Duration::from_secs(3), TimerEvent::Advance { index: 0 });
        timers.cancel_all();

        tokio::time::advance(Duration::from_secs(10)).await;
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_missing_class_is_noop() {
        let (tx, _rx) = mpsc::channel(8);
        let timers = TimerService::new(tx);
        timers.cancel(TimerClass::Advance);
        timers.cancel(TimerClass::Advance);
    }

    #[tokio::test(start_paused = true)]
    async fn test_classes_are_independent() {
        let (tx, mut rx) = mpsc::channel(8);
        let timers = TimerService::new(tx);

        timers.arm(Duration::from_secs(2), TimerEvent::Watchdog { index: 0 });
        timers.arm(Duration::from_secs(4), TimerEvent::Advance { index: 0 });
        timers.cancel(TimerClass::Watchdog);

        tokio::time::advance(Duration::from_secs(5)).await;
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, EngineEvent::AdvanceDue { index: 0 }));
        assert!(rx.try_recv().is_err());
    }
}
