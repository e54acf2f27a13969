//! Periodic poll trigger for the pollable devices.

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use iotg_domain::id::DeviceId;

/// Owns the ordered pollable set and the repeating poll trigger.
///
/// The scheduler does not poll by itself: on every tick it invokes the
/// callback given to [`start`](Self::start), and the owner runs one poll
/// pass over [`order`](Self::order).
#[derive(Debug, Default)]
pub struct PollingScheduler {
    order: Vec<DeviceId>,
    ticker: Option<JoinHandle<()>>,
}

impl PollingScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a device to the pollable set.
    ///
    /// Registration order is poll order. Registering an id twice keeps its
    /// original position.
    pub fn register(&mut self, id: DeviceId) {
        if !self.order.contains(&id) {
            self.order.push(id);
        }
    }

    /// Pollable devices in poll order.
    #[must_use]
    pub fn order(&self) -> &[DeviceId] {
        &self.order
    }

    #[must_use]
    pub fn is_started(&self) -> bool {
        self.ticker.is_some()
    }

    /// Start the repeating trigger.
    ///
    /// The first tick fires one `interval` from now; the owner is expected
    /// to run the immediate pass itself. The trigger stops when `tick`
    /// returns `false`. Calling `start` on a started scheduler does nothing.
    pub fn start<F>(&mut self, interval: Duration, mut tick: F)
    where
        F: FnMut() -> bool + Send + 'static,
    {
        if self.is_started() {
            tracing::debug!("poll scheduler already running");
            return;
        }
        tracing::info!(interval_secs = interval.as_secs_f64(), devices = self.order.len(), "starting poll scheduler");
        self.ticker = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if !tick() {
                    break;
                }
            }
        }));
    }

    /// Abort the repeating trigger.
    pub fn stop(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

impl Drop for PollingScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}
