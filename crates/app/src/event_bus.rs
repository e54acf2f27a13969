//! In-process [`ThingPublisher`] fanning device notifications out to any
//! number of local consumers (the daemon's console log, tests).

use std::future::Future;

use tokio::sync::broadcast;

use iotg_domain::error::GatewayError;
use iotg_domain::event::Notification;

use crate::ports::ThingPublisher;

/// Notification fan-out over a tokio [`broadcast`] channel.
///
/// Publishing never fails: without subscribers the notification is dropped,
/// and a subscriber that falls more than `capacity` notifications behind
/// skips the oldest ones and is told how many it missed.
#[derive(Clone)]
pub struct InProcessBus {
    sender: broadcast::Sender<Notification>,
}

impl InProcessBus {
    /// `capacity` bounds how far a subscriber may lag behind.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    /// Receiver for every notification published from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.sender.subscribe()
    }
}

impl ThingPublisher for InProcessBus {
    fn publish(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send {
        // send only fails without receivers
        let _ = self.sender.send(notification);
        async { Ok(()) }
    }
}
