//! Publisher port: notifications towards the home-automation framework.

use std::future::Future;

use iotg_domain::error::GatewayError;
use iotg_domain::event::Notification;

/// Delivers device notifications to the framework boundary.
pub trait ThingPublisher {
    /// Publish a notification to all current subscribers.
    fn publish(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;
}

impl<T: ThingPublisher + Send + Sync> ThingPublisher for std::sync::Arc<T> {
    fn publish(
        &self,
        notification: Notification,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send {
        (**self).publish(notification)
    }
}
