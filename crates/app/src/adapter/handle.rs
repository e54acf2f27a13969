//! Cloneable front door to a running adapter.

use tokio::sync::{mpsc, oneshot};

use iotg_domain::device::DeviceSnapshot;
use iotg_domain::error::GatewayError;
use iotg_domain::id::DeviceId;
use iotg_domain::value::Value;

type Reply<T> = oneshot::Sender<T>;

/// Framework requests accepted by the adapter task.
#[derive(Debug)]
pub(crate) enum Request {
    StartPairing {
        reply: Reply<()>,
    },
    CancelPairing,
    RemoveThing {
        id: DeviceId,
        reply: Reply<Result<(), GatewayError>>,
    },
    CancelRemoveThing {
        id: DeviceId,
    },
    SetProperty {
        id: DeviceId,
        property: String,
        value: Value,
        reply: Reply<Result<(), GatewayError>>,
    },
    InvokeAction {
        id: DeviceId,
        action: String,
        reply: Reply<Result<(), GatewayError>>,
    },
    Things {
        reply: Reply<Vec<DeviceSnapshot>>,
    },
    Thing {
        id: DeviceId,
        reply: Reply<Option<DeviceSnapshot>>,
    },
}

/// Handle used by the framework side to talk to the adapter.
///
/// Cloning is cheap. The adapter stops once every handle is dropped.
#[derive(Debug, Clone)]
pub struct AdapterHandle {
    sender: mpsc::Sender<Request>,
}

impl AdapterHandle {
    pub(crate) fn new(sender: mpsc::Sender<Request>) -> Self {
        Self { sender }
    }

    /// Re-announce every device, recreating any that were removed.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Stopped`] if the adapter is no longer running.
    #[tracing::instrument(skip(self))]
    pub async fn start_pairing(&self) -> Result<(), GatewayError> {
        self.call(|reply| Request::StartPairing { reply }).await
    }

    /// No-op: pairing completes immediately.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Stopped`] if the adapter is no longer running.
    #[tracing::instrument(skip(self))]
    pub async fn cancel_pairing(&self) -> Result<(), GatewayError> {
        self.send(Request::CancelPairing).await
    }

    /// Detach a device from the externally visible set.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] for an unknown id and
    /// [`GatewayError::Stopped`] if the adapter is no longer running.
    #[tracing::instrument(skip_all, fields(device = %id))]
    pub async fn remove_thing(&self, id: &DeviceId) -> Result<(), GatewayError> {
        let id = id.clone();
        self.call(|reply| Request::RemoveThing { id, reply }).await?
    }

    /// No-op: removal completes immediately.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Stopped`] if the adapter is no longer running.
    #[tracing::instrument(skip_all, fields(device = %id))]
    pub async fn cancel_remove_thing(&self, id: &DeviceId) -> Result<(), GatewayError> {
        self.send(Request::CancelRemoveThing { id: id.clone() })
            .await
    }

    /// Request a property change.
    ///
    /// Succeeds without effect when the device is busy with another
    /// operation.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::NotFound`] for an unknown device,
    /// [`GatewayError::Rejected`] when the device refuses the value and
    /// [`GatewayError::Stopped`] if the adapter is no longer running.
    #[tracing::instrument(skip_all, fields(device = %id, property = %property))]
    pub async fn set_property(
        &self,
        id: &DeviceId,
        property: &str,
        value: Value,
    ) -> Result<(), GatewayError> {
        let id = id.clone();
        let property = property.to_string();
        self.call(|reply| Request::SetProperty {
            id,
            property,
            value,
            reply,
        })
        .await?
    }

    /// Invoke a device action such as `reset`.
    ///
    /// # Errors
    ///
    /// Same as [`set_property`](Self::set_property).
    #[tracing::instrument(skip_all, fields(device = %id))]
    pub async fn invoke_action(&self, id: &DeviceId, action: &str) -> Result<(), GatewayError> {
        let id = id.clone();
        let action = action.to_string();
        self.call(|reply| Request::InvokeAction { id, action, reply })
            .await?
    }

    /// Snapshots of every visible device, in announcement order.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Stopped`] if the adapter is no longer running.
    pub async fn things(&self) -> Result<Vec<DeviceSnapshot>, GatewayError> {
        self.call(|reply| Request::Things { reply }).await
    }

    /// Snapshot of one visible device.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Stopped`] if the adapter is no longer running.
    pub async fn thing(&self, id: &DeviceId) -> Result<Option<DeviceSnapshot>, GatewayError> {
        let id = id.clone();
        self.call(|reply| Request::Thing { id, reply }).await
    }

    async fn send(&self, request: Request) -> Result<(), GatewayError> {
        self.sender
            .send(request)
            .await
            .map_err(|_| GatewayError::Stopped)
    }

    async fn call<T>(&self, request: impl FnOnce(Reply<T>) -> Request) -> Result<T, GatewayError> {
        let (reply, response) = oneshot::channel();
        self.send(request(reply)).await?;
        response.await.map_err(|_| GatewayError::Stopped)
    }
}
