//! The adapter runtime: one task owning every device.
//!
//! ```text
//! AdapterHandle ──requests (bounded mpsc)──▶ ┌─────────────┐ ──notifications──▶ ThingPublisher
//!                                            │ adapter task│
//! IO tasks / timers / ticker ──internal────▶ └─────────────┘ ──spawned IO──▶ HardwareChannel
//! ```
//!
//! Device state machines only run inside the adapter task, so transitions of
//! one device are totally ordered. Hardware IO, timers and poll ticks run on
//! their own tasks and report back over the internal channel, so a hung
//! write only ever blocks its own device.
//!
//! A device removed while a hardware operation is in flight is retired
//! rather than destroyed: it is hidden from the framework but keeps running
//! its state machine until it is back to `Idle`. Pairing in the meantime
//! restores it, still busy, so two writes never hit the same endpoint.

mod handle;
#[cfg(test)]
mod tests;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use iotg_domain::device::{self, Completion, Device, Dispatch, Effect};
use iotg_domain::endpoint::{Endpoint, Reading};
use iotg_domain::error::{GatewayError, NotFoundError};
use iotg_domain::event::Notification;
use iotg_domain::id::DeviceId;
use iotg_domain::value::Value;

pub use handle::AdapterHandle;
use handle::Request;

use crate::ports::{HardwareChannel, ThingPublisher};
use crate::scheduler::PollingScheduler;

/// Default poll interval when none is configured.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(5);

/// Runtime settings of the adapter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterConfig {
    /// Delay between two poll passes.
    pub poll_interval: Duration,
    /// Upper bound on a single control write. `None` waits forever.
    pub write_timeout: Option<Duration>,
    /// Capacity of the request channel behind [`AdapterHandle`].
    pub request_capacity: usize,
}

impl Default for AdapterConfig {
    fn default() -> Self {
        Self {
            poll_interval: DEFAULT_POLL_INTERVAL,
            write_timeout: None,
            request_capacity: 32,
        }
    }
}

/// Identifies one incarnation of a device.
///
/// A device removed and re-added gets a new incarnation, so completions
/// issued for the old one are discarded.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Target {
    device_id: DeviceId,
    incarnation: u64,
}

#[derive(Debug)]
enum Internal {
    Completed {
        target: Target,
        completion: Completion,
        polled: bool,
    },
    Tick,
}

struct DeviceSlot {
    device: Device,
    incarnation: u64,
    poll_outstanding: bool,
    /// Removed by the framework, waiting for its in-flight operation.
    retired: bool,
}

impl DeviceSlot {
    fn target(&self) -> Target {
        Target {
            device_id: self.device.id().clone(),
            incarnation: self.incarnation,
        }
    }
}

/// Composition root for the device set.
///
/// Build with [`Adapter::new`], then [`spawn`](Adapter::spawn) it onto the
/// tokio runtime and talk to it through the returned [`AdapterHandle`].
pub struct Adapter<H, P> {
    hardware: Arc<H>,
    publisher: P,
    config: AdapterConfig,
    slots: Vec<DeviceSlot>,
    scheduler: PollingScheduler,
    next_incarnation: u64,
    internal_tx: mpsc::UnboundedSender<Internal>,
    internal_rx: mpsc::UnboundedReceiver<Internal>,
}

impl<H, P> Adapter<H, P>
where
    H: HardwareChannel,
    P: ThingPublisher + Send + Sync + 'static,
{
    #[must_use]
    pub fn new(hardware: H, publisher: P, config: AdapterConfig) -> Self {
        let (internal_tx, internal_rx) = mpsc::unbounded_channel();
        Self {
            hardware: Arc::new(hardware),
            publisher,
            config,
            slots: Vec::new(),
            scheduler: PollingScheduler::new(),
            next_incarnation: 0,
            internal_tx,
            internal_rx,
        }
    }

    /// Start the adapter task.
    ///
    /// The task announces every device, starts polling and then serves
    /// requests until all handles are dropped.
    pub fn spawn(self) -> (AdapterHandle, JoinHandle<()>) {
        let (sender, requests) = mpsc::channel(self.config.request_capacity.max(1));
        let task = tokio::spawn(self.run(requests));
        (AdapterHandle::new(sender), task)
    }

    async fn run(mut self, mut requests: mpsc::Receiver<Request>) {
        tracing::info!(
            poll_interval_secs = self.config.poll_interval.as_secs_f64(),
            write_timeout = ?self.config.write_timeout,
            "adapter started"
        );
        self.pair().await;
        loop {
            tokio::select! {
                biased;
                Some(internal) = self.internal_rx.recv() => self.on_internal(internal).await,
                request = requests.recv() => match request {
                    Some(request) => self.on_request(request).await,
                    None => break,
                },
            }
        }
        self.scheduler.stop();
        tracing::info!("adapter stopped");
    }

    async fn on_request(&mut self, request: Request) {
        match request {
            Request::StartPairing { reply } => {
                self.pair().await;
                let _ = reply.send(());
            }
            Request::CancelPairing => tracing::debug!("pairing cancelled"),
            Request::RemoveThing { id, reply } => {
                let _ = reply.send(self.remove(&id).await);
            }
            Request::CancelRemoveThing { id } => {
                tracing::debug!(device = %id, "removal cancelled");
            }
            Request::SetProperty {
                id,
                property,
                value,
                reply,
            } => {
                let result = self.set_property(&id, &property, value).await;
                let _ = reply.send(result);
            }
            Request::InvokeAction { id, action, reply } => {
                let result = self.invoke_action(&id, &action).await;
                let _ = reply.send(result);
            }
            Request::Things { reply } => {
                let things = self
                    .slots
                    .iter()
                    .filter(|s| !s.retired)
                    .map(|s| s.device.snapshot())
                    .collect();
                let _ = reply.send(things);
            }
            Request::Thing { id, reply } => {
                let _ = reply.send(self.slot(&id).map(|s| s.device.snapshot()));
            }
        }
    }

    async fn on_internal(&mut self, internal: Internal) {
        match internal {
            Internal::Tick => self.poll_pass(),
            Internal::Completed {
                target,
                completion,
                polled,
            } => {
                let Some(index) = self.slots.iter().position(|s| {
                    s.device.id() == &target.device_id && s.incarnation == target.incarnation
                }) else {
                    tracing::debug!(device = %target.device_id, "discarding completion for removed device");
                    return;
                };
                let slot = &mut self.slots[index];
                if polled {
                    slot.poll_outstanding = false;
                }
                let before = slot.device.write_state();
                let mut effects = slot.device.on_completion(completion);
                let after = slot.device.write_state();
                if before != after {
                    tracing::debug!(device = %target.device_id, from = %before, to = %after, "write state changed");
                }
                if slot.retired {
                    // the framework no longer knows this device
                    effects.retain(|effect| !matches!(effect, Effect::Notify(_)));
                    if after.is_idle() {
                        self.slots.remove(index);
                        tracing::info!(device = %target.device_id, "retired device destroyed");
                    }
                }
                self.execute(&target, effects).await;
            }
        }
    }

    /// Announce every device and make sure polling runs.
    async fn pair(&mut self) {
        let mut slots = Vec::with_capacity(self.slots.len());
        let mut existing = std::mem::take(&mut self.slots);
        for fresh in device::all_devices() {
            let slot = match existing.iter().position(|s| s.device.id() == fresh.id()) {
                Some(index) => {
                    let mut slot = existing.swap_remove(index);
                    if slot.retired {
                        tracing::info!(
                            device = %slot.device.id(),
                            write_state = %slot.device.write_state(),
                            "device restored while still busy"
                        );
                        slot.retired = false;
                    }
                    slot
                }
                None => {
                    tracing::info!(device = %fresh.id(), "device created");
                    self.next_incarnation += 1;
                    DeviceSlot {
                        device: fresh,
                        incarnation: self.next_incarnation,
                        poll_outstanding: false,
                        retired: false,
                    }
                }
            };
            slots.push(slot);
        }
        self.slots = slots;

        let mut pending = Vec::with_capacity(self.slots.len());
        for slot in &self.slots {
            if slot.device.is_pollable() {
                self.scheduler.register(slot.device.id().clone());
            }
            let mut effects = vec![slot.device.announce()];
            effects.extend(slot.device.refresh());
            pending.push((slot.target(), effects));
        }
        for (target, effects) in pending {
            self.execute(&target, effects).await;
        }

        if !self.scheduler.is_started() {
            self.poll_pass();
            let tx = self.internal_tx.clone();
            self.scheduler
                .start(self.config.poll_interval, move || tx.send(Internal::Tick).is_ok());
        }
    }

    async fn remove(&mut self, id: &DeviceId) -> Result<(), GatewayError> {
        let Some(index) = self
            .slots
            .iter()
            .position(|s| !s.retired && s.device.id() == id)
        else {
            tracing::error!(device = %id, "unpairing failed: device not found");
            return Err(not_found(id));
        };
        let write_state = self.slots[index].device.write_state();
        if write_state.is_idle() {
            self.slots.remove(index);
            tracing::info!(device = %id, "device removed");
        } else {
            self.slots[index].retired = true;
            tracing::info!(device = %id, %write_state, "device removed, retired until its operation completes");
        }
        self.publish(Notification::DeviceRemoved {
            device_id: id.clone(),
        })
        .await;
        Ok(())
    }

    async fn set_property(
        &mut self,
        id: &DeviceId,
        property: &str,
        value: Value,
    ) -> Result<(), GatewayError> {
        let slot = self.slot_mut(id)?;
        let dispatch = slot.device.handle_property_change(property, value)?;
        let target = slot.target();
        self.dispatch(&target, dispatch).await;
        Ok(())
    }

    async fn invoke_action(&mut self, id: &DeviceId, action: &str) -> Result<(), GatewayError> {
        let slot = self.slot_mut(id)?;
        let dispatch = slot.device.handle_action(action)?;
        let target = slot.target();
        self.dispatch(&target, dispatch).await;
        Ok(())
    }

    async fn dispatch(&self, target: &Target, dispatch: Dispatch) {
        match dispatch {
            Dispatch::Started(effects) => self.execute(target, effects).await,
            Dispatch::Ignored(state) => {
                tracing::debug!(device = %target.device_id, write_state = %state, "device busy, request dropped");
            }
        }
    }

    /// One sequential sweep over the pollable devices.
    fn poll_pass(&mut self) {
        tracing::debug!("poll pass");
        let order = self.scheduler.order().to_vec();
        for id in order {
            let Some(slot) = self
                .slots
                .iter_mut()
                .find(|s| !s.retired && s.device.id() == &id)
            else {
                continue;
            };
            let Some(Effect::Sample { readings }) = slot.device.poll() else {
                continue;
            };
            if slot.poll_outstanding {
                tracing::warn!(device = %id, "previous poll still outstanding, polling again");
            }
            slot.poll_outstanding = true;
            let target = slot.target();
            self.spawn_sample(target, readings, true);
        }
    }

    async fn execute(&self, target: &Target, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Notify(notification) => self.publish(notification).await,
                Effect::Write { endpoint, value } => self.spawn_write(target.clone(), endpoint, value),
                Effect::Sample { readings } => self.spawn_sample(target.clone(), readings, false),
                Effect::Wake { after } => self.spawn_wake(target.clone(), after),
            }
        }
    }

    async fn publish(&self, notification: Notification) {
        if let Err(err) = self.publisher.publish(notification).await {
            tracing::warn!(error = %err, "failed to publish notification");
        }
    }

    fn spawn_write(&self, target: Target, endpoint: Endpoint, value: String) {
        let hardware = Arc::clone(&self.hardware);
        let tx = self.internal_tx.clone();
        let timeout = self.config.write_timeout;
        tokio::spawn(async move {
            tracing::debug!(device = %target.device_id, %endpoint, %value, "writing");
            let result = match timeout {
                Some(limit) => tokio::time::timeout(limit, hardware.write(endpoint, &value))
                    .await
                    .unwrap_or_else(|elapsed| Err(GatewayError::hardware(elapsed))),
                None => hardware.write(endpoint, &value).await,
            };
            if let Err(err) = result {
                tracing::warn!(device = %target.device_id, %endpoint, %value, error = %err, "control write failed");
            }
            let _ = tx.send(Internal::Completed {
                target,
                completion: Completion::WriteDone { endpoint },
                polled: false,
            });
        });
    }

    fn spawn_sample(&self, target: Target, readings: Vec<Reading>, polled: bool) {
        let hardware = Arc::clone(&self.hardware);
        let tx = self.internal_tx.clone();
        tokio::spawn(async move {
            let mut sampled = Vec::with_capacity(readings.len());
            for reading in readings {
                let raw = match hardware.read(reading).await {
                    Ok(raw) => raw,
                    Err(err) => {
                        tracing::warn!(device = %target.device_id, %reading, error = %err, "status read failed, using 0");
                        0
                    }
                };
                sampled.push((reading, raw));
            }
            let _ = tx.send(Internal::Completed {
                target,
                completion: Completion::Sampled(sampled),
                polled,
            });
        });
    }

    fn spawn_wake(&self, target: Target, after: Duration) {
        let tx = self.internal_tx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(after).await;
            let _ = tx.send(Internal::Completed {
                target,
                completion: Completion::Woke,
                polled: false,
            });
        });
    }

    fn slot(&self, id: &DeviceId) -> Option<&DeviceSlot> {
        self.slots.iter().find(|s| !s.retired && s.device.id() == id)
    }

    fn slot_mut(&mut self, id: &DeviceId) -> Result<&mut DeviceSlot, GatewayError> {
        self.slots
            .iter_mut()
            .find(|s| !s.retired && s.device.id() == id)
            .ok_or_else(|| not_found(id))
    }
}

fn not_found(id: &DeviceId) -> GatewayError {
    NotFoundError {
        entity: "Device",
        id: id.to_string(),
    }
    .into()
}
