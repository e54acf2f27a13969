//! What a device asks its runtime to do, and what the runtime reports back.

use std::time::Duration;

use crate::endpoint::{Endpoint, Reading};
use crate::event::Notification;

/// A side effect requested by a device state machine.
///
/// Devices never perform IO themselves; the runtime executes effects and
/// feeds the outcome back as a [`Completion`].
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Deliver a notification to the framework.
    Notify(Notification),
    /// Issue a control write through the hardware channel.
    Write { endpoint: Endpoint, value: String },
    /// Read a set of hardware values, answered with [`Completion::Sampled`].
    Sample { readings: Vec<Reading> },
    /// Schedule a [`Completion::Woke`] after the given delay.
    Wake { after: Duration },
}

/// The outcome of an [`Effect`], delivered back to the owning device.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// A control write finished. Delivered whether or not the write
    /// succeeded; failures are logged by the runtime.
    WriteDone { endpoint: Endpoint },
    /// Raw integer readings, in request order. Failed reads arrive as `0`.
    Sampled(Vec<(Reading, i64)>),
    /// A scheduled delay elapsed.
    Woke,
}
