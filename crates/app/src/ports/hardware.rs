//! Hardware port: status reads and control writes against the board driver.

use std::future::Future;
use std::sync::Arc;

use iotg_domain::endpoint::{Endpoint, Reading};
use iotg_domain::error::GatewayError;

/// Stateless access to the board's status and control endpoints.
///
/// Implementations perform exactly one attempt per call; retries and
/// fallbacks are the caller's concern.
pub trait HardwareChannel: Send + Sync + 'static {
    /// Read a small integer status value.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Hardware`] when the value cannot be read or
    /// parsed.
    fn read(&self, reading: Reading) -> impl Future<Output = Result<i64, GatewayError>> + Send;

    /// Issue a control write and wait for it to finish.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError::Hardware`] when the write fails.
    fn write(
        &self,
        endpoint: Endpoint,
        value: &str,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send;
}

impl<T: HardwareChannel> HardwareChannel for Arc<T> {
    fn read(&self, reading: Reading) -> impl Future<Output = Result<i64, GatewayError>> + Send {
        (**self).read(reading)
    }

    fn write(
        &self,
        endpoint: Endpoint,
        value: &str,
    ) -> impl Future<Output = Result<(), GatewayError>> + Send {
        (**self).write(endpoint, value)
    }
}
