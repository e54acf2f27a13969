//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into
//! [`GatewayError`] via `#[from]` (or an explicit `From` impl for boxed
//! hardware errors).

use std::fmt;

/// Top-level error for every bridge operation that can fail.
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// A device (or other addressed thing) does not exist.
    #[error("not found")]
    NotFound(#[from] NotFoundError),

    /// A framework request was refused by the target device.
    #[error("request rejected")]
    Rejected(#[from] Rejection),

    /// The hardware boundary failed (file read, helper process, timeout).
    #[error("hardware error")]
    Hardware(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// The adapter runtime is no longer running.
    #[error("adapter stopped")]
    Stopped,
}

/// A lookup by identifier found nothing.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{entity} {id} not found")]
pub struct NotFoundError {
    /// Kind of the thing that was looked up (e.g. `"Device"`).
    pub entity: &'static str,
    /// Identifier that was requested.
    pub id: String,
}

/// Why a property write or action invocation was refused.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Rejection {
    /// The property is declared or currently gated read-only.
    #[error("property {0} is read-only")]
    ReadOnly(String),

    /// The device has no property with this name.
    #[error("unknown property {0}")]
    UnknownProperty(String),

    /// The device declares no action with this name.
    #[error("unknown action {0}")]
    UnknownAction(String),

    /// The value does not fit the property's declared domain.
    #[error("invalid value for property {property}: {violation}")]
    OutOfDomain {
        property: String,
        violation: DomainViolation,
    },
}

/// A value that does not conform to a [`ValueType`](crate::value::ValueType).
#[derive(Debug, Clone, PartialEq)]
pub enum DomainViolation {
    /// The value is of the wrong kind (e.g. a string for a boolean).
    WrongKind { expected: &'static str },
    /// The number is below the declared minimum.
    BelowMinimum { minimum: f64 },
    /// The number is above the declared maximum.
    AboveMaximum { maximum: f64 },
    /// The string is not one of the enumerated values.
    NotEnumerated(String),
    /// The string is not a `#RRGGBB` colour.
    MalformedColor(String),
}

impl fmt::Display for DomainViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WrongKind { expected } => write!(f, "expected {expected}"),
            Self::BelowMinimum { minimum } => write!(f, "below minimum {minimum}"),
            Self::AboveMaximum { maximum } => write!(f, "above maximum {maximum}"),
            Self::NotEnumerated(value) => write!(f, "{value:?} is not an allowed value"),
            Self::MalformedColor(value) => write!(f, "{value:?} is not a #RRGGBB colour"),
        }
    }
}

impl std::error::Error for DomainViolation {}

impl GatewayError {
    /// Wrap any hardware-boundary error.
    pub fn hardware(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        Self::Hardware(Box::new(err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_display_not_found_with_entity_and_id() {
        let err = NotFoundError {
            entity: "Device",
            id: "device_4g".to_string(),
        };
        assert_eq!(err.to_string(), "Device device_4g not found");
    }

    #[test]
    fn should_convert_not_found_into_gateway_error() {
        let err: GatewayError = NotFoundError {
            entity: "Device",
            id: "nope".to_string(),
        }
        .into();
        assert!(matches!(err, GatewayError::NotFound(_)));
    }

    #[test]
    fn should_convert_rejection_into_gateway_error() {
        let err: GatewayError = Rejection::ReadOnly("Power".to_string()).into();
        assert!(matches!(err, GatewayError::Rejected(Rejection::ReadOnly(_))));
    }

    #[test]
    fn should_display_out_of_domain_rejection() {
        let err = Rejection::OutOfDomain {
            property: "Level".to_string(),
            violation: DomainViolation::AboveMaximum { maximum: 100.0 },
        };
        assert_eq!(
            err.to_string(),
            "invalid value for property Level: above maximum 100"
        );
    }

    #[test]
    fn should_box_hardware_errors() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err = GatewayError::hardware(io);
        assert!(matches!(err, GatewayError::Hardware(_)));
        assert_eq!(err.to_string(), "hardware error");
    }
}
