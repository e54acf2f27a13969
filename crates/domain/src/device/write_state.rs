use std::fmt;
use std::time::Duration;

use serde::Serialize;

/// Delay between asserting and releasing a reset line.
pub const RESET_DELAY: Duration = Duration::from_millis(500);

/// Per-device write serialization state.
///
/// At most one hardware operation is in flight per device; any request
/// arriving outside [`WriteState::Idle`] is dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WriteState {
    /// No operation in flight.
    #[default]
    Idle,
    /// A single control write was issued and awaits completion.
    Writing,
    /// The reset line was asserted; awaiting that write's completion.
    ResetStep1,
    /// Waiting out the reset delay, then releasing the reset line.
    ResetStep2,
}

impl WriteState {
    #[must_use]
    pub fn is_idle(self) -> bool {
        matches!(self, Self::Idle)
    }
}

impl fmt::Display for WriteState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Idle => "idle",
            Self::Writing => "writing",
            Self::ResetStep1 => "reset_step1",
            Self::ResetStep2 => "reset_step2",
        };
        f.write_str(label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_start_idle() {
        assert_eq!(WriteState::default(), WriteState::Idle);
        assert!(WriteState::default().is_idle());
        assert!(!WriteState::ResetStep1.is_idle());
    }

    #[test]
    fn should_serialize_as_snake_case() {
        let json = serde_json::to_string(&WriteState::ResetStep2).unwrap();
        assert_eq!(json, "\"reset_step2\"");
        assert_eq!(WriteState::ResetStep2.to_string(), "reset_step2");
    }
}
