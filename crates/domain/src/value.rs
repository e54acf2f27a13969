//! Typed property values and their declared domains.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainViolation;

/// A single property value as exchanged with the framework.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Number(f64),
    String(String),
}

impl Value {
    /// The boolean payload, if this is a [`Value::Bool`].
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// The integer payload, if this is a [`Value::Int`].
    #[must_use]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// The numeric payload of an [`Int`](Value::Int) or [`Number`](Value::Number).
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Int(i) => Some(*i as f64),
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// The string payload, if this is a [`Value::String`].
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => b.fmt(f),
            Self::Int(i) => i.fmt(f),
            Self::Number(n) => n.fmt(f),
            Self::String(s) => f.write_str(s),
        }
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Number(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::String(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::String(value)
    }
}

/// The declared domain of a property.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ValueType {
    Boolean,
    Integer { minimum: i64, maximum: i64 },
    Number { minimum: f64, maximum: f64 },
    #[serde(rename = "string")]
    Enumeration {
        #[serde(rename = "enum")]
        values: Vec<&'static str>,
    },
    #[serde(rename = "string")]
    Color,
}

impl ValueType {
    /// Validate a value written by the framework.
    ///
    /// Integral numbers are accepted for integer domains and integers for
    /// number domains; colours are normalised to upper-case `#RRGGBB`.
    ///
    /// # Errors
    ///
    /// Returns the [`DomainViolation`] describing the first failed check.
    #[allow(clippy::cast_precision_loss)]
    pub fn validate(&self, value: Value) -> Result<Value, DomainViolation> {
        let value = self.conform_kind(value)?;
        match (self, &value) {
            (Self::Integer { minimum, maximum }, Value::Int(i)) => {
                check_range(*i as f64, *minimum as f64, *maximum as f64)?;
            }
            (Self::Number { minimum, maximum }, Value::Number(n)) => {
                check_range(*n, *minimum, *maximum)?;
            }
            _ => {}
        }
        Ok(value)
    }

    /// Like [`validate`](Self::validate) but clamps numbers into range.
    ///
    /// Used for values sampled from hardware, where an out-of-range reading
    /// must not break the domain invariant.
    ///
    /// # Errors
    ///
    /// Returns a [`DomainViolation`] when the value is of the wrong kind or
    /// not part of an enumeration.
    pub fn coerce(&self, value: Value) -> Result<Value, DomainViolation> {
        let value = self.conform_kind(value)?;
        Ok(match (self, value) {
            (Self::Integer { minimum, maximum }, Value::Int(i)) => {
                Value::Int(i.clamp(*minimum, *maximum))
            }
            (Self::Number { minimum, maximum }, Value::Number(n)) => {
                Value::Number(n.clamp(*minimum, *maximum))
            }
            (_, other) => other,
        })
    }

    /// Initial value for a freshly created property.
    #[must_use]
    pub fn initial_value(&self) -> Value {
        match self {
            Self::Boolean => Value::Bool(false),
            Self::Integer { minimum, maximum } => Value::Int(0.clamp(*minimum, *maximum)),
            Self::Number { minimum, maximum } => Value::Number(0.0_f64.clamp(*minimum, *maximum)),
            Self::Enumeration { values } => {
                Value::String(values.first().copied().unwrap_or_default().to_string())
            }
            Self::Color => Value::String(Rgb::BLACK.to_string()),
        }
    }

    #[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
    fn conform_kind(&self, value: Value) -> Result<Value, DomainViolation> {
        match (self, value) {
            (Self::Boolean, v @ Value::Bool(_)) => Ok(v),
            (Self::Integer { .. }, v @ Value::Int(_)) => Ok(v),
            (Self::Integer { .. }, Value::Number(n)) if n.fract() == 0.0 && n.is_finite() => {
                Ok(Value::Int(n as i64))
            }
            (Self::Number { .. }, Value::Int(i)) => Ok(Value::Number(i as f64)),
            (Self::Number { .. }, Value::Number(n)) if n.is_finite() => Ok(Value::Number(n)),
            (Self::Enumeration { values }, Value::String(s)) => {
                if values.contains(&s.as_str()) {
                    Ok(Value::String(s))
                } else {
                    Err(DomainViolation::NotEnumerated(s))
                }
            }
            (Self::Color, Value::String(s)) => s
                .parse::<Rgb>()
                .map(|rgb| Value::String(rgb.to_string()))
                .map_err(|_| DomainViolation::MalformedColor(s)),
            (kind, _) => Err(DomainViolation::WrongKind {
                expected: kind.kind_name(),
            }),
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Integer { .. } => "integer",
            Self::Number { .. } => "number",
            Self::Enumeration { .. } => "enumerated string",
            Self::Color => "colour string",
        }
    }
}

fn check_range(value: f64, minimum: f64, maximum: f64) -> Result<(), DomainViolation> {
    if value < minimum {
        return Err(DomainViolation::BelowMinimum { minimum });
    }
    if value > maximum {
        return Err(DomainViolation::AboveMaximum { maximum });
    }
    Ok(())
}

/// An RGB colour, written and displayed as `#RRGGBB`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub red: u8,
    pub green: u8,
    pub blue: u8,
}

impl Rgb {
    pub const BLACK: Self = Self::new(0x00, 0x00, 0x00);
    pub const GREEN: Self = Self::new(0x00, 0xFF, 0x00);
    pub const ORANGE: Self = Self::new(0xFF, 0x7F, 0x27);
    pub const RED: Self = Self::new(0xFF, 0x00, 0x00);

    #[must_use]
    pub const fn new(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }
}

/// The string is not a `#RRGGBB` colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParseRgbError;

impl FromStr for Rgb {
    type Err = ParseRgbError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hex = s.strip_prefix('#').ok_or(ParseRgbError)?;
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(ParseRgbError);
        }
        let channel = |range: std::ops::Range<usize>| {
            u8::from_str_radix(&hex[range], 16).map_err(|_| ParseRgbError)
        };
        Ok(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.red, self.green, self.blue)
    }
}
