//! Property state: a named, typed value owned by a device.
//!
//! Every successful [`write`](PropertyState::write) or
//! [`set_value`](PropertyState::set_value) pushes a change notification into
//! the caller's effect list, which is how changes reach the framework.

use serde::Serialize;

use crate::device::Effect;
use crate::error::{DomainViolation, Rejection};
use crate::event::Notification;
use crate::id::DeviceId;
use crate::value::{Value, ValueType};

/// A named, typed value with a read-only flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PropertyState {
    pub name: String,
    #[serde(rename = "@type", skip_serializing_if = "Option::is_none")]
    pub semantic_type: Option<&'static str>,
    pub title: String,
    pub description: Option<String>,
    pub unit: Option<&'static str>,
    #[serde(flatten)]
    value_type: ValueType,
    value: Value,
    read_only: bool,
    #[serde(skip)]
    owner: DeviceId,
}

impl PropertyState {
    /// Create a builder for constructing a [`PropertyState`].
    #[must_use]
    pub fn builder(owner: DeviceId, name: impl Into<String>, value_type: ValueType) -> PropertyBuilder {
        PropertyBuilder {
            owner,
            name: name.into(),
            value_type,
            semantic_type: None,
            title: None,
            description: None,
            unit: None,
            value: None,
            read_only: false,
        }
    }

    /// The last successfully applied value.
    #[must_use]
    pub fn read(&self) -> &Value {
        &self.value
    }

    #[must_use]
    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    #[must_use]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }

    #[must_use]
    pub fn owner(&self) -> &DeviceId {
        &self.owner
    }

    /// Apply a value requested by the framework.
    ///
    /// # Errors
    ///
    /// Returns [`Rejection::ReadOnly`] when the property is read-only and
    /// [`Rejection::OutOfDomain`] when validation fails. The cached value is
    /// left untouched in both cases.
    pub fn write(&mut self, value: Value, out: &mut Vec<Effect>) -> Result<Value, Rejection> {
        if self.read_only {
            return Err(Rejection::ReadOnly(self.name.clone()));
        }
        let accepted = self
            .value_type
            .validate(value)
            .map_err(|violation| Rejection::OutOfDomain {
                property: self.name.clone(),
                violation,
            })?;
        self.apply(accepted.clone(), out);
        Ok(accepted)
    }

    /// Push a sampled or computed value, bypassing the read-only flag.
    ///
    /// Numbers are clamped into the declared range.
    ///
    /// # Errors
    ///
    /// Returns a [`DomainViolation`] when the value is of the wrong kind.
    pub fn set_value(&mut self, value: Value, out: &mut Vec<Effect>) -> Result<(), DomainViolation> {
        let value = self.value_type.coerce(value)?;
        self.apply(value, out);
        Ok(())
    }

    /// Change the read-only flag, notifying only on an actual change.
    pub fn set_read_only(&mut self, read_only: bool, out: &mut Vec<Effect>) {
        if self.read_only == read_only {
            return;
        }
        self.read_only = read_only;
        out.push(Effect::Notify(Notification::ReadOnlyChanged {
            device_id: self.owner.clone(),
            property: self.name.clone(),
            read_only,
        }));
    }

    fn apply(&mut self, value: Value, out: &mut Vec<Effect>) {
        self.value = value.clone();
        out.push(Effect::Notify(Notification::PropertyChanged {
            device_id: self.owner.clone(),
            property: self.name.clone(),
            value,
        }));
    }
}

/// Step-by-step builder for [`PropertyState`].
#[derive(Debug)]
pub struct PropertyBuilder {
    owner: DeviceId,
    name: String,
    value_type: ValueType,
    semantic_type: Option<&'static str>,
    title: Option<String>,
    description: Option<String>,
    unit: Option<&'static str>,
    value: Option<Value>,
    read_only: bool,
}

impl PropertyBuilder {
    #[must_use]
    pub fn semantic_type(mut self, semantic_type: &'static str) -> Self {
        self.semantic_type = Some(semantic_type);
        self
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    #[must_use]
    pub fn unit(mut self, unit: &'static str) -> Self {
        self.unit = Some(unit);
        self
    }

    #[must_use]
    pub fn value(mut self, value: impl Into<Value>) -> Self {
        self.value = Some(value.into());
        self
    }

    #[must_use]
    pub fn read_only(mut self) -> Self {
        self.read_only = true;
        self
    }

    /// Consume the builder and return a [`PropertyState`].
    ///
    /// An initial value outside the domain falls back to the domain's
    /// initial value.
    #[must_use]
    pub fn build(self) -> PropertyState {
        let value = self
            .value
            .and_then(|value| self.value_type.coerce(value).ok())
            .unwrap_or_else(|| self.value_type.initial_value());
        PropertyState {
            title: self.title.unwrap_or_else(|| self.name.clone()),
            name: self.name,
            semantic_type: self.semantic_type,
            description: self.description,
            unit: self.unit,
            value_type: self.value_type,
            value,
            read_only: self.read_only,
            owner: self.owner,
        }
    }
}

/// The ordered set of properties owned by one device.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Properties(Vec<PropertyState>);

impl Properties {
    pub fn insert(&mut self, property: PropertyState) {
        match self.get_mut(&property.name) {
            Some(existing) => *existing = property,
            None => self.0.push(property),
        }
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PropertyState> {
        self.0.iter().find(|p| p.name == name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut PropertyState> {
        self.0.iter_mut().find(|p| p.name == name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertyState> {
        self.0.iter()
    }

    /// Current value of a property, if present.
    #[must_use]
    pub fn value(&self, name: &str) -> Option<&Value> {
        self.get(name).map(PropertyState::read)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
