use core::cell::RefCell;
use core::fmt;
use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use critical_section::Mutex;
use heapless::FnvIndexMap;
use log::{debug, trace};

use super::{
    Input, ParameterDescriptor, ParameterValue, UpdatePolicy, VISUAL_PARAMETERS,
    hardware_parameters,
};
use crate::channel::Channel;
use crate::error::{RegistryError, ValidationError};
use crate::output::HardwareProfile;

/// Maximum number of registered parameters (one dirty bit each)
pub const MAX_PARAMETERS: usize = 64;

/// Maximum number of change subscribers
pub const MAX_SUBSCRIBERS: usize = 8;

/// Capacity of a [`ParameterChannel`]
const CHANNEL_SIZE: usize = 32;

/// A committed parameter change
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterChange {
    pub name: &'static str,
    pub previous: ParameterValue,
    pub value: ParameterValue,
    pub policy: UpdatePolicy,
}

/// Receives committed changes.
///
/// Called synchronously from the writer's thread, so implementations must not
/// block.
pub trait ParameterSubscriber: Send + Sync {
    fn notify(&self, change: &ParameterChange);
}

/// Bounded change queue; changes are dropped when it is full
pub type ParameterChannel = Channel<ParameterChange, CHANNEL_SIZE>;

impl<const SIZE: usize> ParameterSubscriber for Channel<ParameterChange, SIZE> {
    fn notify(&self, change: &ParameterChange) {
        if self.try_send(*change).is_err() {
            debug!("[ParameterStore] subscriber queue full, dropped change of {}", change.name);
        }
    }
}

#[derive(Debug)]
struct Registry {
    descriptors: Vec<ParameterDescriptor>,
    index: FnvIndexMap<&'static str, usize, MAX_PARAMETERS>,
}

impl Registry {
    fn lookup(&self, name: &str) -> Option<(usize, &ParameterDescriptor)> {
        let index = *self.index.get(name)?;
        Some((index, &self.descriptors[index]))
    }
}

/// Point-in-time copy of every parameter value
#[derive(Debug, Clone)]
pub struct ParameterSnapshot {
    registry: Arc<Registry>,
    values: Vec<ParameterValue>,
    revision: u64,
}

impl ParameterSnapshot {
    pub fn get(&self, name: &str) -> Option<ParameterValue> {
        let (index, _) = self.registry.lookup(name)?;
        Some(self.values[index])
    }

    /// Numeric value, `0.0` for unknown or non-numeric parameters
    pub fn number(&self, name: &str) -> f64 {
        self.get(name).and_then(ParameterValue::as_f64).unwrap_or(0.0)
    }

    /// Integer value, `0` for unknown or non-integer parameters
    pub fn integer(&self, name: &str) -> i64 {
        self.get(name).and_then(ParameterValue::as_i64).unwrap_or(0)
    }

    /// Boolean value, `false` for unknown or non-boolean parameters
    pub fn flag(&self, name: &str) -> bool {
        self.get(name).and_then(ParameterValue::as_bool).unwrap_or(false)
    }

    /// Choice value, empty for unknown or non-choice parameters
    pub fn choice(&self, name: &str) -> &'static str {
        self.get(name).and_then(ParameterValue::as_choice).unwrap_or("")
    }

    /// Number of committed writes before this snapshot was taken
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    /// Iterate over `(name, value)` pairs in registration order
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, ParameterValue)> + '_ {
        self.registry
            .descriptors
            .iter()
            .zip(self.values.iter())
            .map(|(descriptor, value)| (descriptor.name, *value))
    }
}

/// Parameters changed since the last [`ParameterStore::take_dirty`]
#[derive(Debug, Clone)]
pub struct DirtySet {
    bits: u64,
    registry: Arc<Registry>,
}

impl DirtySet {
    pub const fn is_empty(&self) -> bool {
        self.bits == 0
    }

    pub fn contains(&self, name: &str) -> bool {
        self.registry
            .lookup(name)
            .is_some_and(|(index, _)| self.bits & (1 << index) != 0)
    }

    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.descriptors().map(|descriptor| descriptor.name)
    }

    /// Whether any changed parameter needs output re-initialization
    pub fn requires_restart(&self) -> bool {
        self.descriptors()
            .any(ParameterDescriptor::is_restart_required)
    }

    fn descriptors(&self) -> impl Iterator<Item = &ParameterDescriptor> + '_ {
        self.registry
            .descriptors
            .iter()
            .enumerate()
            .filter(|(index, _)| self.bits & (1 << index) != 0)
            .map(|(_, descriptor)| descriptor)
    }
}

/// Collects descriptors before the store is shared
#[derive(Debug, Default)]
pub struct ParameterStoreBuilder {
    descriptors: Vec<ParameterDescriptor>,
    index: FnvIndexMap<&'static str, usize, MAX_PARAMETERS>,
}

impl ParameterStoreBuilder {
    pub fn register(&mut self, descriptor: ParameterDescriptor) -> Result<&mut Self, RegistryError> {
        if self.index.contains_key(descriptor.name) {
            return Err(RegistryError::DuplicateParameter(descriptor.name));
        }
        if descriptor.validate(Input::from(descriptor.default)).is_err() {
            return Err(RegistryError::InvalidDefault(descriptor.name));
        }
        self.index
            .insert(descriptor.name, self.descriptors.len())
            .map_err(|_| RegistryError::Full(MAX_PARAMETERS))?;
        self.descriptors.push(descriptor);
        Ok(self)
    }

    pub fn register_all(
        &mut self,
        descriptors: impl IntoIterator<Item = ParameterDescriptor>,
    ) -> Result<&mut Self, RegistryError> {
        for descriptor in descriptors {
            self.register(descriptor)?;
        }
        Ok(self)
    }

    pub fn build(self) -> ParameterStore {
        let registry = Arc::new(Registry {
            descriptors: self.descriptors,
            index: self.index,
        });
        let values = registry
            .descriptors
            .iter()
            .map(|descriptor| descriptor.default)
            .collect();
        let snapshot = ParameterSnapshot {
            registry: Arc::clone(&registry),
            values,
            revision: 0,
        };
        ParameterStore {
            registry,
            current: Mutex::new(RefCell::new(Arc::new(snapshot))),
            dirty: AtomicU64::new(0),
            subscribers: Mutex::new(RefCell::new(heapless::Vec::new())),
        }
    }
}

/// The single authoritative table of live parameter values.
///
/// Writers build a new value table and publish it with a pointer swap, so
/// readers calling [`ParameterStore::snapshot`] never observe a partially
/// applied change.
pub struct ParameterStore {
    registry: Arc<Registry>,
    current: Mutex<RefCell<Arc<ParameterSnapshot>>>,
    dirty: AtomicU64,
    subscribers: Mutex<RefCell<heapless::Vec<Arc<dyn ParameterSubscriber>, MAX_SUBSCRIBERS>>>,
}

impl ParameterStore {
    pub fn builder() -> ParameterStoreBuilder {
        ParameterStoreBuilder::default()
    }

    /// Store with the visual, pacing and hardware parameters.
    ///
    /// Hardware defaults come from `profile`.
    pub fn standard(profile: &HardwareProfile) -> Result<Self, RegistryError> {
        let mut builder = Self::builder();
        builder
            .register_all(VISUAL_PARAMETERS)?
            .register_all(hardware_parameters(profile))?;
        Ok(builder.build())
    }

    /// Validate and commit a value
    pub fn set(&self, name: &str, value: impl Into<ParameterValue>) -> Result<(), ValidationError> {
        self.commit(name, Input::from(value.into()))
    }

    /// Set a choice parameter from a runtime string
    pub fn set_choice(&self, name: &str, value: &str) -> Result<(), ValidationError> {
        self.commit(name, Input::Text(value))
    }

    /// Apply an update coming from the control transport.
    ///
    /// Accepts JSON scalars only.
    pub fn update(&self, name: &str, value: &serde_json::Value) -> Result<(), ValidationError> {
        let (_, descriptor) = self.lookup(name, value)?;
        let input = match value {
            serde_json::Value::Bool(value) => Input::Bool(*value),
            serde_json::Value::String(value) => Input::Text(value),
            serde_json::Value::Number(number) => match number.as_i64() {
                Some(value) => Input::Integer(value),
                None => Input::Number(number.as_f64().unwrap_or(f64::NAN)),
            },
            other => {
                return Err(ValidationError::wrong_type(
                    name,
                    other,
                    descriptor.kind.to_string(),
                ));
            }
        };
        self.commit(name, input)
    }

    /// Restore the registered default
    pub fn reset(&self, name: &str) -> Result<(), ValidationError> {
        let (_, descriptor) = self.lookup(name, "<default>")?;
        self.commit(name, Input::from(descriptor.default))
    }

    /// Restore every parameter that differs from its default
    pub fn reset_all(&self) {
        let snapshot = self.snapshot();
        for (descriptor, value) in self.registry.descriptors.iter().zip(&snapshot.values) {
            if *value != descriptor.default {
                // Defaults are validated at registration
                let _ = self.commit(descriptor.name, Input::from(descriptor.default));
            }
        }
    }

    /// Current values; cheap, safe to call from any thread
    pub fn snapshot(&self) -> Arc<ParameterSnapshot> {
        critical_section::with(|cs| Arc::clone(&self.current.borrow(cs).borrow()))
    }

    pub fn get(&self, name: &str) -> Option<ParameterValue> {
        self.snapshot().get(name)
    }

    pub fn descriptor(&self, name: &str) -> Option<&ParameterDescriptor> {
        self.registry.lookup(name).map(|(_, descriptor)| descriptor)
    }

    pub fn descriptors(&self) -> &[ParameterDescriptor] {
        &self.registry.descriptors
    }

    /// Whether a change of `name` only applies on output re-initialization
    pub fn is_restart_required(&self, name: &str) -> Result<bool, ValidationError> {
        self.lookup(name, "<none>")
            .map(|(_, descriptor)| descriptor.is_restart_required())
    }

    /// Take and clear the set of parameters changed since the last call
    pub fn take_dirty(&self) -> DirtySet {
        DirtySet {
            bits: self.dirty.swap(0, Ordering::AcqRel),
            registry: Arc::clone(&self.registry),
        }
    }

    /// Register a subscriber for committed changes
    pub fn subscribe(&self, subscriber: Arc<dyn ParameterSubscriber>) -> Result<(), RegistryError> {
        critical_section::with(|cs| {
            self.subscribers
                .borrow(cs)
                .borrow_mut()
                .push(subscriber)
                .map_err(|_| RegistryError::Full(MAX_SUBSCRIBERS))
        })
    }

    /// Subscribe through a new bounded channel
    pub fn subscribe_channel(&self) -> Result<Arc<ParameterChannel>, RegistryError> {
        let channel = Arc::new(ParameterChannel::new());
        self.subscribe(channel.clone())?;
        Ok(channel)
    }

    fn lookup(
        &self,
        name: &str,
        value: impl fmt::Display,
    ) -> Result<(usize, &ParameterDescriptor), ValidationError> {
        self.registry
            .lookup(name)
            .ok_or_else(|| ValidationError::unknown(name, value))
    }

    fn commit(&self, name: &str, input: Input<'_>) -> Result<(), ValidationError> {
        let (index, descriptor) = self.lookup(name, input)?;
        let value = descriptor.validate(input)?;

        // Publish a fresh table; retry if another writer got there first
        let previous = loop {
            let base = self.snapshot();
            let mut values = base.values.clone();
            let previous = core::mem::replace(&mut values[index], value);
            let next = Arc::new(ParameterSnapshot {
                registry: Arc::clone(&self.registry),
                values,
                revision: base.revision + 1,
            });
            let published = critical_section::with(|cs| {
                let mut current = self.current.borrow(cs).borrow_mut();
                if Arc::ptr_eq(&current, &base) {
                    *current = next;
                    true
                } else {
                    false
                }
            });
            if published {
                break previous;
            }
        };

        self.dirty.fetch_or(1 << index, Ordering::AcqRel);
        trace!("[ParameterStore] {} = {} (was {})", descriptor.name, value, previous);

        let change = ParameterChange {
            name: descriptor.name,
            previous,
            value,
            policy: descriptor.policy,
        };
        let subscribers = critical_section::with(|cs| self.subscribers.borrow(cs).borrow().clone());
        for subscriber in &subscribers {
            subscriber.notify(&change);
        }
        Ok(())
    }
}

impl fmt::Debug for ParameterStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParameterStore")
            .field("snapshot", &self.snapshot())
            .finish_non_exhaustive()
    }
}
