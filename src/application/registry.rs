//! Capability Registry
//!
//! Maps each subsystem type to its singleton instance. Filled once through
//! [`ServiceRegistryBuilder`] during startup and read-only afterwards.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use crate::shared::error::RegistryError;

struct Entry {
    name: &'static str,
    service: Arc<dyn Any + Send + Sync>,
}

/// Write phase of the registry
#[derive(Default)]
pub struct ServiceRegistryBuilder {
    entries: HashMap<TypeId, Entry>,
    order: Vec<&'static str>,
}

impl ServiceRegistryBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the singleton for `T`. Each type may be registered once.
    pub fn register<T>(&mut self, service: Arc<T>) -> Result<&mut Self, RegistryError>
    where
        T: Send + Sync + 'static,
    {
        self.register_as(service_name::<T>(), service)
    }

    /// Register under an explicit name, for handle types such as `Arc<dyn Trait>`.
    pub fn register_as<T>(&mut self, name: &'static str, service: Arc<T>) -> Result<&mut Self, RegistryError>
    where
        T: Send + Sync + 'static,
    {
        if self.entries.contains_key(&TypeId::of::<T>()) {
            return Err(RegistryError::Duplicate(name));
        }

        self.entries.insert(TypeId::of::<T>(), Entry { name, service });
        self.order.push(name);
        Ok(self)
    }

    /// Freeze the registry
    pub fn build(self) -> ServiceRegistry {
        ServiceRegistry {
            entries: self.entries,
            order: self.order,
        }
    }
}

/// Read-only capability registry
pub struct ServiceRegistry {
    entries: HashMap<TypeId, Entry>,
    order: Vec<&'static str>,
}

impl ServiceRegistry {
    pub fn get<T>(&self) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.entries
            .get(&TypeId::of::<T>())
            .and_then(|entry| entry.service.clone().downcast::<T>().ok())
    }

    pub fn require<T>(&self) -> Result<Arc<T>, RegistryError>
    where
        T: Send + Sync + 'static,
    {
        self.get::<T>()
            .ok_or_else(|| RegistryError::Missing(service_name::<T>()))
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// Registered service names, in registration order
    pub fn names(&self) -> &[&'static str] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Name a service was registered under
    pub fn name_of<T: 'static>(&self) -> Option<&'static str> {
        self.entries.get(&TypeId::of::<T>()).map(|entry| entry.name)
    }
}

fn service_name<T: ?Sized>() -> &'static str {
    let full = type_name::<T>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
