//! Service Registry
//!
//! One service instance per (service type, connection name). Instances are
//! created lazily through `ServiceFactory::create` or installed up front with
//! `install`, which is how tests and applications substitute a differently
//! configured service.

use std::any::{type_name, Any, TypeId};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;

use super::entity_service::EntityService;
use crate::error::{OrmError, OrmResult};

/// Resolves the service a relation points at, on a given connection
pub type ServiceLookup = fn(&str) -> OrmResult<Arc<dyn EntityService>>;

type ServiceKey = (TypeId, String);

static SERVICES: OnceLock<DashMap<ServiceKey, Arc<dyn Any + Send + Sync>>> = OnceLock::new();

fn services() -> &'static DashMap<ServiceKey, Arc<dyn Any + Send + Sync>> {
    SERVICES.get_or_init(DashMap::new)
}

/// Services that can be created from a connection name alone
pub trait ServiceFactory: EntityService + Sized {
    fn create(connection_name: &str) -> OrmResult<Self>;

    /// Shared instance for `connection_name`, created on first use
    fn instance(connection_name: &str) -> OrmResult<Arc<Self>> {
        instance::<Self>(connection_name)
    }
}

/// Shared instance of `S` for `connection_name`, created on first use
pub fn instance<S: ServiceFactory>(connection_name: &str) -> OrmResult<Arc<S>> {
    let key = (TypeId::of::<S>(), connection_name.to_string());

    if let Some(existing) = services().get(&key) {
        return downcast::<S>(existing.value().clone());
    }

    tracing::debug!("Creating {} for connection '{}'", type_name::<S>(), connection_name);
    let created: Arc<dyn Any + Send + Sync> = Arc::new(S::create(connection_name)?);
    let stored = services().entry(key).or_insert(created).value().clone();
    downcast::<S>(stored)
}

/// Install `service` as the instance of `S` for `connection_name`
///
/// Replaces any instance created before.
pub fn install<S: EntityService>(connection_name: &str, service: S) -> Arc<S> {
    let service = Arc::new(service);
    let stored: Arc<dyn Any + Send + Sync> = service.clone();
    services().insert((TypeId::of::<S>(), connection_name.to_string()), stored);
    tracing::debug!("Installed {} for connection '{}'", type_name::<S>(), connection_name);
    service
}

/// `instance` as a trait object; usable as a `ServiceLookup` via `resolve::<S>`
pub fn resolve<S: ServiceFactory>(connection_name: &str) -> OrmResult<Arc<dyn EntityService>> {
    let service: Arc<dyn EntityService> = instance::<S>(connection_name)?;
    Ok(service)
}

fn downcast<S: Any + Send + Sync>(service: Arc<dyn Any + Send + Sync>) -> OrmResult<Arc<S>> {
    service
        .downcast::<S>()
        .map_err(|_| OrmError::Configuration(format!("Registered service is not a {}", type_name::<S>())))
}
