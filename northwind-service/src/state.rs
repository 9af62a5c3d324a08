//! Shared service state.
//!
//! Owns the two process-wide entity caches and hands out repositories over
//! them. Clone it into every request handler; clones share the caches.

use std::sync::Arc;
use std::time::Duration;

use northwind_core::{Customer, Employee, NorthwindResult, RepositoryConfig};
use northwind_storage::{
    CustomerRepository, EmployeeRepository, EntityCache, EntityStore, Repository,
    RepositoryResult,
};
use tracing::info;

use crate::config::ServiceConfig;

/// Process-wide state shared by all request handlers.
#[derive(Debug, Clone)]
pub struct ServiceState {
    customers: Arc<EntityCache<Customer>>,
    employees: Arc<EntityCache<Employee>>,
    repository_config: RepositoryConfig,
}

impl ServiceState {
    /// Create state with empty, uninitialized caches.
    ///
    /// Each cache is populated by the first repository built over it.
    pub fn new(config: &ServiceConfig) -> NorthwindResult<Self> {
        config.validate()?;
        let cache_config = config.cache_config();
        info!(
            store_timeout_ms = saturating_millis(config.store_timeout),
            cache_capacity = cache_config.initial_capacity,
            "service state created"
        );
        Ok(Self {
            customers: Arc::new(EntityCache::with_config(&cache_config)),
            employees: Arc::new(EntityCache::with_config(&cache_config)),
            repository_config: config.repository_config(),
        })
    }

    /// Repository over the customer cache and `store`.
    pub async fn customers<S>(&self, store: Arc<S>) -> RepositoryResult<CustomerRepository<S>>
    where
        S: EntityStore<Customer> + ?Sized,
    {
        Repository::new(
            Arc::clone(&self.customers),
            store,
            self.repository_config.clone(),
        )
        .await
    }

    /// Repository over the employee cache and `store`.
    pub async fn employees<S>(&self, store: Arc<S>) -> RepositoryResult<EmployeeRepository<S>>
    where
        S: EntityStore<Employee> + ?Sized,
    {
        Repository::new(
            Arc::clone(&self.employees),
            store,
            self.repository_config.clone(),
        )
        .await
    }

    /// The customer cache.
    pub fn customer_cache(&self) -> &EntityCache<Customer> {
        &self.customers
    }

    /// The employee cache.
    pub fn employee_cache(&self) -> &EntityCache<Employee> {
        &self.employees
    }

    /// Settings every repository is built with.
    pub fn repository_config(&self) -> &RepositoryConfig {
        &self.repository_config
    }
}

fn saturating_millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
