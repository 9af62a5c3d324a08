//! Northwind Test Utilities
//!
//! Shared test infrastructure for the Northwind workspace:
//! - Proptest generators for customers, employees and identifiers
//! - Seeded stores and fixtures for the canonical scenarios
//! - Assertions over repository results

// Re-export the in-memory store from its source crate
pub use northwind_storage::{
    CustomerRepository, EmployeeRepository, EntityCache, EntityStore, InMemoryEntityStore,
    Repository, RepositoryError, RepositoryResult,
};

// Re-export core types for convenience
pub use northwind_core::{
    normalize_id, CacheConfig, Customer, Employee, Entity, EntityKey, EntityKind, NorthwindError,
    NorthwindResult, RepositoryConfig, StorageError, Timestamp, ValidationError,
};

// ============================================================================
// GENERATORS
// ============================================================================

pub mod generators {
    //! Proptest strategies for Northwind records.

    use super::*;
    use proptest::prelude::*;

    /// Countries that appear in the Northwind sample data.
    pub const COUNTRIES: &[&str] = &[
        "Argentina", "Austria", "Belgium", "Brazil", "Canada", "Denmark", "Finland", "France",
        "Germany", "Ireland", "Italy", "Mexico", "Norway", "Poland", "Portugal", "Spain",
        "Sweden", "Switzerland", "UK", "USA", "Venezuela",
    ];

    /// Generate a canonical five-letter customer identifier.
    pub fn arb_customer_id() -> impl Strategy<Value = String> {
        "[A-Z]{5}"
    }

    /// Generate a numeric employee identifier.
    pub fn arb_employee_id() -> impl Strategy<Value = String> {
        (1u32..10_000).prop_map(|n| n.to_string())
    }

    /// Generate an ASCII casing variant of `id`.
    pub fn arb_mixed_case(id: String) -> impl Strategy<Value = String> {
        let len = id.chars().count();
        prop::collection::vec(any::<bool>(), len).prop_map(move |flips| {
            id.chars()
                .zip(flips)
                .map(|(c, lower)| if lower { c.to_ascii_lowercase() } else { c.to_ascii_uppercase() })
                .collect()
        })
    }

    /// Generate a customer identifier together with one of its casing
    /// variants.
    pub fn arb_customer_id_with_variant() -> impl Strategy<Value = (String, String)> {
        arb_customer_id().prop_flat_map(|id| (Just(id.clone()), arb_mixed_case(id)))
    }

    /// Generate a country name, or none.
    pub fn arb_country() -> impl Strategy<Value = Option<String>> {
        prop::option::of(prop::sample::select(COUNTRIES).prop_map(str::to_string))
    }

    /// Generate a Timestamp (DateTime<Utc>).
    pub fn arb_timestamp() -> impl Strategy<Value = Timestamp> {
        // Hire dates between 1990 and 2030
        (631152000i64..1893456000i64).prop_map(|secs| {
            chrono::DateTime::from_timestamp(secs, 0).unwrap_or_else(chrono::Utc::now)
        })
    }

    /// Generate a customer with the given identifier.
    pub fn arb_customer_with_id(id: String) -> impl Strategy<Value = Customer> {
        ("[A-Z][a-z]{2,12}( [A-Z][a-z]{2,10})?", arb_country(), prop::option::of("[A-Z][a-z]{3,10}"))
            .prop_map(move |(company, country, city)| {
                let mut customer = Customer::new(id.clone(), company);
                customer.country = country;
                customer.city = city;
                customer
            })
    }

    /// Generate a customer with a random canonical identifier.
    pub fn arb_customer() -> impl Strategy<Value = Customer> {
        arb_customer_id().prop_flat_map(arb_customer_with_id)
    }

    /// Generate between `min` and `max` customers with distinct identifiers.
    pub fn arb_distinct_customers(min: usize, max: usize) -> impl Strategy<Value = Vec<Customer>> {
        prop::collection::btree_map(arb_customer_id(), arb_customer(), min..max).prop_map(|by_id| {
            by_id
                .into_iter()
                .map(|(id, mut customer)| {
                    customer.customer_id = id;
                    customer
                })
                .collect()
        })
    }

    /// Generate an employee with a random identifier.
    pub fn arb_employee() -> impl Strategy<Value = Employee> {
        (
            arb_employee_id(),
            "[A-Z][a-z]{2,10}",
            "[A-Z][a-z]{2,12}",
            arb_country(),
            prop::option::of(arb_timestamp()),
        )
            .prop_map(|(id, first, last, country, hire_date)| {
                let mut employee = Employee::new(id, first, last);
                employee.country = country;
                employee.hire_date = hire_date;
                employee
            })
    }
}

// ============================================================================
// FIXTURES
// ============================================================================

pub mod fixtures {
    //! Pre-built records and stores for common testing scenarios.

    use super::*;
    use std::sync::Arc;

    /// The two customers every scenario starts from.
    pub fn scenario_customers() -> Vec<Customer> {
        vec![
            Customer::new("ALFKI", "Alfreds Futterkiste")
                .with_contact("Maria Anders", "Sales Representative")
                .with_city("Berlin")
                .with_country("Germany")
                .with_phone("030-0074321"),
            Customer::new("ANATR", "Ana Trujillo")
                .with_contact("Ana Trujillo", "Owner")
                .with_city("México D.F.")
                .with_country("Mexico")
                .with_phone("(5) 555-4729"),
        ]
    }

    /// A customer that is not in [`scenario_customers`].
    pub fn new_customer() -> Customer {
        Customer::new("BERGS", "Berglunds snabbköp")
            .with_city("Luleå")
            .with_country("Sweden")
    }

    /// A small reporting chain of employees.
    pub fn sample_employees() -> Vec<Employee> {
        vec![
            Employee::new("2", "Andrew", "Fuller")
                .with_title("Vice President, Sales")
                .with_country("USA"),
            Employee::new("1", "Nancy", "Davolio")
                .with_title("Sales Representative")
                .with_country("USA")
                .reporting_to("2"),
            Employee::new("5", "Steven", "Buchanan")
                .with_title("Sales Manager")
                .with_country("UK")
                .reporting_to("2"),
        ]
    }

    /// A store seeded with [`scenario_customers`].
    pub fn scenario_customer_store() -> Arc<InMemoryEntityStore<Customer>> {
        let store = InMemoryEntityStore::new();
        store
            .seed(scenario_customers())
            .unwrap_or_else(|e| panic!("seeding scenario customers failed: {e}"));
        Arc::new(store)
    }

    /// A store seeded with [`sample_employees`].
    pub fn sample_employee_store() -> Arc<InMemoryEntityStore<Employee>> {
        let store = InMemoryEntityStore::new();
        store
            .seed(sample_employees())
            .unwrap_or_else(|e| panic!("seeding sample employees failed: {e}"));
        Arc::new(store)
    }

    /// Repository configuration with a short store timeout.
    pub fn fast_timeout_config() -> RepositoryConfig {
        RepositoryConfig::new().with_store_timeout(std::time::Duration::from_millis(50))
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

pub mod assertions {
    //! Assertions over repository results.

    use super::*;

    /// Assert that a result is Ok.
    #[track_caller]
    pub fn assert_ok<T: std::fmt::Debug>(result: &RepositoryResult<T>) {
        assert!(result.is_ok(), "Expected Ok, got Err: {:?}", result);
    }

    /// Assert that a result is a validation failure.
    #[track_caller]
    pub fn assert_validation_error<T: std::fmt::Debug>(result: &RepositoryResult<T>) {
        match result {
            Err(RepositoryError::Validation(_)) => {}
            other => panic!("Expected Validation error, got: {:?}", other),
        }
    }

    /// Assert that a result is NotFound for the given kind.
    #[track_caller]
    pub fn assert_not_found<T: std::fmt::Debug>(result: &RepositoryResult<T>, kind: EntityKind) {
        match result {
            Err(RepositoryError::NotFound { kind: k, .. }) => {
                assert_eq!(*k, kind, "Wrong entity kind in NotFound error");
            }
            other => panic!("Expected NotFound error for {:?}, got: {:?}", kind, other),
        }
    }

    /// Assert that a result is a persistence conflict.
    #[track_caller]
    pub fn assert_persistence_conflict<T: std::fmt::Debug>(result: &RepositoryResult<T>) {
        match result {
            Err(RepositoryError::PersistenceConflict { .. }) => {}
            other => panic!("Expected PersistenceConflict error, got: {:?}", other),
        }
    }

    /// Assert that a result is a lost cache race.
    #[track_caller]
    pub fn assert_cache_race_loss<T: std::fmt::Debug>(result: &RepositoryResult<T>) {
        match result {
            Err(RepositoryError::CacheRaceLoss { .. }) => {}
            other => panic!("Expected CacheRaceLoss error, got: {:?}", other),
        }
    }
}
