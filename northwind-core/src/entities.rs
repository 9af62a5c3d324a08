//! Customer and employee records.
//!
//! Field names serialize the way the Northwind tables name their columns,
//! so records round-trip with the store collaborator unchanged.

use serde::{Deserialize, Serialize};

use crate::identity::{Entity, EntityKey, EntityKind, Timestamp};

/// A row of the Northwind `Customers` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Customer {
    #[serde(rename = "CustomerID")]
    pub customer_id: String,
    pub company_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fax: Option<String>,
}

impl Customer {
    /// Create a customer with only the required columns set.
    pub fn new(customer_id: impl Into<String>, company_name: impl Into<String>) -> Self {
        Self {
            customer_id: customer_id.into(),
            company_name: company_name.into(),
            contact_name: None,
            contact_title: None,
            address: None,
            city: None,
            region: None,
            postal_code: None,
            country: None,
            phone: None,
            fax: None,
        }
    }

    pub fn with_contact(mut self, name: impl Into<String>, title: impl Into<String>) -> Self {
        self.contact_name = Some(name.into());
        self.contact_title = Some(title.into());
        self
    }

    pub fn with_city(mut self, city: impl Into<String>) -> Self {
        self.city = Some(city.into());
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }
}

impl Entity for Customer {
    const KIND: EntityKind = EntityKind::Customer;

    fn raw_id(&self) -> &str {
        &self.customer_id
    }

    fn assign_key(&mut self, key: &EntityKey) {
        self.customer_id = key.as_str().to_string();
    }

    fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }
}

/// A row of the Northwind `Employees` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Employee {
    #[serde(rename = "EmployeeID")]
    pub employee_id: String,
    pub last_name: String,
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_of_courtesy: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hire_date: Option<Timestamp>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub postal_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub home_phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    /// Identifier of the manager this employee reports to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reports_to: Option<String>,
}

impl Employee {
    /// Create an employee with only the required columns set.
    pub fn new(
        employee_id: impl Into<String>,
        first_name: impl Into<String>,
        last_name: impl Into<String>,
    ) -> Self {
        Self {
            employee_id: employee_id.into(),
            last_name: last_name.into(),
            first_name: first_name.into(),
            title: None,
            title_of_courtesy: None,
            birth_date: None,
            hire_date: None,
            address: None,
            city: None,
            region: None,
            postal_code: None,
            country: None,
            home_phone: None,
            extension: None,
            notes: None,
            reports_to: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_country(mut self, country: impl Into<String>) -> Self {
        self.country = Some(country.into());
        self
    }

    pub fn with_hire_date(mut self, hire_date: Timestamp) -> Self {
        self.hire_date = Some(hire_date);
        self
    }

    pub fn reporting_to(mut self, manager_id: impl Into<String>) -> Self {
        self.reports_to = Some(manager_id.into());
        self
    }

    /// "First Last" display name.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

impl Entity for Employee {
    const KIND: EntityKind = EntityKind::Employee;

    fn raw_id(&self) -> &str {
        &self.employee_id
    }

    fn assign_key(&mut self, key: &EntityKey) {
        self.employee_id = key.as_str().to_string();
    }

    fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_customer_serializes_with_column_names() {
        let customer = Customer::new("ALFKI", "Alfreds Futterkiste").with_country("Germany");
        let json = serde_json::to_value(&customer).unwrap();
        assert_eq!(json["CustomerID"], "ALFKI");
        assert_eq!(json["CompanyName"], "Alfreds Futterkiste");
        assert_eq!(json["Country"], "Germany");
        assert!(json.get("Fax").is_none());
    }

    #[test]
    fn test_customer_deserializes_missing_optionals() {
        let customer: Customer =
            serde_json::from_str(r#"{"CustomerID":"anatr","CompanyName":"Ana Trujillo"}"#)
                .unwrap();
        assert_eq!(customer.customer_id, "anatr");
        assert!(customer.country.is_none());
    }

    #[test]
    fn test_normalize_rewrites_embedded_id() {
        let mut customer = Customer::new("alfki", "Alfreds Futterkiste");
        let key = customer.normalize().unwrap();
        assert_eq!(key.as_str(), "ALFKI");
        assert_eq!(customer.customer_id, "ALFKI");
    }

    #[test]
    fn test_employee_dates_and_manager() {
        let hired = Utc.with_ymd_and_hms(1992, 5, 1, 0, 0, 0).unwrap();
        let employee = Employee::new("e1", "Nancy", "Davolio")
            .with_title("Sales Representative")
            .with_hire_date(hired)
            .reporting_to("E2");
        assert_eq!(employee.full_name(), "Nancy Davolio");

        let json = serde_json::to_value(&employee).unwrap();
        assert_eq!(json["EmployeeID"], "e1");
        assert_eq!(json["ReportsTo"], "E2");

        let back: Employee = serde_json::from_value(json).unwrap();
        assert_eq!(back.hire_date, Some(hired));
    }

    #[test]
    fn test_blank_employee_id_fails_validation() {
        let mut employee = Employee::new("  ", "Nancy", "Davolio");
        assert!(employee.normalize().is_err());
        assert_eq!(Employee::KIND, EntityKind::Employee);
    }
}
