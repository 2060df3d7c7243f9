//! Customer types

use serde::{Deserialize, Serialize};

use super::Area;
use crate::error::PlannerError;

/// Customer entity. The area never changes for a customer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub name: String,
    pub area: Area,
    pub address: String,
}

impl Customer {
    pub fn new(name: impl Into<String>, area: Area, address: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            area,
            address: address.into(),
        }
    }
}

/// Static reference data: every known customer with its fixed area
#[derive(Debug, Clone)]
pub struct CustomerDirectory {
    customers: Vec<Customer>,
}

impl CustomerDirectory {
    pub fn new(customers: Vec<Customer>) -> Self {
        Self { customers }
    }

    /// Built-in customer book for the Ahmedabad demo
    pub fn ahmedabad() -> Self {
        Self::new(vec![
            Customer::new("Aditya", Area::Satellite, "Near Jodhpur Cross Road, Satellite, Ahmedabad - 380015"),
            Customer::new("Vivaan", Area::Bopal, "Near Bopal Cross Road, Bopal, Ahmedabad - 380058"),
            Customer::new("Aarav", Area::Vastrapur, "Near Vastrapur Lake, Vastrapur, Ahmedabad - 380015"),
            Customer::new("Meera", Area::Paldi, "Opposite Dharnidhar Derasar, Paldi, Ahmedabad - 380007"),
            Customer::new("Diya", Area::Thaltej, "Near Thaltej Cross Road, S.G. Highway, Thaltej, Ahmedabad - 380054"),
            Customer::new("Riya", Area::Navrangpura, "Near Navrangpura AMTS Bus Stop, Navrangpura, Ahmedabad - 380009"),
            Customer::new("Ananya", Area::Bodakdev, "Opposite Rajpath Club, Bodakdev, Ahmedabad - 380054"),
            Customer::new("Aryan", Area::Gota, "Near Oganaj Gam, Gota, Ahmedabad - 382481"),
            Customer::new("Ishaan", Area::Maninagar, "Opposite Rambaug Police Station, Maninagar, Ahmedabad - 380008"),
            Customer::new("Kabir", Area::Chandkheda, "Near Chandkheda Gam Bus Stop, Chandkheda, Ahmedabad - 382424"),
        ])
    }

    /// Case-insensitive lookup
    pub fn get(&self, name: &str) -> Option<&Customer> {
        let name = name.trim();
        self.customers
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Lookup that rejects unknown names
    pub fn resolve(&self, name: &str) -> Result<&Customer, PlannerError> {
        self.get(name)
            .ok_or_else(|| PlannerError::UnknownCustomer(name.trim().to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Customer> {
        self.customers.iter()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.customers.len()
    }
}

impl Default for CustomerDirectory {
    fn default() -> Self {
        Self::ahmedabad()
    }
}
