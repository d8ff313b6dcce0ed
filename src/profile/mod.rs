//! Customer profiles
//!
//! Read-only lookup over the processed customer table produced by the
//! external feature-engineering pipeline. Rows are keyed by `customer_id`;
//! columns beyond the ones modelled here are ignored.

use crate::error::{CompassError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

/// A customer's engineered feature record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub customer_id: u64,
    pub age: u32,
    pub income: f64,
    pub credit_score: u32,
    pub debt_to_income_ratio: f64,
    /// Comma-joined set of products the customer already holds
    pub existing_products: String,
    pub product_count: u32,
    pub engagement_score: i64,
    pub employment_status: String,
}

/// In-memory lookup table of customer profiles
pub struct ProfileStore {
    profiles: HashMap<u64, CustomerProfile>,
}

impl ProfileStore {
    /// Load profiles from the processed customer CSV
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(CompassError::Profiles {
                path: path.to_path_buf(),
                message: "Profile table not found (run the feature pipeline first)".to_string(),
            });
        }

        let mut reader = csv::Reader::from_path(path).map_err(|e| CompassError::Profiles {
            path: path.to_path_buf(),
            message: format!("Failed to open profile table: {}", e),
        })?;

        let mut profiles = HashMap::new();
        for record in reader.deserialize() {
            let profile: CustomerProfile = record?;
            profiles.insert(profile.customer_id, profile);
        }

        tracing::info!(
            "Loaded {} customer profiles from {}",
            profiles.len(),
            path.display()
        );

        Ok(Self { profiles })
    }

    /// Build a store from already-materialized profiles
    pub fn from_profiles(profiles: impl IntoIterator<Item = CustomerProfile>) -> Self {
        Self {
            profiles: profiles.into_iter().map(|p| (p.customer_id, p)).collect(),
        }
    }

    /// Look up a profile by customer id
    pub fn get(&self, customer_id: u64) -> Option<&CustomerProfile> {
        self.profiles.get(&customer_id)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const HEADER: &str = "customer_id,age,income,city,employment_status,credit_score,\
existing_products,account_balance,total_debt,number_of_open_accounts,payment_history,\
app_logins_per_month,customer_service_calls,website_visits_per_month,\
debt_to_income_ratio,engagement_score,product_count";

    #[test]
    fn test_load_ignores_extra_columns() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("processed_customer_data.csv");
        let row = "1,30,60000,Springfield,Employed,700,\"Checking Account\",1500.0,18000.0,3,\
On-time,12,1,8,0.3,20,1";
        std::fs::write(&path, format!("{}\n{}\n", HEADER, row)).unwrap();

        let store = ProfileStore::load(&path).unwrap();
        assert_eq!(store.len(), 1);

        let profile = store.get(1).unwrap();
        assert_eq!(profile.age, 30);
        assert_eq!(profile.credit_score, 700);
        assert_eq!(profile.existing_products, "Checking Account");
        assert_eq!(profile.product_count, 1);
        assert_eq!(profile.engagement_score, 20);
        assert_eq!(profile.employment_status, "Employed");
    }

    #[test]
    fn test_unknown_customer_is_none() {
        let store = ProfileStore::from_profiles(vec![]);
        assert!(store.get(999).is_none());
    }

    #[test]
    fn test_missing_file_is_profiles_error() {
        let result = ProfileStore::load(Path::new("/nonexistent/customers.csv"));
        assert!(matches!(result, Err(CompassError::Profiles { .. })));
    }
}
