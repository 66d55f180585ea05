use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CustomerOverview {
    pub total_customers: i64,
    pub loan_approved_customers: i64,
    #[serde(default)]
    pub latest_customer: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PackageOverview {
    pub total_packages: i64,
    #[serde(default)]
    pub max_loan: Option<f64>,
    #[serde(default)]
    pub min_loan: Option<f64>,
}

/// Home screen aggregates. Each half is fetched on its own; if one
/// request fails the other is still shown and the failure is listed in
/// `errors`.
#[derive(Debug, Clone, Default)]
pub struct Dashboard {
    pub customers: Option<CustomerOverview>,
    pub packages: Option<PackageOverview>,
    pub errors: Vec<String>,
}
