use serde::{Deserialize, Serialize};

/// The editable fields of a customer, as submitted by the add/edit forms
/// and the approval check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub name: String,
    pub is_employed: bool,
    pub income: f64,
    pub is_graduated: bool,
    #[serde(default)]
    pub residential_assets: f64,
    #[serde(default)]
    pub commercial_assets: f64,
    #[serde(default)]
    pub luxury_assets: f64,
    #[serde(default)]
    pub bank_assets: f64,
    pub credit_score: i64,
    pub loan_amount: f64,
    pub loan_term: i64,
    #[serde(default)]
    pub approval_status: Option<bool>,
}

impl CustomerProfile {
    pub fn total_assets(&self) -> f64 {
        self.residential_assets + self.commercial_assets + self.luxury_assets + self.bank_assets
    }

    pub fn is_approved(&self) -> bool {
        self.approval_status.unwrap_or(false)
    }
}

/// A stored customer record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Customer {
    pub id: i64,
    #[serde(flatten)]
    pub profile: CustomerProfile,
    #[serde(default)]
    pub bank_id: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub updated_at: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CustomersResponse {
    pub customers: Vec<Customer>,
}

#[derive(Debug, Deserialize)]
pub struct CustomerResponse {
    pub customer: Customer,
}

/// Outcome of the server-side approval check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApprovalResult {
    pub approval_status: bool,
    pub message: String,
}
