use serde::{Deserialize, Serialize};

/// The editable fields of a loan package.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageTerms {
    pub loan_name: String,
    pub loan_amount: f64,
    pub min_income: f64,
    pub min_assets: f64,
    pub min_credit_score: f64,
    pub loan_term: i64,
    pub interest_rate: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoanPackage {
    pub id: i64,
    #[serde(flatten)]
    pub terms: PackageTerms,
    #[serde(default)]
    pub bank_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PackagesResponse {
    pub packages: Vec<LoanPackage>,
}

#[derive(Debug, Deserialize)]
pub struct PackageResponse {
    pub package: LoanPackage,
}

/// Packages the backend considers a fit for a customer, best first.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub message: String,
    #[serde(default)]
    pub packages: Vec<LoanPackage>,
}
