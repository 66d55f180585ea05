//! Data models for the loan backend.
//!
//! This module contains the structures exchanged with the backend:
//!
//! - `Customer`, `CustomerProfile`: loan applicants and their form fields
//! - `LoanPackage`, `PackageTerms`: the bank's loan offerings
//! - `ApprovalResult`, `Recommendation`: server-computed decisions
//! - `CustomerOverview`, `PackageOverview`, `Dashboard`: aggregates
//! - `LoginResponse`, `Registration`: account flows

pub mod account;
pub mod customer;
pub mod overview;
pub mod package;

pub use account::{LoginResponse, Registration, RegistrationAck};
pub use customer::{ApprovalResult, Customer, CustomerProfile, CustomerResponse, CustomersResponse};
pub use overview::{CustomerOverview, Dashboard, PackageOverview};
pub use package::{LoanPackage, PackageResponse, PackageTerms, PackagesResponse, Recommendation};

use serde::{Deserialize, Serialize};

/// Acknowledgement returned by create, update and delete endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MutationAck {
    pub message: String,
    // The package delete endpoint reports its id as `customer_id`.
    #[serde(default, alias = "customer_id", alias = "package_id")]
    pub id: Option<i64>,
}
