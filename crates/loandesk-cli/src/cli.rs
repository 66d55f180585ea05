use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use loandesk_core::config::API_URL_ENV;
use loandesk_core::models::{CustomerProfile, PackageTerms};

#[derive(Parser, Debug)]
#[command(name = "loandesk", version, about = "Loan management admin console")]
pub struct Cli {
    /// Backend base URL (overrides the config file)
    #[arg(long, global = true, env = API_URL_ENV)]
    pub api_url: Option<String>,

    /// Print raw JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    /// Also write logs to loandesk.log in the cache directory
    #[arg(long, global = true)]
    pub log_file: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Log in with a bank id and password
    Login {
        /// Bank id; defaults to the last one used
        #[arg(long)]
        bank_id: Option<String>,
    },
    /// Register a new bank account (activated later by an operator)
    Register(RegisterArgs),
    /// Forget the stored session
    Logout,
    /// Show whether a session is active and when it expires
    Status,
    /// Customer and package totals
    Dashboard,
    /// Manage customers
    #[command(subcommand)]
    Customers(CustomerCommand),
    /// Manage loan packages
    #[command(subcommand)]
    Packages(PackageCommand),
}

#[derive(Args, Debug)]
pub struct RegisterArgs {
    /// Bank id, used as the login name
    #[arg(long)]
    pub id: String,
    /// Bank display name
    #[arg(long)]
    pub name: String,
    /// Registration proof document to upload
    #[arg(long)]
    pub document: PathBuf,
}

#[derive(Subcommand, Debug)]
pub enum CustomerCommand {
    /// List all customers
    List,
    /// Show one customer
    Show { id: i64 },
    /// Add a customer
    Add(CustomerArgs),
    /// Change fields of an existing customer
    Edit {
        id: i64,
        #[command(flatten)]
        changes: CustomerChanges,
    },
    /// Delete a customer
    Delete { id: i64 },
    /// Ask the backend whether the customer is eligible for the loan
    Check {
        id: i64,
        /// Store the decision on the customer record
        #[arg(long)]
        save: bool,
    },
    /// Loan packages recommended for an approved customer
    Recommend { id: i64 },
}

#[derive(Args, Debug)]
pub struct CustomerArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub employed: bool,
    #[arg(long)]
    pub income: f64,
    #[arg(long)]
    pub graduated: bool,
    #[arg(long, default_value_t = 0.0)]
    pub residential_assets: f64,
    #[arg(long, default_value_t = 0.0)]
    pub commercial_assets: f64,
    #[arg(long, default_value_t = 0.0)]
    pub luxury_assets: f64,
    #[arg(long, default_value_t = 0.0)]
    pub bank_assets: f64,
    #[arg(long)]
    pub credit_score: i64,
    #[arg(long)]
    pub loan_amount: f64,
    /// Loan term in years
    #[arg(long)]
    pub loan_term: i64,
    #[arg(long)]
    pub approved: Option<bool>,
}

impl From<CustomerArgs> for CustomerProfile {
    fn from(args: CustomerArgs) -> Self {
        CustomerProfile {
            name: args.name,
            is_employed: args.employed,
            income: args.income,
            is_graduated: args.graduated,
            residential_assets: args.residential_assets,
            commercial_assets: args.commercial_assets,
            luxury_assets: args.luxury_assets,
            bank_assets: args.bank_assets,
            credit_score: args.credit_score,
            loan_amount: args.loan_amount,
            loan_term: args.loan_term,
            approval_status: args.approved,
        }
    }
}

/// Fields to overwrite on an existing customer; anything left out keeps
/// its stored value.
#[derive(Args, Debug, Default)]
pub struct CustomerChanges {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub employed: Option<bool>,
    #[arg(long)]
    pub income: Option<f64>,
    #[arg(long)]
    pub graduated: Option<bool>,
    #[arg(long)]
    pub residential_assets: Option<f64>,
    #[arg(long)]
    pub commercial_assets: Option<f64>,
    #[arg(long)]
    pub luxury_assets: Option<f64>,
    #[arg(long)]
    pub bank_assets: Option<f64>,
    #[arg(long)]
    pub credit_score: Option<i64>,
    #[arg(long)]
    pub loan_amount: Option<f64>,
    #[arg(long)]
    pub loan_term: Option<i64>,
    #[arg(long)]
    pub approved: Option<bool>,
}

impl CustomerChanges {
    pub fn apply(self, profile: &mut CustomerProfile) {
        if let Some(name) = self.name {
            profile.name = name;
        }
        if let Some(employed) = self.employed {
            profile.is_employed = employed;
        }
        if let Some(income) = self.income {
            profile.income = income;
        }
        if let Some(graduated) = self.graduated {
            profile.is_graduated = graduated;
        }
        if let Some(value) = self.residential_assets {
            profile.residential_assets = value;
        }
        if let Some(value) = self.commercial_assets {
            profile.commercial_assets = value;
        }
        if let Some(value) = self.luxury_assets {
            profile.luxury_assets = value;
        }
        if let Some(value) = self.bank_assets {
            profile.bank_assets = value;
        }
        if let Some(score) = self.credit_score {
            profile.credit_score = score;
        }
        if let Some(amount) = self.loan_amount {
            profile.loan_amount = amount;
        }
        if let Some(term) = self.loan_term {
            profile.loan_term = term;
        }
        if self.approved.is_some() {
            profile.approval_status = self.approved;
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum PackageCommand {
    /// List all loan packages
    List,
    /// Show one loan package
    Show { id: i64 },
    /// Add a loan package
    Add(PackageArgs),
    /// Change fields of an existing loan package
    Edit {
        id: i64,
        #[command(flatten)]
        changes: PackageChanges,
    },
    /// Delete a loan package
    Delete { id: i64 },
}

#[derive(Args, Debug)]
pub struct PackageArgs {
    #[arg(long)]
    pub loan_name: String,
    #[arg(long)]
    pub loan_amount: f64,
    #[arg(long)]
    pub min_income: f64,
    #[arg(long)]
    pub min_assets: f64,
    #[arg(long)]
    pub min_credit_score: f64,
    /// Loan term in years
    #[arg(long)]
    pub loan_term: i64,
    /// Interest rate in percent
    #[arg(long)]
    pub interest_rate: f64,
}

impl From<PackageArgs> for PackageTerms {
    fn from(args: PackageArgs) -> Self {
        PackageTerms {
            loan_name: args.loan_name,
            loan_amount: args.loan_amount,
            min_income: args.min_income,
            min_assets: args.min_assets,
            min_credit_score: args.min_credit_score,
            loan_term: args.loan_term,
            interest_rate: args.interest_rate,
        }
    }
}

#[derive(Args, Debug, Default)]
pub struct PackageChanges {
    #[arg(long)]
    pub loan_name: Option<String>,
    #[arg(long)]
    pub loan_amount: Option<f64>,
    #[arg(long)]
    pub min_income: Option<f64>,
    #[arg(long)]
    pub min_assets: Option<f64>,
    #[arg(long)]
    pub min_credit_score: Option<f64>,
    #[arg(long)]
    pub loan_term: Option<i64>,
    #[arg(long)]
    pub interest_rate: Option<f64>,
}

impl PackageChanges {
    pub fn apply(self, terms: &mut PackageTerms) {
        if let Some(name) = self.loan_name {
            terms.loan_name = name;
        }
        if let Some(amount) = self.loan_amount {
            terms.loan_amount = amount;
        }
        if let Some(income) = self.min_income {
            terms.min_income = income;
        }
        if let Some(assets) = self.min_assets {
            terms.min_assets = assets;
        }
        if let Some(score) = self.min_credit_score {
            terms.min_credit_score = score;
        }
        if let Some(term) = self.loan_term {
            terms.loan_term = term;
        }
        if let Some(rate) = self.interest_rate {
            terms.interest_rate = rate;
        }
    }
}
