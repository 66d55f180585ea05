//! Plain-text output for the console commands.

use loandesk_core::auth::Credential;
use loandesk_core::models::{ApprovalResult, Customer, Dashboard, LoanPackage, MutationAck};
use loandesk_core::utils::{
    format_amount, format_date, format_optional, format_rate, truncate_string, yes_no,
};

/// Column width for names in list tables
const NAME_WIDTH: usize = 24;

pub fn print_ack(ack: &MutationAck) {
    match ack.id {
        Some(id) => println!("{} (id {})", ack.message, id),
        None => println!("{}", ack.message),
    }
}

pub fn print_status(credential: Option<&Credential>, api_url: &str) {
    println!("Backend:  {}", api_url);
    match credential {
        Some(credential) => {
            println!("Session:  active");
            if let Some(bank) = credential.subject() {
                println!("Bank:     {}", bank);
            }
            if let Some(expires_at) = credential.expires_at() {
                println!(
                    "Expires:  {} ({} minutes left)",
                    expires_at.format("%Y-%m-%d %H:%M UTC"),
                    credential.minutes_until_expiry()
                );
            }
        }
        None => println!("Session:  none (run `loandesk login`)"),
    }
}

pub fn print_customers(customers: &[Customer]) {
    if customers.is_empty() {
        println!("No customers.");
        return;
    }

    println!(
        "{:>5}  {:<width$}  {:>14}  {:>6}  {:>14}  {:>8}",
        "ID",
        "NAME",
        "INCOME",
        "SCORE",
        "LOAN",
        "APPROVED",
        width = NAME_WIDTH
    );
    for customer in customers {
        let profile = &customer.profile;
        println!(
            "{:>5}  {:<width$}  {:>14}  {:>6}  {:>14}  {:>8}",
            customer.id,
            truncate_string(&profile.name, NAME_WIDTH),
            format_amount(profile.income),
            profile.credit_score,
            format_amount(profile.loan_amount),
            approval_label(profile.approval_status),
            width = NAME_WIDTH
        );
    }
}

pub fn print_customer(customer: &Customer) {
    let profile = &customer.profile;
    println!("Customer #{}", customer.id);
    println!("  Name:               {}", profile.name);
    println!("  Employed:           {}", yes_no(profile.is_employed));
    println!("  Graduated:          {}", yes_no(profile.is_graduated));
    println!("  Income:             {}", format_amount(profile.income));
    println!("  Credit score:       {}", profile.credit_score);
    println!("  Residential assets: {}", format_amount(profile.residential_assets));
    println!("  Commercial assets:  {}", format_amount(profile.commercial_assets));
    println!("  Luxury assets:      {}", format_amount(profile.luxury_assets));
    println!("  Bank assets:        {}", format_amount(profile.bank_assets));
    println!("  Total assets:       {}", format_amount(profile.total_assets()));
    println!("  Loan amount:        {}", format_amount(profile.loan_amount));
    println!("  Loan term:          {} years", profile.loan_term);
    println!("  Approved:           {}", approval_label(profile.approval_status));
    if let Some(ref created) = customer.created_at {
        println!("  Created:            {}", format_date(created));
    }
    if let Some(ref updated) = customer.updated_at {
        println!("  Updated:            {}", format_date(updated));
    }
}

pub fn print_approval(result: &ApprovalResult) {
    println!("Approval status: {}", yes_no(result.approval_status));
    println!("{}", result.message);
}

pub fn print_packages(packages: &[LoanPackage]) {
    if packages.is_empty() {
        println!("No loan packages.");
        return;
    }

    println!(
        "{:>5}  {:<width$}  {:>14}  {:>5}  {:>8}",
        "ID",
        "NAME",
        "AMOUNT",
        "TERM",
        "RATE",
        width = NAME_WIDTH
    );
    for package in packages {
        let terms = &package.terms;
        println!(
            "{:>5}  {:<width$}  {:>14}  {:>5}  {:>8}",
            package.id,
            truncate_string(&terms.loan_name, NAME_WIDTH),
            format_amount(terms.loan_amount),
            terms.loan_term,
            format_rate(terms.interest_rate),
            width = NAME_WIDTH
        );
    }
}

pub fn print_package(package: &LoanPackage) {
    let terms = &package.terms;
    println!("Loan package #{}", package.id);
    println!("  Name:             {}", terms.loan_name);
    println!("  Amount:           {}", format_amount(terms.loan_amount));
    println!("  Term:             {} years", terms.loan_term);
    println!("  Interest rate:    {}", format_rate(terms.interest_rate));
    println!("  Min income:       {}", format_amount(terms.min_income));
    println!("  Min assets:       {}", format_amount(terms.min_assets));
    println!("  Min credit score: {}", terms.min_credit_score);
}

pub fn print_dashboard(dashboard: &Dashboard) {
    if let Some(ref customers) = dashboard.customers {
        println!("Customers");
        println!("  Total:           {}", customers.total_customers);
        println!("  Loan approved:   {}", customers.loan_approved_customers);
        println!(
            "  Latest:          {}",
            format_optional(&customers.latest_customer, "-")
        );
    }
    if let Some(ref packages) = dashboard.packages {
        println!("Loan packages");
        println!("  Total:           {}", packages.total_packages);
        println!("  Largest loan:    {}", optional_amount(packages.max_loan));
        println!("  Smallest loan:   {}", optional_amount(packages.min_loan));
    }
    for error in &dashboard.errors {
        eprintln!("Error: {}", error);
    }
}

fn approval_label(status: Option<bool>) -> &'static str {
    match status {
        Some(true) => "yes",
        Some(false) => "no",
        None => "-",
    }
}

fn optional_amount(amount: Option<f64>) -> String {
    amount.map(format_amount).unwrap_or_else(|| "-".to_string())
}
