use std::io::{self, BufRead, Write};

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::warn;

use loandesk_core::models::{CustomerProfile, PackageTerms, Registration};
use loandesk_core::{ApiClient, Config};

use crate::cli::{Command, CustomerCommand, PackageCommand, RegisterArgs};
use crate::render;

pub async fn dispatch(
    client: &ApiClient,
    config: &mut Config,
    command: Command,
    json: bool,
) -> Result<()> {
    match command {
        Command::Login { bank_id } => login(client, config, bank_id).await,
        Command::Register(args) => register(client, args).await,
        Command::Logout => {
            client.logout().await?;
            println!("Logged out.");
            Ok(())
        }
        Command::Status => {
            render::print_status(client.session().credential().as_ref(), client.base_url());
            Ok(())
        }
        Command::Dashboard => {
            let dashboard = client.fetch_dashboard().await?;
            render::print_dashboard(&dashboard);
            Ok(())
        }
        Command::Customers(command) => customers(client, command, json).await,
        Command::Packages(command) => packages(client, command, json).await,
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn prompt_line(label: &str, default: Option<&str>) -> Result<String> {
    match default {
        Some(default) => print!("{} [{}]: ", label, default),
        None => print!("{}: ", label),
    }
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let line = line.trim();

    match (line.is_empty(), default) {
        (true, Some(default)) => Ok(default.to_string()),
        (true, None) => bail!("{} is required", label),
        (false, _) => Ok(line.to_string()),
    }
}

async fn login(client: &ApiClient, config: &mut Config, bank_id: Option<String>) -> Result<()> {
    let bank_id = match bank_id {
        Some(id) => id,
        None => prompt_line("Bank id", config.last_bank_id.as_deref())?,
    };
    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;

    let credential = client.login(&bank_id, &password).await?;

    if config.last_bank_id.as_deref() != Some(bank_id.as_str()) {
        config.last_bank_id = Some(bank_id);
        if let Err(e) = config.save() {
            warn!(error = %e, "Failed to save config");
        }
    }

    println!(
        "Logged in. Session expires in {} minutes.",
        credential.minutes_until_expiry()
    );
    Ok(())
}

async fn register(client: &ApiClient, args: RegisterArgs) -> Result<()> {
    if !args.document.is_file() {
        bail!("Please upload a registration document.");
    }
    let password = rpassword::prompt_password("Password: ").context("Failed to read password")?;

    let ack = client
        .register(&Registration {
            id: args.id,
            name: args.name,
            password,
            document: args.document,
        })
        .await?;

    println!("{}", ack.message);
    println!("Your account has been registered. Please wait until it is activated.");
    Ok(())
}

async fn customers(client: &ApiClient, command: CustomerCommand, json: bool) -> Result<()> {
    match command {
        CustomerCommand::List => {
            let customers = client.fetch_customers().await?;
            if json {
                return print_json(&customers);
            }
            render::print_customers(&customers);
        }
        CustomerCommand::Show { id } => {
            let customer = client.fetch_customer(id).await?;
            if json {
                return print_json(&customer);
            }
            render::print_customer(&customer);
        }
        CustomerCommand::Add(args) => {
            let profile = CustomerProfile::from(args);
            let ack = client.add_customer(&profile).await?;
            render::print_ack(&ack);
        }
        CustomerCommand::Edit { id, changes } => {
            let mut profile = client.fetch_customer(id).await?.profile;
            changes.apply(&mut profile);
            let ack = client.update_customer(id, &profile).await?;
            render::print_ack(&ack);
        }
        CustomerCommand::Delete { id } => {
            let ack = client.delete_customer(id).await?;
            render::print_ack(&ack);
        }
        CustomerCommand::Check { id, save } => {
            let mut profile = client.fetch_customer(id).await?.profile;
            let result = client.check_approval_status(id, &profile).await?;
            if json {
                print_json(&result)?;
            } else {
                render::print_approval(&result);
            }

            if save {
                profile.approval_status = Some(result.approval_status);
                let ack = client.update_customer(id, &profile).await?;
                render::print_ack(&ack);
            }
        }
        CustomerCommand::Recommend { id } => {
            let profile = client.fetch_customer(id).await?.profile;
            let recommendation = client.recommend_packages(id, &profile).await?;
            if json {
                return print_json(&recommendation);
            }
            println!("{}", recommendation.message);
            render::print_packages(&recommendation.packages);
        }
    }
    Ok(())
}

async fn packages(client: &ApiClient, command: PackageCommand, json: bool) -> Result<()> {
    match command {
        PackageCommand::List => {
            let packages = client.fetch_packages().await?;
            if json {
                return print_json(&packages);
            }
            render::print_packages(&packages);
        }
        PackageCommand::Show { id } => {
            let package = client.fetch_package(id).await?;
            if json {
                return print_json(&package);
            }
            render::print_package(&package);
        }
        PackageCommand::Add(args) => {
            let terms = PackageTerms::from(args);
            let ack = client.add_package(&terms).await?;
            render::print_ack(&ack);
        }
        PackageCommand::Edit { id, changes } => {
            let mut terms = client.fetch_package(id).await?.terms;
            changes.apply(&mut terms);
            let ack = client.update_package(id, &terms).await?;
            render::print_ack(&ack);
        }
        PackageCommand::Delete { id } => {
            let ack = client.delete_package(id).await?;
            render::print_ack(&ack);
        }
    }
    Ok(())
}
