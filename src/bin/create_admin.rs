//! create-admin: bootstrap an admin account in MongoDB
//!
//! Does nothing when the username already exists. Without `--password` (or
//! `ADMIN_PASSWORD`) a random password is generated and printed once.

use anyhow::{Context, Result, bail};
use chrono::Duration;
use clap::Parser;
use rand::Rng;
use rand::distributions::Alphanumeric;
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;
use yooreed::config::AppConfig;
use yooreed::core::auth::{JwtTokenService, Role};
use yooreed::entities::admin::{AdminService, NewAdmin};
use yooreed::server::open_repositories;

#[derive(Debug, Parser)]
#[command(name = "create-admin", version, about = "Create a Yooreed Event admin account")]
struct Cli {
    /// YAML configuration file
    #[arg(long, env = "YOOREED_CONFIG")]
    config: Option<PathBuf>,

    #[arg(long, default_value = "admin")]
    username: String,

    #[arg(long, default_value = "admin@yooreed-event.com")]
    email: String,

    /// Initial password; generated when omitted
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    #[arg(long, default_value = "super_admin", value_parser = ["admin", "super_admin"])]
    role: String,
}

fn generated_password() -> String {
    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(20)
        .map(char::from)
        .collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("yooreed=info")),
        )
        .init();

    let cli = Cli::parse();
    let config = AppConfig::load(cli.config.as_deref())?;
    if config.database.uri.is_none() {
        bail!("MONGODB_URI must be set: accounts created in memory would be lost");
    }

    let repositories = open_repositories(&config).await?;
    let tokens = JwtTokenService::new(
        &config.jwt_secret()?,
        Duration::seconds(config.auth.token_ttl_secs),
    );
    let service = AdminService::new(repositories.admins.clone(), Arc::new(tokens));

    let role = match cli.role.as_str() {
        "admin" => Role::Admin,
        _ => Role::SuperAdmin,
    };
    let (password, generated) = match cli.password {
        Some(password) => (password, false),
        None => (generated_password(), true),
    };

    let created = service
        .create_admin(NewAdmin {
            username: cli.username.clone(),
            email: cli.email.clone(),
            password: password.clone(),
            role,
        })
        .await
        .context("cannot create the admin account")?;

    match created {
        None => println!("Admin '{}' already exists, nothing to do", cli.username),
        Some(admin) => {
            println!("Admin created");
            println!("  username: {}", admin.username);
            println!("  email:    {}", admin.email);
            println!("  role:     {}", admin.role);
            if generated {
                println!("  password: {}", password);
                println!("Change this password after the first login.");
            }
        }
    }
    Ok(())
}
