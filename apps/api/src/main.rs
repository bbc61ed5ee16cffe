//! # yamdb-admin
//!
//! Operator commands for a YaMDb deployment.
//!
//! ```text
//! yamdb-admin migrate                          apply the embedded schema
//! yamdb-admin create-admin <username> <email>  create or promote an admin
//! ```
//!
//! `create-admin` prints a confirmation code for the account so the first
//! administrator can obtain a token without a mail setup.

use std::sync::Arc;

use anyhow::{bail, Context};
use tracing::info;
use tracing_subscriber::EnvFilter;
use yamdb_core::validation::{validate_email, validate_username};
use yamdb_core::{NewUser, Role, UserPatch};
use yamdb_api::notify::LogNotifier;
use yamdb_api::{ApiConfig, AppState};

const USAGE: &str = "usage: yamdb-admin <migrate | create-admin <username> <email>>";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(true)
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();

    let config = ApiConfig::load().context("Failed to load configuration")?;
    info!(database = %config.database_path, "Configuration loaded");

    match args.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
        ["migrate"] => migrate(config).await,
        ["create-admin", username, email] => create_admin(config, username, email).await,
        ["help"] | ["--help"] | ["-h"] => {
            println!("{USAGE}");
            Ok(())
        }
        _ => bail!(USAGE),
    }
}

async fn migrate(config: ApiConfig) -> anyhow::Result<()> {
    // Connecting applies pending migrations.
    let state = AppState::connect(config, Arc::new(LogNotifier)).await?;

    let (total, applied) = state.db.migration_status().await?;
    info!(total, applied, "Schema up to date");

    state.db.close().await;
    Ok(())
}

async fn create_admin(config: ApiConfig, username: &str, email: &str) -> anyhow::Result<()> {
    validate_username(username)?;
    validate_email(email)?;

    let state = AppState::connect(config, Arc::new(LogNotifier)).await?;
    let users = state.db.users();

    let user = match users.get_by_username(username).await? {
        Some(existing) if existing.email != email => {
            bail!("User '{username}' exists with a different email");
        }
        Some(existing) => {
            info!(user_id = %existing.id, "Promoting existing user to admin");
            users
                .update(existing.id, &UserPatch { role: Some(Role::Admin), ..UserPatch::default() })
                .await?
        }
        None => {
            let created = users
                .insert(&NewUser {
                    username: username.to_string(),
                    email: email.to_string(),
                    role: Role::Admin,
                    ..NewUser::default()
                })
                .await?;
            info!(user_id = %created.id, "Admin created");
            created
        }
    };

    let code = state.codes.make_code(&user);
    println!("{} ({}) is an admin. Confirmation code: {code}", user.username, user.email);

    state.db.close().await;
    Ok(())
}
