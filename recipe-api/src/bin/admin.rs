//! `recipe-admin`: operator commands that run outside the HTTP server.
//!
//! ```bash
//! recipe-admin migrate
//! recipe-admin status
//! recipe-admin create-superuser --email admin@example.com --password s3cret
//! ```
//!
//! Reads the same environment as the server (`DATABASE_URL` et al.).

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use recipe_api::{config::Config, telemetry};
use recipe_shared::{
    auth::password::{hash_password, validate_password_length},
    db::{
        migrations::{ensure_database_exists, get_migration_status, run_migrations},
        pool::{close_pool, create_pool, DatabaseConfig},
    },
    models::user::{CreateUser, User},
};
use tracing::info;

#[derive(Parser)]
#[command(name = "recipe-admin")]
#[command(author, version, about = "Administrative commands for the recipe API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the database if needed and apply pending migrations
    Migrate,

    /// Show how many migrations are applied
    Status,

    /// Create a staff superuser
    CreateSuperuser {
        #[arg(long)]
        email: String,

        #[arg(long)]
        password: String,

        /// Display name
        #[arg(long, default_value = "")]
        name: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env()?;
    telemetry::init_tracing();

    if matches!(cli.command, Commands::Migrate) {
        ensure_database_exists(&config.database.url)
            .await
            .context("creating database")?;
    }

    let pool = create_pool(DatabaseConfig {
        url: config.database.url.clone(),
        max_connections: 2,
        ..DatabaseConfig::default()
    })
    .await
    .context("connecting to database")?;

    let result = run(cli.command, &pool).await;
    close_pool(pool).await;
    result
}

async fn run(command: Commands, pool: &sqlx::PgPool) -> Result<()> {
    match command {
        Commands::Migrate => {
            run_migrations(pool).await?;
            let status = get_migration_status(pool).await?;
            println!(
                "Applied {} migrations (latest: {})",
                status.applied_migrations,
                status
                    .latest_version
                    .map_or_else(|| "none".to_string(), |v| v.to_string())
            );
        }
        Commands::Status => {
            let status = get_migration_status(pool).await?;
            println!("Applied migrations: {}", status.applied_migrations);
            if let Some(version) = status.latest_version {
                println!("Latest version: {}", version);
            }
        }
        Commands::CreateSuperuser {
            email,
            password,
            name,
        } => {
            if !email.contains('@') {
                bail!("'{}' is not a valid email address", email);
            }
            validate_password_length(&password).map_err(anyhow::Error::msg)?;

            if User::find_by_email(pool, &email).await?.is_some() {
                bail!("A user with email '{}' already exists", email);
            }

            let user = User::create(
                pool,
                CreateUser::superuser(email, hash_password(&password)?, name),
            )
            .await?;

            info!(user_id = user.id, "Superuser created");
            println!("Created superuser {} (id {})", user.email, user.id);
        }
    }

    Ok(())
}
