use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sea_orm_migration::MigratorTrait;
use tessera_core::migrations::Migrator;
use tessera_core::store::RefreshTokenStore;
use tessera_core::{Config, SeaOrmRefreshTokenStore, TokenEngine, db, logging};

#[derive(Parser)]
#[command(name = "tessera")]
#[command(about = "Operate the tessera token store")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Database operations
    Db {
        #[command(subcommand)]
        action: DbCommands,
    },
    /// Refresh and access token administration
    Token {
        #[command(subcommand)]
        action: TokenCommands,
    },
}

#[derive(Subcommand)]
enum DbCommands {
    /// Run pending migrations
    Migrate,
    /// Roll back applied migrations
    Rollback {
        /// Number of migrations to roll back
        #[arg(long, default_value_t = 1)]
        steps: u32,
    },
}

#[derive(Subcommand)]
enum TokenCommands {
    /// Print the rotation chain containing a refresh token, root first
    Chain {
        /// Refresh token id
        id: i32,
    },
    /// Revoke a single refresh token
    Revoke {
        /// Refresh token id
        id: i32,
    },
    /// Revoke every token in the rotation chain containing a refresh token
    RevokeChain {
        /// Refresh token id
        id: i32,
    },
    /// Verify an access token and print its claims
    Verify {
        /// Compact JWT
        token: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::from_env().context("failed to load configuration")?;
    logging::init_logging_for(&config);

    match cli.command {
        Commands::Db { action } => {
            let conn = db::connect(&config)
                .await
                .context("failed to connect to database")?;
            match action {
                DbCommands::Migrate => {
                    tracing::info!("Running pending database migrations...");
                    Migrator::up(&conn, None).await?;
                    tracing::info!("Migrations complete.");
                }
                DbCommands::Rollback { steps } => {
                    tracing::info!("Rolling back {} migration(s)...", steps);
                    Migrator::down(&conn, Some(steps)).await?;
                    tracing::info!("Rollback complete.");
                }
            }
        }
        Commands::Token { action } => run_token_command(&config, action).await?,
    }

    Ok(())
}

async fn open_store(config: &Config) -> anyhow::Result<Arc<SeaOrmRefreshTokenStore>> {
    let conn = db::connect(config)
        .await
        .context("failed to connect to database")?;
    Ok(Arc::new(SeaOrmRefreshTokenStore::new(conn)))
}

async fn run_token_command(config: &Config, action: TokenCommands) -> anyhow::Result<()> {
    match action {
        TokenCommands::Chain { id } => {
            let store = open_store(config).await?;
            let chain = store.chain(id).await?;
            if chain.is_empty() {
                anyhow::bail!("refresh token {} not found", id);
            }
            println!("{}", serde_json::to_string_pretty(&chain)?);
        }
        TokenCommands::Revoke { id } => {
            let store = open_store(config).await?;
            store.revoke_by_id(id).await?;
            println!("revoked refresh token {}", id);
        }
        TokenCommands::RevokeChain { id } => {
            let store = open_store(config).await?;
            let engine = TokenEngine::new(config.token.clone(), store)
                .with_store_timeout(config.store_timeout());
            let revoked = engine.mark_reuse_and_revoke_chain(id).await?;
            println!("revoked {} refresh token(s) in the chain of {}", revoked, id);
        }
        TokenCommands::Verify { token } => println!("{}", verify_token(config, &token)?),
    }

    Ok(())
}

/// Verify an access token offline and render its claims as JSON.
fn verify_token(config: &Config, token: &str) -> anyhow::Result<String> {
    let claims = tessera_core::auth::validate_token(&config.token, token)
        .context("access token rejected")?;
    Ok(serde_json::to_string_pretty(&claims)?)
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verify_routes_to_token_command() {
        let cli = Cli::try_parse_from(["tessera", "token", "verify", "abc.def.ghi"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Token {
                action: TokenCommands::Verify { ref token }
            } if token == "abc.def.ghi"
        ));
    }

    #[test]
    fn test_verify_rejects_garbage_without_database() {
        let config = Config::from_source(|key| match key {
            "DATABASE_URL" => Some("postgres://unreachable.invalid/tessera".to_string()),
            _ => None,
        })
        .unwrap();

        let err = verify_token(&config, "not-a-token").unwrap_err();
        assert!(err.to_string().contains("access token rejected"));
    }
}
