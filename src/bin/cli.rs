use anyhow::Context;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use userhub::{
    config::ServiceConfig,
    db,
    repositories::{SqliteConfirmationCodeRepository, SqliteUserRepository},
    services::{ConfirmationService, EventBus, EventLogSink, RenewalOutcome, VerificationOutcome},
};

#[derive(Parser)]
#[command(name = "userhub-cli")]
#[command(about = "CLI tool for managing userhub accounts and confirmation codes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Confirmation code commands
    Codes {
        #[command(subcommand)]
        command: CodeCommands,
    },

    /// User management commands
    User {
        #[command(subcommand)]
        command: UserCommands,
    },
}

#[derive(Subcommand)]
enum CodeCommands {
    /// Verify a confirmation code
    Verify {
        /// Code as sent to the user
        #[arg(short, long)]
        code: String,
    },

    /// Replace a user's expired confirmation code; the renewed event is logged
    Renew {
        /// Id of the user
        #[arg(short, long)]
        user_id: i64,
    },

    /// Delete every expired confirmation code
    Purge,
}

#[derive(Subcommand)]
enum UserCommands {
    /// Show a user and the state of their confirmation code
    Show {
        /// Email address of the user
        #[arg(short, long)]
        email: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "userhub=warn,userhub::services::event_publisher=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = ServiceConfig::from_env();

    // Connect to database
    let pool = db::create_pool()
        .await
        .context("Failed to connect to the database")?;

    // Run migrations
    db::run_migrations(&pool)
        .await
        .context("Failed to run database migrations")?;

    // Events raised here are written to the log before exit
    let event_bus = Arc::new(EventBus::new(config.event_bus_capacity));
    let event_sink = tokio::spawn(EventLogSink::run(event_bus.subscribe()));
    let user_repository = Arc::new(SqliteUserRepository::new(pool.clone()));
    let code_repository = Arc::new(SqliteConfirmationCodeRepository::new(pool.clone()));
    let confirmation_service = ConfirmationService::new(
        user_repository.clone(),
        code_repository.clone(),
        event_bus.clone(),
        config.confirmation.clone(),
    );

    // Parse CLI arguments
    let cli = Cli::parse();

    match cli.command {
        Commands::Codes { command } => match command {
            CodeCommands::Verify { code } => match confirmation_service.check_code(&code).await {
                Ok(VerificationOutcome::Verified) => {
                    println!("✅ Email verified");
                }
                Ok(VerificationOutcome::Expired) => {
                    eprintln!("❌ Code expired and has been removed");
                    std::process::exit(1);
                }
                Ok(VerificationOutcome::Unknown) => {
                    eprintln!("❌ Unknown code");
                    std::process::exit(1);
                }
                Err(err) => {
                    eprintln!("❌ Failed to verify code: {}", err);
                    std::process::exit(1);
                }
            },

            CodeCommands::Renew { user_id } => {
                match confirmation_service.renew_confirmation_code(user_id).await {
                    RenewalOutcome::Renewed(code) => {
                        println!("✅ New code issued");
                        println!("  Code: {}", code.code);
                        println!("  Expires: {}", code.expires_at);
                    }
                    RenewalOutcome::StillValid => {
                        println!("Current code is still valid, nothing to do.");
                    }
                    RenewalOutcome::UserNotFound => {
                        eprintln!("❌ User {} not found", user_id);
                        std::process::exit(1);
                    }
                    RenewalOutcome::Superseded => {
                        println!("Another renewal stored a code first, nothing to do.");
                    }
                    RenewalOutcome::Failed => {
                        eprintln!("❌ Renewal failed, see logs");
                        std::process::exit(1);
                    }
                }
            }

            CodeCommands::Purge => match confirmation_service.purge_expired_codes().await {
                Ok(removed) => println!("✅ Removed {} expired code(s)", removed),
                Err(err) => {
                    eprintln!("❌ Failed to purge codes: {}", err);
                    std::process::exit(1);
                }
            },
        },

        Commands::User { command } => match command {
            UserCommands::Show { email } => {
                use userhub::repositories::{ConfirmationCodeRepository, UserRepository};

                let email = email.trim().to_lowercase();
                match user_repository.find_by_email(&email).await {
                    Ok(Some(user)) => {
                        println!("  ID: {}", user.id);
                        println!("  Email: {}", user.email);
                        println!("  Verified: {}", user.email_verified);
                        println!("  Profile status: {}", user.profile_status);
                        println!(
                            "  Created: {}",
                            user.created_at.as_deref().unwrap_or("N/A")
                        );

                        match code_repository.find_by_user(user.id).await {
                            Ok(Some(code)) => {
                                let state = if code.is_valid_at(chrono::Utc::now()) {
                                    "valid"
                                } else {
                                    "expired"
                                };
                                println!(
                                    "  Code: {} ({}, expires {})",
                                    code.code, state, code.expires_at
                                );
                            }
                            Ok(None) => println!("  Code: none"),
                            Err(err) => {
                                eprintln!("❌ Failed to load code: {}", err);
                                std::process::exit(1);
                            }
                        }
                    }
                    Ok(None) => {
                        eprintln!("❌ User '{}' not found", email);
                        std::process::exit(1);
                    }
                    Err(err) => {
                        eprintln!("❌ Failed to find user: {}", err);
                        std::process::exit(1);
                    }
                }
            }
        },
    }

    // The sink exits once every handle to the bus is gone.
    drop(confirmation_service);
    drop(event_bus);
    event_sink.await.context("Event log sink failed")?;

    Ok(())
}
