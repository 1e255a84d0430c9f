//! Command line interface

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use proctrack::{
    api::{self, AppState},
    config::Config,
    db::{self, DynDatabasePool},
    services::{Services, DEFAULT_UPCOMING_DAYS},
};

#[derive(Parser, Debug)]
#[command(
    name = "proctrack",
    about = "Track administrative processes, their document checklists and legal deadlines",
    version
)]
struct Cli {
    /// Path to the YAML configuration file
    #[arg(long, global = true, default_value = "config.yml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Install the default catalog of types, statuses, documents and rules
    Seed,
    /// Deadline reports
    Deadlines {
        #[command(subcommand)]
        command: DeadlineCommand,
    },
}

#[derive(Subcommand, Debug)]
enum DeadlineCommand {
    /// List open deadlines past their due date
    Overdue {
        /// Flag every listed deadline as notified
        #[arg(long)]
        mark: bool,
    },
    /// List open deadlines due within the next days
    Upcoming {
        /// Size of the window in days (1 to 90)
        #[arg(long, default_value_t = DEFAULT_UPCOMING_DAYS)]
        days: u32,
    },
}

#[derive(Args, Debug, Default)]
struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    port: Option<u16>,
}

pub(crate) async fn run() -> Result<()> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    let mut config = Config::load_with_env(&cli.config)?;
    tracing::info!("Configuration loaded");

    let pool = connect(&config).await?;

    let result = match command {
        Command::Serve(args) => {
            if let Some(host) = args.host {
                config.server.host = host;
            }
            if let Some(port) = args.port {
                config.server.port = port;
            }
            serve(&config, pool.clone()).await
        }
        Command::Seed => seed(pool.clone()).await,
        Command::Deadlines {
            command: DeadlineCommand::Overdue { mark },
        } => report_overdue(pool.clone(), mark).await,
        Command::Deadlines {
            command: DeadlineCommand::Upcoming { days },
        } => report_upcoming(pool.clone(), days).await,
    };

    pool.close().await;
    result
}

async fn connect(config: &Config) -> Result<DynDatabasePool> {
    let pool = db::create_pool(&config.database).await?;
    tracing::info!("Database connected: {:?}", pool.driver());

    db::migrations::run_migrations(&pool).await?;
    tracing::info!("Database migrations completed");

    Ok(pool)
}

async fn serve(config: &Config, pool: DynDatabasePool) -> Result<()> {
    let state = AppState::new(pool);
    if config.catalog.seed_defaults {
        state.catalog_service.seed_defaults().await?;
    }

    let app = api::build_router(state, &config.server.cors_origin);

    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn seed(pool: DynDatabasePool) -> Result<()> {
    let report = Services::new(pool).catalog.seed_defaults().await?;
    println!(
        "Seeded {} process types, {} statuses, {} documents, {} legal deadlines",
        report.process_types, report.statuses, report.documents, report.legal_deadlines
    );
    Ok(())
}

async fn report_overdue(pool: DynDatabasePool, mark: bool) -> Result<()> {
    let service = Services::new(pool).deadline;
    let overdue = service.list_overdue().await?;

    if overdue.is_empty() {
        println!("No overdue deadlines");
        return Ok(());
    }

    println!("{} overdue deadline(s):", overdue.len());
    for deadline in &overdue {
        println!(
            "  [{}] {} | {} | {} | due {} | {} day(s) late{}",
            deadline.id,
            deadline.protocol_number,
            deadline.type_name,
            deadline.deadline_name,
            deadline.due_date,
            deadline.days_overdue,
            if deadline.notified { " | notified" } else { "" }
        );
    }

    if mark {
        let marked = service.notify_overdue().await?;
        println!("Marked {} deadline(s) as notified", marked);
    }
    Ok(())
}

async fn report_upcoming(pool: DynDatabasePool, days: u32) -> Result<()> {
    let upcoming = Services::new(pool).deadline.list_upcoming(days).await?;

    if upcoming.is_empty() {
        println!("No deadlines due in the next {} day(s)", days);
        return Ok(());
    }

    println!("{} deadline(s) due in the next {} day(s):", upcoming.len(), days);
    for deadline in &upcoming {
        println!(
            "  [{}] {} | {} | {} | due {} | {} day(s) left",
            deadline.id,
            deadline.protocol_number,
            deadline.type_name,
            deadline.deadline_name,
            deadline.due_date,
            deadline.days_remaining
        );
    }
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
