mod config;
mod directory;
mod graphql;
mod http;
mod sessions;

use std::{fs, path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use migration::{Migrator, MigratorTrait};
use platform_db::{DatabaseSettings, DbPool, connect};
use platform_obs::{ObsConfig, init_tracing};
use products_hr::{EmployeeRecord, OrgChartSummary, build};
use serde_json::json;
use tracing::info;

use crate::{
    config::AppConfig,
    graphql::GraphqlData,
    http::{AppState, ServeConfig},
    sessions::EditSessions,
};

#[derive(Parser, Debug)]
#[command(name = "orgchart-server", version, about = "HR org chart service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP + GraphQL server.
    Serve(ServeCommand),
    /// Run database migrations.
    #[command(subcommand)]
    Migrate(MigrateCommand),
    /// Insert a demo organization into an empty directory.
    Seed,
    /// Print the org chart and its summary as JSON.
    Chart {
        #[arg(long, value_name = "FILE", help = "Read employee records from a JSON file instead of the database")]
        input: Option<PathBuf>,
    },
    /// Print the GraphQL schema snapshot.
    #[command(name = "schema:print")]
    SchemaPrint {
        #[arg(long, value_name = "FILE", help = "Destination file path")]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand, Debug)]
enum MigrateCommand {
    /// Apply pending migrations.
    Up,
    /// Rollback the most recent migration.
    Down,
}

#[derive(Args, Debug)]
struct ServeCommand {
    #[arg(long, default_value = "0.0.0.0")]
    host: std::net::IpAddr,
    #[arg(long, default_value_t = 8080)]
    port: u16,
    #[arg(long, help = "Allow starting even when migrations are pending")]
    allow_dirty: bool,
}

impl From<&ServeCommand> for ServeConfig {
    fn from(value: &ServeCommand) -> Self {
        ServeConfig::new(value.host, value.port)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing(ObsConfig::from_env())?;
    let cli = Cli::parse();
    match cli.command {
        Command::Serve(cmd) => run_server(cmd, Arc::new(AppConfig::load()?)).await,
        Command::Migrate(action) => match action {
            MigrateCommand::Up => migrate_up().await,
            MigrateCommand::Down => migrate_down().await,
        },
        Command::Seed => run_seed().await,
        Command::Chart { input } => print_chart(input).await,
        Command::SchemaPrint { output } => schema_print(output),
    }
}

async fn run_seed() -> Result<()> {
    let pool = setup_pool().await?;
    let inserted = directory::seed(&pool).await?;
    info!(inserted, "seed finished");
    Ok(())
}

async fn print_chart(input: Option<PathBuf>) -> Result<()> {
    let tree = match input {
        Some(path) => {
            let raw = fs::read_to_string(&path)
                .with_context(|| format!("failed to read {}", path.display()))?;
            let records: Vec<EmployeeRecord> = serde_json::from_str(&raw)
                .with_context(|| format!("{} is not a list of employee records", path.display()))?;
            build(&records)
        }
        None => {
            let pool = setup_pool().await?;
            directory::load_chart(&pool).await?
        }
    };
    let summary = OrgChartSummary::of(&tree);
    let output = json!({ "summary": summary, "tree": tree });
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn schema_print(path: Option<PathBuf>) -> Result<()> {
    let sdl = graphql::schema_sdl();
    match path {
        Some(target) => {
            fs::write(&target, sdl)
                .with_context(|| format!("failed to write {}", target.display()))?;
            info!(path = %target.display(), "schema written");
        }
        None => print!("{sdl}"),
    }
    Ok(())
}

async fn setup_pool() -> Result<DbPool> {
    let settings = DatabaseSettings::from_env();
    connect(&settings).await.map_err(Into::into)
}

async fn run_server(cmd: ServeCommand, config: Arc<AppConfig>) -> Result<()> {
    let pool = Arc::new(setup_pool().await?);
    ensure_migrations(&pool, cmd.allow_dirty).await?;
    let schema = graphql::build_schema(GraphqlData {
        pool: pool.clone(),
        sessions: EditSessions::new(config.edit_session_limit, config.edit_session_ttl),
    });
    let state = AppState {
        pool,
        schema,
        config,
    };
    http::serve((&cmd).into(), state).await
}

async fn ensure_migrations(pool: &DbPool, allow_dirty: bool) -> Result<()> {
    let pending = Migrator::get_pending_migrations(pool).await?;
    if !pending.is_empty() && !allow_dirty {
        anyhow::bail!(
            "pending migrations detected; run `orgchart-server migrate up` or pass --allow-dirty"
        );
    }
    Ok(())
}

async fn migrate_up() -> Result<()> {
    let pool = setup_pool().await?;
    Migrator::up(&pool, None).await?;
    info!("database migrations applied");
    Ok(())
}

async fn migrate_down() -> Result<()> {
    let pool = setup_pool().await?;
    Migrator::down(&pool, Some(1)).await?;
    info!("most recent migration rolled back");
    Ok(())
}
