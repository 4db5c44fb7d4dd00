mod analyze;
mod site;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use crate::analyze::{run_analyze, run_history, run_show, AnalyzeArgs};
use crate::site::{run_site_add, SiteCommands};

#[derive(Debug, Parser)]
#[command(name = "brandlens")]
#[command(about = "Brand visibility analysis for registered sites")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Database maintenance
    Db {
        #[command(subcommand)]
        command: DbCommands,
    },
    /// Manage registered sites
    Site {
        #[command(subcommand)]
        command: SiteCommands,
    },
    /// Run a visibility analysis for a registered site and store the result
    Analyze(AnalyzeArgs),
    /// List stored analyses for a site, newest first
    History {
        /// Owner of the site
        #[arg(long)]
        owner: i64,

        /// Site id as printed by `site add`
        #[arg(long)]
        site_id: i64,
    },
    /// Print one stored analysis
    Show {
        /// Owner of the analysis
        #[arg(long)]
        owner: i64,

        /// Analysis id as printed by `history`
        #[arg(long)]
        id: i64,
    },
}

#[derive(Debug, Subcommand)]
enum DbCommands {
    /// Check database connectivity
    Ping,
    /// Apply pending migrations
    Migrate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = brandlens_core::load_app_config()?;
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_level.clone()))?;
    tracing_subscriber::fmt().with_env_filter(env_filter).init();
    tracing::debug!(env = %config.env, model = %config.analysis.model, "configuration loaded");

    let Some(command) = cli.command else {
        println!("no command given; run `brandlens --help` for usage");
        return Ok(());
    };

    let pool_config = brandlens_db::PoolConfig::from_app_config(&config);
    let pool = brandlens_db::connect_pool(&config.database_url, pool_config).await?;

    match command {
        Commands::Db { command } => run_db(&pool, &command).await,
        Commands::Site {
            command:
                SiteCommands::Add {
                    owner,
                    name,
                    url,
                    description,
                    language,
                },
        } => run_site_add(&pool, owner, &name, &url, &description, &language).await,
        Commands::Analyze(args) => run_analyze(&pool, &config, &args).await,
        Commands::History { owner, site_id } => run_history(&pool, owner, site_id).await,
        Commands::Show { owner, id } => run_show(&pool, owner, id).await,
    }
}

async fn run_db(pool: &sqlx::PgPool, command: &DbCommands) -> anyhow::Result<()> {
    match command {
        DbCommands::Ping => {
            brandlens_db::health_check(pool).await?;
            println!("database ok");
        }
        DbCommands::Migrate => {
            let applied = brandlens_db::run_migrations(pool).await?;
            println!("applied {applied} migration(s)");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests;
