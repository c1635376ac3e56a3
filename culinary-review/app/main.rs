use anyhow::Context as _;
use structopt::StructOpt;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

use culinary_review::config::Config;
use culinary_review::db::Db;
use culinary_review::{build_service, AppCtx};

#[derive(Debug, Clone, StructOpt)]
struct CommandOpt {
    #[structopt(subcommand)]
    subcommand: SubcommandOpt,
}

#[derive(Debug, Clone, StructOpt)]
enum SubcommandOpt {
    #[structopt(name = "server")]
    Server(ServerCommandOpt),
    #[structopt(name = "migrate", about = "run pending database migrations and exit")]
    Migrate,
}

#[derive(Debug, Clone, StructOpt)]
struct ServerCommandOpt {
    #[structopt(short = "p", long = "port", help = "on which port to listen")]
    port: Option<u16>,
    #[structopt(long = "host", help = "on which address to listen")]
    host: Option<String>,
    #[structopt(long = "skip-migrations", help = "do not run pending migrations on start-up")]
    skip_migrations: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let opt = CommandOpt::from_args();
    let config = Config::from_env()?;
    match opt.subcommand {
        SubcommandOpt::Server(ref server_opt) => server(&config, server_opt).await,
        SubcommandOpt::Migrate => migrate(&config).await,
    }
}

async fn migrate(config: &Config) -> anyhow::Result<()> {
    let db = Db::connect(&config.database_url, 1)?;
    let applied = db.migrate().await?;
    tracing::info!(?applied, "migrations finished");
    Ok(())
}

async fn server(config: &Config, opt: &ServerCommandOpt) -> anyhow::Result<()> {
    let ctx = AppCtx::new(config)?;
    if !opt.skip_migrations {
        let applied = ctx.db.migrate().await?;
        if !applied.is_empty() {
            tracing::info!(?applied, "applied pending migrations");
        }
    }
    let service = build_service(&ctx).max_body_size(config.max_body_bytes);

    let host = opt.host.as_deref().unwrap_or(&config.host);
    let port = opt.port.unwrap_or(config.port);
    let listener = TcpListener::bind((host, port))
        .await
        .with_context(|| format!("binding {}:{}", host, port))?;
    tracing::info!(addr = %listener.local_addr()?, "listening");

    nails::utils::hyper_ext::serve(listener, service, shutdown_signal()).await?;
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("shutdown requested");
}
