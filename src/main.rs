use dynform::config::{config_path, load_config, AppConfig};
use dynform::{app, AppState, Dialect, Directory, FormStore, PgStore, StaticDirectory};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

async fn open_store(config: &AppConfig, dialect: Dialect) -> Result<Arc<dyn FormStore>, Box<dyn std::error::Error>> {
    let db = &config.database;
    let timeout = Duration::from_secs(db.query_timeout_secs);
    tracing::info!(dialect = dialect.profile().name, max_connections = db.max_connections, "opening database pool");
    match dialect {
        Dialect::Postgres => Ok(Arc::new(
            PgStore::connect(&db.connection_string, db.max_connections, timeout).await?,
        )),
        #[cfg(feature = "mssql")]
        Dialect::SqlServer => Ok(Arc::new(
            dynform::store::MssqlStore::connect(&db.connection_string, db.max_connections, timeout).await?,
        )),
        #[cfg(not(feature = "mssql"))]
        Dialect::SqlServer => Err("sqlserver dialect requires building with the `mssql` feature".into()),
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("dynform=info")),
        )
        .init();

    let path = config_path(std::env::args().nth(1));
    let (config, dialect) = load_config(&path)?;
    let store = open_store(&config, dialect).await?;
    tracing::info!(config = %path, dialect = store.dialect().name, "database pool ready");

    let directory: Option<Arc<dyn Directory>> = match &config.directory {
        Some(d) => {
            tracing::info!(people = d.people.len(), "static directory configured");
            Some(Arc::new(StaticDirectory::from_config(d)))
        }
        None => {
            tracing::warn!("no directory configured, directory-populated fields disabled");
            None
        }
    };

    let state = AppState::new(store, directory);
    let listener = TcpListener::bind(&config.server.listen).await?;
    tracing::info!("dynform listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app(state)).await?;
    Ok(())
}
