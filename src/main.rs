use std::{env, error::Error, sync::Arc};

use tokio::{fs, net, task};
use tracing_subscriber::{
    layer::SubscriberExt as _, util::SubscriberInitExt as _, EnvFilter,
};

use support_desk::{db, http, service, Config};

const CONFIG_PATH_VAR: &str = "SUPPORT_DESK_CONFIG";

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path =
        env::var(CONFIG_PATH_VAR).unwrap_or_else(|_| "config.toml".into());
    let config = fs::read_to_string(&config_path).await?;
    let config = toml::from_str::<Config>(&config)?;

    let store: Arc<dyn db::Store> = match &config.db {
        Some(db_config) => {
            let (db_client, db_connection) = db::connect(db_config).await?;

            task::spawn(async move {
                if let Err(e) = db_connection.await {
                    tracing::error!(error = %e, "database connection failed");
                }
            });

            db_client.migrate().await?;
            Arc::new(db_client)
        }
        None => {
            tracing::warn!("no database configured, tickets are kept in memory");
            Arc::new(db::Memory::default())
        }
    };

    let app = http::router(
        http::AppState {
            tickets: service::Tickets::new(store),
            api_key: http::ApiKey::new(config.auth.api_key),
        },
        &config.http.cors,
    )?;

    let listener = net::TcpListener::bind(config.http.server.addr).await?;
    tracing::info!(addr = %config.http.server.addr, "listening");
    axum::serve(listener, app).await?;

    Ok(())
}
