use std::process::ExitCode;
use std::str::FromStr;

use tokio::net::TcpListener;
use tracing::{error, info, Level};

use eyeshield::config::{init_config, EyeshieldConfig};
use eyeshield::errors::{LicenseError, LicenseResult};
use eyeshield::registry::Registry;
use eyeshield::server::{build_router, AppState};
use eyeshield::store::JsonFileStore;

fn init_logging(config: &EyeshieldConfig) {
    if !config.logging.enabled {
        return;
    }

    let level = Level::from_str(&config.logging.level).unwrap_or(Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();
}

async fn run(config: &EyeshieldConfig) -> LicenseResult<()> {
    let store = JsonFileStore::new(&config.storage.path);
    let registry = Registry::load(store, config.license.key_prefix.clone());
    let app = build_router(AppState::new(registry));

    let addr = config.server.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| LicenseError::ServerError(format!("failed to bind {addr}: {e}")))?;
    info!("Server is running on http://{}", addr);

    axum::serve(listener, app.into_make_service())
        .await
        .map_err(|e| LicenseError::ServerError(format!("server failed: {e}")))
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match init_config() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_logging(config);

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
