use std::{path::Path, time::Duration};

use actix_web::{dev::Server, http::KeepAlive, middleware::Logger, web, App, HttpServer, Scope};
use log::*;
use order_bridge_engine::{AutomationDriver, BridgeDatabase, OrdersApi, SessionFileDriver, SessionManager, SqliteDatabase};

use crate::{
    config::ServerConfig,
    errors::ServerError,
    routes::{health, ConnectRoute, DisconnectRoute, IngestRoute, OrderByIdRoute, OrdersRoute, StatusRoute},
};

pub type BridgeManager = SessionManager<SqliteDatabase, SessionFileDriver>;

pub async fn run_server(config: ServerConfig) -> Result<(), ServerError> {
    ensure_database_dir(&config.database_url);
    let db = SqliteDatabase::new_with_url(&config.database_url, config.max_db_connections)
        .await
        .map_err(|e| ServerError::InitializeError(e.to_string()))?;
    db.run_migrations().await.map_err(|e| ServerError::InitializeError(e.to_string()))?;
    let driver = config.driver.build_driver();
    let manager = web::Data::new(SessionManager::new(db.clone(), driver));
    if manager.has_existing_session() {
        info!("💻️ A browser session from an earlier login is available at {}", config.driver.session_file);
    }
    let srv = create_server_instance(&config, db, manager.clone())?;
    let result = srv.await.map_err(|e| ServerError::Unspecified(e.to_string()));
    manager.shutdown();
    result
}

/// Builds the HTTP server. The session manager is shared by every worker, since the listening flag and the order
/// listener must be process-wide.
pub fn create_server_instance(
    config: &ServerConfig,
    db: SqliteDatabase,
    manager: web::Data<BridgeManager>,
) -> Result<Server, ServerError> {
    let srv = HttpServer::new(move || {
        App::new()
            .wrap(Logger::new("%t (%D ms) %s %a %{Host}i %U").log_target("obs::access_log"))
            .configure(|cfg| configure_app(cfg, db.clone(), manager.clone()))
    })
    .keep_alive(KeepAlive::Timeout(Duration::from_secs(600)))
    .bind((config.host.as_str(), config.port))?
    .run();
    Ok(srv)
}

/// Registers the shared state and every route.
pub fn configure_app<B, D>(cfg: &mut web::ServiceConfig, db: B, manager: web::Data<SessionManager<B, D>>)
where
    B: BridgeDatabase + 'static,
    D: AutomationDriver + 'static,
{
    cfg.app_data(manager).app_data(web::Data::new(OrdersApi::new(db))).service(health).service(api_scope::<B, D>());
}

pub fn api_scope<B, D>() -> Scope
where
    B: BridgeDatabase + 'static,
    D: AutomationDriver + 'static,
{
    web::scope("/api")
        .service(StatusRoute::<B, D>::new())
        .service(OrdersRoute::<B>::new())
        .service(OrderByIdRoute::<B>::new())
        .service(ConnectRoute::<B, D>::new())
        .service(DisconnectRoute::<B, D>::new())
        .service(IngestRoute::<B, D>::new())
}

/// SQLite creates the database file on demand, but not its parent directory.
fn ensure_database_dir(url: &str) {
    let Some(path) = url.strip_prefix("sqlite://").or_else(|| url.strip_prefix("sqlite:")) else {
        return;
    };
    let path = path.split('?').next().unwrap_or(path);
    if path.is_empty() || path == ":memory:" {
        return;
    }
    if let Some(parent) = Path::new(path).parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = std::fs::create_dir_all(parent) {
            warn!("💻️ Could not create the database directory {}. {e}", parent.display());
        }
    }
}
