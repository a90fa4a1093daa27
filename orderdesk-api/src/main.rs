#![warn(clippy::dbg_macro)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use actix_web::{App, HttpServer, web};
use auth::{ApiKeyAuth, ApiKeys};
use error::{IoErrorContext, Result};
use orderdesk_store_db::StoreDb;
use url::Url;

mod auth;
mod config;
mod error;
mod health;
mod lookup;
mod prometheus;
mod root;
mod status;

const CARGO_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Route table shared by the server and the handler tests.
fn routes(keys: Arc<ApiKeys>) -> impl FnOnce(&mut web::ServiceConfig) {
    move |cfg| {
        cfg.route("/", web::get().to(root::get))
            .route("/health", web::get().to(health::get))
            .route("/metrics", web::get().to(prometheus::metrics_handler))
            .service(
                web::scope("/api")
                    .wrap(ApiKeyAuth::new(keys))
                    .app_data(web::QueryConfig::default().error_handler(lookup::query_error))
                    .route("/customer", web::get().to(lookup::customer))
                    .route("/order", web::get().to(lookup::order))
                    .route("/transaction", web::get().to(lookup::transaction))
                    .route(
                        "/transaction/order/{order_no}",
                        web::get().to(lookup::transaction_for_order),
                    )
                    .route(
                        "/refund/order/{order_no}",
                        web::get().to(lookup::refund_for_order),
                    )
                    .route("/status", web::get().to(status::get)),
            );
    }
}

async fn inner_main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = config::load()?;
    let metrics = prometheus::initialize_metrics()?;

    let db = StoreDb::new(&config.database_path)?;
    let report = db.initialize(&config.data_dir).map_err(|e| {
        error::ServerError::Startup {
            reason: format!("Failed to load snapshots: {e}"),
        }
    })?;
    metrics.record_initialization(&report);
    if !report.is_complete() {
        log::warn!("Some tables were not loaded; their lookups will return empty results");
    }

    let db = web::Data::new(db);
    let report = web::Data::new(report);
    let metrics_data = web::Data::new(metrics.clone());
    let keys = Arc::new(config.api_keys());
    if !keys.is_enabled() {
        log::warn!("No API keys configured; /api endpoints are open");
    }

    log::info!("listening on {}", config.bind);
    let mut server = HttpServer::new(move || {
        App::new()
            .wrap(prometheus::PrometheusMiddleware::new(metrics.clone()))
            .app_data(db.clone())
            .app_data(report.clone())
            .app_data(metrics_data.clone())
            .configure(routes(keys.clone()))
    })
    .client_request_timeout(Duration::from_secs(30))
    .workers(config.workers)
    .max_connection_rate(config.max_connection_rate);

    let (bind, uds) = match Url::parse(&config.bind) {
        Ok(url) if url.scheme() == "unix" => {
            if url.host().is_some() {
                return Err(error::ServerError::Startup {
                    reason: "Can only bind to file URLs without host portion.".to_string(),
                }
                .into());
            }
            (url.path().to_string(), true)
        }
        _ => (config.bind.clone(), false),
    };

    if uds {
        let socket_path = Path::new(&bind);
        server = server
            .bind_uds(socket_path)
            .io_context("Failed to bind to Unix domain socket")?;
        fs::set_permissions(socket_path, fs::Permissions::from_mode(0o777))
            .io_context("Failed to set socket permissions")?;
    } else {
        server = server.bind(bind).io_context("Failed to bind server")?;
    }

    server.run().await.io_context("Failed to start server")
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    inner_main().await.map_err(std::io::Error::other)
}
