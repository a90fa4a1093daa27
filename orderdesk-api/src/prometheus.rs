use crate::error;
use actix_web::{
    Error, HttpResponse,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    web,
};
use prometheus::{
    Encoder, HistogramOpts, HistogramVec, IntCounterVec, IntGaugeVec, Opts, Registry,
    TextEncoder,
};
use std::{
    future::{Future, Ready, ready},
    pin::Pin,
    sync::Arc,
    time::Instant,
};

type LocalBoxFuture<T> = Pin<Box<dyn Future<Output = T> + 'static>>;

pub struct PrometheusMetrics {
    pub registry: Registry,
    http_requests_total: IntCounterVec,
    http_requests_duration: HistogramVec,
    table_rows: IntGaugeVec,
}

impl PrometheusMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let http_requests_total = IntCounterVec::new(
            Opts::new(
                "orderdesk_http_requests_total",
                "Total number of HTTP requests",
            ),
            &["method", "path", "status"],
        )?;

        let http_requests_duration = HistogramVec::new(
            HistogramOpts::new(
                "orderdesk_http_request_duration_seconds",
                "HTTP request latencies in seconds",
            )
            .buckets(vec![
                0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0,
            ]),
            &["method", "path", "status"],
        )?;

        let table_rows = IntGaugeVec::new(
            Opts::new(
                "orderdesk_table_rows_imported",
                "Rows imported per table at startup (-1 if not loaded)",
            ),
            &["table"],
        )?;

        registry.register(Box::new(http_requests_total.clone()))?;
        registry.register(Box::new(http_requests_duration.clone()))?;
        registry.register(Box::new(table_rows.clone()))?;

        Ok(PrometheusMetrics {
            registry,
            http_requests_total,
            http_requests_duration,
            table_rows,
        })
    }

    /// Record the outcome of startup initialization.
    pub fn record_initialization(&self, report: &orderdesk_store_db::InitReport) {
        for (table, outcome) in report.iter() {
            let rows = match outcome {
                orderdesk_store_db::TableOutcome::Success { rows_imported, .. } => {
                    i64::try_from(*rows_imported).unwrap_or(i64::MAX)
                }
                _ => -1,
            };
            self.table_rows.with_label_values(&[table.name()]).set(rows);
        }
    }

    pub fn render(&self) -> String {
        let encoder = TextEncoder::new();
        let mut buffer = vec![];
        if let Err(e) = encoder.encode(&self.registry.gather(), &mut buffer) {
            log::error!("Failed to encode metrics: {e}");
        }
        String::from_utf8_lossy(&buffer).into_owned()
    }
}

pub struct PrometheusMiddleware {
    metrics: Arc<PrometheusMetrics>,
}

impl PrometheusMiddleware {
    pub fn new(metrics: Arc<PrometheusMetrics>) -> Self {
        PrometheusMiddleware { metrics }
    }
}

impl<S, B> Transform<S, ServiceRequest> for PrometheusMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = PrometheusMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(PrometheusMiddlewareService {
            service,
            metrics: self.metrics.clone(),
        }))
    }
}

pub struct PrometheusMiddlewareService<S> {
    service: S,
    metrics: Arc<PrometheusMetrics>,
}

impl<S, B> Service<ServiceRequest> for PrometheusMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let start = Instant::now();
        let method = req.method().to_string();
        // Label by route pattern so path parameters don't explode cardinality
        let path = req.match_pattern();
        let metrics = self.metrics.clone();

        let fut = self.service.call(req);

        Box::pin(async move {
            let res = fut.await?;

            if let Some(path) = path {
                let duration = start.elapsed().as_secs_f64();
                let status = res.status().as_str().to_owned();

                metrics
                    .http_requests_total
                    .with_label_values(&[&method, &path, &status])
                    .inc();

                metrics
                    .http_requests_duration
                    .with_label_values(&[&method, &path, &status])
                    .observe(duration);
            }

            Ok(res)
        })
    }
}

pub async fn metrics_handler(
    metrics: web::Data<Arc<PrometheusMetrics>>,
) -> actix_web::Result<HttpResponse> {
    let body = metrics.render();
    Ok(HttpResponse::Ok()
        .content_type("text/plain; version=0.0.4")
        .body(body))
}

pub fn initialize_metrics() -> Result<Arc<PrometheusMetrics>, error::AppError> {
    let metrics = PrometheusMetrics::new().map_err(|e| error::ServerError::Startup {
        reason: format!("Failed to create prometheus metrics: {e}"),
    })?;
    Ok(Arc::new(metrics))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_records_initialization_outcomes() {
        let dir = tempfile::tempdir().unwrap();
        let data_dir = dir.path().join("data");
        std::fs::create_dir(&data_dir).unwrap();
        std::fs::write(data_dir.join("orders.json"), r#"[{"order_no":"ORD1"}]"#).unwrap();

        let db = orderdesk_store_db::StoreDb::new(dir.path().join("store.db")).unwrap();
        let report = db.initialize(&data_dir).unwrap();

        let metrics = PrometheusMetrics::new().unwrap();
        metrics.record_initialization(&report);
        let rendered = metrics.render();

        assert!(rendered.contains(r#"orderdesk_table_rows_imported{table="orders"} 1"#));
        assert!(rendered.contains(r#"orderdesk_table_rows_imported{table="refunds"} -1"#));
    }
}
