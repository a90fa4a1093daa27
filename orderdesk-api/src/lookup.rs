//! `/api/*` lookup endpoints.
//!
//! A match is returned as the row's JSON object, no match as `{}`.

use actix_web::error::{InternalError, QueryPayloadError};
use actix_web::{HttpRequest, HttpResponse, web};
use orderdesk_store_db::{Row, StoreDb};
use serde::Deserialize;

use crate::error::LookupError;

type LookupResult = Result<HttpResponse, LookupError>;

#[derive(Debug, Deserialize)]
pub(crate) struct CustomerParams {
    #[serde(default)]
    email: String,
    #[serde(default)]
    customer_id: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct OrderParams {
    #[serde(default)]
    order_no: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct TransactionParams {
    #[serde(default)]
    transaction_id: String,
}

fn empty() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({}))
}

/// Unparseable query strings (e.g. a repeated key) are reported like any
/// other failed lookup.
pub(crate) fn query_error(err: QueryPayloadError, req: &HttpRequest) -> actix_web::Error {
    let message = format!("Could not parse query for {}: {err}", req.path());
    log::warn!("{message}");
    let response = HttpResponse::Ok().json(serde_json::json!({ "error": message }));
    InternalError::from_response(err, response).into()
}

/// Run a lookup on the blocking pool with its own connection.
async fn run<F>(what: &'static str, db: web::Data<StoreDb>, lookup: F) -> LookupResult
where
    F: FnOnce(&StoreDb) -> orderdesk_store_db::Result<Option<Row>> + Send + 'static,
{
    let found = web::block(move || lookup(db.get_ref()))
        .await
        .map_err(|e| LookupError::Canceled {
            what,
            reason: e.to_string(),
        })?
        .map_err(|e| LookupError::new(what, e))?;

    Ok(match found {
        Some(row) => HttpResponse::Ok().json(row),
        None => empty(),
    })
}

pub(crate) async fn customer(
    db: web::Data<StoreDb>,
    params: web::Query<CustomerParams>,
) -> LookupResult {
    let CustomerParams { email, customer_id } = params.into_inner();
    run("customer", db, move |db| {
        db.find_customer(Some(customer_id.as_str()), Some(email.as_str()))
    })
    .await
}

pub(crate) async fn order(db: web::Data<StoreDb>, params: web::Query<OrderParams>) -> LookupResult {
    let order_no = params.into_inner().order_no;
    if order_no.is_empty() {
        return Ok(empty());
    }
    run("order", db, move |db| db.find_order(&order_no)).await
}

pub(crate) async fn transaction(
    db: web::Data<StoreDb>,
    params: web::Query<TransactionParams>,
) -> LookupResult {
    let transaction_id = params.into_inner().transaction_id;
    if transaction_id.is_empty() {
        return Ok(empty());
    }
    run("transaction", db, move |db| {
        db.find_transaction(&transaction_id)
    })
    .await
}

pub(crate) async fn transaction_for_order(
    db: web::Data<StoreDb>,
    order_no: web::Path<String>,
) -> LookupResult {
    let order_no = order_no.into_inner();
    run("transaction for order", db, move |db| {
        db.transaction_for_order(&order_no)
    })
    .await
}

pub(crate) async fn refund_for_order(
    db: web::Data<StoreDb>,
    order_no: web::Path<String>,
) -> LookupResult {
    let order_no = order_no.into_inner();
    run("refund for order", db, move |db| db.refund_for_order(&order_no)).await
}

#[cfg(test)]
mod tests {
    use std::fs;
    use std::sync::Arc;

    use actix_web::http::StatusCode;
    use actix_web::{App, test};
    use orderdesk_store_db::InitReport;
    use serde_json::{Value, json};
    use tempfile::TempDir;

    use crate::auth::{API_KEY_HEADER, ApiKeys};
    use crate::prometheus::PrometheusMetrics;

    use super::*;

    struct Fixture {
        _dir: TempDir,
        db: StoreDb,
        report: InitReport,
    }

    impl Fixture {
        fn new() -> Self {
            let dir = tempfile::tempdir().unwrap();
            let data_dir = dir.path().join("data");
            fs::create_dir(&data_dir).unwrap();
            fs::write(
                data_dir.join("customers.json"),
                json!([
                    {"customer_id": "C1", "name": "Ada", "email": "ada@example.com"},
                    {"customer_id": "C2", "name": "Grace", "email": "grace@example.com"},
                ])
                .to_string(),
            )
            .unwrap();
            fs::write(
                data_dir.join("orders.json"),
                r#"[{"order_no":"ORD1","customer_id":"C1","order_status":"SHIPPED"}]"#,
            )
            .unwrap();
            fs::write(
                data_dir.join("transactions.json"),
                r#"[{"transaction_id":"T1","order_no":"ORD1","amount":19.99}]"#,
            )
            .unwrap();
            // refunds.json intentionally absent

            let db = StoreDb::new(dir.path().join("temp").join("order-management.db")).unwrap();
            let report = db.initialize(&data_dir).unwrap();
            Self {
                _dir: dir,
                db,
                report,
            }
        }
    }

    async fn get(fixture: &Fixture, keys: ApiKeys, uri: &str, key: Option<&str>) -> (StatusCode, Value) {
        let metrics = Arc::new(PrometheusMetrics::new().unwrap());
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(fixture.db.clone()))
                .app_data(web::Data::new(fixture.report.clone()))
                .app_data(web::Data::new(metrics))
                .configure(crate::routes(Arc::new(keys))),
        )
        .await;

        let mut req = test::TestRequest::get().uri(uri);
        if let Some(key) = key {
            req = req.insert_header((API_KEY_HEADER, key));
        }
        let res = test::call_service(&app, req.to_request()).await;
        let status = res.status();
        let body: Value = test::read_body_json(res).await;
        (status, body)
    }

    async fn lookup(uri: &str) -> (StatusCode, Value) {
        get(&Fixture::new(), ApiKeys::default(), uri, None).await
    }

    #[actix_web::test]
    async fn test_order_found() {
        let (status, body) = lookup("/api/order?order_no=ORD1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({"order_no": "ORD1", "customer_id": "C1", "order_status": "SHIPPED"})
        );
    }

    #[actix_web::test]
    async fn test_order_absent_is_empty_object() {
        let (status, body) = lookup("/api/order?order_no=ORD-DOES-NOT-EXIST").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({}));

        let (status, body) = lookup("/api/order").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({}));
    }

    #[actix_web::test]
    async fn test_order_injection_payload() {
        let fixture = Fixture::new();
        let (status, body) = get(
            &fixture,
            ApiKeys::default(),
            "/api/order?order_no=x%27%29%3B%20DROP%20TABLE%20orders%3B--",
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({}));
        assert!(fixture.db.find_order("ORD1").unwrap().is_some());
    }

    #[actix_web::test]
    async fn test_customer_lookups() {
        let (_, body) = lookup("/api/customer?email=grace@example.com").await;
        assert_eq!(body["name"], "Grace");

        let (_, body) = lookup("/api/customer?customer_id=C1&email=grace@example.com").await;
        assert_eq!(body["name"], "Ada");

        let (_, body) = lookup("/api/customer?customer_id=C9").await;
        assert_eq!(body, json!({}));
    }

    #[actix_web::test]
    async fn test_customer_without_keys_is_bad_request() {
        let (status, body) = lookup("/api/customer").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({"error": "Either customer_id or email must be provided"})
        );

        let (status, _) = lookup("/api/customer?email=&customer_id=").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_repeated_query_key_is_error_payload() {
        let (status, body) = lookup("/api/order?order_no=A&order_no=B").await;
        assert_eq!(status, StatusCode::OK);
        let message = body["error"].as_str().unwrap();
        assert!(message.contains("duplicate field"), "{message}");
    }

    #[actix_web::test]
    async fn test_transaction_lookups() {
        let (_, by_id) = lookup("/api/transaction?transaction_id=T1").await;
        assert_eq!(by_id["amount"], 19.99);

        let (_, by_order) = lookup("/api/transaction/order/ORD1").await;
        assert_eq!(by_id, by_order);

        let (_, body) = lookup("/api/transaction?transaction_id=").await;
        assert_eq!(body, json!({}));
    }

    #[actix_web::test]
    async fn test_refund_for_unloaded_table_is_empty() {
        let (status, body) = lookup("/api/refund/order/ORD1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({}));
    }

    #[actix_web::test]
    async fn test_storage_failure_is_error_payload() {
        let fixture = Fixture::new();
        // A table without the key column makes the lookup itself fail.
        let dir = tempfile::tempdir().unwrap();
        let snapshot = dir.path().join("orders.json");
        fs::write(&snapshot, r#"[{"id": "ORD1"}]"#).unwrap();
        fixture.db.import("orders", &snapshot).unwrap();

        let (status, body) = get(&fixture, ApiKeys::default(), "/api/order?order_no=ORD1", None).await;
        assert_eq!(status, StatusCode::OK);
        let message = body["error"].as_str().unwrap();
        assert!(message.starts_with("Could not find order: "), "{message}");
    }

    #[actix_web::test]
    async fn test_api_key_required_when_configured() {
        let fixture = Fixture::new();
        let keys = || ApiKeys::new(["secret".to_string()]);

        let (status, body) = get(&fixture, keys(), "/api/order?order_no=ORD1", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body, json!({"error": "Invalid or missing API key"}));

        let (status, _) = get(&fixture, keys(), "/api/order?order_no=ORD1", Some("wrong")).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        // Rejected before the handler runs, so even a bad request is 401.
        let (status, _) = get(&fixture, keys(), "/api/customer", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, body) =
            get(&fixture, keys(), "/api/order?order_no=ORD1", Some("secret")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["order_no"], "ORD1");
    }

    #[actix_web::test]
    async fn test_status_reports_initialization() {
        let (status, body) = lookup("/api/status").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["initialization"]["orders"]["status"], "SUCCESS");
        assert_eq!(body["initialization"]["refunds"]["status"], "SKIPPED");
        assert_eq!(body["row_counts"]["customers"], 2);
        assert_eq!(body["row_counts"]["refunds"], Value::Null);
    }

    #[actix_web::test]
    async fn test_root_is_not_gated() {
        let fixture = Fixture::new();
        let (status, body) = get(&fixture, ApiKeys::new(["secret".to_string()]), "/", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Order Management API");
    }
}
