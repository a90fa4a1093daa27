use std::error::Error;

use actix_web::HttpResponse;

use crate::CARGO_VERSION;

pub(crate) async fn get() -> Result<HttpResponse, Box<dyn Error>> {
    Ok(HttpResponse::Ok().json(serde_json::json!({
        "message": "Order Management API",
        "version": CARGO_VERSION,
    })))
}
