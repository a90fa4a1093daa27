use std::error::Error;

use actix_web::{HttpResponse, http};

pub(crate) async fn get() -> Result<HttpResponse, Box<dyn Error>> {
    Ok(HttpResponse::Ok()
        .insert_header((http::header::CONTENT_TYPE, "text/plain"))
        .body("OK\n"))
}
