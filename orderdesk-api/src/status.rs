//! `/api/status`: what startup loaded, and what the store holds now.

use std::collections::BTreeMap;

use actix_web::{HttpResponse, web};
use orderdesk_store_db::{InitReport, StoreDb, Table};
use serde::Serialize;

#[derive(Serialize)]
struct Status<'a> {
    initialization: &'a InitReport,
    /// `None` for tables that are not present in the store.
    row_counts: BTreeMap<Table, Option<u64>>,
}

fn row_counts(db: &StoreDb) -> orderdesk_store_db::Result<BTreeMap<Table, Option<u64>>> {
    Table::ALL
        .iter()
        .map(|table| Ok((*table, db.row_count(table.name())?)))
        .collect()
}

pub(crate) async fn get(db: web::Data<StoreDb>, report: web::Data<InitReport>) -> HttpResponse {
    let counts = match web::block(move || row_counts(db.get_ref())).await {
        Ok(Ok(counts)) => counts,
        Ok(Err(e)) => {
            log::error!("Failed to count rows: {e}");
            return HttpResponse::InternalServerError()
                .json(serde_json::json!({ "error": e.to_string() }));
        }
        Err(e) => {
            log::error!("Status check canceled: {e}");
            return HttpResponse::InternalServerError()
                .json(serde_json::json!({ "error": e.to_string() }));
        }
    };

    HttpResponse::Ok().json(Status {
        initialization: report.get_ref(),
        row_counts: counts,
    })
}
