//! Mapping of action outcomes and errors to HTTP responses.
//!
//! Every response is HTTP 200 with a JSON body; success or failure is carried by the
//! envelope `status` field. Database detail is logged by the services layer and only
//! reaches callers when `expose_db_errors` is set.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;

use inventario_infra::StoreError;
use inventario_products::{ActionError, ActionKind};

use crate::app::dto::{self, Status};
use crate::app::services::{ActionOutcome, ResponseOptions};

pub const MSG_CREATED: &str = "product created successfully";
pub const MSG_UPDATED: &str = "product updated successfully";
pub const MSG_DELETED: &str = "product deleted successfully";
pub const MSG_LISTED: &str = "products listed successfully";
pub const MSG_DUPLICATE_BARCODE: &str = "barcode already exists; it must be unique";
pub const MSG_NOT_UPDATED: &str = "no product updated; the id may be incorrect or the values unchanged";
pub const MSG_NOT_DELETED: &str = "no product deleted; id not found";

pub fn action_error_to_response(err: ActionError) -> Response {
    json_envelope(Status::Error, err.to_string())
}

pub fn outcome_to_response(outcome: ActionOutcome, options: ResponseOptions) -> Response {
    match outcome {
        ActionOutcome::Created(_) => json_envelope(Status::Ok, MSG_CREATED),
        ActionOutcome::Listed(products) => {
            let listing = dto::products_to_json(products);
            if options.read_envelope {
                json_response(dto::envelope(Status::Ok, MSG_LISTED, listing))
            } else {
                json_response(listing)
            }
        }
        ActionOutcome::Updated => json_envelope(Status::Ok, MSG_UPDATED),
        ActionOutcome::Deleted => json_envelope(Status::Ok, MSG_DELETED),
        ActionOutcome::NoRowsAffected(kind) => json_envelope(Status::Error, no_rows_message(kind)),
        ActionOutcome::Failed { kind, error } => {
            json_envelope(Status::Error, store_error_message(kind, &error, options.expose_db_errors))
        }
    }
}

pub fn store_error_message(kind: ActionKind, error: &StoreError, expose: bool) -> String {
    if kind == ActionKind::Create && error.is_unique_violation() {
        return MSG_DUPLICATE_BARCODE.to_string();
    }

    let base = match kind {
        ActionKind::Create => "failed to create product",
        ActionKind::Read => "failed to list products",
        ActionKind::Update => "failed to update product",
        ActionKind::Delete => "failed to delete product",
    };

    if expose {
        format!("{base}: {error}")
    } else {
        base.to_string()
    }
}

fn no_rows_message(kind: ActionKind) -> &'static str {
    match kind {
        ActionKind::Delete => MSG_NOT_DELETED,
        _ => MSG_NOT_UPDATED,
    }
}

pub fn json_envelope(status: Status, message: impl Into<String>) -> Response {
    json_response(dto::envelope(status, message, Value::Null))
}

fn json_response(body: Value) -> Response {
    (StatusCode::OK, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_barcode_has_its_own_message() {
        let err = StoreError::UniqueViolation {
            operation: "insert",
            message: "duplicate key value".into(),
        };
        assert_eq!(store_error_message(ActionKind::Create, &err, true), MSG_DUPLICATE_BARCODE);
    }

    #[test]
    fn database_detail_is_hidden_unless_exposed() {
        let err = StoreError::database("update", "relation \"productos\" does not exist");

        let hidden = store_error_message(ActionKind::Update, &err, false);
        assert_eq!(hidden, "failed to update product");

        let exposed = store_error_message(ActionKind::Update, &err, true);
        assert!(exposed.starts_with("failed to update product: "));
        assert!(exposed.contains("does not exist"));
    }

    #[test]
    fn zero_rows_messages_differ_by_action() {
        assert_eq!(no_rows_message(ActionKind::Update), MSG_NOT_UPDATED);
        assert_eq!(no_rows_message(ActionKind::Delete), MSG_NOT_DELETED);
    }
}
