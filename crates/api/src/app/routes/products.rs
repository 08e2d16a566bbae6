use std::sync::Arc;

use axum::{
    extract::{Extension, Form, FromRequest, Multipart, Request},
    http::header::CONTENT_TYPE,
    response::Response,
};

use inventario_products::{FormFields, ProductAction};

use crate::app::errors;
use crate::app::services::AppServices;

/// The single CRUD entry point: decode the form, run one action, answer with JSON.
///
/// Both form encodings are accepted. Any other body (wrong content type, malformed
/// encoding) is read as an empty field set, which decodes to an invalid action.
pub async fn handle_action(
    Extension(services): Extension<Arc<AppServices>>,
    request: Request,
) -> Response {
    let fields = read_fields(request).await;

    let action = match ProductAction::from_fields(&fields) {
        Ok(a) => a,
        Err(e) => {
            tracing::info!(error = %e, cause = ?std::error::Error::source(&e), "request rejected");
            return errors::action_error_to_response(e);
        }
    };

    let outcome = services.execute(action).await;
    errors::outcome_to_response(outcome, services.options())
}

async fn read_fields(request: Request) -> FormFields {
    let decoded = if is_multipart(&request) {
        multipart_fields(request).await
    } else {
        Form::<FormFields>::from_request(request, &())
            .await
            .map(|Form(fields)| fields)
            .map_err(|rejection| rejection.to_string())
    };

    decoded.unwrap_or_else(|reason| {
        tracing::debug!(%reason, "request body is not a form; treating as empty");
        FormFields::new()
    })
}

fn is_multipart(request: &Request) -> bool {
    request
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.to_ascii_lowercase().starts_with("multipart/form-data"))
}

/// Text parts of a `multipart/form-data` body; file parts are skipped.
async fn multipart_fields(request: Request) -> Result<FormFields, String> {
    let mut multipart = Multipart::from_request(request, &())
        .await
        .map_err(|rejection| rejection.to_string())?;

    let mut fields = FormFields::new();
    while let Some(field) = multipart.next_field().await.map_err(|e| e.to_string())? {
        if field.file_name().is_some() {
            continue;
        }
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        let value = field.text().await.map_err(|e| e.to_string())?;
        fields.insert(name, value);
    }
    Ok(fields)
}
