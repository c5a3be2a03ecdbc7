use axum::{
    Json,
    extract::State,
    http::{
        StatusCode,
        header::{CONTENT_DISPOSITION, CONTENT_TYPE},
    },
    response::{IntoResponse, Response},
};
use bytes::Bytes;
use serde_json::{Value, json};

use crate::domain::document::CompiledDocument;

use super::{HttpState, error::ApiError};

pub(super) async fn health() -> Json<Value> {
    Json(json!({ "ok": true }))
}

pub(super) async fn compile(State(state): State<HttpState>, body: Bytes) -> Response {
    let mut payload = match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Object(map)) => map,
        Ok(_) => {
            return ApiError::invalid_input("request body is not a JSON object").into_response();
        }
        Err(err) => {
            return ApiError::invalid_input(format!("request body is not a JSON object: {err}"))
                .into_response();
        }
    };

    let markup = match payload.remove("latex") {
        Some(Value::String(markup)) => markup,
        Some(_) => return ApiError::invalid_input("`latex` must be a string").into_response(),
        None => return ApiError::invalid_input("`latex` is required").into_response(),
    };

    match state.compile.compile(&markup).await {
        Ok(document) => pdf_response(document),
        Err(err) => ApiError::from(err).into_response(),
    }
}

fn pdf_response(document: CompiledDocument) -> Response {
    let headers = [
        (CONTENT_TYPE, document.content_type().to_string()),
        (CONTENT_DISPOSITION, document.content_disposition()),
    ];
    (StatusCode::OK, headers, document.bytes).into_response()
}
