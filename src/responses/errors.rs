use crate::errors::ServerError;
use astra::{Body, Response, ResponseBuilder};
use serde_json::json;

/// Convert a ServerError into a JSON error response.
pub fn error_to_response(err: &ServerError) -> Response {
    let status = err.status();
    if status >= 500 {
        log::error!("{err}");
    } else {
        log::debug!("{err}");
    }

    let body = json!({ "message": err.public_message() }).to_string();

    ResponseBuilder::new()
        .status(status)
        .header("Content-Type", mime::APPLICATION_JSON.as_ref())
        .body(Body::from(body))
        .unwrap_or_else(|_| Response::new(Body::from("Internal Server Error")))
}
