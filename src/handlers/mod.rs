pub mod auth;
pub mod properties;
pub mod users;

use crate::errors::ServerError;
use astra::Request;
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::io::Read;
use std::time::{SystemTime, UNIX_EPOCH};

/// Data-URI images make bodies large; anything past this is refused.
const MAX_BODY_BYTES: u64 = 32 * 1024 * 1024;

pub(crate) fn now_unix() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64
}

/// Path identifiers are integers; anything else cannot name a record.
pub(crate) fn parse_id(raw: &str, not_found: &str) -> Result<i64, ServerError> {
    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ServerError::NotFound(not_found.to_string()))
}

/// Percent-decoded query parameters. The first occurrence of a key wins.
pub(crate) fn query_params(req: &Request) -> HashMap<String, String> {
    let mut map = HashMap::new();

    if let Some(q) = req.uri().query() {
        for (k, v) in url::form_urlencoded::parse(q.as_bytes()) {
            map.entry(k.into_owned()).or_insert_with(|| v.into_owned());
        }
    }

    map
}

pub(crate) fn read_body(req: Request) -> Result<Vec<u8>, ServerError> {
    let mut buf = Vec::new();
    req.into_body()
        .reader()
        .take(MAX_BODY_BYTES + 1)
        .read_to_end(&mut buf)
        .map_err(|e| ServerError::BadRequest(format!("could not read body: {e}")))?;

    if buf.len() as u64 > MAX_BODY_BYTES {
        return Err(ServerError::BadRequest("request body too large".into()));
    }
    Ok(buf)
}

pub(crate) fn read_json_object(req: Request) -> Result<Map<String, Value>, ServerError> {
    let buf = read_body(req)?;
    match serde_json::from_slice::<Value>(&buf) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => Err(ServerError::BadRequest("body must be a JSON object".into())),
        Err(e) => Err(ServerError::BadRequest(format!("malformed JSON: {e}"))),
    }
}

/// Validation details go to the log; the client sees `message`.
pub(crate) fn generic_bad_request(err: ServerError, message: &str) -> ServerError {
    match err {
        ServerError::BadRequest(detail) => {
            log::warn!("{message}: {detail}");
            ServerError::BadRequest(message.to_string())
        }
        other => other,
    }
}
