pub mod magic;
pub mod sessions;
pub mod token;

use crate::db::Database;
use crate::domain::User;
use crate::errors::ServerError;
use astra::Request;

/// Raw session token from `Authorization: Bearer …`, falling back to a `session` cookie.
pub fn session_token(req: &Request) -> Option<String> {
    let headers = req.headers();

    let bearer = headers
        .get("Authorization")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());
    if let Some(token) = bearer {
        return Some(token.to_string());
    }

    headers
        .get_all("Cookie")
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().strip_prefix("session="))
        .find(|t| !t.is_empty())
        .map(str::to_string)
}

/// The signed-in user, or 401.
pub fn require_user(req: &Request, db: &Database, now: i64) -> Result<User, ServerError> {
    let token = session_token(req)
        .ok_or_else(|| ServerError::Unauthorized("Authentication required".into()))?;

    db.with_conn(|conn| sessions::load_user_from_session(conn, &token, now))?
        .ok_or_else(|| ServerError::Unauthorized("Authentication required".into()))
}
