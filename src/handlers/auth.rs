// src/handlers/auth.rs
use crate::app::App;
use crate::auth::{require_user, session_token, sessions};
use crate::db::users as db_users;
use crate::errors::{ResultResp, ServerError};
use crate::handlers::{now_unix, query_params, read_json_object};
use crate::responses::{json_message, json_response};
use astra::Request;
use serde::Deserialize;
use serde_json::json;

#[derive(Deserialize)]
struct LinkRequest {
    email: String,
    #[serde(default)]
    name: Option<String>,
}

/// Sign-up and sign-in both start here.
pub fn request_link(req: Request, app: &App) -> ResultResp {
    let body = read_json_object(req)?;
    let input: LinkRequest = serde_json::from_value(serde_json::Value::Object(body))
        .map_err(|_| ServerError::BadRequest("email is required".into()))?;

    let now = now_unix();
    let issued = app.db.with_conn(|conn| {
        app.magic_links
            .request_link(conn, &input.email, input.name.as_deref(), now)
    })?;

    log::info!(
        "magic link issued for user {} ({}), expires at {}",
        issued.user_id,
        issued.email,
        issued.expires_at
    );
    // No mail transport. The raw token is a live credential, so it stays out of info logs.
    log::debug!("magic link token for {}: {}", issued.email, issued.token);

    let message = "Check your email for a sign-in link";
    if app.expose_magic_links {
        json_response(
            200,
            &json!({ "message": message, "link": issued.link, "expiresAt": issued.expires_at }),
        )
    } else {
        json_message(200, message)
    }
}

pub fn redeem_link(req: &Request, app: &App) -> ResultResp {
    let params = query_params(req);
    let token = params
        .get("token")
        .ok_or_else(|| ServerError::BadRequest("missing token".into()))?;

    let now = now_unix();
    let (session, user) = app.db.with_conn(|conn| {
        let user_id = app.magic_links.redeem(conn, token, now)?;
        let session = sessions::create_session(conn, user_id, now)?;
        let user = db_users::find_user(conn, user_id)?.ok_or(ServerError::InternalError)?;
        Ok((session, user))
    })?;

    log::info!("user {} signed in", user.id);
    json_response(200, &json!({ "token": session, "user": user }))
}

pub fn me(req: &Request, app: &App) -> ResultResp {
    let user = require_user(req, &app.db, now_unix())?;
    json_response(200, &user)
}

pub fn logout(req: &Request, app: &App) -> ResultResp {
    let Some(token) = session_token(req) else {
        return Err(ServerError::Unauthorized("Authentication required".into()));
    };

    app.db
        .with_conn(|conn| sessions::revoke_session(conn, &token, now_unix()))?;
    json_message(200, "Logged out")
}
