use crate::app::App;
use crate::errors::{ResultResp, ServerError};
use crate::handlers::{auth, properties, users};
use crate::responses::{error_to_response, json_message};
use astra::{Request, Response};
use std::time::Instant;

/// Route a request and turn any error into its JSON response.
pub fn respond(req: Request, app: &App) -> Response {
    let started = Instant::now();
    let method = req.method().clone();
    let path = req.uri().path().to_string();

    let resp = match handle(req, app) {
        Ok(resp) => resp,
        Err(err) => error_to_response(&err),
    };

    log::info!(
        "{method} {path} {} {}ms",
        resp.status().as_u16(),
        started.elapsed().as_millis()
    );
    resp
}

pub fn handle(req: Request, app: &App) -> ResultResp {
    let method = req.method().as_str().to_string();
    let path = req.uri().path().to_string();

    let mut segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
    // the frontend talks to "/api/..."
    if segments.first() == Some(&"api") {
        segments.remove(0);
    }

    match (method.as_str(), segments.as_slice()) {
        ("GET", ["health"]) => json_message(200, "ok"),

        ("GET", ["properties"]) => properties::list(&req, app),
        ("POST", ["properties"]) => properties::create(req, app),
        ("GET", ["properties", "user", user_id]) => properties::by_owner(app, user_id),
        ("GET", ["properties", id]) => properties::show(app, id),
        ("PUT", ["properties", id]) => properties::update(req, app, id),
        ("DELETE", ["properties", id]) => properties::delete(&req, app, id),
        ("POST", ["properties", id, "favorite"]) => properties::toggle_favorite(&req, app, id),
        ("GET", ["properties", id, "similar"]) => properties::similar(app, id),

        ("GET", ["users", "favorites"]) => users::favorites(&req, app),
        ("POST", ["users", "favorites", id]) => users::add_favorite(&req, app, id),
        ("DELETE", ["users", "favorites", id]) => users::remove_favorite(&req, app, id),

        ("POST", ["auth", "request-link"]) => auth::request_link(req, app),
        ("GET", ["auth", "magic"]) => auth::redeem_link(&req, app),
        ("GET", ["auth", "me"]) => auth::me(&req, app),
        ("POST", ["auth", "logout"]) => auth::logout(&req, app),

        _ => Err(ServerError::NotFound("Not Found".into())),
    }
}
