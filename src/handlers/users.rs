use crate::app::App;
use crate::auth::require_user;
use crate::errors::{ResultResp, ServerError};
use crate::handlers::{now_unix, parse_id};
use crate::responses::{json_message, json_response};
use astra::Request;

pub fn favorites(req: &Request, app: &App) -> ResultResp {
    let user = require_user(req, &app.db, now_unix())?;
    let listings = app.listings.favorites_of(user.id)?;
    json_response(200, &listings)
}

/// Idempotent: favoriting twice leaves one entry.
pub fn add_favorite(req: &Request, app: &App, id: &str) -> ResultResp {
    let user = require_user(req, &app.db, now_unix())?;
    let id = parse_id(id, "Property not found")?;
    if app.listings.find_by_id(id)?.is_none() {
        return Err(ServerError::listing_not_found());
    }

    app.listings.add_favorite(id, user.id)?;
    json_message(200, "Property added to favorites")
}

pub fn remove_favorite(req: &Request, app: &App, id: &str) -> ResultResp {
    let user = require_user(req, &app.db, now_unix())?;
    let id = parse_id(id, "Property not found")?;

    app.listings.remove_favorite(id, user.id)?;
    json_message(200, "Property removed from favorites")
}
