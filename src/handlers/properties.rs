// src/handlers/properties.rs
use crate::app::App;
use crate::auth::require_user;
use crate::domain::{ListingDocument, ListingUpdate, PropertyImage};
use crate::errors::{ResultResp, ServerError};
use crate::handlers::{generic_bad_request, now_unix, parse_id, query_params, read_json_object};
use crate::media::{release_all, upload_all};
use crate::responses::{json_message, json_response};
use crate::search::search_listings;
use astra::Request;
use serde_json::{json, Map, Value};

const SIMILAR_LIMIT: i64 = 4;
const CREATE_FAILED: &str = "Error creating property";
const UPDATE_FAILED: &str = "Error updating property";

const MAX_IMAGES: usize = 20;

/// Images in a write body are upload sources (strings) or images the listing
/// already holds (`{url, public_id}`). An image object is accepted only when
/// `held` has its `public_id`, and the stored copy is what gets kept.
fn split_images(
    value: Value,
    held: &[PropertyImage],
) -> Result<(Vec<PropertyImage>, Vec<String>), ServerError> {
    let Value::Array(items) = value else {
        return Err(ServerError::BadRequest("images must be an array".into()));
    };
    if items.len() > MAX_IMAGES {
        return Err(ServerError::BadRequest(format!(
            "at most {MAX_IMAGES} images per listing"
        )));
    }

    let mut kept = Vec::new();
    let mut sources = Vec::new();
    for item in items {
        match item {
            Value::String(source) => sources.push(source),
            other => {
                let image: PropertyImage = serde_json::from_value(other)
                    .map_err(|e| ServerError::BadRequest(format!("invalid image entry: {e}")))?;
                let stored = held
                    .iter()
                    .find(|h| h.public_id == image.public_id)
                    .ok_or_else(|| {
                        ServerError::BadRequest(format!(
                            "image {} does not belong to this listing",
                            image.public_id
                        ))
                    })?;
                kept.push(stored.clone());
            }
        }
    }
    Ok((kept, sources))
}

fn listing_id(raw: &str) -> Result<i64, ServerError> {
    parse_id(raw, "Property not found")
}

pub fn list(req: &Request, app: &App) -> ResultResp {
    let page = search_listings(app.listings.as_ref(), &query_params(req))?;
    json_response(200, &page)
}

pub fn create(req: Request, app: &App) -> ResultResp {
    let user = require_user(&req, &app.db, now_unix())?;
    let mut body = read_json_object(req).map_err(|e| generic_bad_request(e, CREATE_FAILED))?;

    // a new listing holds no images yet, so every entry must be a source
    let sources = match body.remove("images") {
        Some(images) => {
            split_images(images, &[])
                .map_err(|e| generic_bad_request(e, CREATE_FAILED))?
                .1
        }
        None => Vec::new(),
    };

    let mut document: ListingDocument = serde_json::from_value(Value::Object(body))
        .map_err(|e| generic_bad_request(ServerError::BadRequest(e.to_string()), CREATE_FAILED))?;
    document.dedup_amenities();
    document
        .validate()
        .map_err(|e| generic_bad_request(e, CREATE_FAILED))?;

    let uploaded = upload_all(app.media.as_ref(), &sources)?;
    document.images = uploaded.clone();

    match app.listings.create(user.id, document) {
        Ok(listing) => json_response(201, &listing),
        Err(e) => {
            release_all(app.media.as_ref(), &uploaded);
            Err(generic_bad_request(e, CREATE_FAILED))
        }
    }
}

pub fn by_owner(app: &App, user_id: &str) -> ResultResp {
    let owner_id = parse_id(user_id, "User not found")?;
    let listings = app.listings.find_by_owner(owner_id)?;
    json_response(200, &listings)
}

/// Every read by id counts as a view, whoever the caller is.
pub fn show(app: &App, id: &str) -> ResultResp {
    let id = listing_id(id)?;
    if !app.listings.increment_views(id)? {
        return Err(ServerError::listing_not_found());
    }
    let listing = app
        .listings
        .find_by_id(id)?
        .ok_or_else(ServerError::listing_not_found)?;
    json_response(200, &listing)
}

pub fn update(req: Request, app: &App, id: &str) -> ResultResp {
    let user = require_user(&req, &app.db, now_unix())?;
    let id = listing_id(id)?;
    let existing = app
        .listings
        .find_by_id(id)?
        .ok_or_else(ServerError::listing_not_found)?;
    if !existing.is_owned_by(user.id) {
        return Err(ServerError::Forbidden(
            "Not authorized to update this property".into(),
        ));
    }

    let body: Map<String, Value> =
        read_json_object(req).map_err(|e| generic_bad_request(e, UPDATE_FAILED))?;
    let mut update =
        ListingUpdate::from_body(&body).map_err(|e| generic_bad_request(e, UPDATE_FAILED))?;
    let new_images = match body.get("images").cloned() {
        Some(images) => Some(
            split_images(images, &existing.document.images)
                .map_err(|e| generic_bad_request(e, UPDATE_FAILED))?,
        ),
        None => None,
    };

    // Reject a bad result before anything is uploaded.
    let mut preview = existing.document.clone();
    update.clone().apply(&mut preview);
    preview.dedup_amenities();
    preview
        .validate()
        .map_err(|e| generic_bad_request(e, UPDATE_FAILED))?;

    let uploaded = match &new_images {
        Some((_, sources)) => upload_all(app.media.as_ref(), sources)?,
        None => Vec::new(),
    };
    if let Some((kept, _)) = new_images {
        update.images = Some(kept.into_iter().chain(uploaded.iter().cloned()).collect());
    }

    let updated = match app.listings.update_fields(id, update) {
        Ok(listing) => listing,
        Err(e) => {
            release_all(app.media.as_ref(), &uploaded);
            return Err(generic_bad_request(e, UPDATE_FAILED));
        }
    };

    let dropped: Vec<PropertyImage> = existing
        .document
        .images
        .into_iter()
        .filter(|old| !updated.document.images.iter().any(|img| img.public_id == old.public_id))
        .collect();
    release_all(app.media.as_ref(), &dropped);

    json_response(200, &updated)
}

pub fn delete(req: &Request, app: &App, id: &str) -> ResultResp {
    let user = require_user(req, &app.db, now_unix())?;
    let id = listing_id(id)?;
    let existing = app
        .listings
        .find_by_id(id)?
        .ok_or_else(ServerError::listing_not_found)?;
    if !existing.is_owned_by(user.id) {
        return Err(ServerError::Forbidden(
            "Not authorized to delete this property".into(),
        ));
    }

    if !app.listings.delete_by_id(id)? {
        return Err(ServerError::listing_not_found());
    }
    release_all(app.media.as_ref(), &existing.document.images);
    log::info!("listing {id} deleted by user {}", user.id);

    json_message(200, "Property deleted successfully")
}

pub fn toggle_favorite(req: &Request, app: &App, id: &str) -> ResultResp {
    let user = require_user(req, &app.db, now_unix())?;
    let id = listing_id(id)?;
    if app.listings.find_by_id(id)?.is_none() {
        return Err(ServerError::listing_not_found());
    }

    let favorited = app.listings.toggle_favorite(id, user.id)?;
    json_response(
        200,
        &json!({ "message": "Favorite status updated", "favorited": favorited }),
    )
}

pub fn similar(app: &App, id: &str) -> ResultResp {
    let id = listing_id(id)?;
    let listing = app
        .listings
        .find_by_id(id)?
        .ok_or_else(ServerError::listing_not_found)?;
    let similar = app.listings.find_similar(&listing, SIMILAR_LIMIT)?;
    json_response(200, &similar)
}
