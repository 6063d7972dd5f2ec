// src/seed.rs
use crate::db::{users as db_users, Database, ListingStore};
use crate::domain::ListingDocument;
use crate::errors::ServerError;
use std::time::{SystemTime, UNIX_EPOCH};

pub const DEFAULT_SEED_PATH: &str = "seed/listings.json";
pub const SEED_OWNER_EMAIL: &str = "seed@example.com";
const SEED_OWNER_NAME: &str = "Demo Realty";

pub fn parse_seed(raw: &str) -> Result<Vec<ListingDocument>, ServerError> {
    serde_json::from_str(raw).map_err(|e| ServerError::BadRequest(format!("invalid seed file: {e}")))
}

/// Inserts the sample listings under the seed owner. Returns how many were
/// created; zero when the owner already has listings.
pub fn seed_listings(
    db: &Database,
    store: &dyn ListingStore,
    documents: Vec<ListingDocument>,
) -> Result<usize, ServerError> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs() as i64;
    let owner_id = db.with_conn(|conn| {
        db_users::get_or_create_user(conn, SEED_OWNER_EMAIL, SEED_OWNER_NAME, now)
    })?;

    if !store.find_by_owner(owner_id)?.is_empty() {
        log::info!("seed owner already has listings, skipping");
        return Ok(0);
    }

    let mut created = 0;
    for document in documents {
        let title = document.title.clone();
        match store.create(owner_id, document) {
            Ok(listing) => {
                log::debug!("seeded listing {} ({title})", listing.id);
                created += 1;
            }
            Err(e) => log::warn!("skipping seed listing {title}: {e}"),
        }
    }

    log::info!("seeded {created} listings");
    Ok(created)
}

pub fn run(db: &Database, store: &dyn ListingStore, path: &str) -> Result<usize, ServerError> {
    let raw = std::fs::read_to_string(path).map_err(|e| {
        log::error!("cannot read seed file {path}: {e}");
        ServerError::InternalError
    })?;
    seed_listings(db, store, parse_seed(&raw)?)
}
