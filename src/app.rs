use crate::auth::magic::{MagicLinkConfig, MagicLinkService};
use crate::config::Config;
use crate::db::{Database, ListingStore, SqliteListingStore};
use crate::media::MediaStore;
use std::sync::Arc;

/// Everything a request handler needs. Shared by all worker threads.
pub struct App {
    pub db: Database,
    pub listings: Box<dyn ListingStore>,
    pub media: Arc<dyn MediaStore>,
    pub magic_links: MagicLinkService,
    pub expose_magic_links: bool,
}

impl App {
    pub fn new(db: Database, media: Arc<dyn MediaStore>, config: &Config) -> Self {
        Self {
            listings: Box::new(SqliteListingStore::new(db.clone())),
            db,
            media,
            magic_links: MagicLinkService::new(MagicLinkConfig::default()),
            expose_magic_links: config.expose_magic_links,
        }
    }
}
