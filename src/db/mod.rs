pub mod connection;
pub mod listings;
pub mod users;

pub use connection::{init_db, Database};
pub use listings::SqliteListingStore;

use crate::domain::{Listing, ListingDocument, ListingUpdate};
use crate::errors::ServerError;
use crate::search::{ListingFilter, PageWindow, SortSpec};

/// A page of listings plus the number of listings matching the filter.
#[derive(Debug)]
pub struct ListingPage {
    pub listings: Vec<Listing>,
    pub total: i64,
}

/// Persistence boundary for listings and favorites.
pub trait ListingStore: Send + Sync {
    fn find(
        &self,
        filter: &ListingFilter,
        sort: &SortSpec,
        window: &PageWindow,
    ) -> Result<Vec<Listing>, ServerError>;

    fn count_matching(&self, filter: &ListingFilter) -> Result<i64, ServerError>;

    /// Page and total. Implementations should read both from one snapshot.
    fn find_page(
        &self,
        filter: &ListingFilter,
        sort: &SortSpec,
        window: &PageWindow,
    ) -> Result<ListingPage, ServerError> {
        Ok(ListingPage {
            listings: self.find(filter, sort, window)?,
            total: self.count_matching(filter)?,
        })
    }

    fn find_by_id(&self, id: i64) -> Result<Option<Listing>, ServerError>;

    fn create(&self, owner_id: i64, document: ListingDocument) -> Result<Listing, ServerError>;

    fn update_fields(&self, id: i64, update: ListingUpdate) -> Result<Listing, ServerError>;

    /// Returns false when no listing had this id.
    fn delete_by_id(&self, id: i64) -> Result<bool, ServerError>;

    fn increment_views(&self, id: i64) -> Result<bool, ServerError>;

    /// Returns true when the user now has the listing favorited.
    fn toggle_favorite(&self, listing_id: i64, user_id: i64) -> Result<bool, ServerError>;

    fn add_favorite(&self, listing_id: i64, user_id: i64) -> Result<(), ServerError>;

    fn remove_favorite(&self, listing_id: i64, user_id: i64) -> Result<(), ServerError>;

    fn favorites_of(&self, user_id: i64) -> Result<Vec<Listing>, ServerError>;

    fn find_by_owner(&self, owner_id: i64) -> Result<Vec<Listing>, ServerError>;

    /// Same type and city, price within 20% either way.
    fn find_similar(&self, listing: &Listing, limit: i64) -> Result<Vec<Listing>, ServerError>;
}
