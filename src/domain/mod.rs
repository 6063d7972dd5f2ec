pub mod listing;
pub mod user;

pub use listing::{Listing, ListingDocument, ListingUpdate, PropertyImage};
pub use user::User;
