pub mod errors;
pub mod json;

pub use errors::error_to_response;
pub use json::{json_message, json_response};
