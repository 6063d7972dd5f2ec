// src/search/mod.rs
pub mod query;

pub use query::{fold_case, ListingFilter, ListingQuery, PageWindow, SortSpec};

use crate::db::ListingStore;
use crate::domain::Listing;
use crate::errors::ServerError;
use serde::Serialize;
use std::collections::HashMap;

/// Response body for `GET /properties`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    pub properties: Vec<Listing>,
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub total_pages: i64,
}

/// ceil(total / limit); zero when nothing matches.
pub fn total_pages(total: i64, limit: i64) -> i64 {
    if total <= 0 || limit <= 0 {
        return 0;
    }
    (total + limit - 1) / limit
}

/// Runs one search: builds the query, then reads a page and the match count.
pub fn search_listings(
    store: &dyn ListingStore,
    params: &HashMap<String, String>,
) -> Result<SearchPage, ServerError> {
    let query = ListingQuery::from_params(params);
    log::debug!("listing search {:?}", query);

    let page = store.find_page(&query.filter, &query.sort, &query.window)?;

    Ok(SearchPage {
        properties: page.listings,
        page: query.window.page,
        limit: query.window.limit,
        total: page.total,
        total_pages: total_pages(page.total, query.window.limit),
    })
}
