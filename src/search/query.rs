// src/search/query.rs
//
// Turns untrusted query-string parameters into a typed filter, sort and page
// window. Nothing here fails: a malformed value simply drops its clause.

use std::collections::{BTreeSet, HashMap};

pub const DEFAULT_PAGE_SIZE: i64 = 10;
pub const MAX_PAGE_SIZE: i64 = 50;

/// Inclusive price bounds, built once from both parameters.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PriceRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl PriceRange {
    pub fn new(min: Option<f64>, max: Option<f64>) -> Option<Self> {
        if min.is_none() && max.is_none() {
            return None;
        }
        Some(Self { min, max })
    }

    #[cfg(test)]
    pub fn contains(&self, price: f64) -> bool {
        self.min.map_or(true, |min| price >= min) && self.max.map_or(true, |max| price <= max)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListingFilter {
    pub price: Option<PriceRange>,
    /// Matched exactly, without checking the enumeration.
    pub property_type: Option<String>,
    pub status: Option<String>,
    /// Case-folded needle for a literal substring match on the city.
    pub city: Option<String>,
    pub bedrooms: Option<f64>,
    pub bathrooms: Option<f64>,
    /// Every tag must be present on a listing.
    pub amenities: BTreeSet<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortField {
    CreatedAt,
    UpdatedAt,
    Price,
    Views,
    Title,
    Bedrooms,
    Bathrooms,
    Area,
}

impl SortField {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "createdAt" => Some(SortField::CreatedAt),
            "updatedAt" | "lastUpdated" => Some(SortField::UpdatedAt),
            "price" => Some(SortField::Price),
            "views" => Some(SortField::Views),
            "title" => Some(SortField::Title),
            "features.bedrooms" | "bedrooms" => Some(SortField::Bedrooms),
            "features.bathrooms" | "bathrooms" => Some(SortField::Bathrooms),
            "features.area" | "area" => Some(SortField::Area),
            _ => None,
        }
    }

    /// Column in the `listings` table. Only these names ever reach SQL.
    pub fn column(&self) -> &'static str {
        match self {
            SortField::CreatedAt => "created_at",
            SortField::UpdatedAt => "updated_at",
            SortField::Price => "price",
            SortField::Views => "views",
            SortField::Title => "title",
            SortField::Bedrooms => "bedrooms",
            SortField::Bathrooms => "bathrooms",
            SortField::Area => "area",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    Descending,
}

impl SortDirection {
    pub fn sql(&self) -> &'static str {
        match self {
            SortDirection::Ascending => "ASC",
            SortDirection::Descending => "DESC",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    pub field: SortField,
    pub direction: SortDirection,
}

impl Default for SortSpec {
    fn default() -> Self {
        Self {
            field: SortField::CreatedAt,
            direction: SortDirection::Descending,
        }
    }
}

impl SortSpec {
    /// `<field>:<direction>`. Only `desc` sorts descending. An unknown
    /// field sorts by creation time in the requested direction.
    pub fn parse(raw: &str) -> Self {
        let mut parts = raw.splitn(2, ':');
        let field = parts.next().unwrap_or_default().trim();
        let direction = match parts.next().map(str::trim) {
            Some("desc") => SortDirection::Descending,
            _ => SortDirection::Ascending,
        };
        Self {
            field: SortField::parse(field).unwrap_or(SortField::CreatedAt),
            direction,
        }
    }
}

/// One page of results. `page >= 1` and `1 <= limit <= MAX_PAGE_SIZE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page: i64,
    pub limit: i64,
}

impl Default for PageWindow {
    fn default() -> Self {
        Self {
            page: 1,
            limit: DEFAULT_PAGE_SIZE,
        }
    }
}

impl PageWindow {
    pub fn new(page: Option<i64>, limit: Option<i64>) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            // limit=0 and negatives mean a one-item page, never an empty one
            limit: limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE),
        }
    }

    pub fn skip(&self) -> i64 {
        (self.page - 1).saturating_mul(self.limit)
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct ListingQuery {
    pub filter: ListingFilter,
    pub sort: SortSpec,
    pub window: PageWindow,
}

impl ListingQuery {
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let text = |key: &str| {
            params
                .get(key)
                .map(|v| v.trim())
                .filter(|v| !v.is_empty())
        };
        let number = |key: &str| text(key).and_then(parse_number);

        let filter = ListingFilter {
            price: PriceRange::new(number("minPrice"), number("maxPrice")),
            property_type: text("propertyType").map(str::to_string),
            status: text("status").map(str::to_string),
            city: text("city").map(fold_case),
            bedrooms: number("bedrooms"),
            bathrooms: number("bathrooms"),
            amenities: text("amenities").map(split_tags).unwrap_or_default(),
        };

        let sort = text("sort").map(SortSpec::parse).unwrap_or_default();

        let window = PageWindow::new(
            number("page").map(truncate),
            number("limit").map(truncate),
        );

        Self {
            filter,
            sort,
            window,
        }
    }
}

/// Finite decimal numbers only; anything else counts as "not supplied".
pub fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|n| n.is_finite())
}

fn truncate(n: f64) -> i64 {
    // saturating float-to-int cast
    n.trunc() as i64
}

fn split_tags(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(str::to_string)
        .collect()
}

/// Lowercase with the Turkish `İ`/`ı` folded onto `i`, so `ista` finds `İstanbul`.
pub fn fold_case(text: &str) -> String {
    text.chars()
        .flat_map(char::to_lowercase)
        .filter(|c| *c != '\u{307}')
        .map(|c| if c == 'ı' { 'i' } else { c })
        .collect()
}
