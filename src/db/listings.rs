// src/db/listings.rs
use crate::db::connection::Database;
use crate::db::{ListingPage, ListingStore};
use crate::domain::listing::{Listing, ListingDocument, ListingUpdate, OwnerSummary};
use crate::errors::ServerError;
use crate::search::{ListingFilter, PageWindow, SortSpec};
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::{Type, Value};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

/// Every listing read goes through this projection so rows map the same way.
const SELECT_LISTING: &str = r#"
    SELECT
        l.id,
        l.document,
        l.views,
        l.created_at,
        l.updated_at,
        u.id,
        u.name,
        u.email,
        (SELECT group_concat(f.user_id) FROM favorites f WHERE f.listing_id = l.id)
    FROM listings l
    JOIN users u ON u.id = l.owner_id
"#;

const SIMILAR_PRICE_BAND: f64 = 0.2;

pub struct SqliteListingStore {
    db: Database,
}

impl SqliteListingStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

/// Fixed-width RFC 3339 so text ordering is chronological.
fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(idx: usize, raw: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn listing_from_row(row: &Row) -> rusqlite::Result<Listing> {
    let raw_document: String = row.get(1)?;
    let document: ListingDocument = serde_json::from_str(&raw_document)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(1, Type::Text, Box::new(e)))?;

    let created_at: String = row.get(3)?;
    let updated_at: String = row.get(4)?;

    let mut favorites: Vec<i64> = row
        .get::<_, Option<String>>(8)?
        .unwrap_or_default()
        .split(',')
        .filter_map(|id| id.trim().parse().ok())
        .collect();
    favorites.sort_unstable();

    Ok(Listing {
        id: row.get(0)?,
        document,
        views: row.get(2)?,
        created_at: parse_timestamp(3, &created_at)?,
        updated_at: parse_timestamp(4, &updated_at)?,
        owner: OwnerSummary {
            id: row.get(5)?,
            name: row.get(6)?,
            email: row.get(7)?,
        },
        favorites,
    })
}

/// Builds the WHERE clause for a filter. Values are always bound, never
/// spliced into the SQL text.
fn where_clause(filter: &ListingFilter) -> (String, Vec<Value>) {
    let mut clauses: Vec<String> = Vec::new();
    let mut args: Vec<Value> = Vec::new();

    if let Some(range) = &filter.price {
        if let Some(min) = range.min {
            clauses.push("l.price >= ?".into());
            args.push(Value::Real(min));
        }
        if let Some(max) = range.max {
            clauses.push("l.price <= ?".into());
            args.push(Value::Real(max));
        }
    }
    if let Some(property_type) = &filter.property_type {
        clauses.push("l.property_type = ?".into());
        args.push(Value::Text(property_type.clone()));
    }
    if let Some(status) = &filter.status {
        clauses.push("l.status = ?".into());
        args.push(Value::Text(status.clone()));
    }
    if let Some(needle) = &filter.city {
        clauses.push("instr(fold_case(l.city), ?) > 0".into());
        args.push(Value::Text(needle.clone()));
    }
    if let Some(bedrooms) = filter.bedrooms {
        clauses.push("l.bedrooms = ?".into());
        args.push(Value::Real(bedrooms));
    }
    if let Some(bathrooms) = filter.bathrooms {
        clauses.push("l.bathrooms = ?".into());
        args.push(Value::Real(bathrooms));
    }
    if !filter.amenities.is_empty() {
        let placeholders = vec!["?"; filter.amenities.len()].join(", ");
        clauses.push(format!(
            "(SELECT COUNT(*) FROM listing_amenities a \
             WHERE a.listing_id = l.id AND a.amenity IN ({placeholders})) = ?"
        ));
        args.extend(filter.amenities.iter().cloned().map(Value::Text));
        args.push(Value::Integer(filter.amenities.len() as i64));
    }

    if clauses.is_empty() {
        (String::new(), args)
    } else {
        (format!(" WHERE {}", clauses.join(" AND ")), args)
    }
}

fn query_listings(
    conn: &Connection,
    sql: &str,
    args: &[Value],
) -> Result<Vec<Listing>, ServerError> {
    let mut stmt = conn.prepare(sql)?;
    let rows = stmt.query_map(params_from_iter(args.iter()), listing_from_row)?;

    let mut listings = Vec::new();
    for row in rows {
        listings.push(row?);
    }
    Ok(listings)
}

fn find_matching(
    conn: &Connection,
    filter: &ListingFilter,
    sort: &SortSpec,
    window: &PageWindow,
) -> Result<Vec<Listing>, ServerError> {
    let (where_sql, mut args) = where_clause(filter);
    let direction = sort.direction.sql();

    // id breaks ties so paging is stable
    let sql = format!(
        "{SELECT_LISTING}{where_sql} ORDER BY l.{column} {direction}, l.id {direction} LIMIT ? OFFSET ?",
        column = sort.field.column(),
    );
    args.push(Value::Integer(window.limit));
    args.push(Value::Integer(window.skip()));

    query_listings(conn, &sql, &args)
}

fn count_matching(conn: &Connection, filter: &ListingFilter) -> Result<i64, ServerError> {
    let (where_sql, args) = where_clause(filter);
    let sql = format!("SELECT COUNT(*) FROM listings l{where_sql}");
    let total = conn.query_row(&sql, params_from_iter(args.iter()), |row| row.get(0))?;
    Ok(total)
}

fn find_by_id(conn: &Connection, id: i64) -> Result<Option<Listing>, ServerError> {
    let sql = format!("{SELECT_LISTING} WHERE l.id = ?1");
    let listing = conn
        .query_row(&sql, params![id], listing_from_row)
        .optional()?;
    Ok(listing)
}

fn load_document(conn: &Connection, id: i64) -> Result<Option<ListingDocument>, ServerError> {
    let raw: Option<String> = conn
        .query_row(
            "SELECT document FROM listings WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )
        .optional()?;

    raw.map(|r| serde_json::from_str(&r).map_err(ServerError::from))
        .transpose()
}

fn replace_amenities(
    conn: &Connection,
    listing_id: i64,
    document: &ListingDocument,
) -> Result<(), ServerError> {
    conn.execute(
        "DELETE FROM listing_amenities WHERE listing_id = ?1",
        params![listing_id],
    )?;

    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO listing_amenities (listing_id, amenity) VALUES (?1, ?2)",
    )?;
    for amenity in &document.amenities {
        stmt.execute(params![listing_id, amenity.as_str()])?;
    }
    Ok(())
}

fn insert_listing(
    conn: &Connection,
    owner_id: i64,
    document: &ListingDocument,
    now: DateTime<Utc>,
) -> Result<i64, ServerError> {
    let now = timestamp(now);
    conn.execute(
        r#"
        INSERT INTO listings (
            owner_id, title, price, city, property_type, status,
            bedrooms, bathrooms, area, views, document, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 0, ?10, ?11, ?12)
        "#,
        params![
            owner_id,
            &document.title,
            document.price,
            &document.location.city,
            document.property_type.as_str(),
            document.status.as_str(),
            document.features.bedrooms,
            document.features.bathrooms,
            document.features.area,
            serde_json::to_string(document)?,
            &now,
            &now,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn write_document(
    conn: &Connection,
    id: i64,
    document: &ListingDocument,
    now: DateTime<Utc>,
) -> Result<(), ServerError> {
    conn.execute(
        r#"
        UPDATE listings SET
            title = ?1, price = ?2, city = ?3, property_type = ?4, status = ?5,
            bedrooms = ?6, bathrooms = ?7, area = ?8, document = ?9, updated_at = ?10
        WHERE id = ?11
        "#,
        params![
            &document.title,
            document.price,
            &document.location.city,
            document.property_type.as_str(),
            document.status.as_str(),
            document.features.bedrooms,
            document.features.bathrooms,
            document.features.area,
            serde_json::to_string(document)?,
            timestamp(now),
            id,
        ],
    )?;
    Ok(())
}

fn now_unix() -> i64 {
    Utc::now().timestamp()
}

impl ListingStore for SqliteListingStore {
    fn find(
        &self,
        filter: &ListingFilter,
        sort: &SortSpec,
        window: &PageWindow,
    ) -> Result<Vec<Listing>, ServerError> {
        self.db
            .with_conn(|conn| find_matching(conn, filter, sort, window))
    }

    fn count_matching(&self, filter: &ListingFilter) -> Result<i64, ServerError> {
        self.db.with_conn(|conn| count_matching(conn, filter))
    }

    fn find_page(
        &self,
        filter: &ListingFilter,
        sort: &SortSpec,
        window: &PageWindow,
    ) -> Result<ListingPage, ServerError> {
        // Both reads share one read transaction, hence one snapshot.
        self.db.with_conn(|conn| {
            let tx = conn.transaction()?;
            let listings = find_matching(&tx, filter, sort, window)?;
            let total = count_matching(&tx, filter)?;
            tx.commit()?;
            Ok(ListingPage { listings, total })
        })
    }

    fn find_by_id(&self, id: i64) -> Result<Option<Listing>, ServerError> {
        self.db.with_conn(|conn| find_by_id(conn, id))
    }

    fn create(&self, owner_id: i64, mut document: ListingDocument) -> Result<Listing, ServerError> {
        document.dedup_amenities();
        document.validate()?;
        let now = Utc::now();
        document.last_updated = Some(now);

        self.db.with_conn(|conn| {
            let tx = conn.transaction()?;
            let id = insert_listing(&tx, owner_id, &document, now)?;
            replace_amenities(&tx, id, &document)?;
            let listing = find_by_id(&tx, id)?.ok_or(ServerError::InternalError)?;
            tx.commit()?;

            log::info!("listing {id} created by user {owner_id}");
            Ok(listing)
        })
    }

    fn update_fields(&self, id: i64, update: ListingUpdate) -> Result<Listing, ServerError> {
        self.db.with_conn(|conn| {
            let tx = conn.transaction()?;
            let mut document = load_document(&tx, id)?.ok_or_else(ServerError::listing_not_found)?;

            update.apply(&mut document);
            document.dedup_amenities();
            document.validate()?;
            let now = Utc::now();
            document.last_updated = Some(now);

            write_document(&tx, id, &document, now)?;
            replace_amenities(&tx, id, &document)?;
            let listing = find_by_id(&tx, id)?.ok_or(ServerError::InternalError)?;
            tx.commit()?;

            log::info!("listing {id} updated");
            Ok(listing)
        })
    }

    fn delete_by_id(&self, id: i64) -> Result<bool, ServerError> {
        self.db.with_conn(|conn| {
            let deleted = conn.execute("DELETE FROM listings WHERE id = ?1", params![id])?;
            Ok(deleted > 0)
        })
    }

    fn increment_views(&self, id: i64) -> Result<bool, ServerError> {
        self.db.with_conn(|conn| {
            let updated = conn.execute(
                "UPDATE listings SET views = views + 1 WHERE id = ?1",
                params![id],
            )?;
            Ok(updated > 0)
        })
    }

    fn toggle_favorite(&self, listing_id: i64, user_id: i64) -> Result<bool, ServerError> {
        self.db.with_conn(|conn| {
            let tx = conn.transaction()?;
            let removed = tx.execute(
                "DELETE FROM favorites WHERE listing_id = ?1 AND user_id = ?2",
                params![listing_id, user_id],
            )?;
            if removed == 0 {
                tx.execute(
                    "INSERT INTO favorites (listing_id, user_id, created_at) VALUES (?1, ?2, ?3)",
                    params![listing_id, user_id, now_unix()],
                )?;
            }
            tx.commit()?;
            Ok(removed == 0)
        })
    }

    fn add_favorite(&self, listing_id: i64, user_id: i64) -> Result<(), ServerError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT OR IGNORE INTO favorites (listing_id, user_id, created_at) VALUES (?1, ?2, ?3)",
                params![listing_id, user_id, now_unix()],
            )?;
            Ok(())
        })
    }

    fn remove_favorite(&self, listing_id: i64, user_id: i64) -> Result<(), ServerError> {
        self.db.with_conn(|conn| {
            conn.execute(
                "DELETE FROM favorites WHERE listing_id = ?1 AND user_id = ?2",
                params![listing_id, user_id],
            )?;
            Ok(())
        })
    }

    fn favorites_of(&self, user_id: i64) -> Result<Vec<Listing>, ServerError> {
        let sql = format!(
            "{SELECT_LISTING} JOIN favorites mine ON mine.listing_id = l.id \
             WHERE mine.user_id = ? ORDER BY mine.created_at DESC, l.id DESC"
        );
        self.db
            .with_conn(|conn| query_listings(conn, &sql, &[Value::Integer(user_id)]))
    }

    fn find_by_owner(&self, owner_id: i64) -> Result<Vec<Listing>, ServerError> {
        let sql = format!("{SELECT_LISTING} WHERE l.owner_id = ? ORDER BY l.created_at DESC, l.id DESC");
        self.db
            .with_conn(|conn| query_listings(conn, &sql, &[Value::Integer(owner_id)]))
    }

    fn find_similar(&self, listing: &Listing, limit: i64) -> Result<Vec<Listing>, ServerError> {
        let price = listing.document.price;
        let sql = format!(
            "{SELECT_LISTING} WHERE l.id != ? AND l.property_type = ? AND l.city = ? \
             AND l.price >= ? AND l.price <= ? ORDER BY l.id LIMIT ?"
        );
        let args = [
            Value::Integer(listing.id),
            Value::Text(listing.document.property_type.as_str().to_string()),
            Value::Text(listing.document.location.city.clone()),
            Value::Real(price * (1.0 - SIMILAR_PRICE_BAND)),
            Value::Real(price * (1.0 + SIMILAR_PRICE_BAND)),
            Value::Integer(limit),
        ];
        self.db.with_conn(|conn| query_listings(conn, &sql, &args))
    }
}
