// src/domain/listing.rs

use crate::errors::ServerError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    House,
    Apartment,
    Condo,
    Villa,
    Land,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::House => "house",
            PropertyType::Apartment => "apartment",
            PropertyType::Condo => "condo",
            PropertyType::Villa => "villa",
            PropertyType::Land => "land",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ListingStatus {
    ForSale,
    ForRent,
    Sold,
    Rented,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::ForSale => "for-sale",
            ListingStatus::ForRent => "for-rent",
            ListingStatus::Sold => "sold",
            ListingStatus::Rented => "rented",
        }
    }
}

/// Fixed amenity vocabulary. Anything else is rejected on write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Amenity {
    #[serde(rename = "gym")]
    Gym,
    #[serde(rename = "swimming pool")]
    SwimmingPool,
    #[serde(rename = "parking")]
    Parking,
    #[serde(rename = "elevator")]
    Elevator,
    #[serde(rename = "security")]
    Security,
    #[serde(rename = "playground")]
    Playground,
    #[serde(rename = "laundry")]
    Laundry,
    #[serde(rename = "pet friendly")]
    PetFriendly,
    #[serde(rename = "storage")]
    Storage,
    #[serde(rename = "fitness center")]
    FitnessCenter,
    #[serde(rename = "tennis court")]
    TennisCourt,
    #[serde(rename = "bbq area")]
    BbqArea,
}

impl Amenity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Amenity::Gym => "gym",
            Amenity::SwimmingPool => "swimming pool",
            Amenity::Parking => "parking",
            Amenity::Elevator => "elevator",
            Amenity::Security => "security",
            Amenity::Playground => "playground",
            Amenity::Laundry => "laundry",
            Amenity::PetFriendly => "pet friendly",
            Amenity::Storage => "storage",
            Amenity::FitnessCenter => "fitness center",
            Amenity::TennisCourt => "tennis court",
            Amenity::BbqArea => "bbq area",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EnergyRating {
    A,
    B,
    C,
    D,
    E,
    F,
    G,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeatingType {
    #[serde(rename = "natural gas")]
    NaturalGas,
    Electric,
    Solar,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UsageStatus {
    Empty,
    Tenant,
    Owner,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TitleDeedStatus {
    Ready,
    #[serde(rename = "under construction")]
    UnderConstruction,
    Cooperative,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub address: String,
    pub city: String,
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Features {
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub area: f64,
    #[serde(default)]
    pub parking: bool,
    #[serde(default)]
    pub furnished: bool,
    #[serde(default)]
    pub air_conditioning: bool,
    #[serde(default)]
    pub heating: bool,
    #[serde(default)]
    pub balcony: bool,
    #[serde(default)]
    pub garden: bool,
    #[serde(default)]
    pub pool: bool,
    #[serde(default)]
    pub security: bool,
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Specifications {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub construction_year: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_floors: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heating: Option<HeatingType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub facade: Option<String>,
    #[serde(default)]
    pub furnished: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage_status: Option<UsageStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dues: Option<f64>,
    #[serde(default = "default_true")]
    pub eligible: bool,
    #[serde(default)]
    pub swap: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title_deed_status: Option<TitleDeedStatus>,
}

impl Default for Specifications {
    fn default() -> Self {
        Self {
            construction_year: None,
            total_floors: None,
            floor: None,
            heating: None,
            facade: None,
            furnished: false,
            usage_status: None,
            dues: None,
            eligible: true,
            swap: false,
            title_deed_status: None,
        }
    }
}

/// An image held by the media host. `public_id` is what deletion needs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PropertyImage {
    pub url: String,
    pub public_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NearbyPlace {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub distance: f64,
}

/// The owner-editable body of a listing, stored as one JSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingDocument {
    pub title: String,
    pub description: String,
    pub price: f64,
    pub location: Location,
    pub features: Features,
    #[serde(default)]
    pub specifications: Specifications,
    #[serde(default)]
    pub images: Vec<PropertyImage>,
    pub property_type: PropertyType,
    pub status: ListingStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year_built: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub virtual_tour: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub floor_plan: Option<String>,
    #[serde(default)]
    pub amenities: Vec<Amenity>,
    #[serde(default)]
    pub nearby_places: Vec<NearbyPlace>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub energy_rating: Option<EnergyRating>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub availability: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,
}

fn require_text(value: &str, field: &str) -> Result<(), ServerError> {
    if value.trim().is_empty() {
        return Err(ServerError::BadRequest(format!("{field} is required")));
    }
    Ok(())
}

fn require_non_negative(value: f64, field: &str) -> Result<(), ServerError> {
    if !value.is_finite() || value < 0.0 {
        return Err(ServerError::BadRequest(format!(
            "{field} must be a non-negative number"
        )));
    }
    Ok(())
}

impl ListingDocument {
    /// Checks the invariants serde cannot express. Closed enumerations and
    /// non-negative counts are already enforced by the field types.
    pub fn validate(&self) -> Result<(), ServerError> {
        require_text(&self.title, "title")?;
        require_text(&self.description, "description")?;
        require_text(&self.location.address, "location.address")?;
        require_text(&self.location.city, "location.city")?;
        require_text(&self.location.state, "location.state")?;
        require_non_negative(self.price, "price")?;
        require_non_negative(self.features.area, "features.area")?;

        if let Some(c) = &self.location.coordinates {
            if !(-90.0..=90.0).contains(&c.lat) || !(-180.0..=180.0).contains(&c.lng) {
                return Err(ServerError::BadRequest(
                    "location.coordinates out of range".into(),
                ));
            }
        }
        if let Some(dues) = self.specifications.dues {
            require_non_negative(dues, "specifications.dues")?;
        }
        for place in &self.nearby_places {
            require_non_negative(place.distance, "nearbyPlaces.distance")?;
        }
        Ok(())
    }

    /// Amenities are a set; keep first occurrence order.
    pub fn dedup_amenities(&mut self) {
        let mut seen = Vec::with_capacity(self.amenities.len());
        self.amenities.retain(|a| {
            if seen.contains(a) {
                false
            } else {
                seen.push(*a);
                true
            }
        });
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OwnerSummary {
    #[serde(rename = "_id")]
    pub id: i64,
    pub name: String,
    pub email: String,
}

/// A stored listing as returned to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    #[serde(rename = "_id")]
    pub id: i64,
    #[serde(flatten)]
    pub document: ListingDocument,
    pub owner: OwnerSummary,
    pub views: i64,
    pub favorites: Vec<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    pub fn is_owned_by(&self, user_id: i64) -> bool {
        self.owner.id == user_id
    }
}

/// Fields an owner may change on an existing listing. Keys outside this
/// list are dropped before deserializing an update body.
pub const ALLOWED_UPDATES: [&str; 13] = [
    "title",
    "description",
    "price",
    "location",
    "features",
    "propertyType",
    "status",
    "images",
    "amenities",
    "virtualTour",
    "floorPlan",
    "energyRating",
    "availability",
];

#[derive(Debug, Default, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListingUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub location: Option<Location>,
    pub features: Option<Features>,
    pub property_type: Option<PropertyType>,
    pub status: Option<ListingStatus>,
    /// Filled in by the handler after the new images are uploaded.
    #[serde(skip)]
    pub images: Option<Vec<PropertyImage>>,
    pub amenities: Option<Vec<Amenity>>,
    pub virtual_tour: Option<String>,
    pub floor_plan: Option<String>,
    pub energy_rating: Option<EnergyRating>,
    pub availability: Option<DateTime<Utc>>,
}

impl ListingUpdate {
    /// Builds an update from a JSON object, keeping only allow-listed keys.
    /// `images` is excluded here; it carries raw upload sources, not stored images.
    pub fn from_body(body: &serde_json::Map<String, serde_json::Value>) -> Result<Self, ServerError> {
        let allowed: serde_json::Map<String, serde_json::Value> = body
            .iter()
            .filter(|(key, _)| *key != "images" && ALLOWED_UPDATES.contains(&key.as_str()))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();

        serde_json::from_value(serde_json::Value::Object(allowed))
            .map_err(|e| ServerError::BadRequest(format!("invalid update: {e}")))
    }

    pub fn apply(self, doc: &mut ListingDocument) {
        macro_rules! set_field {
            ($field:ident) => {
                if let Some(value) = self.$field {
                    doc.$field = value;
                }
            };
        }
        macro_rules! set_optional {
            ($field:ident) => {
                if let Some(value) = self.$field {
                    doc.$field = Some(value);
                }
            };
        }

        set_field!(title);
        set_field!(description);
        set_field!(price);
        set_field!(location);
        set_field!(features);
        set_field!(property_type);
        set_field!(status);
        set_field!(images);
        set_field!(amenities);
        set_optional!(virtual_tour);
        set_optional!(floor_plan);
        set_optional!(energy_rating);
        set_optional!(availability);
    }
}
