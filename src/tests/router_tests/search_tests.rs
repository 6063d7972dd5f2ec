// src/tests/router_tests/search_tests.rs
use crate::domain::listing::fixtures::sample_document;
use crate::domain::listing::{Amenity, ListingStatus, PropertyType};
use crate::tests::utils::{create_user, get, insert_listing, insert_sample, test_app};
use serde_json::Value;

fn prices(body: &Value) -> Vec<f64> {
    body["properties"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["price"].as_f64().unwrap())
        .collect()
}

#[test]
fn price_range_keeps_listings_within_both_bounds() {
    let (app, _) = test_app();
    let owner = create_user(&app.db, "owner@example.com", "Owner");
    for price in [900_000.0, 1_000_000.0, 1_500_000.0, 2_000_000.0, 2_500_000.0] {
        insert_sample(&app, owner, "Flat", "Ankara", price);
    }

    let (status, body) = get(
        &app,
        "/api/properties?minPrice=1000000&maxPrice=2000000&sort=price:asc",
    );

    assert_eq!(status, 200);
    assert_eq!(prices(&body), vec![1_000_000.0, 1_500_000.0, 2_000_000.0]);
    assert_eq!(body["total"], 3);
    assert_eq!(body["totalPages"], 1);
}

#[test]
fn oversized_limit_is_clamped_and_pages_run_dry() {
    let (app, _) = test_app();
    let owner = create_user(&app.db, "owner@example.com", "Owner");
    for i in 0..60 {
        insert_sample(&app, owner, &format!("Flat {i}"), "İzmir", 1000.0 + i as f64);
    }

    let (_, body) = get(&app, "/properties?limit=100");
    assert_eq!(body["properties"].as_array().unwrap().len(), 50);
    assert_eq!(body["limit"], 50);
    assert_eq!(body["total"], 60);
    assert_eq!(body["totalPages"], 2);

    let (_, body) = get(&app, "/properties?limit=100&page=2");
    assert_eq!(body["properties"].as_array().unwrap().len(), 10);
    assert_eq!(body["page"], 2);
    assert_eq!(body["limit"], 50);

    let (_, body) = get(&app, "/properties?limit=0");
    assert_eq!(body["properties"].as_array().unwrap().len(), 1);
    assert_eq!(body["limit"], 1);
    assert_eq!(body["totalPages"], 60);

    let (_, body) = get(&app, "/properties");
    assert_eq!(body["properties"].as_array().unwrap().len(), 10);
    assert_eq!(body["page"], 1);
    assert_eq!(body["limit"], 10);
    assert_eq!(body["totalPages"], 6);

    let (status, body) = get(&app, "/properties?page=3&limit=50");
    assert_eq!(status, 200);
    assert!(body["properties"].as_array().unwrap().is_empty());
    assert_eq!(body["total"], 60);
    assert_eq!(body["totalPages"], 2);
}

#[test]
fn city_matches_case_insensitive_fragment() {
    let (app, _) = test_app();
    let owner = create_user(&app.db, "owner@example.com", "Owner");
    insert_sample(&app, owner, "Bosphorus", "İstanbul", 1.0);
    insert_sample(&app, owner, "Capital", "Ankara", 1.0);

    let (_, body) = get(&app, "/properties?city=ista");
    let listed = body["properties"].as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["location"]["city"], "İstanbul");

    // regex metacharacters are plain text
    let (status, body) = get(&app, "/properties?city=.*");
    assert_eq!(status, 200);
    assert_eq!(body["total"], 0);
}

#[test]
fn amenities_require_every_tag() {
    let (app, _) = test_app();
    let owner = create_user(&app.db, "owner@example.com", "Owner");

    let mut full = sample_document("Full", "Ankara", 1.0);
    full.amenities = vec![Amenity::Gym, Amenity::Parking, Amenity::Elevator];
    let mut partial = sample_document("Partial", "Ankara", 2.0);
    partial.amenities = vec![Amenity::Gym];
    insert_listing(&app, owner, full);
    insert_listing(&app, owner, partial);

    let (_, body) = get(&app, "/properties?amenities=gym,%20parking,");
    let listed = body["properties"].as_array().unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0]["title"], "Full");
}

#[test]
fn exact_filters_combine() {
    let (app, _) = test_app();
    let owner = create_user(&app.db, "owner@example.com", "Owner");

    let mut villa = sample_document("Villa", "Antalya", 5.0);
    villa.property_type = PropertyType::Villa;
    villa.features.bedrooms = 4;
    let mut rental = sample_document("Rental", "Antalya", 3.0);
    rental.status = ListingStatus::ForRent;
    insert_listing(&app, owner, villa);
    insert_listing(&app, owner, rental);
    insert_sample(&app, owner, "Plain", "Antalya", 4.0);

    let (_, body) = get(&app, "/properties?propertyType=villa&bedrooms=4");
    assert_eq!(body["total"], 1);
    assert_eq!(body["properties"][0]["title"], "Villa");

    let (_, body) = get(&app, "/properties?status=for-rent");
    assert_eq!(body["total"], 1);
    assert_eq!(body["properties"][0]["title"], "Rental");
}

#[test]
fn sort_direction_and_unknown_field_fallback() {
    let (app, _) = test_app();
    let owner = create_user(&app.db, "owner@example.com", "Owner");
    let first = insert_sample(&app, owner, "First", "Bursa", 300.0);
    insert_sample(&app, owner, "Second", "Bursa", 100.0);
    let third = insert_sample(&app, owner, "Third", "Bursa", 200.0);

    let (_, body) = get(&app, "/properties?sort=price:desc");
    assert_eq!(prices(&body), vec![300.0, 200.0, 100.0]);

    let (_, body) = get(&app, "/properties?sort=nonsense:asc");
    assert_eq!(body["properties"][0]["_id"], first.id);

    // default is newest first
    let (_, body) = get(&app, "/properties");
    assert_eq!(body["properties"][0]["_id"], third.id);
}

#[test]
fn malformed_parameters_degrade_to_defaults() {
    let (app, _) = test_app();
    let owner = create_user(&app.db, "owner@example.com", "Owner");
    insert_sample(&app, owner, "Flat", "Bursa", 100.0);

    let (status, body) = get(&app, "/properties?minPrice=cheap&page=abc&limit=-5");
    assert_eq!(status, 200);
    assert_eq!(body["total"], 1);
    assert_eq!(body["page"], 1);
    assert_eq!(body["limit"], 1);
}

#[test]
fn repeated_search_is_identical() {
    let (app, _) = test_app();
    let owner = create_user(&app.db, "owner@example.com", "Owner");
    for price in [5.0, 5.0, 5.0, 7.0] {
        insert_sample(&app, owner, "Same", "Bursa", price);
    }

    let uri = "/properties?sort=price:asc&limit=2&page=2";
    let (_, a) = get(&app, uri);
    let (_, b) = get(&app, uri);
    assert_eq!(a, b);
    assert_eq!(a["properties"].as_array().unwrap().len(), 2);
}

#[test]
fn search_does_not_count_views() {
    let (app, _) = test_app();
    let owner = create_user(&app.db, "owner@example.com", "Owner");
    insert_sample(&app, owner, "Flat", "Bursa", 100.0);

    get(&app, "/properties");
    let (_, body) = get(&app, "/properties");
    assert_eq!(body["properties"][0]["views"], 0);
}
