// src/tests/router_tests/property_tests.rs
use crate::domain::listing::fixtures::sample_document;
use crate::domain::PropertyImage;
use crate::media::MediaStore;
use crate::tests::utils::{
    call, create_user, get, insert_listing, insert_sample, request, sign_in, test_app, PNG_URI,
};
use serde_json::{json, Value};

fn new_listing_body(images: Value) -> Value {
    let mut body = serde_json::to_value(sample_document("Garden flat", "İzmir", 2_500_000.0)).unwrap();
    body["images"] = images;
    body["amenities"] = json!(["gym", "parking", "gym"]);
    body
}

#[test]
fn create_requires_authentication() {
    let (app, _) = test_app();
    let body = new_listing_body(json!([]));

    let (status, resp) = call(&app, request("POST", "/properties", None, Some(&body)));
    assert_eq!(status, 401);
    assert_eq!(resp["message"], "Authentication required");

    let (status, _) = call(&app, request("POST", "/properties", Some("bogus"), Some(&body)));
    assert_eq!(status, 401);
}

#[test]
fn create_uploads_images_and_returns_populated_listing() {
    let (app, media) = test_app();
    let (user_id, token) = sign_in(&app, "seller@example.com");
    let body = new_listing_body(json!([PNG_URI, "https://example.com/front.jpg"]));

    let (status, created) = call(&app, request("POST", "/api/properties", Some(&token), Some(&body)));

    assert_eq!(status, 201);
    assert_eq!(created["owner"]["_id"], user_id);
    assert_eq!(created["owner"]["email"], "seller@example.com");
    assert_eq!(created["views"], 0);
    assert_eq!(created["images"].as_array().unwrap().len(), 2);
    assert_eq!(created["amenities"], json!(["gym", "parking"]));
    assert!(created["createdAt"].is_string());
    assert_eq!(media.len(), 2);
}

#[test]
fn invalid_body_is_a_generic_bad_request() {
    let (app, media) = test_app();
    let (_, token) = sign_in(&app, "seller@example.com");

    let mut body = new_listing_body(json!([PNG_URI]));
    body["propertyType"] = json!("castle");
    let (status, resp) = call(&app, request("POST", "/properties", Some(&token), Some(&body)));
    assert_eq!(status, 400);
    assert_eq!(resp["message"], "Error creating property");

    let mut body = new_listing_body(json!([]));
    body["price"] = json!(-1);
    let (status, _) = call(&app, request("POST", "/properties", Some(&token), Some(&body)));
    assert_eq!(status, 400);

    // nothing was uploaded for rejected bodies
    assert_eq!(media.len(), 0);
}

#[test]
fn failed_upload_abandons_create() {
    let (app, media) = test_app();
    let (user_id, token) = sign_in(&app, "seller@example.com");

    let body = new_listing_body(json!([PNG_URI, "data:image/gif;base64,R0lGODlh"]));
    let (status, _) = call(&app, request("POST", "/properties", Some(&token), Some(&body)));
    assert_eq!(status, 400);
    assert_eq!(media.len(), 0);

    media.fail_uploads(true);
    let body = new_listing_body(json!([PNG_URI]));
    let (status, resp) = call(&app, request("POST", "/properties", Some(&token), Some(&body)));
    assert_eq!(status, 500);
    assert_eq!(resp["message"], "Internal Server Error");

    assert!(app.listings.find_by_owner(user_id).unwrap().is_empty());
}

#[test]
fn show_counts_every_view() {
    let (app, _) = test_app();
    let owner = create_user(&app.db, "owner@example.com", "Owner");
    let listing = insert_sample(&app, owner, "Flat", "Bursa", 10.0);
    let uri = format!("/properties/{}", listing.id);

    let (status, body) = get(&app, &uri);
    assert_eq!(status, 200);
    assert_eq!(body["views"], 1);
    assert_eq!(body["owner"]["name"], "Owner");

    let (_, body) = get(&app, &uri);
    assert_eq!(body["views"], 2);
}

#[test]
fn unknown_or_malformed_ids_are_not_found() {
    let (app, _) = test_app();

    for uri in ["/properties/999", "/properties/abc", "/properties/999/similar"] {
        let (status, body) = get(&app, uri);
        assert_eq!(status, 404, "{uri}");
        assert_eq!(body["message"], "Property not found");
    }

    let (status, _) = get(&app, "/nowhere");
    assert_eq!(status, 404);
}

#[test]
fn update_checks_auth_then_existence_then_ownership() {
    let (app, _) = test_app();
    let (owner, owner_token) = sign_in(&app, "owner@example.com");
    let (_, other_token) = sign_in(&app, "other@example.com");
    let listing = insert_sample(&app, owner, "Flat", "Bursa", 10.0);
    let uri = format!("/properties/{}", listing.id);
    let body = json!({ "title": "Renamed" });

    let (status, _) = call(&app, request("PUT", &uri, None, Some(&body)));
    assert_eq!(status, 401);

    let (status, _) = call(&app, request("PUT", "/properties/999", Some(&owner_token), Some(&body)));
    assert_eq!(status, 404);

    let (status, resp) = call(&app, request("PUT", &uri, Some(&other_token), Some(&body)));
    assert_eq!(status, 403);
    assert_eq!(resp["message"], "Not authorized to update this property");

    let (status, updated) = call(&app, request("PUT", &uri, Some(&owner_token), Some(&body)));
    assert_eq!(status, 200);
    assert_eq!(updated["title"], "Renamed");
}

#[test]
fn update_ignores_fields_outside_the_allow_list() {
    let (app, _) = test_app();
    let (owner, token) = sign_in(&app, "owner@example.com");
    let listing = insert_sample(&app, owner, "Flat", "Bursa", 10.0);
    let uri = format!("/properties/{}", listing.id);

    let body = json!({
        "price": 20.0,
        "views": 5000,
        "owner": { "_id": 42 },
        "yearBuilt": 1900,
        "amenities": ["elevator"]
    });
    let (status, updated) = call(&app, request("PUT", &uri, Some(&token), Some(&body)));

    assert_eq!(status, 200);
    assert_eq!(updated["price"], 20.0);
    assert_eq!(updated["views"], 0);
    assert_eq!(updated["owner"]["_id"], owner);
    assert!(updated.get("yearBuilt").is_none());
    assert_eq!(updated["amenities"], json!(["elevator"]));

    let (_, body) = get(&app, "/properties?amenities=elevator");
    assert_eq!(body["total"], 1);
}

#[test]
fn invalid_update_changes_nothing() {
    let (app, _) = test_app();
    let (owner, token) = sign_in(&app, "owner@example.com");
    let listing = insert_sample(&app, owner, "Flat", "Bursa", 10.0);
    let uri = format!("/properties/{}", listing.id);

    let (status, resp) = call(&app, request("PUT", &uri, Some(&token), Some(&json!({ "title": "  " }))));
    assert_eq!(status, 400);
    assert_eq!(resp["message"], "Error updating property");

    let stored = app.listings.find_by_id(listing.id).unwrap().unwrap();
    assert_eq!(stored.document.title, "Flat");
}

#[test]
fn update_replaces_images_and_releases_dropped_ones() {
    let (app, media) = test_app();
    let (owner, token) = sign_in(&app, "owner@example.com");

    let mut doc = sample_document("Flat", "Bursa", 10.0);
    let keep = media.upload(PNG_URI).unwrap();
    let stale = media.upload(PNG_URI).unwrap();
    doc.images = vec![keep.clone(), stale.clone()];
    let listing = insert_listing(&app, owner, doc);
    let uri = format!("/properties/{}", listing.id);

    let body = json!({ "images": [keep, "https://example.com/new.webp"] });
    let (status, updated) = call(&app, request("PUT", &uri, Some(&token), Some(&body)));

    assert_eq!(status, 200);
    let images: Vec<PropertyImage> = serde_json::from_value(updated["images"].clone()).unwrap();
    assert_eq!(images.len(), 2);
    assert_eq!(images[0], keep);
    assert!(media.contains(&keep.public_id));
    assert!(!media.contains(&stale.public_id));
    assert!(media.contains(&images[1].public_id));
}

#[test]
fn create_rejects_images_it_did_not_upload() {
    let (app, media) = test_app();
    let owner = create_user(&app.db, "owner@example.com", "Owner");
    let (intruder, token) = sign_in(&app, "intruder@example.com");

    let mut doc = sample_document("Flat", "Bursa", 10.0);
    let theirs = media.upload(PNG_URI).unwrap();
    doc.images = vec![theirs.clone()];
    insert_listing(&app, owner, doc);

    let body = new_listing_body(json!([theirs]));
    let (status, resp) = call(&app, request("POST", "/properties", Some(&token), Some(&body)));
    assert_eq!(status, 400);
    assert_eq!(resp["message"], "Error creating property");

    assert!(app.listings.find_by_owner(intruder).unwrap().is_empty());
    assert!(media.contains(&theirs.public_id));
}

#[test]
fn update_cannot_adopt_another_listings_image() {
    let (app, media) = test_app();
    let owner = create_user(&app.db, "owner@example.com", "Owner");
    let (intruder, token) = sign_in(&app, "intruder@example.com");

    let mut doc = sample_document("Flat", "Bursa", 10.0);
    let theirs = media.upload(PNG_URI).unwrap();
    doc.images = vec![theirs.clone()];
    insert_listing(&app, owner, doc);
    let mine = insert_sample(&app, intruder, "Mine", "Bursa", 20.0);
    let uri = format!("/properties/{}", mine.id);

    let body = json!({ "images": [theirs] });
    let (status, resp) = call(&app, request("PUT", &uri, Some(&token), Some(&body)));
    assert_eq!(status, 400);
    assert_eq!(resp["message"], "Error updating property");

    let stored = app.listings.find_by_id(mine.id).unwrap().unwrap();
    assert_eq!(stored.document.images, mine.document.images);

    // deleting the intruder's listing leaves the other image hosted
    let (status, _) = call(&app, request("DELETE", &uri, Some(&token), None));
    assert_eq!(status, 200);
    assert!(media.contains(&theirs.public_id));
}

#[test]
fn too_many_images_are_refused_before_uploading() {
    let (app, media) = test_app();
    let (user_id, token) = sign_in(&app, "seller@example.com");

    let urls: Vec<String> = (0..21).map(|i| format!("https://example.com/{i}.jpg")).collect();
    let body = new_listing_body(json!(urls));
    let (status, resp) = call(&app, request("POST", "/properties", Some(&token), Some(&body)));
    assert_eq!(status, 400);
    assert_eq!(resp["message"], "Error creating property");

    assert_eq!(media.upload_count(), 0);
    assert!(app.listings.find_by_owner(user_id).unwrap().is_empty());

    let body = new_listing_body(json!(urls[..20].to_vec()));
    let (status, created) = call(&app, request("POST", "/properties", Some(&token), Some(&body)));
    assert_eq!(status, 201);
    assert_eq!(created["images"].as_array().unwrap().len(), 20);
}

#[test]
fn delete_releases_media_even_when_the_host_fails() {
    let (app, media) = test_app();
    let (owner, token) = sign_in(&app, "owner@example.com");
    let (_, other_token) = sign_in(&app, "other@example.com");

    let mut doc = sample_document("Flat", "Bursa", 10.0);
    doc.images = vec![media.upload(PNG_URI).unwrap()];
    let listing = insert_listing(&app, owner, doc);
    let uri = format!("/properties/{}", listing.id);

    let (status, _) = call(&app, request("DELETE", &uri, Some(&other_token), None));
    assert_eq!(status, 403);

    media.fail_deletes(true);
    let (status, body) = call(&app, request("DELETE", &uri, Some(&token), None));
    assert_eq!(status, 200);
    assert_eq!(body["message"], "Property deleted successfully");

    let (status, _) = get(&app, &uri);
    assert_eq!(status, 404);
}

#[test]
fn similar_listings_and_listings_by_owner() {
    let (app, _) = test_app();
    let owner = create_user(&app.db, "owner@example.com", "Owner");
    let other = create_user(&app.db, "other@example.com", "Other");

    let base = insert_sample(&app, owner, "Base", "Antalya", 100.0);
    insert_sample(&app, owner, "Close", "Antalya", 115.0);
    insert_sample(&app, other, "Pricey", "Antalya", 200.0);
    insert_sample(&app, other, "Elsewhere", "Bursa", 100.0);

    let (status, body) = get(&app, &format!("/properties/{}/similar", base.id));
    assert_eq!(status, 200);
    let titles: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|l| l["title"].as_str().unwrap())
        .collect();
    assert_eq!(titles, vec!["Close"]);

    let (status, body) = get(&app, &format!("/properties/user/{owner}"));
    assert_eq!(status, 200);
    assert_eq!(body.as_array().unwrap().len(), 2);
}
