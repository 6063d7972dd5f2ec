// src/tests/router_tests/favorite_tests.rs
use crate::tests::utils::{call, create_user, insert_sample, request, sign_in, test_app};

#[test]
fn toggle_flips_membership() {
    let (app, _) = test_app();
    let owner = create_user(&app.db, "owner@example.com", "Owner");
    let (fan, token) = sign_in(&app, "fan@example.com");
    let listing = insert_sample(&app, owner, "Flat", "Bursa", 10.0);
    let uri = format!("/properties/{}/favorite", listing.id);

    let (status, body) = call(&app, request("POST", &uri, Some(&token), None));
    assert_eq!(status, 200);
    assert_eq!(body["favorited"], true);
    assert_eq!(body["message"], "Favorite status updated");
    assert_eq!(app.listings.find_by_id(listing.id).unwrap().unwrap().favorites, vec![fan]);

    let (_, body) = call(&app, request("POST", &uri, Some(&token), None));
    assert_eq!(body["favorited"], false);
    assert!(app.listings.find_by_id(listing.id).unwrap().unwrap().favorites.is_empty());
}

#[test]
fn favorites_need_a_session_and_a_listing() {
    let (app, _) = test_app();
    let (_, token) = sign_in(&app, "fan@example.com");

    let (status, _) = call(&app, request("POST", "/properties/1/favorite", None, None));
    assert_eq!(status, 401);
    let (status, _) = call(&app, request("GET", "/users/favorites", None, None));
    assert_eq!(status, 401);

    let (status, _) = call(&app, request("POST", "/properties/77/favorite", Some(&token), None));
    assert_eq!(status, 404);
    let (status, _) = call(&app, request("POST", "/users/favorites/77", Some(&token), None));
    assert_eq!(status, 404);
}

#[test]
fn add_is_idempotent_and_shares_the_set_with_toggle() {
    let (app, _) = test_app();
    let owner = create_user(&app.db, "owner@example.com", "Owner");
    let (fan, token) = sign_in(&app, "fan@example.com");
    let first = insert_sample(&app, owner, "First", "Bursa", 10.0);
    let second = insert_sample(&app, owner, "Second", "Bursa", 20.0);

    let add = format!("/users/favorites/{}", first.id);
    let (status, body) = call(&app, request("POST", &add, Some(&token), None));
    assert_eq!(status, 200);
    assert_eq!(body["message"], "Property added to favorites");
    call(&app, request("POST", &add, Some(&token), None));

    let stored = app.listings.find_by_id(first.id).unwrap().unwrap();
    assert_eq!(stored.favorites, vec![fan]);

    let toggle = format!("/properties/{}/favorite", second.id);
    call(&app, request("POST", &toggle, Some(&token), None));

    let (status, body) = call(&app, request("GET", "/users/favorites", Some(&token), None));
    assert_eq!(status, 200);
    assert_eq!(body.as_array().unwrap().len(), 2);

    // toggling something added through /users removes it
    let toggle_first = format!("/properties/{}/favorite", first.id);
    let (_, body) = call(&app, request("POST", &toggle_first, Some(&token), None));
    assert_eq!(body["favorited"], false);
}

#[test]
fn remove_is_a_no_op_when_absent() {
    let (app, _) = test_app();
    let owner = create_user(&app.db, "owner@example.com", "Owner");
    let (_, token) = sign_in(&app, "fan@example.com");
    let listing = insert_sample(&app, owner, "Flat", "Bursa", 10.0);
    let uri = format!("/users/favorites/{}", listing.id);

    let (status, body) = call(&app, request("DELETE", &uri, Some(&token), None));
    assert_eq!(status, 200);
    assert_eq!(body["message"], "Property removed from favorites");

    call(&app, request("POST", &uri, Some(&token), None));
    call(&app, request("DELETE", &uri, Some(&token), None));

    let (_, body) = call(&app, request("GET", "/users/favorites", Some(&token), None));
    assert!(body.as_array().unwrap().is_empty());
}

#[test]
fn deleting_a_listing_drops_it_from_favorites() {
    let (app, _) = test_app();
    let (owner, owner_token) = sign_in(&app, "owner@example.com");
    let (_, fan_token) = sign_in(&app, "fan@example.com");
    let listing = insert_sample(&app, owner, "Flat", "Bursa", 10.0);

    let fav = format!("/users/favorites/{}", listing.id);
    call(&app, request("POST", &fav, Some(&fan_token), None));
    let del = format!("/properties/{}", listing.id);
    let (status, _) = call(&app, request("DELETE", &del, Some(&owner_token), None));
    assert_eq!(status, 200);

    let (_, body) = call(&app, request("GET", "/users/favorites", Some(&fan_token), None));
    assert!(body.as_array().unwrap().is_empty());
}
