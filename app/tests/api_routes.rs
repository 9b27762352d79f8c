mod support;

use axum::body::{to_bytes, Body};
use axum::http::{Method, Request, StatusCode};
use axum::Router;
use cinescope::api;
use cinescope::models::Media;
use cinescope::store::ViewState;
use serde_json::{json, Value};
use std::sync::Arc;
use support::{genre, movie, movies, store_with, FakeCatalog};
use tower::util::ServiceExt;

async fn app_with(catalog: FakeCatalog) -> Router {
    let (store, _) = store_with(Arc::new(catalog)).await;
    api::router(Arc::new(store))
}

fn request(method: Method, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .expect("failed to build request"),
        None => builder.body(Body::empty()).expect("failed to build request"),
    }
}

async fn send(app: &Router, req: Request<Body>) -> (StatusCode, Value) {
    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, value)
}

fn view(value: Value) -> ViewState {
    serde_json::from_value(value).expect("state snapshot")
}

fn genre_catalog() -> FakeCatalog {
    let mut catalog = FakeCatalog {
        movie_genres: vec![genre(28, "Action"), genre(878, "Science Fiction")],
        ..Default::default()
    };
    catalog.popular_movies.insert(1, movies(1, 20));
    catalog.movies_by_genre.insert((878, 1), movies(100, 20));
    catalog.movies_by_genre.insert((878, 2), movies(200, 15));
    catalog
}

#[tokio::test]
async fn health_and_empty_state() {
    let app = app_with(FakeCatalog::default()).await;

    let res = app
        .clone()
        .oneshot(request(Method::GET, "/api/health", None))
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let (status, body) = send(&app, request(Method::GET, "/api/state", None)).await;
    assert_eq!(status, StatusCode::OK);
    let state = view(body);
    assert!(state.movies.is_empty());
    assert!(!state.loading);
}

#[tokio::test]
async fn popular_movies_route_returns_snapshot() {
    let app = app_with(genre_catalog()).await;

    let (status, body) = send(&app, request(Method::POST, "/api/movies/popular", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["movies"][0]["title"], "Movie 1");
    let state = view(body);
    assert_eq!(state.movies.len(), 20);
    assert_eq!(state.item_details.map(|m| m.id()), Some(1));
}

#[tokio::test]
async fn page_zero_is_rejected() {
    let app = app_with(genre_catalog()).await;

    let (status, body) =
        send(&app, request(Method::POST, "/api/movies/popular?page=0", None)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "page must be at least 1");
}

#[tokio::test]
async fn genre_routes_resolve_names_and_scroll() {
    let app = app_with(genre_catalog()).await;

    let (status, _) = send(&app, request(Method::POST, "/api/movies/genre/878", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    send(&app, request(Method::POST, "/api/movies/genres", None)).await;

    let (status, body) = send(
        &app,
        request(Method::POST, "/api/movies/genre/science%20fiction", None),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let state = view(body);
    assert_eq!(state.filtered_movies.len(), 20);
    assert_eq!(state.selected_genre, Some(genre(878, "Science Fiction")));

    let (_, body) = send(&app, request(Method::POST, "/api/movies/genre/878/more", None)).await;
    assert_eq!(view(body).filtered_movies.len(), 35);

    // short page ended the listing
    let (_, body) = send(&app, request(Method::POST, "/api/movies/genre/878/more", None)).await;
    assert_eq!(view(body).filtered_movies.len(), 35);

    let (_, body) = send(
        &app,
        request(Method::PUT, "/api/genre", Some(json!({"genre": null}))),
    )
    .await;
    let state = view(body);
    assert_eq!(state.selected_genre, None);
    assert_eq!(state.filtered_movies, state.movies);
}

#[tokio::test]
async fn unknown_genre_is_not_found() {
    let app = app_with(genre_catalog()).await;
    send(&app, request(Method::POST, "/api/movies/genres", None)).await;

    let (status, body) =
        send(&app, request(Method::POST, "/api/movies/genre/western", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Genre not found");
}

#[tokio::test]
async fn failed_details_surface_in_error_field() {
    let mut catalog = genre_catalog();
    catalog.failing_details.insert(999);
    let app = app_with(catalog).await;

    let (status, body) =
        send(&app, request(Method::POST, "/api/movies/details/999", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["error"], "Failed to fetch movie details");
    assert_eq!(body["item_details"], Value::Null);

    let (_, body) = send(&app, request(Method::DELETE, "/api/error", None)).await;
    assert_eq!(body["error"], Value::Null);
}

#[tokio::test]
async fn search_route_updates_query_and_results() {
    let catalog = FakeCatalog {
        search_results: vec![Media::Movie(movie(11))],
        ..Default::default()
    };
    let app = app_with(catalog).await;

    let (_, body) = send(
        &app,
        request(Method::POST, "/api/search", Some(json!({"query": "star wars"}))),
    )
    .await;
    let state = view(body);
    assert_eq!(state.search_query, "star wars");
    assert_eq!(state.search_results.len(), 1);

    let (_, body) = send(
        &app,
        request(Method::POST, "/api/search", Some(json!({"query": ""}))),
    )
    .await;
    assert!(view(body).search_results.is_empty());
}

#[tokio::test]
async fn watchlist_and_favorites_routes() {
    let app = app_with(FakeCatalog::default()).await;
    let item = serde_json::to_value(Media::Movie(movie(42))).unwrap();

    let (status, body) = send(
        &app,
        request(Method::POST, "/api/watchlist", Some(item.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["watchlist"][0]["id"], 42);
    assert_eq!(body["favorites"], json!([]));

    let (_, body) = send(&app, request(Method::POST, "/api/favorites", Some(item))).await;
    assert_eq!(body["favorites"][0]["media_type"], "movie");

    let (_, body) = send(&app, request(Method::DELETE, "/api/watchlist/42", None)).await;
    assert_eq!(body["watchlist"], json!([]));
    assert_eq!(body["favorites"][0]["id"], 42);

    let (_, body) = send(&app, request(Method::DELETE, "/api/favorites/42", None)).await;
    assert_eq!(body["favorites"], json!([]));
}
