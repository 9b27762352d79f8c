use axum::{
    extract::{Path, Query, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    error::AppError,
    models::{Genre, Media, MediaKind},
    store::{Store, ViewState},
};

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<Store>,
}

/// The full HTTP surface: store routes under `/api`.
pub fn router(store: Arc<Store>) -> Router {
    let state = AppState { store };

    Router::new()
        .nest("/api", routes(state.clone()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/state", get(get_state))
        .route("/movies/popular", post(load_popular_movies))
        .route("/movies/genres", post(load_genres))
        .route("/movies/genre/:genre", post(load_movies_by_genre))
        .route("/movies/genre/:genre/more", post(load_more_movies_by_genre))
        .route("/movies/details/:id", post(load_movie_details))
        .route("/tv/popular", post(load_popular_series))
        .route("/tv/genres", post(load_series_genres))
        .route("/tv/genre/:genre", post(load_series_by_genre))
        .route("/tv/genre/:genre/more", post(load_more_series_by_genre))
        .route("/tv/details/:id", post(load_series_details))
        .route("/search", post(search))
        .route("/genre", put(set_selected_genre))
        .route("/watchlist", post(add_to_watchlist))
        .route("/watchlist/:id", delete(remove_from_watchlist))
        .route("/favorites", post(add_to_favorites))
        .route("/favorites/:id", delete(remove_from_favorites))
        .route("/error", delete(clear_error))
        .with_state(state)
}

type StateResponse = Result<Json<ViewState>, AppError>;

#[derive(Deserialize)]
struct PageQuery {
    #[serde(default = "default_page")]
    page: u32,
}

fn default_page() -> u32 {
    1
}

impl PageQuery {
    fn validated(&self) -> Result<u32, AppError> {
        if self.page == 0 {
            return Err(AppError::BadRequest("page must be at least 1".to_string()));
        }
        Ok(self.page)
    }
}

#[derive(Deserialize)]
struct SearchRequest {
    query: String,
}

#[derive(Deserialize)]
struct SelectGenreRequest {
    genre: Option<Genre>,
}

fn snapshot(state: &AppState) -> StateResponse {
    Ok(Json(state.store.snapshot()))
}

fn resolve_genre(state: &AppState, kind: MediaKind, key: &str) -> Result<Genre, AppError> {
    state
        .store
        .find_genre(kind, key)
        .ok_or_else(|| AppError::GenreNotFound(key.to_string()))
}

async fn health() -> &'static str {
    "OK"
}

async fn get_state(State(state): State<AppState>) -> StateResponse {
    snapshot(&state)
}

async fn load_popular_movies(
    State(state): State<AppState>,
    Query(params): Query<PageQuery>,
) -> StateResponse {
    let page = params.validated()?;
    state.store.load_popular_movies(page).await;
    snapshot(&state)
}

async fn load_genres(State(state): State<AppState>) -> StateResponse {
    state.store.load_genres().await;
    snapshot(&state)
}

async fn load_movies_by_genre(
    State(state): State<AppState>,
    Path(genre): Path<String>,
    Query(params): Query<PageQuery>,
) -> StateResponse {
    let page = params.validated()?;
    let genre = resolve_genre(&state, MediaKind::Movie, &genre)?;
    state.store.load_movies_by_genre(genre.id, page).await;
    snapshot(&state)
}

async fn load_more_movies_by_genre(
    State(state): State<AppState>,
    Path(genre): Path<String>,
) -> StateResponse {
    let genre = resolve_genre(&state, MediaKind::Movie, &genre)?;
    if let Some(page) = state.store.next_genre_page(MediaKind::Movie, genre.id) {
        state.store.load_movies_by_genre(genre.id, page).await;
    }
    snapshot(&state)
}

async fn load_movie_details(State(state): State<AppState>, Path(id): Path<i64>) -> StateResponse {
    state.store.load_movie_details(id).await;
    snapshot(&state)
}

async fn load_popular_series(
    State(state): State<AppState>,
    Query(params): Query<PageQuery>,
) -> StateResponse {
    let page = params.validated()?;
    state.store.load_popular_series(page).await;
    snapshot(&state)
}

async fn load_series_genres(State(state): State<AppState>) -> StateResponse {
    state.store.load_series_genres().await;
    snapshot(&state)
}

async fn load_series_by_genre(
    State(state): State<AppState>,
    Path(genre): Path<String>,
    Query(params): Query<PageQuery>,
) -> StateResponse {
    let page = params.validated()?;
    let genre = resolve_genre(&state, MediaKind::Series, &genre)?;
    state.store.load_series_by_genre(genre.id, page).await;
    snapshot(&state)
}

async fn load_more_series_by_genre(
    State(state): State<AppState>,
    Path(genre): Path<String>,
) -> StateResponse {
    let genre = resolve_genre(&state, MediaKind::Series, &genre)?;
    if let Some(page) = state.store.next_genre_page(MediaKind::Series, genre.id) {
        state.store.load_series_by_genre(genre.id, page).await;
    }
    snapshot(&state)
}

async fn load_series_details(State(state): State<AppState>, Path(id): Path<i64>) -> StateResponse {
    state.store.load_series_details(id).await;
    snapshot(&state)
}

async fn search(
    State(state): State<AppState>,
    Json(request): Json<SearchRequest>,
) -> StateResponse {
    state.store.set_search_query(&request.query).await;
    snapshot(&state)
}

async fn set_selected_genre(
    State(state): State<AppState>,
    Json(request): Json<SelectGenreRequest>,
) -> StateResponse {
    state.store.set_selected_genre(request.genre);
    snapshot(&state)
}

async fn add_to_watchlist(State(state): State<AppState>, Json(item): Json<Media>) -> StateResponse {
    state.store.add_to_watchlist(item).await;
    snapshot(&state)
}

async fn remove_from_watchlist(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> StateResponse {
    state.store.remove_from_watchlist(id).await;
    snapshot(&state)
}

async fn add_to_favorites(State(state): State<AppState>, Json(item): Json<Media>) -> StateResponse {
    state.store.add_to_favorites(item).await;
    snapshot(&state)
}

async fn remove_from_favorites(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> StateResponse {
    state.store.remove_from_favorites(id).await;
    snapshot(&state)
}

async fn clear_error(State(state): State<AppState>) -> StateResponse {
    state.store.clear_error();
    snapshot(&state)
}
