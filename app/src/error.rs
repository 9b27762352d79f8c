use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// The catalog calls the client knows how to make.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogOperation {
    PopularMovies,
    MoviesByGenre,
    MovieGenres,
    MovieDetails,
    PopularSeries,
    SeriesByGenre,
    SeriesGenres,
    SeriesDetails,
    Search,
}

impl CatalogOperation {
    pub fn action(&self) -> &'static str {
        match self {
            CatalogOperation::PopularMovies => "fetch movies",
            CatalogOperation::MoviesByGenre => "fetch movies by genre",
            CatalogOperation::MovieGenres => "fetch genres",
            CatalogOperation::MovieDetails => "fetch movie details",
            CatalogOperation::PopularSeries => "fetch TV series",
            CatalogOperation::SeriesByGenre => "fetch TV series by genre",
            CatalogOperation::SeriesGenres => "fetch TV genres",
            CatalogOperation::SeriesDetails => "fetch TV details",
            CatalogOperation::Search => "search media",
        }
    }
}

/// Opaque failure of a catalog call. The transport or upstream cause is
/// logged where it happens and not carried further.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Failed to {}", .operation.action())]
pub struct CatalogError {
    pub operation: CatalogOperation,
}

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Genre not found: {0}")]
    GenreNotFound(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message): (StatusCode, String) = match &self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            AppError::GenreNotFound(_) => (StatusCode::NOT_FOUND, "Genre not found".to_string()),
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}
