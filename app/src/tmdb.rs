use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error};

use crate::error::{CatalogError, CatalogOperation};
use crate::models::{CastMember, Genre, Media, MediaCommon, MediaKind, Movie, Series, Video};

pub const TMDB_BASE_URL: &str = "https://api.themoviedb.org/3";
const TMDB_IMAGE_BASE: &str = "https://image.tmdb.org/t/p";
const TMDB_LANGUAGE: &str = "en-US";
const DETAIL_APPENDS: &str = "videos,credits,similar";
const CAST_EXCERPT_LEN: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageSize {
    /// Cards and posters.
    W500,
    /// Backdrops and the hero banner.
    Original,
}

impl ImageSize {
    fn token(&self) -> &'static str {
        match self {
            ImageSize::W500 => "w500",
            ImageSize::Original => "original",
        }
    }
}

pub fn image_url(path: Option<&str>, size: ImageSize) -> Option<String> {
    path.filter(|p| !p.is_empty())
        .map(|p| format!("{}/{}{}", TMDB_IMAGE_BASE, size.token(), p))
}

/// Typed queries against the remote catalog. Every result is already
/// normalized into [`Media`] shapes.
#[async_trait]
pub trait CatalogApi: Send + Sync {
    async fn list_popular_movies(&self, page: u32) -> Result<Vec<Movie>, CatalogError>;
    async fn list_movies_by_genre(&self, genre_id: i64, page: u32)
        -> Result<Vec<Movie>, CatalogError>;
    async fn list_movie_genres(&self) -> Result<Vec<Genre>, CatalogError>;
    async fn get_movie_details(&self, id: i64) -> Result<Movie, CatalogError>;
    async fn list_popular_series(&self, page: u32) -> Result<Vec<Series>, CatalogError>;
    async fn list_series_by_genre(&self, genre_id: i64, page: u32)
        -> Result<Vec<Series>, CatalogError>;
    async fn list_series_genres(&self) -> Result<Vec<Genre>, CatalogError>;
    async fn get_series_details(&self, id: i64) -> Result<Series, CatalogError>;
    async fn search_all(&self, query: &str, page: u32) -> Result<Vec<Media>, CatalogError>;
}

#[derive(Debug, Clone)]
pub struct TmdbClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl TmdbClient {
    pub fn with_options(
        api_key: &str,
        base_url: &str,
        timeout: Option<Duration>,
    ) -> anyhow::Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            api_key: api_key.to_string(),
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> anyhow::Result<T> {
        let url = format!("{}{}", self.base_url, path);

        debug!("GET {} {:?}", url, params);

        let response = self
            .client
            .get(&url)
            .query(&[("api_key", self.api_key.as_str()), ("language", TMDB_LANGUAGE)])
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(anyhow::anyhow!("TMDB API error {}: {}", status, error_text));
        }

        Ok(response.json().await?)
    }

    async fn fetch<T: DeserializeOwned>(
        &self,
        operation: CatalogOperation,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<T, CatalogError> {
        self.get_json(path, params).await.map_err(|err| {
            error!("TMDB {} failed: {:#}", operation.action(), err);
            CatalogError { operation }
        })
    }
}

fn paged(page: u32) -> Vec<(&'static str, String)> {
    vec![("page", page.to_string())]
}

fn discover(genre_id: i64, page: u32) -> Vec<(&'static str, String)> {
    vec![("page", page.to_string()), ("with_genres", genre_id.to_string())]
}

fn details() -> Vec<(&'static str, String)> {
    vec![("append_to_response", DETAIL_APPENDS.to_string())]
}

#[async_trait]
impl CatalogApi for TmdbClient {
    async fn list_popular_movies(&self, page: u32) -> Result<Vec<Movie>, CatalogError> {
        let list: ListResponse = self
            .fetch(CatalogOperation::PopularMovies, "/movie/popular", &paged(page))
            .await?;
        Ok(list.into_movies())
    }

    async fn list_movies_by_genre(
        &self,
        genre_id: i64,
        page: u32,
    ) -> Result<Vec<Movie>, CatalogError> {
        let list: ListResponse = self
            .fetch(
                CatalogOperation::MoviesByGenre,
                "/discover/movie",
                &discover(genre_id, page),
            )
            .await?;
        Ok(list.into_movies())
    }

    async fn list_movie_genres(&self) -> Result<Vec<Genre>, CatalogError> {
        let response: GenreResponse = self
            .fetch(CatalogOperation::MovieGenres, "/genre/movie/list", &[])
            .await?;
        Ok(response.genres)
    }

    async fn get_movie_details(&self, id: i64) -> Result<Movie, CatalogError> {
        let path = format!("/movie/{}", id);
        let detail: MovieDetail = self
            .fetch(CatalogOperation::MovieDetails, &path, &details())
            .await?;
        Ok(detail.into_movie())
    }

    async fn list_popular_series(&self, page: u32) -> Result<Vec<Series>, CatalogError> {
        let list: ListResponse = self
            .fetch(CatalogOperation::PopularSeries, "/tv/popular", &paged(page))
            .await?;
        Ok(list.into_series())
    }

    async fn list_series_by_genre(
        &self,
        genre_id: i64,
        page: u32,
    ) -> Result<Vec<Series>, CatalogError> {
        let list: ListResponse = self
            .fetch(
                CatalogOperation::SeriesByGenre,
                "/discover/tv",
                &discover(genre_id, page),
            )
            .await?;
        Ok(list.into_series())
    }

    async fn list_series_genres(&self) -> Result<Vec<Genre>, CatalogError> {
        let response: GenreResponse = self
            .fetch(CatalogOperation::SeriesGenres, "/genre/tv/list", &[])
            .await?;
        Ok(response.genres)
    }

    async fn get_series_details(&self, id: i64) -> Result<Series, CatalogError> {
        let path = format!("/tv/{}", id);
        let detail: TvShowDetail = self
            .fetch(CatalogOperation::SeriesDetails, &path, &details())
            .await?;
        Ok(detail.into_series())
    }

    async fn search_all(&self, query: &str, page: u32) -> Result<Vec<Media>, CatalogError> {
        debug!("Searching TMDB for: {}", query);

        let params = vec![
            ("query", query.to_string()),
            ("page", page.to_string()),
            ("include_adult", "false".to_string()),
        ];
        let list: ListResponse = self
            .fetch(CatalogOperation::Search, "/search/multi", &params)
            .await?;
        Ok(list.into_media())
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn cast_excerpt(credits: Option<Credits>) -> Option<Vec<CastMember>> {
    credits.map(|c| c.cast.into_iter().take(CAST_EXCERPT_LEN).collect())
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    results: Vec<SearchResult>,
}

impl ListResponse {
    fn into_movies(self) -> Vec<Movie> {
        self.results.into_iter().map(SearchResult::into_movie).collect()
    }

    fn into_series(self) -> Vec<Series> {
        self.results.into_iter().map(SearchResult::into_series).collect()
    }

    /// Mixed results: persons and adult titles are dropped.
    fn into_media(self) -> Vec<Media> {
        self.results
            .into_iter()
            .filter(|r| !r.adult)
            .filter_map(SearchResult::into_media)
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct GenreResponse {
    genres: Vec<Genre>,
}

#[derive(Debug, Clone, Deserialize)]
struct SearchResult {
    id: i64,
    #[serde(default)]
    adult: bool,
    #[serde(default)]
    media_type: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    poster_path: Option<String>,
    #[serde(default)]
    backdrop_path: Option<String>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    first_air_date: Option<String>,
    #[serde(default)]
    vote_average: f64,
    #[serde(default)]
    popularity: Option<f64>,
}

impl SearchResult {
    /// `None` for records that are neither movies nor series.
    fn kind(&self) -> Option<MediaKind> {
        match self.media_type.as_deref() {
            Some("movie") => Some(MediaKind::Movie),
            Some("tv") => Some(MediaKind::Series),
            Some("person") => None,
            _ if self.title.is_some() => Some(MediaKind::Movie),
            _ => Some(MediaKind::Series),
        }
    }

    fn into_media(self) -> Option<Media> {
        match self.kind()? {
            MediaKind::Movie => Some(self.into_movie().into()),
            MediaKind::Series => Some(self.into_series().into()),
        }
    }

    fn common(&self) -> MediaCommon {
        MediaCommon {
            id: self.id,
            poster_path: non_empty(self.poster_path.clone()),
            backdrop_path: non_empty(self.backdrop_path.clone()),
            overview: self.overview.clone().unwrap_or_default(),
            vote_average: self.vote_average,
            popularity: self.popularity,
            ..Default::default()
        }
    }

    fn into_movie(self) -> Movie {
        Movie {
            common: self.common(),
            title: self.title.or(self.name).unwrap_or_default(),
            release_date: non_empty(self.release_date),
            runtime: None,
        }
    }

    fn into_series(self) -> Series {
        Series {
            common: self.common(),
            name: self.name.or(self.title).unwrap_or_default(),
            first_air_date: non_empty(self.first_air_date),
            number_of_seasons: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Credits {
    #[serde(default)]
    cast: Vec<CastMember>,
}

#[derive(Debug, Deserialize)]
struct Videos {
    #[serde(default)]
    results: Vec<Video>,
}

#[derive(Debug, Deserialize)]
struct SimilarResults {
    #[serde(default)]
    results: Vec<SearchResult>,
}

#[derive(Debug, Deserialize)]
struct MovieDetail {
    id: i64,
    title: String,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    poster_path: Option<String>,
    #[serde(default)]
    backdrop_path: Option<String>,
    #[serde(default)]
    release_date: Option<String>,
    #[serde(default)]
    runtime: Option<u32>,
    #[serde(default)]
    vote_average: f64,
    #[serde(default)]
    popularity: Option<f64>,
    #[serde(default)]
    genres: Vec<Genre>,
    #[serde(default)]
    credits: Option<Credits>,
    #[serde(default)]
    videos: Option<Videos>,
    #[serde(default)]
    similar: Option<SimilarResults>,
}

impl MovieDetail {
    fn into_movie(self) -> Movie {
        let similar = self.similar.map(|s| {
            s.results
                .into_iter()
                .map(|r| Media::from(r.into_movie()))
                .collect()
        });

        Movie {
            common: MediaCommon {
                id: self.id,
                poster_path: non_empty(self.poster_path),
                backdrop_path: non_empty(self.backdrop_path),
                overview: self.overview.unwrap_or_default(),
                vote_average: self.vote_average,
                genres: Some(self.genres),
                videos: self.videos.map(|v| v.results),
                cast: cast_excerpt(self.credits),
                similar,
                popularity: self.popularity,
            },
            title: self.title,
            release_date: non_empty(self.release_date),
            runtime: self.runtime.filter(|&minutes| minutes > 0),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TvShowDetail {
    id: i64,
    name: String,
    #[serde(default)]
    overview: Option<String>,
    #[serde(default)]
    poster_path: Option<String>,
    #[serde(default)]
    backdrop_path: Option<String>,
    #[serde(default)]
    first_air_date: Option<String>,
    #[serde(default)]
    number_of_seasons: Option<u32>,
    #[serde(default)]
    vote_average: f64,
    #[serde(default)]
    popularity: Option<f64>,
    #[serde(default)]
    genres: Vec<Genre>,
    #[serde(default)]
    credits: Option<Credits>,
    #[serde(default)]
    videos: Option<Videos>,
    #[serde(default)]
    similar: Option<SimilarResults>,
}

impl TvShowDetail {
    fn into_series(self) -> Series {
        let similar = self.similar.map(|s| {
            s.results
                .into_iter()
                .map(|r| Media::from(r.into_series()))
                .collect()
        });

        Series {
            common: MediaCommon {
                id: self.id,
                poster_path: non_empty(self.poster_path),
                backdrop_path: non_empty(self.backdrop_path),
                overview: self.overview.unwrap_or_default(),
                vote_average: self.vote_average,
                genres: Some(self.genres),
                videos: self.videos.map(|v| v.results),
                cast: cast_excerpt(self.credits),
                similar,
                popularity: self.popularity,
            },
            name: self.name,
            first_air_date: non_empty(self.first_air_date),
            number_of_seasons: self.number_of_seasons,
        }
    }
}
