#![allow(dead_code)]

use async_trait::async_trait;
use cinescope::error::{CatalogError, CatalogOperation};
use cinescope::models::{Genre, Media, MediaCommon, Movie, Series};
use cinescope::storage::{BlobStorage, MemoryStorage};
use cinescope::store::Store;
use cinescope::tmdb::CatalogApi;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn movie(id: i64) -> Movie {
    Movie {
        common: MediaCommon {
            id,
            overview: format!("Overview {}", id),
            vote_average: 7.0,
            ..Default::default()
        },
        title: format!("Movie {}", id),
        release_date: Some("2020-01-01".to_string()),
        runtime: None,
    }
}

pub fn series(id: i64) -> Series {
    Series {
        common: MediaCommon {
            id,
            ..Default::default()
        },
        name: format!("Series {}", id),
        first_air_date: Some("2019-05-01".to_string()),
        number_of_seasons: None,
    }
}

/// `count` consecutive movies starting at id `first`.
pub fn movies(first: i64, count: usize) -> Vec<Movie> {
    (0..count as i64).map(|i| movie(first + i)).collect()
}

pub fn series_page(first: i64, count: usize) -> Vec<Series> {
    (0..count as i64).map(|i| series(first + i)).collect()
}

pub fn genre(id: i64, name: &str) -> Genre {
    Genre {
        id,
        name: name.to_string(),
    }
}

/// In-memory catalog. Missing pages come back empty; ids listed in
/// `failing_details` and operations in `failing` error out.
#[derive(Default)]
pub struct FakeCatalog {
    pub popular_movies: HashMap<u32, Vec<Movie>>,
    pub movies_by_genre: HashMap<(i64, u32), Vec<Movie>>,
    pub movie_genres: Vec<Genre>,
    pub popular_series: HashMap<u32, Vec<Series>>,
    pub series_by_genre: HashMap<(i64, u32), Vec<Series>>,
    pub series_genres: Vec<Genre>,
    pub search_results: Vec<Media>,
    pub failing_details: HashSet<i64>,
    pub failing: Mutex<HashSet<&'static str>>,
    pub search_calls: AtomicUsize,
    pub detail_requests: Mutex<Vec<i64>>,
}

impl FakeCatalog {
    fn check(&self, name: &'static str, operation: CatalogOperation) -> Result<(), CatalogError> {
        if self.failing.lock().unwrap().contains(name) {
            return Err(CatalogError { operation });
        }
        Ok(())
    }

    /// Makes every later call of `name` fail.
    pub fn fail(&self, name: &'static str) {
        self.failing.lock().unwrap().insert(name);
    }

    pub fn searches(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl CatalogApi for FakeCatalog {
    async fn list_popular_movies(&self, page: u32) -> Result<Vec<Movie>, CatalogError> {
        self.check("popular_movies", CatalogOperation::PopularMovies)?;
        Ok(self.popular_movies.get(&page).cloned().unwrap_or_default())
    }

    async fn list_movies_by_genre(
        &self,
        genre_id: i64,
        page: u32,
    ) -> Result<Vec<Movie>, CatalogError> {
        self.check("movies_by_genre", CatalogOperation::MoviesByGenre)?;
        Ok(self
            .movies_by_genre
            .get(&(genre_id, page))
            .cloned()
            .unwrap_or_default())
    }

    async fn list_movie_genres(&self) -> Result<Vec<Genre>, CatalogError> {
        self.check("movie_genres", CatalogOperation::MovieGenres)?;
        Ok(self.movie_genres.clone())
    }

    async fn get_movie_details(&self, id: i64) -> Result<Movie, CatalogError> {
        self.detail_requests.lock().unwrap().push(id);
        if self.failing_details.contains(&id) {
            return Err(CatalogError {
                operation: CatalogOperation::MovieDetails,
            });
        }
        let mut detailed = movie(id);
        detailed.runtime = Some(120);
        detailed.common.genres = Some(vec![genre(28, "Action")]);
        Ok(detailed)
    }

    async fn list_popular_series(&self, page: u32) -> Result<Vec<Series>, CatalogError> {
        self.check("popular_series", CatalogOperation::PopularSeries)?;
        Ok(self.popular_series.get(&page).cloned().unwrap_or_default())
    }

    async fn list_series_by_genre(
        &self,
        genre_id: i64,
        page: u32,
    ) -> Result<Vec<Series>, CatalogError> {
        self.check("series_by_genre", CatalogOperation::SeriesByGenre)?;
        Ok(self
            .series_by_genre
            .get(&(genre_id, page))
            .cloned()
            .unwrap_or_default())
    }

    async fn list_series_genres(&self) -> Result<Vec<Genre>, CatalogError> {
        self.check("series_genres", CatalogOperation::SeriesGenres)?;
        Ok(self.series_genres.clone())
    }

    async fn get_series_details(&self, id: i64) -> Result<Series, CatalogError> {
        self.detail_requests.lock().unwrap().push(id);
        if self.failing_details.contains(&id) {
            return Err(CatalogError {
                operation: CatalogOperation::SeriesDetails,
            });
        }
        let mut detailed = series(id);
        detailed.number_of_seasons = Some(3);
        Ok(detailed)
    }

    async fn search_all(&self, _query: &str, _page: u32) -> Result<Vec<Media>, CatalogError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.check("search", CatalogOperation::Search)?;
        Ok(self.search_results.clone())
    }
}

pub async fn store_with(catalog: Arc<FakeCatalog>) -> (Store, Arc<MemoryStorage>) {
    let storage = Arc::new(MemoryStorage::new());
    let store = Store::rehydrate(catalog, storage.clone())
        .await
        .expect("rehydrate from empty storage");
    (store, storage)
}

/// Memory storage whose first save stalls for `delay` before landing.
pub struct SlowFirstSave {
    pub inner: MemoryStorage,
    delay: Duration,
    saves: AtomicUsize,
}

impl SlowFirstSave {
    pub fn new(delay: Duration) -> Self {
        Self {
            inner: MemoryStorage::new(),
            delay,
            saves: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl BlobStorage for SlowFirstSave {
    async fn load(&self, key: &str) -> anyhow::Result<Option<String>> {
        self.inner.load(key).await
    }

    async fn save(&self, key: &str, value: &str) -> anyhow::Result<()> {
        if self.saves.fetch_add(1, Ordering::SeqCst) == 0 {
            tokio::time::sleep(self.delay).await;
        }
        self.inner.save(key, value).await
    }
}

/// Storage that loads nothing and refuses every save.
pub struct BrokenStorage;

#[async_trait]
impl BlobStorage for BrokenStorage {
    async fn load(&self, _key: &str) -> anyhow::Result<Option<String>> {
        Ok(None)
    }

    async fn save(&self, _key: &str, _value: &str) -> anyhow::Result<()> {
        anyhow::bail!("disk full")
    }
}
