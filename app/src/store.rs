//! View state shared by every consumer, plus the operations that mutate it.
//!
//! All catalog fetches go through one coarse `loading`/`error` pair. Fetches
//! may overlap; whichever resolves last decides what those two fields show.
//! Results are applied when they arrive, even if nobody is waiting for them.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::Mutex as AsyncMutex;
use tracing::{debug, info, warn};

use crate::models::{Genre, Media, MediaKind, Movie, Series, PAGE_SIZE};
use crate::storage::BlobStorage;
use crate::tmdb::CatalogApi;

/// Storage key of the persisted watchlist/favorites blob.
pub const STORAGE_KEY: &str = "movie-storage";
const PERSIST_VERSION: u32 = 1;

/// Infinite-scroll position for a genre listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageCursor {
    pub genre_id: Option<i64>,
    pub next_page: u32,
    pub has_more: bool,
}

impl Default for PageCursor {
    fn default() -> Self {
        Self {
            genre_id: None,
            next_page: 1,
            has_more: true,
        }
    }
}

impl PageCursor {
    /// Page to request next for `genre_id`. A different genre starts over at
    /// page 1; an exhausted listing yields `None`.
    pub fn next_for(&self, genre_id: i64) -> Option<u32> {
        if self.genre_id != Some(genre_id) {
            return Some(1);
        }
        self.has_more.then_some(self.next_page)
    }

    pub fn record(&mut self, genre_id: i64, page: u32, fetched: usize) {
        self.genre_id = Some(genre_id);
        self.next_page = page.saturating_add(1);
        self.has_more = fetched >= PAGE_SIZE;
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub movies: Vec<Movie>,
    pub filtered_movies: Vec<Movie>,
    pub tv_series: Vec<Series>,
    pub filtered_tv_series: Vec<Series>,
    pub genres: Vec<Genre>,
    pub tv_genres: Vec<Genre>,
    pub item_details: Option<Media>,
    pub search_query: String,
    pub search_results: Vec<Media>,
    pub watchlist: Vec<Media>,
    pub favorites: Vec<Media>,
    pub selected_genre: Option<Genre>,
    pub movie_genre_cursor: PageCursor,
    pub series_genre_cursor: PageCursor,
    pub loading: bool,
    pub error: Option<String>,
}

impl ViewState {
    fn genres_of(&self, kind: MediaKind) -> &[Genre] {
        match kind {
            MediaKind::Movie => &self.genres,
            MediaKind::Series => &self.tv_genres,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct PersistedState {
    #[serde(default)]
    watchlist: Vec<Media>,
    #[serde(default)]
    favorites: Vec<Media>,
}

#[derive(Serialize)]
struct PersistedStateRef<'a> {
    version: u32,
    watchlist: &'a [Media],
    favorites: &'a [Media],
}

/// Insert by id. Returns false when an item with that id is already present,
/// whatever its kind.
fn insert_unique(items: &mut Vec<Media>, item: Media) -> bool {
    if items.iter().any(|m| m.id() == item.id()) {
        return false;
    }
    items.push(item);
    true
}

pub struct Store {
    catalog: Arc<dyn CatalogApi>,
    storage: Arc<dyn BlobStorage>,
    state: Mutex<ViewState>,
    // serializes snapshot + save so blobs reach storage in mutation order
    persist_lock: AsyncMutex<()>,
}

impl Store {
    /// Builds the store and restores the watchlist and favorites from
    /// storage. Everything else starts empty.
    pub async fn rehydrate(
        catalog: Arc<dyn CatalogApi>,
        storage: Arc<dyn BlobStorage>,
    ) -> anyhow::Result<Self> {
        let persisted = match storage.load(STORAGE_KEY).await? {
            Some(blob) => match serde_json::from_str::<PersistedState>(&blob) {
                Ok(persisted) => persisted,
                Err(err) => {
                    warn!("Ignoring unreadable {} blob: {}", STORAGE_KEY, err);
                    PersistedState::default()
                }
            },
            None => PersistedState::default(),
        };

        info!(
            "Restored {} watchlist items and {} favorites",
            persisted.watchlist.len(),
            persisted.favorites.len()
        );

        let state = ViewState {
            watchlist: persisted.watchlist,
            favorites: persisted.favorites,
            ..Default::default()
        };

        Ok(Self {
            catalog,
            storage,
            state: Mutex::new(state),
            persist_lock: AsyncMutex::new(()),
        })
    }

    fn state(&self) -> MutexGuard<'_, ViewState> {
        self.state
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Runs `f` under the lock. The guard never outlives the call, so no
    /// await point ever holds it.
    fn update<R>(&self, f: impl FnOnce(&mut ViewState) -> R) -> R {
        f(&mut *self.state())
    }

    pub fn snapshot(&self) -> ViewState {
        self.state().clone()
    }

    fn begin(&self) {
        self.update(|s| {
            s.loading = true;
            s.error = None;
        });
    }

    fn fail(&self, message: &str) {
        self.update(|s| {
            s.error = Some(message.to_string());
            s.loading = false;
        });
    }

    /// Popular movies replace both movie lists. Page 1 also loads the
    /// details of its first movie as the featured item.
    pub async fn load_popular_movies(&self, page: u32) {
        self.update(|s| {
            s.loading = true;
            s.error = None;
            s.selected_genre = None;
        });

        let movies = match self.catalog.list_popular_movies(page).await {
            Ok(movies) => movies,
            Err(err) => {
                warn!("load_popular_movies(page={}): {}", page, err);
                return self.fail("Failed to fetch movies");
            }
        };

        let featured = movies.first().filter(|_| page == 1).map(|m| m.common.id);
        self.update(|s| {
            s.filtered_movies = movies.clone();
            s.movies = movies;
        });

        if let Some(id) = featured {
            debug!("Loading featured movie {}", id);
            self.load_movie_details(id).await;
        }

        self.update(|s| s.loading = false);
    }

    pub async fn load_genres(&self) {
        self.begin();
        match self.catalog.list_movie_genres().await {
            Ok(genres) => self.update(|s| {
                s.genres = genres;
                s.loading = false;
            }),
            Err(err) => {
                warn!("load_genres: {}", err);
                self.fail("Failed to fetch genres");
            }
        }
    }

    pub async fn load_series_genres(&self) {
        self.begin();
        match self.catalog.list_series_genres().await {
            Ok(genres) => self.update(|s| {
                s.tv_genres = genres;
                s.loading = false;
            }),
            Err(err) => {
                warn!("load_series_genres: {}", err);
                self.fail("Failed to fetch TV genres");
            }
        }
    }

    /// Page 1 replaces `filtered_movies`, later pages append to it.
    /// `movies` always becomes the fetched page.
    pub async fn load_movies_by_genre(&self, genre_id: i64, page: u32) {
        self.begin();
        let movies = match self.catalog.list_movies_by_genre(genre_id, page).await {
            Ok(movies) => movies,
            Err(err) => {
                warn!("load_movies_by_genre(genre={}, page={}): {}", genre_id, page, err);
                return self.fail("Failed to fetch movies by genre");
            }
        };

        self.update(|s| {
            s.movie_genre_cursor.record(genre_id, page, movies.len());
            if page == 1 {
                s.filtered_movies = movies.clone();
            } else {
                s.filtered_movies.extend(movies.iter().cloned());
            }
            s.movies = movies;
            s.loading = false;
            s.selected_genre = s.genres.iter().find(|g| g.id == genre_id).cloned();
        });
    }

    /// Series counterpart of [`Store::load_movies_by_genre`]. `tv_series`
    /// is left alone.
    pub async fn load_series_by_genre(&self, genre_id: i64, page: u32) {
        self.begin();
        let series = match self.catalog.list_series_by_genre(genre_id, page).await {
            Ok(series) => series,
            Err(err) => {
                warn!("load_series_by_genre(genre={}, page={}): {}", genre_id, page, err);
                return self.fail("Failed to fetch TV series by genre");
            }
        };

        self.update(|s| {
            s.series_genre_cursor.record(genre_id, page, series.len());
            if page == 1 {
                s.filtered_tv_series = series;
            } else {
                s.filtered_tv_series.extend(series);
            }
            s.loading = false;
            s.selected_genre = s.tv_genres.iter().find(|g| g.id == genre_id).cloned();
        });
    }

    pub async fn load_popular_series(&self, page: u32) {
        self.begin();
        match self.catalog.list_popular_series(page).await {
            Ok(series) => self.update(|s| {
                s.tv_series = series;
                s.loading = false;
            }),
            Err(err) => {
                warn!("load_popular_series(page={}): {}", page, err);
                self.fail("Failed to fetch TV series");
            }
        }
    }

    pub async fn load_movie_details(&self, id: i64) {
        self.begin();
        match self.catalog.get_movie_details(id).await {
            Ok(movie) => self.update(|s| {
                s.item_details = Some(movie.into());
                s.loading = false;
            }),
            Err(err) => {
                warn!("load_movie_details({}): {}", id, err);
                self.fail("Failed to fetch movie details");
            }
        }
    }

    pub async fn load_series_details(&self, id: i64) {
        self.begin();
        match self.catalog.get_series_details(id).await {
            Ok(series) => self.update(|s| {
                s.item_details = Some(series.into());
                s.loading = false;
            }),
            Err(err) => {
                warn!("load_series_details({}): {}", id, err);
                self.fail("Failed to fetch TV details");
            }
        }
    }

    /// The query is visible immediately. A blank query clears the results
    /// without touching the catalog.
    pub async fn set_search_query(&self, query: &str) {
        self.update(|s| {
            s.search_query = query.to_string();
            s.error = None;
        });

        if query.trim().is_empty() {
            self.update(|s| {
                s.search_results.clear();
                s.loading = false;
            });
            return;
        }

        self.update(|s| s.loading = true);
        match self.catalog.search_all(query, 1).await {
            Ok(results) => self.update(|s| {
                s.search_results = results;
                s.loading = false;
            }),
            Err(err) => {
                warn!("set_search_query({:?}): {}", query, err);
                self.update(|s| s.search_results.clear());
                self.fail("Failed to search");
            }
        }
    }

    /// Clearing the genre restores `filtered_movies` from `movies`.
    pub fn set_selected_genre(&self, genre: Option<Genre>) {
        self.update(|s| {
            if genre.is_none() {
                s.filtered_movies = s.movies.clone();
            }
            s.selected_genre = genre;
        });
    }

    pub async fn add_to_watchlist(&self, item: Media) {
        let added = self.update(|s| {
            s.error = None;
            insert_unique(&mut s.watchlist, item)
        });
        debug!("add_to_watchlist: inserted={}", added);
        self.persist("Failed to add to watchlist").await;
    }

    pub async fn remove_from_watchlist(&self, id: i64) {
        self.update(|s| {
            s.error = None;
            s.watchlist.retain(|m| m.id() != id);
        });
        self.persist("Failed to remove from watchlist").await;
    }

    pub async fn add_to_favorites(&self, item: Media) {
        let added = self.update(|s| {
            s.error = None;
            insert_unique(&mut s.favorites, item)
        });
        debug!("add_to_favorites: inserted={}", added);
        self.persist("Failed to add to favorites").await;
    }

    pub async fn remove_from_favorites(&self, id: i64) {
        self.update(|s| {
            s.error = None;
            s.favorites.retain(|m| m.id() != id);
        });
        self.persist("Failed to remove from favorites").await;
    }

    pub fn clear_error(&self) {
        self.update(|s| s.error = None);
    }

    pub fn is_in_watchlist(&self, id: i64) -> bool {
        self.state().watchlist.iter().any(|m| m.id() == id)
    }

    pub fn is_favorite(&self, id: i64) -> bool {
        self.state().favorites.iter().any(|m| m.id() == id)
    }

    /// Looks a genre up in the already-loaded list for `kind`, by numeric id
    /// or case-insensitive name.
    pub fn find_genre(&self, kind: MediaKind, key: &str) -> Option<Genre> {
        let key = key.trim();
        let id = key.parse::<i64>().ok();
        self.state()
            .genres_of(kind)
            .iter()
            .find(|g| Some(g.id) == id || g.name.eq_ignore_ascii_case(key))
            .cloned()
    }

    /// Page to request next when scrolling the `kind` listing of `genre_id`.
    pub fn next_genre_page(&self, kind: MediaKind, genre_id: i64) -> Option<u32> {
        let state = self.state();
        let cursor = match kind {
            MediaKind::Movie => &state.movie_genre_cursor,
            MediaKind::Series => &state.series_genre_cursor,
        };
        cursor.next_for(genre_id)
    }

    /// Writes the whole persisted subset. A failed write keeps the in-memory
    /// change and reports `failure` through `error`.
    ///
    /// The snapshot is taken after acquiring `persist_lock`, so the last save
    /// to finish always carries the latest watchlist and favorites.
    async fn persist(&self, failure: &str) {
        let _ordered = self.persist_lock.lock().await;
        let blob = self.update(|s| {
            serde_json::to_string(&PersistedStateRef {
                version: PERSIST_VERSION,
                watchlist: &s.watchlist,
                favorites: &s.favorites,
            })
        });

        let result = match blob {
            Ok(blob) => self.storage.save(STORAGE_KEY, &blob).await,
            Err(err) => Err(err.into()),
        };

        if let Err(err) = result {
            warn!("Persisting {} failed: {:#}", STORAGE_KEY, err);
            self.update(|s| s.error = Some(failure.to_string()));
        }
    }
}
