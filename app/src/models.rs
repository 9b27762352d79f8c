use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::tmdb::{image_url, ImageSize};

/// Number of results TMDB returns per list page.
pub const PAGE_SIZE: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MediaKind {
    #[serde(rename = "movie")]
    Movie,
    #[serde(rename = "tv")]
    Series,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Genre {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Video {
    pub id: String,
    pub key: String,
    pub name: String,
    pub site: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub official: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published_at: Option<String>,
}

impl Video {
    pub fn is_trailer(&self) -> bool {
        self.kind == "Trailer"
    }

    /// Embeddable player URL, only for videos hosted on YouTube.
    pub fn embed_url(&self) -> Option<String> {
        self.site
            .eq_ignore_ascii_case("youtube")
            .then(|| format!("https://www.youtube.com/embed/{}", self.key))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CastMember {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub character: String,
    #[serde(default)]
    pub profile_path: Option<String>,
}

/// Fields shared by movies and series.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MediaCommon {
    pub id: i64,
    #[serde(default)]
    pub poster_path: Option<String>,
    #[serde(default)]
    pub backdrop_path: Option<String>,
    #[serde(default)]
    pub overview: String,
    #[serde(default)]
    pub vote_average: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub genres: Option<Vec<Genre>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub videos: Option<Vec<Video>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cast: Option<Vec<CastMember>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub similar: Option<Vec<Media>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub popularity: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Movie {
    #[serde(flatten)]
    pub common: MediaCommon,
    pub title: String,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub runtime: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Series {
    #[serde(flatten)]
    pub common: MediaCommon,
    pub name: String,
    #[serde(default)]
    pub first_air_date: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number_of_seasons: Option<u32>,
}

/// A catalog item, tagged on the wire by `media_type`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "media_type")]
pub enum Media {
    #[serde(rename = "movie")]
    Movie(Movie),
    #[serde(rename = "tv")]
    Series(Series),
}

impl From<Movie> for Media {
    fn from(movie: Movie) -> Self {
        Media::Movie(movie)
    }
}

impl From<Series> for Media {
    fn from(series: Series) -> Self {
        Media::Series(series)
    }
}

impl Media {
    pub fn kind(&self) -> MediaKind {
        match self {
            Media::Movie(_) => MediaKind::Movie,
            Media::Series(_) => MediaKind::Series,
        }
    }

    pub fn common(&self) -> &MediaCommon {
        match self {
            Media::Movie(movie) => &movie.common,
            Media::Series(series) => &series.common,
        }
    }

    pub fn id(&self) -> i64 {
        self.common().id
    }

    pub fn title(&self) -> &str {
        match self {
            Media::Movie(movie) => &movie.title,
            Media::Series(series) => &series.name,
        }
    }

    /// Release date for movies, first-air date for series.
    pub fn date(&self) -> Option<&str> {
        match self {
            Media::Movie(movie) => movie.release_date.as_deref(),
            Media::Series(series) => series.first_air_date.as_deref(),
        }
    }

    pub fn year(&self) -> Option<i32> {
        self.parsed_date().map(|d| d.year())
    }

    /// Long-form date such as "January 5, 2024".
    pub fn formatted_date(&self) -> Option<String> {
        self.parsed_date()
            .map(|d| d.format("%B %-d, %Y").to_string())
    }

    fn parsed_date(&self) -> Option<NaiveDate> {
        self.date()
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
    }

    pub fn rating_label(&self) -> String {
        format!("{:.1}", self.common().vote_average)
    }

    pub fn lead_actor(&self) -> Option<&CastMember> {
        self.common().cast.as_ref().and_then(|cast| cast.first())
    }

    pub fn trailer(&self) -> Option<&Video> {
        self.common()
            .videos
            .as_ref()
            .and_then(|videos| videos.iter().find(|v| v.is_trailer()))
    }

    pub fn poster_url(&self, size: ImageSize) -> Option<String> {
        image_url(self.common().poster_path.as_deref(), size)
    }

    pub fn backdrop_url(&self, size: ImageSize) -> Option<String> {
        image_url(self.common().backdrop_path.as_deref(), size)
    }
}
