use std::fmt;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;

#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PackageId(pub String);

impl fmt::Display for PackageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItineraryDay {
    pub day: u32,
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faq {
    pub question: String,
    pub answer: String,
}

/// A sellable trek or pilgrimage tour.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Package {
    #[serde(alias = "_id")]
    pub id: PackageId,
    #[serde(default)]
    pub slug: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Decimal,
    #[serde(default, deserialize_with = "duration_text")]
    pub duration: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub rating: Option<Decimal>,
    #[serde(default)]
    pub reviews: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub itinerary: Option<Vec<ItineraryDay>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inclusions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exclusions: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub highlights: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirements: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faqs: Option<Vec<Faq>>,
}

impl Package {
    /// Number of days parsed from the leading digits of `duration` ("5 Days", "12D/11N").
    pub fn duration_days(&self) -> Option<u32> {
        let digits: String =
            self.duration.trim().chars().take_while(|ch| ch.is_ascii_digit()).collect();
        digits.parse().ok()
    }

    /// Slug used for detail-page lookup, falling back to the id for records without one.
    pub fn lookup_key(&self) -> &str {
        if self.slug.trim().is_empty() {
            &self.id.0
        } else {
            &self.slug
        }
    }
}

fn duration_text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawDuration {
        Text(String),
        Days(u32),
    }

    Ok(match RawDuration::deserialize(deserializer)? {
        RawDuration::Text(text) => text,
        RawDuration::Days(days) => format!("{days} Days"),
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum DurationRange {
    #[serde(rename = "1-3")]
    UpToThree,
    #[serde(rename = "4-7")]
    FourToSeven,
    #[serde(rename = "8-14")]
    EightToFourteen,
    #[serde(rename = "15+")]
    FifteenPlus,
}

impl DurationRange {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::UpToThree => "1-3",
            Self::FourToSeven => "4-7",
            Self::EightToFourteen => "8-14",
            Self::FifteenPlus => "15+",
        }
    }

    pub fn contains(self, days: u32) -> bool {
        match self {
            Self::UpToThree => (1..=3).contains(&days),
            Self::FourToSeven => (4..=7).contains(&days),
            Self::EightToFourteen => (8..=14).contains(&days),
            Self::FifteenPlus => days >= 15,
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Featured,
    PriceAsc,
    PriceDesc,
    Rating,
    Duration,
}

impl SortOrder {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Featured => "featured",
            Self::PriceAsc => "price_asc",
            Self::PriceDesc => "price_desc",
            Self::Rating => "rating",
            Self::Duration => "duration",
        }
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum QueryParseError {
    #[error("unsupported duration range `{0}` (expected 1-3|4-7|8-14|15+)")]
    Duration(String),
    #[error("unsupported sort order `{0}` (expected featured|price_asc|price_desc|rating|duration)")]
    Sort(String),
}

impl FromStr for DurationRange {
    type Err = QueryParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim() {
            "1-3" => Ok(Self::UpToThree),
            "4-7" => Ok(Self::FourToSeven),
            "8-14" => Ok(Self::EightToFourteen),
            "15+" => Ok(Self::FifteenPlus),
            other => Err(QueryParseError::Duration(other.to_string())),
        }
    }
}

impl FromStr for SortOrder {
    type Err = QueryParseError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "featured" => Ok(Self::Featured),
            "price_asc" => Ok(Self::PriceAsc),
            "price_desc" => Ok(Self::PriceDesc),
            "rating" => Ok(Self::Rating),
            "duration" => Ok(Self::Duration),
            other => Err(QueryParseError::Sort(other.to_string())),
        }
    }
}

pub const DEFAULT_PAGE_SIZE: u32 = 9;

/// Listing filters, mirrored one-to-one onto `GET /packages` query parameters.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PackageQuery {
    pub search: Option<String>,
    pub category: Option<String>,
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    pub duration: Option<DurationRange>,
    pub sort: Option<SortOrder>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl PackageQuery {
    pub fn page(&self) -> u32 {
        self.page.unwrap_or(1).max(1)
    }

    pub fn limit(&self) -> u32 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).max(1)
    }

    pub fn to_query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(search) = self.search.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            pairs.push(("search", search.to_string()));
        }
        if let Some(category) = self.category.as_deref().map(str::trim).filter(|s| !s.is_empty())
        {
            pairs.push(("category", category.to_string()));
        }
        if let Some(price_min) = self.price_min {
            pairs.push(("price_min", price_min.to_string()));
        }
        if let Some(price_max) = self.price_max {
            pairs.push(("price_max", price_max.to_string()));
        }
        if let Some(duration) = self.duration {
            pairs.push(("duration", duration.as_str().to_string()));
        }
        if let Some(sort) = self.sort {
            pairs.push(("sort", sort.as_str().to_string()));
        }
        pairs.push(("page", self.page().to_string()));
        pairs.push(("limit", self.limit().to_string()));
        pairs
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub total_pages: u32,
    pub total_items: u64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub pagination: Pagination,
}
