//! Search filter state and its URL query-string form.
//!
//! The URL is the source of truth for a shareable search. `to_query` only
//! writes fields that carry a value, and `from_query` reads them back, so a
//! reloaded URL reproduces the same `SearchFilters`.

use serde::{Deserialize, Serialize};
use url::form_urlencoded;

use crate::model::{ListingType, PropertyType};

pub const KEY_LOCATION: &str = "location";
pub const KEY_TYPE: &str = "type";
pub const KEY_MIN_PRICE: &str = "minPrice";
pub const KEY_MAX_PRICE: &str = "maxPrice";
pub const KEY_BEDROOMS: &str = "bedrooms";
pub const KEY_BATHROOMS: &str = "bathrooms";
pub const KEY_PROPERTY_TYPE: &str = "propertyType";
pub const KEY_MIN_AREA: &str = "minArea";
pub const KEY_MAX_AREA: &str = "maxArea";
pub const KEY_SORT_BY: &str = "sortBy";

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "kebab-case")]
pub enum SortBy {
    PriceAsc,
    PriceDesc,
    DateAsc,
    #[default]
    DateDesc,
}

impl SortBy {
    pub const ALL: [Self; 4] = [Self::PriceAsc, Self::PriceDesc, Self::DateAsc, Self::DateDesc];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PriceAsc => "price-asc",
            Self::PriceDesc => "price-desc",
            Self::DateAsc => "date-asc",
            Self::DateDesc => "date-desc",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|sort| sort.as_str() == s)
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SearchFilters {
    pub location: Option<String>,
    #[serde(rename = "type")]
    pub listing_type: Option<ListingType>,
    pub min_price: Option<f64>,
    pub max_price: Option<f64>,
    pub bedrooms: Option<u32>,
    pub bathrooms: Option<u32>,
    pub property_type: Option<PropertyType>,
    pub min_area: Option<f64>,
    pub max_area: Option<f64>,
    pub sort_by: SortBy,
}

/// The part of the filter state the server evaluates. Location is
/// refined locally and deliberately left out.
#[derive(Clone, Debug, PartialEq)]
pub struct ServerFilterKey {
    listing_type: Option<ListingType>,
    min_price: Option<f64>,
    max_price: Option<f64>,
    bedrooms: Option<u32>,
    bathrooms: Option<u32>,
    property_type: Option<PropertyType>,
    min_area: Option<f64>,
    max_area: Option<f64>,
    sort_by: SortBy,
}

/// One user interaction with the filter panel.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum FilterUpdate {
    Location(String),
    ListingType(Option<ListingType>),
    MinPrice(Option<f64>),
    MaxPrice(Option<f64>),
    Bedrooms(Option<u32>),
    Bathrooms(Option<u32>),
    PropertyType(Option<PropertyType>),
    MinArea(Option<f64>),
    MaxArea(Option<f64>),
    SortBy(SortBy),
}

impl SearchFilters {
    /// Empty location, no type, newest first.
    #[must_use]
    pub fn baseline() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn is_baseline(&self) -> bool {
        *self == Self::baseline()
    }

    #[must_use]
    pub fn location_text(&self) -> &str {
        self.location.as_deref().unwrap_or_default()
    }

    pub fn apply(&mut self, update: FilterUpdate) {
        match update {
            FilterUpdate::Location(text) => {
                self.location = Some(text).filter(|t| !t.is_empty());
            }
            FilterUpdate::ListingType(value) => self.listing_type = value,
            FilterUpdate::MinPrice(value) => self.min_price = value.filter(|v| is_amount(*v)),
            FilterUpdate::MaxPrice(value) => self.max_price = value.filter(|v| is_amount(*v)),
            FilterUpdate::Bedrooms(value) => self.bedrooms = value,
            FilterUpdate::Bathrooms(value) => self.bathrooms = value,
            FilterUpdate::PropertyType(value) => self.property_type = value,
            FilterUpdate::MinArea(value) => self.min_area = value.filter(|v| is_amount(*v)),
            FilterUpdate::MaxArea(value) => self.max_area = value.filter(|v| is_amount(*v)),
            FilterUpdate::SortBy(value) => self.sort_by = value,
        }
    }

    #[must_use]
    pub fn server_key(&self) -> ServerFilterKey {
        ServerFilterKey {
            listing_type: self.listing_type,
            min_price: self.min_price,
            max_price: self.max_price,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            property_type: self.property_type,
            min_area: self.min_area,
            max_area: self.max_area,
            sort_by: self.sort_by,
        }
    }

    /// Query string for the browser URL. The default sort is omitted, so the
    /// baseline encodes to an empty string.
    #[must_use]
    pub fn to_query(&self) -> String {
        let mut pairs = Vec::new();
        if let Some(location) = self.location.as_deref().filter(|l| !l.is_empty()) {
            pairs.push((KEY_LOCATION, location.to_string()));
        }
        self.push_server_pairs(&mut pairs);
        if self.sort_by != SortBy::default() {
            pairs.push((KEY_SORT_BY, self.sort_by.as_str().to_string()));
        }
        encode(&pairs)
    }

    /// Query string for `GET /listing/search`. Location only goes to the
    /// server on the first load of a deep link.
    #[must_use]
    pub fn server_query(&self, include_location: bool) -> String {
        let mut pairs = Vec::new();
        if include_location {
            if let Some(location) = self.location.as_deref().filter(|l| !l.is_empty()) {
                pairs.push((KEY_LOCATION, location.to_string()));
            }
        }
        self.push_server_pairs(&mut pairs);
        pairs.push((KEY_SORT_BY, self.sort_by.as_str().to_string()));
        encode(&pairs)
    }

    /// Reads filters back from a query string, with or without the leading
    /// `?`. Unknown keys, empty values and values that do not parse are
    /// skipped rather than rejected, since the URL is user-editable.
    #[must_use]
    pub fn from_query(query: &str) -> Self {
        let query = query.strip_prefix('?').unwrap_or(query);
        let mut filters = Self::baseline();

        for (key, value) in form_urlencoded::parse(query.as_bytes()) {
            if value.is_empty() {
                continue;
            }
            match key.as_ref() {
                KEY_LOCATION => filters.location = Some(value.into_owned()),
                KEY_TYPE => filters.listing_type = ListingType::parse(&value),
                KEY_MIN_PRICE => filters.min_price = parse_amount(&value),
                KEY_MAX_PRICE => filters.max_price = parse_amount(&value),
                KEY_BEDROOMS => filters.bedrooms = value.parse().ok(),
                KEY_BATHROOMS => filters.bathrooms = value.parse().ok(),
                KEY_PROPERTY_TYPE => filters.property_type = PropertyType::parse(&value),
                KEY_MIN_AREA => filters.min_area = parse_amount(&value),
                KEY_MAX_AREA => filters.max_area = parse_amount(&value),
                KEY_SORT_BY => filters.sort_by = SortBy::parse(&value).unwrap_or_default(),
                _ => {}
            }
        }

        filters
    }

    fn push_server_pairs(&self, pairs: &mut Vec<(&'static str, String)>) {
        if let Some(listing_type) = self.listing_type {
            pairs.push((KEY_TYPE, listing_type.as_str().to_string()));
        }
        if let Some(v) = self.min_price {
            pairs.push((KEY_MIN_PRICE, v.to_string()));
        }
        if let Some(v) = self.max_price {
            pairs.push((KEY_MAX_PRICE, v.to_string()));
        }
        if let Some(v) = self.bedrooms {
            pairs.push((KEY_BEDROOMS, v.to_string()));
        }
        if let Some(v) = self.bathrooms {
            pairs.push((KEY_BATHROOMS, v.to_string()));
        }
        if let Some(p) = self.property_type {
            pairs.push((KEY_PROPERTY_TYPE, p.as_str().to_string()));
        }
        if let Some(v) = self.min_area {
            pairs.push((KEY_MIN_AREA, v.to_string()));
        }
        if let Some(v) = self.max_area {
            pairs.push((KEY_MAX_AREA, v.to_string()));
        }
    }
}

/// Parses a free-text price box. Blank means "no bound"; anything that is
/// not a finite non-negative number is treated the same way.
#[must_use]
pub fn parse_amount(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| is_amount(*v))
}

fn is_amount(v: f64) -> bool {
    v.is_finite() && v >= 0.0
}

fn encode(pairs: &[(&str, String)]) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in pairs {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}
