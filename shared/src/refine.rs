//! Narrows and orders an already fetched result set without a round trip.

use std::cmp::Ordering;

use crate::filters::SortBy;
use crate::model::Listing;

/// Case-insensitive substring match on the listing's location. An empty
/// needle matches everything.
#[must_use]
pub fn matches_location(listing: &Listing, needle: &str) -> bool {
    needle.is_empty() || listing.location.to_lowercase().contains(&needle.to_lowercase())
}

#[must_use]
pub fn compare(a: &Listing, b: &Listing, sort: SortBy) -> Ordering {
    match sort {
        SortBy::PriceAsc => a.effective_price().total_cmp(&b.effective_price()),
        SortBy::PriceDesc => b.effective_price().total_cmp(&a.effective_price()),
        SortBy::DateAsc => a.created_at.cmp(&b.created_at),
        SortBy::DateDesc => b.created_at.cmp(&a.created_at),
    }
}

/// Stable: listings with equal keys keep their fetched order.
pub fn sort_listings(listings: &mut [Listing], sort: SortBy) {
    listings.sort_by(|a, b| compare(a, b, sort));
}

#[must_use]
pub fn refine(listings: &[Listing], location: &str, sort: SortBy) -> Vec<Listing> {
    let mut refined: Vec<Listing> = listings
        .iter()
        .filter(|l| matches_location(l, location))
        .cloned()
        .collect();
    sort_listings(&mut refined, sort);
    refined
}
