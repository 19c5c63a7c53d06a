use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

// --- Typed IDs ---

macro_rules! typed_id {
    ($name:ident) => {
        #[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq, Hash)]
        pub struct $name(pub String);

        impl $name {
            pub fn new(s: impl Into<String>) -> Self {
                Self(s.into())
            }
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

typed_id!(ListingId);
typed_id!(UserId);

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ListingType {
    Rent,
    Sale,
}

impl ListingType {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Rent => "rent",
            Self::Sale => "sale",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "rent" => Some(Self::Rent),
            "sale" => Some(Self::Sale),
            _ => None,
        }
    }
}

impl fmt::Display for ListingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum PropertyType {
    #[default]
    Apartment,
    House,
    Villa,
    Plot,
    Commercial,
}

impl PropertyType {
    pub const ALL: [Self; 5] = [
        Self::Apartment,
        Self::House,
        Self::Villa,
        Self::Plot,
        Self::Commercial,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Apartment => "apartment",
            Self::House => "house",
            Self::Villa => "villa",
            Self::Plot => "plot",
            Self::Commercial => "commercial",
        }
    }

    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.as_str() == s)
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Pricing keyed by the listing's `type` field. A sale carries a selling
/// price, a rental carries a rental price, never both.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Pricing {
    Sale {
        #[serde(rename = "sellingPrice")]
        selling_price: f64,
        #[serde(
            rename = "discountedPrice",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        discounted_price: Option<f64>,
    },
    Rent {
        #[serde(rename = "rentalPrice")]
        rental_price: f64,
    },
}

impl Pricing {
    #[must_use]
    pub const fn listing_type(&self) -> ListingType {
        match self {
            Self::Sale { .. } => ListingType::Sale,
            Self::Rent { .. } => ListingType::Rent,
        }
    }

    /// Price a buyer or tenant actually pays: the discount when one is set
    /// and positive, otherwise the selling or rental price.
    #[must_use]
    pub fn effective_price(&self) -> f64 {
        match *self {
            Self::Sale {
                discounted_price: Some(discounted),
                ..
            } if discounted > 0.0 => discounted,
            Self::Sale { selling_price, .. } => selling_price,
            Self::Rent { rental_price } => rental_price,
        }
    }

    /// The undiscounted selling price when a discount applies.
    #[must_use]
    pub fn struck_price(&self) -> Option<f64> {
        match *self {
            Self::Sale {
                selling_price,
                discounted_price: Some(discounted),
            } if discounted > 0.0 => Some(selling_price),
            _ => None,
        }
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HouseSpecifications {
    pub property_type: PropertyType,
    #[serde(default)]
    pub bedrooms: u32,
    #[serde(default)]
    pub bathrooms: u32,
    #[serde(default)]
    pub area: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ListingImage {
    pub url: String,
    pub public_id: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    #[serde(rename = "_id")]
    pub id: ListingId,
    pub title: String,
    pub description: String,
    pub location: String,
    #[serde(flatten)]
    pub pricing: Pricing,
    pub house_specifications: HouseSpecifications,
    #[serde(default)]
    pub images: Vec<ListingImage>,
    pub user_ref: UserId,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Listing {
    #[must_use]
    pub const fn listing_type(&self) -> ListingType {
        self.pricing.listing_type()
    }

    #[must_use]
    pub fn effective_price(&self) -> f64 {
        self.pricing.effective_price()
    }

    #[must_use]
    pub fn is_owned_by(&self, user_id: &UserId) -> bool {
        &self.user_ref == user_id
    }

    #[must_use]
    pub fn cover_image(&self) -> Option<&ListingImage> {
        self.images.first()
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: UserId,
    pub username: String,
    #[serde(default)]
    pub fullname: String,
    pub email: String,
    #[serde(default)]
    pub avatar: Option<String>,
}

impl User {
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.fullname.trim().is_empty() {
            &self.username
        } else {
            &self.fullname
        }
    }
}

/// The signed-in user, handed to whatever needs to act on their behalf.
/// The session cookie itself stays with the shell.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub user: User,
}

impl Session {
    #[must_use]
    pub const fn new(user: User) -> Self {
        Self { user }
    }

    #[must_use]
    pub fn user_id(&self) -> &UserId {
        &self.user.id
    }

    #[must_use]
    pub fn owns(&self, listing: &Listing) -> bool {
        listing.is_owned_by(&self.user.id)
    }
}


#[cfg(test)]
mod tests {
    use super::*;

    const SALE_JSON: &str = r#"{
        "_id": "65a1",
        "title": "Sea view flat",
        "description": "Two bedrooms near the promenade",
        "location": "Bandra, Mumbai",
        "type": "sale",
        "sellingPrice": 12500000,
        "discountedPrice": 11900000,
        "rentalPrice": null,
        "houseSpecifications": { "propertyType": "apartment", "bedrooms": 2, "bathrooms": 2, "area": 950 },
        "images": [{ "url": "https://media.example.com/a.jpg", "publicId": "listings/a" }],
        "userRef": "u1",
        "createdAt": "2024-03-01T10:00:00.000Z",
        "updatedAt": "2024-03-02T10:00:00.000Z",
        "__v": 0
    }"#;

    #[test]
    fn deserializes_sale_listing() {
        let listing: Listing = serde_json::from_str(SALE_JSON).unwrap();
        assert_eq!(listing.id.as_str(), "65a1");
        assert_eq!(listing.listing_type(), ListingType::Sale);
        assert_eq!(listing.effective_price(), 11_900_000.0);
        assert_eq!(listing.pricing.struck_price(), Some(12_500_000.0));
        assert_eq!(listing.images[0].public_id, "listings/a");
        assert_eq!(listing.house_specifications.property_type, PropertyType::Apartment);
    }

    #[test]
    fn deserializes_rent_listing() {
        let json = r#"{
            "_id": "r1", "title": "Studio", "description": "Compact", "location": "Pune",
            "type": "rent", "rentalPrice": 18000,
            "houseSpecifications": { "propertyType": "house", "bedrooms": 1, "bathrooms": 1, "area": 400 },
            "userRef": "u2",
            "createdAt": "2024-03-01T10:00:00Z", "updatedAt": "2024-03-01T10:00:00Z"
        }"#;
        let listing: Listing = serde_json::from_str(json).unwrap();
        assert_eq!(listing.listing_type(), ListingType::Rent);
        assert_eq!(listing.effective_price(), 18_000.0);
        assert!(listing.images.is_empty());
        assert!(listing.pricing.struck_price().is_none());
    }

    #[test]
    fn rejects_price_not_matching_type() {
        let json = SALE_JSON.replace("\"sellingPrice\": 12500000,", "");
        assert!(serde_json::from_str::<Listing>(&json).is_err());
    }

    #[test]
    fn zero_discount_is_ignored() {
        let pricing = Pricing::Sale {
            selling_price: 500.0,
            discounted_price: Some(0.0),
        };
        assert_eq!(pricing.effective_price(), 500.0);
        assert!(pricing.struck_price().is_none());
    }

    #[test]
    fn serializes_type_tag_flat() {
        let listing = fixtures::rent("x", "Goa", 900.0, 3);
        let value = serde_json::to_value(&listing).unwrap();
        assert_eq!(value["type"], "rent");
        assert_eq!(value["rentalPrice"], 900.0);
        assert!(value.get("sellingPrice").is_none());
        assert_eq!(value["_id"], "x");
    }

    #[test]
    fn session_ownership() {
        let session = Session::new(fixtures::user("owner-1"));
        let mut listing = fixtures::sale("a", "Mumbai", 10.0, None, 1);
        assert!(session.owns(&listing));
        listing.user_ref = UserId::new("someone-else");
        assert!(!session.owns(&listing));
    }

    #[test]
    fn parse_enums() {
        assert_eq!(PropertyType::parse("villa"), Some(PropertyType::Villa));
        assert_eq!(PropertyType::parse("castle"), None);
        assert_eq!(ListingType::parse("rent"), Some(ListingType::Rent));
        assert_eq!(ListingType::parse(""), None);
    }

    #[test]
    fn display_name_falls_back_to_username() {
        let mut user = fixtures::user("9");
        assert_eq!(user.display_name(), "Asha Rao");
        user.fullname = String::new();
        assert_eq!(user.display_name(), "user9");
    }
}
