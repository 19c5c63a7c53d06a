//! Listing create/edit form state, validation and submission assembly.

use std::io::Cursor;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::filters::parse_amount;
use crate::model::{
    HouseSpecifications, Listing, ListingId, ListingImage, ListingType, Pricing, PropertyType,
};
use crate::multipart::MultipartForm;
use crate::{format_number, ErrorKind, MAX_IMAGE_BYTES, MAX_LISTING_IMAGES};

/// A file the user picked, as read by the shell.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SelectedFile {
    pub name: String,
    pub mime_type: String,
    #[serde(with = "serde_bytes")]
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ImageRejection {
    #[error("You can upload at most {max} images per listing")]
    TooMany { name: String, max: usize },

    #[error("{name} is larger than {max_mb} MB")]
    TooLarge {
        name: String,
        size: usize,
        max_mb: usize,
    },

    #[error("{name} is not an image file")]
    NotAnImage { name: String, mime_type: String },
}

impl ImageRejection {
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::TooMany { .. } => ErrorKind::TooManyImages,
            Self::TooLarge { .. } => ErrorKind::ImageTooLarge,
            Self::NotAnImage { .. } => ErrorKind::ImageFormatUnsupported,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageRules {
    pub max_images: usize,
    pub max_bytes: usize,
}

impl Default for ImageRules {
    fn default() -> Self {
        Self {
            max_images: MAX_LISTING_IMAGES,
            max_bytes: MAX_IMAGE_BYTES,
        }
    }
}

/// Checks one file against the count, size and type rules, in that order.
/// `already_queued` counts retained existing images plus accepted new ones.
pub fn validate_image(
    file: &SelectedFile,
    already_queued: usize,
    rules: &ImageRules,
) -> Result<(), ImageRejection> {
    if already_queued + 1 > rules.max_images {
        return Err(ImageRejection::TooMany {
            name: file.name.clone(),
            max: rules.max_images,
        });
    }

    if file.bytes.len() > rules.max_bytes {
        return Err(ImageRejection::TooLarge {
            name: file.name.clone(),
            size: file.bytes.len(),
            max_mb: rules.max_bytes / (1024 * 1024),
        });
    }

    if !file.mime_type.starts_with("image/") {
        return Err(ImageRejection::NotAnImage {
            name: file.name.clone(),
            mime_type: file.mime_type.clone(),
        });
    }

    Ok(())
}

/// An accepted file waiting to be uploaded.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PendingImage {
    pub id: String,
    pub file: SelectedFile,
    pub preview_url: String,
    pub dimensions: Option<(u32, u32)>,
}

impl PendingImage {
    #[must_use]
    pub fn new(file: SelectedFile) -> Self {
        let preview_url = data_url(&file.mime_type, &file.bytes);
        let dimensions = read_dimensions(&file.bytes);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            file,
            preview_url,
            dimensions,
        }
    }
}

#[must_use]
pub fn data_url(mime_type: &str, bytes: &[u8]) -> String {
    format!("data:{mime_type};base64,{}", STANDARD.encode(bytes))
}

/// Reads only the header. Formats the decoder does not know give `None`;
/// such files are still uploaded because only the MIME type is enforced.
#[must_use]
pub fn read_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    image::ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .ok()?
        .into_dimensions()
        .ok()
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(tag = "mode", rename_all = "camelCase")]
pub enum FormMode {
    Create,
    Edit {
        #[serde(rename = "listingId")]
        listing_id: ListingId,
    },
}

/// One edit to a text or select field.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "field", content = "value", rename_all = "camelCase")]
pub enum FormUpdate {
    Title(String),
    Description(String),
    Location(String),
    ListingType(ListingType),
    SellingPrice(String),
    DiscountedPrice(String),
    RentalPrice(String),
    PropertyType(PropertyType),
    Bedrooms(String),
    Bathrooms(String),
    Area(String),
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FormError {
    #[error("{0} is required")]
    Required(&'static str),

    #[error("Selling price must be a number greater than 0")]
    SellingPriceRequired,

    #[error("Rental price must be a number greater than 0")]
    RentalPriceRequired,

    #[error("Discounted price must be a number greater than 0")]
    DiscountNotPositive,

    #[error("Discounted price must be lower than the selling price")]
    DiscountNotBelowSelling,

    #[error("{0} must be a whole number of 0 or more")]
    InvalidCount(&'static str),

    #[error("{0} must be a number of 0 or more")]
    InvalidNumber(&'static str),
}

/// Field values after every rule passed.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedListing {
    pub title: String,
    pub description: String,
    pub location: String,
    pub pricing: Pricing,
    pub house_specifications: HouseSpecifications,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ListingForm {
    pub mode: FormMode,
    pub title: String,
    pub description: String,
    pub location: String,
    pub listing_type: ListingType,
    pub selling_price: String,
    pub discounted_price: String,
    pub rental_price: String,
    pub property_type: PropertyType,
    pub bedrooms: String,
    pub bathrooms: String,
    pub area: String,
    pub existing_images: Vec<ListingImage>,
    pub removed_images: Vec<ListingImage>,
    pub pending_images: Vec<PendingImage>,
    pub errors: Vec<FormError>,
    pub image_errors: Vec<ImageRejection>,
    pub submitting: bool,
    pub loading: bool,
}

impl ListingForm {
    #[must_use]
    pub fn create() -> Self {
        Self::blank(FormMode::Create)
    }

    /// Edit form whose listing is still being fetched.
    #[must_use]
    pub fn loading(listing_id: ListingId) -> Self {
        Self {
            loading: true,
            ..Self::blank(FormMode::Edit { listing_id })
        }
    }

    fn blank(mode: FormMode) -> Self {
        Self {
            mode,
            title: String::new(),
            description: String::new(),
            location: String::new(),
            listing_type: ListingType::Sale,
            selling_price: String::new(),
            discounted_price: String::new(),
            rental_price: String::new(),
            property_type: PropertyType::default(),
            bedrooms: String::new(),
            bathrooms: String::new(),
            area: String::new(),
            existing_images: Vec::new(),
            removed_images: Vec::new(),
            pending_images: Vec::new(),
            errors: Vec::new(),
            image_errors: Vec::new(),
            submitting: false,
            loading: false,
        }
    }

    /// Edit form pre-populated from the stored listing.
    #[must_use]
    pub fn from_listing(listing: &Listing) -> Self {
        let mut form = Self::blank(FormMode::Edit {
            listing_id: listing.id.clone(),
        });
        form.title.clone_from(&listing.title);
        form.description.clone_from(&listing.description);
        form.location.clone_from(&listing.location);
        form.listing_type = listing.listing_type();
        match listing.pricing {
            Pricing::Sale {
                selling_price,
                discounted_price,
            } => {
                form.selling_price = format_number(selling_price);
                form.discounted_price = discounted_price
                    .filter(|d| *d > 0.0)
                    .map(format_number)
                    .unwrap_or_default();
            }
            Pricing::Rent { rental_price } => {
                form.rental_price = format_number(rental_price);
            }
        }
        let specs = &listing.house_specifications;
        form.property_type = specs.property_type;
        form.bedrooms = specs.bedrooms.to_string();
        form.bathrooms = specs.bathrooms.to_string();
        form.area = format_number(specs.area);
        form.existing_images.clone_from(&listing.images);
        form
    }

    #[must_use]
    pub fn listing_id(&self) -> Option<&ListingId> {
        match &self.mode {
            FormMode::Create => None,
            FormMode::Edit { listing_id } => Some(listing_id),
        }
    }

    #[must_use]
    pub const fn is_edit(&self) -> bool {
        matches!(self.mode, FormMode::Edit { .. })
    }

    pub fn apply(&mut self, update: FormUpdate) {
        match update {
            FormUpdate::Title(v) => self.title = v,
            FormUpdate::Description(v) => self.description = v,
            FormUpdate::Location(v) => self.location = v,
            FormUpdate::ListingType(v) => self.listing_type = v,
            FormUpdate::SellingPrice(v) => self.selling_price = v,
            FormUpdate::DiscountedPrice(v) => self.discounted_price = v,
            FormUpdate::RentalPrice(v) => self.rental_price = v,
            FormUpdate::PropertyType(v) => self.property_type = v,
            FormUpdate::Bedrooms(v) => self.bedrooms = v,
            FormUpdate::Bathrooms(v) => self.bathrooms = v,
            FormUpdate::Area(v) => self.area = v,
        }
    }

    /// Retained existing images plus queued new ones.
    #[must_use]
    pub fn image_count(&self) -> usize {
        self.existing_images.len() + self.pending_images.len()
    }

    /// Queues every acceptable file and returns the rejections in pick order.
    pub fn add_images(
        &mut self,
        files: Vec<SelectedFile>,
        rules: &ImageRules,
    ) -> Vec<ImageRejection> {
        let mut rejections = Vec::new();
        for file in files {
            match validate_image(&file, self.image_count(), rules) {
                Ok(()) => {
                    debug!(name = %file.name, size = file.bytes.len(), "image queued");
                    self.pending_images.push(PendingImage::new(file));
                }
                Err(rejection) => {
                    warn!(error = %rejection, "image rejected");
                    rejections.push(rejection);
                }
            }
        }
        self.image_errors.clone_from(&rejections);
        rejections
    }

    pub fn remove_pending(&mut self, id: &str) -> bool {
        let before = self.pending_images.len();
        self.pending_images.retain(|p| p.id != id);
        before != self.pending_images.len()
    }

    /// Moves an existing image to the removed set so the submission can
    /// ask the server to delete it.
    pub fn remove_existing(&mut self, public_id: &str) -> bool {
        match self
            .existing_images
            .iter()
            .position(|img| img.public_id == public_id)
        {
            Some(index) => {
                let image = self.existing_images.remove(index);
                self.removed_images.push(image);
                true
            }
            None => false,
        }
    }

    pub fn validate(&self) -> Result<ValidatedListing, Vec<FormError>> {
        let mut errors = Vec::new();

        let title = required(&self.title, "Title", &mut errors);
        let description = required(&self.description, "Description", &mut errors);
        let location = required(&self.location, "Location", &mut errors);

        let pricing = match self.listing_type {
            ListingType::Sale => self.sale_pricing(&mut errors),
            ListingType::Rent => match positive(&self.rental_price) {
                Some(rental_price) => Some(Pricing::Rent { rental_price }),
                None => {
                    errors.push(FormError::RentalPriceRequired);
                    None
                }
            },
        };

        let bedrooms = count(&self.bedrooms, "Bedrooms", &mut errors);
        let bathrooms = count(&self.bathrooms, "Bathrooms", &mut errors);
        let area = if self.area.trim().is_empty() {
            Some(0.0)
        } else {
            parse_amount(&self.area).or_else(|| {
                errors.push(FormError::InvalidNumber("Area"));
                None
            })
        };

        match (pricing, bedrooms, bathrooms, area) {
            (Some(pricing), Some(bedrooms), Some(bathrooms), Some(area)) if errors.is_empty() => {
                Ok(ValidatedListing {
                    title,
                    description,
                    location,
                    pricing,
                    house_specifications: HouseSpecifications {
                        property_type: self.property_type,
                        bedrooms,
                        bathrooms,
                        area,
                    },
                })
            }
            _ => Err(errors),
        }
    }

    fn sale_pricing(&self, errors: &mut Vec<FormError>) -> Option<Pricing> {
        let Some(selling_price) = positive(&self.selling_price) else {
            errors.push(FormError::SellingPriceRequired);
            return None;
        };

        if self.discounted_price.trim().is_empty() {
            return Some(Pricing::Sale {
                selling_price,
                discounted_price: None,
            });
        }

        match positive(&self.discounted_price) {
            None => {
                errors.push(FormError::DiscountNotPositive);
                None
            }
            Some(discounted) if discounted >= selling_price => {
                errors.push(FormError::DiscountNotBelowSelling);
                None
            }
            Some(discounted) => Some(Pricing::Sale {
                selling_price,
                discounted_price: Some(discounted),
            }),
        }
    }

    /// One multipart body for create or update. Only new files are
    /// attached; edits also list retained and removed image ids.
    pub fn build_submission(
        &self,
        validated: &ValidatedListing,
    ) -> Result<MultipartForm, serde_json::Error> {
        let mut form = MultipartForm::new()
            .text("title", validated.title.as_str())
            .text("description", validated.description.as_str())
            .text("location", validated.location.as_str())
            .text("type", validated.pricing.listing_type().as_str());

        form = match validated.pricing {
            Pricing::Sale {
                selling_price,
                discounted_price,
            } => {
                let form = form.text("sellingPrice", format_number(selling_price));
                match discounted_price {
                    Some(discounted) => form.text("discountedPrice", format_number(discounted)),
                    None => form,
                }
            }
            Pricing::Rent { rental_price } => {
                form.text("rentalPrice", format_number(rental_price))
            }
        };

        form = form.json("houseSpecifications", &validated.house_specifications)?;

        if self.is_edit() {
            let retained: Vec<&str> = self
                .existing_images
                .iter()
                .map(|img| img.public_id.as_str())
                .collect();
            let deleted: Vec<&str> = self
                .removed_images
                .iter()
                .map(|img| img.public_id.as_str())
                .collect();
            form = form
                .json("existingImages", &retained)?
                .json("deletedImages", &deleted)?;
        }

        for pending in &self.pending_images {
            form = form.file(
                "images",
                pending.file.name.as_str(),
                pending.file.mime_type.as_str(),
                pending.file.bytes.clone(),
            );
        }

        Ok(form)
    }
}

fn required(value: &str, field: &'static str, errors: &mut Vec<FormError>) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.push(FormError::Required(field));
    }
    trimmed.to_string()
}

fn positive(text: &str) -> Option<f64> {
    parse_amount(text).filter(|v| *v > 0.0)
}

fn count(text: &str, field: &'static str, errors: &mut Vec<FormError>) -> Option<u32> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Some(0);
    }
    trimmed.parse::<u32>().ok().or_else(|| {
        errors.push(FormError::InvalidCount(field));
        None
    })
}
