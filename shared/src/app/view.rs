//! Render-ready projection of the model. Everything here is plain data the
//! shell can draw without further logic.

use serde::{Deserialize, Serialize};

use crate::filters::{SearchFilters, SortBy};
use crate::form::ListingForm;
use crate::model::{Listing, ListingType, PropertyType, User};
use crate::refine::refine;
use crate::{
    description_preview, format_price, format_time_ago, FetchState, Model, Page, ToastKind,
    DESCRIPTION_PREVIEW_LENGTH,
};

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ViewModel {
    pub page: PageView,
    pub user: Option<UserView>,
    pub toast: Option<ToastView>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PageView {
    Search(SearchView),
    Listing(ListingDetailView),
    ListingForm(FormView),
    Profile(ProfileView),
    SignIn { pending: bool },
    SignUp { pending: bool },
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct SearchView {
    pub filters: SearchFilters,
    pub min_price_input: String,
    pub max_price_input: String,
    pub sort_options: Vec<SortBy>,
    pub property_types: Vec<PropertyType>,
    pub listings: Vec<ListingCard>,
    /// No results yet; cover the page.
    pub blocking_loader: bool,
    /// Results shown but stale while the next set loads.
    pub dimmed: bool,
    pub can_clear: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ListingCard {
    pub id: String,
    pub title: String,
    pub location: String,
    pub description_preview: String,
    pub cover_image_url: Option<String>,
    pub listing_type: ListingType,
    pub price_text: String,
    pub struck_price_text: Option<String>,
    pub bedrooms: u32,
    pub bathrooms: u32,
    pub area: f64,
    pub posted: Option<String>,
    pub is_owner: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ListingDetailView {
    pub loading: bool,
    pub listing: Option<ListingCard>,
    pub description: String,
    pub property_type: Option<PropertyType>,
    pub image_urls: Vec<String>,
    pub can_edit: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ExistingImageView {
    pub url: String,
    pub public_id: String,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct PendingImageView {
    pub id: String,
    pub name: String,
    pub preview_url: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct FormView {
    pub is_edit: bool,
    pub loading: bool,
    pub submitting: bool,
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
    pub existing_images: Vec<ExistingImageView>,
    pub pending_images: Vec<PendingImageView>,
    pub image_slots_left: usize,
    pub errors: Vec<String>,
    pub image_errors: Vec<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ProfileView {
    pub user: Option<UserView>,
    pub listings: Vec<ListingCard>,
    pub loading: bool,
    pub saving: bool,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct UserView {
    pub id: String,
    pub username: String,
    pub display_name: String,
    pub email: String,
    pub avatar: Option<String>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct ToastView {
    pub id: u64,
    pub message: String,
    pub kind: ToastKind,
    pub duration_ms: u64,
}

pub(crate) fn build(model: &Model) -> ViewModel {
    let page = match &model.page {
        Page::Search => PageView::Search(search_view(model)),
        Page::Listing { .. } => PageView::Listing(detail_view(model)),
        Page::CreateListing | Page::EditListing { .. } => match &model.form {
            Some(form) => PageView::ListingForm(form_view(form, model.config.max_images)),
            None => PageView::Search(search_view(model)),
        },
        Page::Profile => PageView::Profile(ProfileView {
            user: model.session.as_ref().map(|s| user_view(&s.user)),
            listings: model
                .profile
                .listings
                .iter()
                .map(|l| listing_card(l, model))
                .collect(),
            loading: model.profile.loading,
            saving: model.profile.saving,
        }),
        Page::SignIn => PageView::SignIn {
            pending: model.auth_pending,
        },
        Page::SignUp => PageView::SignUp {
            pending: model.auth_pending,
        },
    };

    ViewModel {
        page,
        user: model.session.as_ref().map(|s| user_view(&s.user)),
        toast: model.toast.as_ref().map(|t| ToastView {
            id: t.id,
            message: t.message.clone(),
            kind: t.kind,
            duration_ms: t.duration_ms,
        }),
    }
}

fn search_view(model: &Model) -> SearchView {
    let search = &model.search;
    let refined = refine(
        &search.listings,
        search.filters.location_text(),
        search.filters.sort_by,
    );
    SearchView {
        filters: search.filters.clone(),
        min_price_input: search.min_price_input.clone(),
        max_price_input: search.max_price_input.clone(),
        sort_options: SortBy::ALL.to_vec(),
        property_types: PropertyType::ALL.to_vec(),
        listings: refined.iter().map(|l| listing_card(l, model)).collect(),
        blocking_loader: search.fetch_state == FetchState::InitialLoading,
        dimmed: search.fetch_state == FetchState::Refreshing,
        can_clear: !search.filters.is_baseline()
            || !search.min_price_input.is_empty()
            || !search.max_price_input.is_empty(),
    }
}

fn detail_view(model: &Model) -> ListingDetailView {
    let listing = model.detail.listing.as_ref();
    ListingDetailView {
        loading: model.detail.loading,
        listing: listing.map(|l| listing_card(l, model)),
        description: listing.map(|l| l.description.clone()).unwrap_or_default(),
        property_type: listing.map(|l| l.house_specifications.property_type),
        image_urls: listing
            .map(|l| l.images.iter().map(|img| img.url.clone()).collect())
            .unwrap_or_default(),
        can_edit: listing
            .zip(model.session.as_ref())
            .is_some_and(|(l, s)| s.owns(l)),
    }
}

fn form_view(form: &ListingForm, max_images: usize) -> FormView {
    FormView {
        is_edit: form.is_edit(),
        loading: form.loading,
        submitting: form.submitting,
        title: form.title.clone(),
        description: form.description.clone(),
        location: form.location.clone(),
        listing_type: form.listing_type,
        selling_price: form.selling_price.clone(),
        discounted_price: form.discounted_price.clone(),
        rental_price: form.rental_price.clone(),
        property_type: form.property_type,
        bedrooms: form.bedrooms.clone(),
        bathrooms: form.bathrooms.clone(),
        area: form.area.clone(),
        existing_images: form
            .existing_images
            .iter()
            .map(|img| ExistingImageView {
                url: img.url.clone(),
                public_id: img.public_id.clone(),
            })
            .collect(),
        pending_images: form
            .pending_images
            .iter()
            .map(|p| PendingImageView {
                id: p.id.clone(),
                name: p.file.name.clone(),
                preview_url: p.preview_url.clone(),
                width: p.dimensions.map(|(w, _)| w),
                height: p.dimensions.map(|(_, h)| h),
            })
            .collect(),
        image_slots_left: max_images.saturating_sub(form.image_count()),
        errors: form.errors.iter().map(ToString::to_string).collect(),
        image_errors: form.image_errors.iter().map(ToString::to_string).collect(),
    }
}

fn listing_card(listing: &Listing, model: &Model) -> ListingCard {
    let suffix = match listing.listing_type() {
        ListingType::Rent => " / month",
        ListingType::Sale => "",
    };
    let specs = &listing.house_specifications;
    ListingCard {
        id: listing.id.to_string(),
        title: listing.title.clone(),
        location: listing.location.clone(),
        description_preview: description_preview(&listing.description, DESCRIPTION_PREVIEW_LENGTH),
        cover_image_url: listing.cover_image().map(|img| img.url.clone()),
        listing_type: listing.listing_type(),
        price_text: format!("{}{suffix}", format_price(listing.effective_price())),
        struck_price_text: listing.pricing.struck_price().map(format_price),
        bedrooms: specs.bedrooms,
        bathrooms: specs.bathrooms,
        area: specs.area,
        posted: model.now.map(|now| format_time_ago(listing.created_at, now)),
        is_owner: model.session.as_ref().is_some_and(|s| s.owns(listing)),
    }
}

fn user_view(user: &User) -> UserView {
    UserView {
        id: user.id.to_string(),
        username: user.username.clone(),
        display_name: user.display_name().to_string(),
        email: user.email.clone(),
        avatar: user.avatar.clone(),
    }
}
