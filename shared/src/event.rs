use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::api::{GoogleIdentity, ProfileUpdate, SignInRequest, SignUpRequest};
use crate::capabilities::HttpResult;
use crate::config::ClientConfig;
use crate::debounce::{DebounceHandle, PriceField};
use crate::filters::FilterUpdate;
use crate::form::{FormUpdate, SelectedFile};
use crate::model::{ListingId, User};

#[derive(Serialize, Deserialize, Debug, Clone)]
pub enum Event {
    Started {
        config: ClientConfig,
        session: Option<User>,
        now: DateTime<Utc>,
    },

    // search page
    SearchOpened {
        query: String,
    },
    FilterChanged(FilterUpdate),
    PriceInput {
        field: PriceField,
        text: String,
    },
    ClearFilters,
    #[serde(skip)]
    PriceSettled {
        field: PriceField,
        handle: DebounceHandle,
    },
    #[serde(skip)]
    SearchResponse {
        seq: u64,
        result: Box<HttpResult>,
    },

    // listing detail
    ListingOpened {
        id: ListingId,
    },
    #[serde(skip)]
    ListingResponse {
        id: ListingId,
        result: Box<HttpResult>,
    },

    // create / edit form
    CreateListingOpened,
    EditListingOpened {
        id: ListingId,
    },
    FormChanged(FormUpdate),
    ImagesSelected(Vec<SelectedFile>),
    PendingImageRemoved {
        id: String,
    },
    ExistingImageRemoved {
        public_id: String,
    },
    SubmitListing,
    #[serde(skip)]
    EditListingLoaded {
        id: ListingId,
        result: Box<HttpResult>,
    },
    #[serde(skip)]
    SubmitResponse(Box<HttpResult>),

    // owner listings and profile
    ProfileOpened,
    DeleteListingRequested {
        id: ListingId,
    },
    ProfileUpdateRequested(ProfileUpdate),
    DeleteAccountRequested,
    #[serde(skip)]
    UserListingsResponse(Box<HttpResult>),
    #[serde(skip)]
    DeleteListingResponse {
        id: ListingId,
        result: Box<HttpResult>,
    },
    #[serde(skip)]
    ProfileUpdateResponse(Box<HttpResult>),
    #[serde(skip)]
    DeleteAccountResponse(Box<HttpResult>),

    // auth
    SignUpRequested(SignUpRequest),
    SignInRequested(SignInRequest),
    GoogleSignInCompleted(GoogleIdentity),
    SignOutRequested,
    #[serde(skip)]
    SignUpResponse(Box<HttpResult>),
    #[serde(skip)]
    AuthResponse(Box<HttpResult>),
    #[serde(skip)]
    SignOutResponse(Box<HttpResult>),

    DismissToast {
        id: u64,
    },
}

impl Event {
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Started { .. } => "started",
            Self::SearchOpened { .. } => "search_opened",
            Self::FilterChanged(_) => "filter_changed",
            Self::PriceInput { .. } => "price_input",
            Self::ClearFilters => "clear_filters",
            Self::PriceSettled { .. } => "price_settled",
            Self::SearchResponse { .. } => "search_response",
            Self::ListingOpened { .. } => "listing_opened",
            Self::ListingResponse { .. } => "listing_response",
            Self::CreateListingOpened => "create_listing_opened",
            Self::EditListingOpened { .. } => "edit_listing_opened",
            Self::FormChanged(_) => "form_changed",
            Self::ImagesSelected(_) => "images_selected",
            Self::PendingImageRemoved { .. } => "pending_image_removed",
            Self::ExistingImageRemoved { .. } => "existing_image_removed",
            Self::SubmitListing => "submit_listing",
            Self::EditListingLoaded { .. } => "edit_listing_loaded",
            Self::SubmitResponse(_) => "submit_response",
            Self::ProfileOpened => "profile_opened",
            Self::DeleteListingRequested { .. } => "delete_listing_requested",
            Self::ProfileUpdateRequested(_) => "profile_update_requested",
            Self::DeleteAccountRequested => "delete_account_requested",
            Self::UserListingsResponse(_) => "user_listings_response",
            Self::DeleteListingResponse { .. } => "delete_listing_response",
            Self::ProfileUpdateResponse(_) => "profile_update_response",
            Self::DeleteAccountResponse(_) => "delete_account_response",
            Self::SignUpRequested(_) => "sign_up_requested",
            Self::SignInRequested(_) => "sign_in_requested",
            Self::GoogleSignInCompleted(_) => "google_sign_in_completed",
            Self::SignOutRequested => "sign_out_requested",
            Self::SignUpResponse(_) => "sign_up_response",
            Self::AuthResponse(_) => "auth_response",
            Self::SignOutResponse(_) => "sign_out_response",
            Self::DismissToast { .. } => "dismiss_toast",
        }
    }

    /// Events the core sends itself when a capability completes.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::PriceSettled { .. }
                | Self::SearchResponse { .. }
                | Self::ListingResponse { .. }
                | Self::EditListingLoaded { .. }
                | Self::SubmitResponse(_)
                | Self::UserListingsResponse(_)
                | Self::DeleteListingResponse { .. }
                | Self::ProfileUpdateResponse(_)
                | Self::DeleteAccountResponse(_)
                | Self::SignUpResponse(_)
                | Self::AuthResponse(_)
                | Self::SignOutResponse(_)
        )
    }
}
