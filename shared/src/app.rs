pub mod view;

use secrecy::ExposeSecret;
use tracing::{debug, info, warn};

use crate::api::{
    self, Api, GoogleIdentity, ListingEnvelope, MessageResponse, ProfileUpdate, Request,
    RequestError, SignInRequest, SignUpRequest, UserPayload,
};
use crate::capabilities::{Capabilities, HttpResult};
use crate::debounce::{DebounceHandle, PriceField};
use crate::event::Event;
use crate::filters::{parse_amount, FilterUpdate, SearchFilters};
use crate::form::{validate_image, FormUpdate, ImageRules, ListingForm, SelectedFile};
use crate::model::{Listing, ListingId, Session};
use crate::{
    format_number, AppError, DetailState, ErrorKind, FetchState, Model, Page, ToastKind,
};

use self::view::ViewModel;

pub const SIGN_IN_PATH: &str = "/sign-in";
pub const HOME_PATH: &str = "/";

#[derive(Default)]
pub struct App;

impl crux_core::App for App {
    type Event = Event;
    type Model = Model;
    type ViewModel = ViewModel;
    type Capabilities = Capabilities;

    fn update(&self, event: Event, model: &mut Model, caps: &Capabilities) {
        debug!(event = event.name(), internal = event.is_internal(), "update");

        match event {
            Event::Started {
                config,
                session,
                now,
            } => {
                match config.validate() {
                    Ok(()) => {
                        let interval = config.debounce_interval();
                        model.search.min_price_debounce.set_interval(interval);
                        model.search.max_price_debounce.set_interval(interval);
                        model.config = config;
                    }
                    Err(e) => warn!(error = %e, "ignoring invalid client config"),
                }
                model.session = session.map(Session::new);
                model.now = Some(now);
                caps.render.render();
            }

            Event::SearchOpened { query } => Self::open_search(&query, model, caps),
            Event::FilterChanged(update) => {
                Self::sync_price_input(&update, model);
                Self::commit_filter(update, model, caps);
            }
            Event::PriceInput { field, text } => Self::price_input(field, text, model, caps),
            Event::PriceSettled { field, handle } => Self::price_settled(field, handle, model, caps),
            Event::ClearFilters => Self::clear_filters(model, caps),
            Event::SearchResponse { seq, result } => Self::search_response(seq, *result, model, caps),

            Event::ListingOpened { id } => Self::open_listing(id, model, caps),
            Event::ListingResponse { id, result } => {
                Self::listing_response(&id, *result, model, caps);
            }

            Event::CreateListingOpened => {
                if !model.is_authenticated() {
                    Self::redirect_to_sign_in("Sign in to create a listing", model, caps);
                    return;
                }
                model.page = Page::CreateListing;
                model.form = Some(ListingForm::create());
                caps.render.render();
            }
            Event::EditListingOpened { id } => Self::open_edit(id, model, caps),
            Event::EditListingLoaded { id, result } => {
                Self::edit_listing_loaded(&id, *result, model, caps);
            }
            Event::FormChanged(update) => Self::form_changed(update, model, caps),
            Event::ImagesSelected(files) => Self::images_selected(files, model, caps),
            Event::PendingImageRemoved { id } => {
                if let Some(form) = model.form.as_mut() {
                    form.remove_pending(&id);
                }
                caps.render.render();
            }
            Event::ExistingImageRemoved { public_id } => {
                if let Some(form) = model.form.as_mut() {
                    form.remove_existing(&public_id);
                }
                caps.render.render();
            }
            Event::SubmitListing => Self::submit_listing(model, caps),
            Event::SubmitResponse(result) => Self::submit_response(*result, model, caps),

            Event::ProfileOpened => Self::open_profile(model, caps),
            Event::UserListingsResponse(result) => {
                model.profile.loading = false;
                match api::decode::<Vec<Listing>>(*result) {
                    Ok(listings) => {
                        info!(count = listings.len(), "owner listings loaded");
                        model.profile.listings = listings;
                    }
                    Err(e) => Self::report(&e, model),
                }
                caps.render.render();
            }
            Event::DeleteListingRequested { id } => Self::delete_listing(id, model, caps),
            Event::DeleteListingResponse { id, result } => {
                Self::delete_listing_response(&id, *result, model, caps);
            }
            Event::ProfileUpdateRequested(update) => Self::update_profile(update, model, caps),
            Event::ProfileUpdateResponse(result) => {
                model.profile.saving = false;
                match api::decode::<UserPayload>(*result) {
                    Ok(payload) => {
                        model.session = Some(Session::new(payload.into_user()));
                        model.show_toast("Profile updated", ToastKind::Success);
                    }
                    Err(e) => Self::report(&e, model),
                }
                caps.render.render();
            }
            Event::DeleteAccountRequested => Self::delete_account(model, caps),
            Event::DeleteAccountResponse(result) => {
                match api::check(*result) {
                    Ok(_) => {
                        info!("account deleted");
                        model.clear_session();
                        model.page = Page::SignIn;
                        model.show_toast("Your account has been deleted", ToastKind::Info);
                        caps.navigation.navigate(SIGN_IN_PATH);
                    }
                    Err(e) => Self::report(&e, model),
                }
                caps.render.render();
            }

            Event::SignUpRequested(request) => Self::sign_up(&request, model, caps),
            Event::SignInRequested(request) => Self::sign_in(&request, model, caps),
            Event::GoogleSignInCompleted(identity) => Self::google_sign_in(&identity, model, caps),
            Event::SignOutRequested => {
                if !model.is_authenticated() {
                    return;
                }
                Self::send(model, caps, |api| api.sign_out(), |r| {
                    Event::SignOutResponse(Box::new(r))
                });
            }
            Event::SignUpResponse(result) => {
                model.auth_pending = false;
                match api::check(*result) {
                    Ok(_) => {
                        model.page = Page::SignIn;
                        model.show_toast("Account created, please sign in", ToastKind::Success);
                        caps.navigation.navigate(SIGN_IN_PATH);
                    }
                    Err(e) => Self::report(&e, model),
                }
                caps.render.render();
            }
            Event::AuthResponse(result) => {
                model.auth_pending = false;
                match api::decode::<UserPayload>(*result) {
                    Ok(payload) => {
                        let user = payload.into_user();
                        info!(user_id = %user.id, "signed in");
                        model.show_toast(
                            format!("Welcome, {}", user.display_name()),
                            ToastKind::Success,
                        );
                        model.session = Some(Session::new(user));
                        model.page = Page::Search;
                        caps.navigation.navigate(HOME_PATH);
                    }
                    Err(e) => Self::report(&e, model),
                }
                caps.render.render();
            }
            Event::SignOutResponse(result) => {
                model.auth_pending = false;
                if let Err(e) = api::check(*result) {
                    warn!(error = %e, "sign out failed, clearing local session anyway");
                }
                model.clear_session();
                model.page = Page::SignIn;
                caps.navigation.navigate(SIGN_IN_PATH);
                caps.render.render();
            }

            Event::DismissToast { id } => {
                model.dismiss_toast(id);
                caps.render.render();
            }
        }
    }

    fn view(&self, model: &Model) -> ViewModel {
        view::build(model)
    }
}

impl App {
    // --- search ---

    fn open_search(query: &str, model: &mut Model, caps: &Capabilities) {
        let filters = SearchFilters::from_query(query);
        model.page = Page::Search;

        let search = &mut model.search;
        search.min_price_debounce.cancel();
        search.max_price_debounce.cancel();
        search.min_price_input = filters.min_price.map(format_number).unwrap_or_default();
        search.max_price_input = filters.max_price.map(format_number).unwrap_or_default();
        search.filters = filters;

        if !search.initialized {
            search.initialized = true;
            Self::fetch_listings(true, model, caps);
        } else {
            Self::refetch_if_needed(model, caps);
        }
        caps.render.render();
    }

    /// A direct price selection overrides whatever is being typed.
    fn sync_price_input(update: &FilterUpdate, model: &mut Model) {
        let search = &mut model.search;
        match update {
            FilterUpdate::MinPrice(value) => {
                search.min_price_debounce.cancel();
                search.min_price_input = value.map(format_number).unwrap_or_default();
            }
            FilterUpdate::MaxPrice(value) => {
                search.max_price_debounce.cancel();
                search.max_price_input = value.map(format_number).unwrap_or_default();
            }
            _ => {}
        }
    }

    fn commit_filter(update: FilterUpdate, model: &mut Model, caps: &Capabilities) {
        model.search.filters.apply(update);
        caps.navigation.replace_query(model.search.filters.to_query());
        Self::refetch_if_needed(model, caps);
        caps.render.render();
    }

    fn price_input(field: PriceField, text: String, model: &mut Model, caps: &Capabilities) {
        let search = &mut model.search;
        let debouncer = match field {
            PriceField::Min => {
                search.min_price_input.clone_from(&text);
                &mut search.min_price_debounce
            }
            PriceField::Max => {
                search.max_price_input.clone_from(&text);
                &mut search.max_price_debounce
            }
        };
        let handle = debouncer.schedule(text);
        caps.delay
            .start(debouncer.interval(), Event::PriceSettled { field, handle });
        caps.render.render();
    }

    fn price_settled(
        field: PriceField,
        handle: DebounceHandle,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        let settled = match field {
            PriceField::Min => model.search.min_price_debounce.settle(handle),
            PriceField::Max => model.search.max_price_debounce.settle(handle),
        };
        let Some(text) = settled else {
            debug!(?field, "superseded price input");
            return;
        };

        let amount = parse_amount(&text);
        let update = match field {
            PriceField::Min => FilterUpdate::MinPrice(amount),
            PriceField::Max => FilterUpdate::MaxPrice(amount),
        };
        debug!(?field, ?amount, "price committed");
        Self::commit_filter(update, model, caps);
    }

    fn clear_filters(model: &mut Model, caps: &Capabilities) {
        let search = &mut model.search;
        search.filters = SearchFilters::baseline();
        search.min_price_input.clear();
        search.max_price_input.clear();
        search.min_price_debounce.cancel();
        search.max_price_debounce.cancel();
        caps.navigation.replace_query("");
        Self::refetch_if_needed(model, caps);
        caps.render.render();
    }

    /// Location is refined locally, so only server-side fields trigger a
    /// round trip. Results a deep link scoped to one location are replaced
    /// by unscoped ones as soon as the location text moves away from it.
    fn refetch_if_needed(model: &mut Model, caps: &Capabilities) {
        let search = &model.search;
        let key_changed = search.last_key.as_ref() != Some(&search.filters.server_key());
        let scope_stale = search
            .scoped_location
            .as_deref()
            .is_some_and(|scoped| scoped != search.filters.location_text());
        if key_changed || scope_stale {
            Self::fetch_listings(false, model, caps);
        }
    }

    fn fetch_listings(include_location: bool, model: &mut Model, caps: &Capabilities) {
        let query = model.search.filters.server_query(include_location);
        let request = match Api::new(&model.config, &caps.http).search(&query) {
            Ok(request) => request,
            Err(e) => {
                Self::report(&api::request_error(&e), model);
                return;
            }
        };

        let search = &mut model.search;
        search.request_seq += 1;
        search.last_key = Some(search.filters.server_key());
        search.scoped_location = Some(search.filters.location_text())
            .filter(|location| include_location && !location.is_empty())
            .map(str::to_string);
        search.fetch_state = if search.loaded_once {
            FetchState::Refreshing
        } else {
            FetchState::InitialLoading
        };

        let seq = search.request_seq;
        debug!(seq, %query, "fetching listings");
        request.send(move |result| Event::SearchResponse {
            seq,
            result: Box::new(result),
        });
    }

    fn search_response(seq: u64, result: HttpResult, model: &mut Model, caps: &Capabilities) {
        if seq != model.search.request_seq {
            debug!(seq, latest = model.search.request_seq, "dropping stale search response");
            return;
        }

        model.search.fetch_state = FetchState::Idle;
        match api::decode::<Vec<Listing>>(result) {
            Ok(listings) => {
                info!(count = listings.len(), "search results loaded");
                model.search.listings = listings;
                model.search.loaded_once = true;
            }
            Err(e) => {
                model.search.listings.clear();
                Self::report(&e, model);
            }
        }
        caps.render.render();
    }

    // --- listing detail ---

    fn open_listing(id: ListingId, model: &mut Model, caps: &Capabilities) {
        let cached = model
            .search
            .listings
            .iter()
            .chain(&model.profile.listings)
            .find(|l| l.id == id)
            .cloned();
        model.detail = DetailState {
            listing: cached,
            loading: true,
        };
        model.page = Page::Listing { id: id.clone() };

        let api = Api::new(&model.config, &caps.http);
        match api.listing(&id) {
            Ok(request) => request.send(move |result| Event::ListingResponse {
                id: id.clone(),
                result: Box::new(result),
            }),
            Err(e) => {
                model.detail.loading = false;
                Self::report(&api::request_error(&e), model);
            }
        }
        caps.render.render();
    }

    fn listing_response(id: &ListingId, result: HttpResult, model: &mut Model, caps: &Capabilities) {
        if !matches!(&model.page, Page::Listing { id: current } if current == id) {
            debug!(%id, "listing response for a page no longer shown");
            return;
        }

        model.detail.loading = false;
        match api::decode::<Listing>(result) {
            Ok(listing) => model.detail.listing = Some(listing),
            Err(e) if e.kind == ErrorKind::NotFound => {
                model.detail.listing = None;
                Self::redirect_home("That listing no longer exists", model, caps);
            }
            Err(e) => Self::report(&e, model),
        }
        caps.render.render();
    }

    // --- create / edit ---

    fn open_edit(id: ListingId, model: &mut Model, caps: &Capabilities) {
        if !model.is_authenticated() {
            Self::redirect_to_sign_in("Sign in to edit your listing", model, caps);
            return;
        }

        model.page = Page::EditListing { id: id.clone() };
        model.form = Some(ListingForm::loading(id.clone()));

        let api = Api::new(&model.config, &caps.http);
        match api.listing(&id) {
            Ok(request) => request.send(move |result| Event::EditListingLoaded {
                id: id.clone(),
                result: Box::new(result),
            }),
            Err(e) => {
                model.form = None;
                Self::report(&api::request_error(&e), model);
            }
        }
        caps.render.render();
    }

    fn edit_listing_loaded(
        id: &ListingId,
        result: HttpResult,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        let awaiting = model
            .form
            .as_ref()
            .is_some_and(|f| f.loading && f.listing_id() == Some(id));
        if !awaiting {
            debug!(%id, "edit form no longer waiting for this listing");
            return;
        }

        match api::decode::<Listing>(result) {
            Ok(listing) => match &model.session {
                Some(session) if session.owns(&listing) => {
                    model.form = Some(ListingForm::from_listing(&listing));
                }
                Some(session) => {
                    warn!(listing = %id, user = %session.user_id(), "edit refused, not the owner");
                    model.form = None;
                    Self::redirect_home("You can only edit your own listings", model, caps);
                }
                None => {
                    model.form = None;
                    Self::redirect_to_sign_in("Sign in to edit your listing", model, caps);
                    return;
                }
            },
            Err(e) if e.kind == ErrorKind::NotFound => {
                model.form = None;
                Self::redirect_home("That listing no longer exists", model, caps);
            }
            Err(e) => {
                if let Some(form) = model.form.as_mut() {
                    form.loading = false;
                }
                Self::report(&e, model);
            }
        }
        caps.render.render();
    }

    fn form_changed(update: FormUpdate, model: &mut Model, caps: &Capabilities) {
        if let Some(form) = model.form.as_mut() {
            form.apply(update);
        }
        caps.render.render();
    }

    fn images_selected(files: Vec<SelectedFile>, model: &mut Model, caps: &Capabilities) {
        let rules = model.config.image_rules();
        let Some(form) = model.form.as_mut() else {
            return;
        };

        let rejections = form.add_images(files, &rules);
        if let Some(first) = rejections.first() {
            let message = match rejections.len() {
                1 => first.to_string(),
                n => format!("{first} (+{} more)", n - 1),
            };
            let error = AppError::new(first.kind(), message);
            Self::report(&error, model);
        }
        caps.render.render();
    }

    fn submit_listing(model: &mut Model, caps: &Capabilities) {
        let Some(session) = model.session.clone() else {
            Self::redirect_to_sign_in("Sign in to publish a listing", model, caps);
            return;
        };
        let Some(form) = model.form.as_mut() else {
            return;
        };
        if form.submitting || form.loading {
            return;
        }

        let validated = match form.validate() {
            Ok(validated) => validated,
            Err(errors) => {
                warn!(count = errors.len(), "listing form rejected");
                let message = errors
                    .first()
                    .map_or_else(|| "Please check the form".to_string(), ToString::to_string);
                form.errors = errors;
                Self::report(&AppError::new(ErrorKind::Validation, message), model);
                caps.render.render();
                return;
            }
        };
        form.errors.clear();

        let multipart = match form.build_submission(&validated) {
            Ok(multipart) => multipart,
            Err(e) => {
                let error = AppError::new(ErrorKind::Serialization, "could not encode listing")
                    .with_internal(e.to_string());
                Self::report(&error, model);
                return;
            }
        };

        let api = Api::new(&model.config, &caps.http);
        let request = match form.listing_id() {
            None => api.create_listing(session.user_id(), multipart),
            Some(id) => api.update_listing(id, multipart),
        };

        match request {
            Ok(request) => {
                info!(
                    edit = form.is_edit(),
                    new_images = form.pending_images.len(),
                    "submitting listing"
                );
                form.submitting = true;
                request.send(|result| Event::SubmitResponse(Box::new(result)));
            }
            Err(e) => Self::report(&api::request_error(&e), model),
        }
        caps.render.render();
    }

    fn submit_response(result: HttpResult, model: &mut Model, caps: &Capabilities) {
        let Some(form) = model.form.as_mut() else {
            return;
        };
        form.submitting = false;
        let was_edit = form.is_edit();

        match api::decode::<ListingEnvelope>(result) {
            Ok(ListingEnvelope { message, listing }) => {
                info!(listing = %listing.id, "listing saved");
                let message = if message.is_empty() {
                    if was_edit { "Listing updated" } else { "Listing created" }.to_string()
                } else {
                    message
                };
                model.show_toast(message, ToastKind::Success);
                model.form = None;

                for cached in model
                    .search
                    .listings
                    .iter_mut()
                    .chain(model.profile.listings.iter_mut())
                    .filter(|l| l.id == listing.id)
                {
                    *cached = listing.clone();
                }

                let path = format!("/listing/{}", listing.id);
                model.page = Page::Listing {
                    id: listing.id.clone(),
                };
                model.detail = DetailState {
                    listing: Some(listing),
                    loading: false,
                };
                caps.navigation.navigate(path);
            }
            Err(e) => Self::report(&e, model),
        }
        caps.render.render();
    }

    // --- profile ---

    fn open_profile(model: &mut Model, caps: &Capabilities) {
        let Some(user_id) = model.session.as_ref().map(|s| s.user_id().clone()) else {
            Self::redirect_to_sign_in("Sign in to view your profile", model, caps);
            return;
        };
        model.page = Page::Profile;
        model.profile.loading = true;
        match Api::new(&model.config, &caps.http).user_listings(&user_id) {
            Ok(request) => request.send(|result| Event::UserListingsResponse(Box::new(result))),
            Err(e) => {
                model.profile.loading = false;
                Self::report(&api::request_error(&e), model);
            }
        }
        caps.render.render();
    }

    fn delete_listing(id: ListingId, model: &mut Model, caps: &Capabilities) {
        if !model.is_authenticated() {
            Self::redirect_to_sign_in("Sign in to manage your listings", model, caps);
            return;
        }
        match Api::new(&model.config, &caps.http).delete_listing(&id) {
            Ok(request) => request.send(move |result| Event::DeleteListingResponse {
                id: id.clone(),
                result: Box::new(result),
            }),
            Err(e) => Self::report(&api::request_error(&e), model),
        }
    }

    fn delete_listing_response(
        id: &ListingId,
        result: HttpResult,
        model: &mut Model,
        caps: &Capabilities,
    ) {
        match api::decode::<MessageResponse>(result) {
            Ok(response) => {
                info!(listing = %id, "listing deleted");
                model.profile.listings.retain(|l| &l.id != id);
                model.search.listings.retain(|l| &l.id != id);
                if model.detail.listing.as_ref().is_some_and(|l| &l.id == id) {
                    model.detail = DetailState::default();
                }
                if matches!(&model.page, Page::Listing { id: current } if current == id) {
                    model.page = Page::Profile;
                }
                let message = if response.message.is_empty() {
                    "Listing deleted".to_string()
                } else {
                    response.message
                };
                model.show_toast(message, ToastKind::Success);
            }
            Err(e) => Self::report(&e, model),
        }
        caps.render.render();
    }

    fn update_profile(update: ProfileUpdate, model: &mut Model, caps: &Capabilities) {
        let Some(user_id) = model.session.as_ref().map(|s| s.user_id().clone()) else {
            Self::redirect_to_sign_in("Sign in to edit your profile", model, caps);
            return;
        };
        if update.is_empty() {
            model.show_toast("Nothing to update", ToastKind::Info);
            caps.render.render();
            return;
        }
        if let Some(avatar) = &update.avatar {
            let rules = ImageRules {
                max_images: 1,
                max_bytes: model.config.max_image_bytes,
            };
            if let Err(rejection) = validate_image(avatar, 0, &rules) {
                warn!(error = %rejection, "avatar rejected");
                Self::report(&AppError::new(rejection.kind(), rejection.to_string()), model);
                caps.render.render();
                return;
            }
        }

        match Api::new(&model.config, &caps.http).update_profile(&user_id, &update) {
            Ok(request) => {
                model.profile.saving = true;
                request.send(|result| Event::ProfileUpdateResponse(Box::new(result)));
            }
            Err(e) => Self::report(&api::request_error(&e), model),
        }
        caps.render.render();
    }

    fn delete_account(model: &mut Model, caps: &Capabilities) {
        let Some(user_id) = model.session.as_ref().map(|s| s.user_id().clone()) else {
            return;
        };
        match Api::new(&model.config, &caps.http).delete_account(&user_id) {
            Ok(request) => request.send(|result| Event::DeleteAccountResponse(Box::new(result))),
            Err(e) => Self::report(&api::request_error(&e), model),
        }
    }

    // --- auth ---

    fn sign_up(request: &SignUpRequest, model: &mut Model, caps: &Capabilities) {
        if request.username.trim().is_empty()
            || request.email.trim().is_empty()
            || request.password.expose_secret().is_empty()
        {
            Self::report(
                &AppError::new(ErrorKind::Validation, "Username, email and password are required"),
                model,
            );
            caps.render.render();
            return;
        }
        Self::send(model, caps, |api| api.sign_up(request), |r| {
            Event::SignUpResponse(Box::new(r))
        });
    }

    fn sign_in(request: &SignInRequest, model: &mut Model, caps: &Capabilities) {
        if request.email.trim().is_empty() || request.password.expose_secret().is_empty() {
            Self::report(
                &AppError::new(ErrorKind::Validation, "Email and password are required"),
                model,
            );
            caps.render.render();
            return;
        }
        Self::send(model, caps, |api| api.sign_in(request), |r| {
            Event::AuthResponse(Box::new(r))
        });
    }

    fn google_sign_in(identity: &GoogleIdentity, model: &mut Model, caps: &Capabilities) {
        Self::send(model, caps, |api| api.google_sign_in(identity), |r| {
            Event::AuthResponse(Box::new(r))
        });
    }

    /// Sends an auth request and marks the auth form busy.
    fn send<B, C>(model: &mut Model, caps: &Capabilities, build: B, callback: C)
    where
        B: FnOnce(&Api<'_>) -> Result<Request, RequestError>,
        C: Fn(HttpResult) -> Event + Send + 'static,
    {
        match build(&Api::new(&model.config, &caps.http)) {
            Ok(request) => {
                model.auth_pending = true;
                request.send(callback);
            }
            Err(e) => Self::report(&api::request_error(&e), model),
        }
        caps.render.render();
    }

    // --- shared ---

    fn report(error: &AppError, model: &mut Model) {
        warn!(
            code = error.code(),
            retryable = error.is_retryable(),
            error = %error,
            "request failed"
        );
        model.show_error(error);
    }

    fn redirect_to_sign_in(message: &str, model: &mut Model, caps: &Capabilities) {
        model.show_toast(message, ToastKind::Warning);
        model.page = Page::SignIn;
        caps.navigation.navigate(SIGN_IN_PATH);
        caps.render.render();
    }

    fn redirect_home(message: &str, model: &mut Model, caps: &Capabilities) {
        model.show_toast(message, ToastKind::Warning);
        model.page = Page::Search;
        caps.navigation.navigate(HOME_PATH);
    }
}
