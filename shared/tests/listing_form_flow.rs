mod common;

use serde_json::json;

use common::{http_requests, navigations, ok, rent_json, sale_json, started, toast_message, user_json};
use shared::capabilities::NavigationOperation;
use shared::form::{FormError, FormUpdate, SelectedFile};
use shared::{Event, ListingId, ListingType, Page, ToastKind};

const MB: usize = 1024 * 1024;

fn png(name: &str, size: usize) -> SelectedFile {
    SelectedFile {
        name: name.into(),
        mime_type: "image/png".into(),
        bytes: vec![0; size],
    }
}

fn navigated_to(effects: &[shared::Effect]) -> Option<String> {
    navigations(effects).into_iter().find_map(|op| match op {
        NavigationOperation::Navigate { path } => Some(path.clone()),
        NavigationOperation::ReplaceQuery { .. } => None,
    })
}

fn fill_sale(app: &common::Tester, model: &mut shared::Model) {
    for update in [
        FormUpdate::Title("Sea view flat".into()),
        FormUpdate::Description("Two bedrooms near the promenade".into()),
        FormUpdate::Location("Bandra, Mumbai".into()),
        FormUpdate::ListingType(ListingType::Sale),
        FormUpdate::SellingPrice("1000".into()),
        FormUpdate::Bedrooms("2".into()),
        FormUpdate::Bathrooms("1".into()),
        FormUpdate::Area("950".into()),
    ] {
        app.update(Event::FormChanged(update), model);
    }
}

#[test]
fn create_requires_session() {
    let (app, mut model) = started(None);
    let update = app.update(Event::CreateListingOpened, &mut model);
    assert_eq!(model.page, Page::SignIn);
    assert!(model.form.is_none());
    assert_eq!(navigated_to(&update.effects).as_deref(), Some("/sign-in"));
    assert_eq!(model.toast.as_ref().map(|t| t.kind), Some(ToastKind::Warning));
}

#[test]
fn oversized_image_rejected_before_any_request() {
    let (app, mut model) = started(Some(user_json("owner-1")));
    app.update(Event::CreateListingOpened, &mut model);

    let update = app.update(Event::ImagesSelected(vec![png("big.png", 6 * MB)]), &mut model);
    assert!(http_requests(&update.effects).is_empty());
    assert!(model.form.as_ref().unwrap().pending_images.is_empty());
    assert_eq!(toast_message(&model), Some("big.png is larger than 5 MB"));

    app.update(Event::ImagesSelected(vec![png("ok.png", 4 * MB)]), &mut model);
    let form = model.form.as_ref().unwrap();
    assert_eq!(form.pending_images.len(), 1);
    assert!(form.pending_images[0].preview_url.starts_with("data:image/png;base64,"));
}

#[test]
fn fifth_image_rejected() {
    let (app, mut model) = started(Some(user_json("owner-1")));
    app.update(Event::CreateListingOpened, &mut model);
    let files = (0..5).map(|i| png(&format!("{i}.png"), 10)).collect();
    app.update(Event::ImagesSelected(files), &mut model);
    assert_eq!(model.form.as_ref().unwrap().pending_images.len(), 4);
    assert_eq!(
        toast_message(&model),
        Some("You can upload at most 4 images per listing")
    );
}

#[test]
fn discount_not_below_selling_blocks_submit() {
    let (app, mut model) = started(Some(user_json("owner-1")));
    app.update(Event::CreateListingOpened, &mut model);
    fill_sale(&app, &mut model);
    app.update(Event::FormChanged(FormUpdate::DiscountedPrice("1000".into())), &mut model);

    let update = app.update(Event::SubmitListing, &mut model);
    assert!(http_requests(&update.effects).is_empty());
    let form = model.form.as_ref().unwrap();
    assert_eq!(form.errors, vec![FormError::DiscountNotBelowSelling]);
    assert!(!form.submitting);
    assert_eq!(
        toast_message(&model),
        Some("Discounted price must be lower than the selling price")
    );
}

#[test]
fn create_submits_multipart_and_opens_listing() {
    let (app, mut model) = started(Some(user_json("owner-1")));
    app.update(Event::CreateListingOpened, &mut model);
    fill_sale(&app, &mut model);
    app.update(Event::FormChanged(FormUpdate::DiscountedPrice("900".into())), &mut model);
    app.update(Event::ImagesSelected(vec![png("front.png", 2048)]), &mut model);

    let update = app.update(Event::SubmitListing, &mut model);
    let requests = http_requests(&update.effects);
    assert_eq!(requests.len(), 1);
    let request = &requests[0];
    assert_eq!(request.method, "POST");
    assert_eq!(
        request.url.as_str(),
        "http://localhost:3000/api/listing/owner-1/create"
    );
    assert!(request
        .header("content-type")
        .unwrap()
        .starts_with("multipart/form-data; boundary="));
    let body = String::from_utf8_lossy(request.body());
    assert!(body.contains("name=\"sellingPrice\"\r\n\r\n1000\r\n"));
    assert!(body.contains("name=\"discountedPrice\"\r\n\r\n900\r\n"));
    assert!(body.contains("name=\"images\"; filename=\"front.png\""));
    assert!(!body.contains("rentalPrice"));
    assert!(model.form.as_ref().unwrap().submitting);

    // a second click while in flight does nothing
    let update = app.update(Event::SubmitListing, &mut model);
    assert!(http_requests(&update.effects).is_empty());

    let update = app.update(
        Event::SubmitResponse(ok(
            201,
            &json!({ "message": "Listing created!", "listing": sale_json("new1", "Bandra, Mumbai", 1000.0, "owner-1") }),
        )),
        &mut model,
    );
    assert!(model.form.is_none());
    assert_eq!(
        model.page,
        Page::Listing {
            id: ListingId::new("new1")
        }
    );
    assert_eq!(navigated_to(&update.effects).as_deref(), Some("/listing/new1"));
    assert_eq!(toast_message(&model), Some("Listing created!"));
    assert!(model.detail.listing.is_some());
}

#[test]
fn server_rejection_keeps_form_and_shows_message() {
    let (app, mut model) = started(Some(user_json("owner-1")));
    app.update(Event::CreateListingOpened, &mut model);
    fill_sale(&app, &mut model);
    app.update(Event::SubmitListing, &mut model);

    app.update(
        Event::SubmitResponse(ok(400, &json!({ "message": "Title already used" }))),
        &mut model,
    );
    let form = model.form.as_ref().unwrap();
    assert!(!form.submitting);
    assert_eq!(form.title, "Sea view flat");
    assert_eq!(toast_message(&model), Some("Title already used"));
}

#[test]
fn edit_by_non_owner_redirects_home() {
    let (app, mut model) = started(Some(user_json("intruder")));
    let id = ListingId::new("x1");
    let update = app.update(Event::EditListingOpened { id: id.clone() }, &mut model);
    let requests = http_requests(&update.effects);
    assert_eq!(requests[0].url.path(), "/api/listing/x1");
    assert!(model.form.as_ref().unwrap().loading);

    let update = app.update(
        Event::EditListingLoaded {
            id,
            result: ok(200, &sale_json("x1", "Goa", 5000.0, "owner-1")),
        },
        &mut model,
    );
    assert!(model.form.is_none());
    assert_eq!(model.page, Page::Search);
    assert_eq!(navigated_to(&update.effects).as_deref(), Some("/"));
    assert_eq!(toast_message(&model), Some("You can only edit your own listings"));
}

#[test]
fn edit_prefills_and_signals_deleted_images() {
    let (app, mut model) = started(Some(user_json("owner-1")));
    let id = ListingId::new("r1");
    app.update(Event::EditListingOpened { id: id.clone() }, &mut model);

    let mut listing = rent_json("r1", "Pune", 18_000.0, "owner-1");
    listing["images"] = json!([
        { "url": "https://media.example.com/1.jpg", "publicId": "listings/1" },
        { "url": "https://media.example.com/2.jpg", "publicId": "listings/2" }
    ]);
    app.update(
        Event::EditListingLoaded {
            id,
            result: ok(200, &listing),
        },
        &mut model,
    );
    let form = model.form.as_ref().unwrap();
    assert!(!form.loading);
    assert_eq!(form.listing_type, ListingType::Rent);
    assert_eq!(form.rental_price, "18000");
    assert_eq!(form.bedrooms, "3");
    assert_eq!(form.existing_images.len(), 2);

    app.update(
        Event::ExistingImageRemoved {
            public_id: "listings/1".into(),
        },
        &mut model,
    );
    let update = app.update(Event::SubmitListing, &mut model);
    let requests = http_requests(&update.effects);
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, "PUT");
    assert_eq!(requests[0].url.path(), "/api/listing/r1/update");
    let body = String::from_utf8_lossy(requests[0].body());
    assert!(body.contains("name=\"existingImages\"\r\n\r\n[\"listings/2\"]\r\n"));
    assert!(body.contains("name=\"deletedImages\"\r\n\r\n[\"listings/1\"]\r\n"));
    assert!(body.contains("name=\"rentalPrice\"\r\n\r\n18000\r\n"));
    assert!(!body.contains("filename="));
}

#[test]
fn missing_listing_on_edit_redirects_with_notice() {
    let (app, mut model) = started(Some(user_json("owner-1")));
    let id = ListingId::new("gone");
    app.update(Event::EditListingOpened { id: id.clone() }, &mut model);
    let update = app.update(
        Event::EditListingLoaded {
            id,
            result: ok(404, &json!({ "message": "Listing not found!" })),
        },
        &mut model,
    );
    assert!(model.form.is_none());
    assert_eq!(navigated_to(&update.effects).as_deref(), Some("/"));
    assert_eq!(toast_message(&model), Some("That listing no longer exists"));
}
