#![allow(dead_code)]

use chrono::{TimeZone, Utc};
use crux_core::testing::AppTester;
use crux_http::http::StatusCode;
use crux_http::protocol::HttpRequest;
use crux_http::testing::ResponseBuilder;
use serde_json::{json, Value};
use url::Url;

use shared::capabilities::{HttpResult, NavigationOperation};
use shared::{App, ClientConfig, Effect, Event, Model};

pub type Tester = AppTester<App, Effect>;

pub fn started(session: Option<Value>) -> (Tester, Model) {
    let app = Tester::default();
    let mut model = Model::default();
    let session = session.map(|v| serde_json::from_value(v).unwrap());
    app.update(
        Event::Started {
            config: ClientConfig::default(),
            session,
            now: Utc.with_ymd_and_hms(2024, 2, 1, 12, 0, 0).unwrap(),
        },
        &mut model,
    );
    (app, model)
}

pub fn user_json(id: &str) -> Value {
    json!({
        "_id": id,
        "username": format!("user-{id}"),
        "fullname": "Asha Rao",
        "email": format!("{id}@example.com"),
        "avatar": null
    })
}

pub fn sale_json(id: &str, location: &str, selling: f64, owner: &str) -> Value {
    json!({
        "_id": id,
        "title": format!("Listing {id}"),
        "description": "Bright corner flat with a balcony",
        "location": location,
        "type": "sale",
        "sellingPrice": selling,
        "houseSpecifications": { "propertyType": "apartment", "bedrooms": 2, "bathrooms": 1, "area": 900 },
        "images": [{ "url": format!("https://media.example.com/{id}.jpg"), "publicId": format!("listings/{id}") }],
        "userRef": owner,
        "createdAt": "2024-01-05T09:00:00.000Z",
        "updatedAt": "2024-01-05T09:00:00.000Z"
    })
}

pub fn rent_json(id: &str, location: &str, rental: f64, owner: &str) -> Value {
    json!({
        "_id": id,
        "title": format!("Listing {id}"),
        "description": "Quiet street, close to the station",
        "location": location,
        "type": "rent",
        "rentalPrice": rental,
        "houseSpecifications": { "propertyType": "house", "bedrooms": 3, "bathrooms": 2, "area": 1400 },
        "images": [],
        "userRef": owner,
        "createdAt": "2024-01-20T09:00:00.000Z",
        "updatedAt": "2024-01-20T09:00:00.000Z"
    })
}

pub fn ok(status: u16, body: &Value) -> Box<HttpResult> {
    let status = StatusCode::try_from(status).unwrap();
    let response = ResponseBuilder::with_status(status)
        .body(serde_json::to_vec(body).unwrap())
        .build();
    Box::new(Ok(response))
}

/// An `Http` effect as the shell would receive it, with the URL parsed.
pub struct SentRequest<'a> {
    pub method: &'a str,
    pub url: Url,
    request: &'a HttpRequest,
}

impl SentRequest<'_> {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.request
            .headers
            .iter()
            .find(|h| h.name.eq_ignore_ascii_case(name))
            .map(|h| h.value.as_str())
    }

    pub fn body(&self) -> &[u8] {
        &self.request.body
    }
}

pub fn http_requests(effects: &[Effect]) -> Vec<SentRequest<'_>> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::Http(request) => Some(SentRequest {
                method: request.operation.method.as_str(),
                url: Url::parse(&request.operation.url).unwrap(),
                request: &request.operation,
            }),
            _ => None,
        })
        .collect()
}

pub fn navigations(effects: &[Effect]) -> Vec<&NavigationOperation> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::Navigation(request) => Some(&request.operation),
            _ => None,
        })
        .collect()
}

pub fn delays(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|effect| matches!(effect, Effect::Delay(_)))
        .count()
}

pub fn toast_message(model: &Model) -> Option<&str> {
    model.toast.as_ref().map(|t| t.message.as_str())
}
