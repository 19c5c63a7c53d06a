//! REST endpoints of the listing backend and the shapes they exchange.

use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize, Serializer};
use thiserror::Error;
use url::Url;

use crate::capabilities::{
    AppHttp, HttpError, HttpResult, InvalidUrl, RequestBuilder, Response, ValidatedUrl,
};
use crate::config::ClientConfig;
use crate::event::Event;
use crate::form::SelectedFile;
use crate::model::{Listing, ListingId, User, UserId};
use crate::multipart::MultipartForm;
use crate::{AppError, AppResult, ErrorKind};

const JSON: &str = "application/json";

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SignUpRequest {
    pub username: String,
    pub email: String,
    #[serde(serialize_with = "expose")]
    pub password: SecretString,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct SignInRequest {
    pub email: String,
    #[serde(serialize_with = "expose")]
    pub password: SecretString,
}

/// What the shell's Google popup returned. The backend creates the account
/// on first use.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct GoogleIdentity {
    pub name: String,
    pub email: String,
    #[serde(default)]
    pub photo: Option<String>,
}

/// Profile edits. Unset fields are left alone by the server.
#[derive(Serialize, Deserialize, Clone, Debug, Default)]
pub struct ProfileUpdate {
    pub username: Option<String>,
    pub email: Option<String>,
    #[serde(serialize_with = "expose_optional")]
    pub password: Option<SecretString>,
    pub avatar: Option<SelectedFile>,
}

impl ProfileUpdate {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.username.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.avatar.is_none()
    }

    #[must_use]
    pub fn to_multipart(&self) -> MultipartForm {
        let mut form = MultipartForm::new();
        if let Some(username) = self.username.as_deref().filter(|s| !s.trim().is_empty()) {
            form = form.text("username", username.trim());
        }
        if let Some(email) = self.email.as_deref().filter(|s| !s.trim().is_empty()) {
            form = form.text("email", email.trim());
        }
        if let Some(password) = self
            .password
            .as_ref()
            .map(ExposeSecret::expose_secret)
            .filter(|p| !p.is_empty())
        {
            form = form.text("password", password.as_str());
        }
        if let Some(avatar) = &self.avatar {
            form = form.file(
                "avatar",
                avatar.name.as_str(),
                avatar.mime_type.as_str(),
                avatar.bytes.clone(),
            );
        }
        form
    }
}

// Passwords only leave the secret wrapper on their way into a request body.
fn expose<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

fn expose_optional<S: Serializer>(
    secret: &Option<SecretString>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    match secret {
        Some(secret) => serializer.serialize_some(secret.expose_secret().as_str()),
        None => serializer.serialize_none(),
    }
}

#[derive(Deserialize, Clone, Debug, PartialEq)]
pub struct ListingEnvelope {
    #[serde(default)]
    pub message: String,
    pub listing: Listing,
}

#[derive(Deserialize, Clone, Debug, PartialEq, Eq, Default)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: String,
}

/// Auth and profile endpoints answer either `{message, user}` or the bare
/// user document.
#[derive(Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(untagged)]
pub enum UserPayload {
    Wrapped {
        user: User,
        #[serde(default)]
        message: String,
    },
    Bare(User),
}

impl UserPayload {
    #[must_use]
    pub fn into_user(self) -> User {
        match self {
            Self::Wrapped { user, .. } | Self::Bare(user) => user,
        }
    }
}

/// A request that could not be built. Nothing was sent.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error(transparent)]
    Url(#[from] InvalidUrl),

    #[error("could not encode request body: {0}")]
    Body(#[from] serde_json::Error),
}

pub type Request = RequestBuilder<Event>;

/// Request builders bound to one base URL. Callers finish a request with
/// `.send(..)`.
pub struct Api<'a> {
    config: &'a ClientConfig,
    http: &'a AppHttp,
}

impl<'a> Api<'a> {
    #[must_use]
    pub const fn new(config: &'a ClientConfig, http: &'a AppHttp) -> Self {
        Self { config, http }
    }

    pub fn search(&self, query: &str) -> Result<Request, RequestError> {
        let url = endpoint(self.config, &["listing", "search"], Some(query))?;
        Ok(accept_json(self.http.get(url)))
    }

    pub fn listing(&self, id: &ListingId) -> Result<Request, RequestError> {
        let url = endpoint(self.config, &["listing", id.as_str()], None)?;
        Ok(accept_json(self.http.get(url)))
    }

    pub fn create_listing(
        &self,
        user_id: &UserId,
        form: MultipartForm,
    ) -> Result<Request, RequestError> {
        let url = endpoint(self.config, &["listing", user_id.as_str(), "create"], None)?;
        Ok(multipart(self.http.post(url), form))
    }

    pub fn update_listing(
        &self,
        id: &ListingId,
        form: MultipartForm,
    ) -> Result<Request, RequestError> {
        let url = endpoint(self.config, &["listing", id.as_str(), "update"], None)?;
        Ok(multipart(self.http.put(url), form))
    }

    pub fn delete_listing(&self, id: &ListingId) -> Result<Request, RequestError> {
        let url = endpoint(self.config, &["listing", id.as_str(), "delete"], None)?;
        Ok(accept_json(self.http.delete(url)))
    }

    pub fn user_listings(&self, user_id: &UserId) -> Result<Request, RequestError> {
        let url = endpoint(self.config, &["user", user_id.as_str(), "listings"], None)?;
        Ok(accept_json(self.http.get(url)))
    }

    pub fn sign_up(&self, request: &SignUpRequest) -> Result<Request, RequestError> {
        let url = endpoint(self.config, &["auth", "signup"], None)?;
        json_body(self.http.post(url), request)
    }

    pub fn sign_in(&self, request: &SignInRequest) -> Result<Request, RequestError> {
        let url = endpoint(self.config, &["auth", "signin"], None)?;
        json_body(self.http.post(url), request)
    }

    pub fn google_sign_in(&self, identity: &GoogleIdentity) -> Result<Request, RequestError> {
        let url = endpoint(self.config, &["auth", "google-auth"], None)?;
        json_body(self.http.post(url), identity)
    }

    pub fn sign_out(&self) -> Result<Request, RequestError> {
        let url = endpoint(self.config, &["auth", "signout"], None)?;
        Ok(accept_json(self.http.get(url)))
    }

    pub fn update_profile(
        &self,
        user_id: &UserId,
        update: &ProfileUpdate,
    ) -> Result<Request, RequestError> {
        let url = endpoint(self.config, &["user", user_id.as_str(), "update"], None)?;
        Ok(multipart(self.http.put(url), update.to_multipart()))
    }

    pub fn delete_account(&self, user_id: &UserId) -> Result<Request, RequestError> {
        let url = endpoint(self.config, &["user", user_id.as_str(), "delete"], None)?;
        Ok(accept_json(self.http.delete(url)))
    }
}

/// Appends percent-encoded `segments` to the configured base URL.
pub fn endpoint(
    config: &ClientConfig,
    segments: &[&str],
    query: Option<&str>,
) -> Result<Url, InvalidUrl> {
    let base = config.base_url();
    let mut url = ValidatedUrl::new(base)?.into_url();
    url.path_segments_mut()
        .map_err(|()| InvalidUrl {
            url: base.to_string(),
            reason: "base URL cannot take a path".into(),
        })?
        .pop_if_empty()
        .extend(segments);
    url.set_query(query.filter(|q| !q.is_empty()));
    Ok(ValidatedUrl::from_url(url)?.into_url())
}

fn accept_json(request: Request) -> Request {
    request.header("Accept", JSON)
}

fn json_body<T: Serialize>(request: Request, body: &T) -> Result<Request, RequestError> {
    let bytes = serde_json::to_vec(body)?;
    Ok(accept_json(request.body_bytes(bytes).header("Content-Type", JSON)))
}

fn multipart(request: Request, form: MultipartForm) -> Request {
    let content_type = form.content_type();
    accept_json(
        request
            .body_bytes(form.into_body())
            .header("Content-Type", content_type),
    )
}

#[must_use]
pub fn request_error(error: &RequestError) -> AppError {
    let kind = match error {
        RequestError::Url(_) => ErrorKind::Internal,
        RequestError::Body(_) => ErrorKind::Serialization,
    };
    AppError::new(kind, "could not build request").with_internal(error.to_string())
}

fn transport_error(error: &HttpError) -> AppError {
    match error {
        HttpError::Http { code, body, .. } => {
            AppError::from_http_status(u16::from(*code), body.as_deref())
        }
        HttpError::Timeout => {
            AppError::new(ErrorKind::Timeout, "request timed out").with_internal(error.to_string())
        }
        _ => AppError::new(ErrorKind::Network, "request failed").with_internal(error.to_string()),
    }
}

/// Fails on transport errors and non-2xx statuses, keeping the server's
/// `message` for the toast.
pub fn check(result: HttpResult) -> AppResult<Response<Vec<u8>>> {
    let response = result.map_err(|e| transport_error(&e))?;
    if response.status().is_success() {
        Ok(response)
    } else {
        Err(AppError::from_http_status(
            u16::from(response.status()),
            response.body().map(Vec::as_slice),
        ))
    }
}

pub fn decode<T: DeserializeOwned>(result: HttpResult) -> AppResult<T> {
    let response = check(result)?;
    let body = response.body().map(Vec::as_slice).unwrap_or_default();
    serde_json::from_slice(body).map_err(|e| {
        AppError::new(ErrorKind::Deserialization, "unexpected response body")
            .with_internal(e.to_string())
            .with_context("http_status", u16::from(response.status()).to_string())
    })
}
