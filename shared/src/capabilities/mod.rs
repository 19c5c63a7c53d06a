mod delay;
mod http;
mod navigation;

pub use self::delay::{Delay, DelayOperation};
pub use self::http::{
    Http, HttpError, HttpResult, InvalidUrl, RequestBuilder, Response, ValidatedUrl,
};
pub use self::navigation::{Navigation, NavigationOperation};

// Render and Http come straight from Crux; the rest are small shell protocols.
pub use crux_core::render::Render;

use crate::app::App;
use crate::event::Event;

pub type AppHttp = Http<Event>;
pub type AppDelay = Delay<Event>;
pub type AppNavigation = Navigation<Event>;
pub type AppRender = Render<Event>;

#[derive(crux_core::macros::Effect)]
#[effect(app = "App")]
pub struct Capabilities {
    pub http: Http<Event>,
    pub delay: Delay<Event>,
    pub navigation: Navigation<Event>,
    pub render: Render<Event>,
}
