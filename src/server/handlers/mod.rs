//! HTTP request handlers for the web server.

mod api_types;
mod events;
mod seo;

pub use events::event_stream;
pub use seo::{
    get_compliance, get_performance, health, register_site, trigger_compliance,
    trigger_performance,
};
