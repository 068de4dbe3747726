//! Internal link discovery for a registered site.

mod links;

pub use links::{extract_internal_links, same_origin, LinkDiscoverer};
