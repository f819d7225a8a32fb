//! Source caches for rendering reports with Ariadne.

use ariadne::Cache;

/// A cache holding the one source a report was made from, under the name
/// its locations carry.
pub fn source_cache(name: &str, source: &str) -> impl Cache<String> {
    ariadne::sources([(name.to_string(), source.to_string())])
}
