use std::sync::Once;

use an_core::CategoryCode;
use tracing::{info_span, Level, Span};

static INIT: Once = Once::new();

/// Installs the fmt subscriber once; a subscriber installed elsewhere is left alone.
pub fn init_logging(level: Level) {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(level)
            .with_target(false)
            .try_init();
    });
}

/// Span for one (category, source) unit of work.
pub fn unit_span(category: &CategoryCode, source: &str) -> Span {
    info_span!("unit", category = %category, source = %source)
}

/// Span for one article inside a unit.
pub fn article_span(title: &str, url: &str) -> Span {
    info_span!("article", article = %title, url = %url)
}
