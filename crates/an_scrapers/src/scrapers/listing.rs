use an_core::{ArticleStub, Result, SourceConfig};
use scraper::{ElementRef, Html};
use tracing::debug;

use super::{utils, SourceSelectors};

/// Listing pages are newest-first, so the first few items are the fresh ones.
pub const DEFAULT_LISTING_LIMIT: usize = 5;

/// Extracts at most `limit` article stubs from a listing page.
///
/// Items missing a title or a link are skipped. Only an invalid selector in `config`
/// fails the whole extraction.
pub fn extract_stubs(html: &str, config: &SourceConfig, limit: usize) -> Result<Vec<ArticleStub>> {
    let selectors = SourceSelectors::compile(config)?;
    let document = Html::parse_document(html);

    let stubs = document
        .select(&selectors.article)
        .take(limit)
        .filter_map(|item| match extract_stub(item, &selectors, config) {
            Ok(stub) => stub,
            Err(e) => {
                debug!(source = %config.id, error = %e, "skipping listing item");
                None
            }
        })
        .collect();

    Ok(stubs)
}

fn extract_stub(
    item: ElementRef<'_>,
    selectors: &SourceSelectors,
    config: &SourceConfig,
) -> Result<Option<ArticleStub>> {
    let Some(title) = item.select(&selectors.title).next() else {
        debug!(source = %config.id, "listing item without title");
        return Ok(None);
    };
    let Some(href) = item
        .select(&selectors.link)
        .next()
        .and_then(|link| link.value().attr("href"))
    else {
        debug!(source = %config.id, "listing item without link");
        return Ok(None);
    };

    let title = utils::clean_text(title);
    if title.is_empty() {
        return Ok(None);
    }
    let url = utils::absolute_url(&config.base_url, href)?;

    let raw_date = item
        .select(&selectors.date)
        .next()
        .map(|date| match date.value().attr("datetime") {
            Some(machine) if !machine.trim().is_empty() => machine.trim().to_string(),
            _ => utils::clean_text(date),
        })
        .unwrap_or_default();

    let author = item
        .select(&selectors.author)
        .next()
        .map(utils::clean_text)
        .filter(|a| !a.is_empty());

    Ok(Some(ArticleStub {
        title,
        url,
        raw_date,
        author,
    }))
}
