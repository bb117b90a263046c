//! # Page Walker
//!
//! Sequential pagination over the listing endpoint. Produces the complete,
//! de-duplicated identifier set before any detail is fetched.

use std::collections::HashSet;
use tracing::{debug, info, warn};

use crate::crawling::endpoints::CatalogEndpoints;
use crate::domain::{Identifier, Page};
use crate::infrastructure::retry_manager::RetryingFetcher;

pub struct PageWalker {
    fetcher: RetryingFetcher,
    endpoints: CatalogEndpoints,
    page_limit: u32,
    stop_on_short_page: bool,
}

impl PageWalker {
    pub fn new(
        fetcher: RetryingFetcher,
        endpoints: CatalogEndpoints,
        page_limit: u32,
        stop_on_short_page: bool,
    ) -> Self {
        Self {
            fetcher,
            endpoints,
            page_limit: page_limit.max(1),
            stop_on_short_page,
        }
    }

    /// Walk pages 1, 2, 3, ... until a page is absent or has no results.
    ///
    /// An absent page (permanent fetch failure) ends discovery just like an
    /// empty one; identifiers gathered so far are kept. With
    /// `stop_on_short_page` a page with fewer than `page_limit` entries also
    /// ends the walk.
    pub async fn collect_all_identifiers(&self) -> Vec<Identifier> {
        let mut identifiers = Vec::new();
        let mut seen = HashSet::new();
        let mut page_number: u32 = 1;

        loop {
            let url = self.endpoints.list_page_url(page_number, self.page_limit);
            let Some(payload) = self.fetcher.fetch(&url).await else {
                if page_number == 1 {
                    warn!("⚠️ First listing page unavailable, treating catalog as empty");
                } else {
                    warn!("⚠️ Listing page {} unavailable, ending discovery", page_number);
                }
                break;
            };

            let page = Page::from_payload(page_number, &payload);
            if page.is_empty() {
                debug!("Page {} is empty, discovery complete", page_number);
                break;
            }

            let skipped = page.entry_count - page.identifiers.len();
            if skipped > 0 {
                debug!("Page {}: skipped {} entries without a usable uid", page_number, skipped);
            }

            let is_short = page.is_short(self.page_limit);
            for identifier in page.identifiers {
                if seen.insert(identifier.clone()) {
                    identifiers.push(identifier);
                } else {
                    debug!("Duplicate identifier {} on page {}", identifier, page_number);
                }
            }
            debug!("📄 Page {}: {} identifiers so far", page_number, identifiers.len());

            if self.stop_on_short_page && is_short {
                debug!("Page {} is short, discovery complete", page_number);
                break;
            }

            match page_number.checked_add(1) {
                Some(next) => page_number = next,
                None => break,
            }
        }

        info!("🔍 Discovered {} identifiers", identifiers.len());
        identifiers
    }
}
