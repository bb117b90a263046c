//! URL construction for the listing and detail endpoints.

use url::Url;

use crate::domain::Identifier;
use crate::infrastructure::config::{ConfigError, HarvestConfig};

/// `{base}/{collection}` plus the two request shapes hanging off it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogEndpoints {
    collection_url: Url,
}

impl CatalogEndpoints {
    pub fn new(base_url: &str, collection: &str) -> Result<Self, ConfigError> {
        let invalid = |reason: String| ConfigError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason,
        };

        let mut collection_url = Url::parse(base_url).map_err(|e| invalid(e.to_string()))?;
        collection_url
            .path_segments_mut()
            .map_err(|_| invalid("URL cannot be used as a base".to_string()))?
            .pop_if_empty()
            .push(collection);
        collection_url.set_query(None);

        Ok(Self { collection_url })
    }

    pub fn from_harvest_config(config: &HarvestConfig) -> Result<Self, ConfigError> {
        Self::new(&config.base_url, &config.collection)
    }

    /// `GET {base}/{collection}?page={n}&limit={L}`
    pub fn list_page_url(&self, page: u32, limit: u32) -> String {
        let mut url = self.collection_url.clone();
        url.query_pairs_mut()
            .append_pair("page", &page.to_string())
            .append_pair("limit", &limit.to_string());
        url.into()
    }

    /// `GET {base}/{collection}/{id}`
    pub fn detail_url(&self, identifier: &Identifier) -> String {
        let mut url = self.collection_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.push(identifier.as_str());
        }
        url.into()
    }
}
