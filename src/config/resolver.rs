//! ConfigResolver: layered merge with remote fetch
//!
//! Precedence, lowest to highest:
//! built-in defaults < remote < scraped < caller override

use std::cell::RefCell;
use std::rc::Rc;

use super::{PartialWidgetConfig, WidgetConfig};
use crate::error::{ConfigError, TransportError};
use crate::host::HttpClient;

/// Merge layers over the built-in defaults
pub fn resolve(
    remote: Option<&PartialWidgetConfig>,
    scraped: Option<&PartialWidgetConfig>,
    overrides: Option<&PartialWidgetConfig>,
) -> WidgetConfig {
    let mut config = WidgetConfig::default();
    for layer in [remote, scraped, overrides].into_iter().flatten() {
        layer.apply_to(&mut config);
    }
    config.normalized()
}

/// Owns the remote config layer for the lifetime of a controller.
///
/// A successful fetch is cached; a failed one is retried on the next call.
pub struct ConfigResolver {
    endpoint: Option<String>,
    http: Rc<dyn HttpClient>,
    cached: RefCell<Option<PartialWidgetConfig>>,
}

impl ConfigResolver {
    pub fn new(endpoint: Option<String>, http: Rc<dyn HttpClient>) -> Self {
        Self {
            endpoint: endpoint.filter(|e| !e.trim().is_empty()),
            http,
            cached: RefCell::new(None),
        }
    }

    pub fn has_remote(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Remote layer, or `None` when unconfigured or unreachable
    pub async fn remote(&self) -> Option<PartialWidgetConfig> {
        let cached = self.cached.borrow().clone();
        if cached.is_some() {
            return cached;
        }
        let url = self.endpoint.clone()?;
        match self.fetch(&url).await {
            Ok(layer) => {
                *self.cached.borrow_mut() = Some(layer.clone());
                Some(layer)
            }
            Err(err) => {
                log::warn!("{}; using built-in defaults", err);
                None
            }
        }
    }

    async fn fetch(&self, url: &str) -> Result<PartialWidgetConfig, ConfigError> {
        let response = self.http.get(url).await?;
        if !response.is_success() {
            return Err(TransportError::Status(response.status).into());
        }
        PartialWidgetConfig::from_json(&response.body)
    }

    /// Fetch the remote layer and merge it under `scraped` and `overrides`
    pub async fn resolve(
        &self,
        scraped: Option<&PartialWidgetConfig>,
        overrides: Option<&PartialWidgetConfig>,
    ) -> WidgetConfig {
        let remote = self.remote().await;
        resolve(remote.as_ref(), scraped, overrides)
    }
}
