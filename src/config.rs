use std::{path::PathBuf, sync::Arc, time::Duration};

use config::{Config, ConfigError, Environment, File};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

use crate::{
    catalog::{HttpCatalog, OptionResolver},
    models::cost_table::{CostTable, CostTableError},
    pricing::{PriceEngine, PricingStrategy},
    store::QuoteStore,
    utils::http::{HttpError, http_client},
};

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Configuration loading failed: {0}")]
    Load(#[from] ConfigError),

    #[error(transparent)]
    CostTable(#[from] CostTableError),

    #[error(transparent)]
    Http(#[from] HttpError),
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    pub chat: WebhookSettings,
    pub ingest: WebhookSettings,
    pub catalog: CatalogSettings,
    pub http: HttpSettings,
    pub pricing: PricingSettings,
    pub store: StoreSettings,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct WebhookSettings {
    pub webhook_url: String,
}

/// Remote config service. Both fields are required to use it.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CatalogSettings {
    pub url: Option<String>,
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpSettings {
    pub timeout_secs: u64,
    pub retries: u32,
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            timeout_secs: 30,
            retries: 0,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct PricingSettings {
    pub strategy: PricingStrategy,
    /// JSON file replacing the built-in cost table.
    pub cost_table: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub quotes_path: PathBuf,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            quotes_path: PathBuf::from("quotes.json"),
        }
    }
}

impl Settings {
    pub fn load(config_path: &Option<String>) -> Result<Self, SettingsError> {
        let default = Self::default();

        match Self::load_from_file(config_path) {
            Ok(settings) => Ok(settings),
            Err(err) if config_path.is_none() => {
                warn!("Could not read config file: {err}. Using default configuration.",);
                Ok(default)
            }
            Err(err) => Err(err),
        }
    }

    fn load_from_file(config_path: &Option<String>) -> Result<Self, SettingsError> {
        let path = config_path.as_deref().unwrap_or("config.toml");

        let config = Config::builder()
            .add_source(File::with_name(path).required(config_path.is_some()))
            .add_source(
                Environment::with_prefix("NOSTA_QUOTE")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()?
            .try_deserialize::<Settings>()?;

        Ok(config)
    }

    pub fn http_client(&self) -> Result<Client, SettingsError> {
        Ok(http_client(Duration::from_secs(self.http.timeout_secs))?)
    }

    pub fn cost_table(&self) -> Result<CostTable, SettingsError> {
        match &self.pricing.cost_table {
            Some(path) => {
                info!("Loading cost table from {}", path.display());
                Ok(CostTable::from_file(path)?)
            }
            None => Ok(CostTable::builtin()),
        }
    }

    /// The config service client, when both URL and key are set.
    pub fn remote_catalog(&self, client: &Client, table: &CostTable) -> Option<HttpCatalog> {
        let url = self.catalog.url.as_deref().filter(|u| !u.trim().is_empty())?;
        let api_key = self.catalog.api_key.as_deref().filter(|k| !k.trim().is_empty())?;
        Some(HttpCatalog::new(
            client.clone(),
            url,
            api_key,
            self.http.retries,
            table.clone(),
        ))
    }

    pub fn price_engine(
        &self,
        client: &Client,
        strategy: Option<PricingStrategy>,
    ) -> Result<PriceEngine, SettingsError> {
        let table = self.cost_table()?;
        let strategy = strategy.unwrap_or(self.pricing.strategy);
        Ok(match self.remote_catalog(client, &table) {
            Some(catalog) => PriceEngine::new(Arc::new(catalog), strategy),
            None => PriceEngine::offline(table, strategy),
        })
    }

    pub fn option_resolver(&self, client: &Client) -> OptionResolver {
        let table = CostTable::builtin();
        let remote = self
            .remote_catalog(client, &table)
            .map(|catalog| Arc::new(catalog) as Arc<dyn crate::catalog::OptionSource>);
        OptionResolver::new(remote)
    }

    pub fn quote_store(&self) -> QuoteStore {
        QuoteStore::new(&self.store.quotes_path)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn defaults_without_config_file() {
        let settings = Settings::load(&None).unwrap();
        assert_eq!(settings.http.timeout_secs, 30);
        assert_eq!(settings.http.retries, 0);
        assert_eq!(settings.pricing.strategy, PricingStrategy::PerUnit);
        assert!(settings.chat.webhook_url.is_empty());
    }

    #[test]
    fn reads_sections_from_file() {
        let mut file = NamedTempFile::with_suffix(".toml").unwrap();
        writeln!(
            file,
            r#"
[chat]
webhook_url = "https://n8n.example.com/webhook/chat"

[http]
retries = 2

[pricing]
strategy = "per-order-with-volume-discount"
"#
        )
        .unwrap();

        let path = file.path().to_string_lossy().into_owned();
        let settings = Settings::load(&Some(path)).unwrap();
        assert_eq!(settings.chat.webhook_url, "https://n8n.example.com/webhook/chat");
        assert_eq!(settings.http.retries, 2);
        assert_eq!(settings.http.timeout_secs, 30);
        assert_eq!(
            settings.pricing.strategy,
            PricingStrategy::PerOrderWithVolumeDiscount
        );
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let missing = Some("/nonexistent/nosta-quote.toml".to_string());
        assert!(matches!(Settings::load(&missing), Err(SettingsError::Load(_))));
    }

    #[test]
    fn remote_catalog_needs_url_and_key() {
        let client = Client::new();
        let table = CostTable::builtin();
        let mut settings = Settings::default();
        settings.catalog.url = Some("https://db.example.com".into());
        assert!(settings.remote_catalog(&client, &table).is_none());

        settings.catalog.api_key = Some("anon".into());
        assert!(settings.remote_catalog(&client, &table).is_some());
    }
}
