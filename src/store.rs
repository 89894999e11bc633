//! Local JSON file of saved quotes.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::info;

use crate::models::{cart::Cart, saved_quote::SavedQuote};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Failed to access quote store: {0}")]
    Io(#[from] io::Error),

    #[error("Quote store is corrupt: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Refusing to save an empty quote")]
    EmptyCart,
}

#[derive(Debug, Clone)]
pub struct QuoteStore {
    path: PathBuf,
}

impl QuoteStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Saved quotes, oldest first. A missing file is an empty store.
    pub fn list(&self) -> Result<Vec<SavedQuote>, StoreError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };
        if raw.trim().is_empty() {
            return Ok(Vec::new());
        }
        Ok(serde_json::from_str(&raw)?)
    }

    pub fn save(
        &self,
        cart: &Cart,
        rfq_number: Option<String>,
        customer: Option<String>,
    ) -> Result<SavedQuote, StoreError> {
        if cart.is_empty() {
            return Err(StoreError::EmptyCart);
        }
        let quote = SavedQuote::from_cart(cart, rfq_number, customer);
        let mut quotes = self.list()?;
        quotes.push(quote.clone());

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&quotes)?)?;
        info!(
            "Saved quote with {} items to {}",
            quote.item_count,
            self.path.display()
        );
        Ok(quote)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use super::*;
    use crate::{
        models::{configuration::Configuration, cost_table::CostTable},
        pricing::{PriceEngine, PricingStrategy},
    };

    async fn one_item_cart() -> Cart {
        let mut cart = Cart::new(PriceEngine::offline(CostTable::builtin(), PricingStrategy::PerUnit));
        cart.add_item(Configuration {
            product_group: "Passfeder (Keyway)".into(),
            material: "C45".into(),
            width: 6.0,
            height: 4.0,
            depth: 10.0,
            quantity: 400,
            ..Default::default()
        })
        .await;
        cart
    }

    #[tokio::test]
    async fn appends_and_lists_quotes() {
        let dir = tempdir().unwrap();
        let store = QuoteStore::new(dir.path().join("nested/quotes.json"));
        assert!(store.list().unwrap().is_empty());

        let cart = one_item_cart().await;
        store.save(&cart, Some("RFQ-1".into()), None).unwrap();
        store.save(&cart, None, Some("ACME".into())).unwrap();

        let quotes = store.list().unwrap();
        assert_eq!(quotes.len(), 2);
        assert_eq!(quotes[0].total, 1132.0);
        assert_eq!(quotes[0].item_count, 1);
        assert_eq!(quotes[0].rfq_number.as_deref(), Some("RFQ-1"));
        assert_eq!(quotes[1].customer.as_deref(), Some("ACME"));
        assert_eq!(quotes[1].items[0].configuration.width, 6.0);
    }

    #[tokio::test]
    async fn rejects_empty_cart_and_corrupt_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("quotes.json");
        let store = QuoteStore::new(&path);

        let empty = Cart::new(PriceEngine::offline(CostTable::builtin(), PricingStrategy::PerUnit));
        assert!(matches!(store.save(&empty, None, None), Err(StoreError::EmptyCart)));

        fs::write(&path, "not json").unwrap();
        assert!(matches!(store.list(), Err(StoreError::Parse(_))));
    }
}
