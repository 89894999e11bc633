use std::{io, path::Path};

use reqwest::{
    Client,
    header::{ACCEPT, HeaderValue},
    multipart::{Form, Part},
};
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use crate::{
    models::{
        cart::Cart,
        document::{DocumentHeader, ExtractedItem, ItemMapper},
        price_breakdown::PriceBreakdown,
    },
    utils::http::{HttpError, http_execute},
};

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("Document webhook URL is not configured")]
    MissingWebhook,

    #[error("Failed to read document: {0}")]
    Io(#[from] io::Error),

    #[error(transparent)]
    Http(#[from] HttpError),

    #[error("Received invalid JSON response from server: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Unexpected response format from server")]
    UnexpectedFormat,

    #[error("No line items found")]
    NoItems,
}

/// Header and positions extracted from one document.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct IngestedDocument {
    pub header: DocumentHeader,
    pub items: Vec<ExtractedItem>,
}

#[derive(Debug, Deserialize)]
struct IngestResponse {
    #[serde(flatten)]
    header: DocumentHeader,
    requested_items: Vec<ExtractedItem>,
}

/// Client of the document-ingestion webhook.
#[derive(Debug, Clone)]
pub struct DocumentClient {
    client: Client,
    webhook_url: String,
    retries: u32,
}

impl DocumentClient {
    pub fn new(client: Client, webhook_url: &str, retries: u32) -> Result<Self, IngestError> {
        if webhook_url.trim().is_empty() {
            return Err(IngestError::MissingWebhook);
        }
        Ok(Self {
            client,
            webhook_url: webhook_url.trim().to_string(),
            retries,
        })
    }

    /// Uploads `path` as the `file` part and parses the extracted document.
    pub async fn upload(&self, path: &Path) -> Result<IngestedDocument, IngestError> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        info!("Uploading {file_name} ({} bytes) for extraction", bytes.len());

        let body = http_execute(
            || {
                let part = Part::bytes(bytes.clone()).file_name(file_name.clone());
                self.client
                    .post(&self.webhook_url)
                    .header(ACCEPT, HeaderValue::from_static("application/json"))
                    .multipart(Form::new().part("file", part))
            },
            self.retries,
        )
        .await?;

        let document = parse_ingest_response(&body)?;
        info!(
            "Extracted {} items from {} {}",
            document.items.len(),
            document.header.type_of_document,
            document.header.order_or_rfq_number
        );
        Ok(document)
    }
}

/// Parses the webhook reply. A top-level array is unwrapped to its first
/// element.
pub fn parse_ingest_response(body: &str) -> Result<IngestedDocument, IngestError> {
    let mut value: Value = serde_json::from_str(body)?;
    if let Value::Array(items) = &mut value {
        if items.is_empty() {
            return Err(IngestError::UnexpectedFormat);
        }
        value = items.swap_remove(0);
    }

    if !value.get("requested_items").is_some_and(Value::is_array) {
        warn!("Unexpected response format - missing requested_items array");
        return Err(IngestError::UnexpectedFormat);
    }

    let response: IngestResponse = serde_json::from_value(value)?;
    Ok(IngestedDocument {
        header: response.header.with_defaults(),
        items: response.requested_items,
    })
}

/// Items pasted as a JSON array, a single JSON object (possibly a whole
/// ingestion reply) or one JSON object per line.
pub fn parse_pasted_items(text: &str) -> Result<Vec<ExtractedItem>, IngestError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(IngestError::NoItems);
    }

    let items = match serde_json::from_str::<Value>(text) {
        Ok(Value::Array(values)) => values
            .into_iter()
            .map(serde_json::from_value)
            .collect::<Result<Vec<ExtractedItem>, _>>()?,
        Ok(value @ Value::Object(_)) if value.get("requested_items").is_some() => {
            parse_ingest_response(text)?.items
        }
        Ok(value @ Value::Object(_)) => vec![serde_json::from_value(value)?],
        Ok(_) => return Err(IngestError::UnexpectedFormat),
        Err(_) => text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(serde_json::from_str)
            .collect::<Result<Vec<ExtractedItem>, _>>()?,
    };

    if items.is_empty() {
        return Err(IngestError::NoItems);
    }
    Ok(items)
}

/// Maps and prices every item of `items` into `cart`, in document order.
pub async fn quote_items(
    cart: &mut Cart,
    mapper: &ItemMapper,
    items: &[ExtractedItem],
) -> Vec<(Uuid, PriceBreakdown)> {
    let mut added = Vec::with_capacity(items.len());
    for item in items {
        let configuration = mapper.to_configuration(item);
        let (id, breakdown) = cart.add_item(configuration).await;
        if breakdown.is_degraded() {
            warn!("Failed to calculate price for position {}", item.pos);
        }
        added.push((id, breakdown));
    }
    added
}
