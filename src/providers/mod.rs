//! Extraction provider abstraction layer
//!
//! This module defines the `ExtractionProvider` trait which abstracts the
//! outbound generative-language call: a text excerpt goes in, the model's raw
//! reply text comes out. Keeping the seam here lets the upstream provider be
//! swapped or mocked in tests without touching the request handler.

use async_trait::async_trait;

use crate::errors::Result;

pub mod dummy;
pub mod gemini;

/// The fixed instruction prompt paired with every excerpt. Describes the
/// desired output schema; process-wide and immutable.
pub const EXTRACTION_PROMPT: &str = "\
Extract the following information in JSON format:
- Invoices: { Serial Number, Customer Name, Product Name, Qty, Tax, Total Amount, Date }
- Products: { Product Name, Category, Unit Price, Tax, Price with Tax, Stock Quantity }
- Customers: { Customer Name, Phone Number, Total Purchase Amount }
Ensure the response follows strict JSON formatting.";

/// Excerpt in, free-form reply text out.
#[async_trait]
pub trait ExtractionProvider: Send + Sync {
    async fn extract(&self, excerpt: &str) -> Result<String>;
}
