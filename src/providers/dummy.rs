//! Canned-reply implementation of [`ExtractionProvider`] for tests.
//!
//! Returns a fixed reply and records the excerpts it was handed, so tests can
//! assert on exactly what the handler sends upstream without any network.

use std::sync::Mutex;

use async_trait::async_trait;

use crate::errors::Result;
use crate::providers::ExtractionProvider;

pub struct DummyProvider {
    reply: String,
    excerpts: Mutex<Vec<String>>,
}

impl DummyProvider {
    pub fn new(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            excerpts: Mutex::new(Vec::new()),
        }
    }

    /// Excerpts received so far, in call order.
    pub fn excerpts(&self) -> Vec<String> {
        self.excerpts.lock().expect("excerpts lock").clone()
    }
}

#[async_trait]
impl ExtractionProvider for DummyProvider {
    async fn extract(&self, excerpt: &str) -> Result<String> {
        self.excerpts.lock().expect("excerpts lock").push(excerpt.to_string());
        Ok(self.reply.clone())
    }
}
