//! Best-effort parsing of the model's reply text.
//!
//! The model is asked for strict JSON but frequently wraps it in Markdown code
//! fences or surrounds it with prose. The cleanup here deliberately matches
//! the contract of the service this replaces: strip fences, take the span from
//! the first `{` to the last `}`, and attempt one strict JSON parse. Anything
//! that still fails degrades to the raw-text fallback rather than an error.
//! The brace-span match is a known weak contract (it mis-handles multiple
//! top-level objects and top-level arrays) and is preserved for compatibility.

use serde_json::Value;

/// Outcome of parsing a model reply.
#[derive(Debug, PartialEq)]
pub enum StructuredReply {
    /// The reply parsed as JSON. Collections default to empty when the
    /// corresponding top-level key is absent or not an array.
    Parsed {
        invoices: Vec<Value>,
        products: Vec<Value>,
        customers: Vec<Value>,
    },
    /// The reply was not valid JSON after cleanup; carries the cleaned text.
    Raw(String),
}

/// Clean up a raw model reply and attempt to parse it.
pub fn parse_reply(raw: &str) -> StructuredReply {
    let cleaned = raw.replace("```json", "").replace("```", "");
    let cleaned = cleaned.trim();

    // First top-level brace-delimited span, if any; otherwise the whole text
    let candidate = match (cleaned.find('{'), cleaned.rfind('}')) {
        (Some(start), Some(end)) if start < end => &cleaned[start..=end],
        _ => cleaned,
    };

    match serde_json::from_str::<Value>(candidate) {
        Ok(value) => {
            let field = |key: &str| match value.get(key) {
                Some(Value::Array(items)) => items.clone(),
                _ => Vec::new(),
            };
            StructuredReply::Parsed {
                invoices: field("Invoices"),
                products: field("Products"),
                customers: field("Customers"),
            }
        }
        Err(_) => StructuredReply::Raw(cleaned.to_string()),
    }
}
