use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::reply::StructuredReply;

/// Response body for `POST /api/process-file`.
///
/// All four keys are always present. On a successful JSON parse of the model
/// reply the three collections carry the extracted records and `rawResponse`
/// is null; on a reply-shape mismatch the collections are empty and
/// `rawResponse` carries the cleaned reply text verbatim.
#[derive(Debug, Serialize, Deserialize)]
pub struct ProcessFileResponse {
    pub invoices: Vec<Value>,
    pub products: Vec<Value>,
    pub customers: Vec<Value>,
    #[serde(rename = "rawResponse")]
    pub raw_response: Option<String>,
}

impl From<StructuredReply> for ProcessFileResponse {
    fn from(reply: StructuredReply) -> Self {
        match reply {
            StructuredReply::Parsed {
                invoices,
                products,
                customers,
            } => Self {
                invoices,
                products,
                customers,
                raw_response: None,
            },
            StructuredReply::Raw(text) => Self {
                invoices: Vec::new(),
                products: Vec::new(),
                customers: Vec::new(),
                raw_response: Some(text),
            },
        }
    }
}
