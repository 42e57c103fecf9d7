//! Publish request/response models

use serde::Deserialize;

use crate::services::publisher::{PublishError, PublishReceipt};

/// POST /api/publish request body
#[derive(Deserialize, Debug)]
pub struct PublishRequest {
    pub platforms: Vec<String>,
    pub text: String,
}

/// One platform's outcome, shaped for the response map. Failure is a
/// value here: `{ok: false, error}` sits next to the successes.
pub fn outcome_entry(result: &Result<PublishReceipt, PublishError>) -> serde_json::Value {
    match result {
        Ok(receipt) => {
            let mut entry = serde_json::json!({ "ok": true });
            if let Some(id) = &receipt.id {
                entry["id"] = serde_json::Value::String(id.clone());
            }
            if let Some(url) = &receipt.url {
                entry["url"] = serde_json::Value::String(url.clone());
            }
            entry
        }
        Err(e) => serde_json::json!({ "ok": false, "error": e.to_string() }),
    }
}
