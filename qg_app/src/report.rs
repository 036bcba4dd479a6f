//! JSON lines printed by the batch fetcher, one per URL
use std::fmt::Display;

use serde_json::Value;
use serde_json::json;

/// Line for a response whose body was read (or failed to read)
///
/// Bodies that parse as JSON are embedded as is, anything else as a string.
/// A failed read keeps the status and reports the error in place of the body.
pub fn response_line<E: Display>(url: &str, status: u16, body: Result<String, E>) -> Value {
    match body {
        Ok(text) => {
            let body = serde_json::from_str::<Value>(&text).unwrap_or(Value::String(text));
            json!({ "url": url, "status": status, "body": body })
        }
        Err(err) => json!({ "url": url, "status": status, "error": err.to_string() }),
    }
}

/// Line for a request that never produced a response
pub fn failure_line<E: Display>(url: &str, err: &E) -> Value {
    json!({ "url": url, "error": err.to_string() })
}
