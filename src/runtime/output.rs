// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Operation output contracts
//!
//! `transform(d)` must return an object whose `original` deep-equals `d`, with
//! `transformed: true` and a string `timestamp`. `healthCheck` must return an
//! object with a string `status`. Anything else is `MalformedOutput`.

use crate::runtime::error::{AdapterError, AdapterResult};
use serde_json::Value;

pub fn verify_transform_output(input: &str, output: &str) -> AdapterResult<Value> {
    let expected: Value = serde_json::from_str(input).map_err(|e| {
        AdapterError::MalformedOutput(format!("input document is not JSON: {}", e))
    })?;
    let document = parse_object(output)?;

    if document.get("original") != Some(&expected) {
        return Err(AdapterError::MalformedOutput(
            "'original' does not match the input document".to_string(),
        ));
    }
    if document.get("transformed") != Some(&Value::Bool(true)) {
        return Err(AdapterError::MalformedOutput(
            "'transformed' must be true".to_string(),
        ));
    }
    if !document.get("timestamp").is_some_and(Value::is_string) {
        return Err(AdapterError::MalformedOutput(
            "'timestamp' must be a string".to_string(),
        ));
    }

    Ok(document)
}

/// Returns the reported status.
pub fn verify_health_output(output: &str) -> AdapterResult<String> {
    let document = parse_object(output)?;
    document
        .get("status")
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| AdapterError::MalformedOutput("'status' must be a string".to_string()))
}

fn parse_object(output: &str) -> AdapterResult<Value> {
    let document: Value = serde_json::from_str(output)
        .map_err(|e| AdapterError::MalformedOutput(format!("output is not JSON: {}", e)))?;
    if !document.is_object() {
        return Err(AdapterError::MalformedOutput(
            "output is not a JSON object".to_string(),
        ));
    }
    Ok(document)
}
