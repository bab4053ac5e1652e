// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Unmarshalling of `{code, data}` response envelopes.
//!
//! A failed decode still hands back whatever could be salvaged (the zero
//! value at worst) next to the error, so callers can show partial results.
//! Inside a map entry, only the members of the wrong type are zeroed.

use super::model::Envelope;
use crate::error::DecodeError;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use std::collections::HashMap;
use tracing::debug;

const EXCERPT_LEN: usize = 256;

impl DecodeError {
    pub fn new(endpoint: &str, raw: &[u8], source: serde_json::Error) -> Self {
        let shown = &raw[..raw.len().min(EXCERPT_LEN)];
        let mut excerpt = String::from_utf8_lossy(shown).into_owned();
        if raw.len() > EXCERPT_LEN {
            excerpt.push_str("...");
        }
        Self {
            endpoint: endpoint.to_string(),
            excerpt,
            source,
        }
    }
}

fn log_code<T>(endpoint: &str, envelope: &Envelope<T>) {
    if envelope.code != 200 {
        debug!("{} responded with code {}", endpoint, envelope.code);
    }
}

/// Decode the `data` field of an envelope into `T`, or `T::default()` on failure
pub fn decode<T>(endpoint: &str, raw: &[u8]) -> (T, Option<DecodeError>)
where
    T: DeserializeOwned + Default,
{
    match serde_json::from_slice::<Envelope<T>>(raw) {
        Ok(envelope) => {
            log_code(endpoint, &envelope);
            (envelope.data.unwrap_or_default(), None)
        }
        Err(source) => (T::default(), Some(DecodeError::new(endpoint, raw, source))),
    }
}

/// Decode a `data` object keyed by label. When the envelope as a whole does
/// not fit, every entry that still decodes on its own is kept.
pub fn decode_map<V>(endpoint: &str, raw: &[u8]) -> (HashMap<String, V>, Option<DecodeError>)
where
    V: DeserializeOwned,
{
    match serde_json::from_slice::<Envelope<HashMap<String, V>>>(raw) {
        Ok(envelope) => {
            log_code(endpoint, &envelope);
            (envelope.data.unwrap_or_default(), None)
        }
        Err(source) => {
            let salvaged = salvage_entries(raw);
            debug!(
                "salvaged {} entries from malformed {} response",
                salvaged.len(),
                endpoint
            );
            (salvaged, Some(DecodeError::new(endpoint, raw, source)))
        }
    }
}

fn salvage_entries<V: DeserializeOwned>(raw: &[u8]) -> HashMap<String, V> {
    let Ok(mut envelope) = serde_json::from_slice::<Value>(raw) else {
        return HashMap::new();
    };
    let Some(Value::Object(entries)) = envelope.get_mut("data").map(Value::take) else {
        return HashMap::new();
    };

    entries
        .into_iter()
        .filter_map(|(label, value)| salvage_entry(value).map(|decoded| (label, decoded)))
        .collect()
}

/// Decode one entry, zeroing the members that don't fit their field
fn salvage_entry<V: DeserializeOwned>(value: Value) -> Option<V> {
    let Value::Object(members) = value else {
        return serde_json::from_value(value).ok();
    };
    if let Ok(decoded) = serde_json::from_value(Value::Object(members.clone())) {
        return Some(decoded);
    }

    let kept: Map<String, Value> = members
        .into_iter()
        .filter(|(key, member)| {
            let single = Map::from_iter([(key.clone(), member.clone())]);
            let fits = serde_json::from_value::<V>(Value::Object(single)).is_ok();
            if !fits {
                debug!("dropping malformed field {}", key);
            }
            fits
        })
        .collect();
    serde_json::from_value(Value::Object(kept)).ok()
}
