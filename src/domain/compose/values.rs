// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Helpers for the loosely typed corners of the Compose format

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};
use serde_yaml::Value;
use std::collections::BTreeMap;

/// Short human readable name of a YAML node kind, used in error messages.
pub fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Mapping(_) => "a mapping",
        Value::Tagged(_) => "a tagged value",
    }
}

/// Renders a scalar node as a string, rejecting collections.
pub fn scalar_to_string(value: &Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Tagged(tagged) => scalar_to_string(&tagged.value),
        other => Err(format!("expected a scalar, found {}", describe(other))),
    }
}

/// Accepts either `KEY: value` mappings or `KEY=value` lists, the way
/// `environment`, `build.args` and `sysctls` are written in Compose files.
/// A key without a value maps to `None`.
pub fn mapping_with_equals(value: Value) -> Result<BTreeMap<String, Option<String>>, String> {
    match value {
        Value::Null => Ok(BTreeMap::new()),
        Value::Mapping(map) => map
            .iter()
            .map(|(key, value)| {
                let key = scalar_to_string(key)?;
                let value = match value {
                    Value::Null => None,
                    other => Some(scalar_to_string(other)?),
                };
                Ok((key, value))
            })
            .collect(),
        Value::Sequence(items) => items
            .iter()
            .map(|item| {
                let entry = scalar_to_string(item)?;
                Ok(match entry.split_once('=') {
                    Some((key, value)) => (key.to_string(), Some(value.to_string())),
                    None => (entry, None),
                })
            })
            .collect(),
        other => Err(format!(
            "expected a mapping or a list, found {}",
            describe(&other)
        )),
    }
}

/// Same as [`mapping_with_equals`] but missing values become empty strings,
/// which is how labels are interpreted.
pub fn labels(value: Value) -> Result<BTreeMap<String, String>, String> {
    Ok(mapping_with_equals(value)?
        .into_iter()
        .map(|(key, value)| (key, value.unwrap_or_default()))
        .collect())
}

pub(crate) fn deserialize_mapping_with_equals<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<String, Option<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    mapping_with_equals(value).map_err(D::Error::custom)
}

pub(crate) fn deserialize_labels<'de, D>(
    deserializer: D,
) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    labels(value).map_err(D::Error::custom)
}

pub(crate) fn deserialize_optional_scalar<'de, D>(
    deserializer: D,
) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::Null => Ok(None),
        other => scalar_to_string(&other).map(Some).map_err(D::Error::custom),
    }
}
