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

//! Copy declarations
//!
//! Each entry of a rendered copy fragment maps a component name to the files
//! copied into it, written as a single `source:destination` string, a list of
//! them, or a mapping of source to destination.

use crate::domain::compose::values::{describe, scalar_to_string};
use crate::domain::pod::Layer;
use crate::shared::error::{Result, TransformError};
use serde_yaml::{Mapping, Value};

/// Rewrites every entry of `fragment` into a sequence of `source:destination` strings.
pub fn normalize_copy_fragment(fragment: Mapping, service: &str) -> Result<Mapping> {
    let mut normalized = Mapping::with_capacity(fragment.len());

    for (target, copies) in fragment {
        let copies = match copies {
            Value::Mapping(pairs) => {
                let mut items = Vec::with_capacity(pairs.len());
                for (source, destination) in &pairs {
                    items.push(Value::String(copy_pair(source, destination, service)?));
                }
                Value::Sequence(items)
            }
            Value::String(single) => Value::Sequence(vec![Value::String(single)]),
            other => other,
        };
        normalized.insert(target, copies);
    }

    Ok(normalized)
}

fn copy_pair(source: &Value, destination: &Value, service: &str) -> Result<String> {
    let source = scalar_to_string(source).map_err(|e| copy_error(service, e))?;
    let destination = scalar_to_string(destination).map_err(|e| copy_error(service, e))?;
    Ok(format!("{}:{}", source, destination))
}

/// Final list of copy pairs for one merged entry.
pub fn copy_pairs(copies: &Value, service: &str) -> Result<Vec<String>> {
    match copies {
        Value::Sequence(items) => items
            .iter()
            .map(|item| scalar_to_string(item).map_err(|e| copy_error(service, e)))
            .collect(),
        Value::String(single) => Ok(vec![single.clone()]),
        Value::Null => Ok(Vec::new()),
        other => Err(copy_error(
            service,
            format!(
                "expected a string, a list or a mapping of copies, found {}",
                describe(other)
            ),
        )),
    }
}

fn copy_error(service: &str, message: String) -> TransformError {
    TransformError::schema(service, Layer::Copy, message)
}
