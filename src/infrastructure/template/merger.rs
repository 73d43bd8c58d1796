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

//! Fragment merging
//!
//! Fragments only ever extend each other: a key that is already present in
//! the accumulator keeps its value unless both sides are mappings, in which
//! case they are merged recursively. Sequences are replaced as a whole, never
//! concatenated. Folding is therefore order sensitive: among later layers,
//! the first one to set a missing key wins.

use crate::domain::compose::values::scalar_to_string;
use crate::domain::pod::Layer;
use crate::infrastructure::constants::MergeKeySet;
use crate::shared::error::{Result, TransformError};
use serde_yaml::{Mapping, Value};

/// Merges `incoming` into `accumulator` without overwriting existing values.
pub fn merge(accumulator: &mut Mapping, incoming: Mapping) {
    for (key, value) in incoming {
        match accumulator.get_mut(&key) {
            Some(existing) => {
                if let (Value::Mapping(existing), Value::Mapping(nested)) = (existing, value) {
                    merge(existing, nested);
                }
            }
            None => {
                let value = match value {
                    Value::Mapping(nested) => {
                        let mut copy = Mapping::new();
                        merge(&mut copy, nested);
                        Value::Mapping(copy)
                    }
                    other => other,
                };
                accumulator.insert(key, value);
            }
        }
    }
}

/// Returns the only root key of a rendered fragment.
pub fn root_key(fragment: &Mapping, service: &str, layer: Layer) -> Result<String> {
    if fragment.len() != 1 {
        return Err(TransformError::root_key(service, layer, fragment.len()));
    }

    match fragment.keys().next() {
        Some(key) => scalar_to_string(key).map_err(|e| {
            TransformError::schema(service, layer, format!("invalid root key: {}", e))
        }),
        None => Err(TransformError::root_key(service, layer, 0)),
    }
}

/// Moves the sole value of `fragment` under `name`.
pub fn rename_root(fragment: Mapping, name: &str) -> Mapping {
    let mut renamed = Mapping::new();
    if let Some((_, value)) = fragment.into_iter().next() {
        renamed.insert(Value::String(name.to_string()), value);
    }
    renamed
}

/// Copies the properties listed in `keys` from `original` into the definition
/// under `root`, but only the ones the templates did not set.
pub fn carry_over(definition: &mut Mapping, root: &str, original: &Mapping, keys: &MergeKeySet) {
    let entry = definition
        .entry(Value::String(root.to_string()))
        .or_insert(Value::Null);

    if entry.is_null() {
        *entry = Value::Mapping(Mapping::new());
    }

    let Value::Mapping(target) = entry else {
        return;
    };

    for key in keys.keys {
        if target.contains_key(*key) {
            continue;
        }
        if let Some(value) = original.get(*key) {
            target.insert(Value::String((*key).to_string()), value.clone());
        }
    }
}
