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

use crate::domain::compose::values::{describe, scalar_to_string};
use crate::domain::compose::ServiceConfig;
use crate::domain::pod::Layer;
use crate::infrastructure::constants::SERVICE_NAME_PATTERN;
use crate::shared::error::{Result, TransformError};
use regex::Regex;
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use std::path::Path;

/// Converts a merged definition tree into validated service definitions,
/// one per root key, sorted by name.
pub fn to_definitions(
    tree: &Mapping,
    working_dir: &Path,
    service: &str,
    layer: Layer,
) -> Result<Vec<ServiceConfig>> {
    let name_pattern = Regex::new(SERVICE_NAME_PATTERN)
        .map_err(|e| TransformError::config_error(format!("invalid service name pattern: {}", e)))?;

    let mut definitions = Vec::with_capacity(tree.len());
    for (key, body) in tree {
        let name = scalar_to_string(key).map_err(|e| {
            TransformError::schema(service, layer, format!("invalid service name: {}", e))
        })?;

        if !name_pattern.is_match(&name) {
            return Err(TransformError::schema(
                service,
                layer,
                format!("invalid service name '{}'", name),
            ));
        }

        let body = match body {
            Value::Null => Value::Mapping(Mapping::new()),
            Value::Mapping(_) => body.clone(),
            other => {
                return Err(TransformError::schema(
                    service,
                    layer,
                    format!("service '{}' must be a mapping, found {}", name, describe(other)),
                ))
            }
        };

        let mut definition: ServiceConfig = serde_yaml::from_value(body).map_err(|e| {
            TransformError::schema(service, layer, format!("service '{}': {}", name, e))
        })?;
        definition.name = name;
        definition
            .validate()
            .map_err(|message| TransformError::schema(service, layer, message))?;
        definition.resolve_relative_paths(working_dir);

        definitions.push(definition);
    }

    definitions.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(definitions)
}

/// Serializes a definition as YAML text for a label value.
pub fn to_text<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_yaml::to_string(value)?)
}
