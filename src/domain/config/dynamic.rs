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

use crate::domain::config::TransformConf;
use std::collections::HashMap;

/// Applies `-D key=value` style overrides on top of a loaded configuration.
pub fn apply_to_transform_conf(configs: &HashMap<String, String>, conf: &mut TransformConf) {
    if let Some(image) = configs.get("podlike.controller.image") {
        conf.controller_image = image.clone();
    }

    if let Some(volumes) = configs.get("podlike.controller.volumes") {
        conf.controller_volumes = volumes
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
    }

    if let Some(prefix) = configs.get("podlike.label.component-prefix") {
        conf.component_label_prefix = prefix.clone();
    }

    if let Some(prefix) = configs.get("podlike.label.copy-prefix") {
        conf.copy_label_prefix = prefix.clone();
    }

    if let Some(key) = configs.get("podlike.extension-key") {
        conf.extension_key = key.clone();
    }
}

/// Parses `key=value` pairs, ignoring entries without `=`.
pub fn parse_properties<S: AsRef<str>>(properties: &[S]) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for property in properties {
        let parts: Vec<&str> = property.as_ref().splitn(2, '=').collect();
        if parts.len() == 2 {
            map.insert(parts[0].trim().to_string(), parts[1].trim().to_string());
        }
    }
    map
}
