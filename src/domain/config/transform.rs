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

//! Transform configuration

use crate::infrastructure::constants::{
    COMPONENT_LABEL_PREFIX, CONTROLLER_IMAGE, COPY_LABEL_PREFIX, DOCKER_SOCKET_VOLUME,
    EXTENSION_KEY,
};
use serde::{Deserialize, Serialize};
use std::fs::read_to_string;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformConf {
    /// Image of the controller when the pod templates do not set one.
    pub controller_image: String,
    /// Volumes of the controller when the pod templates do not set any.
    pub controller_volumes: Vec<String>,
    pub component_label_prefix: String,
    pub copy_label_prefix: String,
    /// Top-level and service-level extension holding template declarations.
    pub extension_key: String,
}

impl Default for TransformConf {
    fn default() -> Self {
        Self {
            controller_image: CONTROLLER_IMAGE.to_string(),
            controller_volumes: vec![DOCKER_SOCKET_VOLUME.to_string()],
            component_label_prefix: COMPONENT_LABEL_PREFIX.to_string(),
            copy_label_prefix: COPY_LABEL_PREFIX.to_string(),
            extension_key: EXTENSION_KEY.to_string(),
        }
    }
}

impl TransformConf {
    /// Load configuration from TOML file
    pub fn from<T: AsRef<Path>>(path: T) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let content = read_to_string(path).map_err(|e| {
            anyhow::anyhow!("Failed to read config file {}: {}", path.display(), e)
        })?;

        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> anyhow::Result<Self> {
        let conf: Self =
            toml::from_str(content).map_err(|e| anyhow::anyhow!("Failed to parse TOML: {}", e))?;
        conf.validate()?;
        Ok(conf)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        if self.controller_image.trim().is_empty() {
            anyhow::bail!("controller_image must not be empty");
        }

        if self.component_label_prefix.is_empty() || self.copy_label_prefix.is_empty() {
            anyhow::bail!("label prefixes must not be empty");
        }

        if self.component_label_prefix == self.copy_label_prefix {
            anyhow::bail!(
                "component and copy label prefixes must differ: {}",
                self.component_label_prefix
            );
        }

        if !self.extension_key.starts_with("x-") {
            anyhow::bail!(
                "extension_key must start with 'x-': {}",
                self.extension_key
            );
        }

        Ok(())
    }

    pub fn component_label(&self, component: &str) -> String {
        format!("{}{}", self.component_label_prefix, component)
    }

    pub fn copy_label(&self, service: &str) -> String {
        format!("{}{}", self.copy_label_prefix, service)
    }
}
