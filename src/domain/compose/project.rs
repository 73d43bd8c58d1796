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

use crate::domain::compose::service::ServiceConfig;
use crate::domain::compose::values::deserialize_optional_scalar;
use crate::shared::error::{Result, TransformError};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;

/// A multi-service Compose manifest.
///
/// Services are kept in a list sorted by name so they can be addressed by
/// index while the manifest is rewritten.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ProjectDocument", into = "ProjectDocument")]
pub struct Project {
    pub version: Option<String>,
    pub services: Vec<ServiceConfig>,
    pub networks: Option<Mapping>,
    pub volumes: Option<Mapping>,
    pub secrets: Option<Mapping>,
    pub configs: Option<Mapping>,
    pub extensions: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
struct ProjectDocument {
    #[serde(
        deserialize_with = "deserialize_optional_scalar",
        skip_serializing_if = "Option::is_none"
    )]
    version: Option<String>,
    services: BTreeMap<String, Option<ServiceConfig>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    networks: Option<Mapping>,
    #[serde(skip_serializing_if = "Option::is_none")]
    volumes: Option<Mapping>,
    #[serde(skip_serializing_if = "Option::is_none")]
    secrets: Option<Mapping>,
    #[serde(skip_serializing_if = "Option::is_none")]
    configs: Option<Mapping>,
    #[serde(flatten)]
    extensions: BTreeMap<String, Value>,
}

impl TryFrom<ProjectDocument> for Project {
    type Error = String;

    fn try_from(document: ProjectDocument) -> std::result::Result<Self, Self::Error> {
        if let Some(key) = document.extensions.keys().find(|key| !key.starts_with("x-")) {
            return Err(format!("unsupported top-level property: {}", key));
        }

        let mut services = Vec::with_capacity(document.services.len());
        for (name, service) in document.services {
            let mut service = service.unwrap_or_default();
            service.name = name;
            service.validate()?;
            services.push(service);
        }

        Ok(Self {
            version: document.version,
            services,
            networks: document.networks,
            volumes: document.volumes,
            secrets: document.secrets,
            configs: document.configs,
            extensions: document.extensions,
        })
    }
}

impl From<Project> for ProjectDocument {
    fn from(project: Project) -> Self {
        Self {
            version: project.version,
            services: project
                .services
                .into_iter()
                .map(|service| (service.name.clone(), Some(service)))
                .collect(),
            networks: project.networks,
            volumes: project.volumes,
            secrets: project.secrets,
            configs: project.configs,
            extensions: project.extensions,
        }
    }
}

impl Project {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn to_yaml(&self) -> Result<String> {
        Ok(serde_yaml::to_string(self)?)
    }

    pub fn service_index(&self, name: &str) -> Option<usize> {
        self.services.iter().position(|service| service.name == name)
    }

    pub fn service(&self, name: &str) -> Option<&ServiceConfig> {
        self.services.iter().find(|service| service.name == name)
    }

    pub fn service_mut(&mut self, name: &str) -> Option<&mut ServiceConfig> {
        self.services.iter_mut().find(|service| service.name == name)
    }

    /// Swaps the service at `index` for `service`, keeping list positions stable.
    pub fn replace_service(&mut self, index: usize, service: ServiceConfig) -> Result<()> {
        match self.services.get_mut(index) {
            Some(slot) => {
                *slot = service;
                Ok(())
            }
            None => Err(TransformError::ServiceNotFound {
                service: service.name,
            }),
        }
    }
}
