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

use crate::domain::pod::Layer;
use thiserror::Error;
pub type Result<T> = std::result::Result<T, TransformError>;

#[derive(Error, Debug)]
pub enum TransformError {
    #[error("service index not found: {service}")]
    ServiceNotFound { service: String },

    #[error("{layer} template for service '{service}' must define exactly one root key, found {found}")]
    RootKey {
        service: String,
        layer: Layer,
        found: usize,
    },

    #[error("{layer} templates for service '{service}' produced {count} definitions, expected exactly one")]
    DefinitionCount {
        service: String,
        layer: Layer,
        count: usize,
    },

    #[error("invalid {layer} definition for service '{service}': {message}")]
    Schema {
        service: String,
        layer: Layer,
        message: String,
    },

    #[error("{layer} template '{template}' for service '{service}' did not render a mapping: {message}")]
    MalformedFragment {
        service: String,
        layer: Layer,
        template: String,
        message: String,
    },

    #[error(
        "failed to render {layer} template '{template}' for service '{service}': {}",
        error_chain(.source)
    )]
    Render {
        service: String,
        layer: Layer,
        template: String,
        #[source]
        source: tera::Error,
    },

    #[error("label '{key}' is already set on the controller of service '{service}'")]
    LabelCollision { service: String, key: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML parse error: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

impl TransformError {
    pub fn config_error(context: impl Into<String>) -> Self {
        Self::Config(context.into())
    }

    pub fn schema(service: impl Into<String>, layer: Layer, message: impl ToString) -> Self {
        Self::Schema {
            service: service.into(),
            layer,
            message: message.to_string(),
        }
    }

    pub fn root_key(service: impl Into<String>, layer: Layer, found: usize) -> Self {
        Self::RootKey {
            service: service.into(),
            layer,
            found,
        }
    }

    /// The service the failure was detected for, when it is known.
    pub fn service(&self) -> Option<&str> {
        match self {
            Self::ServiceNotFound { service }
            | Self::RootKey { service, .. }
            | Self::DefinitionCount { service, .. }
            | Self::Schema { service, .. }
            | Self::MalformedFragment { service, .. }
            | Self::Render { service, .. }
            | Self::LabelCollision { service, .. } => Some(service),
            _ => None,
        }
    }

    /// The layer the failure was detected in, when it is known.
    pub fn layer(&self) -> Option<Layer> {
        match self {
            Self::RootKey { layer, .. }
            | Self::DefinitionCount { layer, .. }
            | Self::Schema { layer, .. }
            | Self::MalformedFragment { layer, .. }
            | Self::Render { layer, .. } => Some(*layer),
            _ => None,
        }
    }
}

/// Joins an error with all of its sources. Tera keeps the line and variable
/// details in the innermost cause.
fn error_chain(err: &(dyn std::error::Error + 'static)) -> String {
    let mut message = err.to_string();
    let mut current = err.source();
    while let Some(cause) = current {
        message.push_str(": ");
        message.push_str(&cause.to_string());
        current = cause.source();
    }
    message
}
