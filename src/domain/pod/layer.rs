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

use serde_yaml::Mapping;
use std::fmt;

/// The four template classes that can be attached to a service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Layer {
    Pod,
    Transformer,
    Component,
    Copy,
}

impl Layer {
    pub const ALL: [Layer; 4] = [
        Layer::Pod,
        Layer::Transformer,
        Layer::Component,
        Layer::Copy,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::Pod => "pod",
            Layer::Transformer => "transformer",
            Layer::Component => "component",
            Layer::Copy => "copy",
        }
    }

    /// Key under which the layer is declared in the `x-podlike` extension.
    pub fn declaration_key(&self) -> &'static str {
        match self {
            Layer::Pod => "pod",
            Layer::Transformer => "transformer",
            Layer::Component => "templates",
            Layer::Copy => "copy",
        }
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A template body ready to be rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub name: String,
    pub body: String,
    pub args: Mapping,
}

impl Template {
    pub fn inline(name: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            body: body.into(),
            args: Mapping::new(),
        }
    }

    pub fn with_args(mut self, args: Mapping) -> Self {
        self.args = args;
        self
    }
}

/// Ordered template lists for one service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PodTemplates {
    pub pod: Vec<Template>,
    pub transformer: Vec<Template>,
    pub templates: Vec<Template>,
    pub copy: Vec<Template>,
    /// Arguments shared by every template of the service.
    pub args: Mapping,
}

impl PodTemplates {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_pod(mut self, template: Template) -> Self {
        self.pod.push(template);
        self
    }

    pub fn with_transformer(mut self, template: Template) -> Self {
        self.transformer.push(template);
        self
    }

    pub fn with_template(mut self, template: Template) -> Self {
        self.templates.push(template);
        self
    }

    pub fn with_copy(mut self, template: Template) -> Self {
        self.copy.push(template);
        self
    }

    pub fn with_args(mut self, args: Mapping) -> Self {
        self.args = args;
        self
    }

    pub fn layer(&self, layer: Layer) -> &[Template] {
        match layer {
            Layer::Pod => &self.pod,
            Layer::Transformer => &self.transformer,
            Layer::Component => &self.templates,
            Layer::Copy => &self.copy,
        }
    }

    pub fn layer_mut(&mut self, layer: Layer) -> &mut Vec<Template> {
        match layer {
            Layer::Pod => &mut self.pod,
            Layer::Transformer => &mut self.transformer,
            Layer::Component => &mut self.templates,
            Layer::Copy => &mut self.copy,
        }
    }

    pub fn is_empty(&self) -> bool {
        Layer::ALL.iter().all(|layer| self.layer(*layer).is_empty())
    }
}
