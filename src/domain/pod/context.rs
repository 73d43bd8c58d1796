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

use crate::domain::compose::{Project, ServiceConfig};
use crate::domain::pod::layer::{PodTemplates, Template};
use crate::shared::error::{Result, TransformError};
use serde_yaml::{Mapping, Value};
use std::path::Path;

/// Everything a template can see while one service is transformed.
#[derive(Debug, Clone)]
pub struct RenderContext<'a> {
    service: ServiceConfig,
    definition: Mapping,
    project_services: Vec<Value>,
    working_dir: &'a Path,
    templates: &'a PodTemplates,
}

impl<'a> RenderContext<'a> {
    pub fn new(
        service: &ServiceConfig,
        project: &Project,
        working_dir: &'a Path,
        templates: &'a PodTemplates,
    ) -> Result<Self> {
        let definition = definition_of(service)?;

        let mut project_services = Vec::with_capacity(project.services.len());
        for other in &project.services {
            project_services.push(Value::Mapping(named_definition(
                &other.name,
                definition_of(other)?,
            )));
        }

        Ok(Self {
            service: service.clone(),
            definition,
            project_services,
            working_dir,
            templates,
        })
    }

    pub fn service_name(&self) -> &str {
        &self.service.name
    }

    pub fn service(&self) -> &ServiceConfig {
        &self.service
    }

    /// The original service definition as a mapping, without its name.
    pub fn definition(&self) -> &Mapping {
        &self.definition
    }

    /// The original service definition with its `name` added, as templates see it.
    pub fn named_definition(&self) -> Mapping {
        named_definition(&self.service.name, self.definition.clone())
    }

    pub fn project_services(&self) -> &[Value] {
        &self.project_services
    }

    pub fn working_dir(&self) -> &Path {
        self.working_dir
    }

    pub fn templates(&self) -> &PodTemplates {
        self.templates
    }

    /// Service-wide arguments overlaid with the template's own arguments.
    pub fn template_args(&self, template: &Template) -> Mapping {
        let mut args = self.templates.args.clone();
        for (key, value) in &template.args {
            args.insert(key.clone(), value.clone());
        }
        args
    }
}

fn definition_of(service: &ServiceConfig) -> Result<Mapping> {
    match serde_yaml::to_value(service)? {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Ok(Mapping::new()),
        other => Err(TransformError::config_error(format!(
            "service '{}' did not serialize to a mapping: {:?}",
            service.name, other
        ))),
    }
}

fn named_definition(name: &str, definition: Mapping) -> Mapping {
    let mut named = Mapping::new();
    named.insert(Value::String("name".to_string()), Value::String(name.to_string()));
    for (key, value) in definition {
        named.insert(key, value);
    }
    named
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_exposes_definition_and_args() {
        let project = Project::from_yaml_str(
            "services:\n  web:\n    image: nginx\n    restart: always\n  db:\n    image: postgres\n",
        )
        .unwrap();
        let web = project.service("web").unwrap();

        let mut shared = Mapping::new();
        shared.insert("a".into(), "shared".into());
        shared.insert("b".into(), "shared".into());
        let templates = PodTemplates::new().with_args(shared);

        let ctx = RenderContext::new(web, &project, Path::new("/work"), &templates).unwrap();
        assert_eq!(ctx.service_name(), "web");
        assert_eq!(ctx.definition().get("restart"), Some(&Value::from("always")));
        assert!(ctx.definition().get("name").is_none());
        assert_eq!(ctx.named_definition().get("name"), Some(&Value::from("web")));
        assert_eq!(ctx.project_services().len(), 2);

        let mut own = Mapping::new();
        own.insert("b".into(), "own".into());
        let template = Template::inline("t", "").with_args(own);
        let args = ctx.template_args(&template);
        assert_eq!(args.get("a"), Some(&Value::from("shared")));
        assert_eq!(args.get("b"), Some(&Value::from("own")));
    }
}
