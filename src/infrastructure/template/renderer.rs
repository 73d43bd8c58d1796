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

//! Template rendering
//!
//! Templates are Tera templates producing YAML. They see three variables:
//! `service` (the original definition plus its `name`), `project`
//! (`working_dir` and the list of `services`) and `args`.

use crate::domain::compose::values::describe;
use crate::domain::pod::{Layer, RenderContext, Template};
use crate::shared::error::{Result, TransformError};
use serde::Serialize;
use serde_yaml::{Mapping, Value};
use tera::{Context, Tera};

#[derive(Serialize)]
struct ProjectView<'a> {
    working_dir: String,
    services: &'a [Value],
}

/// Renders one template into an untyped fragment.
pub fn render(template: &Template, layer: Layer, context: &RenderContext<'_>) -> Result<Mapping> {
    let tera_context = build_context(template, context);

    let text = Tera::one_off(&template.body, &tera_context, false).map_err(|source| {
        TransformError::Render {
            service: context.service_name().to_string(),
            layer,
            template: template.name.clone(),
            source,
        }
    })?;

    tracing::debug!(
        service = context.service_name(),
        layer = %layer,
        template = %template.name,
        "rendered template"
    );

    parse_fragment(&text).map_err(|message| TransformError::MalformedFragment {
        service: context.service_name().to_string(),
        layer,
        template: template.name.clone(),
        message,
    })
}

fn build_context(template: &Template, context: &RenderContext<'_>) -> Context {
    let mut tera_context = Context::new();
    tera_context.insert("service", &context.named_definition());
    tera_context.insert(
        "project",
        &ProjectView {
            working_dir: context.working_dir().to_string_lossy().into_owned(),
            services: context.project_services(),
        },
    );
    tera_context.insert("args", &context.template_args(template));
    tera_context
}

/// Parses rendered text; an empty document is an empty fragment.
pub fn parse_fragment(text: &str) -> std::result::Result<Mapping, String> {
    if text.trim().is_empty() {
        return Ok(Mapping::new());
    }

    match serde_yaml::from_str::<Value>(text).map_err(|e| e.to_string())? {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Ok(Mapping::new()),
        other => Err(format!("expected a mapping, found {}", describe(&other))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::compose::Project;
    use crate::domain::pod::PodTemplates;
    use std::path::Path;

    fn project() -> Project {
        Project::from_yaml_str(
            r#"
services:
  web:
    image: nginx:1.25
    labels:
      tier: frontend
  db:
    image: postgres
"#,
        )
        .unwrap()
    }

    fn render_web(template: &Template) -> Result<Mapping> {
        let project = project();
        let templates = PodTemplates::new();
        let ctx = RenderContext::new(
            project.service("web").unwrap(),
            &project,
            Path::new("/work"),
            &templates,
        )?;
        render(template, Layer::Pod, &ctx)
    }

    #[test]
    fn test_render_uses_service_and_project() {
        let template = Template::inline(
            "pod",
            r#"
{{ service.name }}:
  image: {{ service.image }}
  labels:
    tier: {{ service.labels.tier }}
    dir: {{ project.working_dir }}
    count: "{{ project.services | length }}"
"#,
        );

        let fragment = render_web(&template).unwrap();
        let expected: Mapping = serde_yaml::from_str(
            "web: {image: 'nginx:1.25', labels: {tier: frontend, dir: /work, count: '2'}}",
        )
        .unwrap();
        assert_eq!(fragment, expected);
    }

    #[test]
    fn test_render_uses_args() {
        let mut args = Mapping::new();
        args.insert("replicas".into(), 3.into());
        let template = Template::inline("pod", "web:\n  deploy:\n    replicas: {{ args.replicas }}\n")
            .with_args(args);

        let fragment = render_web(&template).unwrap();
        let expected: Mapping = serde_yaml::from_str("web: {deploy: {replicas: 3}}").unwrap();
        assert_eq!(fragment, expected);
    }

    #[test]
    fn test_unresolvable_reference_fails() {
        let template = Template::inline("broken", "web: {{ service.nope.deeper }}");
        let err = render_web(&template).unwrap_err();
        assert!(matches!(err, TransformError::Render { layer: Layer::Pod, .. }));
        assert_eq!(err.service(), Some("web"));
    }

    #[test]
    fn test_malformed_template_fails() {
        let template = Template::inline("broken", "web: {% if %}");
        assert!(matches!(
            render_web(&template).unwrap_err(),
            TransformError::Render { .. }
        ));
    }

    #[test]
    fn test_non_mapping_output_fails() {
        let template = Template::inline("scalar", "just text");
        assert!(matches!(
            render_web(&template).unwrap_err(),
            TransformError::MalformedFragment { .. }
        ));
    }

    #[test]
    fn test_empty_output_is_empty_fragment() {
        let template = Template::inline("empty", "{% if false %}web: {}{% endif %}");
        assert!(render_web(&template).unwrap().is_empty());
    }
}
