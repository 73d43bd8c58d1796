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

//! Per-service layering pipeline
//!
//! Each service with templates is rewritten into a controller. The main
//! component, side components and copy declarations are rendered into labels
//! on the controller, then the controller replaces the original service.

use crate::domain::compose::values::scalar_to_string;
use crate::domain::compose::{Project, ServiceConfig};
use crate::domain::config::TransformConf;
use crate::domain::pod::{Layer, PodTemplates, RenderContext, Template};
use crate::infrastructure::constants::{
    DEFAULT_TRANSFORMER_TEMPLATE, POD_MERGE_KEYS, TRANSFORMER_MERGE_KEYS,
};
use crate::infrastructure::template::copy::{copy_pairs, normalize_copy_fragment};
use crate::infrastructure::template::materializer::{to_definitions, to_text};
use crate::infrastructure::template::merger::{carry_over, merge, rename_root, root_key};
use crate::infrastructure::template::renderer::render;
use crate::infrastructure::template::session::TransformSession;
use crate::shared::error::{Result, TransformError};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::path::Path;

/// Renders the templates of one service at a time into a project.
pub struct PodTransformer<'a> {
    conf: &'a TransformConf,
}

impl<'a> PodTransformer<'a> {
    pub fn new(conf: &'a TransformConf) -> Self {
        Self { conf }
    }

    /// Replaces `service` in `project` with its rendered controller.
    pub fn transform_service(
        &self,
        project: &mut Project,
        working_dir: &Path,
        service: &str,
        templates: &PodTemplates,
    ) -> Result<()> {
        let index = project
            .service_index(service)
            .ok_or_else(|| TransformError::ServiceNotFound {
                service: service.to_string(),
            })?;

        tracing::info!(service, index, "transforming service");

        let controller = {
            let original = project.services.get(index).ok_or_else(|| {
                TransformError::ServiceNotFound {
                    service: service.to_string(),
                }
            })?;
            let context = RenderContext::new(original, project, working_dir, templates)?;
            self.render_controller(&context)?
        };

        project.replace_service(index, controller)
    }

    fn render_controller(&self, context: &RenderContext<'_>) -> Result<ServiceConfig> {
        let service = context.service_name();
        let mut controller = self.execute_pod_templates(context)?;

        let (main_name, main_component) = self.execute_transformers(context)?;
        attach_label(
            &mut controller,
            service,
            self.conf.component_label(&main_name),
            main_component,
        )?;

        for (name, component) in self.execute_templates(context)? {
            attach_label(
                &mut controller,
                service,
                self.conf.component_label(&name),
                component,
            )?;
        }

        for (name, copies) in self.execute_copy_templates(context)? {
            attach_label(&mut controller, service, self.conf.copy_label(&name), copies)?;
        }

        Ok(controller)
    }

    /// Every pod template is rooted at the service's own name, whatever root
    /// key it renders. Original properties and controller defaults only fill
    /// what the templates left unset.
    fn execute_pod_templates(&self, context: &RenderContext<'_>) -> Result<ServiceConfig> {
        let service = context.service_name();
        let mut definition = Mapping::new();

        for template in context.templates().layer(Layer::Pod) {
            let rendered = render(template, Layer::Pod, context)?;
            root_key(&rendered, service, Layer::Pod)?;
            merge(&mut definition, rename_root(rendered, service));
        }

        carry_over(&mut definition, service, context.definition(), &POD_MERGE_KEYS);
        merge(&mut definition, self.minimal_pod_properties(service));

        let converted = to_definitions(&definition, context.working_dir(), service, Layer::Pod)?;
        exactly_one(converted, service, Layer::Pod)
    }

    /// The first transformer names the main component; later ones extend it.
    fn execute_transformers(&self, context: &RenderContext<'_>) -> Result<(String, String)> {
        let service = context.service_name();
        let default_transformer;
        let templates = match context.templates().layer(Layer::Transformer) {
            [] => {
                default_transformer = [Template::inline(
                    "default-transformer",
                    DEFAULT_TRANSFORMER_TEMPLATE,
                )];
                &default_transformer[..]
            }
            declared => declared,
        };

        let mut component_name = String::new();
        let mut definition = Mapping::new();

        for (idx, template) in templates.iter().enumerate() {
            let rendered = render(template, Layer::Transformer, context)?;
            let key = root_key(&rendered, service, Layer::Transformer)?;

            if idx == 0 {
                component_name = key;
            }
            merge(&mut definition, rename_root(rendered, &component_name));
        }

        carry_over(
            &mut definition,
            &component_name,
            context.definition(),
            &TRANSFORMER_MERGE_KEYS,
        );

        let converted = to_definitions(
            &definition,
            context.working_dir(),
            service,
            Layer::Transformer,
        )?;
        let component = exactly_one(converted, service, Layer::Transformer)?;
        let text = to_text(&component)?;

        Ok((component.name, text))
    }

    /// Side components keep their own root keys, so one template can add
    /// several of them and later templates can extend any of them.
    fn execute_templates(&self, context: &RenderContext<'_>) -> Result<BTreeMap<String, String>> {
        let service = context.service_name();
        let mut definition = Mapping::new();

        for template in context.templates().layer(Layer::Component) {
            merge(&mut definition, render(template, Layer::Component, context)?);
        }

        let mut components = BTreeMap::new();
        for component in to_definitions(&definition, context.working_dir(), service, Layer::Component)? {
            let text = to_text(&component)?;
            components.insert(component.name, text);
        }

        Ok(components)
    }

    fn execute_copy_templates(
        &self,
        context: &RenderContext<'_>,
    ) -> Result<BTreeMap<String, String>> {
        let service = context.service_name();
        let mut definition = Mapping::new();

        for template in context.templates().layer(Layer::Copy) {
            let rendered = render(template, Layer::Copy, context)?;
            merge(&mut definition, normalize_copy_fragment(rendered, service)?);
        }

        let mut copies = BTreeMap::new();
        for (target, items) in &definition {
            let target = scalar_to_string(target)
                .map_err(|e| TransformError::schema(service, Layer::Copy, e))?;
            let pairs = copy_pairs(items, service)?;
            copies.insert(target, to_text(&pairs)?);
        }

        Ok(copies)
    }

    /// Controller defaults, applied after the templates and the carry-over.
    fn minimal_pod_properties(&self, service: &str) -> Mapping {
        let mut properties = Mapping::new();
        properties.insert(
            Value::String("image".to_string()),
            Value::String(self.conf.controller_image.clone()),
        );
        properties.insert(
            Value::String("volumes".to_string()),
            Value::Sequence(
                self.conf
                    .controller_volumes
                    .iter()
                    .cloned()
                    .map(Value::String)
                    .collect(),
            ),
        );

        let mut root = Mapping::new();
        root.insert(Value::String(service.to_string()), Value::Mapping(properties));
        root
    }
}

fn exactly_one(
    mut converted: Vec<ServiceConfig>,
    service: &str,
    layer: Layer,
) -> Result<ServiceConfig> {
    match converted.len() {
        1 => converted.pop().ok_or(TransformError::DefinitionCount {
            service: service.to_string(),
            layer,
            count: 0,
        }),
        count => Err(TransformError::DefinitionCount {
            service: service.to_string(),
            layer,
            count,
        }),
    }
}

fn attach_label(
    controller: &mut ServiceConfig,
    service: &str,
    key: String,
    value: String,
) -> Result<()> {
    if controller.labels.contains_key(&key) {
        return Err(TransformError::LabelCollision {
            service: service.to_string(),
            key,
        });
    }

    tracing::debug!(service, label = %key, "attached label");
    controller.labels.insert(key, value);
    Ok(())
}

/// Runs every configured service through the pipeline and returns the
/// rewritten manifest as YAML.
pub fn transform(session: TransformSession) -> Result<String> {
    let TransformSession {
        mut project,
        working_dir,
        configurations,
        conf,
    } = session;

    let transformer = PodTransformer::new(&conf);
    for (service, templates) in &configurations {
        transformer.transform_service(&mut project, &working_dir, service, templates)?;
    }

    tracing::info!(services = configurations.len(), "transform complete");
    project.to_yaml()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn project() -> Project {
        Project::from_yaml_str(
            r#"
services:
  web:
    image: nginx
    restart: always
    environment:
      MODE: prod
  other:
    image: redis
"#,
        )
        .unwrap()
    }

    #[test]
    fn test_missing_service_fails() {
        let conf = TransformConf::default();
        let mut project = project();
        let err = PodTransformer::new(&conf)
            .transform_service(&mut project, Path::new("/w"), "ghost", &PodTemplates::new())
            .unwrap_err();
        assert!(matches!(err, TransformError::ServiceNotFound { .. }));
    }

    #[test]
    fn test_default_transformer_uses_original_service() {
        let conf = TransformConf::default();
        let mut project = project();
        let templates = PodTemplates::new().with_copy(Template::inline("copy", "web: /a:/b"));

        PodTransformer::new(&conf)
            .transform_service(&mut project, Path::new("/w"), "web", &templates)
            .unwrap();

        let controller = project.service("web").unwrap();
        assert_eq!(controller.image.as_deref(), Some("rycus86/podlike"));
        assert_eq!(controller.restart.as_deref(), Some("always"));
        assert!(controller.environment.is_empty());

        let main: ServiceConfig =
            serde_yaml::from_str(&controller.labels["pod.component.web"]).unwrap();
        assert_eq!(main.image.as_deref(), Some("nginx"));
        assert_eq!(main.environment["MODE"], Some("prod".to_string()));
        assert!(main.restart.is_none());

        assert_eq!(project.service("other").unwrap().image.as_deref(), Some("redis"));
    }

    #[test]
    fn test_pod_template_must_have_one_root() {
        let conf = TransformConf::default();
        let mut project = project();
        let templates = PodTemplates::new().with_pod(Template::inline("pod", "{a: {}, b: {}}"));

        let err = PodTransformer::new(&conf)
            .transform_service(&mut project, Path::new("/w"), "web", &templates)
            .unwrap_err();
        assert!(matches!(err, TransformError::RootKey { layer: Layer::Pod, found: 2, .. }));
    }

    #[test]
    fn test_numeric_transformer_root_names_one_component() {
        let conf = TransformConf::default();
        let mut project = Project::from_yaml_str(
            "services:\n  \"8080\":\n    image: nginx\n    restart: always\n",
        )
        .unwrap();
        let templates = PodTemplates::new()
            .with_transformer(Template::inline("main", "{{ service.name }}: {tty: true}"))
            .with_transformer(Template::inline("extra", "other: {user: www}"));

        PodTransformer::new(&conf)
            .transform_service(&mut project, Path::new("/w"), "8080", &templates)
            .unwrap();

        let controller = project.service("8080").unwrap();
        let main: ServiceConfig =
            serde_yaml::from_str(&controller.labels["pod.component.8080"]).unwrap();
        assert_eq!(main.image.as_deref(), Some("nginx"));
        assert_eq!(main.tty, Some(true));
        assert_eq!(main.user.as_deref(), Some("www"));
    }

    #[test]
    fn test_label_collision_fails() {
        let conf = TransformConf::default();
        let mut project = project();
        let templates = PodTemplates::new()
            .with_transformer(Template::inline("main", "app: {image: a}"))
            .with_template(Template::inline("side", "app: {image: b}"));

        let err = PodTransformer::new(&conf)
            .transform_service(&mut project, Path::new("/w"), "web", &templates)
            .unwrap_err();
        match err {
            TransformError::LabelCollision { service, key } => {
                assert_eq!(service, "web");
                assert_eq!(key, "pod.component.app");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_exactly_one() {
        let err = exactly_one(Vec::new(), "web", Layer::Transformer).unwrap_err();
        assert!(matches!(err, TransformError::DefinitionCount { count: 0, .. }));

        let two = vec![ServiceConfig::new("a"), ServiceConfig::new("b")];
        let err = exactly_one(two, "web", Layer::Pod).unwrap_err();
        assert!(matches!(err, TransformError::DefinitionCount { count: 2, .. }));
    }
}
