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

//! Template declarations
//!
//! Templates are declared under the `x-podlike` extension, either at the top
//! level keyed by service name or inside the service itself:
//!
//! ```yaml
//! x-podlike:
//!   web:
//!     pod: templates/pod.yml
//!     transformer:
//!       - inline: |
//!           app:
//!             image: {{ service.image }}
//!     copy:
//!       - file: templates/copy.yml
//!         args:
//!           config: /etc/app.conf
//!     args:
//!       replicas: 2
//! ```
//!
//! When both places declare the same layer for a service, the service-level
//! declaration is used. File templates are read here, before the pipeline runs.

use crate::domain::compose::values::describe;
use crate::domain::compose::Project;
use crate::domain::config::TransformConf;
use crate::domain::pod::{Layer, PodTemplates, Template};
use crate::infrastructure::constants::{
    DECLARATION_ARGS, DECLARATION_FILE, DECLARATION_HTTP, DECLARATION_INLINE,
};
use crate::infrastructure::template::transform::transform;
use crate::shared::error::{Result, TransformError};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// A project together with the templates of each of its pod services.
#[derive(Debug, Clone)]
pub struct TransformSession {
    pub project: Project,
    pub working_dir: PathBuf,
    pub configurations: BTreeMap<String, PodTemplates>,
    pub conf: TransformConf,
}

impl TransformSession {
    pub fn new(project: Project, working_dir: impl Into<PathBuf>) -> Self {
        Self {
            project,
            working_dir: working_dir.into(),
            configurations: BTreeMap::new(),
            conf: TransformConf::default(),
        }
    }

    pub fn with_conf(mut self, conf: TransformConf) -> Self {
        self.conf = conf;
        self
    }

    /// Registers templates for a service; services without any layer are skipped.
    pub fn with_templates(mut self, service: impl Into<String>, templates: PodTemplates) -> Self {
        if !templates.is_empty() {
            self.configurations.insert(service.into(), templates);
        }
        self
    }

    /// Collects the template declarations found in the project's extensions.
    /// The consumed extensions are removed from the project.
    pub fn from_project(
        mut project: Project,
        working_dir: impl Into<PathBuf>,
        conf: TransformConf,
    ) -> Result<Self> {
        conf.validate().map_err(|e| TransformError::config_error(format!("{:#}", e)))?;

        let working_dir = working_dir.into();
        let key = conf.extension_key.clone();

        let mut declarations: BTreeMap<String, Mapping> = BTreeMap::new();

        if let Some(top_level) = project.extensions.remove(&key) {
            let entries = expect_mapping(top_level, &key)?;
            for (service, declaration) in entries {
                let service = match service {
                    Value::String(service) => service,
                    other => {
                        return Err(TransformError::config_error(format!(
                            "{} keys must be service names, found {}",
                            key,
                            describe(&other)
                        )))
                    }
                };
                if project.service(&service).is_none() {
                    return Err(TransformError::config_error(format!(
                        "{} declares templates for unknown service '{}'",
                        key, service
                    )));
                }
                let declaration = expect_mapping(declaration, &format!("{}.{}", key, service))?;
                declarations.insert(service, declaration);
            }
        }

        for service in project.services.iter_mut() {
            if let Some(own) = service.extensions.remove(&key) {
                let own = expect_mapping(own, &format!("services.{}.{}", service.name, key))?;
                let declaration = declarations.entry(service.name.clone()).or_default();
                for (layer, value) in own {
                    declaration.insert(layer, value);
                }
            }
        }

        let mut session = Self::new(project, working_dir).with_conf(conf);
        for (service, declaration) in declarations {
            let templates = parse_declaration(&service, declaration, &session.working_dir)?;
            tracing::debug!(service = %service, "loaded template declarations");
            session = session.with_templates(service, templates);
        }

        Ok(session)
    }

    pub fn transform(self) -> Result<String> {
        transform(self)
    }
}

/// Parses a manifest, collects its template declarations and transforms it.
pub fn transform_yaml(
    content: &str,
    working_dir: impl Into<PathBuf>,
    conf: TransformConf,
) -> Result<String> {
    let project = Project::from_yaml_str(content)?;
    TransformSession::from_project(project, working_dir, conf)?.transform()
}

fn parse_declaration(service: &str, declaration: Mapping, working_dir: &Path) -> Result<PodTemplates> {
    let mut templates = PodTemplates::new();

    for (key, value) in declaration {
        let key = match key {
            Value::String(key) => key,
            other => {
                return Err(TransformError::config_error(format!(
                    "invalid template declaration key for service '{}': {}",
                    service,
                    describe(&other)
                )))
            }
        };

        if key == DECLARATION_ARGS {
            templates.args = expect_mapping(value, &format!("{}.{}", service, key))?;
            continue;
        }

        let layer = Layer::ALL
            .into_iter()
            .find(|layer| layer.declaration_key() == key)
            .ok_or_else(|| {
                TransformError::config_error(format!(
                    "unknown template layer '{}' for service '{}'",
                    key, service
                ))
            })?;

        let entries = match value {
            Value::Sequence(entries) => entries,
            Value::Null => Vec::new(),
            single => vec![single],
        };

        for (idx, entry) in entries.into_iter().enumerate() {
            let template = load_template(service, layer, idx, entry, working_dir)?;
            templates.layer_mut(layer).push(template);
        }
    }

    Ok(templates)
}

fn load_template(
    service: &str,
    layer: Layer,
    idx: usize,
    entry: Value,
    working_dir: &Path,
) -> Result<Template> {
    let mut source = match entry {
        Value::String(path) => return load_template_file(&path, working_dir),
        Value::Mapping(source) => source,
        other => {
            return Err(TransformError::config_error(format!(
                "{} template #{} for service '{}' must be a path or a mapping, found {}",
                layer,
                idx,
                service,
                describe(&other)
            )))
        }
    };

    let args = match source.remove(DECLARATION_ARGS) {
        Some(args) => expect_mapping(args, &format!("{}.{}[{}].args", service, layer, idx))?,
        None => Mapping::new(),
    };

    if source.contains_key(DECLARATION_HTTP) {
        return Err(TransformError::config_error(format!(
            "{} template #{} for service '{}': http template sources are not supported",
            layer, idx, service
        )));
    }

    let template = match (source.remove(DECLARATION_FILE), source.remove(DECLARATION_INLINE)) {
        (Some(Value::String(path)), None) => load_template_file(&path, working_dir)?,
        (None, Some(Value::String(body))) => {
            Template::inline(format!("{}.{}[{}]", service, layer, idx), body)
        }
        _ => {
            return Err(TransformError::config_error(format!(
                "{} template #{} for service '{}' needs exactly one of '{}' or '{}'",
                layer, idx, service, DECLARATION_FILE, DECLARATION_INLINE
            )))
        }
    };

    if let Some(unknown) = source.keys().next() {
        return Err(TransformError::config_error(format!(
            "{} template #{} for service '{}' has unknown property {:?}",
            layer, idx, service, unknown
        )));
    }

    Ok(template.with_args(args))
}

/// Reads a template file; relative paths are resolved against `working_dir`.
pub fn load_template_file(file_path: &str, working_dir: &Path) -> Result<Template> {
    let path = resolve_template_path(file_path, working_dir);

    if !path.exists() {
        return Err(TransformError::config_error(format!(
            "Template file does not exist: {}",
            path.display()
        )));
    }

    let body = std::fs::read_to_string(&path).map_err(|e| {
        TransformError::config_error(format!(
            "Failed to read template file {}: {}",
            path.display(),
            e
        ))
    })?;

    Ok(Template::inline(file_path, body))
}

pub fn resolve_template_path(path: &str, working_dir: &Path) -> PathBuf {
    let path = PathBuf::from(path);

    if path.is_absolute() {
        path
    } else {
        working_dir.join(path)
    }
}

fn expect_mapping(value: Value, location: &str) -> Result<Mapping> {
    match value {
        Value::Mapping(mapping) => Ok(mapping),
        Value::Null => Ok(Mapping::new()),
        other => Err(TransformError::config_error(format!(
            "{} must be a mapping, found {}",
            location,
            describe(&other)
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const MANIFEST: &str = r#"
services:
  web:
    image: nginx
    x-podlike:
      copy:
        inline: "web: /a:/b"
  db:
    image: postgres
x-podlike:
  web:
    pod:
      - inline: "web: {}"
    copy: ignored.yml
    args:
      shared: true
"#;

    #[test]
    fn test_declarations_collected_and_removed() {
        let project = Project::from_yaml_str(MANIFEST).unwrap();
        let session =
            TransformSession::from_project(project, "/work", TransformConf::default()).unwrap();

        assert_eq!(session.configurations.len(), 1);
        let templates = &session.configurations["web"];
        assert_eq!(templates.pod.len(), 1);
        assert_eq!(templates.copy.len(), 1);
        assert_eq!(templates.copy[0].body, "web: /a:/b");
        assert_eq!(templates.args.get("shared"), Some(&Value::Bool(true)));

        assert!(!session.project.extensions.contains_key("x-podlike"));
        let web = session.project.service("web").unwrap();
        assert!(web.extensions.is_empty());
    }

    #[test]
    fn test_file_templates_loaded_relative_to_working_dir() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("templates")).unwrap();
        fs::write(dir.path().join("templates/pod.yml"), "web:\n  restart: always\n").unwrap();

        let manifest = r#"
services:
  web:
    image: nginx
x-podlike:
  web:
    pod: templates/pod.yml
    transformer:
      - file: templates/pod.yml
        args: {x: 1}
"#;
        let project = Project::from_yaml_str(manifest).unwrap();
        let session =
            TransformSession::from_project(project, dir.path(), TransformConf::default()).unwrap();

        let templates = &session.configurations["web"];
        assert_eq!(templates.pod[0].name, "templates/pod.yml");
        assert_eq!(templates.pod[0].body, "web:\n  restart: always\n");
        assert_eq!(templates.transformer[0].args.get("x"), Some(&Value::from(1)));
    }

    #[test]
    fn test_invalid_declarations() {
        let cases = [
            "services: {web: {}}\nx-podlike: {ghost: {pod: {inline: 'x: {}'}}}\n",
            "services: {web: {}}\nx-podlike: {web: {sidecars: []}}\n",
            "services: {web: {}}\nx-podlike: {web: {pod: {http: 'http://example.com/pod.yml'}}}\n",
            "services: {web: {}}\nx-podlike: {web: {pod: {file: a.yml, inline: 'x: {}'}}}\n",
            "services: {web: {}}\nx-podlike: {web: {pod: {inline: 'x: {}', extra: 1}}}\n",
            "services: {web: {}}\nx-podlike: {web: {pod: /missing/pod.yml}}\n",
            "services: {web: {}}\nx-podlike: [web]\n",
        ];

        for case in cases {
            let project = Project::from_yaml_str(case).unwrap();
            let err = TransformSession::from_project(project, "/work", TransformConf::default())
                .unwrap_err();
            assert!(
                matches!(err, TransformError::Config(_)),
                "unexpected error for {}: {:?}",
                case,
                err
            );
        }
    }

    #[test]
    fn test_conf_checked_before_loading() {
        let mut conf = TransformConf::default();
        conf.copy_label_prefix = conf.component_label_prefix.clone();

        let project = Project::from_yaml_str(MANIFEST).unwrap();
        let err = TransformSession::from_project(project, "/work", conf).unwrap_err();
        match err {
            TransformError::Config(message) => assert!(message.contains("must differ")),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[test]
    fn test_resolve_template_path() {
        let base = Path::new("/work");
        assert_eq!(resolve_template_path("/abs/t.yml", base), PathBuf::from("/abs/t.yml"));
        assert_eq!(resolve_template_path("t.yml", base), PathBuf::from("/work/t.yml"));
    }
}
