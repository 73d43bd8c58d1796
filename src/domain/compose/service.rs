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

//! Compose service definition
//!
//! Only the shape of each property is checked here. Anything that is not a
//! known property or an `x-` extension is rejected by [`ServiceConfig::validate`].

use crate::domain::compose::values::{
    deserialize_labels, deserialize_mapping_with_equals,
};
use serde::{Deserialize, Serialize};
use serde_yaml::{Mapping, Value};
use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    #[serde(skip)]
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build: Option<BuildConfig>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cap_add: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub cap_drop: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cgroup_parent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<StringOrList>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub configs: Vec<FileReference>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credential_spec: Option<Mapping>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub depends_on: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deploy: Option<Mapping>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub devices: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns: Option<StringOrList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dns_search: Option<StringOrList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub domainname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entrypoint: Option<StringOrList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub env_file: Option<StringOrList>,
    #[serde(
        deserialize_with = "deserialize_mapping_with_equals",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub environment: BTreeMap<String, Option<String>>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub expose: Vec<StringOrNumber>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub external_links: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub extra_hosts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub healthcheck: Option<HealthCheckConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hostname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub init: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipc: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub isolation: Option<String>,
    #[serde(
        deserialize_with = "deserialize_labels",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub labels: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub links: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mac_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub networks: Option<Networks>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pid: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub ports: Vec<PortConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub privileged: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub restart: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub secrets: Vec<FileReference>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security_opt: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shm_size: Option<StringOrNumber>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stdin_open: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_grace_period: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_signal: Option<String>,
    #[serde(
        deserialize_with = "deserialize_mapping_with_equals",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub sysctls: BTreeMap<String, Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmpfs: Option<StringOrList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tty: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ulimits: Option<Mapping>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub userns_mode: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub volumes: Vec<ServiceVolume>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub working_dir: Option<String>,
    /// `x-` prefixed extension properties, kept verbatim.
    #[serde(flatten)]
    pub extensions: BTreeMap<String, Value>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringOrList {
    Single(String),
    List(Vec<String>),
}

impl StringOrList {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            StringOrList::Single(item) => vec![item.clone()],
            StringOrList::List(items) => items.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StringOrNumber {
    Number(u64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BuildConfig {
    Context(String),
    Detailed(BuildOptions),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildOptions {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dockerfile: Option<String>,
    #[serde(
        deserialize_with = "deserialize_mapping_with_equals",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub args: BTreeMap<String, Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct HealthCheckConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub test: Option<StringOrList>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_period: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retries: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub disable: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggingConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub driver: Option<String>,
    #[serde(
        deserialize_with = "deserialize_labels",
        skip_serializing_if = "BTreeMap::is_empty"
    )]
    pub options: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Networks {
    List(Vec<String>),
    Map(BTreeMap<String, Option<NetworkAttachment>>),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct NetworkAttachment {
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv4_address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv6_address: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortConfig {
    Number(u64),
    Short(String),
    Long(PortMapping),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PortMapping {
    pub target: u16,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<u16>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FileReference {
    Name(String),
    Detailed(FileReferenceOptions),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileReferenceOptions {
    pub source: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gid: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mode: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ServiceVolume {
    Short(String),
    Long(VolumeMount),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VolumeMount {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub target: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub read_only: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consistency: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bind: Option<Mapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<Mapping>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tmpfs: Option<Mapping>,
}

impl ServiceConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    /// Rejects properties that are neither known nor `x-` extensions.
    pub fn validate(&self) -> Result<(), String> {
        let unknown: Vec<&str> = self
            .extensions
            .keys()
            .filter(|key| !key.starts_with("x-"))
            .map(String::as_str)
            .collect();

        if unknown.is_empty() {
            Ok(())
        } else {
            Err(format!(
                "unsupported properties in service '{}': {}",
                self.name,
                unknown.join(", ")
            ))
        }
    }

    /// Resolves relative host paths against `working_dir`.
    pub fn resolve_relative_paths(&mut self, working_dir: &Path) {
        for volume in &mut self.volumes {
            match volume {
                ServiceVolume::Short(spec) => {
                    let (source, rest) = match spec.split_once(':') {
                        Some((source, rest)) => (source.to_string(), Some(rest.to_string())),
                        None => continue,
                    };
                    if is_relative_host_path(&source) {
                        let source = resolve_path(working_dir, &source);
                        *spec = match rest {
                            Some(rest) => format!("{}:{}", source, rest),
                            None => source,
                        };
                    }
                }
                ServiceVolume::Long(mount) => {
                    if mount.kind != "bind" {
                        continue;
                    }
                    if let Some(source) = mount.source.as_mut() {
                        if is_relative_host_path(source) {
                            *source = resolve_path(working_dir, source);
                        }
                    }
                }
            }
        }

        match self.env_file.as_mut() {
            Some(StringOrList::Single(path)) => *path = resolve_path(working_dir, path),
            Some(StringOrList::List(paths)) => {
                for path in paths.iter_mut() {
                    *path = resolve_path(working_dir, path);
                }
            }
            None => {}
        }

        match self.build.as_mut() {
            Some(BuildConfig::Context(context)) => {
                if !is_remote_context(context) {
                    *context = resolve_path(working_dir, context);
                }
            }
            Some(BuildConfig::Detailed(options)) => {
                if let Some(context) = options.context.as_mut() {
                    if !is_remote_context(context) {
                        *context = resolve_path(working_dir, context);
                    }
                }
            }
            None => {}
        }
    }
}

fn is_relative_host_path(source: &str) -> bool {
    source == "." || source.starts_with("./") || source.starts_with("..")
}

fn is_remote_context(context: &str) -> bool {
    context.contains("://") || context.starts_with("git@") || context.starts_with("github.com/")
}

/// Joins `path` onto `working_dir` and folds `.` and `..` components.
/// Absolute paths are returned unchanged.
pub fn resolve_path(working_dir: &Path, path: &str) -> String {
    if Path::new(path).is_absolute() {
        return path.to_string();
    }

    let mut resolved = PathBuf::from(working_dir);
    for component in Path::new(path).components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                resolved.pop();
            }
            other => resolved.push(other.as_os_str()),
        }
    }

    resolved.to_string_lossy().into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> ServiceConfig {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_parse_common_properties() {
        let service = parse(
            r#"
image: nginx:1.25
environment:
  - MODE=prod
  - DEBUG
labels:
  tier: web
ports:
  - 80
  - "8443:443"
  - target: 9000
    published: 9001
volumes:
  - ./html:/usr/share/nginx/html:ro
  - type: volume
    source: cache
    target: /var/cache
restart: always
x-custom:
  anything: goes
"#,
        );

        assert_eq!(service.image.as_deref(), Some("nginx:1.25"));
        assert_eq!(service.environment["MODE"], Some("prod".to_string()));
        assert_eq!(service.environment["DEBUG"], None);
        assert_eq!(service.labels["tier"], "web");
        assert_eq!(service.ports.len(), 3);
        assert_eq!(service.ports[0], PortConfig::Number(80));
        assert!(matches!(service.ports[2], PortConfig::Long(_)));
        assert_eq!(service.volumes.len(), 2);
        assert_eq!(service.restart.as_deref(), Some("always"));
        assert!(service.extensions.contains_key("x-custom"));
        assert!(service.validate().is_ok());
    }

    #[test]
    fn test_unknown_property_rejected() {
        let mut service = parse("image: alpine\nenv: [X=1]\n");
        service.name = "app".to_string();
        let err = service.validate().unwrap_err();
        assert!(err.contains("env"));
    }

    #[test]
    fn test_wrong_shape_fails_to_parse() {
        assert!(serde_yaml::from_str::<ServiceConfig>("image: [a, b]").is_err());
        assert!(serde_yaml::from_str::<ServiceConfig>("environment: 42").is_err());
        assert!(serde_yaml::from_str::<ServiceConfig>("healthcheck: {test: x, bogus: 1}").is_err());
    }

    #[test]
    fn test_resolve_relative_paths() {
        let mut service = parse(
            r#"
build: ./app
env_file: ../common.env
volumes:
  - ./data:/data
  - named:/named
  - /abs:/abs
  - type: bind
    source: ./conf
    target: /etc/conf
"#,
        );

        service.resolve_relative_paths(Path::new("/srv/project"));

        assert_eq!(
            service.build,
            Some(BuildConfig::Context("/srv/project/app".to_string()))
        );
        assert_eq!(
            service.env_file,
            Some(StringOrList::Single("/srv/common.env".to_string()))
        );
        assert_eq!(
            service.volumes[0],
            ServiceVolume::Short("/srv/project/data:/data".to_string())
        );
        assert_eq!(service.volumes[1], ServiceVolume::Short("named:/named".to_string()));
        assert_eq!(service.volumes[2], ServiceVolume::Short("/abs:/abs".to_string()));
        match &service.volumes[3] {
            ServiceVolume::Long(mount) => {
                assert_eq!(mount.source.as_deref(), Some("/srv/project/conf"))
            }
            other => panic!("unexpected volume: {:?}", other),
        }
    }

    #[test]
    fn test_serialize_skips_empty_properties() {
        let mut service = ServiceConfig::new("app");
        service.image = Some("alpine".to_string());
        let text = serde_yaml::to_string(&service).unwrap();
        assert_eq!(text, "image: alpine\n");
    }
}
