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

use crate::infrastructure::constants::{
    VOLUME_LABEL_COMPOSE_VOLUME, VOLUME_LABEL_REF, VOLUME_LABEL_STACK_NAMESPACE,
};
use crate::shared::error::Result;
use std::collections::HashMap;
use std::sync::OnceLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MountKind {
    Volume,
    Bind,
    Tmpfs,
}

/// A mount of the running controller container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerMount {
    pub kind: MountKind,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VolumeInfo {
    pub name: String,
    pub labels: HashMap<String, String>,
}

/// Read-only view of the container engine the controller runs on.
pub trait VolumeInspector: Send + Sync {
    fn container_mounts(&self) -> Vec<ContainerMount>;

    fn inspect_volume(&self, name: &str) -> Result<VolumeInfo>;
}

/// Maps volume names as written in the manifest to the real names of the
/// volumes mounted into the controller. Built on first use.
#[derive(Debug, Default)]
pub struct VolumeNameCache {
    mappings: OnceLock<HashMap<String, String>>,
}

impl VolumeNameCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn shared_volume_source(
        &self,
        inspector: &dyn VolumeInspector,
        source: &str,
    ) -> Option<String> {
        self.mappings
            .get_or_init(|| map_volumes(inspector))
            .get(source)
            .cloned()
    }
}

fn map_volumes(inspector: &dyn VolumeInspector) -> HashMap<String, String> {
    let mut mappings = HashMap::new();

    for mount in inspector.container_mounts() {
        if mount.kind != MountKind::Volume {
            continue;
        }

        match inspector.inspect_volume(&mount.name) {
            Ok(volume) => {
                if let Some(normalized) = normalized_volume_name(&volume) {
                    tracing::debug!(volume = %mount.name, normalized = %normalized, "mapped shared volume");
                    mappings.insert(normalized, mount.name);
                }
            }
            Err(e) => {
                tracing::warn!(volume = %mount.name, error = %e, "failed to inspect volume");
            }
        }
    }

    mappings
}

/// The manifest-level name of a volume, if its labels reveal one.
pub fn normalized_volume_name(volume: &VolumeInfo) -> Option<String> {
    if let Some(explicit) = volume.labels.get(VOLUME_LABEL_REF) {
        return Some(explicit.clone());
    }

    if let Some(namespace) = volume.labels.get(VOLUME_LABEL_STACK_NAMESPACE) {
        if let Some(stripped) = volume.name.strip_prefix(&format!("{}_", namespace)) {
            return Some(stripped.to_string());
        }
    }

    volume.labels.get(VOLUME_LABEL_COMPOSE_VOLUME).cloned()
}
