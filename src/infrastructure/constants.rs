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

/// Controller defaults
pub const CONTROLLER_IMAGE: &str = "rycus86/podlike";
pub const DOCKER_SOCKET_VOLUME: &str = "/var/run/docker.sock:/var/run/docker.sock";

/// Label prefixes on the controller
pub const COMPONENT_LABEL_PREFIX: &str = "pod.component.";
pub const COPY_LABEL_PREFIX: &str = "pod.copy.";

/// Extension holding the template declarations
pub const EXTENSION_KEY: &str = "x-podlike";

/// Template declaration keys
pub const DECLARATION_FILE: &str = "file";
pub const DECLARATION_INLINE: &str = "inline";
pub const DECLARATION_HTTP: &str = "http";
pub const DECLARATION_ARGS: &str = "args";

/// Service names accepted by the Compose schema
pub const SERVICE_NAME_PATTERN: &str = r"^[a-zA-Z0-9._-]+$";

/// Main component template used when a service declares none
pub const DEFAULT_TRANSFORMER_TEMPLATE: &str = "\"{{ service.name }}\": {}";

/// Volume labels read when mapping shared volume names
pub const VOLUME_LABEL_REF: &str = "com.github.rycus86.podlike.volume-ref";
pub const VOLUME_LABEL_STACK_NAMESPACE: &str = "com.docker.stack.namespace";
pub const VOLUME_LABEL_COMPOSE_VOLUME: &str = "com.docker.compose.volume";

/// Original service properties that may fill gaps in a rendered definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MergeKeySet {
    pub name: &'static str,
    pub keys: &'static [&'static str],
}

impl MergeKeySet {
    pub fn contains(&self, key: &str) -> bool {
        self.keys.contains(&key)
    }
}

/// Carried over to the controller: placement, networking and lifecycle.
pub const POD_MERGE_KEYS: MergeKeySet = MergeKeySet {
    name: "pod",
    keys: &[
        "configs",
        "deploy",
        "dns",
        "dns_search",
        "domainname",
        "expose",
        "extra_hosts",
        "hostname",
        "labels",
        "logging",
        "network_mode",
        "networks",
        "ports",
        "restart",
        "secrets",
        "stop_grace_period",
        "stop_signal",
    ],
};

/// Carried over to the main component: what the process itself runs with.
pub const TRANSFORMER_MERGE_KEYS: MergeKeySet = MergeKeySet {
    name: "transformer",
    keys: &[
        "build",
        "cap_add",
        "cap_drop",
        "command",
        "devices",
        "entrypoint",
        "env_file",
        "environment",
        "healthcheck",
        "image",
        "init",
        "privileged",
        "read_only",
        "security_opt",
        "stdin_open",
        "sysctls",
        "tmpfs",
        "tty",
        "ulimits",
        "user",
        "volumes",
        "working_dir",
    ],
};
