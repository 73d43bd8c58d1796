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

#![allow(dead_code)]

use podlike_compose::{Project, ServiceConfig};
use std::sync::Once;

static INIT: Once = Once::new();

pub fn init_tracing() {
    INIT.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_test_writer()
            .with_max_level(tracing::Level::DEBUG)
            .try_init();
    });
}

pub fn project(yaml: &str) -> Project {
    Project::from_yaml_str(yaml).expect("test manifest should parse")
}

pub fn service<'a>(project: &'a Project, name: &str) -> &'a ServiceConfig {
    project
        .service(name)
        .unwrap_or_else(|| panic!("service {} should exist", name))
}

/// Parses a component label back into a service definition.
pub fn component(controller: &ServiceConfig, label: &str) -> ServiceConfig {
    let text = controller
        .labels
        .get(label)
        .unwrap_or_else(|| panic!("label {} should be set", label));
    serde_yaml::from_str(text).expect("component label should be YAML")
}

pub fn copies(controller: &ServiceConfig, label: &str) -> Vec<String> {
    let text = controller
        .labels
        .get(label)
        .unwrap_or_else(|| panic!("label {} should be set", label));
    serde_yaml::from_str(text).expect("copy label should be a YAML list")
}
