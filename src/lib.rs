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

//! Renders pod templates attached to Compose services.
//!
//! Each service that declares templates is replaced by a controller service.
//! The rendered main component, side components and copy declarations are
//! stored on the controller as labels.

// Core modules
pub mod domain;
pub mod infrastructure;
pub mod shared;

// Re-export commonly used types
pub use domain::compose::{Project, ServiceConfig};
pub use domain::config::TransformConf;
pub use domain::pod::{Layer, PodTemplates, RenderContext, Template};
pub use infrastructure::engine::{VolumeInspector, VolumeNameCache};
pub use infrastructure::template::{transform, transform_yaml, PodTransformer, TransformSession};
pub use shared::{Result, TransformError};
