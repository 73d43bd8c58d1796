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

//! Template rendering and the layering pipeline

pub mod copy;
pub mod materializer;
pub mod merger;
pub mod renderer;
pub mod session;
pub mod transform;

pub use self::merger::{carry_over, merge, rename_root, root_key};
pub use self::renderer::render;
pub use self::session::{transform_yaml, TransformSession};
pub use self::transform::{transform, PodTransformer};
