// Copyright 2025 eraflo
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

//! The scene as seen by the lighting build.
//!
//! The editor object model is external. The build only queries it through
//! [`SceneQuery`], mutates it through [`SceneEditor`] and hands results to a
//! [`LightingResultSink`]. Ids are opaque handles issued by the scene.

mod bsp;
mod traits;
mod types;

pub use self::bsp::{BspComponent, BspModel, BspNode, BspSurface};
pub use self::traits::{
    LevelInvalidation, LightingResultSink, MappingTarget, SceneEditor, SceneQuery,
    StaticLightingWorld,
};
pub use self::types::{
    LevelInfo, LightInfo, LightKind, LightmassWorldSettings, MappingDesc, MeshDesc, Mobility,
    PrimitiveInfo, PrimitiveLightingInfo, WorldSettings,
};

use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! scene_id {
    ($(#[$meta:meta])* $name:ident($inner:ty)) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
        )]
        pub struct $name(pub $inner);

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }
    };
}

scene_id!(
    /// Handle to a level.
    LevelId(u32)
);
scene_id!(
    /// Handle to an actor.
    ActorId(u64)
);
scene_id!(
    /// Handle to a primitive or BSP model component.
    ComponentId(u64)
);
scene_id!(
    /// Handle to a light component.
    LightId(u64)
);
scene_id!(
    /// Build-scoped sequential id used for precomputed visibility bookkeeping.
    VisibilityId(u32)
);
