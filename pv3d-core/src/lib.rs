/// PV3D Core Library - Shared scene, lighting and interaction logic
///
/// This library provides the host-independent part of the product viewer:
/// the product scene graph, a software rasterizer with physically inspired
/// shading, contact shadows, orbit controls and the interaction state that
/// terminal and browser front ends drive.

pub mod animation;
pub mod color;
pub mod config;
pub mod controls;
pub mod error;
pub mod geometry;
pub mod lighting;
pub mod overlay;
pub mod picking;
pub mod projection;
pub mod raster;
pub mod scene;
pub mod shadow;
pub mod state;
pub mod transform;
pub mod viewer;

// Re-export commonly used types
pub use color::{Color, Material};
pub use config::ViewerConfig;
pub use error::{Error, Result};
pub use geometry::{Mesh, Triangle, Vertex};
pub use lighting::EnvironmentPreset;
pub use overlay::{Overlay, OverlayLayout};
pub use projection::Camera;
pub use raster::Framebuffer;
pub use state::ViewerState;
pub use transform::{Pose, RotationState, Transform};
pub use viewer::{PointerButton, ProductViewer, ProjectedLabel};
