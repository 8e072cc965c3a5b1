//! Helio Layered - selective bloom with a bloom-free overlay layer
//!
//! Composites three views of the same scene into one frame:
//!
//! - **Bloom pass** renders only glow-tagged objects, then runs a luminance
//!   high-pass and a separable blur into the bloom buffer
//! - **Overlay pass** renders UI objects untouched into the overlay buffer
//! - **Base pass** renders regular geometry and finishes with a full-screen
//!   composition that adds bloom and alpha-blends the overlay on top
//!
//! Which objects show up in which pass is decided by the camera's layer
//! mask, which the [`PipelineDriver`] borrows and restores around every stage.
//! GPU work goes through a [`RenderBackend`]: [`GpuBackend`] drives wgpu,
//! [`SoftwareBackend`] is a CPU reference used for headless runs and tests.

pub mod backend;
pub mod camera;
pub mod composite;
pub mod config;
pub mod layers;
pub mod material;
pub mod scene;
pub mod stages;
pub mod targets;

mod driver;

pub use backend::{
    AllocationStats, ColorFormat, CompositionInputs, DrawInstance, Extent, GpuBackend, GpuTarget,
    RenderBackend, SoftwareBackend, SoftwareTarget,
};
pub use camera::{Camera, CameraUniform, LayerScope};
pub use config::{
    BloomOverrides, BloomParameters, PerformanceProfileSelector, PipelineConfig, QualityProfile,
};
pub use driver::{FramePhase, FrameState, PipelineDriver, PipelineStatus};
pub use layers::{LayerId, LayerMask, LayerRegistry, ObjectId};
pub use material::Material;
pub use scene::{Scene, SceneObject, Shape};
pub use stages::{BaseCompositeStage, BloomExtractionStage, LayerStage, OverlayStage};
pub use targets::{RenderTargetSet, SizedTarget};

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building or driving the pipeline
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A render target could not be created at the requested size
    #[error("Resource error: {0}")]
    Resource(String),

    /// A frame was requested from a pipeline whose targets failed to allocate
    #[error("Pipeline unavailable: render targets are not allocated")]
    Unavailable,

    /// The pipeline was torn down and refuses further work
    #[error("Pipeline has been torn down")]
    TornDown,

    #[error("Config error: {0}")]
    Config(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("Shader error: {0}")]
    Shader(String),

    #[error("WGPU error: {0}")]
    Wgpu(String),
}

impl From<wgpu::Error> for Error {
    fn from(err: wgpu::Error) -> Self {
        Error::Wgpu(err.to_string())
    }
}
