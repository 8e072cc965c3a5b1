//! Camera with a layer visibility mask

use crate::layers::LayerMask;
use glam::{Mat4, Vec3};
use std::ops::Deref;

/// Shared scene camera
///
/// `layers` selects which objects the camera sees. The pipeline narrows it
/// for each pass through a [`LayerScope`] and always puts it back.
#[derive(Clone, Debug)]
pub struct Camera {
    pub view: Mat4,
    pub proj: Mat4,
    /// Camera position in world space
    pub position: Vec3,
    /// Visibility mask
    pub layers: LayerMask,
}

/// GPU layout of the camera consumed by the instance shader
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    /// Projection scale on x/y, used to size camera-facing primitives
    pub proj_scale: [f32; 2],
    pub _pad: [f32; 2],
}

impl Camera {
    pub fn new(view: Mat4, proj: Mat4, position: Vec3) -> Self {
        Self {
            view,
            proj,
            position,
            layers: LayerMask::BASE,
        }
    }

    /// Create a perspective camera
    pub fn perspective(
        position: Vec3,
        target: Vec3,
        up: Vec3,
        fov_y: f32,
        aspect: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let view = Mat4::look_at_rh(position, target, up);
        let proj = Mat4::perspective_rh(fov_y, aspect, near, far);
        Self::new(view, proj, position)
    }

    /// Create an orthographic camera
    #[allow(clippy::too_many_arguments)]
    pub fn orthographic(
        position: Vec3,
        target: Vec3,
        up: Vec3,
        left: f32,
        right: f32,
        bottom: f32,
        top: f32,
        near: f32,
        far: f32,
    ) -> Self {
        let view = Mat4::look_at_rh(position, target, up);
        let proj = Mat4::orthographic_rh(left, right, bottom, top, near, far);
        Self::new(view, proj, position)
    }

    pub fn with_layers(mut self, layers: LayerMask) -> Self {
        self.layers = layers;
        self
    }

    pub fn view_proj(&self) -> Mat4 {
        self.proj * self.view
    }

    pub fn sees(&self, membership: LayerMask) -> bool {
        self.layers.intersects(membership)
    }

    pub fn uniform(&self) -> CameraUniform {
        CameraUniform {
            view_proj: self.view_proj().to_cols_array_2d(),
            proj_scale: [self.proj.x_axis.x, self.proj.y_axis.y],
            _pad: [0.0; 2],
        }
    }

    /// Narrow the visibility mask until the returned scope is dropped
    pub fn scoped(&mut self, layers: LayerMask) -> LayerScope<'_> {
        LayerScope::new(self, layers)
    }
}

/// Scoped borrow of a camera's visibility mask
///
/// Captures the current mask on construction, installs `layers`, and
/// restores the captured mask on drop, including during unwinding.
pub struct LayerScope<'a> {
    camera: &'a mut Camera,
    saved: LayerMask,
}

impl<'a> LayerScope<'a> {
    pub fn new(camera: &'a mut Camera, layers: LayerMask) -> Self {
        let saved = camera.layers;
        camera.layers = layers;
        log::trace!("Camera layers {:?} -> {:?}", saved, layers);
        Self { camera, saved }
    }

    /// Mask that will be restored when the scope ends
    pub fn saved(&self) -> LayerMask {
        self.saved
    }
}

impl Deref for LayerScope<'_> {
    type Target = Camera;

    fn deref(&self) -> &Camera {
        &*self.camera
    }
}

impl Drop for LayerScope<'_> {
    fn drop(&mut self) {
        self.camera.layers = self.saved;
    }
}
