//! Scene database – objects, their materials and layer memberships

use crate::backend::{DrawInstance, SHAPE_DISC, SHAPE_QUAD};
use crate::camera::Camera;
use crate::layers::{LayerId, LayerMask, LayerRegistry, ObjectId};
use crate::material::Material;
use glam::Vec3;

/// Primitive drawn for an object, always facing the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shape {
    /// Square (stands in for boxes and UI panels)
    Quad,
    /// Filled circle (stands in for spheres)
    Disc,
}

impl Shape {
    fn code(self) -> u32 {
        match self {
            Shape::Quad => SHAPE_QUAD,
            Shape::Disc => SHAPE_DISC,
        }
    }
}

/// A single renderable object in the scene
#[derive(Debug, Clone)]
pub struct SceneObject {
    pub id: ObjectId,
    pub name: String,
    pub shape: Shape,
    pub position: Vec3,
    /// Half the edge length (quad) or the radius (disc), in world units
    pub half_size: f32,
    pub material: Material,
}

impl SceneObject {
    pub fn instance(&self) -> DrawInstance {
        DrawInstance {
            position: self.position.to_array(),
            half_size: self.half_size,
            color: self.material.linear_color(),
            shape: self.shape.code(),
            _pad: [0; 3],
        }
    }
}

/// The scene database
///
/// Objects are drawn in insertion order. Layer membership lives in the
/// scene's [`LayerRegistry`] and is consulted against the camera mask each
/// time a pass collects its instances.
pub struct Scene {
    objects: Vec<SceneObject>,
    layers: LayerRegistry,
    next_id: u32,
    /// Background clear color of the base pass. Default is black.
    pub sky_color: [f32; 3],
}

impl Scene {
    pub fn new() -> Self {
        Self {
            objects: Vec::new(),
            layers: LayerRegistry::new(),
            next_id: 0,
            sky_color: [0.0, 0.0, 0.0],
        }
    }

    pub fn with_sky(mut self, color: [f32; 3]) -> Self {
        self.sky_color = color;
        self
    }

    /// Add an object on the base layer
    pub fn add(
        &mut self,
        name: &str,
        shape: Shape,
        position: Vec3,
        half_size: f32,
        material: Material,
    ) -> ObjectId {
        self.add_with_layers(name, shape, position, half_size, material, LayerMask::BASE)
    }

    /// Add an object that is drawn normally and also glows
    pub fn add_glowing(
        &mut self,
        name: &str,
        shape: Shape,
        position: Vec3,
        half_size: f32,
        material: Material,
    ) -> ObjectId {
        self.add_with_layers(
            name,
            shape,
            position,
            half_size,
            material,
            LayerMask::BASE | LayerMask::BLOOM,
        )
    }

    /// Add a UI element on the overlay layer only
    pub fn add_overlay(
        &mut self,
        name: &str,
        shape: Shape,
        position: Vec3,
        half_size: f32,
        material: Material,
    ) -> ObjectId {
        self.add_with_layers(name, shape, position, half_size, material, LayerMask::OVERLAY)
    }

    pub fn add_with_layers(
        &mut self,
        name: &str,
        shape: Shape,
        position: Vec3,
        half_size: f32,
        material: Material,
        layers: LayerMask,
    ) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        let mask = self.layers.register_with(id, layers);
        log::debug!("Scene: added '{}' as {:?} on {:?}", name, id, mask);
        self.objects.push(SceneObject {
            id,
            name: name.to_string(),
            shape,
            position,
            half_size: half_size.max(0.0),
            material,
        });
        id
    }

    /// Add a layer to an existing object; `false` if refused or unknown
    pub fn enable_layer(&mut self, id: ObjectId, layer: LayerId) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        self.layers.enable_layer(id, layer)
    }

    pub fn layers(&self) -> &LayerRegistry {
        &self.layers
    }

    pub fn objects(&self) -> &[SceneObject] {
        &self.objects
    }

    pub fn get(&self, id: ObjectId) -> Option<&SceneObject> {
        self.objects.iter().find(|object| object.id == id)
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut SceneObject> {
        self.objects.iter_mut().find(|object| object.id == id)
    }

    pub fn remove(&mut self, id: ObjectId) -> Option<SceneObject> {
        let index = self.objects.iter().position(|object| object.id == id)?;
        self.layers.forget(id);
        Some(self.objects.remove(index))
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    /// Objects whose membership intersects the camera mask, in draw order
    pub fn visible_to<'a>(
        &'a self,
        camera: &'a Camera,
    ) -> impl Iterator<Item = &'a SceneObject> + 'a {
        self.objects
            .iter()
            .filter(move |object| camera.sees(self.layers.mask_of(object.id)))
    }

    pub fn instances_visible_to(&self, camera: &Camera) -> Vec<DrawInstance> {
        self.visible_to(camera).map(SceneObject::instance).collect()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera() -> Camera {
        Camera::orthographic(
            Vec3::new(0.0, 0.0, 10.0),
            Vec3::ZERO,
            Vec3::Y,
            -1.0,
            1.0,
            -1.0,
            1.0,
            0.1,
            100.0,
        )
    }

    fn scene() -> (Scene, ObjectId, ObjectId, ObjectId) {
        let mut scene = Scene::new();
        let red = Material::basic([1.0, 0.0, 0.0]);
        let cyan = Material::basic([0.0, 1.0, 1.0]);
        let white = Material::sprite([1.0; 3], 1.0);
        let cube = scene.add("cube", Shape::Quad, Vec3::ZERO, 1.0, red);
        let sphere = scene.add_glowing("sphere", Shape::Disc, Vec3::X, 1.0, cyan);
        let hud = scene.add_overlay("hud", Shape::Quad, Vec3::Y, 0.5, white);
        (scene, cube, sphere, hud)
    }

    #[test]
    fn camera_mask_selects_objects() {
        let (scene, cube, sphere, hud) = scene();
        let ids = |mask: LayerMask| -> Vec<ObjectId> {
            let cam = camera().with_layers(mask);
            scene.visible_to(&cam).map(|o| o.id).collect()
        };

        assert_eq!(ids(LayerMask::BASE), vec![cube, sphere]);
        assert_eq!(ids(LayerMask::BLOOM), vec![sphere]);
        assert_eq!(ids(LayerMask::OVERLAY), vec![hud]);
        assert_eq!(ids(LayerMask::all()), vec![cube, sphere, hud]);
    }

    #[test]
    fn overlay_cannot_be_made_to_glow() {
        let (mut scene, _, _, hud) = scene();
        assert!(!scene.enable_layer(hud, LayerId::Bloom));
        let cam = camera().with_layers(LayerMask::BLOOM);
        assert!(scene.visible_to(&cam).all(|o| o.id != hud));
    }

    #[test]
    fn enable_layer_is_additive() {
        let (mut scene, cube, _, _) = scene();
        assert!(scene.enable_layer(cube, LayerId::Bloom));
        assert_eq!(scene.layers().mask_of(cube), LayerMask::BASE | LayerMask::BLOOM);
        assert!(!scene.enable_layer(ObjectId(999), LayerId::Bloom));
    }

    #[test]
    fn instances_carry_material_colour() {
        let (scene, _, _, _) = scene();
        let cam = camera().with_layers(LayerMask::BLOOM);
        let instances = scene.instances_visible_to(&cam);
        assert_eq!(instances.len(), 1);
        assert_eq!(instances[0].color, [0.0, 1.0, 1.0, 1.0]);
        assert_eq!(instances[0].shape, SHAPE_DISC);
        assert_eq!(instances[0].position, [1.0, 0.0, 0.0]);
    }

    #[test]
    fn remove_forgets_membership() {
        let (mut scene, _, sphere, _) = scene();
        let removed = scene.remove(sphere).unwrap();
        assert_eq!(removed.name, "sphere");
        assert_eq!(scene.len(), 2);
        assert_eq!(scene.layers().mask_of(sphere), LayerMask::BASE);
        assert!(scene.remove(sphere).is_none());
    }
}
