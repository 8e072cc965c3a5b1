//! Layer identifiers and per-object layer membership

use bitflags::bitflags;
use std::collections::HashMap;

/// The fixed set of rendering layers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LayerId {
    /// Regular geometry, drawn by the base pass
    Base,
    /// Glowing geometry, drawn in isolation by the bloom pass
    Bloom,
    /// UI overlays, never bloomed
    Overlay,
}

impl LayerId {
    pub const ALL: [LayerId; 3] = [LayerId::Base, LayerId::Bloom, LayerId::Overlay];

    pub fn mask(self) -> LayerMask {
        match self {
            LayerId::Base => LayerMask::BASE,
            LayerId::Bloom => LayerMask::BLOOM,
            LayerId::Overlay => LayerMask::OVERLAY,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            LayerId::Base => "base",
            LayerId::Bloom => "bloom",
            LayerId::Overlay => "overlay",
        }
    }
}

bitflags! {
    /// Layer membership of an object, or the set of layers a camera can see
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct LayerMask: u32 {
        const BASE = 1 << 0;
        const BLOOM = 1 << 1;
        const OVERLAY = 1 << 2;
    }
}

impl LayerMask {
    pub fn has(self, layer: LayerId) -> bool {
        self.contains(layer.mask())
    }

    /// True when the mask pairs `OVERLAY` with `BLOOM`, which UI must never do
    pub fn is_conflicting(self) -> bool {
        self.contains(LayerMask::OVERLAY | LayerMask::BLOOM)
    }

    /// Normalize a membership mask: empty becomes `BASE` and `BLOOM` is
    /// dropped from overlay objects.
    pub fn sanitized(self) -> LayerMask {
        if self.is_empty() {
            return LayerMask::BASE;
        }
        if self.is_conflicting() {
            log::warn!("Overlay objects cannot bloom; dropping BLOOM from {:?}", self);
            return self - LayerMask::BLOOM;
        }
        self
    }
}

impl From<LayerId> for LayerMask {
    fn from(layer: LayerId) -> Self {
        layer.mask()
    }
}

/// Stable handle of a scene object
#[derive(Debug, Copy, Clone, Hash, Eq, PartialEq, PartialOrd, Ord)]
pub struct ObjectId(pub u32);

/// Persistent layer membership for scene objects
///
/// Membership is set when an object enters the scene and can only grow
/// afterwards. Objects the registry has never seen are treated as `Base`.
#[derive(Debug, Default, Clone)]
pub struct LayerRegistry {
    memberships: HashMap<ObjectId, LayerMask>,
}

impl LayerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an object with the default `Base` membership
    pub fn register(&mut self, object: ObjectId) -> LayerMask {
        self.register_with(object, LayerMask::BASE)
    }

    /// Register an object with an explicit initial membership
    pub fn register_with(&mut self, object: ObjectId, mask: LayerMask) -> LayerMask {
        let mask = mask.sanitized();
        self.memberships.insert(object, mask);
        mask
    }

    /// Add `layer` to an object's membership, keeping the layers it already has.
    ///
    /// Returns `false` when the addition would make an overlay object bloom.
    pub fn enable_layer(&mut self, object: ObjectId, layer: LayerId) -> bool {
        let current = self.mask_of(object);
        let candidate = current | layer.mask();
        if candidate.is_conflicting() {
            log::warn!(
                "Refusing to add layer '{}' to {:?}: overlay and bloom are exclusive",
                layer.name(),
                object
            );
            return false;
        }
        self.memberships.insert(object, candidate);
        true
    }

    pub fn mask_of(&self, object: ObjectId) -> LayerMask {
        self.memberships
            .get(&object)
            .copied()
            .unwrap_or(LayerMask::BASE)
    }

    pub fn belongs_to(&self, object: ObjectId, layer: LayerId) -> bool {
        self.mask_of(object).has(layer)
    }

    /// Drop an object's membership (it reverts to the `Base` default)
    pub fn forget(&mut self, object: ObjectId) -> Option<LayerMask> {
        self.memberships.remove(&object)
    }

    pub fn len(&self) -> usize {
        self.memberships.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memberships.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_objects_are_base_only() {
        let registry = LayerRegistry::new();
        let id = ObjectId(42);
        assert!(registry.belongs_to(id, LayerId::Base));
        assert!(!registry.belongs_to(id, LayerId::Bloom));
        assert!(!registry.belongs_to(id, LayerId::Overlay));
    }

    #[test]
    fn enabling_bloom_keeps_base() {
        let mut registry = LayerRegistry::new();
        let id = ObjectId(1);
        registry.register(id);
        assert!(registry.enable_layer(id, LayerId::Bloom));
        assert_eq!(registry.mask_of(id), LayerMask::BASE | LayerMask::BLOOM);
        assert!(registry.belongs_to(id, LayerId::Base));
        assert!(registry.belongs_to(id, LayerId::Bloom));
    }

    #[test]
    fn overlay_objects_refuse_bloom() {
        let mut registry = LayerRegistry::new();
        let ui = ObjectId(7);
        registry.register_with(ui, LayerMask::OVERLAY);
        assert!(!registry.enable_layer(ui, LayerId::Bloom));
        assert_eq!(registry.mask_of(ui), LayerMask::OVERLAY);

        let glow = ObjectId(8);
        registry.register(glow);
        registry.enable_layer(glow, LayerId::Bloom);
        assert!(!registry.enable_layer(glow, LayerId::Overlay));
        assert!(!registry.belongs_to(glow, LayerId::Overlay));
    }

    #[test]
    fn conflicting_initial_mask_is_sanitized() {
        let mut registry = LayerRegistry::new();
        let id = ObjectId(3);
        let mask = registry.register_with(id, LayerMask::OVERLAY | LayerMask::BLOOM);
        assert_eq!(mask, LayerMask::OVERLAY);
        assert_eq!(registry.register_with(ObjectId(4), LayerMask::empty()), LayerMask::BASE);
    }

    #[test]
    fn forget_reverts_to_default() {
        let mut registry = LayerRegistry::new();
        let id = ObjectId(9);
        registry.register_with(id, LayerMask::BLOOM);
        assert_eq!(registry.forget(id), Some(LayerMask::BLOOM));
        assert_eq!(registry.mask_of(id), LayerMask::BASE);
        assert!(registry.is_empty());
    }
}
