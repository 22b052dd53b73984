use glam::{Quat, Vec3};

/// How many influences a single bone accepts per frame before new ones are
/// dropped. Motors stacking more than this on one bone is an authoring
/// problem, not something the rig should allocate for.
pub const MODIFIER_CAPACITY: usize = 8;

/// A queued, not-yet-applied influence on a bone's rotation.
///
/// Modifiers never touch the transform when enqueued; they are decoded,
/// blended in enqueue order and clamped during the skeleton's update
/// traversal.
#[derive(Debug, Clone, Copy)]
pub struct BoneModifier {
    pub kind: ModifierKind,
    /// Blend weight against the influences queued before this one.
    pub weight: f32,
}

#[derive(Debug, Clone, Copy)]
pub enum ModifierKind {
    /// Desired world-space rotation for the bone.
    WorldRotation { rotation: Quat },
    /// Swing/twist pair already expressed in the bone's canonical
    /// bind-relative frame.
    LocalRotation { swing: Quat, twist: Quat },
    /// World-space position the bone's end point should look toward.
    WorldEndPosition { position: Vec3, up_hint: Vec3 },
}

/// Fixed-capacity per-bone modifier queue, reused across frames.
///
/// `clear` keeps the allocation; `push` past capacity drops the new entry
/// with a warning rather than growing in the per-frame hot path.
#[derive(Debug, Clone, Default)]
pub struct ModifierQueue {
    entries: Vec<BoneModifier>,
}

impl ModifierQueue {
    pub fn new() -> Self {
        Self {
            entries: Vec::with_capacity(MODIFIER_CAPACITY),
        }
    }

    pub fn push(&mut self, modifier: BoneModifier) {
        if self.entries.len() >= MODIFIER_CAPACITY {
            log::warn!("bone modifier queue full, dropping influence");
            return;
        }
        self.entries.push(modifier);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<BoneModifier> {
        self.entries.get(index).copied()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
