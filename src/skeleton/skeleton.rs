use glam::{Quat, Vec3};

use super::bone::{Bone, BoneId};
use crate::math::look_rotation;
use crate::solver::SolveResult;

/// Semantic roles for bone lookup, so collaborating motors can ask for
/// "the left hand" instead of hard-coding rig-specific names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BoneRole {
    Head,
    Chest,
    Pelvis,
    LeftHand,
    RightHand,
    LeftFoot,
    RightFoot,
}

/// Owns the bone tree and drives the per-frame update traversal.
///
/// Bones live in an index arena; a bone's children list is a non-owning
/// index into the same arena. The traversal is strictly parent before
/// child, because a child's world-bind-rotation depends on the parent's
/// just-updated transform.
#[derive(Debug, Clone, Default)]
pub struct Skeleton {
    bones: Vec<Bone>,
    roots: Vec<BoneId>,
    roles: Vec<(BoneRole, BoneId)>,
    /// Fallback forward axis for zero-length root bones.
    forward: Vec3,
    /// Scratch stack reused by the update traversal.
    traversal: Vec<BoneId>,
    bound: bool,
}

impl Skeleton {
    pub fn new() -> Self {
        Self {
            bones: Vec::new(),
            roots: Vec::new(),
            roles: Vec::new(),
            forward: Vec3::Z,
            traversal: Vec::new(),
            bound: false,
        }
    }

    /// Sets the skeleton-level forward axis used as the last-resort
    /// direction for bones with no children and no parent.
    pub fn set_forward(&mut self, forward: Vec3) {
        let forward = forward.normalize_or_zero();
        if forward.length_squared() > 0.0 {
            self.forward = forward;
        }
    }

    // ------------------------------------------------------------------
    // Construction
    // ------------------------------------------------------------------

    /// Adds a bone; parent links are taken from the bone itself. Bind
    /// geometry is not derived until [`Skeleton::bind`] runs.
    pub fn add_bone(&mut self, bone: Bone) -> BoneId {
        let id = BoneId(self.bones.len() as u32);
        if let Some(parent) = bone.parent() {
            if let Some(p) = self.bones.get_mut(parent.index()) {
                p.children.push(id);
            }
        } else {
            self.roots.push(id);
        }
        self.bones.push(bone);
        self.bound = false;
        id
    }

    /// Computes derived bind geometry for every bone: forward/up/right
    /// axes, bone lengths and the canonical-frame mapping. Must run once
    /// after construction and again after structural edits.
    pub fn bind(&mut self) {
        for index in 0..self.bones.len() {
            self.derive_bind_geometry(index);
        }
        for bone in &mut self.bones {
            bone.reset_to_bind();
        }
        self.bound = true;
        // One traversal settles world transforms into the bind pose
        self.update();
    }

    fn derive_bind_geometry(&mut self, index: usize) {
        let bone = &self.bones[index];
        if bone.is_detached() {
            return;
        }

        // Forward from the average child offset; offsets are authored in
        // this bone's frame
        let mut sum = Vec3::ZERO;
        let mut count = 0;
        for &child in &bone.children {
            let offset = self.bones[child.index()].bind_position();
            if offset.length_squared() > 1e-10 {
                sum += offset;
                count += 1;
            }
        }

        let (forward, length) = if count > 0 {
            let avg = sum / count as f32;
            (avg.normalize(), avg.length())
        } else {
            // Zero length, no children: inherit the parent's forward
            // expressed in this bone's frame, or the skeleton forward for
            // roots. Never a zero-length cross product.
            let inherited = match bone.parent() {
                Some(parent) => {
                    let p = &self.bones[parent.index()];
                    p.forward()
                }
                None => self.forward,
            };
            let local = (bone.bind_rotation().inverse() * inherited).normalize_or_zero();
            let forward = if local.length_squared() > 0.0 {
                local
            } else {
                Vec3::Z
            };
            (forward, 0.0)
        };

        let to_bone_forward = look_rotation(forward, Vec3::Y);
        let bone = &mut self.bones[index];
        bone.forward = forward;
        bone.length = length;
        bone.to_bone_forward = to_bone_forward;
        bone.right = to_bone_forward * Vec3::X;
        bone.up = to_bone_forward * Vec3::Y;
    }

    /// Detaches a bone from tracking. Its children are re-parented to the
    /// detached bone's parent, or become roots when there is none. The
    /// arena slot stays so existing `BoneId`s remain valid.
    pub fn detach(&mut self, id: BoneId) {
        let Some(bone) = self.bones.get(id.index()) else {
            return;
        };
        let parent = bone.parent();
        let children = bone.children().to_vec();

        match parent {
            Some(p) => {
                let siblings = &mut self.bones[p.index()].children;
                siblings.retain(|&c| c != id);
                siblings.extend_from_slice(&children);
            }
            None => {
                self.roots.retain(|&r| r != id);
                self.roots.extend_from_slice(&children);
            }
        }

        for &child in &children {
            self.bones[child.index()].parent = parent;
        }

        let bone = &mut self.bones[id.index()];
        bone.detached = true;
        bone.children.clear();
        bone.parent = None;
        self.roles.retain(|&(_, b)| b != id);
        self.bound = false;
    }

    // ------------------------------------------------------------------
    // Lookup
    // ------------------------------------------------------------------

    /// Whether bind geometry is current for the present tree structure.
    pub fn is_bound(&self) -> bool {
        self.bound
    }

    pub fn bone(&self, id: BoneId) -> Option<&Bone> {
        self.bones.get(id.index()).filter(|b| !b.is_detached())
    }

    pub fn bone_mut(&mut self, id: BoneId) -> Option<&mut Bone> {
        self.bones.get_mut(id.index()).filter(|b| !b.is_detached())
    }

    pub fn bone_count(&self) -> usize {
        self.bones.iter().filter(|b| !b.is_detached()).count()
    }

    pub fn roots(&self) -> &[BoneId] {
        &self.roots
    }

    pub fn find_bone(&self, name: &str) -> Option<BoneId> {
        self.bones
            .iter()
            .position(|b| !b.is_detached() && b.name == name)
            .map(|i| BoneId(i as u32))
    }

    pub fn assign_role(&mut self, role: BoneRole, id: BoneId) {
        self.roles.retain(|&(r, _)| r != role);
        self.roles.push((role, id));
    }

    pub fn bone_by_role(&self, role: BoneRole) -> Option<BoneId> {
        self.roles
            .iter()
            .find(|&&(r, _)| r == role)
            .map(|&(_, id)| id)
    }

    /// Walks from `end` toward the root collecting up to `length` bones,
    /// returned in root-to-end order. Useful for building solve requests.
    pub fn chain_to_root(&self, end: BoneId, length: usize) -> Vec<BoneId> {
        let mut chain = Vec::with_capacity(length);
        let mut current = Some(end);

        while let Some(id) = current {
            chain.push(id);
            if chain.len() >= length {
                break;
            }
            current = self.bone(id).and_then(|b| b.parent());
        }

        chain.reverse();
        chain
    }

    /// World rotation of a bone's canonical bind frame given the parent's
    /// current world transform. Solvers decode against this.
    pub(crate) fn world_bind_rotation(&self, id: BoneId) -> Quat {
        let bone = &self.bones[id.index()];
        let parent_rotation = bone
            .parent()
            .map(|p| self.bones[p.index()].world_rotation())
            .unwrap_or(Quat::IDENTITY);
        parent_rotation * bone.bind_rotation() * bone.to_bone_forward()
    }

    // ------------------------------------------------------------------
    // Frame update
    // ------------------------------------------------------------------

    /// Runs one full frame traversal: every bone consumes its queued
    /// modifiers, in enqueue order, strictly after its parent finished.
    pub fn update(&mut self) {
        let mut stack = std::mem::take(&mut self.traversal);
        stack.clear();

        for &root in self.roots.iter().rev() {
            stack.push(root);
        }

        while let Some(id) = stack.pop() {
            let index = id.index();
            if self.bones[index].is_detached() {
                continue;
            }

            let (parent_rotation, parent_position) = match self.bones[index].parent() {
                Some(p) => {
                    let parent = &self.bones[p.index()];
                    (parent.world_rotation(), parent.world_position())
                }
                None => (Quat::IDENTITY, Vec3::ZERO),
            };

            self.bones[index].update(parent_rotation, parent_position);

            for &child in self.bones[index].children().iter().rev() {
                stack.push(child);
            }
        }

        self.traversal = stack;
    }

    /// Enqueues every rotation from a solve result as a world-rotation
    /// modifier. The narrow glue path between solvers and the traversal.
    pub fn apply_result(&mut self, result: &SolveResult, weight: f32) {
        for &(id, rotation) in result.rotations() {
            if let Some(bone) = self.bone_mut(id) {
                bone.set_world_rotation(rotation, weight);
            }
        }
    }
}
