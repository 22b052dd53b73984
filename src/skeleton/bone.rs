use glam::{Quat, Vec3};

use super::modifier::{BoneModifier, ModifierKind, ModifierQueue};
use crate::joint::Joint;
use crate::math::{look_rotation, swing_twist};

/// A bone identifier (index into the owning skeleton's arena).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BoneId(pub u32);

impl BoneId {
    pub fn new(index: u32) -> Self {
        Self(index)
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// A node in the skeletal tree.
///
/// Bind geometry is computed once when the skeleton binds and stays fixed
/// until a re-bind. Runtime rotation state is always kept as a swing/twist
/// decomposition relative to the bone's forward axis, never as a single
/// combined quaternion, so joints can clamp the two components
/// independently.
#[derive(Debug, Clone)]
pub struct Bone {
    pub name: String,
    pub(crate) parent: Option<BoneId>,
    pub(crate) children: Vec<BoneId>,
    pub(crate) detached: bool,

    // Bind geometry, fixed after Skeleton::bind
    pub(crate) bind_rotation: Quat,
    pub(crate) bind_position: Vec3,
    pub(crate) length: f32,
    pub(crate) forward: Vec3,
    pub(crate) up: Vec3,
    pub(crate) right: Vec3,
    /// Maps the canonical +Z-forward frame onto this bone's authored
    /// forward direction.
    pub(crate) to_bone_forward: Quat,

    // Runtime state
    swing: Quat,
    twist: Quat,
    queue: ModifierQueue,
    joint: Option<Joint>,
    blend_weight: f32,
    apply_limits: bool,
    limits_this_frame: bool,
    in_limits: bool,
    dirty: bool,

    pub(crate) local_rotation: Quat,
    pub(crate) world_rotation: Quat,
    pub(crate) world_position: Vec3,
}

impl Bone {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parent: None,
            children: Vec::new(),
            detached: false,
            bind_rotation: Quat::IDENTITY,
            bind_position: Vec3::ZERO,
            length: 0.0,
            forward: Vec3::Z,
            up: Vec3::Y,
            right: Vec3::X,
            to_bone_forward: Quat::IDENTITY,
            swing: Quat::IDENTITY,
            twist: Quat::IDENTITY,
            queue: ModifierQueue::new(),
            joint: None,
            blend_weight: 1.0,
            apply_limits: true,
            limits_this_frame: true,
            in_limits: true,
            dirty: false,
            local_rotation: Quat::IDENTITY,
            world_rotation: Quat::IDENTITY,
            world_position: Vec3::ZERO,
        }
    }

    pub fn with_parent(mut self, parent: BoneId) -> Self {
        self.parent = Some(parent);
        self
    }

    /// Local offset from the parent, in the parent's authored frame.
    pub fn with_bind_position(mut self, position: Vec3) -> Self {
        self.bind_position = position;
        self
    }

    pub fn with_bind_rotation(mut self, rotation: Quat) -> Self {
        self.bind_rotation = rotation;
        self
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn parent(&self) -> Option<BoneId> {
        self.parent
    }

    pub fn children(&self) -> &[BoneId] {
        &self.children
    }

    pub fn length(&self) -> f32 {
        self.length
    }

    /// Authored forward axis in the bone's local frame.
    pub fn forward(&self) -> Vec3 {
        self.forward
    }

    pub fn up(&self) -> Vec3 {
        self.up
    }

    pub fn right(&self) -> Vec3 {
        self.right
    }

    pub fn to_bone_forward(&self) -> Quat {
        self.to_bone_forward
    }

    pub fn bind_rotation(&self) -> Quat {
        self.bind_rotation
    }

    pub fn bind_position(&self) -> Vec3 {
        self.bind_position
    }

    pub fn world_rotation(&self) -> Quat {
        self.world_rotation
    }

    pub fn world_position(&self) -> Vec3 {
        self.world_position
    }

    pub fn local_rotation(&self) -> Quat {
        self.local_rotation
    }

    /// World position of the bone's end point.
    pub fn world_end_position(&self) -> Vec3 {
        self.world_position + self.world_rotation * self.forward * self.length
    }

    /// Current swing/twist decomposition in the canonical bind-relative
    /// frame.
    pub fn swing_twist(&self) -> (Quat, Quat) {
        (self.swing, self.twist)
    }

    pub fn joint(&self) -> Option<&Joint> {
        self.joint.as_ref()
    }

    pub fn set_joint(&mut self, joint: Joint) {
        self.joint = Some(joint);
        self.dirty = true;
    }

    pub fn clear_joint(&mut self) {
        self.joint = None;
        self.dirty = true;
    }

    pub fn blend_weight(&self) -> f32 {
        self.blend_weight
    }

    /// Blend weight toward queued influences; 1 snaps immediately.
    pub fn set_blend_weight(&mut self, weight: f32) {
        self.blend_weight = weight.clamp(0.0, 1.0);
        self.dirty = true;
    }

    pub fn apply_limits(&self) -> bool {
        self.apply_limits
    }

    pub fn set_apply_limits(&mut self, enabled: bool) {
        self.apply_limits = enabled;
        self.dirty = true;
    }

    /// Suspends joint limits for the next update only.
    pub fn skip_limits_this_frame(&mut self) {
        self.limits_this_frame = false;
    }

    /// Whether the last update ended inside the joint's limits.
    pub fn in_limits(&self) -> bool {
        self.in_limits
    }

    pub fn is_detached(&self) -> bool {
        self.detached
    }

    // ------------------------------------------------------------------
    // Influence enqueue API
    // ------------------------------------------------------------------

    /// Queues a desired world-space rotation. Takes effect at the next
    /// update traversal, never synchronously.
    pub fn set_world_rotation(&mut self, rotation: Quat, weight: f32) {
        self.queue.push(BoneModifier {
            kind: ModifierKind::WorldRotation { rotation },
            weight,
        });
    }

    /// Queues a swing/twist pair already expressed in the canonical
    /// bind-relative frame.
    pub fn set_local_rotation(&mut self, swing: Quat, twist: Quat, weight: f32) {
        self.queue.push(BoneModifier {
            kind: ModifierKind::LocalRotation { swing, twist },
            weight,
        });
    }

    /// Queues a world position for the bone's end point to look toward.
    pub fn set_world_end_position(&mut self, position: Vec3, up_hint: Vec3, weight: f32) {
        self.queue.push(BoneModifier {
            kind: ModifierKind::WorldEndPosition { position, up_hint },
            weight,
        });
    }

    pub fn pending_modifiers(&self) -> usize {
        self.queue.len()
    }

    // ------------------------------------------------------------------
    // Frame update
    // ------------------------------------------------------------------

    /// Consumes queued modifiers and writes the bone's transform for this
    /// frame. Called by the skeleton traversal with the parent's already
    /// updated world transform; this is the only place the transform is
    /// ever written.
    pub(crate) fn update(&mut self, parent_rotation: Quat, parent_position: Vec3) {
        self.world_position = parent_position + parent_rotation * self.bind_position;

        if self.queue.is_empty() && !self.dirty {
            // Previous frame's local pose persists
            self.world_rotation = parent_rotation * self.local_rotation;
            self.limits_this_frame = true;
            return;
        }

        // World orientation of the canonical bind frame, dependent on the
        // parent's just-updated transform
        let world_bind = parent_rotation * self.bind_rotation * self.to_bone_forward;
        let world_bind_inv = world_bind.inverse();

        let mut first = true;
        for i in 0..self.queue.len() {
            let modifier = match self.queue.get(i) {
                Some(m) => m,
                None => break,
            };

            let (swing, twist) = self.decode(modifier.kind, world_bind_inv);
            if first {
                self.swing = swing;
                self.twist = twist;
                first = false;
            } else {
                // Later influences blend toward, not replace, the target
                self.swing = self.swing.slerp(swing, modifier.weight.clamp(0.0, 1.0));
                self.twist = self.twist.slerp(twist, modifier.weight.clamp(0.0, 1.0));
            }
        }

        self.in_limits = true;
        if self.apply_limits && self.limits_this_frame {
            if let Some(joint) = &self.joint {
                let clamped = joint.apply_limits(self.swing, self.twist);
                self.swing = clamped.swing;
                self.twist = clamped.twist;
                self.in_limits = clamped.in_limits;
            }
        }

        // Recombine and express the canonical-frame delta in the authored
        // local frame so child bind offsets stay valid
        let combined = self.to_bone_forward * (self.swing * self.twist) * self.to_bone_forward.inverse();
        let target = self.bind_rotation * combined;

        self.local_rotation = if self.blend_weight >= 1.0 {
            target
        } else {
            self.local_rotation.slerp(target, self.blend_weight)
        };

        self.world_rotation = parent_rotation * self.local_rotation;
        self.queue.clear();
        self.dirty = false;
        self.limits_this_frame = true;
    }

    /// Decodes a modifier into a swing/twist pair in the canonical
    /// bind-relative frame.
    fn decode(&self, kind: ModifierKind, world_bind_inv: Quat) -> (Quat, Quat) {
        match kind {
            ModifierKind::LocalRotation { swing, twist } => (swing, twist),
            ModifierKind::WorldRotation { rotation } => {
                let relative = world_bind_inv * rotation * self.to_bone_forward;
                swing_twist(relative, Vec3::Z)
            }
            ModifierKind::WorldEndPosition { position, up_hint } => {
                let direction = position - self.world_position;
                let look = look_rotation(direction, up_hint);
                if direction.length_squared() < 1e-8 {
                    // Target on the pivot, no usable look direction
                    return (self.swing, self.twist);
                }
                let relative = world_bind_inv * look;
                swing_twist(relative, Vec3::Z)
            }
        }
    }

    /// Resets runtime state to the bind pose. Used by bind/re-bind.
    pub(crate) fn reset_to_bind(&mut self) {
        self.swing = Quat::IDENTITY;
        self.twist = Quat::IDENTITY;
        self.queue.clear();
        self.local_rotation = self.bind_rotation;
        self.world_rotation = self.bind_rotation;
        self.world_position = self.bind_position;
        self.in_limits = true;
        self.limits_this_frame = true;
        self.dirty = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::joint::{FixedJoint, Joint};

    fn updated(bone: &mut Bone) {
        bone.update(Quat::IDENTITY, Vec3::ZERO);
    }

    /// Rotation distance in radians via component difference; acos on f32
    /// quaternion dots bottoms out around 3e-4 rad and cannot measure this.
    fn quat_error(a: Quat, b: Quat) -> f32 {
        2.0 * (a - b).length().min((a + b).length())
    }

    #[test]
    fn test_enqueue_is_deferred() {
        let mut bone = Bone::new("b");
        bone.reset_to_bind();
        let before = bone.world_rotation();

        bone.set_world_rotation(Quat::from_rotation_y(1.0), 1.0);
        assert_eq!(bone.world_rotation(), before);
        assert_eq!(bone.pending_modifiers(), 1);

        updated(&mut bone);
        assert_eq!(bone.pending_modifiers(), 0);
        assert!(bone.world_rotation().angle_between(before) > 0.5);
    }

    #[test]
    fn test_no_modifiers_is_noop() {
        let mut bone = Bone::new("b");
        bone.reset_to_bind();
        bone.set_world_rotation(Quat::from_rotation_x(0.4), 1.0);
        updated(&mut bone);
        let posed = bone.local_rotation();

        updated(&mut bone);
        assert_eq!(bone.local_rotation(), posed);
    }

    #[test]
    fn test_world_rotation_round_trip() {
        let mut bone = Bone::new("b");
        bone.reset_to_bind();

        let want = Quat::from_rotation_y(0.8);
        bone.set_world_rotation(want, 1.0);
        updated(&mut bone);

        assert!(bone.world_rotation().angle_between(want) < 1e-4);
    }

    #[test]
    fn test_local_rotation_swing_twist_kept_decomposed() {
        let mut bone = Bone::new("b");
        bone.reset_to_bind();

        let swing = Quat::from_rotation_x(0.3);
        let twist = Quat::from_rotation_z(0.5);
        bone.set_local_rotation(swing, twist, 1.0);
        updated(&mut bone);

        let (s, t) = bone.swing_twist();
        assert!(quat_error(s, swing) < 1e-4);
        assert!(quat_error(t, twist) < 1e-4);
    }

    #[test]
    fn test_first_modifier_sets_accumulator_directly() {
        let mut bone = Bone::new("b");
        bone.reset_to_bind();

        // A sub-unit weight on the sole modifier must not dilute it; the
        // weight only matters against modifiers queued before it
        let swing = Quat::from_rotation_x(1.0);
        bone.set_local_rotation(swing, Quat::IDENTITY, 0.25);
        updated(&mut bone);

        let (s, _) = bone.swing_twist();
        assert!(quat_error(s, swing) < 1e-5);
    }

    #[test]
    fn test_no_stale_state_across_frames() {
        let mut bone = Bone::new("b");
        bone.reset_to_bind();
        bone.set_local_rotation(Quat::from_rotation_x(1.2), Quat::IDENTITY, 1.0);
        updated(&mut bone);

        // The next frame's sole modifier replaces the old pose outright
        let next = Quat::from_rotation_y(0.4);
        bone.set_local_rotation(next, Quat::IDENTITY, 0.5);
        updated(&mut bone);

        let (s, _) = bone.swing_twist();
        assert!(quat_error(s, next) < 1e-5);
    }

    #[test]
    fn test_second_modifier_blends_by_weight() {
        let mut bone = Bone::new("b");
        bone.reset_to_bind();

        let a = Quat::from_rotation_x(0.0);
        let b = Quat::from_rotation_x(1.0);
        bone.set_local_rotation(a, Quat::IDENTITY, 1.0);
        bone.set_local_rotation(b, Quat::IDENTITY, 0.5);
        updated(&mut bone);

        let (swing, _) = bone.swing_twist();
        let half = Quat::from_rotation_x(0.5);
        assert!(swing.angle_between(half) < 1e-3);
    }

    #[test]
    fn test_fixed_joint_overrides_input() {
        let mut bone = Bone::new("b");
        bone.reset_to_bind();

        let held_swing = Quat::from_rotation_x(0.2);
        let held_twist = Quat::from_rotation_z(0.1);
        bone.set_joint(Joint::Fixed(FixedJoint::new(held_swing, held_twist)));

        bone.set_local_rotation(Quat::from_rotation_y(1.2), Quat::IDENTITY, 1.0);
        updated(&mut bone);

        let (s, t) = bone.swing_twist();
        assert!(s.angle_between(held_swing) < 1e-5);
        assert!(t.angle_between(held_twist) < 1e-5);
        assert!(bone.in_limits());
    }

    #[test]
    fn test_skip_limits_this_frame() {
        let mut bone = Bone::new("b");
        bone.reset_to_bind();
        bone.set_joint(Joint::Fixed(FixedJoint::new(Quat::IDENTITY, Quat::IDENTITY)));

        let swing = Quat::from_rotation_x(0.7);
        bone.skip_limits_this_frame();
        bone.set_local_rotation(swing, Quat::IDENTITY, 1.0);
        updated(&mut bone);

        let (s, _) = bone.swing_twist();
        assert!(s.angle_between(swing) < 1e-5, "limits should be skipped once");

        // Next frame the override expires and the fixed joint snaps back
        bone.set_local_rotation(swing, Quat::IDENTITY, 1.0);
        updated(&mut bone);
        let (s, _) = bone.swing_twist();
        assert!(s.angle_between(Quat::IDENTITY) < 1e-5);
    }

    #[test]
    fn test_blend_weight_partial() {
        let mut bone = Bone::new("b");
        bone.reset_to_bind();
        bone.set_blend_weight(0.5);

        let full = Quat::from_rotation_x(1.0);
        bone.set_local_rotation(full, Quat::IDENTITY, 1.0);
        updated(&mut bone);

        // Halfway between identity bind pose and the requested rotation
        let angle = bone.local_rotation().angle_between(Quat::IDENTITY);
        assert!((angle - 0.5).abs() < 1e-3);
    }
}
