use glam::{Quat, Vec3};

use crate::error::RigError;
use crate::skeleton::{BoneId, Skeleton};

/// Input to a solver: an ordered parent-to-child chain of bones, one bend
/// axis per bone, and a world-space target.
///
/// Requests are meant to be pooled by the caller; [`SolveRequest::clear`]
/// resets every field so a reused request can never leak stale state into
/// the next solve.
#[derive(Debug, Clone, Default)]
pub struct SolveRequest {
    /// Chain bones, root first. Each bone must be the direct parent of
    /// the next.
    pub bones: Vec<BoneId>,
    /// Bend reference axes, one per bone, in each bone's canonical frame.
    pub bend_axes: Vec<Vec3>,
    pub target: Vec3,
    /// Measure the base direction from the bind pose instead of the
    /// current pose.
    pub use_bind_rotation: bool,
    /// Derive the bend axis from the root/mid/target plane instead of the
    /// supplied axis.
    pub use_plane_normal: bool,
    /// Extra length appended to the terminal bone.
    pub extension: f32,
}

impl SolveRequest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets all fields, keeping allocations for reuse.
    pub fn clear(&mut self) {
        self.bones.clear();
        self.bend_axes.clear();
        self.target = Vec3::ZERO;
        self.use_bind_rotation = false;
        self.use_plane_normal = false;
        self.extension = 0.0;
    }

    pub fn push_bone(&mut self, bone: BoneId, bend_axis: Vec3) -> &mut Self {
        self.bones.push(bone);
        self.bend_axes.push(bend_axis);
        self
    }

    /// Contract checks for programmer errors; numeric degeneracy is the
    /// solvers' business, not validation's.
    pub(crate) fn validate(&self, skeleton: &Skeleton, min_bones: usize) -> Result<(), RigError> {
        if self.bones.len() < min_bones {
            return Err(RigError::ChainTooShort {
                expected: min_bones,
                actual: self.bones.len(),
            });
        }
        if self.bend_axes.len() != self.bones.len() {
            return Err(RigError::BendAxisCountMismatch {
                bones: self.bones.len(),
                axes: self.bend_axes.len(),
            });
        }

        for (i, &id) in self.bones.iter().enumerate() {
            let bone = skeleton.bone(id).ok_or(RigError::UnknownBone(id))?;

            if self.bones[..i].contains(&id) {
                return Err(RigError::DuplicateBone(id));
            }
            if i > 0 && bone.parent() != Some(self.bones[i - 1]) {
                return Err(RigError::BrokenChain(id));
            }
        }

        Ok(())
    }
}

/// Output of a solve: per-bone world rotations plus a debug position
/// trace. Pooled like the request; solvers reset it on entry.
#[derive(Debug, Clone, Default)]
pub struct SolveResult {
    rotations: Vec<(BoneId, Quat)>,
    trace: Vec<Vec3>,
    pub converged: bool,
    pub iterations: u32,
    pub final_distance: f32,
}

impl SolveResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Resets all fields, keeping allocations for reuse.
    pub fn clear(&mut self) {
        self.rotations.clear();
        self.trace.clear();
        self.converged = false;
        self.iterations = 0;
        self.final_distance = 0.0;
    }

    /// Resulting world rotation per bone; always a subset of the request
    /// bones, each at most once.
    pub fn rotations(&self) -> &[(BoneId, Quat)] {
        &self.rotations
    }

    /// Solved joint positions, root to effector end, for debugging.
    pub fn trace(&self) -> &[Vec3] {
        &self.trace
    }

    pub fn rotation_for(&self, bone: BoneId) -> Option<Quat> {
        self.rotations
            .iter()
            .find(|&&(id, _)| id == bone)
            .map(|&(_, q)| q)
    }

    pub(crate) fn push_rotation(&mut self, bone: BoneId, rotation: Quat) {
        self.rotations.push((bone, rotation));
    }

    pub(crate) fn push_trace(&mut self, position: Vec3) {
        self.trace.push(position);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::skeleton::Bone;

    fn chain_skeleton() -> (Skeleton, Vec<BoneId>) {
        let mut skel = Skeleton::new();
        let a = skel.add_bone(Bone::new("a"));
        let b = skel.add_bone(Bone::new("b").with_parent(a).with_bind_position(Vec3::Y));
        let c = skel.add_bone(Bone::new("c").with_parent(b).with_bind_position(Vec3::Y));
        skel.bind();
        (skel, vec![a, b, c])
    }

    #[test]
    fn test_validate_ok() {
        let (skel, ids) = chain_skeleton();
        let mut request = SolveRequest::new();
        for &id in &ids {
            request.push_bone(id, Vec3::X);
        }
        assert!(request.validate(&skel, 2).is_ok());
    }

    #[test]
    fn test_validate_too_short() {
        let (skel, ids) = chain_skeleton();
        let mut request = SolveRequest::new();
        request.push_bone(ids[0], Vec3::X);

        assert_eq!(
            request.validate(&skel, 2),
            Err(RigError::ChainTooShort {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_validate_axis_mismatch() {
        let (skel, ids) = chain_skeleton();
        let mut request = SolveRequest::new();
        request.bones = ids.clone();
        request.bend_axes = vec![Vec3::X];

        assert_eq!(
            request.validate(&skel, 2),
            Err(RigError::BendAxisCountMismatch { bones: 3, axes: 1 })
        );
    }

    #[test]
    fn test_validate_duplicate() {
        let (skel, ids) = chain_skeleton();
        let mut request = SolveRequest::new();
        request.push_bone(ids[0], Vec3::X);
        request.push_bone(ids[0], Vec3::X);

        assert_eq!(
            request.validate(&skel, 2),
            Err(RigError::DuplicateBone(ids[0]))
        );
    }

    #[test]
    fn test_validate_broken_chain() {
        let (skel, ids) = chain_skeleton();
        let mut request = SolveRequest::new();
        request.push_bone(ids[0], Vec3::X);
        request.push_bone(ids[2], Vec3::X);

        assert_eq!(
            request.validate(&skel, 2),
            Err(RigError::BrokenChain(ids[2]))
        );
    }

    #[test]
    fn test_clear_resets_everything() {
        let (_, ids) = chain_skeleton();
        let mut request = SolveRequest::new();
        request.push_bone(ids[0], Vec3::X);
        request.target = Vec3::ONE;
        request.use_plane_normal = true;
        request.extension = 2.0;

        request.clear();
        assert!(request.bones.is_empty());
        assert!(request.bend_axes.is_empty());
        assert_eq!(request.target, Vec3::ZERO);
        assert!(!request.use_plane_normal);
        assert_eq!(request.extension, 0.0);

        let mut result = SolveResult::new();
        result.push_rotation(ids[0], Quat::from_rotation_x(1.0));
        result.push_trace(Vec3::ONE);
        result.converged = true;
        result.iterations = 7;
        result.final_distance = 0.5;

        result.clear();
        assert!(result.rotations().is_empty());
        assert!(result.trace().is_empty());
        assert!(!result.converged);
        assert_eq!(result.iterations, 0);
        assert_eq!(result.final_distance, 0.0);
    }
}
