use glam::{Quat, Vec3};

use super::{bend_frame, SolveRequest, SolveResult};
use crate::error::RigError;
use crate::math::plane_normal;
use crate::skeleton::Skeleton;

/// Analytic two-bone solver using the law of cosines.
///
/// Solves the first two bones of the request exactly: the interior angle
/// at the base comes straight from the triangle (upper, lower, target
/// distance), with the cosine clamped so an out-of-range target degrades
/// to full extension instead of NaN.
pub struct CosineSolver;

impl CosineSolver {
    pub fn solve(
        skeleton: &Skeleton,
        request: &SolveRequest,
        result: &mut SolveResult,
    ) -> Result<(), RigError> {
        request.validate(skeleton, 2)?;
        result.clear();

        let base_id = request.bones[0];
        let pivot_id = request.bones[1];
        let base_bone = skeleton.bone(base_id).ok_or(RigError::UnknownBone(base_id))?;
        let pivot_bone = skeleton
            .bone(pivot_id)
            .ok_or(RigError::UnknownBone(pivot_id))?;

        let base = base_bone.world_position();
        let pivot = pivot_bone.world_position();
        let upper_len = (pivot - base).length();
        let lower_len = pivot_bone.length() + request.extension;
        let total = upper_len + lower_len;

        let to_target = request.target - base;
        let raw_distance = to_target.length();
        let distance = raw_distance.clamp(1e-6, total);

        let aim = if raw_distance > 1e-6 {
            to_target / raw_distance
        } else {
            base_bone.world_rotation() * base_bone.forward()
        };

        let frame = if request.use_bind_rotation {
            skeleton.world_bind_rotation(base_id)
        } else {
            base_bone.world_rotation() * base_bone.to_bone_forward()
        };

        let mut bend_axis = Vec3::ZERO;
        if request.use_plane_normal {
            bend_axis = plane_normal(base, pivot, request.target);
        }
        if bend_axis.length_squared() == 0.0 {
            bend_axis = frame * request.bend_axes[0];
        }
        let mut bend_axis = bend_axis.normalize_or_zero();
        if bend_axis.length_squared() == 0.0 {
            bend_axis = aim.any_orthonormal_vector();
        }

        // Interior angle at the base; the clamp absorbs unreachable and
        // degenerate triangles
        let cos_base = if upper_len * distance > 1e-8 {
            ((upper_len * upper_len + distance * distance - lower_len * lower_len)
                / (2.0 * upper_len * distance))
                .clamp(-1.0, 1.0)
        } else {
            1.0
        };
        let base_angle = cos_base.acos();

        let upper_dir = Quat::from_axis_angle(bend_axis, base_angle) * aim;
        let elbow = base + upper_dir * upper_len;

        let to_lower = request.target - elbow;
        let lower_dir = if to_lower.length_squared() > 1e-8 {
            to_lower.normalize()
        } else {
            upper_dir
        };

        let upper_frame = bend_frame(upper_dir, bend_axis);
        let lower_frame = bend_frame(lower_dir, bend_axis);

        result.push_rotation(base_id, upper_frame * base_bone.to_bone_forward().inverse());
        result.push_rotation(pivot_id, lower_frame * pivot_bone.to_bone_forward().inverse());

        let end = elbow + lower_dir * lower_len;
        result.push_trace(base);
        result.push_trace(elbow);
        result.push_trace(end);
        result.converged = raw_distance <= total + 1e-4;
        result.iterations = 1;
        result.final_distance = (request.target - end).length();

        Ok(())
    }
}
