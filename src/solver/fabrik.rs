use glam::{Quat, Vec3};

use super::{bend_frame, SolveRequest, SolveResult};
use crate::error::RigError;
use crate::math::swing_twist;
use crate::skeleton::Skeleton;

pub const MAX_ITERATIONS: u32 = 20;
pub const TOLERANCE: f32 = 0.01;

/// Iterative solver for chains of any length (forward and backward
/// reaching passes over the joint positions).
///
/// Each iteration drags the chain onto the target end-first, pins the
/// root back down, then walks parent to child converting every segment
/// into a swing/twist, clamping it through the bone's joint and rebuilding
/// the positions below. Segment lengths are never stretched, so an
/// unreachable target settles into a straight fully extended chain.
pub struct FabrikSolver;

impl FabrikSolver {
    pub fn solve(
        skeleton: &Skeleton,
        request: &SolveRequest,
        result: &mut SolveResult,
    ) -> Result<(), RigError> {
        request.validate(skeleton, 2)?;
        result.clear();

        let count = request.bones.len();
        let mut positions = Vec::with_capacity(count + 1);
        for &id in &request.bones {
            let bone = skeleton.bone(id).ok_or(RigError::UnknownBone(id))?;
            positions.push(bone.world_position());
        }
        let last_id = request.bones[count - 1];
        let last = skeleton.bone(last_id).ok_or(RigError::UnknownBone(last_id))?;
        positions.push(
            last.world_position()
                + last.world_rotation() * last.forward() * (last.length() + request.extension),
        );

        let lengths: Vec<f32> = positions.windows(2).map(|w| (w[1] - w[0]).length()).collect();
        let origin = positions[0];

        // The chain root may hang below unsolved bones; their transform is
        // the fixed outer context for the whole solve
        let outer_rotation = skeleton
            .bone(request.bones[0])
            .and_then(|b| b.parent())
            .and_then(|p| skeleton.bone(p))
            .map(|p| p.world_rotation())
            .unwrap_or(Quat::IDENTITY);

        let mut rotations = vec![Quat::IDENTITY; count];
        let mut converged = false;
        let mut iterations = 0;
        let mut distance = f32::MAX;

        while iterations < MAX_ITERATIONS {
            iterations += 1;

            // Backward: reach the target, end first
            positions[count] = request.target;
            for i in (0..count).rev() {
                let mut dir = (positions[i] - positions[i + 1]).normalize_or_zero();
                if dir.length_squared() == 0.0 {
                    dir = Vec3::Y;
                }
                positions[i] = positions[i + 1] + dir * lengths[i];
            }

            // Forward: pin the root back to its origin
            positions[0] = origin;
            for i in 0..count {
                let mut dir = (positions[i + 1] - positions[i]).normalize_or_zero();
                if dir.length_squared() == 0.0 {
                    dir = Vec3::Y;
                }
                positions[i + 1] = positions[i] + dir * lengths[i];
            }

            // Reconcile against joint limits, parent to child. A clamp
            // moves every position below the clamped bone, which the next
            // iteration's passes then pull back toward the target.
            let mut parent_rotation = outer_rotation;
            for i in 0..count {
                let id = request.bones[i];
                let bone = skeleton.bone(id).ok_or(RigError::UnknownBone(id))?;

                let desired = positions[i + 1] - positions[i];
                let world_bind =
                    parent_rotation * bone.bind_rotation() * bone.to_bone_forward();

                // Hinges pin the bend reference; otherwise the request axis
                let right_local = bone
                    .joint()
                    .and_then(|j| j.bend_axis())
                    .unwrap_or(request.bend_axes[i]);
                let mut right_world = (world_bind * right_local).normalize_or_zero();
                if right_world.length_squared() == 0.0 {
                    right_world = world_bind * Vec3::X;
                }

                let canonical = bend_frame(desired, right_world);
                let (mut swing, mut twist) =
                    swing_twist(world_bind.inverse() * canonical, Vec3::Z);

                if bone.apply_limits() {
                    if let Some(joint) = bone.joint() {
                        let clamped = joint.apply_limits(swing, twist);
                        swing = clamped.swing;
                        twist = clamped.twist;
                    }
                }

                let clamped_canonical = world_bind * swing * twist;
                rotations[i] = clamped_canonical * bone.to_bone_forward().inverse();
                positions[i + 1] = positions[i] + clamped_canonical * Vec3::Z * lengths[i];
                parent_rotation = rotations[i];
            }

            distance = (positions[count] - request.target).length();
            if distance <= TOLERANCE {
                converged = true;
                break;
            }
        }

        if !converged {
            log::debug!(
                "fabrik stopped after {iterations} iterations, {distance} from target"
            );
        }

        for (i, &id) in request.bones.iter().enumerate() {
            result.push_rotation(id, rotations[i]);
        }
        for &p in &positions {
            result.push_trace(p);
        }
        result.converged = converged;
        result.iterations = iterations;
        result.final_distance = distance;

        Ok(())
    }
}
