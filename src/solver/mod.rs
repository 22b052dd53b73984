//! IK solvers
//!
//! Solvers are stateless: they read the skeleton, fill a pooled
//! [`SolveResult`] with world rotations, and never mutate bones. Feeding
//! the result back through [`crate::skeleton::Skeleton::apply_result`] is
//! the caller's call, which keeps solve and apply separable for blending.

mod cosine;
mod fabrik;
mod request;

pub use cosine::CosineSolver;
pub use fabrik::{FabrikSolver, MAX_ITERATIONS, TOLERANCE};
pub use request::{SolveRequest, SolveResult};

use glam::{Mat3, Quat, Vec3};

use crate::math::look_rotation;

/// Canonical frame with +Z along `forward` and +X as close to `right_ref`
/// as orthogonality allows. Solvers use the bend axis as the right
/// reference so the solved twist stays stable across frames.
pub(crate) fn bend_frame(forward: Vec3, right_ref: Vec3) -> Quat {
    let forward = forward.normalize_or_zero();
    if forward.length_squared() == 0.0 {
        return Quat::IDENTITY;
    }

    let up = forward.cross(right_ref).normalize_or_zero();
    if up.length_squared() == 0.0 {
        // Reference parallel to forward, fall back to a world-up basis
        return look_rotation(forward, Vec3::Y);
    }

    let right = up.cross(forward);
    Quat::from_mat3(&Mat3::from_cols(right, up, forward))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bend_frame_maps_forward_to_z() {
        let forward = Vec3::new(1.0, 2.0, -0.5).normalize();
        let frame = bend_frame(forward, Vec3::X);

        assert!((frame * Vec3::Z - forward).length() < 1e-5);
        // Right axis is the projection of the reference off the forward
        let right = frame * Vec3::X;
        assert!(right.dot(forward).abs() < 1e-5);
        assert!(right.dot(Vec3::X) > 0.0);
    }

    #[test]
    fn test_bend_frame_parallel_reference_falls_back() {
        let frame = bend_frame(Vec3::X, Vec3::X);
        assert!((frame * Vec3::Z - Vec3::X).length() < 1e-5);
        assert!(frame.is_normalized());
    }
}
