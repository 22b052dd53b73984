//! Rotation and sphere geometry utilities
//!
//! Pure functions on glam types. Everything here is stateless and tolerant of
//! degenerate input: zero or collinear vectors come back as zero vectors or
//! identity rotations, never NaN.

mod rotation;

pub use rotation::{
    look_rotation, plane_normal, project_to_sphere, project_to_tangent_plane, signed_angle,
    swing_twist,
};

// Re-export commonly used glam types
pub use glam::{Mat3, Quat, Vec3};
