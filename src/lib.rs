//! # boneweave
//!
//! A runtime inverse kinematics rig: a skeletal data model with deferred
//! bone modifiers, swing/twist joint limits, and two IK solvers (analytic
//! two-bone and FABRIK).
//!
//! ## Example
//! ```rust
//! use boneweave::{Bone, CosineSolver, Skeleton, SolveRequest, SolveResult};
//! use glam::Vec3;
//!
//! // Build a two-segment arm along +Y
//! let mut skeleton = Skeleton::new();
//! let upper = skeleton.add_bone(Bone::new("upper"));
//! let lower = skeleton.add_bone(Bone::new("lower").with_parent(upper).with_bind_position(Vec3::Y));
//! let _hand = skeleton.add_bone(Bone::new("hand").with_parent(lower).with_bind_position(Vec3::Y));
//! skeleton.bind();
//!
//! // Solve toward a target and feed the result back through the rig
//! let mut request = SolveRequest::new();
//! request.push_bone(upper, Vec3::X);
//! request.push_bone(lower, Vec3::X);
//! request.target = Vec3::new(1.0, 1.0, 0.0);
//! request.use_plane_normal = true;
//!
//! let mut result = SolveResult::new();
//! CosineSolver::solve(&skeleton, &request, &mut result).unwrap();
//! skeleton.apply_result(&result, 1.0);
//! skeleton.update();
//! assert!(result.converged);
//! ```

pub mod error;
pub mod joint;
pub mod math;
pub mod skeleton;
pub mod solver;

pub use error::RigError;
pub use joint::{
    ConeSwingTwistJoint, FixedJoint, FreeSwingTwistJoint, HingeSwingTwistJoint, Joint,
    LimitResult, TwistLimit,
};
pub use skeleton::{Bone, BoneId, BoneRole, Skeleton};
pub use solver::{CosineSolver, FabrikSolver, SolveRequest, SolveResult};
