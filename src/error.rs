use thiserror::Error;

/// Contract violations reachable only through incorrect use of the public
/// API. Numeric edge cases (unreachable targets, degenerate geometry) are
/// never errors; solvers clamp and continue instead.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RigError {
    #[error("ik chain needs at least {expected} bones, got {actual}")]
    ChainTooShort { expected: usize, actual: usize },

    #[error("bend axis count {axes} does not match bone count {bones}")]
    BendAxisCountMismatch { bones: usize, axes: usize },

    #[error("bone {0:?} is not part of this skeleton")]
    UnknownBone(crate::skeleton::BoneId),

    #[error("bone {0:?} appears more than once in the chain")]
    DuplicateBone(crate::skeleton::BoneId),

    #[error("chain bones must form a parent-child path, {0:?} breaks it")]
    BrokenChain(crate::skeleton::BoneId),
}
