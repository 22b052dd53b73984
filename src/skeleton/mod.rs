//! Bone and skeleton data model
//!
//! Bones carry bind geometry plus a per-frame modifier queue; the skeleton
//! owns the arena and drives the parent-before-child update traversal.

mod bone;
mod modifier;
#[allow(clippy::module_inception)]
mod skeleton;

pub use bone::{Bone, BoneId};
pub use modifier::{BoneModifier, ModifierKind, ModifierQueue, MODIFIER_CAPACITY};
pub use skeleton::{BoneRole, Skeleton};
