//! Joint limit constraints
//!
//! A joint clamps a bone's swing/twist decomposition; it never drives the
//! bone transform itself. Variants form a closed tagged union dispatched
//! through a single [`Joint::apply_limits`] so the limit contract stays
//! exhaustively checkable.
//!
//! All geometry lives in the bone's canonical frame: +Z is bone forward,
//! swing tilts +Z, twist rolls about it. Angle comparisons are non-strict;
//! a rotation sitting exactly on a limit boundary is in-limits.

mod reach_cone;

pub use reach_cone::{build_cones, smooth_boundary, ReachCone};

use glam::{Quat, Vec3};

use crate::math::swing_twist;
use reach_cone::VISIBLE_POINT;

/// Output of a limit evaluation.
#[derive(Debug, Clone, Copy)]
pub struct LimitResult {
    pub swing: Quat,
    pub twist: Quat,
    /// False when any clamping changed the input.
    pub in_limits: bool,
}

impl LimitResult {
    fn unclamped(swing: Quat, twist: Quat) -> Self {
        Self {
            swing,
            twist,
            in_limits: true,
        }
    }
}

/// Shared twist handling for the swing-and-twist variants.
#[derive(Debug, Clone, Copy)]
pub struct TwistLimit {
    /// When false, all twist is stripped back to identity.
    pub allow_twist: bool,
    pub limit_enabled: bool,
    /// Degrees, signed about bone forward.
    pub min_deg: f32,
    pub max_deg: f32,
}

impl Default for TwistLimit {
    fn default() -> Self {
        Self {
            allow_twist: true,
            limit_enabled: false,
            min_deg: -180.0,
            max_deg: 180.0,
        }
    }
}

impl TwistLimit {
    pub fn free() -> Self {
        Self::default()
    }

    pub fn range(min_deg: f32, max_deg: f32) -> Self {
        Self {
            allow_twist: true,
            limit_enabled: true,
            min_deg,
            max_deg,
        }
    }

    pub fn locked() -> Self {
        Self {
            allow_twist: false,
            limit_enabled: false,
            min_deg: 0.0,
            max_deg: 0.0,
        }
    }

    /// Clamps a twist rotation about bone forward. Returns the clamped
    /// twist and whether the input was already within limits.
    fn clamp(&self, twist: Quat) -> (Quat, bool) {
        let angle = twist_angle_deg(twist);

        if !self.allow_twist {
            return (Quat::IDENTITY, angle.abs() < ANGLE_TOLERANCE_DEG);
        }

        if !self.limit_enabled {
            return (twist, true);
        }

        let clamped = angle.clamp(self.min_deg, self.max_deg);
        if (clamped - angle).abs() < ANGLE_TOLERANCE_DEG {
            (twist, true)
        } else {
            (Quat::from_rotation_z(clamped.to_radians()), false)
        }
    }
}

const ANGLE_TOLERANCE_DEG: f32 = 1e-3;

/// Signed angle in degrees of a twist rotation about canonical forward,
/// range (-180, 180].
fn twist_angle_deg(twist: Quat) -> f32 {
    let mut angle = 2.0 * twist.z.atan2(twist.w).to_degrees();
    if angle > 180.0 {
        angle -= 360.0;
    } else if angle <= -180.0 {
        angle += 360.0;
    }
    angle
}

/// Minimal swing mapping canonical forward onto `direction`, with any roll
/// component discarded.
fn pure_swing_to(direction: Vec3) -> Quat {
    let direction = direction.normalize_or_zero();
    if direction.length_squared() == 0.0 {
        return Quat::IDENTITY;
    }
    Quat::from_rotation_arc(VISIBLE_POINT, direction)
}

// ----------------------------------------------------------------------
// Variants
// ----------------------------------------------------------------------

/// Welds the bone to one configured pose.
#[derive(Debug, Clone, Copy)]
pub struct FixedJoint {
    pub swing: Quat,
    pub twist: Quat,
}

impl FixedJoint {
    pub fn new(swing: Quat, twist: Quat) -> Self {
        Self { swing, twist }
    }

    fn apply(&self) -> LimitResult {
        // A fixed joint is never "out" of its single allowed pose
        LimitResult::unclamped(self.swing, self.twist)
    }
}

/// Unlimited swing with optional twist handling.
#[derive(Debug, Clone, Copy, Default)]
pub struct FreeSwingTwistJoint {
    /// Strip the incidental roll a large swing introduces.
    pub prevent_swing_twisting: bool,
    pub twist: TwistLimit,
}

impl FreeSwingTwistJoint {
    pub fn new(twist: TwistLimit) -> Self {
        Self {
            prevent_swing_twisting: false,
            twist,
        }
    }

    fn apply(&self, swing: Quat, twist: Quat) -> LimitResult {
        let swing = if self.prevent_swing_twisting {
            pure_swing_to(swing * VISIBLE_POINT)
        } else {
            swing
        };

        let (twist, twist_ok) = self.twist.clamp(twist);
        LimitResult {
            swing,
            twist,
            in_limits: twist_ok,
        }
    }
}

/// Swing constrained to a single configured axis, like an elbow or knee.
#[derive(Debug, Clone, Copy)]
pub struct HingeSwingTwistJoint {
    /// Hinge axis in the canonical frame, perpendicular to bone forward.
    pub swing_axis: Vec3,
    pub swing_limit_enabled: bool,
    /// Degrees, signed about the hinge axis.
    pub min_swing_deg: f32,
    pub max_swing_deg: f32,
    pub twist: TwistLimit,
}

impl HingeSwingTwistJoint {
    pub fn new(swing_axis: Vec3) -> Self {
        Self {
            swing_axis: swing_axis.normalize_or_zero(),
            swing_limit_enabled: false,
            min_swing_deg: -180.0,
            max_swing_deg: 180.0,
            twist: TwistLimit::free(),
        }
    }

    pub fn with_swing_range(mut self, min_deg: f32, max_deg: f32) -> Self {
        self.swing_limit_enabled = true;
        self.min_swing_deg = min_deg;
        self.max_swing_deg = max_deg;
        self
    }

    pub fn with_twist(mut self, twist: TwistLimit) -> Self {
        self.twist = twist;
        self
    }

    fn apply(&self, swing: Quat, twist: Quat) -> LimitResult {
        // Signed swing angle about the hinge axis; everything off-axis is
        // discarded when the swing is rebuilt below
        let (off_axis, about_axis) = swing_twist(swing, self.swing_axis);
        let mut angle = 2.0
            * Vec3::new(about_axis.x, about_axis.y, about_axis.z)
                .dot(self.swing_axis)
                .atan2(about_axis.w)
                .to_degrees();
        if angle > 180.0 {
            angle -= 360.0;
        } else if angle <= -180.0 {
            angle += 360.0;
        }

        let had_off_axis = off_axis.angle_between(Quat::IDENTITY) > ANGLE_TOLERANCE_DEG.to_radians();

        let (clamped_angle, swing_ok) = if self.swing_limit_enabled {
            let clamped = angle.clamp(self.min_swing_deg, self.max_swing_deg);
            (clamped, (clamped - angle).abs() < ANGLE_TOLERANCE_DEG)
        } else {
            (angle, true)
        };

        let swing = Quat::from_axis_angle(self.swing_axis, clamped_angle.to_radians());

        let (twist, twist_ok) = self.twist.clamp(twist);
        LimitResult {
            swing,
            twist,
            in_limits: swing_ok && twist_ok && !had_off_axis,
        }
    }
}

/// Swing constrained to a smoothed polygon of directions on the unit
/// sphere (the reach cone).
#[derive(Debug, Clone)]
pub struct ConeSwingTwistJoint {
    boundary_points: Vec<Vec3>,
    smoothing_iterations: u32,
    smoothed: Vec<Vec3>,
    cones: Vec<ReachCone>,
    pub prevent_swing_twisting: bool,
    pub twist: TwistLimit,
}

/// Binary-search step cap for boundary correction.
const CONE_SEARCH_STEPS: u32 = 10;
/// Parameter-space tolerance of the boundary search.
const CONE_SEARCH_TOLERANCE: f32 = 0.0005;

impl ConeSwingTwistJoint {
    pub fn new(boundary_points: Vec<Vec3>, smoothing_iterations: u32) -> Self {
        let mut joint = Self {
            boundary_points,
            smoothing_iterations,
            smoothed: Vec::new(),
            cones: Vec::new(),
            prevent_swing_twisting: false,
            twist: TwistLimit::free(),
        };
        joint.rebuild();
        joint
    }

    pub fn with_twist(mut self, twist: TwistLimit) -> Self {
        self.twist = twist;
        self
    }

    pub fn boundary_points(&self) -> &[Vec3] {
        &self.boundary_points
    }

    pub fn set_boundary_points(&mut self, points: Vec<Vec3>) {
        self.boundary_points = points;
        self.rebuild();
    }

    pub fn smoothing_iterations(&self) -> u32 {
        self.smoothing_iterations
    }

    pub fn set_smoothing_iterations(&mut self, iterations: u32) {
        self.smoothing_iterations = iterations;
        self.rebuild();
    }

    /// Derived cone geometry for the current boundary.
    pub fn reach_cones(&self) -> &[ReachCone] {
        &self.cones
    }

    fn rebuild(&mut self) {
        self.smoothed = smooth_boundary(&self.boundary_points, self.smoothing_iterations);
        self.cones = build_cones(&self.smoothed);
    }

    fn direction_allowed(&self, direction: Vec3) -> bool {
        match self.cones.iter().find(|c| c.contains_slice(direction)) {
            Some(cone) => cone.within_boundary(direction),
            // No slice claims the direction: degenerate authoring, pass
            // through best-effort
            None => true,
        }
    }

    fn apply(&self, swing: Quat, twist: Quat) -> LimitResult {
        let swing = if self.prevent_swing_twisting {
            pure_swing_to(swing * VISIBLE_POINT)
        } else {
            swing
        };

        let (twist, twist_ok) = self.twist.clamp(twist);

        if self.cones.is_empty() {
            return LimitResult {
                swing,
                twist,
                in_limits: twist_ok,
            };
        }

        let direction = (swing * VISIBLE_POINT).normalize_or_zero();
        if direction.length_squared() == 0.0 || self.direction_allowed(direction) {
            return LimitResult {
                swing,
                twist,
                in_limits: twist_ok,
            };
        }

        // Outside: search the arc from bone forward to the candidate for
        // the last in-bounds direction
        let full = pure_swing_to(direction);
        let mut lo = 0.0_f32;
        let mut hi = 1.0_f32;
        for _ in 0..CONE_SEARCH_STEPS {
            if hi - lo < CONE_SEARCH_TOLERANCE {
                break;
            }
            let mid = (lo + hi) * 0.5;
            let dir = Quat::IDENTITY.slerp(full, mid) * VISIBLE_POINT;
            if self.direction_allowed(dir) {
                lo = mid;
            } else {
                hi = mid;
            }
        }

        let corrected = Quat::IDENTITY.slerp(full, lo);
        LimitResult {
            swing: corrected,
            twist,
            in_limits: false,
        }
    }
}

// ----------------------------------------------------------------------
// Tagged union
// ----------------------------------------------------------------------

/// A bone's limit constraint. Owned 1:1 by its bone.
#[derive(Debug, Clone)]
pub enum Joint {
    Fixed(FixedJoint),
    FreeSwingTwist(FreeSwingTwistJoint),
    HingeSwingTwist(HingeSwingTwistJoint),
    ConeSwingTwist(ConeSwingTwistJoint),
}

impl Joint {
    /// Clamps a swing/twist pair. Pure: never touches bone state.
    pub fn apply_limits(&self, swing: Quat, twist: Quat) -> LimitResult {
        match self {
            Joint::Fixed(j) => j.apply(),
            Joint::FreeSwingTwist(j) => j.apply(swing, twist),
            Joint::HingeSwingTwist(j) => j.apply(swing, twist),
            Joint::ConeSwingTwist(j) => j.apply(swing, twist),
        }
    }

    /// Preferred bend reference axis for solvers, when the variant
    /// implies one.
    pub fn bend_axis(&self) -> Option<Vec3> {
        match self {
            Joint::HingeSwingTwist(j) => Some(j.swing_axis),
            _ => None,
        }
    }
}
