use glam::{Mat3, Quat, Vec3};

const EPSILON: f32 = 1e-6;

/// Splits `rotation` into a swing component perpendicular to `twist_axis`
/// and a twist component about it, such that `swing * twist == rotation`.
///
/// The twist is extracted by projecting the quaternion's vector part onto
/// the axis and renormalizing. When the rotation has no component about the
/// axis (or the axis is zero), the twist degenerates to identity and the
/// whole rotation is returned as swing.
pub fn swing_twist(rotation: Quat, twist_axis: Vec3) -> (Quat, Quat) {
    let axis = twist_axis.normalize_or_zero();
    if axis.length_squared() < EPSILON {
        return (rotation, Quat::IDENTITY);
    }

    let r = Vec3::new(rotation.x, rotation.y, rotation.z);
    let projected = axis * r.dot(axis);

    let twist = Quat::from_xyzw(projected.x, projected.y, projected.z, rotation.w);
    if twist.length_squared() < EPSILON {
        // 180-degree swing exactly perpendicular to the axis
        return (rotation, Quat::IDENTITY);
    }

    let twist = twist.normalize();
    let swing = rotation * twist.inverse();

    (swing, twist)
}

/// Angle in degrees from `from` to `to`, signed by the right-hand rule
/// about `axis`. Range (-180, 180].
pub fn signed_angle(from: Vec3, to: Vec3, axis: Vec3) -> f32 {
    let from = from.normalize_or_zero();
    let to = to.normalize_or_zero();

    if from.length_squared() < EPSILON || to.length_squared() < EPSILON {
        return 0.0;
    }

    let sin = from.cross(to).dot(axis.normalize_or_zero());
    let cos = from.dot(to);

    sin.atan2(cos).to_degrees()
}

/// Unit normal of the triangle (p0, p1, p2).
///
/// Collinear or coincident points return the zero vector; callers must
/// check before using the result as an axis.
pub fn plane_normal(p0: Vec3, p1: Vec3, p2: Vec3) -> Vec3 {
    let cross = (p1 - p0).cross(p2 - p0);
    if cross.length_squared() < EPSILON {
        return Vec3::ZERO;
    }
    cross.normalize()
}

/// Stereographic projection of a unit-sphere point onto the plane tangent
/// to the sphere at `center`, projected from the antipode of `center`.
///
/// Points approaching the antipode blow up; the denominator is clamped so
/// the result stays finite.
pub fn project_to_tangent_plane(point: Vec3, center: Vec3) -> Vec3 {
    let denom = (1.0 + center.dot(point)).max(EPSILON);
    -center + (point + center) * (2.0 / denom)
}

/// Inverse of [`project_to_tangent_plane`]: maps a point on the tangent
/// plane at `center` back onto the unit sphere.
pub fn project_to_sphere(point: Vec3, center: Vec3) -> Vec3 {
    let offset = point + center;
    let denom = offset.length_squared().max(EPSILON);
    -center + offset * (4.0 / denom)
}

/// Orientation whose +Z axis points along `forward`, using `up` as the
/// vertical reference.
///
/// A zero forward direction yields identity. When `up` is collinear with
/// `forward` a substitute vertical is picked so the basis stays orthonormal.
pub fn look_rotation(forward: Vec3, up: Vec3) -> Quat {
    let forward = forward.normalize_or_zero();
    if forward.length_squared() < EPSILON {
        return Quat::IDENTITY;
    }

    let mut right = up.cross(forward);
    if right.length_squared() < EPSILON {
        right = Vec3::Y.cross(forward);
        if right.length_squared() < EPSILON {
            right = Vec3::X.cross(forward);
        }
    }
    let right = right.normalize();
    let up = forward.cross(right);

    Quat::from_mat3(&Mat3::from_cols(right, up, forward))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    fn random_unit_quat(rng: &mut impl Rng) -> Quat {
        let axis = random_unit_vec(rng);
        let angle = rng.random_range(-std::f32::consts::PI..std::f32::consts::PI);
        Quat::from_axis_angle(axis, angle)
    }

    fn random_unit_vec(rng: &mut impl Rng) -> Vec3 {
        loop {
            let v = Vec3::new(
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
                rng.random_range(-1.0..1.0),
            );
            if v.length_squared() > 0.01 {
                return v.normalize();
            }
        }
    }

    /// Rotation distance in radians via component difference (sign-folded).
    /// acos on an f32 quaternion dot is ill-conditioned near 1 and bottoms
    /// out around 3e-4 rad, far above the error being measured here.
    fn quat_error(a: Quat, b: Quat) -> f32 {
        2.0 * (a - b).length().min((a + b).length())
    }

    #[test]
    fn test_swing_twist_round_trip() {
        let mut rng = rand::rng();

        for _ in 0..10_000 {
            let rotation = random_unit_quat(&mut rng);
            let axis = random_unit_vec(&mut rng);

            let (swing, twist) = swing_twist(rotation, axis);
            let recombined = swing * twist;

            // swing * twist must reconstruct the input (up to sign)
            let error = quat_error(recombined, rotation);
            assert!(error < 1e-4, "round-trip error {} too large", error);

            // twist vector part must lie on the axis
            let tv = Vec3::new(twist.x, twist.y, twist.z);
            let perpendicular = tv - axis * tv.dot(axis);
            assert!(perpendicular.length() < 1e-5);
        }
    }

    #[test]
    fn test_swing_twist_pure_twist() {
        let axis = Vec3::Z;
        let rotation = Quat::from_rotation_z(0.7);
        let (swing, twist) = swing_twist(rotation, axis);

        assert!(swing.angle_between(Quat::IDENTITY) < 1e-5);
        assert!(twist.angle_between(rotation) < 1e-5);
    }

    #[test]
    fn test_swing_twist_pure_swing() {
        let axis = Vec3::Z;
        let rotation = Quat::from_rotation_x(0.7);
        let (swing, twist) = swing_twist(rotation, axis);

        assert!(twist.angle_between(Quat::IDENTITY) < 1e-5);
        assert!(swing.angle_between(rotation) < 1e-5);
    }

    #[test]
    fn test_swing_twist_zero_axis() {
        let rotation = Quat::from_rotation_y(0.5);
        let (swing, twist) = swing_twist(rotation, Vec3::ZERO);

        assert_eq!(twist, Quat::IDENTITY);
        assert!(swing.angle_between(rotation) < 1e-6);
    }

    #[test]
    fn test_signed_angle_quadrants() {
        assert!((signed_angle(Vec3::X, Vec3::Y, Vec3::Z) - 90.0).abs() < 1e-4);
        assert!((signed_angle(Vec3::Y, Vec3::X, Vec3::Z) + 90.0).abs() < 1e-4);
        assert!((signed_angle(Vec3::X, -Vec3::X, Vec3::Z) - 180.0).abs() < 1e-3);
        assert!(signed_angle(Vec3::X, Vec3::X, Vec3::Z).abs() < 1e-4);
    }

    #[test]
    fn test_plane_normal() {
        let n = plane_normal(Vec3::ZERO, Vec3::X, Vec3::Y);
        assert!((n - Vec3::Z).length() < 1e-5);
    }

    #[test]
    fn test_plane_normal_collinear() {
        let n = plane_normal(Vec3::ZERO, Vec3::X, Vec3::X * 2.0);
        assert_eq!(n, Vec3::ZERO);
    }

    #[test]
    fn test_stereographic_round_trip() {
        let center = Vec3::Z;
        let points = [
            Vec3::new(0.3, 0.2, 0.9).normalize(),
            Vec3::new(-0.5, 0.5, 0.7).normalize(),
            Vec3::Z,
            Vec3::X,
        ];

        for p in points {
            let plane = project_to_tangent_plane(p, center);
            let back = project_to_sphere(plane, center);
            assert!((back - p).length() < 1e-5, "failed for {:?}", p);
            // projected point lies on the tangent plane
            assert!((plane.dot(center) - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_look_rotation_forward() {
        let dirs = [Vec3::X, Vec3::Y, Vec3::NEG_Z, Vec3::new(1.0, 2.0, 3.0)];
        for dir in dirs {
            let rot = look_rotation(dir, Vec3::Y);
            let fwd = rot * Vec3::Z;
            assert!((fwd - dir.normalize()).length() < 1e-5);
        }
    }

    #[test]
    fn test_look_rotation_degenerate() {
        assert_eq!(look_rotation(Vec3::ZERO, Vec3::Y), Quat::IDENTITY);

        // up collinear with forward still yields a valid basis
        let rot = look_rotation(Vec3::Y, Vec3::Y);
        assert!(((rot * Vec3::Z) - Vec3::Y).length() < 1e-5);
        assert!((rot.length() - 1.0).abs() < 1e-5);
    }
}
