use glam::Vec3;

use crate::math::{project_to_sphere, project_to_tangent_plane};

/// Canonical bone-forward direction all cone geometry is built around.
pub(crate) const VISIBLE_POINT: Vec3 = Vec3::Z;

/// One angular slice of a cone limit: the spherical triangle spanned by
/// the origin, the visible point (bone forward) and two adjacent boundary
/// points.
///
/// Plane normals are precomputed at build time so the per-frame limit test
/// is a handful of dot products.
#[derive(Debug, Clone, Copy)]
pub struct ReachCone {
    pub point_a: Vec3,
    pub point_b: Vec3,
    /// Normal of the plane through origin, visible point and point A.
    slice_normal: Vec3,
    /// Normal of the plane through origin, visible point and point B.
    end_slice_normal: Vec3,
    /// Normal of the boundary plane through origin, A and B.
    boundary_normal: Vec3,
    /// Signed volume of the tetrahedron (origin, visible, A, B). Non
    /// positive volume flags a degenerate or inverted cone.
    volume: f32,
}

impl ReachCone {
    pub fn new(point_a: Vec3, point_b: Vec3) -> Self {
        let a = point_a.normalize_or_zero();
        let b = point_b.normalize_or_zero();

        Self {
            point_a: a,
            point_b: b,
            slice_normal: VISIBLE_POINT.cross(a),
            end_slice_normal: VISIBLE_POINT.cross(b),
            boundary_normal: a.cross(b),
            volume: VISIBLE_POINT.dot(a.cross(b)),
        }
    }

    pub fn volume(&self) -> f32 {
        self.volume
    }

    /// A misconfigured cone is kept and clamped best-effort; a rig must
    /// never halt animation over an authoring mistake.
    pub fn is_valid(&self) -> bool {
        self.volume > 0.0
    }

    /// Whether `direction` falls inside this cone's angular slice.
    /// Boundary-coincident directions count as inside (non-strict on the
    /// entry plane).
    pub fn contains_slice(&self, direction: Vec3) -> bool {
        self.slice_normal.dot(direction) >= 0.0 && self.end_slice_normal.dot(direction) < 0.0
    }

    /// Whether `direction` is on the allowed side of the boundary plane.
    pub fn within_boundary(&self, direction: Vec3) -> bool {
        self.boundary_normal.dot(direction) >= 0.0
    }
}

/// Rounds a coarse boundary polygon by inserting tangent-plane midpoints
/// between each adjacent pair, once per iteration. Interpolation happens
/// on the stereographic tangent plane at the visible point so midpoints
/// land back on the unit sphere without distortion near the cone center.
pub fn smooth_boundary(points: &[Vec3], iterations: u32) -> Vec<Vec3> {
    let mut current: Vec<Vec3> = points
        .iter()
        .map(|p| p.normalize_or_zero())
        .filter(|p| p.length_squared() > 0.0)
        .collect();

    for _ in 0..iterations {
        if current.len() < 2 {
            break;
        }

        let mut next = Vec::with_capacity(current.len() * 2);
        for i in 0..current.len() {
            let a = current[i];
            let b = current[(i + 1) % current.len()];

            let pa = project_to_tangent_plane(a, VISIBLE_POINT);
            let pb = project_to_tangent_plane(b, VISIBLE_POINT);
            let mid = project_to_sphere((pa + pb) * 0.5, VISIBLE_POINT).normalize_or_zero();

            next.push(a);
            if mid.length_squared() > 0.0 {
                next.push(mid);
            }
        }
        current = next;
    }

    current
}

/// Builds the derived reach cones for a smoothed boundary polygon,
/// logging any degenerate slice.
pub fn build_cones(boundary: &[Vec3]) -> Vec<ReachCone> {
    let mut cones = Vec::with_capacity(boundary.len());

    for i in 0..boundary.len() {
        let cone = ReachCone::new(boundary[i], boundary[(i + 1) % boundary.len()]);
        if !cone.is_valid() {
            log::warn!(
                "degenerate reach cone between {:?} and {:?} (volume {})",
                cone.point_a,
                cone.point_b,
                cone.volume()
            );
        }
        cones.push(cone);
    }

    cones
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square_boundary() -> Vec<Vec3> {
        // 45-degree cone around +Z
        vec![
            Vec3::new(1.0, 0.0, 1.0).normalize(),
            Vec3::new(0.0, 1.0, 1.0).normalize(),
            Vec3::new(-1.0, 0.0, 1.0).normalize(),
            Vec3::new(0.0, -1.0, 1.0).normalize(),
        ]
    }

    #[test]
    fn test_cone_volume_positive_for_ccw_polygon() {
        let cones = build_cones(&square_boundary());
        assert_eq!(cones.len(), 4);
        for cone in &cones {
            assert!(cone.is_valid());
        }
    }

    #[test]
    fn test_degenerate_cone_flagged() {
        let _ = env_logger::builder().is_test(true).try_init();

        let a = Vec3::new(1.0, 0.0, 1.0).normalize();
        assert!(!ReachCone::new(a, a).is_valid());

        // Building from a degenerate boundary warns but still yields cones
        let cones = build_cones(&[a, a]);
        assert!(cones.iter().all(|c| !c.is_valid()));
    }

    #[test]
    fn test_slice_location() {
        let cones = build_cones(&square_boundary());
        // Direction between the first two boundary points
        let dir = Vec3::new(0.5, 0.5, 1.0).normalize();

        let hits: Vec<usize> = (0..cones.len())
            .filter(|&i| cones[i].contains_slice(dir))
            .collect();
        assert_eq!(hits, vec![0]);
    }

    #[test]
    fn test_boundary_test() {
        let cones = build_cones(&square_boundary());
        let inside = Vec3::new(0.1, 0.1, 1.0).normalize();
        let outside = Vec3::new(1.0, 1.0, 0.1).normalize();

        let slice = cones.iter().find(|c| c.contains_slice(inside)).unwrap();
        assert!(slice.within_boundary(inside));

        let slice = cones.iter().find(|c| c.contains_slice(outside)).unwrap();
        assert!(!slice.within_boundary(outside));
    }

    #[test]
    fn test_smoothing_doubles_points_and_stays_unit() {
        let boundary = square_boundary();
        let smoothed = smooth_boundary(&boundary, 2);

        assert_eq!(smoothed.len(), 16);
        for p in &smoothed {
            assert!((p.length() - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_smoothing_preserves_original_points() {
        let boundary = square_boundary();
        let smoothed = smooth_boundary(&boundary, 1);

        for p in &boundary {
            assert!(smoothed.iter().any(|s| (*s - *p).length() < 1e-5));
        }
    }
}
