//! Additional math helpers layered on top of `glam`.

use glam::{Mat3, Quat, Vec3};

/// Reflects a point across the vehicle's longitudinal-vertical (XZ) plane.
pub fn mirror_y(point: Vec3) -> Vec3 {
    Vec3::new(point.x, -point.y, point.z)
}

pub fn midpoint(a: Vec3, b: Vec3) -> Vec3 {
    (a + b) * 0.5
}

/// Unit direction from `from` to `to`, or `None` for coincident points.
pub fn direction(from: Vec3, to: Vec3) -> Option<Vec3> {
    (to - from).try_normalize()
}

/// Two unit vectors completing `axis` to a right-handed orthonormal basis.
pub fn orthonormal_pair(axis: Vec3) -> (Vec3, Vec3) {
    let axis = axis.normalize_or(Vec3::Z);
    let u = axis.any_orthonormal_vector();
    let v = axis.cross(u);
    (u, v)
}

/// Cross axes of a universal joint sitting at one end of a link along `link_dir`.
///
/// The first axis is horizontal and perpendicular to the link, the second is
/// perpendicular to both, so rotation about the link itself is locked.
pub fn universal_axes(link_dir: Vec3) -> (Vec3, Vec3) {
    let link_dir = link_dir.normalize_or(Vec3::X);
    let first = link_dir
        .cross(Vec3::Z)
        .try_normalize()
        .unwrap_or_else(|| link_dir.any_orthonormal_vector());
    let second = link_dir.cross(first).normalize();
    (first, second)
}

/// Inertia tensor expressed in world axes: `R I Rᵀ`.
pub fn world_inertia(rotation: Quat, local_inertia: Mat3) -> Mat3 {
    let r = Mat3::from_quat(rotation);
    r * local_inertia * r.transpose()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn mirroring_twice_is_identity() {
        let p = Vec3::new(0.3, -1.2, 0.05);
        assert_eq!(mirror_y(mirror_y(p)), p);
        assert_eq!(mirror_y(p), Vec3::new(0.3, 1.2, 0.05));
    }

    #[test]
    fn universal_axes_are_orthogonal_to_link() {
        for dir in [Vec3::X, Vec3::new(0.2, 0.9, -0.1), Vec3::Z] {
            let (a, b) = universal_axes(dir);
            let dir = dir.normalize();
            assert_relative_eq!(a.dot(dir), 0.0, epsilon = 1e-6);
            assert_relative_eq!(b.dot(dir), 0.0, epsilon = 1e-6);
            assert_relative_eq!(a.dot(b), 0.0, epsilon = 1e-6);
        }
    }
}
