//! Attach points
//!
//! An attach point is a directional connector on a part. It stores its
//! position and outward normal in the part's local space; world-space
//! values are derived through the owning part's transform. The pairing
//! field is only ever mutated by the [`crate::AttachmentGraph`], which is
//! what keeps pairings mutual.

use crate::category::PartCategory;
use crate::id::PointRef;
use wright_math::Vec3;

/// A pairable connector belonging to exactly one part.
#[derive(Clone, Debug)]
pub struct AttachPoint {
    local_position: Vec3,
    local_normal: Vec3,
    compatible: Vec<PartCategory>,
    paired: Option<PointRef>,
}

impl AttachPoint {
    pub(crate) fn new(
        local_position: Vec3,
        local_normal: Vec3,
        compatible: Vec<PartCategory>,
    ) -> Self {
        Self {
            local_position,
            local_normal: local_normal.normalize(),
            compatible,
            paired: None,
        }
    }

    /// Position in the owning part's local space
    #[inline]
    pub fn local_position(&self) -> Vec3 {
        self.local_position
    }

    /// Outward normal in the owning part's local space (unit length)
    #[inline]
    pub fn local_normal(&self) -> Vec3 {
        self.local_normal
    }

    /// Categories of parts this point will pair with
    #[inline]
    pub fn compatible_categories(&self) -> &[PartCategory] {
        &self.compatible
    }

    /// True if this point accepts parts of the given category
    pub fn is_compatible_with(&self, category: PartCategory) -> bool {
        self.compatible.contains(&category)
    }

    /// Is this point paired with another point
    #[inline]
    pub fn is_attached(&self) -> bool {
        self.paired.is_some()
    }

    /// The point this one is paired with, if any
    #[inline]
    pub fn paired_with(&self) -> Option<PointRef> {
        self.paired
    }

    /// Is this point paired with the given point
    pub fn is_paired_with(&self, other: PointRef) -> bool {
        self.paired == Some(other)
    }

    /// Record the pairing on this side. Graph use only.
    pub(crate) fn pair(&mut self, other: PointRef) {
        self.paired = Some(other);
    }

    /// Clear this side of the pairing. Idempotent.
    pub(crate) fn unpair(&mut self) {
        self.paired = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::id::PartId;

    #[test]
    fn test_compatibility() {
        let point = AttachPoint::new(
            Vec3::ZERO,
            Vec3::X,
            vec![PartCategory::Engine, PartCategory::Thruster],
        );
        assert!(point.is_compatible_with(PartCategory::Engine));
        assert!(!point.is_compatible_with(PartCategory::Cockpit));
    }

    #[test]
    fn test_normal_is_normalized() {
        let point = AttachPoint::new(Vec3::ZERO, Vec3::new(0.0, 3.0, 0.0), vec![]);
        assert!((point.local_normal() - Vec3::Y).length() < 1e-6);
    }

    #[test]
    fn test_pair_unpair() {
        let mut point = AttachPoint::new(Vec3::ZERO, Vec3::X, vec![]);
        assert!(!point.is_attached());

        let other = PointRef::new(PartId::new(1), 0);
        point.pair(other);
        assert!(point.is_attached());
        assert!(point.is_paired_with(other));

        point.unpair();
        point.unpair();
        assert!(!point.is_attached());
    }
}
