//! Parts
//!
//! A part is one placeable unit: a category, a world transform, a fixed
//! set of attach points, and an opaque internal state supplied by its
//! template. Parts are owned by the [`crate::AttachmentGraph`].

use wright_math::{Aabb, Transform, Vec3};

use crate::category::PartCategory;
use crate::id::PartId;
use crate::point::AttachPoint;
use crate::template::PartState;

/// A placeable unit with a fixed set of attach points.
#[derive(Debug)]
pub struct Part {
    id: PartId,
    template: String,
    category: PartCategory,
    transform: Transform,
    local_bounds: Aabb,
    min_snap_distance: f32,
    points: Vec<AttachPoint>,
    state: Box<dyn PartState>,
}

impl Part {
    pub(crate) fn new(
        template: String,
        category: PartCategory,
        transform: Transform,
        local_bounds: Aabb,
        min_snap_distance: f32,
        points: Vec<AttachPoint>,
        state: Box<dyn PartState>,
    ) -> Self {
        Self {
            id: PartId::NULL,
            template,
            category,
            transform,
            local_bounds,
            min_snap_distance,
            points,
            state,
        }
    }

    pub(crate) fn assign_id(&mut self, id: PartId) {
        self.id = id;
    }

    /// Identity assigned at registration; null before that
    #[inline]
    pub fn id(&self) -> PartId {
        self.id
    }

    /// Name of the template this part was instantiated from
    #[inline]
    pub fn template_name(&self) -> &str {
        &self.template
    }

    #[inline]
    pub fn category(&self) -> PartCategory {
        self.category
    }

    #[inline]
    pub fn transform(&self) -> Transform {
        self.transform
    }

    pub fn set_transform(&mut self, transform: Transform) {
        self.transform = transform;
    }

    pub fn set_position(&mut self, position: Vec3) {
        self.transform.position = position;
    }

    pub fn translate(&mut self, delta: Vec3) {
        self.transform.position += delta;
    }

    /// How close a point must be to another before they snap together
    #[inline]
    pub fn min_snap_distance(&self) -> f32 {
        self.min_snap_distance
    }

    /// True if any of this part's points is paired
    pub fn is_attached(&self) -> bool {
        self.points.iter().any(AttachPoint::is_attached)
    }

    #[inline]
    pub fn points(&self) -> &[AttachPoint] {
        &self.points
    }

    pub(crate) fn points_mut(&mut self) -> &mut [AttachPoint] {
        &mut self.points
    }

    pub fn point(&self, index: usize) -> Option<&AttachPoint> {
        self.points.get(index)
    }

    /// Indices of points that aren't paired with anything
    pub fn available_points(&self) -> impl Iterator<Item = usize> + '_ {
        self.points
            .iter()
            .enumerate()
            .filter(|(_, point)| !point.is_attached())
            .map(|(index, _)| index)
    }

    /// World-space position of a point
    pub fn point_world_position(&self, index: usize) -> Option<Vec3> {
        self.points
            .get(index)
            .map(|point| self.transform.transform_point(point.local_position()))
    }

    /// World-space outward normal of a point
    pub fn point_world_normal(&self, index: usize) -> Option<Vec3> {
        self.points
            .get(index)
            .map(|point| self.transform.transform_direction(point.local_normal()))
    }

    /// Bounds in world space
    pub fn world_bounds(&self) -> Aabb {
        self.local_bounds.transform(&self.transform)
    }

    /// World bounds grown by the snap threshold, for broad-phase checks
    pub fn snap_bounds(&self) -> Aabb {
        self.world_bounds().expand(self.min_snap_distance)
    }

    /// Opaque internal state
    pub fn state(&self) -> &dyn PartState {
        self.state.as_ref()
    }

    pub fn state_mut(&mut self) -> &mut dyn PartState {
        self.state.as_mut()
    }
}
