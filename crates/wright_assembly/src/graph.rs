//! The attachment graph
//!
//! Owns every live part of the current assembly and is the only code
//! allowed to mutate pairings. All pairing operations keep the mutual
//! invariant: if A is paired to B then B is paired to A, both points
//! belong to different parts, and every pairing refers to a part that is
//! still registered.

use std::collections::HashMap;

use thiserror::Error;
use wright_math::Vec3;

use crate::id::{PartId, PointRef};
use crate::part::Part;
use crate::point::AttachPoint;

/// Pairing and registry errors
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("part not registered: {0}")]
    PartNotFound(PartId),
    #[error("attach point out of range: {0}")]
    PointNotFound(PointRef),
    #[error("points {0} and {1} belong to the same part")]
    SamePart(PointRef, PointRef),
    #[error("point {0} is already attached")]
    AlreadyAttached(PointRef),
    #[error("points {0} and {1} are not mutually attached")]
    NotMutuallyAttached(PointRef, PointRef),
}

/// Registry of live parts and the pairing relation between their points.
#[derive(Debug, Default)]
pub struct AttachmentGraph {
    parts: HashMap<PartId, Part>,
    /// Registration order, which save and iteration preserve
    order: Vec<PartId>,
    next_id: u32,
}

impl AttachmentGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take ownership of a part and assign its id.
    pub fn register_part(&mut self, mut part: Part) -> PartId {
        let id = PartId::new(self.next_id);
        self.next_id += 1;
        part.assign_id(id);
        log::debug!("registered part {} ({})", id, part.template_name());
        self.order.push(id);
        self.parts.insert(id, part);
        id
    }

    /// Sever all of a part's pairings, then remove and return it.
    pub fn remove_part(&mut self, id: PartId) -> Result<Part, GraphError> {
        self.detach_all_points_of(id)?;
        self.order.retain(|other| *other != id);
        let part = self.parts.remove(&id).ok_or(GraphError::PartNotFound(id))?;
        log::debug!("removed part {} ({})", id, part.template_name());
        Ok(part)
    }

    /// Drop every part. Used when starting a new or loaded assembly.
    pub fn clear(&mut self) {
        self.parts.clear();
        self.order.clear();
    }

    pub fn contains(&self, id: PartId) -> bool {
        self.parts.contains_key(&id)
    }

    pub fn part(&self, id: PartId) -> Option<&Part> {
        self.parts.get(&id)
    }

    pub fn part_mut(&mut self, id: PartId) -> Option<&mut Part> {
        self.parts.get_mut(&id)
    }

    /// Live parts in registration order
    pub fn parts(&self) -> impl Iterator<Item = &Part> {
        self.order.iter().filter_map(|id| self.parts.get(id))
    }

    /// Ids of live parts in registration order
    pub fn part_ids(&self) -> &[PartId] {
        &self.order
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    pub fn point(&self, point: PointRef) -> Option<&AttachPoint> {
        self.parts.get(&point.part)?.point(point.index)
    }

    /// World-space position of a point
    pub fn point_world_position(&self, point: PointRef) -> Option<Vec3> {
        self.parts.get(&point.part)?.point_world_position(point.index)
    }

    /// World-space outward normal of a point
    pub fn point_world_normal(&self, point: PointRef) -> Option<Vec3> {
        self.parts.get(&point.part)?.point_world_normal(point.index)
    }

    pub fn is_point_attached(&self, point: PointRef) -> bool {
        self.point(point).map(AttachPoint::is_attached).unwrap_or(false)
    }

    fn lookup(&self, point: PointRef) -> Result<&AttachPoint, GraphError> {
        let part = self
            .parts
            .get(&point.part)
            .ok_or(GraphError::PartNotFound(point.part))?;
        part.point(point.index).ok_or(GraphError::PointNotFound(point))
    }

    fn lookup_mut(&mut self, point: PointRef) -> Result<&mut AttachPoint, GraphError> {
        let part = self
            .parts
            .get_mut(&point.part)
            .ok_or(GraphError::PartNotFound(point.part))?;
        part.points_mut()
            .get_mut(point.index)
            .ok_or(GraphError::PointNotFound(point))
    }

    /// Establish the mutual pairing between two free points.
    ///
    /// Rejected without touching the graph if either point is already
    /// attached or both belong to the same part.
    pub fn attach_points(&mut self, a: PointRef, b: PointRef) -> Result<(), GraphError> {
        if a.part == b.part {
            log::error!("refusing to attach {} and {}: same part", a, b);
            return Err(GraphError::SamePart(a, b));
        }
        if self.lookup(a)?.is_attached() {
            log::error!("refusing to attach {}: already attached", a);
            return Err(GraphError::AlreadyAttached(a));
        }
        if self.lookup(b)?.is_attached() {
            log::error!("refusing to attach {}: already attached", b);
            return Err(GraphError::AlreadyAttached(b));
        }

        self.lookup_mut(a)?.pair(b);
        self.lookup_mut(b)?.pair(a);
        log::debug!("attached {} <-> {}", a, b);
        Ok(())
    }

    /// Clear the pairing between two points.
    ///
    /// Only valid when the points are mutually paired to each other; a
    /// one-sided link would mean the graph is corrupt, so it is reported
    /// and left untouched.
    pub fn detach_points(&mut self, a: PointRef, b: PointRef) -> Result<(), GraphError> {
        let mutual = self.lookup(a)?.is_paired_with(b) && self.lookup(b)?.is_paired_with(a);
        if !mutual {
            log::error!("pairing between {} and {} is not mutual", a, b);
            return Err(GraphError::NotMutuallyAttached(a, b));
        }

        self.lookup_mut(a)?.unpair();
        self.lookup_mut(b)?.unpair();
        log::debug!("detached {} <-> {}", a, b);
        Ok(())
    }

    /// Detach every pairing of the given part, both sides.
    ///
    /// Returns how many pairings were severed. Must run before a part is
    /// removed; [`Self::remove_part`] calls it.
    pub fn detach_all_points_of(&mut self, id: PartId) -> Result<usize, GraphError> {
        let part = self.parts.get(&id).ok_or(GraphError::PartNotFound(id))?;

        let pairings: Vec<(PointRef, PointRef)> = part
            .points()
            .iter()
            .enumerate()
            .filter_map(|(index, point)| {
                point.paired_with().map(|partner| (PointRef::new(id, index), partner))
            })
            .collect();

        for (owned, partner) in &pairings {
            self.detach_points(*owned, *partner)?;
        }
        Ok(pairings.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::PartCategory;
    use crate::template::{PartTemplate, PointSpec};
    use wright_math::Transform;

    fn block_template() -> PartTemplate {
        PartTemplate::new("Block", PartCategory::Fuselage)
            .with_default_compatible(PartCategory::ALL.to_vec())
            .with_point(PointSpec::new(Vec3::new(1.0, 0.0, 0.0), Vec3::X))
            .with_point(PointSpec::new(Vec3::new(-1.0, 0.0, 0.0), Vec3::NEG_X))
    }

    fn graph_with_two_parts() -> (AttachmentGraph, PartId, PartId) {
        let template = block_template();
        let mut graph = AttachmentGraph::new();
        let a = graph.register_part(template.instantiate(Transform::IDENTITY));
        let b = graph.register_part(
            template.instantiate(Transform::from_position(Vec3::new(2.0, 0.0, 0.0))),
        );
        (graph, a, b)
    }

    #[test]
    fn test_attach_is_mutual() {
        let (mut graph, a, b) = graph_with_two_parts();
        let pa = PointRef::new(a, 0);
        let pb = PointRef::new(b, 1);

        graph.attach_points(pa, pb).unwrap();

        assert!(graph.point(pa).unwrap().is_attached());
        assert!(graph.point(pb).unwrap().is_attached());
        assert_eq!(graph.point(pa).unwrap().paired_with(), Some(pb));
        assert_eq!(graph.point(pb).unwrap().paired_with(), Some(pa));
    }

    #[test]
    fn test_attach_same_part_fails() {
        let (mut graph, a, _) = graph_with_two_parts();
        let result = graph.attach_points(PointRef::new(a, 0), PointRef::new(a, 1));
        assert!(matches!(result, Err(GraphError::SamePart(_, _))));
    }

    #[test]
    fn test_attach_already_attached_fails() {
        let (mut graph, a, b) = graph_with_two_parts();
        let template = block_template();
        let c = graph.register_part(
            template.instantiate(Transform::from_position(Vec3::new(4.0, 0.0, 0.0))),
        );

        graph.attach_points(PointRef::new(a, 0), PointRef::new(b, 1)).unwrap();
        let result = graph.attach_points(PointRef::new(a, 0), PointRef::new(c, 1));
        assert!(matches!(result, Err(GraphError::AlreadyAttached(_))));

        // The rejected call must not have touched the free point.
        assert!(!graph.point(PointRef::new(c, 1)).unwrap().is_attached());
    }

    #[test]
    fn test_detach_requires_mutual_pairing() {
        let (mut graph, a, b) = graph_with_two_parts();
        let pa = PointRef::new(a, 0);
        let pb = PointRef::new(b, 1);

        // Not attached at all yet.
        assert!(matches!(
            graph.detach_points(pa, pb),
            Err(GraphError::NotMutuallyAttached(_, _))
        ));

        graph.attach_points(pa, pb).unwrap();

        // Wrong partner.
        assert!(matches!(
            graph.detach_points(pa, PointRef::new(b, 0)),
            Err(GraphError::NotMutuallyAttached(_, _))
        ));

        graph.detach_points(pa, pb).unwrap();
        assert!(!graph.point(pa).unwrap().is_attached());
        assert!(!graph.point(pb).unwrap().is_attached());
    }

    #[test]
    fn test_remove_part_leaves_no_dangling_pairing() {
        let (mut graph, a, b) = graph_with_two_parts();
        graph.attach_points(PointRef::new(a, 0), PointRef::new(b, 1)).unwrap();

        let removed = graph.remove_part(a).unwrap();
        assert_eq!(removed.template_name(), "Block");
        assert!(!graph.contains(a));

        // No remaining point may reference the removed part.
        for part in graph.parts() {
            for point in part.points() {
                assert!(point.paired_with().is_none());
            }
        }
        assert_eq!(graph.part_ids(), &[b]);
    }

    #[test]
    fn test_detach_all_points_of() {
        let template = block_template();
        let mut graph = AttachmentGraph::new();
        let a = graph.register_part(template.instantiate(Transform::IDENTITY));
        let b = graph.register_part(
            template.instantiate(Transform::from_position(Vec3::new(2.0, 0.0, 0.0))),
        );
        let c = graph.register_part(
            template.instantiate(Transform::from_position(Vec3::new(-2.0, 0.0, 0.0))),
        );

        graph.attach_points(PointRef::new(a, 0), PointRef::new(b, 1)).unwrap();
        graph.attach_points(PointRef::new(a, 1), PointRef::new(c, 0)).unwrap();

        let detached = graph.detach_all_points_of(a).unwrap();
        assert_eq!(detached, 2);
        assert!(!graph.part(a).unwrap().is_attached());
        assert!(!graph.part(b).unwrap().is_attached());
        assert!(!graph.part(c).unwrap().is_attached());
    }

    #[test]
    fn test_parts_iterate_in_registration_order() {
        let (graph, a, b) = graph_with_two_parts();
        let ids: Vec<PartId> = graph.parts().map(Part::id).collect();
        assert_eq!(ids, vec![a, b]);
    }
}
