//! Interactive drag state machine
//!
//! Orchestrates one part being moved: grab, per-frame cursor tracking,
//! un-snap thresholding, snap commits, release, and deletion. Input
//! events and the cursor ray come from the host viewport; highlight
//! changes go out through [`HighlightSink`].

use thiserror::Error;
use wright_math::{Ray, Vec3};

use crate::graph::{AttachmentGraph, GraphError};
use crate::id::{PartId, PointRef};
use crate::part::Part;
use crate::snap::{collect_compatible_pairs, find_points_to_snap, CandidatePair, SnapCache};

/// Offsets shorter than this are treated as zero-length snap offsets.
const DEGENERATE_OFFSET: f32 = 1.0e-4;

/// Drag state machine errors
#[derive(Debug, Error)]
pub enum DragError {
    #[error("already holding part {0}")]
    AlreadyHolding(PartId),
    #[error("part not registered: {0}")]
    PartNotFound(PartId),
    #[error(transparent)]
    Graph(#[from] GraphError),
}

/// Receives highlight changes for attach points. Fire-and-forget; the
/// renderer owns what "highlighted" looks like.
pub trait HighlightSink {
    fn set_highlighted(&mut self, point: PointRef, highlighted: bool);
}

/// Sink that ignores all highlight changes.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullHighlight;

impl HighlightSink for NullHighlight {
    fn set_highlighted(&mut self, _point: PointRef, _highlighted: bool) {}
}

/// Two-state controller for interactive part placement: idle, or holding
/// one part while the cursor drives it.
#[derive(Debug, Default)]
pub struct DragController {
    held: Option<PartId>,
    cache: SnapCache,
}

impl DragController {
    pub fn new() -> Self {
        Self::default()
    }

    /// The part currently being held, if any
    #[inline]
    pub fn held(&self) -> Option<PartId> {
        self.held
    }

    #[inline]
    pub fn is_holding(&self) -> bool {
        self.held.is_some()
    }

    /// Current compatible-pair cache, for inspection by the host UI
    pub fn candidate_pairs(&self) -> &[CandidatePair] {
        self.cache.entries()
    }

    /// Start holding a part.
    ///
    /// The input layer must release before selecting again; selecting
    /// while holding is a precondition violation.
    pub fn begin_drag(
        &mut self,
        graph: &AttachmentGraph,
        part: PartId,
        sink: &mut dyn HighlightSink,
    ) -> Result<(), DragError> {
        if let Some(held) = self.held {
            log::error!("select while already holding part {}", held);
            return Err(DragError::AlreadyHolding(held));
        }
        if !graph.contains(part) {
            return Err(DragError::PartNotFound(part));
        }

        log::info!("grabbed part {}", part);
        self.held = Some(part);
        collect_compatible_pairs(graph, part, &mut self.cache);
        set_cache_highlighted(sink, &self.cache, true);
        Ok(())
    }

    /// Per-frame step while dragging. No-op when idle.
    ///
    /// The cursor ray is projected out to the part's current depth to get
    /// the target position. An attached part ignores sub-threshold cursor
    /// movement; beyond the threshold it is detached, the candidate cache
    /// rebuilt, and snapping re-evaluated, in that order.
    pub fn update(
        &mut self,
        graph: &mut AttachmentGraph,
        cursor: Ray,
        sink: &mut dyn HighlightSink,
    ) -> Result<(), DragError> {
        let Some(held) = self.held else {
            return Ok(());
        };
        let part = graph.part(held).ok_or(DragError::PartNotFound(held))?;

        let current = part.transform().position;
        let min_snap_distance = part.min_snap_distance();

        let depth = cursor.origin.distance(current);
        let mut new_position = cursor.at(depth);
        let delta = new_position - current;

        if part.is_attached() {
            // Cursor hasn't moved far enough to un-snap.
            if delta.length() < min_snap_distance {
                return Ok(());
            }

            graph.detach_all_points_of(held)?;
            collect_compatible_pairs(graph, held, &mut self.cache);
            set_cache_highlighted(sink, &self.cache, true);
        }

        if let Some(index) = find_points_to_snap(graph, held, &self.cache) {
            let entry = self.cache.entries()[index];
            if let Some(offset) = snap_offset(graph, entry) {
                // Move so the two points coincide exactly, overriding the
                // cursor-driven position for this frame.
                new_position = current + offset;
                graph.attach_points(entry.owned, entry.other)?;
                sink.set_highlighted(entry.owned, false);
                sink.set_highlighted(entry.other, false);
            }
        }

        if let Some(part) = graph.part_mut(held) {
            part.set_position(new_position);
        }
        Ok(())
    }

    /// Stop holding. Un-highlights and clears the candidate cache.
    pub fn release(&mut self, sink: &mut dyn HighlightSink) {
        if let Some(held) = self.held.take() {
            log::info!("released part {}", held);
            set_cache_highlighted(sink, &self.cache, false);
            self.cache.clear();
        }
    }

    /// Destroy the held part and return to idle.
    ///
    /// The graph severs the part's pairings before it is removed, so no
    /// dangling pairing can survive this. Returns the removed part.
    pub fn delete_held(
        &mut self,
        graph: &mut AttachmentGraph,
        sink: &mut dyn HighlightSink,
    ) -> Result<Option<Part>, DragError> {
        let Some(held) = self.held else {
            return Ok(None);
        };

        log::info!("destroying held part {}", held);
        let part = graph.remove_part(held)?;
        self.held = None;
        set_cache_highlighted(sink, &self.cache, false);
        self.cache.clear();
        Ok(Some(part))
    }
}

/// Vector from the owned point to the other point, or None when the
/// offset is degenerate and the snap should be skipped.
fn snap_offset(graph: &AttachmentGraph, entry: CandidatePair) -> Option<Vec3> {
    let owned = graph.point_world_position(entry.owned)?;
    let other = graph.point_world_position(entry.other)?;
    let offset = other - owned;
    if offset.is_nearly_zero(DEGENERATE_OFFSET) {
        None
    } else {
        Some(offset)
    }
}

fn set_cache_highlighted(sink: &mut dyn HighlightSink, cache: &SnapCache, highlighted: bool) {
    for entry in cache.entries() {
        sink.set_highlighted(entry.owned, highlighted);
        sink.set_highlighted(entry.other, highlighted);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::category::PartCategory;
    use crate::template::{PartTemplate, PointSpec};
    use std::collections::HashSet;
    use wright_math::{Aabb, Transform};

    /// Sink that records the set of currently highlighted points.
    #[derive(Default)]
    struct RecordingSink {
        highlighted: HashSet<PointRef>,
    }

    impl HighlightSink for RecordingSink {
        fn set_highlighted(&mut self, point: PointRef, highlighted: bool) {
            if highlighted {
                self.highlighted.insert(point);
            } else {
                self.highlighted.remove(&point);
            }
        }
    }

    fn socket_template(name: &str, category: PartCategory) -> PartTemplate {
        PartTemplate::new(name, category)
            .with_default_compatible(PartCategory::ALL.to_vec())
            .with_bounds(Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(1.0)))
            .with_min_snap_distance(2.0)
            .with_point(PointSpec::new(Vec3::X, Vec3::X))
            .with_point(PointSpec::new(Vec3::NEG_X, Vec3::NEG_X))
    }

    /// Cursor ray whose depth projection lands exactly on `target`.
    ///
    /// The controller projects the ray out by the distance from the ray
    /// origin to the part's current position, so an origin equidistant
    /// from `current` and `target` reproduces an exact hit.
    fn cursor_toward(current: Vec3, target: Vec3) -> Ray {
        let origin = (current + target) * 0.5 + Vec3::Y * 50.0;
        Ray::new(origin, target - origin)
    }

    fn setup() -> (AttachmentGraph, PartId, PartId) {
        let mut graph = AttachmentGraph::new();
        let anchor = graph.register_part(
            socket_template("Anchor", PartCategory::Fuselage).instantiate(Transform::IDENTITY),
        );
        let held = graph.register_part(
            socket_template("Held", PartCategory::Engine)
                .instantiate(Transform::from_position(Vec3::new(10.0, 0.0, 0.0))),
        );
        (graph, anchor, held)
    }

    /// Drag the held part from x=10 next to the anchor until it snaps,
    /// returning the snapped position.
    fn drag_to_snap(
        controller: &mut DragController,
        graph: &mut AttachmentGraph,
        held: PartId,
        sink: &mut dyn HighlightSink,
    ) -> Vec3 {
        let target = Vec3::new(3.5, 0.0, 0.0);
        controller
            .update(graph, cursor_toward(Vec3::new(10.0, 0.0, 0.0), target), sink)
            .unwrap();
        controller
            .update(graph, cursor_toward(target, target), sink)
            .unwrap();
        assert!(graph.part(held).unwrap().is_attached());
        graph.part(held).unwrap().transform().position
    }

    #[test]
    fn test_select_while_holding_is_rejected() {
        let (graph, anchor, held) = setup();
        let mut controller = DragController::new();
        let mut sink = NullHighlight;

        controller.begin_drag(&graph, held, &mut sink).unwrap();
        let result = controller.begin_drag(&graph, anchor, &mut sink);
        assert!(matches!(result, Err(DragError::AlreadyHolding(_))));
        assert_eq!(controller.held(), Some(held));
    }

    #[test]
    fn test_begin_drag_highlights_candidates() {
        let (graph, _, held) = setup();
        let mut controller = DragController::new();
        let mut sink = RecordingSink::default();

        controller.begin_drag(&graph, held, &mut sink).unwrap();
        assert!(!controller.candidate_pairs().is_empty());
        assert!(!sink.highlighted.is_empty());

        controller.release(&mut sink);
        assert!(sink.highlighted.is_empty());
        assert!(controller.candidate_pairs().is_empty());
        assert!(!controller.is_holding());
    }

    #[test]
    fn test_cursor_movement_moves_the_part() {
        let (mut graph, _, held) = setup();
        let mut controller = DragController::new();
        let mut sink = NullHighlight;

        controller.begin_drag(&graph, held, &mut sink).unwrap();
        let target = Vec3::new(20.0, 0.0, 5.0);
        controller
            .update(
                &mut graph,
                cursor_toward(Vec3::new(10.0, 0.0, 0.0), target),
                &mut sink,
            )
            .unwrap();

        let position = graph.part(held).unwrap().transform().position;
        assert!((position - target).length() < 1e-3);
    }

    #[test]
    fn test_drag_into_range_snaps_points_together() {
        let (mut graph, anchor, held) = setup();
        let mut controller = DragController::new();
        let mut sink = RecordingSink::default();

        controller.begin_drag(&graph, held, &mut sink).unwrap();

        // Anchor's +X point sits at (1,0,0); dragging the held part to
        // x=3.5 brings its -X point within the 2.0 threshold. Matching
        // runs against pre-move positions, so the first frame moves the
        // part and the next one commits the snap.
        let target = Vec3::new(3.5, 0.0, 0.0);
        controller
            .update(&mut graph, cursor_toward(Vec3::new(10.0, 0.0, 0.0), target), &mut sink)
            .unwrap();
        assert!(!graph.part(held).unwrap().is_attached());
        controller
            .update(&mut graph, cursor_toward(target, target), &mut sink)
            .unwrap();

        let held_part = graph.part(held).unwrap();
        assert!(held_part.is_attached());

        // The points coincide exactly after the snap.
        let owned = graph.point_world_position(PointRef::new(held, 1)).unwrap();
        let other = graph.point_world_position(PointRef::new(anchor, 0)).unwrap();
        assert!((owned - other).length() < 1e-3);

        // Committed points are no longer shown as available.
        assert!(!sink.highlighted.contains(&PointRef::new(held, 1)));
        assert!(!sink.highlighted.contains(&PointRef::new(anchor, 0)));
    }

    #[test]
    fn test_sub_threshold_jitter_keeps_attachment() {
        let (mut graph, _, held) = setup();
        let mut controller = DragController::new();
        let mut sink = NullHighlight;

        controller.begin_drag(&graph, held, &mut sink).unwrap();
        let snapped = drag_to_snap(&mut controller, &mut graph, held, &mut sink);

        // A wiggle below the 2.0 threshold must not move or detach.
        controller
            .update(
                &mut graph,
                cursor_toward(snapped, snapped + Vec3::new(0.5, 0.0, 0.0)),
                &mut sink,
            )
            .unwrap();
        assert!(graph.part(held).unwrap().is_attached());
        assert_eq!(graph.part(held).unwrap().transform().position, snapped);
    }

    #[test]
    fn test_over_threshold_movement_detaches() {
        let (mut graph, _, held) = setup();
        let mut controller = DragController::new();
        let mut sink = NullHighlight;

        controller.begin_drag(&graph, held, &mut sink).unwrap();
        let snapped = drag_to_snap(&mut controller, &mut graph, held, &mut sink);

        // Yank it far away: detach, and follow the cursor again.
        let target = Vec3::new(30.0, 0.0, 0.0);
        controller
            .update(&mut graph, cursor_toward(snapped, target), &mut sink)
            .unwrap();

        let part = graph.part(held).unwrap();
        assert!(!part.is_attached());
        assert!((part.transform().position - target).length() < 1e-3);
    }

    #[test]
    fn test_delete_held_removes_part_and_pairings() {
        let (mut graph, anchor, held) = setup();
        let mut controller = DragController::new();
        let mut sink = RecordingSink::default();

        controller.begin_drag(&graph, held, &mut sink).unwrap();
        drag_to_snap(&mut controller, &mut graph, held, &mut sink);

        let removed = controller.delete_held(&mut graph, &mut sink).unwrap();
        assert_eq!(removed.unwrap().template_name(), "Held");
        assert!(!controller.is_holding());
        assert!(!graph.contains(held));
        assert!(!graph.part(anchor).unwrap().is_attached());
        assert!(sink.highlighted.is_empty());
    }

    #[test]
    fn test_update_while_idle_is_a_no_op() {
        let (mut graph, _, held) = setup();
        let mut controller = DragController::new();
        let mut sink = NullHighlight;

        let before = graph.part(held).unwrap().transform().position;
        controller
            .update(&mut graph, cursor_toward(before, Vec3::ZERO), &mut sink)
            .unwrap();
        assert_eq!(graph.part(held).unwrap().transform().position, before);
    }
}
