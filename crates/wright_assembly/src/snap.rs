//! Snap-candidate discovery and best-match selection
//!
//! While a part is being dragged, [`collect_compatible_pairs`] builds the
//! set of point pairs that could ever join (category-compatible both
//! ways, normals directly opposed), and [`find_points_to_snap`] picks the
//! closest in-range pair each frame. The cache is rebuilt when a part is
//! grabbed and after any detach, not every frame.

use wright_math::nearly_equal;

use crate::graph::AttachmentGraph;
use crate::id::{PartId, PointRef};

/// How far the dot product of two point normals may deviate from -1
/// before the points no longer count as facing each other. Partial-angle
/// snapping is not supported.
pub const OPPOSED_NORMAL_TOLERANCE: f32 = 1.0e-3;

/// One joinable point pair: a point on the moving part and a point on
/// some other part.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CandidatePair {
    /// Point owned by the part being moved
    pub owned: PointRef,
    /// Point on another part
    pub other: PointRef,
}

/// Reusable storage for the compatible-pair set.
#[derive(Debug, Default)]
pub struct SnapCache {
    entries: Vec<CandidatePair>,
}

impl SnapCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[CandidatePair] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop all entries but keep the allocation for the next rebuild.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Rebuild the compatible-pair cache for a moving part.
///
/// A pair survives when both points are unattached, each point accepts
/// the other part's category, and the world normals point directly at
/// each other. Returns true if any pair was found.
pub fn collect_compatible_pairs(
    graph: &AttachmentGraph,
    part_id: PartId,
    cache: &mut SnapCache,
) -> bool {
    cache.clear();

    let Some(part) = graph.part(part_id) else {
        log::warn!("cannot collect pairs for unregistered part {}", part_id);
        return false;
    };
    if part.points().is_empty() {
        log::warn!("part {} ({}) has no attach points", part_id, part.template_name());
        return false;
    }

    let category = part.category();
    for other in graph.parts() {
        if other.id() == part_id {
            continue;
        }

        let other_category = other.category();
        for owned_index in part.available_points() {
            let owned = &part.points()[owned_index];
            if !owned.is_compatible_with(other_category) {
                continue;
            }
            let owned_normal = part.transform().transform_direction(owned.local_normal());

            for other_index in other.available_points() {
                let other_point = &other.points()[other_index];
                if !other_point.is_compatible_with(category) {
                    continue;
                }

                let other_normal =
                    other.transform().transform_direction(other_point.local_normal());
                let dot = owned_normal.dot(other_normal);
                if !nearly_equal(dot, -1.0, OPPOSED_NORMAL_TOLERANCE) {
                    continue;
                }

                cache.entries.push(CandidatePair {
                    owned: PointRef::new(part_id, owned_index),
                    other: PointRef::new(other.id(), other_index),
                });
            }
        }
    }

    !cache.entries.is_empty()
}

/// Pick the best cache entry to snap this frame, if any.
///
/// Broad phase rejects entries whose parts' snap bounds don't overlap;
/// narrow phase keeps entries within the moving part's snap threshold and
/// returns the index of the strictly closest one (ties keep the first).
pub fn find_points_to_snap(
    graph: &AttachmentGraph,
    part_id: PartId,
    cache: &SnapCache,
) -> Option<usize> {
    if cache.is_empty() {
        return None;
    }

    let part = graph.part(part_id)?;
    let held_bounds = part.snap_bounds();
    let min_snap_sq = part.min_snap_distance() * part.min_snap_distance();

    let mut best_index = None;
    let mut best_dist_sq = f32::MAX;
    for (index, entry) in cache.entries.iter().enumerate() {
        debug_assert!(
            entry.owned.part == part_id && entry.other.part != part_id,
            "cache entry {} does not belong to the held part {}",
            index,
            part_id
        );

        // Entries can go stale between rebuilds; never match those.
        if graph.is_point_attached(entry.owned) || graph.is_point_attached(entry.other) {
            continue;
        }

        let Some(other_part) = graph.part(entry.other.part) else {
            continue;
        };
        if !held_bounds.intersects(&other_part.snap_bounds()) {
            continue;
        }

        let Some(owned_pos) = graph.point_world_position(entry.owned) else {
            continue;
        };
        let Some(other_pos) = graph.point_world_position(entry.other) else {
            continue;
        };

        let dist_sq = owned_pos.distance_squared(other_pos);
        if dist_sq <= min_snap_sq && dist_sq < best_dist_sq {
            best_dist_sq = dist_sq;
            best_index = Some(index);
        }
    }

    best_index
}
