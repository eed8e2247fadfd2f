//! Assembly record codec
//!
//! Turns the live graph into an [`AssemblyRecord`] and reconstructs
//! parts from one. Loading is all-or-nothing: every template reference
//! is resolved and every payload decoded before the graph is touched, so
//! a bad record never leaves a partial assembly behind.
//!
//! Records do not store pairings. [`rebuild_pairings`] restores them
//! after a load by re-attaching compatible point pairs that coincide in
//! space.

use wright_assembly::{
    AttachmentGraph, Part, PartId, PointRef, TemplateLibrary, OPPOSED_NORMAL_TOLERANCE,
};

use crate::records::{AssemblyRecord, PartRecord, SaveError, FORMAT_VERSION};

/// Two points closer than this after a load are treated as the same
/// joint and re-attached.
pub const COINCIDENT_DISTANCE: f32 = 1.0e-3;

/// Capture the live assembly as a record.
///
/// Saving zero parts is permitted and produces an empty, valid record.
pub fn save_assembly(name: &str, graph: &AttachmentGraph) -> Result<AssemblyRecord, SaveError> {
    let mut parts = Vec::with_capacity(graph.len());
    for part in graph.parts() {
        let payload = part.state().encode().map_err(|err| SaveError::Payload {
            template: part.template_name().to_string(),
            message: err.to_string(),
        })?;
        parts.push(PartRecord {
            template: part.template_name().to_string(),
            transform: part.transform(),
            payload,
        });
    }

    log::info!("saved assembly '{}' ({} parts)", name, parts.len());
    Ok(AssemblyRecord {
        version: FORMAT_VERSION,
        name: name.to_string(),
        parts,
    })
}

/// Reconstruct every part in a record and register them with the graph.
///
/// Fails without touching the graph if the record version is unsupported,
/// any template reference fails to resolve, or any payload fails to
/// decode. Returns the ids of the new parts in record order.
pub fn load_assembly(
    record: &AssemblyRecord,
    library: &TemplateLibrary,
    graph: &mut AttachmentGraph,
) -> Result<Vec<PartId>, SaveError> {
    if record.version > FORMAT_VERSION {
        return Err(SaveError::VersionMismatch(record.version, FORMAT_VERSION));
    }

    let mut staged: Vec<Part> = Vec::with_capacity(record.parts.len());
    for (index, entry) in record.parts.iter().enumerate() {
        let Some(template) = library.resolve(&entry.template) else {
            log::error!(
                "aborting load of '{}': entry {} references unknown template '{}'",
                record.name,
                index,
                entry.template
            );
            return Err(SaveError::UnknownTemplate {
                index,
                template: entry.template.clone(),
            });
        };

        let part = template
            .instantiate_from_payload(entry.transform, &entry.payload)
            .map_err(|err| SaveError::Payload {
                template: entry.template.clone(),
                message: err.to_string(),
            })?;
        staged.push(part);
    }

    let ids: Vec<PartId> = staged
        .into_iter()
        .map(|part| graph.register_part(part))
        .collect();
    log::info!("loaded assembly '{}' ({} parts)", record.name, ids.len());
    Ok(ids)
}

/// Re-attach point pairs among the given parts whose world positions
/// coincide. Returns the number of pairings made.
pub fn rebuild_pairings(graph: &mut AttachmentGraph, parts: &[PartId]) -> usize {
    let mut candidates: Vec<(PointRef, PointRef)> = Vec::new();

    for (i, &a_id) in parts.iter().enumerate() {
        let Some(a) = graph.part(a_id) else { continue };

        for &b_id in &parts[i + 1..] {
            let Some(b) = graph.part(b_id) else { continue };

            for a_index in a.available_points() {
                let a_point = &a.points()[a_index];
                if !a_point.is_compatible_with(b.category()) {
                    continue;
                }
                let a_normal = a.transform().transform_direction(a_point.local_normal());
                let a_position = a.transform().transform_point(a_point.local_position());

                for b_index in b.available_points() {
                    let b_point = &b.points()[b_index];
                    if !b_point.is_compatible_with(a.category()) {
                        continue;
                    }

                    let b_normal = b.transform().transform_direction(b_point.local_normal());
                    if !wright_math::nearly_equal(a_normal.dot(b_normal), -1.0, OPPOSED_NORMAL_TOLERANCE)
                    {
                        continue;
                    }

                    let b_position = b.transform().transform_point(b_point.local_position());
                    if a_position.distance_squared(b_position)
                        > COINCIDENT_DISTANCE * COINCIDENT_DISTANCE
                    {
                        continue;
                    }

                    candidates.push((PointRef::new(a_id, a_index), PointRef::new(b_id, b_index)));
                }
            }
        }
    }

    let mut rebuilt = 0;
    for (owned, other) in candidates {
        // Earlier re-attachments can consume a point that appeared in
        // several coincident candidates.
        if graph.is_point_attached(owned) || graph.is_point_attached(other) {
            continue;
        }
        if graph.attach_points(owned, other).is_ok() {
            rebuilt += 1;
        }
    }

    if rebuilt > 0 {
        log::info!("rebuilt {} pairings after load", rebuilt);
    }
    rebuilt
}
