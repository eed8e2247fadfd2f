//! Headless walkthrough of the assembly editing loop: spawn parts from
//! templates, drag one until it snaps, delete another, then save, reload,
//! and rebuild the attachment pairings.
//!
//! Run with `RUST_LOG=debug` to watch the graph operations.

use std::any::Any;
use std::env::temp_dir;
use std::error::Error;

use serde::{Deserialize, Serialize};
use wright_assembly::{
    AttachmentGraph, DragController, NullHighlight, PartCategory, PartState, PartTemplate,
    PointSpec, StateCodec, StateError, TemplateLibrary,
};
use wright_math::{Aabb, Ray, Transform, Vec3};
use wright_save::{load_assembly, rebuild_pairings, save_assembly, AssemblyStore, StoreFormat};

/// Gimbal tuning carried by thruster parts across save/load.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
struct GimbalState {
    version: u8,
    gimbal_range: f32,
}

impl Default for GimbalState {
    fn default() -> Self {
        Self { version: 1, gimbal_range: 5.0 }
    }
}

impl PartState for GimbalState {
    fn encode(&self) -> Result<Vec<u8>, StateError> {
        bincode::serialize(self).map_err(|err| StateError::Encode(err.to_string()))
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

fn gimbal_codec() -> StateCodec {
    StateCodec {
        init: || Box::new(GimbalState::default()),
        decode: |bytes| {
            let state: GimbalState =
                bincode::deserialize(bytes).map_err(|err| StateError::Decode(err.to_string()))?;
            Ok(Box::new(state))
        },
    }
}

fn build_library() -> TemplateLibrary {
    let mut library = TemplateLibrary::new();

    library.register(
        PartTemplate::new("Hull", PartCategory::Fuselage)
            .with_default_compatible(PartCategory::ALL.to_vec())
            .with_bounds(Aabb::from_center_half_extents(Vec3::ZERO, Vec3::new(100.0, 40.0, 40.0)))
            .with_point(PointSpec::new(Vec3::new(100.0, 0.0, 0.0), Vec3::X))
            .with_point(PointSpec::new(Vec3::new(-100.0, 0.0, 0.0), Vec3::NEG_X))
            .with_point(PointSpec::new(Vec3::new(0.0, 40.0, 0.0), Vec3::Y)),
    );
    library.register(
        PartTemplate::new("Engine", PartCategory::Engine)
            .with_default_compatible(vec![PartCategory::Fuselage])
            .with_bounds(Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(30.0)))
            .with_point(PointSpec::new(Vec3::new(30.0, 0.0, 0.0), Vec3::X)),
    );
    library.register(
        PartTemplate::new("Thruster", PartCategory::Thruster)
            .with_default_compatible(vec![PartCategory::Fuselage])
            .with_bounds(Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(15.0)))
            .with_point(PointSpec::new(Vec3::new(0.0, -15.0, 0.0), Vec3::NEG_Y))
            .with_state(gimbal_codec()),
    );
    library.register(
        PartTemplate::new("Antenna", PartCategory::Accessory)
            .with_default_compatible(vec![PartCategory::Fuselage])
            .with_bounds(Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(5.0)))
            .with_point(PointSpec::new(Vec3::new(0.0, -5.0, 0.0), Vec3::NEG_Y)),
    );

    library
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();

    let library = build_library();
    let mut graph = AttachmentGraph::new();
    let mut controller = DragController::new();
    let mut highlight = NullHighlight;

    // Hull in the middle of the bay, engine spawned off to the side.
    graph.register_part(library.instantiate("Hull", Transform::IDENTITY)?);
    let engine = graph.register_part(
        library.instantiate("Engine", Transform::from_position(Vec3::new(-400.0, 0.0, 0.0)))?,
    );

    // Drag the engine toward the hull's rear point. The viewport camera
    // sits high above the bay; each frame aims the cursor ray a bit
    // closer to the hull until the snap takes over.
    let camera = Vec3::new(0.0, 5000.0, 0.0);
    controller.begin_drag(&graph, engine, &mut highlight)?;
    log::info!(
        "dragging engine with {} candidate joints",
        controller.candidate_pairs().len()
    );
    for step in 0..5 {
        let cursor_target = Vec3::new((-350.0 + 70.0 * step as f32).min(-140.0), 0.0, 0.0);
        let ray = Ray::from_points(camera, cursor_target);
        controller.update(&mut graph, ray, &mut highlight)?;
    }
    controller.release(&mut highlight);

    let engine_part = graph.part(engine).ok_or("engine part went missing")?;
    log::info!(
        "engine ended at {:?}, attached: {}",
        engine_part.transform().position.to_array(),
        engine_part.is_attached()
    );

    // Spawn an antenna, then think better of it.
    let antenna = graph.register_part(
        library.instantiate("Antenna", Transform::from_position(Vec3::new(0.0, 200.0, 0.0)))?,
    );
    controller.begin_drag(&graph, antenna, &mut highlight)?;
    controller.delete_held(&mut graph, &mut highlight)?;

    // A thruster with tuned state, left floating for now.
    let thruster = graph.register_part(
        library.instantiate("Thruster", Transform::from_position(Vec3::new(0.0, 120.0, 0.0)))?,
    );
    if let Some(part) = graph.part_mut(thruster) {
        if let Some(state) = part.state_mut().as_any_mut().downcast_mut::<GimbalState>() {
            state.gimbal_range = 12.5;
        }
    }

    // Persist, wipe the session, and bring it all back.
    let store = AssemblyStore::new(temp_dir().join("shipwright_demo")).with_format(StoreFormat::Json);
    let record = save_assembly("demo-ship", &graph)?;
    store.write(&record)?;
    log::info!("stored assemblies: {:?}", store.list_names()?);

    graph.clear();

    let record = store.read("demo-ship")?;
    let ids = load_assembly(&record, &library, &mut graph)?;
    let rebuilt = rebuild_pairings(&mut graph, &ids);
    log::info!(
        "reloaded '{}' with {} parts, {} pairings rebuilt",
        record.name,
        ids.len(),
        rebuilt
    );

    for part in graph.parts() {
        log::info!(
            "  {} ({}) at {:?} attached={}",
            part.id(),
            part.template_name(),
            part.transform().position.to_array(),
            part.is_attached()
        );
    }

    Ok(())
}
