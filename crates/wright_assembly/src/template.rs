//! Part templates and the template library
//!
//! A template describes everything immutable about a kind of part: its
//! category, attach-point layout, snap settings, and the codec for its
//! opaque save payload. The library is the part-factory collaborator:
//! callers resolve a template by name and instantiate parts from it.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;
use wright_math::{Aabb, Transform, Vec3};

use crate::category::PartCategory;
use crate::part::Part;
use crate::point::AttachPoint;

/// Default snap threshold for new templates, in world units.
pub const DEFAULT_MIN_SNAP_DISTANCE: f32 = 50.0;

/// Payload codec errors
#[derive(Debug, Error)]
pub enum StateError {
    #[error("failed to encode part state: {0}")]
    Encode(String),
    #[error("failed to decode part state: {0}")]
    Decode(String),
    #[error("unsupported part state version: {0}")]
    UnsupportedVersion(u32),
}

/// Template lookup errors
#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("part template not found: {0}")]
    NotFound(String),
}

/// Internal state of a part, opaque to everything but its own codec.
///
/// Implementations own their byte layout, including versioning. The
/// persistence layer only ever sees the encoded bytes.
pub trait PartState: fmt::Debug + Send {
    /// Serialize the state to bytes
    fn encode(&self) -> Result<Vec<u8>, StateError>;

    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// State for parts with nothing to save beyond their transform.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmptyState;

impl PartState for EmptyState {
    fn encode(&self) -> Result<Vec<u8>, StateError> {
        Ok(Vec::new())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Per-template hooks producing and restoring a part's internal state.
#[derive(Clone, Copy, Debug)]
pub struct StateCodec {
    /// Fresh state for a newly instantiated part
    pub init: fn() -> Box<dyn PartState>,
    /// Restore state from a saved payload
    pub decode: fn(&[u8]) -> Result<Box<dyn PartState>, StateError>,
}

impl StateCodec {
    /// Codec for stateless parts
    pub fn none() -> Self {
        Self {
            init: || Box::new(EmptyState),
            decode: |_| Ok(Box::new(EmptyState)),
        }
    }
}

impl Default for StateCodec {
    fn default() -> Self {
        Self::none()
    }
}

/// Attach-point layout entry of a template.
#[derive(Clone, Debug)]
pub struct PointSpec {
    /// Position in part-local space
    pub position: Vec3,
    /// Outward normal in part-local space
    pub normal: Vec3,
    /// Compatibility override; empty inherits the template default
    pub compatible: Vec<PartCategory>,
}

impl PointSpec {
    pub fn new(position: Vec3, normal: Vec3) -> Self {
        Self {
            position,
            normal,
            compatible: Vec::new(),
        }
    }

    /// Override the inherited compatibility list
    pub fn with_compatible(mut self, compatible: Vec<PartCategory>) -> Self {
        self.compatible = compatible;
        self
    }
}

/// Immutable description of a kind of part.
#[derive(Clone, Debug)]
pub struct PartTemplate {
    pub name: String,
    pub category: PartCategory,
    /// Default compatibility for points without an override
    pub default_compatible: Vec<PartCategory>,
    /// How close a point must be to another before they snap together
    pub min_snap_distance: f32,
    /// Part-local bounds used for the snap broad phase
    pub bounds: Aabb,
    pub points: Vec<PointSpec>,
    pub state: StateCodec,
}

impl PartTemplate {
    pub fn new(name: impl Into<String>, category: PartCategory) -> Self {
        Self {
            name: name.into(),
            category,
            default_compatible: Vec::new(),
            min_snap_distance: DEFAULT_MIN_SNAP_DISTANCE,
            bounds: Aabb::from_center_half_extents(Vec3::ZERO, Vec3::splat(50.0)),
            points: Vec::new(),
            state: StateCodec::none(),
        }
    }

    /// Set the default compatibility list (builder pattern)
    pub fn with_default_compatible(mut self, compatible: Vec<PartCategory>) -> Self {
        self.default_compatible = compatible;
        self
    }

    /// Set the snap threshold (builder pattern)
    pub fn with_min_snap_distance(mut self, distance: f32) -> Self {
        self.min_snap_distance = distance;
        self
    }

    /// Set the local bounds (builder pattern)
    pub fn with_bounds(mut self, bounds: Aabb) -> Self {
        self.bounds = bounds;
        self
    }

    /// Add an attach point (builder pattern)
    pub fn with_point(mut self, point: PointSpec) -> Self {
        self.points.push(point);
        self
    }

    /// Set the payload codec (builder pattern)
    pub fn with_state(mut self, state: StateCodec) -> Self {
        self.state = state;
        self
    }

    /// Create a part from this template at the given transform.
    ///
    /// The part is not registered anywhere yet; its id stays null until
    /// [`crate::AttachmentGraph::register_part`] assigns one.
    pub fn instantiate(&self, transform: Transform) -> Part {
        self.build(transform, (self.state.init)())
    }

    /// Create a part and restore its internal state from a saved payload.
    pub fn instantiate_from_payload(
        &self,
        transform: Transform,
        payload: &[u8],
    ) -> Result<Part, StateError> {
        let state = (self.state.decode)(payload)?;
        Ok(self.build(transform, state))
    }

    fn build(&self, transform: Transform, state: Box<dyn PartState>) -> Part {
        let points = self
            .points
            .iter()
            .map(|spec| {
                let compatible = if spec.compatible.is_empty() {
                    self.default_compatible.clone()
                } else {
                    spec.compatible.clone()
                };
                AttachPoint::new(spec.position, spec.normal, compatible)
            })
            .collect();

        Part::new(
            self.name.clone(),
            self.category,
            transform,
            self.bounds,
            self.min_snap_distance,
            points,
            state,
        )
    }
}

/// Registry of part templates, keyed by name.
#[derive(Default)]
pub struct TemplateLibrary {
    templates: HashMap<String, Arc<PartTemplate>>,
}

impl TemplateLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template, replacing any previous one with the same name.
    pub fn register(&mut self, template: PartTemplate) {
        let name = template.name.clone();
        if self.templates.insert(name.clone(), Arc::new(template)).is_some() {
            log::warn!("replaced part template: {}", name);
        }
    }

    /// Look up a template by name.
    pub fn resolve(&self, name: &str) -> Option<Arc<PartTemplate>> {
        self.templates.get(name).cloned()
    }

    /// Resolve and instantiate in one step.
    pub fn instantiate(&self, name: &str, transform: Transform) -> Result<Part, TemplateError> {
        match self.resolve(name) {
            Some(template) => Ok(template.instantiate(transform)),
            None => {
                log::error!("failed to find template for part: {}", name);
                Err(TemplateError::NotFound(name.to_string()))
            }
        }
    }

    /// Registered template names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thruster_template() -> PartTemplate {
        PartTemplate::new("Thruster", PartCategory::Thruster)
            .with_default_compatible(vec![PartCategory::Fuselage])
            .with_point(PointSpec::new(Vec3::new(0.0, 0.0, 25.0), Vec3::Z))
            .with_point(
                PointSpec::new(Vec3::new(0.0, 0.0, -25.0), Vec3::NEG_Z)
                    .with_compatible(vec![PartCategory::Engine]),
            )
    }

    #[test]
    fn test_point_compatibility_inheritance() {
        let part = thruster_template().instantiate(Transform::IDENTITY);

        // First point inherits the template default, second keeps its override.
        assert!(part.points()[0].is_compatible_with(PartCategory::Fuselage));
        assert!(!part.points()[1].is_compatible_with(PartCategory::Fuselage));
        assert!(part.points()[1].is_compatible_with(PartCategory::Engine));
    }

    #[test]
    fn test_instantiate_unknown_template() {
        let library = TemplateLibrary::new();
        let result = library.instantiate("Missing", Transform::IDENTITY);
        assert!(matches!(result, Err(TemplateError::NotFound(_))));
    }

    #[test]
    fn test_library_resolve() {
        let mut library = TemplateLibrary::new();
        library.register(thruster_template());

        assert!(library.resolve("Thruster").is_some());
        assert!(library.resolve("Cockpit").is_none());
        assert_eq!(library.names(), vec!["Thruster"]);
    }
}
