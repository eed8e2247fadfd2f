//! # wright_assembly - Part assembly core
//!
//! Parts with directional attach points, the attachment graph that owns
//! them and enforces the pairing invariants, per-frame snap matching for
//! interactive placement, and the drag state machine that ties them
//! together.
//!
//! Rendering, input devices, and asset discovery live outside this crate;
//! they talk to it through [`HighlightSink`], [`wright_math::Ray`], and
//! [`TemplateLibrary`].

pub mod category;
pub mod id;
pub mod point;
pub mod part;
pub mod template;
pub mod graph;
pub mod snap;
pub mod drag;

pub use category::PartCategory;
pub use id::{PartId, PointRef};
pub use point::AttachPoint;
pub use part::Part;
pub use template::{
    EmptyState, PartState, PartTemplate, PointSpec, StateCodec, StateError, TemplateError,
    TemplateLibrary,
};
pub use graph::{AttachmentGraph, GraphError};
pub use snap::{
    collect_compatible_pairs, find_points_to_snap, CandidatePair, SnapCache,
    OPPOSED_NORMAL_TOLERANCE,
};
pub use drag::{DragController, DragError, HighlightSink, NullHighlight};
