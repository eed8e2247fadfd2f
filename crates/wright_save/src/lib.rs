//! # wright_save - Assembly persistence
//!
//! Converts an assembled structure into a storable record and back:
//! ordered part records with template references, world transforms, and
//! opaque per-part payloads. The on-disk layout is owned by
//! [`AssemblyStore`]; round-trip equivalence is the contract, not the
//! byte format.

pub mod records;
pub mod codec;
pub mod store;

pub use records::{AssemblyRecord, PartRecord, SaveError, FORMAT_VERSION};
pub use codec::{load_assembly, rebuild_pairings, save_assembly, COINCIDENT_DISTANCE};
pub use store::{AssemblyStore, StoreFormat};
