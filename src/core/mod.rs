//! Core data structures for Dockyard.
//!
//! This module contains the foundational types used throughout Dockyard:
//! - The `Dockyard.toml` manifest
//! - Declared targets and their kinds
//! - Components, the unit every exporter works on

pub mod component;
pub mod manifest;
pub mod target;

pub use component::{Component, Linkage, LinkedLibraries};
pub use manifest::{Manifest, MANIFEST_NAME};
pub use target::{Language, TargetDecl, TargetKind};
