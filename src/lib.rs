//! Dockyard - project exporters for observed C/C++ builds
//!
//! A build pass is observed task by task into a catalog of components,
//! frozen into an immutable [`ExportModel`](model::ExportModel), and handed
//! to the exporters (Makefile, Code::Blocks, Eclipse CDT), the cppcheck
//! report writer and the packager.

pub mod catalog;
pub mod core;
pub mod cppcheck;
pub mod export;
pub mod model;
pub mod observe;
pub mod ops;
pub mod package;
pub mod util;

pub use core::{Component, Manifest, TargetKind};
pub use model::ExportModel;
pub use util::context::GlobalContext;
