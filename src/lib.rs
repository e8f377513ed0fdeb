//! # Rigline - Declarative CI Pipeline Manifests
//!
//! Rigline parses a declarative pipeline-manifest document (build stages,
//! release targets, bots, triggers and version rules) into a validated,
//! typed in-memory model, and exposes a predicate engine that decides
//! whether an incoming runtime event should activate a pipeline, release
//! or bot.
//!
//! ## Quick Start
//!
//! ```
//! let manifest = rigline::read_manifest(
//!     None,
//!     r"
//! stages:
//!   build:
//!     image: golang:1.21-alpine
//!     commands:
//!     - go build ./...
//! ",
//!     true,
//! )
//! .unwrap();
//!
//! assert_eq!(manifest.stages[0].name, "build");
//! ```
//!
//! ## Features
//!
//! - **Order-preserving manifests**: name-keyed sections decode to ordered
//!   lists and re-encode losslessly
//! - **Release templates**: reusable default bundles with release-wins
//!   inheritance
//! - **Trigger matching**: pipeline, release, git, cron, pubsub, github and
//!   bitbucket event predicates with negatable regex filters
//! - **Version generation**: semantic versioning and custom templates with
//!   DNS-label sanitization
//!
//! ## License
//!
//! Licensed under either of
//! - Apache License, Version 2.0 ([LICENSE-APACHE](LICENSE-APACHE) or <https://www.apache.org/licenses/LICENSE-2.0>)
//! - MIT license ([LICENSE-MIT](LICENSE-MIT) or <https://opensource.org/licenses/MIT>)
//!
//! at your option.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![cfg_attr(test, allow(clippy::unwrap_used))]

pub mod manifest;

// Re-export commonly used types
pub use manifest::{
    Bot, Builder, Event, Manifest, ManifestError, Preferences, Release, ReleaseAction,
    ReleaseTemplate, Service, Stage, Trigger, TriggerContext, TriggerFilter, ValidationError,
    Version, VersionParams, exists, read_manifest, read_manifest_from_file,
};

/// Version of the rigline crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
