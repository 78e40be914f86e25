//! Artifact selection and fetch orchestration for precache.
//!
//! precache fetches a toolchain's platform binaries ahead of time. This crate
//! holds the part with real decisions in it:
//!
//! - [`catalog`] - the closed set of artifacts and their gating rules
//! - [`umbrella`] - umbrella flags that imply a group of artifacts
//! - [`flags`] - toggle values paired with whether the user typed them
//! - [`selection`] - which artifacts the user explicitly chose
//! - [`conflict`] - rejects `--no-<umbrella>` combined with a child flag
//! - [`resolver`] - the final set of artifacts to fetch
//! - [`orchestrator`] - drives an [`ArtifactCache`] through one fetch
//!
//! Everything up to the resolver is pure. Side effects live behind the
//! [`ArtifactCache`] trait, implemented by `precache-cache`.
//!
//! # Example
//!
//! ```ignore
//! use precache_core::{conflict, resolver, selection, UmbrellaSchema};
//!
//! let schema = UmbrellaSchema::load()?;
//! conflict::validate(&raw_args, &schema)?;
//! let explicit = selection::explicit_selections(&flags, &schema);
//! let required = resolver::resolve(&request);
//! ```

mod error;

pub mod cache;
pub mod catalog;
pub mod channel;
pub mod conflict;
pub mod flags;
pub mod orchestrator;
pub mod resolver;
pub mod selection;
pub mod umbrella;

pub use cache::{ArtifactCache, CacheSettings, UpdateReport};
pub use catalog::{Artifact, Feature};
pub use channel::{Channel, FeatureFlags};
pub use error::{Error, Result};
pub use flags::{FlagSet, FlagValue};
pub use orchestrator::{FetchOrchestrator, FetchOutcome, FetchRequest};
pub use resolver::{RequiredArtifactSet, ResolveRequest};
pub use umbrella::{UmbrellaGroup, UmbrellaSchema};
