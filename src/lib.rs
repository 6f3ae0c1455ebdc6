//! R-Droid Packager
//!
//! Resolves the packaging profile of an Android app build: which variant is
//! built, with which versioned parameters, and whether a release signing
//! profile from `key.properties` is attached.
//!
//! ## Architecture
//!
//! - `r-droid-build-engine`: variants, parameters, credential loading and the resolver
//! - `commands`: the CLI commands built on top of it

#![warn(clippy::all)]

pub mod commands;
