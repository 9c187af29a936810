#![forbid(unsafe_code)]
#![deny(clippy::all)]
#![deny(deprecated)]

//!
//! Length-field resolution for generated syscall programs.
//!
//! A length field is a scalar argument whose value encodes the size, bit size,
//! element count or offset of another argument, named by a reference path in
//! its type. This crate locates those targets in a call's argument tree,
//! assigns the correct values, and mutates them into adversarial values when
//! corrupting a test case.

// Type descriptions and the reserved path keywords.
pub mod types;

// Argument tree, node identity, calls and programs.
pub mod primitives;

pub use primitives::*;

// Random sampling interface.
pub mod sampler;

pub mod config;

pub mod error;

// Parent index, path resolution, size assignment and size mutation.
pub mod size;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;
