//! Test infrastructure for the search core.
//!
//! Fixtures for resources, request contexts and paging caches with
//! scripted behavior.

#![allow(dead_code)]

pub mod caches;
pub mod fixtures;

pub use caches::*;
pub use fixtures::*;
