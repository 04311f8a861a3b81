//! Read-only access to database files in the SQLite page-oriented b-tree format.
//!
//! The storage core lives in [`types`] (codecs, cells, pages) and [`storage`]
//! (page reader, b-tree traversal, schema catalog). [`planner`] and [`executor`]
//! turn a single-table `SELECT` into calls against that core.

pub mod executor;
pub mod planner;
pub mod storage;
pub mod types;
pub mod utils;
