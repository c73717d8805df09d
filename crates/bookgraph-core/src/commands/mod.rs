//! Commands module - pipeline stages as library functions
//!
//! Each stage reads the previous stage's artifact for a book, does its work
//! and writes its own artifact. The CLI is a thin layer over these.

pub mod concepts;
pub mod edges;
pub mod graph;
pub mod prereqs;
