//! Reading and writing target documents.
//!
//! The merge engine itself never performs I/O. These traits are the single
//! boundary around it: one read before merging, one write after.

mod resource;

pub use resource::{FsResources, MemoryResources, ResourceReader, ResourceWriter};
