// Confluence Space Migrator - Core
//
// Copies spaces, page trees, attachments, comments and labels from one
// Confluence instance to another. Platform access sits behind the kernel
// traits; the migration engine only sees those traits.

pub mod common;
pub mod config;
pub mod kernel;
pub mod migration;

pub use config::*;
