//! Libris catalog application
//!
//! Authors, genres and books on top of the Libris module kernel. The book
//! module carries the duplicate and textbook-edition rules and the upload
//! acceptance check.

pub mod app;
pub mod modules;
pub mod utils;

pub use app::App;
