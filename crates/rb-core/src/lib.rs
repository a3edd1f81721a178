//! rusty-board/crates/rb-core/src/lib.rs
//!
//! The central domain logic and interface definitions for Rusty-Board.

pub mod content;
pub mod error;
pub mod models;
pub mod threads;
pub mod traits;

// Re-exporting for easier access in other crates
pub use content::{classify_line, parse_body, parse_content, ClassifiedLine, LineKind};
pub use error::*;
pub use models::*;
pub use threads::{group_threads, ThreadGrouping, ThreadNode};
pub use traits::*;
