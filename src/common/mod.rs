//! Common types, traits, and error definitions for drivetrain_latency
//!
//! This module provides the foundational building blocks shared by the
//! control and simulation modules.

pub mod types;
pub mod traits;
pub mod error;

pub use types::*;
pub use traits::*;
pub use error::*;
