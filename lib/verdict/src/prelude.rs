//! Prelude module for convenient imports.
//!
//! ```ignore
//! use verdict::prelude::*;
//! ```

pub use crate::{ClientConfig, HyperClient, RequestManager};
pub use verdict_core::prelude::*;
