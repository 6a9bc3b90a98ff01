//! Document-level guards run before execution

mod depth;

pub use depth::{DepthExceeded, DepthGuard};
