//! The flat C ABI boundary.
//!
//! Everything callable from C lives here: `#[no_mangle] extern "C"` entry
//! points, the layout-mirrored `Keel*` structs, opaque handle types, and the
//! callback-table adapters. The layer performs no simulation of its own;
//! every function converts its arguments through the accessor layer and
//! forwards to the core.
//!
//! Conventions, shared by the whole surface:
//! - Handles are raw pointers. Reference-counted objects (shapes, settings,
//!   constraints) are freed by their `release` call, never directly.
//! - Creation failures return null; callers must null-check before use.
//! - Null required arguments and kind-mismatched handles are contract
//!   violations checked by debug assertions, not recoverable errors.
//! - Out-parameters are caller-allocated; `load`/`store` marshalling is
//!   bit-exact.

pub mod bridge;
pub mod convert;
pub mod init;
pub mod types;
pub mod vec;

pub mod body_api;
pub mod character_api;
pub mod constraint_api;
pub mod shape_api;
pub mod system_api;

pub use body_api::*;
pub use character_api::*;
pub use constraint_api::*;
pub use init::*;
pub use shape_api::*;
pub use system_api::*;
pub use types::*;
