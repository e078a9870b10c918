#![allow(unused_crate_dependencies)]

//! Shared harness for the stitching end-to-end tests: a blocking runtime,
//! the mock upstream schemas, and the stitched schema the scenarios run
//! against.

pub mod mocks;
pub mod stitched;

use std::sync::OnceLock;

use tokio::runtime::Runtime;

pub use stitched::stitched_schema;

/// The shared test runtime.
pub fn runtime() -> &'static Runtime {
    static RUNTIME: OnceLock<Runtime> = OnceLock::new();
    RUNTIME.get_or_init(|| Runtime::new().unwrap())
}
