//! Shared Tokio runtime helper for integration tests.
//!
//! The harvester is blocking; only the Wiremock server needs async, so the
//! runtime is used to start servers, mount mocks and inspect requests.

use std::io;
use std::rc::Rc;

use tokio::runtime::Runtime;

/// Cloneable runtime handle that can be stored in an `rstest-bdd` Slot.
#[derive(Clone)]
pub struct SharedRuntime(Rc<Runtime>);

impl SharedRuntime {
    /// Wraps a runtime.
    pub fn new(runtime: Runtime) -> Self {
        Self(Rc::new(runtime))
    }

    /// Starts a fresh runtime.
    ///
    /// # Errors
    ///
    /// Returns an error if the Tokio runtime cannot be created.
    pub fn start() -> Result<Self, io::Error> {
        Ok(Self::new(Runtime::new()?))
    }

    /// Runs `future` to completion.
    pub fn block_on<F: std::future::Future>(&self, future: F) -> F::Output {
        self.0.block_on(future)
    }
}
