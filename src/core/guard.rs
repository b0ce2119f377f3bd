//! Scoped ownership of an environment.
//!
//! An `EnvironmentGuard` holds the only handle to an environment and tears it
//! down when dropped: on normal return, on `?` early return, and while
//! unwinding from a panic. `release` does the same explicitly and reports
//! the teardown result.

use std::ops::{Deref, DerefMut};

use tracing::error;

use crate::core::exec::Executor;
use crate::core::lifecycle::{EnvironmentHandle, Lifecycle};
use crate::core::types::LifecycleState;
use crate::error::Result;

/// Owns an `EnvironmentHandle` and guarantees its teardown.
pub struct EnvironmentGuard<'a, E: Executor> {
    lifecycle: &'a Lifecycle<E>,
    handle: EnvironmentHandle,
}

impl<'a, E: Executor> EnvironmentGuard<'a, E> {
    /// Take ownership of `handle`; teardown is armed from this point on.
    pub fn arm(lifecycle: &'a Lifecycle<E>, handle: EnvironmentHandle) -> Self {
        Self { lifecycle, handle }
    }

    /// Tear down now and surface the result.
    ///
    /// # Errors
    ///
    /// Returns the teardown error; the handle is torn down either way and the
    /// drop that follows does nothing.
    pub fn release(mut self) -> Result<()> {
        self.lifecycle.teardown(&mut self.handle)
    }
}

impl<E: Executor> Deref for EnvironmentGuard<'_, E> {
    type Target = EnvironmentHandle;

    fn deref(&self) -> &Self::Target {
        &self.handle
    }
}

impl<E: Executor> DerefMut for EnvironmentGuard<'_, E> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.handle
    }
}

impl<E: Executor> Drop for EnvironmentGuard<'_, E> {
    fn drop(&mut self) {
        if self.handle.state() == LifecycleState::TornDown {
            return;
        }
        if let Err(e) = self.lifecycle.teardown(&mut self.handle) {
            error!(cluster = %self.handle.name(), error = %e, "teardown failed");
        }
    }
}
