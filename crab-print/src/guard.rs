//! Single-shot cleanup
//!
//! Every release path of a print operation (completion signal, fallback
//! timer, error, dropped future) ends in [`Teardown::release`]. The
//! [`CleanupGuard`] latch lets exactly one of them through.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;
use tracing::{debug, info};

use crate::host::{PrintHost, SurfaceId};
use crate::mount::{RenderMount, Renderer};
use crate::surface::{IsolationSurface, IsolationSurfaceFactory, SurfaceState};

/// Single-shot latch
#[derive(Debug, Default)]
pub struct CleanupGuard {
    fired: AtomicBool,
}

impl CleanupGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flip the latch; true only for the first caller
    pub fn try_fire(&self) -> bool {
        !self.fired.swap(true, Ordering::AcqRel)
    }

    pub fn is_fired(&self) -> bool {
        self.fired.load(Ordering::Acquire)
    }
}

/// What released a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReleaseTrigger {
    /// The host reported the print dialog finished
    Completion,
    /// The fallback timer after the print trigger
    Fallback,
    /// A phase failed
    Error,
    /// The operation was dropped before it settled
    Abandoned,
}

impl fmt::Display for ReleaseTrigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseTrigger::Completion => f.write_str("completion"),
            ReleaseTrigger::Fallback => f.write_str("fallback"),
            ReleaseTrigger::Error => f.write_str("error"),
            ReleaseTrigger::Abandoned => f.write_str("abandoned"),
        }
    }
}

/// Guarded release path of one print operation
///
/// Owns the operation's surface. Shared between the controller and the
/// completion listener registered with the host.
pub struct Teardown<H, R> {
    guard: CleanupGuard,
    surface_id: SurfaceId,
    surface: Mutex<IsolationSurface>,
    factory: IsolationSurfaceFactory<H>,
    mount: RenderMount<R>,
    released_by: Mutex<Option<ReleaseTrigger>>,
    released: Notify,
}

impl<H: PrintHost, R: Renderer> Teardown<H, R> {
    pub fn new(
        surface: IsolationSurface,
        factory: IsolationSurfaceFactory<H>,
        mount: RenderMount<R>,
    ) -> Self {
        Self {
            guard: CleanupGuard::new(),
            surface_id: surface.id(),
            surface: Mutex::new(surface),
            factory,
            mount,
            released_by: Mutex::new(None),
            released: Notify::new(),
        }
    }

    pub fn surface_id(&self) -> SurfaceId {
        self.surface_id
    }

    /// Run `f` against the owned surface
    pub fn with_surface<T>(&self, f: impl FnOnce(&mut IsolationSurface) -> T) -> T {
        f(&mut self.surface.lock())
    }

    /// Unmount and remove the surface; only the first call has effect
    pub fn release(&self, trigger: ReleaseTrigger) -> bool {
        if !self.guard.try_fire() {
            debug!(surface = %self.surface_id, %trigger, "Release already done, ignoring");
            return false;
        }

        {
            let mut surface = self.surface.lock();
            if let Some(handle) = surface.take_render_handle() {
                self.mount.unmount(&handle);
            }
            self.factory.destroy(self.surface_id);
            surface.advance(SurfaceState::Released);
        }

        *self.released_by.lock() = Some(trigger);
        info!(surface = %self.surface_id, %trigger, "Surface released");
        self.released.notify_one();
        true
    }

    pub fn is_released(&self) -> bool {
        self.guard.is_fired()
    }

    pub fn released_by(&self) -> Option<ReleaseTrigger> {
        *self.released_by.lock()
    }

    /// Resolve once a release has happened
    pub async fn released(&self) {
        if self.released_by().is_some() {
            return;
        }
        self.released.notified().await;
    }
}
