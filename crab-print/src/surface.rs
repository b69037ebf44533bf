//! Isolated surfaces
//!
//! One surface per print operation, never reused. Its state only moves
//! forward and `Released` is terminal.

use std::sync::Arc;

use tracing::{debug, instrument, warn};

use crate::error::PrintError;
use crate::host::{PrintHost, SurfaceId, SurfaceOptions};
use crate::mount::RenderHandle;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SurfaceState {
    Created,
    StylesCopied,
    Mounted,
    Released,
}

#[derive(Debug)]
pub struct IsolationSurface {
    id: SurfaceId,
    state: SurfaceState,
    render_handle: Option<RenderHandle>,
}

impl IsolationSurface {
    fn new(id: SurfaceId) -> Self {
        Self {
            id,
            state: SurfaceState::Created,
            render_handle: None,
        }
    }

    pub fn id(&self) -> SurfaceId {
        self.id
    }

    pub fn state(&self) -> SurfaceState {
        self.state
    }

    pub fn is_released(&self) -> bool {
        self.state == SurfaceState::Released
    }

    /// Move to `next` if it lies ahead of the current state
    pub fn advance(&mut self, next: SurfaceState) -> bool {
        if next <= self.state {
            warn!(surface = %self.id, from = ?self.state, to = ?next, "Rejected backward surface transition");
            return false;
        }
        debug!(surface = %self.id, from = ?self.state, to = ?next, "Surface state");
        self.state = next;
        true
    }

    /// Record the mounted tree and move to `Mounted`
    pub fn set_mounted(&mut self, handle: RenderHandle) -> bool {
        if !self.advance(SurfaceState::Mounted) {
            return false;
        }
        self.render_handle = Some(handle);
        true
    }

    pub fn render_handle(&self) -> Option<&RenderHandle> {
        self.render_handle.as_ref()
    }

    pub(crate) fn take_render_handle(&mut self) -> Option<RenderHandle> {
        self.render_handle.take()
    }
}

/// Creates and destroys isolated surfaces on the host page
pub struct IsolationSurfaceFactory<H> {
    host: Arc<H>,
}

impl<H> Clone for IsolationSurfaceFactory<H> {
    fn clone(&self) -> Self {
        Self {
            host: Arc::clone(&self.host),
        }
    }
}

impl<H: PrintHost> IsolationSurfaceFactory<H> {
    pub fn new(host: Arc<H>) -> Self {
        Self { host }
    }

    pub fn host(&self) -> Arc<H> {
        Arc::clone(&self.host)
    }

    /// Attach a surface and wait until it reports load readiness
    ///
    /// On failure nothing stays attached to the host page.
    #[instrument(skip(self, options), fields(title = %options.title))]
    pub async fn create(&self, options: &SurfaceOptions) -> Result<IsolationSurface, PrintError> {
        let id = self
            .host
            .attach_surface(options)
            .map_err(|e| PrintError::SurfaceInit(e.to_string()))?;

        // Removes the node if this future is dropped while loading
        let mut pending = PendingSurface {
            factory: self,
            id: Some(id),
        };

        if let Err(e) = self.host.wait_loaded(id).await {
            warn!(surface = %id, error = %e, "Surface failed to load");
            return Err(PrintError::SurfaceInit(e.to_string()));
        }

        pending.id = None;
        debug!(surface = %id, "Surface loaded");
        Ok(IsolationSurface::new(id))
    }

    /// Remove the surface node; safe to call more than once
    pub fn destroy(&self, id: SurfaceId) -> bool {
        let removed = self.host.remove_surface(id);
        if removed {
            debug!(surface = %id, "Surface removed");
        }
        removed
    }
}

struct PendingSurface<'a, H: PrintHost> {
    factory: &'a IsolationSurfaceFactory<H>,
    id: Option<SurfaceId>,
}

impl<H: PrintHost> Drop for PendingSurface<'_, H> {
    fn drop(&mut self) {
        if let Some(id) = self.id.take() {
            self.factory.destroy(id);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::headless::{HeadlessHost, HeadlessOptions};

    #[test]
    fn test_state_only_moves_forward() {
        let mut surface = IsolationSurface::new(SurfaceId::new(1));
        assert!(surface.advance(SurfaceState::StylesCopied));
        assert!(!surface.advance(SurfaceState::Created));
        assert!(surface.advance(SurfaceState::Released));
        assert!(!surface.advance(SurfaceState::Mounted));
        assert!(surface.is_released());
    }

    #[tokio::test]
    async fn test_create_then_destroy_twice() {
        let host = Arc::new(HeadlessHost::new());
        let factory = IsolationSurfaceFactory::new(Arc::clone(&host));

        let surface = factory.create(&SurfaceOptions::new("t")).await.unwrap();
        assert_eq!(surface.state(), SurfaceState::Created);
        assert_eq!(host.surface_count(), 1);

        assert!(factory.destroy(surface.id()));
        assert!(!factory.destroy(surface.id()));
        assert_eq!(host.surface_count(), 0);
        assert_eq!(host.stats().removed, 1);
    }

    #[tokio::test]
    async fn test_unsupported_environment_fails_fast() {
        let host = Arc::new(HeadlessHost::with_options(HeadlessOptions {
            unsupported: true,
            ..Default::default()
        }));
        let factory = IsolationSurfaceFactory::new(Arc::clone(&host));

        let err = factory.create(&SurfaceOptions::new("t")).await.unwrap_err();
        assert!(matches!(err, PrintError::SurfaceInit(_)));
        assert_eq!(host.stats().attached, 0);
    }

    #[tokio::test]
    async fn test_load_failure_detaches_node() {
        let host = Arc::new(HeadlessHost::with_options(HeadlessOptions {
            fail_load: true,
            ..Default::default()
        }));
        let factory = IsolationSurfaceFactory::new(Arc::clone(&host));

        let err = factory.create(&SurfaceOptions::new("t")).await.unwrap_err();
        assert!(matches!(err, PrintError::SurfaceInit(_)));
        assert_eq!(host.stats().attached, 1);
        assert_eq!(host.surface_count(), 0);
    }
}
