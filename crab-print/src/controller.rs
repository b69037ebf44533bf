//! Print lifecycle controller
//!
//! Sequences one print operation over its own surface:
//!
//! ```text
//! Created -> StylesCopied -> Mounted -> ReadyToPrint -> Printing -> Released
//!    \____________\______________\___________\______________/
//!                         (any failure) -> Released
//! ```
//!
//! After the native trigger, the host's completion signal and a fallback
//! timer race; both end in the same guarded release. Some hosts never
//! signal completion for a print started from a nested context.

use std::sync::Arc;

use tracing::{debug, error, info, warn};

use crate::config::PrintConfig;
use crate::css::PrintCssInjector;
use crate::error::{HostError, PrintError, PrintFailure, PrintPhase, PrintResult};
use crate::guard::{ReleaseTrigger, Teardown};
use crate::host::{PrintHost, SurfaceId};
use crate::layout::EffectiveLayout;
use crate::mount::{RenderMount, Renderer};
use crate::request::{PrintJobId, PrintReceipt, RenderFn};
use crate::styles::StyleReplicator;
use crate::surface::{IsolationSurface, IsolationSurfaceFactory, SurfaceState};

/// Lifecycle of one print operation
///
/// A failure in any phase moves straight to `Released`; the phase itself
/// is reported through [`PrintFailure`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LifecycleState {
    Created,
    StylesCopied,
    Mounted,
    ReadyToPrint,
    Printing,
    Released,
}

pub struct PrintLifecycleController<H, R>
where
    H: PrintHost,
    R: Renderer,
{
    job_id: PrintJobId,
    layout: EffectiveLayout,
    state: LifecycleState,
    host: Arc<H>,
    mount: RenderMount<R>,
    config: Arc<PrintConfig>,
    teardown: Arc<Teardown<H, R>>,
    _abandon: ReleaseOnDrop<H, R>,
}

impl<H, R> PrintLifecycleController<H, R>
where
    H: PrintHost + Send + Sync + 'static,
    R: Renderer + Send + Sync + 'static,
{
    /// Take ownership of a freshly created surface
    pub fn new(
        job_id: PrintJobId,
        layout: EffectiveLayout,
        surface: IsolationSurface,
        factory: IsolationSurfaceFactory<H>,
        mount: RenderMount<R>,
        config: Arc<PrintConfig>,
    ) -> Self {
        let host = factory.host();
        let teardown = Arc::new(Teardown::new(surface, factory, mount.clone()));
        Self {
            job_id,
            layout,
            state: LifecycleState::Created,
            host,
            mount,
            config,
            _abandon: ReleaseOnDrop(Arc::clone(&teardown)),
            teardown,
        }
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    pub fn surface_id(&self) -> SurfaceId {
        self.teardown.surface_id()
    }

    /// Drive the operation to completion
    ///
    /// Whatever the outcome, the surface is released exactly once before
    /// this returns.
    pub async fn run(mut self, render: RenderFn) -> PrintResult<PrintReceipt> {
        match self.drive(render).await {
            Ok(released_by) => Ok(PrintReceipt::new(
                self.job_id,
                self.surface_id(),
                self.layout,
                released_by,
            )),
            Err(failure) => {
                error!(
                    job_id = %self.job_id,
                    phase = %failure.phase,
                    code = failure.code(),
                    error = %failure.source,
                    "Print failed"
                );
                self.teardown.release(ReleaseTrigger::Error);
                self.transition(LifecycleState::Released);
                Err(failure)
            }
        }
    }

    async fn drive(&mut self, render: RenderFn) -> PrintResult<ReleaseTrigger> {
        self.copy_styles()?;
        self.mount_tree(render)?;
        self.await_ready().await;
        self.trigger()?;
        Ok(self.await_release().await)
    }

    /// Created -> StylesCopied
    fn copy_styles(&mut self) -> PrintResult<()> {
        let id = self.surface_id();
        let fail = |e: HostError| {
            PrintFailure::new(PrintPhase::CopyStyles, PrintError::SurfaceInit(e.to_string()))
        };

        StyleReplicator::copy_styles(&*self.host, id).map_err(fail)?;
        // After the replicated nodes, so equal-specificity rules resolve in its favour
        PrintCssInjector::new(&self.config.overlay_selectors)
            .inject(&*self.host, id, &self.layout)
            .map_err(fail)?;

        self.teardown
            .with_surface(|s| s.advance(SurfaceState::StylesCopied));
        self.transition(LifecycleState::StylesCopied);
        Ok(())
    }

    /// StylesCopied -> Mounted
    fn mount_tree(&mut self, render: RenderFn) -> PrintResult<()> {
        let id = self.surface_id();
        let fail = |e: PrintError| PrintFailure::new(PrintPhase::Mount, e);

        let tree = render(&self.layout).map_err(|e| fail(PrintError::Render(format!("{e:#}"))))?;
        let handle = self.mount.mount(self.host.mount_target(id), tree).map_err(fail)?;

        let attached = self
            .teardown
            .with_surface(|s| s.set_mounted(handle.clone()));
        if !attached {
            self.mount.unmount(&handle);
            return Err(fail(PrintError::Render(format!(
                "{} left the mountable state",
                id
            ))));
        }

        self.transition(LifecycleState::Mounted);
        Ok(())
    }

    /// Mounted -> ReadyToPrint
    ///
    /// A host without a font signal counts as ready.
    async fn await_ready(&mut self) {
        let id = self.surface_id();

        for _ in 0..self.config.settle_frames() {
            self.host.next_frame().await;
        }

        match self.host.fonts_ready(id) {
            Some(fonts) => {
                if tokio::time::timeout(self.config.font_wait(), fonts)
                    .await
                    .is_err()
                {
                    warn!(
                        surface = %id,
                        wait_ms = self.config.font_wait_ms,
                        "Fonts not ready in time, printing anyway"
                    );
                }
            }
            None => debug!(surface = %id, "No font readiness signal"),
        }

        self.transition(LifecycleState::ReadyToPrint);
    }

    /// ReadyToPrint -> Printing
    fn trigger(&mut self) -> PrintResult<()> {
        let id = self.surface_id();
        let fail =
            |e: HostError| PrintFailure::new(PrintPhase::Trigger, PrintError::Trigger(e.to_string()));

        // Registered first: some hosts signal completion from inside `print`.
        // Weak so a listener the host keeps around never pins the host itself.
        let teardown = Arc::downgrade(&self.teardown);
        self.host.on_print_complete(
            id,
            Box::new(move || match teardown.upgrade() {
                Some(teardown) => {
                    teardown.release(ReleaseTrigger::Completion);
                }
                None => debug!(surface = %id, "Completion after the operation ended"),
            }),
        );

        self.host.focus(id).map_err(fail)?;
        self.host.print(id).map_err(fail)?;
        info!(job_id = %self.job_id, surface = %id, "Print handed off");

        self.transition(LifecycleState::Printing);
        Ok(())
    }

    /// Printing -> Released
    async fn await_release(&mut self) -> ReleaseTrigger {
        let teardown = Arc::clone(&self.teardown);

        tokio::select! {
            _ = teardown.released() => {}
            _ = tokio::time::sleep(self.config.fallback_delay()) => {
                if teardown.release(ReleaseTrigger::Fallback) {
                    debug!(surface = %teardown.surface_id(), "No completion signal, fallback released");
                }
            }
        }

        self.transition(LifecycleState::Released);
        teardown.released_by().unwrap_or(ReleaseTrigger::Fallback)
    }

    fn transition(&mut self, next: LifecycleState) {
        if next <= self.state {
            return;
        }
        debug!(job_id = %self.job_id, from = ?self.state, to = ?next, "Lifecycle state");
        self.state = next;
    }
}

/// Releases the surface if the controller is dropped before it settles
struct ReleaseOnDrop<H: PrintHost, R: Renderer>(Arc<Teardown<H, R>>);

impl<H: PrintHost, R: Renderer> Drop for ReleaseOnDrop<H, R> {
    fn drop(&mut self) {
        if !self.0.is_released() {
            warn!(surface = %self.0.surface_id(), "Print operation dropped before settling");
            self.0.release(ReleaseTrigger::Abandoned);
        }
    }
}
