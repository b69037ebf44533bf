//! Print service
//!
//! Entry point for callers. Every [`submit_print`](PrintService::submit_print)
//! call owns a fresh surface; concurrent calls share nothing but the host.

use std::sync::Arc;

use tracing::{Span, field, info, instrument, warn};

use crate::config::PrintConfig;
use crate::controller::PrintLifecycleController;
use crate::error::{PrintError, PrintFailure, PrintPhase, PrintResult};
use crate::host::{PrintHost, SurfaceOptions};
use crate::layout::LayoutResolver;
use crate::mount::{ProviderStack, RenderMount, Renderer};
use crate::request::{PrintJobId, PrintReceipt, PrintRequest};
use crate::surface::IsolationSurfaceFactory;

pub struct PrintService<H, R> {
    host: Arc<H>,
    renderer: Arc<R>,
    resolver: Arc<dyn LayoutResolver>,
    providers: Arc<ProviderStack>,
    config: Arc<PrintConfig>,
}

impl<H, R> Clone for PrintService<H, R> {
    fn clone(&self) -> Self {
        Self {
            host: Arc::clone(&self.host),
            renderer: Arc::clone(&self.renderer),
            resolver: Arc::clone(&self.resolver),
            providers: Arc::clone(&self.providers),
            config: Arc::clone(&self.config),
        }
    }
}

impl<H, R> PrintService<H, R>
where
    H: PrintHost + Send + Sync + 'static,
    R: Renderer + Send + Sync + 'static,
{
    pub fn new(host: Arc<H>, renderer: Arc<R>, resolver: impl LayoutResolver + 'static) -> Self {
        Self {
            host,
            renderer,
            resolver: Arc::new(resolver),
            providers: Arc::new(ProviderStack::new()),
            config: Arc::new(PrintConfig::default()),
        }
    }

    /// Context layers wrapped around every mounted tree
    pub fn with_providers(mut self, providers: ProviderStack) -> Self {
        self.providers = Arc::new(providers);
        self
    }

    pub fn with_config(mut self, config: PrintConfig) -> Self {
        self.config = Arc::new(config);
        self
    }

    pub fn config(&self) -> &PrintConfig {
        &self.config
    }

    /// Print one document through its own isolated surface
    ///
    /// Resolves once the document has been handed to the native print
    /// workflow and the surface released, or with the failing phase. No
    /// surface outlives the returned future, including when it is dropped.
    #[instrument(
        skip(self, request),
        fields(job_id = field::Empty, format = %request.format)
    )]
    pub async fn submit_print(&self, request: PrintRequest) -> PrintResult<PrintReceipt> {
        let job_id = PrintJobId::new();
        Span::current().record("job_id", field::display(job_id));

        let PrintRequest {
            format,
            title,
            paper_size_hint,
            render,
        } = request;

        let layout = self
            .resolver
            .resolve(format, paper_size_hint)
            .map_err(|e| {
                warn!(error = %e, hint = ?paper_size_hint, "Layout resolution failed");
                PrintFailure::new(
                    PrintPhase::ResolveLayout,
                    PrintError::LayoutResolution(e.to_string()),
                )
            })?;

        let title = title
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| self.config.default_title.clone());

        let factory = IsolationSurfaceFactory::new(Arc::clone(&self.host));
        let surface = factory
            .create(&SurfaceOptions::new(title))
            .await
            .map_err(|e| {
                warn!(error = %e, "Surface creation failed");
                PrintFailure::new(PrintPhase::CreateSurface, e)
            })?;
        info!(surface = %surface.id(), layout = ?layout, "Print surface ready");

        let mount = RenderMount::new(Arc::clone(&self.renderer), Arc::clone(&self.providers));
        PrintLifecycleController::new(
            job_id,
            layout,
            surface,
            factory,
            mount,
            Arc::clone(&self.config),
        )
        .run(render)
        .await
    }
}
