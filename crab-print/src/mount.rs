//! Render mounting
//!
//! The caller's tree is always wrapped in the host application's provider
//! stack before it reaches the renderer, so a document printed from an
//! isolated surface sees the same theme, tenant, session and feedback
//! context as the live page.

use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::dom::{DocumentTree, Element};
use crate::error::PrintError;
use crate::host::{MountTarget, SurfaceId};

/// A wrapper around the render tree
pub type Provider = Arc<dyn Fn(DocumentTree) -> DocumentTree + Send + Sync>;

/// Ordered provider composition; the first layer is the outermost
#[derive(Clone, Default)]
pub struct ProviderStack {
    layers: Vec<(String, Provider)>,
}

impl ProviderStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a layer inside the existing ones
    pub fn with<F>(mut self, name: impl Into<String>, wrap: F) -> Self
    where
        F: Fn(DocumentTree) -> DocumentTree + Send + Sync + 'static,
    {
        self.layers.push((name.into(), Arc::new(wrap)));
        self
    }

    /// Add a layer that wraps the tree in a `data-provider` element carrying `attrs`
    pub fn with_context(self, name: &str, attrs: &[(&str, &str)]) -> Self {
        let provider = name.to_string();
        let attrs: Vec<(String, String)> = attrs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        self.with(name, move |tree| {
            let mut el = Element::new("div").attr("data-provider", provider.as_str());
            for (k, v) in &attrs {
                el = el.attr(k.as_str(), v.as_str());
            }
            el.child(tree).into()
        })
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.layers.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    /// Apply every layer around `tree`
    pub fn wrap(&self, tree: DocumentTree) -> DocumentTree {
        self.layers
            .iter()
            .rev()
            .fold(tree, |inner, (_, provider)| provider(inner))
    }
}

impl fmt::Debug for ProviderStack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}

/// Handle to a mounted tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderHandle {
    pub id: u64,
    pub surface: SurfaceId,
}

/// UI framework seam
pub trait Renderer {
    /// Attach `tree` to `target` and return a disposable handle
    fn mount(&self, target: &MountTarget, tree: DocumentTree) -> anyhow::Result<RenderHandle>;

    /// Release framework resources held for `handle`
    fn unmount(&self, handle: &RenderHandle);
}

/// Mounts provider-wrapped trees through a [`Renderer`]
///
/// Does not guard against double unmount; the lifecycle's cleanup guard does.
pub struct RenderMount<R> {
    renderer: Arc<R>,
    providers: Arc<ProviderStack>,
}

impl<R> Clone for RenderMount<R> {
    fn clone(&self) -> Self {
        Self {
            renderer: Arc::clone(&self.renderer),
            providers: Arc::clone(&self.providers),
        }
    }
}

impl<R: Renderer> RenderMount<R> {
    pub fn new(renderer: Arc<R>, providers: Arc<ProviderStack>) -> Self {
        Self {
            renderer,
            providers,
        }
    }

    pub fn mount(
        &self,
        target: Option<MountTarget>,
        tree: DocumentTree,
    ) -> Result<RenderHandle, PrintError> {
        let target = target.ok_or(PrintError::MountTargetMissing)?;
        let wrapped = self.providers.wrap(tree);
        let handle = self
            .renderer
            .mount(&target, wrapped)
            .map_err(|e| PrintError::Render(format!("{e:#}")))?;
        debug!(surface = %target.surface, handle = handle.id, providers = self.providers.len(), "Tree mounted");
        Ok(handle)
    }

    pub fn unmount(&self, handle: &RenderHandle) {
        self.renderer.unmount(handle);
        debug!(surface = %handle.surface, handle = handle.id, "Tree unmounted");
    }
}
