//! Host adapter
//!
//! The page hosting the application (a webview, a browser tab) is reached
//! through [`PrintHost`]. Everything the pipeline touches outside its own
//! memory goes through this trait:
//! - the host document's stylesheet list (read-only)
//! - attaching and removing isolated surfaces
//! - animation frames and font readiness
//! - the native print trigger and its completion signal

use std::fmt;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};

use crate::dom::StyleNode;
use crate::error::HostError;

/// Identifier of an isolated surface attached to the host page
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SurfaceId(u64);

impl SurfaceId {
    pub fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for SurfaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "surface-{}", self.0)
    }
}

/// Inline style keeping the surface off screen with no footprint
pub const ZERO_FOOTPRINT_STYLE: &str =
    "position:fixed;right:0;bottom:0;width:0;height:0;border:0;visibility:hidden;";

/// Options for attaching a surface
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SurfaceOptions {
    /// Title of the nested document (used as the print job name)
    pub title: String,
    /// Inline style of the host node
    pub style: String,
    /// Hidden from assistive technology
    pub aria_hidden: bool,
    /// Excluded from keyboard focus order
    pub tab_index: i32,
}

impl SurfaceOptions {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            style: ZERO_FOOTPRINT_STYLE.to_string(),
            aria_hidden: true,
            tab_index: -1,
        }
    }
}

/// Container inside a surface's document that a renderer mounts into
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountTarget {
    pub surface: SurfaceId,
    pub container: String,
}

/// Callback invoked when the host reports the print dialog finished
pub type CompletionCallback = Box<dyn FnOnce() + Send + 'static>;

/// Trait for host page adapters
#[allow(async_fn_in_trait)]
pub trait PrintHost {
    /// Snapshot of the host document's stylesheet nodes, in document order
    fn host_styles(&self) -> Vec<StyleNode>;

    /// Attach a zero-footprint nested context to the page
    ///
    /// Must fail fast when the environment cannot create one.
    fn attach_surface(&self, options: &SurfaceOptions) -> Result<SurfaceId, HostError>;

    /// Wait until the nested document reports load readiness
    async fn wait_loaded(&self, surface: SurfaceId) -> Result<(), HostError>;

    /// Remove the surface node; returns false if it was already gone
    fn remove_surface(&self, surface: SurfaceId) -> bool;

    /// Append a style node to the end of the surface document's head
    fn append_style(&self, surface: SurfaceId, node: StyleNode) -> Result<(), HostError>;

    /// Render container of the surface document, if it has one
    fn mount_target(&self, surface: SurfaceId) -> Option<MountTarget>;

    /// Resolve at the next animation-frame boundary
    async fn next_frame(&self);

    /// Font readiness signal of the surface document, when the host has one
    fn fonts_ready(&self, surface: SurfaceId) -> Option<BoxFuture<'static, ()>>;

    fn focus(&self, surface: SurfaceId) -> Result<(), HostError>;

    /// Invoke the native print trigger synchronously
    fn print(&self, surface: SurfaceId) -> Result<(), HostError>;

    /// Register the print completion listener of the surface
    ///
    /// Hosts may never call it, or call it after the surface is gone.
    fn on_print_complete(&self, surface: SurfaceId, callback: CompletionCallback);
}
