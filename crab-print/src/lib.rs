//! # crab-print
//!
//! Isolated print orchestration for the POS front end.
//!
//! ## Scope
//!
//! This crate handles HOW a rendered document reaches the native print
//! dialog:
//! - One isolated surface per print call, destroyed exactly once
//! - Host stylesheet replication and page geometry CSS (58/80mm, A4/A5)
//! - Mounting the caller's tree under the shared context providers
//! - Completion signal raced against a fallback timer
//!
//! WHAT to print stays in application code: the caller passes a render
//! function that maps the resolved layout to a document tree.
//!
//! ## Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use crab_print::{Element, HeadlessHost, PaperSizeHint, PrintFormat, PrintRequest, PrintService, StaticLayoutResolver};
//!
//! let host = Arc::new(HeadlessHost::new());
//! let service = PrintService::new(host.clone(), host, StaticLayoutResolver::default());
//!
//! let request = PrintRequest::new(PrintFormat::Receipt, |layout| {
//!     Ok(Element::new("div").text(format!("{:?}", layout.receipt_width())).into())
//! })
//! .with_title("Mesa 12")
//! .with_paper_size_hint(PaperSizeHint::Mm58);
//!
//! let receipt = service.submit_print(request).await?;
//! ```

mod config;
mod controller;
mod css;
mod dom;
mod error;
mod guard;
mod headless;
mod host;
mod layout;
mod logger;
mod mount;
mod request;
mod service;
mod styles;
mod surface;

// Re-exports
pub use config::{MIN_SETTLE_FRAMES, PrintConfig};
pub use controller::{LifecycleState, PrintLifecycleController};
pub use css::{DEFAULT_OVERLAY_SELECTORS, PRINT_CSS_ID, PrintCssInjector, page_size, page_width};
pub use dom::{DocumentTree, Element, StyleNode};
pub use error::{HostError, PrintError, PrintFailure, PrintPhase, PrintResult};
pub use guard::{CleanupGuard, ReleaseTrigger, Teardown};
pub use headless::{
    CompletionMode, FontSignal, HeadlessHost, HeadlessOptions, HostEvent, HostStats, PrintedDocument,
    ROOT_CONTAINER,
};
pub use host::{
    CompletionCallback, MountTarget, PrintHost, SurfaceId, SurfaceOptions, ZERO_FOOTPRINT_STYLE,
};
pub use layout::{
    EffectiveLayout, LayoutError, LayoutResolver, PaperSizeHint, PrintFormat, ReceiptWidth,
    SheetSize, StaticLayoutResolver,
};
pub use logger::init_logger;
pub use mount::{Provider, ProviderStack, RenderHandle, RenderMount, Renderer};
pub use request::{PrintJobId, PrintReceipt, PrintRequest, RenderFn};
pub use service::PrintService;
pub use styles::StyleReplicator;
pub use surface::{IsolationSurface, IsolationSurfaceFactory, SurfaceState};
