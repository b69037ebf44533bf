//! In-memory host
//!
//! [`HeadlessHost`] implements [`PrintHost`] and [`Renderer`] without a
//! browser. It keeps the host document's style list, every attached
//! surface with its head and mounted body, and a snapshot of each document
//! at the moment the print trigger ran. Failure modes of real hosts are
//! switched on through [`HeadlessOptions`].

use std::collections::{BTreeMap, HashMap};

use futures::FutureExt;
use futures::future::BoxFuture;
use parking_lot::Mutex;
use tracing::debug;

use crate::css::PRINT_CSS_ID;
use crate::dom::{DocumentTree, StyleNode};
use crate::error::HostError;
use crate::host::{CompletionCallback, MountTarget, PrintHost, SurfaceId, SurfaceOptions};
use crate::mount::{RenderHandle, Renderer};

/// Container id of the render root inside each surface document
pub const ROOT_CONTAINER: &str = "print-root";

/// When the host reports print completion
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CompletionMode {
    /// From inside `print`, before it returns
    Immediate,
    /// Held until [`HeadlessHost::fire_print_complete`]; removing the
    /// surface discards it
    #[default]
    Manual,
    /// Never
    Never,
}

/// Font readiness signal of surface documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FontSignal {
    /// The host has no such signal
    Absent,
    /// Already resolved
    #[default]
    Ready,
    /// Never resolves
    Never,
}

#[derive(Debug, Clone, Default)]
pub struct HeadlessOptions {
    /// Refuse to attach surfaces
    pub unsupported: bool,
    /// Attach, then fail the load
    pub fail_load: bool,
    /// Surface documents have no render container
    pub missing_mount_target: bool,
    /// The renderer throws on mount
    pub fail_render: bool,
    /// The native print trigger refuses to run
    pub fail_print: bool,
    pub completion: CompletionMode,
    pub fonts: FontSignal,
}

/// Call counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HostStats {
    pub attached: u64,
    pub removed: u64,
    pub mounted: u64,
    pub unmounted: u64,
    pub prints: u64,
    pub frames: u64,
}

/// Surface document captured when the print trigger ran
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrintedDocument {
    pub surface: SurfaceId,
    pub title: String,
    pub head: Vec<StyleNode>,
    pub body: Option<String>,
    pub focused: bool,
    /// Animation frames that elapsed between attach and print
    pub frames_before_print: u64,
}

impl PrintedDocument {
    /// The injected page geometry stylesheet
    pub fn print_css(&self) -> Option<&str> {
        self.head
            .iter()
            .find(|node| node.id() == Some(PRINT_CSS_ID))
            .and_then(StyleNode::css)
    }

    /// Position of the injected stylesheet in the head
    pub fn print_css_position(&self) -> Option<usize> {
        self.head
            .iter()
            .position(|node| node.id() == Some(PRINT_CSS_ID))
    }
}

/// Page mutation observed by the host, in call order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    Attached(SurfaceId),
    Mounted(SurfaceId),
    Printed(SurfaceId),
    Unmounted(SurfaceId),
    Removed(SurfaceId),
}

#[derive(Debug)]
struct SurfaceRecord {
    options: SurfaceOptions,
    loaded: bool,
    head: Vec<StyleNode>,
    body: Option<String>,
    focused: bool,
    frames_at_attach: u64,
}

#[derive(Default)]
struct HeadlessState {
    host_styles: Vec<StyleNode>,
    surfaces: BTreeMap<SurfaceId, SurfaceRecord>,
    mounts: HashMap<u64, SurfaceId>,
    listeners: HashMap<SurfaceId, Vec<CompletionCallback>>,
    printed: Vec<PrintedDocument>,
    events: Vec<HostEvent>,
    stats: HostStats,
    next_surface: u64,
    next_handle: u64,
}

pub struct HeadlessHost {
    options: HeadlessOptions,
    state: Mutex<HeadlessState>,
}

impl HeadlessHost {
    pub fn new() -> Self {
        Self::with_options(HeadlessOptions::default())
    }

    pub fn with_options(options: HeadlessOptions) -> Self {
        Self {
            options,
            state: Mutex::new(HeadlessState::default()),
        }
    }

    /// Set the host document's stylesheet list
    pub fn with_styles(self, styles: Vec<StyleNode>) -> Self {
        self.state.lock().host_styles = styles;
        self
    }

    /// Number of surfaces currently attached to the page
    pub fn surface_count(&self) -> usize {
        self.state.lock().surfaces.len()
    }

    pub fn stats(&self) -> HostStats {
        self.state.lock().stats
    }

    pub fn printed(&self) -> Vec<PrintedDocument> {
        self.state.lock().printed.clone()
    }

    pub fn events(&self) -> Vec<HostEvent> {
        self.state.lock().events.clone()
    }

    /// Completion listeners still registered, across all surfaces
    pub fn listener_count(&self) -> usize {
        self.state.lock().listeners.values().map(Vec::len).sum()
    }

    /// Current head of an attached surface
    pub fn surface_head(&self, surface: SurfaceId) -> Option<Vec<StyleNode>> {
        self.state
            .lock()
            .surfaces
            .get(&surface)
            .map(|record| record.head.clone())
    }

    /// Deliver the completion signal of every printed surface still listening
    ///
    /// Returns the number of callbacks invoked.
    pub fn fire_print_complete(&self) -> usize {
        let callbacks: Vec<CompletionCallback> = {
            let mut state = self.state.lock();
            let printed: Vec<SurfaceId> = state.printed.iter().map(|doc| doc.surface).collect();
            printed
                .into_iter()
                .filter_map(|id| state.listeners.remove(&id))
                .flatten()
                .collect()
        };
        let count = callbacks.len();
        for callback in callbacks {
            callback();
        }
        count
    }
}

impl Default for HeadlessHost {
    fn default() -> Self {
        Self::new()
    }
}

impl PrintHost for HeadlessHost {
    fn host_styles(&self) -> Vec<StyleNode> {
        self.state.lock().host_styles.clone()
    }

    fn attach_surface(&self, options: &SurfaceOptions) -> Result<SurfaceId, HostError> {
        if self.options.unsupported {
            return Err(HostError::Unsupported(
                "nested browsing contexts are not available".into(),
            ));
        }
        let mut state = self.state.lock();
        state.next_surface += 1;
        let id = SurfaceId::new(state.next_surface);
        let frames_at_attach = state.stats.frames;
        state.surfaces.insert(
            id,
            SurfaceRecord {
                options: options.clone(),
                loaded: false,
                head: Vec::new(),
                body: None,
                focused: false,
                frames_at_attach,
            },
        );
        state.stats.attached += 1;
        state.events.push(HostEvent::Attached(id));
        debug!(surface = %id, "Headless surface attached");
        Ok(id)
    }

    async fn wait_loaded(&self, surface: SurfaceId) -> Result<(), HostError> {
        tokio::task::yield_now().await;
        if self.options.fail_load {
            return Err(HostError::LoadFailed("about:blank did not load".into()));
        }
        let mut state = self.state.lock();
        let record = state
            .surfaces
            .get_mut(&surface)
            .ok_or(HostError::SurfaceGone(surface))?;
        record.loaded = true;
        Ok(())
    }

    fn remove_surface(&self, surface: SurfaceId) -> bool {
        // Listeners go with the nested document, dropped after the lock
        let _listeners = {
            let mut state = self.state.lock();
            if state.surfaces.remove(&surface).is_none() {
                return false;
            }
            state.stats.removed += 1;
            state.events.push(HostEvent::Removed(surface));
            state.listeners.remove(&surface)
        };
        true
    }

    fn append_style(&self, surface: SurfaceId, node: StyleNode) -> Result<(), HostError> {
        let mut state = self.state.lock();
        let record = state
            .surfaces
            .get_mut(&surface)
            .ok_or(HostError::SurfaceGone(surface))?;
        record.head.push(node);
        Ok(())
    }

    fn mount_target(&self, surface: SurfaceId) -> Option<MountTarget> {
        if self.options.missing_mount_target {
            return None;
        }
        let state = self.state.lock();
        state
            .surfaces
            .get(&surface)
            .filter(|record| record.loaded)
            .map(|_| MountTarget {
                surface,
                container: ROOT_CONTAINER.to_string(),
            })
    }

    async fn next_frame(&self) {
        tokio::task::yield_now().await;
        self.state.lock().stats.frames += 1;
    }

    fn fonts_ready(&self, _surface: SurfaceId) -> Option<BoxFuture<'static, ()>> {
        match self.options.fonts {
            FontSignal::Absent => None,
            FontSignal::Ready => Some(futures::future::ready(()).boxed()),
            FontSignal::Never => Some(futures::future::pending::<()>().boxed()),
        }
    }

    fn focus(&self, surface: SurfaceId) -> Result<(), HostError> {
        let mut state = self.state.lock();
        let record = state
            .surfaces
            .get_mut(&surface)
            .ok_or(HostError::SurfaceGone(surface))?;
        record.focused = true;
        Ok(())
    }

    fn print(&self, surface: SurfaceId) -> Result<(), HostError> {
        let immediate = {
            let mut state = self.state.lock();
            if self.options.fail_print {
                return Err(HostError::PrintUnavailable("print() is blocked".into()));
            }
            let frames = state.stats.frames;
            let record = state
                .surfaces
                .get(&surface)
                .ok_or(HostError::SurfaceGone(surface))?;
            let document = PrintedDocument {
                surface,
                title: record.options.title.clone(),
                head: record.head.clone(),
                body: record.body.clone(),
                focused: record.focused,
                frames_before_print: frames - record.frames_at_attach,
            };
            state.printed.push(document);
            state.stats.prints += 1;
            state.events.push(HostEvent::Printed(surface));

            match self.options.completion {
                CompletionMode::Immediate => state.listeners.remove(&surface).unwrap_or_default(),
                CompletionMode::Manual | CompletionMode::Never => Vec::new(),
            }
        };

        for callback in immediate {
            callback();
        }
        Ok(())
    }

    fn on_print_complete(&self, surface: SurfaceId, callback: CompletionCallback) {
        if self.options.completion == CompletionMode::Never {
            return;
        }
        self.state
            .lock()
            .listeners
            .entry(surface)
            .or_default()
            .push(callback);
    }
}

impl Renderer for HeadlessHost {
    fn mount(&self, target: &MountTarget, tree: DocumentTree) -> anyhow::Result<RenderHandle> {
        if self.options.fail_render {
            anyhow::bail!("renderer rejected the tree");
        }
        let mut state = self.state.lock();
        if target.container != ROOT_CONTAINER {
            anyhow::bail!("container #{} not found", target.container);
        }
        let record = state
            .surfaces
            .get_mut(&target.surface)
            .ok_or(HostError::SurfaceGone(target.surface))?;
        record.body = Some(tree.to_html());

        state.next_handle += 1;
        let id = state.next_handle;
        state.mounts.insert(id, target.surface);
        state.stats.mounted += 1;
        state.events.push(HostEvent::Mounted(target.surface));
        Ok(RenderHandle {
            id,
            surface: target.surface,
        })
    }

    fn unmount(&self, handle: &RenderHandle) {
        let mut state = self.state.lock();
        state.stats.unmounted += 1;
        state.events.push(HostEvent::Unmounted(handle.surface));
        if let Some(surface) = state.mounts.remove(&handle.id)
            && let Some(record) = state.surfaces.get_mut(&surface)
        {
            record.body = None;
        }
    }
}
