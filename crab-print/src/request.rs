//! Print request and receipt

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dom::DocumentTree;
use crate::guard::ReleaseTrigger;
use crate::host::SurfaceId;
use crate::layout::{EffectiveLayout, PaperSizeHint, PrintFormat};

/// Render function: pure mapping from the resolved layout to a tree
pub type RenderFn = Box<dyn FnOnce(&EffectiveLayout) -> anyhow::Result<DocumentTree> + Send>;

/// Identifier of one print operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrintJobId(Uuid);

impl PrintJobId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for PrintJobId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PrintJobId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One print invocation, consumed by [`PrintService::submit_print`](crate::PrintService::submit_print)
pub struct PrintRequest {
    pub format: PrintFormat,
    pub title: Option<String>,
    pub paper_size_hint: Option<PaperSizeHint>,
    pub(crate) render: RenderFn,
}

impl PrintRequest {
    pub fn new<F>(format: PrintFormat, render: F) -> Self
    where
        F: FnOnce(&EffectiveLayout) -> anyhow::Result<DocumentTree> + Send + 'static,
    {
        Self {
            format,
            title: None,
            paper_size_hint: None,
            render: Box::new(render),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_paper_size_hint(mut self, hint: PaperSizeHint) -> Self {
        self.paper_size_hint = Some(hint);
        self
    }
}

impl fmt::Debug for PrintRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PrintRequest")
            .field("format", &self.format)
            .field("title", &self.title)
            .field("paper_size_hint", &self.paper_size_hint)
            .finish_non_exhaustive()
    }
}

/// Outcome of a print operation handed off to the native workflow
///
/// `released_by` is diagnostic only: a dismissed dialog and a printed
/// document settle the same way.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrintReceipt {
    pub job_id: PrintJobId,
    pub surface: SurfaceId,
    pub layout: EffectiveLayout,
    pub released_by: ReleaseTrigger,
}

impl PrintReceipt {
    pub(crate) fn new(
        job_id: PrintJobId,
        surface: SurfaceId,
        layout: EffectiveLayout,
        released_by: ReleaseTrigger,
    ) -> Self {
        Self {
            job_id,
            surface,
            layout,
            released_by,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Element;

    #[test]
    fn test_request_builder_and_debug() {
        let request = PrintRequest::new(PrintFormat::Receipt, |_| Ok(Element::new("p").into()))
            .with_title("Ticket 12")
            .with_paper_size_hint(PaperSizeHint::Mm58);

        assert_eq!(request.title.as_deref(), Some("Ticket 12"));
        assert_eq!(request.paper_size_hint, Some(PaperSizeHint::Mm58));
        let debug = format!("{:?}", request);
        assert!(debug.contains("Receipt"));
        assert!(debug.contains(".."));
    }

    #[test]
    fn test_job_ids_are_unique() {
        assert_ne!(PrintJobId::new(), PrintJobId::new());
    }
}
