//! Error types for the print pipeline

use std::fmt;

use thiserror::Error;

use crate::host::SurfaceId;

/// Phase of a print operation, attached to every failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrintPhase {
    /// Resolving the effective layout from format and hint
    ResolveLayout,
    /// Attaching the isolated surface and waiting for it to load
    CreateSurface,
    /// Replicating host styles and injecting print CSS
    CopyStyles,
    /// Rendering and mounting the document tree
    Mount,
    /// Focusing the surface and invoking the native print trigger
    Trigger,
}

impl PrintPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            PrintPhase::ResolveLayout => "resolve_layout",
            PrintPhase::CreateSurface => "create_surface",
            PrintPhase::CopyStyles => "copy_styles",
            PrintPhase::Mount => "mount",
            PrintPhase::Trigger => "trigger",
        }
    }
}

impl fmt::Display for PrintPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Print error types
#[derive(Debug, Error)]
pub enum PrintError {
    /// The layout resolver rejected the request
    #[error("Layout resolution failed: {0}")]
    LayoutResolution(String),

    /// The isolated surface could not be attached, loaded or written to
    #[error("Surface init failed: {0}")]
    SurfaceInit(String),

    /// The isolated document has no container to mount into
    #[error("Mount target missing")]
    MountTargetMissing,

    /// The render function or the renderer failed
    #[error("Render failed: {0}")]
    Render(String),

    /// The native print trigger refused to run
    #[error("Print trigger failed: {0}")]
    Trigger(String),
}

impl PrintError {
    /// Stable code for the UI's "could not print" notice
    pub fn code(&self) -> &'static str {
        match self {
            PrintError::LayoutResolution(_) => "PRINT_LAYOUT_FAILED",
            PrintError::SurfaceInit(_) => "PRINT_SURFACE_INIT_FAILED",
            PrintError::MountTargetMissing => "PRINT_MOUNT_TARGET_MISSING",
            PrintError::Render(_) => "PRINT_RENDER_FAILED",
            PrintError::Trigger(_) => "PRINT_TRIGGER_FAILED",
        }
    }
}

/// A print failure tagged with the phase it happened in
#[derive(Debug, Error)]
#[error("Print failed during {phase}: {source}")]
pub struct PrintFailure {
    pub phase: PrintPhase,
    #[source]
    pub source: PrintError,
}

impl PrintFailure {
    pub fn new(phase: PrintPhase, source: PrintError) -> Self {
        Self { phase, source }
    }

    pub fn code(&self) -> &'static str {
        self.source.code()
    }
}

/// Result type for print operations
pub type PrintResult<T> = Result<T, PrintFailure>;

/// Errors reported by a [`PrintHost`](crate::host::PrintHost)
#[derive(Debug, Error)]
pub enum HostError {
    /// The environment cannot create nested rendering contexts
    #[error("Unsupported environment: {0}")]
    Unsupported(String),

    /// The nested document never became ready
    #[error("Surface load failed: {0}")]
    LoadFailed(String),

    /// The surface was already removed from the page
    #[error("Surface not attached: {0}")]
    SurfaceGone(SurfaceId),

    /// The native print trigger is unavailable
    #[error("Print unavailable: {0}")]
    PrintUnavailable(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_failure_carries_phase_and_code() {
        let failure = PrintFailure::new(PrintPhase::Mount, PrintError::MountTargetMissing);
        assert_eq!(failure.phase, PrintPhase::Mount);
        assert_eq!(failure.code(), "PRINT_MOUNT_TARGET_MISSING");
        assert_eq!(
            failure.to_string(),
            "Print failed during mount: Mount target missing"
        );
    }

    #[test]
    fn test_failure_exposes_source() {
        use std::error::Error as _;

        let failure = PrintFailure::new(
            PrintPhase::ResolveLayout,
            PrintError::LayoutResolution("tenant has no paper".into()),
        );
        let source = failure.source().map(|s| s.to_string());
        assert_eq!(
            source.as_deref(),
            Some("Layout resolution failed: tenant has no paper")
        );
    }
}
