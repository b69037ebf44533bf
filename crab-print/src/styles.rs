//! Style replication into isolated surfaces

use tracing::debug;

use crate::error::HostError;
use crate::host::{PrintHost, SurfaceId};

/// Copies the host document's stylesheets into a surface
pub struct StyleReplicator;

impl StyleReplicator {
    /// Recreate every stylesheet link and inline block of the host document
    /// in the surface, preserving document order.
    ///
    /// Returns the number of nodes copied. The host list is only read.
    pub fn copy_styles<H: PrintHost>(host: &H, surface: SurfaceId) -> Result<usize, HostError> {
        let nodes = host.host_styles();
        let count = nodes.len();
        for node in nodes {
            host.append_style(surface, node)?;
        }
        debug!(surface = %surface, count, "Host styles replicated");
        Ok(count)
    }
}
