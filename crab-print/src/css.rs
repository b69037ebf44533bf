//! Print CSS synthesis
//!
//! The page geometry stylesheet is appended after the replicated host
//! styles so that it wins equal-specificity ties.

use std::fmt::Write as _;

use crate::dom::StyleNode;
use crate::error::HostError;
use crate::host::{PrintHost, SurfaceId};
use crate::layout::EffectiveLayout;

/// Element id of the injected stylesheet
pub const PRINT_CSS_ID: &str = "crab-print-page";

/// Overlay layers hidden on thermal output unless configured otherwise
pub const DEFAULT_OVERLAY_SELECTORS: &[&str] =
    &[".print-overlay", "[data-print-decoration]", ".watermark"];

const COLOR_FIDELITY: &str =
    "-webkit-print-color-adjust: exact; print-color-adjust: exact; color-adjust: exact;";

/// Builds and injects the page geometry stylesheet
#[derive(Debug, Clone, Copy)]
pub struct PrintCssInjector<'a> {
    overlay_selectors: &'a [String],
}

impl<'a> PrintCssInjector<'a> {
    pub fn new(overlay_selectors: &'a [String]) -> Self {
        Self { overlay_selectors }
    }

    /// CSS encoding the physical page of `layout`
    pub fn stylesheet(&self, layout: &EffectiveLayout) -> String {
        let mut css = String::new();
        match layout {
            EffectiveLayout::Receipt { receipt_width } => {
                let w = receipt_width.mm();
                let _ = writeln!(css, "@page {{ size: {w}mm auto; margin: 0; }}");
                let _ = writeln!(
                    css,
                    "html, body {{ width: {w}mm; margin: 0; padding: 0; }}"
                );
            }
            EffectiveLayout::Sheet { sheet_size } => {
                let _ = writeln!(
                    css,
                    "@page {{ size: {}; margin: 0; }}",
                    sheet_size.css_name()
                );
                css.push_str("html, body { margin: 0; padding: 0; }\n");
            }
        }
        let _ = writeln!(css, "* {{ {COLOR_FIDELITY} }}");

        if matches!(layout, EffectiveLayout::Receipt { .. }) && !self.overlay_selectors.is_empty()
        {
            let _ = writeln!(
                css,
                "{} {{ display: none !important; }}",
                self.overlay_selectors.join(", ")
            );
        }
        css
    }

    /// Append the stylesheet to the end of the surface head
    pub fn inject<H: PrintHost>(
        &self,
        host: &H,
        surface: SurfaceId,
        layout: &EffectiveLayout,
    ) -> Result<(), HostError> {
        let node = StyleNode::inline(self.stylesheet(layout)).with_id(PRINT_CSS_ID);
        host.append_style(surface, node)
    }
}

/// Page width declared by a print stylesheet, e.g. `58mm`
pub fn page_width(css: &str) -> Option<&str> {
    page_size(css).and_then(|size| size.split_whitespace().next())
}

/// Value of the `size` descriptor inside the `@page` rule
pub fn page_size(css: &str) -> Option<&str> {
    let page = &css[css.find("@page")?..];
    let open = page.find('{')? + 1;
    let close = open + page[open..].find('}')?;
    let body = &page[open..close];
    body.split(';')
        .filter_map(|decl| decl.split_once(':'))
        .find(|(name, _)| name.trim() == "size")
        .map(|(_, value)| value.trim())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{ReceiptWidth, SheetSize};

    fn overlays() -> Vec<String> {
        DEFAULT_OVERLAY_SELECTORS
            .iter()
            .map(|s| s.to_string())
            .collect()
    }

    #[test]
    fn test_receipt_geometry() {
        let selectors = overlays();
        let css = PrintCssInjector::new(&selectors).stylesheet(&EffectiveLayout::Receipt {
            receipt_width: ReceiptWidth::Mm58,
        });
        assert_eq!(page_width(&css), Some("58mm"));
        assert_eq!(page_size(&css), Some("58mm auto"));
        assert!(css.contains("html, body { width: 58mm;"));
        assert!(css.contains("margin: 0;"));
        assert!(css.contains("print-color-adjust: exact"));
        assert!(css.contains(".print-overlay, [data-print-decoration], .watermark { display: none !important; }"));
    }

    #[test]
    fn test_sheet_geometry_keeps_overlays() {
        let selectors = overlays();
        let css = PrintCssInjector::new(&selectors).stylesheet(&EffectiveLayout::Sheet {
            sheet_size: SheetSize::A4,
        });
        assert_eq!(page_size(&css), Some("A4"));
        assert!(css.contains("print-color-adjust: exact"));
        assert!(!css.contains("display: none"));
    }

    #[test]
    fn test_receipt_without_overlay_selectors() {
        let css = PrintCssInjector::new(&[]).stylesheet(&EffectiveLayout::Receipt {
            receipt_width: ReceiptWidth::Mm80,
        });
        assert_eq!(page_width(&css), Some("80mm"));
        assert!(!css.contains("display: none"));
    }

    #[test]
    fn test_page_size_absent() {
        assert_eq!(page_size("body { margin: 0 }"), None);
    }

    #[test]
    fn test_page_size_malformed_rule() {
        assert_eq!(page_size("@page } { size: A4 }"), Some("A4"));
        assert_eq!(page_size("@page } { size: A4"), None);
        assert_eq!(page_size("@page { size: 80mm auto"), None);
        assert_eq!(page_width("@page }"), None);
    }
}
