//! Layout contract
//!
//! Which paper a document lands on is tenant policy and lives outside this
//! crate. The pipeline only consumes the answer: an [`EffectiveLayout`]
//! produced by a [`LayoutResolver`] once per print operation.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Output family requested by the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PrintFormat {
    /// Narrow continuous thermal roll
    #[serde(alias = "TICKET", alias = "KITCHEN", alias = "receipt", alias = "ticket")]
    Receipt,
    /// Standard cut sheet
    #[serde(alias = "A4", alias = "A5", alias = "INVOICE", alias = "sheet")]
    Sheet,
}

impl FromStr for PrintFormat {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "RECEIPT" | "TICKET" | "KITCHEN" => Ok(PrintFormat::Receipt),
            "SHEET" | "A4" | "A5" | "INVOICE" => Ok(PrintFormat::Sheet),
            _ => Err(LayoutError::UnknownFormat(s.to_string())),
        }
    }
}

impl fmt::Display for PrintFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PrintFormat::Receipt => f.write_str("receipt"),
            PrintFormat::Sheet => f.write_str("sheet"),
        }
    }
}

/// Optional paper hint attached to a request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaperSizeHint {
    #[serde(alias = "58mm")]
    Mm58,
    #[serde(alias = "80mm")]
    Mm80,
    #[serde(alias = "A4")]
    A4,
    #[serde(alias = "A5")]
    A5,
}

impl FromStr for PaperSizeHint {
    type Err = LayoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mm58" | "58mm" | "58" => Ok(PaperSizeHint::Mm58),
            "mm80" | "80mm" | "80" => Ok(PaperSizeHint::Mm80),
            "a4" => Ok(PaperSizeHint::A4),
            "a5" => Ok(PaperSizeHint::A5),
            _ => Err(LayoutError::UnknownHint(s.to_string())),
        }
    }
}

/// Thermal roll width
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReceiptWidth {
    #[serde(rename = "58")]
    Mm58,
    #[serde(rename = "80")]
    Mm80,
}

impl ReceiptWidth {
    /// Physical width in millimetres
    pub fn mm(&self) -> u32 {
        match self {
            ReceiptWidth::Mm58 => 58,
            ReceiptWidth::Mm80 => 80,
        }
    }

    pub fn from_mm(mm: u32) -> Option<Self> {
        match mm {
            58 => Some(ReceiptWidth::Mm58),
            80 => Some(ReceiptWidth::Mm80),
            _ => None,
        }
    }
}

/// Named cut-sheet size
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SheetSize {
    A4,
    A5,
}

impl SheetSize {
    /// Name understood by the CSS `size` descriptor
    pub fn css_name(&self) -> &'static str {
        match self {
            SheetSize::A4 => "A4",
            SheetSize::A5 => "A5",
        }
    }
}

/// Fully resolved physical page parameters for one print operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "output_kind", rename_all = "snake_case")]
pub enum EffectiveLayout {
    Receipt { receipt_width: ReceiptWidth },
    Sheet { sheet_size: SheetSize },
}

impl EffectiveLayout {
    pub fn output_kind(&self) -> PrintFormat {
        match self {
            EffectiveLayout::Receipt { .. } => PrintFormat::Receipt,
            EffectiveLayout::Sheet { .. } => PrintFormat::Sheet,
        }
    }

    pub fn receipt_width(&self) -> Option<ReceiptWidth> {
        match self {
            EffectiveLayout::Receipt { receipt_width } => Some(*receipt_width),
            EffectiveLayout::Sheet { .. } => None,
        }
    }

    pub fn sheet_size(&self) -> Option<SheetSize> {
        match self {
            EffectiveLayout::Sheet { sheet_size } => Some(*sheet_size),
            EffectiveLayout::Receipt { .. } => None,
        }
    }
}

/// Layout resolution errors
#[derive(Debug, Error)]
pub enum LayoutError {
    #[error("Unknown print format: {0}")]
    UnknownFormat(String),

    #[error("Unknown paper size hint: {0}")]
    UnknownHint(String),

    #[error("Paper size {hint:?} does not fit format {format}")]
    Mismatch {
        format: PrintFormat,
        hint: PaperSizeHint,
    },

    /// Rejection coming from an external policy
    #[error("{0}")]
    Policy(String),
}

/// Resolves the effective layout for a request
///
/// Must be deterministic for the duration of one call.
pub trait LayoutResolver: Send + Sync {
    fn resolve(
        &self,
        format: PrintFormat,
        hint: Option<PaperSizeHint>,
    ) -> Result<EffectiveLayout, LayoutError>;
}

impl<F> LayoutResolver for F
where
    F: Fn(PrintFormat, Option<PaperSizeHint>) -> Result<EffectiveLayout, LayoutError>
        + Send
        + Sync,
{
    fn resolve(
        &self,
        format: PrintFormat,
        hint: Option<PaperSizeHint>,
    ) -> Result<EffectiveLayout, LayoutError> {
        self(format, hint)
    }
}

/// Reference policy: honour the hint, otherwise fall back to a default per family
#[derive(Debug, Clone, Copy)]
pub struct StaticLayoutResolver {
    default_receipt_width: ReceiptWidth,
}

impl StaticLayoutResolver {
    pub fn new(default_receipt_width: ReceiptWidth) -> Self {
        Self {
            default_receipt_width,
        }
    }
}

impl Default for StaticLayoutResolver {
    fn default() -> Self {
        Self::new(ReceiptWidth::Mm80)
    }
}

impl LayoutResolver for StaticLayoutResolver {
    fn resolve(
        &self,
        format: PrintFormat,
        hint: Option<PaperSizeHint>,
    ) -> Result<EffectiveLayout, LayoutError> {
        match (format, hint) {
            (PrintFormat::Receipt, None) => Ok(EffectiveLayout::Receipt {
                receipt_width: self.default_receipt_width,
            }),
            (PrintFormat::Receipt, Some(PaperSizeHint::Mm58)) => Ok(EffectiveLayout::Receipt {
                receipt_width: ReceiptWidth::Mm58,
            }),
            (PrintFormat::Receipt, Some(PaperSizeHint::Mm80)) => Ok(EffectiveLayout::Receipt {
                receipt_width: ReceiptWidth::Mm80,
            }),
            (PrintFormat::Sheet, None | Some(PaperSizeHint::A4)) => Ok(EffectiveLayout::Sheet {
                sheet_size: SheetSize::A4,
            }),
            (PrintFormat::Sheet, Some(PaperSizeHint::A5)) => Ok(EffectiveLayout::Sheet {
                sheet_size: SheetSize::A5,
            }),
            (format, Some(hint)) => Err(LayoutError::Mismatch { format, hint }),
        }
    }
}
