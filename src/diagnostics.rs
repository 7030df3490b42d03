//! Non-fatal diagnostics collected while normalizing a document.
//!
//! Expected anomalies in the input graph (dangling references, cycles,
//! a missing containment tree, undecodable payloads) never abort
//! processing. Each one is recorded as a [`Diagnostic`] and forwarded to
//! the `log` facade at the matching level.

use serde::{Deserialize, Serialize};

/// Severity of a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Expected input variance, informational only
    Info,
    /// Something was skipped or left unresolved
    Warning,
}

/// Kind of anomaly a diagnostic reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DiagnosticCode {
    /// A reference marker targets an id absent from every collection.
    UnresolvedReference,
    /// A reference marker would re-enter its own resolution chain.
    CyclicReference,
    /// Resolution stopped at the pass limit before reaching a fixed point.
    PassLimitReached,
    /// An identifier occurs in more than one collection entry.
    DuplicateElement,
    /// A containment-tree child could not be found in the element map.
    MissingChild,
    /// A containment-tree child is one of its own ancestors.
    CyclicChild,
    /// The containment tree is absent or empty; page fallback was used.
    EmptyTree,
    /// Table cells fell outside the grid limits and were dropped.
    TableCellOutOfRange,
    /// An inline payload could not be decoded.
    AssetDecodeFailed,
    /// A decoded payload could not be written to disk.
    AssetWriteFailed,
    /// The asset directory could not be scanned for existing files.
    AssetScanFailed,
}

impl DiagnosticCode {
    /// Severity associated with this code.
    pub fn severity(&self) -> Severity {
        match self {
            DiagnosticCode::EmptyTree => Severity::Info,
            _ => Severity::Warning,
        }
    }

    /// Whether this code should appear in a user-facing summary.
    ///
    /// Only payload problems are surfaced; reference and tree anomalies
    /// stay in the logs.
    pub fn is_user_visible(&self) -> bool {
        matches!(
            self,
            DiagnosticCode::AssetDecodeFailed
                | DiagnosticCode::AssetWriteFailed
                | DiagnosticCode::AssetScanFailed
        )
    }

    /// Stable snake_case name of the code.
    pub fn as_str(&self) -> &'static str {
        match self {
            DiagnosticCode::UnresolvedReference => "unresolved_reference",
            DiagnosticCode::CyclicReference => "cyclic_reference",
            DiagnosticCode::PassLimitReached => "pass_limit_reached",
            DiagnosticCode::DuplicateElement => "duplicate_element",
            DiagnosticCode::MissingChild => "missing_child",
            DiagnosticCode::CyclicChild => "cyclic_child",
            DiagnosticCode::EmptyTree => "empty_tree",
            DiagnosticCode::TableCellOutOfRange => "table_cell_out_of_range",
            DiagnosticCode::AssetDecodeFailed => "asset_decode_failed",
            DiagnosticCode::AssetWriteFailed => "asset_write_failed",
            DiagnosticCode::AssetScanFailed => "asset_scan_failed",
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single (code, element-id, message) record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// What went wrong
    pub code: DiagnosticCode,

    /// Element the anomaly was found on, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub element_id: Option<String>,

    /// Human-readable detail
    pub message: String,
}

impl Diagnostic {
    /// Create a new diagnostic.
    pub fn new(code: DiagnosticCode, element_id: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            code,
            element_id: element_id.map(str::to_string),
            message: message.into(),
        }
    }

    /// Severity of this diagnostic.
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.element_id {
            Some(id) => write!(f, "[{}] {}: {}", self.code, id, self.message),
            None => write!(f, "[{}] {}", self.code, self.message),
        }
    }
}

/// Ordered list of diagnostics for one document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and emit it to the log.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        match diagnostic.severity() {
            Severity::Info => log::info!("{}", diagnostic),
            Severity::Warning => log::warn!("{}", diagnostic),
        }
        self.entries.push(diagnostic);
    }

    /// Shorthand for `push(Diagnostic::new(..))`.
    pub fn report(
        &mut self,
        code: DiagnosticCode,
        element_id: Option<&str>,
        message: impl Into<String>,
    ) {
        self.push(Diagnostic::new(code, element_id, message));
    }

    /// Append all entries from another list.
    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    /// Iterate over entries in emission order.
    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Entries that belong in a user-facing summary.
    pub fn user_visible(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(|d| d.code.is_user_visible())
    }

    /// Number of entries with the given code.
    pub fn count(&self, code: DiagnosticCode) -> usize {
        self.entries.iter().filter(|d| d.code == code).count()
    }

    /// Whether any entry has the given code.
    pub fn contains(&self, code: DiagnosticCode) -> bool {
        self.entries.iter().any(|d| d.code == code)
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the list is empty.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
