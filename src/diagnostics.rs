//! Structured diagnostics collected during a generation pass
//!
//! Every stage reports local failures here instead of aborting the whole
//! pass. Each entry is also forwarded to the `log` facade at `warn` level.

use std::fmt;

/// Pipeline stage that emitted a diagnostic
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Contour,
    Features,
    Carving,
    Foliage,
    Paths,
}

/// Category of a local failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    /// Too few models, path nodes or boundary points to run a sub-pipeline
    InsufficientInput,
    /// A degenerate point, triangle or feature was skipped
    GeometricDegeneracy,
    /// Bounded rejection sampling ran out of attempts
    PlacementFailed,
}

/// A single diagnostic entry
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub stage: Stage,
    pub kind: DiagnosticKind,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:?}/{:?}] {}", self.stage, self.kind, self.message)
    }
}

/// Accumulated diagnostics of one generation pass
#[derive(Debug, Clone, Default)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a diagnostic and forward it to the logger
    pub fn push(&mut self, stage: Stage, kind: DiagnosticKind, message: impl Into<String>) {
        let message = message.into();
        log::warn!("{:?}: {}", stage, message);
        self.entries.push(Diagnostic {
            stage,
            kind,
            message,
        });
    }

    /// Append all entries of another collection
    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    #[inline]
    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Entries emitted by one stage
    pub fn for_stage(&self, stage: Stage) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.stage == stage)
    }

    /// Whether any entry has the given kind
    pub fn has_kind(&self, kind: DiagnosticKind) -> bool {
        self.entries.iter().any(|d| d.kind == kind)
    }
}

impl fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{}", entry)?;
        }
        Ok(())
    }
}
