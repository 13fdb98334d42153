use serde::{Deserialize, Serialize};

/// The stage that produced a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DiagnosticKind {
    Syntax,
    Type,
    Collision,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Fully formatted, including the location header and snippet.
    pub message: String,
    pub kind: DiagnosticKind,
    /// 1-based first line of the offending block.
    pub line: Option<usize>,
}

#[derive(Debug, Default, Clone)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    pub fn push<S: Into<String>>(&mut self, kind: DiagnosticKind, message: S, line: usize) {
        self.entries.push(Diagnostic {
            message: message.into(),
            kind,
            line: Some(line),
        });
    }

    /// Adds a diagnostic unless an identical message is already present.
    pub fn push_unique(&mut self, diagnostic: Diagnostic) -> bool {
        if self
            .entries
            .iter()
            .any(|entry| entry.message == diagnostic.message)
        {
            return false;
        }
        self.entries.push(diagnostic);
        true
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn entries(&self) -> &[Diagnostic] {
        &self.entries
    }

    pub fn messages(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|diagnostic| diagnostic.message.clone())
            .collect()
    }

    pub fn count(&self, kind: DiagnosticKind) -> usize {
        self.entries
            .iter()
            .filter(|diagnostic| diagnostic.kind == kind)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_messages_are_dropped() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(DiagnosticKind::Type, "Line 1: bad", 1);
        let duplicate = Diagnostic {
            message: "Line 1: bad".to_string(),
            kind: DiagnosticKind::Type,
            line: Some(1),
        };
        assert!(!diagnostics.push_unique(duplicate));
        assert_eq!(diagnostics.len(), 1);
        assert_eq!(diagnostics.count(DiagnosticKind::Syntax), 0);
    }
}
