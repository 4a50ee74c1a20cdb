use thiserror::Error;

/// The only way a render can fail: the source does not follow its grammar.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{}{}", .line.map(|l| format!("line {}: ", l)).unwrap_or_default(), .reason)]
pub struct SyntaxError {
    /// 1-based source line, when the failure can be tied to one.
    pub line: Option<usize>,
    pub reason: String,
}

impl SyntaxError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            line: None,
            reason: reason.into(),
        }
    }

    pub fn at(line: usize, reason: impl Into<String>) -> Self {
        Self {
            line: Some(line),
            reason: reason.into(),
        }
    }

    pub(crate) fn unsupported(kind: &str) -> Self {
        Self::new(format!("unsupported diagram type \"{}\"", kind))
    }

    pub(crate) fn unknown_type(line: usize) -> Self {
        Self::at(line, "diagram type is unknown")
    }

    pub(crate) fn empty_source() -> Self {
        Self::new("diagram source is empty")
    }
}
