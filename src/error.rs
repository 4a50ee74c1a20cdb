use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::diagram::SyntaxError;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Syntax(#[from] SyntaxError),

    #[error("failed to access {path}: {source}", path = .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid usage: {0}")]
    Usage(String),

    #[error("theme error: {0}")]
    Theme(String),

    #[error("export failed: {0}")]
    Export(String),
}

impl Error {
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.as_ref().to_path_buf(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::Error;
    use crate::diagram::SyntaxError;

    #[test]
    fn syntax_errors_display_unchanged() {
        let err: Error = SyntaxError::at(4, "unable to parse").into();
        assert_eq!(err.to_string(), "line 4: unable to parse");
    }

    #[test]
    fn usage_errors_are_not_export_failures() {
        let err = Error::Usage("both INPUT and --output are required".to_string());
        assert_eq!(
            err.to_string(),
            "invalid usage: both INPUT and --output are required"
        );
    }

    #[test]
    fn io_errors_name_the_path() {
        let source = std::io::Error::new(std::io::ErrorKind::NotFound, "no such file");
        let err = Error::io("diagrams/missing.txt", source);
        assert_eq!(
            err.to_string(),
            "failed to access diagrams/missing.txt: no such file"
        );
    }
}
