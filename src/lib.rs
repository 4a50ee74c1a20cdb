//! Render automata and sequence diagrams written as plain text.
//!
//! ```
//! let svg = notes_diagram::render("sequenceDiagram\nA->>B: hello").unwrap();
//! assert!(svg.starts_with("<svg"));
//! ```

pub mod diagram;
pub mod error;
pub mod export;
pub mod theme;
pub mod xml;

use rand::Rng;

pub use diagram::{Diagram, SyntaxError, parse_diagram, render_diagram};
pub use error::{Error, Result};
pub use theme::Theme;

/// Render `source` to SVG with the default theme.
pub fn render(source: &str) -> std::result::Result<String, SyntaxError> {
    render_with(source, &Theme::default(), &mut rand::rng())
}

/// Render `source` to SVG with an explicit theme and random source. A seeded
/// `rng` makes automata layouts reproducible even when states crowd out the
/// fixed placement candidates.
pub fn render_with<R: Rng>(
    source: &str,
    theme: &Theme,
    rng: &mut R,
) -> std::result::Result<String, SyntaxError> {
    render_diagram(source, theme, rng)
}
