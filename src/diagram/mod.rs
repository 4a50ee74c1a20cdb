//! Text diagrams: the automata and sequence grammars, their incremental
//! layout and SVG rendering.
//!
//! A source is dispatched on its first non-blank line, which names the
//! grammar (`automataDiagram` or `sequenceDiagram`).

pub mod error;
pub mod layout;
pub mod parser;
pub mod render;
pub mod svg;
pub mod types;

use log::debug;
use rand::Rng;

pub use error::SyntaxError;
pub use parser::{AUTOMATA_MARKER, SEQUENCE_MARKER, parse_automata, parse_sequence};
pub use render::{render_automata, render_sequence};
pub use types::*;

use crate::theme::Theme;

/// A parsed and laid out diagram of either kind.
#[derive(Debug, Clone)]
pub enum Diagram {
    Automata(AutomataDiagram),
    Sequence(SequenceDiagram),
}

impl Diagram {
    pub fn kind(&self) -> &'static str {
        match self {
            Diagram::Automata(_) => AUTOMATA_MARKER,
            Diagram::Sequence(_) => SEQUENCE_MARKER,
        }
    }

    pub fn to_svg(&self, theme: &Theme) -> String {
        match self {
            Diagram::Automata(d) => render_automata(d, theme),
            Diagram::Sequence(d) => render_sequence(d, theme),
        }
    }
}

/// Pick the grammar named by the first non-blank line and parse with it,
/// using the geometry of `theme`.
pub fn parse_diagram<R: Rng>(
    source: &str,
    theme: &Theme,
    rng: &mut R,
) -> Result<Diagram, SyntaxError> {
    let first = parser::first_content_line(source).ok_or_else(SyntaxError::empty_source)?;
    debug!(kind = first; "dispatching diagram");

    match first {
        AUTOMATA_MARKER => parse_automata(source, &theme.automata_layout, rng).map(Diagram::Automata),
        SEQUENCE_MARKER => parse_sequence(source, &theme.sequence_layout).map(Diagram::Sequence),
        other => Err(SyntaxError::unsupported(other)),
    }
}

pub fn render_diagram<R: Rng>(
    source: &str,
    theme: &Theme,
    rng: &mut R,
) -> Result<String, SyntaxError> {
    parse_diagram(source, theme, rng).map(|diagram| diagram.to_svg(theme))
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    fn parse(source: &str) -> Result<Diagram, SyntaxError> {
        let mut rng = StdRng::seed_from_u64(0);
        parse_diagram(source, &Theme::default(), &mut rng)
    }

    #[test]
    fn unknown_kind_is_named_in_the_error() {
        let err = parse("fooDiagram\nA->>B: x").unwrap_err();
        assert_eq!(err.line, None);
        assert!(err.to_string().contains("fooDiagram"));
    }

    #[test]
    fn blank_source_is_rejected() {
        assert!(parse("").is_err());
        assert!(parse("  \n\t\n").is_err());
    }

    #[test]
    fn leading_blank_lines_are_skipped() {
        let diagram = parse("\n\n   sequenceDiagram  \nA->>B: x").unwrap();
        assert_eq!(diagram.kind(), SEQUENCE_MARKER);
        let diagram = parse("automataDiagram\nA-x->B").unwrap();
        assert_eq!(diagram.kind(), AUTOMATA_MARKER);
    }

    #[test]
    fn theme_geometry_drives_the_layout() {
        let mut theme = Theme::default();
        theme.automata_layout.state_spacing = 60;
        let mut rng = StdRng::seed_from_u64(0);
        let Diagram::Automata(d) = parse_diagram("automataDiagram\nA-x->B", &theme, &mut rng)
            .unwrap()
        else {
            panic!("expected an automata diagram");
        };
        assert_eq!(d.state("B").unwrap().position, Some(Point::new(120, 0)));
    }

    #[test]
    fn render_produces_a_single_svg_document() {
        let mut rng = StdRng::seed_from_u64(0);
        let svg = render_diagram("sequenceDiagram\nA->>B: x", &Theme::default(), &mut rng).unwrap();
        assert!(svg.starts_with("<svg "));
        assert_eq!(svg.matches("<svg").count(), 1);
    }
}
