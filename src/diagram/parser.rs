use log::debug;
use rand::Rng;

use super::error::SyntaxError;
use super::layout::{AutomataBuilder, SequenceBuilder};
use super::types::*;

pub const AUTOMATA_MARKER: &str = "automataDiagram";
pub const SEQUENCE_MARKER: &str = "sequenceDiagram";

const TITLE: &str = "Title:";
const NOTE: &str = "Note:";
const AUTO_SEQUENCE_NUMBER: &str = "autoSequenceNumber";
const CLOSURE_END: &str = "end";

/// Trimmed, non-blank lines paired with their 1-based line number.
fn content_lines(source: &str) -> impl Iterator<Item = (usize, &str)> {
    source
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty())
}

/// First non-blank line of `source`, trimmed.
pub fn first_content_line(source: &str) -> Option<&str> {
    content_lines(source).next().map(|(_, line)| line)
}

/// Skip the leading marker line, failing if it is not `marker`.
fn body_lines<'a>(
    source: &'a str,
    marker: &str,
) -> Result<impl Iterator<Item = (usize, &'a str)>, SyntaxError> {
    let mut lines = content_lines(source);
    match lines.next() {
        Some((_, line)) if line == marker => Ok(lines),
        Some((line_no, _)) => Err(SyntaxError::unknown_type(line_no)),
        None => Ok(lines),
    }
}

// ============================================
// AUTOMATA DIAGRAM PARSER
// ============================================

/// Parse an automata diagram. States are placed while links are read, so the
/// random source is only consulted when a state finds no free spot among
/// the fixed candidates around its neighbour.
pub fn parse_automata<R: Rng>(
    source: &str,
    geometry: &AutomataGeometry,
    rng: &mut R,
) -> Result<AutomataDiagram, SyntaxError> {
    let mut builder = AutomataBuilder::new(geometry.clone(), rng);

    for (line_no, line) in body_lines(source, AUTOMATA_MARKER)? {
        if let Some(title) = line.strip_prefix(TITLE) {
            builder.set_title(title);
        } else if let Some(note) = line.strip_prefix(NOTE) {
            builder.add_note(note);
        } else {
            parse_link_chain(&mut builder, line)
                .ok_or_else(|| SyntaxError::at(line_no, "syntax invalid"))?;
        }
    }

    let diagram = builder.finish();
    debug!(states = diagram.states.len(), links = diagram.links.len(), notes = diagram.notes.len(); "parsed automata diagram");
    Ok(diagram)
}

/// `A-x->B-y->(C)` declares `A -x-> B` and `B -y-> C`. The chain is resolved
/// from the right, since only the last `->` piece is known to be a bare
/// state; links are then recorded left to right.
fn parse_link_chain<R: Rng>(builder: &mut AutomataBuilder<'_, R>, line: &str) -> Option<()> {
    let pieces: Vec<&str> = line.split("->").collect();
    let (last, rest) = pieces.split_last()?;
    if rest.is_empty() || last.is_empty() {
        return None;
    }

    let mut to = Some(state_ref(builder, last));
    let mut segments = Vec::with_capacity(rest.len());
    for piece in rest.iter().rev() {
        // An empty source is only allowed on the leftmost segment.
        let target = to?;
        let (source, label) = piece.split_once('-')?;
        to = if source.is_empty() {
            None
        } else {
            Some(state_ref(builder, source))
        };
        segments.push((to, label, target));
    }

    for (from, label, target) in segments.into_iter().rev() {
        builder.add_link(from, target, label);
    }
    Some(())
}

/// Register a state reference; `(name)` marks the state final.
fn state_ref<R: Rng>(builder: &mut AutomataBuilder<'_, R>, name: &str) -> usize {
    match name
        .strip_prefix('(')
        .and_then(|n| n.strip_suffix(')'))
        .filter(|n| !n.is_empty())
    {
        Some(label) => builder.add_state(label, true),
        None => builder.add_state(name, false),
    }
}

// ============================================
// SEQUENCE DIAGRAM PARSER
// ============================================

pub fn parse_sequence(
    source: &str,
    geometry: &SequenceGeometry,
) -> Result<SequenceDiagram, SyntaxError> {
    let mut builder = SequenceBuilder::new(geometry.clone());

    for (line_no, line) in body_lines(source, SEQUENCE_MARKER)? {
        if line == AUTO_SEQUENCE_NUMBER {
            builder.enable_auto_number();
        } else if line == CLOSURE_END {
            if builder.close_closure().is_none() {
                return Err(SyntaxError::at(line_no, "end without an open closure"));
            }
        } else if let Some(title) = line.strip_prefix(TITLE) {
            builder.set_title(title);
        } else if let Some(note) = line.strip_prefix(NOTE) {
            builder.add_note(note);
        } else if let Some((from, to, label, kind)) = parse_message(line) {
            builder.add_message(from, to, label, kind);
        } else if let Some((kind, condition)) = parse_closure_start(line) {
            builder.open_closure(kind, condition, line_no);
        } else {
            return Err(SyntaxError::at(line_no, "unable to parse"));
        }
    }

    if let Some(line_no) = builder.open_closure_line() {
        return Err(SyntaxError::at(line_no, "closure is never closed"));
    }

    let diagram = builder.finish();
    debug!(participants = diagram.participants.len(), messages = diagram.messages.len(), closures = diagram.closures.len(); "parsed sequence diagram");
    Ok(diagram)
}

/// `A->>B: label` is a call, `A-->>B: label` a return.
fn parse_message(line: &str) -> Option<(&str, &str, &str, MessageKind)> {
    let arrow = line.find("->>")?;
    let (source_end, kind) = if line[..arrow].ends_with('-') {
        (arrow - 1, MessageKind::Return)
    } else {
        (arrow, MessageKind::Call)
    };

    let raw_from = &line[..source_end];
    if raw_from.ends_with('-') {
        return None;
    }
    let from = raw_from.trim();
    let (to, label) = line[arrow + 3..].split_once(':')?;
    let to = to.trim();
    if from.is_empty() || to.is_empty() {
        return None;
    }

    Some((from, to, label.trim(), kind))
}

fn parse_closure_start(line: &str) -> Option<(ClosureKind, &str)> {
    let (keyword, condition) = line.split_once(' ')?;
    let kind = ClosureKind::from_keyword(keyword)?;
    let condition = condition.trim();
    if condition.is_empty() {
        return None;
    }
    Some((kind, condition))
}
