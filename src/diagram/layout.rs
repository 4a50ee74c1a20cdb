use log::trace;
use rand::Rng;

use super::types::*;

// ============================================
// AUTOMATA LAYOUT
// ============================================

/// Offsets tried around the reference point, in units of the state spacing.
///
/// ```text
///   . . e . c . .
///   . 8 . . . 5 .
///   f . . 3 . . 9
///   . . 4 0 1 . .
///   i . . 2 . . a
///   . 7 . . . 6 .
///   . . d . b . .
/// ```
const PLACEMENT_CANDIDATES: [(i32, i32); 16] = [
    (1, 0),
    (0, 1),
    (0, -1),
    (-1, 0),
    (2, -2),
    (2, 2),
    (-2, 2),
    (-2, -2),
    (3, -1),
    (3, 1),
    (1, 3),
    (1, -3),
    (-1, 3),
    (-1, -3),
    (-3, -1),
    (-3, 1),
];

/// Radius of the first random ring, in units of the state spacing.
const FALLBACK_FIRST_RING: i32 = 4;
/// Failed samples on one ring before moving out to the next.
const FALLBACK_SAMPLES_PER_RING: usize = 8;

/// Owns an automata diagram while it is being parsed and places every state
/// the first time a link mentions it.
pub struct AutomataBuilder<'r, R: Rng> {
    diagram: AutomataDiagram,
    rng: &'r mut R,
}

impl<'r, R: Rng> AutomataBuilder<'r, R> {
    pub fn new(geometry: AutomataGeometry, rng: &'r mut R) -> Self {
        Self {
            diagram: AutomataDiagram::new(geometry),
            rng,
        }
    }

    pub fn set_title(&mut self, title: &str) {
        self.diagram.title = Some(title.to_string());
    }

    pub fn add_note(&mut self, note: &str) {
        self.diagram.notes.push(note.to_string());
    }

    /// Register `label`, or find it if it already exists. `is_final` can only
    /// ever turn a state final, never back.
    pub fn add_state(&mut self, label: &str, is_final: bool) -> usize {
        if let Some(idx) = self.diagram.state_index(label) {
            self.diagram.states[idx].is_final |= is_final;
            return idx;
        }

        self.diagram.states.push(State {
            label: label.to_string(),
            is_final,
            position: None,
        });
        self.diagram.states.len() - 1
    }

    pub fn add_link(&mut self, from: Option<usize>, to: usize, label: &str) {
        match from {
            None => self.place(to, Point::ORIGIN),
            Some(from) => match (self.position(from), self.position(to)) {
                (None, None) => {
                    self.place(from, Point::ORIGIN);
                    if let Some(near) = self.position(from) {
                        self.place(to, near);
                    }
                }
                (None, Some(near)) => self.place(from, near),
                (Some(near), None) => self.place(to, near),
                (Some(_), Some(_)) => {}
            },
        }

        self.diagram.links.push(Link {
            from,
            to,
            label: label.to_string(),
        });
    }

    pub fn position(&self, state: usize) -> Option<Point> {
        self.diagram.states[state].position
    }

    /// Fix the position of `state` near `near`. A state that already has a
    /// position keeps it.
    pub fn place(&mut self, state: usize, near: Point) {
        if self.diagram.states[state].position.is_some() {
            return;
        }

        let unit = self.diagram.geometry.state_spacing.max(1);
        let candidate = PLACEMENT_CANDIDATES
            .iter()
            .map(|&(dx, dy)| Point::new(near.x + dx * unit, near.y + dy * unit))
            .enumerate()
            .find(|(_, p)| self.is_free(*p));

        let point = match candidate {
            Some((n, point)) => {
                trace!(state = self.diagram.states[state].label.as_str(), candidate = n; "placed state");
                point
            }
            None => self.random_free_point(near, unit),
        };

        self.diagram.states[state].position = Some(point);
    }

    fn is_free(&self, point: Point) -> bool {
        self.diagram
            .states
            .iter()
            .all(|s| s.position != Some(point))
    }

    fn random_free_point(&mut self, near: Point, unit: i32) -> Point {
        let mut ring = FALLBACK_FIRST_RING;
        loop {
            let r = unit * ring;
            for _ in 0..FALLBACK_SAMPLES_PER_RING {
                let point = self.sample_on_circle(near, r);
                if self.is_free(point) {
                    trace!(ring = ring, x = point.x, y = point.y; "placed state on random ring");
                    return point;
                }
            }
            ring += 1;
        }
    }

    fn sample_on_circle(&mut self, center: Point, r: i32) -> Point {
        let mut x = self.rng.random_range(0..r * 2) - r;
        let rest = i64::from(r) * i64::from(r) - i64::from(x) * i64::from(x);
        let mut y = (rest as f64).sqrt().floor() as i32;

        if self.rng.random_bool(0.5) {
            x = -x;
        }
        if self.rng.random_bool(0.5) {
            y = -y;
        }

        Point::new(center.x + x, center.y + y)
    }

    pub fn finish(self) -> AutomataDiagram {
        self.diagram
    }
}

// ============================================
// SEQUENCE LAYOUT
// ============================================

/// What happened to the innermost open closure on `end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseOutcome {
    Committed(usize),
    /// The closure held nothing and was dropped together with its reserved
    /// header space.
    Discarded,
}

/// Owns a sequence diagram while it is being parsed. Holds the running
/// horizontal and vertical cursors and the innermost open closure.
pub struct SequenceBuilder {
    diagram: SequenceDiagram,
    cursor_x: i32,
    cursor_y: i32,
    open: Option<usize>,
}

impl SequenceBuilder {
    pub fn new(geometry: SequenceGeometry) -> Self {
        let participant_y = geometry.padding + geometry.title_height + geometry.padding;
        let lifeline_top = participant_y + geometry.participant_height;
        let cursor_x = geometry.padding;

        Self {
            diagram: SequenceDiagram {
                title: None,
                auto_number: false,
                participants: Vec::new(),
                closures: Vec::new(),
                messages: Vec::new(),
                notes: Vec::new(),
                geometry,
                participant_y,
                lifeline_top,
                lifeline_bottom: lifeline_top,
                width: 0,
                height: 0,
            },
            cursor_x,
            cursor_y: lifeline_top,
            open: None,
        }
    }

    pub fn set_title(&mut self, title: &str) {
        self.diagram.title = Some(title.to_string());
    }

    pub fn enable_auto_number(&mut self) {
        self.diagram.auto_number = true;
    }

    pub fn add_note(&mut self, note: &str) {
        self.diagram.notes.push(note.to_string());
    }

    pub fn cursor_y(&self) -> i32 {
        self.cursor_y
    }

    /// Line that opened the innermost closure still waiting for its `end`.
    pub fn open_closure_line(&self) -> Option<usize> {
        self.open.map(|idx| self.diagram.closures[idx].line)
    }

    /// Slot of `label`, assigned the first time it is seen.
    pub fn participant(&mut self, label: &str) -> usize {
        if let Some(idx) = self.diagram.participant_index(label) {
            return idx;
        }

        let g = &self.diagram.geometry;
        let x = if self.diagram.participants.is_empty() {
            self.cursor_x
        } else {
            self.cursor_x + g.participant_margin
        };
        let center_x = x + g.participant_width / 2;
        self.cursor_x = x + g.participant_width;

        self.diagram.participants.push(Participant {
            label: label.to_string(),
            x,
            center_x,
        });
        self.diagram.participants.len() - 1
    }

    pub fn add_message(&mut self, from: &str, to: &str, label: &str, kind: MessageKind) {
        let from = self.participant(from);
        let to = self.participant(to);
        let self_call = from == to;
        let g = &self.diagram.geometry;

        let y = self.cursor_y + g.message_margin;
        self.cursor_y = if self_call { y + g.self_call_height } else { y };

        self.diagram.messages.push(Message {
            from,
            to,
            label: label.to_string(),
            kind,
            self_call,
            from_x: self.diagram.participants[from].center_x,
            to_x: self.diagram.participants[to].center_x,
            y,
        });
        let message = self.diagram.messages.len() - 1;

        if let Some(open) = self.open {
            record_message(&mut self.diagram.closures[open], message, from, to);
        }
    }

    pub fn open_closure(&mut self, kind: ClosureKind, condition: &str, line: usize) {
        let g = &self.diagram.geometry;
        let y = self.cursor_y + g.closure_margin;
        self.cursor_y = y + g.closure_header_height;

        self.diagram.closures.push(Closure {
            kind,
            condition: condition.to_string(),
            parent: self.open,
            children: Vec::new(),
            leftmost: None,
            rightmost: None,
            rightmost_self_call: false,
            last_message: None,
            bounds: Rect::new(0, y, 0, 0),
            closed: false,
            line,
        });
        self.open = Some(self.diagram.closures.len() - 1);
    }

    /// Close the innermost open closure; `None` when nothing is open.
    pub fn close_closure(&mut self) -> Option<CloseOutcome> {
        let idx = self.open?;
        let g = self.diagram.geometry.clone();
        let closure = &self.diagram.closures[idx];
        let parent = closure.parent;

        if closure.is_empty() {
            // Nothing was opened after it, so it is still the last entry.
            self.diagram.closures.truncate(idx);
            self.cursor_y -= g.closure_header_height + g.closure_margin;
            self.open = parent;
            trace!(closure = idx; "discarded empty closure");
            return Some(CloseOutcome::Discarded);
        }

        let participants = &self.diagram.participants;
        let children: Vec<Rect> = closure
            .children
            .iter()
            .map(|&c| self.diagram.closures[c].bounds)
            .collect();

        let left = closure
            .leftmost
            .map(|p| participants[p].center_x)
            .into_iter()
            .chain(children.iter().map(|b| b.x))
            .min()
            .unwrap_or(self.cursor_x);

        let rightmost_edge = closure.rightmost.map(|p| {
            let x = participants[p].center_x;
            if closure.rightmost_self_call {
                x + g.self_call_width
            } else {
                x
            }
        });
        let right = rightmost_edge
            .into_iter()
            .chain(children.iter().map(Rect::right))
            .max()
            .unwrap_or(left);

        let ends_with_self_call = closure
            .last_message
            .is_some_and(|m| self.diagram.messages[m].self_call);

        let y = closure.bounds.y;
        let x = left - g.closure_margin;
        let width = right + g.closure_margin - x;
        let mut height = self.cursor_y + g.closure_margin - y;
        if ends_with_self_call {
            height += g.self_call_height;
        }

        let closure = &mut self.diagram.closures[idx];
        closure.bounds = Rect::new(x, y, width, height);
        closure.closed = true;
        self.cursor_y = y + height;
        self.open = parent;
        if let Some(parent) = parent {
            self.diagram.closures[parent].children.push(idx);
        }

        trace!(closure = idx, x = x, y = y, width = width, height = height; "committed closure");
        Some(CloseOutcome::Committed(idx))
    }

    /// Reserve the bottom participant row and the notes block and fix the
    /// canvas size.
    pub fn finish(mut self) -> SequenceDiagram {
        let g = &self.diagram.geometry;
        let lifeline_bottom = self.cursor_y + g.message_margin;
        let mut height = lifeline_bottom + g.participant_height;
        if !self.diagram.notes.is_empty() {
            height +=
                g.notes_margin + self.diagram.notes.len() as i32 * (g.note_height + g.note_gap);
        }

        self.diagram.lifeline_bottom = lifeline_bottom;
        self.diagram.width = self.cursor_x + g.padding;
        self.diagram.height = height + g.padding;
        self.diagram
    }
}

/// Widen the tracked participant span of `closure` to cover a new message.
/// Participant indices grow left to right, so they compare like positions.
fn record_message(closure: &mut Closure, message: usize, from: usize, to: usize) {
    let self_call = from == to;
    let (lo, hi) = if from <= to { (from, to) } else { (to, from) };
    closure.last_message = Some(message);

    match (closure.leftmost, closure.rightmost) {
        (Some(left), Some(right)) => {
            if lo < left {
                closure.leftmost = Some(lo);
            }
            if hi > right {
                closure.rightmost = Some(hi);
                closure.rightmost_self_call = self_call;
            } else if hi == right {
                closure.rightmost_self_call |= self_call;
            }
        }
        _ => {
            closure.leftmost = Some(lo);
            closure.rightmost = Some(hi);
            closure.rightmost_self_call = self_call;
        }
    }
}
