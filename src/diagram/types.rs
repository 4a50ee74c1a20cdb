use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Axis-aligned box, `(x, y)` is the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn center_x(&self) -> i32 {
        self.x + self.width / 2
    }

    pub fn contains_y(&self, y: i32) -> bool {
        y >= self.y && y <= self.bottom()
    }
}

// ============================================
// Automata Diagram Types
// ============================================

/// Fixed geometry of an automata diagram, in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AutomataGeometry {
    pub padding: i32,
    pub title_height: i32,
    pub note_height: i32,
    pub state_radius: i32,
    /// Distance between neighbouring states, the unit of the placement grid.
    pub state_spacing: i32,
    pub notes_margin: i32,
    pub note_gap: i32,
}

impl Default for AutomataGeometry {
    fn default() -> Self {
        Self {
            padding: 10,
            title_height: 24,
            note_height: 16,
            state_radius: 16,
            state_spacing: 100,
            notes_margin: 40,
            note_gap: 4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct State {
    pub label: String,
    pub is_final: bool,
    /// `None` until the state is first referenced by a link.
    pub position: Option<Point>,
}

#[derive(Debug, Clone)]
pub struct Link {
    /// Index into `AutomataDiagram::states`; `None` for a pseudo entry link.
    pub from: Option<usize>,
    pub to: usize,
    pub label: String,
}

#[derive(Debug, Clone)]
pub struct AutomataDiagram {
    pub title: Option<String>,
    pub states: Vec<State>,
    pub links: Vec<Link>,
    pub notes: Vec<String>,
    pub geometry: AutomataGeometry,
}

impl AutomataDiagram {
    pub fn new(geometry: AutomataGeometry) -> Self {
        Self {
            title: None,
            states: Vec::new(),
            links: Vec::new(),
            notes: Vec::new(),
            geometry,
        }
    }

    pub fn state_index(&self, label: &str) -> Option<usize> {
        self.states.iter().position(|s| s.label == label)
    }

    pub fn state(&self, label: &str) -> Option<&State> {
        self.states.iter().find(|s| s.label == label)
    }

    /// Source and target labels of a link; the source is `None` for entry links.
    pub fn link_ends(&self, link: &Link) -> (Option<&str>, &str) {
        (
            link.from.map(|i| self.states[i].label.as_str()),
            self.states[link.to].label.as_str(),
        )
    }
}

// ============================================
// Sequence Diagram Types
// ============================================

/// Fixed geometry of a sequence diagram, in pixels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SequenceGeometry {
    pub padding: i32,
    pub title_height: i32,
    pub note_height: i32,
    pub participant_width: i32,
    pub participant_height: i32,
    pub participant_margin: i32,
    pub closure_margin: i32,
    pub closure_header_height: i32,
    pub closure_tab_width: i32,
    pub message_margin: i32,
    pub self_call_width: i32,
    pub self_call_height: i32,
    pub notes_margin: i32,
    pub note_gap: i32,
}

impl Default for SequenceGeometry {
    fn default() -> Self {
        Self {
            padding: 8,
            title_height: 24,
            note_height: 16,
            participant_width: 150,
            participant_height: 60,
            participant_margin: 50,
            closure_margin: 10,
            closure_header_height: 20,
            closure_tab_width: 50,
            message_margin: 30,
            self_call_width: 60,
            self_call_height: 20,
            notes_margin: 40,
            note_gap: 4,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Participant {
    pub label: String,
    /// Left edge of the participant box.
    pub x: i32,
    /// Horizontal position of the lifeline.
    pub center_x: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    /// `->>`, drawn solid.
    Call,
    /// `-->>`, drawn dashed.
    Return,
}

#[derive(Debug, Clone)]
pub struct Message {
    pub from: usize,
    pub to: usize,
    pub label: String,
    pub kind: MessageKind,
    pub self_call: bool,
    pub from_x: i32,
    pub to_x: i32,
    pub y: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClosureKind {
    Loop,
    Alt,
}

impl ClosureKind {
    pub fn keyword(self) -> &'static str {
        match self {
            ClosureKind::Loop => "loop",
            ClosureKind::Alt => "alt",
        }
    }

    pub fn from_keyword(keyword: &str) -> Option<Self> {
        match keyword {
            "loop" => Some(ClosureKind::Loop),
            "alt" => Some(ClosureKind::Alt),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct Closure {
    pub kind: ClosureKind,
    pub condition: String,
    pub parent: Option<usize>,
    pub children: Vec<usize>,
    /// Participant indices of the leftmost and rightmost lifelines touched by
    /// messages recorded directly in this closure.
    pub leftmost: Option<usize>,
    pub rightmost: Option<usize>,
    pub rightmost_self_call: bool,
    pub last_message: Option<usize>,
    /// Only `y` is meaningful until the closure is closed.
    pub bounds: Rect,
    pub closed: bool,
    /// Source line of the `loop`/`alt` that opened it.
    pub line: usize,
}

impl Closure {
    pub fn is_empty(&self) -> bool {
        self.last_message.is_none() && self.children.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct SequenceDiagram {
    pub title: Option<String>,
    pub auto_number: bool,
    pub participants: Vec<Participant>,
    pub closures: Vec<Closure>,
    pub messages: Vec<Message>,
    pub notes: Vec<String>,
    pub geometry: SequenceGeometry,
    /// Top of the first row of participant boxes.
    pub participant_y: i32,
    pub lifeline_top: i32,
    pub lifeline_bottom: i32,
    pub width: i32,
    pub height: i32,
}

impl SequenceDiagram {
    pub fn participant_index(&self, label: &str) -> Option<usize> {
        self.participants.iter().position(|p| p.label == label)
    }
}
