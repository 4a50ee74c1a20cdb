use log::debug;

use super::svg::SvgCanvas;
use super::types::*;
use crate::theme::Theme;
use crate::xml::escape;

pub const AUTOMATA_ARROWHEAD: &str = "automata-arrowhead";
pub const SEQUENCE_ARROWHEAD: &str = "sequence-arrowhead";
pub const PARTICIPANTS_ID: &str = "participants";

/// Radius added around final states for their second ring.
const FINAL_RING_GAP: i32 = 3;
/// Vertical offset that puts a label's baseline near the middle of a shape.
const LABEL_BASELINE: i32 = 6;
/// Offset of link labels from the link they annotate.
const LINK_LABEL_OFFSET: i32 = 6;
const SELF_CALL_LABEL_OFFSET: i32 = 20;
const MESSAGE_LABEL_LIFT: i32 = 4;
const CLOSURE_TEXT_BASELINE: i32 = 14;
const BOX_RADIUS: i32 = 4;

fn arrow_group_style(marker: &str, stroke: &str) -> String {
    format!(
        "marker-end:url(#{});fill:none;stroke-width:1.5px;stroke:{}",
        marker, stroke
    )
}

fn title_style(theme: &Theme, size: i32) -> String {
    format!(
        "text-anchor:middle;fill:{};font-size:{}px",
        theme.text_color, size
    )
}

// ============================================
// AUTOMATA DIAGRAM
// ============================================

pub fn render_automata(diagram: &AutomataDiagram, theme: &Theme) -> String {
    let g = &diagram.geometry;
    let area = states_area(diagram);

    let width = g.padding * 2 + area.width;
    let mut height = g.padding * 3 + g.title_height + area.height;
    let notes_y = height + g.notes_margin;
    if !diagram.notes.is_empty() {
        height = notes_y + diagram.notes.len() as i32 * (g.note_height + g.note_gap);
    }

    let mut canvas = SvgCanvas::new(width, height, &theme.font_family, theme.background.as_deref());

    if let Some(title) = &diagram.title {
        canvas.text(
            width / 2,
            g.title_height + g.padding * 2,
            title,
            Some(title_style(theme, g.title_height).as_str()),
        );
    }

    canvas.group_translated(-area.x + g.padding, -area.y + g.padding * 2 + g.title_height);
    draw_states(&mut canvas, diagram, theme);
    draw_links(&mut canvas, diagram, theme);
    canvas.group_end();

    if !diagram.notes.is_empty() {
        canvas.text_lines(
            g.padding,
            notes_y,
            &diagram.notes,
            g.note_height,
            g.note_height + g.note_gap,
            &theme.text_color,
            "start",
        );
    }

    debug!(width = width, height = height; "rendered automata diagram");
    canvas.finish()
}

/// Box around every placed state, widened by the state radius and, on the
/// left and top, by the room an entry arrow needs.
fn states_area(diagram: &AutomataDiagram) -> Rect {
    let g = &diagram.geometry;
    let (min_x, max_x, min_y, max_y) = diagram
        .states
        .iter()
        .filter_map(|s| s.position)
        .fold(None, |acc: Option<(i32, i32, i32, i32)>, p| {
            Some(match acc {
                None => (p.x, p.x, p.y, p.y),
                Some((x0, x1, y0, y1)) => (x0.min(p.x), x1.max(p.x), y0.min(p.y), y1.max(p.y)),
            })
        })
        .unwrap_or_default();

    let left = min_x - g.state_radius - g.state_spacing / 2;
    let top = min_y - g.state_radius - g.state_spacing / 2;
    Rect::new(left, top, max_x + g.state_radius - left, max_y + g.state_radius - top)
}

fn draw_states(canvas: &mut SvgCanvas, diagram: &AutomataDiagram, theme: &Theme) {
    let r = diagram.geometry.state_radius;
    let placed = || {
        diagram
            .states
            .iter()
            .filter_map(|s| s.position.map(|p| (s, p)))
    };

    canvas.group(&format!("text-anchor:middle;fill:{}", theme.text_color));
    for (state, p) in placed() {
        canvas.text(p.x, p.y + LABEL_BASELINE, &state.label, None);
    }
    canvas.group_end();

    canvas.group(&format!("fill:none;stroke:{}", theme.automata.state_stroke));
    for (state, p) in placed() {
        canvas.circle(p.x, p.y, r);
        if state.is_final {
            canvas.circle(p.x, p.y, r + FINAL_RING_GAP);
        }
    }
    canvas.group_end();
}

/// Where a link is drawn between.
enum LinkShape {
    Entry(Point),
    SelfLoop(Point),
    Straight(Point, Point),
}

fn link_shape(diagram: &AutomataDiagram, link: &Link) -> Option<LinkShape> {
    let to = diagram.states[link.to].position?;
    match link.from {
        None => Some(LinkShape::Entry(to)),
        Some(from) if from == link.to => Some(LinkShape::SelfLoop(to)),
        Some(from) => Some(LinkShape::Straight(diagram.states[from].position?, to)),
    }
}

fn draw_links(canvas: &mut SvgCanvas, diagram: &AutomataDiagram, theme: &Theme) {
    let g = &diagram.geometry;
    let r = g.state_radius;
    let stroke = &theme.automata.link_stroke;

    canvas.arrowhead_marker(AUTOMATA_ARROWHEAD, 5, 2, 6, 4, "auto", stroke);

    canvas.group(&arrow_group_style(AUTOMATA_ARROWHEAD, stroke));
    for link in &diagram.links {
        match link_shape(diagram, link) {
            Some(LinkShape::Entry(to)) => canvas.path(&entry_path(g, to), None),
            Some(LinkShape::SelfLoop(at)) => canvas.path(&self_loop_path(r, at), None),
            Some(LinkShape::Straight(from, to)) => {
                let (sx, sy) = shorten(r, from, to);
                let class = if are_neighbours(g, from, to) {
                    "neighbour"
                } else {
                    "distant"
                };
                canvas.line_with_class(
                    (from.x + sx, from.y + sy),
                    (to.x - sx, to.y - sy),
                    Some(class),
                    None,
                );
            }
            None => {}
        }
    }
    canvas.group_end();

    canvas.group(&format!(
        "text-anchor:middle;font-size:0.9em;fill:{}",
        theme.text_color
    ));
    for link in &diagram.links {
        let (x, y) = match link_shape(diagram, link) {
            Some(LinkShape::Entry(to)) => {
                let q = g.state_spacing / 4;
                (to.x - q - 4, to.y - q)
            }
            Some(LinkShape::SelfLoop(at)) => (at.x, at.y - r * 3),
            Some(LinkShape::Straight(from, to)) => {
                let (x, y) = ((from.x + to.x) / 2, (from.y + to.y) / 2);
                if from.x == to.x {
                    (x + LINK_LABEL_OFFSET, y)
                } else {
                    (x, y - LINK_LABEL_OFFSET)
                }
            }
            None => continue,
        };
        canvas.text(x, y, &link.label, None);
    }
    canvas.group_end();
}

/// Short curve that enters `to` from the upper left, starting half a spacing
/// away and ending on the circle.
fn entry_path(g: &AutomataGeometry, to: Point) -> String {
    let x1 = g.state_spacing / 2;
    let x4 = (f64::from(g.state_radius * g.state_radius / 2)).sqrt() as i32;
    let third = (x4 - x1) / 3;
    let (x2, x3) = (x1 + third, x4 - third);
    let lift = x1 / 3;

    format!(
        "M {},{} C {},{} {},{} {},{}",
        to.x - x1,
        to.y - x1,
        to.x - x2,
        to.y - x2 - lift,
        to.x - x3,
        to.y - x3 - lift,
        to.x - x4,
        to.y - x4
    )
}

/// Loop above the state, leaving at its upper left and coming back at its
/// upper right.
fn self_loop_path(r: i32, at: Point) -> String {
    let d = (f64::from(r * r / 2)).sqrt() as i32;
    format!(
        "M {},{} C {},{} {},{} {},{}",
        at.x - d,
        at.y - d,
        at.x - r * 2,
        at.y - r * 3,
        at.x + r * 2,
        at.y - r * 3,
        at.x + d,
        at.y - d
    )
}

/// Offset from a state centre to its rim along the link direction.
fn shorten(r: i32, from: Point, to: Point) -> (i32, i32) {
    let (dx, dy) = (f64::from(to.x - from.x), f64::from(to.y - from.y));
    let distance = (dx * dx + dy * dy).sqrt();
    if distance == 0.0 {
        return (0, 0);
    }
    let ratio = f64::from(r) / distance;
    ((ratio * dx) as i32, (ratio * dy) as i32)
}

fn are_neighbours(g: &AutomataGeometry, a: Point, b: Point) -> bool {
    (b.x - a.x).abs() == g.state_spacing || (b.y - a.y).abs() == g.state_spacing
}

// ============================================
// SEQUENCE DIAGRAM
// ============================================

pub fn render_sequence(diagram: &SequenceDiagram, theme: &Theme) -> String {
    let g = &diagram.geometry;
    let mut canvas = SvgCanvas::new(
        diagram.width,
        diagram.height,
        &theme.font_family,
        theme.background.as_deref(),
    );

    if let Some(title) = &diagram.title {
        canvas.text(
            diagram.width / 2,
            diagram.participant_y / 2 + g.padding,
            title,
            Some(title_style(theme, g.title_height).as_str()),
        );
    }

    canvas.group(&format!(
        "stroke-width:0.5px;stroke:{}",
        theme.sequence.lifeline_stroke
    ));
    for p in &diagram.participants {
        canvas.line(
            (p.center_x, diagram.lifeline_top),
            (p.center_x, diagram.lifeline_bottom),
            None,
        );
    }
    canvas.group_end();

    draw_participants(&mut canvas, diagram, theme);
    draw_closures(&mut canvas, diagram, theme);
    draw_messages(&mut canvas, diagram, theme);

    if !diagram.notes.is_empty() {
        canvas.text_lines(
            g.padding,
            diagram.lifeline_bottom + g.participant_height + g.notes_margin,
            &diagram.notes,
            g.note_height,
            g.note_height + g.note_gap,
            &theme.text_color,
            "start",
        );
    }

    debug!(width = diagram.width, height = diagram.height; "rendered sequence diagram");
    canvas.finish()
}

/// Top row of participant boxes, repeated below the lifelines.
fn draw_participants(canvas: &mut SvgCanvas, diagram: &SequenceDiagram, theme: &Theme) {
    let g = &diagram.geometry;
    let style = &theme.sequence;

    canvas.group_with_id(PARTICIPANTS_ID);
    canvas.group(&format!(
        "fill:{};stroke:{}",
        style.participant_fill, style.participant_stroke
    ));
    for p in &diagram.participants {
        canvas.round_rect(
            p.x,
            diagram.participant_y,
            g.participant_width,
            g.participant_height,
            BOX_RADIUS,
            BOX_RADIUS,
        );
    }
    canvas.group_end();

    canvas.group(&format!("text-anchor:middle;fill:{}", theme.text_color));
    for p in &diagram.participants {
        canvas.text(
            p.x + g.participant_width / 2,
            diagram.participant_y + g.participant_height / 2 + LABEL_BASELINE,
            &p.label,
            None,
        );
    }
    canvas.group_end();
    canvas.group_end();

    canvas.use_ref(0, diagram.lifeline_bottom - diagram.participant_y, PARTICIPANTS_ID);
}

fn draw_closures(canvas: &mut SvgCanvas, diagram: &SequenceDiagram, theme: &Theme) {
    let g = &diagram.geometry;
    let style = &theme.sequence;
    let closures = || diagram.closures.iter().filter(|c| c.closed);

    canvas.group(&format!("fill:none;stroke:{}", style.closure_stroke));
    for c in closures() {
        let b = c.bounds;
        canvas.round_rect(b.x, b.y, b.width, b.height, BOX_RADIUS, BOX_RADIUS);
    }
    canvas.group_end();

    canvas.group(&format!(
        "fill:{};stroke:{}",
        style.closure_fill, style.closure_stroke
    ));
    for c in closures() {
        canvas.round_rect(
            c.bounds.x,
            c.bounds.y,
            g.closure_tab_width,
            g.closure_header_height,
            0,
            0,
        );
    }
    canvas.group_end();

    canvas.group(&format!(
        "text-anchor:middle;fill:{};font-size:0.8em",
        theme.text_color
    ));
    for c in closures() {
        canvas.text(
            c.bounds.x + g.closure_tab_width / 2,
            c.bounds.y + CLOSURE_TEXT_BASELINE,
            c.kind.keyword(),
            None,
        );
    }
    canvas.group_end();

    canvas.group(&format!(
        "text-anchor:middle;fill:{};font-size:0.9em",
        theme.text_color
    ));
    for c in closures() {
        canvas.text(
            c.bounds.center_x(),
            c.bounds.y + CLOSURE_TEXT_BASELINE,
            &format!("[ {} ]", c.condition),
            None,
        );
    }
    canvas.group_end();
}

fn draw_messages(canvas: &mut SvgCanvas, diagram: &SequenceDiagram, theme: &Theme) {
    let g = &diagram.geometry;
    let style = &theme.sequence;

    canvas.arrowhead_marker(SEQUENCE_ARROWHEAD, 5, 2, 6, 4, "auto", &style.message_stroke);

    canvas.group(&arrow_group_style(SEQUENCE_ARROWHEAD, &style.message_stroke));
    for m in &diagram.messages {
        let dash = match m.kind {
            MessageKind::Call => None,
            MessageKind::Return => Some("stroke-dasharray:3,3"),
        };
        if m.self_call {
            let (w, h) = (g.self_call_width, g.self_call_height);
            let d = format!(
                "M {},{} C {},{} {},{} {},{}",
                m.from_x,
                m.y,
                m.from_x + w,
                m.y - h / 2,
                m.from_x + w,
                m.y + h + h / 2,
                m.from_x,
                m.y + h
            );
            canvas.path(&d, dash);
        } else {
            canvas.line((m.from_x, m.y), (m.to_x, m.y), dash);
        }
    }
    canvas.group_end();

    canvas.group(&format!(
        "text-anchor:middle;font-size:0.9em;fill:{}",
        theme.text_color
    ));
    for (i, m) in diagram.messages.iter().enumerate() {
        let x = if m.self_call {
            m.from_x + SELF_CALL_LABEL_OFFSET
        } else {
            (m.from_x + m.to_x) / 2
        };
        let prefix = if diagram.auto_number {
            format!(
                r#"<tspan style="fill:{}">{}.</tspan>"#,
                escape(&style.sequence_number_fill),
                i + 1
            )
        } else {
            String::new()
        };
        canvas.text_with_prefix(x, m.y - MESSAGE_LABEL_LIFT, &prefix, &m.label, None);
    }
    canvas.group_end();
}
