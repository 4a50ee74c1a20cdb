use std::collections::{BTreeMap, BTreeSet};

use notes_diagram::diagram::{
    AutomataDiagram, Diagram, SequenceDiagram, parse_automata, parse_diagram, parse_sequence,
};
use notes_diagram::{Theme, export, render, render_with};
use proptest::prelude::*;
use quick_xml::Reader;
use quick_xml::events::Event;
use rand::SeedableRng;
use rand::rngs::StdRng;

fn assert_well_formed(svg: &str) {
    let mut reader = Reader::from_str(svg);
    let mut depth = 0usize;
    let mut roots = 0usize;

    loop {
        match reader.read_event() {
            Ok(Event::Start(_)) => {
                if depth == 0 {
                    roots += 1;
                }
                depth += 1;
            }
            Ok(Event::End(_)) => depth -= 1,
            Ok(Event::Empty(_)) => {
                if depth == 0 {
                    roots += 1;
                }
            }
            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => panic!(
                "malformed SVG at {}: {}\n{}",
                reader.buffer_position(),
                e,
                svg
            ),
        }
    }

    assert_eq!(depth, 0, "unclosed elements in\n{}", svg);
    assert_eq!(roots, 1, "expected a single root element in\n{}", svg);
}

fn automata(source: &str, seed: u64) -> AutomataDiagram {
    let mut rng = StdRng::seed_from_u64(seed);
    parse_automata(source, &Theme::default().automata_layout, &mut rng).unwrap()
}

fn sequence(source: &str) -> SequenceDiagram {
    parse_sequence(source, &Theme::default().sequence_layout).unwrap()
}

const DEMO_AUTOMATA: &str = r#"
automataDiagram
Title: Unsigned numbers
-start->q0-digit->(q1)-digit->q1
q1-dot->q2-digit->(q3)-digit->q3
q1-e->q4-sign->q5-digit->(q6)
q3-e->q4
q4-digit->q6-digit->q6
Note: q1, q3 and q6 accept
"#;

const DEMO_SEQUENCE: &str = r#"
sequenceDiagram
Title: Version check
autoSequenceNumber
Client->>Server: GET /version
loop until fresh
    Server->>Cache: lookup
    alt stale
        Cache->>Store: reload
        Store-->>Cache: rows
    end
    Cache-->>Server: hit
end
Server->>Server: log
Server-->>Client: 200 OK
Note: retries are bounded
"#;

#[test]
fn test_demo_diagrams_are_well_formed() {
    assert_well_formed(&render(DEMO_AUTOMATA).unwrap());
    assert_well_formed(&render(DEMO_SEQUENCE).unwrap());
}

#[test]
fn test_every_builtin_theme_renders() {
    for name in Theme::list_builtins() {
        let theme = Theme::from_builtin(name).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        for source in [DEMO_AUTOMATA, DEMO_SEQUENCE] {
            let svg = render_with(source, &theme, &mut rng).unwrap();
            assert_well_formed(&svg);
            if let Some(background) = &theme.background {
                assert!(svg.contains(background.as_str()));
            }
        }
    }
}

#[test]
fn test_entry_and_final_states() {
    let diagram = automata("automataDiagram\nTitle: T\n-a->1-b->(2)", 0);
    let labels: BTreeSet<_> = diagram.states.iter().map(|s| s.label.as_str()).collect();
    assert_eq!(labels, BTreeSet::from(["1", "2"]));
    assert!(diagram.state("2").unwrap().is_final);
    assert!(!diagram.state("1").unwrap().is_final);

    assert_eq!(diagram.link_ends(&diagram.links[0]), (None, "1"));
    assert_eq!(diagram.links[0].label, "a");
    assert_eq!(diagram.link_ends(&diagram.links[1]), (Some("1"), "2"));
    assert_eq!(diagram.links[1].label, "b");
}

#[test]
fn test_calls_and_returns() {
    let diagram = sequence("sequenceDiagram\nA->>B: hi\nB-->>A: bye");
    let names: Vec<_> = diagram.participants.iter().map(|p| p.label.as_str()).collect();
    assert_eq!(names, ["A", "B"]);
    assert!(diagram.closures.is_empty());

    let svg = render("sequenceDiagram\nA->>B: hi\nB-->>A: bye").unwrap();
    assert_eq!(svg.matches("stroke-dasharray:3,3").count(), 1);
    assert!(svg.find(">hi<").unwrap() < svg.find(">bye<").unwrap());
}

#[test]
fn test_unsupported_diagram_type() {
    let err = render("fooDiagram").unwrap_err();
    assert!(err.to_string().contains("fooDiagram"));

    let envelope = export::envelope(render("fooDiagram"));
    assert!(envelope["message"].as_str().unwrap().contains("fooDiagram"));
    assert!(envelope.get("svg").is_none());
}

#[test]
fn test_envelope_carries_markup() {
    let envelope = export::envelope(render(DEMO_SEQUENCE));
    let svg = envelope["svg"].as_str().unwrap();
    assert_well_formed(svg);
}

#[test]
fn test_crowded_layout_is_reproducible_with_a_seed() {
    let mut source = String::from("automataDiagram\n");
    for i in 0..30 {
        source.push_str(&format!("hub-e{}->leaf{}\n", i, i));
    }

    let theme = Theme::default();
    let first = render_with(&source, &theme, &mut StdRng::seed_from_u64(11)).unwrap();
    let second = render_with(&source, &theme, &mut StdRng::seed_from_u64(11)).unwrap();
    assert_eq!(first, second);
    assert_well_formed(&first);

    let diagram = automata(&source, 11);
    let positions: BTreeSet<_> = diagram
        .states
        .iter()
        .map(|s| {
            let p = s.position.unwrap();
            (p.x, p.y)
        })
        .collect();
    assert_eq!(positions.len(), diagram.states.len());
}

#[test]
fn test_dispatch_matches_direct_parse() {
    let mut rng = StdRng::seed_from_u64(0);
    match parse_diagram(DEMO_SEQUENCE, &Theme::default(), &mut rng).unwrap() {
        Diagram::Sequence(d) => assert_eq!(d.messages.len(), sequence(DEMO_SEQUENCE).messages.len()),
        Diagram::Automata(_) => panic!("dispatched to the wrong grammar"),
    }
}

#[test]
fn test_syntax_errors_carry_line_numbers() {
    let err = render("sequenceDiagram\nA->>B: hi\n\nwhat is this").unwrap_err();
    assert_eq!(err.line, Some(4));

    let err = render("sequenceDiagram\nloop forever\nA->>B: hi").unwrap_err();
    assert_eq!(err.to_string(), "line 2: closure is never closed");

    let err = render("sequenceDiagram\nend").unwrap_err();
    assert_eq!(err.line, Some(2));

    let err = render("automataDiagram\nA-x->B\nA->B").unwrap_err();
    assert_eq!(err.to_string(), "line 3: syntax invalid");
}

#[test]
fn test_largest_accepted_geometry_still_renders() {
    let theme = Theme::from_toml(
        "[automata_layout]\nstate_spacing = 10000\nstate_radius = 10000\n\n\
         [sequence_layout]\nparticipant_width = 10000\nparticipant_margin = 10000\nmessage_margin = 10000\n",
    )
    .unwrap();
    let mut rng = StdRng::seed_from_u64(3);

    let svg = render_with("automataDiagram\nA-x->B-y->C", &theme, &mut rng).unwrap();
    assert_well_formed(&svg);

    let svg = render_with("sequenceDiagram\nA->>B: hi\nB->>C: there", &theme, &mut rng).unwrap();
    assert_well_formed(&svg);
}

// ============================================
// Generated diagrams
// ============================================

fn state_name(i: usize, is_final: bool) -> String {
    if is_final {
        format!("(s{})", i)
    } else {
        format!("s{}", i)
    }
}

#[derive(Debug, Clone)]
enum Step {
    Message(usize, usize, bool),
    Open(bool),
    Close,
}

fn step() -> impl Strategy<Value = Step> {
    prop_oneof![
        3 => (0usize..5, 0usize..5, any::<bool>()).prop_map(|(a, b, r)| Step::Message(a, b, r)),
        1 => any::<bool>().prop_map(Step::Open),
        1 => Just(Step::Close),
    ]
}

/// Source text plus, for every opened closure in order, the messages it
/// encloses directly or through nested closures.
fn sequence_source(steps: &[Step]) -> (String, Vec<Vec<usize>>) {
    let mut source = String::from("sequenceDiagram\n");
    let mut enclosed: Vec<Vec<usize>> = Vec::new();
    let mut open: Vec<usize> = Vec::new();
    let mut messages = 0;

    for step in steps {
        match step {
            Step::Message(a, b, is_return) => {
                let arrow = if *is_return { "-->>" } else { "->>" };
                source.push_str(&format!("P{}{}P{}: m{}\n", a, arrow, b, messages));
                for &c in &open {
                    enclosed[c].push(messages);
                }
                messages += 1;
            }
            Step::Open(is_loop) => {
                let keyword = if *is_loop { "loop" } else { "alt" };
                source.push_str(&format!("{} c{}\n", keyword, enclosed.len()));
                open.push(enclosed.len());
                enclosed.push(Vec::new());
            }
            Step::Close => {
                if open.pop().is_some() {
                    source.push_str("end\n");
                }
            }
        }
    }
    for _ in open.drain(..) {
        source.push_str("end\n");
    }

    (source, enclosed)
}

proptest! {
    #[test]
    fn prop_automata_states_are_unique_and_distinctly_placed(
        links in prop::collection::vec((0usize..8, 0usize..8, any::<bool>(), any::<bool>()), 1..16),
        seed in any::<u64>(),
    ) {
        let mut source = String::from("automataDiagram\n");
        let mut finals: BTreeMap<usize, bool> = BTreeMap::new();
        for (from, to, from_final, to_final) in &links {
            source.push_str(&format!(
                "{}-x->{}\n",
                state_name(*from, *from_final),
                state_name(*to, *to_final)
            ));
            *finals.entry(*from).or_default() |= *from_final;
            *finals.entry(*to).or_default() |= *to_final;
        }

        let diagram = automata(&source, seed);
        prop_assert_eq!(diagram.states.len(), finals.len());
        prop_assert_eq!(diagram.links.len(), links.len());
        for (i, is_final) in &finals {
            let state = diagram.state(&format!("s{}", i)).unwrap();
            prop_assert_eq!(state.is_final, *is_final);
        }

        let positions: BTreeSet<_> = diagram
            .states
            .iter()
            .map(|s| s.position.map(|p| (p.x, p.y)))
            .collect();
        prop_assert_eq!(positions.len(), diagram.states.len());
        prop_assert!(!positions.contains(&None));

        let svg = render_with(&source, &Theme::default(), &mut StdRng::seed_from_u64(seed)).unwrap();
        assert_well_formed(&svg);
    }

    #[test]
    fn prop_closures_contain_their_messages(steps in prop::collection::vec(step(), 0..30)) {
        let (source, enclosed) = sequence_source(&steps);
        let diagram = sequence(&source);

        let ys: Vec<i32> = diagram.messages.iter().map(|m| m.y).collect();
        prop_assert!(ys.windows(2).all(|w| w[0] < w[1]));

        let committed: Vec<&Vec<usize>> = enclosed.iter().filter(|m| !m.is_empty()).collect();
        prop_assert_eq!(committed.len(), diagram.closures.len());
        for (closure, messages) in diagram.closures.iter().zip(committed) {
            prop_assert!(closure.closed);
            for &m in messages {
                prop_assert!(closure.bounds.contains_y(diagram.messages[m].y));
            }
            for &child in &closure.children {
                let inner = diagram.closures[child].bounds;
                prop_assert!(closure.bounds.y < inner.y);
                prop_assert!(inner.bottom() < closure.bounds.bottom());
                prop_assert!(closure.bounds.x < inner.x);
                prop_assert!(inner.right() < closure.bounds.right());
            }
        }

        assert_well_formed(&render(&source).unwrap());
    }

    #[test]
    fn prop_empty_closures_leave_no_trace(steps in prop::collection::vec(step(), 0..20)) {
        let (source, _) = sequence_source(&steps);
        let with_empty = source.replacen("sequenceDiagram\n", "sequenceDiagram\nloop idle\nalt never\nend\nend\n", 1);

        let plain = sequence(&source);
        let padded = sequence(&with_empty);
        prop_assert_eq!(plain.height, padded.height);
        prop_assert_eq!(plain.closures.len(), padded.closures.len());
        let plain_ys: Vec<i32> = plain.messages.iter().map(|m| m.y).collect();
        let padded_ys: Vec<i32> = padded.messages.iter().map(|m| m.y).collect();
        prop_assert_eq!(plain_ys, padded_ys);
    }
}
