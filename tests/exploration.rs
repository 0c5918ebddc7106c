use pn_cover::analysis::boundness::{BoundnessAnalyzer, BoundnessResult, analyze};
use pn_cover::analysis::coverability::{AncestorPolicy, accelerate, gt_strict, le};
use pn_cover::analysis::reachability::{ExplorationMode, StateGraph, StateGraphConfig};
use pn_cover::analysis::simulation::{FiringStrategy, Simulator};
use pn_cover::models;
use pn_cover::net::{Marking, Net, NetSpec, PlaceId, Tokens, TransitionId};

fn m(counts: &[u64]) -> Marking {
    Marking::from_counts(counts.iter().copied())
}

fn with_omega(marking: Marking, place: u32) -> Marking {
    marking.with_place(PlaceId::new(place), Tokens::Omega)
}

fn labels(graph: &StateGraph) -> Vec<String> {
    graph.nodes().into_iter().map(|node| node.label).collect()
}

#[test]
fn bounded_two_place_cycle_has_two_states() {
    let net = models::two_place_cycle().unwrap();
    let graph = StateGraph::from_net(&net, StateGraphConfig::bounded()).unwrap();

    assert_eq!(labels(&graph), vec!["(p1:1, p2:0)", "(p1:0, p2:1)"]);
    let edges: Vec<_> = graph
        .edges()
        .into_iter()
        .map(|edge| (edge.source.to_string(), edge.transition, edge.target.to_string()))
        .collect();
    assert_eq!(
        edges,
        vec![
            ("(1, 0)".to_owned(), "t1".to_owned(), "(0, 1)".to_owned()),
            ("(0, 1)".to_owned(), "t2".to_owned(), "(1, 0)".to_owned()),
        ]
    );
    assert!(graph.deadlocks.is_empty());
    assert!(!graph.truncated);
}

#[test]
fn coverability_on_generator_terminates_with_omega() {
    let net = models::token_generator().unwrap();
    for policy in [AncestorPolicy::Path, AncestorPolicy::Visited] {
        let graph = StateGraph::from_net(&net, StateGraphConfig::coverability(policy)).unwrap();
        assert_eq!(labels(&graph), vec!["(p1:1, p2:0)", "(p1:1, p2:ω)"]);
        assert_eq!(graph.stats().edge_count, 3);

        let omega_node = graph.node_for(&with_omega(m(&[1, 0]), 1)).unwrap();
        let self_loops = graph
            .edges()
            .into_iter()
            .filter(|edge| edge.source == edge.target)
            .count();
        assert_eq!(self_loops, 2);
        assert_eq!(graph.path_to(omega_node), vec![TransitionId::new(0)]);
    }
}

/// s:1, q:0 with `ta: s -> q` and `tb: s -> 2q`. The two successors of the
/// root are siblings, so only the visited-set comparison sees (0, 2) > (0, 1).
fn sibling_growth() -> Net {
    serde_json::from_str::<NetSpec>(
        r#"{"places": [{"name": "s", "tokens": 1}, {"name": "q"}],
            "transitions": [
                {"name": "ta", "consumes": ["s"], "produces": ["q"]},
                {"name": "tb", "consumes": ["s"], "produces": [{"place": "q", "weight": 2}]}
            ]}"#,
    )
    .unwrap()
    .build()
    .unwrap()
}

#[test]
fn ancestor_policies_disagree_on_sibling_growth() {
    let net = sibling_growth();

    let path = StateGraph::from_net(&net, StateGraphConfig::coverability(AncestorPolicy::Path)).unwrap();
    assert_eq!(labels(&path), vec!["(s:1, q:0)", "(s:0, q:1)", "(s:0, q:2)"]);
    assert_eq!(path.stats().omega_state_count, 0);
    assert!(BoundnessAnalyzer::from_graph(&path).is_bounded());

    let visited =
        StateGraph::from_net(&net, StateGraphConfig::coverability(AncestorPolicy::Visited)).unwrap();
    assert_eq!(labels(&visited), vec!["(s:1, q:0)", "(s:0, q:1)", "(s:0, q:ω)"]);
    assert_eq!(visited.stats().omega_state_count, 1);
    assert_eq!(visited.deadlocks.len(), 2);
}

#[test]
fn short_start_marking_is_rejected_not_truncated() {
    let net = models::two_place_cycle().unwrap();
    let t1 = net.transition_by_name("t1").unwrap();
    assert!(net.fire_transition(&m(&[1]), t1).is_err());
    assert!(StateGraph::from_marking(&net, m(&[1]), StateGraphConfig::bounded()).is_err());

    let graph = StateGraph::from_marking(&net, m(&[1, 0]), StateGraphConfig::bounded()).unwrap();
    assert_eq!(labels(&graph), vec!["(p1:1, p2:0)", "(p1:0, p2:1)"]);
    assert!(graph.deadlocks.is_empty());
}

#[test]
fn producer_chain_ends_in_deadlock() {
    let net = models::producer_chain().unwrap();
    let graph = StateGraph::from_net(&net, StateGraphConfig::default()).unwrap();

    assert_eq!(
        labels(&graph),
        vec!["(P1:1, P2:0, P3:0)", "(P1:0, P2:1, P3:0)", "(P1:0, P2:0, P3:2)"]
    );
    assert_eq!(graph.stats().edge_count, 2);
    assert_eq!(graph.export().deadlocks, vec![2]);

    let report = analyze(&net).unwrap();
    assert!(!report.safe);
    assert_eq!(report.deadlocks, vec!["(P1:0, P2:0, P3:2)".to_owned()]);
}

#[test]
fn traffic_light_is_safe_and_live() {
    let net = models::traffic_light().unwrap();
    let graph = StateGraph::from_net(&net, StateGraphConfig::default()).unwrap();
    assert_eq!(graph.stats().state_count, 5);
    assert_eq!(graph.stats().edge_count, 6);

    let report = BoundnessAnalyzer::report(&net, &graph);
    assert!(report.safe);
    assert!(report.complete);
    assert!(report.deadlocks.is_empty());
    assert!(report.dead_transitions.is_empty());

    // The two roads are never green at the same time.
    let ns_green = net.place_by_name("NS_Green").unwrap();
    let ew_green = net.place_by_name("EW_Green").unwrap();
    for node in graph.graph.node_weights() {
        let both = node.marking.get(ns_green) == Tokens::Finite(1)
            && node.marking.get(ew_green) == Tokens::Finite(1);
        assert!(!both, "{}", node.label);
    }
}

#[test]
fn edges_only_reference_existing_nodes_and_keys_are_unique() {
    let nets: Vec<Net> = models::NAMES
        .iter()
        .map(|name| models::by_name(name).unwrap().unwrap())
        .collect();
    for net in &nets {
        for config in [
            StateGraphConfig::default(),
            StateGraphConfig::coverability(AncestorPolicy::Visited),
            StateGraphConfig::bounded().with_state_limit(50),
        ] {
            let export = StateGraph::from_net(net, config).unwrap().export();
            let keys: Vec<_> = export.nodes.iter().map(|node| &node.key).collect();
            let mut unique = keys.clone();
            unique.sort();
            unique.dedup();
            assert_eq!(unique.len(), keys.len());
            for edge in &export.edges {
                assert!(keys.contains(&&edge.source));
                assert!(keys.contains(&&edge.target));
            }
            for (position, node) in export.nodes.iter().enumerate() {
                assert_eq!(node.index, position);
            }
        }
    }
}

#[test]
fn state_limit_returns_partial_graph() {
    let net = models::token_generator().unwrap();
    let graph = StateGraph::from_net(&net, StateGraphConfig::bounded().with_state_limit(3)).unwrap();
    assert!(graph.truncated);
    assert_eq!(graph.stats().state_count, 3);
    assert!(matches!(
        BoundnessAnalyzer::from_graph(&graph),
        BoundnessResult::Unknown { .. }
    ));
}

#[test]
fn exploration_is_deterministic() {
    let net = models::traffic_light().unwrap();
    let first = serde_json::to_string(&StateGraph::from_net(&net, StateGraphConfig::default()).unwrap().export()).unwrap();
    let second = serde_json::to_string(&StateGraph::from_net(&net, StateGraphConfig::default()).unwrap().export()).unwrap();
    assert_eq!(first, second);
}

#[test]
fn comparator_properties() {
    let samples = [
        m(&[0, 0, 0]),
        m(&[1, 2, 3]),
        m(&[2, 2, 3]),
        with_omega(m(&[1, 2, 0]), 2),
        with_omega(with_omega(m(&[0, 0, 0]), 0), 1),
    ];
    for a in &samples {
        assert!(le(a, a));
        assert!(!gt_strict(a, a));
        for b in &samples {
            if gt_strict(a, b) {
                assert!(le(b, a));
                assert!(!le(a, b));
            }
            for c in &samples {
                if le(a, b) && le(b, c) {
                    assert!(le(a, c));
                }
            }
        }
    }
}

#[test]
fn accelerate_is_idempotent_over_generated_markings() {
    let known = [m(&[1, 0, 0]), m(&[1, 1, 0]), m(&[0, 2, 1]), with_omega(m(&[0, 0, 0]), 2)];
    for candidate in [m(&[1, 1, 1]), m(&[2, 3, 1]), m(&[0, 2, 4]), m(&[5, 0, 0])] {
        let (once, _) = accelerate(&candidate, known.iter());
        let (twice, changed) = accelerate(&once, known.iter());
        assert!(!changed);
        assert_eq!(once, twice);
        assert!(le(&candidate, &once));
    }
}

#[test]
fn clamped_firing_does_not_round_trip() {
    let net: Net = serde_json::from_str::<NetSpec>(
        r#"{"places": [{"name": "a", "tokens": 1}, {"name": "b"}],
            "transitions": [
                {"name": "drain", "consumes": ["a"], "produces": ["b"]},
                {"name": "undo", "consumes": ["b"], "produces": ["a"]}
            ]}"#,
    )
    .unwrap()
    .build()
    .unwrap();
    let (a, b) = (PlaceId::new(0), PlaceId::new(1));
    let drain = net.transition_by_name("drain").unwrap();
    let undo = net.transition_by_name("undo").unwrap();

    let start = net.initial_marking();
    let forth_and_back = net.fire_sequence(&start, &[drain, undo]).unwrap();
    assert_eq!(forth_and_back, start);

    // Consuming three from one token clamps to zero; putting three back does
    // not restore the original count.
    let arcs = net.arcs_of(drain).unwrap();
    assert_eq!(arcs.consumed(a), 1);
    let clamped = start.with_effect(&[(a, 3)], &[]);
    assert_eq!(clamped.get(a), Tokens::ZERO);
    assert_ne!(clamped.with_effect(&[], &[(a, 3)]), start);
    assert_eq!(clamped.get(b), Tokens::ZERO);
}

#[test]
fn enabling_threshold_and_omega() {
    let net = models::producer_chain().unwrap();
    let t2 = net.transition_by_name("T2").unwrap();
    let p2 = net.place_by_name("P2").unwrap();
    let base = m(&[0, 0, 0]);
    assert!(!net.is_enabled(&base, t2));
    assert!(net.is_enabled(&base.with_place(p2, Tokens::Finite(1)), t2));
    assert!(net.is_enabled(&base.with_place(p2, Tokens::Finite(4)), t2));
    assert!(net.is_enabled(&base.with_place(p2, Tokens::Omega), t2));

    let after = net.fire_transition(&base.with_place(p2, Tokens::Omega), t2).unwrap();
    assert_eq!(after.get(p2), Tokens::Omega);
}

#[test]
fn keys_match_iff_markings_match() {
    let a = m(&[1, 4]);
    assert_eq!(a.canonical_key(), m(&[1, 4]).canonical_key());
    assert_ne!(a.canonical_key(), m(&[4, 1]).canonical_key());
    assert_ne!(
        with_omega(m(&[1, 0]), 1).canonical_key(),
        m(&[1, u64::MAX]).canonical_key()
    );
}

#[test]
fn simulation_agrees_with_reachability() {
    let net = models::traffic_light().unwrap();
    let graph = StateGraph::from_net(&net, StateGraphConfig::default()).unwrap();
    let trace = Simulator::new(&net)
        .with_strategy(FiringStrategy::Random { seed: 11 })
        .with_max_steps(40)
        .run()
        .unwrap();
    assert_eq!(trace.steps.len(), 40);
    assert!(trace.steps.iter().all(|step| graph.contains_marking(&step.marking)));
}

#[test]
fn bounded_and_coverability_agree_on_finite_nets() {
    let net = models::traffic_light().unwrap();
    let bounded = StateGraph::from_net(&net, StateGraphConfig::bounded()).unwrap();
    let cover = StateGraph::from_net(&net, StateGraphConfig::default()).unwrap();
    assert_eq!(bounded.mode, ExplorationMode::Bounded);
    assert_eq!(labels(&bounded), labels(&cover));
    assert_eq!(bounded.edges(), cover.edges());
}
