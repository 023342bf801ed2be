use timeclad_core::{Cladogram, Connector, Date, Domain, DuplicateNames, Node};
use timeclad_layout::{
    DerivationStyle, Error, Forest, LayoutOptions, ReferenceKind, TreeMode, Warning, layout,
};

fn node(name: &str, parent: &str, start: i32, stop: i32) -> Node {
    Node::new(name)
        .with_parent(parent)
        .with_span(Date::year(start), Date::year(stop))
}

fn opts() -> LayoutOptions {
    LayoutOptions::default().with_end_of_time(Date::year(2030))
}

#[test]
fn overlapping_root_cannot_join_a_tree_lane() {
    // C overlaps both A and B in time, so all three need their own lane.
    let clad = Cladogram::new()
        .with_node(node("A", "", 1990, 2000))
        .with_node(node("B", "A", 1992, 1998))
        .with_node(node("C", "", 1991, 1995));
    let out = layout(&clad, &opts()).unwrap();

    assert_eq!(out.lane_of("A"), Some(0));
    assert_eq!(out.lane_of("B"), Some(1));
    assert_eq!(out.lane_of("C"), Some(2));
    assert_eq!(out.maximum_offset, 2);
    assert_eq!(out.beginning_of_time, Date::ymd(1990, 1, 1));
}

#[test]
fn isolated_roots_are_injected_into_a_shared_lane() {
    let clad = Cladogram::new()
        .with_node(node("A", "", 1990, 2000))
        .with_node(node("B", "A", 1992, 1998))
        .with_node(node("C", "", 2001, 2005))
        .with_node(node("D", "", 1980, 1985));
    let out = layout(&clad, &opts()).unwrap();

    assert_eq!(out.lane_of("A"), Some(0));
    assert_eq!(out.lane_of("B"), Some(1));
    assert_eq!(out.lane_of("C"), Some(2));
    assert_eq!(out.lane_of("D"), Some(2));
    assert_eq!(out.maximum_offset, 2);
}

#[test]
fn two_disjoint_isolated_roots_share_one_lane() {
    let clad = Cladogram::new()
        .with_node(node("X", "", 1990, 1995))
        .with_node(node("Y", "", 1997, 2000));
    let out = layout(&clad, &opts()).unwrap();
    assert_eq!(out.lane_of("X"), Some(0));
    assert_eq!(out.lane_of("Y"), Some(0));

    let out = layout(&clad, &opts().with_optimise(0, 9)).unwrap();
    assert_eq!(out.lane_of("X"), Some(0));
    assert_eq!(out.lane_of("Y"), Some(1));
}

#[test]
fn stop_spacing_keeps_touching_nodes_apart() {
    let clad = Cladogram::new()
        .with_node(node("X", "", 1990, 1995))
        .with_node(node("Y", "", 1995, 2000));
    let out = layout(&clad, &opts()).unwrap();
    assert_ne!(out.lane_of("X"), out.lane_of("Y"));

    let mut no_spacing = opts();
    no_spacing.stop_spacing = Date::ymd(0, 0, 0);
    let clad = Cladogram::new()
        .with_node(Node::new("X").with_span(Date::year(1990), Date::ymd(1994, 12, 30)))
        .with_node(node("Y", "", 1995, 2000));
    let out = layout(&clad, &no_spacing).unwrap();
    assert_eq!(out.lane_of("X"), out.lane_of("Y"));
}

#[test]
fn stop_before_start_is_a_chronology_error() {
    let clad = Cladogram::new().with_node(node("Broken", "", 2000, 1990));
    match layout(&clad, &opts()) {
        Err(Error::Chronology { name, .. }) => assert_eq!(name, "Broken"),
        other => panic!("expected a chronology error, got {other:?}"),
    }
}

#[test]
fn child_starting_before_its_parent_is_a_chronology_error() {
    let clad = Cladogram::new()
        .with_node(node("P", "", 1990, 2000))
        .with_node(node("K", "P", 1985, 1995));
    let err = layout(&clad, &opts()).unwrap_err();
    assert_eq!(err.to_string(), "K starts before its parent P");
}

#[test]
fn dangling_connector_endpoint_is_a_reference_error() {
    let clad = Cladogram::new()
        .with_node(node("A", "", 1990, 2000))
        .with_connector(Connector::new("A", Date::year(1995), "Ghost", Date::year(1996)));
    match layout(&clad, &opts()) {
        Err(Error::Reference { kind, name, .. }) => {
            assert_eq!(kind, ReferenceKind::ConnectorEndpoint);
            assert_eq!(name, "Ghost");
        }
        other => panic!("expected a reference error, got {other:?}"),
    }
}

#[test]
fn missing_parent_and_self_parent_are_rejected() {
    let clad = Cladogram::new().with_node(node("A", "Nobody", 1990, 2000));
    assert!(matches!(
        layout(&clad, &opts()),
        Err(Error::Reference { kind: ReferenceKind::Parent, .. })
    ));

    let clad = Cladogram::new().with_node(node("A", "A", 1990, 2000));
    assert!(matches!(layout(&clad, &opts()), Err(Error::SelfReference { .. })));

    let clad = Cladogram::new().with_domain(Domain::new("Nobody", Default::default()));
    assert!(matches!(
        layout(&clad, &opts()),
        Err(Error::Reference { kind: ReferenceKind::Domain, .. })
    ));
}

#[test]
fn parent_cycles_are_rejected() {
    let clad = Cladogram::new()
        .with_node(node("A", "B", 1990, 2000))
        .with_node(node("B", "A", 1990, 2000));
    assert!(matches!(layout(&clad, &opts()), Err(Error::Cycle { .. })));
}

#[test]
fn domain_spans_its_node_and_all_descendants() {
    let clad = Cladogram::new()
        .with_node(node("X", "", 1990, 2020))
        .with_node(node("Y", "X", 1995, 2020))
        .with_domain(Domain::new("X", Default::default()));
    let opts = opts();
    let mut forest = Forest::build(&clad, &opts).unwrap();
    let (x, y) = (forest.index_of("X").unwrap(), forest.index_of("Y").unwrap());
    forest.nodes[x].lane = 2;
    forest.nodes[y].lane = 5;
    let out = forest.into_layout(&opts);

    let d = out.domain_of("X").unwrap();
    assert_eq!((d.offset_a, d.offset_b), (2, 5));
    assert!(out
        .warnings
        .iter()
        .any(|w| matches!(w, Warning::SmallDomain { node, size: 2 } if node == "X")));
}

#[test]
fn connectors_take_the_lanes_of_their_endpoints() {
    let clad = Cladogram::new()
        .with_node(node("A", "", 1990, 2020))
        .with_node(node("B", "", 1990, 2020))
        .with_connector(Connector::new("B", Date::year(1995), "A", Date::year(1996)));
    let out = layout(&clad, &opts()).unwrap();
    let c = &out.connectors[0];
    assert_eq!(c.offset_a, out.lane_of("B").unwrap());
    assert_eq!(c.offset_b, out.lane_of("A").unwrap());
    assert_eq!(c.connector.from_when, Date::ymd(1995, 1, 1));
}

#[test]
fn records_past_the_end_of_time_are_dropped_with_warnings() {
    let clad = Cladogram::new()
        .with_node(node("Old", "", 1990, 2000))
        .with_node(node("Future", "", 2040, 2050))
        .with_domain(Domain::new("Future", Default::default()))
        .with_connector(Connector::new("Old", Date::year(1995), "Future", Date::year(1995)))
        .with_connector(Connector::new("Old", Date::year(2045), "Old", Date::year(2045)));
    let out = layout(&clad, &opts()).unwrap();

    assert_eq!(out.nodes.len(), 1);
    assert!(out.domains.is_empty());
    assert!(out.connectors.is_empty());
    assert_eq!(
        out.warnings,
        vec![
            Warning::NodeAfterEndOfTime {
                name: "Future".to_string()
            },
            Warning::DomainDropped {
                node: "Future".to_string()
            },
            Warning::ConnectorDropped {
                from: "Old".to_string(),
                to: "Future".to_string()
            },
            Warning::ConnectorAfterEndOfTime {
                from: "Old".to_string(),
                to: "Old".to_string()
            },
        ]
    );
}

#[test]
fn open_and_late_stops_end_at_the_end_of_time() {
    let clad = Cladogram::new()
        .with_node(Node::new("Open").with_span(Date::ym(1990, 0), Date::default()))
        .with_node(node("Late", "", 1990, 2100));
    let out = layout(&clad, &opts()).unwrap();
    let end = Date::year(2030).normalized();
    assert_eq!(out.node("Open").unwrap().node.stop, end);
    assert_eq!(out.node("Late").unwrap().node.stop, end);
    assert_eq!(out.node("Open").unwrap().node.start, Date::ymd(1990, 1, 1));
}

#[test]
fn duplicate_names_warn_and_the_last_one_wins() {
    let clad = Cladogram::new()
        .with_node(node("P", "", 1990, 2020))
        .with_node(node("P", "", 1995, 2020))
        .with_node(node("K", "P", 1996, 2020));
    let out = layout(&clad, &opts()).unwrap();
    assert_eq!(out.nodes[2].parent, Some(1));
    assert!(out.warnings.contains(&Warning::DuplicateName {
        name: "P".to_string(),
        first: 1,
        second: 2,
    }));

    let mut strict = opts();
    strict.duplicate_names = DuplicateNames::Error;
    assert!(matches!(
        layout(&clad, &strict),
        Err(Error::DuplicateName { first: 1, second: 2, .. })
    ));
}

#[test]
fn slice_keeps_one_subtree() {
    let clad = Cladogram::new()
        .with_node(node("R", "", 1980, 2020))
        .with_node(node("A", "R", 1990, 2020))
        .with_node(node("A1", "A", 1995, 2020))
        .with_node(node("B", "R", 1985, 2020));
    let mut sliced = opts();
    sliced.slice = Some("A".to_string());
    let out = layout(&clad, &sliced).unwrap();

    let names: Vec<_> = out.nodes.iter().map(|n| n.node.name.as_str()).collect();
    assert_eq!(names, vec!["A", "A1"]);
    assert_eq!(out.nodes[0].parent, None);
    assert_eq!(out.nodes[1].parent, Some(0));
    assert_eq!(out.beginning_of_time, Date::ymd(1990, 1, 1));

    sliced.slice = Some("Nope".to_string());
    assert!(matches!(
        layout(&clad, &sliced),
        Err(Error::Reference { kind: ReferenceKind::Slice, .. })
    ));
}

fn fan() -> Cladogram {
    Cladogram::new()
        .with_node(node("R", "", 1990, 2020))
        .with_node(node("c1", "R", 1991, 2020))
        .with_node(node("c2", "R", 1992, 2020))
        .with_node(node("c3", "R", 1993, 2020))
}

fn lanes(out: &timeclad_layout::Layout) -> Vec<i32> {
    out.nodes.iter().map(|n| n.lane).collect()
}

#[test]
fn tree_modes_spread_children_differently() {
    let base = opts().with_optimise(0, 0);

    let out = layout(&fan(), &base.clone().with_tree_mode(TreeMode::BothSides)).unwrap();
    assert_eq!(lanes(&out), vec![1, 3, 0, 2]);

    let out = layout(&fan(), &base.clone().with_tree_mode(TreeMode::LowerOnly)).unwrap();
    assert_eq!(lanes(&out), vec![0, 1, 2, 3]);

    let out = layout(&fan(), &base.with_tree_mode(TreeMode::LowerOnlyInverse)).unwrap();
    assert_eq!(lanes(&out), vec![0, 3, 2, 1]);
}

#[test]
fn gap_filling_merges_a_lane_that_fits() {
    let clad = Cladogram::new()
        .with_node(node("R", "", 1950, 2020))
        .with_node(node("c1", "R", 1960, 1970))
        .with_node(node("c2", "R", 1960, 2020))
        .with_node(node("c3", "R", 1980, 2020));
    let out = layout(&clad, &opts().with_optimise(0, 1)).unwrap();
    assert_eq!(lanes(&out), vec![1, 2, 0, 2]);
}

#[test]
fn root_that_stops_early_shares_its_lane_with_a_later_child() {
    let clad = Cladogram::new()
        .with_node(node("R", "", 1950, 1960))
        .with_node(node("a", "R", 1955, 2020))
        .with_node(node("b", "R", 1970, 2020));
    let out = layout(&clad, &opts()).unwrap();
    assert_eq!(lanes(&out), vec![0, 1, 0]);
    assert!(out.warnings.contains(&Warning::StartsAfterParentStops {
        name: "b".to_string(),
        parent: "R".to_string(),
    }));
}

#[test]
fn big_neighbouring_trees_get_padding_lanes() {
    let clad = Cladogram::new()
        .with_node(node("R1", "", 1990, 2000))
        .with_node(node("K1", "R1", 1991, 1999))
        .with_node(node("R2", "", 1990, 2000))
        .with_node(node("K2", "R2", 1991, 1999));
    let mut padded = opts().with_optimise(0, 0);
    padded.tree_spacing_bigger_than = 1;
    let out = layout(&clad, &padded).unwrap();
    assert_eq!(lanes(&out), vec![0, 1, 3, 4]);

    padded.tree_spacing = 2;
    let out = layout(&clad, &padded).unwrap();
    assert_eq!(lanes(&out), vec![0, 1, 4, 5]);

    padded.tree_spacing_bigger_than = 5;
    let out = layout(&clad, &padded).unwrap();
    assert_eq!(lanes(&out), vec![0, 1, 2, 3]);
}

#[test]
fn isolated_runs_are_never_padded() {
    let clad = Cladogram::new()
        .with_node(node("X", "", 1990, 2000))
        .with_node(node("Y", "", 1990, 2000));
    let mut padded = opts();
    padded.tree_spacing_bigger_than = 0;
    let out = layout(&clad, &padded).unwrap();
    assert_eq!(lanes(&out), vec![0, 1]);
}

#[test]
fn lane_fit_compares_rolled_over_dates() {
    // With 30-day months Q starts on 2000.2.5, after R; M ends on 2000.2.1 and touches R.
    let clad = Cladogram::new()
        .with_node(Node::new("R").with_span(Date::ymd(2000, 2, 1), Date::ymd(2000, 2, 2)))
        .with_node(Node::new("Q").with_span(Date::ymd(2000, 1, 35), Date::ymd(2000, 2, 8)))
        .with_node(Node::new("M").with_span(Date::ymd(2000, 1, 28), Date::ymd(2000, 2, 1)));
    let mut options = opts();
    options.stop_spacing = Date::ymd(0, 0, 1);

    let mut forest = Forest::build(&clad, &options).unwrap();
    for (name, lane) in [("R", 0), ("Q", 0), ("M", 1)] {
        let i = forest.index_of(name).unwrap();
        forest.nodes[i].lane = lane;
    }
    let m = forest.index_of("M").unwrap();
    assert!(!forest.fits_into(0, m, &options));

    let out = layout(&clad, &options).unwrap();
    assert_ne!(out.lane_of("M"), out.lane_of("R"));
    assert_ne!(out.lane_of("M"), out.lane_of("Q"));
}

#[test]
fn chronology_checks_roll_over_days_and_months() {
    let clad = Cladogram::new()
        .with_node(Node::new("P").with_span(Date::ymd(2000, 2, 3), Date::year(2010)))
        .with_node(
            Node::new("K")
                .with_parent("P")
                .with_span(Date::ymd(2000, 1, 35), Date::year(2010)),
        );
    let out = layout(&clad, &opts()).unwrap();
    assert!(out.lane_of("K").is_some());
    assert_ne!(out.lane_of("K"), out.lane_of("P"));

    // 2029.14.1 is 2030.2.1, past the end of time.
    let clad = Cladogram::new()
        .with_node(node("A", "", 2000, 2010))
        .with_node(Node::new("Late").with_span(Date::ymd(2029, 14, 1), Date::year(2031)));
    let out = layout(&clad, &opts().with_end_of_time(Date::ymd(2030, 1, 15))).unwrap();
    assert_eq!(out.lane_of("Late"), None);
    assert!(out.warnings.contains(&Warning::NodeAfterEndOfTime {
        name: "Late".to_string(),
    }));
}

#[test]
fn padding_survives_a_second_round() {
    let clad = Cladogram::new()
        .with_node(node("R1", "", 1990, 2000))
        .with_node(node("K1", "R1", 1991, 1999))
        .with_node(node("R2", "", 1990, 2000))
        .with_node(node("K2", "R2", 1991, 1999));
    let mut padded = opts().with_optimise(0, 0);
    padded.tree_spacing_bigger_than = 1;

    let mut forest = Forest::build(&clad, &padded).unwrap();
    forest.assign_lanes(padded.tree_mode).unwrap();
    forest.compact(&padded);
    forest.space_trees(&padded);
    let once = forest.lanes();
    assert_eq!(once, vec![0, 1, 3, 4]);

    forest.space_trees(&padded);
    assert_eq!(forest.lanes(), once);
    forest.compact(&padded);
    forest.space_trees(&padded);
    assert_eq!(forest.lanes(), once);
}

#[test]
fn strict_overlaps_keep_a_child_off_a_lane_its_derivation_line_would_cross() {
    // Y fits between R and Z in time, but a line drawn from R's start to Y would pass Z.
    let clad = Cladogram::new()
        .with_node(node("R", "", 1900, 2000))
        .with_node(node("Z", "R", 1960, 2000))
        .with_node(node("Y", "R", 1910, 1950))
        .with_node(node("W", "R", 1960, 2000));
    let mut options = opts().with_optimise(0, 5);
    options.derivation = DerivationStyle::FromParentStart;
    let pulled = |options: &LayoutOptions| {
        let mut forest = Forest::build(&clad, options).unwrap();
        for (name, lane) in [("R", 0), ("Z", 1), ("Y", 2), ("W", 2)] {
            let i = forest.index_of(name).unwrap();
            forest.nodes[i].lane = lane;
        }
        forest.compact(options);
        forest.lanes()
    };

    assert_eq!(pulled(&options), vec![0, 1, 1, 2]);
    options.strict_overlaps = true;
    assert_eq!(pulled(&options), vec![0, 1, 2, 2]);
}

#[test]
fn fat_parent_lines_get_empty_lanes_around_them() {
    let mut fat = opts().with_optimise(0, 0);
    fat.big_parent = 10.0;

    let out = layout(&fan(), &fat.clone().with_tree_mode(TreeMode::LowerOnly)).unwrap();
    assert_eq!(lanes(&out), vec![0, 2, 3, 4]);

    let out = layout(&fan(), &fat.clone().with_tree_mode(TreeMode::BothSides)).unwrap();
    assert_eq!(lanes(&out), vec![2, 5, 0, 4]);

    fat.big_parent = 5.0;
    let out = layout(&fan(), &fat.with_tree_mode(TreeMode::BothSides)).unwrap();
    assert_eq!(lanes(&out), vec![1, 3, 0, 2]);
}
