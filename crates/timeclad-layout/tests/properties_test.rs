use timeclad_core::{Cladogram, Date, Domain, Node};
use timeclad_layout::{
    DerivationStyle, Forest, Layout, LayoutOptions, TreeMode, layout,
};

/// A deterministic pseudo-random forest: about a quarter roots, the rest attached to an
/// earlier node and starting after it.
fn synthetic(count: usize, seed: u64) -> Cladogram {
    let mut state = seed;
    let mut next = move |bound: u64| {
        state = state
            .wrapping_mul(6_364_136_223_846_793_005)
            .wrapping_add(1_442_695_040_888_963_407);
        (state >> 33) % bound.max(1)
    };

    let mut clad = Cladogram::new();
    let mut starts: Vec<i32> = Vec::with_capacity(count);
    for i in 0..count {
        let parent = (i > 0 && next(4) != 0).then(|| next(i as u64) as usize);
        let start_year = match parent {
            Some(p) => starts[p] + 1 + next(6) as i32,
            None => 1950 + next(40) as i32,
        };
        let start = Date::ym(start_year, 1 + next(12) as i32);
        let stop = if next(5) == 0 {
            Date::default()
        } else {
            Date::ym(start_year + next(25) as i32, 1 + next(12) as i32)
        };
        let stop = if stop.is_unset() || stop >= start {
            stop
        } else {
            Date::ym(start_year, 12)
        };

        let mut node = Node::new(format!("n{i}")).with_span(start, stop);
        if let Some(p) = parent {
            node = node.with_parent(format!("n{p}"));
        }
        clad.nodes.push(node);
        starts.push(start_year);

        if i % 7 == 0 {
            clad.domains
                .push(Domain::new(format!("n{i}"), Default::default()));
        }
    }
    clad
}

fn option_grid() -> Vec<LayoutOptions> {
    let base = LayoutOptions::default().with_end_of_time(Date::year(2200));
    let mut out = Vec::new();
    for mode in [
        TreeMode::BothSides,
        TreeMode::LowerOnly,
        TreeMode::LowerOnlyInverse,
    ] {
        for (isolated, trees) in [(0, 0), (1, 1), (3, 3), (5, 5), (6, 6), (7, 7), (8, 8), (9, 9)] {
            out.push(base.clone().with_tree_mode(mode).with_optimise(isolated, trees));
        }
    }
    let mut strict = base.with_optimise(9, 7);
    strict.strict_overlaps = true;
    strict.derivation = DerivationStyle::FromParentStart;
    out.push(strict);
    out
}

fn widened_disjoint(a: &Node, b: &Node, opts: &LayoutOptions) -> bool {
    let ends = |n: &Node| (n.stop + opts.stop_spacing).resolve_overflow(opts.calendar);
    let begins = |n: &Node| n.start.resolve_overflow(opts.calendar);
    ends(a) < begins(b) || ends(b) < begins(a)
}

fn assert_invariants(out: &Layout, opts: &LayoutOptions) {
    for (i, n) in out.nodes.iter().enumerate() {
        let children_total: usize = n.children.iter().map(|&c| out.nodes[c].size).sum();
        assert_eq!(n.size, 1 + children_total, "size of {}", n.node.name);
        assert!(n.lane >= 0, "{} has a negative lane", n.node.name);
        assert!(n.node.start <= n.node.stop);
        if let Some(p) = n.parent {
            assert!(out.nodes[p].node.start <= n.node.start);
            assert!(out.nodes[p].children.contains(&i));
        }
    }

    for (i, a) in out.nodes.iter().enumerate() {
        for b in &out.nodes[i + 1..] {
            if a.lane == b.lane {
                assert!(
                    widened_disjoint(&a.node, &b.node, opts),
                    "{} and {} overlap on lane {}",
                    a.node.name,
                    b.node.name,
                    a.lane
                );
            }
        }
    }

    for d in &out.domains {
        assert!(d.offset_a <= out.nodes[d.node].lane && out.nodes[d.node].lane <= d.offset_b);
        for i in 0..out.nodes.len() {
            if out.descends_from(i, d.node) {
                let lane = out.nodes[i].lane;
                assert!(d.offset_a <= lane && lane <= d.offset_b);
            }
        }
    }

    let max = out.nodes.iter().map(|n| n.lane).max().unwrap_or(0);
    assert_eq!(out.maximum_offset, max);
}

#[test]
fn layouts_hold_their_invariants() {
    for seed in [1, 7, 42] {
        let clad = synthetic(120, seed);
        for opts in option_grid() {
            let out = layout(&clad, &opts).unwrap();
            assert_eq!(out.nodes.len(), clad.nodes.len());
            assert_invariants(&out, &opts);
        }
    }
}

#[test]
fn compaction_reaches_a_fixed_point() {
    let clad = synthetic(150, 3);
    for opts in option_grid() {
        let mut forest = Forest::build(&clad, &opts).unwrap();
        forest.assign_lanes(opts.tree_mode).unwrap();
        forest.compact(&opts);
        forest.space_trees(&opts);
        let once = forest.lanes();
        forest.compact(&opts);
        forest.space_trees(&opts);
        assert_eq!(forest.lanes(), once, "{opts:?}");
    }
}

#[test]
fn layout_is_deterministic() {
    let clad = synthetic(200, 11);
    let opts = LayoutOptions::default().with_end_of_time(Date::year(2200));
    let first = layout(&clad, &opts).unwrap();
    let second = layout(&clad, &opts).unwrap();
    let lanes = |l: &Layout| l.nodes.iter().map(|n| n.lane).collect::<Vec<_>>();
    assert_eq!(lanes(&first), lanes(&second));
}

#[test]
fn compaction_never_adds_lanes() {
    let clad = synthetic(150, 5);
    let mut base = LayoutOptions::default().with_end_of_time(Date::year(2200));
    base.tree_spacing = 0;
    let loose = layout(&clad, &base.clone().with_optimise(0, 0)).unwrap();
    let tight = layout(&clad, &base).unwrap();
    assert!(tight.maximum_offset <= loose.maximum_offset);
}

#[test]
fn initial_lanes_are_unique_and_contiguous_per_tree() {
    let clad = synthetic(80, 9);
    let opts = LayoutOptions::default().with_end_of_time(Date::year(2200));
    let mut forest = Forest::build(&clad, &opts).unwrap();
    forest.assign_lanes(opts.tree_mode).unwrap();

    let mut lanes = forest.lanes();
    lanes.sort_unstable();
    let expected: Vec<i32> = (0..forest.nodes.len() as i32).collect();
    assert_eq!(lanes, expected);

    for root in forest.roots() {
        let mut tree: Vec<i32> = forest
            .nodes
            .iter()
            .filter(|n| n.root == root)
            .map(|n| n.lane)
            .collect();
        tree.sort_unstable();
        assert_eq!(tree.len(), forest.nodes[root].size);
        assert!(tree.windows(2).all(|w| w[1] == w[0] + 1));
    }
}

#[test]
fn deep_chains_compact_to_one_lane_per_generation() {
    let depth = 3_000;
    let mut clad = Cladogram::new();
    for i in 0..depth {
        let mut node = Node::new(format!("g{i}")).with_span(Date::year(1900), Date::default());
        if i > 0 {
            node = node.with_parent(format!("g{}", i - 1));
        }
        clad.nodes.push(node);
    }
    let opts = LayoutOptions::default()
        .with_end_of_time(Date::year(2030))
        .with_optimise(0, 5)
        .with_tree_mode(TreeMode::LowerOnly);
    let out = layout(&clad, &opts).unwrap();

    let mut lanes: Vec<i32> = out.nodes.iter().map(|n| n.lane).collect();
    lanes.sort_unstable();
    lanes.dedup();
    assert_eq!(lanes.len(), depth);
    assert_eq!(out.maximum_offset, depth as i32 - 1);
}
