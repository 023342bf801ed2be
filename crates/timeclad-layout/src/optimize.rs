//! Lane compaction.
//!
//! All passes move nodes only onto lanes they fit into, so two nodes share a lane only when
//! their spacing-widened intervals are disjoint. Lanes left empty by a move are closed.

use crate::forest::{Forest, LaneNode};
use crate::options::{DerivationStyle, LayoutOptions};
use timeclad_core::{Date, Node};

/// How far past an isolated root single-node injection may look, by aggressiveness level.
/// A candidate run ends at the first root whose tree has at least this many nodes.
const TREE_BARRIER: [usize; 10] = [1, 1, 2, 2, 2, 5, 10, 20, 50, 999_999];

const MAX_PASSES: usize = 64;

impl Forest {
    /// Runs the compaction passes until lanes stop changing.
    ///
    /// Empty lanes left by earlier padding are closed first, so compacting an already laid out
    /// forest changes nothing.
    pub fn compact(&mut self, options: &LayoutOptions) {
        self.close_empty_lanes();
        if options.isolated.is_off() && options.trees.is_off() {
            return;
        }
        for pass in 1..=MAX_PASSES {
            let before = self.lanes();
            Compactor::new(self, options).run();
            if self.lanes() == before {
                tracing::debug!(passes = pass, "lane compaction converged");
                return;
            }
        }
        tracing::debug!(passes = MAX_PASSES, "lane compaction stopped without converging");
    }

    /// Pads the boundary between two neighbouring trees when one of them is big.
    ///
    /// Runs of isolated nodes stay tight: a boundary only counts when a node on either side
    /// has a parent or children. Boundaries that are already padded are left alone.
    pub fn space_trees(&mut self, options: &LayoutOptions) {
        if options.tree_spacing <= 0 {
            return;
        }
        let threshold = i64::from(options.tree_spacing_bigger_than);
        let order = self.lane_order();
        for pair in order.windows(2) {
            let (a, b) = (&self.nodes[pair[0]], &self.nodes[pair[1]]);
            let gap = b.lane - a.lane;
            if a.root == b.root || gap == 0 {
                continue;
            }
            let linked = a.parent.is_some()
                || b.parent.is_some()
                || !a.children.is_empty()
                || !b.children.is_empty();
            let big = self.nodes[a.root].size as i64 > threshold
                || self.nodes[b.root].size as i64 > threshold;
            let missing = options.tree_spacing + 1 - gap;
            if linked && big && missing > 0 {
                let lane = a.lane;
                self.move_lanes_higher_than(lane, missing);
            }
        }
    }

    /// Opens an empty lane on each side of a node whose line gets thick enough to reach more
    /// than 60% of the way into its neighbours' lanes.
    ///
    /// The line width grows with the square root of the subtree size.
    pub fn pad_fat_lines(&mut self, options: &LayoutOptions) {
        if options.big_parent <= 0.0 || options.offset_px <= 0 {
            return;
        }
        let reach = |size: usize| {
            f64::from(options.line_width) * ((size as f64).sqrt() - 1.0) * options.big_parent
                / f64::from(options.offset_px)
        };
        for i in 0..self.nodes.len() {
            if reach(self.nodes[i].size) <= 0.6 {
                continue;
            }
            let lane = self.nodes[i].lane;
            if lane > 0 && self.lane_is_occupied(lane - 1) {
                self.move_lanes_higher_than(lane - 1, 1);
            }
            let lane = self.nodes[i].lane;
            if self.lane_is_occupied(lane + 1) {
                self.move_lanes_higher_than(lane, 1);
            }
        }
    }

    /// Whether `node` could move onto `lane` without touching any node already there.
    ///
    /// Intervals are widened by the stop spacing; a node never fits into its own lane.
    pub fn fits_into(&self, lane: i32, node: usize, options: &LayoutOptions) -> bool {
        let me = &self.nodes[node];
        if me.lane == lane {
            return false;
        }
        let mut occupants: Vec<&Node> = self
            .nodes
            .iter()
            .filter(|o| o.lane == lane)
            .map(|o| &o.node)
            .collect();
        if occupants.is_empty() {
            return true;
        }
        let ends = |n: &Node| widened_stop(n, options);
        let begins = |n: &Node| n.start.resolve_overflow(options.calendar);
        occupants.sort_by_key(|&o| begins(o));

        let me = &me.node;
        let first = occupants[0];
        let latest_end = occupants.iter().map(|&o| ends(o)).max();
        if ends(me) < begins(first) || latest_end.is_some_and(|end| end < begins(me)) {
            return true;
        }
        occupants
            .windows(2)
            .any(|w| ends(w[0]) < begins(me) && ends(me) < begins(w[1]))
    }

    fn lane_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.nodes.len()).collect();
        order.sort_by_key(|&i| self.nodes[i].lane);
        order
    }

    fn move_lanes_higher_than(&mut self, lane: i32, delta: i32) {
        for n in &mut self.nodes {
            if n.lane > lane {
                n.lane += delta;
            }
        }
    }

    fn lane_is_occupied(&self, lane: i32) -> bool {
        self.nodes.iter().any(|n| n.lane == lane)
    }

    /// Renumbers lanes so that every lane from `0` to the highest one holds a node.
    fn close_empty_lanes(&mut self) {
        let mut used = self.lanes();
        used.sort_unstable();
        used.dedup();
        for n in &mut self.nodes {
            n.lane = used.partition_point(|&l| l < n.lane) as i32;
        }
    }

    fn close_lane_if_empty(&mut self, lane: i32) {
        if !self.nodes.iter().any(|n| n.lane == lane) {
            self.move_lanes_higher_than(lane, -1);
        }
    }
}

pub(crate) fn widened_stop(node: &Node, options: &LayoutOptions) -> Date {
    (node.stop + options.stop_spacing).resolve_overflow(options.calendar)
}

/// One pass over all roots in lane order.
struct Compactor<'a> {
    forest: &'a mut Forest,
    options: &'a LayoutOptions,
    roots: Vec<usize>,
}

impl<'a> Compactor<'a> {
    fn new(forest: &'a mut Forest, options: &'a LayoutOptions) -> Self {
        let mut roots = forest.roots();
        roots.sort_by_key(|&r| forest.nodes[r].lane);
        Self {
            forest,
            options,
            roots,
        }
    }

    fn run(&mut self) {
        let trees = self.options.trees;
        for i in 0..self.roots.len() {
            let root = self.roots[i];
            if self.size(root) == 1 {
                if !self.options.isolated.is_off() {
                    self.inject_single_root_at(i);
                }
                continue;
            }
            if trees.is_off() {
                continue;
            }
            self.fill_tree_gaps(root);
            if trees.level() >= 6 {
                self.pull_to_root(root, trees.level() >= 8);
            }
            if (3..8).contains(&trees.level()) {
                self.pull_to_parent(root);
            }
        }
    }

    fn lane(&self, node: usize) -> i32 {
        self.forest.nodes[node].lane
    }

    fn size(&self, node: usize) -> usize {
        self.forest.nodes[node].size
    }

    fn fits(&self, lane: i32, node: usize) -> bool {
        self.forest.fits_into(lane, node, self.options)
    }

    fn resort_roots(&mut self) {
        let nodes = &self.forest.nodes;
        self.roots.sort_by_key(|&r| nodes[r].lane);
    }

    fn move_node(&mut self, node: usize, lane: i32) {
        let old = self.lane(node);
        self.forest.nodes[node].lane = lane;
        self.forest.close_lane_if_empty(old);
    }

    /// Tree members in lane order.
    fn block_of(&self, root: usize) -> Vec<usize> {
        let nodes = &self.forest.nodes;
        let mut members: Vec<usize> = (0..nodes.len()).filter(|&i| nodes[i].root == root).collect();
        members.sort_by_key(|&i| nodes[i].lane);
        members
    }

    /// Moves the first later isolated root that fits onto the lane of `roots[pos]`.
    fn inject_single_root_at(&mut self, pos: usize) {
        let barrier = TREE_BARRIER[usize::from(self.options.isolated.level())];
        let count = self.roots.len();
        let mut up_to = pos + 1;
        loop {
            up_to += 1;
            if up_to >= count || self.size(self.roots[up_to]) >= barrier {
                break;
            }
        }
        let up_to = up_to.min(count);

        let anchor = self.roots[pos];
        for k in pos + 1..up_to {
            let candidate = self.roots[k];
            let target = self.lane(anchor);
            if self.size(candidate) == 1 && self.fits(target, candidate) {
                self.move_node(candidate, target);
                self.resort_roots();
                break;
            }
        }
    }

    /// Merges each lane of the tree into the one before it when everything on it fits.
    fn fill_tree_gaps(&mut self, root: usize) {
        let members = self.block_of(root);
        for pair in members.windows(2) {
            let (upper, lower) = (self.lane(pair[0]), self.lane(pair[1]));
            if upper == lower {
                continue;
            }
            let movers: Vec<usize> = (0..self.forest.nodes.len())
                .filter(|&i| self.lane(i) == lower)
                .collect();
            if movers.iter().all(|&m| self.fits(upper, m)) {
                for &m in &movers {
                    self.forest.nodes[m].lane = upper;
                }
                self.forest.close_lane_if_empty(lower);
            }
        }
    }

    /// Pulls tree members toward the root's lane, nearest first.
    ///
    /// Unless `stronger`, a node also stops when it reaches its parent's lane.
    fn pull_to_root(&mut self, root: usize, stronger: bool) {
        let mut members = self.block_of(root);
        let root_lane = self.lane(root);
        members.sort_by_key(|&n| (self.lane(n) - root_lane).abs());

        for n in members {
            let Some(parent) = self.forest.nodes[n].parent else {
                continue;
            };
            let old = self.lane(n);
            loop {
                let lane = self.lane(n);
                let target = self.lane(root);
                if lane == target || (!stronger && lane == self.lane(parent)) {
                    break;
                }
                let sign = if lane < target { 1 } else { -1 };
                if !self.step(n, parent, old, sign) {
                    break;
                }
            }
            if self.lane(n) != old {
                self.forest.close_lane_if_empty(old);
            }
        }
    }

    /// Pulls every child toward its parent's lane, nearest first, walking the tree from `root`
    /// in pre-order. Child lists end up sorted by lane.
    fn pull_to_parent(&mut self, root: usize) {
        let mut visited = Vec::new();
        let mut stack = vec![root];
        while let Some(parent) = stack.pop() {
            if self.size(parent) == 1 {
                continue;
            }
            visited.push(parent);
            let children = self.pull_children(parent);
            stack.extend(children.iter().rev());
        }

        let nodes = &mut self.forest.nodes;
        for parent in visited {
            let mut ordered = std::mem::take(&mut nodes[parent].children);
            ordered.sort_by_key(|&c| nodes[c].lane);
            nodes[parent].children = ordered;
        }
    }

    /// Moves each child of `parent` toward it for as long as it fits. Returns the children,
    /// nearest first.
    fn pull_children(&mut self, parent: usize) -> Vec<usize> {
        let mut nearest_first = self.forest.nodes[parent].children.clone();
        let parent_lane = self.lane(parent);
        nearest_first.sort_by_key(|&c| (self.lane(c) - parent_lane).abs());

        for &n in &nearest_first {
            let old = self.lane(n);
            loop {
                let lane = self.lane(n);
                let target = self.lane(parent);
                if lane == target {
                    break;
                }
                let sign = if lane < target { 1 } else { -1 };
                if !self.step(n, parent, old, sign) {
                    break;
                }
            }
            if self.lane(n) != old {
                self.forest.close_lane_if_empty(old);
            }
        }
        nearest_first
    }

    /// Moves `node` one lane by `sign` if it fits there. Returns whether it moved.
    fn step(&mut self, node: usize, parent: usize, old: i32, sign: i32) -> bool {
        let next = self.lane(node) + sign;
        if next < 0 || !self.fits(next, node) || self.crosses_lines(node, parent, old, sign) {
            return false;
        }
        self.forest.nodes[node].lane = next;
        true
    }

    /// Pixel-level check that the diagonal derivation segment of `node`, once moved, would not
    /// run through another line on the destination lane.
    fn crosses_lines(&self, node: usize, parent: usize, old: i32, sign: i32) -> bool {
        let options = self.options;
        if !options.strict_overlaps || options.derivation != DerivationStyle::FromParentStart {
            return false;
        }
        let origin = self.forest.beginning_of_time.year;
        let px = |d: Date| d.px(origin, options.year_px, options.calendar);

        let me: &LaneNode = &self.forest.nodes[node];
        let span = px(widened_stop(&me.node, options)) - px(self.forest.nodes[parent].node.start);
        if span == 0 {
            return false;
        }
        let slope = f64::from((me.lane - self.lane(parent)) * options.offset_px * -sign)
            / f64::from(span);
        if slope == 0.0 {
            return false;
        }
        let add_px = (f64::from(options.offset_px) / slope * f64::from(me.lane - old + 1)) as i32;
        let stop_px = px(me.node.stop) + add_px;
        let start_px = px(me.node.start);

        let dest = me.lane + sign;
        let mut occupants: Vec<&Node> = self
            .forest
            .nodes
            .iter()
            .enumerate()
            .filter(|&(i, o)| i != node && o.lane == dest)
            .map(|(_, o)| &o.node)
            .collect();
        if occupants.is_empty() {
            return false;
        }
        occupants.sort_by_key(|o| o.start.resolve_overflow(options.calendar));

        let (first, last) = (occupants[0], occupants[occupants.len() - 1]);
        if stop_px < px(first.start) || start_px > px(widened_stop(last, options)) {
            return false;
        }
        !occupants.windows(2).any(|w| {
            px(widened_stop(w[0], options)) < start_px && stop_px < px(w[1].start)
        })
    }
}
