//! Initial lane numbering: every tree gets its own contiguous block of lanes.

use crate::error::{Error, Result};
use crate::forest::Forest;
use crate::options::TreeMode;

impl Forest {
    /// Gives every node a lane, one tree after the other in node order.
    ///
    /// Each tree starts as `[root]`; the first node that has not been expanded yet gets its
    /// children (sorted by start) spliced in around it until the sequence holds the whole tree.
    pub fn assign_lanes(&mut self, mode: TreeMode) -> Result<()> {
        let mut expanded = vec![false; self.nodes.len()];
        let mut offset = 0i32;

        for root in self.roots() {
            let size = self.nodes[root].size;
            let mut seq = vec![root];
            let mut cursor = 0;

            while seq.len() < size {
                let Some(&current) = seq.get(cursor) else {
                    break;
                };
                if expanded[current] {
                    cursor += 1;
                    continue;
                }
                expanded[current] = true;
                self.sort_children_by_start(current);
                splice_children(&mut seq, cursor, &self.nodes[current].children, mode);
            }

            if seq.len() != size {
                return Err(Error::InternalConsistency {
                    root: self.nodes[root].node.name.clone(),
                    expected: size,
                    actual: seq.len(),
                });
            }
            for (lane, &n) in (offset..).zip(&seq) {
                self.nodes[n].lane = lane;
            }
            offset += seq.len() as i32;
        }
        Ok(())
    }

    fn sort_children_by_start(&mut self, node: usize) {
        let mut children = std::mem::take(&mut self.nodes[node].children);
        children.sort_by_key(|&c| self.start_of(c));
        self.nodes[node].children = children;
    }
}

fn splice_children(seq: &mut Vec<usize>, pos: usize, children: &[usize], mode: TreeMode) {
    let count = children.len();
    match mode {
        TreeMode::BothSides => {
            for i in (1..count).step_by(2) {
                seq.insert(pos + i / 2, children[i]);
            }
            for i in (0..count).step_by(2) {
                seq.insert(pos + count / 2 + 1, children[i]);
            }
        }
        TreeMode::LowerOnly => {
            for (i, &c) in children.iter().enumerate() {
                seq.insert(pos + 1 + i, c);
            }
        }
        TreeMode::LowerOnlyInverse => {
            for &c in children {
                seq.insert(pos + 1, c);
            }
        }
    }
}
