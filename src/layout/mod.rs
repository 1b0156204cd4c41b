//! # Tree Layout
//!
//! Positions structure nodes top to bottom for rendering. Each node sits
//! one rank below its parent; leaves take consecutive columns and every
//! parent is centred over its children. Coordinates are top-left corners.

use std::collections::HashSet;

use serde::Serialize;

use crate::governance::derive_status;
use crate::lineage::LineageIndex;
use crate::model::{Axiom, Status, StructureNode};

pub const NODE_WIDTH: f64 = 300.0;
pub const NODE_HEIGHT: f64 = 120.0;
pub const NODE_GAP: f64 = 50.0;
pub const RANK_GAP: f64 = 80.0;

/// A node with its computed position
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedNode {
    pub id: String,
    pub label: String,
    pub rank: usize,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Effective status under the default thresholds
    pub status: Status,
    pub to_be_deleted: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeKind {
    /// Parent to child
    Parent,
    /// Duplicate to the node it duplicates
    Duplicate,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutEdge {
    pub source: String,
    pub target: String,
    pub kind: EdgeKind,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Layout {
    pub nodes: Vec<PositionedNode>,
    pub edges: Vec<LayoutEdge>,
}

impl Layout {
    pub fn node(&self, id: &str) -> Option<&PositionedNode> {
        self.nodes.iter().find(|n| n.id == id)
    }
}

/// Display label: the node's notation, then its axiom when known
pub fn node_label(node: &StructureNode, axiom: Option<&Axiom>) -> String {
    match axiom {
        Some(axiom) => format!(
            "{}\nAxiom: {}\n{}",
            node.display_notation, axiom.canonical_name, axiom.notation
        ),
        None => node.display_notation.clone(),
    }
}

struct Placer<'a> {
    index: LineageIndex<'a>,
    visited: HashSet<&'a str>,
    next_column: f64,
    placed: Vec<(&'a StructureNode, usize, f64)>,
}

impl<'a> Placer<'a> {
    fn sorted_children(&self, node_id: &str) -> Vec<&'a StructureNode> {
        let mut children: Vec<&StructureNode> = self.index.children_of(node_id).to_vec();
        children.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
        children
    }

    /// Place `node` and its subtree; returns the node's column
    fn place(&mut self, node: &'a StructureNode, rank: usize) -> f64 {
        self.visited.insert(node.id.as_str());

        let mut columns = Vec::new();
        for child in self.sorted_children(&node.id) {
            if !self.visited.contains(child.id.as_str()) {
                columns.push(self.place(child, rank + 1));
            }
        }

        let column = match (columns.first(), columns.last()) {
            (Some(first), Some(last)) => (first + last) / 2.0,
            _ => {
                let column = self.next_column;
                self.next_column += 1.0;
                column
            }
        };
        self.placed.push((node, rank, column));
        column
    }
}

/// Lay out every node and its parent and duplicate edges
pub fn layout_tree(nodes: &[StructureNode], axioms: &[Axiom]) -> Layout {
    let index = LineageIndex::new(nodes, axioms, &[]);

    let mut order: Vec<&StructureNode> = nodes.iter().collect();
    order.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));

    let mut placer = Placer {
        index,
        visited: HashSet::new(),
        next_column: 0.0,
        placed: Vec::with_capacity(nodes.len()),
    };

    // Roots first, then anything only reachable through a broken chain
    let is_root = |node: &StructureNode| match &node.parent_id {
        None => true,
        Some(parent) => placer.index.node(parent).is_none(),
    };
    let roots: Vec<&StructureNode> = order.iter().copied().filter(|n| is_root(n)).collect();
    for root in roots {
        placer.place(root, 0);
    }
    for node in order {
        if !placer.visited.contains(node.id.as_str()) {
            placer.place(node, 0);
        }
    }

    let mut positioned: Vec<PositionedNode> = placer
        .placed
        .iter()
        .map(|(node, rank, column)| {
            let axiom = node.axiom_id.as_deref().and_then(|id| placer.index.axiom(id));
            PositionedNode {
                id: node.id.clone(),
                label: node_label(node, axiom),
                rank: *rank,
                x: column * (NODE_WIDTH + NODE_GAP),
                y: *rank as f64 * (NODE_HEIGHT + RANK_GAP),
                width: NODE_WIDTH,
                height: NODE_HEIGHT,
                status: derive_status(node.status, node.stats),
                to_be_deleted: node.to_be_deleted,
            }
        })
        .collect();
    positioned.sort_by(|a, b| {
        a.rank
            .cmp(&b.rank)
            .then_with(|| a.x.total_cmp(&b.x))
            .then_with(|| a.id.cmp(&b.id))
    });

    let mut edges = Vec::new();
    for node in nodes {
        if let Some(parent) = node.parent_id.as_deref() {
            if placer.index.node(parent).is_some() {
                edges.push(LayoutEdge {
                    source: parent.to_string(),
                    target: node.id.clone(),
                    kind: EdgeKind::Parent,
                });
            }
        }
        if let Some(original) = node.duplicate_of_id.as_deref() {
            if placer.index.node(original).is_some() {
                edges.push(LayoutEdge {
                    source: node.id.clone(),
                    target: original.to_string(),
                    kind: EdgeKind::Duplicate,
                });
            }
        }
    }

    Layout {
        nodes: positioned,
        edges,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Dataset;

    #[test]
    fn test_ranks_follow_depth() {
        let data = Dataset::additive_magma();
        let layout = layout_tree(&data.nodes, &data.axioms);

        assert_eq!(layout.nodes.len(), data.nodes.len());
        assert_eq!(layout.node("node_genesis").unwrap().rank, 0);
        assert_eq!(layout.node("nodeRootComm").unwrap().rank, 1);
        assert_eq!(layout.node("nodeCommAssoc").unwrap().rank, 2);
        assert_eq!(layout.node("nodeZombieDuplicate").unwrap().rank, 3);
        assert_eq!(layout.node("nodeCommAssoc").unwrap().y, 2.0 * (NODE_HEIGHT + RANK_GAP));
    }

    #[test]
    fn test_parent_centred_over_children() {
        let data = Dataset::additive_magma();
        let layout = layout_tree(&data.nodes, &data.axioms);
        let genesis = layout.node("node_genesis").unwrap().x;
        let left = layout.node("nodeRootComm").unwrap().x;
        let right = layout.node("nodeRootAssoc").unwrap().x;
        assert_eq!(genesis, (left + right) / 2.0);
        assert_ne!(left, right);
    }

    #[test]
    fn test_edges() {
        let data = Dataset::additive_magma();
        let layout = layout_tree(&data.nodes, &data.axioms);

        let parents = layout
            .edges
            .iter()
            .filter(|e| e.kind == EdgeKind::Parent)
            .count();
        assert_eq!(parents, 5);
        assert!(layout.edges.contains(&LayoutEdge {
            source: "nodeZombieDuplicate".into(),
            target: "nodeCommAssoc".into(),
            kind: EdgeKind::Duplicate,
        }));
    }

    #[test]
    fn test_label_includes_axiom() {
        let data = Dataset::additive_magma();
        let layout = layout_tree(&data.nodes, &data.axioms);
        let label = &layout.node("nodeRootComm").unwrap().label;
        assert!(label.starts_with("x + y = y + x"));
        assert!(label.contains("Commutativity"));
        assert_eq!(layout.node("node_genesis").unwrap().label, "\\text{Magma } (S, +)");
    }

    #[test]
    fn test_cycle_still_placed() {
        let data = Dataset::additive_magma();
        let mut nodes = data.nodes.clone();
        nodes[1].parent_id = Some("nodeCommAssoc".into());
        let layout = layout_tree(&nodes, &data.axioms);
        assert_eq!(layout.nodes.len(), nodes.len());
    }
}
