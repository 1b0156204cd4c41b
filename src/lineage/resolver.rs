use std::collections::{HashMap, HashSet};

use serde::Serialize;

use super::errors::{LineageError, LineageResult};
use crate::model::{Axiom, StructureNode, Theorem};

/// How the parent walk ended
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ChainIntegrity {
    /// Reached a node with no parent
    Complete,
    /// Stopped at a parent id that does not resolve
    #[serde(rename_all = "camelCase")]
    MissingParent { node_id: String, parent_id: String },
    /// Stopped on revisiting a node
    #[serde(rename_all = "camelCase")]
    Cycle { node_id: String },
}

impl ChainIntegrity {
    pub fn is_complete(&self) -> bool {
        matches!(self, ChainIntegrity::Complete)
    }
}

/// Everything in scope at one node
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Lineage {
    /// Ancestor axioms, root first
    pub inherited_axioms: Vec<Axiom>,
    /// Ancestor theorems, root first, then in store order within a node
    pub inherited_theorems: Vec<Theorem>,
    /// The node's own axiom; None for genesis or an unknown axiom id
    pub local_axiom: Option<Axiom>,
    /// Theorems owned by the node
    pub local_theorems: Vec<Theorem>,
    pub integrity: ChainIntegrity,
}

impl Lineage {
    /// Inherited axioms followed by the local one
    pub fn all_axioms(&self) -> Vec<&Axiom> {
        self.inherited_axioms
            .iter()
            .chain(self.local_axiom.iter())
            .collect()
    }

    /// Inherited theorems followed by local ones
    pub fn all_theorems(&self) -> Vec<&Theorem> {
        self.inherited_theorems
            .iter()
            .chain(self.local_theorems.iter())
            .collect()
    }
}

/// Id lookups over one dataset snapshot
pub struct LineageIndex<'a> {
    nodes: HashMap<&'a str, &'a StructureNode>,
    axioms: HashMap<&'a str, &'a Axiom>,
    theorems_by_node: HashMap<&'a str, Vec<&'a Theorem>>,
    children: HashMap<&'a str, Vec<&'a StructureNode>>,
}

impl<'a> LineageIndex<'a> {
    pub fn new(nodes: &'a [StructureNode], axioms: &'a [Axiom], theorems: &'a [Theorem]) -> Self {
        let mut theorems_by_node: HashMap<&str, Vec<&Theorem>> = HashMap::new();
        for theorem in theorems {
            theorems_by_node
                .entry(theorem.node_id.as_str())
                .or_default()
                .push(theorem);
        }

        let mut children: HashMap<&str, Vec<&StructureNode>> = HashMap::new();
        for node in nodes {
            if let Some(parent) = &node.parent_id {
                children.entry(parent.as_str()).or_default().push(node);
            }
        }

        Self {
            nodes: nodes.iter().map(|n| (n.id.as_str(), n)).collect(),
            axioms: axioms.iter().map(|a| (a.id.as_str(), a)).collect(),
            theorems_by_node,
            children,
        }
    }

    pub fn node(&self, id: &str) -> Option<&'a StructureNode> {
        self.nodes.get(id).copied()
    }

    pub fn axiom(&self, id: &str) -> Option<&'a Axiom> {
        self.axioms.get(id).copied()
    }

    /// Theorems owned by `node_id`, in input order
    pub fn theorems_of(&self, node_id: &str) -> &[&'a Theorem] {
        self.theorems_by_node
            .get(node_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Direct children of `node_id`, in input order
    pub fn children_of(&self, node_id: &str) -> &[&'a StructureNode] {
        self.children
            .get(node_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Ancestor nodes of `node_id`, nearest first, and how the walk ended.
    ///
    /// The starting node itself is never part of the result.
    fn walk_up(&self, node_id: &str) -> (Vec<&'a StructureNode>, ChainIntegrity) {
        let mut chain = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();

        let Some(start) = self.node(node_id) else {
            return (chain, ChainIntegrity::Complete);
        };
        visited.insert(start.id.as_str());

        let mut current = start;
        while let Some(parent_id) = current.parent_id.as_deref() {
            let Some(parent) = self.node(parent_id) else {
                return (
                    chain,
                    ChainIntegrity::MissingParent {
                        node_id: current.id.clone(),
                        parent_id: parent_id.to_string(),
                    },
                );
            };
            if !visited.insert(parent.id.as_str()) {
                return (
                    chain,
                    ChainIntegrity::Cycle {
                        node_id: parent.id.clone(),
                    },
                );
            }
            chain.push(parent);
            current = parent;
        }

        (chain, ChainIntegrity::Complete)
    }

    /// Resolve the scope of `node_id`. Unknown ids give an empty lineage
    /// that still carries any theorems filed under that id.
    pub fn resolve(&self, node_id: &str) -> Lineage {
        let local_theorems: Vec<Theorem> =
            self.theorems_of(node_id).iter().map(|t| (*t).clone()).collect();

        let Some(node) = self.node(node_id) else {
            return Lineage {
                inherited_axioms: Vec::new(),
                inherited_theorems: Vec::new(),
                local_axiom: None,
                local_theorems,
                integrity: ChainIntegrity::Complete,
            };
        };

        let local_axiom = node
            .axiom_id
            .as_deref()
            .and_then(|id| self.axiom(id))
            .cloned();

        let (chain, integrity) = self.walk_up(node_id);

        let mut inherited_axioms = Vec::new();
        let mut inherited_theorems = Vec::new();
        for ancestor in chain.iter().rev() {
            if let Some(axiom) = ancestor.axiom_id.as_deref().and_then(|id| self.axiom(id)) {
                inherited_axioms.push(axiom.clone());
            }
            inherited_theorems.extend(self.theorems_of(&ancestor.id).iter().map(|t| (*t).clone()));
        }

        Lineage {
            inherited_axioms,
            inherited_theorems,
            local_axiom,
            local_theorems,
            integrity,
        }
    }

    /// Ancestor ids of `node_id`, root first
    pub fn ancestors(&self, node_id: &str) -> Vec<String> {
        let (chain, _) = self.walk_up(node_id);
        chain.iter().rev().map(|n| n.id.clone()).collect()
    }

    /// Every node below `node_id`, breadth first
    pub fn descendants(&self, node_id: &str) -> Vec<String> {
        let mut result = Vec::new();
        let mut visited: HashSet<&str> = HashSet::new();
        visited.insert(node_id);

        let mut frontier: Vec<&str> = vec![node_id];
        while !frontier.is_empty() {
            let mut next = Vec::new();
            for id in frontier {
                for child in self.children_of(id) {
                    if visited.insert(child.id.as_str()) {
                        result.push(child.id.clone());
                        next.push(child.id.as_str());
                    }
                }
            }
            frontier = next;
        }
        result
    }

    /// Walk the chain and fail on the first structural problem
    pub fn verify(&self, node_id: &str) -> LineageResult<()> {
        if self.node(node_id).is_none() {
            return Err(LineageError::UnknownNode(node_id.to_string()));
        }
        match self.walk_up(node_id).1 {
            ChainIntegrity::Complete => Ok(()),
            ChainIntegrity::MissingParent { node_id, parent_id } => {
                Err(LineageError::MissingParent { node_id, parent_id })
            }
            ChainIntegrity::Cycle { node_id } => Err(LineageError::Cycle(node_id)),
        }
    }
}

/// Resolve the axioms and theorems in scope at `node_id`
pub fn resolve_lineage(
    node_id: &str,
    nodes: &[StructureNode],
    axioms: &[Axiom],
    theorems: &[Theorem],
) -> Lineage {
    LineageIndex::new(nodes, axioms, theorems).resolve(node_id)
}

/// Check that `node_id` exists and its parent chain ends at a root
pub fn verify_chain(node_id: &str, nodes: &[StructureNode]) -> LineageResult<()> {
    LineageIndex::new(nodes, &[], &[]).verify(node_id)
}

/// Ancestor ids of `node_id`, root first
pub fn ancestors(node_id: &str, nodes: &[StructureNode]) -> Vec<String> {
    LineageIndex::new(nodes, &[], &[]).ancestors(node_id)
}

/// Every node id below `node_id`, breadth first
pub fn descendants(node_id: &str, nodes: &[StructureNode]) -> Vec<String> {
    LineageIndex::new(nodes, &[], &[]).descendants(node_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Dataset, Status, VoteTally};
    use chrono::Utc;

    fn node(id: &str, parent: Option<&str>, axiom: Option<&str>) -> StructureNode {
        StructureNode {
            id: id.into(),
            parent_id: parent.map(Into::into),
            axiom_id: axiom.map(Into::into),
            environment_id: "env".into(),
            author_id: "u".into(),
            display_notation: id.into(),
            status: Status::Unverified,
            duplicate_of_id: None,
            to_be_deleted: false,
            stats: VoteTally::default(),
            created_at: Utc::now(),
        }
    }

    fn ids(axioms: &[Axiom]) -> Vec<&str> {
        axioms.iter().map(|a| a.id.as_str()).collect()
    }

    #[test]
    fn test_seed_lineage_of_comm_assoc() {
        let data = Dataset::additive_magma();
        let lineage = resolve_lineage("nodeCommAssoc", &data.nodes, &data.axioms, &data.theorems);

        assert_eq!(ids(&lineage.inherited_axioms), vec!["axComm"]);
        assert_eq!(lineage.local_axiom.as_ref().map(|a| a.id.as_str()), Some("axAssoc"));
        let inherited: Vec<&str> = lineage
            .inherited_theorems
            .iter()
            .map(|t| t.id.as_str())
            .collect();
        assert_eq!(inherited, vec!["thm_magma_closure", "thm_comm_zero"]);
        assert_eq!(lineage.local_theorems.len(), 1);
        assert!(lineage.integrity.is_complete());
    }

    #[test]
    fn test_genesis_has_no_axioms() {
        let data = Dataset::additive_magma();
        let lineage = resolve_lineage("node_genesis", &data.nodes, &data.axioms, &data.theorems);
        assert!(lineage.inherited_axioms.is_empty());
        assert!(lineage.local_axiom.is_none());
        assert_eq!(lineage.local_theorems.len(), 1);
    }

    #[test]
    fn test_unknown_node_collects_orphan_theorems() {
        let data = Dataset::additive_magma();
        let mut theorems = data.theorems.clone();
        theorems[0].node_id = "ghost".into();

        let lineage = resolve_lineage("ghost", &data.nodes, &data.axioms, &theorems);
        assert!(lineage.inherited_axioms.is_empty());
        assert!(lineage.inherited_theorems.is_empty());
        assert_eq!(lineage.local_theorems.len(), 1);
    }

    #[test]
    fn test_missing_parent_stops_walk() {
        let nodes = vec![node("a", Some("gone"), None), node("b", Some("a"), None)];
        let index = LineageIndex::new(&nodes, &[], &[]);
        let lineage = index.resolve("b");
        assert_eq!(
            lineage.integrity,
            ChainIntegrity::MissingParent {
                node_id: "a".into(),
                parent_id: "gone".into()
            }
        );
        assert_eq!(index.ancestors("b"), vec!["a"]);
        assert!(matches!(
            verify_chain("b", &nodes),
            Err(LineageError::MissingParent { .. })
        ));
    }

    #[test]
    fn test_cycle_terminates() {
        let nodes = vec![node("a", Some("b"), None), node("b", Some("a"), None)];
        let lineage = resolve_lineage("a", &nodes, &[], &[]);
        assert_eq!(lineage.integrity, ChainIntegrity::Cycle { node_id: "a".into() });
        assert_eq!(verify_chain("a", &nodes), Err(LineageError::Cycle("a".into())));
    }

    #[test]
    fn test_self_parent_is_cycle() {
        let nodes = vec![node("a", Some("a"), None)];
        assert!(matches!(
            resolve_lineage("a", &nodes, &[], &[]).integrity,
            ChainIntegrity::Cycle { .. }
        ));
    }

    #[test]
    fn test_descendants_breadth_first() {
        let data = Dataset::additive_magma();
        let below = descendants("nodeRootComm", &data.nodes);
        assert_eq!(below, vec!["nodeCommAssoc", "nodeZombieDuplicate"]);
        assert!(descendants("nodeAssocComm", &data.nodes).is_empty());
    }

    #[test]
    fn test_ancestors_root_first() {
        let data = Dataset::additive_magma();
        assert_eq!(
            ancestors("nodeZombieDuplicate", &data.nodes),
            vec!["node_genesis", "nodeRootComm", "nodeCommAssoc"]
        );
        assert!(verify_chain("nodeZombieDuplicate", &data.nodes).is_ok());
        assert!(matches!(
            verify_chain("nobody", &data.nodes),
            Err(LineageError::UnknownNode(_))
        ));
    }
}
