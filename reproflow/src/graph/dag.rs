//! Adjacency-list dependency graph of stages.
//!
//! An edge `u -> v` means "u depends on v": `v` must be evaluated before `u`.
//! Nodes and edges keep insertion order so every traversal is deterministic.

use crate::errors::GraphError;
use crate::stages::StageRef;
use std::collections::HashMap;

/// A directed acyclic graph of stages.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Stages in insertion order.
    nodes: Vec<StageRef>,
    /// Address to node index.
    index: HashMap<String, usize>,
    /// Dependencies of each node.
    outgoing: Vec<Vec<usize>>,
    /// Dependents of each node.
    incoming: Vec<Vec<usize>>,
}

impl DependencyGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a graph from stages and `(dependent, dependency)` address pairs.
    ///
    /// # Errors
    ///
    /// Returns an error on duplicate stages, unknown endpoints, self edges or cycles.
    pub fn from_parts<'a>(
        stages: impl IntoIterator<Item = StageRef>,
        edges: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) -> Result<Self, GraphError> {
        let mut graph = Self::new();
        for stage in stages {
            graph.add_stage(stage)?;
        }
        for (dependent, dependency) in edges {
            graph.add_dependency(dependent, dependency)?;
        }
        Ok(graph)
    }

    /// Adds a stage with no edges.
    ///
    /// # Errors
    ///
    /// Returns an error if a stage with the same address is already present.
    pub fn add_stage(&mut self, stage: StageRef) -> Result<(), GraphError> {
        let address = stage.address().to_string();
        if self.index.contains_key(&address) {
            return Err(GraphError::DuplicateStage { address });
        }

        self.index.insert(address, self.nodes.len());
        self.nodes.push(stage);
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        Ok(())
    }

    /// Records that `dependent` depends on `dependency`.
    ///
    /// Adding an existing edge again is a no-op.
    ///
    /// # Errors
    ///
    /// Returns an error if either stage is unknown, if the edge is a self edge,
    /// or if it would close a cycle.
    pub fn add_dependency(&mut self, dependent: &str, dependency: &str) -> Result<(), GraphError> {
        let from = self.require(dependent)?;
        let to = self.require(dependency)?;

        if from == to {
            return Err(GraphError::SelfDependency {
                address: dependent.to_string(),
            });
        }
        if self.outgoing[from].contains(&to) {
            return Ok(());
        }
        if let Some(path) = self.path_between(to, from) {
            let mut cycle_path = vec![dependent.to_string()];
            cycle_path.extend(path.into_iter().map(|i| self.nodes[i].address().to_string()));
            return Err(GraphError::CycleDetected { cycle_path });
        }

        self.outgoing[from].push(to);
        self.incoming[to].push(from);
        Ok(())
    }

    /// Removes the edge `dependent -> dependency`, returning whether it existed.
    pub fn remove_dependency(&mut self, dependent: &str, dependency: &str) -> bool {
        let (Some(from), Some(to)) = (self.index_of(dependent), self.index_of(dependency)) else {
            return false;
        };
        let existed = self.outgoing[from].contains(&to);
        self.outgoing[from].retain(|&i| i != to);
        self.incoming[to].retain(|&i| i != from);
        existed
    }

    /// Removes every edge leaving `node`, returning how many were removed.
    pub(crate) fn remove_outgoing(&mut self, node: usize) -> usize {
        let targets = std::mem::take(&mut self.outgoing[node]);
        for &to in &targets {
            self.incoming[to].retain(|&i| i != node);
        }
        targets.len()
    }

    /// Returns the number of stages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if the graph has no stages.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Returns the number of edges.
    #[must_use]
    pub fn edge_count(&self) -> usize {
        self.outgoing.iter().map(Vec::len).sum()
    }

    /// Returns all stages in insertion order.
    #[must_use]
    pub fn stages(&self) -> &[StageRef] {
        &self.nodes
    }

    /// Returns true if a stage with this address is present.
    #[must_use]
    pub fn contains(&self, address: &str) -> bool {
        self.index.contains_key(address)
    }

    /// Looks up a stage by address.
    #[must_use]
    pub fn stage(&self, address: &str) -> Option<&StageRef> {
        self.index_of(address).map(|i| &self.nodes[i])
    }

    /// Returns true if `dependent` directly depends on `dependency`.
    #[must_use]
    pub fn has_dependency(&self, dependent: &str, dependency: &str) -> bool {
        match (self.index_of(dependent), self.index_of(dependency)) {
            (Some(from), Some(to)) => self.outgoing[from].contains(&to),
            _ => false,
        }
    }

    /// Direct dependencies of a stage (outgoing edges).
    ///
    /// # Errors
    ///
    /// Returns an error if the stage is unknown.
    pub fn dependencies(&self, address: &str) -> Result<Vec<StageRef>, GraphError> {
        let node = self.require(address)?;
        Ok(self.collect_nodes(&self.outgoing[node]))
    }

    /// Direct dependents of a stage (incoming edges).
    ///
    /// # Errors
    ///
    /// Returns an error if the stage is unknown.
    pub fn dependents(&self, address: &str) -> Result<Vec<StageRef>, GraphError> {
        let node = self.require(address)?;
        Ok(self.collect_nodes(&self.incoming[node]))
    }

    /// Number of stages that depend on `address` directly.
    #[must_use]
    pub fn in_degree(&self, address: &str) -> usize {
        self.index_of(address).map_or(0, |i| self.incoming[i].len())
    }

    /// Number of direct dependencies of `address`.
    #[must_use]
    pub fn out_degree(&self, address: &str) -> usize {
        self.index_of(address).map_or(0, |i| self.outgoing[i].len())
    }

    /// Stages nothing else depends on, in insertion order.
    #[must_use]
    pub fn roots(&self) -> Vec<StageRef> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(i, _)| self.incoming[*i].is_empty())
            .map(|(_, stage)| stage.clone())
            .collect()
    }

    /// The stage itself followed by everything it transitively depends on.
    ///
    /// # Errors
    ///
    /// Returns an error if the stage is unknown.
    pub fn upstream_closure(&self, address: &str) -> Result<Vec<StageRef>, GraphError> {
        let node = self.require(address)?;
        Ok(self.collect_nodes(&self.reach([node], Direction::Dependencies)))
    }

    /// The stage itself followed by everything that transitively depends on it.
    ///
    /// # Errors
    ///
    /// Returns an error if the stage is unknown.
    pub fn downstream_closure(&self, address: &str) -> Result<Vec<StageRef>, GraphError> {
        let node = self.require(address)?;
        Ok(self.collect_nodes(&self.reach([node], Direction::Dependents)))
    }

    /// Builds the subgraph induced by the given node indices.
    ///
    /// Nodes keep the parent's insertion order regardless of `members` order.
    pub(crate) fn induced(&self, members: &[usize]) -> Self {
        let mut keep = vec![false; self.nodes.len()];
        for &m in members {
            keep[m] = true;
        }

        let mut sub = Self::new();
        let mut remap = vec![usize::MAX; self.nodes.len()];
        for (i, stage) in self.nodes.iter().enumerate().filter(|(i, _)| keep[*i]) {
            remap[i] = sub.nodes.len();
            sub.index.insert(stage.address().to_string(), sub.nodes.len());
            sub.nodes.push(stage.clone());
            sub.outgoing.push(Vec::new());
            sub.incoming.push(Vec::new());
        }
        for (from, targets) in self.outgoing.iter().enumerate().filter(|(i, _)| keep[*i]) {
            for &to in targets.iter().filter(|&&to| keep[to]) {
                sub.outgoing[remap[from]].push(remap[to]);
                sub.incoming[remap[to]].push(remap[from]);
            }
        }
        sub
    }

    pub(crate) fn index_of(&self, address: &str) -> Option<usize> {
        self.index.get(address).copied()
    }

    pub(crate) fn require(&self, address: &str) -> Result<usize, GraphError> {
        self.index_of(address).ok_or_else(|| GraphError::unknown(address))
    }

    pub(crate) fn node(&self, index: usize) -> &StageRef {
        &self.nodes[index]
    }

    pub(crate) fn outgoing_of(&self, index: usize) -> &[usize] {
        &self.outgoing[index]
    }

    pub(crate) fn incoming_of(&self, index: usize) -> &[usize] {
        &self.incoming[index]
    }

    /// Every node reachable from `starts`, each once, in discovery order.
    ///
    /// Iterative depth-first search; starts are visited in the order given.
    pub(crate) fn reach(
        &self,
        starts: impl IntoIterator<Item = usize>,
        direction: Direction,
    ) -> Vec<usize> {
        let mut visited = vec![false; self.nodes.len()];
        let mut order = Vec::new();
        let mut stack = Vec::new();

        for start in starts {
            if visited[start] {
                continue;
            }
            visited[start] = true;
            stack.push(start);

            while let Some(node) = stack.pop() {
                order.push(node);
                let next = match direction {
                    Direction::Dependencies => &self.outgoing[node],
                    Direction::Dependents => &self.incoming[node],
                };
                // Reversed so the first neighbour is explored first.
                for &n in next.iter().rev() {
                    if !visited[n] {
                        visited[n] = true;
                        stack.push(n);
                    }
                }
            }
        }

        order
    }

    /// A dependency path from `from` to `to` (both inclusive), if one exists.
    fn path_between(&self, from: usize, to: usize) -> Option<Vec<usize>> {
        let mut parent = vec![None; self.nodes.len()];
        let mut visited = vec![false; self.nodes.len()];
        let mut stack = vec![from];
        visited[from] = true;

        while let Some(node) = stack.pop() {
            if node == to {
                let mut path = vec![to];
                let mut cursor = to;
                while let Some(p) = parent[cursor] {
                    path.push(p);
                    cursor = p;
                }
                path.reverse();
                return Some(path);
            }
            for &n in &self.outgoing[node] {
                if !visited[n] {
                    visited[n] = true;
                    parent[n] = Some(node);
                    stack.push(n);
                }
            }
        }
        None
    }

    fn collect_nodes(&self, indices: &[usize]) -> Vec<StageRef> {
        indices.iter().map(|&i| self.nodes[i].clone()).collect()
    }
}

/// Which edges a traversal follows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Direction {
    /// Follow outgoing edges towards dependencies.
    Dependencies,
    /// Follow incoming edges towards dependents.
    Dependents,
}
