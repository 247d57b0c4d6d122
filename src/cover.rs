//! The Solution Graph and minimum hitting-set search over it.
//!
//! Queues are hyperedges; fumens are nodes. An arena of [`Node`]s and
//! [`Edge`]s cross-references by index rather than by owning pointer,
//! since nodes and edges reference each other cyclically (a node knows
//! its incident edges, an edge knows its incident nodes).

use std::collections::{BTreeSet, HashMap};

use min_max_heap::MinMaxHeap;

pub type NodeId = usize;
pub type EdgeId = usize;

#[derive(Debug)]
struct Node {
    fumen: String,
    /// Edge ids incident to this node, filtered to non-redundant edges
    /// once [`fumens_to_graph`]'s reduction pass has run.
    edges: Vec<EdgeId>,
    /// Original queue-row indices this fumen solves, independent of the
    /// edge-reduction pass (used for raw/cumulative coverage display).
    queue_indices: Vec<usize>,
    redundant: bool,
    alter: Vec<NodeId>,
}

#[derive(Debug)]
struct Edge {
    nodes: BTreeSet<NodeId>,
    queue_index: usize,
    redundant: bool,
}

/// The reduced bipartite fumen↔queue graph ready for [`find_minimal_nodes`].
#[derive(Debug)]
pub struct Graph {
    nodes: Vec<Node>,
    edges: Vec<Edge>,
    /// The surviving, non-redundant edge ids, in ascending-cardinality order.
    edge_order: Vec<EdgeId>,
    /// The surviving, non-redundant node ids.
    node_order: Vec<NodeId>,
}

impl Graph {
    pub fn fumen(&self, node: NodeId) -> &str {
        &self.nodes[node].fumen
    }

    pub fn aliases(&self, node: NodeId) -> &[NodeId] {
        &self.nodes[node].alter
    }

    /// The number of original queues (pre-reduction) this fumen solves.
    pub fn coverage(&self, node: NodeId) -> usize {
        self.nodes[node].queue_indices.len()
    }

    pub fn queue_indices(&self, node: NodeId) -> &[usize] {
        &self.nodes[node].queue_indices
    }
}

/// Builds the Solution Graph from, for every queue (in row order), the
/// list of fumens that satisfy the wanted-save expression for that queue.
///
/// Performs both reductions from the minimal engine's design: redundant
/// edges (one queue's solvers are a superset of another's) are dropped,
/// and nodes with an identical incident-edge set are merged, the loser
/// remembered in the survivor's `alter` list.
pub fn fumens_to_graph(fumen_lists: &[Vec<String>]) -> Graph {
    let mut fumen_map: HashMap<String, NodeId> = HashMap::new();
    let mut nodes: Vec<Node> = Vec::new();
    let mut edges: Vec<Edge> = Vec::new();

    for (queue_index, fumens) in fumen_lists.iter().enumerate() {
        let mut edge_nodes = BTreeSet::new();
        for fumen in fumens {
            let node_id = *fumen_map.entry(fumen.clone()).or_insert_with(|| {
                nodes.push(Node {
                    fumen: fumen.clone(),
                    edges: Vec::new(),
                    queue_indices: Vec::new(),
                    redundant: false,
                    alter: Vec::new(),
                });
                nodes.len() - 1
            });
            nodes[node_id].queue_indices.push(queue_index);
            edge_nodes.insert(node_id);
        }
        edges.push(Edge {
            nodes: edge_nodes,
            queue_index,
            redundant: false,
        });
    }

    let edge_id_range: Vec<EdgeId> = (0..edges.len()).collect();
    for &edge_id in &edge_id_range {
        for &node_id in edges[edge_id].nodes.iter() {
            nodes[node_id].edges.push(edge_id);
        }
    }

    let mut order: Vec<EdgeId> = edge_id_range.clone();
    order.sort_by_key(|&e| edges[e].nodes.len());

    // Redundant-edge reduction: a smaller edge makes a superset edge
    // redundant. Processed in ascending-cardinality order so that only
    // strictly-larger-or-equal edges are ever marked.
    for &edge_id in &order {
        if edges[edge_id].redundant {
            continue;
        }
        let representative = match edges[edge_id].nodes.iter().next() {
            Some(&n) => n,
            None => continue,
        };
        let sibling_edges = nodes[representative].edges.clone();
        for sibling_id in sibling_edges {
            if sibling_id == edge_id {
                continue;
            }
            let subset = edges[edge_id].nodes.is_subset(&edges[sibling_id].nodes);
            edges[sibling_id].redundant = subset;
        }
    }

    for node in &mut nodes {
        node.edges.retain(|&e| !edges[e].redundant);
    }

    // Redundant-node reduction: two nodes with identical (live) incident
    // edge sets are equivalent; keep one, remember the other as an alias.
    let live_node_ids: Vec<NodeId> = (0..nodes.len()).filter(|&n| !nodes[n].edges.is_empty()).collect();
    for &node_id in &live_node_ids {
        if nodes[node_id].redundant {
            continue;
        }
        let first_edge = match nodes[node_id].edges.first() {
            Some(&e) => e,
            None => continue,
        };
        let siblings: Vec<NodeId> = edges[first_edge].nodes.iter().copied().collect();
        let node_edge_set: BTreeSet<EdgeId> = nodes[node_id].edges.iter().copied().collect();
        for sibling_id in siblings {
            if sibling_id == node_id {
                continue;
            }
            let sibling_edge_set: BTreeSet<EdgeId> = nodes[sibling_id].edges.iter().copied().collect();
            if sibling_edge_set == node_edge_set {
                nodes[sibling_id].redundant = true;
                nodes[node_id].alter.push(sibling_id);
            }
        }
    }

    for edge in &mut edges {
        edge.nodes.retain(|&n| !nodes[n].redundant);
    }

    let edge_order: Vec<EdgeId> = order.into_iter().filter(|&e| !edges[e].redundant).collect();
    let node_order: Vec<NodeId> = live_node_ids.into_iter().filter(|&n| !nodes[n].redundant).collect();

    Graph {
        nodes,
        edges,
        edge_order,
        node_order,
    }
}

/// `MinimalSets.count` is the size of a minimum hitting set of the
/// graph's (reduced) edges; `sets` lists every hitting set of that size.
#[derive(Debug, Clone)]
pub struct MinimalSets {
    pub count: usize,
    pub sets: Vec<Vec<NodeId>>,
}

struct Search<'g> {
    graph: &'g Graph,
    node_color: Vec<i32>,
    edge_color: Vec<i32>,
    current: Vec<NodeId>,
    result_count: usize,
    result_sets: Vec<Vec<NodeId>>,
}

impl<'g> Search<'g> {
    fn digest(&mut self, index: usize) {
        if self.current.len() > self.result_count {
            return;
        }
        if index >= self.graph.edge_order.len() {
            if self.current.len() < self.result_count {
                self.result_count = self.current.len();
                self.result_sets.clear();
            }
            self.result_sets.push(self.current.clone());
            return;
        }

        let edge_id = self.graph.edge_order[index];
        if self.edge_color[edge_id] > 0 {
            self.digest(index + 1);
            return;
        }

        let edge_nodes: Vec<NodeId> = self.graph.edges[edge_id].nodes.iter().copied().collect();
        for &node_id in &edge_nodes {
            self.node_color[node_id] += 1;
            if self.node_color[node_id] > 1 {
                continue;
            }

            self.current.push(node_id);
            for &sibling_edge in &self.graph.nodes[node_id].edges {
                self.edge_color[sibling_edge] += 1;
            }

            self.digest(index + 1);

            self.current.pop();
            for &sibling_edge in &self.graph.nodes[node_id].edges {
                self.edge_color[sibling_edge] -= 1;
            }
        }
        for &node_id in &edge_nodes {
            self.node_color[node_id] -= 1;
        }
    }
}

/// Finds every minimum-cardinality hitting set of `graph`'s edges, via
/// branch-and-bound recursion with a color counter per node/edge so push
/// and pop never require recomputing a live set from scratch.
pub fn find_minimal_nodes(graph: &Graph) -> MinimalSets {
    let mut search = Search {
        graph,
        node_color: vec![0; graph.nodes.len()],
        edge_color: vec![0; graph.edges.len()],
        current: Vec::new(),
        result_count: usize::MAX,
        result_sets: Vec::new(),
    };
    search.digest(0);
    MinimalSets {
        count: search.result_count,
        sets: search.result_sets,
    }
}

/// Which of two candidate minimal sets an operator (or a test harness)
/// chose to keep, when `find_best_set` must break a tie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Choice {
    First,
    Second,
}

/// Repeatedly narrows `sets` down to one, by presenting the symmetric
/// difference of the first two candidates to `choose` and discarding the
/// loser, until a single minimal set remains.
///
/// `choose` is pluggable so the CLI binary can prompt on stdin while a
/// test (or a batch caller) supplies deterministic tie-breaking.
pub fn find_best_set(
    mut sets: Vec<Vec<NodeId>>,
    graph: &Graph,
    mut choose: impl FnMut(&[&str], &[&str]) -> Choice,
) -> Vec<NodeId> {
    while sets.len() > 1 {
        let set0: BTreeSet<NodeId> = sets[0].iter().copied().collect();
        let set1: BTreeSet<NodeId> = sets[1].iter().copied().collect();
        let diff_a: Vec<&str> = set0.difference(&set1).map(|&n| graph.fumen(n)).collect();
        let diff_b: Vec<&str> = set1.difference(&set0).map(|&n| graph.fumen(n)).collect();

        match choose(&diff_a, &diff_b) {
            Choice::Second => {
                sets.remove(0);
            }
            Choice::First => {
                sets.remove(1);
            }
        }
    }
    sets.into_iter().next().unwrap_or_default()
}

#[derive(PartialEq, Eq, PartialOrd, Ord)]
struct ScoredNewCoverage {
    new_count: usize,
    tie: std::cmp::Reverse<usize>,
    node: NodeId,
}

/// Default coverage accounting: `chosen` sorted by descending raw
/// coverage, each paired with `"%.2f% (k/N)"`.
pub fn default_coverage(graph: &Graph, chosen: &[NodeId], total_rows: usize) -> Vec<(NodeId, String)> {
    let mut ranked = chosen.to_vec();
    ranked.sort_by_key(|&n| std::cmp::Reverse(graph.coverage(n)));
    ranked
        .into_iter()
        .map(|n| (n, coverage_label(graph.coverage(n), total_rows)))
        .collect()
}

/// Cumulative coverage accounting: greedily pick, at each step, the
/// fumen adding the most *new* queues to the running union, reporting
/// the cumulative (not per-fumen) coverage after each pick.
pub fn cumulative_coverage(graph: &Graph, chosen: &[NodeId], total_rows: usize) -> Vec<(NodeId, String)> {
    let mut remaining: Vec<NodeId> = chosen.to_vec();
    let mut covered: BTreeSet<usize> = BTreeSet::new();
    let mut result = Vec::with_capacity(chosen.len());

    while !remaining.is_empty() {
        let mut heap = MinMaxHeap::with_capacity(remaining.len());
        for (i, &node_id) in remaining.iter().enumerate() {
            let new_count = graph
                .queue_indices(node_id)
                .iter()
                .filter(|q| !covered.contains(q))
                .count();
            heap.push(ScoredNewCoverage {
                new_count,
                tie: std::cmp::Reverse(i),
                node: node_id,
            });
        }
        let best = heap.pop_max().expect("remaining is non-empty");
        covered.extend(graph.queue_indices(best.node).iter().copied());
        remaining.retain(|&n| n != best.node);
        result.push((best.node, coverage_label(covered.len(), total_rows)));
    }

    result
}

fn coverage_label(count: usize, total: usize) -> String {
    let percent = if total != 0 { (count as f64 / total as f64) * 100.0 } else { 0.0 };
    format!("{:.2}% ({}/{})", percent, count, total)
}
