//! Topology helpers over the bus/line graph.

use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::unionfind::UnionFind;

use crate::{BusId, LineId, Network};

/// Undirected multigraph with one node per bus (node index == bus index)
/// and one edge per line.
pub fn bus_graph(network: &Network) -> UnGraph<BusId, LineId> {
    let mut graph = UnGraph::with_capacity(network.buses().len(), network.lines().len());
    for bus in network.buses() {
        graph.add_node(bus.id);
    }
    for line in network.lines() {
        graph.add_edge(
            NodeIndex::new(line.bus0.value()),
            NodeIndex::new(line.bus1.value()),
            line.id,
        );
    }
    graph
}

/// Connected components of the bus graph.
///
/// Buses inside an island are sorted by id and islands are ordered by their
/// first bus, so the first entry of each island is a stable reference bus.
pub fn islands(network: &Network) -> Vec<Vec<BusId>> {
    let graph = bus_graph(network);
    let mut sets = UnionFind::<usize>::new(graph.node_count());
    for edge in graph.raw_edges() {
        sets.union(edge.source().index(), edge.target().index());
    }

    let labels = sets.into_labeling();
    let mut islands: Vec<Vec<BusId>> = Vec::new();
    let mut slot_of_label: Vec<Option<usize>> = vec![None; labels.len()];
    for (node, &label) in labels.iter().enumerate() {
        let slot = *slot_of_label[label].get_or_insert_with(|| {
            islands.push(Vec::new());
            islands.len() - 1
        });
        islands[slot].push(graph[NodeIndex::new(node)]);
    }
    islands
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::three_bus_network;
    use crate::Capacity;

    #[test]
    fn test_connected_network_is_one_island() {
        let network = three_bus_network();
        let islands = islands(&network);
        assert_eq!(islands.len(), 1);
        assert_eq!(islands[0].len(), 3);
        assert_eq!(islands[0][0], BusId::new(0));
    }

    #[test]
    fn test_detects_disconnected_bus() {
        let mut network = three_bus_network();
        network.add_bus("Offshore", "AC").unwrap();
        let islands = islands(&network);
        assert_eq!(islands.len(), 2);
        assert_eq!(islands[1], vec![BusId::new(3)]);
    }

    #[test]
    fn test_bus_graph_has_parallel_lines() {
        let mut network = three_bus_network();
        network
            .add_line("North-South 2", "North", "South", 0.1, 0.01, Capacity::fixed(50.0))
            .unwrap();
        let graph = bus_graph(&network);
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 4);
    }
}
