/// Edge input for [`create_adjacency_list`]. `node1[i]` and `node2[i]` are
/// the endpoints of edge `i`; node ids must be below `node_count`.
#[derive(Debug, Clone)]
pub struct EdgeList<'a> {
    /// First endpoint of each edge.
    pub node1: &'a [u32],
    /// Second endpoint of each edge.
    pub node2: &'a [u32],
    /// Number of edges to read from `node1`/`node2`.
    pub edge_count: usize,
    /// Total number of nodes in the graph.
    pub node_count: usize,
}

/// Compressed adjacency built from an undirected edge list.
///
/// Every edge is recorded in both directions, so `index_array` holds
/// `2 * edge_count` entries. Self loops and duplicate edges are kept as
/// given; deduplication is the caller's business.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdjacencyList {
    /// Neighbor count per node.
    pub count_array: Vec<u32>,
    /// Start of each node's slice in `index_array`.
    pub offset_array: Vec<u32>,
    /// Concatenated neighbor ids, grouped by node.
    pub index_array: Vec<u32>,
    /// Number of nodes.
    pub node_count: usize,
}

impl AdjacencyList {
    /// The neighbors of `node`, in edge insertion order.
    pub fn neighbors(&self, node: u32) -> &[u32] {
        let start = self.offset_array[node as usize] as usize;
        let end = start + self.count_array[node as usize] as usize;
        &self.index_array[start..end]
    }

    /// Number of neighbors of `node`.
    pub fn degree(&self, node: u32) -> usize {
        self.count_array[node as usize] as usize
    }
}

/// Build an [`AdjacencyList`] from an undirected edge list in three passes:
/// count degrees, prefix-sum the offsets, then scatter both directions of
/// every edge.
pub fn create_adjacency_list(edges: &EdgeList) -> AdjacencyList {
    let mut count_array = vec![0u32; edges.node_count];
    for i in 0..edges.edge_count {
        count_array[edges.node1[i] as usize] += 1;
        count_array[edges.node2[i] as usize] += 1;
    }

    let mut offset_array = vec![0u32; edges.node_count];
    let mut offset = 0u32;
    for (i, count) in count_array.iter().enumerate() {
        offset_array[i] = offset;
        offset += count;
    }

    let mut fill = vec![0u32; edges.node_count];
    let mut index_array = vec![0u32; 2 * edges.edge_count];
    for i in 0..edges.edge_count {
        let a = edges.node1[i] as usize;
        let b = edges.node2[i] as usize;
        index_array[(offset_array[a] + fill[a]) as usize] = b as u32;
        fill[a] += 1;
        index_array[(offset_array[b] + fill[b]) as usize] = a as u32;
        fill[b] += 1;
    }

    AdjacencyList {
        count_array,
        offset_array,
        index_array,
        node_count: edges.node_count,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_graph() {
        // 0 - 1 - 2, plus 1 - 3
        let node1 = [0u32, 1, 1];
        let node2 = [1u32, 2, 3];
        let adj = create_adjacency_list(&EdgeList {
            node1: &node1,
            node2: &node2,
            edge_count: 3,
            node_count: 4,
        });

        assert_eq!(adj.degree(0), 1);
        assert_eq!(adj.degree(1), 3);
        assert_eq!(adj.degree(2), 1);
        assert_eq!(adj.degree(3), 1);
        assert_eq!(adj.neighbors(0), &[1]);
        assert_eq!(adj.neighbors(1), &[0, 2, 3]);
        assert_eq!(adj.neighbors(2), &[1]);
        assert_eq!(adj.neighbors(3), &[1]);
        assert_eq!(adj.index_array.len(), 6);
    }

    #[test]
    fn test_symmetry() {
        let node1 = [0u32, 2, 4, 1];
        let node2 = [3u32, 1, 0, 4];
        let adj = create_adjacency_list(&EdgeList {
            node1: &node1,
            node2: &node2,
            edge_count: 4,
            node_count: 5,
        });

        for node in 0..5u32 {
            for &other in adj.neighbors(node) {
                let back = adj
                    .neighbors(other)
                    .iter()
                    .filter(|&&n| n == node)
                    .count();
                let forth = adj
                    .neighbors(node)
                    .iter()
                    .filter(|&&n| n == other)
                    .count();
                assert_eq!(back, forth);
            }
        }
    }

    #[test]
    fn test_self_loop_and_duplicates() {
        let node1 = [0u32, 1, 1];
        let node2 = [0u32, 2, 2];
        let adj = create_adjacency_list(&EdgeList {
            node1: &node1,
            node2: &node2,
            edge_count: 3,
            node_count: 3,
        });

        // The self loop contributes two slots on node 0
        assert_eq!(adj.degree(0), 2);
        assert_eq!(adj.neighbors(0), &[0, 0]);
        // The duplicate edge is kept twice on both endpoints
        assert_eq!(adj.neighbors(1), &[2, 2]);
        assert_eq!(adj.neighbors(2), &[1, 1]);
    }

    #[test]
    fn test_empty() {
        let adj = create_adjacency_list(&EdgeList {
            node1: &[],
            node2: &[],
            edge_count: 0,
            node_count: 0,
        });
        assert_eq!(adj.node_count, 0);
        assert!(adj.index_array.is_empty());
    }
}
