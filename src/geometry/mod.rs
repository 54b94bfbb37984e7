//! Geometric primitives shared across the crate: a uniform-grid spatial
//! hash, a compressed adjacency list, a fixed-length bit set and a
//! least-squares plane fit.

mod adjacency_list;
mod bit_array;
mod plane;
mod spatial_hash;

pub use adjacency_list::{create_adjacency_list, AdjacencyList, EdgeList};
pub use bit_array::BitArray;
pub use plane::Plane;
pub use spatial_hash::SpatialHash;
