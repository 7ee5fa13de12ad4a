mod edge_rtree_object;
mod map_error;
mod spatial_index;

pub use edge_rtree_object::EdgeRTreeObject;
pub use map_error::MapError;
pub use spatial_index::SpatialIndex;
