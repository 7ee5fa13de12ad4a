pub mod compression;
pub mod map_matching;
pub mod search;
pub mod segmentation;
