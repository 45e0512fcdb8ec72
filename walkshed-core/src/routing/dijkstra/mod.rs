mod multi_source;
mod state;

pub use multi_source::{SeedNode, bounded_distances};
