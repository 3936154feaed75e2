mod load;
mod model;
mod views;

pub use load::load_graph_file;
pub use model::{Category, ConceptGraph, EdgeKind};
pub use views::{ConceptView, FIRST_ORDER_SIZE_THRESHOLD, neighborhood, overview};

#[cfg(test)]
pub(crate) use model::tests as fixtures;
