mod build;
mod interaction;
mod view;

pub(in crate::app) use build::{LayoutSeed, ViewGraph, ViewNode};

#[cfg(test)]
pub(in crate::app) mod tests {
    use crate::concept::Category;

    use super::ViewNode;

    pub(in crate::app) fn view_node(id: &str, timestamps: &[f64]) -> ViewNode {
        ViewNode {
            id: id.to_owned(),
            label: id.to_owned(),
            category: Category::Definition,
            size: 10.0,
            timestamps: timestamps.to_vec(),
            is_active: false,
        }
    }
}
