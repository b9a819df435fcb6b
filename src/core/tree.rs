//! Category forest assembly

use crate::entities::Category;
use serde::Serialize;
use std::collections::HashMap;
use uuid::Uuid;

/// A category with its sub-categories
#[derive(Debug, Clone, Serialize)]
pub struct CategoryNode {
    #[serde(flatten)]
    pub category: Category,
    pub children: Vec<CategoryNode>,
}

/// The forest of top-level categories, plus the flat list it was built from
#[derive(Debug, Clone, Serialize)]
pub struct CategoryTree {
    #[serde(rename = "categories")]
    pub tree: Vec<CategoryNode>,
    pub flat: Vec<Category>,
}

impl CategoryTree {
    /// Number of categories reachable from a root
    pub fn node_count(&self) -> usize {
        fn count(nodes: &[CategoryNode]) -> usize {
            nodes.iter().map(|n| 1 + count(&n.children)).sum()
        }
        count(&self.tree)
    }
}

/// Build the category forest
///
/// Categories are sorted by name first and children keep that order. A
/// category whose parent is not in `categories` is an orphan: neither it nor
/// its descendants appear in the tree. Categories caught in a parent cycle
/// have no root and are likewise left out. They all stay in `flat`.
pub fn build_category_tree(mut categories: Vec<Category>) -> CategoryTree {
    categories.sort_by(|a, b| a.name.cmp(&b.name));

    let mut children_of: HashMap<Option<Uuid>, Vec<usize>> = HashMap::new();
    for (index, category) in categories.iter().enumerate() {
        children_of.entry(category.parent_id).or_default().push(index);
    }

    fn assemble(
        parent: Option<Uuid>,
        categories: &[Category],
        children_of: &HashMap<Option<Uuid>, Vec<usize>>,
    ) -> Vec<CategoryNode> {
        children_of
            .get(&parent)
            .map(|indices| {
                indices
                    .iter()
                    .map(|&index| {
                        let category = &categories[index];
                        CategoryNode {
                            category: category.clone(),
                            children: assemble(Some(category.id), categories, children_of),
                        }
                    })
                    .collect()
            })
            .unwrap_or_default()
    }

    let tree = assemble(None, &categories, &children_of);
    CategoryTree {
        tree,
        flat: categories,
    }
}
