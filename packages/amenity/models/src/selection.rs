//! Ordered category/subtype selections fed to the facility query engine.

use serde::{Deserialize, Serialize};

use crate::taxonomy::{Category, Taxonomy};

/// Subtypes chosen for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionEntry {
    /// The category.
    pub category: Category,
    /// Chosen subtype names, in query order.
    pub subtypes: Vec<String>,
}

/// An ordered set of categories, each with its chosen subtypes.
///
/// Categories appear at most once, in the order they were first added.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Selection {
    entries: Vec<SelectionEntry>,
}

impl Selection {
    /// An empty selection.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Every subtype of every listed category, in taxonomy order.
    #[must_use]
    pub fn whole_categories(categories: &[Category]) -> Self {
        let mut selection = Self::new();
        for &category in categories {
            selection.add(category, Taxonomy::subtypes(category));
        }
        selection
    }

    /// Adds subtypes under `category`.
    ///
    /// Subtypes unknown to the taxonomy for that category are dropped with a
    /// debug log; subtypes already selected are not repeated. A category
    /// already present keeps its original position.
    pub fn add<I, S>(&mut self, category: Category, subtypes: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let idx = if let Some(idx) = self.entries.iter().position(|e| e.category == category) {
            idx
        } else {
            self.entries.push(SelectionEntry {
                category,
                subtypes: Vec::new(),
            });
            self.entries.len() - 1
        };

        let entry = &mut self.entries[idx];
        for subtype in subtypes {
            let subtype = subtype.as_ref();
            if !Taxonomy::contains(category, subtype) {
                log::debug!("Dropping unknown subtype {subtype} for {category}");
                continue;
            }
            if !entry.subtypes.iter().any(|s| s == subtype) {
                entry.subtypes.push(subtype.to_string());
            }
        }
    }

    /// Selected entries in order.
    #[must_use]
    pub fn entries(&self) -> &[SelectionEntry] {
        &self.entries
    }

    /// Selected categories in order.
    #[must_use]
    pub fn categories(&self) -> Vec<Category> {
        self.entries.iter().map(|e| e.category).collect()
    }

    /// Subtypes chosen for `category`, if it is selected.
    #[must_use]
    pub fn subtypes(&self, category: Category) -> Option<&[String]> {
        self.entries
            .iter()
            .find(|e| e.category == category)
            .map(|e| e.subtypes.as_slice())
    }

    /// Whether nothing would be searched.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|e| e.subtypes.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_unknown_subtypes() {
        let mut selection = Selection::new();
        selection.add(Category::Education, ["小學", "火車站", "大學"]);
        assert_eq!(
            selection.subtypes(Category::Education).unwrap(),
            ["小學".to_string(), "大學".to_string()]
        );
    }

    #[test]
    fn merges_repeated_category_in_place() {
        let mut selection = Selection::new();
        selection.add(Category::Shopping, ["便利商店"]);
        selection.add(Category::Education, ["小學"]);
        selection.add(Category::Shopping, ["便利商店", "超市"]);

        assert_eq!(
            selection.categories(),
            vec![Category::Shopping, Category::Education]
        );
        assert_eq!(
            selection.subtypes(Category::Shopping).unwrap(),
            ["便利商店".to_string(), "超市".to_string()]
        );
    }

    #[test]
    fn whole_categories_cover_taxonomy() {
        let selection = Selection::whole_categories(&[Category::Dining]);
        assert_eq!(
            selection.subtypes(Category::Dining).unwrap().len(),
            Taxonomy::entries(Category::Dining).len()
        );
    }

    #[test]
    fn empty_when_no_subtypes() {
        let mut selection = Selection::new();
        assert!(selection.is_empty());
        selection.add(Category::Leisure, ["not-a-subtype"]);
        assert!(selection.is_empty());
    }
}
