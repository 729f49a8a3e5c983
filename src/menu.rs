/*
 * Menu model and the pure merge algorithm used for MDI containers.
 *
 * Menus live in the `FormManager` arena and are referenced by `MenuId`. A menu's
 * native handle is materialized lazily the first time it is displayed and is
 * dropped whenever its items change. Merged menus are ordinary arena entries
 * flagged as derived; they are owned by the MDI child they were built for.
 */

use std::rc::Rc;

use crate::app::FormManager;
use crate::native::NativeMenuItem;
use crate::types::{MenuActionId, MenuHandle, MenuId};

/// How a child item combines with the parent's items of the same merge order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum MergeType {
    /// Inserted after the parent's items with a lower or equal merge order.
    #[default]
    Add,
    /// Replaces the parent's item with the same merge order.
    Replace,
    /// Merges its sub-items into the parent's item with the same merge order.
    MergeItems,
    /// Removes the parent's item with the same merge order.
    Remove,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MenuItem {
    pub text: String,
    pub action: Option<MenuActionId>,
    pub merge_order: i32,
    pub merge_type: MergeType,
    pub children: Vec<MenuItem>,
}

impl MenuItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            action: None,
            merge_order: 0,
            merge_type: MergeType::Add,
            children: Vec::new(),
        }
    }

    pub fn with_action(mut self, action: MenuActionId) -> Self {
        self.action = Some(action);
        self
    }

    pub fn with_merge(mut self, merge_order: i32, merge_type: MergeType) -> Self {
        self.merge_order = merge_order;
        self.merge_type = merge_type;
        self
    }

    pub fn with_children(mut self, children: Vec<MenuItem>) -> Self {
        self.children = children;
        self
    }

    /// The mnemonic character marked with `&`, lowercased. `&&` is a literal ampersand.
    pub fn mnemonic(&self) -> Option<char> {
        let mut chars = self.text.chars();
        while let Some(c) = chars.next() {
            if c == '&' {
                match chars.next() {
                    Some('&') => continue,
                    Some(m) => return m.to_lowercase().next(),
                    None => return None,
                }
            }
        }
        None
    }
}

pub type MenuHandler = Rc<dyn Fn(&mut FormManager, MenuId)>;

pub(crate) struct Menu {
    pub(crate) items: Vec<MenuItem>,
    pub(crate) handle: Option<MenuHandle>,
    pub(crate) merged: bool,
    pub(crate) on_popup: Vec<MenuHandler>,
    pub(crate) on_collapse: Vec<MenuHandler>,
}

impl Menu {
    pub(crate) fn new(items: Vec<MenuItem>, merged: bool) -> Self {
        Self {
            items,
            handle: None,
            merged,
            on_popup: Vec::new(),
            on_collapse: Vec::new(),
        }
    }
}

fn insert_by_order(items: &mut Vec<MenuItem>, item: MenuItem) {
    let position = items
        .iter()
        .rposition(|existing| existing.merge_order <= item.merge_order)
        .map_or(0, |index| index + 1);
    items.insert(position, item);
}

/*
 * Combines parent and child items into the list shown by an MDI container while
 * the child is active. With default items (order 0, `Add`) the result is every
 * parent item followed by every child item.
 */
pub fn merge_items(parent: &[MenuItem], child: &[MenuItem]) -> Vec<MenuItem> {
    let mut merged: Vec<MenuItem> = parent.to_vec();
    for item in child {
        let same_order = merged
            .iter()
            .position(|existing| existing.merge_order == item.merge_order);
        match (item.merge_type, same_order) {
            (MergeType::Add, _) | (_, None) if item.merge_type != MergeType::Remove => {
                insert_by_order(&mut merged, item.clone());
            }
            (MergeType::Replace, Some(index)) => {
                merged[index] = item.clone();
            }
            (MergeType::MergeItems, Some(index)) => {
                let combined = merge_items(&merged[index].children, &item.children);
                merged[index].children = combined;
            }
            (MergeType::Remove, _) => {
                merged.retain(|existing| existing.merge_order != item.merge_order);
            }
            _ => insert_by_order(&mut merged, item.clone()),
        }
    }
    merged
}

/// Index of the first top-level item whose mnemonic matches `ch`.
pub fn find_mnemonic(items: &[MenuItem], ch: char) -> Option<usize> {
    let wanted = ch.to_lowercase().next()?;
    items.iter().position(|item| item.mnemonic() == Some(wanted))
}

pub(crate) fn to_native(items: &[MenuItem]) -> Vec<NativeMenuItem> {
    items
        .iter()
        .map(|item| NativeMenuItem {
            text: item.text.clone(),
            action: item.action,
            children: to_native(&item.children),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn texts(items: &[MenuItem]) -> Vec<&str> {
        items.iter().map(|item| item.text.as_str()).collect()
    }

    #[test]
    fn default_items_append_child_after_parent() {
        let parent = vec![MenuItem::new("&File"), MenuItem::new("&Window")];
        let child = vec![MenuItem::new("&Edit"), MenuItem::new("&Format")];
        let merged = merge_items(&parent, &child);
        assert_eq!(texts(&merged), vec!["&File", "&Window", "&Edit", "&Format"]);
    }

    #[test]
    fn merge_order_places_child_items_between_parent_items() {
        let parent = vec![
            MenuItem::new("File").with_merge(0, MergeType::Add),
            MenuItem::new("Window").with_merge(10, MergeType::Add),
        ];
        let child = vec![MenuItem::new("Edit").with_merge(5, MergeType::Add)];
        let merged = merge_items(&parent, &child);
        assert_eq!(texts(&merged), vec!["File", "Edit", "Window"]);
    }

    #[test]
    fn replace_remove_and_merge_items() {
        let parent = vec![
            MenuItem::new("File")
                .with_merge(0, MergeType::Add)
                .with_children(vec![
                    MenuItem::new("Open"),
                    MenuItem::new("Exit").with_merge(9, MergeType::Add),
                ]),
            MenuItem::new("Help").with_merge(20, MergeType::Add),
            MenuItem::new("Tools").with_merge(15, MergeType::Add),
        ];
        let child = vec![
            MenuItem::new("File")
                .with_merge(0, MergeType::MergeItems)
                .with_children(vec![MenuItem::new("Save").with_merge(1, MergeType::Add)]),
            MenuItem::new("Child Help").with_merge(20, MergeType::Replace),
            MenuItem::new("").with_merge(15, MergeType::Remove),
        ];

        let merged = merge_items(&parent, &child);

        assert_eq!(texts(&merged), vec!["File", "Child Help"]);
        assert_eq!(texts(&merged[0].children), vec!["Open", "Save", "Exit"]);
    }

    #[test]
    fn mnemonic_lookup_ignores_escaped_ampersand() {
        let items = vec![
            MenuItem::new("Save && &Close"),
            MenuItem::new("&Edit"),
            MenuItem::new("View"),
        ];
        assert_eq!(items[0].mnemonic(), Some('c'));
        assert_eq!(find_mnemonic(&items, 'E'), Some(1));
        assert_eq!(find_mnemonic(&items, 'v'), None);
    }

    proptest! {
        #[test]
        fn default_merge_is_concatenation(
            parent in prop::collection::vec("[a-z]{1,6}", 0..6),
            child in prop::collection::vec("[a-z]{1,6}", 0..6),
        ) {
            let parent_items: Vec<MenuItem> = parent.iter().map(MenuItem::new).collect();
            let child_items: Vec<MenuItem> = child.iter().map(MenuItem::new).collect();
            let merged = merge_items(&parent_items, &child_items);
            let expected: Vec<MenuItem> =
                parent_items.iter().chain(child_items.iter()).cloned().collect();
            prop_assert_eq!(merged, expected);
        }
    }
}
