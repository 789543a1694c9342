//! Operations over sequences of top-level items
//!
//! - [`count_items`]: per-kind tallies
//! - [`dump_tree`]: lazy indented trace
//! - [`find`] / [`find_mut`]: recursive lookup of menus and actions
//! - [`build_hierarchy`]: attach flat provider output under its menus

use crate::duplicable::Duplicable;
use crate::item::Item;
use indexmap::IndexMap;
use std::collections::HashSet;
use std::fmt;

/// Number of items per kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ItemCounts {
    /// Menus
    pub menus: usize,
    /// Actions
    pub actions: usize,
    /// Profiles
    pub profiles: usize,
}

impl ItemCounts {
    /// Sum of all kinds
    #[inline]
    #[must_use]
    pub fn total(&self) -> usize {
        self.menus + self.actions + self.profiles
    }
}

/// Count menus, actions and profiles
///
/// Profiles of every visited action are counted. Children of menus are
/// visited only when `recurse` is set.
#[must_use]
pub fn count_items(items: &[Item], recurse: bool) -> ItemCounts {
    let mut counts = ItemCounts::default();
    tally(items, recurse, &mut counts);
    counts
}

fn tally(items: &[Item], recurse: bool, counts: &mut ItemCounts) {
    for item in items {
        match item {
            Item::Menu(menu) => {
                counts.menus += 1;
                if recurse {
                    tally(&menu.children, recurse, counts);
                }
            }
            Item::Action(action) => {
                counts.actions += 1;
                counts.profiles += action.profile_count();
            }
            Item::Profile(_) => counts.profiles += 1,
        }
    }
}

/// Lazy, indented view of a tree for diagnostics
///
/// One line per node: two spaces per depth level, the kind, the id and
/// the quoted label. No parsing guarantee.
#[derive(Debug, Clone, Copy)]
pub struct TreeDump<'a> {
    items: &'a [Item],
}

/// Build a [`TreeDump`] over `items`
#[must_use]
pub fn dump_tree(items: &[Item]) -> TreeDump<'_> {
    TreeDump { items }
}

impl<'a> TreeDump<'a> {
    /// Iterate the lines, depth first
    #[must_use]
    pub fn lines(&self) -> TreeLines<'a> {
        TreeLines {
            stack: vec![self.items.iter()],
        }
    }

    /// Send every line to the trace log at debug level
    pub fn trace(&self) {
        for line in self.lines() {
            tracing::debug!("{line}");
        }
    }
}

impl fmt::Display for TreeDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for line in self.lines() {
            writeln!(f, "{line}")?;
        }
        Ok(())
    }
}

impl<'a> IntoIterator for TreeDump<'a> {
    type Item = String;
    type IntoIter = TreeLines<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines()
    }
}

/// Iterator over the lines of a [`TreeDump`]
#[derive(Debug, Clone)]
pub struct TreeLines<'a> {
    stack: Vec<std::slice::Iter<'a, Item>>,
}

impl Iterator for TreeLines<'_> {
    type Item = String;

    fn next(&mut self) -> Option<String> {
        loop {
            let depth = self.stack.len().checked_sub(1)?;
            let next = self.stack.last_mut().and_then(Iterator::next);
            match next {
                Some(item) => {
                    let line = format!(
                        "{:indent$}({}) {} \"{}\"",
                        "",
                        item.kind().type_name(),
                        item.id(),
                        item.label(),
                        indent = depth * 2
                    );
                    self.stack.push(item.children().iter());
                    return Some(line);
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

/// Find a menu or action by id anywhere in the tree
#[must_use]
pub fn find<'a>(items: &'a [Item], id: &str) -> Option<&'a Item> {
    for item in items.iter().filter(|i| i.kind().is_container()) {
        if item.id() == id {
            return Some(item);
        }
        if let Item::Menu(_) = item {
            if let Some(found) = find(item.children(), id) {
                return Some(found);
            }
        }
    }
    None
}

/// Find a menu or action by id anywhere in the tree, mutably
pub fn find_mut<'a>(items: &'a mut [Item], id: &str) -> Option<&'a mut Item> {
    for item in items.iter_mut().filter(|i| i.kind().is_container()) {
        if item.id() == id {
            return Some(item);
        }
        if let Item::Menu(_) = item {
            if let Some(found) = find_mut(item.children_mut(), id) {
                return Some(found);
            }
        }
    }
    None
}

/// Run [`Duplicable::check_status`] on every item
pub fn check_status_all(items: &mut [Item]) {
    for item in items {
        item.check_status();
    }
}

/// Attach flat items under the menus that list them
///
/// Providers return menus and actions as a flat sequence, each menu
/// naming its children in its `items` field. Items no menu references
/// stay at the top level, in their original order. Unknown ids in a
/// menu's list are ignored; duplicate ids keep the first occurrence.
#[must_use]
pub fn build_hierarchy(items: Vec<Item>) -> Vec<Item> {
    let mut pool: IndexMap<String, Item> = IndexMap::with_capacity(items.len());
    for item in items {
        let id = item.id().to_string();
        if pool.contains_key(&id) {
            tracing::warn!(id = %id, "duplicate item id, keeping the first one");
            continue;
        }
        pool.insert(id, item);
    }

    let referenced: HashSet<String> = pool
        .values()
        .filter_map(Item::as_menu)
        .flat_map(|m| m.items_list().iter().cloned())
        .collect();
    let roots: Vec<String> = pool
        .keys()
        .filter(|id| !referenced.contains(*id))
        .cloned()
        .collect();

    let mut result = Vec::with_capacity(roots.len());
    for id in roots {
        if let Some(item) = pool.shift_remove(&id) {
            result.push(attach(item, &mut pool));
        }
    }
    // only reachable through a reference cycle
    while let Some((id, item)) = pool.shift_remove_index(0) {
        tracing::warn!(id = %id, "menu reference cycle, keeping item at top level");
        result.push(attach(item, &mut pool));
    }
    result
}

fn attach(mut item: Item, pool: &mut IndexMap<String, Item>) -> Item {
    if let Item::Menu(menu) = &mut item {
        let ids = menu.items_list().to_vec();
        for id in ids {
            match pool.shift_remove(&id) {
                Some(child) => menu.children.push(attach(child, pool)),
                None => tracing::debug!(menu = menu.id(), child = %id, "listed child not found"),
            }
        }
    }
    item
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Action, Menu, Profile};
    use pretty_assertions::assert_eq;

    fn open_action() -> Item {
        Item::Action(
            Action::with_id("A")
                .with_label("Open")
                .with_profile(Profile::new("p1").with_path("/bin/open")),
        )
    }

    fn menu_listing(id: &str, children: &[&str]) -> Item {
        let mut menu = Menu::with_id(id).with_label(id);
        menu.fields
            .set(
                crate::data::names::ITEMS,
                children.iter().map(|s| (*s).to_string()).collect::<Vec<_>>(),
            )
            .unwrap();
        Item::Menu(menu)
    }

    #[test]
    fn count_items_scenario() {
        let items = vec![Item::Menu(Menu::with_id("M").with_label("M")), open_action()];
        let counts = count_items(&items, true);
        assert_eq!(
            counts,
            ItemCounts {
                menus: 1,
                actions: 1,
                profiles: 1
            }
        );
        assert_eq!(counts.total(), 3);
    }

    #[test]
    fn count_items_without_recursion() {
        let mut menu = Item::Menu(Menu::with_id("M").with_label("M"));
        menu.insert_child(open_action(), -1).unwrap();
        let items = vec![menu];
        assert_eq!(count_items(&items, false).actions, 0);
        assert_eq!(count_items(&items, true).actions, 1);
    }

    #[test]
    fn dump_tree_indents_by_depth() {
        let mut menu = Item::Menu(Menu::with_id("M").with_label("Tools"));
        menu.insert_child(open_action(), -1).unwrap();
        let items = vec![menu];
        let text = dump_tree(&items).to_string();
        assert_eq!(
            text,
            "(Menu) M \"Tools\"\n  (Action) A \"Open\"\n    (Profile) p1 \"Default profile\"\n"
        );
    }

    #[test]
    fn dump_tree_is_lazy() {
        let items = vec![open_action(), open_action()];
        let mut lines = dump_tree(&items).lines();
        assert_eq!(lines.next().as_deref(), Some("(Action) A \"Open\""));
    }

    #[test]
    fn find_nested() {
        let mut outer = Item::Menu(Menu::with_id("outer").with_label("o"));
        let mut inner = Item::Menu(Menu::with_id("inner").with_label("i"));
        inner.insert_child(open_action(), -1).unwrap();
        outer.insert_child(inner, -1).unwrap();
        let mut items = vec![outer];

        assert_eq!(find(&items, "A").map(Item::label), Some("Open"));
        assert!(find(&items, "p1").is_none());

        find_mut(&mut items, "A").unwrap().set_label("Run");
        assert_eq!(find(&items, "A").map(Item::label), Some("Run"));
    }

    #[test]
    fn build_hierarchy_attaches_listed_children() {
        let flat = vec![
            open_action(),
            menu_listing("inner", &["A"]),
            menu_listing("outer", &["inner", "missing"]),
        ];
        let tree = build_hierarchy(flat);
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].id(), "outer");
        assert_eq!(tree[0].children()[0].id(), "inner");
        assert_eq!(tree[0].children()[0].children()[0].id(), "A");
    }

    #[test]
    fn build_hierarchy_survives_cycle() {
        let flat = vec![menu_listing("x", &["y"]), menu_listing("y", &["x"])];
        let tree = build_hierarchy(flat);
        assert_eq!(count_items(&tree, true).menus, 2);
    }
}
