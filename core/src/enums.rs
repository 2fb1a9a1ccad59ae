//! Arena of enumerator lists.
//!
//! A list can be reachable from several symbols at once (`typedef enum
//! {...} A, B;` registers it under both names), so no symbol owns it. The
//! store owns every list for the whole session and symbols refer to lists by
//! [`EnumListId`].

use serde::Serialize;
use tracing::debug;

use crate::symbol::{SymbolTable, SymbolValue};
use crate::types::{EnumListId, Enumerator};

#[derive(Debug, Clone, Default, Serialize)]
pub struct EnumStore {
    lists: Vec<Vec<Enumerator>>,
}

impl EnumStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Starts a new list holding `first`.
    pub fn new_list(&mut self, first: Enumerator) -> EnumListId {
        let id = EnumListId(self.lists.len());
        self.lists.push(vec![first]);
        id
    }

    pub fn append(&mut self, list: EnumListId, enumerator: Enumerator) {
        self.lists[list.0].push(enumerator);
    }

    /// Attaches a trailing comment to the most recently added enumerator.
    ///
    /// An existing comment is demoted to the group comment. When the
    /// enumerator already carries both, the comment is dropped and the name
    /// of the enumerator is returned as the error.
    pub fn attach_comment(&mut self, list: EnumListId, comment: String) -> Result<(), String> {
        let Some(last) = self.lists[list.0].last_mut() else {
            return Ok(());
        };
        if last.comment.is_some() {
            if last.group_comment.is_some() {
                return Err(last.name.clone());
            }
            last.group_comment = last.comment.take();
        }
        last.comment = Some(comment);
        Ok(())
    }

    /// Makes `list` the value of `name` in `table`.
    pub fn register_under(&self, table: &mut SymbolTable, name: &str, list: EnumListId) {
        let id = table.insert_if_absent(name, 0);
        table.get_mut(id).value = SymbolValue::EnumList(list);
        debug!(name, list = list.0, "registered enumerator list");
    }

    /// Resolves the list registered under `name`, if any.
    pub fn lookup(&self, table: &SymbolTable, name: &str) -> Option<EnumListId> {
        match table.get(table.find(name)?).value {
            SymbolValue::EnumList(list) => Some(list),
            SymbolValue::None => None,
        }
    }

    pub fn get(&self, list: EnumListId) -> &[Enumerator] {
        &self.lists[list.0]
    }

    pub fn len(&self) -> usize {
        self.lists.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lists.is_empty()
    }

    /// Frees every list exactly once, however many symbols referred to it.
    pub fn destroy_all(&mut self) {
        self.lists.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_comment_demotes_then_rejects() {
        let mut store = EnumStore::new();
        let list = store.new_list(Enumerator::new("RED", None, None));

        assert!(store.attach_comment(list, "first".into()).is_ok());
        assert!(store.attach_comment(list, "second".into()).is_ok());
        let red = &store.get(list)[0];
        assert_eq!(red.comment.as_deref(), Some("second"));
        assert_eq!(red.group_comment.as_deref(), Some("first"));

        let before = store.get(list).to_vec();
        assert_eq!(
            store.attach_comment(list, "third".into()),
            Err("RED".to_string())
        );
        assert_eq!(store.get(list), before.as_slice());
    }

    #[test]
    fn test_attach_comment_targets_last_enumerator() {
        let mut store = EnumStore::new();
        let list = store.new_list(Enumerator::new("A", None, None));
        store.append(list, Enumerator::new("B", None, None));
        store.attach_comment(list, "about b".into()).unwrap();
        assert!(store.get(list)[0].comment.is_none());
        assert_eq!(store.get(list)[1].comment.as_deref(), Some("about b"));
    }

    #[test]
    fn test_list_shared_by_several_symbols() {
        let mut store = EnumStore::new();
        let mut typedefs = SymbolTable::new();
        let list = store.new_list(Enumerator::new("ON", None, None));
        store.register_under(&mut typedefs, "Switch", list);
        store.register_under(&mut typedefs, "Toggle", list);

        assert_eq!(store.lookup(&typedefs, "Switch"), Some(list));
        assert_eq!(store.lookup(&typedefs, "Toggle"), Some(list));
        assert_eq!(store.len(), 1);

        store.destroy_all();
        assert!(store.is_empty());
    }

    #[test]
    fn test_lookup_plain_symbol_has_no_list() {
        let store = EnumStore::new();
        let mut typedefs = SymbolTable::new();
        typedefs.insert_if_absent("size_t", 0);
        assert_eq!(store.lookup(&typedefs, "size_t"), None);
        assert_eq!(store.lookup(&typedefs, "missing"), None);
    }
}
