//! Hash-chained symbol tables for typedef names and enum tags.

use serde::Serialize;

use crate::types::EnumListId;

/// Number of hash buckets; prime for a better spread.
pub const SYMBOL_BUCKETS: usize = 251;

/// Handle to a symbol inside the table that created it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct SymbolId(usize);

/// Value attached to a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "snake_case", tag = "type", content = "list")]
pub enum SymbolValue {
    #[default]
    None,
    EnumList(EnumListId),
}

#[derive(Debug, Clone, Serialize)]
pub struct Symbol {
    pub name: String,
    pub flags: u16,
    pub value: SymbolValue,
    #[serde(skip)]
    next: Option<SymbolId>,
}

/// A name → [`Symbol`] store.
///
/// Symbols are never removed individually; [`SymbolTable::destroy`] clears
/// the whole table.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    buckets: Vec<Option<SymbolId>>,
    symbols: Vec<Symbol>,
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}

impl SymbolTable {
    pub fn new() -> Self {
        Self {
            buckets: vec![None; SYMBOL_BUCKETS],
            symbols: Vec::new(),
        }
    }

    fn hash(name: &str) -> usize {
        let mut h: u32 = 0;
        for byte in name.bytes() {
            h = (h << 1) ^ u32::from(byte);
        }
        h as usize % SYMBOL_BUCKETS
    }

    /// Looks a name up, walking only its own bucket.
    pub fn find(&self, name: &str) -> Option<SymbolId> {
        let mut cursor = self.buckets[Self::hash(name)];
        while let Some(id) = cursor {
            let symbol = &self.symbols[id.0];
            if symbol.name == name {
                return Some(id);
            }
            cursor = symbol.next;
        }
        None
    }

    /// Returns the existing symbol for `name`, or creates one at the front
    /// of its bucket.
    pub fn insert_if_absent(&mut self, name: &str, flags: u16) -> SymbolId {
        if let Some(id) = self.find(name) {
            return id;
        }
        let bucket = Self::hash(name);
        let id = SymbolId(self.symbols.len());
        self.symbols.push(Symbol {
            name: name.to_string(),
            flags,
            value: SymbolValue::None,
            next: self.buckets[bucket],
        });
        self.buckets[bucket] = Some(id);
        id
    }

    pub fn contains(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    pub fn get(&self, id: SymbolId) -> &Symbol {
        &self.symbols[id.0]
    }

    pub fn get_mut(&mut self, id: SymbolId) -> &mut Symbol {
        &mut self.symbols[id.0]
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    /// Drops every symbol and empties all buckets.
    pub fn destroy(&mut self) {
        self.symbols.clear();
        self.buckets.iter_mut().for_each(|bucket| *bucket = None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_is_idempotent() {
        let mut table = SymbolTable::new();
        let first = table.insert_if_absent("size_t", 0);
        let second = table.insert_if_absent("size_t", 3);
        assert_eq!(first, second);
        assert_eq!(table.len(), 1);
        assert_eq!(table.get(first).flags, 0);
    }

    #[test]
    fn test_tables_are_independent() {
        let mut typedefs = SymbolTable::new();
        let mut tags = SymbolTable::new();
        typedefs.insert_if_absent("Color", 0);
        tags.insert_if_absent("color", 0);

        assert!(typedefs.contains("Color"));
        assert!(!typedefs.contains("color"));
        assert!(tags.contains("color"));
        assert!(!tags.contains("Color"));
    }

    #[test]
    fn test_colliding_names_chain_in_one_bucket() {
        let mut table = SymbolTable::new();
        let names: Vec<String> = (0..2000).map(|i| format!("n{i}")).collect();
        let target = SymbolTable::hash(&names[0]);
        let colliding: Vec<&String> = names
            .iter()
            .filter(|n| SymbolTable::hash(n) == target)
            .take(3)
            .collect();
        assert!(colliding.len() >= 2);

        let ids: Vec<SymbolId> = colliding
            .iter()
            .map(|n| table.insert_if_absent(n, 0))
            .collect();
        for (name, id) in colliding.iter().zip(&ids) {
            assert_eq!(table.find(name), Some(*id));
        }
    }

    #[test]
    fn test_destroy_clears_everything() {
        let mut table = SymbolTable::new();
        table.insert_if_absent("a", 0);
        table.insert_if_absent("b", 0);
        table.destroy();
        assert!(table.is_empty());
        assert!(table.find("a").is_none());
    }
}
