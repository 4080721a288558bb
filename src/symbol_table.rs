//! Scoped symbol tables
//!
//! One table holds the class scope (statics and fields) for the whole class;
//! a second holds the subroutine scope (arguments and locals) and is reset at
//! the start of every subroutine. Indices per storage kind are dense: the n-th
//! definition of a kind gets index n - 1.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use snafu::ensure;

use crate::error::{
    DuplicateSymbolSnafu, Error, InvalidKindSnafu, Result, TooManySnafu, UndefinedSymbolSnafu,
};
use crate::vm::Segment;

/// Storage kind of a declared name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Kind {
    Static,
    Field,
    Argument,
    Local,
}

impl Kind {
    pub const ALL: [Kind; 4] = [Kind::Static, Kind::Field, Kind::Argument, Kind::Local];

    /// VM segment that stores variables of this kind
    pub fn segment(self) -> Segment {
        match self {
            Kind::Static => Segment::Static,
            Kind::Field => Segment::This,
            Kind::Argument => Segment::Argument,
            Kind::Local => Segment::Local,
        }
    }

    fn slot(self) -> usize {
        self as usize
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Kind::Static => "static",
            Kind::Field => "field",
            Kind::Argument => "argument",
            Kind::Local => "local",
        })
    }
}

impl FromStr for Kind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Kind> {
        match s {
            "static" => Ok(Kind::Static),
            "field" => Ok(Kind::Field),
            "argument" | "arg" => Ok(Kind::Argument),
            "local" | "var" => Ok(Kind::Local),
            _ => InvalidKindSnafu { kind: s }.fail(),
        }
    }
}

/// A declared name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    /// Primitive type name or class name
    pub ty: String,
    pub kind: Kind,
    pub index: u16,
}

/// Name to entry mapping with one running counter per storage kind
#[derive(Debug, Default, Clone)]
pub struct SymbolTable {
    entries: HashMap<String, Entry>,
    counts: [u16; 4],
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare `name` with the next free index of `kind` and return that index.
    ///
    /// Redeclaring a name already in this table is an error.
    pub fn define(&mut self, name: &str, ty: &str, kind: Kind) -> Result<u16> {
        ensure!(
            !self.entries.contains_key(name),
            DuplicateSymbolSnafu { name }
        );

        let index = self.counts[kind.slot()];
        let Some(next) = index.checked_add(1) else {
            return TooManySnafu {
                what: format!("{kind} variables"),
                limit: u16::MAX,
            }
            .fail();
        };
        self.entries.insert(
            name.to_string(),
            Entry {
                ty: ty.to_string(),
                kind,
                index,
            },
        );
        self.counts[kind.slot()] = next;
        log::trace!("defined {name}: {ty} as {kind} {index}");
        Ok(index)
    }

    /// Number of names defined with `kind` since the last reset
    pub fn var_count(&self, kind: Kind) -> u16 {
        self.counts[kind.slot()]
    }

    pub fn get(&self, name: &str) -> Option<&Entry> {
        self.entries.get(name)
    }

    pub fn kind_of(&self, name: &str) -> Result<Kind> {
        self.lookup(name).map(|e| e.kind)
    }

    pub fn type_of(&self, name: &str) -> Result<&str> {
        self.lookup(name).map(|e| e.ty.as_str())
    }

    pub fn index_of(&self, name: &str) -> Result<u16> {
        self.lookup(name).map(|e| e.index)
    }

    /// Drop every entry and zero all counters
    pub fn reset(&mut self) {
        self.entries.clear();
        self.counts = [0; 4];
    }

    fn lookup(&self, name: &str) -> Result<&Entry> {
        match self.entries.get(name) {
            Some(entry) => Ok(entry),
            None => UndefinedSymbolSnafu { name }.fail(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_indices_per_kind() {
        let mut table = SymbolTable::new();
        assert_eq!(table.define("a", "int", Kind::Field).unwrap(), 0);
        assert_eq!(table.define("s", "int", Kind::Static).unwrap(), 0);
        assert_eq!(table.define("b", "Point", Kind::Field).unwrap(), 1);
        assert_eq!(table.define("t", "boolean", Kind::Static).unwrap(), 1);
        assert_eq!(table.define("c", "char", Kind::Field).unwrap(), 2);

        assert_eq!(table.var_count(Kind::Field), 3);
        assert_eq!(table.var_count(Kind::Static), 2);
        assert_eq!(table.var_count(Kind::Local), 0);
        assert_eq!(table.index_of("c").unwrap(), 2);
        assert_eq!(table.type_of("b").unwrap(), "Point");
        assert_eq!(table.kind_of("t").unwrap(), Kind::Static);
    }

    #[test]
    fn test_missing_name() {
        let table = SymbolTable::new();
        assert!(matches!(table.kind_of("x"), Err(Error::UndefinedSymbol { .. })));
        assert!(table.type_of("x").is_err());
        assert!(table.index_of("x").is_err());
        assert!(table.get("x").is_none());
    }

    #[test]
    fn test_redefinition_is_rejected() {
        let mut table = SymbolTable::new();
        table.define("x", "int", Kind::Local).unwrap();
        let err = table.define("x", "char", Kind::Argument).unwrap_err();
        assert!(matches!(err, Error::DuplicateSymbol { .. }));
        // The failed definition consumes no index
        assert_eq!(table.var_count(Kind::Argument), 0);
        assert_eq!(table.type_of("x").unwrap(), "int");
    }

    #[test]
    fn test_reset() {
        let mut table = SymbolTable::new();
        table.define("this", "Point", Kind::Argument).unwrap();
        table.define("i", "int", Kind::Local).unwrap();
        table.reset();

        assert!(table.get("this").is_none());
        for kind in Kind::ALL {
            assert_eq!(table.var_count(kind), 0);
        }
        assert_eq!(table.define("i", "int", Kind::Local).unwrap(), 0);
    }

    #[test]
    fn test_index_limit() {
        let mut table = SymbolTable::new();
        table.counts[Kind::Local.slot()] = u16::MAX - 1;
        assert_eq!(table.define("last", "int", Kind::Local).unwrap(), u16::MAX - 1);

        let err = table.define("one_more", "int", Kind::Local).unwrap_err();
        assert!(matches!(err, Error::TooMany { limit: u16::MAX, .. }));
        assert!(table.get("one_more").is_none());
        assert_eq!(table.var_count(Kind::Local), u16::MAX);
        // Other kinds keep counting
        assert_eq!(table.define("a", "int", Kind::Argument).unwrap(), 0);
    }

    #[test]
    fn test_kind_from_str() {
        assert_eq!("field".parse::<Kind>().unwrap(), Kind::Field);
        assert_eq!("var".parse::<Kind>().unwrap(), Kind::Local);
        assert_eq!("arg".parse::<Kind>().unwrap(), Kind::Argument);
        assert!(matches!(
            "register".parse::<Kind>(),
            Err(Error::InvalidKind { .. })
        ));
    }

    #[test]
    fn test_segments() {
        assert_eq!(Kind::Static.segment(), Segment::Static);
        assert_eq!(Kind::Field.segment(), Segment::This);
        assert_eq!(Kind::Argument.segment(), Segment::Argument);
        assert_eq!(Kind::Local.segment(), Segment::Local);
    }
}
