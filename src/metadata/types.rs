//! Static type annotations supplied by an external oracle.
//!
//! Type inference is not part of circuit construction. A [`TypeOracle`] is
//! injected per translation and asked, for every gate that is created, whether
//! it knows a static type for the gate's definition site. The answer is copied
//! onto the gate as an advisory [`GateType`]; `None` is always acceptable.
//!
//! # Examples
//!
//! ```rust
//! use bytecircuit::metadata::{GateType, TypeOracle, TypeSite, TypeTable};
//!
//! let mut table = TypeTable::new();
//! table.insert(TypeSite::Argument { slot: 4 }, GateType::NUMBER);
//!
//! assert_eq!(table.type_of(TypeSite::Argument { slot: 4 }), Some(GateType::NUMBER));
//! assert_eq!(table.type_of(TypeSite::Bytecode { pc: 0 }), None);
//! ```

use std::fmt;

use rustc_hash::FxHashMap;

use crate::{assembly::Register, utils::graph::NodeId};

/// An opaque static-type token.
///
/// The builder never interprets the value beyond the few well-known
/// constants it assigns to literals itself.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct GateType(u32);

impl GateType {
    /// No static knowledge
    pub const ANY: GateType = GateType(0);
    /// A number
    pub const NUMBER: GateType = GateType(1);
    /// A string
    pub const STRING: GateType = GateType(2);
    /// A boolean
    pub const BOOLEAN: GateType = GateType(3);
    /// `undefined`
    pub const UNDEFINED: GateType = GateType(4);
    /// `null`
    pub const NULL: GateType = GateType(5);
    /// The hole marker
    pub const HOLE: GateType = GateType(6);
    /// A function object
    pub const FUNCTION: GateType = GateType(7);

    /// Wrap a raw token.
    #[must_use]
    pub const fn new(raw: u32) -> Self {
        GateType(raw)
    }

    /// The raw token.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for GateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "GateType({})", self.0)
    }
}

impl fmt::Display for GateType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            GateType::ANY => write!(f, "any"),
            GateType::NUMBER => write!(f, "number"),
            GateType::STRING => write!(f, "string"),
            GateType::BOOLEAN => write!(f, "boolean"),
            GateType::UNDEFINED => write!(f, "undefined"),
            GateType::NULL => write!(f, "null"),
            GateType::HOLE => write!(f, "hole"),
            GateType::FUNCTION => write!(f, "function"),
            GateType(raw) => write!(f, "t{raw}"),
        }
    }
}

/// The definition site a type is looked up for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeSite {
    /// The value produced by the instruction at `pc`
    Bytecode {
        /// Program counter of the defining instruction
        pc: u32,
    },
    /// An argument gate
    Argument {
        /// Argument slot, implicit arguments first
        slot: u16,
    },
    /// The merged value of `register` at the entry of `block`
    Selector {
        /// Block owning the selector
        block: NodeId,
        /// Register or accumulator being merged
        register: Register,
    },
    /// The pending exception read at the entry of a handler block
    Exception {
        /// Handler block
        block: NodeId,
    },
}

/// Source of advisory static types.
///
/// Implementations must be shareable across threads; one oracle may serve
/// translations running in parallel.
pub trait TypeOracle: Send + Sync {
    /// Static type of the value defined at `site`, if known.
    fn type_of(&self, site: TypeSite) -> Option<GateType>;
}

/// An oracle that knows nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoTypes;

impl TypeOracle for NoTypes {
    fn type_of(&self, _site: TypeSite) -> Option<GateType> {
        None
    }
}

/// A map-backed oracle.
#[derive(Debug, Clone, Default)]
pub struct TypeTable {
    types: FxHashMap<TypeSite, GateType>,
}

impl TypeTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the type of a site, replacing any previous entry.
    pub fn insert(&mut self, site: TypeSite, ty: GateType) {
        self.types.insert(site, ty);
    }

    /// Number of recorded sites.
    #[must_use]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    /// Returns `true` if nothing is recorded.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

impl TypeOracle for TypeTable {
    fn type_of(&self, site: TypeSite) -> Option<GateType> {
        self.types.get(&site).copied()
    }
}

impl FromIterator<(TypeSite, GateType)> for TypeTable {
    fn from_iter<I: IntoIterator<Item = (TypeSite, GateType)>>(iter: I) -> Self {
        TypeTable {
            types: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_types_answers_nothing() {
        assert_eq!(NoTypes.type_of(TypeSite::Bytecode { pc: 3 }), None);
        assert_eq!(NoTypes.type_of(TypeSite::Argument { slot: 0 }), None);
    }

    #[test]
    fn test_type_table_lookup() {
        let site = TypeSite::Selector {
            block: NodeId::new(2),
            register: Register::Virtual(1),
        };
        let table: TypeTable = [(site, GateType::new(42))].into_iter().collect();
        assert_eq!(table.len(), 1);
        assert_eq!(table.type_of(site), Some(GateType::new(42)));
        assert_eq!(
            table.type_of(TypeSite::Selector {
                block: NodeId::new(2),
                register: Register::Accumulator,
            }),
            None
        );
    }

    #[test]
    fn test_gate_type_display() {
        assert_eq!(GateType::NUMBER.to_string(), "number");
        assert_eq!(GateType::new(99).to_string(), "t99");
        assert_eq!(format!("{:?}", GateType::STRING), "GateType(2)");
    }
}
