//! Attached values and the node-factory seam
//!
//! The engine does not build AST nodes itself. When a binding needs a
//! concrete value (a reserved constant, an angle, an explicit declaration)
//! it asks a [`NodeFactory`] and stores the opaque [`ValueId`] it gets back.

use std::fmt;

use crate::types::SymbolKind;

/// Opaque handle to a node owned by the node builder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(u32);

impl ValueId {
    pub fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for ValueId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Literal payload handed to the factory
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Literal {
    Float(f64),
    Int(i64),
}

/// Everything the factory gets to see about the binding it builds for
#[derive(Debug, Clone, PartialEq)]
pub struct NodeRequest<'a> {
    pub name: &'a str,
    pub kind: SymbolKind,
    pub bits: u32,
    pub literal: Option<Literal>,
}

/// Builder of concrete AST nodes for resolved symbols
pub trait NodeFactory {
    /// Build a node for the binding, or `None` if this kind has no node
    fn create(&mut self, request: &NodeRequest<'_>) -> Option<ValueId>;
}

/// A node recorded by [`OpaqueNodes`]
#[derive(Debug, Clone, PartialEq)]
pub struct OpaqueNode {
    pub name: String,
    pub kind: SymbolKind,
    pub bits: u32,
    pub literal: Option<Literal>,
}

/// Default factory: hands out sequential handles and remembers what it made
#[derive(Debug, Default)]
pub struct OpaqueNodes {
    nodes: Vec<OpaqueNode>,
}

impl OpaqueNodes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, id: ValueId) -> Option<&OpaqueNode> {
        self.nodes.get(id.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

impl NodeFactory for OpaqueNodes {
    fn create(&mut self, request: &NodeRequest<'_>) -> Option<ValueId> {
        if request.kind == SymbolKind::Undefined {
            return None;
        }
        let id = ValueId(self.nodes.len() as u32);
        self.nodes.push(OpaqueNode {
            name: request.name.to_string(),
            kind: request.kind,
            bits: request.bits,
            literal: request.literal,
        });
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_sequential_handles() {
        let mut nodes = OpaqueNodes::new();
        let first = nodes.create(&NodeRequest {
            name: "pi",
            kind: SymbolKind::Angle,
            bits: 64,
            literal: Some(Literal::Float(std::f64::consts::PI)),
        });
        let second = nodes.create(&NodeRequest {
            name: "x",
            kind: SymbolKind::Int,
            bits: 32,
            literal: None,
        });

        assert_eq!(first, Some(ValueId::new(0)));
        assert_eq!(second, Some(ValueId::new(1)));
        assert_eq!(nodes.get(ValueId::new(1)).map(|n| n.name.as_str()), Some("x"));
    }

    #[test]
    fn test_undefined_gets_no_node() {
        let mut nodes = OpaqueNodes::new();
        let id = nodes.create(&NodeRequest {
            name: "mystery",
            kind: SymbolKind::Undefined,
            bits: 0,
            literal: None,
        });
        assert_eq!(id, None);
        assert!(nodes.is_empty());
    }
}
