//! The analysis graph the memory model reads its variables from.
//!
//! Building a graph from a program is somebody else's job; this module holds
//! the variable taxonomy, the [`IrGraph`] queries the model relies on, and an
//! in-memory [`Graph`] that can be filled programmatically or from JSON.

use std::collections::HashMap;
use std::fmt;
use std::fmt::{Debug, Formatter};
use indexmap::IndexMap;
use serde::Deserialize;
use crate::error::{MemoryError, Result};
use crate::offset::GepQuery;
use crate::types::{Type, TypeId, TypeTable};

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize)]
#[serde(transparent)]
pub struct VarId(pub u32);

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VarKind {
    Value,
    Object,
}

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Region {
    Stack,
    Heap,
    Global,
}

#[derive(Clone, PartialEq, Debug, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Constant {
    Int(i64),
    Float(f64),
    NullPtr,
    GlobalRef,
    Other(String),
}

#[derive(Clone, PartialEq, Debug)]
pub enum VarNode {
    TypedValue { ty: TypeId },
    PlaceholderValue,
    ConstantScalarObject { constant: Constant },
    ConstantAggregateObject,
    LocationObject { region: Region, ty: Option<TypeId> },
    PlaceholderObject,
}

#[derive(Clone, PartialEq, Debug)]
pub struct Variable {
    pub id: VarId,
    pub node: VarNode,
    /// `(base, offset)` for objects derived by pointer arithmetic.
    pub origin: Option<(VarId, i64)>,
}

impl VarNode {
    pub fn kind(&self) -> VarKind {
        match self {
            VarNode::TypedValue { .. } | VarNode::PlaceholderValue => VarKind::Value,
            VarNode::ConstantScalarObject { .. }
            | VarNode::ConstantAggregateObject
            | VarNode::LocationObject { .. }
            | VarNode::PlaceholderObject => VarKind::Object,
        }
    }
    fn field_insensitive(&self) -> bool {
        match self {
            VarNode::LocationObject { .. } => false,
            _ => true,
        }
    }
}

pub trait IrGraph {
    /// Every variable id, in the graph's enumeration order.
    fn ids(&self) -> Vec<VarId>;
    fn variable(&self, id: VarId) -> Option<&Variable>;
    fn types(&self) -> &TypeTable;
    /// The object reached from `base` at flattened `offset`, created on first
    /// request. Returns `base` itself when the effective offset is zero.
    fn gep_object(&mut self, base: VarId, offset: i64) -> Result<VarId>;

    fn node(&self, id: VarId) -> Result<&VarNode> {
        self.variable(id).map(|v| &v.node).ok_or(MemoryError::UnknownVariable(id))
    }
    fn kind(&self, id: VarId) -> Result<VarKind> {
        Ok(self.node(id)?.kind())
    }
    fn element_num(&self, ty: TypeId) -> Result<i64> {
        self.types().element_num(ty)
    }
    fn flattened_elem_index(&self, ty: TypeId, index: i64) -> Result<i64> {
        self.types().flattened_elem_index(ty, index)
    }
    fn is_pointer_type(&self, ty: TypeId) -> Result<bool> {
        self.types().is_pointer(ty)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Graph {
    types: TypeTable,
    vars: IndexMap<VarId, Variable>,
    derived: HashMap<(VarId, i64), VarId>,
    next_id: u64,
}

impl Graph {
    pub fn new(types: TypeTable) -> Self {
        Graph { types, ..Graph::default() }
    }
    pub fn add(&mut self, id: VarId, node: VarNode) -> Result<()> {
        if self.vars.contains_key(&id) {
            return Err(MemoryError::DuplicateVariable(id));
        }
        self.vars.insert(id, Variable { id, node, origin: None });
        self.next_id = self.next_id.max(id.0 as u64 + 1);
        Ok(())
    }
    pub fn len(&self) -> usize {
        self.vars.len()
    }
    fn modulus(&self, base: &Variable, offset: i64) -> Result<i64> {
        match base.node {
            VarNode::LocationObject { ty: Some(ty), .. } => {
                let limit = self.types.element_num(ty)?;
                Ok(if limit > 0 { offset.rem_euclid(limit) } else { offset })
            }
            _ => Ok(offset),
        }
    }
}

impl IrGraph for Graph {
    fn ids(&self) -> Vec<VarId> {
        self.vars.keys().copied().collect()
    }
    fn variable(&self, id: VarId) -> Option<&Variable> {
        self.vars.get(&id)
    }
    fn types(&self) -> &TypeTable {
        &self.types
    }
    fn gep_object(&mut self, base: VarId, offset: i64) -> Result<VarId> {
        let var = self.vars.get(&base).ok_or(MemoryError::UnknownVariable(base))?;
        if var.node.kind() != VarKind::Object {
            return Err(MemoryError::NotAnObject(base));
        }
        let (root, offset) = match var.origin {
            Some((root, prior)) =>
                (root, prior.checked_add(offset).ok_or(MemoryError::Overflow("derived object offset"))?),
            None => (base, offset),
        };
        let root_var = self.vars.get(&root).ok_or(MemoryError::UnknownVariable(root))?;
        if root_var.node.field_insensitive() {
            return Ok(root);
        }
        let offset = self.modulus(root_var, offset)?;
        if offset == 0 {
            return Ok(root);
        }
        if let Some(id) = self.derived.get(&(root, offset)) {
            return Ok(*id);
        }
        if self.next_id > u32::MAX as u64 {
            return Err(MemoryError::Overflow("variable id"));
        }
        let id = VarId(self.next_id as u32);
        let node = root_var.node.clone();
        self.next_id += 1;
        self.vars.insert(id, Variable { id, node, origin: Some((root, offset)) });
        self.derived.insert((root, offset), id);
        Ok(id)
    }
}

/// Raw per-variable metadata, before classification.
#[derive(Clone, Debug, Deserialize)]
pub struct VarRecord {
    pub id: VarId,
    pub kind: VarKind,
    #[serde(default)]
    pub ty: Option<TypeId>,
    #[serde(default)]
    pub placeholder: bool,
    #[serde(default)]
    pub payload: Option<Payload>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "class", rename_all = "snake_case")]
pub enum Payload {
    Constant { value: Constant },
    ConstantArray,
    ConstantStruct,
    Location { region: Region },
}

pub fn classify(record: &VarRecord) -> Result<VarNode> {
    match record.kind {
        VarKind::Value => match record.ty {
            Some(ty) => Ok(VarNode::TypedValue { ty }),
            None if record.placeholder => Ok(VarNode::PlaceholderValue),
            None => Err(MemoryError::UntypedValue(record.id)),
        },
        VarKind::Object => match &record.payload {
            None if record.placeholder => Ok(VarNode::PlaceholderObject),
            None => Err(MemoryError::MissingPayload(record.id)),
            Some(Payload::Constant { value }) =>
                Ok(VarNode::ConstantScalarObject { constant: value.clone() }),
            Some(Payload::ConstantArray) | Some(Payload::ConstantStruct) =>
                Ok(VarNode::ConstantAggregateObject),
            Some(Payload::Location { region }) =>
                Ok(VarNode::LocationObject { region: *region, ty: record.ty }),
        },
    }
}

/// JSON form of a graph: types in dependency order, variables in
/// enumeration order, and optional pointer-arithmetic queries.
#[derive(Clone, Debug, Deserialize)]
pub struct GraphFile {
    #[serde(default)]
    pub types: Vec<Type>,
    pub variables: Vec<VarRecord>,
    #[serde(default)]
    pub geps: Vec<GepQuery>,
}

impl GraphFile {
    pub fn into_graph(self) -> Result<(Graph, Vec<GepQuery>)> {
        let mut types = TypeTable::new();
        for typ in self.types {
            types.add(typ)?;
        }
        let mut graph = Graph::new(types);
        for record in self.variables.iter() {
            graph.add(record.id, classify(record)?)?;
        }
        Ok((graph, self.geps))
    }
}

impl Debug for VarId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}
