use std::fmt;
use std::fmt::{Debug, Formatter};
use serde::Deserialize;
use crate::error::{MemoryError, Result};

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Deserialize)]
#[serde(transparent)]
pub struct TypeId(pub u32);

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Type {
    Int { bits: u32 },
    Float,
    Pointer { pointee: Option<TypeId> },
    Function,
    Array { element: TypeId, len: u32 },
    Struct { fields: Vec<TypeId> },
}

/// Types of one graph, with each type's flattened element count computed
/// when it is added. Aggregates may only refer to types added before them.
#[derive(Clone, Debug, Default)]
pub struct TypeTable {
    types: Vec<Type>,
    elem_nums: Vec<i64>,
}

impl TypeTable {
    pub fn new() -> Self {
        TypeTable::default()
    }
    pub fn add(&mut self, typ: Type) -> Result<TypeId> {
        let elem_num = match &typ {
            Type::Int { .. } | Type::Float | Type::Pointer { .. } | Type::Function => 1,
            Type::Array { element, len } =>
                self.element_num(*element)?
                    .checked_mul(*len as i64)
                    .ok_or(MemoryError::Overflow("array element count"))?,
            Type::Struct { fields } => {
                let mut total = 0i64;
                for field in fields.iter() {
                    total = total.checked_add(self.element_num(*field)?)
                        .ok_or(MemoryError::Overflow("struct element count"))?;
                }
                total
            }
        };
        let id = TypeId(self.types.len() as u32);
        self.types.push(typ);
        self.elem_nums.push(elem_num);
        Ok(id)
    }
    pub fn get(&self, id: TypeId) -> Result<&Type> {
        self.types.get(id.0 as usize).ok_or(MemoryError::UnknownType(id))
    }
    pub fn len(&self) -> usize {
        self.types.len()
    }
    pub fn is_pointer(&self, id: TypeId) -> Result<bool> {
        Ok(matches!(self.get(id)?, Type::Pointer { .. }))
    }
    /// Number of scalar slots the type occupies once nested aggregates are
    /// flattened.
    pub fn element_num(&self, id: TypeId) -> Result<i64> {
        self.elem_nums.get(id.0 as usize).copied().ok_or(MemoryError::UnknownType(id))
    }
    /// Linear offset of member `index` within `id` after flattening.
    pub fn flattened_elem_index(&self, id: TypeId, index: i64) -> Result<i64> {
        match self.get(id)? {
            Type::Struct { fields } => {
                if index < 0 || index as usize >= fields.len() {
                    return Err(MemoryError::FieldOutOfRange { ty: id, index });
                }
                let mut offset = 0i64;
                for field in fields[..index as usize].iter() {
                    offset = offset.checked_add(self.element_num(*field)?)
                        .ok_or(MemoryError::Overflow("field offset"))?;
                }
                Ok(offset)
            }
            Type::Array { element, .. } =>
                index.checked_mul(self.element_num(*element)?)
                    .ok_or(MemoryError::Overflow("array index offset")),
            _ if index == 0 => Ok(0),
            _ => Err(MemoryError::FieldOutOfRange { ty: id, index }),
        }
    }
}

impl Debug for TypeId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "ty{}", self.0)
    }
}

#[cfg(test)]
mod test {
    use crate::types::{TypeTable, Type, TypeId};
    use crate::error::MemoryError;

    #[test]
    fn flattening() {
        let mut table = TypeTable::new();
        let int = table.add(Type::Int { bits: 32 }).unwrap();
        let ptr = table.add(Type::Pointer { pointee: Some(int) }).unwrap();
        let arr = table.add(Type::Array { element: int, len: 4 }).unwrap();
        // struct { int; int[4]; int* }
        let st = table.add(Type::Struct { fields: vec![int, arr, ptr] }).unwrap();
        let outer = table.add(Type::Array { element: st, len: 2 }).unwrap();
        assert_eq!(table.element_num(int).unwrap(), 1);
        assert_eq!(table.element_num(arr).unwrap(), 4);
        assert_eq!(table.element_num(st).unwrap(), 6);
        assert_eq!(table.element_num(outer).unwrap(), 12);
        assert_eq!(table.flattened_elem_index(st, 0).unwrap(), 0);
        assert_eq!(table.flattened_elem_index(st, 1).unwrap(), 1);
        assert_eq!(table.flattened_elem_index(st, 2).unwrap(), 5);
        assert_eq!(table.flattened_elem_index(arr, 3).unwrap(), 3);
        assert_eq!(table.flattened_elem_index(outer, 1).unwrap(), 6);
        assert!(table.is_pointer(ptr).unwrap());
        assert!(!table.is_pointer(st).unwrap());
    }

    #[test]
    fn errors() {
        let mut table = TypeTable::new();
        let int = table.add(Type::Int { bits: 8 }).unwrap();
        let st = table.add(Type::Struct { fields: vec![int] }).unwrap();
        assert_eq!(table.flattened_elem_index(st, 1),
                   Err(MemoryError::FieldOutOfRange { ty: st, index: 1 }));
        assert_eq!(table.flattened_elem_index(int, 2),
                   Err(MemoryError::FieldOutOfRange { ty: int, index: 2 }));
        assert_eq!(table.add(Type::Array { element: TypeId(9), len: 1 }),
                   Err(MemoryError::UnknownType(TypeId(9))));
        assert_eq!(table.len(), 2);
    }

    #[test]
    fn huge_aggregates() {
        let mut table = TypeTable::new();
        let int = table.add(Type::Int { bits: 8 }).unwrap();
        let mut big = int;
        for _ in 0..3 {
            big = table.add(Type::Array { element: big, len: 1 << 20 }).unwrap();
        }
        assert_eq!(table.element_num(big).unwrap(), 1 << 60);
        assert_eq!(table.add(Type::Array { element: big, len: u32::MAX }),
                   Err(MemoryError::Overflow("array element count")));
        let wide = table.add(Type::Array { element: big, len: 2 }).unwrap();
        assert_eq!(table.add(Type::Struct { fields: vec![wide, wide, wide, wide, wide, wide] }),
                   Err(MemoryError::Overflow("struct element count")));
        assert_eq!(table.flattened_elem_index(big, i64::MAX),
                   Err(MemoryError::Overflow("array index offset")));
    }
}
