use serde::Deserialize;
use smallvec::SmallVec;
use tracing::trace;
use crate::error::{MemoryError, Result};
use crate::expr::Eval;
use crate::graph::{IrGraph, VarId};
use crate::store::ExpressionStore;
use crate::types::TypeId;

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndexOperand {
    Constant(i64),
    Var(VarId),
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct GepIndex {
    pub operand: IndexOperand,
    /// Type the index steps through; `None` adds the index as is.
    #[serde(default)]
    pub ty: Option<TypeId>,
}

/// A pointer-arithmetic instruction as the offset computation sees it.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct GepStmt {
    #[serde(default)]
    pub indices: SmallVec<[GepIndex; 4]>,
    #[serde(default)]
    pub constant_field_index: i64,
    #[serde(default)]
    pub src_pointee: Option<TypeId>,
}

#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct GepQuery {
    pub pointer: VarId,
    pub gep: GepStmt,
}

impl GepStmt {
    pub fn field(constant_field_index: i64) -> Self {
        GepStmt { indices: SmallVec::new(), constant_field_index, src_pointee: None }
    }
    pub fn new(indices: impl IntoIterator<Item=GepIndex>, src_pointee: Option<TypeId>) -> Self {
        GepStmt { indices: indices.into_iter().collect(), constant_field_index: 0, src_pointee }
    }
}

impl GepIndex {
    pub fn constant(value: i64, ty: Option<TypeId>) -> Self {
        GepIndex { operand: IndexOperand::Constant(value), ty }
    }
    pub fn var(id: VarId, ty: Option<TypeId>) -> Self {
        GepIndex { operand: IndexOperand::Var(id), ty }
    }
}

fn index_value(store: &ExpressionStore, operand: &IndexOperand) -> Result<i64> {
    match operand {
        IndexOperand::Constant(value) => Ok(*value),
        IndexOperand::Var(id) => {
            let expr = store.lookup(*id)?;
            match store.evaluate(&expr) {
                Eval::Numeral(value) => Ok(value),
                Eval::Symbolic => Err(MemoryError::SymbolicOffset(*id)),
            }
        }
    }
}

/// Flattened offset selected by `gep`. Indices are folded innermost first.
pub fn compute_offset<G: IrGraph + ?Sized>(graph: &G, store: &ExpressionStore, gep: &GepStmt) -> Result<i64> {
    if gep.indices.is_empty() {
        return Ok(gep.constant_field_index);
    }
    let mut total = 0i64;
    for index in gep.indices.iter().rev() {
        let value = index_value(store, &index.operand)?;
        let step = match index.ty {
            None => value,
            Some(ty) if graph.is_pointer_type(ty)? => {
                let stride = match gep.src_pointee {
                    Some(pointee) => graph.element_num(pointee)?,
                    None => 1,
                };
                value.checked_mul(stride).ok_or(MemoryError::Overflow("gep offset"))?
            }
            Some(ty) => graph.flattened_elem_index(ty, value)?,
        };
        trace!(?index, value, step, "gep step");
        total = total.checked_add(step).ok_or(MemoryError::Overflow("gep offset"))?;
    }
    Ok(total)
}

#[cfg(test)]
mod test {
    use rand::{Rng, SeedableRng};
    use rand_xorshift::XorShiftRng;
    use crate::error::MemoryError;
    use crate::expr::Expr;
    use crate::graph::{Graph, IrGraph, VarId, VarNode};
    use crate::offset::{compute_offset, GepIndex, GepStmt};
    use crate::store::ExpressionStore;
    use crate::types::{Type, TypeId, TypeTable};

    struct Fixture {
        graph: Graph,
        store: ExpressionStore,
        int: TypeId,
        ptr: TypeId,
        pair: TypeId,
        rec: TypeId,
    }

    fn fixture() -> Fixture {
        let mut types = TypeTable::new();
        let int = types.add(Type::Int { bits: 32 }).unwrap();
        let pair = types.add(Type::Struct { fields: vec![int, int] }).unwrap();
        let arr = types.add(Type::Array { element: pair, len: 3 }).unwrap();
        // struct { int; pair[3]; int }
        let rec = types.add(Type::Struct { fields: vec![int, arr, int] }).unwrap();
        let ptr = types.add(Type::Pointer { pointee: Some(rec) }).unwrap();
        let mut graph = Graph::new(types);
        graph.add(VarId(1), VarNode::TypedValue { ty: int }).unwrap();
        graph.add(VarId(2), VarNode::TypedValue { ty: int }).unwrap();
        let mut store = ExpressionStore::new();
        store.bind(VarId(1), Expr::Num(2));
        let unknown = store.ctx_mut().int_const("ValVar2");
        store.bind(VarId(2), unknown);
        Fixture { graph, store, int, ptr, pair, rec }
    }

    #[test]
    fn empty_chain_uses_constant_field_index() {
        let f = fixture();
        for k in [-4i64, 0, 3, 17].iter() {
            assert_eq!(compute_offset(&f.graph, &f.store, &GepStmt::field(*k)).unwrap(), *k);
        }
    }

    #[test]
    fn pointer_stride() {
        let f = fixture();
        let mut random = XorShiftRng::seed_from_u64(0);
        for _ in 0..100 {
            let i = random.gen_range(-50i64, 50);
            let gep = GepStmt::new(vec![GepIndex::constant(i, Some(f.ptr))], Some(f.rec));
            assert_eq!(compute_offset(&f.graph, &f.store, &gep).unwrap(), i * 8);
        }
        let gep = GepStmt::new(vec![GepIndex::constant(3, Some(f.ptr))], None);
        assert_eq!(compute_offset(&f.graph, &f.store, &gep).unwrap(), 3);
    }

    #[test]
    fn nested_fields() {
        let f = fixture();
        // &p[1].arr[2].second, with the array index held in a variable
        let arr = match f.graph.types().get(f.rec).unwrap() {
            Type::Struct { fields } => fields[1],
            _ => unreachable!(),
        };
        let gep = GepStmt::new(vec![
            GepIndex::constant(1, Some(f.ptr)),
            GepIndex::constant(1, Some(f.rec)),
            GepIndex::var(VarId(1), Some(arr)),
            GepIndex::constant(1, Some(f.pair)),
        ], Some(f.rec));
        assert_eq!(compute_offset(&f.graph, &f.store, &gep).unwrap(), 8 + 1 + 4 + 1);
        let untyped = GepStmt::new(vec![GepIndex::constant(5, None), GepIndex::var(VarId(1), None)], None);
        assert_eq!(compute_offset(&f.graph, &f.store, &untyped).unwrap(), 7);
        let scalar = GepStmt::new(vec![GepIndex::constant(0, Some(f.int))], None);
        assert_eq!(compute_offset(&f.graph, &f.store, &scalar).unwrap(), 0);
    }

    #[test]
    fn unresolved_indices() {
        let f = fixture();
        let gep = GepStmt::new(vec![GepIndex::var(VarId(2), None)], None);
        assert_eq!(compute_offset(&f.graph, &f.store, &gep), Err(MemoryError::SymbolicOffset(VarId(2))));
        let gep = GepStmt::new(vec![GepIndex::var(VarId(3), None)], None);
        assert_eq!(compute_offset(&f.graph, &f.store, &gep), Err(MemoryError::UnboundVariable(VarId(3))));
        let gep = GepStmt::new(vec![GepIndex::constant(2, Some(f.pair))], None);
        assert_eq!(compute_offset(&f.graph, &f.store, &gep),
                   Err(MemoryError::FieldOutOfRange { ty: f.pair, index: 2 }));
    }

    #[test]
    fn extreme_indices() {
        let f = fixture();
        let gep = GepStmt::new(vec![GepIndex::constant(i64::MAX, Some(f.ptr))], Some(f.pair));
        assert_eq!(compute_offset(&f.graph, &f.store, &gep), Err(MemoryError::Overflow("gep offset")));
        let gep = GepStmt::new(vec![GepIndex::constant(i64::MAX, None), GepIndex::constant(1, None)], None);
        assert_eq!(compute_offset(&f.graph, &f.store, &gep), Err(MemoryError::Overflow("gep offset")));
        let gep = GepStmt::new(vec![GepIndex::constant(i64::MIN, None), GepIndex::constant(i64::MAX, None)], None);
        assert_eq!(compute_offset(&f.graph, &f.store, &gep).unwrap(), -1);
    }
}
