use std::collections::{BTreeMap, HashMap};
use crate::error::{MemoryError, Result};
use crate::expr::{Eval, Expr, ExprCtx};
use crate::graph::VarId;

/// The expression bound to each variable, plus the contents written through
/// virtual addresses. Owns the expression context, so every expression it
/// hands out belongs to the same run.
pub struct ExpressionStore {
    ctx: ExprCtx,
    exprs: BTreeMap<VarId, Expr>,
    contents: HashMap<u32, Expr>,
}

impl ExpressionStore {
    pub fn new() -> Self {
        ExpressionStore {
            ctx: ExprCtx::new(),
            exprs: BTreeMap::new(),
            contents: HashMap::new(),
        }
    }
    pub fn ctx(&self) -> &ExprCtx {
        &self.ctx
    }
    pub fn ctx_mut(&mut self) -> &mut ExprCtx {
        &mut self.ctx
    }
    pub fn bind(&mut self, id: VarId, expr: Expr) {
        self.exprs.insert(id, expr);
    }
    pub fn lookup(&self, id: VarId) -> Result<Expr> {
        self.exprs.get(&id).cloned().ok_or(MemoryError::UnboundVariable(id))
    }
    pub fn contains(&self, id: VarId) -> bool {
        self.exprs.contains_key(&id)
    }
    pub fn evaluate(&self, expr: &Expr) -> Eval {
        self.ctx.evaluate(expr)
    }
    /// Bound ids in ascending order.
    pub fn ids(&self) -> impl Iterator<Item=VarId> + '_ {
        self.exprs.keys().copied()
    }
    pub fn len(&self) -> usize {
        self.exprs.len()
    }
    pub fn write(&mut self, address: u32, value: Expr) {
        self.contents.insert(address, value);
    }
    pub fn written(&self, address: u32) -> Option<&Expr> {
        self.contents.get(&address)
    }
    /// Contents at `address`; a location never written holds an
    /// unconstrained constant of its own.
    pub fn read(&mut self, address: u32) -> Expr {
        match self.contents.get(&address) {
            Some(value) => value.clone(),
            None => self.ctx.int_const(&format!("Mem{:#x}", address)),
        }
    }
}

#[cfg(test)]
mod test {
    use crate::store::ExpressionStore;
    use crate::graph::VarId;
    use crate::error::MemoryError;
    use crate::expr::{Eval, Expr};

    #[test]
    fn last_writer_wins() {
        let mut store = ExpressionStore::new();
        assert_eq!(store.lookup(VarId(3)), Err(MemoryError::UnboundVariable(VarId(3))));
        store.bind(VarId(3), Expr::Num(1));
        store.bind(VarId(3), Expr::Num(2));
        assert_eq!(store.lookup(VarId(3)).unwrap(), Expr::Num(2));
        assert_eq!(store.len(), 1);
        assert!(store.contains(VarId(3)));
    }

    #[test]
    fn ids_ascend() {
        let mut store = ExpressionStore::new();
        for id in [9, 2, 5].iter() {
            store.bind(VarId(*id), Expr::Num(0));
        }
        assert_eq!(store.ids().collect::<Vec<_>>(), vec![VarId(2), VarId(5), VarId(9)]);
    }

    #[test]
    fn sparse_ids() {
        let mut store = ExpressionStore::new();
        let top = VarId(u32::MAX - 1);
        store.bind(top, Expr::Num(7));
        store.bind(VarId(1), Expr::Num(8));
        assert_eq!(store.lookup(top).unwrap(), Expr::Num(7));
        assert!(!store.contains(VarId(u32::MAX)));
        assert_eq!(store.ids().collect::<Vec<_>>(), vec![VarId(1), top]);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn unwritten_contents_are_symbolic() {
        let mut store = ExpressionStore::new();
        let first = store.read(0x7f00_0001);
        assert_eq!(store.evaluate(&first), Eval::Symbolic);
        assert_eq!(store.read(0x7f00_0001), first);
        store.write(0x7f00_0001, Expr::Num(3));
        assert_eq!(store.read(0x7f00_0001), Expr::Num(3));
        assert_eq!(store.written(0x7f00_0001), Some(&Expr::Num(3)));
        assert_eq!(store.written(0x7f00_0002), None);
    }
}
