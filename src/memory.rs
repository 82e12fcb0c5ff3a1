use std::collections::HashMap;
use tracing::{debug, info};
use crate::address::AddressAllocator;
use crate::bind::{bind_object, bind_value};
use crate::config::Config;
use crate::error::{MemoryError, Result};
use crate::expr::{Eval, Expr};
use crate::graph::{IrGraph, VarId, VarKind};
use crate::offset::{compute_offset, GepStmt};
use crate::report::StateReport;
use crate::store::ExpressionStore;

/// One analysis run: the graph, the expressions bound to its variables and
/// the addresses handed out to its objects. Dropping it ends the run.
pub struct MemoryModel<G: IrGraph> {
    config: Config,
    graph: G,
    store: ExpressionStore,
    allocator: AddressAllocator,
    geps: HashMap<(VarId, i64), VarId>,
}

impl<G: IrGraph> MemoryModel<G> {
    pub fn new(graph: G, config: Config) -> Result<Self> {
        config.validate()?;
        let mut model = MemoryModel {
            allocator: AddressAllocator::new(config.address_mask),
            config,
            graph,
            store: ExpressionStore::new(),
            geps: HashMap::new(),
        };
        model.init()?;
        Ok(model)
    }

    fn init(&mut self) -> Result<()> {
        let (mut values, mut objects) = (0usize, 0usize);
        for id in self.graph.ids() {
            let var = self.graph.variable(id).ok_or(MemoryError::UnknownVariable(id))?;
            match var.node.kind() {
                VarKind::Value => {
                    bind_value(&mut self.store, var)?;
                    values += 1;
                }
                VarKind::Object => {
                    bind_object(&mut self.store, &mut self.allocator, var)?;
                    objects += 1;
                }
            }
        }
        info!(values, objects, "memory model initialized");
        Ok(())
    }

    pub fn config(&self) -> &Config {
        &self.config
    }
    pub fn graph(&self) -> &G {
        &self.graph
    }
    pub fn store(&self) -> &ExpressionStore {
        &self.store
    }
    pub fn allocator(&self) -> &AddressAllocator {
        &self.allocator
    }

    pub fn lookup(&self, id: VarId) -> Result<Expr> {
        self.store.lookup(id)
    }
    pub fn bind(&mut self, id: VarId, expr: Expr) {
        self.store.bind(id, expr)
    }
    pub fn evaluate(&self, expr: &Expr) -> Eval {
        self.store.evaluate(expr)
    }

    /// The expression bound to object `id`, i.e. its address for locations.
    pub fn address_of(&self, id: VarId) -> Result<Expr> {
        match self.graph.kind(id)? {
            VarKind::Object => self.store.lookup(id),
            VarKind::Value => Err(MemoryError::NotAnObject(id)),
        }
    }

    fn pointee(&self, pointer: &Expr) -> Result<(VarId, u32)> {
        let invalid = || MemoryError::InvalidPointer(self.store.ctx().display(pointer).to_string());
        let value = self.store.evaluate(pointer).numeral().ok_or_else(invalid)?;
        if !self.allocator.is_address(value) {
            return Err(invalid());
        }
        Ok((self.allocator.object_of(value)?, value as u32))
    }

    pub fn compute_offset(&self, gep: &GepStmt) -> Result<i64> {
        compute_offset(&self.graph, &self.store, gep)
    }

    /// The object `offset` flattened fields past the one `pointer` addresses.
    /// A zero effective offset yields the base's own expression.
    pub fn resolve_gep(&mut self, pointer: &Expr, offset: i64) -> Result<Expr> {
        let (base, _) = self.pointee(pointer)?;
        if let Some(derived) = self.geps.get(&(base, offset)) {
            debug!(?base, offset, ?derived, "derived object reused");
            return self.store.lookup(*derived);
        }
        let derived = self.graph.gep_object(base, offset)?;
        if derived == base {
            return self.store.lookup(base);
        }
        let var = self.graph.variable(derived).ok_or(MemoryError::UnknownVariable(derived))?;
        let expr = bind_object(&mut self.store, &mut self.allocator, var)?;
        debug!(?base, offset, ?derived, "derived object bound");
        self.geps.insert((base, offset), derived);
        Ok(expr)
    }

    /// Address of the object that `gep` selects from the object pointer
    /// variable `pointer` refers to.
    pub fn gep_address(&mut self, pointer: VarId, gep: &GepStmt) -> Result<Expr> {
        let offset = self.compute_offset(gep)?;
        let base = self.store.lookup(pointer)?;
        self.resolve_gep(&base, offset)
    }

    pub fn store_value(&mut self, location: &Expr, value: Expr) -> Result<()> {
        let (_, address) = self.pointee(location)?;
        self.store.write(address, value);
        Ok(())
    }

    pub fn load_value(&mut self, location: &Expr) -> Result<Expr> {
        let (_, address) = self.pointee(location)?;
        Ok(self.store.read(address))
    }

    /// Fixes the model value of a bare constant. Numerals must already agree.
    pub fn assume(&mut self, expr: &Expr, value: i64) -> Result<()> {
        match (expr, self.store.evaluate(expr)) {
            (_, Eval::Numeral(n)) if n == value => Ok(()),
            (Expr::Const(symbol), Eval::Symbolic) => {
                self.store.ctx_mut().model_mut().assign(*symbol, value);
                Ok(())
            }
            _ => Err(MemoryError::Inconsistent {
                expr: self.store.ctx().display(expr).to_string(),
                value,
            }),
        }
    }

    pub fn report(&self) -> StateReport {
        StateReport::collect(self)
    }
}
