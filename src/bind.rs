//! Initial expressions for graph variables.
//!
//! Every value becomes a fresh integer constant. Objects become either the
//! numeral of their constant payload or the virtual address of the storage
//! they denote.

use tracing::{debug, trace};
use crate::address::AddressAllocator;
use crate::error::{MemoryError, Result};
use crate::expr::Expr;
use crate::graph::{Constant, VarNode, Variable};
use crate::store::ExpressionStore;

pub fn value_name(var: &Variable) -> String {
    format!("ValVar{}", var.id.0)
}

pub fn object_name(var: &Variable) -> String {
    format!("ObjVar{}", var.id.0)
}

pub fn bind_value(store: &mut ExpressionStore, var: &Variable) -> Result<Expr> {
    match var.node {
        VarNode::TypedValue { .. } | VarNode::PlaceholderValue => {}
        _ => return Err(MemoryError::NotAValue(var.id)),
    }
    let expr = store.ctx_mut().int_const(&value_name(var));
    trace!(id = ?var.id, "bound value");
    store.bind(var.id, expr.clone());
    Ok(expr)
}

pub fn bind_object(store: &mut ExpressionStore, alloc: &mut AddressAllocator, var: &Variable) -> Result<Expr> {
    let id = var.id;
    let expr = match &var.node {
        VarNode::PlaceholderObject => Expr::Num(alloc.address_of(id)? as i64),
        VarNode::ConstantScalarObject { constant } => {
            match constant {
                Constant::Int(value) => Expr::Num(*value as i32 as i64),
                Constant::Float(value) => Expr::Num(*value as u32 as i64),
                Constant::NullPtr => Expr::Num(0),
                Constant::GlobalRef => Expr::Num(alloc.address_of(id)? as i64),
                Constant::Other(kind) =>
                    return Err(MemoryError::UnrecognizedConstant { id, kind: kind.clone() }),
            }
        }
        VarNode::ConstantAggregateObject => return Err(MemoryError::AggregateConstant(id)),
        VarNode::LocationObject { .. } => Expr::Num(alloc.address_of(id)? as i64),
        VarNode::TypedValue { .. } | VarNode::PlaceholderValue =>
            return Err(MemoryError::NotAnObject(id)),
    };
    debug!(id = ?id, expr = ?expr, name = %object_name(var), "bound object");
    store.bind(id, expr.clone());
    Ok(expr)
}
