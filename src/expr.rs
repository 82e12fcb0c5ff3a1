//! Integer expressions scoped to one analysis run.
//!
//! An [`Expr`] is either a numeral, a named integer constant interned in an
//! [`ExprCtx`], or a binary application over the two. Applications of two
//! numerals are folded as they are built, so a concrete computation never
//! leaves a tree behind. Named constants take a value only through the
//! context's [`Model`].

use std::fmt;
use std::fmt::{Debug, Display, Formatter};
use std::rc::Rc;
use indexmap::IndexSet;
use vec_map::VecMap;

#[derive(Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Symbol(usize);

#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum BinOp {
    Add,
    Sub,
    Mul,
}

#[derive(Clone, Eq, PartialEq, Hash)]
pub enum Expr {
    Num(i64),
    Const(Symbol),
    Apply(BinOp, Rc<(Expr, Expr)>),
}

/// Result of evaluating an expression under the current model.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Debug)]
pub enum Eval {
    Numeral(i64),
    Symbolic,
}

#[derive(Clone, Debug, Default)]
pub struct Model {
    values: VecMap<i64>,
}

pub struct ExprCtx {
    names: IndexSet<String>,
    model: Model,
}

impl BinOp {
    pub fn apply(self, x: i64, y: i64) -> i64 {
        match self {
            BinOp::Add => x.wrapping_add(y),
            BinOp::Sub => x.wrapping_sub(y),
            BinOp::Mul => x.wrapping_mul(y),
        }
    }
    fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
        }
    }
}

impl Expr {
    pub fn as_num(&self) -> Option<i64> {
        match self {
            Expr::Num(n) => Some(*n),
            _ => None,
        }
    }
    pub fn as_const(&self) -> Option<Symbol> {
        match self {
            Expr::Const(s) => Some(*s),
            _ => None,
        }
    }
}

impl Eval {
    pub fn numeral(self) -> Option<i64> {
        match self {
            Eval::Numeral(n) => Some(n),
            Eval::Symbolic => None,
        }
    }
}

impl Model {
    pub fn get(&self, symbol: Symbol) -> Option<i64> {
        self.values.get(symbol.0).copied()
    }
    pub fn assign(&mut self, symbol: Symbol, value: i64) {
        self.values.insert(symbol.0, value);
    }
    pub fn len(&self) -> usize {
        self.values.len()
    }
}

impl ExprCtx {
    pub fn new() -> Self {
        ExprCtx { names: IndexSet::new(), model: Model::default() }
    }
    pub fn int_val(&self, value: i64) -> Expr {
        Expr::Num(value)
    }
    /// The same name always yields the same constant.
    pub fn int_const(&mut self, name: &str) -> Expr {
        let (index, _) = self.names.insert_full(name.to_string());
        Expr::Const(Symbol(index))
    }
    pub fn name(&self, symbol: Symbol) -> &str {
        &self.names[symbol.0]
    }
    pub fn binary(&self, op: BinOp, x: Expr, y: Expr) -> Expr {
        match (&x, &y) {
            (Expr::Num(a), Expr::Num(b)) => Expr::Num(op.apply(*a, *b)),
            _ => Expr::Apply(op, Rc::new((x, y))),
        }
    }
    pub fn add(&self, x: Expr, y: Expr) -> Expr { self.binary(BinOp::Add, x, y) }
    pub fn sub(&self, x: Expr, y: Expr) -> Expr { self.binary(BinOp::Sub, x, y) }
    pub fn mul(&self, x: Expr, y: Expr) -> Expr { self.binary(BinOp::Mul, x, y) }
    pub fn model(&self) -> &Model {
        &self.model
    }
    pub fn model_mut(&mut self) -> &mut Model {
        &mut self.model
    }
    pub fn evaluate(&self, expr: &Expr) -> Eval {
        match expr {
            Expr::Num(n) => Eval::Numeral(*n),
            Expr::Const(s) => match self.model.get(*s) {
                Some(n) => Eval::Numeral(n),
                None => Eval::Symbolic,
            },
            Expr::Apply(op, args) => {
                match (self.evaluate(&args.0), self.evaluate(&args.1)) {
                    (Eval::Numeral(x), Eval::Numeral(y)) => Eval::Numeral(op.apply(x, y)),
                    _ => Eval::Symbolic,
                }
            }
        }
    }
    pub fn display<'a>(&'a self, expr: &'a Expr) -> impl Display + 'a {
        DisplayExpr { ctx: self, expr }
    }
}

struct DisplayExpr<'a> {
    ctx: &'a ExprCtx,
    expr: &'a Expr,
}

impl<'a> Display for DisplayExpr<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self.expr {
            Expr::Num(n) => write!(f, "{}", n),
            Expr::Const(s) => write!(f, "{}", self.ctx.name(*s)),
            Expr::Apply(op, args) =>
                write!(f, "({} {} {})",
                       self.ctx.display(&args.0), op.symbol(), self.ctx.display(&args.1)),
        }
    }
}

impl Debug for Symbol {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "sym{}", self.0)
    }
}

impl Debug for Expr {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Num(n) => write!(f, "{}", n),
            Expr::Const(s) => write!(f, "{:?}", s),
            Expr::Apply(op, args) => write!(f, "({:?} {} {:?})", args.0, op.symbol(), args.1),
        }
    }
}

#[cfg(test)]
mod test {
    use crate::expr::{ExprCtx, Eval, Expr};

    #[test]
    fn numerals_fold() {
        let ctx = ExprCtx::new();
        let e = ctx.add(ctx.int_val(40), ctx.mul(ctx.int_val(1), ctx.int_val(2)));
        assert_eq!(e, Expr::Num(42));
        assert_eq!(ctx.evaluate(&e), Eval::Numeral(42));
    }

    #[test]
    fn constants_are_interned_by_name() {
        let mut ctx = ExprCtx::new();
        let a = ctx.int_const("ValVar1");
        let b = ctx.int_const("ValVar2");
        assert_ne!(a, b);
        assert_eq!(a, ctx.int_const("ValVar1"));
        assert_eq!(ctx.name(a.as_const().unwrap()), "ValVar1");
    }

    #[test]
    fn model_resolves_constants() {
        let mut ctx = ExprCtx::new();
        let x = ctx.int_const("x");
        let e = ctx.sub(x.clone(), ctx.int_val(2));
        assert_eq!(ctx.evaluate(&e), Eval::Symbolic);
        assert_eq!(ctx.display(&e).to_string(), "(x - 2)");
        ctx.model_mut().assign(x.as_const().unwrap(), 7);
        assert_eq!(ctx.evaluate(&e), Eval::Numeral(5));
        assert_eq!(ctx.evaluate(&e).numeral(), Some(5));
    }
}
