#![deny(unused_must_use, unconditional_recursion)]

pub mod error;
pub mod config;
pub mod expr;
pub mod types;
pub mod graph;
pub mod address;
pub mod store;
pub mod bind;
pub mod offset;
pub mod memory;
pub mod report;

pub use crate::config::Config;
pub use crate::error::{MemoryError, Result};
pub use crate::expr::{Eval, Expr};
pub use crate::graph::{Graph, IrGraph, VarId};
pub use crate::memory::MemoryModel;
