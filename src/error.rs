use thiserror::Error;
use crate::graph::VarId;
use crate::types::TypeId;

/// Every failure of the memory model is an invariant violation: the graph is
/// assumed to be validated upstream, so none of these are recovered locally.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum MemoryError {
    #[error("value variable {0:?} has no type and is not a placeholder")]
    UntypedValue(VarId),
    #[error("object variable {0:?} has no payload and is not a placeholder object")]
    MissingPayload(VarId),
    #[error("constant aggregate payload of object {0:?} is not implemented")]
    AggregateConstant(VarId),
    #[error("object {id:?} carries an unrecognized constant payload: {kind}")]
    UnrecognizedConstant { id: VarId, kind: String },
    #[error("variable {0:?} has no bound expression")]
    UnboundVariable(VarId),
    #[error("variable {0:?} is not part of the graph")]
    UnknownVariable(VarId),
    #[error("variable {0:?} is not an object")]
    NotAnObject(VarId),
    #[error("variable {0:?} is not a value")]
    NotAValue(VarId),
    #[error("{0:#x} is not an allocated virtual address")]
    UnmappedAddress(i64),
    #[error("pointer expression {0} does not evaluate to a virtual address")]
    InvalidPointer(String),
    #[error("index operand {0:?} does not resolve to a numeral")]
    SymbolicOffset(VarId),
    #[error("object {0:?} does not fit in the virtual address range")]
    AddressSpaceExhausted(VarId),
    #[error("type {0:?} is not part of the type table")]
    UnknownType(TypeId),
    #[error("field {index} is out of range for type {ty:?}")]
    FieldOutOfRange { ty: TypeId, index: i64 },
    #[error("variable {0:?} is declared twice")]
    DuplicateVariable(VarId),
    #[error("expression {expr} cannot take value {value}")]
    Inconsistent { expr: String, value: i64 },
    #[error("{0} overflows")]
    Overflow(&'static str),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, MemoryError>;
