//! Interpretation faults.
//!
//! A [`Fault`] means the instruction stream broke an assumption the
//! interpreter relies on. It aborts the compilation. Stopping at an
//! instruction the interpreter does not understand is not a fault; see
//! [`Halt`](crate::Halt) and the driver.

use thiserror::Error;

/// What went wrong, independent of where.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum FaultKind {
    #[error("unsupported type `{0}`")]
    UnsupportedType(String),

    #[error("unsupported binary operation")]
    UnsupportedBinOp,

    #[error("expected a string constant, found {0}")]
    NonConstantString(&'static str),

    #[error("unsupported unary operation")]
    UnsupportedUnOp,

    #[error("unsupported conversion from `{from}` to `{to}`")]
    UnsupportedConversion { from: String, to: String },

    #[error("unsupported call to `{0}`")]
    UnsupportedCall(String),

    #[error("call to `{callee}` passes {found} arguments, expected {expected}")]
    ArityMismatch {
        callee: String,
        expected: usize,
        found: usize,
    },

    #[error("could not interpret all instructions of `{0}`")]
    CalleeNotConsumed(String),

    #[error("`{0}` finished without returning a value")]
    MissingResult(String),

    #[error("inlining exceeded the maximum depth of {0}")]
    InlineDepthExceeded(usize),

    #[error("unknown value `{0}`")]
    UnknownValue(String),

    #[error("expected a pointer, found {0}")]
    NotAPointer(&'static str),

    #[error("nil pointer dereference")]
    NilDereference,

    #[error("expected a struct, found {0}")]
    NotAStruct(&'static str),

    #[error("expected an array, found {0}")]
    NotAnArray(&'static str),

    #[error("expected a map, found {0}")]
    NotAMap(&'static str),

    #[error("field {field} out of range for struct with {count} fields")]
    FieldOutOfRange { field: u32, count: usize },

    #[error("index {index} out of range for array of length {len}")]
    IndexOutOfRange { index: u64, len: usize },

    #[error("negative index {0}")]
    NegativeIndex(i64),

    #[error("slice expression with bounds")]
    SliceWithBounds,

    #[error("cannot slice {0}")]
    UnsupportedSliceSource(&'static str),

    #[error("return of {found} results into {expected} result slots")]
    ResultCountMismatch { expected: usize, found: usize },
}

/// A fault tied to the rendering of the offending instruction.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("init: {kind}: {instr}")]
pub struct Fault {
    pub kind: FaultKind,
    /// Textual form of the instruction that faulted.
    pub instr: String,
}

impl Fault {
    pub fn new(kind: FaultKind, instr: impl Into<String>) -> Self {
        Self {
            kind,
            instr: instr.into(),
        }
    }
}
