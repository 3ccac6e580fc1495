//! Instruction model for the kiln initializer interpreter.
//!
//! This crate provides the typed, register-based SSA form that the
//! front-end hands to the interpreter:
//!
//! - **Names** ([`Name`], [`StringInterner`]): interned identifiers for
//!   packages, functions, globals and struct fields.
//!
//! - **Types** ([`Idx`], [`Pool`], [`TypeKind`]): every static type lives
//!   in a pool and is referenced by a 32-bit index. Basic types have fixed
//!   indices; structural types are hash-consed.
//!
//! - **Instructions** ([`Instr`], [`InstrKind`], [`Operand`]): a closed
//!   vocabulary. Each value-producing instruction writes one [`ValueId`]
//!   and records its static result type.
//!
//! - **Program** ([`Program`], [`Function`], [`GlobalDecl`]): the owner of
//!   all of the above, with textual rendering for diagnostics.
//!
//! # Crate Dependencies
//!
//! `rustc-hash` for interning tables, and `serde` behind the optional
//! `serde` feature. The interpreter lives in `kiln_interp`; nothing here
//! evaluates anything.

mod display;
mod instr;
mod name;
mod program;
mod types;

pub use display::{InstrDisplay, OperandDisplay, TypeDisplay};
pub use instr::{
    BinaryOp, BlockId, Callee, Const, FuncId, GlobalId, Instr, InstrKind, LitValue, Operand,
    UnaryOp, ValueId,
};
pub use name::{Name, StringInterner};
pub use program::{Block, Function, FunctionOrigin, GlobalDecl, Param, Program};
pub use types::{BasicKind, Field, Idx, Pool, TypeKind};
