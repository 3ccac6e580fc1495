//! SSA instructions.
//!
//! The instruction stream is register-based: every value-producing
//! instruction writes exactly one [`ValueId`] (`dst`) and carries the
//! static type of that value (`ty`). Operands refer to registers,
//! constants, globals or functions through [`Operand`].
//!
//! The vocabulary is closed. [`Instr::kind`] maps every instruction to a
//! fieldless [`InstrKind`] so consumers can dispatch exhaustively; adding
//! a variant here forces every `match` on `InstrKind` to be revisited.

use crate::{Idx, Name};

// ── ID newtypes ─────────────────────────────────────────────────────

macro_rules! define_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
        #[repr(transparent)]
        pub struct $name(u32);

        impl $name {
            /// Create an ID from a raw index.
            #[inline]
            pub const fn new(raw: u32) -> Self {
                Self(raw)
            }

            /// Get the raw `u32` value.
            #[inline]
            pub const fn raw(self) -> u32 {
                self.0
            }

            /// Get the index as `usize` (for indexing into `Vec`s).
            #[inline]
            pub const fn index(self) -> usize {
                self.0 as usize
            }
        }
    };
}

define_id!(
    /// SSA register: the result of an instruction or a function parameter.
    ValueId
);
define_id!(
    /// Basic block within a function.
    BlockId
);
define_id!(
    /// Function within a [`Program`](crate::Program).
    FuncId
);
define_id!(
    /// Program-level global variable within a [`Program`](crate::Program).
    GlobalId
);

// ── Constants ───────────────────────────────────────────────────────

/// Literal payload of a constant.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LitValue {
    Bool(bool),
    Int(i64),
    Uint(u64),
    /// IEEE-754 bit pattern, so constants stay `Eq + Hash`.
    Float(u64),
    Str(Box<str>),
    Nil,
}

impl LitValue {
    /// Interpret the literal as a non-negative index.
    pub fn as_index(&self) -> Option<u64> {
        match self {
            LitValue::Int(v) => u64::try_from(*v).ok(),
            LitValue::Uint(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            LitValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

/// A typed compile-time constant.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Const {
    pub ty: Idx,
    pub lit: LitValue,
}

impl Const {
    pub fn new(ty: Idx, lit: LitValue) -> Self {
        Self { ty, lit }
    }

    /// An `int` constant.
    pub fn int(value: i64) -> Self {
        Self::new(Idx::INT, LitValue::Int(value))
    }

    /// A `string` constant.
    pub fn string(value: &str) -> Self {
        Self::new(Idx::STRING, LitValue::Str(value.into()))
    }

    pub fn bool(value: bool) -> Self {
        Self::new(Idx::BOOL, LitValue::Bool(value))
    }

    /// The `nil` constant of a pointer, slice, map, function or interface type.
    pub fn nil(ty: Idx) -> Self {
        Self::new(ty, LitValue::Nil)
    }
}

// ── Operands ────────────────────────────────────────────────────────

/// An instruction operand.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Operand {
    /// A register defined earlier in the block, or a parameter.
    Var(ValueId),
    /// An inline constant.
    Const(Const),
    /// The address of a program-level global.
    Global(GlobalId),
    /// A reference to a function.
    Func(FuncId),
}

impl Operand {
    /// Shorthand for `Operand::Var(ValueId::new(n))`.
    pub fn var(n: u32) -> Self {
        Operand::Var(ValueId::new(n))
    }
}

impl From<Const> for Operand {
    fn from(c: Const) -> Self {
        Operand::Const(c)
    }
}

// ── Operators ───────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Rem,
    And,
    Or,
    Xor,
    Shl,
    Shr,
    AndNot,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryOp {
    pub const fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Rem => "%",
            BinaryOp::And => "&",
            BinaryOp::Or => "|",
            BinaryOp::Xor => "^",
            BinaryOp::Shl => "<<",
            BinaryOp::Shr => ">>",
            BinaryOp::AndNot => "&^",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum UnaryOp {
    /// Pointer load `*x`.
    Deref,
    Neg,
    Not,
    /// Bitwise complement `^x`.
    Complement,
    /// Channel receive `<-x`.
    Recv,
}

impl UnaryOp {
    pub const fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Deref => "*",
            UnaryOp::Neg => "-",
            UnaryOp::Not => "!",
            UnaryOp::Complement => "^",
            UnaryOp::Recv => "<-",
        }
    }
}

// ── Calls ───────────────────────────────────────────────────────────

/// The target of a call.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Callee {
    /// A statically known function.
    Static(FuncId),
    /// A call through a function value (closure or function pointer).
    Dynamic(Operand),
    /// An interface method call.
    Invoke { recv: Operand, method: Name },
}

impl Callee {
    /// The statically known target, if any.
    pub fn static_target(&self) -> Option<FuncId> {
        match self {
            Callee::Static(func) => Some(*func),
            Callee::Dynamic(_) | Callee::Invoke { .. } => None,
        }
    }
}

// ── Instructions ────────────────────────────────────────────────────

/// A single instruction.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Instr {
    /// Allocate a zeroed object; `ty` is the pointer type.
    Alloc { dst: ValueId, ty: Idx },

    BinOp {
        dst: ValueId,
        ty: Idx,
        op: BinaryOp,
        x: Operand,
        y: Operand,
    },

    /// `ty` is the result type (a tuple for multi-value results).
    Call {
        dst: ValueId,
        ty: Idx,
        callee: Callee,
        args: Vec<Operand>,
    },

    /// Type conversion; `from` is the static type of `x`.
    Convert {
        dst: ValueId,
        ty: Idx,
        x: Operand,
        from: Idx,
    },

    /// Debug-info marker. No effect on evaluation.
    DebugRef { x: Operand },

    /// Address of field `field` of the struct `x` points to.
    FieldAddr {
        dst: ValueId,
        ty: Idx,
        x: Operand,
        field: u32,
    },

    /// Address of element `index` of the array `x` points to.
    IndexAddr {
        dst: ValueId,
        ty: Idx,
        x: Operand,
        index: Operand,
    },

    /// Box `x` (of static type `from`) into the interface type `ty`.
    MakeInterface {
        dst: ValueId,
        ty: Idx,
        x: Operand,
        from: Idx,
    },

    MakeMap {
        dst: ValueId,
        ty: Idx,
        reserve: Option<Operand>,
    },

    /// `map[key] = value`
    MapUpdate {
        map: Operand,
        key: Operand,
        value: Operand,
    },

    Return { results: Vec<Operand> },

    /// `x[low:high:max]`
    Slice {
        dst: ValueId,
        ty: Idx,
        x: Operand,
        low: Option<Operand>,
        high: Option<Operand>,
        max: Option<Operand>,
    },

    /// `*addr = value`
    Store { addr: Operand, value: Operand },

    UnOp {
        dst: ValueId,
        ty: Idx,
        op: UnaryOp,
        x: Operand,
        comma_ok: bool,
    },

    // ── Outside the interpretable subset ────────────────────────
    If {
        cond: Operand,
        then_block: BlockId,
        else_block: BlockId,
    },

    Jump { target: BlockId },

    Phi {
        dst: ValueId,
        ty: Idx,
        edges: Vec<Operand>,
    },

    Panic { x: Operand },

    Go { callee: Callee, args: Vec<Operand> },

    MakeClosure {
        dst: ValueId,
        ty: Idx,
        func: FuncId,
        bindings: Vec<Operand>,
    },

    MakeSlice {
        dst: ValueId,
        ty: Idx,
        len: Operand,
        cap: Operand,
    },

    /// Extract element `index` of a tuple-valued register.
    Extract {
        dst: ValueId,
        ty: Idx,
        tuple: Operand,
        index: u32,
    },

    /// Map or string lookup `x[index]`.
    Lookup {
        dst: ValueId,
        ty: Idx,
        x: Operand,
        index: Operand,
        comma_ok: bool,
    },

    TypeAssert {
        dst: ValueId,
        ty: Idx,
        x: Operand,
        asserted: Idx,
        comma_ok: bool,
    },

    ChangeType { dst: ValueId, ty: Idx, x: Operand },

    /// Field of a struct value (not an address).
    Field {
        dst: ValueId,
        ty: Idx,
        x: Operand,
        field: u32,
    },

    /// Element of an array value (not an address).
    Index {
        dst: ValueId,
        ty: Idx,
        x: Operand,
        index: Operand,
    },
}

/// Fieldless mirror of [`Instr`] for exhaustive dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InstrKind {
    Alloc,
    BinOp,
    Call,
    Convert,
    DebugRef,
    FieldAddr,
    IndexAddr,
    MakeInterface,
    MakeMap,
    MapUpdate,
    Return,
    Slice,
    Store,
    UnOp,
    If,
    Jump,
    Phi,
    Panic,
    Go,
    MakeClosure,
    MakeSlice,
    Extract,
    Lookup,
    TypeAssert,
    ChangeType,
    Field,
    Index,
}

impl InstrKind {
    /// Lower-case mnemonic used when rendering instructions.
    pub const fn mnemonic(self) -> &'static str {
        match self {
            InstrKind::Alloc => "alloc",
            InstrKind::BinOp => "binop",
            InstrKind::Call => "call",
            InstrKind::Convert => "convert",
            InstrKind::DebugRef => "debug_ref",
            InstrKind::FieldAddr => "field_addr",
            InstrKind::IndexAddr => "index_addr",
            InstrKind::MakeInterface => "make_interface",
            InstrKind::MakeMap => "make_map",
            InstrKind::MapUpdate => "map_update",
            InstrKind::Return => "return",
            InstrKind::Slice => "slice",
            InstrKind::Store => "store",
            InstrKind::UnOp => "unop",
            InstrKind::If => "if",
            InstrKind::Jump => "jump",
            InstrKind::Phi => "phi",
            InstrKind::Panic => "panic",
            InstrKind::Go => "go",
            InstrKind::MakeClosure => "make_closure",
            InstrKind::MakeSlice => "make_slice",
            InstrKind::Extract => "extract",
            InstrKind::Lookup => "lookup",
            InstrKind::TypeAssert => "type_assert",
            InstrKind::ChangeType => "change_type",
            InstrKind::Field => "field",
            InstrKind::Index => "index",
        }
    }
}

impl Instr {
    pub fn kind(&self) -> InstrKind {
        match self {
            Instr::Alloc { .. } => InstrKind::Alloc,
            Instr::BinOp { .. } => InstrKind::BinOp,
            Instr::Call { .. } => InstrKind::Call,
            Instr::Convert { .. } => InstrKind::Convert,
            Instr::DebugRef { .. } => InstrKind::DebugRef,
            Instr::FieldAddr { .. } => InstrKind::FieldAddr,
            Instr::IndexAddr { .. } => InstrKind::IndexAddr,
            Instr::MakeInterface { .. } => InstrKind::MakeInterface,
            Instr::MakeMap { .. } => InstrKind::MakeMap,
            Instr::MapUpdate { .. } => InstrKind::MapUpdate,
            Instr::Return { .. } => InstrKind::Return,
            Instr::Slice { .. } => InstrKind::Slice,
            Instr::Store { .. } => InstrKind::Store,
            Instr::UnOp { .. } => InstrKind::UnOp,
            Instr::If { .. } => InstrKind::If,
            Instr::Jump { .. } => InstrKind::Jump,
            Instr::Phi { .. } => InstrKind::Phi,
            Instr::Panic { .. } => InstrKind::Panic,
            Instr::Go { .. } => InstrKind::Go,
            Instr::MakeClosure { .. } => InstrKind::MakeClosure,
            Instr::MakeSlice { .. } => InstrKind::MakeSlice,
            Instr::Extract { .. } => InstrKind::Extract,
            Instr::Lookup { .. } => InstrKind::Lookup,
            Instr::TypeAssert { .. } => InstrKind::TypeAssert,
            Instr::ChangeType { .. } => InstrKind::ChangeType,
            Instr::Field { .. } => InstrKind::Field,
            Instr::Index { .. } => InstrKind::Index,
        }
    }

    /// Returns the register written by this instruction, if any.
    pub fn defined_var(&self) -> Option<ValueId> {
        match self {
            Instr::Alloc { dst, .. }
            | Instr::BinOp { dst, .. }
            | Instr::Call { dst, .. }
            | Instr::Convert { dst, .. }
            | Instr::FieldAddr { dst, .. }
            | Instr::IndexAddr { dst, .. }
            | Instr::MakeInterface { dst, .. }
            | Instr::MakeMap { dst, .. }
            | Instr::Slice { dst, .. }
            | Instr::UnOp { dst, .. }
            | Instr::Phi { dst, .. }
            | Instr::MakeClosure { dst, .. }
            | Instr::MakeSlice { dst, .. }
            | Instr::Extract { dst, .. }
            | Instr::Lookup { dst, .. }
            | Instr::TypeAssert { dst, .. }
            | Instr::ChangeType { dst, .. }
            | Instr::Field { dst, .. }
            | Instr::Index { dst, .. } => Some(*dst),

            Instr::DebugRef { .. }
            | Instr::MapUpdate { .. }
            | Instr::Return { .. }
            | Instr::Store { .. }
            | Instr::If { .. }
            | Instr::Jump { .. }
            | Instr::Panic { .. }
            | Instr::Go { .. } => None,
        }
    }

    /// Returns the static result type, for value-producing instructions.
    pub fn result_type(&self) -> Option<Idx> {
        match self {
            Instr::Alloc { ty, .. }
            | Instr::BinOp { ty, .. }
            | Instr::Call { ty, .. }
            | Instr::Convert { ty, .. }
            | Instr::FieldAddr { ty, .. }
            | Instr::IndexAddr { ty, .. }
            | Instr::MakeInterface { ty, .. }
            | Instr::MakeMap { ty, .. }
            | Instr::Slice { ty, .. }
            | Instr::UnOp { ty, .. }
            | Instr::Phi { ty, .. }
            | Instr::MakeClosure { ty, .. }
            | Instr::MakeSlice { ty, .. }
            | Instr::Extract { ty, .. }
            | Instr::Lookup { ty, .. }
            | Instr::TypeAssert { ty, .. }
            | Instr::ChangeType { ty, .. }
            | Instr::Field { ty, .. }
            | Instr::Index { ty, .. } => Some(*ty),

            Instr::DebugRef { .. }
            | Instr::MapUpdate { .. }
            | Instr::Return { .. }
            | Instr::Store { .. }
            | Instr::If { .. }
            | Instr::Jump { .. }
            | Instr::Panic { .. }
            | Instr::Go { .. } => None,
        }
    }
}
