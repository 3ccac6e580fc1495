//! Type pool.
//!
//! Every static type is stored once in a [`Pool`] and referenced by a
//! 32-bit [`Idx`]. Basic types are pre-interned at fixed indices so they
//! can be named as constants (`Idx::INT`, `Idx::STRING`, ...) without a
//! pool at hand. Structural types are hash-consed: building the same
//! shape twice yields the same index. Named types are never deduplicated;
//! each declaration is its own type, which is what lets a named struct
//! refer to itself through a pointer.

use std::fmt;

use rustc_hash::FxHashMap;

use crate::Name;

/// A 32-bit index into the type pool.
#[derive(Copy, Clone, Eq, PartialEq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(transparent)]
pub struct Idx(u32);

impl Idx {
    // === Basic types (indices 0-16) ===
    // Order must match `BasicKind::ALL`.

    pub const BOOL: Self = Self(0);
    pub const INT: Self = Self(1);
    pub const INT8: Self = Self(2);
    pub const INT16: Self = Self(3);
    pub const INT32: Self = Self(4);
    pub const INT64: Self = Self(5);
    pub const UINT: Self = Self(6);
    pub const UINT8: Self = Self(7);
    pub const UINT16: Self = Self(8);
    pub const UINT32: Self = Self(9);
    pub const UINT64: Self = Self(10);
    /// Address-sized unsigned integer.
    pub const UINTPTR: Self = Self(11);
    pub const FLOAT32: Self = Self(12);
    pub const FLOAT64: Self = Self(13);
    pub const STRING: Self = Self(14);
    /// Raw, untyped pointer (the target of pointer bit-casts).
    pub const UNSAFE_POINTER: Self = Self(15);
    /// Type of the untyped `nil` constant.
    pub const UNTYPED_NIL: Self = Self(16);

    /// Number of pre-interned basic types.
    pub const PRIMITIVE_COUNT: u32 = 17;

    /// Sentinel value indicating no type (e.g. a named type not yet defined).
    pub const NONE: Self = Self(u32::MAX);

    /// Create an index from a raw u32 value.
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self(raw)
    }

    /// Get the raw u32 value.
    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Get the index as `usize` (for indexing into `Vec`s).
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Check if this is a pre-interned basic type.
    #[inline]
    pub const fn is_primitive(self) -> bool {
        self.0 < Self::PRIMITIVE_COUNT
    }

    /// Check if this is the NONE sentinel.
    #[inline]
    pub const fn is_none(self) -> bool {
        self.0 == u32::MAX
    }
}

impl fmt::Debug for Idx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return write!(f, "Idx::NONE");
        }
        match BasicKind::from_idx(*self) {
            Some(kind) => write!(f, "Idx::{}", kind.name().to_uppercase()),
            None => write!(f, "Idx({})", self.0),
        }
    }
}

impl fmt::Display for Idx {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return write!(f, "<none>");
        }
        match BasicKind::from_idx(*self) {
            Some(kind) => f.write_str(kind.name()),
            None => write!(f, "type#{}", self.0),
        }
    }
}

const _: () = assert!(std::mem::size_of::<Idx>() == 4);

/// Kinds of basic (scalar) types.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum BasicKind {
    Bool,
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
    Uintptr,
    Float32,
    Float64,
    String,
    UnsafePointer,
    UntypedNil,
}

impl BasicKind {
    /// All basic kinds, in pre-interning order.
    pub const ALL: [BasicKind; 17] = [
        BasicKind::Bool,
        BasicKind::Int,
        BasicKind::Int8,
        BasicKind::Int16,
        BasicKind::Int32,
        BasicKind::Int64,
        BasicKind::Uint,
        BasicKind::Uint8,
        BasicKind::Uint16,
        BasicKind::Uint32,
        BasicKind::Uint64,
        BasicKind::Uintptr,
        BasicKind::Float32,
        BasicKind::Float64,
        BasicKind::String,
        BasicKind::UnsafePointer,
        BasicKind::UntypedNil,
    ];

    /// Source-level spelling of the type.
    pub const fn name(self) -> &'static str {
        match self {
            BasicKind::Bool => "bool",
            BasicKind::Int => "int",
            BasicKind::Int8 => "int8",
            BasicKind::Int16 => "int16",
            BasicKind::Int32 => "int32",
            BasicKind::Int64 => "int64",
            BasicKind::Uint => "uint",
            BasicKind::Uint8 => "uint8",
            BasicKind::Uint16 => "uint16",
            BasicKind::Uint32 => "uint32",
            BasicKind::Uint64 => "uint64",
            BasicKind::Uintptr => "uintptr",
            BasicKind::Float32 => "float32",
            BasicKind::Float64 => "float64",
            BasicKind::String => "string",
            BasicKind::UnsafePointer => "unsafe.Pointer",
            BasicKind::UntypedNil => "untyped nil",
        }
    }

    /// The pre-interned index of this kind.
    pub const fn idx(self) -> Idx {
        Idx(self as u32)
    }

    /// Inverse of [`idx`](Self::idx) for primitive indices.
    pub fn from_idx(idx: Idx) -> Option<BasicKind> {
        Self::ALL.get(idx.index()).copied()
    }

    pub fn is_integer(self) -> bool {
        matches!(
            self,
            BasicKind::Int
                | BasicKind::Int8
                | BasicKind::Int16
                | BasicKind::Int32
                | BasicKind::Int64
                | BasicKind::Uint
                | BasicKind::Uint8
                | BasicKind::Uint16
                | BasicKind::Uint32
                | BasicKind::Uint64
                | BasicKind::Uintptr
        )
    }
}

/// A struct field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Field {
    pub name: Name,
    pub ty: Idx,
}

/// The shape of a type in the pool.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TypeKind {
    Basic(BasicKind),
    /// `*elem`
    Pointer(Idx),
    /// `[len]elem`
    Array { elem: Idx, len: u64 },
    /// `[]elem`
    Slice(Idx),
    /// `map[key]value`
    Map { key: Idx, value: Idx },
    /// Fields in declaration order.
    Struct(Vec<Field>),
    /// Method names of the interface (empty for `interface{}`).
    Interface(Vec<Name>),
    /// Function signature.
    Signature { params: Vec<Idx>, results: Vec<Idx> },
    /// A declared type. `underlying` is [`Idx::NONE`] until defined.
    Named { name: Name, underlying: Idx },
    /// Multi-value result of a call. Not a storable type.
    Tuple(Vec<Idx>),
    /// `chan elem`
    Chan(Idx),
}

/// Interning table for types.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Pool {
    kinds: Vec<TypeKind>,
    interned: FxHashMap<TypeKind, Idx>,
}

impl Pool {
    /// Create a pool with every basic type pre-interned.
    pub fn new() -> Self {
        let mut pool = Self {
            kinds: Vec::with_capacity(64),
            interned: FxHashMap::default(),
        };
        for kind in BasicKind::ALL {
            let idx = pool.intern(TypeKind::Basic(kind));
            debug_assert_eq!(idx, kind.idx());
        }
        pool
    }

    fn push(&mut self, kind: TypeKind) -> Idx {
        let raw = u32::try_from(self.kinds.len())
            .unwrap_or_else(|_| panic!("type count exceeds u32::MAX"));
        self.kinds.push(kind);
        Idx(raw)
    }

    fn intern(&mut self, kind: TypeKind) -> Idx {
        if let Some(&idx) = self.interned.get(&kind) {
            return idx;
        }
        let idx = self.push(kind.clone());
        self.interned.insert(kind, idx);
        idx
    }

    // === Constructors ===

    pub fn pointer(&mut self, elem: Idx) -> Idx {
        self.intern(TypeKind::Pointer(elem))
    }

    pub fn array(&mut self, elem: Idx, len: u64) -> Idx {
        self.intern(TypeKind::Array { elem, len })
    }

    pub fn slice(&mut self, elem: Idx) -> Idx {
        self.intern(TypeKind::Slice(elem))
    }

    pub fn map(&mut self, key: Idx, value: Idx) -> Idx {
        self.intern(TypeKind::Map { key, value })
    }

    pub fn structure(&mut self, fields: Vec<Field>) -> Idx {
        self.intern(TypeKind::Struct(fields))
    }

    pub fn interface(&mut self, methods: Vec<Name>) -> Idx {
        self.intern(TypeKind::Interface(methods))
    }

    pub fn signature(&mut self, params: Vec<Idx>, results: Vec<Idx>) -> Idx {
        self.intern(TypeKind::Signature { params, results })
    }

    pub fn tuple(&mut self, elems: Vec<Idx>) -> Idx {
        self.intern(TypeKind::Tuple(elems))
    }

    pub fn chan(&mut self, elem: Idx) -> Idx {
        self.intern(TypeKind::Chan(elem))
    }

    /// Declare a named type whose underlying type is filled in later by
    /// [`define_named`](Self::define_named).
    pub fn declare_named(&mut self, name: Name) -> Idx {
        self.push(TypeKind::Named {
            name,
            underlying: Idx::NONE,
        })
    }

    /// Set the underlying type of a declared named type.
    ///
    /// Has no effect if `named` is not a named type.
    pub fn define_named(&mut self, named: Idx, underlying: Idx) {
        if let Some(TypeKind::Named { underlying: slot, .. }) = self.kinds.get_mut(named.index()) {
            *slot = underlying;
        } else {
            debug_assert!(false, "define_named on non-named type {named:?}");
        }
    }

    /// Declare and define a named type in one step.
    pub fn named(&mut self, name: Name, underlying: Idx) -> Idx {
        let idx = self.declare_named(name);
        self.define_named(idx, underlying);
        idx
    }

    // === Queries ===

    /// Look up the shape of a type, if `idx` belongs to this pool.
    pub fn get(&self, idx: Idx) -> Option<&TypeKind> {
        self.kinds.get(idx.index())
    }

    /// Look up the shape of a type.
    ///
    /// # Panics
    /// Panics if `idx` does not belong to this pool.
    pub fn kind(&self, idx: Idx) -> &TypeKind {
        &self.kinds[idx.index()]
    }

    /// Strip named wrappers down to the structural type.
    ///
    /// Returns `None` for indices outside the pool and for named types
    /// whose definition is missing or circular.
    pub fn underlying(&self, idx: Idx) -> Option<&TypeKind> {
        let mut current = idx;
        // A chain longer than the pool must revisit some named type.
        for _ in 0..=self.kinds.len() {
            match self.get(current)? {
                TypeKind::Named { underlying, .. } => current = *underlying,
                kind => return Some(kind),
            }
        }
        None
    }

    /// The element type of a pointer type.
    pub fn pointee(&self, idx: Idx) -> Option<Idx> {
        match self.underlying(idx)? {
            TypeKind::Pointer(elem) => Some(*elem),
            _ => None,
        }
    }

    /// The basic kind of a type, looking through named wrappers.
    pub fn basic(&self, idx: Idx) -> Option<BasicKind> {
        match self.underlying(idx)? {
            TypeKind::Basic(kind) => Some(*kind),
            _ => None,
        }
    }

    /// Number of types in the pool (including basic types).
    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    /// Always `false`: basic types are pre-interned.
    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl Default for Pool {
    fn default() -> Self {
        Self::new()
    }
}
