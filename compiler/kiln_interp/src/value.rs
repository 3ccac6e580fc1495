//! Compile-time values and the heap arena that owns them.
//!
//! Interpreted memory is an arena of slots. A [`Value`] never holds
//! another composite by reference: arrays and structs list the slots of
//! their elements, pointers and slices name a slot, and maps name a
//! table. Two values alias exactly when they name the same slot (or
//! table), which is how stores through a pointer become visible to every
//! other holder of that pointer.
//!
//! Slots are never freed. Copies made for assignment are orphaned once
//! their contents reach the destination; the arena lives only as long as
//! one compilation.

use kiln_ir::{Const, FuncId, GlobalId, Idx};

// ── Handles ─────────────────────────────────────────────────────────

/// Index of one storage slot in a [`Heap`].
#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(u32);

impl SlotId {
    #[inline]
    pub const fn new(raw: u32) -> Self {
        SlotId(raw)
    }

    #[inline]
    pub const fn raw(self) -> u32 {
        self.0
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Debug for SlotId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "slot{}", self.0)
    }
}

/// Index of one map table in a [`Heap`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MapId(u32);

impl MapId {
    #[inline]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

// ── Values ──────────────────────────────────────────────────────────

/// A value known at compile time.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Value {
    /// A typed literal.
    Const(Const),
    /// The zero value of a scalar type (bool, numeric, string, `unsafe.Pointer`).
    Zero(Idx),
    /// A pointer to an object of type `pointee`; `None` is nil.
    Pointer {
        pointee: Idx,
        target: Option<SlotId>,
    },
    /// A function reference; `None` is the nil function.
    Function { ty: Idx, func: Option<FuncId> },
    /// An interface value boxing `inner`, whose dynamic type is `ty`.
    /// `None` is the nil interface.
    Interface { ty: Idx, inner: Option<Box<Value>> },
    /// A pointer reinterpreted as another pointer type.
    Bitcast { ty: Idx, inner: Box<Value> },
    /// A pointer reinterpreted as an integer.
    PtrToInt { inner: Box<Value> },
    /// The address of a global.
    Global(GlobalId),
    Array { elem_ty: Idx, elems: Vec<SlotId> },
    Struct { ty: Idx, fields: Vec<SlotId> },
    /// A slice covering the whole of the array in slot `array`; `None` is nil.
    Slice { ty: Idx, array: Option<SlotId> },
    Map { ty: Idx, table: MapId },
}

impl Value {
    /// Short description of the value's shape, for fault messages.
    pub fn shape_name(&self) -> &'static str {
        match self {
            Value::Const(_) => "constant",
            Value::Zero(_) => "zero scalar",
            Value::Pointer { .. } => "pointer",
            Value::Function { .. } => "function",
            Value::Interface { .. } => "interface",
            Value::Bitcast { .. } => "pointer bit-cast",
            Value::PtrToInt { .. } => "pointer-as-integer",
            Value::Global(_) => "global address",
            Value::Array { .. } => "array",
            Value::Struct { .. } => "struct",
            Value::Slice { .. } => "slice",
            Value::Map { .. } => "map",
        }
    }

    /// Slots owned by this value (elements of an array, fields of a struct).
    pub fn children(&self) -> &[SlotId] {
        match self {
            Value::Array { elems, .. } => elems,
            Value::Struct { fields, .. } => fields,
            _ => &[],
        }
    }
}

/// Insertion-ordered key/value pairs of one map.
///
/// Keys are not checked for duplicates: the front-end only emits map
/// updates for composite literals, which cannot repeat a constant key.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MapTable {
    pub keys: Vec<Value>,
    pub values: Vec<Value>,
}

impl MapTable {
    pub fn insert(&mut self, key: Value, value: Value) {
        self.keys.push(key);
        self.values.push(value);
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.keys.iter().zip(&self.values)
    }
}

// ── Heap ────────────────────────────────────────────────────────────

/// Arena of value slots and map tables.
#[derive(Clone, Debug, Default)]
pub struct Heap {
    slots: Vec<Value>,
    tables: Vec<MapTable>,
}

impl Heap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&mut self, value: Value) -> SlotId {
        let id = SlotId::new(next_raw(self.slots.len()));
        self.slots.push(value);
        id
    }

    /// The value in `slot`.
    ///
    /// # Panics
    /// Panics if `slot` was not allocated by this heap.
    pub fn get(&self, slot: SlotId) -> &Value {
        &self.slots[slot.index()]
    }

    /// Overwrite `slot`, returning the previous value.
    ///
    /// # Panics
    /// Panics if `slot` was not allocated by this heap.
    pub fn replace(&mut self, slot: SlotId, value: Value) -> Value {
        std::mem::replace(&mut self.slots[slot.index()], value)
    }

    pub fn new_table(&mut self) -> MapId {
        let id = MapId(next_raw(self.tables.len()));
        self.tables.push(MapTable::default());
        id
    }

    /// # Panics
    /// Panics if `table` was not allocated by this heap.
    pub fn table(&self, table: MapId) -> &MapTable {
        &self.tables[table.index()]
    }

    /// # Panics
    /// Panics if `table` was not allocated by this heap.
    pub fn table_mut(&mut self, table: MapId) -> &mut MapTable {
        &mut self.tables[table.index()]
    }

    /// Copy a value with Go assignment semantics: arrays and structs get
    /// fresh element slots, recursively; everything else is shared.
    pub fn copy_value(&mut self, value: Value) -> Value {
        match value {
            Value::Array { elem_ty, elems } => Value::Array {
                elem_ty,
                elems: self.copy_slots(&elems),
            },
            Value::Struct { ty, fields } => Value::Struct {
                ty,
                fields: self.copy_slots(&fields),
            },
            Value::Interface {
                ty,
                inner: Some(inner),
            } => Value::Interface {
                ty,
                inner: Some(Box::new(self.copy_value(*inner))),
            },
            other => other,
        }
    }

    /// Store `value` into `slot` with assignment semantics.
    ///
    /// An array or struct written over one of the same length updates the
    /// existing element slots in place, so pointers previously taken into
    /// those elements observe the new contents. Anything else replaces
    /// the slot. `value` must not share slots with the destination; pass
    /// it through [`Heap::copy_value`] first.
    pub fn assign(&mut self, slot: SlotId, value: Value) {
        let targets = match (self.get(slot), &value) {
            (Value::Array { elems: old, .. }, Value::Array { elems: new, .. })
            | (Value::Struct { fields: old, .. }, Value::Struct { fields: new, .. })
                if old.len() == new.len() =>
            {
                old.clone()
            }
            _ => {
                self.replace(slot, value);
                return;
            }
        };
        for (target, source) in targets.into_iter().zip(value.children()) {
            let element = self.get(*source).clone();
            self.assign(target, element);
        }
    }

    fn copy_slots(&mut self, slots: &[SlotId]) -> Vec<SlotId> {
        slots
            .iter()
            .map(|&slot| {
                let copied = self.copy_value(self.get(slot).clone());
                self.alloc(copied)
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (SlotId, &Value)> {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, value)| (SlotId::new(next_raw(i)), value))
    }
}

fn next_raw(len: usize) -> u32 {
    u32::try_from(len).unwrap_or_else(|_| panic!("heap exceeded u32::MAX entries"))
}

#[cfg(test)]
mod tests;
