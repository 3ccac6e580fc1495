//! Export of interpreted globals as static data.
//!
//! The heap is a graph of slots; a code generator wants one
//! self-contained initializer per global. [`export`] walks every touched
//! global's tree and replaces slot handles with [`Address`]es: a root
//! (a global, or an anonymous object) plus a path of field/element
//! indices. Heap objects reachable only through pointers, such as the
//! target of an `Alloc`, become anonymous objects of the image.

use std::fmt::{self, Write as _};

use rustc_hash::FxHashMap;

use kiln_ir::{Const, FuncId, GlobalId, Idx, Operand, Program};

use crate::globals::GlobalStore;
use crate::value::{Heap, SlotId, Value};

// ── Static values ───────────────────────────────────────────────────

/// The object an [`Address`] starts from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Root {
    Global(GlobalId),
    /// Index into [`Image::anonymous`].
    Anonymous(u32),
}

/// A location inside the image: `root` followed by field or element indices.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Address {
    pub root: Root,
    pub path: Vec<u32>,
}

impl Address {
    pub fn global(id: GlobalId) -> Self {
        Self {
            root: Root::Global(id),
            path: Vec::new(),
        }
    }
}

/// A fully resolved initializer with no heap handles left.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StaticValue {
    Const(Const),
    Zero(Idx),
    Pointer {
        pointee: Idx,
        target: Option<Address>,
    },
    Function {
        ty: Idx,
        func: Option<FuncId>,
    },
    Interface {
        ty: Idx,
        inner: Option<Box<StaticValue>>,
    },
    Bitcast {
        ty: Idx,
        inner: Box<StaticValue>,
    },
    PtrToInt {
        inner: Box<StaticValue>,
    },
    /// The address of a whole global.
    GlobalAddr(GlobalId),
    Array {
        elem_ty: Idx,
        elems: Vec<StaticValue>,
    },
    Struct {
        ty: Idx,
        fields: Vec<StaticValue>,
    },
    Slice {
        ty: Idx,
        array: Option<Address>,
    },
    Map {
        ty: Idx,
        entries: Vec<(StaticValue, StaticValue)>,
    },
}

/// Everything the code generator needs to emit initialized data.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Image {
    /// Touched globals, in declaration order.
    pub globals: Vec<(GlobalId, StaticValue)>,
    /// Objects referenced only through pointers.
    pub anonymous: Vec<StaticValue>,
}

impl Image {
    pub fn global(&self, id: GlobalId) -> Option<&StaticValue> {
        self.globals
            .iter()
            .find(|(g, _)| *g == id)
            .map(|(_, value)| value)
    }

    /// One line per global and anonymous object.
    pub fn render(&self, program: &Program) -> String {
        let mut out = String::new();
        for (id, value) in &self.globals {
            let name = program.global_name(*id);
            let _ = writeln!(out, "@{name} = {}", value.display(program));
        }
        for (i, value) in self.anonymous.iter().enumerate() {
            let _ = writeln!(out, "#{i} = {}", value.display(program));
        }
        out
    }
}

// ── Export ──────────────────────────────────────────────────────────

/// Convert every touched global of `store` into static data.
pub fn export(store: &GlobalStore) -> Image {
    let mut exporter = Exporter::new(store.heap());
    let roots = store.roots();
    for &(id, slot) in &roots {
        exporter.locate(slot, Address::global(id));
    }

    let globals = roots
        .iter()
        .map(|&(id, slot)| (id, exporter.convert_slot(slot)))
        .collect();

    // Converting an anonymous object can discover further ones.
    let mut anonymous = Vec::new();
    while let Some(&slot) = exporter.anonymous_roots.get(anonymous.len()) {
        anonymous.push(exporter.convert_slot(slot));
    }

    tracing::debug!(
        globals = roots.len(),
        anonymous = anonymous.len(),
        "exported static image"
    );
    Image { globals, anonymous }
}

struct Exporter<'a> {
    heap: &'a Heap,
    /// Owning aggregate and position of every slot that is currently an
    /// element or field of some value.
    parents: Vec<Option<(SlotId, u32)>>,
    /// Address of every slot inside an already located tree.
    located: FxHashMap<SlotId, Address>,
    anonymous_roots: Vec<SlotId>,
}

impl<'a> Exporter<'a> {
    fn new(heap: &'a Heap) -> Self {
        let mut parents = vec![None; heap.len()];
        for (slot, value) in heap.iter() {
            for (position, child) in (0u32..).zip(value.children()) {
                if let Some(entry @ None) = parents.get_mut(child.index()) {
                    *entry = Some((slot, position));
                }
            }
        }
        Self {
            heap,
            parents,
            located: FxHashMap::default(),
            anonymous_roots: Vec::new(),
        }
    }

    /// Record the address of `slot` and everything it owns.
    fn locate(&mut self, slot: SlotId, address: Address) {
        let mut pending = vec![(slot, address)];
        while let Some((slot, address)) = pending.pop() {
            if self.located.contains_key(&slot) {
                continue;
            }
            for (position, child) in (0u32..).zip(self.heap.get(slot).children()) {
                let mut path = address.path.clone();
                path.push(position);
                pending.push((
                    *child,
                    Address {
                        root: address.root,
                        path,
                    },
                ));
            }
            self.located.insert(slot, address);
        }
    }

    /// Address of `slot`, promoting its outermost enclosing object to an
    /// anonymous root if it is not inside any located tree.
    fn address_of(&mut self, slot: SlotId) -> Address {
        let mut suffix = Vec::new();
        let mut current = slot;
        // Parent links never form a cycle; the bound only guards a corrupt heap.
        for _ in 0..=self.parents.len() {
            if let Some(base) = self.located.get(&current) {
                let mut path = base.path.clone();
                path.extend(suffix.iter().rev());
                return Address {
                    root: base.root,
                    path,
                };
            }
            match self.parents.get(current.index()).copied().flatten() {
                Some((parent, position)) => {
                    suffix.push(position);
                    current = parent;
                }
                None => break,
            }
        }

        let index = u32::try_from(self.anonymous_roots.len())
            .unwrap_or_else(|_| panic!("anonymous object count exceeds u32::MAX"));
        let root = Root::Anonymous(index);
        self.anonymous_roots.push(current);
        self.locate(current, Address { root, path: Vec::new() });
        suffix.reverse();
        Address { root, path: suffix }
    }

    fn convert_slot(&mut self, slot: SlotId) -> StaticValue {
        let heap = self.heap;
        self.convert(heap.get(slot))
    }

    fn convert(&mut self, value: &'a Value) -> StaticValue {
        match value {
            Value::Const(c) => StaticValue::Const(c.clone()),
            Value::Zero(ty) => StaticValue::Zero(*ty),
            Value::Pointer { pointee, target } => StaticValue::Pointer {
                pointee: *pointee,
                target: target.map(|slot| self.address_of(slot)),
            },
            Value::Function { ty, func } => StaticValue::Function {
                ty: *ty,
                func: *func,
            },
            Value::Interface { ty, inner } => StaticValue::Interface {
                ty: *ty,
                inner: inner.as_deref().map(|v| Box::new(self.convert(v))),
            },
            Value::Bitcast { ty, inner } => StaticValue::Bitcast {
                ty: *ty,
                inner: Box::new(self.convert(inner)),
            },
            Value::PtrToInt { inner } => StaticValue::PtrToInt {
                inner: Box::new(self.convert(inner)),
            },
            Value::Global(id) => StaticValue::GlobalAddr(*id),
            Value::Array { elem_ty, elems } => StaticValue::Array {
                elem_ty: *elem_ty,
                elems: elems.iter().map(|&slot| self.convert_slot(slot)).collect(),
            },
            Value::Struct { ty, fields } => StaticValue::Struct {
                ty: *ty,
                fields: fields.iter().map(|&slot| self.convert_slot(slot)).collect(),
            },
            Value::Slice { ty, array } => StaticValue::Slice {
                ty: *ty,
                array: array.map(|slot| self.address_of(slot)),
            },
            Value::Map { ty, table } => {
                let heap = self.heap;
                StaticValue::Map {
                    ty: *ty,
                    entries: heap
                        .table(*table)
                        .entries()
                        .map(|(k, v)| (self.convert(k), self.convert(v)))
                        .collect(),
                }
            }
        }
    }
}

// ── Rendering ───────────────────────────────────────────────────────

impl StaticValue {
    pub fn display<'a>(&'a self, program: &'a Program) -> StaticValueDisplay<'a> {
        StaticValueDisplay {
            program,
            value: self,
        }
    }
}

/// Textual form of a [`StaticValue`]: `{1:int, &@main.table.2, nil}`.
pub struct StaticValueDisplay<'a> {
    program: &'a Program,
    value: &'a StaticValue,
}

impl StaticValueDisplay<'_> {
    fn nested<'b>(&'b self, value: &'b StaticValue) -> StaticValueDisplay<'b> {
        value.display(self.program)
    }

    fn address(&self, f: &mut fmt::Formatter<'_>, address: &Address) -> fmt::Result {
        match address.root {
            Root::Global(id) => write!(f, "@{}", self.program.global_name(id))?,
            Root::Anonymous(i) => write!(f, "#{i}")?,
        }
        for position in &address.path {
            write!(f, ".{position}")?;
        }
        Ok(())
    }

    fn list(&self, f: &mut fmt::Formatter<'_>, values: &[StaticValue]) -> fmt::Result {
        for (i, value) in values.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", self.nested(value))?;
        }
        Ok(())
    }
}

impl fmt::Display for StaticValueDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.program;
        match self.value {
            StaticValue::Const(c) => {
                write!(f, "{}", p.display_operand(&Operand::Const(c.clone())))
            }
            StaticValue::Zero(ty) => write!(f, "zero:{}", p.display_type(*ty)),
            StaticValue::Pointer { target: None, .. }
            | StaticValue::Function { func: None, .. }
            | StaticValue::Interface { inner: None, .. }
            | StaticValue::Slice { array: None, .. } => f.write_str("nil"),
            StaticValue::Pointer {
                target: Some(address),
                ..
            } => {
                f.write_char('&')?;
                self.address(f, address)
            }
            StaticValue::Function { func: Some(id), .. } => f.write_str(&p.function_name(*id)),
            StaticValue::Interface {
                ty,
                inner: Some(inner),
            } => write!(f, "{}({})", p.display_type(*ty), self.nested(inner)),
            StaticValue::Bitcast { ty, inner } => {
                write!(f, "({})({})", p.display_type(*ty), self.nested(inner))
            }
            StaticValue::PtrToInt { inner } => write!(f, "uintptr({})", self.nested(inner)),
            StaticValue::GlobalAddr(id) => write!(f, "&@{}", p.global_name(*id)),
            StaticValue::Array { elems, .. } => {
                f.write_char('[')?;
                self.list(f, elems)?;
                f.write_char(']')
            }
            StaticValue::Struct { fields, .. } => {
                f.write_char('{')?;
                self.list(f, fields)?;
                f.write_char('}')
            }
            StaticValue::Slice {
                array: Some(address),
                ..
            } => {
                f.write_char('&')?;
                self.address(f, address)?;
                f.write_str("[:]")
            }
            StaticValue::Map { entries, .. } => {
                f.write_str("map[")?;
                for (i, (key, value)) in entries.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}: {}", self.nested(key), self.nested(value))?;
                }
                f.write_char(']')
            }
        }
    }
}
