//! Compile-time contents of program globals.

use rustc_hash::FxHashMap;

use kiln_ir::{GlobalId, Program};

use crate::error::FaultKind;
use crate::value::{Heap, SlotId, Value};
use crate::zero::zero_value;

/// The heap plus the root slot of every global touched so far.
///
/// A global has no entry until the interpreter first needs it; at that
/// point its zero value is materialized exactly once. Later stores
/// overwrite the same root slot, so pointers to the global stay valid.
#[derive(Debug, Default)]
pub struct GlobalStore {
    heap: Heap,
    roots: FxHashMap<GlobalId, SlotId>,
}

impl GlobalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn heap(&self) -> &Heap {
        &self.heap
    }

    pub fn heap_mut(&mut self) -> &mut Heap {
        &mut self.heap
    }

    /// Root slot of `id`, materializing its zero value on first use.
    pub fn materialize(&mut self, program: &Program, id: GlobalId) -> Result<SlotId, FaultKind> {
        if let Some(&slot) = self.roots.get(&id) {
            return Ok(slot);
        }
        let zero = zero_value(program, &mut self.heap, program.global(id).ty)?;
        let slot = self.heap.alloc(zero);
        self.roots.insert(id, slot);
        tracing::trace!(global = %program.global_name(id), ?slot, "materialized zero initializer");
        Ok(slot)
    }

    /// Make `value` the initializer of `id`.
    ///
    /// An existing aggregate initializer keeps its element slots.
    pub fn store(&mut self, id: GlobalId, value: Value) -> SlotId {
        if let Some(&slot) = self.roots.get(&id) {
            self.heap.assign(slot, value);
            slot
        } else {
            let slot = self.heap.alloc(value);
            self.roots.insert(id, slot);
            slot
        }
    }

    pub fn root(&self, id: GlobalId) -> Option<SlotId> {
        self.roots.get(&id).copied()
    }

    /// Current initializer of `id`, if the global has been touched.
    pub fn initializer(&self, id: GlobalId) -> Option<&Value> {
        self.root(id).map(|slot| self.heap.get(slot))
    }

    /// Touched globals with their root slots, in declaration order.
    pub fn roots(&self) -> Vec<(GlobalId, SlotId)> {
        let mut roots: Vec<_> = self.roots.iter().map(|(&id, &slot)| (id, slot)).collect();
        roots.sort_unstable_by_key(|&(id, _)| id.raw());
        roots
    }

    /// Number of touched globals.
    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use kiln_ir::{Const, GlobalDecl, Idx};
    use pretty_assertions::assert_eq;

    use super::*;

    fn declare(p: &mut Program, name: &str, ty: Idx) -> GlobalId {
        let pkg = p.intern("main");
        let name = p.intern(name);
        p.add_global(GlobalDecl {
            name,
            package: Some(pkg),
            ty,
        })
    }

    #[test]
    fn materializes_once() {
        let mut p = Program::new();
        let arr = p.types.array(Idx::INT, 2);
        let g = declare(&mut p, "table", arr);
        let mut store = GlobalStore::new();

        assert_eq!(store.initializer(g), None);
        let first = store.materialize(&p, g);
        let heap_len = store.heap().len();
        let second = store.materialize(&p, g);
        assert_eq!(first, second);
        assert_eq!(store.heap().len(), heap_len);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn store_overwrites_root_in_place() {
        let mut p = Program::new();
        let g = declare(&mut p, "x", Idx::INT);
        let mut store = GlobalStore::new();

        let Ok(root) = store.materialize(&p, g) else {
            panic!("int global materializes");
        };
        let stored = store.store(g, Value::Const(Const::int(7)));
        assert_eq!(stored, root);
        assert_eq!(store.initializer(g), Some(&Value::Const(Const::int(7))));
    }

    #[test]
    fn store_without_materialize_allocates_root() {
        let mut p = Program::new();
        let g = declare(&mut p, "s", Idx::STRING);
        let mut store = GlobalStore::new();
        store.store(g, Value::Const(Const::string("hi")));
        assert_eq!(store.heap().len(), 1);
        assert_eq!(store.root(g), Some(SlotId::new(0)));
    }

    #[test]
    fn roots_follow_declaration_order() {
        let mut p = Program::new();
        let a = declare(&mut p, "a", Idx::INT);
        let b = declare(&mut p, "b", Idx::INT);
        let mut store = GlobalStore::new();
        store.store(b, Value::Zero(Idx::INT));
        store.store(a, Value::Zero(Idx::INT));
        let ids: Vec<_> = store.roots().into_iter().map(|(id, _)| id).collect();
        assert_eq!(ids, vec![a, b]);
    }

    #[test]
    fn unsupported_global_type_faults() {
        let mut p = Program::new();
        let chan = p.types.chan(Idx::INT);
        let g = declare(&mut p, "c", chan);
        let mut store = GlobalStore::new();
        assert_eq!(
            store.materialize(&p, g),
            Err(FaultKind::UnsupportedType("chan int".into()))
        );
        assert!(store.is_empty());
    }
}
