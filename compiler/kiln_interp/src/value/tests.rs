use kiln_ir::{Const, Field, Idx, Program};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

use super::{Heap, MapTable, SlotId, Value};
use crate::zero::zero_value;

#[test]
fn alloc_get_replace() {
    let mut heap = Heap::new();
    let a = heap.alloc(Value::Zero(Idx::INT));
    let b = heap.alloc(Value::Const(Const::int(1)));
    assert_eq!(a, SlotId::new(0));
    assert_eq!(b.raw(), 1);
    assert_eq!(heap.len(), 2);

    let old = heap.replace(a, Value::Const(Const::int(2)));
    assert_eq!(old, Value::Zero(Idx::INT));
    assert_eq!(heap.get(a), &Value::Const(Const::int(2)));
    assert_eq!(heap.len(), 2);
}

#[test]
fn iter_yields_slots_in_allocation_order() {
    let mut heap = Heap::new();
    heap.alloc(Value::Zero(Idx::BOOL));
    heap.alloc(Value::Zero(Idx::STRING));
    let slots: Vec<_> = heap.iter().map(|(slot, value)| (slot.index(), value.clone())).collect();
    assert_eq!(
        slots,
        vec![(0, Value::Zero(Idx::BOOL)), (1, Value::Zero(Idx::STRING))]
    );
}

#[test]
fn copy_value_gives_aggregates_fresh_slots() {
    let mut p = Program::new();
    let x = p.intern("x");
    let st = p.types.structure(vec![Field { name: x, ty: Idx::INT }]);
    let arr = p.types.array(st, 2);
    let mut heap = Heap::new();
    let Ok(original) = zero_value(&p, &mut heap, arr) else {
        panic!("array of structs has a zero value");
    };
    let before = heap.len();

    let copy = heap.copy_value(original.clone());
    // Two structs plus one field each.
    assert_eq!(heap.len(), before + 4);
    assert_ne!(copy, original);

    let (Value::Array { elems: a, .. }, Value::Array { elems: b, .. }) = (&original, &copy) else {
        panic!("copies stay arrays");
    };
    assert!(a.iter().all(|slot| !b.contains(slot)));
    let inner = heap.get(b[1]).children().to_vec();
    assert_eq!(inner.len(), 1);
    assert_eq!(heap.get(inner[0]), &Value::Zero(Idx::INT));
}

#[test]
fn copy_value_shares_pointers_and_maps() {
    let mut heap = Heap::new();
    let target = heap.alloc(Value::Zero(Idx::INT));
    let pointer = Value::Pointer {
        pointee: Idx::INT,
        target: Some(target),
    };
    assert_eq!(heap.copy_value(pointer.clone()), pointer);

    let table = heap.new_table();
    let map = Value::Map {
        ty: Idx::NONE,
        table,
    };
    assert_eq!(heap.copy_value(map.clone()), map);
    assert_eq!(heap.len(), 1);
}

#[test]
fn assign_reuses_element_slots_of_matching_aggregates() {
    let mut p = Program::new();
    let x = p.intern("x");
    let st = p.types.structure(vec![Field { name: x, ty: Idx::INT }]);
    let arr = p.types.array(st, 2);
    let mut heap = Heap::new();
    let (Ok(dst), Ok(src)) = (
        zero_value(&p, &mut heap, arr),
        zero_value(&p, &mut heap, arr),
    ) else {
        panic!("array of structs has a zero value");
    };
    let root = heap.alloc(dst.clone());

    // src[1].x = 4
    let src_second = src.children()[1];
    let src_field = heap.get(src_second).children()[0];
    heap.replace(src_field, Value::Const(Const::int(4)));

    let before = heap.len();
    heap.assign(root, src);
    assert_eq!(heap.len(), before);
    assert_eq!(heap.get(root), &dst);

    let dst_second = dst.children()[1];
    let dst_field = heap.get(dst_second).children()[0];
    assert_eq!(heap.get(dst_field), &Value::Const(Const::int(4)));
}

#[test]
fn assign_replaces_scalars_and_mismatched_shapes() {
    let mut p = Program::new();
    let short = p.types.array(Idx::INT, 1);
    let long = p.types.array(Idx::INT, 2);
    let mut heap = Heap::new();
    let Ok(value) = zero_value(&p, &mut heap, short) else {
        panic!("int arrays have a zero value");
    };
    let slot = heap.alloc(value);

    let Ok(longer) = zero_value(&p, &mut heap, long) else {
        panic!("int arrays have a zero value");
    };
    heap.assign(slot, longer.clone());
    assert_eq!(heap.get(slot), &longer);

    heap.assign(slot, Value::Const(Const::int(1)));
    assert_eq!(heap.get(slot), &Value::Const(Const::int(1)));
}

#[test]
fn shape_names() {
    assert_eq!(Value::Const(Const::int(1)).shape_name(), "constant");
    assert_eq!(Value::Zero(Idx::INT).shape_name(), "zero scalar");
    assert_eq!(
        Value::Slice {
            ty: Idx::NONE,
            array: None
        }
        .shape_name(),
        "slice"
    );
    assert!(Value::Zero(Idx::INT).children().is_empty());
}

#[test]
fn map_table_entries() {
    let mut table = MapTable::default();
    assert!(table.is_empty());
    table.insert(Value::Const(Const::string("a")), Value::Const(Const::int(1)));
    table.insert(Value::Const(Const::string("b")), Value::Const(Const::int(2)));
    assert_eq!(table.len(), 2);
    let keys: Vec<_> = table.entries().map(|(k, _)| k.clone()).collect();
    assert_eq!(
        keys,
        vec![
            Value::Const(Const::string("a")),
            Value::Const(Const::string("b"))
        ]
    );
}

proptest! {
    #[test]
    fn map_insertion_order_is_preserved(keys in prop::collection::vec(any::<i64>(), 0..32)) {
        let mut heap = Heap::new();
        let table = heap.new_table();
        for (i, key) in keys.iter().enumerate() {
            let value = i64::try_from(i).unwrap_or(i64::MAX);
            heap.table_mut(table)
                .insert(Value::Const(Const::int(*key)), Value::Const(Const::int(value)));
        }
        let stored: Vec<_> = heap.table(table).keys.clone();
        let expected: Vec<_> = keys.iter().map(|k| Value::Const(Const::int(*k))).collect();
        prop_assert_eq!(stored, expected);
        prop_assert_eq!(heap.table(table).values.len(), keys.len());
    }

    #[test]
    fn zero_array_has_independent_elements(len in 0u64..64) {
        let mut p = Program::new();
        let arr = p.types.array(Idx::INT, len);
        let mut heap = Heap::new();
        let value = zero_value(&p, &mut heap, arr);
        let Ok(Value::Array { elem_ty, elems }) = value else {
            panic!("int arrays have a zero value");
        };
        prop_assert_eq!(elem_ty, Idx::INT);
        prop_assert_eq!(elems.len() as u64, len);
        let mut distinct = elems.clone();
        distinct.sort_unstable();
        distinct.dedup();
        prop_assert_eq!(distinct.len(), elems.len());
        prop_assert!(elems.iter().all(|slot| heap.get(*slot) == &Value::Zero(Idx::INT)));
    }

    #[test]
    fn zero_struct_has_one_slot_per_field(count in 0usize..16) {
        let mut p = Program::new();
        let fields = (0..count)
            .map(|i| {
                let name = p.intern(&format!("f{i}"));
                Field { name, ty: Idx::STRING }
            })
            .collect();
        let st = p.types.structure(fields);
        let mut heap = Heap::new();
        let Ok(Value::Struct { ty, fields }) = zero_value(&p, &mut heap, st) else {
            panic!("string structs have a zero value");
        };
        prop_assert_eq!(ty, st);
        prop_assert_eq!(fields.len(), count);
        prop_assert_eq!(heap.len(), count);
    }
}
