//! Zero values.

use kiln_ir::{Idx, Program, TypeKind};

use crate::error::FaultKind;
use crate::value::{Heap, Value};

/// Build the zero value of `ty`, allocating element slots for aggregates.
///
/// Named types are looked through. Tuples, channels and named types
/// without a definition have no compile-time zero value.
pub fn zero_value(program: &Program, heap: &mut Heap, ty: Idx) -> Result<Value, FaultKind> {
    let unsupported = || FaultKind::UnsupportedType(program.display_type(ty).to_string());
    let Some(kind) = program.types.underlying(ty) else {
        return Err(unsupported());
    };

    match kind {
        TypeKind::Basic(_) => Ok(Value::Zero(ty)),
        TypeKind::Pointer(pointee) => Ok(Value::Pointer {
            pointee: *pointee,
            target: None,
        }),
        TypeKind::Signature { .. } => Ok(Value::Function { ty, func: None }),
        TypeKind::Interface(_) => Ok(Value::Interface { ty, inner: None }),
        TypeKind::Slice(_) => Ok(Value::Slice { ty, array: None }),
        TypeKind::Map { .. } => Ok(Value::Map {
            ty,
            table: heap.new_table(),
        }),
        TypeKind::Array { elem, len } => {
            let len = usize::try_from(*len).map_err(|_| unsupported())?;
            let mut elems = Vec::with_capacity(len);
            for _ in 0..len {
                let zero = zero_value(program, heap, *elem)?;
                elems.push(heap.alloc(zero));
            }
            Ok(Value::Array {
                elem_ty: *elem,
                elems,
            })
        }
        TypeKind::Struct(fields) => {
            let mut slots = Vec::with_capacity(fields.len());
            for field in fields {
                let zero = zero_value(program, heap, field.ty)?;
                slots.push(heap.alloc(zero));
            }
            Ok(Value::Struct { ty, fields: slots })
        }
        TypeKind::Named { .. } | TypeKind::Tuple(_) | TypeKind::Chan(_) => Err(unsupported()),
    }
}
