//! Instruction interpreter.
//!
//! [`Interpreter::interpret`] walks a straight-line instruction sequence
//! in a [`Frame`] and reports how far it got. There are three ways to
//! stop early:
//!
//! - **Boundary** (`Ok(index)` with `index < len`): the instruction at
//!   `index` is outside the supported subset. Not an error; everything
//!   from `index` on is left for runtime initialization.
//! - **Skip** ([`Halt::SkipForeign`]): the instruction referenced a
//!   foreign-bridging global. The driver drops it and starts again.
//! - **Fault** ([`Halt::Fault`]): the instruction stream broke an
//!   assumption. Compilation must stop.
//!
//! Calls to eligible functions recurse into the callee body with a fresh
//! frame. Any stop inside a callee other than a clean return is reported
//! against the call instruction in the caller.

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use kiln_ir::{
    BasicKind, BinaryOp, Callee, Const, FuncId, FunctionOrigin, GlobalId, Idx, Instr, LitValue,
    Operand, Program, UnaryOp, ValueId,
};

use crate::config::InterpConfig;
use crate::eligibility::can_inline;
use crate::error::{Fault, FaultKind};
use crate::globals::GlobalStore;
use crate::stack::ensure_sufficient_stack;
use crate::value::{SlotId, Value};
use crate::zero::zero_value;

// ── Frames ──────────────────────────────────────────────────────────

/// Register environment of one block or one inlined call.
#[derive(Debug, Default)]
pub struct Frame {
    locals: FxHashMap<ValueId, Value>,
    results: Vec<Option<Value>>,
}

impl Frame {
    /// A top-level frame with no parameters and no result slots.
    pub fn new() -> Self {
        Self::default()
    }

    fn for_call(params: impl IntoIterator<Item = (ValueId, Value)>, result_count: usize) -> Self {
        Self {
            locals: params.into_iter().collect(),
            results: vec![None; result_count],
        }
    }

    pub fn bind(&mut self, var: ValueId, value: Value) {
        self.locals.insert(var, value);
    }

    pub fn get(&self, var: ValueId) -> Option<&Value> {
        self.locals.get(&var)
    }

    /// Number of bound registers.
    pub fn len(&self) -> usize {
        self.locals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locals.is_empty()
    }
}

// ── Outcomes ────────────────────────────────────────────────────────

/// Why interpretation stopped before a boundary or the end.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Halt {
    /// The instruction at `index` touches a foreign-bridging global.
    SkipForeign { index: usize },
    /// The instruction at `index` faulted.
    Fault { index: usize, fault: Fault },
}

/// Result of one instruction.
enum Flow {
    Next,
    Boundary,
}

/// Failure of one instruction, before it is tied to an index.
enum Failure {
    Foreign,
    Kind(FaultKind),
    /// A fault inside an inlined callee, already rendered there.
    Nested(Fault),
}

impl From<FaultKind> for Failure {
    fn from(kind: FaultKind) -> Self {
        Failure::Kind(kind)
    }
}

// ── Interpreter ─────────────────────────────────────────────────────

pub struct Interpreter<'a> {
    program: &'a Program,
    store: &'a mut GlobalStore,
    config: &'a InterpConfig,
    depth: usize,
}

impl<'a> Interpreter<'a> {
    pub fn new(program: &'a Program, store: &'a mut GlobalStore, config: &'a InterpConfig) -> Self {
        Self {
            program,
            store,
            config,
            depth: 0,
        }
    }

    /// Interpret `instrs` in `frame`.
    ///
    /// Returns the index of the first instruction not consumed: `instrs.len()`
    /// when everything was interpreted, otherwise the boundary.
    pub fn interpret(&mut self, instrs: &[Instr], frame: &mut Frame) -> Result<usize, Halt> {
        for (index, instr) in instrs.iter().enumerate() {
            tracing::trace!(
                depth = self.depth,
                index,
                instr = %self.program.display_instr(instr),
                "interpret"
            );
            match self.step(instr, frame) {
                Ok(Flow::Next) => {}
                Ok(Flow::Boundary) => {
                    tracing::trace!(depth = self.depth, index, "boundary");
                    return Ok(index);
                }
                Err(Failure::Foreign) => return Err(Halt::SkipForeign { index }),
                Err(Failure::Kind(kind)) => {
                    let fault = Fault::new(kind, self.program.display_instr(instr).to_string());
                    return Err(Halt::Fault { index, fault });
                }
                Err(Failure::Nested(fault)) => return Err(Halt::Fault { index, fault }),
            }
        }
        Ok(instrs.len())
    }

    fn step(&mut self, instr: &Instr, frame: &mut Frame) -> Result<Flow, Failure> {
        match instr {
            Instr::Alloc { dst, ty } => {
                let pointee = self.pointee_type(*ty)?;
                let zero = zero_value(self.program, self.store.heap_mut(), pointee)?;
                let slot = self.store.heap_mut().alloc(zero);
                frame.bind(
                    *dst,
                    Value::Pointer {
                        pointee,
                        target: Some(slot),
                    },
                );
            }

            Instr::BinOp { dst, ty, op, x, y } => {
                let is_string = self.program.types.basic(*ty) == Some(BasicKind::String);
                if *op != BinaryOp::Add || !is_string {
                    return Err(FaultKind::UnsupportedBinOp.into());
                }
                let x = self.resolve(x, frame)?;
                let y = self.resolve(y, frame)?;
                let mut joined = self.string_of(&x)?.to_owned();
                joined.push_str(self.string_of(&y)?);
                frame.bind(
                    *dst,
                    Value::Const(Const::new(*ty, LitValue::Str(joined.into()))),
                );
            }

            Instr::Call {
                dst,
                ty,
                callee,
                args,
            } => return self.call(*dst, *ty, callee, args, frame),

            Instr::Convert { dst, ty, x, from } => {
                let value = self.resolve(x, frame)?;
                let converted = self.convert(*ty, *from, value)?;
                frame.bind(*dst, converted);
            }

            Instr::DebugRef { .. } => {}

            Instr::FieldAddr { dst, ty, x, field } => {
                let base = self.resolve(x, frame)?;
                let slot = self.pointee_slot(&base)?;
                let target = match self.store.heap().get(slot) {
                    Value::Struct { fields, .. } => *fields.get(*field as usize).ok_or(
                        FaultKind::FieldOutOfRange {
                            field: *field,
                            count: fields.len(),
                        },
                    )?,
                    other => return Err(FaultKind::NotAStruct(other.shape_name()).into()),
                };
                let pointee = self.pointee_type(*ty)?;
                frame.bind(
                    *dst,
                    Value::Pointer {
                        pointee,
                        target: Some(target),
                    },
                );
            }

            Instr::IndexAddr { dst, ty, x, index } => {
                let base = self.resolve(x, frame)?;
                let Some(index) = self.constant_index(index, frame)? else {
                    return Ok(Flow::Boundary);
                };
                let slot = self.pointee_slot(&base)?;
                let target = match self.store.heap().get(slot) {
                    Value::Array { elems, .. } => usize::try_from(index)
                        .ok()
                        .and_then(|i| elems.get(i))
                        .copied()
                        .ok_or(FaultKind::IndexOutOfRange {
                            index,
                            len: elems.len(),
                        })?,
                    other => return Err(FaultKind::NotAnArray(other.shape_name()).into()),
                };
                let pointee = self.pointee_type(*ty)?;
                frame.bind(
                    *dst,
                    Value::Pointer {
                        pointee,
                        target: Some(target),
                    },
                );
            }

            Instr::MakeInterface { dst, x, from, .. } => {
                let value = self.resolve(x, frame)?;
                let inner = self.store.heap_mut().copy_value(value);
                frame.bind(
                    *dst,
                    Value::Interface {
                        ty: *from,
                        inner: Some(Box::new(inner)),
                    },
                );
            }

            Instr::MakeMap { dst, ty, .. } => {
                let table = self.store.heap_mut().new_table();
                frame.bind(*dst, Value::Map { ty: *ty, table });
            }

            Instr::MapUpdate { map, key, value } => {
                let map = self.resolve(map, frame)?;
                let Value::Map { table, .. } = map else {
                    return Err(FaultKind::NotAMap(map.shape_name()).into());
                };
                let key = self.resolve(key, frame)?;
                let value = self.resolve(value, frame)?;
                let heap = self.store.heap_mut();
                let key = heap.copy_value(key);
                let value = heap.copy_value(value);
                heap.table_mut(table).insert(key, value);
            }

            Instr::Return { results } => {
                if results.len() != frame.results.len() {
                    return Err(FaultKind::ResultCountMismatch {
                        expected: frame.results.len(),
                        found: results.len(),
                    }
                    .into());
                }
                let mut resolved = SmallVec::<[Value; 1]>::with_capacity(results.len());
                for operand in results {
                    resolved.push(self.resolve(operand, frame)?);
                }
                for (slot, value) in frame.results.iter_mut().zip(resolved) {
                    *slot = Some(value);
                }
            }

            Instr::Slice {
                dst,
                ty,
                x,
                low,
                high,
                max,
            } => {
                if low.is_some() || high.is_some() || max.is_some() {
                    return Err(FaultKind::SliceWithBounds.into());
                }
                let source = self.resolve(x, frame)?;
                if !matches!(source, Value::Pointer { .. } | Value::Global(_)) {
                    return Err(FaultKind::UnsupportedSliceSource(source.shape_name()).into());
                }
                let slot = self.pointee_slot(&source)?;
                let array = self.store.heap().get(slot);
                if !matches!(array, Value::Array { .. }) {
                    return Err(FaultKind::NotAnArray(array.shape_name()).into());
                }
                frame.bind(
                    *dst,
                    Value::Slice {
                        ty: *ty,
                        array: Some(slot),
                    },
                );
            }

            Instr::Store { addr, value } => return self.store_to(addr, value, frame),

            Instr::UnOp {
                dst, op, x, comma_ok, ..
            } => {
                if *op != UnaryOp::Deref || *comma_ok {
                    return Err(FaultKind::UnsupportedUnOp.into());
                }
                let pointer = self.resolve(x, frame)?;
                let slot = self.pointee_slot(&pointer)?;
                let heap = self.store.heap_mut();
                let loaded = heap.copy_value(heap.get(slot).clone());
                frame.bind(*dst, loaded);
            }

            Instr::If { .. }
            | Instr::Jump { .. }
            | Instr::Phi { .. }
            | Instr::Panic { .. }
            | Instr::Go { .. }
            | Instr::MakeClosure { .. }
            | Instr::MakeSlice { .. }
            | Instr::Extract { .. }
            | Instr::Lookup { .. }
            | Instr::TypeAssert { .. }
            | Instr::ChangeType { .. }
            | Instr::Field { .. }
            | Instr::Index { .. } => return Ok(Flow::Boundary),
        }
        Ok(Flow::Next)
    }

    // ── Calls ───────────────────────────────────────────────────────

    fn call(
        &mut self,
        dst: ValueId,
        ty: Idx,
        callee: &Callee,
        args: &[Operand],
        frame: &mut Frame,
    ) -> Result<Flow, Failure> {
        let Some(id) = callee.static_target() else {
            return Ok(Flow::Boundary);
        };
        let program = self.program;
        let func = program.function(id);
        let qualified = program.function_name(id);

        if self.config.is_env_query(&qualified) {
            let zero = zero_value(program, self.store.heap_mut(), ty)?;
            frame.bind(dst, zero);
            return Ok(Flow::Next);
        }

        if can_inline(func) {
            if func.params.len() != args.len() {
                return Err(FaultKind::ArityMismatch {
                    callee: qualified,
                    expected: func.params.len(),
                    found: args.len(),
                }
                .into());
            }
            let mut params = SmallVec::<[(ValueId, Value); 4]>::with_capacity(args.len());
            for (param, arg) in func.params.iter().zip(args) {
                params.push((param.var, self.resolve(arg, frame)?));
            }
            let result = self.inline(id, &qualified, params)?;
            frame.bind(dst, result);
            return Ok(Flow::Next);
        }

        if func.origin == FunctionOrigin::Synthetic
            || self.config.is_init_marker(program.name(func.name))
        {
            return Ok(Flow::Boundary);
        }

        Err(FaultKind::UnsupportedCall(qualified).into())
    }

    fn inline(
        &mut self,
        id: FuncId,
        qualified: &str,
        params: SmallVec<[(ValueId, Value); 4]>,
    ) -> Result<Value, Failure> {
        if self.depth >= self.config.max_inline_depth {
            return Err(FaultKind::InlineDepthExceeded(self.config.max_inline_depth).into());
        }
        let program = self.program;
        let func = program.function(id);
        let Some(body) = func.entry() else {
            return Err(FaultKind::CalleeNotConsumed(qualified.to_owned()).into());
        };

        let mut callee_frame = Frame::for_call(params, func.results.len());
        let span = tracing::debug_span!("inline", callee = qualified, depth = self.depth + 1);
        let _guard = span.enter();

        self.depth += 1;
        let outcome = ensure_sufficient_stack(|| self.interpret(&body.instrs, &mut callee_frame));
        self.depth -= 1;

        match outcome {
            Ok(consumed) if consumed == body.instrs.len() => {}
            Ok(_) => return Err(FaultKind::CalleeNotConsumed(qualified.to_owned()).into()),
            Err(Halt::SkipForeign { .. }) => return Err(Failure::Foreign),
            Err(Halt::Fault { fault, .. }) => return Err(Failure::Nested(fault)),
        }

        match callee_frame.results.into_iter().next() {
            Some(Some(value)) => Ok(value),
            _ => Err(FaultKind::MissingResult(qualified.to_owned()).into()),
        }
    }

    // ── Stores ──────────────────────────────────────────────────────

    fn store_to(
        &mut self,
        addr: &Operand,
        value: &Operand,
        frame: &Frame,
    ) -> Result<Flow, Failure> {
        match addr {
            Operand::Global(id) => {
                if self.is_foreign(*id) {
                    return Err(Failure::Foreign);
                }
                let value = self.resolve(value, frame)?;
                let value = self.store.heap_mut().copy_value(value);
                self.store.store(*id, value);
            }
            Operand::Var(var) => {
                let Some(target) = frame.get(*var).cloned() else {
                    return Ok(Flow::Boundary);
                };
                let value = self.resolve(value, frame)?;
                let value = self.store.heap_mut().copy_value(value);
                match target {
                    Value::Global(id) => {
                        self.store.store(id, value);
                    }
                    Value::Pointer {
                        target: Some(slot), ..
                    } => {
                        self.store.heap_mut().assign(slot, value);
                    }
                    Value::Pointer { target: None, .. } => {
                        return Err(FaultKind::NilDereference.into());
                    }
                    other => return Err(FaultKind::NotAPointer(other.shape_name()).into()),
                }
            }
            Operand::Const(_) | Operand::Func(_) => return Ok(Flow::Boundary),
        }
        Ok(Flow::Next)
    }

    // ── Helpers ─────────────────────────────────────────────────────

    /// Resolve an operand to a value.
    ///
    /// Globals are materialized on first reference; foreign-bridging
    /// globals are never materialized and abort the instruction instead.
    fn resolve(&mut self, operand: &Operand, frame: &Frame) -> Result<Value, Failure> {
        match operand {
            Operand::Const(c) => Ok(Value::Const(c.clone())),
            Operand::Func(id) => Ok(Value::Function {
                ty: self.program.function(*id).signature,
                func: Some(*id),
            }),
            Operand::Global(id) => {
                if self.is_foreign(*id) {
                    return Err(Failure::Foreign);
                }
                self.store.materialize(self.program, *id)?;
                Ok(Value::Global(*id))
            }
            Operand::Var(var) => frame.get(*var).cloned().ok_or_else(|| {
                FaultKind::UnknownValue(self.program.display_operand(operand).to_string()).into()
            }),
        }
    }

    fn is_foreign(&self, id: GlobalId) -> bool {
        let global = self.program.global(id);
        self.config.is_foreign(self.program.name(global.name))
    }

    /// The slot an address value points at.
    fn pointee_slot(&mut self, address: &Value) -> Result<SlotId, FaultKind> {
        match address {
            Value::Global(id) => self.store.materialize(self.program, *id),
            Value::Pointer {
                target: Some(slot), ..
            } => Ok(*slot),
            Value::Pointer { target: None, .. }
            | Value::Const(Const {
                lit: LitValue::Nil, ..
            }) => Err(FaultKind::NilDereference),
            other => Err(FaultKind::NotAPointer(other.shape_name())),
        }
    }

    fn pointee_type(&self, ty: Idx) -> Result<Idx, FaultKind> {
        self.program
            .types
            .pointee(ty)
            .ok_or_else(|| FaultKind::UnsupportedType(self.program.display_type(ty).to_string()))
    }

    /// A compile-time index, or `None` when the index is only known at run time.
    fn constant_index(&mut self, index: &Operand, frame: &Frame) -> Result<Option<u64>, Failure> {
        let value = self.resolve(index, frame)?;
        match value {
            Value::Const(Const {
                lit: LitValue::Int(i),
                ..
            }) if i < 0 => Err(FaultKind::NegativeIndex(i).into()),
            Value::Const(c) => Ok(c.lit.as_index()),
            Value::Zero(ty) if self.program.types.basic(ty).is_some_and(BasicKind::is_integer) => {
                Ok(Some(0))
            }
            _ => Ok(None),
        }
    }

    fn string_of<'v>(&self, value: &'v Value) -> Result<&'v str, FaultKind> {
        match value {
            Value::Const(Const {
                lit: LitValue::Str(s),
                ..
            }) => Ok(s),
            Value::Zero(ty) if self.program.types.basic(*ty) == Some(BasicKind::String) => Ok(""),
            other => Err(FaultKind::NonConstantString(other.shape_name())),
        }
    }

    /// Pointer reinterpretation: `*T -> unsafe.Pointer`, `unsafe.Pointer -> *T`
    /// and `unsafe.Pointer -> uintptr`.
    fn convert(&self, to: Idx, from: Idx, value: Value) -> Result<Value, FaultKind> {
        let types = &self.program.types;
        match (types.basic(from), types.basic(to)) {
            (None, Some(BasicKind::UnsafePointer)) if types.pointee(from).is_some() => {
                Ok(Value::Bitcast {
                    ty: to,
                    inner: Box::new(value),
                })
            }
            (Some(BasicKind::UnsafePointer), None) if types.pointee(to).is_some() => {
                Ok(Value::Bitcast {
                    ty: to,
                    inner: Box::new(value),
                })
            }
            (Some(BasicKind::UnsafePointer), Some(BasicKind::Uintptr)) => Ok(Value::PtrToInt {
                inner: Box::new(value),
            }),
            _ => Err(FaultKind::UnsupportedConversion {
                from: self.program.display_type(from).to_string(),
                to: self.program.display_type(to).to_string(),
            }),
        }
    }
}
