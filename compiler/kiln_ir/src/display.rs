//! Textual rendering of types, operands and instructions.
//!
//! Rendering needs the [`Program`] to resolve names and type shapes, so
//! each renderer is a small wrapper borrowing the program:
//!
//! ```text
//! %3 = field_addr &%1.#2 : *int
//! store *@main.table = %7
//! %9 = call pkg.lookup(%3, "key") : string
//! ```

use std::fmt::{self, Write as _};

use crate::{Callee, Const, Idx, Instr, LitValue, Operand, Program, TypeKind};

impl Program {
    pub fn display_type(&self, ty: Idx) -> TypeDisplay<'_> {
        TypeDisplay { program: self, ty }
    }

    pub fn display_operand<'a>(&'a self, operand: &'a Operand) -> OperandDisplay<'a> {
        OperandDisplay {
            program: self,
            operand,
        }
    }

    pub fn display_instr<'a>(&'a self, instr: &'a Instr) -> InstrDisplay<'a> {
        InstrDisplay {
            program: self,
            instr,
        }
    }
}

/// Go-like spelling of a type.
pub struct TypeDisplay<'a> {
    program: &'a Program,
    ty: Idx,
}

impl fmt::Display for TypeDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.program;
        let Some(kind) = p.types.get(self.ty) else {
            return write!(f, "{}", self.ty);
        };
        match kind {
            TypeKind::Basic(basic) => f.write_str(basic.name()),
            TypeKind::Pointer(elem) => write!(f, "*{}", p.display_type(*elem)),
            TypeKind::Array { elem, len } => write!(f, "[{len}]{}", p.display_type(*elem)),
            TypeKind::Slice(elem) => write!(f, "[]{}", p.display_type(*elem)),
            TypeKind::Map { key, value } => write!(
                f,
                "map[{}]{}",
                p.display_type(*key),
                p.display_type(*value)
            ),
            TypeKind::Struct(fields) => {
                f.write_str("struct{")?;
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    write!(f, "{} {}", p.name(field.name), p.display_type(field.ty))?;
                }
                f.write_char('}')
            }
            TypeKind::Interface(methods) => {
                f.write_str("interface{")?;
                for (i, method) in methods.iter().enumerate() {
                    if i > 0 {
                        f.write_str("; ")?;
                    }
                    f.write_str(p.name(*method))?;
                }
                f.write_char('}')
            }
            TypeKind::Signature { params, results } => {
                f.write_str("func")?;
                write_type_list(f, p, params)?;
                match results.as_slice() {
                    [] => Ok(()),
                    [single] => write!(f, " {}", p.display_type(*single)),
                    many => {
                        f.write_char(' ')?;
                        write_type_list(f, p, many)
                    }
                }
            }
            TypeKind::Named { name, .. } => f.write_str(p.name(*name)),
            TypeKind::Tuple(elems) => write_type_list(f, p, elems),
            TypeKind::Chan(elem) => write!(f, "chan {}", p.display_type(*elem)),
        }
    }
}

fn write_type_list(f: &mut fmt::Formatter<'_>, p: &Program, types: &[Idx]) -> fmt::Result {
    f.write_char('(')?;
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            f.write_str(", ")?;
        }
        write!(f, "{}", p.display_type(*ty))?;
    }
    f.write_char(')')
}

/// Rendering of a single operand: `%3`, `42:int`, `"s"`, `@pkg.global`, `pkg.func`.
pub struct OperandDisplay<'a> {
    program: &'a Program,
    operand: &'a Operand,
}

impl fmt::Display for OperandDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.program;
        match self.operand {
            Operand::Var(v) => write!(f, "%{}", v.raw()),
            Operand::Const(c) => write_const(f, p, c),
            Operand::Global(g) => write!(f, "@{}", p.global_name(*g)),
            Operand::Func(func) => f.write_str(&p.function_name(*func)),
        }
    }
}

fn write_const(f: &mut fmt::Formatter<'_>, p: &Program, c: &Const) -> fmt::Result {
    match &c.lit {
        LitValue::Bool(b) => write!(f, "{b}"),
        LitValue::Int(v) => write!(f, "{v}:{}", p.display_type(c.ty)),
        LitValue::Uint(v) => write!(f, "{v}:{}", p.display_type(c.ty)),
        LitValue::Float(bits) => write!(f, "{}:{}", f64::from_bits(*bits), p.display_type(c.ty)),
        LitValue::Str(s) => write!(f, "{s:?}"),
        LitValue::Nil => write!(f, "nil:{}", p.display_type(c.ty)),
    }
}

/// Rendering of one instruction, as used in fault messages.
pub struct InstrDisplay<'a> {
    program: &'a Program,
    instr: &'a Instr,
}

impl InstrDisplay<'_> {
    fn operand<'b>(&'b self, operand: &'b Operand) -> OperandDisplay<'b> {
        self.program.display_operand(operand)
    }

    fn operands(&self, f: &mut fmt::Formatter<'_>, operands: &[Operand]) -> fmt::Result {
        for (i, operand) in operands.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", self.operand(operand))?;
        }
        Ok(())
    }

    fn callee(&self, f: &mut fmt::Formatter<'_>, callee: &Callee, args: &[Operand]) -> fmt::Result {
        match callee {
            Callee::Static(func) => f.write_str(&self.program.function_name(*func))?,
            Callee::Dynamic(value) => write!(f, "{}", self.operand(value))?,
            Callee::Invoke { recv, method } => {
                write!(f, "invoke {}.{}", self.operand(recv), self.program.name(*method))?;
            }
        }
        f.write_char('(')?;
        self.operands(f, args)?;
        f.write_char(')')
    }
}

impl fmt::Display for InstrDisplay<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.program;
        let mnemonic = self.instr.kind().mnemonic();
        if let Some(dst) = self.instr.defined_var() {
            write!(f, "%{} = ", dst.raw())?;
        }
        f.write_str(mnemonic)?;
        if !matches!(
            self.instr,
            Instr::Alloc { .. } | Instr::MakeMap { reserve: None, .. }
        ) {
            f.write_char(' ')?;
        }

        match self.instr {
            Instr::Alloc { .. } | Instr::MakeMap { reserve: None, .. } => {}
            Instr::MakeMap {
                reserve: Some(n), ..
            } => write!(f, "reserve {}", self.operand(n))?,
            Instr::BinOp { op, x, y, .. } => write!(
                f,
                "{} {} {}",
                self.operand(x),
                op.symbol(),
                self.operand(y)
            )?,
            Instr::Call { callee, args, .. } | Instr::Go { callee, args } => {
                self.callee(f, callee, args)?;
            }
            Instr::Convert { x, .. }
            | Instr::MakeInterface { x, .. }
            | Instr::ChangeType { x, .. }
            | Instr::DebugRef { x }
            | Instr::Panic { x } => write!(f, "{}", self.operand(x))?,
            Instr::FieldAddr { x, field, .. } => write!(f, "&{}.#{field}", self.operand(x))?,
            Instr::Field { x, field, .. } => write!(f, "{}.#{field}", self.operand(x))?,
            Instr::IndexAddr { x, index, .. } => {
                write!(f, "&{}[{}]", self.operand(x), self.operand(index))?;
            }
            Instr::Index { x, index, .. } => {
                write!(f, "{}[{}]", self.operand(x), self.operand(index))?;
            }
            Instr::Lookup {
                x, index, comma_ok, ..
            } => {
                write!(f, "{}[{}]", self.operand(x), self.operand(index))?;
                if *comma_ok {
                    f.write_str(",ok")?;
                }
            }
            Instr::MapUpdate { map, key, value } => write!(
                f,
                "{}[{}] = {}",
                self.operand(map),
                self.operand(key),
                self.operand(value)
            )?,
            Instr::Return { results } | Instr::Phi { edges: results, .. } => {
                self.operands(f, results)?;
            }
            Instr::Slice {
                x, low, high, max, ..
            } => {
                write!(f, "{}[", self.operand(x))?;
                if let Some(low) = low {
                    write!(f, "{}", self.operand(low))?;
                }
                f.write_char(':')?;
                if let Some(high) = high {
                    write!(f, "{}", self.operand(high))?;
                }
                if let Some(max) = max {
                    write!(f, ":{}", self.operand(max))?;
                }
                f.write_char(']')?;
            }
            Instr::Store { addr, value } => {
                write!(f, "*{} = {}", self.operand(addr), self.operand(value))?;
            }
            Instr::UnOp { op, x, comma_ok, .. } => {
                write!(f, "{}{}", op.symbol(), self.operand(x))?;
                if *comma_ok {
                    f.write_str(",ok")?;
                }
            }
            Instr::If {
                cond,
                then_block,
                else_block,
            } => write!(
                f,
                "{} goto b{} else b{}",
                self.operand(cond),
                then_block.raw(),
                else_block.raw()
            )?,
            Instr::Jump { target } => write!(f, "b{}", target.raw())?,
            Instr::MakeClosure { func, bindings, .. } => {
                write!(f, "{} [", p.function_name(*func))?;
                self.operands(f, bindings)?;
                f.write_char(']')?;
            }
            Instr::MakeSlice { len, cap, .. } => {
                write!(f, "{}, {}", self.operand(len), self.operand(cap))?;
            }
            Instr::Extract { tuple, index, .. } => write!(f, "{} #{index}", self.operand(tuple))?,
            Instr::TypeAssert {
                x,
                asserted,
                comma_ok,
                ..
            } => {
                write!(f, "{}.({})", self.operand(x), p.display_type(*asserted))?;
                if *comma_ok {
                    f.write_str(",ok")?;
                }
            }
        }

        if let Some(ty) = self.instr.result_type() {
            write!(f, " : {}", p.display_type(ty))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests;
