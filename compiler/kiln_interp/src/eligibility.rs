//! Which functions may be inlined at compile time.

use kiln_ir::{Function, InstrKind};

/// A callee is inlinable when it is a single basic block with exactly
/// one result and every instruction in it is interpretable.
pub fn can_inline(func: &Function) -> bool {
    let [block] = func.blocks.as_slice() else {
        return false;
    };
    func.results.len() == 1 && block.instrs.iter().all(|instr| is_inlinable(instr.kind()))
}

/// Instructions allowed inside an inlined callee.
///
/// Calls and binary operations are deliberately absent: top-level blocks
/// may use them, callee bodies may not.
pub fn is_inlinable(kind: InstrKind) -> bool {
    match kind {
        InstrKind::Alloc
        | InstrKind::Convert
        | InstrKind::DebugRef
        | InstrKind::FieldAddr
        | InstrKind::IndexAddr
        | InstrKind::MakeInterface
        | InstrKind::MakeMap
        | InstrKind::MapUpdate
        | InstrKind::Return
        | InstrKind::Slice
        | InstrKind::Store
        | InstrKind::UnOp => true,
        InstrKind::BinOp
        | InstrKind::Call
        | InstrKind::If
        | InstrKind::Jump
        | InstrKind::Phi
        | InstrKind::Panic
        | InstrKind::Go
        | InstrKind::MakeClosure
        | InstrKind::MakeSlice
        | InstrKind::Extract
        | InstrKind::Lookup
        | InstrKind::TypeAssert
        | InstrKind::ChangeType
        | InstrKind::Field
        | InstrKind::Index => false,
    }
}

#[cfg(test)]
mod tests {
    use kiln_ir::{
        Block, BlockId, Callee, Const, FuncId, FunctionOrigin, Idx, Instr, Name, Operand,
        Program, ValueId,
    };

    use super::*;

    fn function(results: Vec<Idx>, blocks: Vec<Vec<Instr>>) -> Function {
        Function {
            name: Name::EMPTY,
            package: None,
            origin: FunctionOrigin::Source,
            signature: Idx::NONE,
            params: vec![],
            results,
            blocks: blocks
                .into_iter()
                .enumerate()
                .map(|(i, instrs)| Block::new(BlockId::new(u32::try_from(i).unwrap_or(0)), instrs))
                .collect(),
        }
    }

    fn ret() -> Instr {
        Instr::Return {
            results: vec![Const::int(1).into()],
        }
    }

    #[test]
    fn single_block_single_result() {
        let f = function(vec![Idx::INT], vec![vec![ret()]]);
        assert!(can_inline(&f));
    }

    #[test]
    fn alloc_store_return_body() {
        // func() *int { p := new(int); *p = 7; return p }
        let mut p = Program::new();
        let ptr = p.types.pointer(Idx::INT);
        let body = vec![
            Instr::Alloc {
                dst: ValueId::new(0),
                ty: ptr,
            },
            Instr::Store {
                addr: Operand::var(0),
                value: Const::int(7).into(),
            },
            Instr::Return {
                results: vec![Operand::var(0)],
            },
        ];
        assert!(can_inline(&function(vec![ptr], vec![body])));
    }

    #[test]
    fn rejects_multiple_blocks() {
        let f = function(vec![Idx::INT], vec![vec![ret()], vec![ret()]]);
        assert!(!can_inline(&f));
    }

    #[test]
    fn rejects_no_blocks() {
        let f = function(vec![Idx::INT], vec![]);
        assert!(!can_inline(&f));
    }

    #[test]
    fn rejects_result_count_other_than_one() {
        assert!(!can_inline(&function(vec![], vec![vec![ret()]])));
        assert!(!can_inline(&function(
            vec![Idx::INT, Idx::INT],
            vec![vec![ret()]]
        )));
    }

    #[test]
    fn rejects_call_and_binop_in_body() {
        let call = Instr::Call {
            dst: ValueId::new(0),
            ty: Idx::INT,
            callee: Callee::Static(FuncId::new(0)),
            args: vec![],
        };
        assert!(!can_inline(&function(vec![Idx::INT], vec![vec![call, ret()]])));

        let binop = Instr::BinOp {
            dst: ValueId::new(0),
            ty: Idx::STRING,
            op: kiln_ir::BinaryOp::Add,
            x: Const::string("a").into(),
            y: Operand::var(1),
        };
        assert!(!can_inline(&function(vec![Idx::INT], vec![vec![binop, ret()]])));
    }

    #[test]
    fn whitelist() {
        assert!(is_inlinable(InstrKind::Store));
        assert!(is_inlinable(InstrKind::MapUpdate));
        assert!(!is_inlinable(InstrKind::Phi));
        assert!(!is_inlinable(InstrKind::Index));
    }
}
