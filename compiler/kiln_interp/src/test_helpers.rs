//! IR factories shared by the unit tests.

use kiln_ir::{
    Block, BlockId, Callee, Const, FuncId, Function, FunctionOrigin, GlobalDecl, GlobalId, Idx,
    Instr, Operand, Param, Program, UnaryOp, ValueId,
};

use crate::config::InterpConfig;
use crate::driver::{reduce, ReduceStats};
use crate::error::Fault;
use crate::globals::GlobalStore;

pub(crate) fn v(n: u32) -> ValueId {
    ValueId::new(n)
}

pub(crate) fn int(n: i64) -> Operand {
    Const::int(n).into()
}

pub(crate) fn string(s: &str) -> Operand {
    Const::string(s).into()
}

/// Declare `main.<name>` with value type `ty`.
pub(crate) fn declare_global(p: &mut Program, name: &str, ty: Idx) -> GlobalId {
    let package = Some(p.intern("main"));
    let name = p.intern(name);
    p.add_global(GlobalDecl { name, package, ty })
}

/// Declare a single-block source function `main.<name>`.
pub(crate) fn declare_func(
    p: &mut Program,
    name: &str,
    params: &[(u32, Idx)],
    results: &[Idx],
    body: Vec<Instr>,
) -> FuncId {
    let package = Some(p.intern("main"));
    let name = p.intern(name);
    let signature = p.types.signature(
        params.iter().map(|&(_, ty)| ty).collect(),
        results.to_vec(),
    );
    p.add_function(Function {
        name,
        package,
        origin: FunctionOrigin::Source,
        signature,
        params: params
            .iter()
            .map(|&(var, ty)| Param { var: v(var), ty })
            .collect(),
        results: results.to_vec(),
        blocks: vec![Block::new(BlockId::new(0), body)],
    })
}

/// Declare a body-less function in package `pkg`.
pub(crate) fn declare_extern(
    p: &mut Program,
    pkg: &str,
    name: &str,
    origin: FunctionOrigin,
    results: &[Idx],
) -> FuncId {
    let package = Some(p.intern(pkg));
    let name = p.intern(name);
    let signature = p.types.signature(vec![], results.to_vec());
    p.add_function(Function {
        name,
        package,
        origin,
        signature,
        params: vec![],
        results: results.to_vec(),
        blocks: vec![],
    })
}

pub(crate) fn alloc(dst: u32, ty: Idx) -> Instr {
    Instr::Alloc { dst: v(dst), ty }
}

pub(crate) fn store(addr: Operand, value: Operand) -> Instr {
    Instr::Store { addr, value }
}

pub(crate) fn deref(dst: u32, ty: Idx, x: Operand) -> Instr {
    Instr::UnOp {
        dst: v(dst),
        ty,
        op: UnaryOp::Deref,
        x,
        comma_ok: false,
    }
}

pub(crate) fn field_addr(dst: u32, ty: Idx, x: Operand, field: u32) -> Instr {
    Instr::FieldAddr {
        dst: v(dst),
        ty,
        x,
        field,
    }
}

pub(crate) fn index_addr(dst: u32, ty: Idx, x: Operand, index: Operand) -> Instr {
    Instr::IndexAddr {
        dst: v(dst),
        ty,
        x,
        index,
    }
}

pub(crate) fn call(dst: u32, ty: Idx, func: FuncId, args: Vec<Operand>) -> Instr {
    Instr::Call {
        dst: v(dst),
        ty,
        callee: Callee::Static(func),
        args,
    }
}

pub(crate) fn ret(result: Operand) -> Instr {
    Instr::Return {
        results: vec![result],
    }
}

/// Outcome of reducing one block against a fresh store.
pub(crate) struct Run {
    pub residual: Vec<Instr>,
    pub outcome: Result<ReduceStats, Fault>,
    pub store: GlobalStore,
}

pub(crate) fn run(p: &Program, block: Vec<Instr>) -> Run {
    run_with(p, &InterpConfig::default(), block)
}

pub(crate) fn run_with(p: &Program, config: &InterpConfig, mut block: Vec<Instr>) -> Run {
    let mut store = GlobalStore::new();
    let outcome = reduce(p, &mut store, config, &mut block);
    Run {
        residual: block,
        outcome,
        store,
    }
}
