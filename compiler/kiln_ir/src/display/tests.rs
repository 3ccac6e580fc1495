use pretty_assertions::assert_eq;

use crate::{
    BinaryOp, Callee, Const, Field, FuncId, Function, FunctionOrigin, GlobalDecl, Idx, Instr,
    Operand, Program, UnaryOp, ValueId,
};

fn v(n: u32) -> ValueId {
    ValueId::new(n)
}

#[test]
fn type_spelling() {
    let mut p = Program::new();
    let name = p.intern("next");
    let point = p.intern("Point");
    let arr = p.types.array(Idx::INT, 4);
    let ptr = p.types.pointer(arr);
    let map = p.types.map(Idx::STRING, Idx::INT);
    let slice = p.types.slice(Idx::UINT8);
    let st = p.types.structure(vec![Field {
        name,
        ty: Idx::UINTPTR,
    }]);
    let named = p.types.named(point, st);
    let sig = p.types.signature(vec![Idx::INT, Idx::STRING], vec![Idx::BOOL]);
    let sig2 = p.types.signature(vec![], vec![Idx::INT, Idx::INT]);

    assert_eq!(p.display_type(ptr).to_string(), "*[4]int");
    assert_eq!(p.display_type(map).to_string(), "map[string]int");
    assert_eq!(p.display_type(slice).to_string(), "[]uint8");
    assert_eq!(p.display_type(st).to_string(), "struct{next uintptr}");
    assert_eq!(p.display_type(named).to_string(), "Point");
    assert_eq!(p.display_type(sig).to_string(), "func(int, string) bool");
    assert_eq!(p.display_type(sig2).to_string(), "func() (int, int)");
    assert_eq!(p.display_type(Idx::UNSAFE_POINTER).to_string(), "unsafe.Pointer");
}

#[test]
fn operand_spelling() {
    let mut p = Program::new();
    let pkg = p.intern("main");
    let name = p.intern("table");
    let g = p.add_global(GlobalDecl {
        name,
        package: Some(pkg),
        ty: Idx::INT,
    });

    assert_eq!(p.display_operand(&Operand::var(3)).to_string(), "%3");
    assert_eq!(p.display_operand(&Const::int(42).into()).to_string(), "42:int");
    assert_eq!(
        p.display_operand(&Const::string("a\"b").into()).to_string(),
        "\"a\\\"b\""
    );
    assert_eq!(
        p.display_operand(&Operand::Global(g)).to_string(),
        "@main.table"
    );
}

#[test]
fn instruction_spelling() {
    let mut p = Program::new();
    let int_ptr = p.types.pointer(Idx::INT);
    let pkg = p.intern("pkg");
    let name = p.intern("lookup");
    let sig = p.types.signature(vec![Idx::INT], vec![Idx::STRING]);
    let f = p.add_function(Function {
        name,
        package: Some(pkg),
        origin: FunctionOrigin::Source,
        signature: sig,
        params: vec![],
        results: vec![Idx::STRING],
        blocks: vec![],
    });
    assert_eq!(f, FuncId::new(0));

    let cases = vec![
        (
            Instr::Alloc {
                dst: v(1),
                ty: int_ptr,
            },
            "%1 = alloc : *int",
        ),
        (
            Instr::FieldAddr {
                dst: v(3),
                ty: int_ptr,
                x: Operand::var(1),
                field: 2,
            },
            "%3 = field_addr &%1.#2 : *int",
        ),
        (
            Instr::BinOp {
                dst: v(4),
                ty: Idx::STRING,
                op: BinaryOp::Add,
                x: Const::string("ab").into(),
                y: Operand::var(2),
            },
            "%4 = binop \"ab\" + %2 : string",
        ),
        (
            Instr::Call {
                dst: v(5),
                ty: Idx::STRING,
                callee: Callee::Static(f),
                args: vec![Const::int(7).into()],
            },
            "%5 = call pkg.lookup(7:int) : string",
        ),
        (
            Instr::UnOp {
                dst: v(6),
                ty: Idx::INT,
                op: UnaryOp::Deref,
                x: Operand::var(3),
                comma_ok: false,
            },
            "%6 = unop *%3 : int",
        ),
        (
            Instr::Store {
                addr: Operand::var(3),
                value: Operand::var(6),
            },
            "store *%3 = %6",
        ),
        (
            Instr::Slice {
                dst: v(7),
                ty: Idx::STRING,
                x: Operand::var(1),
                low: None,
                high: None,
                max: None,
            },
            "%7 = slice %1[:] : string",
        ),
        (
            Instr::Return {
                results: vec![Operand::var(5), Operand::var(6)],
            },
            "return %5, %6",
        ),
    ];

    for (instr, expected) in cases {
        assert_eq!(p.display_instr(&instr).to_string(), expected);
    }
}
