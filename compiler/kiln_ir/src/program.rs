//! Functions, globals and the program that owns them.

use crate::{BlockId, FuncId, GlobalId, Idx, Instr, Name, Pool, StringInterner, ValueId};

/// Where a function came from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FunctionOrigin {
    /// Declared in source code.
    Source,
    /// Generated by the front-end with no source declaration (wrappers,
    /// package initializers, thunks).
    Synthetic,
}

/// A function parameter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Param {
    /// The register bound to this parameter inside the body.
    pub var: ValueId,
    pub ty: Idx,
}

/// A basic block: a straight-line instruction sequence.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Block {
    pub id: BlockId,
    pub instrs: Vec<Instr>,
}

impl Block {
    pub fn new(id: BlockId, instrs: Vec<Instr>) -> Self {
        Self { id, instrs }
    }
}

/// A function body together with its signature.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Function {
    pub name: Name,
    /// Owning package, `None` for functions outside any package.
    pub package: Option<Name>,
    pub origin: FunctionOrigin,
    /// The function's signature type.
    pub signature: Idx,
    pub params: Vec<Param>,
    /// Declared result types, one per result.
    pub results: Vec<Idx>,
    /// Basic blocks; `blocks[0]` is the entry. Empty for external functions.
    pub blocks: Vec<Block>,
}

impl Function {
    pub fn entry(&self) -> Option<&Block> {
        self.blocks.first()
    }

    pub fn entry_mut(&mut self) -> Option<&mut Block> {
        self.blocks.first_mut()
    }
}

/// A program-level global variable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GlobalDecl {
    pub name: Name,
    pub package: Option<Name>,
    /// Type of the stored value (not a pointer to it).
    pub ty: Idx,
}

/// A whole program: names, types, functions and globals.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Program {
    pub interner: StringInterner,
    pub types: Pool,
    functions: Vec<Function>,
    globals: Vec<GlobalDecl>,
}

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Intern a name in this program's interner.
    pub fn intern(&mut self, s: &str) -> Name {
        self.interner.intern(s)
    }

    /// Resolve a name to its text.
    pub fn name(&self, name: Name) -> &str {
        self.interner.lookup(name)
    }

    pub fn add_function(&mut self, function: Function) -> FuncId {
        let raw = u32::try_from(self.functions.len())
            .unwrap_or_else(|_| panic!("function count exceeds u32::MAX"));
        self.functions.push(function);
        FuncId::new(raw)
    }

    pub fn add_global(&mut self, global: GlobalDecl) -> GlobalId {
        let raw = u32::try_from(self.globals.len())
            .unwrap_or_else(|_| panic!("global count exceeds u32::MAX"));
        self.globals.push(global);
        GlobalId::new(raw)
    }

    /// # Panics
    /// Panics if `id` was not produced by this program.
    pub fn function(&self, id: FuncId) -> &Function {
        &self.functions[id.index()]
    }

    /// # Panics
    /// Panics if `id` was not produced by this program.
    pub fn function_mut(&mut self, id: FuncId) -> &mut Function {
        &mut self.functions[id.index()]
    }

    /// # Panics
    /// Panics if `id` was not produced by this program.
    pub fn global(&self, id: GlobalId) -> &GlobalDecl {
        &self.globals[id.index()]
    }

    pub fn functions(&self) -> impl Iterator<Item = (FuncId, &Function)> {
        (0u32..).map(FuncId::new).zip(self.functions.iter())
    }

    pub fn globals(&self) -> impl Iterator<Item = (GlobalId, &GlobalDecl)> {
        (0u32..).map(GlobalId::new).zip(self.globals.iter())
    }

    /// `pkg.name`, or just `name` outside any package.
    pub fn qualify(&self, package: Option<Name>, name: Name) -> String {
        match package {
            Some(pkg) => format!("{}.{}", self.name(pkg), self.name(name)),
            None => self.name(name).to_owned(),
        }
    }

    pub fn function_name(&self, id: FuncId) -> String {
        let f = self.function(id);
        self.qualify(f.package, f.name)
    }

    pub fn global_name(&self, id: GlobalId) -> String {
        let g = self.global(id);
        self.qualify(g.package, g.name)
    }

    /// Find a function by its qualified name.
    pub fn find_function(&self, qualified: &str) -> Option<FuncId> {
        self.functions()
            .find(|(_, f)| self.qualify(f.package, f.name) == qualified)
            .map(|(id, _)| id)
    }

    /// Find a global by its qualified name.
    pub fn find_global(&self, qualified: &str) -> Option<GlobalId> {
        self.globals()
            .find(|(_, g)| self.qualify(g.package, g.name) == qualified)
            .map(|(id, _)| id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn empty_function(program: &mut Program, pkg: &str, name: &str) -> Function {
        let package = Some(program.intern(pkg));
        let name = program.intern(name);
        let signature = program.types.signature(vec![], vec![]);
        Function {
            name,
            package,
            origin: FunctionOrigin::Source,
            signature,
            params: vec![],
            results: vec![],
            blocks: vec![],
        }
    }

    #[test]
    fn ids_are_sequential() {
        let mut program = Program::new();
        let f = empty_function(&mut program, "main", "f");
        let g = empty_function(&mut program, "main", "g");
        assert_eq!(program.add_function(f), FuncId::new(0));
        assert_eq!(program.add_function(g), FuncId::new(1));
    }

    #[test]
    fn qualified_lookup() {
        let mut program = Program::new();
        let f = empty_function(&mut program, "syscall", "runtime_envs");
        let id = program.add_function(f);
        let name = program.intern("x");
        let global = program.add_global(GlobalDecl {
            name,
            package: None,
            ty: Idx::INT,
        });

        assert_eq!(program.function_name(id), "syscall.runtime_envs");
        assert_eq!(program.find_function("syscall.runtime_envs"), Some(id));
        assert_eq!(program.find_function("runtime_envs"), None);
        assert_eq!(program.global_name(global), "x");
        assert_eq!(program.find_global("x"), Some(global));
    }

    #[test]
    fn entry_block_is_first() {
        let mut program = Program::new();
        let mut f = empty_function(&mut program, "main", "f");
        assert!(f.entry().is_none());
        f.blocks.push(Block::new(BlockId::new(0), vec![]));
        f.blocks.push(Block::new(BlockId::new(1), vec![]));
        assert_eq!(f.entry().map(|b| b.id), Some(BlockId::new(0)));
    }
}
