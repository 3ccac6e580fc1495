//! One evaluation pass over a program's initializers.

use kiln_ir::{FuncId, Instr, Program};

use crate::config::InterpConfig;
use crate::driver::{reduce, ReduceStats};
use crate::error::Fault;
use crate::globals::GlobalStore;
use crate::image::{export, Image};

/// Owns the global store for one compilation and reduces init blocks
/// against it.
///
/// Blocks are reduced in the order the caller presents them; values
/// stored by an earlier block are visible to later ones.
#[derive(Debug, Default)]
pub struct InitEvaluator {
    store: GlobalStore,
    config: InterpConfig,
    totals: ReduceStats,
    blocks: usize,
}

impl InitEvaluator {
    pub fn new(config: InterpConfig) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    /// Reduce `block` in place, returning its statistics.
    pub fn reduce_block(
        &mut self,
        program: &Program,
        block: &mut Vec<Instr>,
    ) -> Result<ReduceStats, Fault> {
        let outcome = reduce(program, &mut self.store, &self.config, block);
        self.blocks += 1;
        if let Ok(stats) = outcome {
            self.totals.merge(stats);
        }
        outcome
    }

    /// Reduce the entry block of the init function `id` in place.
    ///
    /// A function without blocks has nothing to reduce.
    pub fn reduce_init_function(
        &mut self,
        program: &mut Program,
        id: FuncId,
    ) -> Result<ReduceStats, Fault> {
        let Some(entry) = program.function_mut(id).entry_mut() else {
            return Ok(ReduceStats::default());
        };
        let mut instrs = std::mem::take(&mut entry.instrs);
        let _span =
            tracing::debug_span!("reduce_init", func = %program.function_name(id)).entered();
        let outcome = self.reduce_block(program, &mut instrs);
        if let Some(entry) = program.function_mut(id).entry_mut() {
            entry.instrs = instrs;
        }
        outcome
    }

    /// Static data for every global touched so far.
    pub fn export(&self) -> Image {
        export(&self.store)
    }

    pub fn store(&self) -> &GlobalStore {
        &self.store
    }

    pub fn config(&self) -> &InterpConfig {
        &self.config
    }

    /// Statistics summed over every successfully reduced block.
    pub fn totals(&self) -> ReduceStats {
        self.totals
    }

    /// Number of blocks reduced, including ones that faulted.
    pub fn blocks_reduced(&self) -> usize {
        self.blocks
    }

    pub fn into_store(self) -> GlobalStore {
        self.store
    }
}

#[cfg(test)]
mod tests {
    use kiln_ir::{Block, BlockId, Const, Function, FunctionOrigin, Idx, Operand};
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::test_helpers::{declare_global, int, store};
    use crate::value::Value;

    #[test]
    fn reduces_init_function_in_place() {
        let mut p = Program::new();
        let g = declare_global(&mut p, "x", Idx::INT);
        let name = p.intern("init");
        let sig = p.types.signature(vec![], vec![]);
        let id = p.add_function(Function {
            name,
            package: None,
            origin: FunctionOrigin::Synthetic,
            signature: sig,
            params: vec![],
            results: vec![],
            blocks: vec![Block::new(
                BlockId::new(0),
                vec![
                    store(Operand::Global(g), int(3)),
                    Instr::Panic {
                        x: Const::string("boom").into(),
                    },
                ],
            )],
        });

        let mut eval = InitEvaluator::new(InterpConfig::default());
        let stats = eval.reduce_init_function(&mut p, id);
        assert_eq!(
            stats,
            Ok(ReduceStats {
                consumed: 1,
                skipped: 0,
                residual: 1,
            })
        );
        let residual = p.function(id).entry().map(|b| b.instrs.len());
        assert_eq!(residual, Some(1));
        assert_eq!(
            eval.store().initializer(g),
            Some(&Value::Const(Const::int(3)))
        );
        assert_eq!(eval.blocks_reduced(), 1);
    }

    #[test]
    fn function_without_blocks_is_untouched() {
        let mut p = Program::new();
        let name = p.intern("external");
        let id = p.add_function(Function {
            name,
            package: None,
            origin: FunctionOrigin::Source,
            signature: Idx::NONE,
            params: vec![],
            results: vec![],
            blocks: vec![],
        });
        let mut eval = InitEvaluator::default();
        assert_eq!(eval.reduce_init_function(&mut p, id), Ok(ReduceStats::default()));
        assert_eq!(eval.blocks_reduced(), 0);
    }

    #[test]
    fn totals_accumulate_across_blocks() {
        let mut p = Program::new();
        let a = declare_global(&mut p, "a", Idx::INT);
        let b = declare_global(&mut p, "b", Idx::INT);
        let mut eval = InitEvaluator::new(InterpConfig::default().with_max_inline_depth(4));
        assert_eq!(eval.config().max_inline_depth, 4);

        let mut first = vec![store(Operand::Global(a), int(1))];
        let mut second = vec![
            store(Operand::Global(b), int(2)),
            store(Operand::Global(a), int(5)),
        ];
        assert!(eval.reduce_block(&p, &mut first).is_ok());
        assert!(eval.reduce_block(&p, &mut second).is_ok());
        assert_eq!(eval.totals().consumed, 3);
        assert_eq!(eval.totals().residual, 0);

        let globals = eval.into_store();
        assert_eq!(globals.initializer(a), Some(&Value::Const(Const::int(5))));
        assert_eq!(globals.len(), 2);
    }
}
