//! Block reduction.

use kiln_ir::{Instr, Program};

use crate::config::InterpConfig;
use crate::error::Fault;
use crate::globals::GlobalStore;
use crate::interp::{Frame, Halt, Interpreter};

/// Instruction counts for one or more reduced blocks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ReduceStats {
    /// Instructions evaluated at compile time and removed.
    pub consumed: usize,
    /// Foreign-bridging instructions dropped without evaluation.
    pub skipped: usize,
    /// Instructions left for runtime initialization.
    pub residual: usize,
}

impl ReduceStats {
    pub fn merge(&mut self, other: ReduceStats) {
        self.consumed += other.consumed;
        self.skipped += other.skipped;
        self.residual += other.residual;
    }
}

/// Evaluate as much of `block` as possible, leaving only the residual
/// suffix in place.
///
/// Foreign-bridging instructions are dropped one at a time and
/// interpretation resumes after them with the same register environment.
/// On a fault the block keeps the faulting instruction and everything
/// after it.
pub fn reduce(
    program: &Program,
    store: &mut GlobalStore,
    config: &InterpConfig,
    block: &mut Vec<Instr>,
) -> Result<ReduceStats, Fault> {
    let mut interp = Interpreter::new(program, store, config);
    let mut frame = Frame::new();
    let mut stats = ReduceStats::default();

    loop {
        match interp.interpret(block, &mut frame) {
            Ok(boundary) => {
                block.drain(..boundary);
                stats.consumed += boundary;
                stats.residual = block.len();
                tracing::debug!(
                    consumed = stats.consumed,
                    skipped = stats.skipped,
                    residual = stats.residual,
                    "reduced block"
                );
                return Ok(stats);
            }
            Err(Halt::SkipForeign { index }) => {
                tracing::trace!(
                    instr = %program.display_instr(&block[index]),
                    "skipping foreign-bridging instruction"
                );
                block.drain(..=index);
                stats.consumed += index;
                stats.skipped += 1;
            }
            Err(Halt::Fault { index, fault }) => {
                block.drain(..index);
                stats.consumed += index;
                stats.residual = block.len();
                tracing::debug!(%fault, consumed = stats.consumed, "reduction faulted");
                return Err(fault);
            }
        }
    }
}
