//! Compile-time interpreter for global initializers.
//!
//! Given the init block of a package, this crate evaluates as much of it
//! as possible during compilation so the results can be emitted as
//! initialized static data instead of code that runs at boot:
//!
//! ```text
//! %1 = alloc : *[4]int              ─┐
//! %2 = index_addr &%1[2:int] : *int  │  evaluated, removed
//! store *%2 = 7:int                  │
//! store *@main.table = ...          ─┘
//! %5 = call main.read(%3) : int      ← not inlinable: residual from here on
//! ```
//!
//! # Architecture
//!
//! - **Values** (`value`): a closed [`Value`] enum over a slot [`Heap`].
//!   Pointers, slices and aggregates hold slot handles, so aliasing works
//!   without references into the heap.
//! - **Zero values** (`zero`): type-directed default construction.
//! - **Globals** (`globals`): [`GlobalStore`] with lazy, once-only
//!   materialization.
//! - **Eligibility** (`eligibility`): which callees may be inlined.
//! - **Interpreter** (`interp`): per-instruction evaluation, boundaries
//!   and faults.
//! - **Driver** (`driver`): [`reduce`] a block down to its residual suffix.
//! - **Session** (`session`): [`InitEvaluator`] owning the store across
//!   blocks.
//! - **Export** (`image`): [`Image`] of [`StaticValue`]s for the code
//!   generator.
//!
//! # Debug Environment Variables
//!
//! - `RUST_LOG=kiln_interp=debug`: one event per reduced block and export.
//! - `RUST_LOG=kiln_interp=trace`: every interpreted instruction.
//! - `KILN_MAX_INLINE_DEPTH`: override the inlining depth limit
//!   (see [`InterpConfig::from_env`]).

mod config;
mod driver;
mod eligibility;
mod error;
mod globals;
mod image;
mod interp;
mod session;
mod stack;
mod value;
mod zero;

#[cfg(test)]
mod test_helpers;

use std::sync::Once;

pub use config::{InterpConfig, DEFAULT_MAX_INLINE_DEPTH, MAX_INLINE_DEPTH_VAR};
pub use driver::{reduce, ReduceStats};
pub use eligibility::{can_inline, is_inlinable};
pub use error::{Fault, FaultKind};
pub use globals::GlobalStore;
pub use image::{export, Address, Image, Root, StaticValue, StaticValueDisplay};
pub use interp::{Frame, Halt, Interpreter};
pub use session::InitEvaluator;
pub use value::{Heap, MapId, MapTable, SlotId, Value};
pub use zero::zero_value;

static TRACING_INIT: Once = Once::new();

/// Install a `tracing` subscriber filtered by `RUST_LOG`.
///
/// Does nothing when `RUST_LOG` is unset, and only runs once per process.
pub fn init_tracing() {
    TRACING_INIT.call_once(|| {
        use tracing_subscriber::{fmt, prelude::*, EnvFilter};

        if std::env::var("RUST_LOG").is_ok() {
            let filter = EnvFilter::from_default_env();
            tracing_subscriber::registry()
                .with(fmt::layer().with_target(true).with_level(true))
                .with(filter)
                .init();
        }
    });
}
