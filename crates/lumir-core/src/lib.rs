/*! Core IR types and passes for the LumIR compiler middle end.
 *
 * A compiled program is a `Module` of `Function`s, each a graph of named
 * `BasicBlock`s holding `Instruction`s that reference each other by name.
 * This crate owns that data model, its deterministic textual form, the
 * well-formedness checks, and the per-block optimization pipeline.
 */

pub mod block;
pub mod format;
pub mod function;
pub mod instructions;
pub mod module;
pub mod passes;
pub mod persist;
pub mod types;

pub use block::BasicBlock;
pub use format::{format_block, format_function, format_module};
pub use function::Function;
pub use instructions::{Instruction, OpCode};
pub use module::Module;
pub use passes::{BlockPass, Optimizer};
pub use types::Type;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IrError {
    #[error("block {block} in @{function} has no terminator")]
    MissingTerminator { function: String, block: String },
    #[error("instruction after terminator in block {block} of @{function}")]
    InstructionAfterTerminator { function: String, block: String },
    #[error("duplicate instruction name {name} in @{function}")]
    DuplicateName { function: String, name: String },
    #[error("function @{0} has no blocks")]
    EmptyFunction(String),
    #[error("persist error: {0}")]
    Persist(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, IrError>;
