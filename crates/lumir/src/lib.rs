/*! Unified interface for the LumIR middle and back end.
 *
 * Single import for the whole pipeline: lowering a statement tree to IR,
 * optimizing it, and rendering either the textual IR or the x86_64-flavored
 * instruction stream.
 */

pub use lumir_core as core;
pub use lumir_emit as emit;
pub use lumir_transform as transform;

pub use lumir_core::{
    block::BasicBlock,
    function::Function,
    instructions::{Instruction, OpCode},
    module::Module,
    passes::{BlockPass, Optimizer},
    types::Type,
};

pub use lumir_emit::{annotate_module, lower, AsmEmitter, EmitterConfig};

pub use lumir_transform::{build_module, Expr, IrBuilder, Stmt};

/// Everything one compilation produces.
pub struct CompileOutput {
    /// The optimized module.
    pub module: Module,
    /// Its deterministic textual form.
    pub ir_text: String,
    /// The lowered x86_64-flavored instruction stream.
    pub asm: String,
}

/// Run the full pipeline: build IR from a statement tree, optimize it, and
/// lower it to assembly text.
pub fn compile(statements: &[Stmt]) -> CompileOutput {
    let module = build_module(statements);
    let module = lumir_core::passes::optimize(module);
    let ir_text = module.to_string();
    let asm = lower(&module);
    CompileOutput {
        module,
        ir_text,
        asm,
    }
}
