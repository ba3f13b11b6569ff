/*! Per-basic-block optimization passes.
 *
 * The optimizer takes ownership of a `Module`, runs a fixed pass sequence
 * over every block of every function, and hands the `Module` back. Passes
 * are best-effort and semantics-preserving: a rewrite that cannot be proven
 * safe is skipped, and no pass has an error channel.
 */

mod dce;
mod fold;
mod simplify;

pub use dce::DeadCodeElimination;
pub use fold::ConstantFolding;
pub use simplify::SimplifyExpressions;

use crate::block::BasicBlock;
use crate::instructions::Instruction;
use crate::module::Module;
use std::collections::HashMap;

/// A transformation local to one basic block. Implementations must keep the
/// terminator last, keep instruction names unique, and keep every name that
/// is still referenced in the block resolvable.
pub trait BlockPass {
    fn name(&self) -> &'static str;

    fn run_on_block(&mut self, block: &mut BasicBlock);
}

pub struct Optimizer {
    passes: Vec<Box<dyn BlockPass>>,
}

impl Optimizer {
    /// The standard pipeline: fold, simplify, then sweep dead code.
    pub fn new() -> Self {
        Self {
            passes: vec![
                Box::new(ConstantFolding),
                Box::new(SimplifyExpressions),
                Box::new(DeadCodeElimination),
            ],
        }
    }

    pub fn empty() -> Self {
        Self { passes: Vec::new() }
    }

    pub fn register_pass<P: BlockPass + 'static>(&mut self, pass: P) {
        self.passes.push(Box::new(pass));
    }

    /// One pass can expose work for an earlier one (an annihilated product
    /// becomes a constant the folder could use), so the sequence repeats per
    /// block until the block stops changing. The result is a fixpoint:
    /// optimizing an already-optimized module changes nothing.
    pub fn optimize(mut self, mut module: Module) -> Module {
        for func in &mut module.functions {
            for block in func.blocks.values_mut() {
                loop {
                    let before = block.instructions.clone();
                    for pass in &mut self.passes {
                        pass.run_on_block(block);
                    }
                    if block.instructions == before {
                        break;
                    }
                }
            }
        }
        module
    }
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new()
    }
}

/// Run the standard pipeline over a module.
pub fn optimize(module: Module) -> Module {
    Optimizer::new().optimize(module)
}

/// Integer literals defined by `Const` instructions in this block, keyed by
/// instruction name. Non-integer constants (strings, floats) are skipped.
pub(crate) fn integer_constants(block: &BasicBlock) -> HashMap<String, i64> {
    let mut constants = HashMap::new();
    for inst in &block.instructions {
        if let Instruction::Const { name, value, .. } = inst {
            if let Ok(v) = value.parse::<i64>() {
                constants.insert(name.clone(), v);
            }
        }
    }
    constants
}
