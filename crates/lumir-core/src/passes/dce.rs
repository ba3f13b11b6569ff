use crate::block::BasicBlock;
use crate::passes::BlockPass;

/// Remove named instructions whose value is never referenced later in the
/// same block and which have no side effect. The pinned set (`Ret`, `Br`,
/// `CondBr`, `Store`, `Call`, `Const`, `Alloca`) is never removed: liveness
/// here is intra-block only, and those values or effects may be observed
/// from another block.
pub struct DeadCodeElimination;

impl BlockPass for DeadCodeElimination {
    fn name(&self) -> &'static str {
        "dead-code-elimination"
    }

    fn run_on_block(&mut self, block: &mut BasicBlock) {
        // Removing one instruction can strand another, so sweep to fixpoint.
        loop {
            let dead: Vec<usize> = block
                .instructions
                .iter()
                .enumerate()
                .filter(|(_, inst)| {
                    if inst.is_pinned() {
                        return false;
                    }
                    match inst.result_name() {
                        Some(name) => !block.uses(name),
                        None => false,
                    }
                })
                .map(|(i, _)| i)
                .collect();

            if dead.is_empty() {
                break;
            }
            for i in dead.into_iter().rev() {
                block.instructions.remove(i);
            }
        }
    }
}
