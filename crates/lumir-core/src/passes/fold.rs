use crate::block::BasicBlock;
use crate::instructions::{Instruction, OpCode};
use crate::passes::BlockPass;
use std::collections::HashMap;

/// Collapse binary operations over known integer constants into `Const`
/// instructions. The scan is forward and the table grows as it folds, so a
/// chain of constant expressions collapses in a single run.
///
/// A folded constant keeps the binary's name; every in-block use of that
/// name keeps resolving without a rewrite.
pub struct ConstantFolding;

impl BlockPass for ConstantFolding {
    fn name(&self) -> &'static str {
        "constant-folding"
    }

    fn run_on_block(&mut self, block: &mut BasicBlock) {
        let mut constants: HashMap<String, i64> = HashMap::new();

        for inst in block.instructions.iter_mut() {
            match inst {
                Instruction::Const { name, value, .. } => {
                    if let Ok(v) = value.parse::<i64>() {
                        constants.insert(name.clone(), v);
                    }
                }
                Instruction::Binary {
                    name,
                    op,
                    ty,
                    left,
                    right,
                } => {
                    let operands = (
                        constants.get(left.as_str()).copied(),
                        constants.get(right.as_str()).copied(),
                    );
                    if let (Some(l), Some(r)) = operands {
                        if let Some(folded) = eval(*op, l, r) {
                            let replacement = Instruction::Const {
                                name: name.clone(),
                                ty: *ty,
                                value: folded.to_string(),
                            };
                            constants.insert(name.clone(), folded);
                            *inst = replacement;
                        }
                    }
                }
                _ => {}
            }
        }
    }
}

/// Evaluate one binary operation. `None` means the fold is not safe:
/// division by zero, overflow, or an opcode with no constant semantics.
fn eval(op: OpCode, l: i64, r: i64) -> Option<i64> {
    match op {
        OpCode::Add => l.checked_add(r),
        OpCode::Sub => l.checked_sub(r),
        OpCode::Mul => l.checked_mul(r),
        OpCode::Div => {
            if r == 0 {
                None
            } else {
                l.checked_div(r)
            }
        }
        OpCode::Mod => {
            if r == 0 {
                None
            } else {
                l.checked_rem(r)
            }
        }
        OpCode::Eq => Some((l == r) as i64),
        OpCode::Ne => Some((l != r) as i64),
        OpCode::Lt => Some((l < r) as i64),
        OpCode::Le => Some((l <= r) as i64),
        OpCode::Gt => Some((l > r) as i64),
        OpCode::Ge => Some((l >= r) as i64),
        OpCode::And => Some((l != 0 && r != 0) as i64),
        OpCode::Or => Some((l != 0 || r != 0) as i64),
        OpCode::BitAnd => Some(l & r),
        OpCode::BitOr => Some(l | r),
        OpCode::BitXor => Some(l ^ r),
        OpCode::Shl => u32::try_from(r).ok().and_then(|s| l.checked_shl(s)),
        OpCode::Shr => u32::try_from(r).ok().and_then(|s| l.checked_shr(s)),
        _ => None,
    }
}
