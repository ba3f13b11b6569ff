use crate::block::BasicBlock;
use crate::instructions::{Instruction, OpCode};
use crate::passes::{integer_constants, BlockPass};
use std::collections::HashMap;

/// Algebraic identity rewrites:
///
///   x + 0 -> x      0 + x -> x      x - 0 -> x
///   x * 1 -> x      1 * x -> x
///   x * 0 -> 0      0 * x -> 0
///
/// Identity cases redirect all in-block uses of the binary's name to the
/// surviving operand and leave the binary for dead-code elimination; the
/// annihilation cases rewrite the binary into a `Const 0` keeping its name.
pub struct SimplifyExpressions;

impl BlockPass for SimplifyExpressions {
    fn name(&self) -> &'static str {
        "simplify-expressions"
    }

    fn run_on_block(&mut self, block: &mut BasicBlock) {
        let mut constants = integer_constants(block);
        let mut redirects: HashMap<String, String> = HashMap::new();
        let mut order: Vec<String> = Vec::new();

        for inst in block.instructions.iter_mut() {
            let Instruction::Binary {
                name,
                op,
                ty,
                left,
                right,
            } = inst
            else {
                continue;
            };
            let lval = constants.get(left.as_str()).copied();
            let rval = constants.get(right.as_str()).copied();

            let survivor = match op {
                OpCode::Add if rval == Some(0) => Some(left.clone()),
                OpCode::Add if lval == Some(0) => Some(right.clone()),
                OpCode::Sub if rval == Some(0) => Some(left.clone()),
                OpCode::Mul if rval == Some(1) => Some(left.clone()),
                OpCode::Mul if lval == Some(1) => Some(right.clone()),
                OpCode::Mul if rval == Some(0) || lval == Some(0) => {
                    let zero = Instruction::Const {
                        name: name.clone(),
                        ty: *ty,
                        value: "0".into(),
                    };
                    // Later identities in this scan see the new constant.
                    constants.insert(name.clone(), 0);
                    *inst = zero;
                    continue;
                }
                _ => None,
            };

            if let Some(target) = survivor {
                // Chase earlier redirects so chains land on the final name.
                let target = resolve(&redirects, target);
                order.push(name.clone());
                redirects.insert(name.clone(), target);
            }
        }

        for old in &order {
            let new = redirects[old].clone();
            for inst in block.instructions.iter_mut() {
                inst.replace_operand(old, &new);
            }
        }
    }
}

fn resolve(redirects: &HashMap<String, String>, mut name: String) -> String {
    while let Some(next) = redirects.get(&name) {
        name = next.clone();
    }
    name
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Type;
    use pretty_assertions::assert_eq;

    fn constant(name: &str, value: &str) -> Instruction {
        Instruction::Const {
            name: name.into(),
            ty: Type::Int32,
            value: value.into(),
        }
    }

    fn binary(name: &str, op: OpCode, left: &str, right: &str) -> Instruction {
        Instruction::Binary {
            name: name.into(),
            op,
            ty: Type::Int32,
            left: left.into(),
            right: right.into(),
        }
    }

    #[test]
    fn add_zero_redirects_uses_to_operand() {
        let mut block = BasicBlock::new("block0");
        block.push(Instruction::Load {
            name: "%instr0".into(),
            ty: Type::Int32,
            pointer: "%instr8".into(),
        });
        block.push(constant("%instr1", "0"));
        block.push(binary("%instr2", OpCode::Add, "%instr0", "%instr1"));
        block.push(Instruction::Ret {
            return_type: Type::Int32,
            value: Some("%instr2".into()),
        });

        SimplifyExpressions.run_on_block(&mut block);

        assert_eq!(
            block.instructions[3],
            Instruction::Ret {
                return_type: Type::Int32,
                value: Some("%instr0".into()),
            }
        );
    }

    #[test]
    fn mul_zero_becomes_constant_zero() {
        let mut block = BasicBlock::new("block0");
        block.push(Instruction::Load {
            name: "%instr0".into(),
            ty: Type::Int32,
            pointer: "%instr8".into(),
        });
        block.push(constant("%instr1", "0"));
        block.push(binary("%instr2", OpCode::Mul, "%instr0", "%instr1"));

        SimplifyExpressions.run_on_block(&mut block);

        assert_eq!(block.instructions[2], constant("%instr2", "0"));
    }

    #[test]
    fn redirect_chains_land_on_the_final_name() {
        let mut block = BasicBlock::new("block0");
        block.push(Instruction::Load {
            name: "%instr0".into(),
            ty: Type::Int32,
            pointer: "%instr8".into(),
        });
        block.push(constant("%instr1", "0"));
        block.push(constant("%instr2", "1"));
        block.push(binary("%instr3", OpCode::Add, "%instr0", "%instr1"));
        block.push(binary("%instr4", OpCode::Mul, "%instr3", "%instr2"));
        block.push(Instruction::Ret {
            return_type: Type::Int32,
            value: Some("%instr4".into()),
        });

        SimplifyExpressions.run_on_block(&mut block);

        assert_eq!(
            block.instructions[5],
            Instruction::Ret {
                return_type: Type::Int32,
                value: Some("%instr0".into()),
            }
        );
    }

    #[test]
    fn non_identity_operations_are_untouched() {
        let mut block = BasicBlock::new("block0");
        block.push(constant("%instr0", "2"));
        block.push(Instruction::Load {
            name: "%instr1".into(),
            ty: Type::Int32,
            pointer: "%instr8".into(),
        });
        let sub = binary("%instr2", OpCode::Sub, "%instr0", "%instr1");
        block.push(sub.clone());

        SimplifyExpressions.run_on_block(&mut block);

        assert_eq!(block.instructions[2], sub);
    }
}
