use crate::function::Function;
use crate::{IrError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// A compilation unit: an ordered sequence of functions. Moves stage to
/// stage through the pipeline; never shared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Module {
    pub name: String,
    pub functions: Vec<Function>,
}

impl Module {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            functions: Vec::new(),
        }
    }

    pub fn add_function(&mut self, func: Function) {
        self.functions.push(func);
    }

    /// Check structural well-formedness: every block ends in exactly one
    /// terminator, nothing follows it, and value names are unique across the
    /// whole module (the builder's counter is module-global). Builder output
    /// always passes.
    pub fn validate(&self) -> Result<()> {
        let mut names = HashSet::new();
        for func in &self.functions {
            if func.blocks.is_empty() {
                return Err(IrError::EmptyFunction(func.name.clone()));
            }
            for block in func.blocks.values() {
                let terminator_at = block.instructions.iter().position(|i| i.is_terminator());
                match terminator_at {
                    None => {
                        return Err(IrError::MissingTerminator {
                            function: func.name.clone(),
                            block: block.name.clone(),
                        })
                    }
                    Some(pos) if pos + 1 != block.instructions.len() => {
                        return Err(IrError::InstructionAfterTerminator {
                            function: func.name.clone(),
                            block: block.name.clone(),
                        })
                    }
                    Some(_) => {}
                }
                for inst in &block.instructions {
                    if let Some(name) = inst.result_name() {
                        if !names.insert(name.to_string()) {
                            return Err(IrError::DuplicateName {
                                function: func.name.clone(),
                                name: name.to_string(),
                            });
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::BasicBlock;
    use crate::instructions::Instruction;
    use crate::types::Type;

    fn ret() -> Instruction {
        Instruction::Ret {
            return_type: Type::Int32,
            value: None,
        }
    }

    #[test]
    fn validate_accepts_terminated_blocks() {
        let mut func = Function::new("main", Type::Int32);
        let mut block = BasicBlock::new("block0");
        block.push(ret());
        func.add_block(block);

        let mut module = Module::new("main");
        module.add_function(func);
        assert!(module.validate().is_ok());
    }

    #[test]
    fn validate_rejects_missing_terminator() {
        let mut func = Function::new("main", Type::Int32);
        func.add_block(BasicBlock::new("block0"));

        let mut module = Module::new("main");
        module.add_function(func);
        assert!(matches!(
            module.validate(),
            Err(IrError::MissingTerminator { .. })
        ));
    }

    #[test]
    fn validate_rejects_instruction_after_terminator() {
        let mut func = Function::new("main", Type::Int32);
        let mut block = BasicBlock::new("block0");
        block.push(ret());
        block.push(Instruction::Const {
            name: "%instr0".into(),
            ty: Type::Int32,
            value: "0".into(),
        });
        func.add_block(block);

        let mut module = Module::new("main");
        module.add_function(func);
        assert!(matches!(
            module.validate(),
            Err(IrError::InstructionAfterTerminator { .. })
        ));
    }

    #[test]
    fn validate_rejects_duplicate_names() {
        let mut func = Function::new("main", Type::Int32);
        let mut block = BasicBlock::new("block0");
        block.push(Instruction::Const {
            name: "%instr0".into(),
            ty: Type::Int32,
            value: "1".into(),
        });
        block.push(Instruction::Const {
            name: "%instr0".into(),
            ty: Type::Int32,
            value: "2".into(),
        });
        block.push(ret());
        func.add_block(block);

        let mut module = Module::new("main");
        module.add_function(func);
        assert!(matches!(
            module.validate(),
            Err(IrError::DuplicateName { .. })
        ));
    }

    #[test]
    fn validate_rejects_duplicate_names_across_functions() {
        let mut module = Module::new("main");
        for func_name in ["helper", "main"] {
            let mut func = Function::new(func_name, Type::Int32);
            let mut block = BasicBlock::new(format!("{func_name}_entry"));
            block.push(Instruction::Const {
                name: "%instr0".into(),
                ty: Type::Int32,
                value: "1".into(),
            });
            block.push(ret());
            func.add_block(block);
            module.add_function(func);
        }

        assert!(matches!(
            module.validate(),
            Err(IrError::DuplicateName { ref function, .. }) if function == "main"
        ));
    }
}
