use crate::instructions::Instruction;
use serde::{Deserialize, Serialize};

/// A named straight-line instruction sequence. Well-formed blocks carry
/// exactly one terminator, and it is the last instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicBlock {
    pub name: String,
    pub instructions: Vec<Instruction>,
}

impl BasicBlock {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            instructions: Vec::new(),
        }
    }

    pub fn push(&mut self, inst: Instruction) {
        self.instructions.push(inst);
    }

    pub fn terminator(&self) -> Option<&Instruction> {
        self.instructions.last().filter(|i| i.is_terminator())
    }

    pub fn is_terminated(&self) -> bool {
        self.terminator().is_some()
    }

    /// Whether `name` is used as an operand anywhere in this block.
    pub fn uses(&self, name: &str) -> bool {
        self.instructions.iter().any(|i| i.references(name))
    }
}
