use crate::types::Type;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Operation tags. One per instruction family, plus the bitwise/shift group
/// reserved for front ends that surface those operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OpCode {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    And,
    Or,
    Not,
    BitAnd,
    BitOr,
    BitXor,
    Shl,
    Shr,
    Load,
    Store,
    Alloca,
    Br,
    CondBr,
    Phi,
    Call,
    Ret,
    Const,
}

impl fmt::Display for OpCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            OpCode::Add => "add",
            OpCode::Sub => "sub",
            OpCode::Mul => "mul",
            OpCode::Div => "div",
            OpCode::Mod => "mod",
            OpCode::Eq => "eq",
            OpCode::Ne => "ne",
            OpCode::Lt => "lt",
            OpCode::Le => "le",
            OpCode::Gt => "gt",
            OpCode::Ge => "ge",
            OpCode::And => "and",
            OpCode::Or => "or",
            OpCode::Not => "not",
            OpCode::BitAnd => "bitand",
            OpCode::BitOr => "bitor",
            OpCode::BitXor => "bitxor",
            OpCode::Shl => "shl",
            OpCode::Shr => "shr",
            OpCode::Load => "load",
            OpCode::Store => "store",
            OpCode::Alloca => "alloca",
            OpCode::Br => "br",
            OpCode::CondBr => "cond_br",
            OpCode::Phi => "phi",
            OpCode::Call => "call",
            OpCode::Ret => "ret",
            OpCode::Const => "const",
        };
        write!(f, "{}", s)
    }
}

/// IR instructions. Operands are the *names* of earlier instructions in the
/// same function (`%instrN`); block targets are block names (`blockN`). An
/// instruction that produces a value carries its own unique name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Instruction {
    Const {
        name: String,
        ty: Type,
        value: String,
    },
    Binary {
        name: String,
        op: OpCode,
        ty: Type,
        left: String,
        right: String,
    },
    Unary {
        name: String,
        op: OpCode,
        ty: Type,
        operand: String,
    },
    CondBr {
        condition: String,
        true_block: String,
        false_block: String,
    },
    Br {
        target: String,
    },
    Call {
        name: String,
        return_type: Type,
        callee: String,
        args: Vec<String>,
    },
    Ret {
        return_type: Type,
        value: Option<String>,
    },
    Alloca {
        name: String,
        ty: Type,
    },
    Load {
        name: String,
        ty: Type,
        pointer: String,
    },
    Store {
        ty: Type,
        value: String,
        pointer: String,
    },
    Phi {
        name: String,
        ty: Type,
        incoming: Vec<(String, String)>,
    },
}

impl Instruction {
    pub fn opcode(&self) -> OpCode {
        match self {
            Instruction::Const { .. } => OpCode::Const,
            Instruction::Binary { op, .. } | Instruction::Unary { op, .. } => *op,
            Instruction::CondBr { .. } => OpCode::CondBr,
            Instruction::Br { .. } => OpCode::Br,
            Instruction::Call { .. } => OpCode::Call,
            Instruction::Ret { .. } => OpCode::Ret,
            Instruction::Alloca { .. } => OpCode::Alloca,
            Instruction::Load { .. } => OpCode::Load,
            Instruction::Store { .. } => OpCode::Store,
            Instruction::Phi { .. } => OpCode::Phi,
        }
    }

    /// Name of the produced value, for instructions that produce one.
    pub fn result_name(&self) -> Option<&str> {
        match self {
            Instruction::Const { name, .. }
            | Instruction::Binary { name, .. }
            | Instruction::Unary { name, .. }
            | Instruction::Call { name, .. }
            | Instruction::Alloca { name, .. }
            | Instruction::Load { name, .. }
            | Instruction::Phi { name, .. } => Some(name),
            _ => None,
        }
    }

    pub fn is_terminator(&self) -> bool {
        matches!(
            self,
            Instruction::Br { .. } | Instruction::CondBr { .. } | Instruction::Ret { .. }
        )
    }

    /// Instructions dead-code elimination must never remove. Liveness is
    /// intra-block only, so constants and allocations stay pinned: their
    /// values may be read from another block.
    pub fn is_pinned(&self) -> bool {
        matches!(
            self,
            Instruction::Ret { .. }
                | Instruction::Br { .. }
                | Instruction::CondBr { .. }
                | Instruction::Store { .. }
                | Instruction::Call { .. }
                | Instruction::Const { .. }
                | Instruction::Alloca { .. }
        )
    }

    /// Whether any operand of this instruction references `name`.
    pub fn references(&self, name: &str) -> bool {
        match self {
            Instruction::Const { .. } => false,
            Instruction::Binary { left, right, .. } => left == name || right == name,
            Instruction::Unary { operand, .. } => operand == name,
            Instruction::CondBr { condition, .. } => condition == name,
            Instruction::Br { .. } => false,
            Instruction::Call { args, .. } => args.iter().any(|a| a == name),
            Instruction::Ret { value, .. } => value.as_deref() == Some(name),
            Instruction::Alloca { .. } => false,
            Instruction::Load { pointer, .. } => pointer == name,
            Instruction::Store { value, pointer, .. } => value == name || pointer == name,
            Instruction::Phi { incoming, .. } => incoming.iter().any(|(v, _)| v == name),
        }
    }

    /// Rewrite every operand equal to `old` into `new`. Block targets and
    /// result names are left alone.
    pub fn replace_operand(&mut self, old: &str, new: &str) {
        let rewrite = |slot: &mut String| {
            if slot == old {
                new.clone_into(slot);
            }
        };
        match self {
            Instruction::Const { .. } | Instruction::Br { .. } | Instruction::Alloca { .. } => {}
            Instruction::Binary { left, right, .. } => {
                rewrite(left);
                rewrite(right);
            }
            Instruction::Unary { operand, .. } => rewrite(operand),
            Instruction::CondBr { condition, .. } => rewrite(condition),
            Instruction::Call { args, .. } => args.iter_mut().for_each(rewrite),
            Instruction::Ret { value, .. } => {
                if let Some(v) = value {
                    rewrite(v);
                }
            }
            Instruction::Load { pointer, .. } => rewrite(pointer),
            Instruction::Store { value, pointer, .. } => {
                rewrite(value);
                rewrite(pointer);
            }
            Instruction::Phi { incoming, .. } => {
                incoming.iter_mut().for_each(|(v, _)| rewrite(v));
            }
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Const { ty, value, .. } => write!(f, "const {} {}", ty, value),
            Instruction::Binary {
                op,
                ty,
                left,
                right,
                ..
            } => write!(f, "{} {} {}, {}", op, ty, left, right),
            Instruction::Unary {
                op, ty, operand, ..
            } => write!(f, "{} {} {}", op, ty, operand),
            Instruction::CondBr {
                condition,
                true_block,
                false_block,
            } => write!(
                f,
                "cond_br i1 {}, label %{}, label %{}",
                condition, true_block, false_block
            ),
            Instruction::Br { target } => write!(f, "br label %{}", target),
            Instruction::Call {
                return_type,
                callee,
                args,
                ..
            } => {
                write!(f, "call {} @{}(", return_type, callee)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
            Instruction::Ret { return_type, value } => match value {
                Some(v) if *return_type != Type::Void => {
                    write!(f, "ret {} {}", return_type, v)
                }
                _ => write!(f, "ret void"),
            },
            Instruction::Alloca { ty, .. } => write!(f, "alloca {}", ty),
            Instruction::Load { ty, pointer, .. } => write!(f, "load {}, ptr {}", ty, pointer),
            Instruction::Store { ty, value, pointer } => {
                write!(f, "store {} {}, ptr {}", ty, value, pointer)
            }
            Instruction::Phi { ty, incoming, .. } => {
                write!(f, "phi {} [", ty)?;
                for (i, (value, block)) in incoming.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}, label %{}", value, block)?;
                }
                write!(f, "]")
            }
        }
    }
}
