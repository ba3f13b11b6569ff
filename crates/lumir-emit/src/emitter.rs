//! Lowering from LumIR to an x86_64-flavored textual instruction stream.
//!
//! Every value lives at a location named after the instruction that produced
//! it; evaluation funnels through `rax`/`rbx` and call results land in `rax`.
//! `Const` instructions produce no code: their literal text is substituted
//! wherever the name appears as an operand.

use crate::config::EmitterConfig;
use lumir_core::{BasicBlock, Function, Instruction, Module, OpCode, Type};
use std::collections::HashMap;
use std::fmt::Write;

/// Integer argument registers, in passing order. Arguments past the sixth
/// go on the stack.
const ARG_REGISTERS: [&str; 6] = ["rdi", "rsi", "rdx", "rcx", "r8", "r9"];

/// Lower a module with the default configuration.
pub fn lower(module: &Module) -> String {
    AsmEmitter::new().emit(module)
}

/// Storage width used when declaring a slot for a value of `ty`. Floats
/// share the 32-bit slot with `i32`; aggregates are handled by address.
pub fn storage_width(ty: Type) -> &'static str {
    match ty {
        Type::Void => "void",
        Type::Bool | Type::Int8 => "byte",
        Type::Int16 => "word",
        Type::Int32 | Type::Float => "dword",
        Type::Int64 | Type::Double | Type::Pointer => "qword",
        Type::Array | Type::Struct => "qword",
    }
}

pub struct AsmEmitter {
    config: EmitterConfig,
}

impl AsmEmitter {
    pub fn new() -> Self {
        Self {
            config: EmitterConfig::default(),
        }
    }

    pub fn with_config(config: EmitterConfig) -> Self {
        Self { config }
    }

    pub fn emit(&self, module: &Module) -> String {
        let mut out = String::new();
        writeln!(out, "; LumIR Backend Code Generator").unwrap();
        writeln!(out, "; Generated x86_64 Assembly Code").unwrap();
        writeln!(out).unwrap();
        writeln!(out, "; External functions").unwrap();
        writeln!(out, "extern printf").unwrap();
        writeln!(out).unwrap();
        for func in &module.functions {
            self.emit_function(&mut out, func);
        }
        out
    }

    fn emit_function(&self, out: &mut String, func: &Function) {
        let constants = literal_table(func);

        self.comment(out, &format!("; Function: {}", func.name));
        writeln!(out, "{}:", func.name).unwrap();
        writeln!(out, "    push rbp").unwrap();
        writeln!(out, "    mov rbp, rsp").unwrap();

        for block in func.blocks.values() {
            self.emit_block(out, block, &constants);
        }

        writeln!(out, "    mov rsp, rbp").unwrap();
        writeln!(out, "    pop rbp").unwrap();
        writeln!(out, "    ret").unwrap();
        writeln!(out).unwrap();
    }

    fn emit_block(&self, out: &mut String, block: &BasicBlock, constants: &HashMap<&str, &str>) {
        self.comment(out, &format!("; Block: {}", block.name));
        writeln!(out, "{}:", block.name).unwrap();
        for inst in &block.instructions {
            self.emit_instruction(out, inst, constants);
        }
    }

    fn comment(&self, out: &mut String, text: &str) {
        if self.config.include_comments {
            writeln!(out, "{text}").unwrap();
        }
    }

    fn emit_instruction(
        &self,
        out: &mut String,
        inst: &Instruction,
        constants: &HashMap<&str, &str>,
    ) {
        match inst {
            Instruction::Const { name, value, .. } => {
                // No code; the literal is substituted at each use.
                self.comment(out, &format!("; Const: {name} = {value}"));
            }
            Instruction::Binary {
                name,
                op,
                ty,
                left,
                right,
            } => {
                self.comment(out, &format!("; BinaryOp: {name} = {op} {ty} {left}, {right}"));
                writeln!(out, "    mov rax, {}", operand(constants, left)).unwrap();
                writeln!(out, "    mov rbx, {}", operand(constants, right)).unwrap();
                self.emit_binary_op(out, *op);
                writeln!(out, "    mov {name}, rax").unwrap();
            }
            Instruction::Unary {
                name, op, ty, operand: source,
            } => {
                self.comment(out, &format!("; UnaryOp: {name} = {op} {ty} {source}"));
                writeln!(out, "    mov rax, {}", operand(constants, source)).unwrap();
                match op {
                    OpCode::Not => writeln!(out, "    not rax").unwrap(),
                    // Unary sub is arithmetic negation.
                    _ => writeln!(out, "    neg rax").unwrap(),
                }
                writeln!(out, "    mov {name}, rax").unwrap();
            }
            Instruction::CondBr {
                condition,
                true_block,
                false_block,
            } => {
                self.comment(out, &format!("; CondBr: {condition} ? {true_block} : {false_block}"));
                writeln!(out, "    mov rax, {}", operand(constants, condition)).unwrap();
                writeln!(out, "    cmp rax, 0").unwrap();
                writeln!(out, "    je {false_block}").unwrap();
                writeln!(out, "    jmp {true_block}").unwrap();
            }
            Instruction::Br { target } => {
                self.comment(out, &format!("; Br: jmp {target}"));
                writeln!(out, "    jmp {target}").unwrap();
            }
            Instruction::Call {
                name, callee, args, ..
            } => self.emit_call(out, name, callee, args, constants),
            Instruction::Ret { value, .. } => {
                match value {
                    Some(value) => {
                        self.comment(out, &format!("; Ret: {value}"));
                        writeln!(out, "    mov rax, {}", operand(constants, value)).unwrap();
                    }
                    None => self.comment(out, "; Ret"),
                }
                writeln!(out, "    ret").unwrap();
            }
            Instruction::Alloca { name, ty } => {
                self.comment(
                    out,
                    &format!("; Alloca: {name} = alloca {ty} ({} slot)", storage_width(*ty)),
                );
                // One fixed-width slot per allocation.
                writeln!(out, "    sub rsp, 8").unwrap();
                writeln!(out, "    mov {name}, rsp").unwrap();
            }
            Instruction::Load { name, ty, pointer } => {
                self.comment(out, &format!("; Load: {name} = load {ty} from {pointer}"));
                writeln!(out, "    mov rax, {}", operand(constants, pointer)).unwrap();
                writeln!(out, "    mov {name}, [rax]").unwrap();
            }
            Instruction::Store { ty, value, pointer } => {
                self.comment(out, &format!("; Store: store {ty} {value} to {pointer}"));
                writeln!(out, "    mov rax, {}", operand(constants, pointer)).unwrap();
                writeln!(out, "    mov rbx, {}", operand(constants, value)).unwrap();
                writeln!(out, "    mov [rax], rbx").unwrap();
            }
            Instruction::Phi { name, ty, incoming } => {
                // The builder never produces a phi; nothing selects incoming
                // values here.
                let edges: Vec<String> = incoming
                    .iter()
                    .map(|(value, block)| format!("{value} from {block}"))
                    .collect();
                self.comment(
                    out,
                    &format!("; Phi: {name} = phi {ty} [{}]", edges.join(", ")),
                );
            }
        }
    }

    fn emit_binary_op(&self, out: &mut String, op: OpCode) {
        match op {
            OpCode::Add => writeln!(out, "    add rax, rbx").unwrap(),
            OpCode::Sub => writeln!(out, "    sub rax, rbx").unwrap(),
            OpCode::Mul => writeln!(out, "    imul rax, rbx").unwrap(),
            OpCode::Div => {
                writeln!(out, "    xor rdx, rdx").unwrap();
                writeln!(out, "    idiv rbx").unwrap();
            }
            OpCode::Mod => {
                writeln!(out, "    xor rdx, rdx").unwrap();
                writeln!(out, "    idiv rbx").unwrap();
                writeln!(out, "    mov rax, rdx").unwrap();
            }
            OpCode::Eq | OpCode::Ne | OpCode::Lt | OpCode::Le | OpCode::Gt | OpCode::Ge => {
                writeln!(out, "    cmp rax, rbx").unwrap();
                writeln!(out, "    {} al", compare_set(op)).unwrap();
                writeln!(out, "    movzx rax, al").unwrap();
            }
            OpCode::And | OpCode::Or => {
                // Logical operands normalize to 0/1 before combining.
                writeln!(out, "    cmp rax, 0").unwrap();
                writeln!(out, "    setne al").unwrap();
                writeln!(out, "    movzx rax, al").unwrap();
                writeln!(out, "    cmp rbx, 0").unwrap();
                writeln!(out, "    setne bl").unwrap();
                writeln!(out, "    movzx rbx, bl").unwrap();
                if op == OpCode::And {
                    writeln!(out, "    and rax, rbx").unwrap();
                } else {
                    writeln!(out, "    or rax, rbx").unwrap();
                }
            }
            OpCode::BitAnd => writeln!(out, "    and rax, rbx").unwrap(),
            OpCode::BitOr => writeln!(out, "    or rax, rbx").unwrap(),
            OpCode::BitXor => writeln!(out, "    xor rax, rbx").unwrap(),
            OpCode::Shl => {
                writeln!(out, "    mov rcx, rbx").unwrap();
                writeln!(out, "    shl rax, cl").unwrap();
            }
            OpCode::Shr => {
                writeln!(out, "    mov rcx, rbx").unwrap();
                writeln!(out, "    sar rax, cl").unwrap();
            }
            _ => {
                self.comment(out, "    ; no lowering for this opcode");
            }
        }
    }

    fn emit_call(
        &self,
        out: &mut String,
        name: &str,
        callee: &str,
        args: &[String],
        constants: &HashMap<&str, &str>,
    ) {
        self.comment(out, &format!("; Call: {name} = {callee}({})", args.join(", ")));

        self.comment(out, "    ; Save caller-saved registers");
        for reg in ARG_REGISTERS {
            writeln!(out, "    push {reg}").unwrap();
        }

        if !args.is_empty() {
            self.comment(out, "    ; Pass arguments");
            for (arg, reg) in args.iter().zip(ARG_REGISTERS) {
                writeln!(out, "    mov {reg}, {}", operand(constants, arg)).unwrap();
            }
            for arg in args.iter().skip(ARG_REGISTERS.len()) {
                writeln!(out, "    push {}", operand(constants, arg)).unwrap();
            }
        }

        self.comment(out, "    ; Call function");
        writeln!(out, "    call {callee}").unwrap();

        if args.len() > ARG_REGISTERS.len() {
            let extra = args.len() - ARG_REGISTERS.len();
            self.comment(out, "    ; Clean up stack arguments");
            writeln!(out, "    add rsp, {}", extra * 8).unwrap();
        }

        self.comment(out, "    ; Save return value");
        writeln!(out, "    mov {name}, rax").unwrap();

        self.comment(out, "    ; Restore caller-saved registers");
        for reg in ARG_REGISTERS.iter().rev() {
            writeln!(out, "    pop {reg}").unwrap();
        }
    }
}

impl Default for AsmEmitter {
    fn default() -> Self {
        Self::new()
    }
}

fn compare_set(op: OpCode) -> &'static str {
    match op {
        OpCode::Eq => "sete",
        OpCode::Ne => "setne",
        OpCode::Lt => "setl",
        OpCode::Le => "setle",
        OpCode::Gt => "setg",
        _ => "setge",
    }
}

/// Literal text of every constant in the function, keyed by name.
fn literal_table(func: &Function) -> HashMap<&str, &str> {
    let mut table = HashMap::new();
    for block in func.blocks.values() {
        for inst in &block.instructions {
            if let Instruction::Const { name, value, .. } = inst {
                table.insert(name.as_str(), value.as_str());
            }
        }
    }
    table
}

fn operand<'a>(constants: &HashMap<&str, &'a str>, name: &'a str) -> &'a str {
    constants.get(name).copied().unwrap_or(name)
}
