//! Single-pass lowering from the statement tree to LumIR.
//!
//! The builder walks statements once, appending to a current block inside a
//! current function. Names come from two monotonic counters (`%instr{n}`,
//! `block{n}`) shared across the whole module, so every value and block name
//! is unique without a scope table. Lowering never fails: unbound
//! identifiers read as zero, and instructions aimed at an already-terminated
//! block are unreachable and get dropped.

use crate::ast::{Expr, LiteralKind, Stmt};
use lumir_core::{BasicBlock, Function, Instruction, Module, Type};
use std::collections::HashMap;
use std::mem;
use tracing::{debug, trace};

/// Lower a program into a module. A synthetic `@main` collects top-level
/// statements and returns `0`; function statements become their own
/// functions, emitted before `@main` in the module.
pub fn build_module(statements: &[Stmt]) -> Module {
    IrBuilder::new().build(statements)
}

pub struct IrBuilder {
    module: Module,
    function: Function,
    current_block: String,
    instr_count: u32,
    block_count: u32,
    vars: HashMap<String, String>,
}

impl IrBuilder {
    pub fn new() -> Self {
        let mut function = Function::new("main", Type::Int32);
        let entry = function.add_block(BasicBlock::new("block0"));
        Self {
            module: Module::new("main"),
            function,
            current_block: entry,
            instr_count: 0,
            block_count: 1,
            vars: HashMap::new(),
        }
    }

    pub fn build(mut self, statements: &[Stmt]) -> Module {
        debug!(statements = statements.len(), "lowering program");
        for stmt in statements {
            self.lower_stmt(stmt);
        }
        // Implicit `return 0` unless the tail already returned or branched.
        let zero = self.const_value(Type::Int32, "0");
        self.emit(Instruction::Ret {
            return_type: Type::Int32,
            value: Some(zero),
        });
        self.module.add_function(self.function);
        debug!(functions = self.module.functions.len(), "module built");
        self.module
    }

    fn next_instr_name(&mut self) -> String {
        let name = format!("%instr{}", self.instr_count);
        self.instr_count += 1;
        name
    }

    fn next_block_name(&mut self) -> String {
        let name = format!("block{}", self.block_count);
        self.block_count += 1;
        name
    }

    /// Create a block in the current function and return its name. Creation
    /// order is emission order; the insertion point does not move.
    fn create_block(&mut self) -> String {
        let name = self.next_block_name();
        trace!(block = %name, "create block");
        self.function.add_block(BasicBlock::new(name.clone()))
    }

    fn set_insertion_point(&mut self, block: &str) {
        self.current_block = block.to_string();
    }

    /// Append to the current block. Terminated blocks swallow the
    /// instruction: anything lowered after a `ret` or branch is unreachable.
    fn emit(&mut self, inst: Instruction) {
        if let Some(block) = self.function.block_mut(&self.current_block) {
            if !block.is_terminated() {
                block.push(inst);
            }
        }
    }

    fn const_value(&mut self, ty: Type, value: &str) -> String {
        let name = self.next_instr_name();
        self.emit(Instruction::Const {
            name: name.clone(),
            ty,
            value: value.to_string(),
        });
        name
    }

    fn alloca(&mut self, ty: Type) -> String {
        let name = self.next_instr_name();
        self.emit(Instruction::Alloca {
            name: name.clone(),
            ty,
        });
        name
    }

    fn load(&mut self, ty: Type, pointer: &str) -> String {
        let name = self.next_instr_name();
        self.emit(Instruction::Load {
            name: name.clone(),
            ty,
            pointer: pointer.to_string(),
        });
        name
    }

    fn store(&mut self, ty: Type, value: &str, pointer: &str) {
        self.emit(Instruction::Store {
            ty,
            value: value.to_string(),
            pointer: pointer.to_string(),
        });
    }

    fn call(&mut self, return_type: Type, callee: &str, args: Vec<String>) -> String {
        let name = self.next_instr_name();
        self.emit(Instruction::Call {
            name: name.clone(),
            return_type,
            callee: callee.to_string(),
            args,
        });
        name
    }

    fn branch(&mut self, target: &str) {
        self.emit(Instruction::Br {
            target: target.to_string(),
        });
    }

    fn cond_branch(&mut self, condition: &str, true_block: &str, false_block: &str) {
        self.emit(Instruction::CondBr {
            condition: condition.to_string(),
            true_block: true_block.to_string(),
            false_block: false_block.to_string(),
        });
    }

    fn ret(&mut self, return_type: Type, value: Option<String>) {
        self.emit(Instruction::Ret { return_type, value });
    }

    /// Stack slot for `name`, creating one on first write. All scalar
    /// storage is `i32`.
    fn slot_for(&mut self, name: &str) -> String {
        if let Some(slot) = self.vars.get(name) {
            return slot.clone();
        }
        let slot = self.alloca(Type::Int32);
        self.vars.insert(name.to_string(), slot.clone());
        slot
    }

    fn lower_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expression(expr) => {
                self.lower_expr(expr);
            }
            Stmt::Print(expr) => {
                let fmt = self.const_value(Type::Pointer, "%d\\n");
                let value = self.lower_expr(expr);
                self.call(Type::Int32, "printf", vec![fmt, value]);
            }
            Stmt::Var { name, init, .. } | Stmt::Const { name, init, .. } => {
                let value = match init {
                    Some(expr) => self.lower_expr(expr),
                    None => self.const_value(Type::Int32, "0"),
                };
                let slot = self.alloca(Type::Int32);
                self.store(Type::Int32, &value, &slot);
                self.vars.insert(name.clone(), slot);
            }
            Stmt::Function { name, body, .. } => self.lower_function(name, body),
            Stmt::Return(value) => {
                let value = match value {
                    Some(expr) => self.lower_expr(expr),
                    None => self.const_value(Type::Int32, "0"),
                };
                self.ret(Type::Int32, Some(value));
            }
            Stmt::Block(statements) => {
                for stmt in statements {
                    self.lower_stmt(stmt);
                }
            }
            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => self.lower_if(condition, then_branch, else_branch.as_deref()),
            Stmt::While { condition, body } => self.lower_while(condition, body),
            Stmt::For {
                init,
                condition,
                increment,
                body,
            } => self.lower_for(init.as_deref(), condition, increment.as_ref(), body),
            // Aggregate declarations carry no executable code.
            Stmt::Struct { .. } | Stmt::Class { .. } => {}
        }
    }

    /// Functions lower into their own `Function` with a fresh binding table;
    /// the instruction and block counters stay shared so names remain unique
    /// module-wide. The finished function lands in the module before the one
    /// that declared it.
    fn lower_function(&mut self, name: &str, body: &Stmt) {
        debug!(function = %name, "lowering function");
        let mut function = Function::new(name, Type::Int32);
        let entry = function.add_block(BasicBlock::new(self.next_block_name()));

        let outer_function = mem::replace(&mut self.function, function);
        let outer_block = mem::replace(&mut self.current_block, entry);
        let outer_vars = mem::take(&mut self.vars);

        self.lower_stmt(body);
        let zero = self.const_value(Type::Int32, "0");
        self.ret(Type::Int32, Some(zero));

        let finished = mem::replace(&mut self.function, outer_function);
        self.current_block = outer_block;
        self.vars = outer_vars;
        self.module.add_function(finished);
    }

    fn lower_if(&mut self, condition: &Expr, then_branch: &Stmt, else_branch: Option<&Stmt>) {
        let cond = self.lower_expr(condition);
        let then_block = self.create_block();
        let else_block = self.create_block();
        let merge_block = self.create_block();

        self.cond_branch(&cond, &then_block, &else_block);

        self.set_insertion_point(&then_block);
        self.lower_stmt(then_branch);
        self.branch(&merge_block);

        self.set_insertion_point(&else_block);
        if let Some(else_branch) = else_branch {
            self.lower_stmt(else_branch);
        }
        self.branch(&merge_block);

        self.set_insertion_point(&merge_block);
    }

    fn lower_while(&mut self, condition: &Expr, body: &Stmt) {
        let cond_block = self.create_block();
        let body_block = self.create_block();
        let merge_block = self.create_block();

        self.branch(&cond_block);

        self.set_insertion_point(&cond_block);
        let cond = self.lower_expr(condition);
        self.cond_branch(&cond, &body_block, &merge_block);

        self.set_insertion_point(&body_block);
        self.lower_stmt(body);
        self.branch(&cond_block);

        self.set_insertion_point(&merge_block);
    }

    fn lower_for(
        &mut self,
        init: Option<&Stmt>,
        condition: &Expr,
        increment: Option<&Expr>,
        body: &Stmt,
    ) {
        if let Some(init) = init {
            self.lower_stmt(init);
        }

        let cond_block = self.create_block();
        let body_block = self.create_block();
        let incr_block = self.create_block();
        let merge_block = self.create_block();

        self.branch(&cond_block);

        self.set_insertion_point(&cond_block);
        let cond = self.lower_expr(condition);
        self.cond_branch(&cond, &body_block, &merge_block);

        self.set_insertion_point(&body_block);
        self.lower_stmt(body);
        self.branch(&incr_block);

        self.set_insertion_point(&incr_block);
        if let Some(increment) = increment {
            self.lower_expr(increment);
        }
        self.branch(&cond_block);

        self.set_insertion_point(&merge_block);
    }

    /// Lower an expression, returning the name of the value it produced.
    fn lower_expr(&mut self, expr: &Expr) -> String {
        match expr {
            Expr::Literal { kind, value } => {
                let ty = match kind {
                    LiteralKind::Number => Type::Int32,
                    LiteralKind::Str => Type::Pointer,
                    LiteralKind::Bool => Type::Bool,
                };
                self.const_value(ty, value)
            }
            Expr::Identifier { name } => match self.vars.get(name).cloned() {
                Some(slot) => self.load(Type::Int32, &slot),
                // Unbound reads fold to zero rather than aborting lowering.
                None => self.const_value(Type::Int32, "0"),
            },
            Expr::Binary { op, left, right } => {
                let left = self.lower_expr(left);
                let right = self.lower_expr(right);
                let name = self.next_instr_name();
                self.emit(Instruction::Binary {
                    name: name.clone(),
                    op: op.opcode(),
                    ty: Type::Int32,
                    left,
                    right,
                });
                name
            }
            Expr::Unary { op, operand } => {
                let operand = self.lower_expr(operand);
                let name = self.next_instr_name();
                self.emit(Instruction::Unary {
                    name: name.clone(),
                    op: op.opcode(),
                    ty: Type::Int32,
                    operand,
                });
                name
            }
            Expr::Assign { name, value } => {
                let value = self.lower_expr(value);
                let slot = self.slot_for(name);
                self.store(Type::Int32, &value, &slot);
                value
            }
            Expr::Call { callee, args } => self.lower_call(callee, args),
            // Member access reads the object for now; field projection is
            // front-end sugar this pipeline does not model.
            Expr::Member { object, .. } => self.lower_expr(object),
            Expr::Grouping(inner) => self.lower_expr(inner),
        }
    }

    fn lower_call(&mut self, callee: &Expr, args: &[Expr]) -> String {
        let Expr::Identifier { name } = callee else {
            // Computed callees have no lowering; degrade to an argument-less
            // printf call so the call site still produces a value.
            return self.call(Type::Int32, "printf", Vec::new());
        };

        if name == "println" {
            return self.lower_println(args);
        }

        let args = args.iter().map(|arg| self.lower_expr(arg)).collect();
        self.call(Type::Int32, name, args)
    }

    /// `println` routes through printf. No arguments prints a bare newline;
    /// a string literal goes through `%s`, anything else through `%d`.
    fn lower_println(&mut self, args: &[Expr]) -> String {
        let Some(first) = args.first() else {
            let fmt = self.const_value(Type::Pointer, "\\n");
            return self.call(Type::Int32, "printf", vec![fmt]);
        };
        let spec = match first {
            Expr::Literal {
                kind: LiteralKind::Str,
                ..
            } => "%s\\n",
            _ => "%d\\n",
        };
        let fmt = self.const_value(Type::Pointer, spec);
        let value = self.lower_expr(first);
        self.call(Type::Int32, "printf", vec![fmt, value])
    }
}

impl Default for IrBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{BinaryOp, UnaryOp};
    use lumir_core::OpCode;
    use pretty_assertions::assert_eq;

    fn block_names(function: &Function) -> Vec<&str> {
        function.blocks.keys().map(String::as_str).collect()
    }

    fn main_function(module: &Module) -> &Function {
        module
            .functions
            .iter()
            .find(|f| f.name == "main")
            .expect("main function")
    }

    #[test]
    fn empty_program_returns_zero() {
        let module = build_module(&[]);
        assert_eq!(module.functions.len(), 1);

        let main = main_function(&module);
        assert_eq!(block_names(main), ["block0"]);
        assert_eq!(
            main.entry_block().unwrap().instructions,
            vec![
                Instruction::Const {
                    name: "%instr0".into(),
                    ty: Type::Int32,
                    value: "0".into(),
                },
                Instruction::Ret {
                    return_type: Type::Int32,
                    value: Some("%instr0".into()),
                },
            ]
        );
        module.validate().unwrap();
    }

    #[test]
    fn if_creates_then_else_merge() {
        let program = [Stmt::If {
            condition: Expr::boolean(true),
            then_branch: Box::new(Stmt::Print(Expr::number("1"))),
            else_branch: Some(Box::new(Stmt::Print(Expr::number("2")))),
        }];
        let module = build_module(&program);
        let main = main_function(&module);

        assert_eq!(block_names(main), ["block0", "block1", "block2", "block3"]);
        assert_eq!(
            main.entry_block().unwrap().terminator(),
            Some(&Instruction::CondBr {
                condition: "%instr0".into(),
                true_block: "block1".into(),
                false_block: "block2".into(),
            })
        );
        // Both arms fall through to the merge block.
        for arm in ["block1", "block2"] {
            assert_eq!(
                main.block(arm).unwrap().terminator(),
                Some(&Instruction::Br {
                    target: "block3".into(),
                })
            );
        }
        module.validate().unwrap();
    }

    #[test]
    fn if_without_else_still_builds_three_blocks() {
        let program = [Stmt::If {
            condition: Expr::boolean(false),
            then_branch: Box::new(Stmt::Expression(Expr::number("1"))),
            else_branch: None,
        }];
        let module = build_module(&program);
        let main = main_function(&module);

        assert_eq!(block_names(main).len(), 4);
        let else_block = main.block("block2").unwrap();
        assert_eq!(
            else_block.instructions,
            vec![Instruction::Br {
                target: "block3".into(),
            }]
        );
    }

    #[test]
    fn while_loops_back_to_condition() {
        let program = [Stmt::While {
            condition: Expr::binary(BinaryOp::Lt, Expr::ident("i"), Expr::number("10")),
            body: Box::new(Stmt::Expression(Expr::Assign {
                name: "i".into(),
                value: Box::new(Expr::binary(
                    BinaryOp::Add,
                    Expr::ident("i"),
                    Expr::number("1"),
                )),
            })),
        }];
        let module = build_module(&program);
        let main = main_function(&module);

        assert_eq!(block_names(main), ["block0", "block1", "block2", "block3"]);
        assert_eq!(
            main.entry_block().unwrap().terminator(),
            Some(&Instruction::Br {
                target: "block1".into(),
            })
        );
        assert!(matches!(
            main.block("block1").unwrap().terminator(),
            Some(Instruction::CondBr {
                true_block,
                false_block,
                ..
            }) if true_block == "block2" && false_block == "block3"
        ));
        // Back edge.
        assert_eq!(
            main.block("block2").unwrap().terminator(),
            Some(&Instruction::Br {
                target: "block1".into(),
            })
        );
        module.validate().unwrap();
    }

    #[test]
    fn for_chains_body_through_increment() {
        let program = [Stmt::For {
            init: Some(Box::new(Stmt::Var {
                name: "i".into(),
                ty: None,
                init: Some(Expr::number("0")),
            })),
            condition: Expr::binary(BinaryOp::Lt, Expr::ident("i"), Expr::number("3")),
            increment: Some(Expr::Assign {
                name: "i".into(),
                value: Box::new(Expr::binary(
                    BinaryOp::Add,
                    Expr::ident("i"),
                    Expr::number("1"),
                )),
            }),
            body: Box::new(Stmt::Print(Expr::ident("i"))),
        }];
        let module = build_module(&program);
        let main = main_function(&module);

        // entry, cond, body, incr, merge
        assert_eq!(
            block_names(main),
            ["block0", "block1", "block2", "block3", "block4"]
        );
        assert_eq!(
            main.block("block2").unwrap().terminator(),
            Some(&Instruction::Br {
                target: "block3".into(),
            })
        );
        assert_eq!(
            main.block("block3").unwrap().terminator(),
            Some(&Instruction::Br {
                target: "block1".into(),
            })
        );
        module.validate().unwrap();
    }

    #[test]
    fn println_picks_format_from_argument() {
        let module = build_module(&[
            Stmt::Expression(Expr::call(Expr::ident("println"), vec![])),
            Stmt::Expression(Expr::call(
                Expr::ident("println"),
                vec![Expr::string("hi")],
            )),
            Stmt::Expression(Expr::call(Expr::ident("println"), vec![Expr::number("7")])),
        ]);
        let main = main_function(&module);

        let formats: Vec<&str> = main
            .entry_block()
            .unwrap()
            .instructions
            .iter()
            .filter_map(|inst| match inst {
                Instruction::Const {
                    ty: Type::Pointer,
                    value,
                    ..
                } => Some(value.as_str()),
                _ => None,
            })
            .collect();
        assert_eq!(formats, ["\\n", "%s\\n", "hi", "%d\\n"]);
    }

    #[test]
    fn assignment_declares_on_first_write_and_reuses_slot() {
        let module = build_module(&[
            Stmt::Expression(Expr::Assign {
                name: "x".into(),
                value: Box::new(Expr::number("1")),
            }),
            Stmt::Expression(Expr::Assign {
                name: "x".into(),
                value: Box::new(Expr::number("2")),
            }),
        ]);
        let main = main_function(&module);

        let allocas = main
            .entry_block()
            .unwrap()
            .instructions
            .iter()
            .filter(|i| matches!(i, Instruction::Alloca { .. }))
            .count();
        assert_eq!(allocas, 1);
        let stores = main
            .entry_block()
            .unwrap()
            .instructions
            .iter()
            .filter(|i| matches!(i, Instruction::Store { .. }))
            .count();
        assert_eq!(stores, 2);
    }

    #[test]
    fn unbound_identifier_reads_as_zero() {
        let module = build_module(&[Stmt::Expression(Expr::ident("ghost"))]);
        let main = main_function(&module);

        assert_eq!(
            main.entry_block().unwrap().instructions[0],
            Instruction::Const {
                name: "%instr0".into(),
                ty: Type::Int32,
                value: "0".into(),
            }
        );
    }

    #[test]
    fn negation_lowers_as_unary_sub() {
        let module = build_module(&[Stmt::Expression(Expr::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(Expr::number("5")),
        })]);
        let main = main_function(&module);

        assert_eq!(
            main.entry_block().unwrap().instructions[1],
            Instruction::Unary {
                name: "%instr1".into(),
                op: OpCode::Sub,
                ty: Type::Int32,
                operand: "%instr0".into(),
            }
        );
    }

    #[test]
    fn nested_function_gets_fresh_bindings_and_lands_first() {
        let program = [
            Stmt::Var {
                name: "x".into(),
                ty: None,
                init: Some(Expr::number("1")),
            },
            Stmt::Function {
                name: "helper".into(),
                params: vec![],
                body: Box::new(Stmt::Return(Some(Expr::ident("x")))),
            },
            Stmt::Print(Expr::ident("x")),
        ];
        let module = build_module(&program);

        assert_eq!(module.functions.len(), 2);
        assert_eq!(module.functions[0].name, "helper");
        assert_eq!(module.functions[1].name, "main");

        // `x` is unbound inside helper, so its return value is a zero const.
        let helper = &module.functions[0];
        assert!(helper
            .entry_block()
            .unwrap()
            .instructions
            .iter()
            .all(|i| !matches!(i, Instruction::Load { .. })));

        // The outer binding is intact after the function.
        let main = main_function(&module);
        assert!(main
            .entry_block()
            .unwrap()
            .instructions
            .iter()
            .any(|i| matches!(i, Instruction::Load { .. })));
        module.validate().unwrap();
    }

    #[test]
    fn statements_after_return_are_dropped() {
        let module = build_module(&[
            Stmt::Return(Some(Expr::number("1"))),
            Stmt::Print(Expr::number("2")),
        ]);
        let main = main_function(&module);

        let entry = main.entry_block().unwrap();
        assert_eq!(
            entry.terminator(),
            Some(&Instruction::Ret {
                return_type: Type::Int32,
                value: Some("%instr0".into()),
            })
        );
        assert_eq!(entry.instructions.len(), 2);
        module.validate().unwrap();
    }

    #[test]
    fn computed_callee_degrades_to_bare_printf() {
        let module = build_module(&[Stmt::Expression(Expr::call(
            Expr::Grouping(Box::new(Expr::number("3"))),
            vec![Expr::number("4")],
        ))]);
        let main = main_function(&module);

        // No format constant and no lowered arguments, just the call.
        assert_eq!(
            main.entry_block().unwrap().instructions[0],
            Instruction::Call {
                name: "%instr0".into(),
                return_type: Type::Int32,
                callee: "printf".into(),
                args: vec![],
            }
        );
    }

    #[test]
    fn user_calls_lower_arguments_in_order() {
        let module = build_module(&[Stmt::Expression(Expr::call(
            Expr::ident("add"),
            vec![Expr::number("1"), Expr::number("2")],
        ))]);
        let main = main_function(&module);

        assert_eq!(
            main.entry_block().unwrap().instructions[2],
            Instruction::Call {
                name: "%instr2".into(),
                return_type: Type::Int32,
                callee: "add".into(),
                args: vec!["%instr0".into(), "%instr1".into()],
            }
        );
    }
}
