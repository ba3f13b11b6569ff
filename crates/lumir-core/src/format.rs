//! Deterministic textual form of the IR. Names and labels print exactly as
//! assigned by the builder's counters, so two identical compilations render
//! byte-identical text.

use crate::block::BasicBlock;
use crate::function::Function;
use crate::module::Module;
use std::fmt::Write;

pub fn format_module(module: &Module) -> String {
    let mut output = String::new();
    writeln!(&mut output, "module @{}", module.name).unwrap();
    writeln!(&mut output).unwrap();
    for func in &module.functions {
        write!(&mut output, "{}", format_function(func)).unwrap();
        writeln!(&mut output).unwrap();
    }
    output
}

pub fn format_function(func: &Function) -> String {
    let mut output = String::new();
    writeln!(&mut output, "define {} @{}() {{", func.return_type, func.name).unwrap();
    for block in func.blocks.values() {
        write!(&mut output, "{}", format_block(block)).unwrap();
        writeln!(&mut output).unwrap();
    }
    writeln!(&mut output, "}}").unwrap();
    output
}

pub fn format_block(block: &BasicBlock) -> String {
    let mut output = String::new();
    writeln!(&mut output, "{}:", block.name).unwrap();
    for inst in &block.instructions {
        match inst.result_name() {
            Some(name) => writeln!(&mut output, "  {} = {}", name, inst).unwrap(),
            None => writeln!(&mut output, "  {}", inst).unwrap(),
        }
    }
    output
}

impl std::fmt::Display for Module {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", format_module(self))
    }
}

impl std::fmt::Display for Function {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", format_function(self))
    }
}

impl std::fmt::Display for BasicBlock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", format_block(self))
    }
}
