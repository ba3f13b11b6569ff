//! Colorized IR listing for terminal output. Rendering mirrors the plain
//! textual form; only the coloring differs, so piping through `NO_COLOR`
//! yields the canonical text.

use colored::Colorize;
use lumir_core::Module;
use std::fmt::Write;

pub fn annotate_module(module: &Module) -> String {
    let mut out = String::new();
    writeln!(out, "{} @{}", "module".blue().bold(), module.name).unwrap();
    writeln!(out).unwrap();
    for func in &module.functions {
        writeln!(
            out,
            "{} {} @{}() {{",
            "define".blue().bold(),
            func.return_type.to_string().green(),
            func.name.bold()
        )
        .unwrap();
        for block in func.blocks.values() {
            writeln!(out, "{}:", block.name.yellow()).unwrap();
            for inst in &block.instructions {
                match inst.result_name() {
                    Some(name) => {
                        writeln!(out, "  {} = {}", name.cyan(), inst).unwrap()
                    }
                    None => writeln!(out, "  {inst}").unwrap(),
                }
            }
            writeln!(out).unwrap();
        }
        writeln!(out, "}}").unwrap();
        writeln!(out).unwrap();
    }
    out
}
