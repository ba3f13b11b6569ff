/*! Statement-tree to LumIR lowering.
 *
 * Front ends produce a small statement/expression tree; this crate walks it
 * once and emits the control-flow graph form defined in `lumir-core`. The
 * builder owns all naming (`%instr{n}` values, `block{n}` labels) and the
 * canonical shapes for `if`/`while`/`for`, so every front end gets the same
 * IR for the same control flow.
 */

pub mod ast;
pub mod builder;

pub use ast::{BinaryOp, Expr, LiteralKind, Stmt, UnaryOp};
pub use builder::{build_module, IrBuilder};
