/*! Turn LumIR into target-facing text.
 *
 * Two renderings live here: the x86_64-flavored instruction stream the
 * pipeline hands to an assembler-shaped consumer, and a colorized IR
 * listing for humans inspecting a module in a terminal.
 */

pub mod annotated;
pub mod config;
pub mod emitter;

pub use annotated::annotate_module;
pub use config::EmitterConfig;
pub use emitter::{lower, storage_width, AsmEmitter};
