//! JSON round-tripping for modules. Useful for snapshotting IR between
//! pipeline stages or shipping it to external tooling; the core does no
//! file I/O itself.

use crate::module::Module;
use crate::Result;

pub fn to_json(module: &Module) -> Result<String> {
    Ok(serde_json::to_string_pretty(module)?)
}

pub fn from_json(json: &str) -> Result<Module> {
    Ok(serde_json::from_str(json)?)
}
