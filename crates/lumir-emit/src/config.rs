use serde::{Deserialize, Serialize};

/// Knobs for the assembly emitter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmitterConfig {
    /// Emit a `; ...` comment line ahead of each lowered instruction group.
    /// With comments off, `Const` and `Phi` produce no output at all.
    pub include_comments: bool,
}

impl Default for EmitterConfig {
    fn default() -> Self {
        Self {
            include_comments: true,
        }
    }
}
