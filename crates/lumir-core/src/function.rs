use crate::block::BasicBlock;
use crate::types::Type;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// A function: a name, return type, and its blocks in creation order. The
/// first inserted block is the entry block. Blocks are keyed by name so
/// branch targets resolve without a side table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Function {
    pub name: String,
    pub return_type: Type,
    pub blocks: IndexMap<String, BasicBlock>,
}

impl Function {
    pub fn new(name: impl Into<String>, return_type: Type) -> Self {
        Self {
            name: name.into(),
            return_type,
            blocks: IndexMap::new(),
        }
    }

    /// Insert a block, keyed by its own name. Returns the name for chaining
    /// into the insertion point.
    pub fn add_block(&mut self, block: BasicBlock) -> String {
        let name = block.name.clone();
        self.blocks.insert(name.clone(), block);
        name
    }

    pub fn entry_block(&self) -> Option<&BasicBlock> {
        self.blocks.values().next()
    }

    pub fn block(&self, name: &str) -> Option<&BasicBlock> {
        self.blocks.get(name)
    }

    pub fn block_mut(&mut self, name: &str) -> Option<&mut BasicBlock> {
        self.blocks.get_mut(name)
    }
}
