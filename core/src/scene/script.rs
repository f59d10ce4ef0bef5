use crate::block::{Block, BlockId, Hat, Stack};
use crate::errors::DefinitionError;
use std::sync::Arc;

/// An ordered run of top-level blocks, optionally headed by a hat
#[derive(Debug)]
pub struct Script {
    blocks: Stack,
}

impl Script {
    /// Blocks must be non-empty, and only the first may be a hat
    pub fn new(blocks: impl Into<Stack>) -> Result<Arc<Script>, DefinitionError> {
        let blocks: Stack = blocks.into();
        if blocks.is_empty() {
            return Err(DefinitionError::EmptyScript);
        }
        if let Some(hat) = blocks.iter().skip(1).find(|b| b.hat().is_some()) {
            return Err(DefinitionError::MisplacedHat {
                block: hat.id().to_string(),
            });
        }
        Ok(Arc::new(Script { blocks }))
    }

    pub fn blocks(&self) -> &Stack {
        &self.blocks
    }

    pub fn top(&self) -> &Arc<Block> {
        &self.blocks[0]
    }

    /// Identity used to match running threads to this script
    pub fn top_id(&self) -> &BlockId {
        self.top().id()
    }

    pub fn hat(&self) -> Option<&Hat> {
        self.top().hat()
    }

    pub fn hat_block(&self) -> Option<&Arc<Block>> {
        self.hat().map(|_| self.top())
    }

    /// The blocks a thread runs: everything after the hat
    pub fn body(&self) -> Stack {
        if self.hat().is_some() {
            self.blocks[1..].iter().cloned().collect()
        } else {
            self.blocks.clone()
        }
    }
}
