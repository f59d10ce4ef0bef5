//! Custom block definitions
//!
//! Custom blocks are built in two phases: every definition in a scene is
//! declared first (so bodies can call each other, or themselves), then each
//! body is attached once.

use super::{BlockId, ProtoBlock, Shape, Stack};
use crate::errors::DefinitionError;
use crate::stdlib::procedures::CallRoutine;
use std::fmt;
use std::sync::{Arc, OnceLock};

pub struct Procedure {
    id: BlockId,
    signature: String,
    params: Vec<String>,
    warp: bool,
    body: OnceLock<Stack>,
}

impl Procedure {
    /// Declare a procedure. `signature` doubles as the call block's opcode.
    pub fn new(
        id: impl Into<BlockId>,
        signature: impl Into<String>,
        params: Vec<String>,
        warp: bool,
    ) -> Self {
        Self {
            id: id.into(),
            signature: signature.into(),
            params,
            warp,
            body: OnceLock::new(),
        }
    }

    /// Identity of the definition, used by the recursion guard
    pub fn id(&self) -> &BlockId {
        &self.id
    }

    pub fn signature(&self) -> &str {
        &self.signature
    }

    pub fn params(&self) -> &[String] {
        &self.params
    }

    /// Warp procedures run to completion without yielding
    pub fn is_warp(&self) -> bool {
        self.warp
    }

    /// Attach the body. Only the first call succeeds.
    pub fn define(&self, body: impl Into<Stack>) -> Result<(), DefinitionError> {
        self.body
            .set(body.into())
            .map_err(|_| DefinitionError::BodyAlreadyDefined(self.signature.clone()))
    }

    pub fn body(&self) -> Option<&Stack> {
        self.body.get()
    }

    pub fn is_defined(&self) -> bool {
        self.body.get().is_some()
    }

    /// The prototype for call blocks of this procedure: one any-value input per
    /// parameter.
    pub fn proto(self: &Arc<Self>) -> Result<ProtoBlock, DefinitionError> {
        let procedure = self.clone();
        self.params
            .iter()
            .fold(ProtoBlock::builder(self.signature.clone()), |builder, param| {
                builder.input(param.clone(), Shape::any())
            })
            .routine(move |block, _cx| Ok(Box::new(CallRoutine::new(block.clone(), procedure.clone()))))
            .build()
    }
}

impl fmt::Debug for Procedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Procedure")
            .field("id", &self.id)
            .field("signature", &self.signature)
            .field("params", &self.params)
            .field("warp", &self.warp)
            .field("defined", &self.is_defined())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::block::Block;

    fn empty() -> Vec<Arc<Block>> {
        Vec::new()
    }

    #[test]
    fn test_body_attaches_once() {
        let procedure = Procedure::new("def-1", "jump %s", vec!["height".to_string()], false);
        assert!(!procedure.is_defined());

        procedure.define(empty()).unwrap();
        assert!(procedure.is_defined());

        assert_eq!(
            procedure.define(empty()).unwrap_err(),
            DefinitionError::BodyAlreadyDefined("jump %s".to_string())
        );
    }

    #[test]
    fn test_proto_declares_params() {
        let procedure = Arc::new(Procedure::new(
            "def-2",
            "draw %s %s",
            vec!["size".to_string(), "color".to_string()],
            true,
        ));
        let proto = procedure.proto().unwrap();
        assert_eq!(proto.opcode(), "draw %s %s");
        let names: Vec<&str> = proto.inputs().keys().map(String::as_str).collect();
        assert_eq!(names, vec!["size", "color"]);
    }
}
