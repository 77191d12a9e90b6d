use thiserror::Error;

use crate::schema::ActorId;

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("edge {edge} has no start timestamp")]
    MissingTimestamp { edge: u64 },

    #[error("edge {edge} references actor '{actor}' which is not a node of the graph")]
    DanglingEdge { edge: u64, actor: ActorId },
}
