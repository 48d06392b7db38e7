// coderoom-common: shared types and wire protocol for the coderoom workspace

pub mod protocol;
pub mod types;
