pub mod classifier;
pub mod extraction;
pub mod notify;
pub mod persistence;
pub mod pipeline;
pub mod queue;
pub mod statement;
pub mod storage;
