pub mod history;
pub mod metrics;
pub mod rag_client;
pub mod spool;

pub use rag_client::RagClient;
pub use spool::SpooledFile;
