pub mod queries;

pub use queries::{
    AskRequest, ChatMessage, ChatRole, CompareRequest, SummarizeRequest, UploadResponse,
};
