pub mod llm;
pub mod sse;
pub mod stt;
