pub mod chat_message;
pub mod document_ingest;
