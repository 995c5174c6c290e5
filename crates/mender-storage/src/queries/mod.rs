pub mod document_ops;
pub mod maintenance;
