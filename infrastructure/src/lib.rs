pub mod chunker;
pub mod config;
pub mod document_loader;
pub mod embedder;
pub mod index_store;
pub mod ollama_client;
pub mod vector_index;
