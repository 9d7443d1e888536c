pub mod lab_service;
pub mod rag_service;
pub mod retriever;
pub mod session_context;

#[cfg(test)]
pub(crate) mod test_support;
