use domain::models::Document;
use domain::session::{ConversationTurn, Session};
use infrastructure::vector_index::VectorIndex;

/// Everything one user session owns: ingested documents, their index and
/// the conversation history. Passed explicitly to every service call.
#[derive(Debug, Default)]
pub struct SessionContext {
    session: Session,
    documents: Vec<Document>,
    index: VectorIndex,
}

impl SessionContext {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            session: Session::new(id),
            documents: Vec::new(),
            index: VectorIndex::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.session.id
    }

    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    pub fn index(&self) -> &VectorIndex {
        &self.index
    }

    pub fn history(&self) -> &[ConversationTurn] {
        self.session.history()
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Swap in a fully built document set, e.g. a stored snapshot.
    pub fn replace_index(&mut self, documents: Vec<Document>, index: VectorIndex) {
        self.documents = documents;
        self.index = index;
    }

    pub fn clear_index(&mut self) {
        self.documents.clear();
        self.index = VectorIndex::new();
    }

    pub fn clear_history(&mut self) {
        self.session.clear();
    }

    pub(crate) fn record(&mut self, turn: ConversationTurn) {
        self.session.record(turn);
    }
}
