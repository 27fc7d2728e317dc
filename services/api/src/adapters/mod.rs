pub mod db;
pub mod memory;
pub mod quiz_llm;
pub mod tutor_llm;

pub use db::PgStore;
pub use memory::MemoryStore;
pub use quiz_llm::GeminiQuizAdapter;
pub use tutor_llm::GeminiTutorAdapter;
