#![forbid(unsafe_code)]

pub mod repository;
pub mod sqlite;

pub use repository::{
    ExamListing, InMemoryRepository, QuestionBank, ResultRepository, ResultRow, Storage,
    StorageError,
};
