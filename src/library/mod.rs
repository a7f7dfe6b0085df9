// Library module - Saved tempo stacks

pub mod repository;
pub mod serialization;
pub mod types;

pub use repository::FileStackRepository;
pub use serialization::{
    create_backup, decode_library, encode_library, read_library, write_library,
};
pub use types::{FormatVersion, StackLibrary};

use crate::sequencer::{StackId, TempoStack, ValidationError};
use thiserror::Error;

/// Errors while reading or writing the library file
#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("File system error: {0}")]
    FileSystem(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid stored stack: {0}")]
    Invalid(String),

    #[error("Unsupported library version {found} (expected {expected})")]
    UnsupportedVersion {
        found: FormatVersion,
        expected: FormatVersion,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors returned by repository operations
#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("Stack not found: {0}")]
    StackNotFound(StackId),

    #[error("Stack already exists: {0}")]
    DuplicateStack(StackId),

    #[error("Index {index} out of range for {len} stacks")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("Invalid stack: {0}")]
    Invalid(#[from] ValidationError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

/// Ordered collection of saved stacks
///
/// Mutations take effect in memory immediately. Implementations decide
/// how and when they reach storage.
pub trait StackRepository {
    /// All stacks in display order
    fn list(&self) -> Vec<TempoStack>;

    fn get(&self, id: StackId) -> Option<TempoStack>;

    /// Append a stack to the end of the list
    fn add(&mut self, stack: TempoStack) -> Result<(), RepositoryError>;

    fn remove(&mut self, id: StackId) -> Result<TempoStack, RepositoryError>;

    /// Move the stack at `from` so it ends up at index `to`
    fn reorder(&mut self, from: usize, to: usize) -> Result<(), RepositoryError>;

    /// Replace the stack with the same id
    fn update(&mut self, stack: TempoStack) -> Result<(), RepositoryError>;
}

/// Find a stack by exact name, falling back to a 1-based position
pub fn find_stack(repository: &dyn StackRepository, query: &str) -> Option<TempoStack> {
    let stacks = repository.list();
    if let Some(stack) = stacks.iter().find(|s| s.name == query) {
        return Some(stack.clone());
    }
    query
        .parse::<usize>()
        .ok()
        .and_then(|n| n.checked_sub(1))
        .and_then(|i| stacks.get(i).cloned())
}
