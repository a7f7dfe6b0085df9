// File-backed stack repository

use crate::library::serialization::{create_backup, read_library, write_library};
use crate::library::types::StackLibrary;
use crate::library::{PersistenceError, RepositoryError, StackRepository};
use crate::messaging::notification::{Notification, NotificationCategory, Notifier};
use crate::sequencer::{StackId, TempoStack};
use std::path::{Path, PathBuf};

/// Stacks kept in memory and written to a JSON file after every change
///
/// Load failures fall back to the built-in sample stack. Save failures are
/// logged and leave the repository dirty; nothing retries on its own.
pub struct FileStackRepository {
    path: PathBuf,
    stacks: Vec<TempoStack>,
    dirty: bool,
    notifier: Notifier,
}

impl FileStackRepository {
    /// Open the library at `path`, seeding it on first run
    pub fn open<P: AsRef<Path>>(path: P) -> Self {
        Self::open_with_notifier(path, Notifier::disabled())
    }

    pub fn open_with_notifier<P: AsRef<Path>>(path: P, notifier: Notifier) -> Self {
        let path = path.as_ref().to_path_buf();
        let mut repository = Self {
            path,
            stacks: Vec::new(),
            dirty: false,
            notifier,
        };

        if !repository.path.exists() {
            println!(
                "No stack library at {}, seeding sample stack",
                repository.path.display()
            );
            repository.stacks = StackLibrary::seeded().stacks;
            repository.save_logged();
            return repository;
        }

        match read_library(&repository.path) {
            Ok(library) => repository.stacks = library.stacks,
            Err(e) => repository.recover_from_load_error(e),
        }
        repository
    }

    fn recover_from_load_error(&mut self, error: PersistenceError) {
        eprintln!("Failed to load stack library: {}", error);
        match create_backup(&self.path) {
            Ok(backup_path) => eprintln!("Created backup at: {:?}", backup_path),
            Err(e) => eprintln!("{}", e),
        }
        self.notifier.send(Notification::warning(
            NotificationCategory::Storage,
            format!("Stack library unreadable, using sample stack: {}", error),
        ));
        self.stacks = StackLibrary::seeded().stacks;
        // Keep the broken file until the user changes something
        self.dirty = true;
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Whether in-memory changes are missing from disk
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Write the library now
    pub fn save(&mut self) -> Result<(), PersistenceError> {
        write_library(&StackLibrary::new(self.stacks.clone()), &self.path)?;
        self.dirty = false;
        Ok(())
    }

    fn save_logged(&mut self) {
        if let Err(e) = self.save() {
            self.dirty = true;
            eprintln!("Failed to save stack library: {}", e);
            self.notifier.send(Notification::error(
                NotificationCategory::Storage,
                format!("Failed to save stacks: {}", e),
            ));
        }
    }

    fn index_of(&self, id: StackId) -> Result<usize, RepositoryError> {
        self.stacks
            .iter()
            .position(|s| s.id == id)
            .ok_or(RepositoryError::StackNotFound(id))
    }

    fn check_index(&self, index: usize) -> Result<(), RepositoryError> {
        if index >= self.stacks.len() {
            return Err(RepositoryError::IndexOutOfRange {
                index,
                len: self.stacks.len(),
            });
        }
        Ok(())
    }
}

impl StackRepository for FileStackRepository {
    fn list(&self) -> Vec<TempoStack> {
        self.stacks.clone()
    }

    fn get(&self, id: StackId) -> Option<TempoStack> {
        self.stacks.iter().find(|s| s.id == id).cloned()
    }

    fn add(&mut self, stack: TempoStack) -> Result<(), RepositoryError> {
        stack.validate()?;
        if self.stacks.iter().any(|s| s.id == stack.id) {
            return Err(RepositoryError::DuplicateStack(stack.id));
        }
        self.stacks.push(stack);
        self.save_logged();
        Ok(())
    }

    fn remove(&mut self, id: StackId) -> Result<TempoStack, RepositoryError> {
        let index = self.index_of(id)?;
        let removed = self.stacks.remove(index);
        self.save_logged();
        Ok(removed)
    }

    fn reorder(&mut self, from: usize, to: usize) -> Result<(), RepositoryError> {
        self.check_index(from)?;
        self.check_index(to)?;
        if from != to {
            let stack = self.stacks.remove(from);
            self.stacks.insert(to, stack);
            self.save_logged();
        }
        Ok(())
    }

    fn update(&mut self, stack: TempoStack) -> Result<(), RepositoryError> {
        stack.validate()?;
        let index = self.index_of(stack.id)?;
        self.stacks[index] = stack;
        self.save_logged();
        Ok(())
    }
}
