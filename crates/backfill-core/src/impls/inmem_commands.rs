//! In-memory command store.
//!
//! Design:
//! - The signature index is the unique constraint: check and insert happen under one
//!   lock, so concurrent inserts of the same signature admit exactly one command.
//! - `insert_all` holds the lock for the whole batch, so a batch is applied entirely or
//!   (when the lock is poisoned) not at all.
//! - Commands are kept in insertion order for inspection.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use crate::domain::{Command, CommandId, CommandSignature};
use crate::ports::{CommandStore, IdGenerator, InsertOutcome, StoreError};

#[derive(Default)]
struct CommandState {
    by_signature: HashMap<CommandSignature, CommandId>,
    commands: Vec<(CommandId, Command)>,
}

impl CommandState {
    fn insert(&mut self, command: Command, id_gen: &impl IdGenerator) -> InsertOutcome {
        let signature = command.signature();
        if self.by_signature.contains_key(&signature) {
            return InsertOutcome::Conflict;
        }
        let id = id_gen.generate_command_id();
        self.by_signature.insert(signature, id);
        self.commands.push((id, command));
        InsertOutcome::Inserted(id)
    }
}

pub struct InMemoryCommandStore<G> {
    state: Mutex<CommandState>,
    id_gen: G,
}

impl<G: IdGenerator> InMemoryCommandStore<G> {
    pub fn new(id_gen: G) -> Self {
        Self {
            state: Mutex::new(CommandState::default()),
            id_gen,
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, CommandState>, StoreError> {
        self.state.lock().map_err(|_| StoreError::Poisoned("commands"))
    }

    pub fn len(&self) -> Result<usize, StoreError> {
        Ok(self.lock()?.commands.len())
    }

    pub fn is_empty(&self) -> Result<bool, StoreError> {
        Ok(self.lock()?.commands.is_empty())
    }

    /// Snapshot of stored commands, in insertion order.
    pub fn commands(&self) -> Result<Vec<(CommandId, Command)>, StoreError> {
        Ok(self.lock()?.commands.clone())
    }
}

impl<G: IdGenerator> CommandStore for InMemoryCommandStore<G> {
    fn exists_equivalent(&self, signature: &CommandSignature) -> Result<bool, StoreError> {
        Ok(self.lock()?.by_signature.contains_key(signature))
    }

    fn insert(&self, command: Command) -> Result<InsertOutcome, StoreError> {
        Ok(self.lock()?.insert(command, &self.id_gen))
    }

    fn insert_all(&self, commands: Vec<Command>) -> Result<Vec<InsertOutcome>, StoreError> {
        let mut state = self.lock()?;
        Ok(commands
            .into_iter()
            .map(|command| state.insert(command, &self.id_gen))
            .collect())
    }
}
