//! Name-to-command registry.

use crate::builtin::{Exit, Factory, Help, Pwd};
use crate::command::CommandFactory;
use crate::listing::{Ls, Lt};
use crate::procfs::Ps;
use std::collections::HashMap;

/// Registry of available commands, keyed by name.
///
/// Built once at start-up and handed to the [`Interpreter`](crate::Interpreter); read-only
/// while commands run.
pub struct CommandRegistry {
    commands: HashMap<&'static str, Box<dyn CommandFactory>>,
}

impl CommandRegistry {
    /// Create an empty command registry.
    pub fn new() -> Self {
        Self {
            commands: HashMap::new(),
        }
    }

    /// Register a command. Replaces any existing command with the same name.
    pub fn register(&mut self, factory: Box<dyn CommandFactory>) {
        let name = factory.name();
        if self.commands.insert(name, factory).is_some() {
            log::warn!("command '{name}' registered twice; keeping the last registration");
        }
    }

    pub fn lookup(&self, name: &str) -> Option<&dyn CommandFactory> {
        self.commands.get(name).map(Box::as_ref)
    }

    /// All registered commands, sorted by name.
    pub fn commands(&self) -> Vec<&dyn CommandFactory> {
        let mut all: Vec<&dyn CommandFactory> = self.commands.values().map(Box::as_ref).collect();
        all.sort_by_key(|c| c.name());
        all
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Default for CommandRegistry {
    /// Registry with every built-in command: `help`, `ls`, `lt`, `ps`, `pwd`, `exit`.
    fn default() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(Factory::<Help>::default()));
        registry.register(Box::new(Factory::<Ls>::default()));
        registry.register(Box::new(Factory::<Lt>::default()));
        registry.register(Box::new(Factory::<Ps>::default()));
        registry.register(Box::new(Factory::<Pwd>::default()));
        registry.register(Box::new(Factory::<Exit>::default()));
        registry
    }
}
