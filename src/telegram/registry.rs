//! Lookup tables from dispatch keys to handlers.
//!
//! Both tables are filled once at startup and shared read-only afterwards.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;

use crate::telegram::action::Domain;
use crate::telegram::bot::MenuCommand;
use crate::telegram::event::InboundEvent;
use crate::telegram::flows::FlowError;
use crate::telegram::reply::Reply;

/// One step of a conversation: turns an event into the reply to show.
#[async_trait]
pub trait Handler: Send + Sync {
    async fn handle(&self, event: &InboundEvent) -> Result<Reply, FlowError>;
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("handler for '{0}' is registered twice")]
    Duplicate(String),
}

pub struct HandlerRegistry<K> {
    handlers: HashMap<K, Arc<dyn Handler>>,
}

impl<K> HandlerRegistry<K>
where
    K: Eq + Hash + fmt::Debug,
{
    pub fn new() -> Self {
        Self {
            handlers: HashMap::new(),
        }
    }

    /// Adds a handler. A key can only be claimed once.
    pub fn register(&mut self, key: K, handler: Arc<dyn Handler>) -> Result<(), RegistryError> {
        if self.handlers.contains_key(&key) {
            return Err(RegistryError::Duplicate(format!("{:?}", key)));
        }
        self.handlers.insert(key, handler);
        Ok(())
    }

    pub fn resolve(&self, key: &K) -> Option<Arc<dyn Handler>> {
        self.handlers.get(key).cloned()
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl<K> Default for HandlerRegistry<K>
where
    K: Eq + Hash + fmt::Debug,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Commands keyed by exact menu text, callbacks keyed by token domain.
#[derive(Default)]
pub struct Registries {
    pub commands: HandlerRegistry<MenuCommand>,
    pub callbacks: HandlerRegistry<Domain>,
}
