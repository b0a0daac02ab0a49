// src/core/history.rs — Fixed-capacity message history with a pinned prefix
//
// When full, `append` drops the message at `eviction_index` rather than the
// oldest one. With capacity 3 and eviction index 1, slot 0 (the system prompt)
// never leaves and only the two most recent turns survive behind it.

use crate::infra::errors::ReflectError;
use crate::provider::Message;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capacity {
    Bounded(usize),
    Unbounded,
}

#[derive(Debug, Clone)]
pub struct BoundedHistory {
    messages: Vec<Message>,
    capacity: Capacity,
    eviction_index: usize,
}

impl BoundedHistory {
    pub fn new(
        seed: impl IntoIterator<Item = Message>,
        capacity: Capacity,
        eviction_index: usize,
    ) -> Self {
        Self {
            messages: seed.into_iter().collect(),
            capacity,
            eviction_index,
        }
    }

    /// A history that never evicts.
    pub fn unbounded(seed: impl IntoIterator<Item = Message>) -> Self {
        Self::new(seed, Capacity::Unbounded, 0)
    }

    /// Append a message, evicting at `eviction_index` first if the history is
    /// full. Fails with `IndexOutOfRange` if eviction is needed but the index
    /// is past the end, which only happens with a mis-seeded history.
    pub fn append(&mut self, message: Message) -> Result<(), ReflectError> {
        if let Capacity::Bounded(capacity) = self.capacity {
            // A seed longer than capacity is trimmed down on the first append.
            while self.messages.len() >= capacity {
                if self.eviction_index >= self.messages.len() {
                    return Err(ReflectError::IndexOutOfRange {
                        index: self.eviction_index,
                        len: self.messages.len(),
                    });
                }
                self.messages.remove(self.eviction_index);
            }
        }
        self.messages.push(message);
        Ok(())
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

}
