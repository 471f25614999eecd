//! Conversation memory - the last merged intent of a session

use crate::intent::Intent;

/// Single-slot memory, owned by one session
#[derive(Debug, Clone, Default)]
pub struct ConversationMemory {
    last_intent: Option<Intent>,
}

impl ConversationMemory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update_intent(&mut self, intent: Intent) {
        self.last_intent = Some(intent);
    }

    pub fn last_intent(&self) -> Option<&Intent> {
        self.last_intent.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::intent::Aggregation;

    #[test]
    fn test_memory_overwrites_last_intent() {
        let mut memory = ConversationMemory::new();
        assert!(memory.last_intent().is_none());

        memory.update_intent(Intent::new("revenue", Aggregation::Sum));
        memory.update_intent(Intent::new("units", Aggregation::Avg));
        assert_eq!(memory.last_intent().and_then(|i| i.metric.as_deref()), Some("units"));
    }

    #[test]
    fn test_sessions_are_isolated() {
        let mut first = ConversationMemory::new();
        let second = ConversationMemory::new();
        first.update_intent(Intent::new("revenue", Aggregation::Sum));
        assert!(second.last_intent().is_none());
    }
}
