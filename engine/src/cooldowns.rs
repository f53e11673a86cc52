use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Ability key → rounds remaining. Entries never sit at zero; they are removed instead.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cooldowns(IndexMap<String, u32>);

impl Cooldowns {
    pub fn remaining(&self, key: &str) -> u32 {
        self.0.get(key).copied().unwrap_or(0)
    }

    pub fn is_on_cooldown(&self, key: &str) -> bool {
        self.remaining(key) > 0
    }

    /// Zero rounds clears the entry.
    pub fn set(&mut self, key: impl Into<String>, rounds: u32) {
        let key = key.into();
        if rounds > 0 {
            self.0.insert(key, rounds);
        } else {
            self.0.shift_remove(&key);
        }
    }

    pub fn clear(&mut self, key: &str) {
        self.0.shift_remove(key);
    }

    pub fn clear_all(&mut self) {
        self.0.clear();
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.0.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Advance one round: every entry drops by one, entries reaching zero are removed.
    pub fn tick(&mut self) {
        self.0.retain(|_, rounds| {
            *rounds = rounds.saturating_sub(1);
            *rounds > 0
        });
    }
}
