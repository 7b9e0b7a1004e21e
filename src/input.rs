//! Player input state
//!
//! Pointer position and the set of held keys, as last reported by the host.

use std::collections::BTreeSet;

use glam::Vec2;

/// Movement direction driven by keys
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Arrow key and WASD names (lowercase) for this direction
    pub fn keys(self) -> [&'static str; 2] {
        match self {
            Direction::Up => ["arrowup", "w"],
            Direction::Down => ["arrowdown", "s"],
            Direction::Left => ["arrowleft", "a"],
            Direction::Right => ["arrowright", "d"],
        }
    }

    /// Unit impulse in screen coordinates (y grows downward)
    pub fn vector(self) -> Vec2 {
        match self {
            Direction::Up => Vec2::new(0.0, -1.0),
            Direction::Down => Vec2::new(0.0, 1.0),
            Direction::Left => Vec2::new(-1.0, 0.0),
            Direction::Right => Vec2::new(1.0, 0.0),
        }
    }
}

/// Keys currently held, stored lowercase
#[derive(Debug, Clone, Default)]
pub struct KeySet {
    held: BTreeSet<String>,
}

impl KeySet {
    pub fn press(&mut self, key: &str) {
        self.held.insert(key.to_lowercase());
    }

    pub fn release(&mut self, key: &str) {
        self.held.remove(&key.to_lowercase());
    }

    /// Any key at all is held (directional or not)
    pub fn any(&self) -> bool {
        !self.held.is_empty()
    }

    pub fn is_held(&self, direction: Direction) -> bool {
        direction.keys().iter().any(|k| self.held.contains(*k))
    }
}

/// Pointer and keyboard state consumed by manual mode
#[derive(Debug, Clone, Default)]
pub struct InputState {
    pub pointer: Vec2,
    pub keys: KeySet,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_keys_are_case_insensitive() {
        let mut keys = KeySet::default();
        keys.press("ArrowUp");
        assert!(keys.is_held(Direction::Up));
        keys.release("arrowup");
        assert!(!keys.any());
    }

    #[test]
    fn test_wasd_aliases() {
        let mut keys = KeySet::default();
        keys.press("D");
        assert!(keys.is_held(Direction::Right));
        assert!(!keys.is_held(Direction::Left));
    }

    #[test]
    fn test_non_directional_key_counts_as_held() {
        let mut keys = KeySet::default();
        keys.press("Shift");
        assert!(keys.any());
        assert!(Direction::ALL.iter().all(|d| !keys.is_held(*d)));
    }
}
