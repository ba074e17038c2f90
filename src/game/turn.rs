//! Per-turn flow flags shared between weapons and the match

use super::events::GameEvent;

/// Whether the current turn has been spent.
///
/// Weapons signal a forced end of turn through [`TurnFlow::use_turn`]; the
/// external game flow reads the flags and decides when to advance.
#[derive(Debug, Clone, Default)]
pub struct TurnFlow {
    used_turn: bool,
    movement_only: bool,
}

impl TurnFlow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn used_turn(&self) -> bool {
        self.used_turn
    }

    /// Grubs may still move but weapons no longer poll input
    pub fn movement_only(&self) -> bool {
        self.movement_only
    }

    /// Spend the turn. The `TurnEnded` notification is emitted once per turn.
    pub fn use_turn(&mut self, team: usize, forced: bool, events: &mut Vec<GameEvent>) {
        self.movement_only = true;
        if self.used_turn {
            return;
        }
        self.used_turn = true;
        events.push(GameEvent::TurnEnded { team, forced });
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_end_is_signalled_once() {
        let mut turn = TurnFlow::new();
        let mut events = Vec::new();

        turn.use_turn(0, true, &mut events);
        turn.use_turn(0, true, &mut events);

        assert!(turn.used_turn());
        assert!(turn.movement_only());
        assert_eq!(events.len(), 1);

        turn.reset();
        assert!(!turn.used_turn());
        assert!(!turn.movement_only());
    }
}
