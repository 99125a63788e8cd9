//! Combat resolution shared by soldiers and buildings.
//!
//! Subtraction model with no defender bonus: the larger force wins and keeps
//! the difference. A tie leaves the defender in place with zero troops.

use std::cmp::Ordering;

use super::{Num, Owner};

/// Soldiers are reinforced by one troop on every turn `t` with
/// `t % SOLDIER_GROWTH_PERIOD == 1`, except turn 1.
pub const SOLDIER_GROWTH_PERIOD: u32 = 25;

/// Outcome of resolving incoming troops against a cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AttackResult {
    /// Same owner; troops merged.
    Reinforced,
    /// Attacker outnumbered the defender and took the cell.
    Captured,
    /// Defender held; its count dropped by the attacking amount.
    Repelled,
}

/// Apply `amount` troops from `attacker` to a cell holding `num` troops
/// owned by `owner`, mutating both in place.
pub fn resolve_attack(num: &mut Num, owner: &mut Owner, amount: Num, attacker: Owner) -> AttackResult {
    if *owner == attacker {
        *num = num.saturating_add(amount);
        return AttackResult::Reinforced;
    }

    match (*num).cmp(&amount) {
        Ordering::Less => {
            *owner = attacker;
            *num = amount - *num;
            AttackResult::Captured
        }
        Ordering::Equal | Ordering::Greater => {
            *num -= amount;
            AttackResult::Repelled
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reinforcement_adds() {
        let (mut num, mut owner) = (4, 1);
        assert_eq!(resolve_attack(&mut num, &mut owner, 6, 1), AttackResult::Reinforced);
        assert_eq!((num, owner), (10, 1));
    }

    #[test]
    fn test_capture_keeps_difference() {
        let (mut num, mut owner) = (4, 1);
        assert_eq!(resolve_attack(&mut num, &mut owner, 9, 2), AttackResult::Captured);
        assert_eq!((num, owner), (5, 2));
    }

    #[test]
    fn test_tie_is_repelled() {
        let (mut num, mut owner) = (7, 1);
        assert_eq!(resolve_attack(&mut num, &mut owner, 7, 2), AttackResult::Repelled);
        assert_eq!((num, owner), (0, 1));
    }

    #[test]
    fn test_neutral_castle_capture() {
        let (mut num, mut owner) = (15, 0);
        assert_eq!(resolve_attack(&mut num, &mut owner, 16, 3), AttackResult::Captured);
        assert_eq!((num, owner), (1, 3));
    }

    #[test]
    fn test_reinforcement_saturates() {
        let (mut num, mut owner) = (Num::MAX - 1, 1);
        resolve_attack(&mut num, &mut owner, 10, 1);
        assert_eq!(num, Num::MAX);
    }
}
