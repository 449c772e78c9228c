#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::IVec2;

/// Intended action for the current turn.
///
/// Trees and state-reaction rules only ever write the intent; resolving it against the map is
/// the host's end-of-turn business.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum GridAction {
    #[default]
    Nop,
    MoveLeft,
    MoveRight,
    MoveDown,
    MoveUp,
}

impl GridAction {
    /// Cardinal step from `from` toward `to` along the dominant axis.
    ///
    /// Ties (including `from == to`) resolve to the vertical axis.
    pub fn towards(from: IVec2, to: IVec2) -> Self {
        // Widened so far-apart or extreme coordinates cannot overflow.
        let dx = i64::from(to.x) - i64::from(from.x);
        let dy = i64::from(to.y) - i64::from(from.y);
        if dx.unsigned_abs() > dy.unsigned_abs() {
            if dx > 0 {
                GridAction::MoveRight
            } else {
                GridAction::MoveLeft
            }
        } else if dy > 0 {
            GridAction::MoveUp
        } else {
            GridAction::MoveDown
        }
    }

    pub fn inverse(self) -> Self {
        match self {
            GridAction::Nop => GridAction::Nop,
            GridAction::MoveLeft => GridAction::MoveRight,
            GridAction::MoveRight => GridAction::MoveLeft,
            GridAction::MoveDown => GridAction::MoveUp,
            GridAction::MoveUp => GridAction::MoveDown,
        }
    }

    /// Grid offset this action would apply.
    pub fn offset(self) -> IVec2 {
        match self {
            GridAction::Nop => IVec2::ZERO,
            GridAction::MoveLeft => IVec2::new(-1, 0),
            GridAction::MoveRight => IVec2::new(1, 0),
            GridAction::MoveDown => IVec2::new(0, -1),
            GridAction::MoveUp => IVec2::new(0, 1),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn towards_prefers_dominant_axis() {
        let origin = IVec2::ZERO;
        assert_eq!(GridAction::towards(origin, IVec2::new(5, 1)), GridAction::MoveRight);
        assert_eq!(GridAction::towards(origin, IVec2::new(-5, 1)), GridAction::MoveLeft);
        assert_eq!(GridAction::towards(origin, IVec2::new(1, 5)), GridAction::MoveUp);
        assert_eq!(GridAction::towards(origin, IVec2::new(2, -2)), GridAction::MoveDown);
    }

    #[test]
    fn towards_handles_extreme_coordinates() {
        let origin = IVec2::ZERO;
        assert_eq!(
            GridAction::towards(origin, IVec2::new(i32::MIN, 0)),
            GridAction::MoveLeft
        );
        assert_eq!(
            GridAction::towards(origin, IVec2::new(0, i32::MIN)),
            GridAction::MoveDown
        );
        assert_eq!(
            GridAction::towards(IVec2::new(i32::MIN, 0), IVec2::new(i32::MAX, 1)),
            GridAction::MoveRight
        );
        assert_eq!(
            GridAction::towards(IVec2::new(0, i32::MAX), IVec2::new(1, i32::MIN)),
            GridAction::MoveDown
        );
    }

    #[test]
    fn inverse_undoes_offset() {
        for action in [
            GridAction::MoveLeft,
            GridAction::MoveRight,
            GridAction::MoveDown,
            GridAction::MoveUp,
        ] {
            assert_eq!(action.offset() + action.inverse().offset(), IVec2::ZERO);
        }
    }
}
