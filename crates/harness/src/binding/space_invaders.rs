use crate::keys::KeyCode;
use crate::session::{ActionIndex, SessionState, IDLE_ACTION};

use super::Binding;

const FIRE: ActionIndex = 1;
const RIGHT: ActionIndex = 2;
const LEFT: ActionIndex = 3;

/// WASD / arrow movement with `c` to fire. Up and down have no
/// counterpart in the game and alias to idle.
#[derive(Debug, Clone, Copy, Default)]
pub struct SpaceInvadersBinding;

impl Binding for SpaceInvadersBinding {
    fn resolve(&self, key: KeyCode) -> ActionIndex {
        const W: KeyCode = KeyCode::from_char('w');
        const A: KeyCode = KeyCode::from_char('a');
        const S: KeyCode = KeyCode::from_char('s');
        const D: KeyCode = KeyCode::from_char('d');
        const C: KeyCode = KeyCode::from_char('c');

        match key {
            W | KeyCode::UP => IDLE_ACTION,
            A | KeyCode::LEFT => LEFT,
            S | KeyCode::DOWN => IDLE_ACTION,
            D | KeyCode::RIGHT => RIGHT,
            C => FIRE,
            _ => IDLE_ACTION,
        }
    }

    fn describe(&self, _state: &SessionState) -> String {
        [
            "Use WASD or arrow keys to move left and right.",
            "Use C to shoot.",
        ]
        .join("\n")
    }

    fn name(&self) -> &'static str {
        "space_invaders"
    }
}
