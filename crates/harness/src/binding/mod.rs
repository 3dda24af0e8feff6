//! Key-code to action-index bindings.
//!
//! A binding is stateless: it resolves key codes to actions and applies
//! press/release rules to the shared [`SessionState`]. Only one non-idle
//! action is held at a time, and releasing it returns to idle.

mod default;
mod space_invaders;

use crate::keys::KeyCode;
use crate::session::{ActionIndex, SessionState, IDLE_ACTION};

pub use default::DefaultBinding;
pub use space_invaders::SpaceInvadersBinding;

pub trait Binding {
    /// Total over every key code; keys outside the binding's table resolve to
    /// the idle action.
    fn resolve(&self, key: KeyCode) -> ActionIndex;

    fn describe(&self, state: &SessionState) -> String;

    fn name(&self) -> &'static str;

    /// The idle action cannot be selected by a dedicated key.
    fn on_press(&self, key: KeyCode, state: &mut SessionState) {
        let action = self.resolve(key);
        if !is_selectable(action, state) {
            return;
        }
        state.set_current_action(action);
    }

    fn on_release(&self, key: KeyCode, state: &mut SessionState) {
        let action = self.resolve(key);
        if !is_selectable(action, state) {
            return;
        }
        if state.current_action() == action {
            state.release_to_idle();
        }
    }
}

fn is_selectable(action: ActionIndex, state: &SessionState) -> bool {
    action != IDLE_ACTION && state.is_valid_action(action)
}

pub fn binding_for_env(env_id: &str) -> Box<dyn Binding> {
    if env_id.starts_with("SpaceInvaders") {
        Box::new(SpaceInvadersBinding)
    } else {
        Box::new(DefaultBinding)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::ActionSpace;
    use crate::session::SessionConfig;

    fn state_with_actions(num_actions: usize) -> SessionState {
        SessionState::new(ActionSpace::Discrete(num_actions), SessionConfig::default())
            .expect("state")
    }

    #[test]
    fn space_invaders_ids_select_space_invaders_binding() {
        assert_eq!(binding_for_env("SpaceInvaders-v4").name(), "space_invaders");
        assert_eq!(
            binding_for_env("SpaceInvadersNoFrameskip-v4").name(),
            "space_invaders"
        );
        assert_eq!(binding_for_env("Catch-v0").name(), "default");
    }

    #[test]
    fn press_then_release_of_every_action_round_trips_to_idle() {
        let binding = DefaultBinding;
        let mut state = state_with_actions(4);
        for action in 1..4u32 {
            let key = KeyCode(u32::from(b'0') + action);
            binding.on_press(key, &mut state);
            assert_eq!(state.current_action(), action as usize);
            binding.on_release(key, &mut state);
            assert_eq!(state.current_action(), IDLE_ACTION);
        }
    }

    #[test]
    fn release_of_other_key_keeps_held_action() {
        let binding = DefaultBinding;
        let mut state = state_with_actions(4);
        binding.on_press(KeyCode::from_char('2'), &mut state);
        binding.on_press(KeyCode::from_char('3'), &mut state);
        binding.on_release(KeyCode::from_char('2'), &mut state);
        assert_eq!(state.current_action(), 3);
    }

    #[test]
    fn release_of_held_action_returns_to_idle_not_previous() {
        let binding = DefaultBinding;
        let mut state = state_with_actions(4);
        binding.on_press(KeyCode::from_char('1'), &mut state);
        binding.on_press(KeyCode::from_char('2'), &mut state);
        binding.on_release(KeyCode::from_char('2'), &mut state);
        assert_eq!(state.current_action(), IDLE_ACTION);
    }

    #[test]
    fn idle_key_press_does_not_clear_held_action() {
        let binding = DefaultBinding;
        let mut state = state_with_actions(4);
        binding.on_press(KeyCode::from_char('2'), &mut state);
        binding.on_press(KeyCode::from_char('0'), &mut state);
        assert_eq!(state.current_action(), 2);
    }

    #[test]
    fn release_with_nothing_held_is_noop() {
        let binding = DefaultBinding;
        let mut state = state_with_actions(4);
        binding.on_release(KeyCode::from_char('3'), &mut state);
        assert_eq!(state.current_action(), IDLE_ACTION);
    }

    #[test]
    fn action_beyond_space_is_ignored() {
        let binding = DefaultBinding;
        let mut state = state_with_actions(3);
        binding.on_press(KeyCode::from_char('1'), &mut state);
        binding.on_press(KeyCode::from_char('5'), &mut state);
        assert_eq!(state.current_action(), 1);
        binding.on_release(KeyCode::from_char('5'), &mut state);
        assert_eq!(state.current_action(), 1);
    }
}
