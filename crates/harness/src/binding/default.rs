use crate::keys::KeyCode;
use crate::session::{ActionIndex, SessionState, IDLE_ACTION};

use super::Binding;

/// A key selects the action at its offset from `'0'`: digits pick actions
/// 1 to 9, and the keys after `'9'` (`:`, `;`, `<` ...) reach 10 and up.
/// Offsets outside the action space are filtered by the press/release rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultBinding;

impl Binding for DefaultBinding {
    fn resolve(&self, key: KeyCode) -> ActionIndex {
        key.0
            .checked_sub(u32::from(b'0'))
            .map_or(IDLE_ACTION, |offset| offset as ActionIndex)
    }

    fn describe(&self, state: &SessionState) -> String {
        [
            format!("ACTIONS={}", state.num_actions()),
            "Press keys 1 2 3 ... to take actions 1 2 3 ...".to_string(),
            "No keys pressed is taking action 0".to_string(),
        ]
        .join("\n")
    }

    fn name(&self) -> &'static str {
        "default"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::ActionSpace;
    use crate::session::SessionConfig;

    #[test]
    fn digits_resolve_to_their_value() {
        let binding = DefaultBinding;
        for digit in 0..=9u32 {
            assert_eq!(
                binding.resolve(KeyCode(u32::from(b'0') + digit)),
                digit as usize
            );
        }
    }

    #[test]
    fn keys_below_zero_resolve_to_idle() {
        let binding = DefaultBinding;
        for key in [
            KeyCode::UNKNOWN,
            KeyCode::SPACE,
            KeyCode::from_char('/'),
        ] {
            assert_eq!(binding.resolve(key), IDLE_ACTION);
        }
    }

    #[test]
    fn keys_past_nine_reach_large_action_spaces() {
        let binding = DefaultBinding;
        assert_eq!(binding.resolve(KeyCode::from_char(':')), 10);
        assert_eq!(binding.resolve(KeyCode::from_char('A')), 17);

        let mut state = SessionState::new(ActionSpace::Discrete(18), SessionConfig::default())
            .expect("state");
        binding.on_press(KeyCode::from_char(':'), &mut state);
        assert_eq!(state.current_action(), 10);
        binding.on_press(KeyCode::from_char('A'), &mut state);
        assert_eq!(state.current_action(), 17);
        binding.on_release(KeyCode::from_char('A'), &mut state);
        assert_eq!(state.current_action(), IDLE_ACTION);
    }

    #[test]
    fn offsets_outside_small_action_space_are_ignored() {
        let binding = DefaultBinding;
        let mut state = SessionState::new(ActionSpace::Discrete(4), SessionConfig::default())
            .expect("state");
        binding.on_press(KeyCode::from_char('2'), &mut state);
        for key in [
            KeyCode::from_char(':'),
            KeyCode::from_char('z'),
            KeyCode::LEFT,
            KeyCode::RETURN,
            KeyCode(u32::MAX),
        ] {
            binding.on_press(key, &mut state);
            binding.on_release(key, &mut state);
        }
        assert_eq!(state.current_action(), 2);
    }

    #[test]
    fn describe_reports_action_count() {
        let state = SessionState::new(ActionSpace::Discrete(5), SessionConfig::default())
            .expect("state");
        let text = DefaultBinding.describe(&state);
        assert!(text.starts_with("ACTIONS=5"));
    }
}
