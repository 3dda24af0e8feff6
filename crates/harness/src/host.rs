use pixels::{Error as PixelsError, TextureError};
use thiserror::Error;
use tracing::info;
use winit::error::{EventLoopError, OsError};

use crate::binding::Binding;
use crate::env::RenderFrame;
use crate::keys::{KeyCode, KeyEvent, KeyState};
use crate::session::{SessionState, IDLE_ACTION};

#[derive(Debug, Error)]
pub enum HostError {
    #[error("failed to create event loop: {0}")]
    CreateEventLoop(#[source] EventLoopError),
    #[error("failed to create application window: {0}")]
    CreateWindow(#[source] OsError),
    #[error("failed to initialize renderer: {0}")]
    CreateRenderer(#[source] PixelsError),
    #[error("failed to resize render target: {0}")]
    Resize(#[source] TextureError),
    #[error("failed to draw frame: {0}")]
    Render(#[source] PixelsError),
    #[error("window closed ({reason})")]
    WindowClosed { reason: &'static str },
}

impl HostError {
    /// Operator-initiated shutdown rather than a failure.
    pub fn is_shutdown(&self) -> bool {
        matches!(self, HostError::WindowClosed { .. })
    }
}

/// Host input/display system the rollout loop hands control to between
/// ticks.
pub trait Host {
    /// Delivers pending key events into `state` without drawing.
    fn poll_input(&mut self, state: &mut SessionState) -> Result<(), HostError>;

    /// Draws `frame` (when the environment supplied one) and delivers
    /// pending key events into `state`.
    fn present(
        &mut self,
        frame: Option<&RenderFrame>,
        state: &mut SessionState,
    ) -> Result<(), HostError>;
}

impl<T: Host + ?Sized> Host for Box<T> {
    fn poll_input(&mut self, state: &mut SessionState) -> Result<(), HostError> {
        (**self).poll_input(state)
    }

    fn present(
        &mut self,
        frame: Option<&RenderFrame>,
        state: &mut SessionState,
    ) -> Result<(), HostError> {
        (**self).present(frame, state)
    }
}

/// Host with no window and no input source.
#[derive(Debug, Default, Clone, Copy)]
pub struct HeadlessHost;

impl Host for HeadlessHost {
    fn poll_input(&mut self, _state: &mut SessionState) -> Result<(), HostError> {
        Ok(())
    }

    fn present(
        &mut self,
        _frame: Option<&RenderFrame>,
        _state: &mut SessionState,
    ) -> Result<(), HostError> {
        Ok(())
    }
}

/// Routes key events to host controls (restart, pause, quit) and then to
/// the active binding.
pub struct InputRouter {
    binding: Box<dyn Binding>,
}

impl InputRouter {
    pub fn new(binding: Box<dyn Binding>) -> Self {
        Self { binding }
    }

    pub fn dispatch(&self, event: KeyEvent, state: &mut SessionState) -> Result<(), HostError> {
        match event.state {
            KeyState::Pressed => {
                if event.key == KeyCode::ESCAPE {
                    info!(reason = "escape_key", "shutdown_requested");
                    return Err(HostError::WindowClosed {
                        reason: "escape_key",
                    });
                }
                if !event.repeat {
                    self.handle_control_press(event.key, state);
                }
                self.binding.on_press(event.key, state);
            }
            KeyState::Released => self.binding.on_release(event.key, state),
        }
        Ok(())
    }

    /// Releases never arrive for keys held while the window is unfocused,
    /// so losing focus drops the held action.
    pub fn focus_lost(&self, state: &mut SessionState) {
        if state.current_action() != IDLE_ACTION {
            info!(action = state.current_action(), "held_action_released_on_focus_loss");
            state.release_to_idle();
        }
    }

    fn handle_control_press(&self, key: KeyCode, state: &mut SessionState) {
        if key == KeyCode::RETURN {
            state.request_restart();
            info!("restart_requested");
        }
        if key == KeyCode::SPACE {
            state.toggle_pause();
            info!(paused = state.paused, "pause_toggled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::binding::{DefaultBinding, SpaceInvadersBinding};
    use crate::env::ActionSpace;
    use crate::session::SessionConfig;

    fn state() -> SessionState {
        SessionState::new(ActionSpace::Discrete(6), SessionConfig::default()).expect("state")
    }

    #[test]
    fn return_requests_restart() {
        let router = InputRouter::new(Box::new(DefaultBinding));
        let mut state = state();
        router
            .dispatch(KeyEvent::pressed(KeyCode::RETURN), &mut state)
            .expect("dispatch");
        assert!(state.restart_requested);
    }

    #[test]
    fn space_toggles_pause_but_auto_repeat_does_not() {
        let router = InputRouter::new(Box::new(DefaultBinding));
        let mut state = state();
        router
            .dispatch(KeyEvent::pressed(KeyCode::SPACE), &mut state)
            .expect("dispatch");
        assert!(state.paused);

        let repeat = KeyEvent {
            repeat: true,
            ..KeyEvent::pressed(KeyCode::SPACE)
        };
        router.dispatch(repeat, &mut state).expect("dispatch");
        assert!(state.paused);

        router
            .dispatch(KeyEvent::released(KeyCode::SPACE), &mut state)
            .expect("dispatch");
        router
            .dispatch(KeyEvent::pressed(KeyCode::SPACE), &mut state)
            .expect("dispatch");
        assert!(!state.paused);
    }

    #[test]
    fn escape_is_reported_as_shutdown() {
        let router = InputRouter::new(Box::new(DefaultBinding));
        let mut state = state();
        let error = router
            .dispatch(KeyEvent::pressed(KeyCode::ESCAPE), &mut state)
            .expect_err("escape");
        assert!(error.is_shutdown());
    }

    #[test]
    fn focus_loss_releases_held_action_but_keeps_flags() {
        let router = InputRouter::new(Box::new(SpaceInvadersBinding));
        let mut state = state();
        router
            .dispatch(KeyEvent::pressed(KeyCode::LEFT), &mut state)
            .expect("dispatch");
        router
            .dispatch(KeyEvent::pressed(KeyCode::SPACE), &mut state)
            .expect("dispatch");

        router.focus_lost(&mut state);

        assert_eq!(state.current_action(), 0);
        assert!(state.paused);

        router
            .dispatch(KeyEvent::released(KeyCode::LEFT), &mut state)
            .expect("late release");
        assert_eq!(state.current_action(), 0);
    }

    #[test]
    fn movement_keys_reach_binding() {
        let router = InputRouter::new(Box::new(SpaceInvadersBinding));
        let mut state = state();
        router
            .dispatch(KeyEvent::pressed(KeyCode::RIGHT), &mut state)
            .expect("dispatch");
        assert_eq!(state.current_action(), 2);
        router
            .dispatch(KeyEvent::released(KeyCode::RIGHT), &mut state)
            .expect("dispatch");
        assert_eq!(state.current_action(), 0);
    }
}
