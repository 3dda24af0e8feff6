use std::sync::Arc;
use std::time::Duration;

use pixels::{Pixels, SurfaceTexture};
use tracing::{info, warn};
use winit::dpi::LogicalSize;
use winit::event::{ElementState, Event, WindowEvent};
use winit::event_loop::EventLoop;
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowBuilder};

use crate::env::RenderFrame;
use crate::host::{Host, HostError, InputRouter};
use crate::keys::{key_code_from_physical, KeyEvent, KeyState};
use crate::session::SessionState;

#[derive(Debug, Clone)]
pub struct WindowConfig {
    pub title: String,
    pub frame_width: u32,
    pub frame_height: u32,
    pub scale: u32,
}

enum PumpedInput {
    Key(KeyEvent),
    FocusLost,
}

/// Window host driven from the rollout loop: every refresh pumps the winit
/// event loop without blocking and routes key events to the session.
pub struct WindowHost {
    event_loop: EventLoop<()>,
    window: Arc<Window>,
    pixels: Pixels<'static>,
    frame_width: u32,
    frame_height: u32,
    router: InputRouter,
}

impl WindowHost {
    pub fn new(config: WindowConfig, router: InputRouter) -> Result<Self, HostError> {
        let frame_width = config.frame_width.max(1);
        let frame_height = config.frame_height.max(1);
        let scale = config.scale.max(1);

        let event_loop = EventLoop::new().map_err(HostError::CreateEventLoop)?;
        let window = Arc::new(
            WindowBuilder::new()
                .with_title(config.title.clone())
                .with_inner_size(LogicalSize::new(
                    (frame_width * scale) as f64,
                    (frame_height * scale) as f64,
                ))
                .build(&event_loop)
                .map_err(HostError::CreateWindow)?,
        );
        let size = window.inner_size();
        let surface = SurfaceTexture::new(size.width, size.height, Arc::clone(&window));
        let pixels = Pixels::new(frame_width, frame_height, surface)
            .map_err(HostError::CreateRenderer)?;
        info!(
            title = %config.title,
            frame_width,
            frame_height,
            scale,
            "window_created"
        );

        Ok(Self {
            event_loop,
            window,
            pixels,
            frame_width,
            frame_height,
            router,
        })
    }

    fn pump(&mut self, state: &mut SessionState) -> Result<(), HostError> {
        let window_id = self.window.id();
        let mut inputs = Vec::<PumpedInput>::new();
        let mut resized_to = None;
        let mut close_requested = false;

        let status = self
            .event_loop
            .pump_events(Some(Duration::ZERO), |event, _target| {
                let Event::WindowEvent { window_id: id, event } = event else {
                    return;
                };
                if id != window_id {
                    return;
                }
                match event {
                    WindowEvent::CloseRequested => close_requested = true,
                    WindowEvent::Resized(size) => resized_to = Some((size.width, size.height)),
                    WindowEvent::Focused(false) => inputs.push(PumpedInput::FocusLost),
                    WindowEvent::KeyboardInput { event, .. } => {
                        inputs.push(PumpedInput::Key(KeyEvent {
                            key: key_code_from_physical(event.physical_key),
                            state: match event.state {
                                ElementState::Pressed => KeyState::Pressed,
                                ElementState::Released => KeyState::Released,
                            },
                            repeat: event.repeat,
                        }))
                    }
                    _ => {}
                }
            });

        if close_requested || matches!(status, PumpStatus::Exit(_)) {
            info!(reason = "window_close", "shutdown_requested");
            return Err(HostError::WindowClosed {
                reason: "window_close",
            });
        }
        if let Some((width, height)) = resized_to {
            if width > 0 && height > 0 {
                self.pixels
                    .resize_surface(width, height)
                    .map_err(HostError::Resize)?;
            }
        }
        for input in inputs {
            match input {
                PumpedInput::Key(event) => self.router.dispatch(event, state)?,
                PumpedInput::FocusLost => self.router.focus_lost(state),
            }
        }
        Ok(())
    }

    fn draw(&mut self, frame: &RenderFrame) -> Result<(), HostError> {
        if frame.width == 0 || frame.height == 0 {
            return Ok(());
        }
        if frame.width != self.frame_width || frame.height != self.frame_height {
            self.pixels
                .resize_buffer(frame.width, frame.height)
                .map_err(HostError::Resize)?;
            self.frame_width = frame.width;
            self.frame_height = frame.height;
        }

        let target = self.pixels.frame_mut();
        if target.len() / 4 != frame.rgb.len() / 3 {
            warn!(
                expected_pixels = target.len() / 4,
                actual_pixels = frame.rgb.len() / 3,
                "frame_size_mismatch"
            );
            return Ok(());
        }
        blit_rgb_into_rgba(&frame.rgb, target);
        Ok(())
    }
}

impl Host for WindowHost {
    fn poll_input(&mut self, state: &mut SessionState) -> Result<(), HostError> {
        self.pump(state)
    }

    fn present(
        &mut self,
        frame: Option<&RenderFrame>,
        state: &mut SessionState,
    ) -> Result<(), HostError> {
        self.pump(state)?;
        if let Some(frame) = frame {
            self.draw(frame)?;
        }
        self.pixels.render().map_err(HostError::Render)
    }
}

fn blit_rgb_into_rgba(rgb: &[u8], rgba: &mut [u8]) {
    for (src, dst) in rgb.chunks_exact(3).zip(rgba.chunks_exact_mut(4)) {
        dst[..3].copy_from_slice(src);
        dst[3] = 255;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blit_expands_rgb_to_opaque_rgba() {
        let rgb = [1, 2, 3, 4, 5, 6];
        let mut rgba = [0u8; 8];
        blit_rgb_into_rgba(&rgb, &mut rgba);
        assert_eq!(rgba, [1, 2, 3, 255, 4, 5, 6, 255]);
    }
}
