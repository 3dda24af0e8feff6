use std::fmt;

use thiserror::Error;

use crate::session::ActionIndex;

/// Flattened numeric observation.
pub type Observation = Vec<f32>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActionSpace {
    Discrete(usize),
    Continuous { dims: usize },
}

impl fmt::Display for ActionSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ActionSpace::Discrete(n) => write!(f, "Discrete({n})"),
            ActionSpace::Continuous { dims } => write!(f, "Continuous(dims={dims})"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum InfoValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

/// Small ordered key/value map returned alongside each step.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Info {
    entries: Vec<(String, InfoValue)>,
}

impl Info {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: InfoValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, slot)) => *slot = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&InfoValue> {
        self.entries
            .iter()
            .find(|(existing, _)| existing == key)
            .map(|(_, value)| value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct StepOutcome {
    pub observation: Observation,
    pub reward: f64,
    pub done: bool,
    pub info: Info,
}

/// RGB8 frame, row-major, three bytes per pixel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderFrame {
    pub width: u32,
    pub height: u32,
    pub rgb: Vec<u8>,
}

impl RenderFrame {
    pub fn filled(width: u32, height: u32, color: [u8; 3]) -> Self {
        let pixel_count = width as usize * height as usize;
        let mut rgb = Vec::with_capacity(pixel_count * 3);
        for _ in 0..pixel_count {
            rgb.extend_from_slice(&color);
        }
        Self { width, height, rgb }
    }

    pub fn put_pixel(&mut self, x: u32, y: u32, color: [u8; 3]) {
        if x >= self.width || y >= self.height {
            return;
        }
        let offset = (y as usize * self.width as usize + x as usize) * 3;
        self.rgb[offset..offset + 3].copy_from_slice(&color);
    }
}

#[derive(Debug, Error)]
pub enum EnvError {
    #[error("unknown environment id '{id}' (known: {known})")]
    UnknownId { id: String, known: String },
    #[error("action {action} is outside the action space of {num_actions} actions")]
    InvalidAction {
        action: ActionIndex,
        num_actions: usize,
    },
    #[error("environment stepped before reset")]
    NotReset,
    #[error("environment failure: {0}")]
    Other(String),
}

/// Simulation collaborator driven by the rollout loop.
pub trait Environment {
    fn action_space(&self) -> ActionSpace;
    fn reset(&mut self) -> Result<Observation, EnvError>;
    fn step(&mut self, action: ActionIndex) -> Result<StepOutcome, EnvError>;
    fn render(&self) -> Option<RenderFrame> {
        None
    }
}

impl<T: Environment + ?Sized> Environment for Box<T> {
    fn action_space(&self) -> ActionSpace {
        (**self).action_space()
    }

    fn reset(&mut self) -> Result<Observation, EnvError> {
        (**self).reset()
    }

    fn step(&mut self, action: ActionIndex) -> Result<StepOutcome, EnvError> {
        (**self).step(action)
    }

    fn render(&self) -> Option<RenderFrame> {
        (**self).render()
    }
}
