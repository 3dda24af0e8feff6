use harness::{
    ActionIndex, ActionSpace, EnvError, Environment, Info, InfoValue, Observation, RenderFrame,
    StepOutcome,
};
use rand::rngs::StdRng;
use rand::Rng;

pub(crate) const ENV_ID: &str = "SpaceInvaders-v4";

const WIDTH: i32 = 16;
const HEIGHT: i32 = 12;
const PLAYER_ROW: i32 = HEIGHT - 1;
const ALIEN_ROWS: i32 = 3;
const ALIEN_COLS: i32 = 6;
const ALIEN_ROW_POINTS: [f64; ALIEN_ROWS as usize] = [30.0, 20.0, 10.0];
const ALIEN_MOVE_PERIOD: u32 = 4;
const ALIEN_FIRE_CHANCE: f64 = 0.04;
const STARTING_LIVES: u32 = 3;
const CELL_PX: u32 = 8;

// Atari minimal action set layout.
const NOOP: ActionIndex = 0;
const FIRE: ActionIndex = 1;
const RIGHT: ActionIndex = 2;
const LEFT: ActionIndex = 3;
const RIGHTFIRE: ActionIndex = 4;
const LEFTFIRE: ActionIndex = 5;
const NUM_ACTIONS: usize = 6;

const BACKGROUND: [u8; 3] = [0, 0, 0];
const PLAYER_COLOR: [u8; 3] = [50, 200, 80];
const ALIEN_COLOR: [u8; 3] = [220, 220, 220];
const PLAYER_SHOT_COLOR: [u8; 3] = [250, 250, 120];
const ALIEN_SHOT_COLOR: [u8; 3] = [240, 80, 80];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Cell {
    x: i32,
    y: i32,
}

#[derive(Debug, Clone, Copy)]
struct Alien {
    at: Cell,
    points_row: usize,
}

/// Grid-sized stand-in for the arcade game: a formation marches and
/// descends while the player moves along the bottom row and fires upward.
pub(crate) struct Invaders {
    rng: StdRng,
    player_x: i32,
    aliens: Vec<Alien>,
    alien_dir: i32,
    player_shot: Option<Cell>,
    alien_shots: Vec<Cell>,
    lives: u32,
    tick: u32,
    alien_fire_chance: f64,
    over: bool,
    started: bool,
}

impl Invaders {
    pub(crate) fn new(rng: StdRng) -> Self {
        let mut env = Self {
            rng,
            player_x: WIDTH / 2,
            aliens: Vec::new(),
            alien_dir: 1,
            player_shot: None,
            alien_shots: Vec::new(),
            lives: STARTING_LIVES,
            tick: 0,
            alien_fire_chance: ALIEN_FIRE_CHANCE,
            over: false,
            started: false,
        };
        env.spawn_formation();
        env
    }

    fn spawn_formation(&mut self) {
        self.aliens.clear();
        for row in 0..ALIEN_ROWS {
            for col in 0..ALIEN_COLS {
                self.aliens.push(Alien {
                    at: Cell {
                        x: 1 + col * 2,
                        y: 1 + row,
                    },
                    points_row: row as usize,
                });
            }
        }
    }

    fn resolve_player_shot_hit(&mut self) -> f64 {
        let Some(shot) = self.player_shot else {
            return 0.0;
        };
        match self.aliens.iter().position(|alien| alien.at == shot) {
            Some(index) => {
                let alien = self.aliens.swap_remove(index);
                self.player_shot = None;
                ALIEN_ROW_POINTS[alien.points_row]
            }
            None => 0.0,
        }
    }

    fn march_aliens(&mut self) {
        let blocked = self.aliens.iter().any(|alien| {
            let next = alien.at.x + self.alien_dir;
            !(0..WIDTH).contains(&next)
        });
        if blocked {
            for alien in &mut self.aliens {
                alien.at.y += 1;
            }
            self.alien_dir = -self.alien_dir;
        } else {
            for alien in &mut self.aliens {
                alien.at.x += self.alien_dir;
            }
        }
    }

    fn maybe_alien_fire(&mut self) {
        if self.aliens.is_empty() || !self.rng.gen_bool(self.alien_fire_chance) {
            return;
        }
        let index = self.rng.gen_range(0..self.aliens.len());
        let shooter = self.aliens[index];
        self.alien_shots.push(Cell {
            x: shooter.at.x,
            y: shooter.at.y + 1,
        });
    }

    fn advance_alien_shots(&mut self) {
        let player = Cell {
            x: self.player_x,
            y: PLAYER_ROW,
        };
        let mut hits = 0u32;
        self.alien_shots.retain_mut(|shot| {
            shot.y += 1;
            if *shot == player {
                hits += 1;
                return false;
            }
            shot.y < HEIGHT
        });
        self.lives = self.lives.saturating_sub(hits);
    }

    fn is_over(&self) -> bool {
        self.lives == 0
            || self.aliens.is_empty()
            || self.aliens.iter().any(|alien| alien.at.y >= PLAYER_ROW)
    }

    fn observation(&self) -> Observation {
        let mut grid = vec![0.0f32; (WIDTH * HEIGHT) as usize];
        let mut mark = |cell: Cell, value: f32| {
            if (0..WIDTH).contains(&cell.x) && (0..HEIGHT).contains(&cell.y) {
                grid[(cell.y * WIDTH + cell.x) as usize] = value;
            }
        };
        for alien in &self.aliens {
            mark(alien.at, 0.5);
        }
        for shot in &self.alien_shots {
            mark(*shot, 0.25);
        }
        if let Some(shot) = self.player_shot {
            mark(shot, 0.75);
        }
        mark(
            Cell {
                x: self.player_x,
                y: PLAYER_ROW,
            },
            1.0,
        );
        grid
    }
}

impl Environment for Invaders {
    fn action_space(&self) -> ActionSpace {
        ActionSpace::Discrete(NUM_ACTIONS)
    }

    fn reset(&mut self) -> Result<Observation, EnvError> {
        self.player_x = WIDTH / 2;
        self.alien_dir = 1;
        self.player_shot = None;
        self.alien_shots.clear();
        self.lives = STARTING_LIVES;
        self.tick = 0;
        self.over = false;
        self.started = true;
        self.spawn_formation();
        Ok(self.observation())
    }

    fn step(&mut self, action: ActionIndex) -> Result<StepOutcome, EnvError> {
        if !self.started || self.over {
            return Err(EnvError::NotReset);
        }
        let (dx, fire) = match action {
            NOOP => (0, false),
            FIRE => (0, true),
            RIGHT => (1, false),
            LEFT => (-1, false),
            RIGHTFIRE => (1, true),
            LEFTFIRE => (-1, true),
            _ => {
                return Err(EnvError::InvalidAction {
                    action,
                    num_actions: NUM_ACTIONS,
                })
            }
        };
        self.tick += 1;
        self.player_x = (self.player_x + dx).clamp(0, WIDTH - 1);
        if fire && self.player_shot.is_none() {
            self.player_shot = Some(Cell {
                x: self.player_x,
                y: PLAYER_ROW,
            });
        }

        let mut reward = 0.0;
        if let Some(shot) = self.player_shot.as_mut() {
            shot.y -= 1;
            if shot.y < 0 {
                self.player_shot = None;
            }
        }
        reward += self.resolve_player_shot_hit();
        if self.tick % ALIEN_MOVE_PERIOD == 0 {
            self.march_aliens();
            reward += self.resolve_player_shot_hit();
        }
        self.maybe_alien_fire();
        self.advance_alien_shots();

        self.over = self.is_over();
        let mut info = Info::new();
        info.insert("lives", InfoValue::Int(i64::from(self.lives)));
        info.insert("aliens", InfoValue::Int(self.aliens.len() as i64));
        Ok(StepOutcome {
            observation: self.observation(),
            reward,
            done: self.over,
            info,
        })
    }

    fn render(&self) -> Option<RenderFrame> {
        let mut frame =
            RenderFrame::filled(WIDTH as u32 * CELL_PX, HEIGHT as u32 * CELL_PX, BACKGROUND);
        for alien in &self.aliens {
            fill_cell(&mut frame, alien.at, ALIEN_COLOR);
        }
        for shot in &self.alien_shots {
            fill_cell(&mut frame, *shot, ALIEN_SHOT_COLOR);
        }
        if let Some(shot) = self.player_shot {
            fill_cell(&mut frame, shot, PLAYER_SHOT_COLOR);
        }
        fill_cell(
            &mut frame,
            Cell {
                x: self.player_x,
                y: PLAYER_ROW,
            },
            PLAYER_COLOR,
        );
        Some(frame)
    }
}

fn fill_cell(frame: &mut RenderFrame, cell: Cell, color: [u8; 3]) {
    if cell.x < 0 || cell.y < 0 {
        return;
    }
    let (x0, y0) = (cell.x as u32 * CELL_PX, cell.y as u32 * CELL_PX);
    for py in y0 + 1..y0 + CELL_PX - 1 {
        for px in x0 + 1..x0 + CELL_PX - 1 {
            frame.put_pixel(px, py, color);
        }
    }
}
