use harness::{
    ActionIndex, ActionSpace, EnvError, Environment, Info, InfoValue, Observation, RenderFrame,
    StepOutcome,
};
use rand::rngs::StdRng;
use rand::Rng;

pub(crate) const ENV_ID: &str = "Catch-v0";

const WIDTH: i32 = 8;
const HEIGHT: i32 = 10;
const PADDLE_HALF_WIDTH: i32 = 1;
const BALLS_PER_EPISODE: u32 = 10;
const CELL_PX: u32 = 4;

const NOOP: ActionIndex = 0;
const LEFT: ActionIndex = 1;
const RIGHT: ActionIndex = 2;
const NUM_ACTIONS: usize = 3;

const BACKGROUND: [u8; 3] = [12, 12, 20];
const BALL_COLOR: [u8; 3] = [240, 200, 60];
const PADDLE_COLOR: [u8; 3] = [90, 200, 240];

/// A ball drops from the top row; steer the paddle underneath it.
pub(crate) struct Catch {
    rng: StdRng,
    ball: (i32, i32),
    paddle_x: i32,
    balls_left: u32,
    caught: u32,
    started: bool,
}

impl Catch {
    pub(crate) fn new(rng: StdRng) -> Self {
        let mut env = Self {
            rng,
            ball: (0, 0),
            paddle_x: WIDTH / 2,
            balls_left: BALLS_PER_EPISODE,
            caught: 0,
            started: false,
        };
        env.spawn_ball();
        env
    }

    fn spawn_ball(&mut self) {
        self.ball = (self.rng.gen_range(0..WIDTH), 0);
    }

    fn observation(&self) -> Observation {
        let mut grid = vec![0.0f32; (WIDTH * HEIGHT) as usize];
        for dx in -PADDLE_HALF_WIDTH..=PADDLE_HALF_WIDTH {
            grid[cell_index(self.paddle_x + dx, HEIGHT - 1)] = 0.5;
        }
        grid[cell_index(self.ball.0, self.ball.1)] = 1.0;
        grid
    }
}

fn cell_index(x: i32, y: i32) -> usize {
    (y * WIDTH + x) as usize
}

impl Environment for Catch {
    fn action_space(&self) -> ActionSpace {
        ActionSpace::Discrete(NUM_ACTIONS)
    }

    fn reset(&mut self) -> Result<Observation, EnvError> {
        self.paddle_x = WIDTH / 2;
        self.balls_left = BALLS_PER_EPISODE;
        self.caught = 0;
        self.started = true;
        self.spawn_ball();
        Ok(self.observation())
    }

    fn step(&mut self, action: ActionIndex) -> Result<StepOutcome, EnvError> {
        if !self.started || self.balls_left == 0 {
            return Err(EnvError::NotReset);
        }
        let dx = match action {
            NOOP => 0,
            LEFT => -1,
            RIGHT => 1,
            _ => {
                return Err(EnvError::InvalidAction {
                    action,
                    num_actions: NUM_ACTIONS,
                })
            }
        };
        self.paddle_x = (self.paddle_x + dx).clamp(PADDLE_HALF_WIDTH, WIDTH - 1 - PADDLE_HALF_WIDTH);
        self.ball.1 += 1;

        let mut reward = 0.0;
        if self.ball.1 == HEIGHT - 1 {
            if (self.ball.0 - self.paddle_x).abs() <= PADDLE_HALF_WIDTH {
                reward = 1.0;
                self.caught += 1;
            } else {
                reward = -1.0;
            }
            self.balls_left -= 1;
        }
        let observation = self.observation();
        if self.ball.1 == HEIGHT - 1 && self.balls_left > 0 {
            self.spawn_ball();
        }

        let mut info = Info::new();
        info.insert("balls_left", InfoValue::Int(i64::from(self.balls_left)));
        info.insert("caught", InfoValue::Int(i64::from(self.caught)));
        Ok(StepOutcome {
            observation,
            reward,
            done: self.balls_left == 0,
            info,
        })
    }

    fn render(&self) -> Option<RenderFrame> {
        let mut frame =
            RenderFrame::filled(WIDTH as u32 * CELL_PX, HEIGHT as u32 * CELL_PX, BACKGROUND);
        for dx in -PADDLE_HALF_WIDTH..=PADDLE_HALF_WIDTH {
            fill_cell(&mut frame, self.paddle_x + dx, HEIGHT - 1, PADDLE_COLOR);
        }
        fill_cell(&mut frame, self.ball.0, self.ball.1, BALL_COLOR);
        Some(frame)
    }
}

fn fill_cell(frame: &mut RenderFrame, x: i32, y: i32, color: [u8; 3]) {
    if x < 0 || y < 0 {
        return;
    }
    let (x0, y0) = (x as u32 * CELL_PX, y as u32 * CELL_PX);
    for py in y0..y0 + CELL_PX {
        for px in x0..x0 + CELL_PX {
            frame.put_pixel(px, py, color);
        }
    }
}
