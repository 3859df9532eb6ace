//! Candy Clock entry point
//!
//! Runs a headless session with a scripted player and logs the feedback a
//! display would show.
//!
//! Usage: `candy-clock [classic|survival|path.json] [seed]`

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use candy_clock::GameConfig;
    use candy_clock::consts::*;
    use candy_clock::display::{LogSink, present};
    use candy_clock::error::ConfigError;
    use candy_clock::sim::{GamePhase, GameState, TickInput, detect_contacts, tick};

    /// Wall-clock frame length fed to the accumulator (30 fps host)
    const FRAME_DT: f32 = 1.0 / 30.0;
    /// Give up after this much simulated time
    const SESSION_LIMIT_SECS: f32 = 600.0;

    /// Scripted controls: stop on target, chase candy, play a few rounds
    struct AutoPlayer {
        retries_left: u32,
        stages_left: u32,
        done: bool,
    }

    impl AutoPlayer {
        fn new() -> Self {
            Self {
                retries_left: 2,
                stages_left: 4,
                done: false,
            }
        }

        fn input(&mut self, state: &GameState) -> TickInput {
            let mut input = TickInput::default();
            match state.phase {
                GamePhase::Idle => input.start = true,
                GamePhase::Running => {
                    input.stop = state.round.elapsed() >= state.round.target_time();
                }
                GamePhase::CountingDown => self.chase(state, &mut input),
                GamePhase::RoundOver => {
                    if self.retries_left > 0 {
                        self.retries_left -= 1;
                        input.retry = true;
                    } else {
                        self.done = true;
                    }
                }
                GamePhase::NextStage => {
                    if self.stages_left > 0 {
                        self.stages_left -= 1;
                        input.next = true;
                    } else {
                        self.done = true;
                    }
                }
                GamePhase::Resolving => {}
            }
            input
        }

        /// Walk toward the nearest reward, away from any obstacle close by
        fn chase(&self, state: &GameState, input: &mut TickInput) {
            let player = state.player.pos;

            let threat = state
                .obstacles
                .iter()
                .filter(|o| o.is_alive())
                .find(|o| (o.pos - player).length() < o.radius + PLAYER_RADIUS + 60.0);
            if let Some(obstacle) = threat {
                input.left = obstacle.pos.x > player.x;
                input.right = !input.left;
                return;
            }

            let nearest = state
                .rewards
                .iter()
                .filter(|r| r.is_alive())
                .min_by(|a, b| {
                    let da = (a.pos - player).length_squared();
                    let db = (b.pos - player).length_squared();
                    da.total_cmp(&db)
                });
            if let Some(reward) = nearest {
                let dx = reward.pos.x - player.x;
                input.left = dx < -4.0;
                input.right = dx > 4.0;
                input.up = dx.abs() < 40.0 && reward.pos.y < player.y - 40.0;
            }
        }
    }

    /// Fixed-step session driver
    struct Session {
        state: GameState,
        player: AutoPlayer,
        sink: LogSink,
        accumulator: f32,
    }

    impl Session {
        fn new(state: GameState) -> Self {
            Self {
                state,
                player: AutoPlayer::new(),
                sink: LogSink::new(),
                accumulator: 0.0,
            }
        }

        /// Run simulation ticks for one host frame
        fn update(&mut self, dt: f32) {
            let dt = dt.min(0.1);
            self.accumulator += dt;

            let mut substeps = 0;
            while self.accumulator >= SIM_DT && substeps < MAX_SUBSTEPS {
                let mut input = self.player.input(&self.state);
                input.contacts = detect_contacts(&self.state);
                tick(&mut self.state, &input, SIM_DT);
                self.accumulator -= SIM_DT;
                substeps += 1;

                let events = self.state.drain_events();
                present(&events, &mut self.sink);
            }
        }

        fn run(&mut self) {
            let mut simulated = 0.0;
            while !self.player.done && simulated < SESSION_LIMIT_SECS {
                self.update(FRAME_DT);
                simulated += FRAME_DT;
            }
            log::info!(
                "Session over after {:.1}s: level {}, score {}",
                simulated,
                self.state.round.level,
                self.state.round.score
            );
        }
    }

    fn setup() -> Result<GameState, ConfigError> {
        let mut args = std::env::args().skip(1);
        let config = match args.next() {
            Some(arg) => GameConfig::from_arg(&arg)?,
            None => GameConfig::default(),
        };
        let seed = match args.next() {
            Some(arg) => arg.parse().unwrap_or_else(|_| {
                log::warn!("Invalid seed {:?}, using a random one", arg);
                rand::random()
            }),
            None => rand::random(),
        };
        log::info!("Seed: {}", seed);
        GameState::try_new(config, seed)
    }

    pub fn main() {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
        log::info!("Candy Clock (native) starting...");

        match setup() {
            Ok(state) => Session::new(state).run(),
            Err(e) => {
                log::error!("Failed to start: {}", e);
                std::process::exit(1);
            }
        }
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    native::main();
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Web hosts drive the library directly
}
