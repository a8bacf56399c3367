pub mod app;
pub mod graphics;
pub mod pixels_renderer;
pub mod surface;
pub mod ticker;

/// Game rules expressed as in-place mutation of an explicit state value.
///
/// The same logic drives the windowed app (`app::run_game`) and the scripted
/// `HeadlessRunner`, so anything a test can replay is exactly what a player sees.
pub trait GameLogic {
    type State;
    type Input;

    fn initial_state(&self) -> Self::State;
    fn apply_input(&self, state: &mut Self::State, input: Self::Input);
    fn tick(&self, state: &mut Self::State);
}

/// One step of a headless script: either a player input or a timer tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Frame<I> {
    Input(I),
    Tick,
}

#[derive(Debug)]
pub struct HeadlessRunner<G: GameLogic> {
    game: G,
    state: G::State,
    ticks: usize,
    inputs: usize,
}

impl<G: GameLogic> HeadlessRunner<G> {
    pub fn new(game: G) -> Self {
        let state = game.initial_state();
        Self::with_state(game, state)
    }

    pub fn with_state(game: G, state: G::State) -> Self {
        Self {
            game,
            state,
            ticks: 0,
            inputs: 0,
        }
    }

    pub fn state(&self) -> &G::State {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut G::State {
        &mut self.state
    }

    pub fn into_state(self) -> G::State {
        self.state
    }

    pub fn ticks(&self) -> usize {
        self.ticks
    }

    pub fn inputs(&self) -> usize {
        self.inputs
    }

    pub fn tick(&mut self) {
        self.game.tick(&mut self.state);
        self.ticks += 1;
    }

    pub fn input(&mut self, input: G::Input) {
        self.game.apply_input(&mut self.state, input);
        self.inputs += 1;
    }

    pub fn step(&mut self, frame: Frame<G::Input>) {
        match frame {
            Frame::Input(input) => self.input(input),
            Frame::Tick => self.tick(),
        }
    }

    pub fn run<I>(&mut self, frames: I)
    where
        I: IntoIterator<Item = Frame<G::Input>>,
    {
        for frame in frames {
            self.step(frame);
        }
    }

    pub fn run_ticks(&mut self, count: usize) {
        for _ in 0..count {
            self.tick();
        }
    }
}
