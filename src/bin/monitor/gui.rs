use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use doa::{
    component::ComponentResult,
    estimator::EstimationResult,
    gui::{render_polar, DoaGuiError, PolarView},
    simulator::SimulatedSource,
    source::{AudioSource, Capture},
};
use log::{debug, warn};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Frame, Terminal,
};
use std::{
    io,
    sync::mpsc::{Receiver, RecvError, Sender, TryRecvError},
    time::{Duration, Instant},
};

const BEARING_STEP: f64 = 5.0;
const NOISE_STEP: f32 = 0.05;

/// The channels connecting the UI to the pipeline threads.
pub struct Pipeline {
    pub capture_tx: Sender<Capture>,
    pub result_rx: Receiver<ComponentResult<EstimationResult>>,
    pub recorder: Option<(Sender<Capture>, Receiver<ComponentResult<Capture>>)>,
}

struct App {
    source: SimulatedSource,
    pipeline: Pipeline,
    view: PolarView,
    in_flight: bool,
    estimates: usize,
}

impl App {
    fn new(source: SimulatedSource, pipeline: Pipeline) -> App {
        let view = PolarView {
            true_bearing: Some(source.bearing()),
            ..PolarView::default()
        };
        App {
            source,
            pipeline,
            view,
            in_flight: false,
            estimates: 0,
        }
    }

    /// Collects any finished estimate and, once the estimator is idle,
    /// records the next clap.
    fn on_tick(&mut self) -> Result<(), DoaGuiError> {
        match self.pipeline.result_rx.try_recv() {
            Ok(Ok(result)) => {
                self.in_flight = false;
                self.estimates += 1;
                debug!("estimate #{}: {}", self.estimates, result);
                self.view.estimate = Some(result);
            }
            Ok(Err(e)) => {
                self.in_flight = false;
                return Err(e.into());
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => return Err(DoaGuiError::MPSCRecvError(RecvError)),
        }

        if let Some((_, recorded_rx)) = &self.pipeline.recorder {
            while let Ok(recorded) = recorded_rx.try_recv() {
                if let Err(e) = recorded {
                    warn!("recording failed: {}", e);
                }
            }
        }

        if !self.in_flight {
            let capture = self.source.capture()?;
            if let Some((record_tx, _)) = &self.pipeline.recorder {
                record_tx.send(capture.clone())?;
            }
            self.pipeline.capture_tx.send(capture)?;
            self.in_flight = true;
        }

        self.view.true_bearing = Some(self.source.bearing());
        self.view.status = format!(
            "noise {:.2} | estimates {} | <Left>/<Right> move source, <+>/<-> noise, <Q> quit",
            self.source.noise(),
            self.estimates
        );
        Ok(())
    }

    fn on_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Left => self.source.set_bearing(self.source.bearing() - BEARING_STEP),
            KeyCode::Right => self.source.set_bearing(self.source.bearing() + BEARING_STEP),
            KeyCode::Char('+') => self.source.set_noise(self.source.noise() + NOISE_STEP),
            KeyCode::Char('-') => self.source.set_noise(self.source.noise() - NOISE_STEP),
            _ => {}
        }
        self.view.true_bearing = Some(self.source.bearing());
    }
}

pub fn engage_gui(source: SimulatedSource, pipeline: Pipeline) -> Result<(), DoaGuiError> {
    // setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // create app and run it
    let tick_rate = Duration::from_millis(250);
    let app = App::new(source, pipeline);
    let res = run_app(&mut terminal, app, tick_rate);

    // restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    res
}

fn run_app<B: Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    tick_rate: Duration,
) -> Result<(), DoaGuiError> {
    let mut last_tick = Instant::now();
    loop {
        terminal.draw(|f| ui(f, &app))?;

        let timeout = tick_rate
            .checked_sub(last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    if let KeyCode::Char('q') = key.code {
                        return Ok(());
                    }
                    app.on_key(key.code);
                }
            }
        }
        if last_tick.elapsed() >= tick_rate {
            app.on_tick()?;
            last_tick = Instant::now();
        }
    }
}

fn ui(f: &mut Frame, app: &App) {
    let area = f.size();
    render_polar(f, area, &app.view);
}
