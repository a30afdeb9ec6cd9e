use clap::{error::ErrorKind, CommandFactory, Parser};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    io::{self, stdin},
    path::PathBuf,
    process,
    time::Duration,
};
use typetester::{
    config::{Config, ConfigStore, FileConfigStore},
    logging,
    phrase::{self, WordBank},
    runtime::{ChannelSource, Runner, TermEvent},
    session::{Event, FailureRecord, Intent, Phase, Session, PHRASE_FAILURE_NOTE},
    ui, wordbank,
};

/// terminal typing-speed trainer
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "Type the phrase shown on screen as fast as you can. Every character is marked as a hit or a miss while you type, and the clock stops once the whole phrase matches."
)]
pub struct Cli {
    /// number of words in each phrase
    #[clap(short = 'w', long)]
    number_of_words: Option<usize>,

    /// plain text word list, one word per line (defaults to the bundled english list)
    #[clap(long)]
    wordbank: Option<PathBuf>,

    /// fixed random seed for reproducible phrases
    #[clap(long)]
    seed: Option<u64>,

    /// milliseconds between timer redraws
    #[clap(long)]
    tick_rate_ms: Option<u64>,

    /// file to write the log to
    #[clap(long, default_value = logging::DEFAULT_LOG_FILE)]
    log_file: PathBuf,

    /// store the resulting settings as the new defaults
    #[clap(long)]
    save_config: bool,
}

impl Cli {
    /// Command line flags win over the stored config
    fn merge(&self, mut cfg: Config) -> Config {
        if let Some(n) = self.number_of_words {
            cfg.number_of_words = n;
        }
        if let Some(ref path) = self.wordbank {
            cfg.wordbank = Some(path.clone());
        }
        if let Some(seed) = self.seed {
            cfg.seed = Some(seed);
        }
        if let Some(ms) = self.tick_rate_ms {
            cfg.tick_rate_ms = ms;
        }
        cfg
    }
}

/// How long a failure stays on screen without a key press
const ERROR_SCREEN_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug)]
enum ExitType {
    Quit(Duration),
    Failed(FailureRecord),
}

fn load_bank(config: &Config) -> typetester::Result<WordBank> {
    match config.wordbank {
        Some(ref path) => wordbank::load_from_path(path),
        None => wordbank::embedded(wordbank::DEFAULT_LANGUAGE),
    }
}

fn new_session(config: &Config) -> Result<Session, FailureRecord> {
    let bank = load_bank(config)
        .map_err(|e| FailureRecord::new(e, "Fatal error while loading wordbank file: "))?;
    if bank.is_empty() {
        return Err(FailureRecord::new(
            "no words found",
            "Fatal error while loading wordbank file: ",
        ));
    }

    let rng = phrase::seeded_rng(config.seed).map_err(|e| {
        FailureRecord::new(e, "Fatal error occured while generating random seed: ")
    })?;

    Session::new(bank, config.number_of_words, rng)
        .map_err(|e| FailureRecord::new(e, PHRASE_FAILURE_NOTE))
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();

    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let _log_guard = logging::init(&cli.log_file)?;

    let store = FileConfigStore::new();
    let config = cli.merge(store.load());
    if let Err(e) = config.validate() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::ValueValidation, e.to_string()).exit();
    }
    if cli.save_config {
        store.save(&config)?;
        tracing::info!(path = %store.path().display(), "saved config");
    }

    let session = match new_session(&config) {
        Ok(session) => session,
        Err(record) => {
            tracing::error!(%record, "startup failed");
            eprintln!("{record}");
            process::exit(1);
        }
    };

    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let exit = start_tui(&mut terminal, session, &config);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    match exit? {
        ExitType::Quit(elapsed) => {
            println!("Elapsed: {}", ui::format_elapsed(elapsed));
            Ok(())
        }
        ExitType::Failed(record) => {
            eprintln!("{record}");
            process::exit(1);
        }
    }
}

fn start_tui<B: Backend>(
    terminal: &mut Terminal<B>,
    mut session: Session,
    config: &Config,
) -> Result<ExitType, Box<dyn Error>> {
    let runner = Runner::new(
        ChannelSource::terminal(),
        Duration::from_millis(config.tick_rate_ms),
    );

    terminal.draw(|f| f.render_widget(&session.snapshot(), f.area()))?;

    loop {
        let ev = runner.step();
        let intents = match ev {
            TermEvent::Resize => vec![Intent::Render],
            TermEvent::Closed => {
                tracing::warn!("terminal input closed, quitting");
                session.handle(Event::RequestQuit)
            }
            ev => ev
                .session_event()
                .map(|event| session.handle(event))
                .unwrap_or_default(),
        };

        logging::record(&intents);

        let mut redraw = false;
        let mut shutdown = false;
        for intent in &intents {
            match intent {
                Intent::Render => redraw = true,
                Intent::Shutdown => shutdown = true,
                Intent::Finished { elapsed } => {
                    tracing::info!(
                        elapsed = %ui::format_elapsed(*elapsed),
                        chars = session.phrase().len(),
                        "attempt finished"
                    );
                }
                _ => {}
            }
        }

        if shutdown {
            if session.phase() == Phase::Erroring {
                // leave the error on screen until the player acknowledges it
                terminal.draw(|f| f.render_widget(&session.snapshot(), f.area()))?;
                runner.wait_for_key(ERROR_SCREEN_TIMEOUT);
            }
            break;
        }
        if redraw {
            terminal.draw(|f| f.render_widget(&session.snapshot(), f.area()))?;
        }
    }

    match (session.phase(), session.failure()) {
        (Phase::Erroring, Some(record)) => Ok(ExitType::Failed(record.clone())),
        _ => Ok(ExitType::Quit(session.elapsed())),
    }
}
