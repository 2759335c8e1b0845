pub mod ui;

use clap::{error::ErrorKind, CommandFactory, Parser, Subcommand};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    tty::IsTty,
};
use fastlegend::{
    app_dirs::AppDirs,
    build_leaderboard, compute_metrics_with,
    history::{HistoryRecord, ResultsLog},
    leaderboard::Leaderboard,
    phrases::{CorpusPhraseProvider, FixedPhraseProvider, PhraseProvider},
    poller::{self, LeaderboardSnapshot, PollHandle},
    preferences::{
        AppConfig, ColorMode, ConfigOverrides, FilePreferenceStore, PreferencesManager, Theme,
    },
    runtime::{AppEvent, CrosstermEventSource, Runner, TICK_RATE},
    service::{
        parse_leaderboard, HttpClient, LeaderboardService, Registration, RegistrationOutcome,
        RegistrationService, StaticLeaderboard,
    },
    session::{InputOutcome, TypingSession},
    util::round1,
    FastLegendError, FlResult, LeaderboardEntry, MetricsResult, Mode, ScoringPolicy,
};
use ratatui::{
    backend::{Backend, CrosstermBackend},
    Terminal,
};
use std::{
    error::Error,
    fs::{self, File},
    io::{self, stdin},
    path::PathBuf,
    sync::Mutex,
    time::Duration,
};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "FASTLEGEND_LOG";

/// terminal typing speed test with live scoring and a global leaderboard
#[derive(Parser, Debug, Clone)]
#[clap(
    version,
    about,
    long_about = "A terminal typing speed test with time, words, quote and zen modes, live WPM and accuracy, personal bests and a global leaderboard."
)]
pub struct Cli {
    /// test mode (defaults to the saved preference)
    #[clap(short = 'm', long, value_enum)]
    mode: Option<Mode>,

    /// seconds in time mode, word count in words mode
    #[clap(short = 'd', long, value_parser = clap::value_parser!(u32).range(1..))]
    duration: Option<u32>,

    /// custom prompt to use instead of the built-in phrases
    #[clap(short = 'p', long)]
    prompt: Option<String>,

    /// colour theme (defaults to the saved preference)
    #[clap(short = 't', long, value_enum)]
    theme: Option<Theme>,

    /// light or dark text (defaults to the saved preference)
    #[clap(long, value_enum)]
    color_mode: Option<ColorMode>,

    /// seconds between leaderboard refreshes
    #[clap(long, default_value_t = 30, value_parser = clap::value_parser!(u64).range(1..))]
    poll_secs: u64,

    /// store mode, duration, theme and colour mode as the new defaults
    #[clap(long)]
    save_defaults: bool,

    /// base url of the leaderboard service; the bundled sample board is used when absent
    #[clap(long, global = true)]
    api_url: Option<String>,

    /// preferences file to use instead of the platform config dir
    #[clap(long, global = true)]
    preferences: Option<PathBuf>,

    /// results log to use instead of the platform data dir
    #[clap(long, global = true)]
    history: Option<PathBuf>,

    #[clap(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone)]
enum Command {
    /// score a typed string against its target and print the result as json
    Score {
        /// the text that should have been typed
        target: String,
        /// the text that was typed
        input: String,
        /// time taken in milliseconds
        #[clap(short = 'e', long, default_value_t = 60_000, allow_negative_numbers = true)]
        elapsed_ms: i64,
        #[clap(short = 'm', long, value_enum, default_value_t = Mode::Time)]
        mode: Mode,
        /// deduct half a word per error from wpm
        #[clap(long)]
        penalized: bool,
    },
    /// print the ranked leaderboard including your own bests
    Leaderboard {
        /// read entries from a json file instead of the service
        #[clap(long)]
        entries: Option<PathBuf>,
        /// number of rows to show
        #[clap(short = 'n', long, default_value_t = fastlegend::leaderboard::DISPLAY_LIMIT)]
        top: usize,
    },
    /// create an account so your results appear on the leaderboard
    Register {
        username: String,
        mobile: String,
        #[clap(default_value = "")]
        country: String,
    },
    /// show personal bests and recent results
    Stats {
        /// number of recent results to list
        #[clap(short = 'n', long, default_value_t = 10)]
        recent: usize,
        /// forget personal bests and totals first, keeping settings and profile
        #[clap(long)]
        reset: bool,
    },
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            mode: self.mode,
            duration: self.duration,
            theme: self.theme,
            color_mode: self.color_mode,
            prompt: self.prompt.clone(),
            api_url: self.api_url.clone(),
            poll_interval: Some(Duration::from_secs(self.poll_secs)),
        }
    }

    fn preference_store(&self) -> FilePreferenceStore {
        match &self.preferences {
            Some(path) => FilePreferenceStore::with_path(path),
            None => FilePreferenceStore::new(),
        }
    }

    fn results_log(&self) -> ResultsLog {
        match &self.history {
            Some(path) => ResultsLog::with_path(path),
            None => ResultsLog::new(),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum AppState {
    Typing,
    Results,
    Leaderboard,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

#[derive(Debug)]
pub struct App {
    pub config: AppConfig,
    pub session: TypingSession,
    pub state: AppState,
    /// screen to go back to from the leaderboard
    pub return_to: AppState,
    pub prefs: PreferencesManager<FilePreferenceStore>,
    pub results_log: ResultsLog,
    pub snapshot: LeaderboardSnapshot,
    pub last_result: Option<MetricsResult>,
    pub status: Option<String>,
}

impl App {
    pub fn new(
        config: AppConfig,
        prefs: PreferencesManager<FilePreferenceStore>,
        results_log: ResultsLog,
        snapshot: LeaderboardSnapshot,
    ) -> Result<Self, FastLegendError> {
        let provider: Box<dyn PhraseProvider + Send> = match &config.prompt {
            Some(prompt) => Box::new(FixedPhraseProvider::new(prompt.clone())),
            None => Box::new(CorpusPhraseProvider::embedded()?),
        };
        Ok(Self::with_provider(
            config,
            provider,
            prefs,
            results_log,
            snapshot,
        ))
    }

    pub fn with_provider(
        config: AppConfig,
        provider: Box<dyn PhraseProvider + Send>,
        prefs: PreferencesManager<FilePreferenceStore>,
        results_log: ResultsLog,
        snapshot: LeaderboardSnapshot,
    ) -> Self {
        Self {
            session: TypingSession::new(config.session, provider),
            config,
            state: AppState::Typing,
            return_to: AppState::Typing,
            prefs,
            results_log,
            snapshot,
            last_result: None,
            status: None,
        }
    }

    /// Leaderboard from the latest snapshot with the user's bests merged in
    pub fn leaderboard(&self) -> Leaderboard {
        let entries = self.snapshot.get().unwrap_or_default();
        build_leaderboard(&entries, self.prefs.candidate())
    }

    /// Record the finished session and show its results
    pub fn complete(&mut self) {
        let previous_best = self.prefs.prefs().best_wpm;
        let result = self.session.finish();
        info!(
            mode = %result.mode,
            wpm = result.wpm,
            accuracy = result.accuracy,
            "test finished"
        );

        self.status = None;
        if let Err(e) = self.prefs.record_result(&result) {
            warn!(error = %e, "could not save preferences");
            self.status = Some("could not save preferences, see log".to_string());
        } else if result.wpm > previous_best && result.wpm > 0.0 {
            self.status = Some(format!("new personal best: {:.0} wpm", result.wpm));
        } else if result.is_perfect() {
            self.status = Some("perfect run, no errors".to_string());
        }

        let record = HistoryRecord::new(&result, self.config.session.duration);
        if let Err(e) = self.results_log.append(&record) {
            warn!(error = %e, "could not append to results log");
        }

        self.last_result = Some(result);
        self.state = AppState::Results;
    }

    fn new_test(&mut self) {
        self.session.reset();
        self.status = None;
        self.state = AppState::Typing;
    }

    fn retry(&mut self) {
        self.session.restart();
        self.status = None;
        self.state = AppState::Typing;
    }

    fn open_leaderboard(&mut self) {
        self.session.pause();
        self.return_to = self.state;
        self.state = AppState::Leaderboard;
    }

    fn close_leaderboard(&mut self) {
        self.state = self.return_to;
        if self.state == AppState::Typing {
            self.session.resume();
        }
    }

    /// Advance the clock of a running test
    pub fn on_tick(&mut self, elapsed: Duration) {
        if self.state == AppState::Typing && self.session.tick(elapsed) {
            self.complete();
        }
    }

    fn on_key(&mut self, key: KeyEvent) -> Flow {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => return Flow::Quit,
            KeyCode::Char('c') if ctrl => return Flow::Quit,
            _ => {}
        }

        match self.state {
            AppState::Typing => match key.code {
                KeyCode::Tab => self.new_test(),
                KeyCode::Char('p') if ctrl => self.session.toggle_pause(),
                KeyCode::Char('l') if ctrl => self.open_leaderboard(),
                KeyCode::Backspace => {
                    self.session.backspace();
                }
                KeyCode::Enter if self.config.session.mode == Mode::Zen => {
                    if self.session.has_started() {
                        self.complete();
                    }
                }
                KeyCode::Char(c) if !ctrl => {
                    if self.session.write(c) == InputOutcome::Finished {
                        self.complete();
                    }
                }
                _ => {}
            },
            AppState::Results => match key.code {
                KeyCode::Char('r') => self.retry(),
                KeyCode::Char('n') => self.new_test(),
                KeyCode::Char('l') => self.open_leaderboard(),
                _ => {}
            },
            AppState::Leaderboard => match key.code {
                KeyCode::Char('b') | KeyCode::Backspace => self.close_leaderboard(),
                KeyCode::Char('n') => self.new_test(),
                _ => {}
            },
        }
        Flow::Continue
    }
}

fn init_tracing(tui: bool) {
    let default_level = if tui { "info" } else { "warn" };
    let filter =
        EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(default_level));

    if tui {
        // the terminal belongs to the ui, so log to a file
        let path = AppDirs::log_path();
        let file = path
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|_| File::options().create(true).append(true).open(&path));
        if let Ok(file) = file {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(io::stderr)
            .init();
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    let cli = Cli::parse();
    init_tracing(cli.command.is_none());

    match cli.command.clone() {
        None => run_tui(cli),
        Some(Command::Score {
            target,
            input,
            elapsed_ms,
            mode,
            penalized,
        }) => {
            let policy = if penalized {
                ScoringPolicy::PENALIZED
            } else {
                ScoringPolicy::STANDARD
            };
            let elapsed = Duration::from_millis(elapsed_ms.max(0) as u64);
            let result = compute_metrics_with(&policy, &input, &target, elapsed, mode);
            println!("{}", serde_json::to_string_pretty(&result)?);
            Ok(())
        }
        Some(Command::Leaderboard { entries, top }) => {
            let entries = match entries {
                Some(path) => parse_leaderboard(&fs::read_to_string(path)?)?,
                None => fetch_or_sample(cli.api_url.as_deref()),
            };
            let prefs = PreferencesManager::open(cli.preference_store());
            print_leaderboard(&build_leaderboard(&entries, prefs.candidate()), top);
            Ok(())
        }
        Some(Command::Register {
            username,
            mobile,
            country,
        }) => register(&cli, &username, &mobile, &country),
        Some(Command::Stats { recent, reset }) => {
            if reset {
                PreferencesManager::open(cli.preference_store()).reset_stats()?;
            }
            print_stats(&cli, recent)?;
            Ok(())
        }
    }
}

fn fetch_or_sample(api_url: Option<&str>) -> Vec<LeaderboardEntry> {
    if let Some(url) = api_url {
        match HttpClient::new(url).and_then(|client| client.fetch_entries()) {
            Ok(entries) => return entries,
            Err(e) => warn!(error = %e, "leaderboard unavailable, showing the bundled sample"),
        }
    }
    StaticLeaderboard::embedded()
        .and_then(|board| board.fetch_entries())
        .unwrap_or_default()
}

fn print_leaderboard(board: &Leaderboard, top: usize) {
    let stats = board.stats();
    println!(
        "{} players, top {:.0} wpm, best {}% accuracy, {} tests, average {:.0} wpm",
        stats.players,
        stats.max_wpm,
        round1(stats.max_accuracy),
        stats.total_tests,
        stats.average_wpm
    );
    println!();
    println!(
        "{:>4}  {:<20} {:<16} {:>6} {:>7} {:>6}",
        "#", "name", "location", "wpm", "acc", "tests"
    );
    for ranked in board.top(top) {
        println!(
            "{:>4}  {:<20} {:<16} {:>6.0} {:>6}% {:>6}{}",
            ranked.rank,
            ranked.entry.name,
            ranked.entry.location,
            ranked.entry.best_wpm,
            round1(ranked.entry.best_accuracy),
            ranked.entry.tests_completed,
            if ranked.is_current_user { "  <- you" } else { "" }
        );
    }
    if let Some(rank) = board.current_user_rank() {
        println!();
        println!("your rank: #{rank}");
    }
}

fn register(cli: &Cli, username: &str, mobile: &str, country: &str) -> Result<(), Box<dyn Error>> {
    let Some(url) = cli.api_url.as_deref() else {
        let mut cmd = Cli::command();
        cmd.error(
            ErrorKind::MissingRequiredArgument,
            "register needs --api-url to reach the leaderboard service",
        )
        .exit();
    };

    let registration = Registration::new(username, mobile, country)?;
    match HttpClient::new(url)?.register(&registration)? {
        RegistrationOutcome::Registered => {
            let mut prefs = PreferencesManager::open(cli.preference_store());
            prefs.register_profile(&registration.username, &registration.country)?;
            println!("registered as {}", registration.username);
            Ok(())
        }
        RegistrationOutcome::Duplicate => {
            eprintln!("Mobile number already registered");
            std::process::exit(1);
        }
    }
}

fn print_stats(cli: &Cli, recent: usize) -> Result<(), FastLegendError> {
    let store = cli.preference_store();
    let prefs_path = store.path().display().to_string();
    let prefs = PreferencesManager::open(store);
    let p = prefs.prefs();
    println!("preferences:     {prefs_path}");
    println!("tests completed: {}", p.total_tests);
    println!("best wpm:        {:.0}", p.best_wpm);
    println!("best accuracy:   {}%", round1(p.best_accuracy));
    println!("average wpm:     {:.0}", p.average_wpm);
    println!("time typed:      {}s", p.total_time_typed_secs);

    let records = cli.results_log().read_all()?;
    if !records.is_empty() {
        println!();
        for record in records.iter().rev().take(recent) {
            println!(
                "{}  {:<5} {:>4}  {:>5.0} wpm  {:>5}%  {} errors",
                record.date.format("%Y-%m-%d %H:%M"),
                record.mode.to_string(),
                record.duration,
                record.wpm,
                record.accuracy,
                record.errors
            );
        }
    }
    Ok(())
}

fn spawn_poller(config: &AppConfig, snapshot: &LeaderboardSnapshot) -> PollHandle {
    if let Some(url) = &config.api_url {
        match HttpClient::new(url.as_str()) {
            Ok(client) => return poller::spawn(client, config.poll_interval, snapshot.clone()),
            Err(e) => warn!(error = %e, "could not build http client, using the bundled sample"),
        }
    }
    let sample = StaticLeaderboard::embedded().unwrap_or_else(|e| {
        warn!(error = %e, "bundled leaderboard unreadable");
        StaticLeaderboard::default()
    });
    poller::spawn(sample, config.poll_interval, snapshot.clone())
}

fn save_defaults(
    prefs: &mut PreferencesManager<FilePreferenceStore>,
    config: &AppConfig,
) -> FlResult<()> {
    prefs.set_defaults(config.session.mode, config.session.duration)?;
    prefs.set_theme(config.theme)?;
    prefs.set_color_mode(config.color_mode)
}

fn run_tui(cli: Cli) -> Result<(), Box<dyn Error>> {
    if !stdin().is_tty() {
        let mut cmd = Cli::command();
        cmd.error(ErrorKind::Io, "stdin must be a tty").exit();
    }

    let mut prefs = PreferencesManager::open(cli.preference_store());
    let config = AppConfig::resolve(cli.overrides(), prefs.prefs());
    if cli.save_defaults {
        save_defaults(&mut prefs, &config)?;
    }
    info!(mode = %config.session.mode, duration = config.session.duration, "starting");

    let snapshot = LeaderboardSnapshot::new();
    let poll = spawn_poller(&config, &snapshot);
    let mut app = App::new(config, prefs, cli.results_log(), snapshot)?;

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let outcome = start_tui(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    poll.stop();
    outcome
}

fn start_tui<B: Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<(), Box<dyn Error>> {
    let mut runner = Runner::new(CrosstermEventSource::new(), TICK_RATE);

    loop {
        terminal.draw(|f| ui::draw(app, f))?;

        let step = runner.step();
        // time since the last step belongs to whatever was running before this event
        app.on_tick(step.elapsed);

        if let AppEvent::Key(key) = step.event {
            if app.on_key(key) == Flow::Quit {
                break;
            }
        }
    }
    Ok(())
}
