pub mod actor;
pub mod board;
pub mod game;
pub mod mcts;

/// dimensional analysis types
pub type Value = f32;
pub type Prior = f32;
pub type Visits = i32;
pub type Probability = f32;

// search parameters
pub const C_PUCT: Value = 2.0;
pub const N_VL: Visits = 3;
pub const SIMULATIONS: usize = 1000;
pub const MAX_DEPTH: usize = 512;

// evaluation queue parameters
pub const EQ_LENGTH: usize = 100_000;
pub const EQ_BATCH: usize = 1024;
pub const EQ_POLL_MICROS: u64 = 100;

// self-play parameters
pub const MOVE_CAP: u32 = 1000;
pub const GREEDY_AFTER: u32 = 100;

/// trait for random generation, mainly (strictly?) for testing
pub trait Arbitrary {
    fn random() -> Self;
}

/// progress bar
pub fn progress(n: usize) -> indicatif::ProgressBar {
    let tick = std::time::Duration::from_secs(60);
    let style = "{spinner:.cyan} {elapsed} ~ {percent:>3}% {wide_bar:.cyan}";
    let style = indicatif::ProgressStyle::with_template(style).unwrap();
    let progress = indicatif::ProgressBar::new(n as u64);
    progress.set_style(style);
    progress.enable_steady_tick(tick);
    progress
}

/// initialize logging
pub fn init() {
    std::fs::create_dir_all("logs").expect("create logs directory");
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let time = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("time moves slow")
        .as_secs();
    let file = simplelog::WriteLogger::new(
        log::LevelFilter::Debug,
        config.clone(),
        std::fs::File::create(format!("logs/{}.log", time)).expect("create log file"),
    );
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config.clone(),
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term, file]).expect("initialize logger");
}
