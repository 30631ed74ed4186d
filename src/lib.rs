pub mod algorithms;
pub mod concurrency;
pub mod cutting_plane;
pub mod error;
pub mod feature;
pub mod hypergraph;
pub mod io;
pub mod mert;
pub mod oracle;
pub mod rescore;
pub mod scorer;
pub mod semiring;
pub mod train;
pub mod weight;

pub use error::Error;

/// dimensional analysis types
pub type FeatureId = u32;
pub type Probability = f64;
pub type Utility = f64;

// smoothing / numeric constants (§7)
pub const BLEU_SMOOTH: f64 = 1e-40;

// oracle selector
pub const ORACLE_MAX_ROUNDS: usize = 10;

// cutting-plane learner
pub const CUTTING_PLANE_CONVERGENCE: f64 = 0.01;
pub const CUTTING_PLANE_WORSENING: f64 = 0.001;
pub const CUTTING_PLANE_MIN_IMPROVEMENTS: usize = 2;

// MERT local search snap bounds
pub const MERT_SNAP_MIN: f64 = 0.01;
pub const MERT_SNAP_MAX: f64 = 2.0;

/// initialize logging. binaries call this once at startup.
#[cfg(feature = "cli")]
pub fn init() {
    let config = simplelog::ConfigBuilder::new()
        .set_location_level(log::LevelFilter::Off)
        .set_target_level(log::LevelFilter::Off)
        .set_thread_level(log::LevelFilter::Off)
        .build();
    let term = simplelog::TermLogger::new(
        log::LevelFilter::Info,
        config,
        simplelog::TerminalMode::Mixed,
        simplelog::ColorChoice::Auto,
    );
    simplelog::CombinedLogger::init(vec![term]).expect("initialize logger");
}

/// progress bar for long batch/epoch loops
#[cfg(feature = "cli")]
pub fn progress(n: usize) -> indicatif::ProgressBar {
    let style = "{spinner:.cyan} {elapsed} ~ {percent:>3}% {wide_bar:.cyan} {pos}/{len}";
    let style = indicatif::ProgressStyle::with_template(style).unwrap();
    let bar = indicatif::ProgressBar::new(n as u64);
    bar.set_style(style);
    bar
}

/// ask before clobbering an existing output path. Returns `true` if `path`
/// doesn't exist yet, so callers can write unconditionally in the common case.
#[cfg(feature = "cli")]
pub fn confirm_overwrite(path: &std::path::Path) -> std::io::Result<bool> {
    if !path.exists() {
        return Ok(true);
    }
    dialoguer::Confirm::new()
        .with_prompt(format!("{} already exists, overwrite?", path.display()))
        .default(false)
        .interact()
}

/// print a colored one-line status after a front-end finishes writing output.
#[cfg(feature = "cli")]
pub fn report_written(path: &std::path::Path) {
    use colored::Colorize;
    println!("{} {}", "wrote".green().bold(), path.display());
}
