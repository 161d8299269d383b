//! log4rs setup for hosts embedding the parsers.

use crate::error::{ParserError, Result};
use log::LevelFilter;
use log4rs::append::console::ConsoleAppender;
use log4rs::config::{Appender, Config, Root};
use log4rs::encode::pattern::PatternEncoder;
use std::path::Path;

const CONSOLE_PATTERN: &str = "{d(%Y-%m-%d %H:%M:%S)} {h({l})} {t} - {m}{n}";

/// Load `path` (e.g. `log4rs.yml`) when it exists, else log to stdout at info.
///
/// Fails if a logger is already installed.
pub fn init(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    if path.exists() {
        log4rs::init_file(path, Default::default())
            .map_err(|e| ParserError::Config(format!("{}: {}", path.display(), e)))?;
    } else {
        log4rs::init_config(console_config(LevelFilter::Info)?)
            .map_err(|e| ParserError::Config(e.to_string()))?;
    }
    log::info!("logging initialised");
    Ok(())
}

fn console_config(level: LevelFilter) -> Result<Config> {
    let stdout = ConsoleAppender::builder()
        .encoder(Box::new(PatternEncoder::new(CONSOLE_PATTERN)))
        .build();
    Config::builder()
        .appender(Appender::builder().build("stdout", Box::new(stdout)))
        .build(Root::builder().appender("stdout").build(level))
        .map_err(|e| ParserError::Config(e.to_string()))
}
