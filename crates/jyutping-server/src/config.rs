use std::env;
use std::path::PathBuf;

use jyutping_dict::{DEFAULT_TABLE_PATH, LoadMode};

const DEFAULT_PORT: u16 = 8080;
const DEFAULT_HOST: &str = "0.0.0.0";

/// Server settings. CLI flags win over environment variables, which win over
/// the built-in defaults.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub table_path: PathBuf,
    pub load_mode: LoadMode,
    pub disable_cache: bool,
}

impl Config {
    /// Read settings from the process arguments and environment.
    pub fn load() -> Self {
        Self::from_sources(env::args().skip(1), |name| env::var(name).ok())
    }

    /// Build settings from explicit arguments and an environment lookup.
    pub fn from_sources<I, F>(args: I, var: F) -> Self
    where
        I: IntoIterator<Item = String>,
        F: Fn(&str) -> Option<String>,
    {
        let mut disable_cache = false;
        let mut cli_table: Option<PathBuf> = None;
        let mut cli_mode: Option<LoadMode> = None;
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--no-cache" => disable_cache = true,
                "--table" => {
                    if let Some(path) = args.next() {
                        cli_table = Some(PathBuf::from(path));
                    }
                }
                _ => {
                    if let Some(path) = arg.strip_prefix("--table=") {
                        cli_table = Some(PathBuf::from(path));
                    } else if let Some(mode) = arg.strip_prefix("--load-mode=") {
                        cli_mode = parse_load_mode(mode);
                    }
                }
            }
        }

        let host = var("HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());
        let port = var("PORT")
            .and_then(|p| p.parse::<u16>().ok())
            .unwrap_or(DEFAULT_PORT);
        let table_path = cli_table
            .or_else(|| var("JYUTPING_TABLE").map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_TABLE_PATH));
        let load_mode = cli_mode
            .or_else(|| var("JYUTPING_LOAD_MODE").as_deref().and_then(parse_load_mode))
            .unwrap_or_default();

        Config {
            host,
            port,
            table_path,
            load_mode,
            disable_cache,
        }
    }
}

fn parse_load_mode(raw: &str) -> Option<LoadMode> {
    match raw.to_ascii_lowercase().as_str() {
        "buffered" => Some(LoadMode::Buffered),
        "mmap" => Some(LoadMode::Mmap),
        _ => None,
    }
}
