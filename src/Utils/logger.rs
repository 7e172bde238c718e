//! Logger set-up, log file housekeeping and export of trajectories to files.
use crate::numerical::errors::StiffOdeError;
use crate::numerical::trajectory::TrajectorySet;
use chrono::Local;
use csv::Writer;
use log::info;
use simplelog::{
    ColorChoice, CombinedLogger, Config, LevelFilter, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};
use std::fs::{self, File};
use std::io;
use std::path::Path;
use std::str::FromStr;
use strum_macros::{Display, EnumString};

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, Display)]
#[strum(serialize_all = "lowercase")]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
    #[strum(to_string = "off", serialize = "none")]
    Off,
}

impl LogLevel {
    pub fn parse(level: &str) -> Result<LogLevel, StiffOdeError> {
        LogLevel::from_str(level.trim()).map_err(|_| StiffOdeError::UnknownLogLevel(level.to_string()))
    }

    pub fn level_filter(&self) -> LevelFilter {
        match self {
            LogLevel::Debug => LevelFilter::Debug,
            LogLevel::Info => LevelFilter::Info,
            LogLevel::Warn => LevelFilter::Warn,
            LogLevel::Error => LevelFilter::Error,
            LogLevel::Off => LevelFilter::Off,
        }
    }
}

/// log_<date>_<time>.txt
pub fn log_file_name() -> String {
    let date_and_time = Local::now().format("%Y-%m-%d_%H-%M-%S");
    format!("log_{}.txt", date_and_time)
}

/// Terminal logger plus an optional file logger. `None` means "info"; "off" and "none" leave
/// logging disabled; an unknown level falls back to "info". A logger that is already installed
/// stays in place, so calling this before every solve is fine.
pub fn init_logger(loglevel: &Option<String>, log_file: Option<&Path>) {
    let level = match loglevel.as_deref().map(LogLevel::parse) {
        None => LogLevel::Info,
        Some(Ok(level)) => level,
        Some(Err(e)) => {
            eprintln!("{}, using info", e);
            LogLevel::Info
        }
    };
    if level == LogLevel::Off {
        return;
    }
    let filter = level.level_filter();
    let mut loggers: Vec<Box<dyn SharedLogger>> = vec![TermLogger::new(
        filter,
        Config::default(),
        TerminalMode::Mixed,
        ColorChoice::Auto,
    )];
    if let Some(path) = log_file {
        match File::create(path) {
            Ok(file) => loggers.push(WriteLogger::new(filter, Config::default(), file)),
            Err(e) => eprintln!("cannot create log file {}: {}", path.display(), e),
        }
    }
    if CombinedLogger::init(loggers).is_ok() {
        info!("logger started with loglevel: {}", level);
    }
}

/// removes log_*.txt files from `dir`
pub fn delete_old_logs(dir: &str) -> io::Result<()> {
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        let is_log = path
            .file_name()
            .and_then(|n| n.to_str())
            .map(|n| n.starts_with("log_") && n.ends_with(".txt"))
            .unwrap_or(false);
        if is_log && path.is_file() {
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// First column `arg` with the time stamps, then one column per component.
pub fn save_trajectories_to_csv(
    trajectories: &TrajectorySet,
    headers: &[String],
    filename: &Path,
    arg: &str,
) -> Result<(), StiffOdeError> {
    let (x_mesh, matrix) = trajectories.to_matrix();
    let mut writer = Writer::from_path(filename)?;

    let mut headers_with_x = Vec::with_capacity(matrix.ncols() + 1);
    headers_with_x.push(arg.to_string());
    for j in 0..matrix.ncols() {
        headers_with_x.push(
            headers
                .get(j)
                .cloned()
                .unwrap_or_else(|| format!("y{}", j + 1)),
        );
    }
    writer.write_record(&headers_with_x)?;

    for (i, row) in matrix.row_iter().enumerate() {
        let mut row_data = Vec::with_capacity(row.len() + 1);
        row_data.push(x_mesh[i].to_string());
        row_data.extend(row.iter().map(|val| val.to_string()));
        writer.write_record(&row_data)?;
    }

    writer.flush()?;
    info!("{} rows saved to {}", matrix.nrows(), filename.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_loglevel_parse() {
        assert_eq!(LogLevel::parse("debug").unwrap(), LogLevel::Debug);
        assert_eq!(LogLevel::parse(" warn ").unwrap(), LogLevel::Warn);
        assert_eq!(LogLevel::parse("none").unwrap(), LogLevel::Off);
        assert_eq!(LogLevel::parse("off").unwrap(), LogLevel::Off);
        assert!(matches!(
            LogLevel::parse("verbose"),
            Err(StiffOdeError::UnknownLogLevel(_))
        ));
        assert_eq!(LogLevel::Off.to_string(), "off");
        assert_eq!(LogLevel::Info.level_filter(), LevelFilter::Info);
    }

    #[test]
    fn test_log_file_name() {
        let name = log_file_name();
        assert!(name.starts_with("log_"));
        assert!(name.ends_with(".txt"));
    }

    #[test]
    fn test_delete_old_logs() {
        let dir = tempdir().unwrap();
        let log = dir.path().join("log_2024-01-01_00-00-00.txt");
        let keep = dir.path().join("result.csv");
        fs::write(&log, "x").unwrap();
        fs::write(&keep, "x").unwrap();
        delete_old_logs(dir.path().to_str().unwrap()).unwrap();
        assert!(!log.exists());
        assert!(keep.exists());
    }

    #[test]
    fn test_save_trajectories_to_csv() {
        let mut set = TrajectorySet::with_components(2);
        set.push_state(0.0, &[7.0, 13.0]);
        set.push_state(0.5, &[1.5, 2.5]);
        let dir = tempdir().unwrap();
        let path = dir.path().join("numerical.csv");
        save_trajectories_to_csv(&set, &["u1".to_string()], &path, "x").unwrap();
        let content = fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], "x,u1,y2");
        assert_eq!(lines[1], "0,7,13");
        assert_eq!(lines[2], "0.5,1.5,2.5");
    }
}
