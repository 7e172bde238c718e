/// Task file describing a run. Every section and key is optional, missing ones take defaults:
///
/// ```toml
/// [system]
/// matrix = [[-500.005, 499.995], [499.995, -500.005]]
///
/// [initial]
/// y0 = [7.0, 13.0]
/// t0 = 0.0
///
/// [solver]
/// step = 0.01
/// t_bound = 10000.0
/// max_steps = 1000000
/// decay_threshold = 1e-9
///
/// [exact]          # defaults to the solver window
/// t0 = 0.0
/// t_bound = 10000.0
///
/// [logging]
/// loglevel = "info"   # debug, info, warn, error, off
/// log_to_file = false
///
/// [output]
/// dir = "results"
/// ```
use crate::Utils::logger::LogLevel;
use crate::numerical::StiffODE_api::StiffODE;
use crate::numerical::errors::StiffOdeError;
use crate::numerical::linear_system::LinearSystem;
use crate::numerical::noise_floor::NoiseFloor;
use crate::numerical::ode_config::{ExactConfig, MAX_STEPS, SolveConfig};
use std::path::Path;
use toml::{Table, Value};

#[derive(Debug, Clone)]
pub struct StiffOdeTask {
    pub system: LinearSystem,
    pub solve: SolveConfig,
    pub exact: ExactConfig,
    pub max_steps: usize,
    pub noise: NoiseFloor,
    pub loglevel: Option<String>,
    pub log_to_file: bool,
    pub output_dir: Option<String>,
}

impl Default for StiffOdeTask {
    fn default() -> Self {
        StiffOdeTask {
            system: LinearSystem::stiff_default(),
            solve: SolveConfig::new(vec![7.0, 13.0], 0.0, 0.01, 10000.0),
            exact: ExactConfig::new(0.0, 10000.0, 0.01),
            max_steps: MAX_STEPS,
            noise: NoiseFloor::default(),
            loglevel: Some("info".to_string()),
            log_to_file: false,
            output_dir: None,
        }
    }
}

fn section<'a>(doc: &'a Table, name: &str) -> Result<Option<&'a Table>, StiffOdeError> {
    match doc.get(name) {
        None => Ok(None),
        Some(Value::Table(t)) => Ok(Some(t)),
        Some(_) => Err(StiffOdeError::WrongType {
            key: name.to_string(),
            expected: "a table",
        }),
    }
}

fn as_f64(value: &Value, key: &str) -> Result<f64, StiffOdeError> {
    match value {
        Value::Float(f) => Ok(*f),
        Value::Integer(i) => Ok(*i as f64),
        _ => Err(StiffOdeError::WrongType {
            key: key.to_string(),
            expected: "a number",
        }),
    }
}

fn get_f64(table: Option<&Table>, key: &str) -> Result<Option<f64>, StiffOdeError> {
    table
        .and_then(|t| t.get(key))
        .map(|v| as_f64(v, key))
        .transpose()
}

fn get_vec(table: Option<&Table>, key: &str) -> Result<Option<Vec<f64>>, StiffOdeError> {
    let Some(value) = table.and_then(|t| t.get(key)) else {
        return Ok(None);
    };
    let array = value.as_array().ok_or_else(|| StiffOdeError::WrongType {
        key: key.to_string(),
        expected: "an array of numbers",
    })?;
    array
        .iter()
        .map(|v| as_f64(v, key))
        .collect::<Result<Vec<f64>, _>>()
        .map(Some)
}

fn get_matrix(table: Option<&Table>, key: &str) -> Result<Option<Vec<Vec<f64>>>, StiffOdeError> {
    let Some(value) = table.and_then(|t| t.get(key)) else {
        return Ok(None);
    };
    let wrong = || StiffOdeError::WrongType {
        key: key.to_string(),
        expected: "an array of rows",
    };
    let rows = value.as_array().ok_or_else(wrong)?;
    rows.iter()
        .map(|row| {
            row.as_array()
                .ok_or_else(wrong)?
                .iter()
                .map(|v| as_f64(v, key))
                .collect::<Result<Vec<f64>, _>>()
        })
        .collect::<Result<Vec<_>, _>>()
        .map(Some)
}

impl StiffOdeTask {
    pub fn from_toml_str(content: &str) -> Result<Self, StiffOdeError> {
        let doc: Table = content.parse()?;
        let mut task = StiffOdeTask::default();

        let system = section(&doc, "system")?;
        match get_matrix(system, "matrix")? {
            Some(rows) => task.system = LinearSystem::from_rows(&rows)?,
            None if system.is_some() => {
                return Err(StiffOdeError::MissingKey("system.matrix".to_string()));
            }
            None => {}
        }

        let initial = section(&doc, "initial")?;
        if let Some(y0) = get_vec(initial, "y0")? {
            task.solve.initial_conditions = y0;
        }
        if let Some(t0) = get_f64(initial, "t0")? {
            task.solve.t0 = t0;
        }

        let solver = section(&doc, "solver")?;
        if let Some(h) = get_f64(solver, "step")? {
            task.solve.h = h;
        }
        if let Some(t_bound) = get_f64(solver, "t_bound")? {
            task.solve.t_bound = t_bound;
        }
        if let Some(value) = solver.and_then(|t| t.get("max_steps")) {
            let n = value.as_integer().filter(|&n| n > 0).ok_or(StiffOdeError::WrongType {
                key: "max_steps".to_string(),
                expected: "a positive integer",
            })?;
            task.max_steps = n as usize;
        }
        if let Some(decay) = get_f64(solver, "decay_threshold")? {
            task.noise = NoiseFloor::with_decay(decay);
        }

        let exact = section(&doc, "exact")?;
        task.exact = ExactConfig::new(
            get_f64(exact, "t0")?.unwrap_or(task.solve.t0),
            get_f64(exact, "t_bound")?.unwrap_or(task.solve.t_bound),
            task.solve.h,
        );

        let logging = section(&doc, "logging")?;
        if let Some(value) = logging.and_then(|t| t.get("loglevel")) {
            let level = value.as_str().ok_or(StiffOdeError::WrongType {
                key: "loglevel".to_string(),
                expected: "a string",
            })?;
            LogLevel::parse(level)?;
            task.loglevel = Some(level.to_string());
        }
        if let Some(value) = logging.and_then(|t| t.get("log_to_file")) {
            task.log_to_file = value.as_bool().ok_or(StiffOdeError::WrongType {
                key: "log_to_file".to_string(),
                expected: "a boolean",
            })?;
        }

        let output = section(&doc, "output")?;
        if let Some(value) = output.and_then(|t| t.get("dir")) {
            let dir = value.as_str().ok_or(StiffOdeError::WrongType {
                key: "dir".to_string(),
                expected: "a string",
            })?;
            task.output_dir = Some(dir.to_string());
        }

        task.validate()?;
        Ok(task)
    }

    pub fn from_file(path: &Path) -> Result<Self, StiffOdeError> {
        let content = std::fs::read_to_string(path)?;
        StiffOdeTask::from_toml_str(&content)
    }

    pub fn validate(&self) -> Result<(), StiffOdeError> {
        self.solve.validate()?;
        self.exact.validate()?;
        if self.solve.is_configured() {
            self.system.check_state(&self.solve.initial_conditions)?;
        }
        Ok(())
    }

    /// facade configured with this task, ready to `solve()`
    pub fn into_solver(&self) -> Result<StiffODE, StiffOdeError> {
        let mut ode = StiffODE::with_system(self.system.clone());
        ode.loglevel = self.loglevel.clone();
        ode.set_initial_conditions(self.solve.initial_conditions.clone(), self.solve.t0);
        ode.set_parameters(
            self.solve.h,
            self.solve.t_bound,
            self.exact.t_bound,
            self.exact.t0,
        )?;
        ode.set_max_steps(self.max_steps);
        ode.set_noise_floor(self.noise);
        Ok(ode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_empty_document_gives_defaults() {
        let task = StiffOdeTask::from_toml_str("").unwrap();
        assert_eq!(task.system, LinearSystem::stiff_default());
        assert_eq!(task.solve.initial_conditions, vec![7.0, 13.0]);
        assert_eq!(task.solve.h, 0.01);
        assert_eq!(task.exact.t_bound, task.solve.t_bound);
        assert_eq!(task.max_steps, MAX_STEPS);
    }

    #[test]
    fn test_full_document() {
        let content = r#"
            [system]
            matrix = [[-2, 1], [0, -3]]

            [initial]
            y0 = [1.0, 2]
            t0 = 0.5

            [solver]
            step = 0.1
            t_bound = 2.5
            max_steps = 500
            decay_threshold = 1e-6

            [exact]
            t_bound = 1.5

            [logging]
            loglevel = "warn"
            log_to_file = true

            [output]
            dir = "results"
        "#;
        let task = StiffOdeTask::from_toml_str(content).unwrap();
        assert_eq!(task.system.matrix()[(0, 1)], 1.0);
        assert_eq!(task.solve.initial_conditions, vec![1.0, 2.0]);
        assert_eq!(task.solve.t0, 0.5);
        assert_eq!(task.solve.t_bound, 2.5);
        assert_eq!(task.max_steps, 500);
        assert_eq!(task.noise.decay, 1e-6);
        assert_eq!(task.exact.t0, 0.5);
        assert_eq!(task.exact.t_bound, 1.5);
        assert_eq!(task.exact.h, 0.1);
        assert_eq!(task.loglevel.as_deref(), Some("warn"));
        assert!(task.log_to_file);
        assert_eq!(task.output_dir.as_deref(), Some("results"));
    }

    #[test]
    fn test_invalid_documents() {
        assert!(matches!(
            StiffOdeTask::from_toml_str("[solver\nstep = 1"),
            Err(StiffOdeError::TomlParse(_))
        ));
        assert!(matches!(
            StiffOdeTask::from_toml_str("[solver]\nstep = \"big\""),
            Err(StiffOdeError::WrongType { .. })
        ));
        assert!(matches!(
            StiffOdeTask::from_toml_str("[solver]\nstep = -0.1"),
            Err(StiffOdeError::InvalidStep(_))
        ));
        assert!(matches!(
            StiffOdeTask::from_toml_str("[initial]\ny0 = [1.0, 2.0, 3.0]"),
            Err(StiffOdeError::DimensionMismatch { .. })
        ));
        assert!(matches!(
            StiffOdeTask::from_toml_str("[logging]\nloglevel = \"loud\""),
            Err(StiffOdeError::UnknownLogLevel(_))
        ));
        assert!(StiffOdeTask::from_toml_str("system = 3").is_err());
        assert!(matches!(
            StiffOdeTask::from_toml_str("[system]\nsize = 2"),
            Err(StiffOdeError::MissingKey(_))
        ));
    }

    #[test]
    fn test_from_file_and_solve() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("task.toml");
        std::fs::write(
            &path,
            "[solver]\nstep = 0.01\nt_bound = 0.1\n[logging]\nloglevel = \"off\"\n",
        )
        .unwrap();
        let task = StiffOdeTask::from_file(&path).unwrap();
        let mut ode = task.into_solver().unwrap();
        ode.solve();
        assert_eq!(ode.get_series().len(), 11);
        assert_eq!(ode.compute_exact_solution().len(), 22);
    }
}
