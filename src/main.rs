#![allow(non_snake_case)]
use RustedStiffODE::Utils::logger::{init_logger, log_file_name, save_trajectories_to_csv};
use RustedStiffODE::Utils::results_table::{comparison_table, exact_values_table};
use RustedStiffODE::Utils::task_config::StiffOdeTask;
use RustedStiffODE::numerical::errors::StiffOdeError;
use RustedStiffODE::numerical::trajectory::TrajectorySet;
use std::path::{Path, PathBuf};

const TABLE_ROWS: usize = 20;

fn run(task_path: Option<&Path>) -> Result<(), StiffOdeError> {
    let task = match task_path {
        Some(path) => StiffOdeTask::from_file(path)?,
        None => StiffOdeTask::default(),
    };
    let log_file = task.log_to_file.then(|| PathBuf::from(log_file_name()));
    init_logger(&task.loglevel, log_file.as_deref());

    let mut ode = task.into_solver()?;
    println!("{}", ode.system());
    let solution = ode.solve();
    match &solution.message {
        Some(message) => println!("{}: {}", solution.status, message),
        None => println!("{}", solution.status),
    }
    let numerical = ode.get_series().clone();
    let exact = ode.compute_exact_on_recorded();
    let errors = ode.compute_global_error();

    if let Some(summary) = ode.error_summary() {
        println!("{}", summary);
    }
    println!(
        "{}",
        comparison_table(&numerical, &exact, &errors, Some(TABLE_ROWS))
    );

    match ode.exact_solver() {
        Ok(solver) => {
            let grid = ode.exact_config().grid(TABLE_ROWS);
            println!("{}", exact_values_table(&solver, &grid, Some(TABLE_ROWS)));
        }
        Err(e) => println!("no closed-form solution: {}", e),
    }

    if let Some(dir) = &task.output_dir {
        let dir = Path::new(dir);
        std::fs::create_dir_all(dir)?;
        let n = numerical.n_components();
        let save = |set: &TrajectorySet, prefix: &str, file: &str| {
            let headers: Vec<String> = (1..=n).map(|j| format!("{}{}", prefix, j)).collect();
            save_trajectories_to_csv(set, &headers, &dir.join(file), "x")
        };
        save(&numerical, "v", "numerical.csv")?;
        save(&exact, "u", "exact.csv")?;
        save(&errors, "E", "global_error.csv")?;
    }
    Ok(())
}

fn main() {
    let task_path = std::env::args().nth(1).map(PathBuf::from);
    if let Err(e) = run(task_path.as_deref()) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}
