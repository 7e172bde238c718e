//! Tabular views of a finished run, rendered with `tabled`.
use crate::numerical::exact_solution::ExactSolver;
use crate::numerical::trajectory::TrajectorySet;
use tabled::{builder::Builder, settings::Style};

/// Rows n, x_n, u_i exact..., u_i numerical..., E_i... ; the row count is that of the shortest
/// of the three sets, so a truncated error series limits the table.
pub fn comparison_rows(
    numerical: &TrajectorySet,
    exact: &TrajectorySet,
    errors: &TrajectorySet,
) -> Vec<Vec<String>> {
    let n_rows = numerical.len().min(exact.len()).min(errors.len());
    let times = numerical.times();
    (0..n_rows)
        .map(|i| {
            let mut row = vec![i.to_string(), format!("{}", times[i])];
            for set in [exact, numerical, errors] {
                row.extend(
                    set.components()
                        .iter()
                        .map(|c| format!("{:.10e}", c.samples()[i].value)),
                );
            }
            row
        })
        .collect()
}

pub fn comparison_header(n_components: usize) -> Vec<String> {
    let mut header = vec!["n".to_string(), "x_n".to_string()];
    header.extend((1..=n_components).map(|j| format!("u({}) exact", j)));
    header.extend((1..=n_components).map(|j| format!("v({}) numerical", j)));
    header.extend((1..=n_components).map(|j| format!("E({})", j)));
    header
}

pub fn comparison_table(
    numerical: &TrajectorySet,
    exact: &TrajectorySet,
    errors: &TrajectorySet,
    max_rows: Option<usize>,
) -> String {
    let mut builder = Builder::default();
    builder.push_record(comparison_header(numerical.n_components()));
    let rows = comparison_rows(numerical, exact, errors);
    let take = max_rows.unwrap_or(rows.len());
    for row in rows.into_iter().take(take) {
        builder.push_record(row);
    }
    let mut table = builder.build();
    table.with(Style::modern_rounded());
    table.to_string()
}

/// Rows n, x_n, exp(lambda_i (x_n - t0))..., u_i exact... for the given time stamps.
pub fn exact_values_rows(solver: &ExactSolver, times: &[f64]) -> Vec<Vec<String>> {
    times
        .iter()
        .enumerate()
        .map(|(i, &t)| {
            let mut row = vec![i.to_string(), format!("{:.16}", t)];
            row.extend(solver.mode_amplitudes(t).iter().map(|e| format!("{:.16e}", e)));
            row.extend(solver.value_at(t).iter().map(|u| format!("{:.16}", u)));
            row
        })
        .collect()
}

pub fn exact_values_table(solver: &ExactSolver, times: &[f64], max_rows: Option<usize>) -> String {
    let mut builder = Builder::default();
    let mut header = vec!["n".to_string(), "x_n".to_string()];
    header.extend(
        solver
            .eigenvalues()
            .iter()
            .map(|lambda| format!("exp({} * x)", lambda)),
    );
    header.extend((1..=solver.dim()).map(|j| format!("u({}) exact", j)));
    builder.push_record(header);
    let shown = &times[..max_rows.unwrap_or(times.len()).min(times.len())];
    for row in exact_values_rows(solver, shown) {
        builder.push_record(row);
    }
    let mut table = builder.build();
    table.with(Style::modern_rounded());
    table.to_string()
}
