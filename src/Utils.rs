//! different utility modules used throughout the project
/// logger set-up and saving of trajectories into files
pub mod logger;
/// pretty-printed tables of the results
pub mod results_table;
/// task description in TOML
pub mod task_config;
