// Copyright (c)  by Gleb E. Zaslavkiy
//MIT License
#![allow(non_camel_case_types)]
#![allow(non_snake_case)]
//! Stiff linear ODE toolkit: implicit (backward Euler) integration of dy/dt = A·y,
//! closed-form solution by eigen-decomposition of A and the global error between the two.
pub mod Utils;
pub mod numerical;
pub mod somelinalg;
