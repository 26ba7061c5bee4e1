use std::process::ExitCode;

pub mod compare;
pub mod solve;
pub mod solvers;
pub mod validate;

/// Exit code for a solve that finished without an optimal solution.
pub const EXIT_NOT_OPTIMAL: u8 = 2;

pub(crate) fn not_optimal() -> ExitCode {
    ExitCode::from(EXIT_NOT_OPTIMAL)
}
