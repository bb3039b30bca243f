//! Agent runtime implementations.

pub mod mock;
pub mod python_venv;

pub use mock::{MockRuntime, RuntimeCall};
pub use python_venv::{run_bounded, PythonVenvRuntime};
