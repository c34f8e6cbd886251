//! # Optimizer Module
//!
//! Separa le responsabilità in sottomoduli:
//! - `image_optimizer`: Orchestratore (validazione, transport, fallback locale)
//! - `execution_budget`: Reset del budget di tempo prima dei passi lunghi
//! - `path_resolver`: Calcolo della destinazione e dei nomi univoci

pub mod execution_budget;
pub mod image_optimizer;
pub mod path_resolver;

pub use execution_budget::ExecutionBudget;
pub use image_optimizer::{OptimizationMethod, OptimizationOutcome, OptimizationRequest, Optimizer};
pub use path_resolver::PathResolver;
