//! Quantum-classical hybrid optimization engine
//!
//! Solves the portfolio-selection problem two ways and feeds one into
//! the other:
//!
//! - **Variational path**: QUBO → Ising Hamiltonian → derivative-free
//!   angle search over a QAOA ansatz → best-bitstring extraction →
//!   cardinality repair → hybrid reweighting
//! - **Classical path**: multi-start constrained mean-variance solve,
//!   used both as the comparator allocation and as the weighting stage
//!   inside the hybrid result
//!
//! Circuit execution is a black box behind
//! [`qfolio_backend::CircuitExecutor`]; the engine never sees how
//! circuits are represented or simulated.
//!
//! # Example
//!
//! ```ignore
//! use qfolio_backend::LocalSamplerBackend;
//! use qfolio_core::MarketData;
//! use qfolio_opt::{run_qaoa, solve_mean_variance, QaoaConfig};
//!
//! let market = MarketData::new(returns, covariance)?;
//! let backend = LocalSamplerBackend::new();
//!
//! let outcome = run_qaoa(&market, 0.5, &backend, &QaoaConfig::default())?;
//! let comparator = solve_mean_variance(&market, 0.5);
//! println!("hybrid weights: {:?}", outcome.weights);
//! ```

pub mod classical;
pub mod engine;
pub mod error;
pub mod expectation;
pub mod hybrid;
pub mod repair;
pub mod search;

pub use classical::{solve_mean_variance, solve_mean_variance_with, MeanVarianceConfig};
pub use engine::{
    best_bitstring, evaluation_budget, run_qaoa, search_shots, EnergyObjective, QaoaConfig,
    QaoaOutcome,
};
pub use error::{OptimizeError, Result};
pub use expectation::expectation_from_counts;
pub use hybrid::{reweight, reweight_with};
pub use repair::repair_cardinality;
pub use search::{minimize, NelderMeadConfig, Objective, SearchOutcome};
