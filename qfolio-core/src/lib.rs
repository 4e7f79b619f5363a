//! Problem construction and shared data model for qfolio
//!
//! This crate turns per-asset financial data into the combinatorial
//! optimization problem solved by the rest of the workspace:
//!
//! - **Market data**: annualized return vector + covariance matrix
//! - **QUBO construction**: risk/return blending with an optional soft
//!   cardinality penalty
//! - **Ising encoding**: exact algebraic transform of the QUBO into
//!   weighted Z / ZZ Pauli terms
//! - **Allocations**: binary selection vectors and continuous weights
//!
//! # Example
//!
//! ```ignore
//! use qfolio_core::{build_qubo, IsingHamiltonian, MarketData};
//!
//! let market = MarketData::new(vec![0.1, 0.2], vec![vec![0.04, 0.01], vec![0.01, 0.09]])?;
//! let qubo = build_qubo(&market, 0.5, None);
//! let hamiltonian = IsingHamiltonian::from_qubo(&qubo);
//! ```

pub mod allocation;
pub mod error;
pub mod ising;
pub mod market;
pub mod qubo;

pub use allocation::Allocation;
pub use error::{CoreError, Result};
pub use ising::{IsingHamiltonian, Pauli, PauliTerm};
pub use market::MarketData;
pub use qubo::{build_qubo, QuboMatrix};
