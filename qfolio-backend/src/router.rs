//! Backend routing
//!
//! Decides, before the optimization loop starts, whether a request runs
//! on the local sampler or on remote hardware. The decision is a total
//! function: every input maps to a valid routing, and hardware probing
//! failures degrade to simulation with a recorded reason instead of
//! surfacing an error.

use crate::error::Result;

/// Portfolios above this asset count always simulate; free-tier hardware
/// does not fit them.
pub const HARDWARE_ASSET_LIMIT: usize = 5;

/// Hardware devices must offer this multiple of the asset count in
/// qubits before they are eligible.
pub const HARDWARE_QUBIT_HEADROOM: usize = 2;

/// Name reported for the local simulation target
pub const SIMULATOR_NAME: &str = "LocalSampler";

/// A remote device eligible for execution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HardwareDevice {
    /// Device name
    pub name: String,

    /// Available qubit count
    pub num_qubits: usize,
}

/// Source of remote hardware devices
///
/// Implemented by the IBM Runtime client; test code substitutes mock
/// providers so routing stays checkable without network access.
pub trait HardwareProvider {
    /// Least-busy operational device with at least `min_qubits` qubits
    fn least_busy(&self, min_qubits: usize) -> Result<HardwareDevice>;
}

/// Routing decision for one optimization request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoutedBackend {
    /// Run on the local sampler
    Simulator {
        /// Why simulation was chosen, when it was not a direct hardware hit
        reason: Option<String>,
    },

    /// Run on a remote hardware device
    Hardware {
        /// The selected device
        device: HardwareDevice,
    },
}

impl RoutedBackend {
    /// Human-readable backend name
    pub fn backend_name(&self) -> &str {
        match self {
            RoutedBackend::Simulator { .. } => SIMULATOR_NAME,
            RoutedBackend::Hardware { device } => &device.name,
        }
    }

    /// Whether the request fell back to (or chose) simulation
    pub fn used_simulator_fallback(&self) -> bool {
        matches!(self, RoutedBackend::Simulator { .. })
    }

    /// Reason recorded for a simulation routing
    pub fn fallback_reason(&self) -> Option<&str> {
        match self {
            RoutedBackend::Simulator { reason } => reason.as_deref(),
            RoutedBackend::Hardware { .. } => None,
        }
    }

    /// Whether the request runs on real hardware
    pub fn is_hardware(&self) -> bool {
        matches!(self, RoutedBackend::Hardware { .. })
    }
}

/// Choose the execution target for a request
///
/// Rules, evaluated in order:
///
/// 1. explicit simulator preference wins
/// 2. portfolios above [`HARDWARE_ASSET_LIMIT`] assets simulate,
///    regardless of credentials
/// 3. with a credential (a provider), probe for the least-busy device
///    with [`HARDWARE_QUBIT_HEADROOM`]× the asset count in qubits; any
///    probe failure falls back to simulation with the failure recorded
/// 4. without a credential, simulate
pub fn route_backend(
    provider: Option<&dyn HardwareProvider>,
    asset_count: usize,
    prefer_simulator: bool,
) -> RoutedBackend {
    if prefer_simulator {
        return RoutedBackend::Simulator {
            reason: Some("Simulator selected by user".to_string()),
        };
    }

    if asset_count > HARDWARE_ASSET_LIMIT {
        return RoutedBackend::Simulator {
            reason: Some(format!(
                "Portfolio has {} assets (>{}); automatically using the local sampler",
                asset_count, HARDWARE_ASSET_LIMIT
            )),
        };
    }

    match provider {
        Some(provider) => {
            match provider.least_busy(HARDWARE_QUBIT_HEADROOM * asset_count) {
                Ok(device) => RoutedBackend::Hardware { device },
                Err(err) => RoutedBackend::Simulator {
                    reason: Some(format!("Hardware connection failed: {}", err)),
                },
            }
        },
        None => RoutedBackend::Simulator {
            reason: Some("No hardware credentials provided".to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackendError;

    struct FixedProvider {
        device: HardwareDevice,
    }

    impl HardwareProvider for FixedProvider {
        fn least_busy(&self, min_qubits: usize) -> Result<HardwareDevice> {
            if self.device.num_qubits >= min_qubits {
                Ok(self.device.clone())
            } else {
                Err(BackendError::NoEligibleDevice(format!(
                    "need {} qubits",
                    min_qubits
                )))
            }
        }
    }

    struct FailingProvider;

    impl HardwareProvider for FailingProvider {
        fn least_busy(&self, _min_qubits: usize) -> Result<HardwareDevice> {
            Err(BackendError::NetworkError("connection refused".to_string()))
        }
    }

    fn quiet_device() -> HardwareDevice {
        HardwareDevice {
            name: "ibm_quiet".to_string(),
            num_qubits: 27,
        }
    }

    #[test]
    fn test_user_preference_wins() {
        let provider = FixedProvider {
            device: quiet_device(),
        };
        let routed = route_backend(Some(&provider), 3, true);
        assert!(routed.used_simulator_fallback());
        assert_eq!(routed.fallback_reason(), Some("Simulator selected by user"));
    }

    #[test]
    fn test_large_portfolio_simulates_despite_credential() {
        // Rule ordering: the asset-count rule fires before hardware is
        // even probed, so credential validity is irrelevant.
        let provider = FixedProvider {
            device: quiet_device(),
        };
        let routed = route_backend(Some(&provider), 6, false);

        assert!(routed.used_simulator_fallback());
        assert!(!routed.is_hardware());
        assert!(routed.fallback_reason().unwrap().contains('6'));
    }

    #[test]
    fn test_hardware_selected_with_headroom() {
        let provider = FixedProvider {
            device: quiet_device(),
        };
        let routed = route_backend(Some(&provider), 4, false);

        assert!(routed.is_hardware());
        assert_eq!(routed.backend_name(), "ibm_quiet");
        assert_eq!(routed.fallback_reason(), None);
    }

    #[test]
    fn test_headroom_requirement_filters_devices() {
        // 4 assets need 8 qubits; a 6-qubit device is not eligible.
        let provider = FixedProvider {
            device: HardwareDevice {
                name: "tiny".to_string(),
                num_qubits: 6,
            },
        };
        let routed = route_backend(Some(&provider), 4, false);
        assert!(routed.used_simulator_fallback());
    }

    #[test]
    fn test_probe_failure_recorded() {
        let routed = route_backend(Some(&FailingProvider), 3, false);
        assert!(routed.used_simulator_fallback());
        assert!(routed
            .fallback_reason()
            .unwrap()
            .contains("connection refused"));
    }

    #[test]
    fn test_no_credential_simulates() {
        let routed = route_backend(None, 3, false);
        assert!(routed.used_simulator_fallback());
        assert_eq!(
            routed.fallback_reason(),
            Some("No hardware credentials provided")
        );
    }
}
