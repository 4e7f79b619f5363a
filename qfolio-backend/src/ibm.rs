//! IBM Quantum Runtime backend
//!
//! HTTP client for executing the QAOA ansatz on IBM Quantum hardware:
//! device discovery, session management, job submission, and polling.
//!
//! A session keeps a dedicated slot on the device for the whole
//! optimization loop, so repeated per-iteration executions do not each
//! pay the queue cost. The backend opens one session when it connects
//! and holds it until dropped.
//!
//! All transport and device failures surface as typed [`BackendError`]s;
//! nothing is retried here because the optimization loop treats any
//! execution failure as fatal for the request.

use crate::error::{BackendError, Result};
use crate::executor::{AnsatzSpec, CircuitExecutor};
use crate::result::{ExecutionMetadata, ExecutionResult, JobStatus, MeasurementCounts};
use crate::router::{HardwareDevice, HardwareProvider};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Write as _;
use std::time::{Duration, Instant};

/// IBM Quantum Runtime configuration
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    /// API token
    pub api_token: String,

    /// API base URL
    pub api_url: String,

    /// Maximum polling attempts for job status
    pub max_polling_attempts: usize,

    /// Polling interval in seconds
    pub polling_interval_seconds: u64,

    /// Request timeout in seconds
    pub request_timeout_seconds: u64,
}

impl RuntimeConfig {
    /// Create a configuration with an API token
    pub fn new(api_token: impl Into<String>) -> Self {
        Self {
            api_token: api_token.into(),
            api_url: "https://api.quantum.ibm.com".to_string(),
            max_polling_attempts: 300,
            polling_interval_seconds: 2,
            request_timeout_seconds: 30,
        }
    }

    /// Set a custom API URL
    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Set the polling budget
    pub fn with_polling(mut self, max_attempts: usize, interval_seconds: u64) -> Self {
        self.max_polling_attempts = max_attempts;
        self.polling_interval_seconds = interval_seconds;
        self
    }
}

/// Hardware device metadata reported by the Runtime API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IbmDevice {
    /// Device name (e.g. "ibm_brisbane")
    pub name: String,

    /// Available qubit count
    pub num_qubits: usize,

    /// Whether the device is accepting jobs
    pub operational: bool,

    /// Whether the device is a cloud simulator
    pub simulator: bool,

    /// Current queue length
    pub pending_jobs: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct DevicesResponse {
    devices: Vec<IbmDevice>,
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct JobResponse {
    id: String,
}

#[derive(Debug, Deserialize)]
struct JobStatusResponse {
    status: JobStatus,
    #[serde(default)]
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct JobResultResponse {
    counts: HashMap<String, usize>,
}

/// Client for the IBM Quantum Runtime HTTP API
pub struct IbmRuntimeClient {
    config: RuntimeConfig,
    client: reqwest::blocking::Client,
}

impl IbmRuntimeClient {
    /// Create a client from a configuration
    pub fn new(config: RuntimeConfig) -> Result<Self> {
        if config.api_token.trim().is_empty() {
            return Err(BackendError::InvalidConfiguration(
                "API token is empty".to_string(),
            ));
        }
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_seconds))
            .build()
            .map_err(|e| BackendError::Other(format!("HTTP client error: {}", e)))?;
        Ok(Self { config, client })
    }

    fn auth_header(&self) -> String {
        format!("Bearer {}", self.config.api_token.trim())
    }

    /// List all devices visible to this account
    pub fn list_devices(&self) -> Result<Vec<IbmDevice>> {
        let url = format!("{}/v1/backends", self.config.api_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(BackendError::AuthenticationFailed(format!(
                "Device listing failed: {} - {}",
                status, body
            )));
        }

        let devices: DevicesResponse = response
            .json()
            .map_err(|e| BackendError::Other(format!("Failed to parse device list: {}", e)))?;
        Ok(devices.devices)
    }

    /// Least-busy operational hardware device with enough qubits
    pub fn least_busy(&self, min_qubits: usize) -> Result<IbmDevice> {
        pick_least_busy(self.list_devices()?, min_qubits)
    }

    /// Open a dedicated session on a device
    pub fn open_session(&self, device_name: &str) -> Result<HardwareSession> {
        let url = format!("{}/v1/sessions", self.config.api_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(&serde_json::json!({ "backend": device_name, "mode": "dedicated" }))
            .send()?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(BackendError::JobSubmissionFailed(format!(
                "Session open failed: {} - {}",
                status, body
            )));
        }

        let session: SessionResponse = response
            .json()
            .map_err(|e| BackendError::Other(format!("Failed to parse session: {}", e)))?;
        Ok(HardwareSession { id: session.id })
    }

    /// Close a session; best-effort, used on drop
    pub fn close_session(&self, session: &HardwareSession) -> Result<()> {
        let url = format!("{}/v1/sessions/{}/close", self.config.api_url, session.id);
        self.client
            .delete(&url)
            .header("Authorization", self.auth_header())
            .send()?;
        Ok(())
    }

    /// Submit a sampler job inside a session, returning the job id
    fn submit_job(
        &self,
        session: &HardwareSession,
        device_name: &str,
        program: &str,
        shots: usize,
    ) -> Result<String> {
        let url = format!("{}/v1/jobs", self.config.api_url);
        let response = self
            .client
            .post(&url)
            .header("Authorization", self.auth_header())
            .json(&serde_json::json!({
                "program_id": "sampler",
                "backend": device_name,
                "session_id": session.id,
                "params": {
                    "program": program,
                    "shots": shots,
                },
            }))
            .send()?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().unwrap_or_default();
            return Err(BackendError::JobSubmissionFailed(format!(
                "{} - {}",
                status, body
            )));
        }

        let job: JobResponse = response
            .json()
            .map_err(|e| BackendError::Other(format!("Failed to parse job id: {}", e)))?;
        Ok(job.id)
    }

    fn job_status(&self, job_id: &str) -> Result<JobStatusResponse> {
        let url = format!("{}/v1/jobs/{}", self.config.api_url, job_id);
        let response = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()?;

        response
            .json()
            .map_err(|e| BackendError::Other(format!("Failed to parse job status: {}", e)))
    }

    fn job_counts(&self, job_id: &str) -> Result<HashMap<String, usize>> {
        let url = format!("{}/v1/jobs/{}/results", self.config.api_url, job_id);
        let response = self
            .client
            .get(&url)
            .header("Authorization", self.auth_header())
            .send()?;

        let result: JobResultResponse = response
            .json()
            .map_err(|e| BackendError::Other(format!("Failed to parse job results: {}", e)))?;
        Ok(result.counts)
    }

    /// Poll a job to completion and fetch its counts
    fn wait_for_counts(&self, job_id: &str) -> Result<HashMap<String, usize>> {
        for _ in 0..self.config.max_polling_attempts {
            let status = self.job_status(job_id)?;
            match status.status {
                JobStatus::Completed => return self.job_counts(job_id),
                JobStatus::Failed | JobStatus::Cancelled => {
                    return Err(BackendError::JobExecutionFailed(format!(
                        "Job {} ended with status {}{}",
                        job_id,
                        status.status,
                        status
                            .reason
                            .map(|r| format!(": {}", r))
                            .unwrap_or_default()
                    )));
                },
                _ => {
                    std::thread::sleep(Duration::from_secs(self.config.polling_interval_seconds));
                },
            }
        }
        Err(BackendError::JobTimeout {
            attempts: self.config.max_polling_attempts,
        })
    }
}

impl HardwareProvider for IbmRuntimeClient {
    fn least_busy(&self, min_qubits: usize) -> Result<HardwareDevice> {
        let device = IbmRuntimeClient::least_busy(self, min_qubits)?;
        Ok(HardwareDevice {
            name: device.name,
            num_qubits: device.num_qubits,
        })
    }
}

/// Filter and rank devices: operational, real hardware, enough qubits,
/// shortest queue first.
fn pick_least_busy(devices: Vec<IbmDevice>, min_qubits: usize) -> Result<IbmDevice> {
    devices
        .into_iter()
        .filter(|d| d.operational && !d.simulator && d.num_qubits >= min_qubits)
        .min_by_key(|d| d.pending_jobs.unwrap_or(usize::MAX))
        .ok_or_else(|| {
            BackendError::NoEligibleDevice(format!(
                "no operational hardware device with at least {} qubits",
                min_qubits
            ))
        })
}

/// A dedicated hardware session, held for the lifetime of one
/// optimization loop
#[derive(Debug, Clone)]
pub struct HardwareSession {
    id: String,
}

impl HardwareSession {
    /// Session id assigned by the Runtime API
    pub fn id(&self) -> &str {
        &self.id
    }
}

/// Circuit executor backed by an IBM Quantum device
pub struct IbmHardwareBackend {
    client: IbmRuntimeClient,
    device: IbmDevice,
    session: HardwareSession,
}

impl IbmHardwareBackend {
    /// Connect to the least-busy eligible device and open a session
    pub fn connect(config: RuntimeConfig, min_qubits: usize) -> Result<Self> {
        let client = IbmRuntimeClient::new(config)?;
        let device = IbmRuntimeClient::least_busy(&client, min_qubits)?;
        let session = client.open_session(&device.name)?;
        Ok(Self {
            client,
            device,
            session,
        })
    }

    /// Connect to a specific device and open a session
    pub fn for_device(client: IbmRuntimeClient, device: IbmDevice) -> Result<Self> {
        let session = client.open_session(&device.name)?;
        Ok(Self {
            client,
            device,
            session,
        })
    }

    /// The device this backend executes on
    pub fn device(&self) -> &IbmDevice {
        &self.device
    }

    /// The session held for this backend's lifetime
    pub fn session(&self) -> &HardwareSession {
        &self.session
    }
}

impl Drop for IbmHardwareBackend {
    fn drop(&mut self) {
        let _ = self.client.close_session(&self.session);
    }
}

impl CircuitExecutor for IbmHardwareBackend {
    fn name(&self) -> &str {
        &self.device.name
    }

    fn execute(&self, spec: &AnsatzSpec, angles: &[f64], shots: usize) -> Result<ExecutionResult> {
        spec.check_angles(angles)?;
        if spec.num_qubits() > self.device.num_qubits {
            return Err(BackendError::TooManyQubits {
                requested: spec.num_qubits(),
                limit: self.device.num_qubits,
            });
        }

        let start = Instant::now();
        let program = qasm_program(spec, angles);
        let job_id = self
            .client
            .submit_job(&self.session, &self.device.name, &program, shots)?;
        let counts = self.client.wait_for_counts(&job_id)?;

        Ok(ExecutionResult {
            counts: MeasurementCounts::from_counts(counts),
            metadata: ExecutionMetadata::completed(self.device.name.clone(), shots, start.elapsed())
                .with_job_id(job_id),
        })
    }
}

/// Render the ansatz with bound angles as an OpenQASM 3.0 program
///
/// Each ZZ cost term becomes the standard CX-RZ-CX sequence, each Z term
/// a single RZ, and each mixer layer an RX on every qubit.
pub fn qasm_program(spec: &AnsatzSpec, angles: &[f64]) -> String {
    let n = spec.num_qubits();

    let mut qasm = String::new();
    qasm.push_str("OPENQASM 3.0;\n");
    qasm.push_str("include \"stdgates.inc\";\n\n");
    let _ = writeln!(qasm, "qubit[{}] q;", n);
    let _ = writeln!(qasm, "bit[{}] c;", n);
    qasm.push('\n');

    // Uniform superposition
    for q in 0..n {
        let _ = writeln!(qasm, "h q[{}];", q);
    }

    for layer in 0..spec.depth() {
        let gamma = angles[2 * layer];
        let beta = angles[2 * layer + 1];

        // Cost unitary exp(-i * gamma * H_C)
        for term in spec.terms() {
            let z: Vec<usize> = term.z_indices().collect();
            let angle = 2.0 * gamma * term.coeff();
            match z.as_slice() {
                [i] => {
                    let _ = writeln!(qasm, "rz({}) q[{}];", angle, i);
                },
                [i, j] => {
                    let _ = writeln!(qasm, "cx q[{}], q[{}];", i, j);
                    let _ = writeln!(qasm, "rz({}) q[{}];", angle, j);
                    let _ = writeln!(qasm, "cx q[{}], q[{}];", i, j);
                },
                _ => {},
            }
        }

        // Mixer exp(-i * beta * sum X_i)
        for q in 0..n {
            let _ = writeln!(qasm, "rx({}) q[{}];", 2.0 * beta, q);
        }
    }

    qasm.push('\n');
    for q in 0..n {
        let _ = writeln!(qasm, "c[{}] = measure q[{}];", q, q);
    }

    qasm
}
