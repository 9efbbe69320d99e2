use super::{AnalysisClient, AnalysisError};
use crate::workflows::statement::domain::{
    AnalysisResult, IdentityInfo, Transaction, TransactionKind, UploadedFile,
};
use crate::workflows::statement::password::{generate_password, RandomSource, ThreadRandom};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

/// Stand-in backend: waits, then answers with [`sample_statement`].
#[derive(Clone)]
pub struct SimulatedAnalysisClient {
    latency: Duration,
    rng: Arc<dyn RandomSource>,
}

impl SimulatedAnalysisClient {
    pub const DEFAULT_LATENCY: Duration = Duration::from_millis(2000);

    pub fn new(latency: Duration) -> Self {
        Self::with_random(latency, Arc::new(ThreadRandom))
    }

    pub fn with_random(latency: Duration, rng: Arc<dyn RandomSource>) -> Self {
        Self { latency, rng }
    }

    pub fn latency(&self) -> Duration {
        self.latency
    }
}

impl Default for SimulatedAnalysisClient {
    fn default() -> Self {
        Self::new(Self::DEFAULT_LATENCY)
    }
}

impl std::fmt::Debug for SimulatedAnalysisClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SimulatedAnalysisClient")
            .field("latency", &self.latency)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl AnalysisClient for SimulatedAnalysisClient {
    async fn analyze(
        &self,
        file: &UploadedFile,
        info: Option<&IdentityInfo>,
    ) -> Result<AnalysisResult, AnalysisError> {
        debug!(
            size_bytes = file.size_bytes(),
            with_identity = info.is_some(),
            "simulating statement analysis"
        );

        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }

        let mut result = sample_statement();
        if let Some(info) = info {
            result.generated_password = Some(generate_password(info, self.rng.as_ref()));
        }

        Ok(result)
    }
}

/// The fixed March 2023 statement every simulated analysis returns.
pub fn sample_statement() -> AnalysisResult {
    use TransactionKind::{Credit, Debit};

    AnalysisResult {
        name: "John Doe".to_string(),
        email: "john.doe@example.com".to_string(),
        opening_balance: "$5,243.21".to_string(),
        closing_balance: "$5,876.54".to_string(),
        generated_password: None,
        transactions: Some(vec![
            Transaction::new("2023-03-01", "Salary Deposit", "+$3,500.00", Credit),
            Transaction::new("2023-03-05", "Amazon Purchase", "-$129.99", Debit),
            Transaction::new("2023-03-10", "Grocery Store", "-$85.47", Debit),
            Transaction::new("2023-03-15", "Interest Credit", "+$12.34", Credit),
            Transaction::new("2023-03-20", "Utility Bill Payment", "-$142.50", Debit),
            Transaction::new("2023-03-25", "Restaurant", "-$76.30", Debit),
            Transaction::new("2023-03-28", "Mobile Phone Bill", "-$65.99", Debit),
            Transaction::new("2023-03-30", "Online Transfer", "-$500.00", Debit),
            Transaction::new("2023-03-31", "Dividend Payment", "+$121.24", Credit),
        ]),
    }
}
