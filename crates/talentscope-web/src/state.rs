//! Shared application state for the web server.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use talentscope_db::{LanceScoreStore, MemoryScoreStore, ScoreStore};
use talentscope_scorer::{AnalysisProvider, AssessmentService, SimulatedAnalysisProvider};
use tokio::sync::broadcast;
use tracing::info;
use uuid::Uuid;

use crate::config::{AnalysisProviderKind, Config, StorageBackend};

/// Events pushed to connected clients via SSE.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AppEvent {
    AssessmentSubmitted {
        assessment_id: Uuid,
        athlete_id: Uuid,
        test_type: String,
        normalized_score: Option<f64>,
        percentile: Option<u8>,
    },
    AssessmentVerified {
        assessment_id: Uuid,
        status: String,
    },
    /// A cohort's stored aggregate was recomputed.
    BenchmarkUpdated {
        cohort: String,
        sample_size: usize,
        average_score: Option<f64>,
    },
}

/// Shared state injected into every Axum handler.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<AssessmentService>,
    /// Broadcast channel for SSE push events
    pub event_tx: broadcast::Sender<AppEvent>,
}

impl AppState {
    pub fn new(service: AssessmentService) -> Self {
        let (event_tx, _) = broadcast::channel(256);
        Self { service: Arc::new(service), event_tx }
    }

    /// Wire the store and analysis provider named in `config`.
    pub async fn from_config(config: &Config) -> anyhow::Result<Self> {
        let store: Arc<dyn ScoreStore> = match config.storage.backend {
            StorageBackend::Lance => {
                let store = LanceScoreStore::open(&config.storage.path).await?;
                info!(path = %config.storage.path.display(), "LanceDB store ready");
                Arc::new(store)
            }
            StorageBackend::Memory => {
                info!("Using in-memory store; data is lost on exit");
                Arc::new(MemoryScoreStore::new())
            }
        };

        let analysis: Arc<dyn AnalysisProvider> = match config.analysis.provider {
            AnalysisProviderKind::Simulated => Arc::new(match config.analysis.seed {
                Some(seed) => SimulatedAnalysisProvider::seeded(seed),
                None => SimulatedAnalysisProvider::new(),
            }),
        };

        Ok(Self::new(AssessmentService::new(store, analysis)))
    }

    pub fn subscribe(&self) -> broadcast::Receiver<AppEvent> {
        self.event_tx.subscribe()
    }

    /// Send to connected clients. Nobody listening is not an error.
    pub fn publish(&self, event: AppEvent) {
        let _ = self.event_tx.send(event);
    }
}

pub type SharedState = Arc<AppState>;
