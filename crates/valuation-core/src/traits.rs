use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{
    ComponentScore, FinancialSnapshot, MarketSnapshot, MetricsBundle, PeerRecord,
    TechnicalSnapshot, ValuationError, ValuationResult,
};

/// Contract shared by the sector valuation models. Each model rejects a
/// bundle for the wrong sector as a precondition failure; the router's
/// exhaustive sector match keeps that path unreachable in practice.
pub trait ValuationModel: Send + Sync {
    fn calculate(
        &self,
        metrics: &MetricsBundle,
        market: &MarketSnapshot,
    ) -> Result<ValuationResult, ValuationError>;
}

/// Cache capability injected into the router at construction. Implementations
/// must be safe to call from concurrent scoring requests; the engine is fully
/// correct with no cache at all.
pub trait ValuationCache: Send + Sync {
    fn get(&self, key: &str) -> Option<ValuationResult>;
    fn set(&self, key: String, value: ValuationResult);
}

/// Fully assembled inputs for one scoring request. The engine never mutates
/// this; I/O to assemble it belongs to the surrounding collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringInputs {
    pub ticker: String,
    pub metrics: MetricsBundle,
    pub market: MarketSnapshot,
    pub financials: FinancialSnapshot,
    pub technicals: TechnicalSnapshot,
    pub peers: Vec<PeerRecord>,
}

/// One component of the weighted scoring framework. Scorers degrade to a
/// zero/low-confidence score instead of failing, so the signature has no
/// error path.
#[async_trait]
pub trait ComponentScorer: Send + Sync {
    async fn score(&self, inputs: &ScoringInputs) -> ComponentScore;
}
