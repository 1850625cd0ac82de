use std::sync::Arc;

use chrono::Utc;
use valuation_core::{
    ComponentKind, ComponentScore, ComponentScorer, DataQuality, InvestmentLabel, ScoringInputs,
    ValuationCache, ValuationError, WeightedScoringResult,
};
use valuation_router::SectorValuationRouter;

use crate::{DcfScorer, FinancialScorer, PeerScorer, TechnicalScorer};

/// Fuses the four component scores into a bounded total score, an investment
/// label, a blended confidence, and data-quality warnings. Stateless across
/// requests; the optional cache lives inside the router.
pub struct WeightedScoringEngine {
    dcf: DcfScorer,
    financial: FinancialScorer,
    technical: TechnicalScorer,
    peer: PeerScorer,
}

impl WeightedScoringEngine {
    pub fn new() -> Self {
        Self::with_router(SectorValuationRouter::new())
    }

    pub fn with_cache(cache: Arc<dyn ValuationCache>) -> Self {
        Self::with_router(SectorValuationRouter::new().with_cache(cache))
    }

    fn with_router(router: SectorValuationRouter) -> Self {
        Self {
            dcf: DcfScorer::new(Arc::new(router)),
            financial: FinancialScorer,
            technical: TechnicalScorer,
            peer: PeerScorer,
        }
    }

    /// Score one ticker from fully assembled inputs. Component failures
    /// degrade individual scores; only a missing price or share count fails
    /// the whole request.
    pub async fn score(
        &self,
        inputs: &ScoringInputs,
    ) -> Result<WeightedScoringResult, ValuationError> {
        if inputs.market.current_price.filter(|p| *p > 0.0).is_none() {
            return Err(ValuationError::InsufficientData(format!(
                "no current price for {}",
                inputs.ticker
            )));
        }
        if inputs
            .market
            .shares_outstanding
            .filter(|s| *s > 0.0)
            .is_none()
        {
            return Err(ValuationError::InsufficientData(format!(
                "no shares outstanding for {}",
                inputs.ticker
            )));
        }

        let sector = sector_classifier::classify(&inputs.ticker);
        tracing::info!(
            ticker = %inputs.ticker,
            sector = sector.as_str(),
            "starting weighted scoring"
        );

        // The four scorers are independent; fork and join
        let (dcf, financial, technical, peer) = tokio::join!(
            self.dcf.score(inputs),
            self.financial.score(inputs),
            self.technical.score(inputs),
            self.peer.score(inputs),
        );

        let components = [&dcf, &financial, &technical, &peer];
        let total_score: f64 = components
            .iter()
            .map(|c| c.weighted_score)
            .sum::<f64>()
            .clamp(-100.0, 100.0);
        let confidence: f64 = components
            .iter()
            .map(|c| c.confidence * c.component.weight())
            .sum();

        let data_warnings: Vec<String> = components
            .iter()
            .filter(|c| c.data_quality == DataQuality::Low)
            .map(|c| low_quality_warning(c))
            .collect();

        if !data_warnings.is_empty() {
            tracing::warn!(
                ticker = %inputs.ticker,
                warnings = data_warnings.len(),
                "scoring degraded by low-quality components"
            );
        }

        Ok(WeightedScoringResult {
            ticker: inputs.ticker.clone(),
            total_score,
            investment_label: InvestmentLabel::from_score(total_score),
            dcf,
            financial,
            technical,
            peer,
            confidence,
            sector: sector.as_str().to_string(),
            data_warnings,
            timestamp: Utc::now(),
        })
    }
}

fn low_quality_warning(score: &ComponentScore) -> String {
    let detail = score
        .reasoning
        .first()
        .map(|r| format!(" ({})", r))
        .unwrap_or_default();
    format!(
        "{} component has low data quality{}",
        component_name(score.component),
        detail
    )
}

fn component_name(kind: ComponentKind) -> &'static str {
    match kind {
        ComponentKind::Dcf => "DCF",
        ComponentKind::Financial => "financial",
        ComponentKind::Technical => "technical",
        ComponentKind::Peer => "peer",
    }
}

impl Default for WeightedScoringEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use valuation_core::{
        BankingMetrics, FinancialSnapshot, MacdSignal, MarketSnapshot, MetricsBundle, PeerRecord,
        SupportResistance, TechnicalSnapshot, VolumeTrend,
    };
    use valuation_router::MemoryValuationCache;

    fn bank_inputs() -> ScoringInputs {
        ScoringInputs {
            ticker: "HDFCBANK".to_string(),
            metrics: MetricsBundle::Banking(BankingMetrics {
                net_interest_margin: 3.5,
                return_on_equity: 15.0,
                cost_to_income: 45.0,
                gross_npa_ratio: 3.0,
                provision_coverage: 75.0,
                capital_adequacy_ratio: 14.0,
                casa_ratio: 45.0,
                book_value_per_share: 100.0,
            }),
            market: MarketSnapshot {
                current_price: Some(120.0),
                shares_outstanding: Some(5_000_000.0),
                trailing_pe: Some(14.0),
                ..MarketSnapshot::default()
            },
            financials: FinancialSnapshot {
                roe: Some(15.0),
                profit_margin: Some(22.0),
                revenue_growth: Some(14.0),
                debt_to_equity: Some(0.9),
                current_ratio: Some(1.4),
            },
            technicals: TechnicalSnapshot {
                rsi: Some(48.0),
                macd: Some(MacdSignal::Bullish),
                volume_trend: Some(VolumeTrend::Rising),
                momentum_pct: Some(7.0),
                support_resistance: Some(SupportResistance::MidRange),
            },
            peers: vec![
                PeerRecord {
                    ticker: "ICICIBANK".to_string(),
                    pe: Some(17.0),
                    revenue_growth: Some(11.0),
                    profit_margin: Some(20.0),
                    market_cap: Some(6.0e12),
                },
                PeerRecord {
                    ticker: "AXISBANK".to_string(),
                    pe: Some(15.0),
                    revenue_growth: Some(9.0),
                    profit_margin: Some(17.0),
                    market_cap: Some(3.0e12),
                },
                PeerRecord {
                    ticker: "KOTAKBANK".to_string(),
                    pe: Some(20.0),
                    revenue_growth: Some(12.0),
                    profit_margin: Some(23.0),
                    market_cap: Some(3.5e12),
                },
            ],
        }
    }

    #[tokio::test]
    async fn total_score_is_the_exact_sum_of_weighted_scores() {
        let result = WeightedScoringEngine::new()
            .score(&bank_inputs())
            .await
            .unwrap();
        let expected: f64 = result.components().iter().map(|c| c.weighted_score).sum();
        assert_eq!(result.total_score, expected.clamp(-100.0, 100.0));
        assert!((-100.0..=100.0).contains(&result.total_score));
        assert!((0.0..=1.0).contains(&result.confidence));
        for component in result.components() {
            assert!((-100.0..=100.0).contains(&component.raw_score));
            assert!((0.0..=1.0).contains(&component.confidence));
        }
    }

    #[tokio::test]
    async fn repeated_scoring_is_deterministic() {
        let engine = WeightedScoringEngine::new();
        let inputs = bank_inputs();
        let a = engine.score(&inputs).await.unwrap();
        let b = engine.score(&inputs).await.unwrap();
        assert_eq!(a.total_score, b.total_score);
        assert_eq!(a.confidence, b.confidence);
        assert_eq!(a.investment_label, b.investment_label);
        for (x, y) in a.components().iter().zip(b.components().iter()) {
            assert_eq!(x.raw_score, y.raw_score);
            assert_eq!(x.weighted_score, y.weighted_score);
            assert_eq!(x.confidence, y.confidence);
        }
    }

    #[tokio::test]
    async fn missing_price_fails_the_whole_request() {
        let mut inputs = bank_inputs();
        inputs.market.current_price = None;
        let err = WeightedScoringEngine::new().score(&inputs).await.unwrap_err();
        assert!(matches!(err, ValuationError::InsufficientData(_)));
    }

    #[tokio::test]
    async fn missing_peers_degrade_only_the_peer_component() {
        let mut inputs = bank_inputs();
        inputs.peers.clear();
        let result = WeightedScoringEngine::new().score(&inputs).await.unwrap();
        assert_eq!(result.peer.raw_score, 0.0);
        assert_eq!(result.peer.confidence, 0.3);
        assert_eq!(result.peer.data_quality, DataQuality::Low);
        assert!(result
            .data_warnings
            .iter()
            .any(|w| w.contains("peer component")));
        // The other three components still contribute
        assert!(result.dcf.raw_score != 0.0 || result.financial.raw_score != 0.0);
    }

    #[tokio::test]
    async fn broken_valuation_still_yields_a_complete_result() {
        let mut inputs = bank_inputs();
        if let MetricsBundle::Banking(m) = &mut inputs.metrics {
            m.book_value_per_share = -5.0; // fails the validator
        }
        let result = WeightedScoringEngine::new().score(&inputs).await.unwrap();
        assert_eq!(result.dcf.raw_score, 0.0);
        assert_eq!(result.dcf.data_quality, DataQuality::Low);
        assert!(result
            .data_warnings
            .iter()
            .any(|w| w.contains("DCF component")));
        assert_eq!(result.sector, "Banking");
    }

    #[tokio::test]
    async fn nonzero_components_always_carry_reasoning() {
        let result = WeightedScoringEngine::new()
            .score(&bank_inputs())
            .await
            .unwrap();
        for component in result.components() {
            if component.raw_score != 0.0 {
                assert!(!component.reasoning.is_empty());
            }
        }
    }

    #[tokio::test]
    async fn cached_engine_matches_uncached_numbers() {
        let uncached = WeightedScoringEngine::new();
        let cached = WeightedScoringEngine::with_cache(Arc::new(MemoryValuationCache::new()));
        let inputs = bank_inputs();
        let a = uncached.score(&inputs).await.unwrap();
        let b = cached.score(&inputs).await.unwrap();
        let c = cached.score(&inputs).await.unwrap(); // second call hits the cache
        assert_eq!(a.total_score, b.total_score);
        assert_eq!(b.total_score, c.total_score);
        assert_eq!(b.dcf.raw_score, c.dcf.raw_score);
    }

    #[tokio::test]
    async fn label_tracks_the_total_score() {
        let result = WeightedScoringEngine::new()
            .score(&bank_inputs())
            .await
            .unwrap();
        assert_eq!(
            result.investment_label,
            InvestmentLabel::from_score(result.total_score)
        );
    }
}
