use std::sync::Arc;

use chrono::Utc;
use dashmap::DashMap;
use valuation_core::{
    MarketSnapshot, MetricsBundle, RoutedValuation, Sector, ValuationCache, ValuationModel,
    ValuationResult,
};
use valuation_models::{
    BankingExcessReturnModel, GenericDcfModel, PharmaHybridModel, RealEstateNavModel,
};

/// In-memory cache behind the injected capability; safe under concurrent
/// scoring requests
#[derive(Default)]
pub struct MemoryValuationCache {
    entries: DashMap<String, ValuationResult>,
}

impl MemoryValuationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ValuationCache for MemoryValuationCache {
    fn get(&self, key: &str) -> Option<ValuationResult> {
        self.entries.get(key).map(|entry| entry.clone())
    }

    fn set(&self, key: String, value: ValuationResult) {
        self.entries.insert(key, value);
    }
}

/// Routes a classified sector to its valuation model, normalizes the output,
/// and shields callers from model failures: any model error becomes a
/// Fallback result with fair value 0 and confidence 0.3.
pub struct SectorValuationRouter {
    banking: BankingExcessReturnModel,
    pharma: PharmaHybridModel,
    real_estate: RealEstateNavModel,
    generic: GenericDcfModel,
    cache: Option<Arc<dyn ValuationCache>>,
}

impl SectorValuationRouter {
    pub fn new() -> Self {
        Self {
            banking: BankingExcessReturnModel::new(),
            pharma: PharmaHybridModel::new(),
            real_estate: RealEstateNavModel::new(),
            generic: GenericDcfModel::new(),
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: Arc<dyn ValuationCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    fn model_for(&self, sector: Sector) -> &dyn ValuationModel {
        // Exhaustive: adding a sector forces a routing decision here
        match sector {
            Sector::Banking => &self.banking,
            Sector::Pharma => &self.pharma,
            Sector::RealEstate => &self.real_estate,
            Sector::It | Sector::Fmcg | Sector::Energy => &self.generic,
        }
    }

    /// The trailing `valuation` segment is the calculation type. The router
    /// runs a single full-valuation mode per sector, so the key carries no
    /// separate mode dimension; a second mode would extend the key here.
    fn cache_key(ticker: &str, sector: Sector) -> String {
        format!("{}:{}:valuation", ticker.to_uppercase(), sector.as_str())
    }

    /// Run (or fetch) the valuation for a ticker. Infallible by contract:
    /// callers must treat `fair_value_per_share <= 0` as "valuation
    /// unavailable".
    pub fn value(
        &self,
        ticker: &str,
        sector: Sector,
        metrics: &MetricsBundle,
        market: &MarketSnapshot,
        force_refresh: bool,
    ) -> RoutedValuation {
        let key = Self::cache_key(ticker, sector);

        let cached = if force_refresh {
            None
        } else {
            self.cache.as_ref().and_then(|c| c.get(&key))
        };
        let valuation = match cached {
            Some(hit) => {
                tracing::debug!(ticker, sector = sector.as_str(), "valuation cache hit");
                hit
            }
            None => {
                let computed = match self.model_for(sector).calculate(metrics, market) {
                    Ok(result) => result,
                    Err(e) => {
                        tracing::warn!(
                            ticker,
                            sector = sector.as_str(),
                            error = %e,
                            "valuation model failed, returning fallback"
                        );
                        ValuationResult::fallback()
                    }
                };
                if let Some(cache) = &self.cache {
                    cache.set(key, computed.clone());
                }
                computed
            }
        };

        let upside_downside_pct = match (market.current_price, valuation.fair_value_per_share) {
            (Some(price), fair_value) if price > 0.0 && fair_value > 0.0 => {
                Some((fair_value - price) / price * 100.0)
            }
            _ => None,
        };

        RoutedValuation {
            ticker: ticker.to_string(),
            sector,
            valuation,
            upside_downside_pct,
            timestamp: Utc::now(),
        }
    }
}

impl Default for SectorValuationRouter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use valuation_core::{BankingMetrics, GenericMetrics, ValuationMethod};

    fn bank_metrics() -> MetricsBundle {
        MetricsBundle::Banking(BankingMetrics {
            net_interest_margin: 3.5,
            return_on_equity: 15.0,
            cost_to_income: 45.0,
            gross_npa_ratio: 3.0,
            provision_coverage: 75.0,
            capital_adequacy_ratio: 14.0,
            casa_ratio: 45.0,
            book_value_per_share: 100.0,
        })
    }

    fn market() -> MarketSnapshot {
        MarketSnapshot {
            current_price: Some(120.0),
            shares_outstanding: Some(1_000.0),
            ..MarketSnapshot::default()
        }
    }

    #[test]
    fn routes_banking_to_the_excess_return_model() {
        let routed = SectorValuationRouter::new().value(
            "HDFCBANK",
            Sector::Banking,
            &bank_metrics(),
            &market(),
            false,
        );
        assert_eq!(routed.valuation.method, ValuationMethod::ExcessReturn);
        assert_eq!(routed.sector, Sector::Banking);
        let upside = routed.upside_downside_pct.unwrap();
        let expected = (routed.valuation.fair_value_per_share - 120.0) / 120.0 * 100.0;
        assert!((upside - expected).abs() < 1e-9);
    }

    #[test]
    fn catch_all_sectors_use_the_generic_model() {
        let metrics = MetricsBundle::Generic(GenericMetrics {
            revenue: Some(10_000.0),
            free_cash_flow: Some(1_200.0),
            ..GenericMetrics::default()
        });
        for sector in [Sector::It, Sector::Fmcg, Sector::Energy] {
            let routed =
                SectorValuationRouter::new().value("TCS", sector, &metrics, &market(), false);
            assert_eq!(routed.valuation.method, ValuationMethod::GenericDcf);
        }
    }

    #[test]
    fn model_failure_becomes_a_fallback_result() {
        let mut broken = match bank_metrics() {
            MetricsBundle::Banking(m) => m,
            _ => unreachable!(),
        };
        broken.gross_npa_ratio = 99.0; // fails the validator
        let routed = SectorValuationRouter::new().value(
            "HDFCBANK",
            Sector::Banking,
            &MetricsBundle::Banking(broken),
            &market(),
            false,
        );
        assert_eq!(routed.valuation.method, ValuationMethod::Fallback);
        assert_eq!(routed.valuation.fair_value_per_share, 0.0);
        assert_eq!(routed.valuation.confidence, 0.3);
        assert!(routed.upside_downside_pct.is_none());
    }

    #[test]
    fn mismatched_bundle_never_escapes_the_router() {
        let routed = SectorValuationRouter::new().value(
            "SUNPHARMA",
            Sector::Pharma,
            &bank_metrics(), // wrong bundle for the sector
            &market(),
            false,
        );
        assert_eq!(routed.valuation.method, ValuationMethod::Fallback);
    }

    #[test]
    fn cache_short_circuits_recomputation() {
        let cache = Arc::new(MemoryValuationCache::new());
        let router = SectorValuationRouter::new().with_cache(cache.clone());

        let first = router.value("HDFCBANK", Sector::Banking, &bank_metrics(), &market(), false);
        assert_eq!(cache.len(), 1);

        // Second call hits the cache even with an invalid bundle
        let mut broken = match bank_metrics() {
            MetricsBundle::Banking(m) => m,
            _ => unreachable!(),
        };
        broken.book_value_per_share = -1.0;
        let second = router.value(
            "HDFCBANK",
            Sector::Banking,
            &MetricsBundle::Banking(broken),
            &market(),
            false,
        );
        assert_eq!(
            second.valuation.fair_value_per_share,
            first.valuation.fair_value_per_share
        );
    }

    #[test]
    fn force_refresh_bypasses_the_cache() {
        let cache = Arc::new(MemoryValuationCache::new());
        let router = SectorValuationRouter::new().with_cache(cache.clone());
        router.value("HDFCBANK", Sector::Banking, &bank_metrics(), &market(), false);

        let mut improved = match bank_metrics() {
            MetricsBundle::Banking(m) => m,
            _ => unreachable!(),
        };
        improved.return_on_equity = 17.0;
        let refreshed = router.value(
            "HDFCBANK",
            Sector::Banking,
            &MetricsBundle::Banking(improved),
            &market(),
            true,
        );
        let stale = cache
            .get("HDFCBANK:Banking:valuation")
            .expect("refresh should overwrite the cached entry");
        assert_eq!(
            stale.fair_value_per_share,
            refreshed.valuation.fair_value_per_share
        );
    }

    #[test]
    fn repeated_calls_are_deterministic() {
        let router = SectorValuationRouter::new();
        let a = router.value("HDFCBANK", Sector::Banking, &bank_metrics(), &market(), false);
        let b = router.value("HDFCBANK", Sector::Banking, &bank_metrics(), &market(), false);
        assert_eq!(
            a.valuation.fair_value_per_share,
            b.valuation.fair_value_per_share
        );
        assert_eq!(a.valuation.confidence, b.valuation.confidence);
        assert_eq!(a.upside_downside_pct, b.upside_downside_pct);
    }
}
