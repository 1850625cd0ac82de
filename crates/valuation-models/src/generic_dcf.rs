use std::collections::BTreeMap;

use valuation_core::{
    GenericMetrics, MarketSnapshot, MetricsBundle, ValuationError, ValuationMethod,
    ValuationModel, ValuationResult,
};

#[derive(Debug, Clone)]
pub struct GenericDcfAssumptions {
    pub growth_rate: f64,
    pub tax_rate: f64,
    pub wacc: f64,
    pub terminal_growth: f64,
    pub projection_years: u32,
    /// Conservative price-to-sales proxy for estimating revenue from
    /// market cap when fundamentals are unobserved
    pub price_to_sales_proxy: f64,
    pub ebitda_margin: f64,
    pub net_margin: f64,
    /// Share of net income converted to free cash flow
    pub fcf_conversion: f64,
}

impl Default for GenericDcfAssumptions {
    fn default() -> Self {
        Self {
            growth_rate: 0.10,
            tax_rate: 0.25,
            wacc: 0.11,
            terminal_growth: 0.04,
            projection_years: 5,
            price_to_sales_proxy: 2.0,
            ebitda_margin: 0.18,
            net_margin: 0.10,
            fcf_conversion: 0.70,
        }
    }
}

/// Single-stage DCF used for every sector without a dedicated model. Falls
/// back to market-cap-derived estimates when fundamentals are missing, at
/// the cost of confidence.
pub struct GenericDcfModel {
    assumptions: GenericDcfAssumptions,
}

impl GenericDcfModel {
    pub fn new() -> Self {
        Self {
            assumptions: GenericDcfAssumptions::default(),
        }
    }

    pub fn with_assumptions(assumptions: GenericDcfAssumptions) -> Self {
        Self { assumptions }
    }
}

impl Default for GenericDcfModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ValuationModel for GenericDcfModel {
    fn calculate(
        &self,
        metrics: &MetricsBundle,
        market: &MarketSnapshot,
    ) -> Result<ValuationResult, ValuationError> {
        let m = match metrics {
            MetricsBundle::Generic(m) => m,
            _ => {
                return Err(ValuationError::Precondition(
                    "generic DCF model requires a generic metrics bundle".to_string(),
                ))
            }
        };
        m.validate()?;
        let shares = market
            .shares_outstanding
            .filter(|s| *s > 0.0)
            .ok_or_else(|| {
                ValuationError::InsufficientData(
                    "shares outstanding required for per-share valuation".to_string(),
                )
            })?;

        let a = &self.assumptions;
        let mut estimated_inputs = 0u32;

        let revenue = match m.revenue.filter(|r| *r > 0.0) {
            Some(r) => r,
            None => {
                let mcap = market.market_cap.filter(|c| *c > 0.0).ok_or_else(|| {
                    ValuationError::InsufficientData(
                        "neither revenue nor market cap available to anchor the DCF".to_string(),
                    )
                })?;
                estimated_inputs += 1;
                mcap / a.price_to_sales_proxy
            }
        };

        let fcf0 = match m.free_cash_flow.filter(|f| *f > 0.0) {
            Some(f) => f,
            None => {
                estimated_inputs += 1;
                let net_income = m
                    .net_income
                    .filter(|n| *n > 0.0)
                    .unwrap_or_else(|| match m.ebitda.filter(|e| *e > 0.0) {
                        Some(ebitda) => ebitda * (1.0 - a.tax_rate) * 0.75,
                        None => revenue * a.net_margin,
                    });
                net_income * a.fcf_conversion
            }
        };

        let growth = m
            .revenue_growth
            .map(|g| (g / 100.0).clamp(-0.05, 0.25))
            .unwrap_or(a.growth_rate);

        let denominator = a.wacc - a.terminal_growth;
        if denominator <= 1e-6 {
            return Err(ValuationError::Calculation(format!(
                "terminal value undefined: WACC {:.4} at or below terminal growth {:.4}",
                a.wacc, a.terminal_growth
            )));
        }

        let mut enterprise_value = 0.0;
        let mut fcf = fcf0;
        for year in 1..=a.projection_years {
            fcf *= 1.0 + growth;
            enterprise_value += fcf / (1.0 + a.wacc).powi(year as i32);
        }
        let terminal = fcf * (1.0 + a.terminal_growth) / denominator;
        enterprise_value += terminal / (1.0 + a.wacc).powi(a.projection_years as i32);

        let equity_value = enterprise_value - m.net_debt.unwrap_or(0.0);
        let fair_value = (equity_value / shares).max(0.0);

        // Estimated inputs cost a confidence notch each
        let confidence = (0.65 - estimated_inputs as f64 * 0.10).clamp(0.30, 0.80);

        let mut assumptions = BTreeMap::new();
        assumptions.insert("growth_rate".to_string(), growth);
        assumptions.insert("wacc".to_string(), a.wacc);
        assumptions.insert("tax_rate".to_string(), a.tax_rate);
        assumptions.insert("terminal_growth".to_string(), a.terminal_growth);
        assumptions.insert("estimated_inputs".to_string(), estimated_inputs as f64);

        let mut sector_fields = BTreeMap::new();
        sector_fields.insert("base_revenue".to_string(), revenue);
        sector_fields.insert("base_fcf".to_string(), fcf0);
        sector_fields.insert("enterprise_value".to_string(), enterprise_value);

        Ok(ValuationResult {
            fair_value_per_share: fair_value,
            method: ValuationMethod::GenericDcf,
            confidence,
            assumptions,
            sector_fields,
        })
    }
}
