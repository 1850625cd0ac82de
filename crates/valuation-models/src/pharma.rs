use std::collections::BTreeMap;

use valuation_core::{
    MarketSnapshot, MetricsBundle, PharmaMetrics, ValuationError, ValuationMethod,
    ValuationModel, ValuationResult,
};

#[derive(Debug, Clone)]
pub struct PharmaAssumptions {
    pub risk_free_rate: f64,
    pub equity_risk_premium: f64,
    pub default_beta: f64,
    pub cost_of_equity_floor: f64,
    /// First-year FCF growth before R&D adjustment and decay
    pub base_growth: f64,
    /// Compounding annual decay applied to the growth rate
    pub growth_decay: f64,
    pub terminal_growth: f64,
    pub projection_years: u32,
    /// Sector benchmark used when no peer multiples are supplied
    pub benchmark_ev_ebitda: f64,
    /// R&D-to-revenue percent above which the pipeline earns an uplift
    pub optimal_rd_intensity: f64,
    /// R&D-to-revenue percent below which the model penalizes
    pub min_rd_intensity: f64,
}

impl Default for PharmaAssumptions {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.045,
            equity_risk_premium: 0.055,
            default_beta: 1.0,
            cost_of_equity_floor: 0.08,
            base_growth: 0.08,
            growth_decay: 0.10,
            terminal_growth: 0.04,
            projection_years: 10,
            benchmark_ev_ebitda: 15.0,
            optimal_rd_intensity: 12.0,
            min_rd_intensity: 5.0,
        }
    }
}

/// Leg weights of the hybrid blend, always renormalized to sum to 1
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LegWeights {
    pub dcf: f64,
    pub multiple: f64,
}

/// Blends a 10-year DCF with a peer EV/EBITDA multiple, risk-adjusted for
/// the pipeline, patent cliff, and regulatory track record.
pub struct PharmaHybridModel {
    assumptions: PharmaAssumptions,
}

impl PharmaHybridModel {
    pub fn new() -> Self {
        Self {
            assumptions: PharmaAssumptions::default(),
        }
    }

    pub fn with_assumptions(assumptions: PharmaAssumptions) -> Self {
        Self { assumptions }
    }

    /// Additive cost-of-equity adjustments for the DCF leg
    pub fn cost_of_equity_adjustments(&self, m: &PharmaMetrics) -> Vec<(f64, &'static str)> {
        let a = &self.assumptions;
        let mut adjustments = Vec::new();
        if m.rd_to_revenue_pct < a.min_rd_intensity {
            adjustments.push((0.010, "thin pipeline: R&D intensity below 5%"));
        } else if m.rd_to_revenue_pct > a.optimal_rd_intensity {
            adjustments.push((-0.005, "pipeline depth: R&D intensity above 12%"));
        }
        if m.patent_expiry_risk_pct > 25.0 {
            adjustments.push((0.010, "patent cliff: expiry risk above 25%"));
        } else if m.patent_expiry_risk_pct > 15.0 {
            adjustments.push((0.005, "patent exposure: expiry risk above 15%"));
        }
        if m.regulatory_observations > 3 {
            let extra = (m.regulatory_observations - 3) as f64 * 0.0025;
            adjustments.push((extra.min(0.010), "regulatory overhang: observations above 3"));
        }
        if m.us_revenue_pct > 40.0 {
            adjustments.push((-0.005, "de-risking: US revenue above 40%"));
        }
        adjustments
    }

    /// DCF/multiple leg weights; adjusted additively then renormalized so no
    /// weight mass is lost when several rules fire together. Accumulated in
    /// whole percentage points so stacked adjustments stay exact (0.60 + 0.10
    /// - 0.05 in f64 drifts a ULP above 0.65).
    pub fn leg_weights(&self, m: &PharmaMetrics) -> LegWeights {
        let a = &self.assumptions;
        let mut dcf: i32 = 60;
        let mut multiple: i32 = 40;
        if m.rd_to_revenue_pct > a.optimal_rd_intensity {
            dcf += 10;
            multiple -= 10;
        } else if m.rd_to_revenue_pct < a.min_rd_intensity {
            dcf -= 10;
            multiple += 10;
        }
        if m.ebitda_margin > 25.0 {
            dcf -= 5;
            multiple += 5;
        }
        let sum = (dcf + multiple) as f64;
        LegWeights {
            dcf: dcf as f64 / sum,
            multiple: multiple as f64 / sum,
        }
    }

    /// Base 1.5%, plus observation and patent-cliff penalties, capped at 20%
    pub fn regulatory_discount(m: &PharmaMetrics) -> f64 {
        let mut discount = 0.015;
        if m.regulatory_observations > 3 {
            discount += ((m.regulatory_observations - 3) as f64 * 0.01).min(0.05);
        }
        if m.patent_expiry_risk_pct > 25.0 {
            discount += ((m.patent_expiry_risk_pct - 25.0) * 0.005).min(0.10);
        }
        discount.min(0.20)
    }

    /// Multiplicative uplift on the DCF leg: R&D beyond the optimal
    /// threshold (capped 15%) plus ANDA/DMF filing breadth (capped 10%)
    pub fn pipeline_uplift(&self, m: &PharmaMetrics) -> f64 {
        let a = &self.assumptions;
        let rd_uplift = if m.rd_to_revenue_pct > a.optimal_rd_intensity {
            ((m.rd_to_revenue_pct - a.optimal_rd_intensity) * 0.015).min(0.15)
        } else {
            0.0
        };
        let filing_bonus = ((m.anda_filings + m.dmf_filings) as f64 * 0.01).min(0.10);
        rd_uplift + filing_bonus
    }

    pub fn confidence_rules(m: &PharmaMetrics) -> Vec<(f64, &'static str)> {
        let mut rules = Vec::new();
        if (8.0..=18.0).contains(&m.rd_to_revenue_pct) {
            rules.push((0.10, "R&D intensity in the 8-18% band"));
        } else if m.rd_to_revenue_pct < 3.0 {
            rules.push((-0.10, "R&D intensity below 3%"));
        }
        if m.ebitda_margin > 25.0 {
            rules.push((0.10, "EBITDA margin above 25%"));
        } else if m.ebitda_margin > 18.0 {
            rules.push((0.05, "EBITDA margin above 18%"));
        } else if m.ebitda_margin < 10.0 {
            rules.push((-0.10, "EBITDA margin below 10%"));
        }
        if (30.0..=60.0).contains(&m.us_revenue_pct) {
            rules.push((0.05, "balanced US revenue exposure"));
        }
        if m.regulatory_observations == 0 {
            rules.push((0.10, "clean regulatory record"));
        } else if m.regulatory_observations <= 2 {
            rules.push((0.05, "limited regulatory observations"));
        } else if m.regulatory_observations > 5 {
            rules.push((-0.15, "heavy regulatory overhang"));
        }
        if m.anda_filings + m.dmf_filings >= 10 {
            rules.push((0.05, "broad filing pipeline"));
        }
        rules
    }

    fn dcf_leg(
        &self,
        m: &PharmaMetrics,
        shares: f64,
        cost_of_equity: f64,
    ) -> Result<f64, ValuationError> {
        let a = &self.assumptions;
        // Derive FCF from EBITDA when the bundle carries no observed figure
        let fcf0 = match m.free_cash_flow {
            Some(fcf) if fcf > 0.0 => fcf,
            _ => m.ebitda * 0.60,
        };

        let rd_growth_adjust = if m.rd_to_revenue_pct > a.optimal_rd_intensity {
            0.02
        } else if m.rd_to_revenue_pct < a.min_rd_intensity {
            -0.02
        } else {
            0.0
        };
        let initial_growth = a.base_growth + rd_growth_adjust;
        // Years 6-10 carry an extra haircut proportional to patent risk
        let patent_haircut = if m.patent_expiry_risk_pct > 15.0 {
            ((m.patent_expiry_risk_pct - 15.0) / 100.0).min(0.5)
        } else {
            0.0
        };

        let mut enterprise_value = 0.0;
        let mut fcf = fcf0;
        for year in 1..=a.projection_years {
            let mut growth = initial_growth * (1.0 - a.growth_decay).powi(year as i32 - 1);
            if year > 5 {
                growth *= 1.0 - patent_haircut;
            }
            fcf *= 1.0 + growth;
            enterprise_value += fcf / (1.0 + cost_of_equity).powi(year as i32);
        }
        let denominator = cost_of_equity - a.terminal_growth;
        if denominator <= 1e-6 {
            return Err(ValuationError::Calculation(format!(
                "terminal value undefined: cost of equity {:.4} at or below terminal growth {:.4}",
                cost_of_equity, a.terminal_growth
            )));
        }
        let terminal = fcf * (1.0 + a.terminal_growth) / denominator;
        enterprise_value += terminal / (1.0 + cost_of_equity).powi(a.projection_years as i32);

        Ok(enterprise_value / shares)
    }

    fn multiple_leg(&self, m: &PharmaMetrics, shares: f64) -> f64 {
        let a = &self.assumptions;
        let mut multiple = peer_median(&m.peer_ev_ebitda).unwrap_or(a.benchmark_ev_ebitda);
        if m.rd_to_revenue_pct > a.optimal_rd_intensity {
            multiple *= 1.10;
        } else if m.rd_to_revenue_pct < a.min_rd_intensity {
            multiple *= 0.90;
        }
        if m.us_revenue_pct > 40.0 {
            multiple *= 1.05;
        }
        multiple * m.ebitda / shares
    }
}

fn peer_median(values: &[f64]) -> Option<f64> {
    let mut sorted: Vec<f64> = values.iter().copied().filter(|v| v.is_finite()).collect();
    if sorted.is_empty() {
        return None;
    }
    sorted.sort_by(|a, b| a.total_cmp(b));
    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Some((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Some(sorted[mid])
    }
}

impl Default for PharmaHybridModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ValuationModel for PharmaHybridModel {
    fn calculate(
        &self,
        metrics: &MetricsBundle,
        market: &MarketSnapshot,
    ) -> Result<ValuationResult, ValuationError> {
        let m = match metrics {
            MetricsBundle::Pharma(m) => m,
            _ => {
                return Err(ValuationError::Precondition(
                    "pharma model requires a pharma metrics bundle".to_string(),
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
        let beta = market.beta.unwrap_or(a.default_beta);
        let mut cost_of_equity = a.risk_free_rate + beta * a.equity_risk_premium;
        for (delta, _) in self.cost_of_equity_adjustments(m) {
            cost_of_equity += delta;
        }
        let cost_of_equity = cost_of_equity.max(a.cost_of_equity_floor);

        let uplift = self.pipeline_uplift(m);
        let discount = Self::regulatory_discount(m);

        let dcf_per_share =
            self.dcf_leg(m, shares, cost_of_equity)? * (1.0 + uplift) * (1.0 - discount);
        let multiple_per_share = self.multiple_leg(m, shares) * (1.0 - discount / 2.0);

        let weights = self.leg_weights(m);
        let fair_value = dcf_per_share * weights.dcf + multiple_per_share * weights.multiple;

        let mut confidence: f64 = 0.5;
        for (delta, _) in Self::confidence_rules(m) {
            confidence += delta;
        }
        let confidence = confidence.clamp(0.30, 0.90);

        let mut assumptions = BTreeMap::new();
        assumptions.insert("cost_of_equity".to_string(), cost_of_equity);
        assumptions.insert("beta".to_string(), beta);
        assumptions.insert("dcf_weight".to_string(), weights.dcf);
        assumptions.insert("multiple_weight".to_string(), weights.multiple);
        assumptions.insert("regulatory_discount".to_string(), discount);
        assumptions.insert("pipeline_uplift".to_string(), uplift);
        assumptions.insert("terminal_growth".to_string(), a.terminal_growth);

        let mut sector_fields = BTreeMap::new();
        sector_fields.insert("dcf_leg_per_share".to_string(), dcf_per_share);
        sector_fields.insert("multiple_leg_per_share".to_string(), multiple_per_share);
        sector_fields.insert(
            "ev_ebitda_multiple".to_string(),
            peer_median(&m.peer_ev_ebitda).unwrap_or(a.benchmark_ev_ebitda),
        );

        Ok(ValuationResult {
            fair_value_per_share: fair_value,
            method: ValuationMethod::HybridDcf,
            confidence,
            assumptions,
            sector_fields,
        })
    }
}
