use std::collections::BTreeMap;

use valuation_core::{
    BankingMetrics, MarketSnapshot, MetricsBundle, ValuationError, ValuationMethod,
    ValuationModel, ValuationResult,
};

/// Tunable assumptions behind the excess-return projection
#[derive(Debug, Clone)]
pub struct BankingAssumptions {
    pub risk_free_rate: f64,
    pub equity_risk_premium: f64,
    /// Sector-average beta used when market data carries none
    pub default_beta: f64,
    pub cost_of_equity_floor: f64,
    /// Share of earnings retained to compound book value
    pub retention_ratio: f64,
    pub terminal_growth: f64,
    pub projection_years: u32,
}

impl Default for BankingAssumptions {
    fn default() -> Self {
        Self {
            risk_free_rate: 0.065,
            equity_risk_premium: 0.055,
            default_beta: 0.85,
            cost_of_equity_floor: 0.08,
            retention_ratio: 0.60,
            terminal_growth: 0.03,
            projection_years: 10,
        }
    }
}

/// Values a bank as book value plus the present value of returns earned
/// above the cost of equity, projected over a fixed horizon with a Gordon
/// terminal value.
pub struct BankingExcessReturnModel {
    assumptions: BankingAssumptions,
}

impl BankingExcessReturnModel {
    pub fn new() -> Self {
        Self {
            assumptions: BankingAssumptions::default(),
        }
    }

    pub fn with_assumptions(assumptions: BankingAssumptions) -> Self {
        Self { assumptions }
    }

    /// Additive cost-of-equity adjustments, one named rule per balance-sheet
    /// risk signal
    pub fn cost_of_equity_adjustments(m: &BankingMetrics) -> Vec<(f64, &'static str)> {
        let mut adjustments = Vec::new();
        if m.gross_npa_ratio > 5.0 {
            adjustments.push((0.015, "asset-quality penalty: GNPA above 5%"));
        }
        if m.capital_adequacy_ratio < 12.0 {
            adjustments.push((0.010, "capital penalty: CAR below 12%"));
        }
        if m.provision_coverage < 70.0 {
            adjustments.push((0.0075, "provisioning penalty: coverage below 70%"));
        }
        if m.casa_ratio > 40.0 {
            adjustments.push((-0.005, "funding bonus: CASA above 40%"));
        }
        adjustments
    }

    /// Reported ROE less provisioning and efficiency drags, clamped to the
    /// range a bank can plausibly sustain. Percent figure.
    pub fn sustainable_roe(m: &BankingMetrics) -> f64 {
        let mut roe = m.return_on_equity;
        if m.gross_npa_ratio > 3.0 {
            roe -= (m.gross_npa_ratio - 3.0) * 0.5;
        }
        if m.cost_to_income > 50.0 {
            roe -= (m.cost_to_income - 50.0) * 0.1;
        }
        roe.clamp(8.0, 18.0)
    }

    /// Discrete confidence bumps; each rule is independently testable
    pub fn confidence_rules(m: &BankingMetrics) -> Vec<(f64, &'static str)> {
        let mut rules = Vec::new();
        if m.gross_npa_ratio <= 3.0 {
            rules.push((0.10, "GNPA at or below 3%"));
        } else if m.gross_npa_ratio <= 5.0 {
            rules.push((0.05, "GNPA within 5%"));
        } else if m.gross_npa_ratio > 8.0 {
            rules.push((-0.10, "GNPA above 8%"));
        }
        if m.capital_adequacy_ratio >= 14.0 {
            rules.push((0.10, "CAR at or above 14%"));
        } else if m.capital_adequacy_ratio >= 12.0 {
            rules.push((0.05, "CAR at or above 12%"));
        } else if m.capital_adequacy_ratio < 10.0 {
            rules.push((-0.10, "CAR below 10%"));
        }
        if (12.0..=20.0).contains(&m.return_on_equity) {
            rules.push((0.10, "ROE in sustainable 12-20% band"));
        } else if m.return_on_equity < 8.0 {
            rules.push((-0.10, "ROE below 8%"));
        }
        if m.cost_to_income <= 45.0 {
            rules.push((0.05, "cost-to-income at or below 45%"));
        } else if m.cost_to_income > 60.0 {
            rules.push((-0.10, "cost-to-income above 60%"));
        }
        if m.casa_ratio >= 40.0 {
            rules.push((0.05, "CASA at or above 40%"));
        } else if m.casa_ratio < 25.0 {
            rules.push((-0.05, "CASA below 25%"));
        }
        rules
    }
}

impl Default for BankingExcessReturnModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ValuationModel for BankingExcessReturnModel {
    fn calculate(
        &self,
        metrics: &MetricsBundle,
        market: &MarketSnapshot,
    ) -> Result<ValuationResult, ValuationError> {
        let m = match metrics {
            MetricsBundle::Banking(m) => m,
            _ => {
                return Err(ValuationError::Precondition(
                    "banking model requires a banking metrics bundle".to_string(),
                ))
            }
        };
        m.validate()?;

        let a = &self.assumptions;
        let beta = market.beta.unwrap_or(a.default_beta);
        let mut cost_of_equity = a.risk_free_rate + beta * a.equity_risk_premium;
        for (delta, _) in Self::cost_of_equity_adjustments(m) {
            cost_of_equity += delta;
        }
        let cost_of_equity = cost_of_equity.max(a.cost_of_equity_floor);

        let sustainable_roe = Self::sustainable_roe(m) / 100.0;
        let spread = (sustainable_roe - cost_of_equity).max(0.0);
        let book_growth = sustainable_roe * a.retention_ratio;
        let book0 = m.book_value_per_share;

        let mut pv_explicit = 0.0;
        let mut terminal_pv = 0.0;
        // Sustainable ROE at or below cost of equity: no value created above
        // book, fair value collapses to book value per share
        let fair_value = if spread > 0.0 {
            let mut book = book0;
            let mut last_excess = 0.0;
            for year in 1..=a.projection_years {
                let excess = spread * book;
                pv_explicit += excess / (1.0 + cost_of_equity).powi(year as i32);
                last_excess = excess;
                book *= 1.0 + book_growth;
            }
            let denominator = cost_of_equity - a.terminal_growth;
            if denominator <= 1e-6 {
                return Err(ValuationError::Calculation(format!(
                    "terminal value undefined: cost of equity {:.4} at or below terminal growth {:.4}",
                    cost_of_equity, a.terminal_growth
                )));
            }
            let terminal = last_excess * (1.0 + a.terminal_growth) / denominator;
            terminal_pv = terminal / (1.0 + cost_of_equity).powi(a.projection_years as i32);
            book0 + pv_explicit + terminal_pv
        } else {
            book0
        };

        let mut confidence: f64 = 0.5;
        for (delta, _) in Self::confidence_rules(m) {
            confidence += delta;
        }
        let confidence = confidence.clamp(0.25, 0.95);

        let mut assumptions = BTreeMap::new();
        assumptions.insert("cost_of_equity".to_string(), cost_of_equity);
        assumptions.insert("beta".to_string(), beta);
        assumptions.insert("sustainable_roe".to_string(), sustainable_roe);
        assumptions.insert("excess_return_spread".to_string(), spread);
        assumptions.insert("book_value_growth".to_string(), book_growth);
        assumptions.insert("terminal_growth".to_string(), a.terminal_growth);
        // Reported independently of the fair value: retention times the
        // sustainable return on the book
        assumptions.insert(
            "sustainable_growth".to_string(),
            sustainable_roe * a.retention_ratio,
        );

        let mut sector_fields = BTreeMap::new();
        sector_fields.insert("book_value_per_share".to_string(), book0);
        sector_fields.insert("pv_excess_returns".to_string(), pv_explicit);
        sector_fields.insert("terminal_value_pv".to_string(), terminal_pv);
        sector_fields.insert("gross_npa_ratio".to_string(), m.gross_npa_ratio);

        Ok(ValuationResult {
            fair_value_per_share: fair_value,
            method: ValuationMethod::ExcessReturn,
            confidence,
            assumptions,
            sector_fields,
        })
    }
}
