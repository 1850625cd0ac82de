use serde::{Deserialize, Serialize};

use crate::error::ValuationError;

/// Range check shared by the per-sector validators. Violations surface the
/// field, the value, and the allowed range verbatim — never a silent clamp.
fn check_range(field: &str, value: f64, min: f64, max: f64) -> Result<(), ValuationError> {
    if !value.is_finite() || value < min || value > max {
        return Err(ValuationError::Precondition(format!(
            "{} = {} outside allowed range [{}, {}]",
            field, value, min, max
        )));
    }
    Ok(())
}

fn check_positive(field: &str, value: f64) -> Result<(), ValuationError> {
    if !value.is_finite() || value <= 0.0 {
        return Err(ValuationError::Precondition(format!(
            "{} must be positive, got {}",
            field, value
        )));
    }
    Ok(())
}

/// Banking-sector ratios; percentages expressed as percent figures (3.2 = 3.2%)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BankingMetrics {
    pub net_interest_margin: f64,
    pub return_on_equity: f64,
    pub cost_to_income: f64,
    pub gross_npa_ratio: f64,
    pub provision_coverage: f64,
    pub capital_adequacy_ratio: f64,
    pub casa_ratio: f64,
    pub book_value_per_share: f64,
}

impl BankingMetrics {
    pub fn validate(&self) -> Result<(), ValuationError> {
        check_range("net_interest_margin", self.net_interest_margin, 0.0, 15.0)?;
        check_range("return_on_equity", self.return_on_equity, -50.0, 60.0)?;
        check_range("cost_to_income", self.cost_to_income, 10.0, 150.0)?;
        check_range("gross_npa_ratio", self.gross_npa_ratio, 0.0, 50.0)?;
        check_range("provision_coverage", self.provision_coverage, 0.0, 100.0)?;
        check_range("capital_adequacy_ratio", self.capital_adequacy_ratio, 0.0, 40.0)?;
        check_range("casa_ratio", self.casa_ratio, 0.0, 100.0)?;
        check_positive("book_value_per_share", self.book_value_per_share)?;
        Ok(())
    }
}

/// Pharma-sector figures; monetary fields in absolute currency units
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PharmaMetrics {
    pub revenue: f64,
    pub ebitda: f64,
    /// Percent
    pub ebitda_margin: f64,
    /// R&D spend as percent of revenue
    pub rd_to_revenue_pct: f64,
    /// Percent of revenue earned in the US market
    pub us_revenue_pct: f64,
    /// Percent of revenue at risk from patent expiries over the horizon
    pub patent_expiry_risk_pct: f64,
    /// Open regulatory observations (USFDA and equivalents)
    pub regulatory_observations: u32,
    pub anda_filings: u32,
    pub dmf_filings: u32,
    pub free_cash_flow: Option<f64>,
    /// Peer EV/EBITDA multiples for the multiple leg; empty means the
    /// sector benchmark is used instead
    #[serde(default)]
    pub peer_ev_ebitda: Vec<f64>,
}

impl PharmaMetrics {
    pub fn validate(&self) -> Result<(), ValuationError> {
        check_positive("revenue", self.revenue)?;
        check_positive("ebitda", self.ebitda)?;
        check_range("ebitda_margin", self.ebitda_margin, -100.0, 100.0)?;
        check_range("rd_to_revenue_pct", self.rd_to_revenue_pct, 0.0, 60.0)?;
        check_range("us_revenue_pct", self.us_revenue_pct, 0.0, 100.0)?;
        check_range("patent_expiry_risk_pct", self.patent_expiry_risk_pct, 0.0, 100.0)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CityTier {
    Tier1,
    Tier2,
    Tier3,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetType {
    Residential,
    Commercial,
    Retail,
    MixedUse,
}

/// One development project in a real-estate company's portfolio
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectRecord {
    pub name: String,
    pub location: String,
    pub city_tier: CityTier,
    pub asset_type: AssetType,
    pub total_area_sqft: f64,
    pub saleable_area_sqft: f64,
    pub realization_per_sqft: f64,
    pub construction_cost_per_sqft: f64,
    /// 0 to 100
    pub completion_pct: f64,
    pub months_to_completion: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealEstateMetrics {
    pub projects: Vec<ProjectRecord>,
    /// Book value of land holdings
    pub land_bank_value: f64,
    /// Annual appreciation rate override; defaults to 5% when absent
    pub land_appreciation_rate: Option<f64>,
    pub net_debt: f64,
    pub debt_to_equity: f64,
    pub inventory_turnover: f64,
    pub interest_coverage: f64,
}

impl RealEstateMetrics {
    pub fn validate(&self) -> Result<(), ValuationError> {
        if self.projects.is_empty() {
            return Err(ValuationError::Precondition(
                "at least one project record is required".to_string(),
            ));
        }
        for (idx, p) in self.projects.iter().enumerate() {
            let fail = |msg: String| {
                Err(ValuationError::Precondition(format!("project {}: {}", idx, msg)))
            };
            if p.total_area_sqft <= 0.0 || p.saleable_area_sqft <= 0.0 {
                return fail(format!(
                    "areas must be positive (total {}, saleable {})",
                    p.total_area_sqft, p.saleable_area_sqft
                ));
            }
            if p.saleable_area_sqft > p.total_area_sqft {
                return fail(format!(
                    "saleable area {} exceeds total area {}",
                    p.saleable_area_sqft, p.total_area_sqft
                ));
            }
            if !(0.0..=100.0).contains(&p.completion_pct) {
                return fail(format!("completion_pct {} outside [0, 100]", p.completion_pct));
            }
            if p.realization_per_sqft <= 0.0 || p.construction_cost_per_sqft <= 0.0 {
                return fail("per-sqft realization and cost must be positive".to_string());
            }
            if p.months_to_completion < 0.0 {
                return fail(format!("months_to_completion {} is negative", p.months_to_completion));
            }
        }
        check_range("debt_to_equity", self.debt_to_equity, 0.0, 20.0)?;
        check_range("inventory_turnover", self.inventory_turnover, 0.0, 50.0)?;
        if self.land_bank_value < 0.0 {
            return Err(ValuationError::Precondition(format!(
                "land_bank_value must be non-negative, got {}",
                self.land_bank_value
            )));
        }
        Ok(())
    }
}

/// Fallback-sector figures; every field optional so the model can estimate
/// from market cap when fundamentals are unobserved
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GenericMetrics {
    pub revenue: Option<f64>,
    pub ebitda: Option<f64>,
    pub net_income: Option<f64>,
    pub free_cash_flow: Option<f64>,
    pub net_debt: Option<f64>,
    /// Percent, year over year
    pub revenue_growth: Option<f64>,
}

impl GenericMetrics {
    pub fn validate(&self) -> Result<(), ValuationError> {
        for (field, value) in [
            ("revenue", self.revenue),
            ("ebitda", self.ebitda),
            ("free_cash_flow", self.free_cash_flow),
        ] {
            if let Some(v) = value {
                if !v.is_finite() {
                    return Err(ValuationError::Precondition(format!(
                        "{} is not a finite number",
                        field
                    )));
                }
            }
        }
        Ok(())
    }
}

/// Closed union of per-sector metric bundles. Constructed by the caller and
/// never mutated by the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum MetricsBundle {
    Banking(BankingMetrics),
    Pharma(PharmaMetrics),
    RealEstate(RealEstateMetrics),
    Generic(GenericMetrics),
}

impl MetricsBundle {
    pub fn validate(&self) -> Result<(), ValuationError> {
        match self {
            MetricsBundle::Banking(m) => m.validate(),
            MetricsBundle::Pharma(m) => m.validate(),
            MetricsBundle::RealEstate(m) => m.validate(),
            MetricsBundle::Generic(m) => m.validate(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sound_bank() -> BankingMetrics {
        BankingMetrics {
            net_interest_margin: 3.5,
            return_on_equity: 15.0,
            cost_to_income: 45.0,
            gross_npa_ratio: 3.0,
            provision_coverage: 75.0,
            capital_adequacy_ratio: 14.0,
            casa_ratio: 45.0,
            book_value_per_share: 100.0,
        }
    }

    #[test]
    fn banking_validator_accepts_sound_bank() {
        assert!(sound_bank().validate().is_ok());
    }

    #[test]
    fn banking_validator_rejects_out_of_range_gnpa() {
        let mut m = sound_bank();
        m.gross_npa_ratio = 60.0;
        let err = m.validate().unwrap_err();
        assert!(err.to_string().contains("gross_npa_ratio"));
    }

    #[test]
    fn banking_validator_rejects_non_positive_book_value() {
        let mut m = sound_bank();
        m.book_value_per_share = 0.0;
        assert!(m.validate().is_err());
    }

    #[test]
    fn real_estate_validator_reports_project_index() {
        let metrics = RealEstateMetrics {
            projects: vec![
                ProjectRecord {
                    name: "Phase I".to_string(),
                    location: "Pune".to_string(),
                    city_tier: CityTier::Tier2,
                    asset_type: AssetType::Residential,
                    total_area_sqft: 1_000_000.0,
                    saleable_area_sqft: 800_000.0,
                    realization_per_sqft: 6_500.0,
                    construction_cost_per_sqft: 2_800.0,
                    completion_pct: 60.0,
                    months_to_completion: 18.0,
                },
                ProjectRecord {
                    name: "Phase II".to_string(),
                    location: "Pune".to_string(),
                    city_tier: CityTier::Tier2,
                    asset_type: AssetType::Residential,
                    total_area_sqft: 500_000.0,
                    saleable_area_sqft: 600_000.0, // saleable > total
                    realization_per_sqft: 6_500.0,
                    construction_cost_per_sqft: 2_800.0,
                    completion_pct: 10.0,
                    months_to_completion: 40.0,
                },
            ],
            land_bank_value: 2_000_000_000.0,
            land_appreciation_rate: None,
            net_debt: 1_000_000_000.0,
            debt_to_equity: 0.8,
            inventory_turnover: 0.5,
            interest_coverage: 3.0,
        };
        let err = metrics.validate().unwrap_err();
        assert!(err.to_string().contains("project 1"));
    }

    #[test]
    fn real_estate_validator_requires_projects() {
        let metrics = RealEstateMetrics {
            projects: vec![],
            land_bank_value: 0.0,
            land_appreciation_rate: None,
            net_debt: 0.0,
            debt_to_equity: 0.5,
            inventory_turnover: 0.5,
            interest_coverage: 3.0,
        };
        assert!(metrics.validate().is_err());
    }
}
