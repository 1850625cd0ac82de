use std::collections::BTreeMap;
use std::collections::HashMap;

use valuation_core::{
    AssetType, CityTier, MarketSnapshot, MetricsBundle, ProjectRecord, RealEstateMetrics,
    ValuationError, ValuationMethod, ValuationModel, ValuationResult,
};

#[derive(Debug, Clone)]
pub struct RealEstateAssumptions {
    /// Buffer applied on top of stated construction cost
    pub cost_overrun_buffer: f64,
    /// Default annual land appreciation when the bundle carries no override
    pub land_appreciation_rate: f64,
    /// Base development-potential premium on the land bank
    pub development_premium: f64,
    /// Cap on the total additive risk discount
    pub max_risk_discount: f64,
}

impl Default for RealEstateAssumptions {
    fn default() -> Self {
        Self {
            cost_overrun_buffer: 0.10,
            land_appreciation_rate: 0.05,
            development_premium: 0.15,
            max_risk_discount: 0.40,
        }
    }
}

/// Values a developer as the discounted sum of project margins plus an
/// appreciated land bank, less net debt and portfolio-level risk discounts.
pub struct RealEstateNavModel {
    assumptions: RealEstateAssumptions,
}

/// Location/type premium on realization, tiered by city tier and asset type
pub fn location_premium(tier: CityTier, asset: AssetType) -> f64 {
    match (tier, asset) {
        (CityTier::Tier1, AssetType::Residential) => 1.15,
        (CityTier::Tier1, AssetType::Commercial) => 1.30,
        (CityTier::Tier1, AssetType::Retail) => 1.20,
        (CityTier::Tier1, AssetType::MixedUse) => 1.25,
        (CityTier::Tier2, AssetType::Residential) => 1.00,
        (CityTier::Tier2, AssetType::Commercial) => 1.10,
        (CityTier::Tier2, AssetType::Retail) => 1.05,
        (CityTier::Tier2, AssetType::MixedUse) => 1.05,
        (CityTier::Tier3, AssetType::Residential) => 0.85,
        (CityTier::Tier3, AssetType::Commercial) => 0.90,
        (CityTier::Tier3, AssetType::Retail) => 0.90,
        (CityTier::Tier3, AssetType::MixedUse) => 0.85,
    }
}

/// Five discrete bands on construction progress
pub fn completion_discount(completion_pct: f64) -> f64 {
    if completion_pct >= 90.0 {
        0.95
    } else if completion_pct >= 70.0 {
        0.85
    } else if completion_pct >= 50.0 {
        0.75
    } else if completion_pct >= 30.0 {
        0.65
    } else {
        0.50
    }
}

/// Four discrete bands on time to completion
pub fn time_discount(months_to_completion: f64) -> f64 {
    if months_to_completion > 36.0 {
        0.60
    } else if months_to_completion > 24.0 {
        0.75
    } else if months_to_completion > 12.0 {
        0.85
    } else {
        0.95
    }
}

impl RealEstateNavModel {
    pub fn new() -> Self {
        Self {
            assumptions: RealEstateAssumptions::default(),
        }
    }

    pub fn with_assumptions(assumptions: RealEstateAssumptions) -> Self {
        Self { assumptions }
    }

    fn project_nav(&self, p: &ProjectRecord) -> f64 {
        let premium = location_premium(p.city_tier, p.asset_type);
        let revenue = p.saleable_area_sqft * p.realization_per_sqft * premium;
        let cost = p.total_area_sqft
            * p.construction_cost_per_sqft
            * (1.0 + self.assumptions.cost_overrun_buffer);
        let margin = revenue - cost;
        let discounted =
            margin * completion_discount(p.completion_pct) * time_discount(p.months_to_completion);
        discounted.max(0.0)
    }

    fn land_bank_nav(&self, m: &RealEstateMetrics) -> f64 {
        let a = &self.assumptions;
        let rate = m.land_appreciation_rate.unwrap_or(a.land_appreciation_rate);
        let appreciated = m.land_bank_value * (1.0 + rate);
        let mut premium = a.development_premium;
        if m.inventory_turnover >= 0.5 {
            premium += 0.05;
        } else if m.inventory_turnover < 0.3 {
            premium -= 0.05;
        }
        if m.debt_to_equity > 1.0 {
            premium -= 0.05;
        } else if m.debt_to_equity < 0.5 {
            premium += 0.05;
        }
        appreciated * (1.0 + premium)
    }

    /// Additive capped risk penalties; each one a named, testable rule
    pub fn risk_discount_rules(m: &RealEstateMetrics) -> Vec<(f64, &'static str)> {
        let mut rules = Vec::new();
        if m.debt_to_equity > 1.5 {
            let penalty = ((m.debt_to_equity - 1.5) * 0.10).min(0.15);
            rules.push((penalty, "leverage above 1.5x"));
        }
        if m.inventory_turnover < 0.3 {
            let penalty = ((0.3 - m.inventory_turnover) * 0.5).min(0.10);
            rules.push((penalty, "inventory turnover below 0.3x"));
        }
        let delayed = m
            .projects
            .iter()
            .filter(|p| p.months_to_completion > 36.0)
            .count() as f64
            / m.projects.len() as f64;
        if delayed > 0.3 {
            rules.push((((delayed - 0.3) * 0.5).min(0.10), "over 30% of projects delayed"));
        }
        let mut by_location: HashMap<&str, usize> = HashMap::new();
        for p in &m.projects {
            *by_location.entry(p.location.as_str()).or_insert(0) += 1;
        }
        let top_share = by_location
            .values()
            .copied()
            .max()
            .unwrap_or(0) as f64
            / m.projects.len() as f64;
        if top_share > 0.7 {
            rules.push((((top_share - 0.7) * 0.5).min(0.10), "over 70% concentration in one location"));
        }
        rules
    }

    pub fn confidence_rules(m: &RealEstateMetrics) -> Vec<(f64, &'static str)> {
        let mut rules = Vec::new();
        if m.debt_to_equity < 1.0 {
            rules.push((0.10, "conservative leverage"));
        } else if m.debt_to_equity > 2.0 {
            rules.push((-0.15, "stretched balance sheet"));
        }
        if m.inventory_turnover >= 0.5 {
            rules.push((0.05, "healthy inventory turnover"));
        } else if m.inventory_turnover < 0.2 {
            rules.push((-0.10, "slow-moving inventory"));
        }
        if m.interest_coverage >= 3.0 {
            rules.push((0.10, "comfortable interest coverage"));
        } else if m.interest_coverage < 1.5 {
            rules.push((-0.10, "thin interest coverage"));
        }
        if m.projects.len() >= 5 {
            rules.push((0.05, "diversified project count"));
        } else if m.projects.len() == 1 {
            rules.push((-0.05, "single-project concentration"));
        }
        let locations: std::collections::HashSet<&str> =
            m.projects.iter().map(|p| p.location.as_str()).collect();
        if locations.len() >= 3 {
            rules.push((0.05, "multi-city footprint"));
        }
        rules
    }
}

impl Default for RealEstateNavModel {
    fn default() -> Self {
        Self::new()
    }
}

impl ValuationModel for RealEstateNavModel {
    fn calculate(
        &self,
        metrics: &MetricsBundle,
        market: &MarketSnapshot,
    ) -> Result<ValuationResult, ValuationError> {
        let m = match metrics {
            MetricsBundle::RealEstate(m) => m,
            _ => {
                return Err(ValuationError::Precondition(
                    "real-estate model requires a real-estate metrics bundle".to_string(),
                ))
            }
        };
        m.validate()?;
        let shares = market
            .shares_outstanding
            .filter(|s| *s > 0.0)
            .ok_or_else(|| {
                ValuationError::InsufficientData(
                    "shares outstanding required for per-share NAV".to_string(),
                )
            })?;

        let project_nav: f64 = m.projects.iter().map(|p| self.project_nav(p)).sum();
        let land_nav = self.land_bank_nav(m);
        let gross_nav = project_nav + land_nav;

        let risk_rules = Self::risk_discount_rules(m);
        let risk_discount: f64 = risk_rules
            .iter()
            .map(|(penalty, _)| penalty)
            .sum::<f64>()
            .min(self.assumptions.max_risk_discount);

        let net_nav = (gross_nav - m.net_debt) * (1.0 - risk_discount);
        let gross_nav_per_share = gross_nav / shares;
        let net_nav_per_share = net_nav / shares;
        let discount_to_nav = market
            .current_price
            .filter(|_| net_nav_per_share > 0.0)
            .map(|price| (net_nav_per_share - price) / net_nav_per_share);

        let mut confidence: f64 = 0.5;
        for (delta, _) in Self::confidence_rules(m) {
            confidence += delta;
        }
        let confidence = confidence.clamp(0.25, 0.85);

        let mut assumptions = BTreeMap::new();
        assumptions.insert(
            "land_appreciation_rate".to_string(),
            m.land_appreciation_rate
                .unwrap_or(self.assumptions.land_appreciation_rate),
        );
        assumptions.insert(
            "cost_overrun_buffer".to_string(),
            self.assumptions.cost_overrun_buffer,
        );
        assumptions.insert("risk_discount".to_string(), risk_discount);

        let mut sector_fields = BTreeMap::new();
        sector_fields.insert("project_nav".to_string(), project_nav);
        sector_fields.insert("land_bank_nav".to_string(), land_nav);
        sector_fields.insert("gross_nav".to_string(), gross_nav);
        sector_fields.insert("net_nav".to_string(), net_nav);
        sector_fields.insert("gross_nav_per_share".to_string(), gross_nav_per_share);
        if let Some(d) = discount_to_nav {
            sector_fields.insert("discount_to_nav".to_string(), d);
        }

        Ok(ValuationResult {
            fair_value_per_share: net_nav_per_share,
            method: ValuationMethod::Nav,
            confidence,
            assumptions,
            sector_fields,
        })
    }
}
