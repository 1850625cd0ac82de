use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Sector tag produced by the classifier. Closed set — the router matches
/// exhaustively on it, so a new sector is a compile-time extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sector {
    Banking,
    Pharma,
    RealEstate,
    It,
    Fmcg,
    Energy,
}

impl Sector {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sector::Banking => "Banking",
            Sector::Pharma => "Pharma",
            Sector::RealEstate => "RealEstate",
            Sector::It => "IT",
            Sector::Fmcg => "FMCG",
            Sector::Energy => "Energy",
        }
    }
}

/// Valuation method used to produce a fair value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ValuationMethod {
    ExcessReturn,
    HybridDcf,
    Nav,
    GenericDcf,
    Fallback,
}

impl ValuationMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ValuationMethod::ExcessReturn => "Excess Return",
            ValuationMethod::HybridDcf => "Hybrid DCF",
            ValuationMethod::Nav => "NAV",
            ValuationMethod::GenericDcf => "Generic DCF",
            ValuationMethod::Fallback => "Fallback",
        }
    }
}

/// Point-in-time market data for the subject company, supplied by the caller
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MarketSnapshot {
    pub current_price: Option<f64>,
    pub shares_outstanding: Option<f64>,
    pub market_cap: Option<f64>,
    pub beta: Option<f64>,
    pub trailing_pe: Option<f64>,
    pub price_to_book: Option<f64>,
}

/// Output of a single valuation model run. Immutable once produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValuationResult {
    pub fair_value_per_share: f64,
    pub method: ValuationMethod,
    /// 0.0 to 1.0
    pub confidence: f64,
    /// Named numeric assumptions behind the fair value (discount rate,
    /// growth, spreads). BTreeMap keeps serialization order stable.
    pub assumptions: BTreeMap<String, f64>,
    /// Model-specific intermediate figures for the presentation layer
    pub sector_fields: BTreeMap<String, f64>,
}

impl ValuationResult {
    pub fn fallback() -> Self {
        Self {
            fair_value_per_share: 0.0,
            method: ValuationMethod::Fallback,
            confidence: 0.3,
            assumptions: BTreeMap::new(),
            sector_fields: BTreeMap::new(),
        }
    }

    /// Fair value is unusable when the model fell back or produced a
    /// non-positive figure; callers treat this as "valuation unavailable".
    pub fn is_usable(&self) -> bool {
        self.fair_value_per_share > 0.0 && self.method != ValuationMethod::Fallback
    }

    /// Conservative/base/optimistic band around the fair value, spread
    /// scaled by how uncertain the model was.
    pub fn fair_value_band(&self) -> (f64, f64, f64) {
        let spread = (1.0 - self.confidence) * 0.25;
        (
            self.fair_value_per_share * (1.0 - spread),
            self.fair_value_per_share,
            self.fair_value_per_share * (1.0 + spread),
        )
    }
}

/// A valuation result plus the routing metadata attached by the router
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutedValuation {
    pub ticker: String,
    pub sector: Sector,
    pub valuation: ValuationResult,
    /// (fair value - current price) / current price * 100; None when either
    /// side is unavailable
    pub upside_downside_pct: Option<f64>,
    pub timestamp: DateTime<Utc>,
}

/// The four scoring components and their fixed weights (sum to 1.0)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ComponentKind {
    Dcf,
    Financial,
    Technical,
    Peer,
}

impl ComponentKind {
    pub fn weight(&self) -> f64 {
        match self {
            ComponentKind::Dcf => 0.35,
            ComponentKind::Financial => 0.25,
            ComponentKind::Technical => 0.20,
            ComponentKind::Peer => 0.20,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ComponentKind::Dcf => "dcf",
            ComponentKind::Financial => "financial",
            ComponentKind::Technical => "technical",
            ComponentKind::Peer => "peer",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataQuality {
    High,
    Medium,
    Low,
}

/// Score contributed by one component of the weighted framework
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentScore {
    pub component: ComponentKind,
    /// -100 to 100
    pub raw_score: f64,
    /// raw_score * fixed component weight
    pub weighted_score: f64,
    /// 0.0 to 1.0
    pub confidence: f64,
    pub reasoning: Vec<String>,
    pub data_quality: DataQuality,
}

impl ComponentScore {
    pub fn new(
        component: ComponentKind,
        raw_score: f64,
        confidence: f64,
        reasoning: Vec<String>,
        data_quality: DataQuality,
    ) -> Self {
        let raw = raw_score.clamp(-100.0, 100.0);
        Self {
            component,
            raw_score: raw,
            weighted_score: raw * component.weight(),
            confidence: confidence.clamp(0.0, 1.0),
            reasoning,
            data_quality,
        }
    }

    /// Zero score for a component whose inputs were missing or unusable
    pub fn degraded(component: ComponentKind, reason: impl Into<String>) -> Self {
        Self::new(
            component,
            0.0,
            0.3,
            vec![reason.into()],
            DataQuality::Low,
        )
    }
}

/// Discrete investment stance derived from the total weighted score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InvestmentLabel {
    StronglyBullish,
    CautiouslyBullish,
    Neutral,
    CautiouslyBearish,
    StronglyBearish,
}

impl InvestmentLabel {
    /// Fixed thresholds; boundaries are inclusive upward
    pub fn from_score(score: f64) -> Self {
        if score >= 60.0 {
            InvestmentLabel::StronglyBullish
        } else if score >= 20.0 {
            InvestmentLabel::CautiouslyBullish
        } else if score >= -20.0 {
            InvestmentLabel::Neutral
        } else if score >= -60.0 {
            InvestmentLabel::CautiouslyBearish
        } else {
            InvestmentLabel::StronglyBearish
        }
    }

    pub fn to_label(&self) -> &'static str {
        match self {
            InvestmentLabel::StronglyBullish => "Strongly Bullish",
            InvestmentLabel::CautiouslyBullish => "Cautiously Bullish",
            InvestmentLabel::Neutral => "Neutral",
            InvestmentLabel::CautiouslyBearish => "Cautiously Bearish",
            InvestmentLabel::StronglyBearish => "Strongly Bearish",
        }
    }
}

/// Terminal artifact of a scoring request, handed to the presentation layer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WeightedScoringResult {
    pub ticker: String,
    /// -100 to 100
    pub total_score: f64,
    pub investment_label: InvestmentLabel,
    pub dcf: ComponentScore,
    pub financial: ComponentScore,
    pub technical: ComponentScore,
    pub peer: ComponentScore,
    /// 0.0 to 1.0, weight-blended across components
    pub confidence: f64,
    pub sector: String,
    pub data_warnings: Vec<String>,
    pub timestamp: DateTime<Utc>,
}

impl WeightedScoringResult {
    pub fn components(&self) -> [&ComponentScore; 4] {
        [&self.dcf, &self.financial, &self.technical, &self.peer]
    }
}

/// Financial-health ratios for the subject company (trailing twelve months)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FinancialSnapshot {
    /// Percent
    pub roe: Option<f64>,
    /// Percent
    pub profit_margin: Option<f64>,
    /// Percent, year over year
    pub revenue_growth: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub current_ratio: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MacdSignal {
    BullishCross,
    Bullish,
    Neutral,
    Bearish,
    BearishCross,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VolumeTrend {
    Accumulation,
    Rising,
    Flat,
    Falling,
    Distribution,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SupportResistance {
    BreakoutAbove,
    NearSupport,
    MidRange,
    NearResistance,
    BreakdownBelow,
}

/// Pre-computed technical indicators supplied by the indicator provider
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TechnicalSnapshot {
    pub rsi: Option<f64>,
    pub macd: Option<MacdSignal>,
    pub volume_trend: Option<VolumeTrend>,
    /// Percent move over the momentum lookback window
    pub momentum_pct: Option<f64>,
    pub support_resistance: Option<SupportResistance>,
}

/// One peer company record for relative-value comparison
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeerRecord {
    pub ticker: String,
    pub pe: Option<f64>,
    /// Percent
    pub revenue_growth: Option<f64>,
    /// Percent
    pub profit_margin: Option<f64>,
    pub market_cap: Option<f64>,
}
