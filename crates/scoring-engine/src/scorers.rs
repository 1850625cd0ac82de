use std::sync::Arc;

use async_trait::async_trait;
use valuation_core::{
    ComponentKind, ComponentScore, ComponentScorer, DataQuality, FinancialSnapshot, MacdSignal,
    PeerRecord, ScoringInputs, SupportResistance, TechnicalSnapshot, VolumeTrend,
};
use valuation_router::SectorValuationRouter;

/// Fixed bands converting valuation upside/downside percent to a raw score
pub fn upside_band_score(upside_pct: f64) -> f64 {
    if upside_pct >= 50.0 {
        90.0
    } else if upside_pct >= 25.0 {
        60.0
    } else if upside_pct >= 10.0 {
        30.0
    } else if upside_pct >= -10.0 {
        0.0
    } else if upside_pct >= -25.0 {
        -30.0
    } else if upside_pct >= -50.0 {
        -60.0
    } else {
        -90.0
    }
}

fn quality_from_confidence(confidence: f64) -> DataQuality {
    if confidence >= 0.7 {
        DataQuality::High
    } else if confidence >= 0.45 {
        DataQuality::Medium
    } else {
        DataQuality::Low
    }
}

/// Wraps the sector router: fair-value upside versus the current price
pub struct DcfScorer {
    router: Arc<SectorValuationRouter>,
}

impl DcfScorer {
    pub fn new(router: Arc<SectorValuationRouter>) -> Self {
        Self { router }
    }
}

#[async_trait]
impl ComponentScorer for DcfScorer {
    async fn score(&self, inputs: &ScoringInputs) -> ComponentScore {
        let sector = sector_classifier::classify(&inputs.ticker);
        let routed = self.router.value(
            &inputs.ticker,
            sector,
            &inputs.metrics,
            &inputs.market,
            false,
        );
        if !routed.valuation.is_usable() {
            return ComponentScore::degraded(
                ComponentKind::Dcf,
                "valuation unavailable: sector model could not produce a fair value",
            );
        }
        let upside = match routed.upside_downside_pct {
            Some(u) => u,
            None => {
                return ComponentScore::degraded(
                    ComponentKind::Dcf,
                    "valuation upside unavailable without a current price",
                )
            }
        };

        let raw = upside_band_score(upside);
        let reasoning = vec![
            format!(
                "fair value {:.2} vs market price implies {:.1}% {}",
                routed.valuation.fair_value_per_share,
                upside.abs(),
                if upside >= 0.0 { "upside" } else { "downside" }
            ),
            format!("valued via {}", routed.valuation.method.as_str()),
        ];
        let confidence = routed.valuation.confidence;
        ComponentScore::new(
            ComponentKind::Dcf,
            raw,
            confidence,
            reasoning,
            quality_from_confidence(confidence),
        )
    }
}

/// Financial-health scorer: five banded ratio sub-scores
pub struct FinancialScorer;

/// Banded sub-scores, one per ratio, each worth up to +/-25 points
pub fn financial_sub_scores(f: &FinancialSnapshot) -> Vec<(f64, String)> {
    let mut subs = Vec::new();
    if let Some(roe) = f.roe {
        let (points, verdict) = if roe >= 20.0 {
            (25.0, "excellent")
        } else if roe >= 15.0 {
            (15.0, "strong")
        } else if roe >= 10.0 {
            (5.0, "adequate")
        } else if roe >= 5.0 {
            (-10.0, "weak")
        } else {
            (-25.0, "poor")
        };
        subs.push((points, format!("ROE {:.1}% is {}", roe, verdict)));
    }
    if let Some(margin) = f.profit_margin {
        let (points, verdict) = if margin >= 20.0 {
            (25.0, "excellent")
        } else if margin >= 12.0 {
            (15.0, "strong")
        } else if margin >= 6.0 {
            (5.0, "adequate")
        } else if margin >= 2.0 {
            (-10.0, "thin")
        } else {
            (-25.0, "poor")
        };
        subs.push((points, format!("profit margin {:.1}% is {}", margin, verdict)));
    }
    if let Some(growth) = f.revenue_growth {
        let (points, verdict) = if growth >= 20.0 {
            (25.0, "rapid")
        } else if growth >= 10.0 {
            (15.0, "healthy")
        } else if growth >= 5.0 {
            (5.0, "modest")
        } else if growth >= 0.0 {
            (-5.0, "stagnant")
        } else {
            (-25.0, "declining")
        };
        subs.push((points, format!("revenue growth {:.1}% is {}", growth, verdict)));
    }
    if let Some(de) = f.debt_to_equity {
        let (points, verdict) = if de <= 0.5 {
            (25.0, "conservative")
        } else if de <= 1.0 {
            (10.0, "moderate")
        } else if de <= 1.5 {
            (0.0, "elevated")
        } else if de <= 2.0 {
            (-10.0, "high")
        } else {
            (-25.0, "excessive")
        };
        subs.push((points, format!("debt/equity {:.2}x is {}", de, verdict)));
    }
    if let Some(cr) = f.current_ratio {
        let (points, verdict) = if cr >= 2.0 {
            (25.0, "strong")
        } else if cr >= 1.5 {
            (15.0, "healthy")
        } else if cr >= 1.0 {
            (0.0, "adequate")
        } else if cr >= 0.75 {
            (-10.0, "tight")
        } else {
            (-25.0, "strained")
        };
        subs.push((points, format!("current ratio {:.2}x is {}", cr, verdict)));
    }
    subs
}

#[async_trait]
impl ComponentScorer for FinancialScorer {
    async fn score(&self, inputs: &ScoringInputs) -> ComponentScore {
        let subs = financial_sub_scores(&inputs.financials);
        if subs.is_empty() {
            return ComponentScore::degraded(
                ComponentKind::Financial,
                "no financial ratios supplied",
            );
        }
        let raw: f64 = subs.iter().map(|(points, _)| points).sum();
        let present = subs.len();
        let confidence = (0.4 + 0.1 * present as f64).min(0.9);
        let quality = if present == 5 {
            DataQuality::High
        } else if present >= 3 {
            DataQuality::Medium
        } else {
            DataQuality::Low
        };
        let reasoning = subs.into_iter().map(|(_, reason)| reason).collect();
        ComponentScore::new(ComponentKind::Financial, raw, confidence, reasoning, quality)
    }
}

/// Technical-momentum scorer over pre-computed indicator categories
pub struct TechnicalScorer;

pub fn technical_sub_scores(t: &TechnicalSnapshot) -> Vec<(f64, String)> {
    let mut subs = Vec::new();
    if let Some(rsi) = t.rsi {
        let (points, verdict) = if rsi < 30.0 {
            (20.0, "oversold")
        } else if rsi < 45.0 {
            (10.0, "cooling")
        } else if rsi <= 55.0 {
            (0.0, "neutral")
        } else if rsi <= 70.0 {
            (-10.0, "warm")
        } else {
            (-20.0, "overbought")
        };
        subs.push((points, format!("RSI {:.0} is {}", rsi, verdict)));
    }
    if let Some(macd) = t.macd {
        let (points, label) = match macd {
            MacdSignal::BullishCross => (20.0, "bullish crossover"),
            MacdSignal::Bullish => (10.0, "bullish"),
            MacdSignal::Neutral => (0.0, "neutral"),
            MacdSignal::Bearish => (-10.0, "bearish"),
            MacdSignal::BearishCross => (-20.0, "bearish crossover"),
        };
        subs.push((points, format!("MACD is {}", label)));
    }
    if let Some(volume) = t.volume_trend {
        let (points, label) = match volume {
            VolumeTrend::Accumulation => (20.0, "accumulation"),
            VolumeTrend::Rising => (10.0, "rising"),
            VolumeTrend::Flat => (0.0, "flat"),
            VolumeTrend::Falling => (-10.0, "falling"),
            VolumeTrend::Distribution => (-20.0, "distribution"),
        };
        subs.push((points, format!("volume trend shows {}", label)));
    }
    if let Some(momentum) = t.momentum_pct {
        let (points, verdict) = if momentum >= 15.0 {
            (20.0, "strong positive")
        } else if momentum >= 5.0 {
            (10.0, "positive")
        } else if momentum > -5.0 {
            (0.0, "flat")
        } else if momentum >= -15.0 {
            (-10.0, "negative")
        } else {
            (-20.0, "strong negative")
        };
        subs.push((points, format!("price momentum {:.1}% is {}", momentum, verdict)));
    }
    if let Some(sr) = t.support_resistance {
        let (points, label) = match sr {
            SupportResistance::BreakoutAbove => (20.0, "breakout above resistance"),
            SupportResistance::NearSupport => (10.0, "holding near support"),
            SupportResistance::MidRange => (0.0, "mid-range"),
            SupportResistance::NearResistance => (-10.0, "pressing resistance"),
            SupportResistance::BreakdownBelow => (-20.0, "breakdown below support"),
        };
        subs.push((points, format!("price is {}", label)));
    }
    subs
}

#[async_trait]
impl ComponentScorer for TechnicalScorer {
    async fn score(&self, inputs: &ScoringInputs) -> ComponentScore {
        let subs = technical_sub_scores(&inputs.technicals);
        if subs.is_empty() {
            return ComponentScore::degraded(
                ComponentKind::Technical,
                "no technical indicators supplied",
            );
        }
        let raw: f64 = subs.iter().map(|(points, _)| points).sum();
        let present = subs.len();
        let confidence = (0.4 + 0.1 * present as f64).min(0.9);
        let quality = if present == 5 {
            DataQuality::High
        } else if present >= 3 {
            DataQuality::Medium
        } else {
            DataQuality::Low
        };
        let reasoning = subs.into_iter().map(|(_, reason)| reason).collect();
        ComponentScore::new(ComponentKind::Technical, raw, confidence, reasoning, quality)
    }
}

/// Peer relative-value scorer against sector peer medians
pub struct PeerScorer;

fn median(values: Vec<f64>) -> Option<f64> {
    let mut sorted: Vec<f64> = values.into_iter().filter(|v| v.is_finite()).collect();
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

pub fn peer_sub_scores(
    peers: &[PeerRecord],
    subject_pe: Option<f64>,
    subject_growth: Option<f64>,
    subject_margin: Option<f64>,
) -> Vec<(f64, String)> {
    let mut subs = Vec::new();

    let median_pe = median(peers.iter().filter_map(|p| p.pe).collect());
    if let (Some(pe), Some(med)) = (subject_pe.filter(|pe| *pe > 0.0), median_pe) {
        let ratio = pe / med;
        let (points, verdict) = if ratio < 0.80 {
            (25.0, "deep discount to")
        } else if ratio < 0.95 {
            (12.0, "discount to")
        } else if ratio <= 1.05 {
            (0.0, "in line with")
        } else if ratio <= 1.25 {
            (-12.0, "premium to")
        } else {
            (-25.0, "steep premium to")
        };
        subs.push((
            points,
            format!("P/E {:.1}x trades at a {} peer median {:.1}x", pe, verdict, med),
        ));
    }

    let median_growth = median(peers.iter().filter_map(|p| p.revenue_growth).collect());
    if let (Some(growth), Some(med)) = (subject_growth, median_growth) {
        let diff = growth - med;
        let (points, verdict) = if diff >= 10.0 {
            (20.0, "well above")
        } else if diff >= 3.0 {
            (10.0, "above")
        } else if diff >= -3.0 {
            (0.0, "in line with")
        } else if diff >= -10.0 {
            (-10.0, "below")
        } else {
            (-20.0, "well below")
        };
        subs.push((
            points,
            format!("revenue growth {:.1}% is {} the peer median {:.1}%", growth, verdict, med),
        ));
    }

    let median_margin = median(peers.iter().filter_map(|p| p.profit_margin).collect());
    if let (Some(margin), Some(med)) = (subject_margin, median_margin) {
        let diff = margin - med;
        let (points, verdict) = if diff >= 8.0 {
            (15.0, "well above")
        } else if diff >= 3.0 {
            (8.0, "above")
        } else if diff >= -3.0 {
            (0.0, "in line with")
        } else if diff >= -8.0 {
            (-8.0, "below")
        } else {
            (-15.0, "well below")
        };
        subs.push((
            points,
            format!("profit margin {:.1}% is {} the peer median {:.1}%", margin, verdict, med),
        ));
    }

    subs
}

#[async_trait]
impl ComponentScorer for PeerScorer {
    async fn score(&self, inputs: &ScoringInputs) -> ComponentScore {
        if inputs.peers.is_empty() {
            return ComponentScore::degraded(ComponentKind::Peer, "no peer data supplied");
        }
        let subs = peer_sub_scores(
            &inputs.peers,
            inputs.market.trailing_pe,
            inputs.financials.revenue_growth,
            inputs.financials.profit_margin,
        );
        if subs.is_empty() {
            return ComponentScore::degraded(
                ComponentKind::Peer,
                "peer records carry no comparable metrics",
            );
        }
        let raw: f64 = subs.iter().map(|(points, _)| points).sum();
        let comparisons = subs.len();
        let confidence = (0.45 + 0.1 * comparisons as f64).min(0.8);
        let quality = if comparisons == 3 {
            DataQuality::High
        } else if comparisons == 2 {
            DataQuality::Medium
        } else {
            DataQuality::Low
        };
        let reasoning = subs.into_iter().map(|(_, reason)| reason).collect();
        ComponentScore::new(ComponentKind::Peer, raw, confidence, reasoning, quality)
    }
}
