use valuation_core::{
    FinancialSnapshot, MacdSignal, PeerRecord, SupportResistance, TechnicalSnapshot, VolumeTrend,
};

use crate::scorers::*;

fn peers() -> Vec<PeerRecord> {
    vec![
        PeerRecord {
            ticker: "PEER1".to_string(),
            pe: Some(20.0),
            revenue_growth: Some(10.0),
            profit_margin: Some(15.0),
            market_cap: Some(1.0e11),
        },
        PeerRecord {
            ticker: "PEER2".to_string(),
            pe: Some(24.0),
            revenue_growth: Some(8.0),
            profit_margin: Some(12.0),
            market_cap: Some(2.0e11),
        },
        PeerRecord {
            ticker: "PEER3".to_string(),
            pe: Some(28.0),
            revenue_growth: Some(14.0),
            profit_margin: Some(18.0),
            market_cap: Some(3.0e11),
        },
    ]
}

#[test]
fn upside_bands_match_the_fixed_thresholds() {
    let cases = [
        (75.0, 90.0),
        (50.0, 90.0),
        (32.0, 60.0),
        (25.0, 60.0),
        (10.0, 30.0),
        (0.0, 0.0),
        (-10.0, 0.0),
        (-10.001, -30.0),
        (-25.0, -30.0),
        (-40.0, -60.0),
        (-50.0, -60.0),
        (-50.001, -90.0),
    ];
    for (upside, expected) in cases {
        assert_eq!(upside_band_score(upside), expected, "upside {}", upside);
    }
}

#[test]
fn financial_sub_scores_cover_all_five_ratios() {
    let snapshot = FinancialSnapshot {
        roe: Some(22.0),
        profit_margin: Some(25.0),
        revenue_growth: Some(25.0),
        debt_to_equity: Some(0.3),
        current_ratio: Some(2.5),
    };
    let subs = financial_sub_scores(&snapshot);
    assert_eq!(subs.len(), 5);
    let total: f64 = subs.iter().map(|(p, _)| p).sum();
    assert_eq!(total, 125.0); // clamped to 100 at the ComponentScore level
    assert!(subs.iter().all(|(_, reason)| !reason.is_empty()));
}

#[test]
fn weak_financials_score_negative() {
    let snapshot = FinancialSnapshot {
        roe: Some(3.0),
        profit_margin: Some(1.0),
        revenue_growth: Some(-8.0),
        debt_to_equity: Some(2.5),
        current_ratio: Some(0.6),
    };
    let total: f64 = financial_sub_scores(&snapshot).iter().map(|(p, _)| p).sum();
    assert_eq!(total, -125.0);
}

#[test]
fn partial_financials_only_score_present_ratios() {
    let snapshot = FinancialSnapshot {
        roe: Some(16.0),
        debt_to_equity: Some(0.4),
        ..FinancialSnapshot::default()
    };
    let subs = financial_sub_scores(&snapshot);
    assert_eq!(subs.len(), 2);
}

#[test]
fn technical_sub_scores_span_bullish_to_bearish() {
    let bullish = TechnicalSnapshot {
        rsi: Some(25.0),
        macd: Some(MacdSignal::BullishCross),
        volume_trend: Some(VolumeTrend::Accumulation),
        momentum_pct: Some(18.0),
        support_resistance: Some(SupportResistance::BreakoutAbove),
    };
    let total: f64 = technical_sub_scores(&bullish).iter().map(|(p, _)| p).sum();
    assert_eq!(total, 100.0);

    let bearish = TechnicalSnapshot {
        rsi: Some(78.0),
        macd: Some(MacdSignal::BearishCross),
        volume_trend: Some(VolumeTrend::Distribution),
        momentum_pct: Some(-20.0),
        support_resistance: Some(SupportResistance::BreakdownBelow),
    };
    let total: f64 = technical_sub_scores(&bearish).iter().map(|(p, _)| p).sum();
    assert_eq!(total, -100.0);
}

#[test]
fn peer_discount_scores_positive() {
    // Subject P/E 18 vs median 24: deep discount
    let subs = peer_sub_scores(&peers(), Some(18.0), Some(10.0), Some(15.0));
    assert_eq!(subs.len(), 3);
    assert_eq!(subs[0].0, 25.0);
    assert_eq!(subs[1].0, 0.0); // growth at the median
    assert_eq!(subs[2].0, 0.0); // margin at the median
}

#[test]
fn peer_premium_scores_negative() {
    let subs = peer_sub_scores(&peers(), Some(36.0), Some(-5.0), Some(2.0));
    let total: f64 = subs.iter().map(|(p, _)| p).sum();
    assert_eq!(total, -25.0 - 20.0 - 15.0);
}

#[test]
fn peer_comparison_skips_missing_subject_metrics() {
    let subs = peer_sub_scores(&peers(), None, Some(12.0), None);
    assert_eq!(subs.len(), 1);
}
