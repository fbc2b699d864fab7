/*!
 * Tests for the ffmpeg filter construction helpers
 */

use dubwai::media::atempo_filter;

/// In-range factors produce a single stage
#[test]
fn test_atempo_filter_withinRange_shouldBeSingleStage() {
    assert_eq!(atempo_filter(1.5), "atempo=1.500000");
    assert_eq!(atempo_filter(0.5), "atempo=0.500000");
    assert_eq!(atempo_filter(2.0), "atempo=2.000000");
}

/// Factors above 2.0 decompose into a chain of in-range stages
#[test]
fn test_atempo_filter_withFastFactor_shouldChainStages() {
    assert_eq!(atempo_filter(2.5), "atempo=2.0,atempo=1.250000");
    assert_eq!(atempo_filter(4.0), "atempo=2.0,atempo=2.000000");
}

/// Factors below 0.5 decompose as well
#[test]
fn test_atempo_filter_withSlowFactor_shouldChainStages() {
    assert_eq!(atempo_filter(0.25), "atempo=0.5,atempo=0.500000");
}

/// Chained stages multiply back to the requested factor
#[test]
fn test_atempo_filter_withAnyFactor_shouldMultiplyBack() {
    for &factor in &[0.25, 0.5, 0.8, 1.0, 1.3, 2.0, 2.5, 3.7, 6.0] {
        let product: f64 = atempo_filter(factor)
            .split(',')
            .map(|stage| stage.trim_start_matches("atempo=").parse::<f64>().unwrap())
            .product();
        assert!(
            (product - factor).abs() < 1e-4,
            "chain for {} multiplies to {}",
            factor,
            product
        );
    }
}
