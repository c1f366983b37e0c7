use hindcast_io::{
    CorrectedForecast, ForecastVariant, Granularity, GridPoint, Location, ProbabilityRecord,
    QuantileSet, ReanalysisOutcome, ReanalysisRecord,
};
use hindcast_skill::{
    SkillConfig, climatology_profile, evaluate_skill, leadtime_dependency, to_json,
};

fn point() -> Location {
    Location::Pixel(GridPoint::new(9.5, 14.5))
}

#[test]
fn test_report_serializes_to_json() {
    let quantiles = QuantileSet::new(vec![0.5, 0.2]).unwrap();
    let mut probabilities = Vec::new();
    let mut outcomes = Vec::new();
    let mut corrected = Vec::new();
    let mut reanalysis = Vec::new();
    for (i, year) in (2000..2010).enumerate() {
        let wet = i % 2 == 0;
        let tp = if wet { 4.0 } else { 1.0 };
        outcomes.push(ReanalysisOutcome {
            location: point(),
            year,
            month: 8,
            tp_mm_day: tp,
            climatology_mean: 2.5,
            thresholds: vec![2.5, 1.0],
            below: vec![if wet { 0.0 } else { 1.0 }, if wet { 0.0 } else { 1.0 }],
        });
        reanalysis.push(ReanalysisRecord {
            location: point(),
            year,
            month: 8,
            tp_mm_day: tp,
        });
        for lead_time in 1..=2 {
            probabilities.push(ProbabilityRecord {
                location: point(),
                year,
                month: 8,
                lead_time,
                tp_mm_day: tp,
                thresholds: vec![2.5, 1.0],
                probabilities: if wet { vec![0.2, 0.1] } else { vec![0.8, 0.6] },
                bias: Some(0.0),
                mae: Some(0.0),
            });
            corrected.push(CorrectedForecast {
                location: point(),
                number: 0,
                year,
                month: 8,
                lead_time,
                tp_mm_day_raw: tp + f64::from(lead_time),
                tp_mm_day_bias_corrected: tp,
                tp_mm_day_era5_calibrated: Some(tp),
            });
        }
    }

    let config = SkillConfig::default();
    let mut report = evaluate_skill(
        &probabilities,
        &outcomes,
        &quantiles,
        ForecastVariant::BiasCorrected,
        Granularity::Pixel,
        &config,
    )
    .unwrap();
    report.leadtime_dependency =
        leadtime_dependency(&corrected, &reanalysis, Granularity::Pixel, &config).unwrap();
    report.climatology_profile =
        climatology_profile(&corrected, &reanalysis, Granularity::Pixel, &config).unwrap();

    assert_eq!(report.n_pairs, 20);
    assert_eq!(report.scores.len(), 4);
    assert!(report.scores.iter().all(|s| s.auc == Some(1.0)));
    assert_eq!(report.spatial_accuracy.len(), 2);
    assert!(report.spatial_accuracy.iter().all(|s| s.accuracy == 1.0));

    let raw_lead2 = report
        .leadtime_dependency
        .iter()
        .find(|e| e.variant == "raw" && e.lead_time == 2)
        .unwrap();
    assert_eq!(raw_lead2.bias, 2.0);

    let json = to_json(&report).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["config"]["variant"], "bias_corrected");
    assert_eq!(value["config"]["granularity"], "pixel");
    assert!(value["spatial_accuracy"][0]["pixel_geom_id"].is_i64());
    assert_eq!(value["scores"][0]["roc"]["thresholds"][0], serde_json::Value::Null);
}
