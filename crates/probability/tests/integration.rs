use approx::assert_relative_eq;
use hindcast_climatology::{ClimatologyConfig, climatology};
use hindcast_io::{ForecastRecord, Granularity, GridPoint, Location, ReanalysisRecord};
use hindcast_probability::{ProbabilityConfig, probabilities};

#[test]
fn test_probabilities_from_reanalysis_climatology() {
    let point = GridPoint::new(10.0, 20.0);
    let location = Location::Pixel(point);

    // Reanalysis for May over ten years: 1..=10 mm/day.
    let reanalysis: Vec<ReanalysisRecord> = (0..10)
        .map(|i| ReanalysisRecord {
            location: location.clone(),
            year: 2000 + i,
            month: 5,
            tp_mm_day: (i + 1) as f64,
        })
        .collect();
    let config = ClimatologyConfig::default();
    let table = climatology(&reanalysis, Granularity::Pixel, &config).unwrap();

    // Four members for May 2005, lead 2.
    let forecast: Vec<ForecastRecord> = [1.0, 2.5, 5.5, 9.0]
        .iter()
        .enumerate()
        .map(|(n, &tp)| ForecastRecord {
            location: location.clone(),
            number: n as u32,
            year: 2005,
            month: 5,
            lead_time: 2,
            tp_mm_day: tp,
        })
        .collect();

    let out = probabilities(
        &forecast,
        &table,
        Some(&reanalysis),
        Granularity::Pixel,
        &ProbabilityConfig::default(),
    )
    .unwrap();
    assert_eq!(out.len(), 1);
    let row = &out[0];

    // q50 = 5.5, q20 = 2.8
    assert_relative_eq!(row.thresholds[0], 5.5, epsilon = 1e-12);
    assert_relative_eq!(row.thresholds[3], 2.8, epsilon = 1e-12);
    assert_relative_eq!(row.probabilities[0], 0.75);
    assert_relative_eq!(row.probabilities[3], 0.5);

    // Ensemble mean 4.5 against the 2005 reanalysis value 6.0.
    assert_relative_eq!(row.tp_mm_day, 4.5);
    assert_relative_eq!(row.bias.unwrap(), -1.5);
    assert_relative_eq!(row.mae.unwrap(), 1.5);
}
