//! Artifact file names inside the output directory.

use std::path::{Path, PathBuf};

use hindcast_io::{ForecastVariant, Granularity};

#[derive(Debug, Clone)]
pub struct Artifacts {
    dir: PathBuf,
}

impl Artifacts {
    pub fn new(dir: &Path) -> Self {
        Self {
            dir: dir.to_path_buf(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn reference_grid(&self) -> PathBuf {
        self.dir.join("reference_grid.parquet")
    }

    pub fn forecast(&self, g: Granularity) -> PathBuf {
        self.dir.join(format!("forecast_{g}.parquet"))
    }

    pub fn era5(&self, g: Granularity) -> PathBuf {
        self.dir.join(format!("era5_{g}.parquet"))
    }

    pub fn climatology(&self, g: Granularity) -> PathBuf {
        self.dir.join(format!("climatology_{g}.parquet"))
    }

    pub fn corrected(&self, g: Granularity) -> PathBuf {
        self.dir.join(format!("forecast_corrected_{g}.parquet"))
    }

    pub fn member_bias(&self, g: Granularity) -> PathBuf {
        self.dir.join(format!("member_bias_{g}.parquet"))
    }

    pub fn probability(&self, v: ForecastVariant, g: Granularity) -> PathBuf {
        self.dir.join(format!("probability_{v}_{g}.parquet"))
    }

    pub fn skill(&self, v: ForecastVariant, g: Granularity) -> PathBuf {
        self.dir.join(format!("skill_{v}_{g}.json"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_follow_granularity_and_variant() {
        let a = Artifacts::new(Path::new("out"));
        assert_eq!(a.forecast(Granularity::Admin), Path::new("out/forecast_admin.parquet"));
        assert_eq!(
            a.probability(ForecastVariant::BiasCorrected, Granularity::Pixel),
            Path::new("out/probability_bias_corrected_pixel.parquet")
        );
        assert_eq!(
            a.skill(ForecastVariant::Era5Calibrated, Granularity::Admin),
            Path::new("out/skill_era5_calibrated_admin.json")
        );
    }
}
