use crate::core::grid::grid::GridSettings;
use crate::core::hist::axis::Axis;
use crate::core::hist::compact::KernelWidth;
use crate::core::hydrate::culling::CullingStrategy;
use crate::core::hydrate::placement::HydrationStrategy;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),

    #[error("Invalid value for '{name}': {reason}")]
    InvalidValue { name: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum ConfigLoadError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Invalid configuration in '{path}': {source}")]
    Invalid { path: String, source: ConfigError },
}

fn load_toml<T: DeserializeOwned>(path: &Path) -> Result<T, ConfigLoadError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigLoadError::Io {
        path: path.to_string_lossy().to_string(),
        source: e,
    })?;
    toml::from_str(&content).map_err(|e| ConfigLoadError::Toml {
        path: path.to_string_lossy().to_string(),
        source: e,
    })
}

fn invalid(name: &'static str, reason: impl Into<String>) -> ConfigError {
    ConfigError::InvalidValue {
        name,
        reason: reason.into(),
    }
}

/// Resolution of the partial histograms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum HistogramMode {
    /// One weight per distance bin.
    #[default]
    Unweighted,
    /// Also tracks the mean distance of every bin.
    Weighted,
    /// Resolves atom terms by form-factor class.
    FormFactor,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HistogramConfig {
    /// Width of a distance bin, in Angstroms.
    pub bin_width: f64,
    /// Largest pair distance the histogram can hold, in Angstroms.
    pub max_distance: f64,
    pub q_axis: Axis,
    pub mode: HistogramMode,
    pub kernel: KernelWidth,
    /// Worker threads; 0 uses the rayon default.
    pub threads: usize,
}

impl Default for HistogramConfig {
    fn default() -> Self {
        Self {
            bin_width: 0.25,
            max_distance: 2000.0,
            q_axis: Axis::new(1e-4, 0.5, 200),
            mode: HistogramMode::default(),
            kernel: KernelWidth::default(),
            threads: 0,
        }
    }
}

impl HistogramConfig {
    pub fn builder() -> HistogramConfigBuilder {
        HistogramConfigBuilder::new()
    }

    /// Loads a configuration from a TOML file. Missing keys take their default values.
    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let config: Self = load_toml(path)?;
        config.validate().map_err(|e| ConfigLoadError::Invalid {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.bin_width.is_finite() && self.bin_width > 0.0) {
            return Err(invalid("bin_width", "must be a positive number"));
        }
        if !(self.max_distance.is_finite() && self.max_distance > self.bin_width) {
            return Err(invalid("max_distance", "must exceed the bin width"));
        }
        if self.q_axis.bins == 0 {
            return Err(invalid("q_axis.bins", "must be at least 1"));
        }
        if !(self.q_axis.min.is_finite() && self.q_axis.max.is_finite())
            || self.q_axis.min < 0.0
            || self.q_axis.max < self.q_axis.min
        {
            return Err(invalid("q_axis", "must satisfy 0 <= min <= max"));
        }
        Ok(())
    }

    /// The distance axis implied by the bin width and maximum distance.
    pub fn d_axis(&self) -> Axis {
        Axis::distance(self.bin_width, self.max_distance)
    }
}

#[derive(Default)]
pub struct HistogramConfigBuilder {
    bin_width: Option<f64>,
    max_distance: Option<f64>,
    q_axis: Option<Axis>,
    mode: Option<HistogramMode>,
    kernel: Option<KernelWidth>,
    threads: Option<usize>,
}

impl HistogramConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bin_width(mut self, width: f64) -> Self {
        self.bin_width = Some(width);
        self
    }
    pub fn max_distance(mut self, distance: f64) -> Self {
        self.max_distance = Some(distance);
        self
    }
    pub fn q_axis(mut self, axis: Axis) -> Self {
        self.q_axis = Some(axis);
        self
    }
    pub fn mode(mut self, mode: HistogramMode) -> Self {
        self.mode = Some(mode);
        self
    }
    pub fn kernel(mut self, kernel: KernelWidth) -> Self {
        self.kernel = Some(kernel);
        self
    }
    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn build(self) -> Result<HistogramConfig, ConfigError> {
        let defaults = HistogramConfig::default();
        let config = HistogramConfig {
            bin_width: self.bin_width.unwrap_or(defaults.bin_width),
            max_distance: self.max_distance.unwrap_or(defaults.max_distance),
            q_axis: self.q_axis.unwrap_or(defaults.q_axis),
            mode: self.mode.unwrap_or(defaults.mode),
            kernel: self.kernel.unwrap_or(defaults.kernel),
            threads: self.threads.unwrap_or(defaults.threads),
        };
        config.validate()?;
        Ok(config)
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HydrationConfig {
    pub grid: GridSettings,
    pub strategy: HydrationStrategy,
    pub culling: CullingStrategy,
    /// Waters kept per atom after culling.
    pub water_fraction: f64,
    /// Seed of the random culling strategy.
    pub seed: u64,
    /// Also derive an excluded-volume point cloud from the grid.
    pub excluded_volume: bool,
}

impl Default for HydrationConfig {
    fn default() -> Self {
        Self {
            grid: GridSettings::default(),
            strategy: HydrationStrategy::default(),
            culling: CullingStrategy::default(),
            water_fraction: 0.1,
            seed: 0,
            excluded_volume: false,
        }
    }
}

impl HydrationConfig {
    pub fn builder() -> HydrationConfigBuilder {
        HydrationConfigBuilder::new()
    }

    pub fn load(path: &Path) -> Result<Self, ConfigLoadError> {
        let config: Self = load_toml(path)?;
        config.validate().map_err(|e| ConfigLoadError::Invalid {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let grid = &self.grid;
        if !(grid.cell_width.is_finite() && grid.cell_width > 0.0) {
            return Err(invalid("grid.cell_width", "must be a positive number"));
        }
        if !(grid.water_radius.is_finite() && grid.water_radius > 0.0) {
            return Err(invalid("grid.water_radius", "must be a positive number"));
        }
        if !(grid.scaling.is_finite() && grid.scaling >= 0.0) {
            return Err(invalid("grid.scaling", "must not be negative"));
        }
        if !grid.min_exv_radius.is_finite() || !grid.min_score.is_finite() {
            return Err(invalid("grid", "radii and scores must be finite"));
        }
        if !(self.water_fraction.is_finite() && self.water_fraction >= 0.0) {
            return Err(invalid("water_fraction", "must not be negative"));
        }
        Ok(())
    }

    /// Number of waters to keep for a structure of `atoms` atoms.
    pub fn target_waters(&self, atoms: usize) -> usize {
        (self.water_fraction * atoms as f64).round() as usize
    }
}

#[derive(Default)]
pub struct HydrationConfigBuilder {
    grid: Option<GridSettings>,
    strategy: Option<HydrationStrategy>,
    culling: Option<CullingStrategy>,
    water_fraction: Option<f64>,
    seed: Option<u64>,
    excluded_volume: Option<bool>,
}

impl HydrationConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grid(mut self, settings: GridSettings) -> Self {
        self.grid = Some(settings);
        self
    }
    pub fn strategy(mut self, strategy: HydrationStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }
    pub fn culling(mut self, culling: CullingStrategy) -> Self {
        self.culling = Some(culling);
        self
    }
    pub fn water_fraction(mut self, fraction: f64) -> Self {
        self.water_fraction = Some(fraction);
        self
    }
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
    pub fn excluded_volume(mut self, enabled: bool) -> Self {
        self.excluded_volume = Some(enabled);
        self
    }

    /// Builds the configuration. Random culling requires an explicit seed.
    pub fn build(self) -> Result<HydrationConfig, ConfigError> {
        let defaults = HydrationConfig::default();
        let culling = self.culling.unwrap_or(defaults.culling);
        let seed = match (culling, self.seed) {
            (CullingStrategy::Random, None) => return Err(ConfigError::MissingParameter("seed")),
            (_, seed) => seed.unwrap_or(defaults.seed),
        };
        let config = HydrationConfig {
            grid: self.grid.unwrap_or(defaults.grid),
            strategy: self.strategy.unwrap_or(defaults.strategy),
            culling,
            water_fraction: self.water_fraction.unwrap_or(defaults.water_fraction),
            seed,
            excluded_volume: self.excluded_volume.unwrap_or(defaults.excluded_volume),
        };
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::grid::grid::RadiusModel;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn histogram_builder_fills_defaults() {
        let config = HistogramConfig::builder().bin_width(0.5).build().unwrap();
        assert_eq!(config.bin_width, 0.5);
        assert_eq!(config.max_distance, 2000.0);
        assert_eq!(config.q_axis, Axis::new(1e-4, 0.5, 200));
        assert_eq!(config.kernel, KernelWidth::Octo);
        assert_eq!(config.d_axis().bins, 4001);
    }

    #[test]
    fn histogram_builder_rejects_invalid_values() {
        assert!(matches!(
            HistogramConfig::builder().bin_width(0.0).build(),
            Err(ConfigError::InvalidValue { name: "bin_width", .. })
        ));
        assert!(matches!(
            HistogramConfig::builder().max_distance(0.1).build(),
            Err(ConfigError::InvalidValue { name: "max_distance", .. })
        ));
        assert!(matches!(
            HistogramConfig::builder().q_axis(Axis::new(0.0, 0.5, 0)).build(),
            Err(ConfigError::InvalidValue { name: "q_axis.bins", .. })
        ));
    }

    #[test]
    fn histogram_config_loads_partial_toml_with_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hist.toml");
        fs::write(
            &path,
            r#"
            bin_width = 0.5
            mode = "weighted"
            kernel = "quad"
            [q_axis]
            min = 0.0
            max = 0.3
            bins = 30
            "#,
        )
        .unwrap();

        let config = HistogramConfig::load(&path).unwrap();
        assert_eq!(config.bin_width, 0.5);
        assert_eq!(config.mode, HistogramMode::Weighted);
        assert_eq!(config.kernel, KernelWidth::Quad);
        assert_eq!(config.q_axis.bins, 30);
        assert_eq!(config.max_distance, 2000.0);
    }

    #[test]
    fn histogram_config_load_reports_io_toml_and_validation_errors() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            HistogramConfig::load(&dir.path().join("missing.toml")),
            Err(ConfigLoadError::Io { .. })
        ));

        let broken = dir.path().join("broken.toml");
        fs::write(&broken, "bin_width = [").unwrap();
        assert!(matches!(
            HistogramConfig::load(&broken),
            Err(ConfigLoadError::Toml { .. })
        ));

        let invalid = dir.path().join("invalid.toml");
        fs::write(&invalid, "bin_width = -1.0").unwrap();
        assert!(matches!(
            HistogramConfig::load(&invalid),
            Err(ConfigLoadError::Invalid { .. })
        ));
    }

    #[test]
    fn hydration_builder_requires_seed_for_random_culling() {
        assert_eq!(
            HydrationConfig::builder()
                .culling(CullingStrategy::Random)
                .build(),
            Err(ConfigError::MissingParameter("seed"))
        );
        let config = HydrationConfig::builder()
            .culling(CullingStrategy::Random)
            .seed(3)
            .build()
            .unwrap();
        assert_eq!(config.seed, 3);
    }

    #[test]
    fn hydration_builder_validates_grid_settings() {
        let grid = GridSettings {
            cell_width: -1.0,
            ..GridSettings::default()
        };
        assert!(matches!(
            HydrationConfig::builder().grid(grid).build(),
            Err(ConfigError::InvalidValue { name: "grid.cell_width", .. })
        ));
    }

    #[test]
    fn hydration_config_loads_nested_grid_settings() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("hydrate.toml");
        fs::write(
            &path,
            r#"
            strategy = "axes"
            culling = "body_counter"
            water_fraction = 0.25
            excluded_volume = true
            [grid]
            cell_width = 0.5
            radius_model = { uniform = 1.5 }
            "#,
        )
        .unwrap();

        let config = HydrationConfig::load(&path).unwrap();
        assert_eq!(config.strategy, HydrationStrategy::Axes);
        assert_eq!(config.culling, CullingStrategy::BodyCounter);
        assert_eq!(config.grid.cell_width, 0.5);
        assert_eq!(config.grid.water_radius, 1.52);
        assert_eq!(config.grid.radius_model, RadiusModel::Uniform(1.5));
        assert!(config.excluded_volume);
        assert_eq!(config.target_waters(100), 25);
    }
}
