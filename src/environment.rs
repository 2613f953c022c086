// file: src/environment.rs
// description: optional geoprocessing toolkit detection and environment defaults
// reference: ArcGIS Pro geoprocessing environment settings

use crate::config::ToolkitConfig;
use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Environment variable consulted when no install directory is configured.
pub const TOOLKIT_HOME_VAR: &str = "ARCGIS_PRO_HOME";

/// NAD83 HARN / Washington South (ftUS).
pub const WA_SOUTH_HARN_FEET: u32 = 2927;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentSettings {
    pub overwrite_output: bool,
    pub log_history: bool,
    pub pyramid: String,
    pub raster_statistics: String,
    pub xy_resolution: String,
    pub xy_tolerance: String,
    pub output_coordinate_system: u32,
}

impl Default for EnvironmentSettings {
    fn default() -> Self {
        Self {
            overwrite_output: true,
            log_history: false,
            pyramid: "NONE".to_string(),
            raster_statistics: "None".to_string(),
            xy_resolution: "0.0005 METERS".to_string(),
            xy_tolerance: "0.001 METERS".to_string(),
            output_coordinate_system: WA_SOUTH_HARN_FEET,
        }
    }
}

/// Global processing flags of a geospatial toolkit session.
pub trait GeoprocessingEnvironment {
    fn set_overwrite_output(&mut self, enabled: bool) -> Result<()>;
    fn set_log_history(&mut self, enabled: bool) -> Result<()>;
    fn set_pyramid(&mut self, value: &str) -> Result<()>;
    fn set_raster_statistics(&mut self, value: &str) -> Result<()>;
    fn set_xy_resolution(&mut self, value: &str) -> Result<()>;
    fn set_xy_tolerance(&mut self, value: &str) -> Result<()>;
    fn set_output_coordinate_system(&mut self, wkid: u32) -> Result<()>;
}

/// Apply every flag in `settings`, stopping at the first one the toolkit rejects.
pub fn setup_environment(
    env: &mut dyn GeoprocessingEnvironment,
    settings: &EnvironmentSettings,
) -> Result<()> {
    env.set_overwrite_output(settings.overwrite_output)?;
    env.set_log_history(settings.log_history)?;
    env.set_pyramid(&settings.pyramid)?;
    env.set_raster_statistics(&settings.raster_statistics)?;
    env.set_xy_resolution(&settings.xy_resolution)?;
    env.set_xy_tolerance(&settings.xy_tolerance)?;
    env.set_output_coordinate_system(settings.output_coordinate_system)?;
    debug!(
        wkid = settings.output_coordinate_system,
        "Geoprocessing environment configured"
    );
    Ok(())
}

/// A detected toolkit installation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Toolkit {
    install_dir: PathBuf,
}

impl Toolkit {
    /// Look for the toolkit at the configured install directory, falling back
    /// to `ARCGIS_PRO_HOME`. Absence is reported as a warning, never an error.
    pub fn detect(config: &ToolkitConfig) -> Option<Self> {
        let candidate = config
            .install_dir
            .clone()
            .or_else(|| std::env::var_os(TOOLKIT_HOME_VAR).map(PathBuf::from));
        Self::detect_at(candidate.as_deref())
    }

    pub fn detect_at(install_dir: Option<&Path>) -> Option<Self> {
        match install_dir {
            Some(dir) if dir.is_dir() => {
                debug!(path = %dir.display(), "Geoprocessing toolkit found");
                Some(Self {
                    install_dir: dir.to_path_buf(),
                })
            }
            Some(dir) => {
                warn!(
                    path = %dir.display(),
                    "Geoprocessing toolkit not found; environment setup is unavailable"
                );
                None
            }
            None => {
                warn!(
                    "The geoprocessing toolkit does not seem to be available. Are you working in a virtual environment?"
                );
                None
            }
        }
    }

    pub fn install_dir(&self) -> &Path {
        &self.install_dir
    }

    pub fn setup_environment(&self, env: &mut dyn GeoprocessingEnvironment) -> Result<()> {
        setup_environment(env, &EnvironmentSettings::default())
    }
}

/// Apply the default settings when a toolkit was detected. Returns whether
/// anything was applied.
pub fn setup_toolkit_environment(
    toolkit: Option<&Toolkit>,
    env: &mut dyn GeoprocessingEnvironment,
) -> Result<bool> {
    match toolkit {
        Some(toolkit) => {
            toolkit.setup_environment(env)?;
            Ok(true)
        }
        None => Ok(false),
    }
}
