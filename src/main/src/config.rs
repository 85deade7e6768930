use crate::{
    cmd_arg::CmdArgs,
    general::metrics::DEFAULT_THRESHOLD_MS,
    result::{LMConfigErr, LMIoErr, LMResult},
};
use serde::{Deserialize, Serialize};
use std::{
    net::SocketAddr,
    path::{Path, PathBuf},
};

pub const CONFIG_FILE: &str = "files/service_config.yaml";
pub const DEFAULT_DATA_FILE: &str = "q-vercel-latency.json";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub addr: SocketAddr,
    pub data_file: PathBuf,
    pub default_threshold_ms: f64,
    pub metrics_enabled: bool,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], 8000)),
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            default_threshold_ms: DEFAULT_THRESHOLD_MS,
            metrics_enabled: true,
        }
    }
}

impl ServiceConfig {
    /// Command line values win over the file.
    pub fn apply_args(mut self, args: &CmdArgs) -> LMResult<Self> {
        if let Some(addr) = args.addr {
            self.addr = addr;
        }
        if let Some(data_file) = &args.data_file {
            self.data_file = data_file.clone();
        }
        if let Some(threshold_ms) = args.threshold_ms {
            self.default_threshold_ms = threshold_ms;
        }
        self.data_file = resolve(&args.files_dir, &self.data_file);
        self.check()?;
        Ok(self)
    }

    fn check(&self) -> LMResult<()> {
        if !self.default_threshold_ms.is_finite() {
            return Err(LMConfigErr::InvalidDefaultThreshold(self.default_threshold_ms).into());
        }
        Ok(())
    }
}

fn resolve(files_dir: &Path, p: &Path) -> PathBuf {
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        files_dir.join(p)
    }
}

fn read_yaml_config(file_path: &Path) -> LMResult<ServiceConfig> {
    let content = std::fs::read_to_string(file_path).map_err(|err| LMIoErr::Io {
        path: file_path.to_owned(),
        err,
    })?;
    let config = serde_yaml::from_str(&content).map_err(|err| LMConfigErr::DecodeYaml {
        path: file_path.to_owned(),
        err,
    })?;
    Ok(config)
}

/// Reads `<files_dir>/files/service_config.yaml`, defaults when the file is absent.
pub fn read_config(files_dir: impl AsRef<Path>) -> LMResult<ServiceConfig> {
    let config_path = files_dir.as_ref().join(CONFIG_FILE);
    if !config_path.exists() {
        tracing::info!("no config at {:?}, using defaults", config_path);
        return Ok(ServiceConfig::default());
    }
    read_yaml_config(&config_path)
}
