mod error;
mod types;

pub use error::{Error, Result};
pub use types::{Config, Cors, Postgres, Service, Storage};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.service.http_bind.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.http_bind must be non-empty.".to_string(),
		});
	}
	if cfg.service.log_level.trim().is_empty() {
		return Err(Error::Validation {
			message: "service.log_level must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.dsn.trim().is_empty() {
		return Err(Error::Validation {
			message: "storage.postgres.dsn must be non-empty.".to_string(),
		});
	}
	if cfg.storage.postgres.pool_max_conns == 0 {
		return Err(Error::Validation {
			message: "storage.postgres.pool_max_conns must be greater than zero.".to_string(),
		});
	}
	if cfg.cors.allowed_origins.is_empty() {
		return Err(Error::Validation {
			message: "cors.allowed_origins must be non-empty.".to_string(),
		});
	}
	if cfg.cors.max_age_secs == 0 {
		return Err(Error::Validation {
			message: "cors.max_age_secs must be greater than zero.".to_string(),
		});
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	for origin in &mut cfg.cors.allowed_origins {
		*origin = origin.trim().to_string();
	}

	cfg.cors.allowed_origins.retain(|origin| !origin.is_empty());

	// A wildcard origin makes every other entry redundant.
	if cfg.cors.allowed_origins.iter().any(|origin| origin == "*") {
		cfg.cors.allowed_origins = vec!["*".to_string()];
	}
}
