use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub cors: Cors,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub http_bind: String,
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Cors {
	/// Origins allowed to call the API. `["*"]` allows any origin.
	pub allowed_origins: Vec<String>,
	#[serde(default)]
	pub allow_credentials: bool,
	#[serde(default = "default_cors_max_age_secs")]
	pub max_age_secs: u64,
}

fn default_cors_max_age_secs() -> u64 {
	86_400
}
