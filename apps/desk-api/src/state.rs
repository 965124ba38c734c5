use std::sync::Arc;

use desk_service::DeskService;
use desk_storage::db::Db;

#[derive(Clone)]
pub struct AppState {
	pub service: Arc<DeskService>,
}
impl AppState {
	pub async fn new(config: &desk_config::Config) -> color_eyre::Result<Self> {
		let db = Db::connect(&config.storage.postgres).await?;

		db.ensure_schema().await?;

		Ok(Self { service: Arc::new(DeskService::new(db)) })
	}
}
