#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Sqlx(#[from] sqlx::Error),
	#[error("Invalid argument: {0}")]
	InvalidArgument(String),
	#[error("Not found: {0}")]
	NotFound(String),
	#[error("Conflict: {0}")]
	Conflict(String),
}
impl Error {
	/// True when the wrapped database error is a Postgres unique violation
	/// (SQLSTATE 23505), e.g. a duplicate `external_ticket_id`.
	pub fn is_unique_violation(&self) -> bool {
		match self {
			Self::Sqlx(sqlx::Error::Database(err)) => err.code().as_deref() == Some("23505"),
			_ => false,
		}
	}
}
