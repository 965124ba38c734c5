use std::fmt;

use serde::{Deserialize, Serialize};

/// Session lifecycle status. Transitions are unrestricted; external workflow
/// decides when a session moves between states.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionStatus {
	Active,
	Archived,
	Closed,
}
impl SessionStatus {
	pub const ALL: [Self; 3] = [Self::Active, Self::Archived, Self::Closed];

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Active => "active",
			Self::Archived => "archived",
			Self::Closed => "closed",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|status| status.as_str() == raw)
	}
}
impl fmt::Display for SessionStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Ticket lifecycle status. Any value in the set may replace any other;
/// there is no enforced transition graph.
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
	Open,
	InProgress,
	Resolved,
	Closed,
}
impl TicketStatus {
	pub const ALL: [Self; 4] = [Self::Open, Self::InProgress, Self::Resolved, Self::Closed];

	pub fn as_str(&self) -> &'static str {
		match self {
			Self::Open => "open",
			Self::InProgress => "in_progress",
			Self::Resolved => "resolved",
			Self::Closed => "closed",
		}
	}

	pub fn parse(raw: &str) -> Option<Self> {
		Self::ALL.into_iter().find(|status| status.as_str() == raw)
	}
}
impl fmt::Display for TicketStatus {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}
