pub fn render_schema() -> String {
	let init = include_str!("../../../sql/init.sql");

	expand_includes(init)
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"tables/001_support_sessions.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_support_sessions.sql")),
				"tables/002_messages.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_messages.sql")),
				"tables/003_agent_traces.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_agent_traces.sql")),
				"tables/004_knowledge_documents.sql" =>
					out.push_str(include_str!("../../../sql/tables/004_knowledge_documents.sql")),
				"tables/005_support_tickets.sql" =>
					out.push_str(include_str!("../../../sql/tables/005_support_tickets.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}
