use clap::Parser;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = desk_api::Args::parse();

	desk_api::run(args).await
}
