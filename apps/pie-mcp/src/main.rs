use clap::Parser;

use pie_mcp::Args;

#[tokio::main]
async fn main() -> color_eyre::Result<()> {
	color_eyre::install()?;

	let args = Args::parse();

	pie_mcp::run(args).await
}
