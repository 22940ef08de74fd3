use std::process::ExitCode;

use sfgs_mailer::Config;
use tracing::error;

#[tokio::main]
async fn main() -> ExitCode {
	tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
		)
		.with_target(false)
		.init();

	let config = match Config::from_env() {
		Ok(config) => config,
		Err(err) => {
			error!("FATAL: {}", err);
			return ExitCode::FAILURE;
		}
	};

	match sfgs_mailer::run(config).await {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			error!("FATAL: {}", err);
			ExitCode::FAILURE
		}
	}
}

// vim: ts=4
