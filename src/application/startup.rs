use tracing_subscriber::{EnvFilter, fmt};

use crate::{
    application::{
        commands,
        config::{Args, RuntimeConfig},
        state::AppContext,
    },
    domain::error::ApiError,
};

pub async fn run(args: Args) -> Result<(), ApiError> {
    let config = RuntimeConfig::from_args(&args).map_err(ApiError::Config)?;
    init_logging(&config.log_filter, config.json_logs)?;

    let context = AppContext::connect(config).await?;
    commands::run(&args.command, &context).await
}

fn init_logging(filter: &str, json_logs: bool) -> Result<(), ApiError> {
    let env_filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = fmt().with_env_filter(env_filter).with_target(false);

    if json_logs {
        builder.json().try_init().map_err(|error| {
            ApiError::Config(format!("failed to initialize logger: {error}"))
        })?;
    } else {
        builder.compact().try_init().map_err(|error| {
            ApiError::Config(format!("failed to initialize logger: {error}"))
        })?;
    }

    Ok(())
}
