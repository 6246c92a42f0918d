mod plan;


use clap::Parser;

use crate::args::CliArgs;
use crate::error::{AppError, AppResult, ValidationError};
use plan::{build_plan, execute_plan};

pub(crate) fn run() -> AppResult<()> {
    let args = CliArgs::parse();

    crate::system::logger::init_logging(args.verbose, args.no_color);

    build_runtime()?.block_on(run_async(args))
}

fn build_runtime() -> AppResult<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|source| AppError::validation(ValidationError::RuntimeBuildFailed { source }))
}

async fn run_async(args: CliArgs) -> AppResult<()> {
    let plan = build_plan(args)?;
    execute_plan(plan).await
}
