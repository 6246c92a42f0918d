use crate::args::{CliArgs, Command, SuiteArgs};
use crate::config::{
    SuiteFile, auth_context, client_settings, fixed_load_config, identity_url, load_suite,
    select_requests, timed_load_config,
};
use crate::error::AppResult;

use super::types::{RunPlan, SuitePlan};

/// Run name used when the suite has none.
const DEFAULT_RUN_NAME: &str = "apiload";

pub(crate) fn build_plan(args: CliArgs) -> AppResult<RunPlan> {
    match args.command {
        Command::Fixed(fixed) => {
            let suite = load_suite(fixed.suite.suite.as_deref())?;
            let config = fixed_load_config(&suite, &fixed)?;
            Ok(RunPlan::Load {
                suite: suite_plan(&suite, &fixed.suite, None)?,
                config,
            })
        }
        Command::Timed(timed) => {
            let suite = load_suite(timed.suite.suite.as_deref())?;
            let config = timed_load_config(&suite, &timed)?;
            Ok(RunPlan::Load {
                suite: suite_plan(&suite, &timed.suite, None)?,
                config,
            })
        }
        Command::Single(single) => {
            let suite = load_suite(single.suite.suite.as_deref())?;
            Ok(RunPlan::Single(suite_plan(
                &suite,
                &single.suite,
                single.name.as_deref(),
            )?))
        }
        Command::Suggest(suggest) => {
            let suite = load_suite(suggest.suite.suite.as_deref())?;
            Ok(RunPlan::Suggest(suite_plan(
                &suite,
                &suggest.suite,
                Some(suggest.name.as_str()),
            )?))
        }
    }
}

fn suite_plan(suite: &SuiteFile, args: &SuiteArgs, request: Option<&str>) -> AppResult<SuitePlan> {
    let settings = client_settings(suite, args)?;
    Ok(SuitePlan {
        name: suite
            .name
            .clone()
            .unwrap_or_else(|| DEFAULT_RUN_NAME.to_owned()),
        specs: select_requests(suite, request)?,
        auth: auth_context(suite, args),
        identity_url: identity_url(suite, &settings)?,
        identity_required: suite.identity_required,
        settings,
    })
}
