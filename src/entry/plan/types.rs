use reqwest::Url;

use crate::auth::AuthContext;
use crate::http::{ClientSettings, RequestSpec};
use crate::load::LoadConfig;

/// Everything resolved from the suite file and the command line.
pub(in crate::entry) struct SuitePlan {
    pub(super) name: String,
    pub(super) settings: ClientSettings,
    pub(super) auth: AuthContext,
    pub(super) specs: Vec<RequestSpec>,
    pub(super) identity_url: Option<Url>,
    pub(super) identity_required: bool,
}

pub(in crate::entry) enum RunPlan {
    Load {
        suite: SuitePlan,
        config: LoadConfig,
    },
    Single(SuitePlan),
    Suggest(SuitePlan),
}
