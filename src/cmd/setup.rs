//! `jt setup`.

use anyhow::Result;
use std::path::Path;

use jt::settings::Settings;
use jt::setup::run_setup;

pub async fn cmd_setup(settings: &Settings, current_dir: &Path) -> Result<()> {
    run_setup(settings, current_dir).await
}
