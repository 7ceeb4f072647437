use anyhow::{bail, Context};
use std::path::PathBuf;
use ufo_sightings_lib::shared::{init_logger, AppConfig};
use ufo_sightings_lib::{run, ImportState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logger();

    let config = AppConfig::from_env().context("invalid configuration")?;
    let source = std::env::args_os().nth(1).map(PathBuf::from);

    let report = run(&config, source).await.context("import could not run")?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    match report.state {
        ImportState::Completed => Ok(()),
        state => bail!(
            "import {} {}: {}",
            report.run_id,
            state,
            report.error.as_deref().unwrap_or("no details")
        ),
    }
}
