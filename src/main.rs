use anyhow::Context;
use phantasia::app::StartupConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    phantasia::logging::init();
    let startup = StartupConfig::from_args()?;
    let path = phantasia::run(startup)
        .await
        .context("phantasia edit failed")?;
    println!("{}", path.display());
    Ok(())
}
