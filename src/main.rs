use color_eyre::eyre::Result;

mod client;
mod config;
mod logging;
mod ui;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let Some(app_config) =
        config::parse_cli_args(std::env::args().skip(1), |key| std::env::var(key).ok())?
    else {
        println!("{}", config::USAGE);
        return Ok(());
    };
    logging::init_tracing(&app_config.log_dir)?;
    tracing::info!("starting coinflip-wallet");
    client::run_app(app_config).await
}
