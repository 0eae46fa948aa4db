use {
    anyhow::Context,
    base::log,
    clap::Parser,
    measure::{Cli, Screen, TerminalPresenter, wait_until_ready},
    session::{ChannelConnector, ConnectionStatus, Controller, VideoOpener},
    std::{future::pending, time::Duration},
    tokio::{sync::watch, time::sleep},
};

// camera open plus server handshake
const STARTUP_TIMEOUT: Duration = Duration::from_secs(20);

async fn run_for(duration: Option<Duration>) {
    match duration {
        Some(duration) => sleep(duration).await,
        None => pending().await,
    }
}

#[cfg(feature = "window")]
async fn show(screens: watch::Receiver<Screen>, cli: &Cli) -> anyhow::Result<()> {
    measure::window::run(screens, cli.size()).await
}

#[cfg(not(feature = "window"))]
async fn show(_screens: watch::Receiver<Screen>, _cli: &Cli) -> anyhow::Result<()> {
    pending().await
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match &cli.log_dir {
        Some(dir) => base::init_file_logger(dir)
            .with_context(|| format!("unable to log to {}", dir.display()))?,
        None => base::init_stdout_logger(),
    }

    let video_config = cli.video_config()?;
    log::info!("measure: streaming to {} every {} ms", cli.server, cli.interval_ms);

    let (presenter, mut screens) = TerminalPresenter::new(std::io::stdout());
    let (handle, task) = Controller::spawn(
        cli.controller_config(),
        VideoOpener::new(video_config),
        ChannelConnector::new(cli.channel_config()),
        presenter,
    );

    handle.open()?;
    if cli.probe {
        handle.probe()?;
    }
    handle.start_camera()?;

    let ready = match wait_until_ready(&mut screens, STARTUP_TIMEOUT).await {
        Some(ready) => ready,
        None => {
            log::error!("camera or server not ready after {:?}", STARTUP_TIMEOUT);
            false
        }
    };

    let result = if ready {
        handle.toggle()?;
        let mut disconnected = screens.clone();
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                log::info!("interrupted");
                Ok(())
            }
            _ = run_for(cli.duration()) => Ok(()),
            _ = disconnected.wait_for(|screen| screen.view.status == ConnectionStatus::Disconnected) => {
                Err(anyhow::anyhow!("server went away"))
            }
            result = show(screens.clone(), &cli) => result,
        }
    } else {
        let notice = screens.borrow().notice.clone();
        Err(anyhow::anyhow!(
            notice.unwrap_or_else(|| "unable to start analysis".to_string())
        ))
    };

    handle.close()?;
    handle.shutdown()?;
    task.await.context("controller task failed")?;
    result
}
