use {
    clap::Parser,
    log::LevelFilter,
    overlay::{OverlayConfig, Pipeline},
    std::{path::PathBuf, time::Duration},
    video::Sensor,
};

#[derive(Parser)]
#[command(name = "overlay-stream")]
#[command(about = "Stream camera frames to an inference backend and print its labels")]
#[command(version)]
struct Cli {
    /// JSON configuration file; flags override its values
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Backend endpoint, e.g. ws://127.0.0.1:8000/ws
    #[arg(short, long)]
    endpoint: Option<String>,

    /// Sensor to start with (front or back)
    #[arg(short, long)]
    sensor: Option<Sensor>,

    /// JPEG quality (1-100)
    #[arg(short, long)]
    quality: Option<u8>,

    /// Switch sensors every this many seconds
    #[arg(long)]
    switch_every: Option<u64>,

    /// Stop after this many seconds
    #[arg(short, long)]
    duration: Option<u64>,

    /// Capture from V4L2 devices instead of the test pattern
    #[cfg(feature = "v4l2")]
    #[arg(long)]
    v4l2: bool,

    /// Write logs to daily files in this directory instead of stdout
    #[arg(long)]
    log_dir: Option<PathBuf>,

    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn overlay_config(&self) -> anyhow::Result<OverlayConfig> {
        let mut config = match &self.config {
            Some(path) => OverlayConfig::from_json_file(path)?,
            None => OverlayConfig::default(),
        };
        if let Some(endpoint) = &self.endpoint {
            config = config.with_endpoint(endpoint.clone());
        }
        if let Some(sensor) = self.sensor {
            config = config.with_sensor(sensor);
        }
        if let Some(quality) = self.quality {
            config = config.with_quality(quality);
        }
        config.validate()?;
        Ok(config)
    }

    fn backend(&self, config: &OverlayConfig) -> video::CaptureBackend {
        #[cfg(feature = "v4l2")]
        {
            if self.v4l2 {
                return config.v4l2_backend();
            }
        }
        config.synthetic_backend()
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    match &cli.log_dir {
        Some(dir) => base::init_file_logger(dir.clone(), level)?,
        None => base::init_stdout_logger(level),
    }

    let config = cli.overlay_config()?;
    let backend = cli.backend(&config);
    log::info!(
        "overlay: {} {} at quality {}",
        config.endpoint(),
        config.size(),
        config.quality()
    );

    let mut pipeline = Pipeline::new(config, backend, |labels: &[String]| {
        println!("{}", labels.join(" "));
    })?;
    // capture control joins the camera thread, keep it off the async workers
    tokio::task::block_in_place(|| pipeline.start_default())?;

    let mut switch_timer = cli
        .switch_every
        .map(|secs| tokio::time::interval(Duration::from_secs(secs.max(1))));
    if let Some(timer) = switch_timer.as_mut() {
        // the first tick completes immediately
        timer.tick().await;
    }
    let deadline = cli.duration.map(Duration::from_secs);
    let stop = async {
        match deadline {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(stop);

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                log::info!("overlay: interrupted");
                break;
            }
            _ = &mut stop => break,
            _ = async {
                match switch_timer.as_mut() {
                    Some(timer) => { timer.tick().await; }
                    None => std::future::pending::<()>().await,
                }
            } => {
                match tokio::task::block_in_place(|| pipeline.switch_sensor()) {
                    Ok(sensor) => log::info!("overlay: now on {sensor}"),
                    Err(error) => {
                        log::error!("overlay: switch failed: {error}");
                        break;
                    }
                }
            }
        }
    }

    tokio::task::block_in_place(|| pipeline.stop_capture());
    log::info!("overlay: {:?}", pipeline.stats());
    Ok(())
}
