use {clap::Parser, com::WsServer, log::LevelFilter};

/// Stand-in for the inference backend: accepts JPEG frames and answers with
/// made-up labels in the `name_variant` form.
#[derive(Parser)]
#[command(name = "label-backend")]
#[command(version)]
struct Cli {
    /// Address to listen on
    #[arg(short, long, default_value = "127.0.0.1:8000")]
    addr: String,

    /// Reply after every this many frames
    #[arg(short, long, default_value = "30")]
    every: u64,

    /// Longest label list to send back
    #[arg(short, long, default_value = "5")]
    max_labels: usize,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    base::init_stdout_logger(LevelFilter::Info);

    let mut server = WsServer::bind(&cli.addr).await?;
    log::info!("label backend: listening on {}", server.endpoint());

    let every = cli.every.max(1);
    let mut frames: u64 = 0;
    let mut labels: Vec<String> = Vec::new();

    loop {
        let frame = server.recv().await?;
        frames += 1;

        match image::decode_jpeg(&frame.data) {
            Ok(decoded) => {
                let [r, g, b] = decoded.mean();
                log::debug!(
                    "label backend: frame {frames} from {}: {} mean ({r:.0}, {g:.0}, {b:.0})",
                    frame.addr,
                    decoded.size
                );
            }
            Err(error) => {
                log::warn!("label backend: undecodable frame from {}: {error}", frame.addr);
                continue;
            }
        }

        if frames % every == 0 {
            labels.push(format!("frame_{}", frames / every));
            if labels.len() > cli.max_labels {
                labels.remove(0);
            }
            server.send_labels(&labels).await;
            log::info!("label backend: sent {labels:?}");
        }
    }
}
