use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use shelfscan_camera::replay::ReplayCamera;
use shelfscan_camera::{CameraDevice, Frame};
use shelfscan_decoder::{DecodeOptions, Decoder, FrameOutcome, QrDecoder, decode_frame};
use shelfscan_lookup::{HttpLookupClient, LookupClient};
use shelfscan_scanner::{
    ChannelNavigator, FrameClock, ImmediateClock, Navigator, ScanController, ScanState,
};

mod config;

use config::FileConfig;

#[derive(Parser, Debug)]
#[command(name = "shelfscan")]
#[command(about = "Scan inventory QR labels and resolve them to items")]
#[command(version)]
struct Cli {
    /// Log filter, e.g. `debug` or `shelfscan_scanner=trace` (overrides RUST_LOG)
    #[arg(long, global = true, value_name = "FILTER")]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run one scan session over recorded frames against the inventory API
    Scan(ScanArgs),

    /// Decode still images and print their payloads
    Decode(DecodeArgs),
}

#[derive(Args, Debug)]
struct ScanArgs {
    /// A directory of frames, or individual frame files in order
    #[arg(long, required = true, num_args = 1..)]
    frames: Vec<PathBuf>,

    /// Inventory API root
    #[arg(long, env = "SHELFSCAN_API")]
    api: Option<String>,

    /// Bearer token for the inventory API
    #[arg(long, env = "SHELFSCAN_TOKEN", hide_env_values = true)]
    token: Option<String>,

    /// Path to TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Also accept light-on-dark symbols
    #[arg(long)]
    tolerate_polarity: bool,

    /// Ask before looking the detected code up
    #[arg(long)]
    manual_lookup: bool,
}

#[derive(Args, Debug)]
struct DecodeArgs {
    /// Image files
    #[arg(required = true)]
    images: Vec<PathBuf>,

    /// Also accept light-on-dark symbols
    #[arg(long)]
    tolerate_polarity: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.log_level.as_deref())?;

    match cli.command {
        Command::Scan(args) => scan(args).await,
        Command::Decode(args) => decode(&args),
    }
}

fn init_logging(level: Option<&str>) -> Result<()> {
    let filter = match level {
        Some(level) => EnvFilter::try_new(level).context("Invalid --log-level")?,
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

async fn scan(args: ScanArgs) -> Result<ExitCode> {
    let mut config = match &args.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };
    if let Some(api) = args.api {
        config.api.base_url = api;
    }
    if let Some(token) = args.token {
        config.api.auth_token = Some(token);
    }
    if args.tolerate_polarity {
        config.scanner.tolerate_polarity = true;
    }
    if args.manual_lookup {
        config.scanner.auto_lookup = false;
    }

    let camera = replay_camera(&args.frames)?;
    info!(frames = camera.paths().len(), api = %config.api.base_url, "Starting scan");

    let lookup = HttpLookupClient::new(config.lookup_config())?;
    let (navigator, mut resolved) = ChannelNavigator::new();
    let mut controller =
        ScanController::new(camera, QrDecoder::new(), lookup, navigator, config.scanner_config())?
            .with_clock(ImmediateClock);

    controller.start()?;
    controller.drive().await;

    let declined = confirm_lookups(&mut controller, |payload| async move {
        confirm(&format!("Detected {payload}. Look it up? [Y/n] ")).await
    })
    .await?;
    if let Some(payload) = declined {
        println!("{payload}");
        controller.shutdown().await;
        return Ok(ExitCode::SUCCESS);
    }

    let session = controller.session().clone();
    controller.shutdown().await;

    match (session.state, session.resolved) {
        (ScanState::Done, Some(item)) => {
            debug!(navigated = ?resolved.try_recv().ok(), "Session resolved");
            println!("{}\t{}", item.id, item.name);
            Ok(ExitCode::SUCCESS)
        }
        (state, _) => {
            match session.last_error {
                Some(failure) => eprintln!("{}", failure.user_message()),
                None => eprintln!("Scan ended in state {state} without a result"),
            }
            if let Some(code) = session.last_unmatched {
                eprintln!("No item found for QR code: {code}");
            }
            Ok(ExitCode::FAILURE)
        }
    }
}

/// Ask before every lookup while the session keeps stopping at a detected
/// code (an unknown code sends it back to scanning).
///
/// Returns the payload the user chose not to look up.
async fn confirm_lookups<C, D, L, N, K, F, Fut>(
    controller: &mut ScanController<C, D, L, N, K>,
    mut ask: F,
) -> Result<Option<String>>
where
    C: CameraDevice + 'static,
    C::Stream: 'static,
    D: Decoder,
    L: LookupClient,
    N: Navigator,
    K: FrameClock,
    F: FnMut(String) -> Fut,
    Fut: Future<Output = Result<bool>>,
{
    while controller.state() == ScanState::Detected {
        let payload = controller.session().decoded_payload.clone().unwrap_or_default();
        if !ask(payload.clone()).await? {
            return Ok(Some(payload));
        }
        controller.request_lookup()?;
        controller.drive().await;
    }
    Ok(None)
}

fn replay_camera(frames: &[PathBuf]) -> Result<ReplayCamera> {
    let camera = match frames {
        [dir] if dir.is_dir() => ReplayCamera::from_dir(dir),
        files => ReplayCamera::from_files(files.iter().cloned()),
    };
    camera.context("No frames to replay")
}

async fn confirm(prompt: &str) -> Result<bool> {
    eprint!("{prompt}");
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await
        .context("Failed to read answer")?;

    Ok(!matches!(line.trim().to_ascii_lowercase().as_str(), "n" | "no"))
}

fn decode(args: &DecodeArgs) -> Result<ExitCode> {
    let decoder = QrDecoder::new();
    let options = DecodeOptions::default().with_tolerate_polarity(args.tolerate_polarity);

    let mut decoded = 0;
    for path in &args.images {
        match decode_image(&decoder, path, &options)? {
            FrameOutcome::Decoded(payload) => {
                decoded += 1;
                println!("{}\t{payload}", path.display());
            }
            outcome => {
                debug!(path = %path.display(), ?outcome, "No code decoded");
                println!("{}\t(no code)", path.display());
            }
        }
    }

    Ok(if decoded > 0 {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn decode_image(decoder: &QrDecoder, path: &Path, options: &DecodeOptions) -> Result<FrameOutcome> {
    let image = image::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    Ok(decode_frame(decoder, &Frame::from_image(&image), options))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use rstest::rstest;
    use shelfscan_camera::PixelFormat;
    use shelfscan_camera::mock::MockCamera;
    use shelfscan_core::{Item, ItemId};
    use shelfscan_decoder::mock::ScriptedDecoder;
    use shelfscan_lookup::LookupResult;
    use shelfscan_lookup::mock::MockLookup;
    use shelfscan_scanner::{NoopNavigator, ScannerConfig};

    fn manual_controller() -> (
        ScanController<MockCamera, ScriptedDecoder, MockLookup, NoopNavigator, ImmediateClock>,
        shelfscan_decoder::mock::ScriptedDecoderHandle,
        shelfscan_lookup::mock::MockLookupHandle,
    ) {
        let (camera, camera_handle) = MockCamera::new();
        let (decoder, script) = ScriptedDecoder::new();
        let (lookup, lookup_handle) = MockLookup::new();
        camera_handle.set_scene(Frame::new(vec![0x80; 64], 8, 8, PixelFormat::Luma8).unwrap());

        let config = ScannerConfig::default().auto_lookup(false);
        let controller = ScanController::new(camera, decoder, lookup, NoopNavigator, config)
            .unwrap()
            .with_clock(ImmediateClock);
        (controller, script, lookup_handle)
    }

    fn screws() -> Item {
        Item {
            id: ItemId::new(42),
            name: "M3 screws".to_string(),
            description: None,
            category: None,
            location_id: None,
            location: None,
            tags: Vec::new(),
        }
    }

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[rstest]
    #[case::files(&["--frames", "a.png", "b.png"], &["a.png", "b.png"], false, false)]
    #[case::dir_manual(&["--frames", "captures", "--manual-lookup"], &["captures"], true, false)]
    #[case::polarity(&["--tolerate-polarity", "--frames", "a.png"], &["a.png"], false, true)]
    fn test_parse_scan(
        #[case] args: &[&str],
        #[case] frames: &[&str],
        #[case] manual_lookup: bool,
        #[case] tolerate_polarity: bool,
    ) {
        let base = ["shelfscan", "--log-level", "debug", "scan", "--api", "http://inventory.local/api"];
        let argv = base.into_iter().chain(args.iter().copied());
        let cli = Cli::try_parse_from(argv).unwrap();

        assert_eq!(cli.log_level.as_deref(), Some("debug"));
        let Command::Scan(args) = cli.command else {
            panic!("expected scan");
        };
        let frames: Vec<PathBuf> = frames.iter().map(PathBuf::from).collect();
        assert_eq!(args.frames, frames);
        assert_eq!(args.api.as_deref(), Some("http://inventory.local/api"));
        assert_eq!(args.manual_lookup, manual_lookup);
        assert_eq!(args.tolerate_polarity, tolerate_polarity);
    }

    #[tokio::test]
    async fn test_confirm_asks_again_after_unknown_code() {
        let (mut controller, script, lookup) = manual_controller();
        script.push(Some("ITM-404"));
        script.push(Some("ITM-42"));
        lookup.push(LookupResult::NotFound);
        lookup.push(LookupResult::Found(screws()));

        controller.start().unwrap();
        controller.drive().await;

        let mut asked = Vec::new();
        let declined = confirm_lookups(&mut controller, |payload| {
            asked.push(payload);
            async { Ok(true) }
        })
        .await
        .unwrap();

        assert_eq!(declined, None);
        assert_eq!(asked, vec!["ITM-404", "ITM-42"]);
        assert_eq!(controller.state(), ScanState::Done);
        assert_eq!(controller.session().resolved.as_ref().map(|i| i.id), Some(ItemId::new(42)));
        controller.shutdown().await;
    }

    #[tokio::test]
    async fn test_confirm_declined_keeps_payload() {
        let (mut controller, script, lookup) = manual_controller();
        script.push(Some("ITM-7"));

        controller.start().unwrap();
        controller.drive().await;

        let declined = confirm_lookups(&mut controller, |_| async { Ok(false) }).await.unwrap();

        assert_eq!(declined.as_deref(), Some("ITM-7"));
        assert_eq!(controller.state(), ScanState::Detected);
        assert_eq!(lookup.request_count(), 0);
        controller.shutdown().await;
    }

    #[test]
    fn test_scan_requires_frames() {
        assert!(Cli::try_parse_from(["shelfscan", "scan"]).is_err());
    }

    #[test]
    fn test_replay_camera_from_dir_and_files() {
        let dir = tempfile::tempdir().unwrap();
        let first = dir.path().join("0001.png");
        let second = dir.path().join("0002.png");
        for path in [&first, &second] {
            image::GrayImage::new(8, 8).save(path).unwrap();
        }

        let camera = replay_camera(&[dir.path().to_path_buf()]).unwrap();
        assert_eq!(camera.paths(), [first.clone(), second.clone()]);

        let camera = replay_camera(&[second.clone(), first.clone()]).unwrap();
        assert_eq!(camera.paths(), [second, first]);

        assert!(replay_camera(&[dir.path().join("missing.png")]).is_err());
    }

    #[test]
    fn test_decode_blank_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.png");
        image::GrayImage::from_pixel(32, 32, image::Luma([255])).save(&path).unwrap();

        let outcome = decode_image(&QrDecoder::new(), &path, &DecodeOptions::default()).unwrap();
        assert_eq!(outcome, FrameOutcome::NoSymbol);
    }
}
