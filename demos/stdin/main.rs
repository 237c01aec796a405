//  MAIN.rs
//    by Lut99
//
//  Created:
//    11 Nov 2024, 12:20:52
//  Last edited:
//    16 Oct 2026, 15:12:37
//  Auto updated?
//    Yes
//
//  Description:
//!   Shows a verifying node that reads messages as JSON lines from stdin
//!   and writes the routed results to stdout.
//

use std::path::PathBuf;
use std::time::Duration;

use bearer_verify::auth::jwk::status::LogSink;
use bearer_verify::auth::jwk::{VerifyConfig, VerifyNode, Wires};
use bearer_verify::http::reqwest::ReqwestFetcher;
use bearer_verify::spec::Message;
use bearer_verify::spec::outcome::{FAILURE_OUTPUT, SUCCESS_OUTPUT};
use clap::Parser;
use error_trace::trace;
use serde_json::json;
use tokio::io::{AsyncBufReadExt as _, BufReader};
use tokio::signal::unix::{SignalKind, signal};
use tokio::sync::mpsc;
use tracing::{Level, debug, error, info, warn};


/***** ARGUMENTS *****/
/// Defines the arguments for this binary.
#[derive(Debug, Parser)]
struct Arguments {
    /// Whether to enable INFO- and DEBUG-level logging.
    #[clap(long)]
    debug: bool,
    /// Whether to enable TRACE-level logging. Implies '--debug'.
    #[clap(long)]
    trace: bool,

    /// The path to a JSON config file with an `infoUrl` and (optionally) an `audience`.
    #[clap(short, long, conflicts_with_all = ["info_url", "audience"])]
    config:   Option<PathBuf>,
    /// The URL of the JWKS, or of an OIDC discovery document (`.well-known/openid-configuration`).
    #[clap(short, long, required_unless_present = "config")]
    info_url: Option<String>,
    /// The audience tokens must be issued for.
    #[clap(short, long)]
    audience: Option<String>,
    /// The timeout (in seconds) of every HTTP request.
    #[clap(short, long, default_value = "10")]
    timeout:  u64,
}





/***** HELPERS *****/
/// Writes every message from the given output to stdout.
async fn print_output(output: usize, mut rx: mpsc::Receiver<Message>) {
    while let Some(msg) = rx.recv().await {
        println!("{}", json!({ "output": output, "msg": msg }));
    }
}





/***** ENTRYPOINT *****/
#[tokio::main]
async fn main() {
    // Parse the arguments
    let args = Arguments::parse();

    // Setup the logger
    tracing_subscriber::fmt()
        .with_max_level(if args.trace {
            Level::TRACE
        } else if args.debug {
            Level::DEBUG
        } else {
            Level::WARN
        })
        .with_writer(std::io::stderr)
        .init();
    info!("{} - v{}", env!("CARGO_CRATE_NAME"), env!("CARGO_PKG_VERSION"));

    // Setup the config
    let config: VerifyConfig = match (args.config, args.info_url) {
        (Some(path), _) => match VerifyConfig::from_path(&path) {
            Ok(config) => config,
            Err(err) => {
                error!("{}", trace!(("Failed to load config"), err));
                std::process::exit(1);
            },
        },
        (None, Some(info_url)) => VerifyConfig::new(info_url, args.audience),
        (None, None) => {
            error!("Either '--config' or '--info-url' must be given");
            std::process::exit(1);
        },
    };

    // Setup the fetcher
    let fetcher = match ReqwestFetcher::with_timeout(Duration::from_secs(args.timeout)) {
        Ok(fetcher) => fetcher,
        Err(err) => {
            error!("{}", trace!(("Failed to create HTTP client"), err));
            std::process::exit(1);
        },
    };

    // Start the node and wait until it knows where its keys are
    let mut node = VerifyNode::start(&config, fetcher, LogSink);
    if !node.initialized().await {
        warn!("Failed to resolve key set; every message will be dropped");
    }

    // Connect the wires
    let (input, inputs) = mpsc::channel(64);
    let (wires, success, failure) = Wires::new(64);
    let printers = [tokio::spawn(print_output(SUCCESS_OUTPUT, success)), tokio::spawn(print_output(FAILURE_OUTPUT, failure))];
    let reader = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        loop {
            let line: String = match lines.next_line().await {
                Ok(Some(line)) => line,
                Ok(None) => break,
                Err(err) => {
                    error!("{}", trace!(("Failed to read from stdin"), err));
                    break;
                },
            };
            if line.trim().is_empty() {
                continue;
            }
            let msg: Message = match serde_json::from_str(&line) {
                Ok(msg) => msg,
                Err(err) => {
                    warn!("{}", trace!(("Skipping line that is not a JSON object"), err));
                    continue;
                },
            };
            if input.send(msg).await.is_err() {
                break;
            }
        }
    });

    // OK, run the node
    tokio::select! {
        _ = node.run(inputs, wires) => {
            debug!("Input closed");
            for printer in printers {
                if let Err(err) = printer.await {
                    warn!("{}", trace!(("Failed to print output"), err));
                }
            }
            info!("Done");
        },

        _ = async move {
            match signal(SignalKind::interrupt()) {
                Ok(mut sign) => sign.recv().await,
                Err(err) => {
                    warn!("{}", trace!(("Failed to register SIGINT signal handler"), err));
                    warn!("Graceful shutdown by Ctrl+C disabled");
                    None
                },
            }
        } => {
            debug!("Received SIGINT");
        },
        _ = async move {
            match signal(SignalKind::terminate()) {
                Ok(mut sign) => sign.recv().await,
                Err(err) => {
                    warn!("{}", trace!(("Failed to register SIGTERM signal handler"), err));
                    warn!("Graceful shutdown by Docker disabled");
                    None
                },
            }
        } => {
            debug!("Received SIGTERM");
        },
    }
    reader.abort();
}
