use clap::Parser;

/// Single-session browser relay: serializes concurrent automation calls
/// against one browser engine session.
#[derive(Parser, Debug)]
#[command(name = "browserd")]
#[command(about = "Browser automation relay with FIFO request admission")]
#[command(version)]
pub struct Cli {
    /// Address to listen on
    #[arg(long, env = "BROWSER_HOST", default_value = "0.0.0.0")]
    pub host: String,

    /// Port to listen on
    #[arg(long, env = "BROWSER_PORT", default_value_t = 3456)]
    pub port: u16,

    /// Base URL of the automation engine this relay fronts
    #[arg(long, env = "BROWSER_ENGINE_URL", default_value = "http://127.0.0.1:9223")]
    pub engine_url: String,

    /// Start the engine session on boot if it is not already running
    #[arg(long, env = "BROWSER_AUTO_START")]
    pub auto_start: bool,

    /// Default bound on how long a request may wait for admission (ms)
    #[arg(long, env = "BROWSER_QUEUE_TIMEOUT_MS", default_value_t = 120_000)]
    pub queue_timeout_ms: u64,

    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}
