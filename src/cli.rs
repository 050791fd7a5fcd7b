use clap::Parser;

#[derive(Debug, Clone, Parser)]
#[command(
    name = "kmon",
    version,
    about = "Terminal monitoring dashboard for cluster nodes, pods, events and Telegram alerts."
)]
pub struct CliArgs {
    /// Backend origin serving the /api endpoints
    #[arg(long, env = "BACKEND_BASE_URL")]
    pub backend_url: Option<String>,

    /// Initial dashboard path, for example /ru/events
    #[arg(long, default_value = "/")]
    pub route: String,

    /// Select this namespace once the namespace list has loaded
    #[arg(short, long)]
    pub namespace: Option<String>,

    /// Config file (defaults to KMON_CONFIG, ./kmon.yaml, ~/.config/kmon/config.yaml)
    #[arg(long)]
    pub config: Option<std::path::PathBuf>,

    /// tracing filter (for example: info,debug,trace)
    #[arg(long, default_value = "info")]
    pub log_filter: String,

    /// Write logs to this file instead of discarding them
    #[arg(long)]
    pub log_file: Option<std::path::PathBuf>,
}
