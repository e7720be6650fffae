use clap::Parser;

#[derive(Debug, Parser)]
#[command(author, version, about = "Prometheus exporter for Slurm node CPU, memory and GPU allocation")]
pub struct Args {
    #[arg(long, env = "SLURM_EXPORTER_ADDR", default_value = "0.0.0.0:8080")]
    pub listen_addr: String,

    /// Path or name of the `sinfo` binary.
    #[arg(long, env = "SLURM_EXPORTER_SINFO", default_value = "sinfo")]
    pub sinfo_bin: String,

    /// Exit the process when `sinfo` fails instead of answering the scrape with 503.
    #[arg(long, default_value_t = false)]
    pub exit_on_source_failure: bool,

    /// OTLP endpoint for exporting traces (e.g. "http://127.0.0.1:4318").
    #[arg(long, env = "OTLP_ENDPOINT")]
    pub otlp_endpoint: Option<String>,

    /// Bearer token for the OTLP endpoint.
    #[arg(long, env = "OTLP_TOKEN")]
    pub otlp_token: Option<String>,
}
