use std::io;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, ValueEnum};
use core_speed::{BenchConfig, Cipher, Driver, OutputFormat};
use ncr_device::{NcrDevice, DEFAULT_DEVICE};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ncr-speed", version, about = "Measure cipher throughput of an NCR crypto device")]
struct Cli {
    /// Device node to open
    #[arg(long, default_value = DEFAULT_DEVICE)]
    device: PathBuf,
    /// Seconds to sample each chunk size (env NCR_SPEED_SECS, default 5)
    #[arg(long)]
    seconds: Option<f64>,
    /// Smallest chunk size in bytes, a power of two (env NCR_SPEED_MIN_CHUNK)
    #[arg(long)]
    min_chunk: Option<usize>,
    /// Largest chunk size in bytes, a power of two (env NCR_SPEED_MAX_CHUNK)
    #[arg(long)]
    max_chunk: Option<usize>,
    /// Bits of the key generated for every chunk size (env NCR_SPEED_KEY_BITS)
    #[arg(long)]
    key_bits: Option<u32>,
    /// Cipher to test; repeat for several. Defaults to null, then aes-128-cbc
    #[arg(long = "cipher", value_enum)]
    ciphers: Vec<CipherArg>,
    /// Result line format on stdout
    #[arg(long, value_enum, default_value_t = FormatArg::Text)]
    format: FormatArg,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum CipherArg {
    Null,
    #[value(name = "aes-128-cbc")]
    Aes128Cbc,
}

impl From<CipherArg> for Cipher {
    fn from(c: CipherArg) -> Self {
        match c {
            CipherArg::Null => Cipher::Null,
            CipherArg::Aes128Cbc => Cipher::Aes128Cbc,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum FormatArg {
    Text,
    Json,
}

impl From<FormatArg> for OutputFormat {
    fn from(f: FormatArg) -> Self {
        match f {
            FormatArg::Text => OutputFormat::Text,
            FormatArg::Json => OutputFormat::Json,
        }
    }
}

impl Cli {
    fn config(&self) -> Result<BenchConfig> {
        let mut config = BenchConfig::from_env();
        if let Some(secs) = self.seconds {
            config.duration = Duration::try_from_secs_f64(secs)
                .map_err(|e| anyhow!("--seconds {secs}: {e}"))?;
        }
        if let Some(n) = self.min_chunk {
            config.min_chunk = n;
        }
        if let Some(n) = self.max_chunk {
            config.max_chunk = n;
        }
        if let Some(n) = self.key_bits {
            config.key_bits = n;
        }
        config.validate().context("invalid configuration")?;
        Ok(config)
    }

    fn ciphers(&self) -> Vec<Cipher> {
        if self.ciphers.is_empty() {
            Cipher::ALL.to_vec()
        } else {
            self.ciphers.iter().copied().map(Cipher::from).collect()
        }
    }
}

fn main() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .compact()
        .init();

    let cli = Cli::parse();
    let config = cli.config()?;
    let device = NcrDevice::open(&cli.device).context("opening cipher device")?;
    info!(
        device = %cli.device.display(),
        secs = config.duration.as_secs_f64(),
        "ncr-speed starting"
    );

    let mut driver = Driver::new(device, config).with_format(cli.format.into());
    let stdout = io::stdout();
    let mut out = stdout.lock();
    // A failed cipher only ends its own size loop; the next cipher still runs.
    for cipher in cli.ciphers() {
        eprintln!("\nTesting {}: ", cipher);
        if let Ok(results) = driver.run(cipher, &mut out) {
            info!(%cipher, sizes = results.len(), "cipher complete");
        }
    }
    Ok(())
}
