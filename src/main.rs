#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use jarnorm::jar::{
    self, JarResult, ManifestStripper, Normalizer, PomPropertiesStripper, ReferenceTime,
};

#[derive(Debug, Parser)]
#[command(name = "jarnorm", version, about = "Reproducible JAR repacking")]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Rewrite a jar into its reproducible form.
    Normalize {
        /// Input jar.
        #[arg(long)]
        input: PathBuf,
        /// Output jar (parent directories are created).
        #[arg(long)]
        output: PathBuf,
        /// Timestamp stamped on every entry: unix seconds, RFC 3339 or YYYY-MM-DD.
        #[arg(long, env = "SOURCE_DATE_EPOCH")]
        timestamp: ReferenceTime,
        /// Extra manifest attribute to strip (repeatable). Case-insensitive.
        #[arg(long = "strip-attribute")]
        strip_attributes: Vec<String>,
    },

    /// List entries in a jar, in storage order.
    List {
        #[arg(long)]
        jar: PathBuf,
        /// Print kind, sizes, method, timestamps and content hashes too.
        #[arg(long, default_value_t = false)]
        verbose: bool,
    },

    /// Check that a jar is in normalized form.
    Verify {
        #[arg(long)]
        jar: PathBuf,
        /// Require every entry to carry this timestamp.
        #[arg(long)]
        timestamp: Option<ReferenceTime>,
    },
}

fn run(cmd: Command) -> JarResult<()> {
    match cmd {
        Command::Normalize {
            input,
            output,
            timestamp,
            strip_attributes,
        } => {
            let normalizer = Normalizer::new(
                ManifestStripper::with_extra(strip_attributes),
                PomPropertiesStripper,
            );
            let written = normalizer.normalize(&input, &timestamp, &output)?;
            println!("ok: {written} entries -> {}", output.display());
            Ok(())
        }
        Command::List { jar: path, verbose } => jar::list(&path, verbose),
        Command::Verify {
            jar: path,
            timestamp,
        } => {
            let n = jar::verify(&path, timestamp.as_ref())?;
            println!("ok: {n} entries");
            Ok(())
        }
    }
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if let Err(e) = run(cli.cmd) {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
