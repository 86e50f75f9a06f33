use clap::{Parser, Subcommand};
use std::fs;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use alon::{decode_to_json, test_vectors, AlonError, Bundle, CompileOptions, Manifest, Target};

#[derive(Parser)]
#[command(name = "alon")]
#[command(about = "Generate bounds-checked C (de)serializers from record schemas", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate `<namespace>.h` and `<namespace>.c` for every schema in a manifest
    Gen {
        /// Input manifest (`{"cases": [{"prefix", "definition", "examples"}]}`)
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// `host` (libc) or `solana` (solana_sdk.h, plus account adapters)
        #[arg(short, long, default_value = "host")]
        target: Target,

        /// Prefix of every generated symbol
        #[arg(short, long, default_value = "alon")]
        namespace: String,
    },

    /// Write golden test vectors for every example in a manifest
    Vectors {
        /// Input manifest
        #[arg(short, long)]
        input: PathBuf,

        /// Output `.json` file (if omitted, prints to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Print the layout plan of one schema as JSON
    Plan {
        /// Input manifest
        #[arg(short, long)]
        input: PathBuf,

        /// Name of the schema in the manifest
        #[arg(short, long)]
        prefix: String,
    },

    /// Decode a binary record to JSON (printed to stdout)
    Decode {
        /// Input manifest
        #[arg(short, long)]
        input: PathBuf,

        /// Name of the schema in the manifest
        #[arg(short, long)]
        prefix: String,

        /// File holding the encoded record
        #[arg(short, long)]
        data: PathBuf,
    },
}

fn main() -> Result<(), AlonError> {
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    match &cli.command {
        Commands::Gen { input, output, target, namespace } => {
            let manifest = Manifest::load(input)?;
            let options = CompileOptions { namespace: namespace.clone(), target: *target };
            let bundle = Bundle::build(&manifest, &options)?;
            let (header, source) = bundle.write_to(output)?;
            info!(cases = manifest.cases.len(), target = %options.target, "generated bundle");
            println!("Generated {} and {}", header.display(), source.display());
            Ok(())
        }

        Commands::Vectors { input, output } => {
            let manifest = Manifest::load(input)?;
            let vectors = serde_json::to_string_pretty(&test_vectors(&manifest)?)?;
            if let Some(out_path) = output {
                fs::write(out_path, &vectors)?;
                info!(path = %out_path.display(), "wrote test vectors");
                println!("Test vectors written to {}", out_path.display());
            } else {
                println!("{}", vectors);
            }
            Ok(())
        }

        Commands::Plan { input, prefix } => {
            let manifest = Manifest::load(input)?;
            let plan = manifest.case(prefix)?.plan()?;
            println!("{}", serde_json::to_string_pretty(&plan)?);
            Ok(())
        }

        Commands::Decode { input, prefix, data } => {
            let manifest = Manifest::load(input)?;
            let case = manifest.case(prefix)?;
            let bytes = fs::read(data)?;
            println!("{}", decode_to_json(&case.definition, &bytes)?);
            Ok(())
        }
    }
}
