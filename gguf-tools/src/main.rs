mod compare;
mod inspect;
mod show;
mod split;

#[macro_use]
extern crate clap;
use clap::Parser;
use std::process::exit;

fn main() {
    env_logger::init();

    use Commands::*;
    let result = match Cli::parse().command {
        Show(args) => args.show(),
        InspectTensor(args) => args.inspect(),
        Compare(args) => args.compare(),
        SplitMixtral(args) => args.split(),
    };
    if let Err(e) = result {
        eprintln!("{e}");
        exit(1);
    }
}

type Failure = Box<dyn std::error::Error>;

#[derive(Parser)]
#[clap(name = "gguf-tools")]
#[clap(version, about, long_about = None)]
struct Cli {
    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the header, metadata and tensors of a GGUF file
    Show(show::ShowArgs),
    /// Dequantize a tensor and print its weights
    InspectTensor(inspect::InspectTensorArgs),
    /// Compare the tensors two GGUF files have in common
    Compare(compare::CompareArgs),
    /// Extract a single-expert model from a Mixtral GGUF file
    SplitMixtral(split::SplitMixtralArgs),
}
