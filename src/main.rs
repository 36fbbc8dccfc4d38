//! review-sentiment - explore review CSVs and score them with pretrained sentiment models.

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use review_sentiment::analysis::{analyze_file, AnalysisRequest};
use review_sentiment::core::config::DEFAULT_ENCODING;
use review_sentiment::demo::{self, DemoState};
use review_sentiment::eda::{export_word_counts, EdaReport, GroupTable};
use review_sentiment::models::SentimentModel;
use review_sentiment::pipelines::utils::DeviceRequest;
use review_sentiment::reviews::read_reviews;
use review_sentiment::{
    CsvFormat, InferenceConfig, ModelChoice, ReviewError, SentimentAnalysisPipelineBuilder,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "review-sentiment")]
#[command(about = "Exploratory analysis and sentiment scoring for CSV files of reviews")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Clone)]
struct CsvArgs {
    /// Field delimiter of the input file (a single character, or "tab")
    #[arg(long, default_value = ";", env = "REVIEW_SENTIMENT_DELIMITER", value_parser = parse_delimiter)]
    delimiter: u8,

    /// Text encoding of the input file
    #[arg(long, default_value = DEFAULT_ENCODING, env = "REVIEW_SENTIMENT_ENCODING")]
    encoding: String,
}

impl CsvArgs {
    fn format(&self) -> CsvFormat {
        CsvFormat::default()
            .with_delimiter(self.delimiter)
            .with_encoding(self.encoding.clone())
    }
}

#[derive(Args, Clone)]
struct DeviceArgs {
    /// Run on the CPU even if CUDA is available
    #[arg(long, env = "REVIEW_SENTIMENT_CPU")]
    cpu: bool,

    /// Run on the given CUDA device
    #[arg(long, conflicts_with = "cpu")]
    cuda: Option<usize>,
}

impl DeviceArgs {
    fn request(&self) -> DeviceRequest {
        match (self.cpu, self.cuda) {
            (true, _) => DeviceRequest::Cpu,
            (false, Some(index)) => DeviceRequest::Cuda(index),
            (false, None) => DeviceRequest::Default,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Score every review of a CSV file and save the results
    Analyze {
        /// Input CSV file containing a 'review' column
        input: PathBuf,

        /// Model to use: 'distilbert' or 'roberta'
        #[arg(long, default_value = "distilbert", env = "REVIEW_SENTIMENT_MODEL")]
        model: ModelChoice,

        /// Directory for the results (must exist); defaults to the input's folder
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Reviews per forward pass
        #[arg(long, env = "REVIEW_SENTIMENT_BATCH_SIZE")]
        batch_size: Option<usize>,

        /// Hide the progress bar
        #[arg(long)]
        no_progress: bool,

        #[command(flatten)]
        csv: CsvArgs,

        #[command(flatten)]
        device: DeviceArgs,
    },

    /// Print word-count statistics and optional group aggregates
    Eda {
        /// Input CSV file containing a 'review' column
        input: PathBuf,

        /// Column whose values group the word counts
        #[arg(long)]
        group_by: Option<String>,

        /// Also write the table with a 'word count' column to this directory
        #[arg(long)]
        output_dir: Option<PathBuf>,

        #[command(flatten)]
        csv: CsvArgs,
    },

    /// Classify a single review
    Classify {
        /// Review text
        text: String,

        #[arg(long, default_value = "distilbert", env = "REVIEW_SENTIMENT_MODEL")]
        model: ModelChoice,

        #[command(flatten)]
        device: DeviceArgs,
    },

    /// Start the interactive web demo
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:7860", env = "REVIEW_SENTIMENT_ADDR")]
        addr: SocketAddr,

        #[arg(long, env = "REVIEW_SENTIMENT_BATCH_SIZE")]
        batch_size: Option<usize>,

        #[command(flatten)]
        csv: CsvArgs,

        #[command(flatten)]
        device: DeviceArgs,
    },
}

fn parse_delimiter(value: &str) -> Result<u8, String> {
    match value {
        "tab" | "\\t" | "\t" => Ok(b'\t'),
        _ => match value.as_bytes() {
            [byte] if byte.is_ascii() => Ok(*byte),
            _ => Err(format!("delimiter must be a single ASCII character, got '{value}'")),
        },
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Analyze {
            input,
            model,
            output_dir,
            batch_size,
            no_progress,
            csv,
            device,
        } => {
            let request = AnalysisRequest {
                input,
                model,
                output_dir,
                format: csv.format(),
                inference: InferenceConfig {
                    batch_size,
                    device: device.request(),
                },
                show_progress: !no_progress,
            };
            let summary = analyze_file(&request).await?;

            println!(
                "Sentiment analysis complete. Saved to: {}",
                summary.output_path.display()
            );
            print!("{}", GroupTable(&summary.labels));
        }

        Commands::Eda {
            input,
            group_by,
            output_dir,
            csv,
        } => {
            if !input.is_file() {
                return Err(ReviewError::InputNotFound(input).into());
            }
            let table = read_reviews(&input, &csv.format())?;
            let report = EdaReport::build(&table, group_by.as_deref())?;
            print!("{report}");

            if let Some(dir) = output_dir {
                let path = export_word_counts(&table, &input, &dir)?;
                println!("\nWord counts saved to: {}", path.display());
            }
        }

        Commands::Classify {
            text,
            model,
            device,
        } => {
            if text.trim().is_empty() {
                anyhow::bail!("review text must not be empty");
            }
            let pipeline = SentimentAnalysisPipelineBuilder::<SentimentModel>::new(model)
                .device_request(device.request())
                .build()
                .await?;
            let result = pipeline.predict(&text)?;
            println!("model: {}", model.display_name());
            println!("label: {}", result.label);
            println!("score: {:.4}", result.score);
        }

        Commands::Serve {
            addr,
            batch_size,
            csv,
            device,
        } => {
            let state = DemoState {
                format: csv.format(),
                inference: InferenceConfig {
                    batch_size,
                    device: device.request(),
                },
            };
            demo::serve(addr, state).await?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_is_well_formed() {
        Cli::command().debug_assert();
    }

    #[test]
    fn analyze_defaults() {
        let cli = Cli::try_parse_from(["review-sentiment", "analyze", "reviews.csv"]).unwrap();
        match cli.command {
            Commands::Analyze { model, csv, output_dir, .. } => {
                assert_eq!(model, ModelChoice::DistilBert);
                assert_eq!(csv.delimiter, b';');
                assert!(output_dir.is_none());
            }
            _ => panic!("expected analyze"),
        }
    }

    #[test]
    fn unknown_model_is_rejected() {
        assert!(Cli::try_parse_from(["review-sentiment", "analyze", "r.csv", "--model", "bert"])
            .is_err());
    }

    #[test]
    fn delimiters() {
        assert_eq!(parse_delimiter(","), Ok(b','));
        assert_eq!(parse_delimiter("tab"), Ok(b'\t'));
        assert!(parse_delimiter(";;").is_err());
    }
}
