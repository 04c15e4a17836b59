//! # Fieldpress CLI
//!
//! Command-line interface for batch rendering and the editor backend.
//!
//! ## Usage
//!
//! ```bash
//! # Render one PNG per CSV row into generated_images_YYYY-MM-DD.zip
//! fieldpress export --template badge.png --data people.csv --layout badge.json
//!
//! # Name files after a column, without row numbers
//! fieldpress export --template badge.png --data people.csv --layout badge.json \
//!     --name-column name --no-sequence
//!
//! # Preview row 3 with editor markers
//! fieldpress preview --template badge.png --layout badge.json --data people.csv \
//!     --row 3 --png preview.png --markers
//!
//! # List fonts and start the HTTP editor backend
//! fieldpress fonts --config fieldpress.json
//! fieldpress serve --listen 0.0.0.0:8080
//! ```

use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use fieldpress::{
    FieldpressError,
    config::Config,
    data::Dataset,
    export::{ExportJob, ExportOptions, ZipArchiveWriter, encode_png, run_export},
    layout::Layout,
    naming::FileNamingPolicy,
    render::{self, QrCodeGenerator},
    server::{self, AppState, ServerConfig},
    template::Template,
};

/// Fieldpress - place text and QR fields on a template and render one image per row
#[derive(Parser, Debug)]
#[command(name = "fieldpress")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// JSON configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render every data row and write a zip archive
    Export {
        /// Template image
        #[arg(long)]
        template: PathBuf,

        /// CSV file with a header line
        #[arg(long)]
        data: PathBuf,

        /// Layout JSON (fields, bindings, naming)
        #[arg(long)]
        layout: PathBuf,

        /// Directory the archive is written to
        #[arg(long, default_value = ".")]
        out: PathBuf,

        /// Take file names from this column (overrides the layout)
        #[arg(long)]
        name_column: Option<String>,

        /// Do not prefix column-derived names with the row number
        #[arg(long)]
        no_sequence: bool,
    },

    /// Render a single row (or the demo values) to a PNG
    Preview {
        /// Template image
        #[arg(long)]
        template: PathBuf,

        /// Layout JSON (fields, bindings, naming)
        #[arg(long)]
        layout: PathBuf,

        /// CSV file; omit to render demo values
        #[arg(long)]
        data: Option<PathBuf>,

        /// 1-based row number
        #[arg(long, default_value = "1")]
        row: usize,

        /// Output PNG path
        #[arg(long, value_name = "FILE")]
        png: PathBuf,

        /// Draw editor markers for empty fields
        #[arg(long)]
        markers: bool,
    },

    /// List the font catalog
    Fonts,

    /// Start the HTTP editor backend
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8080")]
        listen: String,
    },
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), FieldpressError> {
    let cli = Cli::parse();
    let config = Config::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Commands::Export {
            template,
            data,
            layout,
            out,
            name_column,
            no_sequence,
        } => {
            let (fields, bindings, mut naming) = Layout::load(&layout)?.into_parts()?;
            if let Some(column) = name_column {
                naming = FileNamingPolicy::from_column(column, !no_sequence);
            } else if no_sequence {
                naming.include_sequence_number = false;
            }

            let job = ExportJob::new(
                Arc::new(Template::open(&template)?),
                Arc::new(Dataset::from_csv_path(&data)?),
                fields,
                bindings,
                naming,
                Arc::new(config.font_book()?),
            )?;

            let cancel = CancellationToken::new();
            let on_ctrl_c = cancel.clone();
            tokio::spawn(async move {
                if tokio::signal::ctrl_c().await.is_ok() {
                    eprintln!("Cancelling...");
                    on_ctrl_c.cancel();
                }
            });

            let missing = job.missing_columns();
            if !missing.is_empty() {
                println!(
                    "Warning: columns not in the data (demo values and default names used): {}",
                    missing.join(", ")
                );
            }

            println!("Rendering {} rows...", job.dataset.len());
            let options = ExportOptions::from_config(&config.export).with_cancel(cancel);
            let report = run_export(
                &job,
                &QrCodeGenerator::default(),
                Box::new(ZipArchiveWriter::new()),
                &options,
            )
            .await?;

            let path = out.join(&report.archive_name);
            tokio::fs::write(&path, &report.archive).await?;

            println!("Saved {} of {} images to {}", report.produced, report.total, path.display());
            for skipped in &report.skipped {
                println!("  skipped row {}: {}", skipped.row_number, skipped.reason);
            }
            if !report.unmapped.is_empty() {
                println!(
                    "Fields without a column (demo value used): {}",
                    report.unmapped.join(", ")
                );
            }
        }

        Commands::Preview {
            template,
            layout,
            data,
            row,
            png,
            markers,
        } => {
            let template = Template::open(&template)?;
            let (fields, bindings, _) = Layout::load(&layout)?.into_parts()?;
            let fonts = config.font_book()?;
            let dataset = data.as_deref().map(Dataset::from_csv_path).transpose()?;

            let row = match &dataset {
                Some(dataset) => Some(dataset.row(row.saturating_sub(1)).ok_or_else(|| {
                    FieldpressError::Data(format!(
                        "Row {} is out of range (1-{})",
                        row,
                        dataset.len()
                    ))
                })?),
                None => None,
            };

            let qr = QrCodeGenerator::default();
            let image = if markers {
                render::render_preview(&template, &fields, &bindings, row, &fonts, &qr, None).await
            } else {
                render::render_row(&template, &fields, &bindings, row, &fonts, &qr).await
            };
            save_png(&png, image).await?;
            println!("Saved to {}", png.display());
        }

        Commands::Fonts => {
            let fonts = config.font_book()?;
            println!("Available fonts:");
            for entry in fonts.catalog() {
                println!("  {:<24} {}", entry.display_name, entry.family);
            }
        }

        Commands::Serve { listen } => {
            let fonts = Arc::new(config.font_book()?);
            let state = AppState::new(config, fonts);
            println!("Fieldpress editor backend on http://{}/api/editor", listen);
            server::serve(ServerConfig { listen_addr: listen }, state).await?;
        }
    }

    Ok(())
}

async fn save_png(path: &Path, image: image::RgbaImage) -> Result<(), FieldpressError> {
    let bytes = encode_png(image).await?;
    tokio::fs::write(path, bytes).await?;
    Ok(())
}
