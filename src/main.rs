//! # Etiqueta CLI
//!
//! Command-line interface for rendering product labels.
//!
//! ## Usage
//!
//! ```bash
//! # Render one label to PNG
//! etiqueta render shelf.json --data milk.json --out milk.png
//!
//! # Dump the vector display list instead
//! etiqueta render shelf.json --data milk.json --commands
//!
//! # One PNG per product, rendered in parallel
//! etiqueta batch shelf.json products.json --out-dir labels/
//!
//! # Check how text fits a 40x8 mm box
//! etiqueta fit "Название товара" --width 40 --height 8
//!
//! # Start the HTTP API
//! etiqueta serve --listen 0.0.0.0:8080
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use etiqueta::{
    EtiquetaError,
    fit::{FitOptions, MonospaceMeasure, TextMeasure, TtfMeasure, fit},
    render::{self, DitherMode, ImageStore, RenderOptions, images::http_client},
    server::{self, ServerConfig},
    template::{ProductData, Template, TextAlign, product_data_from_json},
};

/// Etiqueta - product label renderer
#[derive(Parser, Debug)]
#[command(name = "etiqueta")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Render a template for one product
    Render {
        /// Template JSON file
        template: PathBuf,

        /// Product JSON object file
        #[arg(long)]
        data: Option<PathBuf>,

        /// Output PNG file
        #[arg(long, value_name = "FILE", default_value = "label.png")]
        out: PathBuf,

        /// Print the vector display list as JSON instead of writing a PNG
        #[arg(long)]
        commands: bool,

        #[command(flatten)]
        style: StyleArgs,
    },

    /// Render a template for every product in a JSON array
    Batch {
        /// Template JSON file
        template: PathBuf,

        /// JSON array of product objects
        products: PathBuf,

        /// Directory for label-NNNN.png files
        #[arg(long, default_value = "labels")]
        out_dir: PathBuf,

        #[command(flatten)]
        style: StyleArgs,
    },

    /// Fit text into a box and print the layout as JSON
    Fit {
        text: String,

        /// Box width in mm
        #[arg(long)]
        width: f64,

        /// Box height in mm
        #[arg(long)]
        height: f64,

        /// Starting font size in CSS px
        #[arg(long, default_value = "12")]
        font_size: f64,

        /// Minimum font size in CSS px
        #[arg(long, default_value = "6")]
        min_font_size: f64,

        #[arg(long, value_enum, default_value = "left")]
        align: AlignArg,

        /// TrueType font for measuring (Spleen metrics when omitted)
        #[arg(long)]
        font: Option<PathBuf>,
    },

    /// Start the HTTP API server
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8080")]
        listen: String,

        /// TrueType font for text
        #[arg(long)]
        font: Option<PathBuf>,

        /// Bold TrueType face
        #[arg(long)]
        bold_font: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
struct StyleArgs {
    /// TrueType font for text (Spleen bitmap font when omitted)
    #[arg(long)]
    font: Option<PathBuf>,

    /// Bold TrueType face
    #[arg(long)]
    bold_font: Option<PathBuf>,

    /// 1-bit conversion for thermal printers
    #[arg(long, value_enum, default_value = "none")]
    dither: DitherArg,

    /// Outline the printable area
    #[arg(long)]
    margins: bool,
}

impl StyleArgs {
    fn options(&self) -> RenderOptions {
        RenderOptions {
            show_margins: self.margins,
            dither: self.dither.into(),
        }
    }

    fn ttf(&self) -> Result<Option<TtfMeasure>, EtiquetaError> {
        let Some(path) = &self.font else {
            return Ok(None);
        };
        let mut ttf = TtfMeasure::from_file(path)?;
        if let Some(bold) = &self.bold_font {
            ttf = ttf.with_bold_file(bold)?;
        }
        Ok(Some(ttf))
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum DitherArg {
    None,
    Threshold,
    Bayer,
}

impl From<DitherArg> for DitherMode {
    fn from(arg: DitherArg) -> Self {
        match arg {
            DitherArg::None => DitherMode::None,
            DitherArg::Threshold => DitherMode::Threshold,
            DitherArg::Bayer => DitherMode::Bayer,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum AlignArg {
    Left,
    Center,
    Right,
}

impl From<AlignArg> for TextAlign {
    fn from(arg: AlignArg) -> Self {
        match arg {
            AlignArg::Left => TextAlign::Left,
            AlignArg::Center => TextAlign::Center,
            AlignArg::Right => TextAlign::Right,
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), EtiquetaError> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Render {
            template,
            data,
            out,
            commands,
            style,
        } => {
            let (tpl, images) = load_template(&template).await?;
            let product = match &data {
                Some(path) => read_product(path)?,
                None => ProductData::new(),
            };
            let options = style.options();

            if commands {
                let list = render::render_commands(&tpl, &product, &images, &options);
                println!("{}", serde_json::to_string_pretty(&list)?);
                return Ok(());
            }

            let png = render::render_png(&tpl, &product, &images, &options, style.ttf()?.as_ref())?;
            std::fs::write(&out, png)?;
            info!(out = %out.display(), "label written");
            Ok(())
        }

        Commands::Batch {
            template,
            products,
            out_dir,
            style,
        } => {
            let (tpl, images) = load_template(&template).await?;
            let records = read_products(&products)?;
            std::fs::create_dir_all(&out_dir)?;

            let ttf = style.ttf()?;
            let results = render::render_batch(&tpl, &records, &images, &style.options(), ttf.as_ref());

            let mut failed = 0;
            for (i, result) in results.into_iter().enumerate() {
                let path = out_dir.join(format!("label-{:04}.png", i + 1));
                match result {
                    Ok(png) => std::fs::write(&path, png)?,
                    Err(e) => {
                        warn!(index = i, error = %e, "label failed");
                        failed += 1;
                    }
                }
            }
            info!(labels = records.len() - failed, failed, out_dir = %out_dir.display(), "batch finished");
            Ok(())
        }

        Commands::Fit {
            text,
            width,
            height,
            font_size,
            min_font_size,
            align,
            font,
        } => {
            let options = FitOptions {
                start_font_size_px: font_size,
                min_font_size_px: min_font_size,
                align: align.into(),
                ..Default::default()
            };
            let ttf = font.map(|path| TtfMeasure::from_file(path)).transpose()?;
            let mono = MonospaceMeasure::default();
            let measure: &dyn TextMeasure = match &ttf {
                Some(ttf) => ttf as &dyn TextMeasure,
                None => &mono,
            };
            let fitted = fit(&text, width, height, &options, measure);
            println!("{}", serde_json::to_string_pretty(&fitted)?);
            Ok(())
        }

        Commands::Serve {
            listen,
            font,
            bold_font,
        } => {
            server::serve(ServerConfig {
                listen_addr: listen,
                font_path: font,
                bold_font_path: bold_font,
            })
            .await
        }
    }
}

/// Read a template and load the images it references. Relative image paths
/// resolve against the template's directory.
async fn load_template(path: &Path) -> Result<(Template, ImageStore), EtiquetaError> {
    let template = Template::from_json(&std::fs::read_to_string(path)?)?;

    let mut images = ImageStore::new();
    images.load_local_for(&template.elements, path.parent());
    if !images.missing_remote(&template.elements).is_empty() {
        images.load_for(&template.elements, &http_client()?).await;
    }
    Ok((template, images))
}

fn read_product(path: &Path) -> Result<ProductData, EtiquetaError> {
    let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    match value {
        serde_json::Value::Object(fields) => Ok(product_data_from_json(fields)),
        _ => Err(EtiquetaError::Template(format!(
            "{}: expected a JSON object of product fields",
            path.display()
        ))),
    }
}

fn read_products(path: &Path) -> Result<Vec<ProductData>, EtiquetaError> {
    let value: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(path)?)?;
    let serde_json::Value::Array(items) = value else {
        return Err(EtiquetaError::Template(format!(
            "{}: expected a JSON array of products",
            path.display()
        )));
    };
    Ok(items
        .into_iter()
        .enumerate()
        .filter_map(|(i, item)| match item {
            serde_json::Value::Object(fields) => Some(product_data_from_json(fields)),
            _ => {
                warn!(index = i, "skipping non-object product");
                None
            }
        })
        .collect())
}
