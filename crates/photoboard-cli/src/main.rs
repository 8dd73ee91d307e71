use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use photoboard_layout::{
    build_document, load_photos, shared_text, valid_photos, DocumentSettings, PageOrientation,
    PaperFormat, PaperSize, PositionsRegistry, SetsPositionSettings,
};
use photoboard_render::{render_preview, CancelToken, FontRegistry};
use photoboard_runtime::{spawn_worker, RenderCommand, RenderUpdate};

#[derive(Parser)]
#[command(name = "pboard", about = "Compose photos and captions into a print-ready PDF", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the PDF from a directory of photos
    Generate {
        /// Output PDF file
        #[arg(short, long)]
        output: PathBuf,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// Render one page to a PNG preview
    Preview {
        /// Output PNG file
        #[arg(short, long)]
        output: PathBuf,

        /// Page to render (0-based)
        #[arg(long, default_value = "0")]
        page: usize,

        /// Color the structural rectangles instead of drawing content
        #[arg(long)]
        zones: bool,

        #[command(flatten)]
        layout: LayoutArgs,
    },

    /// List the predefined position layouts in a directory
    Positions {
        /// Directory of .pos files
        dir: PathBuf,
    },
}

#[derive(Args)]
struct LayoutArgs {
    /// Directory of photos, ordered by file name
    #[arg(short, long)]
    photos: PathBuf,

    /// JSON document configuration; command-line flags override it
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Photos per row
    #[arg(long)]
    columns: Option<usize>,

    /// Photos per column
    #[arg(long)]
    rows: Option<usize>,

    /// Paper size
    #[arg(long, value_enum)]
    paper: Option<PaperArg>,

    /// Output resolution
    #[arg(long)]
    dpi: Option<u32>,

    #[arg(long, value_enum)]
    orientation: Option<OrientationArg>,

    /// Convert the whole output to grayscale
    #[arg(long)]
    grayscale: bool,

    /// Render only this page (0-based) during generation
    #[arg(long)]
    only_page: Option<usize>,

    /// Caption markup applied to every photo
    #[arg(long)]
    consign: Option<String>,

    /// Extra font directories searched before the system locations
    #[arg(long)]
    font_dir: Vec<PathBuf>,
}

#[derive(Clone, Copy, ValueEnum)]
enum PaperArg {
    A3,
    A4,
    A5,
    A6,
    B5,
    Letter,
    Legal,
    Tabloid,
}

impl From<PaperArg> for PaperSize {
    fn from(arg: PaperArg) -> Self {
        match arg {
            PaperArg::A3 => PaperSize::A3,
            PaperArg::A4 => PaperSize::A4,
            PaperArg::A5 => PaperSize::A5,
            PaperArg::A6 => PaperSize::A6,
            PaperArg::B5 => PaperSize::B5,
            PaperArg::Letter => PaperSize::Letter,
            PaperArg::Legal => PaperSize::Legal,
            PaperArg::Tabloid => PaperSize::Tabloid,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum OrientationArg {
    Portrait,
    Landscape,
}

impl From<OrientationArg> for PageOrientation {
    fn from(arg: OrientationArg) -> Self {
        match arg {
            OrientationArg::Portrait => PageOrientation::Portrait,
            OrientationArg::Landscape => PageOrientation::Landscape,
        }
    }
}

impl LayoutArgs {
    async fn settings(&self) -> Result<DocumentSettings> {
        let mut settings = match &self.config {
            Some(path) => DocumentSettings::load(path)
                .await
                .with_context(|| format!("loading config {}", path.display()))?,
            None => DocumentSettings::default(),
        };

        if self.columns.is_some() || self.rows.is_some() {
            let positions = &mut settings.page.positions;
            positions.custom_mode = false;
            positions.set_columns(self.columns.unwrap_or(positions.nb_photos_h.max(1)));
            positions.set_lines(self.rows.unwrap_or(positions.nb_photos_v.max(1)));
        }
        if self.paper.is_some() || self.dpi.is_some() {
            let size = self
                .paper
                .map(PaperSize::from)
                .unwrap_or(settings.paper.size);
            let dpi = self.dpi.unwrap_or(settings.paper.dpi);
            settings.paper = PaperFormat::new(size, dpi);
        }
        if let Some(orientation) = self.orientation {
            settings.orientation = orientation.into();
        }
        if self.grayscale {
            settings.grayscale = true;
        }
        if let Some(page) = self.only_page {
            settings.save_only_current_page = true;
            settings.current_page = page;
        }
        if let Some(consign) = &self.consign {
            settings.consign_text = shared_text(consign.clone());
        }
        settings.font_dirs.extend(self.font_dir.iter().cloned());

        settings.validate()?;
        Ok(settings)
    }

    async fn photos(&self) -> Result<Vec<Arc<photoboard_layout::Photo>>> {
        let loaded = load_photos(&self.photos)
            .await
            .with_context(|| format!("loading photos from {}", self.photos.display()))?;
        let valid = valid_photos(&loaded);
        if valid.is_empty() {
            bail!("no photos found in {}", self.photos.display());
        }
        Ok(valid)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Generate { output, layout } => generate(output, layout).await,
        Commands::Preview {
            output,
            page,
            zones,
            layout,
        } => preview(output, page, zones, layout).await,
        Commands::Positions { dir } => positions(dir),
    }
}

async fn generate(output: PathBuf, layout: LayoutArgs) -> Result<()> {
    let settings = layout.settings().await?;
    let photos = layout.photos().await?;
    let document = build_document(&photos, &settings, &output);
    let pages = document.pages.len();
    let sets = document.total_sets();

    let fonts = Arc::new(FontRegistry::discover(&settings.font_dirs));
    if fonts.is_empty() {
        log::warn!("No fonts found; rich text will fail to render");
    }

    let cancel = CancelToken::new();
    let (command_tx, mut update_rx) = spawn_worker(fonts);
    command_tx
        .send(RenderCommand::GeneratePdf {
            document,
            cancel: cancel.clone(),
        })
        .ok()
        .context("render worker is gone")?;
    drop(command_tx);

    loop {
        tokio::select! {
            update = update_rx.recv() => match update {
                Some(RenderUpdate::Progress { operation, .. }) => log::info!("{operation}"),
                Some(RenderUpdate::PdfComplete { path }) => {
                    println!("Wrote {} ({} page(s), {} photo(s))", path.display(), pages, sets);
                    return Ok(());
                }
                Some(RenderUpdate::PdfCancelled { .. }) => {
                    println!("Generation cancelled; no file written");
                    return Ok(());
                }
                Some(RenderUpdate::Error { message }) => bail!("{message}"),
                Some(RenderUpdate::PreviewReady { .. }) => {}
                None => bail!("render worker exited unexpectedly"),
            },
            _ = tokio::signal::ctrl_c() => {
                log::info!("Cancelling after the current page");
                cancel.cancel();
            }
        }
    }
}

async fn preview(output: PathBuf, page: usize, zones: bool, layout: LayoutArgs) -> Result<()> {
    let settings = layout.settings().await?;
    let photos = layout.photos().await?;
    let mut document = build_document(&photos, &settings, "");

    let fonts = FontRegistry::discover(&settings.font_dirs);
    let image = render_preview(&mut document, page, zones, &fonts).context("rendering preview")?;
    image
        .save(&output)
        .with_context(|| format!("writing {}", output.display()))?;

    println!(
        "Wrote {} ({}x{} px, page {}/{})",
        output.display(),
        image.width(),
        image.height(),
        page + 1,
        document.pages.len()
    );
    Ok(())
}

fn positions(dir: PathBuf) -> Result<()> {
    let registry =
        PositionsRegistry::load(&dir).with_context(|| format!("reading {}", dir.display()))?;

    if registry.all().is_empty() {
        println!("No valid position layouts in {}", dir.display());
        return Ok(());
    }

    for entry in registry.all() {
        let settings: &SetsPositionSettings = &entry.settings;
        let mode = if settings.custom_mode { "custom" } else { "grid" };
        println!(
            "{}: {} mode, {} photo(s), {}x{}",
            entry.path.display(),
            mode,
            entry.nb_photos,
            settings.nb_photos_h,
            settings.nb_photos_v
        );
    }
    Ok(())
}
