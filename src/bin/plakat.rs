use std::path::{Path, PathBuf};

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use plakat::{Color, DirAssets, PhotoSource, TemplateDescriptor, TemplateRenderer};

#[derive(Parser, Debug)]
#[command(name = "plakat", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a banner as a PNG.
    Render(RenderArgs),
    /// Validate a template descriptor JSON.
    Validate(ValidateArgs),
    /// Write the built-in default template as JSON.
    Sample(SampleArgs),
}

#[derive(Parser, Debug)]
struct RenderArgs {
    /// Template descriptor JSON; uses the built-in default template when
    /// omitted.
    #[arg(long)]
    template: Option<PathBuf>,

    /// Directory asset paths resolve against; defaults to the template's
    /// directory (or the current directory for the built-in template).
    #[arg(long)]
    assets_root: Option<PathBuf>,

    /// User photo to stretch into the mask area.
    #[arg(long)]
    photo: Option<PathBuf>,

    /// Background color override (#RRGGBB or #RRGGBBAA).
    #[arg(long)]
    background: Option<String>,

    /// Caption text override.
    #[arg(long)]
    caption: Option<String>,

    /// Output PNG path.
    #[arg(long)]
    out: PathBuf,
}

#[derive(Parser, Debug)]
struct ValidateArgs {
    /// Template descriptor JSON.
    #[arg(long)]
    template: PathBuf,
}

#[derive(Parser, Debug)]
struct SampleArgs {
    /// Output path; prints to stdout when omitted.
    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    match cli.cmd {
        Command::Render(args) => cmd_render(args),
        Command::Validate(args) => cmd_validate(args),
        Command::Sample(args) => cmd_sample(args),
    }
}

fn read_descriptor_json(path: &Path) -> anyhow::Result<TemplateDescriptor> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("open template '{}'", path.display()))?;
    let desc = TemplateDescriptor::from_json(&json)
        .with_context(|| format!("parse template '{}'", path.display()))?;
    Ok(desc)
}

fn cmd_render(args: RenderArgs) -> anyhow::Result<()> {
    let desc = match &args.template {
        Some(path) => read_descriptor_json(path)?,
        None => TemplateDescriptor::default(),
    };

    let assets_root = match (&args.assets_root, &args.template) {
        (Some(root), _) => root.clone(),
        (None, Some(template)) => template
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .to_path_buf(),
        (None, None) => PathBuf::from("."),
    };

    let source = DirAssets::new(assets_root);
    let mut renderer = TemplateRenderer::new(desc, &source)?;

    if let Some(hex) = &args.background {
        let color = hex.parse::<Color>().map_err(|e| anyhow::anyhow!(e))?;
        renderer.set_background_color(Some(color));
    }
    if let Some(photo) = &args.photo {
        renderer.set_photo(Some(PhotoSource::Path(photo.clone())))?;
    }

    let banner = match args.caption {
        Some(text) => renderer.update_caption_text(text)?,
        None => renderer.render()?,
    };

    for skip in &banner.report.skipped {
        eprintln!("skipped {}: {}", skip.layer, skip.reason);
    }

    if let Some(parent) = args.out.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("create output dir '{}'", parent.display()))?;
    }

    let data = banner.frame.to_straight_rgba8();
    image::save_buffer_with_format(
        &args.out,
        &data,
        banner.frame.width,
        banner.frame.height,
        image::ColorType::Rgba8,
        image::ImageFormat::Png,
    )
    .with_context(|| format!("write png '{}'", args.out.display()))?;

    eprintln!("wrote {}", args.out.display());
    Ok(())
}

fn cmd_validate(args: ValidateArgs) -> anyhow::Result<()> {
    let desc = read_descriptor_json(&args.template)?;
    desc.validate()?;
    eprintln!("{} is a valid template", args.template.display());
    Ok(())
}

fn cmd_sample(args: SampleArgs) -> anyhow::Result<()> {
    let json = TemplateDescriptor::default().to_json_pretty()?;

    match &args.out {
        Some(path) => {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("create output dir '{}'", parent.display()))?;
            }
            std::fs::write(path, json.as_bytes())
                .with_context(|| format!("write template '{}'", path.display()))?;
            eprintln!("wrote {}", path.display());
        }
        None => println!("{json}"),
    }
    Ok(())
}
