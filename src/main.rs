use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pagesmith::{
    export_static_page, ComponentKind, Composer, Config, Deployer, Mode, PagePayload,
};
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "pagesmith")]
#[command(about = "Render and deploy landing pages")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a page payload to stdout
    Render {
        /// Page JSON with an embedded `components` array
        #[arg(short, long)]
        input: PathBuf,

        /// `static` (published pages only) or `interactive`
        #[arg(short, long, default_value = "static")]
        mode: Mode,

        /// Configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Export a published page into the deployment directory
    Export {
        /// Page JSON with an embedded `components` array
        #[arg(short, long)]
        input: PathBuf,

        /// Overrides `deploy.output_dir` from the configuration
        #[arg(short, long)]
        out_dir: Option<PathBuf>,

        /// Configuration file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// List builtin themes
    Themes,

    /// List builtin component types
    Types,
}

fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => Config::from_json_file(path)
            .with_context(|| format!("reading config {}", path.display())),
        None => Ok(Config::default()),
    }
}

fn load_payload(path: &Path) -> Result<PagePayload> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading page {}", path.display()))?;
    PagePayload::from_json(&raw).with_context(|| format!("parsing page {}", path.display()))
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Render { input, mode, config } => {
            let config = load_config(config.as_deref())?;
            let payload = load_payload(&input)?;
            let composer = Composer::new(config.render);
            let html = match mode {
                Mode::Static => export_static_page(&composer, &payload.page, &payload.components)?,
                Mode::Interactive => composer
                    .render_page(&payload.page, &payload.components, Mode::Interactive)
                    .to_html(),
            };
            println!("{}", html);
        }

        Commands::Export {
            input,
            out_dir,
            config,
        } => {
            let mut config = load_config(config.as_deref())?;
            if let Some(dir) = out_dir {
                config.deploy.output_dir = dir;
            }
            let payload = load_payload(&input)?;
            let composer = Composer::new(config.render);
            let report = Deployer::new(config.deploy)
                .deploy(&payload.page, &payload.components, &composer)
                .with_context(|| format!("deploying page {}", payload.page.id))?;
            println!("{} {} {}", report.path.display(), report.bytes, report.sha256);
        }

        Commands::Themes => {
            let composer = Composer::default();
            for theme in composer.themes().themes() {
                let family = if theme.dark_family { "dark" } else { "light" };
                println!("{:<10} {:<10} {}", theme.name, family, theme.label);
            }
        }

        Commands::Types => {
            for kind in ComponentKind::ALL {
                println!("{:<10} {}", kind.as_str(), kind.label());
            }
        }
    }

    Ok(())
}
