mod data;

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use template::{Template, TemplateConfig};

/// Render an HTML template with placeholder and list data.
#[derive(Debug, Parser)]
#[command(name = "mirage", version)]
struct Cli {
    /// Template file to render.
    template: PathBuf,
    /// TOML file with `[[items]]` scalar batches and `[[lists]]` list batches.
    #[arg(long, value_name = "TOML")]
    data: Option<PathBuf>,
    /// Collapse layout whitespace and drop comments after rendering.
    #[arg(long)]
    strip_whitespace: bool,
    /// Insert values as-is instead of escaping HTML special characters.
    #[arg(long)]
    no_encode: bool,
    #[arg(long)]
    prefix: Option<String>,
    #[arg(long)]
    suffix: Option<String>,
    /// Largest accepted template size.
    #[arg(long, value_name = "KIB")]
    max_kib: Option<u64>,
    /// Write the result here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl Cli {
    fn config(&self) -> TemplateConfig {
        let mut config = TemplateConfig::default().with_encode_on_insert(!self.no_encode);
        if let Some(prefix) = &self.prefix {
            config = config.with_prefix(prefix);
        }
        if let Some(suffix) = &self.suffix {
            config = config.with_suffix(suffix);
        }
        if let Some(kib) = self.max_kib {
            config = config.with_max_template_kib(kib);
        }
        config
    }
}

fn render(cli: &Cli) -> Result<Template> {
    let mut page = Template::open(&cli.template, cli.config())
        .with_context(|| format!("failed to open template {}", cli.template.display()))?;
    if let Some(path) = &cli.data {
        let rejected = data::load(path)?.register(&mut page);
        if rejected > 0 {
            log::warn!(target: "mirage", "{rejected} batch(es) in {} were rejected", path.display());
        }
    }
    page.apply();
    if cli.strip_whitespace {
        page.normalize_whitespace();
    }
    Ok(page)
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    let page = render(&cli)?;
    match &cli.output {
        Some(path) => fs::write(path, page.markup())
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => {
            let mut stdout = io::stdout().lock();
            page.render(&mut stdout)?;
            stdout.flush()?;
        }
    }
    Ok(())
}
