//! Media kit builder command-line tool.
//!
//! Renders saved media kit state to HTML, and talks to a WordPress site
//! to save, load and fetch component templates.
//!
//! Usage:
//!   mediakit render state.json -o kit.html
//!   mediakit --post-id 42 --nonce abc save state.json
//!   mediakit serve state.json --port 4010 --autosave

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use mediakit_cache::TemplateCache;
use mediakit_cli::{
    build_router, page, read_state, render_state, write_state, MediaKitConfig, PreviewSite,
};
use mediakit_client::{AutoSaver, Refresh, StatePersistence, TemplateLoader, WordPressClient};
use mediakit_model::validate_state;
use std::{fs, path::PathBuf, sync::Arc};
use tracing::{info, Level};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser, Debug)]
#[command(name = "mediakit")]
#[command(about = "Media kit builder: render, save and load media kits", version)]
struct Args {
    /// Path to a TOML config file
    #[arg(short, long, global = true, env = "MEDIAKIT_CONFIG")]
    config: Option<PathBuf>,

    /// Enable verbose debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    site: SiteArgs,

    #[command(subcommand)]
    command: Command,
}

/// Overrides for the `[wordpress]` config table.
#[derive(clap::Args, Debug)]
struct SiteArgs {
    /// admin-ajax.php endpoint
    #[arg(long, global = true, env = "MEDIAKIT_AJAX_URL")]
    ajax_url: Option<String>,

    /// REST API root, e.g. https://example.com/wp-json
    #[arg(long, global = true, env = "MEDIAKIT_REST_BASE")]
    rest_base: Option<String>,

    /// WordPress nonce
    #[arg(long, global = true, env = "MEDIAKIT_NONCE", hide_env_values = true)]
    nonce: Option<String>,

    /// Post the media kit belongs to
    #[arg(long, global = true, env = "MEDIAKIT_POST_ID")]
    post_id: Option<u64>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Render a state file to HTML
    Render {
        state: PathBuf,
        /// Write to a file instead of stdout
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Override the state's theme
        #[arg(long)]
        theme: Option<String>,
        /// Emit only the preview container, without the page around it
        #[arg(long)]
        fragment: bool,
    },
    /// Check a state file for structural problems
    Validate { state: PathBuf },
    /// Save a state file to WordPress
    Save { state: PathBuf },
    /// Load the saved state from WordPress
    Load {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Fetch the component template batch
    Templates {
        /// Print the batch as JSON
        #[arg(long)]
        json: bool,
    },
    /// Serve a rendered state file over HTTP and accept edits
    Serve {
        state: PathBuf,
        #[arg(short, long, default_value = "4010")]
        port: u16,
        /// Save edits to WordPress in the background
        #[arg(long)]
        autosave: bool,
    },
}

fn init_tracing(verbose: bool) {
    let builder = FmtSubscriber::builder()
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact();
    if verbose {
        builder.with_max_level(Level::DEBUG).init();
    } else {
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
        builder.with_env_filter(filter).init();
    }
}

fn load_config(args: &Args) -> Result<MediaKitConfig> {
    let mut config = MediaKitConfig::load_or_default(args.config.as_deref())?;
    let site = &args.site;
    let wordpress = &mut config.wordpress;
    if let Some(url) = &site.ajax_url {
        wordpress.ajax_url = url.clone();
    }
    if let Some(base) = &site.rest_base {
        wordpress.rest_base = base.clone();
    }
    if let Some(nonce) = &site.nonce {
        wordpress.nonce = nonce.clone();
    }
    if let Some(post_id) = site.post_id {
        wordpress.post_id = post_id;
    }
    Ok(config)
}

fn client(config: &MediaKitConfig) -> Result<WordPressClient> {
    WordPressClient::new(config.wordpress.clone()).context("Failed to create WordPress client")
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.verbose);
    let config = load_config(&args)?;

    match args.command {
        Command::Render {
            state,
            output,
            theme,
            fragment,
        } => {
            let mut state = read_state(&state)?;
            if let Some(theme) = theme {
                state.theme = theme;
            }
            let rendered = render_state(&state, &config.render);
            let html = if fragment {
                rendered.html
            } else {
                page(&rendered.html, &state.theme)
            };
            match output {
                Some(path) => {
                    fs::write(&path, html)
                        .with_context(|| format!("Failed to write {}", path.display()))?;
                    info!(
                        path = %path.display(),
                        rendered = rendered.report.rendered,
                        failed = rendered.report.failed,
                        "wrote media kit"
                    );
                }
                None => print!("{html}"),
            }
        }
        Command::Validate { state } => {
            let state = read_state(&state)?;
            let violations = validate_state(&state);
            for violation in &violations {
                println!("{violation}");
            }
            if !violations.is_empty() {
                bail!("{} structural problem(s) found", violations.len());
            }
            println!(
                "ok: {} components, {} sections",
                state.components.len(),
                state.sections.len()
            );
        }
        Command::Save { state } => {
            let state = read_state(&state)?;
            let receipt = client(&config)?
                .save_state(&state)
                .await
                .context("Failed to save media kit")?;
            println!(
                "{}",
                receipt
                    .message
                    .unwrap_or_else(|| "Media kit saved".to_string())
            );
        }
        Command::Load { output } => {
            let Some(state) = client(&config)?
                .load_state()
                .await
                .context("Failed to load media kit")?
            else {
                bail!("no media kit saved for post {}", config.wordpress.post_id);
            };
            match output {
                Some(path) => write_state(&path, &state)?,
                None => println!("{}", serde_json::to_string_pretty(&state)?),
            }
        }
        Command::Templates { json } => {
            let cache = Arc::new(TemplateCache::new(config.templates.clone()));
            let loader = TemplateLoader::new(Arc::new(client(&config)?), Arc::clone(&cache));
            let refresh = loader
                .ensure_fresh()
                .await
                .context("Failed to fetch templates")?;
            if let Refresh::Stale { error } = &refresh {
                bail!("template fetch failed: {error}");
            }
            if json {
                println!("{}", serde_json::to_string_pretty(&cache.export())?);
            } else {
                println!(
                    "version {}",
                    cache.get_version().unwrap_or_else(|| "-".to_string())
                );
                for component_type in cache.types() {
                    println!("  {component_type}");
                }
            }
        }
        Command::Serve {
            state,
            port,
            autosave,
        } => {
            let site = Arc::new(PreviewSite::new(read_state(&state)?, &config));
            let saver = if autosave {
                let persistence: Arc<dyn StatePersistence> = Arc::new(client(&config)?);
                Some(AutoSaver::spawn(
                    Arc::clone(site.store()),
                    persistence,
                    config.autosave.clone(),
                ))
            } else {
                None
            };
            let listener = tokio::net::TcpListener::bind(("127.0.0.1", port))
                .await
                .with_context(|| format!("Failed to bind port {port}"))?;
            info!(port, autosave, "preview server listening");
            axum::serve(listener, build_router(site))
                .with_graceful_shutdown(async {
                    let _ = tokio::signal::ctrl_c().await;
                })
                .await
                .context("Preview server failed")?;
            if let Some(saver) = saver {
                saver.shutdown().await;
            }
        }
    }
    Ok(())
}
