use anyhow::Result;
use argh::FromArgs;
use fyptaco::options::{Params, TocOptions};
use fyptaco::render::TocRenderer;
use fyptaco::{Config, Context};
use std::fs;
use std::num::NonZero;
use std::path::{Path, PathBuf};

#[derive(FromArgs)]
/// add heading ids and tables of contents to HTML pages
struct Args {
    #[argh(subcommand)]
    command: Command,
}

#[derive(FromArgs)]
#[argh(subcommand)]
enum Command {
    Render(RenderArgs),
    Toc(TocArgs),
}

#[derive(FromArgs)]
/// render every page in a directory
#[argh(subcommand, name = "render")]
struct RenderArgs {
    /// source directory
    #[argh(positional)]
    src: PathBuf,

    /// destination directory, replaced if it exists
    #[argh(positional)]
    dest: PathBuf,

    /// number of worker threads (default: one per core)
    #[argh(option, short = 'j')]
    threads: Option<NonZero<usize>>,
}

#[derive(FromArgs)]
/// print the table of contents for one page
#[argh(subcommand, name = "toc")]
struct TocArgs {
    /// the page
    #[argh(positional)]
    file: PathBuf,

    /// heading levels to include, like `h2,h3`
    #[argh(option)]
    included: Option<String>,

    /// comma-separated text or attribute fragments of headings to leave out
    #[argh(option)]
    excluded: Option<String>,

    /// fewest headings worth a table of contents
    #[argh(option)]
    min_headings: Option<String>,

    /// heading above the list
    #[argh(option)]
    title: Option<String>,

    /// make the list collapsible
    #[argh(switch)]
    collapsible: bool,

    /// print the page with heading ids added instead
    #[argh(switch)]
    ids: bool,
}

fn render(args: RenderArgs) -> Result<()> {
    let config = Config::load(&args.src)?;
    let ctx = Context::new(&args.src, config);
    ctx.render_site(args.threads, &args.dest)
}

fn toc(args: TocArgs) -> Result<()> {
    let source = fs::read_to_string(&args.file)?;
    let dir = args.file.parent().unwrap_or(Path::new("."));
    let config = Config::load(dir)?;

    if args.ids {
        let ctx = Context::new(dir, config);
        print!("{}", ctx.render_page(&source));
        return Ok(());
    }

    let given: Params = [
        ("included", args.included),
        ("excluded", args.excluded),
        ("min_headings", args.min_headings),
        ("title", args.title),
        ("toggle", args.collapsible.then(|| "true".to_string())),
    ]
    .into_iter()
    .filter_map(|(k, v)| Some((k.to_string(), v?)))
    .collect();
    let options = TocOptions::from_params(&config.shortcode_params(&given));

    let out = fyptaco::core::page_toc(&source, &options, &TocRenderer::new())?;
    if out.is_empty() {
        log::info!("fewer than {} headings; no table of contents", options.min_headings);
    } else {
        println!("{out}");
    }
    Ok(())
}

fn main() -> Result<()> {
    env_logger::init();
    let args: Args = argh::from_env();
    match args.command {
        Command::Render(args) => render(args),
        Command::Toc(args) => toc(args),
    }
}
