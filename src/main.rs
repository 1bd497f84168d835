use std::fs::File;
use std::io::stdout;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode},
};
use log::{LevelFilter, error, info};
use simplelog::{Config, WriteLogger};

use slidedeck::app::{App, measure_terminal, run_app_with_event_source};
use slidedeck::event_source::TerminalEventSource;
use slidedeck::export::PngExporter;
use slidedeck::panic_handler;
use slidedeck::settings;
use slidedeck::slides::{DisplayPolicy, HostCommand, Presenter, TransitionStyle, open_source};

/// Present a paginated document as a slideshow
#[derive(Parser, Debug)]
#[command(name = "slidedeck")]
#[command(version)]
#[command(about = "Present a PDF or a directory of images as a slideshow")]
struct Args {
    /// PDF file or directory of slide images
    document: PathBuf,

    /// Slide to start on (1-based)
    #[arg(short, long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
    start: u32,

    /// Transition style (fade, push, reveal, move-in, cube, flip)
    #[arg(short, long)]
    transition: Option<TransitionStyle>,

    /// Presentation display: "auto" or a 1-based display number
    #[arg(short, long)]
    display: Option<DisplayPolicy>,

    /// Directory displayed slides are written to
    #[arg(short, long)]
    export_dir: Option<PathBuf>,

    /// Log level (off, error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<LevelFilter>,

    /// Log file
    #[arg(long, default_value = "slidedeck.log")]
    log_file: PathBuf,

    /// Settings file instead of the one in the user config directory
    #[arg(long)]
    config: Option<PathBuf>,

    /// Open the document for review without starting the presentation
    #[arg(long)]
    review: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    match &args.config {
        Some(path) => settings::load_settings_from(path),
        None => settings::load_settings(),
    }

    WriteLogger::init(
        args.log_level.unwrap_or_else(settings::get_log_level),
        Config::default(),
        File::create(&args.log_file)
            .with_context(|| format!("Failed to create log file {}", args.log_file.display()))?,
    )?;

    info!("Starting slidedeck on {}", args.document.display());

    let source = open_source(&args.document)?;
    let page_count = source.page_count();

    let mut config = settings::presenter_config();
    if let Some(style) = args.transition {
        config.transition = style;
    }
    if let Some(policy) = args.display {
        config.display_policy = policy;
    }

    let (control, cell_size) = measure_terminal();
    let mut surfaces = vec![control.clone()];
    surfaces.extend(settings::get_displays());
    info!("Control surface {}, {} displays", control.render_size(), surfaces.len());

    let export_dir = args
        .export_dir
        .clone()
        .or_else(settings::get_export_dir)
        .unwrap_or_else(|| PathBuf::from("."));
    let exporter = PngExporter::new(&export_dir, stdout())?;

    let (events_tx, events_rx) = flume::unbounded();
    let presenter = Presenter::new(source, control, surfaces, config, events_tx);
    let mut app = App::new(presenter, events_rx, exporter)
        .with_cell_size(cell_size)
        .remembering_choices();

    panic_handler::initialize_panic_handler();
    enable_raw_mode()?;
    execute!(stdout(), EnableMouseCapture)?;

    let res = start(&mut app, &args, page_count)
        .and_then(|()| run_app_with_event_source(&mut app, &mut TerminalEventSource));

    disable_raw_mode()?;
    execute!(stdout(), DisableMouseCapture)?;

    if let Err(err) = res {
        error!("Application error: {err:?}");
        println!("{err:?}");
    }

    info!("Shutting down slidedeck");
    Ok(())
}

fn start(
    app: &mut App<PngExporter<std::io::Stdout>>,
    args: &Args,
    page_count: usize,
) -> Result<()> {
    let first = (args.start as usize - 1).min(page_count.saturating_sub(1));
    app.dispatch(HostCommand::SelectSlide(first))?;
    if !args.review {
        app.dispatch(HostCommand::StartPresentation)?;
    }
    Ok(())
}
