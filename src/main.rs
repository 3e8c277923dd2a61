use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use wte_viewer::impact::{ImpactCalculator, ImpactInputs, ImpactResults, Technology};
use wte_viewer::{Catalog, ViewOptions, ViewerName};

#[derive(Parser)]
#[command(
    name = "wte-viewer",
    about = "Explore waste-to-energy process flows and plant designs in the terminal"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the diagrams a viewer offers
    List {
        viewer: ViewerName,

        /// Catalog file to use instead of the built-in one
        #[arg(long)]
        catalog: Option<PathBuf>,
    },

    /// Replay events on a viewer and print the resulting view
    View {
        viewer: ViewerName,

        /// Catalog file to use instead of the built-in one
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// File of events, one per line
        #[arg(long)]
        script: Option<PathBuf>,

        /// Event to apply after the script, e.g. "toggle digester" (repeatable)
        #[arg(long = "event", short = 'e')]
        events: Vec<String>,

        /// Maximum output width in columns
        #[arg(long, short = 'w')]
        width: Option<usize>,

        /// Fail on events the viewer rejects instead of skipping them
        #[arg(long)]
        strict: bool,
    },

    /// Run the environmental impact calculator
    Impact {
        /// Facility size in square meters
        #[arg(long, default_value_t = 10_000.0)]
        facility_size: f64,

        /// Waste capacity in tons per day
        #[arg(long, default_value_t = 100.0)]
        waste_capacity: f64,

        #[arg(long, value_enum, default_value_t = Technology::Anaerobic)]
        technology: Technology,

        /// Operational hours per year
        #[arg(long, default_value_t = 8_000.0)]
        hours: f64,

        /// Waste diversion percentage
        #[arg(long, default_value_t = 80.0)]
        diversion: f64,

        /// Delay before results are shown, in milliseconds
        #[arg(long, default_value_t = 1500)]
        delay_ms: u64,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::List { viewer, catalog } => list(viewer, catalog.as_deref()),
        Command::View {
            viewer,
            catalog,
            script,
            events,
            width,
            strict,
        } => view(viewer, catalog.as_deref(), script.as_deref(), &events, width, strict),
        Command::Impact {
            facility_size,
            waste_capacity,
            technology,
            hours,
            diversion,
            delay_ms,
        } => {
            let inputs = ImpactInputs {
                facility_size,
                waste_capacity,
                technology,
                operational_hours: hours,
                waste_diversion: diversion,
            };
            impact(inputs, Duration::from_millis(delay_ms))
        }
    };

    match result {
        Ok(output) => println!("{output}"),
        Err(e) => {
            eprintln!("ERROR: {e}");
            std::process::exit(1);
        }
    }
}

fn read_file(path: &Path) -> Result<String, String> {
    std::fs::read_to_string(path).map_err(|e| format!("failed to read {}: {e}", path.display()))
}

fn load_catalog(viewer: ViewerName, path: Option<&Path>) -> Result<Catalog, String> {
    let catalog = match path {
        Some(path) => Catalog::parse(&read_file(path)?),
        None => viewer.builtin_catalog(),
    };
    catalog.map_err(|e| e.to_string())
}

fn list(viewer: ViewerName, catalog: Option<&Path>) -> Result<String, String> {
    let catalog = load_catalog(viewer, catalog)?;
    let width = catalog
        .list_diagrams()
        .iter()
        .map(|d| d.id.len())
        .max()
        .unwrap_or(0);
    Ok(catalog
        .list_diagrams()
        .iter()
        .map(|d| {
            let marker = if d.id == catalog.default_diagram_id() { '*' } else { ' ' };
            format!("{marker} {:<width$}  {}", d.id, d.title)
        })
        .collect::<Vec<_>>()
        .join("\n"))
}

fn view(
    viewer: ViewerName,
    catalog: Option<&Path>,
    script: Option<&Path>,
    events: &[String],
    width: Option<usize>,
    strict: bool,
) -> Result<String, String> {
    let catalog_source = catalog.map(read_file).transpose()?;
    let mut full_script = match script {
        Some(path) => read_file(path)?,
        None => String::new(),
    };
    for event in events {
        if !full_script.is_empty() && !full_script.ends_with('\n') {
            full_script.push('\n');
        }
        full_script.push_str(event);
    }

    let options = ViewOptions {
        max_width: width,
        strict,
    };
    wte_viewer::render_view_with_options(viewer, catalog_source.as_deref(), &full_script, options)
        .map_err(|e| e.to_string())
}

fn impact(inputs: ImpactInputs, delay: Duration) -> Result<String, String> {
    let mut calculator = ImpactCalculator::with_delay(inputs, delay);
    let ready_at = calculator.calculate(Instant::now()).map_err(|e| e.to_string())?;
    eprintln!("Calculating...");
    std::thread::sleep(ready_at.saturating_duration_since(Instant::now()));

    let results = calculator
        .poll(Instant::now())
        .ok_or_else(|| "calculation did not complete".to_string())?;
    Ok(format_results(results))
}

fn format_results(r: &ImpactResults) -> String {
    [
        format!("Carbon credits:      {:.0}", r.carbon_credits),
        format!("iNDC contribution:   {:.3}%", r.indc_contribution),
        format!("GHG reduction:       {:.0} tons CO2e", r.ghg_reduction),
        format!("Renewable energy:    {:.0} MWh", r.renewable_energy),
        format!("Waste diverted:      {:.0} tons", r.waste_diverted),
    ]
    .join("\n")
}
