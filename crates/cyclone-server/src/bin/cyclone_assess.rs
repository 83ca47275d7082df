//! One-shot operator assessment from the command line.
//!
//! Uses the same environment configuration as the server for the model,
//! provider keys and messaging credentials.

use anyhow::Result;
use clap::{Parser, Subcommand};
use cyclone_core::{
    AssessmentReport, AssessmentRequest, ContactEndpoint, DeliveryStatus, ObservationInput,
};
use cyclone_server::config::Config;
use cyclone_server::state::build_pipeline;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    mode: Mode,

    /// Primary contact number
    #[arg(long, global = true)]
    primary: Option<String>,

    /// Family contact number
    #[arg(long, global = true)]
    family: Option<String>,

    /// Authorities contact number
    #[arg(long, global = true)]
    authority: Option<String>,

    /// Do not dispatch alerts even if the gate opens
    #[arg(long, global = true)]
    no_alerts: bool,

    /// Print the full report as JSON
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand, Debug)]
enum Mode {
    /// Fetch live weather for a place
    Live {
        #[arg(long, default_value = "Visakhapatnam")]
        place: String,
    },
    /// Simulate a reading
    Manual {
        #[arg(long, default_value_t = 17.7)]
        lat: f64,
        #[arg(long, default_value_t = 83.3)]
        lon: f64,
        #[arg(long, default_value_t = 960.0)]
        pressure: f64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    cyclone_server::init_tracing("cyclone_assess=info")?;
    let args = Args::parse();
    let config = Config::from_env();

    let pipeline = build_pipeline(&config)?;

    let input = match args.mode {
        Mode::Live { place } => ObservationInput::Live { place },
        Mode::Manual { lat, lon, pressure } => ObservationInput::Manual {
            latitude: lat,
            longitude: lon,
            pressure_hpa: pressure,
        },
    };
    let request = AssessmentRequest {
        input,
        alerts_enabled: config.alerts_enabled && !args.no_alerts,
        contacts: ContactEndpoint::from_slots(args.primary, args.family, args.authority),
    };

    let report = pipeline.assess(&request).await?;
    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report);
    }
    Ok(())
}

fn print_report(report: &AssessmentReport) {
    let resolution = &report.resolution;
    let observation = &resolution.observation;
    println!("Location:    {}", resolution.display_name);
    if let Some(warning) = &resolution.warning {
        println!("Warning:     {}", warning);
    }
    println!("Pressure:    {} hPa", observation.pressure_hpa);
    println!(
        "Coordinates: {:.2}N, {:.2}E",
        observation.latitude, observation.longitude
    );

    let level = report.assessment.level;
    println!("Risk:        {} - {}", level.label(), level.description());
    println!("Confidence:  {:.1}%", report.assessment.confidence);

    if report.geofence.inside && level.is_severe() {
        let zone = report.geofence.zone.as_deref().unwrap_or("protected zone");
        println!("EMERGENCY PROTOCOL ACTIVATED: {}", zone);
    }

    for outcome in &report.dispatch.outcomes {
        let tag = match outcome.status {
            DeliveryStatus::Sent => "SENT",
            DeliveryStatus::Simulated => "SIMULATION",
            DeliveryStatus::Failed => "FAILED",
        };
        println!(
            "[{}] {:?} {}: {}",
            tag, outcome.endpoint.role, outcome.endpoint.address, outcome.detail
        );
    }
}
