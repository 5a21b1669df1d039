//! Fieldtrack - location integrity checks for onsite service visits

mod analysis;
mod config;
mod geocoding;
mod output;
mod storage;
mod visit;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use geocoding::ReverseGeocoder;
use location_validator::{LocationSample, LocationSource, LocationValidator, RawSample};
use std::path::PathBuf;
use tracing::{info, warn};
use visit::{VisitEvent, VisitOutcome, VisitRecorder, VisitRequest};

#[derive(Parser, Debug)]
#[command(name = "fieldtrack")]
#[command(version)]
#[command(about = "Location integrity checks for onsite service visits", long_about = None)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "fieldtrack.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Validate a sample without logging it
    Check {
        #[command(flatten)]
        location: LocationArgs,

        /// Raw sample as JSON, instead of the coordinate flags
        #[arg(long, conflicts_with_all = ["latitude", "longitude"])]
        sample: Option<String>,

        /// Compare against this technician's last logged location
        #[arg(long)]
        user: Option<String>,

        /// Look up the street address as well
        #[arg(long)]
        geocode: bool,

        /// Print the assessment as JSON
        #[arg(long)]
        json: bool,
    },

    /// Log a visit event for a ticket
    Visit {
        #[arg(long)]
        ticket: String,

        #[arg(long)]
        user: String,

        /// started, reached, ended or reached-back
        #[arg(long)]
        event: VisitEvent,

        #[command(flatten)]
        location: LocationArgs,
    },

    /// Show the visit log of a ticket
    History {
        #[arg(long)]
        ticket: String,
    },

    /// Show audited rejections and jumps
    Audit {
        #[command(flatten)]
        range: RangeArgs,
    },

    /// Export visit logs as CSV
    Export {
        #[command(flatten)]
        range: RangeArgs,

        /// Output file (defaults to a timestamped file in the export directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct LocationArgs {
    #[arg(long = "lat", allow_negative_numbers = true)]
    latitude: Option<f64>,

    #[arg(long = "lon", allow_negative_numbers = true)]
    longitude: Option<f64>,

    /// Accuracy radius in meters
    #[arg(long)]
    accuracy: Option<f64>,

    /// Device timestamp in epoch milliseconds (defaults to now)
    #[arg(long)]
    timestamp: Option<i64>,

    /// gps, network, fused or manual
    #[arg(long)]
    source: Option<LocationSource>,
}

impl LocationArgs {
    fn to_raw(&self) -> RawSample {
        RawSample {
            latitude: self.latitude,
            longitude: self.longitude,
            accuracy: self.accuracy,
            timestamp: Some(self.timestamp.unwrap_or_else(|| chrono::Utc::now().timestamp_millis())),
            source: self.source,
        }
    }
}

#[derive(Args, Debug)]
struct RangeArgs {
    /// Time range: --last 24h, 7d, etc.
    #[arg(long)]
    last: Option<String>,

    /// Start time for range: YYYY-MM-DD HH:MM
    #[arg(long)]
    start: Option<String>,

    /// End time for range: YYYY-MM-DD HH:MM
    #[arg(long)]
    end: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = config::Config::load(&cli.config)?;

    // Initialize tracing; RUST_LOG takes precedence over the configured level
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.logging.level)),
        )
        .init();

    info!("Fieldtrack v{}", env!("CARGO_PKG_VERSION"));
    info!("Loaded configuration from {:?}", cli.config);

    let db = storage::Database::new(&config.general.database_path)?;
    db.initialize()?;

    let validator = LocationValidator::new(config.validation.clone())
        .context("Invalid validation policy")?;

    match cli.command {
        Command::Check { location, sample, user, geocode, json } => {
            let raw: RawSample = match sample {
                Some(s) => serde_json::from_str(&s).context("Failed to parse --sample JSON")?,
                None => location.to_raw(),
            };
            run_check(&config, &db, &validator, &raw, user.as_deref(), geocode, json).await
        }
        Command::Visit { ticket, user, event, location } => {
            let recorder = VisitRecorder::new(
                db,
                geocoding::Geocoder::from_config(&config.geocoding)?,
                validator,
                analysis::Auditor::new(config.audit.clone()),
                config.visits.reject_unrealistic_jumps,
            );
            run_visit(&recorder, ticket, user, event, &location).await
        }
        Command::History { ticket } => {
            let visits = db.visits_for_ticket(&ticket)?;
            info!("Found {} visit logs for ticket {}", visits.len(), ticket);
            for v in &visits {
                output::print_visit(v);
            }
            Ok(())
        }
        Command::Audit { range } => {
            let (start, end) = parse_time_range(&range)?;
            let events = db.query_events(start, end)?;
            info!("Found {} audit events", events.len());
            for e in &events {
                output::print_audit_event(e);
            }
            Ok(())
        }
        Command::Export { range, output } => run_export(&config, &db, &range, output),
    }
}

async fn run_check(
    config: &config::Config,
    db: &storage::Database,
    validator: &LocationValidator,
    raw: &RawSample,
    user: Option<&str>,
    geocode: bool,
    json: bool,
) -> Result<()> {
    let now = chrono::Utc::now();
    let checked = validator.check_raw(raw, now);

    let assessment = match &checked.sample {
        Some(sample) => {
            let previous = match user {
                Some(u) => db.last_location(u)?,
                None => None,
            };
            validator.assess(sample, previous.as_ref(), now)
        }
        None => location_validator::LocationAssessment {
            validation: checked.result.clone(),
            quality: None,
            jump: None,
        },
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&assessment)?);
    } else {
        output::print_assessment(&assessment);
    }

    // The verdict above stands whatever happens to the address lookup
    if let (true, Some(sample)) = (geocode, &checked.sample) {
        let geocoder = geocoding::Geocoder::from_config(&config.geocoding)?;
        match geocoder.reverse_geocode(sample.latitude, sample.longitude).await {
            Ok(result) if json => println!("{}", serde_json::to_string_pretty(&result)?),
            Ok(result) => output::print_geocode(&result),
            Err(e) => {
                warn!("Reverse geocoding failed: {}", e);
                return Err(e).context("Location validated, but the address lookup failed");
            }
        }
    }

    Ok(())
}

async fn run_visit<G: ReverseGeocoder>(
    recorder: &VisitRecorder<G>,
    ticket_id: String,
    user_id: String,
    event: VisitEvent,
    location: &LocationArgs,
) -> Result<()> {
    let raw = location.to_raw();
    let sample = LocationSample {
        latitude: raw.latitude.context("--lat is required")?,
        longitude: raw.longitude.context("--lon is required")?,
        accuracy: raw.accuracy,
        timestamp: raw.timestamp.unwrap_or_default(),
        source: raw.source.unwrap_or_default(),
    };

    let request = VisitRequest {
        ticket_id,
        user_id,
        event,
        sample,
    };

    match recorder.record(request, chrono::Utc::now()).await? {
        VisitOutcome::Recorded { visit, assessment, warnings } => {
            output::print_assessment(&assessment);
            for w in &warnings {
                warn!("{}", w);
            }
            output::print_visit(&visit);
            Ok(())
        }
        VisitOutcome::Rejected { assessment, reason } => {
            output::print_assessment(&assessment);
            anyhow::bail!("Visit rejected: {}", reason)
        }
    }
}

fn run_export(
    config: &config::Config,
    db: &storage::Database,
    range: &RangeArgs,
    output_path: Option<PathBuf>,
) -> Result<()> {
    info!("Running export...");

    let (start, end) = parse_time_range(range)?;
    let visits = db.query_range(start, end)?;

    info!("Found {} visit logs", visits.len());

    let output_path = output_path.unwrap_or_else(|| {
        PathBuf::from(&config.export.export_directory).join(format!(
            "fieldtrack_visits_{}.csv",
            chrono::Local::now().format("%Y%m%d_%H%M%S")
        ))
    });

    output::export_csv(&visits, &output_path)?;

    info!("Exported to {:?}", output_path);

    Ok(())
}

fn parse_time_range(range: &RangeArgs) -> Result<(i64, i64)> {
    if let Some(last) = &range.last {
        // Parse --last 24h, 7d, etc.
        let duration = parse_duration(last)?;
        let end = chrono::Utc::now().timestamp();
        let start = end - duration.num_seconds();
        Ok((start, end))
    } else if let (Some(start_str), Some(end_str)) = (&range.start, &range.end) {
        let start = chrono::NaiveDateTime::parse_from_str(start_str, "%Y-%m-%d %H:%M")?
            .and_utc()
            .timestamp();
        let end = chrono::NaiveDateTime::parse_from_str(end_str, "%Y-%m-%d %H:%M")?
            .and_utc()
            .timestamp();
        Ok((start, end))
    } else {
        // Default: last 24 hours
        let end = chrono::Utc::now().timestamp();
        let start = end - 24 * 3600;
        Ok((start, end))
    }
}

fn parse_duration(s: &str) -> Result<chrono::Duration> {
    let s = s.trim();
    let Some(unit) = s.chars().last() else {
        anyhow::bail!("Invalid duration format. Use: 24h, 7d, 30m, etc.")
    };
    let value: i64 = s[..s.len() - unit.len_utf8()].parse()
        .with_context(|| format!("Invalid duration: {s}"))?;

    match unit {
        'm' => Ok(chrono::Duration::minutes(value)),
        'h' => Ok(chrono::Duration::hours(value)),
        'd' => Ok(chrono::Duration::days(value)),
        _ => anyhow::bail!("Invalid duration format. Use: 24h, 7d, 30m, etc."),
    }
}
