use std::fmt::Display;
use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use clap::{Args, Parser, Subcommand};
use kaala_config::KaalaConfig;
use kaala_dasha::dasha::{
    ActivePeriodLocator, BirthInputs, DashaReport, DashaSystem, PeriodRecord, SystemReport,
    TimelineBuilder,
};
use kaala_dasha::util::local_to_utc;
use kaala_dasha::{NakshatraPosition, Rashi};
use kaala_search::{
    ALL_ASPECTS, Aspect, Body, MeanMotionEphemeris, NatalPoint, SolarReturnMethod,
    find_ingresses, find_transit_aspects, moon_longitude_at, solar_return_for_year,
};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "kaala", about = "Dasha timelines and angular event search")]
struct Cli {
    /// TOML configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Print JSON instead of text
    #[arg(long, global = true)]
    json: bool,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct BirthArgs {
    /// Birth time: RFC 3339 (1990-06-15T04:30:00Z) or local YYYY-MM-DDThh:mm:ss with --tz
    #[arg(long)]
    birth: String,
    /// UTC offset in hours applied to local times
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    tz: f64,
    /// Moon sidereal longitude in degrees; read from the ephemeris when omitted
    #[arg(long, allow_hyphen_values = true)]
    moon: Option<f64>,
    /// Birth nakshatra name, overriding the one derived from the Moon
    #[arg(long)]
    nakshatra: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Nakshatra, pada and rashi from sidereal longitude
    Nakshatra {
        /// Sidereal ecliptic longitude in degrees
        #[arg(allow_hyphen_values = true)]
        lon: f64,
    },
    /// Active periods of one dasha system
    Dasha {
        #[command(flatten)]
        birth: BirthArgs,
        /// Vimshottari, Yogini, Ashtottari or Kalachakra
        #[arg(long, default_value = "Vimshottari")]
        system: String,
        /// Query time (default: now)
        #[arg(long)]
        query: Option<String>,
        /// Deepest level to report (0-4)
        #[arg(long)]
        depth: Option<u8>,
    },
    /// Report across dasha systems
    Report {
        #[command(flatten)]
        birth: BirthArgs,
        /// Comma-separated systems (default: [dasha] systems from config)
        #[arg(long, value_delimiter = ',')]
        systems: Vec<String>,
        /// Query time (default: now)
        #[arg(long)]
        query: Option<String>,
    },
    /// Solar return (varshaphal) instant for a year
    SolarReturn {
        /// Birth time: RFC 3339 or local YYYY-MM-DDThh:mm:ss with --tz
        #[arg(long)]
        birth: String,
        /// UTC offset in hours applied to local times
        #[arg(long, default_value = "0", allow_hyphen_values = true)]
        tz: f64,
        /// Calendar year of the return
        #[arg(long)]
        year: i32,
        /// grid or bisection (default from config)
        #[arg(long)]
        method: Option<String>,
    },
    /// Exact aspects from moving bodies to natal points
    Transits {
        /// Window start (RFC 3339)
        #[arg(long)]
        start: String,
        /// Window end (RFC 3339)
        #[arg(long)]
        end: String,
        /// Comma-separated moving bodies
        #[arg(long, value_delimiter = ',', default_value = "Moon")]
        movers: Vec<String>,
        /// Natal point as NAME=LON, repeatable
        #[arg(long = "point", required = true)]
        points: Vec<String>,
        /// Comma-separated aspects (default: all five)
        #[arg(long, value_delimiter = ',')]
        aspects: Vec<String>,
        /// Orb in degrees (default from config)
        #[arg(long)]
        orb: Option<f64>,
    },
    /// Sign ingresses of moving bodies
    Ingresses {
        /// Window start (RFC 3339)
        #[arg(long)]
        start: String,
        /// Window end (RFC 3339)
        #[arg(long)]
        end: String,
        /// Comma-separated moving bodies
        #[arg(long, value_delimiter = ',', default_value = "Sun")]
        movers: Vec<String>,
    },
}

#[derive(Serialize)]
struct NakshatraOutput {
    longitude: f64,
    nakshatra: &'static str,
    nakshatra_index: u8,
    pada: u8,
    nakshatra_fraction: f64,
    rashi: &'static str,
    rashi_western: &'static str,
    degrees_in_rashi: f64,
}

fn exit_on_err<T, E: Display>(result: Result<T, E>, context: &str) -> T {
    result.unwrap_or_else(|e| {
        eprintln!("{context}: {e}");
        std::process::exit(1);
    })
}

fn print_json<T: Serialize>(value: &T) {
    let text = exit_on_err(serde_json::to_string_pretty(value), "JSON encoding failed");
    println!("{text}");
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_target(false)
        .init();
}

/// Parse RFC 3339, or a naive date/time interpreted at `tz_hours` from UTC.
fn parse_instant(s: &str, tz_hours: f64) -> Result<DateTime<Utc>, String> {
    let s = s.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S")
        .or_else(|_| NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S"))
        .or_else(|_| NaiveDate::parse_from_str(s, "%Y-%m-%d").map(|d| d.and_time(NaiveTime::MIN)))
        .map_err(|_| format!("expected YYYY-MM-DDThh:mm:ss[Z|+hh:mm], got {s}"))?;
    local_to_utc(naive, tz_hours).map_err(|e| format!("{e} (tz {tz_hours}, time {s})"))
}

fn parse_point(s: &str) -> Result<NatalPoint, String> {
    let (name, lon) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=LON, got {s}"))?;
    let lon: f64 = lon
        .trim()
        .parse()
        .map_err(|e| format!("bad longitude in {s}: {e}"))?;
    if name.trim().is_empty() {
        return Err(format!("missing point name in {s}"));
    }
    Ok(NatalPoint::new(name.trim(), lon))
}

fn parse_bodies(names: &[String]) -> Vec<Body> {
    names
        .iter()
        .map(|n| exit_on_err(n.parse::<Body>(), "Invalid body"))
        .collect()
}

fn parse_method(s: &str) -> Result<SolarReturnMethod, String> {
    match s.trim().to_ascii_lowercase().as_str() {
        "grid" => Ok(SolarReturnMethod::Grid),
        "bisection" => Ok(SolarReturnMethod::Bisection),
        other => Err(format!("unknown method {other}; expected grid or bisection")),
    }
}

fn query_or_now(query: Option<&str>) -> DateTime<Utc> {
    match query {
        Some(q) => exit_on_err(parse_instant(q, 0.0), "Invalid --query"),
        None => Utc::now(),
    }
}

fn birth_inputs(args: &BirthArgs, eph: &MeanMotionEphemeris) -> BirthInputs {
    let birth = exit_on_err(parse_instant(&args.birth, args.tz), "Invalid --birth");
    let moon = match args.moon {
        Some(lon) => lon,
        None => exit_on_err(moon_longitude_at(eph, birth), "Ephemeris error"),
    };
    debug!(%birth, moon, "birth inputs");
    let inputs = BirthInputs::new(birth, moon);
    match &args.nakshatra {
        Some(name) => inputs.with_nakshatra_name(name.clone()),
        None => inputs,
    }
}

fn print_records(records: &[PeriodRecord]) {
    for (depth, r) in records.iter().enumerate() {
        let indent = "  ".repeat(depth);
        let lord = r.lord.as_deref().map(|l| format!(" [{l}]")).unwrap_or_default();
        println!(
            "{indent}{:<16} {}{lord}  {} -> {}",
            r.level,
            r.label,
            r.start.format("%Y-%m-%d %H:%M"),
            r.end.format("%Y-%m-%d %H:%M")
        );
    }
}

fn print_system_report(name: &str, report: &SystemReport) {
    match report {
        SystemReport::Computed {
            active,
            within_horizon,
            kalachakra,
            ..
        } => {
            let note = if *within_horizon { "" } else { " (outside horizon, clamped)" };
            println!("{name}{note}");
            if let Some(meta) = kalachakra {
                println!(
                    "  group {} ({}), paramayu {} years, deha {}, jeeva {}",
                    meta.group, meta.direction, meta.paramayu, meta.deha, meta.jeeva
                );
            }
            print_records(active);
        }
        SystemReport::NotApplicable { reason } => println!("{name}: not applicable ({reason})"),
        SystemReport::UnsupportedMapping { input } => {
            println!("{name}: unsupported nakshatra mapping ({input})")
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let mut config =
        exit_on_err(KaalaConfig::load(cli.config.as_deref()), "Failed to load config");
    let eph = MeanMotionEphemeris::new(config.ephemeris);

    match cli.command {
        Commands::Nakshatra { lon } => {
            let pos = exit_on_err(NakshatraPosition::from_longitude(lon), "Invalid longitude");
            let rashi = Rashi::from_longitude(pos.longitude);
            let out = NakshatraOutput {
                longitude: pos.longitude,
                nakshatra: pos.nakshatra.name(),
                nakshatra_index: pos.nakshatra_index(),
                pada: pos.pada,
                nakshatra_fraction: pos.nakshatra_fraction,
                rashi: rashi.name(),
                rashi_western: rashi.western_name(),
                degrees_in_rashi: pos.longitude - rashi.start_longitude(),
            };
            if cli.json {
                print_json(&out);
            } else {
                println!(
                    "{} pada {} ({:.2}% traversed), {} ({}) {:.4} deg",
                    out.nakshatra,
                    out.pada,
                    out.nakshatra_fraction * 100.0,
                    out.rashi,
                    out.rashi_western,
                    out.degrees_in_rashi
                );
            }
        }
        Commands::Dasha {
            birth,
            system,
            query,
            depth,
        } => {
            if let Some(d) = depth {
                config.timeline.depth = d;
                exit_on_err(config.validate(), "Invalid --depth");
            }
            let inputs = birth_inputs(&birth, &eph);
            let system = exit_on_err(DashaSystem::from_name(&system), "Invalid --system");
            let query = query_or_now(query.as_deref());
            let outcome = exit_on_err(
                TimelineBuilder::new(system, config.timeline).build(&inputs),
                "Error",
            );
            if cli.json {
                let report = exit_on_err(
                    SystemReport::from_outcome(&outcome, query, config.timeline.depth),
                    "Error",
                );
                print_json(&report);
                return;
            }
            match outcome.tree() {
                Some(tree) => {
                    let snapshot = exit_on_err(
                        ActivePeriodLocator::new(tree).snapshot(query, config.timeline.depth),
                        "Error",
                    );
                    println!(
                        "{} dasha at {} (Moon {:.4} deg, {} pada {})\n",
                        system.name(),
                        query.format("%Y-%m-%d %H:%M:%S UTC"),
                        tree.position().longitude,
                        tree.position().nakshatra.name(),
                        tree.position().pada
                    );
                    if !snapshot.within_horizon {
                        println!(
                            "(query outside the {}-year horizon; clamped)",
                            config.timeline.horizon_years
                        );
                    }
                    let records: Vec<PeriodRecord> =
                        snapshot.periods.iter().map(PeriodRecord::from).collect();
                    print_records(&records);
                }
                None => {
                    let report = exit_on_err(
                        SystemReport::from_outcome(&outcome, query, config.timeline.depth),
                        "Error",
                    );
                    print_system_report(system.name(), &report);
                }
            }
        }
        Commands::Report {
            birth,
            systems,
            query,
        } => {
            let inputs = birth_inputs(&birth, &eph);
            let systems: Vec<DashaSystem> = if systems.is_empty() {
                exit_on_err(config.dasha.resolve(), "Invalid config")
            } else {
                systems
                    .iter()
                    .map(|s| exit_on_err(DashaSystem::from_name(s), "Invalid --systems"))
                    .collect()
            };
            let query = query_or_now(query.as_deref());
            let report = exit_on_err(
                DashaReport::for_birth(&inputs, &systems, query, &config.timeline),
                "Error",
            );
            if cli.json {
                print_json(&report);
            } else {
                println!(
                    "Dasha report at {} (Moon {:.4} deg, {} pada {})\n",
                    report.query.format("%Y-%m-%d %H:%M:%S UTC"),
                    report.moon_longitude,
                    report.nakshatra,
                    report.pada
                );
                for (name, system_report) in &report.systems {
                    print_system_report(name, system_report);
                    println!();
                }
            }
        }
        Commands::SolarReturn {
            birth,
            tz,
            year,
            method,
        } => {
            let birth = exit_on_err(parse_instant(&birth, tz), "Invalid --birth");
            if let Some(m) = method {
                config.solar_return.method = exit_on_err(parse_method(&m), "Invalid --method");
            }
            let sr = exit_on_err(
                solar_return_for_year(&eph, birth, year, &config.solar_return),
                "Error",
            );
            if cli.json {
                print_json(&sr);
            } else {
                println!(
                    "Solar return {year}: {} (Sun {:.6} deg, residual {:.2e} deg, {:?})",
                    sr.instant.format("%Y-%m-%d %H:%M:%S UTC"),
                    sr.sun_longitude,
                    sr.residual_deg,
                    sr.method
                );
            }
        }
        Commands::Transits {
            start,
            end,
            movers,
            points,
            aspects,
            orb,
        } => {
            let start = exit_on_err(parse_instant(&start, 0.0), "Invalid --start");
            let end = exit_on_err(parse_instant(&end, 0.0), "Invalid --end");
            let movers = parse_bodies(&movers);
            let points: Vec<NatalPoint> = points
                .iter()
                .map(|p| exit_on_err(parse_point(p), "Invalid --point"))
                .collect();
            let aspects: Vec<Aspect> = if aspects.is_empty() {
                ALL_ASPECTS.to_vec()
            } else {
                aspects
                    .iter()
                    .map(|a| exit_on_err(a.parse::<Aspect>(), "Invalid --aspects"))
                    .collect()
            };
            if let Some(orb) = orb {
                config.transits.orb_deg = orb;
            }
            let events = exit_on_err(
                find_transit_aspects(
                    &eph,
                    &points,
                    &movers,
                    &aspects,
                    start,
                    end,
                    &config.transits,
                ),
                "Error",
            );
            if cli.json {
                print_json(&events);
            } else {
                for ev in &events {
                    println!(
                        "{}  {} {} {} ({:.0} deg, residual {:.1e})",
                        ev.instant.format("%Y-%m-%d %H:%M:%S"),
                        ev.mover,
                        ev.aspect,
                        ev.target,
                        ev.separation_deg,
                        ev.residual_deg
                    );
                }
                println!("{} event(s)", events.len());
            }
        }
        Commands::Ingresses { start, end, movers } => {
            let start = exit_on_err(parse_instant(&start, 0.0), "Invalid --start");
            let end = exit_on_err(parse_instant(&end, 0.0), "Invalid --end");
            let movers = parse_bodies(&movers);
            let events = exit_on_err(
                find_ingresses(&eph, &movers, start, end, &config.ingresses),
                "Error",
            );
            if cli.json {
                print_json(&events);
            } else {
                for ev in &events {
                    let rx = if ev.retrograde { " (retrograde)" } else { "" };
                    println!(
                        "{}  {} enters {} from {}{rx}",
                        ev.instant.format("%Y-%m-%d %H:%M:%S"),
                        ev.body,
                        ev.sign,
                        ev.from_sign
                    );
                }
                println!("{} event(s)", events.len());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_rfc3339_and_local_times() {
        let utc = parse_instant("1990-06-15T04:30:00Z", 0.0).unwrap();
        assert_eq!(utc, Utc.with_ymd_and_hms(1990, 6, 15, 4, 30, 0).unwrap());
        let offset = parse_instant("1990-06-15T10:00:00+05:30", 0.0).unwrap();
        assert_eq!(offset, utc);
        let local = parse_instant("1990-06-15T10:00:00", 5.5).unwrap();
        assert_eq!(local, utc);
        let date_only = parse_instant("1990-06-15", 0.0).unwrap();
        assert_eq!(date_only, Utc.with_ymd_and_hms(1990, 6, 15, 0, 0, 0).unwrap());
        assert!(parse_instant("15/06/1990", 0.0).is_err());
        assert!(parse_instant("1990-06-15T10:00:00", 30.0).is_err());
    }

    #[test]
    fn parses_points() {
        let p = parse_point("Sun=280.5").unwrap();
        assert_eq!(p.name, "Sun");
        assert!((p.longitude - 280.5).abs() < 1e-12);
        assert!(parse_point("Sun").is_err());
        assert!(parse_point("=10").is_err());
        assert!(parse_point("Sun=abc").is_err());
    }

    #[test]
    fn parses_methods() {
        assert_eq!(parse_method("Grid").unwrap(), SolarReturnMethod::Grid);
        assert_eq!(parse_method("bisection").unwrap(), SolarReturnMethod::Bisection);
        assert!(parse_method("newton").is_err());
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "kaala",
            "transits",
            "--start",
            "2024-01-01T00:00:00Z",
            "--end",
            "2024-02-01T00:00:00Z",
            "--movers",
            "Moon,Mars",
            "--point",
            "Sun=10",
            "--point",
            "Moon=200",
            "--json",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Commands::Transits { movers, points, .. } => {
                assert_eq!(movers, vec!["Moon", "Mars"]);
                assert_eq!(points.len(), 2);
            }
            _ => panic!("expected transits"),
        }
    }

    #[test]
    fn negative_longitude_accepted() {
        let cli = Cli::try_parse_from(["kaala", "nakshatra", "-10.5"]).unwrap();
        assert!(matches!(cli.command, Commands::Nakshatra { lon } if (lon + 10.5).abs() < 1e-12));
    }
}
