//! Baremo Map - shipping rate zones rendered over the base vector maps
//!
//! Features:
//! - Picks the iberia, world or europe map for a shipping service
//! - Resolves zone codes from the map markup
//! - Colors every zone by the rate code that applies from an origin
//! - Prints a legend of the rate codes in use, as text or JSON

use baremo_map::api::{query_destinations, ApiError, MapApiClient};
use baremo_map::config::{AppConfig, ConfigError, VERSION};
use baremo_map::map::{load_map, MapError};
use baremo_map::report::{build_report, render_text};
use baremo_map::router::{map_type_for_service, MapType};
use baremo_map::state::SelectionState;
use futures_util::future::join;
use thiserror::Error;
use tracing::{error, info, warn};

#[derive(Debug, Error)]
enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Api(#[from] ApiError),
    #[error(transparent)]
    Map(#[from] MapError),
    #[error("Failed to serialize output: {0}")]
    Json(#[from] serde_json::Error),
}

/// Options taken from the command line
#[derive(Debug, Default, PartialEq, Eq)]
struct CliOptions {
    service: Option<String>,
    origin: Option<String>,
    map_path: Option<String>,
    map_type: Option<MapType>,
    api_base: Option<String>,
    asset_base: Option<String>,
    timeout_secs: Option<u64>,
    list_services: bool,
    json: bool,
}

impl CliOptions {
    fn parse(args: &[String]) -> Result<Self, String> {
        let mut options = Self::default();
        let mut iter = args.iter();

        while let Some(arg) = iter.next() {
            let mut value = || {
                iter.next()
                    .cloned()
                    .ok_or_else(|| format!("Missing value for {}", arg))
            };
            match arg.as_str() {
                "-s" | "--service" => options.service = Some(value()?),
                "-o" | "--origin" => options.origin = Some(value()?),
                "-m" | "--map" => options.map_path = Some(value()?),
                "-t" | "--map-type" => options.map_type = Some(value()?.parse()?),
                "--api-base" => options.api_base = Some(value()?),
                "--asset-base" => options.asset_base = Some(value()?),
                "--timeout" => {
                    let raw = value()?;
                    let secs = raw
                        .parse()
                        .map_err(|_| format!("Invalid timeout: {}", raw))?;
                    options.timeout_secs = Some(secs);
                }
                "--services" => options.list_services = true,
                "--json" => options.json = true,
                other => return Err(format!("Unknown argument: {}", other)),
            }
        }

        Ok(options)
    }

    fn apply(&self, config: &mut AppConfig) {
        if let Some(ref api_base) = self.api_base {
            config.api_base = api_base.clone();
        }
        if let Some(ref asset_base) = self.asset_base {
            config.asset_base = asset_base.clone();
        }
        if let Some(secs) = self.timeout_secs {
            config.request_timeout_secs = secs;
        }
    }
}

#[tokio::main]
async fn main() {
    // Parse command line arguments
    let args: Vec<String> = std::env::args().collect();

    // Handle --version flag
    if args.iter().any(|a| a == "--version" || a == "-v") {
        println!("baremo-map {}", VERSION);
        return;
    }

    // Handle --help flag
    if args.iter().any(|a| a == "--help" || a == "-h") {
        print_help();
        return;
    }

    let options = match CliOptions::parse(&args[1..]) {
        Ok(options) => options,
        Err(message) => {
            eprintln!("{}", message);
            eprintln!("Run 'baremo-map --help' for usage.");
            std::process::exit(2);
        }
    };

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    if let Err(e) = run(options).await {
        error!("{}", e);
        std::process::exit(1);
    }
}

async fn run(options: CliOptions) -> Result<(), RunError> {
    let mut config = AppConfig::load()?;
    options.apply(&mut config);
    info!("Baremo Map v{} using API {}", VERSION, config.api_base);

    let client = MapApiClient::new(config.api_base.clone(), config.timeout());

    if options.list_services {
        return list_services(&client, options.json).await;
    }

    let services = match client.fetch_services().await {
        Ok(services) => services,
        Err(e) => {
            warn!("Failed to load services list: {}", e);
            Vec::new()
        }
    };

    let mut state = SelectionState::new(services);
    state.select_service(options.service.as_deref());
    state.select_origin(options.origin.as_deref(), None);

    let route = state.route();
    let map_type = options.map_type.unwrap_or(state.map_mode());
    let location = options
        .map_path
        .clone()
        .unwrap_or_else(|| config.asset_location(map_type.asset_file()));

    // Map and destinations are independent; fetch both at once
    let ticket = state.begin_summary();
    let summary = async {
        match ticket {
            Some(ref ticket) => Some(query_destinations(&client, &ticket.origin, &ticket.service, &ticket.token).await),
            None => None,
        }
    };
    let (map, summary) = join(load_map(&location, map_type, config.timeout()), summary).await;

    if let (Some(ticket), Some(result)) = (ticket.as_ref(), summary) {
        state.apply_summary(ticket, result);
    }
    let map = map?;

    let report = build_report(&state, &map, route.rule.name);
    if options.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", render_text(&report));
    }

    if let Some(message) = state.summary_error() {
        warn!("Destinations unavailable: {}", message);
    }
    Ok(())
}

async fn list_services(client: &MapApiClient, json: bool) -> Result<(), RunError> {
    let services = client.fetch_services().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&services)?);
        return Ok(());
    }

    for service in &services {
        let route = map_type_for_service(Some(service));
        println!("{:<8} {:<8} {}", service.code, route.map_type.as_str(), service.name);
    }
    Ok(())
}

fn print_help() {
    println!("baremo-map {}", VERSION);
    println!();
    println!("Colors logistics zones on the base maps by shipping rate code.");
    println!();
    println!("USAGE:");
    println!("    baremo-map [OPTIONS]");
    println!();
    println!("OPTIONS:");
    println!("    -s, --service CODE     Shipping service code");
    println!("    -o, --origin CODE      Origin zone code");
    println!("    -m, --map PATH         Load the base map from a local file or URL");
    println!("    -t, --map-type TYPE    Force the base map: iberia, world or europe");
    println!("        --api-base URL     Map API base URL");
    println!("        --asset-base URL   Base URL of the map assets");
    println!("        --timeout SECS     Request timeout in seconds");
    println!("        --services         List available services");
    println!("        --json             Print JSON instead of text");
    println!("    -h, --help             Show this help message");
    println!("    -v, --version          Show version");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_options() {
        let options = CliOptions::parse(&args(&["-s", "CIY", "--origin", "mad", "--json", "--timeout", "3"])).unwrap();
        assert_eq!(options.service.as_deref(), Some("CIY"));
        assert_eq!(options.origin.as_deref(), Some("mad"));
        assert_eq!(options.timeout_secs, Some(3));
        assert!(options.json);
        assert!(!options.list_services);
    }

    #[test]
    fn test_parse_map_type() {
        let options = CliOptions::parse(&args(&["--map-type", "Europe", "-m", "map.svg"])).unwrap();
        assert_eq!(options.map_type, Some(MapType::Europe));
        assert_eq!(options.map_path.as_deref(), Some("map.svg"));
        assert_eq!(CliOptions::parse(&args(&["-t", "world"])).unwrap().map_type, Some(MapType::World));
        assert!(CliOptions::parse(&args(&["--map-type", "mars"])).is_err());
    }

    #[test]
    fn test_parse_errors() {
        assert!(CliOptions::parse(&args(&["--service"])).is_err());
        assert!(CliOptions::parse(&args(&["--bogus"])).is_err());
        assert!(CliOptions::parse(&args(&["--timeout", "soon"])).is_err());
    }

    #[test]
    fn test_cli_overrides_config() {
        let options = CliOptions::parse(&args(&["--api-base", "http://api/map", "--timeout", "4"])).unwrap();
        let mut config = AppConfig::default();
        options.apply(&mut config);
        assert_eq!(config.api_base, "http://api/map");
        assert_eq!(config.request_timeout_secs, 4);
        assert_eq!(config.asset_base, AppConfig::default().asset_base);
    }
}
