use lamantin::{BundlingStrategy, RoutingDirection, RoutingOptions, RoutingReport, Severity};
use lamantin_lgraph::{GraphDocument, LGraph, Point};
use serde::{Deserialize, Serialize};
use std::io::Read;
use std::str::FromStr;
use tracing_subscriber::EnvFilter;

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Graph(lamantin_lgraph::Error),
    Routing(lamantin::Error),
    Json(serde_json::Error),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Graph(err) => write!(f, "invalid graph: {err}"),
            CliError::Routing(err) => write!(f, "routing failed: {err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<lamantin_lgraph::Error> for CliError {
    fn from(value: lamantin_lgraph::Error) -> Self {
        Self::Graph(value)
    }
}

impl From<lamantin::Error> for CliError {
    fn from(value: lamantin::Error) -> Self {
        Self::Routing(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

#[derive(Debug, Clone, Copy)]
struct DirectionArg(RoutingDirection);

impl FromStr for DirectionArg {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "wte" | "west-to-east" | "right" => Ok(Self(RoutingDirection::WestToEast)),
            "nts" | "north-to-south" | "down" => Ok(Self(RoutingDirection::NorthToSouth)),
            "stn" | "south-to-north" | "up" => Ok(Self(RoutingDirection::SouthToNorth)),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct BundlingArg(BundlingStrategy);

impl FromStr for BundlingArg {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" | "off" => Ok(Self(BundlingStrategy::None)),
            "manual" => Ok(Self(BundlingStrategy::Manual)),
            "automatic" | "auto" => Ok(Self(BundlingStrategy::Automatic)),
            _ => Err(()),
        }
    }
}

#[derive(Debug, Default)]
struct Args {
    input: Option<String>,
    pretty: bool,
    seed: Option<u64>,
    direction: Option<RoutingDirection>,
    bundling: Option<BundlingStrategy>,
    out: Option<String>,
}

/// A graph document with an optional `options` object next to `layers` and `edges`.
#[derive(Debug, Deserialize)]
struct Input {
    #[serde(flatten)]
    graph: GraphDocument,
    #[serde(default)]
    options: RoutingOptions,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct EdgeOut<'a> {
    id: &'a str,
    bend_points: &'a [Point],
    junction_points: &'a [Point],
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct IssueOut<'a> {
    severity: Severity,
    message: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    edge: Option<&'a str>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RouteOut<'a> {
    edges: Vec<EdgeOut<'a>>,
    slots_per_boundary: &'a [usize],
    issues: Vec<IssueOut<'a>>,
}

impl<'a> RouteOut<'a> {
    fn new(g: &'a LGraph, report: &'a RoutingReport) -> Self {
        let edges = g
            .edge_ids()
            .map(|id| {
                let e = g.edge(id);
                EdgeOut {
                    id: &e.name,
                    bend_points: &e.bend_points,
                    junction_points: &e.junction_points,
                }
            })
            .collect();
        let issues = report
            .issues
            .iter()
            .map(|issue| IssueOut {
                severity: issue.severity,
                message: &issue.message,
                edge: issue.edge.map(|id| g.edge(id).name.as_str()),
            })
            .collect();
        Self {
            edges,
            slots_per_boundary: &report.slots_per_boundary,
            issues,
        }
    }
}

fn usage() -> &'static str {
    "lamantin\n\
\n\
USAGE:\n\
  lamantin [route] [--pretty] [--seed <n>] [--direction wte|nts|stn] [--bundling none|manual|automatic] [--out <path>] [<path>|-]\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - Input is a graph document (layers, edges) with an optional \"options\" object.\n\
  - Flags override the document's options.\n\
  - Set RUST_LOG (e.g. RUST_LOG=lamantin=debug) to log routing progress to stderr.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "route" => {}
            "--pretty" => args.pretty = true,
            "--seed" => {
                let Some(seed) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.seed = Some(seed.parse::<u64>().map_err(|_| CliError::Usage(usage()))?);
            }
            "--direction" => {
                let Some(dir) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                let DirectionArg(dir) = dir.parse().map_err(|_| CliError::Usage(usage()))?;
                args.direction = Some(dir);
            }
            "--bundling" => {
                let Some(strategy) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                let BundlingArg(strategy) =
                    strategy.parse().map_err(|_| CliError::Usage(usage()))?;
                args.bundling = Some(strategy);
            }
            "--out" => {
                let Some(out) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out = Some(out.clone());
            }
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            "-" => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some("-".to_string());
            }
            other if other.starts_with('-') => return Err(CliError::Usage(usage())),
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

fn write_json(value: &impl Serialize, pretty: bool, out: Option<&str>) -> Result<(), CliError> {
    let text = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    match out {
        None => println!("{text}"),
        Some(path) => std::fs::write(path, text)?,
    }
    Ok(())
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    // A second install only happens in embedding tests; the first subscriber stays.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn run(args: Args) -> Result<(), CliError> {
    let text = read_input(args.input.as_deref())?;
    let Input { graph, mut options } = serde_json::from_str(&text)?;
    if let Some(seed) = args.seed {
        options.random_seed = seed;
    }
    if let Some(direction) = args.direction {
        options.direction = direction;
    }
    if let Some(strategy) = args.bundling {
        options.bundling.strategy = strategy;
    }

    let mut g = graph.build()?;
    tracing::debug!(
        layers = g.layer_count(),
        nodes = g.node_count(),
        edges = g.edge_count(),
        "graph loaded"
    );
    let report = lamantin::route_graph(&mut g, &options)?;

    write_json(&RouteOut::new(&g, &report), args.pretty, args.out.as_deref())
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    init_logging();

    if let Err(err) = run(args) {
        eprintln!("{err}");
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(list: &[&str]) -> Vec<String> {
        std::iter::once("lamantin")
            .chain(list.iter().copied())
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn flags_override_defaults() {
        let args = parse_args(&argv(&[
            "route",
            "--seed",
            "9",
            "--direction",
            "nts",
            "--bundling",
            "auto",
            "g.json",
        ]))
        .unwrap();
        assert_eq!(args.seed, Some(9));
        assert_eq!(args.direction, Some(RoutingDirection::NorthToSouth));
        assert_eq!(args.bundling, Some(BundlingStrategy::Automatic));
        assert_eq!(args.input.as_deref(), Some("g.json"));
    }

    #[test]
    fn unknown_values_are_usage_errors() {
        for bad in [
            &["--direction", "diagonal"][..],
            &["--seed"][..],
            &["--frobnicate"][..],
            &["a.json", "b.json"][..],
        ] {
            assert!(matches!(
                parse_args(&argv(bad)),
                Err(CliError::Usage(_))
            ));
        }
    }

    #[test]
    fn options_object_is_optional() {
        let input: Input = serde_json::from_str(r#"{"layers": []}"#).unwrap();
        assert_eq!(input.options, RoutingOptions::default());
        assert!(input.graph.edges.is_empty());

        let input: Input = serde_json::from_str(
            r#"{"layers": [], "options": {"edgeEdgeSpacing": 4, "bundling": {"strategy": "manual"}}}"#,
        )
        .unwrap();
        assert_eq!(input.options.edge_edge_spacing, 4.0);
        assert_eq!(input.options.bundling.strategy, BundlingStrategy::Manual);
        assert_eq!(input.options.bundling.bundle_spacing, 5.0);
    }
}
