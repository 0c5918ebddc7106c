use anyhow::{Context, Result};
use serde::Serialize;

use pn_cover::analysis::boundness::{BehaviourReport, BoundnessAnalyzer};
use pn_cover::analysis::reachability::{ExplorationGraph, StateGraph};
use pn_cover::analysis::simulation::{SimulationTrace, Simulator};
use pn_cover::config::ExploreConfig;
use pn_cover::models;
use pn_cover::net::{self, Net};
use pn_cover::options::{NetSource, Options, OutputFormat};

#[derive(Serialize)]
struct JsonOutput<'a> {
    graph: ExplorationGraph,
    report: &'a BehaviourReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    simulation: Option<&'a SimulationTrace>,
}

fn main() {
    if std::env::var("PN_LOG").is_ok() {
        let e = env_logger::Env::new()
            .filter("PN_LOG")
            .write_style("PN_LOG_STYLE");
        env_logger::init_from_env(e);
    }

    let args = std::env::args().skip(1).collect::<Vec<_>>();
    let options = Options::parse_from_args(&args).unwrap_or_else(|err| err.exit());
    log::debug!("PN options: {:?}", options);

    if let Err(err) = run(&options) {
        eprintln!("error: {:?}", err);
        std::process::exit(1);
    }
}

fn load_net(source: &NetSource) -> Result<Net> {
    match source {
        NetSource::File(path) => net::read_net(path)
            .with_context(|| format!("Failed to load net description: {:?}", path)),
        NetSource::Model(name) => models::by_name(name)
            .with_context(|| format!("Unknown model `{}`", name))?
            .with_context(|| format!("Failed to build model `{}`", name)),
    }
}

fn run(options: &Options) -> Result<()> {
    let mut config = ExploreConfig::load_from_file(&options.config)?;
    options.apply(&mut config);
    log::debug!("effective config: {:?}", config);

    let net = load_net(&options.source)?;
    net.log_diagnostics();

    if options.print_net {
        let spec = net.to_spec();
        let text = match options.format {
            OutputFormat::Text => net::io::to_ron_string(&spec),
            OutputFormat::Json => net::io::to_json_string(&spec),
        }
        .context("Failed to render net description")?;
        println!("{}", text);
    }

    let graph = StateGraph::from_net(&net, config.state_graph_config())
        .context("Exploration fired a disabled transition")?;
    let report = BoundnessAnalyzer::report(&net, &graph);

    let simulation = match config.simulation_steps {
        Some(steps) => Some(
            Simulator::new(&net)
                .with_strategy(config.firing_strategy())
                .with_max_steps(steps)
                .run()
                .context("Simulation fired a disabled transition")?,
        ),
        None => None,
    };

    match options.format {
        OutputFormat::Json => {
            let output = JsonOutput {
                graph: graph.export(),
                report: &report,
                simulation: simulation.as_ref(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
        OutputFormat::Text => print_text(&net, &graph, &report, simulation.as_ref()),
    }
    Ok(())
}

fn print_text(
    net: &Net,
    graph: &StateGraph,
    report: &BehaviourReport,
    simulation: Option<&SimulationTrace>,
) {
    let stats = graph.stats();
    println!(
        "{} graph: {} states, {} edges{}",
        graph.mode.as_str(),
        stats.state_count,
        stats.edge_count,
        if stats.truncated { " (truncated)" } else { "" }
    );
    for node in graph.nodes() {
        println!("  s{} {}", node.index, node.label);
    }
    for edge in graph.graph.edge_indices() {
        if let Some((source, target)) = graph.graph.edge_endpoints(edge) {
            println!(
                "  s{} --{}--> s{}",
                graph.node(source).index,
                graph.graph[edge].transition.name,
                graph.node(target).index
            );
        }
    }
    println!("{}", report);

    if let Some(trace) = simulation {
        println!("simulation from {}", trace.initial_marking.describe(net));
        for (step, fired) in trace.steps.iter().enumerate() {
            println!("  {:>3}. {} -> {}", step + 1, fired.name, fired.marking.describe(net));
        }
        if trace.deadlocked {
            println!("  deadlock reached");
        }
    }
}
