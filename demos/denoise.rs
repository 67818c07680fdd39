use clap::Parser;
use ndarray::{array, Array2};
use pgmrs::core::PairwiseGraph;
use pgmrs::infer::{run_inference, Method};
use rand::thread_rng;
use rand_distr::{Bernoulli, Distribution};
use serde::Serialize;

/// Denoises a synthetic binary image with a grid-structured pairwise model
#[derive(Debug, Parser)]
struct Args {
    /// Image width in pixels
    #[arg(long, default_value_t = 32)]
    width: usize,

    /// Image height in pixels
    #[arg(long, default_value_t = 32)]
    height: usize,

    /// Probability of flipping a pixel of the clean image
    #[arg(long, default_value_t = 0.2)]
    noise: f64,

    /// Strength of the smoothing prior between neighboring pixels
    #[arg(long, default_value_t = 0.7)]
    smoothness: f64,

    /// Number of message passing sweeps
    #[arg(long, default_value_t = 10)]
    iterations: usize,

    /// Inference policy: lbp, viterbi, log-lbp, log-viterbi, trw or tree
    #[arg(long, default_value = "log-lbp")]
    method: String,
}

#[derive(Debug, Serialize)]
struct Summary {
    method: String,
    width: usize,
    height: usize,
    noise: f64,
    iterations: usize,
    noisy_accuracy: f64,
    denoised_accuracy: f64,
}

fn parse_method(name: &str) -> Method {
    match name {
        "lbp" => Method::Lbp,
        "viterbi" => Method::Viterbi,
        "log-lbp" => Method::LogLbp,
        "log-viterbi" => Method::LogViterbi,
        "trw" => Method::Trw,
        "tree" => Method::Tree,
        other => panic!("Unknown method {other}"),
    }
}

fn main() {
    let args = Args::parse();
    let method = parse_method(&args.method);
    let mut rng = thread_rng();

    // clean image: two vertical stripes
    let clean: Vec<usize> = (0..args.width * args.height)
        .map(|p| usize::from(p % args.width >= args.width / 2))
        .collect();
    // observation: every pixel flipped with the noise probability
    let flip = Bernoulli::new(args.noise).unwrap();
    let noisy: Vec<usize> = clean
        .iter()
        .map(|&label| if flip.sample(&mut rng) { 1 - label } else { label })
        .collect();

    // one node per pixel, unary potential from the observation
    let mut graph = PairwiseGraph::with_capacity(
        2,
        args.width * args.height,
        2 * args.width * args.height,
    );
    for &observed in &noisy {
        let mut pot = array![args.noise, args.noise];
        pot[observed] = 1f64 - args.noise;
        graph.add_node(pot).unwrap();
    }
    // 4-connected smoothing prior
    let s = args.smoothness;
    let coupling = Array2::from_shape_fn((2, 2), |(a, b)| if a == b { s } else { 1f64 - s });
    for y in 0..args.height {
        for x in 0..args.width {
            let p = y * args.width + x;
            if x + 1 < args.width {
                graph.add_edge(p, p + 1, coupling.clone()).unwrap();
            }
            if y + 1 < args.height {
                graph.add_edge(p, p + args.width, coupling.clone()).unwrap();
            }
        }
    }

    run_inference(&mut graph, method, args.iterations).unwrap();

    let matches = |labels: &[usize]| {
        let hits = labels
            .iter()
            .zip(&clean)
            .filter(|(found, exact)| found == exact)
            .count();
        hits as f64 / clean.len() as f64
    };
    let summary = Summary {
        method: args.method,
        width: args.width,
        height: args.height,
        noise: args.noise,
        iterations: args.iterations,
        noisy_accuracy: matches(&noisy),
        denoised_accuracy: matches(&graph.solutions()),
    };
    println!("{}", serde_yaml::to_string(&summary).unwrap());
}
