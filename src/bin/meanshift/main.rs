#[macro_use]
extern crate clap;

use std::fmt::{Debug, Display};
use std::path::Path;
use std::process::exit;
use std::str::FromStr;

use num_traits::Float;

use meanshift::{BandwidthEstimator, ClusterError, DistanceMeasure, Kernel, MeanShift};

use crate::ops::{display_results, from_file};

mod ops;

struct Params {
    bandwidth: Option<f64>,
    threads: isize,
    measure: DistanceMeasure,
    kernel: Kernel,
    max_iterations: usize,
    seed: u64,
    actors: bool,
}

fn parse_or_exit<T: FromStr>(value: &str, name: &str) -> T {
    value.parse::<T>().unwrap_or_else(|_| {
        eprintln!("Unable to parse {}", name);
        exit(1);
    })
}

fn main() {
    env_logger::init();
    let matches = clap_app!(meanshift =>
        (version: "0.1.0")
        (about: "Parallel Mean Shift clustering")
        (@arg INPUT: -i --input +takes_value +required "Path to input file")
        (@arg BANDWIDTH: -b --bandwidth +takes_value "Window radius in distance units, default=estimated")
        (@arg THREADS: -t --threads +takes_value +allow_hyphen_values "Number of workers, <=0 uses all cores, default=0")
        (@arg DISTANCE: -d --distance +takes_value "euclidean, squared_euclidean, manhattan or dtw, default=euclidean")
        (@arg KERNEL: -k --kernel +takes_value "flat or gaussian, default=flat")
        (@arg MAX_ITER: -m --max_iter +takes_value "Maximum shift iterations per point, default=300")
        (@arg SEED: -s --seed +takes_value "Seed for bandwidth estimation sampling, default=0")
        (@arg ACTORS: -a --actors "Run on actors instead of the thread pool")
        (@arg PRECISION: -r --precision +takes_value "Set f32 or f64 precision, default=f32")
    )
    .get_matches();

    let input_file = matches.value_of("INPUT").unwrap().to_string();
    if !Path::new(&input_file).exists() {
        eprintln!("Unable to locate input file {}", input_file);
        exit(1);
    }
    let bandwidth = matches
        .value_of("BANDWIDTH")
        .map(|b| parse_or_exit::<f64>(b, "bandwidth"));
    let threads = parse_or_exit::<isize>(matches.value_of("THREADS").unwrap_or("0"), "threads");
    let max_iterations =
        parse_or_exit::<usize>(matches.value_of("MAX_ITER").unwrap_or("300"), "max_iter");
    let seed = parse_or_exit::<u64>(matches.value_of("SEED").unwrap_or("0"), "seed");
    let measure = matches
        .value_of("DISTANCE")
        .unwrap_or("euclidean")
        .parse::<DistanceMeasure>()
        .unwrap_or_else(|e| {
            eprintln!("{}", e);
            exit(2);
        });
    let kernel = matches
        .value_of("KERNEL")
        .unwrap_or("flat")
        .parse::<Kernel>()
        .unwrap_or_else(|e| {
            eprintln!("{}", e);
            exit(2);
        });
    let params = Params {
        bandwidth,
        threads,
        measure,
        kernel,
        max_iterations,
        seed,
        actors: matches.is_present("ACTORS"),
    };

    let outcome = match matches.value_of("PRECISION").unwrap_or("f32") {
        "f64" => cluster::<f64>(Path::new(&input_file), &params),
        _ => cluster::<f32>(Path::new(&input_file), &params),
    };
    if let Err(e) = outcome {
        eprintln!("{}", e);
        match e {
            ClusterError::WorkerFailure(_) | ClusterError::ThreadPool(_) => exit(1),
            _ => exit(2),
        }
    }
}

fn cluster<F>(input: &Path, params: &Params) -> Result<(), ClusterError>
where
    F: Float + Send + Sync + 'static + Default + FromStr + Display,
    <F as FromStr>::Err: Debug,
{
    let (x, ids) = from_file::<F>(input, "\t").unwrap_or_else(|e| {
        eprintln!("{}", e.message);
        exit(1);
    });
    let bandwidth = match params.bandwidth {
        Some(b) => Some(F::from(b).ok_or(ClusterError::InvalidBandwidth(b))?),
        None => None,
    };
    let fit = MeanShift::new(bandwidth, params.threads, params.measure)
        .with_kernel(params.kernel)
        .with_max_iterations(params.max_iterations)
        .with_estimator(BandwidthEstimator::new(0.3, 500, params.seed))
        .with_actors(params.actors)
        .fit(x)?;
    if let Err(e) = display_results(&fit, &ids) {
        eprintln!("Unable to write results: {}", e);
        exit(1);
    }
    Ok(())
}
