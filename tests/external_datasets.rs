use std::ffi::OsStr;
use std::fmt::Debug;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ndarray::{Array2, Axis};
use num_traits::Float;

use meanshift::{CenterPolicy, DistanceMeasure, Kernel, MeanShift};

/// Rows of `<label> <v1> <v2> ...`, returned as points plus ground-truth labels.
fn load_data<F>(test_file: PathBuf) -> std::io::Result<(Array2<F>, Vec<usize>)>
where
    F: Float + FromStr + Default,
    <F as FromStr>::Err: Debug,
{
    let reader = BufReader::new(File::open(test_file)?);
    let mut truth = Vec::new();
    let mut test_data = Vec::new();
    for line in reader.lines() {
        let line = line?;
        let mut fields = line.split(' ');
        truth.push(fields.next().unwrap().parse::<usize>().unwrap());
        test_data.push(fields.map(|c| c.parse::<F>().unwrap()).collect::<Vec<F>>());
    }
    let mut out = Array2::<F>::default((test_data.len(), test_data[0].len()));
    out.axis_iter_mut(Axis(0))
        .enumerate()
        .for_each(|(idx1, mut row)| {
            row.iter_mut().enumerate().for_each(|(idx2, col)| {
                *col = test_data[idx1][idx2];
            });
        });
    Ok((out, truth))
}

fn file<A: AsRef<OsStr>>(path: A) -> PathBuf {
    let test_dir = Path::new(file!()).parent().unwrap();
    test_dir.join(Path::new("data")).join(Path::new(&path))
}

/// Labels are arbitrary, so compare which pairs of points share a cluster.
fn same_partition(a: &[usize], b: &[usize]) -> bool {
    a.len() == b.len()
        && (0..a.len()).all(|i| (0..a.len()).all(|j| (a[i] == a[j]) == (b[i] == b[j])))
}

fn run_test<F>(ms: &MeanShift<F>, path: PathBuf, expected_clusters: usize)
where
    F: Float + Send + Sync + 'static + FromStr + Default,
    <F as FromStr>::Err: Debug,
{
    let (x, truth) = load_data::<F>(path).unwrap();
    let fit = ms.fit(x).unwrap();
    assert_eq!(fit.n_clusters(), expected_clusters);
    assert!(same_partition(&fit.labels, &truth));
    assert_eq!(fit.unconverged, 0);
}

#[test]
fn three_modes() {
    let ms = MeanShift::<f32>::new(Some(2.), 4, DistanceMeasure::Euclidean);
    run_test(&ms, file("near-modes-3.test"), 3);
}

#[test]
fn three_modes_on_actors() {
    let ms = MeanShift::<f64>::new(Some(2.), 4, DistanceMeasure::Euclidean).with_actors(true);
    run_test(&ms, file("near-modes-3.test"), 3);
}

#[test]
fn five_modes_squared() {
    let ms = MeanShift::<f64>::new(Some(4.), 0, DistanceMeasure::SquaredEuclidean)
        .with_center_policy(CenterPolicy::RunningMean);
    run_test(&ms, file("near-modes-5.test"), 5);
}

#[test]
fn five_modes_gaussian() {
    let ms = MeanShift::<f64>::new(Some(2.), 2, DistanceMeasure::Euclidean)
        .with_kernel(Kernel::Gaussian)
        .with_actors(true);
    run_test(&ms, file("near-modes-5.test"), 5);
}
