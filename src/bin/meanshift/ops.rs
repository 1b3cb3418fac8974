use std::fmt::{Debug, Display};
use std::fs::File;
use std::io::{stdout, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::str::FromStr;

use ndarray::{Array2, Axis};
use num_traits::Float;

use meanshift::Clustering;

#[derive(Debug)]
pub(crate) struct FileParseError {
    pub message: String,
}

/// Reads in a file formatted as (tab separated):
///     id1 val1 val2 val3
///     id2 val1 val2 val3
///
/// Rows must all carry the same number of values; ragged rows are rejected
/// here rather than padded.
pub(crate) fn from_file<F>(p: &Path, d: &str) -> Result<(Array2<F>, Vec<String>), FileParseError>
where
    F: Float + Default + FromStr,
    <F as FromStr>::Err: Debug,
{
    let file = File::open(p).map_err(|e| FileParseError {
        message: format!("Unable to open {}: {}", p.display(), e),
    })?;
    let mut ids = Vec::new();
    let mut data: Vec<Vec<F>> = Vec::new();
    for (idx, line) in BufReader::new(file).lines().enumerate() {
        let line = line.map_err(|e| FileParseError {
            message: format!("Error reading line {}: {}", idx + 1, e),
        })?;
        if !line.contains(d) {
            return Err(FileParseError {
                message: format!("Line {} is not {:?}-delimited", idx + 1, d),
            });
        }
        let mut fields = line.split(d);
        match fields.next() {
            Some(id) => ids.push(id.to_string()),
            None => {
                return Err(FileParseError {
                    message: format!("Missing id on line {}", idx + 1),
                })
            }
        }
        let mut point: Vec<F> = vec![];
        for s in fields {
            match s.trim().parse::<F>() {
                Ok(v) => point.push(v),
                Err(_) => {
                    return Err(FileParseError {
                        message: format!("Error parsing value {:?} at line {}", s, idx + 1),
                    })
                }
            }
        }
        data.push(point);
    }
    if data.is_empty() {
        return Err(FileParseError {
            message: "Data file is empty".to_string(),
        });
    }
    let width = data[0].len();
    if let Some(row) = data.iter().position(|v| v.len() != width) {
        return Err(FileParseError {
            message: format!(
                "Row {} has {} values, expected {}",
                row + 1,
                data[row].len(),
                width
            ),
        });
    }
    let mut out = Array2::<F>::default((data.len(), width));
    out.axis_iter_mut(Axis(0))
        .zip(data.iter())
        .for_each(|(mut row, values)| {
            row.iter_mut().zip(values.iter()).for_each(|(col, v)| *col = *v);
        });
    Ok((out, ids))
}

/// Header line, then one block per cluster: its centre and member ids.
pub(crate) fn write_results<W, F>(
    writer: &mut W,
    fit: &Clustering<F>,
    ids: &[String],
) -> std::io::Result<()>
where
    W: Write,
    F: Float + Send + Sync + Display,
{
    writeln!(
        writer,
        "nClusters={} nSamples={} bandwidth={}",
        fit.n_clusters(),
        fit.labels.len(),
        fit.bandwidth
    )?;
    for (label, members) in fit.members().iter().enumerate() {
        let center = fit
            .cluster_centers
            .row(label)
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<String>>()
            .join(",");
        writeln!(
            writer,
            ">Cluster={} size={} center={}",
            label + 1,
            members.len(),
            center
        )?;
        writeln!(
            writer,
            "{}",
            members
                .iter()
                .map(|&i| ids[i].as_str())
                .collect::<Vec<&str>>()
                .join(",")
        )?;
    }
    Ok(())
}

#[cfg(not(tarpaulin_include))]
pub(crate) fn display_results<F>(fit: &Clustering<F>, ids: &[String]) -> std::io::Result<()>
where
    F: Float + Send + Sync + Display,
{
    let mut writer = BufWriter::new(stdout());
    write_results(&mut writer, fit, ids)?;
    writer.flush()
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use ndarray::arr2;
    use tempfile::NamedTempFile;

    use meanshift::{DistanceMeasure, MeanShift};

    use crate::ops::{from_file, write_results};

    #[test]
    fn valid_load() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "id1\t1.0\t5.0\t1.0").unwrap();
        writeln!(file, "id2\t2.0\t4.0\t2.0").unwrap();
        writeln!(file, "id3\t3.0\t3.0\t3.0").unwrap();
        let (data, ids) = from_file::<f32>(file.path(), "\t").unwrap();
        assert_eq!(ids, vec!["id1", "id2", "id3"]);
        let expected = arr2(&[[1., 5., 1.], [2., 4., 2.], [3., 3., 3.]]);
        assert_eq!(data, expected);
    }

    #[test]
    fn invalid_load_empty_file() {
        let file = NamedTempFile::new().unwrap();
        assert!(from_file::<f32>(file.path(), "\t").is_err());
    }

    #[test]
    fn invalid_load_ragged_rows() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "id1\t1.0\t5.0\t1.0").unwrap();
        writeln!(file, "id2\t2.0\t4.0").unwrap();
        let err = from_file::<f32>(file.path(), "\t").unwrap_err();
        assert!(err.message.contains("Row 2"));
    }

    #[test]
    fn invalid_blank_line() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "id1\t1.0\t5.0\t1.0").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "id3\t1.0\t5.0\t1.0").unwrap();
        assert!(from_file::<f32>(file.path(), "\t").is_err());
    }

    #[test]
    fn invalid_load_invalid_data() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "id1\t1.0\t5.0\t1.0").unwrap();
        writeln!(file, "id2\ta\tb\tc").unwrap();
        let err = from_file::<f64>(file.path(), "\t").unwrap_err();
        assert!(err.message.contains("line 2"));
    }

    #[test]
    fn invalid_file_format() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "id1 1.0 5.0 1.0").unwrap();
        assert!(from_file::<f32>(file.path(), "\t").is_err());
    }

    #[test]
    fn writes_cluster_blocks() {
        let x = arr2(&[[0., 0.], [0., 1.], [10., 10.]]);
        let ids: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
        let fit = MeanShift::new(Some(2.0f64), 1, DistanceMeasure::Euclidean)
            .fit(x)
            .unwrap();
        let mut out = Vec::new();
        write_results(&mut out, &fit, &ids).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "nClusters=2 nSamples=3 bandwidth=2");
        assert_eq!(lines[1], ">Cluster=1 size=2 center=0,0.5");
        assert_eq!(lines[2], "a,b");
        assert_eq!(lines[3], ">Cluster=2 size=1 center=10,10");
        assert_eq!(lines[4], "c");
    }
}
