//! NDJSON record loop.
//!
//! Every input line produces exactly one output line. Lines that are not
//! valid JSON are written through unchanged.

use std::io::{self, BufRead, Write};

use geotag_filter::GeoTagFilter;
use geotag_geocoder::ReverseGeocoder;

/// Counters for a finished run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RunStats {
    /// Records read (blank lines excluded).
    pub records: u64,
    /// Records that were not valid JSON.
    pub unparsed: u64,
}

/// Filters each line of `reader` into `writer`.
///
/// # Errors
///
/// Returns an error if reading or writing fails.
pub fn run<G: ReverseGeocoder>(
    filter: &GeoTagFilter<G>,
    reader: impl BufRead,
    writer: &mut impl Write,
) -> io::Result<RunStats> {
    let mut stats = RunStats::default();

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        stats.records += 1;

        match serde_json::from_str(&line) {
            Ok(record) => {
                let enriched = filter.filter(record);
                serde_json::to_writer(&mut *writer, &enriched)?;
            }
            Err(e) => {
                log::warn!("Line {}: not valid JSON, passing through: {e}", index + 1);
                stats.unparsed += 1;
                writer.write_all(line.as_bytes())?;
            }
        }
        writer.write_all(b"\n")?;
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use geotag_filter_models::FilterConfig;
    use geotag_geocoder::{BoundaryGeocoder, NoopGeocoder};
    use serde_json::{Value, json};

    use super::*;

    fn run_lines<G: ReverseGeocoder>(filter: &GeoTagFilter<G>, input: &str) -> (Vec<String>, RunStats) {
        let mut out = Vec::new();
        let stats = run(filter, input.as_bytes(), &mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        (text.lines().map(ToString::to_string).collect(), stats)
    }

    #[test]
    fn one_output_line_per_record() {
        let filter = GeoTagFilter::new(FilterConfig::default(), NoopGeocoder);
        let input = "{\"properties\":{\"a\":1}}\n\nnot json\n{\"message\":\"hi\"}\n";

        let (lines, stats) = run_lines(&filter, input);

        assert_eq!(stats, RunStats { records: 3, unparsed: 1 });
        assert_eq!(lines.len(), 3);
        assert_eq!(serde_json::from_str::<Value>(&lines[0]).unwrap(), json!({"a": 1}));
        assert_eq!(lines[1], "not json");
        assert_eq!(
            serde_json::from_str::<Value>(&lines[2]).unwrap(),
            json!({"message": "hi"})
        );
    }

    #[test]
    fn enriches_with_boundary_geocoder() {
        let boundaries = json!({
            "type": "FeatureCollection",
            "features": [{
                "type": "Feature",
                "properties": {"city": "Springfield"},
                "geometry": {
                    "type": "Polygon",
                    "coordinates": [[[0.0, 0.0], [10.0, 0.0], [10.0, 10.0], [0.0, 10.0], [0.0, 0.0]]]
                }
            }]
        });
        let geocoder = BoundaryGeocoder::from_geojson_str(&boundaries.to_string()).unwrap();
        let filter = GeoTagFilter::new(FilterConfig::default(), geocoder);

        let input = json!({"request": {"body": {"stop": {"lat": 5.0, "lon": 5.0}}}}).to_string();
        let (lines, _) = run_lines(&filter, &input);

        let out: Value = serde_json::from_str(&lines[0]).unwrap();
        assert_eq!(
            out["request"]["geo_fields"]["body"],
            json!({"stop": {"city": "Springfield", "geo_point": {"lat": 5.0, "lon": 5.0}}})
        );
    }
}
