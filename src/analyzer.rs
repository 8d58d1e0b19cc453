// src/analyzer.rs

use crate::classifier::{classify, extract_enrollment_year};
use crate::error::AnalyzeError;
use crate::model::*;
use chrono::NaiveDateTime;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;
use tracing::{info, trace, warn};

const TIMESTAMP_FORMAT: &str = "%Y/%m/%d %H:%M:%S";

/// Running state of one parse pass. Filled by `record` during the scan and
/// only read afterwards.
#[derive(Debug, Default)]
pub struct AggregationStore {
    requests: Vec<HttpRequest>,
    router_visits: Vec<RouterVisit>,
    algorithm_invocations: Vec<AlgorithmInvocation>,
    generations: Vec<GenerationResult>,

    endpoint_map: HashMap<String, EndpointId>,
    endpoints: Vec<EndpointInfo>,
    users: HashSet<String>,
    users_by_year: BTreeMap<String, usize>,
    /// (kind, count) in first-seen order
    algorithms: Vec<(AlgorithmKind, usize)>,
    timetables_returned: Vec<u64>,
    total_requests: usize,
}

/// Open `path` and run a full classification pass over it.
pub fn analyze(path: &Path, show_progress: bool) -> Result<AggregationStore, AnalyzeError> {
    let file_access = |source: io::Error| AnalyzeError::FileAccess {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(file_access)?;
    let len = file.metadata().map_err(file_access)?.len();
    info!(path = %path.display(), "Parsing log file");

    let bar = if show_progress {
        let bar = ProgressBar::new(len);
        if let Ok(style) = ProgressStyle::with_template("{msg} [{bar:40}] {bytes}/{total_bytes}") {
            bar.set_style(style);
        }
        bar.set_message("Scanning log");
        bar
    } else {
        ProgressBar::hidden()
    };

    let store = analyze_reader(BufReader::new(file), &bar)?;
    bar.finish_and_clear();

    info!(total_requests = store.total_requests(), "Successfully parsed log file");
    Ok(store)
}

/// Classify every non-blank line of `reader` into a fresh store. Lines that
/// fail to classify are skipped; only I/O failures abort the pass.
pub fn analyze_reader<R: BufRead>(mut reader: R, bar: &ProgressBar) -> Result<AggregationStore, AnalyzeError> {
    let mut store = AggregationStore::new();
    let mut buf = Vec::new();
    let mut line_num = 0;

    loop {
        buf.clear();
        let read = reader
            .read_until(b'\n', &mut buf)
            .map_err(|source| AnalyzeError::Read { line: line_num, source })?;
        if read == 0 {
            break;
        }
        line_num += 1;
        bar.inc(read as u64);

        let decoded = String::from_utf8_lossy(&buf);
        let line = decoded.trim();
        if line.is_empty() {
            continue;
        }

        match classify(line) {
            Ok(Some(record)) => {
                trace!(line = line_num, at = record.timestamp(), source_ip = record.source_ip(), "recording line");
                store.record(record);
            }
            Ok(None) => trace!(line = line_num, content = line, "skipping unrecognized line"),
            Err(e) => warn!(line = line_num, content = line, error = %e, "Could not parse line"),
        }
    }

    Ok(store)
}

impl AggregationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Account for one observed log line. Recording the same entry twice
    /// counts it twice.
    pub fn record(&mut self, entry: LogRecord) {
        match entry {
            LogRecord::HttpRequest(req) => {
                let id = match self.endpoint_map.get(&req.endpoint) {
                    Some(&id) => id,
                    None => {
                        let id = self.endpoints.len();
                        self.endpoint_map.insert(req.endpoint.clone(), id);
                        self.endpoints.push(EndpointInfo {
                            path: req.endpoint.clone(),
                            count: 0,
                            response_times_us: Vec::new(),
                        });
                        id
                    }
                };
                let info = &mut self.endpoints[id];
                info.count += 1;
                info.response_times_us.push(req.response_time_us);

                self.total_requests += 1;
                self.requests.push(req);
            }
            LogRecord::RouterVisit(visit) => {
                if let Some(user_id) = &visit.user_id {
                    self.users.insert(user_id.clone());
                    if let Some(year) = extract_enrollment_year(user_id) {
                        *self.users_by_year.entry(year.to_string()).or_default() += 1;
                    }
                }
                self.router_visits.push(visit);
            }
            LogRecord::AlgorithmInvocation(inv) => {
                match self.algorithms.iter_mut().find(|(kind, _)| *kind == inv.algorithm_kind) {
                    Some((_, count)) => *count += 1,
                    None => self.algorithms.push((inv.algorithm_kind, 1)),
                }
                self.algorithm_invocations.push(inv);
            }
            LogRecord::GenerationResult(generation) => {
                self.timetables_returned.push(generation.returned_count);
                self.generations.push(generation);
            }
        }
    }

    pub fn total_requests(&self) -> usize {
        self.total_requests
    }

    pub fn router_visits(&self) -> &[RouterVisit] {
        &self.router_visits
    }

    pub fn algorithm_invocations(&self) -> &[AlgorithmInvocation] {
        &self.algorithm_invocations
    }

    pub fn unique_users(&self) -> usize {
        self.users.len()
    }

    /// Endpoint -> count/avg/max/min response time in microseconds
    pub fn performance_by_endpoint(&self) -> BTreeMap<String, EndpointPerformance> {
        self.endpoints
            .iter()
            .filter(|e| !e.response_times_us.is_empty())
            .map(|e| {
                let times = &e.response_times_us;
                let sum: f64 = times.iter().sum();
                let perf = EndpointPerformance {
                    count: times.len(),
                    average_us: sum / times.len() as f64,
                    max_us: times.iter().copied().fold(f64::NEG_INFINITY, f64::max),
                    min_us: times.iter().copied().fold(f64::INFINITY, f64::min),
                };
                (e.path.clone(), perf)
            })
            .collect()
    }

    /// Most requested first; equal counts keep first-seen order.
    pub fn endpoint_popularity(&self) -> Vec<(String, usize)> {
        let mut popularity: Vec<(String, usize)> =
            self.endpoints.iter().map(|e| (e.path.clone(), e.count)).collect();
        popularity.sort_by(|a, b| b.1.cmp(&a.1));
        popularity
    }

    /// Router visits per enrollment year. Iterate with `.iter().rev()` for
    /// newest-first reporting.
    pub fn users_by_year(&self) -> BTreeMap<String, usize> {
        self.users_by_year.clone()
    }

    pub fn algorithm_usage(&self) -> Vec<(AlgorithmKind, usize)> {
        let mut usage = self.algorithms.clone();
        usage.sort_by(|a, b| b.1.cmp(&a.1));
        usage
    }

    pub fn generation_stats(&self) -> GenerationStats {
        let total_returned: u128 = self.timetables_returned.iter().map(|&n| u128::from(n)).sum();
        let count_of_generations = self.timetables_returned.len();
        let average_returned = if count_of_generations > 0 {
            total_returned as f64 / count_of_generations as f64
        } else {
            0.0
        };

        let found = match (
            self.generations.iter().map(|g| g.found_count).max(),
            self.generations.iter().map(|g| g.found_count).min(),
        ) {
            (Some(max_found), Some(min_found)) => {
                let sum: u128 = self.generations.iter().map(|g| u128::from(g.found_count)).sum();
                Some(FoundStats {
                    average_found: sum as f64 / self.generations.len() as f64,
                    max_found,
                    min_found,
                })
            }
            _ => None,
        };

        GenerationStats {
            total_returned,
            average_returned,
            count_of_generations,
            found,
        }
    }

    /// (GET, POST) request counts
    pub fn method_counts(&self) -> (usize, usize) {
        self.requests.iter().fold((0, 0), |(get, post), req| match req.method {
            HttpMethod::Get => (get + 1, post),
            HttpMethod::Post => (get, post + 1),
        })
    }

    pub fn status_counts(&self) -> BTreeMap<u16, usize> {
        let mut counts = BTreeMap::new();
        for req in &self.requests {
            *counts.entry(req.status_code).or_default() += 1;
        }
        counts
    }

    /// Earliest and latest HTTP request time. Unparseable timestamps are
    /// left out.
    pub fn request_time_span(&self) -> Option<(NaiveDateTime, NaiveDateTime)> {
        let mut times = self
            .requests
            .iter()
            .filter_map(|r| NaiveDateTime::parse_from_str(&r.timestamp, TIMESTAMP_FORMAT).ok());
        let first = times.next()?;
        Some(times.fold((first, first), |(lo, hi), t| (lo.min(t), hi.max(t))))
    }
}
