// src/model.rs

use std::fmt;

/// Index of an endpoint in first-seen order
pub type EndpointId = usize;

/// HTTP verbs the access log emits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HttpMethod {
    Get,
    Post,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
        }
    }
}

/// Which scheduling strategy a generation run announced
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AlgorithmKind {
    HeuristicBacktracking,
    IterativeRandomSampling,
    Unknown,
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AlgorithmKind::HeuristicBacktracking => "Heuristic Backtracking Strategy",
            AlgorithmKind::IterativeRandomSampling => "Iterative Random Sampling",
            AlgorithmKind::Unknown => "Unknown",
        };
        f.write_str(name)
    }
}

/// `2025/08/01 08:00:22 [47.15.69.30] POST /courses 200 473.604µs`
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub timestamp: String,
    pub source_ip: String,
    pub method: HttpMethod,
    pub endpoint: String,
    pub status_code: u16,
    /// The duration token exactly as logged
    pub response_time_raw: String,
    pub response_time_us: f64,
}

/// `... router: /courses` with an optional trailing `[2025B7PS1194P]`
#[derive(Debug, Clone, PartialEq)]
pub struct RouterVisit {
    pub timestamp: String,
    pub source_ip: String,
    pub endpoint: String,
    pub user_id: Option<String>,
}

/// `... --- Using Heuristic Backtracking Strategy (for Sparse Spaces) ---`
#[derive(Debug, Clone, PartialEq)]
pub struct AlgorithmInvocation {
    pub timestamp: String,
    pub source_ip: String,
    pub algorithm_kind: AlgorithmKind,
    pub raw_detail: String,
}

/// `... --- Generation Complete: Found 234 timetables in pool, returning 100. ---`
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationResult {
    pub timestamp: String,
    pub source_ip: String,
    pub found_count: u64,
    pub returned_count: u64,
}

/// One classified log line
#[derive(Debug, Clone, PartialEq)]
pub enum LogRecord {
    HttpRequest(HttpRequest),
    RouterVisit(RouterVisit),
    AlgorithmInvocation(AlgorithmInvocation),
    GenerationResult(GenerationResult),
}

impl LogRecord {
    pub fn timestamp(&self) -> &str {
        match self {
            LogRecord::HttpRequest(r) => &r.timestamp,
            LogRecord::RouterVisit(r) => &r.timestamp,
            LogRecord::AlgorithmInvocation(r) => &r.timestamp,
            LogRecord::GenerationResult(r) => &r.timestamp,
        }
    }

    pub fn source_ip(&self) -> &str {
        match self {
            LogRecord::HttpRequest(r) => &r.source_ip,
            LogRecord::RouterVisit(r) => &r.source_ip,
            LogRecord::AlgorithmInvocation(r) => &r.source_ip,
            LogRecord::GenerationResult(r) => &r.source_ip,
        }
    }
}

/// Per-endpoint request bookkeeping, kept in first-seen order
#[derive(Debug, Clone)]
pub struct EndpointInfo {
    pub path: String,
    pub count: usize,
    pub response_times_us: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct EndpointPerformance {
    pub count: usize,
    pub average_us: f64,
    pub max_us: f64,
    pub min_us: f64,
}

/// Extended statistics over `found_count`, only present when at least one
/// generation was recorded
#[derive(Debug, Clone, PartialEq)]
pub struct FoundStats {
    pub average_found: f64,
    pub max_found: u64,
    pub min_found: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationStats {
    /// Wider than the per-line counts so summing never overflows
    pub total_returned: u128,
    /// 0.0 when no generations occurred
    pub average_returned: f64,
    pub count_of_generations: usize,
    pub found: Option<FoundStats>,
}
