// src/classifier.rs

use crate::error::ClassifyError;
use crate::model::*;
use regex::{Captures, Regex};
use std::sync::OnceLock;

/// Timestamp and bracketed source address shared by every record shape
const PREFIX: &str = r"^([0-9]{4}/[0-9]{2}/[0-9]{2} [0-9]{2}:[0-9]{2}:[0-9]{2}) \[([^\]]+)\] ";

type Build = fn(&Captures) -> Result<LogRecord, ClassifyError>;

struct Matcher {
    name: &'static str,
    regex: Regex,
    build: Build,
}

/// Record shapes in match priority order. Router-with-id must precede
/// router-without-id.
fn matchers() -> &'static [Matcher] {
    static MATCHERS: OnceLock<Vec<Matcher>> = OnceLock::new();
    MATCHERS.get_or_init(|| {
        let table: [(&'static str, &str, Build); 5] = [
            (
                "http_request",
                // The micro sign shows up as U+00B5, U+03BC, mis-decoded `Âµ`
                // or a replacement character depending on who wrote the file.
                r"(GET|POST) (\S+) ([0-9]{3}) ([0-9.]+[Âµμ\x{FFFD}mnus]+s?)",
                build_http_request,
            ),
            ("router_with_id", r"router: (\S+) \[([^\]]+)\]", build_router_with_id),
            ("router", r"router: (\S+)$", build_router),
            ("algorithm", r"--- Using (.+) ---", build_algorithm),
            (
                "generation",
                r"--- Generation Complete: Found ([0-9]+) timetables in pool, returning ([0-9]+)\. ---",
                build_generation,
            ),
        ];
        table
            .into_iter()
            .map(|(name, body, build)| Matcher {
                name,
                regex: Regex::new(&format!("{PREFIX}{body}")).expect("valid log line regex"),
                build,
            })
            .collect()
    })
}

/// Classify one stripped log line. `Ok(None)` means the line has none of the
/// known shapes. The first matching shape wins; later shapes are not tried.
pub fn classify(line: &str) -> Result<Option<LogRecord>, ClassifyError> {
    for matcher in matchers() {
        if let Some(caps) = matcher.regex.captures(line) {
            tracing::trace!(shape = matcher.name, "matched log line");
            return (matcher.build)(&caps).map(Some);
        }
    }
    Ok(None)
}

fn text(caps: &Captures, i: usize) -> String {
    caps.get(i).map_or_else(String::new, |m| m.as_str().to_string())
}

fn number<T: std::str::FromStr>(caps: &Captures, i: usize, field: &'static str) -> Result<T, ClassifyError> {
    let value = caps.get(i).map_or("", |m| m.as_str());
    value.parse::<T>().map_err(|_| ClassifyError::InvalidNumber {
        field,
        value: value.to_string(),
    })
}

fn parse_method(method: &str) -> Result<HttpMethod, ClassifyError> {
    match method {
        "GET" => Ok(HttpMethod::Get),
        "POST" => Ok(HttpMethod::Post),
        other => Err(ClassifyError::UnsupportedMethod(other.to_string())),
    }
}

fn build_http_request(caps: &Captures) -> Result<LogRecord, ClassifyError> {
    let method = parse_method(&caps[3])?;
    let response_time_raw = text(caps, 6);
    let response_time_us = normalize_duration(&response_time_raw)?;

    Ok(LogRecord::HttpRequest(HttpRequest {
        timestamp: text(caps, 1),
        source_ip: text(caps, 2),
        method,
        endpoint: text(caps, 4),
        status_code: number(caps, 5, "status code")?,
        response_time_raw,
        response_time_us,
    }))
}

fn build_router_with_id(caps: &Captures) -> Result<LogRecord, ClassifyError> {
    Ok(LogRecord::RouterVisit(RouterVisit {
        timestamp: text(caps, 1),
        source_ip: text(caps, 2),
        endpoint: text(caps, 3),
        user_id: Some(text(caps, 4)),
    }))
}

fn build_router(caps: &Captures) -> Result<LogRecord, ClassifyError> {
    Ok(LogRecord::RouterVisit(RouterVisit {
        timestamp: text(caps, 1),
        source_ip: text(caps, 2),
        endpoint: text(caps, 3),
        user_id: None,
    }))
}

fn build_algorithm(caps: &Captures) -> Result<LogRecord, ClassifyError> {
    let raw_detail = text(caps, 3);
    Ok(LogRecord::AlgorithmInvocation(AlgorithmInvocation {
        timestamp: text(caps, 1),
        source_ip: text(caps, 2),
        algorithm_kind: classify_algorithm(&raw_detail),
        raw_detail,
    }))
}

fn build_generation(caps: &Captures) -> Result<LogRecord, ClassifyError> {
    Ok(LogRecord::GenerationResult(GenerationResult {
        timestamp: text(caps, 1),
        source_ip: text(caps, 2),
        found_count: number(caps, 3, "found count")?,
        returned_count: number(caps, 4, "returned count")?,
    }))
}

/// Convert a logged duration such as `473.604µs` or `1.5s` to microseconds.
///
/// Spaces are ignored. A token without a leading number is 0. Units other
/// than ns/µs/ms/s are taken to be microseconds already.
pub fn normalize_duration(raw: &str) -> Result<f64, ClassifyError> {
    let compact: String = raw.chars().filter(|&c| c != ' ').collect();
    let split = compact
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(compact.len());
    let (magnitude, unit) = compact.split_at(split);

    if !magnitude.bytes().any(|b| b.is_ascii_digit()) {
        return Ok(0.0);
    }
    let value: f64 = magnitude.parse().map_err(|_| ClassifyError::InvalidNumber {
        field: "response time",
        value: raw.to_string(),
    })?;

    let multiplier = match unit {
        "ns" => 0.001,
        "µs" | "μs" | "Âµs" | "us" | "\u{FFFD}s" => 1.0,
        "ms" => 1000.0,
        "s" => 1_000_000.0,
        _ => 1.0,
    };
    Ok(value * multiplier)
}

/// Banner text between `Using ` and ` ---`, checked in order.
pub fn classify_algorithm(detail: &str) -> AlgorithmKind {
    if detail.contains("Backtracking") {
        AlgorithmKind::HeuristicBacktracking
    } else if detail.contains("Iterative") || detail.contains("Random") {
        AlgorithmKind::IterativeRandomSampling
    } else {
        AlgorithmKind::Unknown
    }
}

/// `2025B7PS1194P` -> `2025`. Only an ASCII 4-digit run at the very start counts.
pub fn extract_enrollment_year(user_id: &str) -> Option<&str> {
    user_id
        .get(..4)
        .filter(|prefix| prefix.bytes().all(|b| b.is_ascii_digit()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_normalize_duration_units() {
        assert!(approx(normalize_duration("473.604µs").unwrap(), 473.604));
        assert!(approx(normalize_duration("2ms").unwrap(), 2000.0));
        assert!(approx(normalize_duration("1.5s").unwrap(), 1_500_000.0));
        assert!(approx(normalize_duration("500ns").unwrap(), 0.5));
    }

    #[test]
    fn test_normalize_duration_micro_sign_variants() {
        for raw in ["12µs", "12μs", "12Âµs", "12us", "12\u{FFFD}s"] {
            assert!(approx(normalize_duration(raw).unwrap(), 12.0), "{raw}");
        }
    }

    #[test]
    fn test_normalize_duration_without_number_is_zero() {
        assert_eq!(normalize_duration("").unwrap(), 0.0);
        assert_eq!(normalize_duration("ms").unwrap(), 0.0);
        assert_eq!(normalize_duration("abc12ms").unwrap(), 0.0);
    }

    #[test]
    fn test_normalize_duration_strips_spaces() {
        assert!(approx(normalize_duration(" 3 ms ").unwrap(), 3000.0));
    }

    #[test]
    fn test_normalize_duration_unknown_unit_is_microseconds() {
        assert!(approx(normalize_duration("7mns").unwrap(), 7.0));
        assert!(approx(normalize_duration("42").unwrap(), 42.0));
    }

    #[test]
    fn test_normalize_duration_bad_magnitude() {
        assert!(matches!(
            normalize_duration("1.2.3ms"),
            Err(ClassifyError::InvalidNumber { field: "response time", .. })
        ));
    }

    #[test]
    fn test_classify_http_request() {
        let record = classify("2025/08/01 08:00:22 [47.15.69.30] POST /courses 200 473.604µs")
            .unwrap()
            .unwrap();
        match record {
            LogRecord::HttpRequest(req) => {
                assert_eq!(req.timestamp, "2025/08/01 08:00:22");
                assert_eq!(req.source_ip, "47.15.69.30");
                assert_eq!(req.method, HttpMethod::Post);
                assert_eq!(req.endpoint, "/courses");
                assert_eq!(req.status_code, 200);
                assert_eq!(req.response_time_raw, "473.604µs");
                assert!(approx(req.response_time_us, 473.604));
            }
            other => panic!("unexpected record {other:?}"),
        }
    }

    #[test]
    fn test_classify_http_request_with_misdecoded_micro() {
        let record = classify("2025/08/01 08:00:22 [1.2.3.4] GET /generate 500 10.5Âµs")
            .unwrap()
            .unwrap();
        let LogRecord::HttpRequest(req) = record else {
            panic!("expected http request");
        };
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.status_code, 500);
        assert!(approx(req.response_time_us, 10.5));
    }

    #[test]
    fn test_parse_method() {
        assert_eq!(parse_method("GET"), Ok(HttpMethod::Get));
        assert_eq!(parse_method("POST"), Ok(HttpMethod::Post));
        assert_eq!(
            parse_method("DELETE"),
            Err(ClassifyError::UnsupportedMethod("DELETE".into()))
        );
        assert_eq!(
            parse_method("get"),
            Err(ClassifyError::UnsupportedMethod("get".into()))
        );
    }

    #[test]
    fn test_router_with_id_takes_priority() {
        let record = classify("2025/08/01 08:00:22 [103.144.92.185] router: /x [2025B7PS1194P]")
            .unwrap()
            .unwrap();
        assert_eq!(
            record,
            LogRecord::RouterVisit(RouterVisit {
                timestamp: "2025/08/01 08:00:22".into(),
                source_ip: "103.144.92.185".into(),
                endpoint: "/x".into(),
                user_id: Some("2025B7PS1194P".into()),
            })
        );
    }

    #[test]
    fn test_router_without_id() {
        let record = classify("2025/08/01 08:00:22 [103.144.92.185] router: /courses")
            .unwrap()
            .unwrap();
        let LogRecord::RouterVisit(visit) = record else {
            panic!("expected router visit");
        };
        assert_eq!(visit.endpoint, "/courses");
        assert_eq!(visit.user_id, None);
    }

    #[test]
    fn test_router_with_trailing_garbage_is_no_match() {
        let line = "2025/08/01 08:00:22 [103.144.92.185] router: /courses extra";
        assert_eq!(classify(line).unwrap(), None);
    }

    #[test]
    fn test_classify_algorithm_banner() {
        let record = classify(
            "2025/08/01 08:00:29 [106.205.200.150] --- Using Heuristic Backtracking Strategy (for Sparse Spaces) ---",
        )
        .unwrap()
        .unwrap();
        let LogRecord::AlgorithmInvocation(inv) = record else {
            panic!("expected algorithm invocation");
        };
        assert_eq!(inv.algorithm_kind, AlgorithmKind::HeuristicBacktracking);
        assert_eq!(inv.raw_detail, "Heuristic Backtracking Strategy (for Sparse Spaces)");
    }

    #[test]
    fn test_classify_generation() {
        let record = classify(
            "2025/08/01 08:00:29 [9.9.9.9] --- Generation Complete: Found 234 timetables in pool, returning 100. ---",
        )
        .unwrap()
        .unwrap();
        let LogRecord::GenerationResult(generation) = record else {
            panic!("expected generation result");
        };
        assert_eq!(generation.found_count, 234);
        assert_eq!(generation.returned_count, 100);
        assert_eq!(generation.source_ip, "9.9.9.9");
    }

    #[test]
    fn test_generation_count_overflow_is_error() {
        let line = "2025/08/01 08:00:29 [9.9.9.9] --- Generation Complete: Found 99999999999999999999999 timetables in pool, returning 1. ---";
        assert!(matches!(
            classify(line),
            Err(ClassifyError::InvalidNumber { field: "found count", .. })
        ));
    }

    #[test]
    fn test_unrecognized_lines() {
        for line in [
            "",
            "random text here",
            "2025/08/01 08:00:22 [1.2.3.4] DELETE /courses 200 1ms",
            "08:00:22 [1.2.3.4] GET /courses 200 1ms",
            "2025/08/01 08:00:22 [1.2.3.4] --- Something else ---",
        ] {
            assert_eq!(classify(line).unwrap(), None, "{line}");
        }
    }

    #[test]
    fn test_classify_is_deterministic() {
        let line = "2025/08/01 08:00:23 [1.2.3.4] GET /courses 200 1.2ms";
        assert_eq!(classify(line).unwrap(), classify(line).unwrap());
    }

    #[test]
    fn test_classify_algorithm_rules() {
        assert_eq!(classify_algorithm("Heuristic Backtracking"), AlgorithmKind::HeuristicBacktracking);
        assert_eq!(classify_algorithm("Iterative Sampling"), AlgorithmKind::IterativeRandomSampling);
        assert_eq!(classify_algorithm("Random Restarts"), AlgorithmKind::IterativeRandomSampling);
        assert_eq!(
            classify_algorithm("Random Backtracking"),
            AlgorithmKind::HeuristicBacktracking
        );
        assert_eq!(classify_algorithm("Greedy"), AlgorithmKind::Unknown);
    }

    #[test]
    fn test_extract_enrollment_year() {
        assert_eq!(extract_enrollment_year("2025B7PS1194P"), Some("2025"));
        assert_eq!(extract_enrollment_year("20231234"), Some("2023"));
        assert_eq!(extract_enrollment_year("B2025"), None);
        assert_eq!(extract_enrollment_year("202"), None);
        assert_eq!(extract_enrollment_year("２０２５X"), None);
        assert_eq!(extract_enrollment_year(""), None);
    }
}
