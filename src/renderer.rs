// src/renderer.rs

use crate::analyzer::AggregationStore;
use crate::cli::View;
use crate::model::HttpMethod;
use std::io::{self, Write};

const RULE_WIDTH: usize = 60;

pub fn render_view<W: Write>(out: &mut W, store: &AggregationStore, view: View) -> io::Result<()> {
    match view {
        View::Endpoints => render_endpoints(out, store),
        View::Performance => render_performance(out, store, false),
        View::Users => render_users(out, store),
        View::Timetables => render_timetables(out, store, false),
        View::All => render_report(out, store),
    }
}

fn render_report<W: Write>(out: &mut W, store: &AggregationStore) -> io::Result<()> {
    let rule = "=".repeat(RULE_WIDTH);
    writeln!(out, "\n{rule}")?;
    writeln!(out, "         TIMETABLE GENERATOR LOG ANALYSIS REPORT")?;
    writeln!(out, "{rule}")?;

    render_totals(out, store)?;
    render_endpoints(out, store)?;
    render_performance(out, store, true)?;
    render_users(out, store)?;
    render_timetables(out, store, true)?;
    render_algorithms(out, store)?;
    render_insights(out, store)?;

    writeln!(out, "\n{rule}")
}

fn render_totals<W: Write>(out: &mut W, store: &AggregationStore) -> io::Result<()> {
    writeln!(out, "\n📊 TOTAL API REQUESTS SERVED")?;
    writeln!(out, "   Total HTTP requests: {}", store.total_requests())?;

    let (get, post) = store.method_counts();
    writeln!(out, "   {} requests: {get}", HttpMethod::Get.as_str())?;
    writeln!(out, "   {} requests: {post}", HttpMethod::Post.as_str())?;
    for (status, count) in store.status_counts() {
        writeln!(out, "   Status {status}: {count} requests")?;
    }

    if let Some((first, last)) = store.request_time_span() {
        writeln!(out, "   Requests span {first} to {last}")?;
    }
    Ok(())
}

fn render_endpoints<W: Write>(out: &mut W, store: &AggregationStore) -> io::Result<()> {
    writeln!(out, "\n🎯 ENDPOINT POPULARITY")?;
    for (endpoint, count) in store.endpoint_popularity() {
        writeln!(out, "   {endpoint:<20} {count:>4} requests")?;
    }
    Ok(())
}

fn render_performance<W: Write>(out: &mut W, store: &AggregationStore, with_counts: bool) -> io::Result<()> {
    writeln!(out, "\n⚡ PERFORMANCE METRICS")?;
    // BTreeMap, so endpoints come out sorted
    for (endpoint, metrics) in store.performance_by_endpoint() {
        writeln!(out, "   {endpoint:<20}")?;
        writeln!(out, "      Average: {:>8.2}ms", metrics.average_us / 1000.0)?;
        writeln!(out, "      Maximum: {:>8.2}ms", metrics.max_us / 1000.0)?;
        if with_counts {
            writeln!(out, "      Requests: {:>7}", metrics.count)?;
        }
    }
    Ok(())
}

fn render_users<W: Write>(out: &mut W, store: &AggregationStore) -> io::Result<()> {
    writeln!(out, "\n👥 USER ANALYSIS")?;
    writeln!(out, "   Total unique users: {}", store.unique_users())?;
    writeln!(out, "   Router visits: {}", store.router_visits().len())?;

    let by_year = store.users_by_year();
    if !by_year.is_empty() {
        writeln!(out, "   Users by year:")?;
        for (year, count) in by_year.iter().rev() {
            writeln!(out, "      {year}: {count} users")?;
        }
    }
    Ok(())
}

fn render_timetables<W: Write>(out: &mut W, store: &AggregationStore, with_count: bool) -> io::Result<()> {
    writeln!(out, "\n📅 TIMETABLE GENERATION INSIGHTS")?;
    let stats = store.generation_stats();
    writeln!(out, "   Total timetables generated: {}", stats.total_returned)?;

    if stats.count_of_generations > 0 {
        writeln!(out, "   Average timetables per generation: {:.2}", stats.average_returned)?;
        if with_count {
            writeln!(out, "   Number of generation requests: {}", stats.count_of_generations)?;
        }
    }
    Ok(())
}

fn render_algorithms<W: Write>(out: &mut W, store: &AggregationStore) -> io::Result<()> {
    writeln!(out, "\n🔧 ALGORITHM USAGE")?;
    if store.algorithm_invocations().is_empty() {
        return writeln!(out, "   No algorithm usage found in logs");
    }
    for (kind, count) in store.algorithm_usage() {
        writeln!(out, "   {kind}: {count} times")?;
    }
    Ok(())
}

fn render_insights<W: Write>(out: &mut W, store: &AggregationStore) -> io::Result<()> {
    writeln!(out, "\n📈 ADDITIONAL INSIGHTS")?;
    if let Some(found) = store.generation_stats().found {
        writeln!(out, "   Average timetables found per generation: {:.2}", found.average_found)?;
        writeln!(out, "   Maximum timetables found in single generation: {}", found.max_found)?;
        writeln!(out, "   Minimum timetables found in single generation: {}", found.min_found)?;
    }
    Ok(())
}
