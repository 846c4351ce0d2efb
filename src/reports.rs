//! Read-only report aggregation over activity/company/employee snapshots.
//!
//! Four independent views, each a pure function over collections the caller
//! already fetched. No caching — every request recomputes from its own
//! snapshot. Activities with unparseable business dates are skipped with a
//! warning so one dirty row can't take a report down.

use std::collections::{HashMap, HashSet};

use chrono::{Datelike, Duration, NaiveDate};

use crate::db::types::ActivityKind;
use crate::db::{DbActivity, DbCompany, DbEmployee};
use crate::types::{
    ActivityCounts, ActivityReport, DateRange, EmployeeStats, FunnelReport, PipelineReport,
    StatusBuckets, TypeBucket,
};

fn parse_activity_date(activity: &DbActivity) -> Option<NaiveDate> {
    match NaiveDate::parse_from_str(&activity.date, "%Y-%m-%d") {
        Ok(date) => Some(date),
        Err(_) => {
            log::warn!(
                "Activity {}: unparseable business date {:?}, skipping",
                activity.id,
                activity.date
            );
            None
        }
    }
}

fn in_range(date: NaiveDate, range: Option<&DateRange>) -> bool {
    range.map_or(true, |r| r.contains(date))
}

/// The Sunday that starts the week containing `date`. Weeks always start
/// Sunday, never Monday, regardless of locale.
fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(date.weekday().num_days_from_sunday() as i64)
}

fn bump(counts: &mut ActivityCounts, activity: &DbActivity) {
    match activity.kind {
        ActivityKind::Call => counts.calls += 1,
        ActivityKind::Email => counts.emails += 1,
    }
    // Flag counters are kind-independent: an answered email and an answered
    // call both count.
    if activity.answered {
        counts.answered += 1;
    }
    if activity.interested {
        counts.interested += 1;
    }
}

/// Time-bucketed activity counts by day, Sunday-aligned week, and month.
pub fn activity_report(activities: &[DbActivity], range: Option<&DateRange>) -> ActivityReport {
    let mut report = ActivityReport::default();
    for activity in activities {
        let date = match parse_activity_date(activity) {
            Some(d) => d,
            None => continue,
        };
        if !in_range(date, range) {
            continue;
        }

        let day_key = date.format("%Y-%m-%d").to_string();
        let week_key = week_start(date).format("%Y-%m-%d").to_string();
        let month_key = day_key[..7].to_string();

        bump(report.by_date.entry(day_key).or_default(), activity);
        bump(report.by_week.entry(week_key).or_default(), activity);
        bump(report.by_month.entry(month_key).or_default(), activity);
        report.total += 1;
    }
    report
}

/// Conversion funnel over distinct companies.
///
/// `customers` is the current snapshot over the full company set — it is
/// deliberately not filtered by the activity date range.
pub fn funnel_report(
    activities: &[DbActivity],
    companies: &[DbCompany],
    range: Option<&DateRange>,
) -> FunnelReport {
    let mut contacted: HashSet<&str> = HashSet::new();
    let mut answered: HashSet<&str> = HashSet::new();
    let mut interested: HashSet<&str> = HashSet::new();

    for activity in activities {
        let date = match parse_activity_date(activity) {
            Some(d) => d,
            None => continue,
        };
        if !in_range(date, range) {
            continue;
        }
        contacted.insert(&activity.company_id);
        if activity.answered {
            answered.insert(&activity.company_id);
        }
        if activity.interested {
            interested.insert(&activity.company_id);
        }
    }

    FunnelReport {
        total_companies: companies.len(),
        contacted: contacted.len(),
        answered: answered.len(),
        interested: interested.len(),
        customers: companies.iter().filter(|c| c.is_customer).count(),
    }
}

fn rate(numerator: u32, denominator: u32) -> u32 {
    if denominator == 0 {
        return 0;
    }
    ((numerator as f64 / denominator as f64) * 100.0).round() as u32
}

/// Per-employee performance, sorted by total activities descending.
pub fn employee_report(
    activities: &[DbActivity],
    employees: &[DbEmployee],
    range: Option<&DateRange>,
) -> Vec<EmployeeStats> {
    let mut stats: Vec<EmployeeStats> = employees
        .iter()
        .map(|employee| {
            let mut calls = 0u32;
            let mut emails = 0u32;
            let mut answered = 0u32;
            let mut interested = 0u32;
            let mut follow_ups = 0u32;

            for activity in activities {
                if activity.employee_id != employee.id {
                    continue;
                }
                let date = match parse_activity_date(activity) {
                    Some(d) => d,
                    None => continue,
                };
                if !in_range(date, range) {
                    continue;
                }
                match activity.kind {
                    ActivityKind::Call => calls += 1,
                    ActivityKind::Email => emails += 1,
                }
                if activity.answered {
                    answered += 1;
                }
                if activity.interested {
                    interested += 1;
                }
                if activity.follow_up {
                    follow_ups += 1;
                }
            }

            EmployeeStats {
                employee_id: employee.id.clone(),
                name: employee.name.clone(),
                calls,
                emails,
                total_activities: calls + emails,
                answered,
                interested,
                follow_ups,
                // Calls are the denominator here on purpose — answered
                // emails inflate `answered` but not the answer rate.
                answer_rate: rate(answered, calls),
                interest_rate: rate(interested, answered),
            }
        })
        .collect();

    stats.sort_by(|a, b| {
        b.total_activities
            .cmp(&a.total_activities)
            .then_with(|| a.name.cmp(&b.name))
    });
    stats
}

/// Per-company activity flags used by the status classification.
#[derive(Default, Clone, Copy)]
struct CompanyActivityFlags {
    any: bool,
    interested: bool,
    follow_up: bool,
}

/// Pipeline breakdown: by type, by tag, and by derived status.
pub fn pipeline_report(companies: &[DbCompany], activities: &[DbActivity]) -> PipelineReport {
    let mut report = PipelineReport::default();

    // One pass over the activity log for the per-company status flags.
    let mut flags: HashMap<&str, CompanyActivityFlags> = HashMap::new();
    for activity in activities {
        let entry = flags.entry(activity.company_id.as_str()).or_default();
        entry.any = true;
        entry.interested |= activity.interested;
        entry.follow_up |= activity.follow_up;
    }

    for company in companies {
        let type_key = if company.company_type.trim().is_empty() {
            "Unknown".to_string()
        } else {
            company.company_type.clone()
        };
        let bucket = report.by_type.entry(type_key).or_default();
        bucket.total += 1;
        if company.is_customer {
            bucket.customers += 1;
        } else {
            bucket.prospects += 1;
        }

        // A company contributes to every tag it carries.
        for tag in &company.tags {
            *report.by_tag.entry(tag.clone()).or_insert(0) += 1;
        }

        // Fixed precedence: is_customer wins, then interested, then
        // follow-up, then any contact at all. Stop at the first match.
        let company_flags = flags.get(company.id.as_str()).copied().unwrap_or_default();
        let buckets = &mut report.by_status;
        if company.is_customer {
            buckets.customers += 1;
        } else if company_flags.interested {
            buckets.interested += 1;
        } else if company_flags.follow_up {
            buckets.needs_follow_up += 1;
        } else if company_flags.any {
            buckets.contacted += 1;
        } else {
            buckets.not_contacted += 1;
        }
    }

    report
}
