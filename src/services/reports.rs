//! Report endpoints: fetch the snapshot, hand it to the aggregator.

use crate::db::CrmDb;
use crate::error::CrmError;
use crate::reports;
use crate::types::{ActivityReport, DateRange, EmployeeStats, FunnelReport, PipelineReport};

pub fn get_activity_report(
    db: &CrmDb,
    range: Option<&DateRange>,
) -> Result<ActivityReport, CrmError> {
    let activities = db.get_activities(range)?;
    Ok(reports::activity_report(&activities, range))
}

pub fn get_funnel_report(db: &CrmDb, range: Option<&DateRange>) -> Result<FunnelReport, CrmError> {
    let activities = db.get_activities(range)?;
    let companies = db.get_all_companies()?;
    Ok(reports::funnel_report(&activities, &companies, range))
}

pub fn get_employee_report(
    db: &CrmDb,
    range: Option<&DateRange>,
) -> Result<Vec<EmployeeStats>, CrmError> {
    let activities = db.get_activities(range)?;
    let employees = db.get_all_employees()?;
    Ok(reports::employee_report(&activities, &employees, range))
}

/// Pipeline is always a whole-history snapshot — no date range.
pub fn get_pipeline_report(db: &CrmDb) -> Result<PipelineReport, CrmError> {
    let companies = db.get_all_companies()?;
    let activities = db.get_activities(None)?;
    Ok(reports::pipeline_report(&companies, &activities))
}
