//! Overtime split by jurisdiction rule.
//!
//! Daily hours entries are grouped into Monday-to-Sunday weeks and split
//! into regular, overtime and double-time hours under the employment
//! standards rule of the jurisdiction.
//!
//! # Rule families
//!
//! - **Daily threshold** (BC, AB, SK, MB, YT, NT, NU, federal): hours past
//!   the daily threshold are overtime, and past the double-time threshold
//!   (BC only) double time. Regular hours still above the weekly threshold
//!   are then moved to overtime.
//! - **Weekly threshold only** (ON, NB, NS, PE, NL): hours past the weekly
//!   threshold are overtime.

use std::collections::BTreeMap;

use chrono::{Datelike, Duration, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::EngineResult;
use crate::models::{AuditStep, DailyHoursEntry, Jurisdiction};

use super::rounding::round_money;

/// Overtime thresholds for one jurisdiction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OvertimeRule {
    /// Daily hours after which overtime applies, if any.
    pub daily_threshold: Option<Decimal>,
    /// Daily hours after which double time applies, if any.
    pub double_time_threshold: Option<Decimal>,
    /// Weekly hours after which overtime applies.
    pub weekly_threshold: Decimal,
}

impl OvertimeRule {
    /// The built-in rule for a jurisdiction.
    pub fn for_jurisdiction(jurisdiction: Jurisdiction) -> Self {
        let daily = |daily: i64, weekly: i64| OvertimeRule {
            daily_threshold: Some(Decimal::from(daily)),
            double_time_threshold: None,
            weekly_threshold: Decimal::from(weekly),
        };
        let weekly = |weekly: i64| OvertimeRule {
            daily_threshold: None,
            double_time_threshold: None,
            weekly_threshold: Decimal::from(weekly),
        };

        match jurisdiction {
            Jurisdiction::BritishColumbia => OvertimeRule {
                daily_threshold: Some(Decimal::from(8)),
                double_time_threshold: Some(Decimal::from(12)),
                weekly_threshold: Decimal::from(40),
            },
            Jurisdiction::Alberta => daily(8, 44),
            Jurisdiction::Saskatchewan
            | Jurisdiction::Manitoba
            | Jurisdiction::Yukon
            | Jurisdiction::NorthwestTerritories
            | Jurisdiction::Nunavut
            | Jurisdiction::Federal => daily(8, 40),
            Jurisdiction::Ontario | Jurisdiction::NewBrunswick => weekly(44),
            Jurisdiction::NovaScotia | Jurisdiction::PrinceEdwardIsland => weekly(48),
            Jurisdiction::NewfoundlandAndLabrador => weekly(40),
        }
    }

    /// True if the rule has a daily threshold.
    pub fn is_daily(&self) -> bool {
        self.daily_threshold.is_some()
    }
}

/// Hours for one Monday-to-Sunday week.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekSplit {
    /// The Monday starting the week.
    pub week_start: NaiveDate,
    /// Regular hours.
    pub regular_hours: Decimal,
    /// Overtime hours.
    pub overtime_hours: Decimal,
    /// Double-time hours.
    pub double_time_hours: Decimal,
}

/// The result of an overtime split.
#[derive(Debug, Clone)]
pub struct OvertimeSplitResult {
    /// The rule applied.
    pub rule: OvertimeRule,
    /// Total regular hours, rounded.
    pub regular_hours: Decimal,
    /// Total overtime hours, rounded.
    pub overtime_hours: Decimal,
    /// Total double-time hours, rounded.
    pub double_time_hours: Decimal,
    /// Per-week breakdown, in date order.
    pub weeks: Vec<WeekSplit>,
    /// The audit step recording this calculation.
    pub audit_step: AuditStep,
}

fn week_start(date: NaiveDate) -> NaiveDate {
    date - Duration::days(i64::from(date.weekday().num_days_from_monday()))
}

fn split_week(
    week_start: NaiveDate,
    days: &BTreeMap<NaiveDate, Decimal>,
    rule: &OvertimeRule,
) -> WeekSplit {
    let mut regular = Decimal::ZERO;
    let mut overtime = Decimal::ZERO;
    let mut double_time = Decimal::ZERO;

    match rule.daily_threshold {
        Some(daily) => {
            for hours in days.values().copied() {
                match rule.double_time_threshold {
                    Some(double) => {
                        regular += hours.min(daily);
                        overtime += (hours.min(double) - daily).max(Decimal::ZERO);
                        double_time += (hours - double).max(Decimal::ZERO);
                    }
                    None => {
                        regular += hours.min(daily);
                        overtime += (hours - daily).max(Decimal::ZERO);
                    }
                }
            }
            if regular > rule.weekly_threshold {
                let excess = regular - rule.weekly_threshold;
                regular -= excess;
                overtime += excess;
            }
        }
        None => {
            let total: Decimal = days.values().copied().sum();
            overtime = (total - rule.weekly_threshold).max(Decimal::ZERO);
            regular = total - overtime;
        }
    }

    WeekSplit {
        week_start,
        regular_hours: regular,
        overtime_hours: overtime,
        double_time_hours: double_time,
    }
}

/// Splits daily hours into regular, overtime and double-time hours.
///
/// Holiday entries and entries with zero or negative hours are excluded.
/// Entries sharing a date are merged before the daily split. Totals are
/// rounded to cents of an hour after summing across weeks.
///
/// # Returns
///
/// Returns `InvalidJurisdiction` for an unknown jurisdiction code, or
/// `InvalidDateFormat` if any entry's date is not `YYYY-MM-DD`.
///
/// # Examples
///
/// ```
/// use payroll_engine::calculation::split_overtime;
/// use payroll_engine::models::DailyHoursEntry;
/// use rust_decimal::Decimal;
///
/// let entries = vec![
///     DailyHoursEntry::new("2025-03-03", Decimal::from(13)),
///     DailyHoursEntry::new("2025-03-04", Decimal::from(8)),
/// ];
///
/// let result = split_overtime(&entries, "BC", 1).unwrap();
/// assert_eq!(result.regular_hours, Decimal::from(16));
/// assert_eq!(result.overtime_hours, Decimal::from(4));
/// assert_eq!(result.double_time_hours, Decimal::from(1));
/// ```
pub fn split_overtime(
    entries: &[DailyHoursEntry],
    jurisdiction_code: &str,
    step_number: u32,
) -> EngineResult<OvertimeSplitResult> {
    let jurisdiction: Jurisdiction = jurisdiction_code.parse()?;
    let rule = OvertimeRule::for_jurisdiction(jurisdiction);

    let mut weeks: BTreeMap<NaiveDate, BTreeMap<NaiveDate, Decimal>> = BTreeMap::new();
    let mut excluded = 0usize;
    for entry in entries {
        let date = entry.parse_date()?;
        if entry.is_holiday || entry.hours <= Decimal::ZERO {
            excluded += 1;
            continue;
        }
        *weeks
            .entry(week_start(date))
            .or_default()
            .entry(date)
            .or_insert(Decimal::ZERO) += entry.hours;
    }

    let week_splits: Vec<WeekSplit> = weeks
        .iter()
        .map(|(start, days)| split_week(*start, days, &rule))
        .collect();

    let regular_hours = round_money(week_splits.iter().map(|w| w.regular_hours).sum());
    let overtime_hours = round_money(week_splits.iter().map(|w| w.overtime_hours).sum());
    let double_time_hours = round_money(week_splits.iter().map(|w| w.double_time_hours).sum());

    let audit_step = AuditStep {
        step_number,
        rule_id: "overtime_split".to_string(),
        rule_name: "Overtime Split".to_string(),
        formula_ref: format!("{} employment standards", jurisdiction),
        input: serde_json::json!({
            "jurisdiction": jurisdiction.code(),
            "entries": entries.len(),
            "excluded_entries": excluded,
            "daily_threshold": rule.daily_threshold.map(|d| d.to_string()),
            "double_time_threshold": rule.double_time_threshold.map(|d| d.to_string()),
            "weekly_threshold": rule.weekly_threshold.to_string()
        }),
        output: serde_json::json!({
            "weeks": week_splits.len(),
            "regular_hours": regular_hours.normalize().to_string(),
            "overtime_hours": overtime_hours.normalize().to_string(),
            "double_time_hours": double_time_hours.normalize().to_string()
        }),
        reasoning: if rule.is_daily() {
            format!(
                "Daily threshold {}h then weekly {}h over {} week(s): {}h regular, {}h overtime, {}h double time",
                rule.daily_threshold.unwrap_or_default(),
                rule.weekly_threshold,
                week_splits.len(),
                regular_hours.normalize(),
                overtime_hours.normalize(),
                double_time_hours.normalize()
            )
        } else {
            format!(
                "Weekly threshold {}h over {} week(s): {}h regular, {}h overtime",
                rule.weekly_threshold,
                week_splits.len(),
                regular_hours.normalize(),
                overtime_hours.normalize()
            )
        },
    };

    Ok(OvertimeSplitResult {
        rule,
        regular_hours,
        overtime_hours,
        double_time_hours,
        weeks: week_splits,
        audit_step,
    })
}
