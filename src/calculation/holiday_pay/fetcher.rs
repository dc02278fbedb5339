//! The earnings-history collaborator consumed by holiday pay.

use std::future::Future;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::EngineResult;
use crate::models::{EarningsQuery, HistoricalEarnings, RunStatus};

/// Supplies an employee's aggregated earnings over a lookback window.
///
/// Implementations must honour every field of the query: only runs whose
/// status is listed count, and the run named by `exclude_run_id` never
/// does. Failures should be reported as `EarningsFetchFailed`.
pub trait EarningsFetcher: Send + Sync {
    /// Aggregates the employee's earnings matching `query`.
    fn fetch_earnings(
        &self,
        query: &EarningsQuery,
    ) -> impl Future<Output = EngineResult<HistoricalEarnings>> + Send;
}

/// One employee's earnings from one payroll run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EarningsRecord {
    /// The employee.
    pub employee_id: String,
    /// The run that paid these earnings.
    pub run_id: Uuid,
    /// The run's status.
    pub status: RunStatus,
    /// The date the run paid.
    pub pay_date: NaiveDate,
    /// Earnings paid by the run.
    pub earnings: HistoricalEarnings,
}

/// An [`EarningsFetcher`] over records held in memory.
///
/// # Example
///
/// ```
/// use payroll_engine::calculation::{EarningsFetcher, EarningsRecord, InMemoryEarningsFetcher};
/// use payroll_engine::models::{EarningsQuery, HistoricalEarnings, RunStatus};
/// use chrono::NaiveDate;
/// use rust_decimal::Decimal;
/// use uuid::Uuid;
///
/// let fetcher = InMemoryEarningsFetcher::new(vec![EarningsRecord {
///     employee_id: "emp_001".to_string(),
///     run_id: Uuid::new_v4(),
///     status: RunStatus::Paid,
///     pay_date: NaiveDate::from_ymd_opt(2025, 6, 13).unwrap(),
///     earnings: HistoricalEarnings {
///         wages: Decimal::from(2000),
///         days_worked: 10,
///         ..HistoricalEarnings::default()
///     },
/// }]);
///
/// let query = EarningsQuery {
///     employee_id: "emp_001".to_string(),
///     window_start: NaiveDate::from_ymd_opt(2025, 6, 1).unwrap(),
///     window_end: NaiveDate::from_ymd_opt(2025, 6, 30).unwrap(),
///     statuses: RunStatus::COMPLETED.to_vec(),
///     exclude_run_id: None,
/// };
///
/// let rt = tokio::runtime::Runtime::new().unwrap();
/// let history = rt.block_on(fetcher.fetch_earnings(&query)).unwrap();
/// assert_eq!(history.wages, Decimal::from(2000));
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryEarningsFetcher {
    records: Vec<EarningsRecord>,
}

impl InMemoryEarningsFetcher {
    /// Creates a fetcher over `records`.
    pub fn new(records: Vec<EarningsRecord>) -> Self {
        Self { records }
    }

    /// Adds a record.
    pub fn push(&mut self, record: EarningsRecord) {
        self.records.push(record);
    }

    fn matches(record: &EarningsRecord, query: &EarningsQuery) -> bool {
        record.employee_id == query.employee_id
            && query.contains(record.pay_date)
            && query.statuses.contains(&record.status)
            && query.exclude_run_id != Some(record.run_id)
    }

    /// Aggregates matching records without awaiting.
    pub fn aggregate(&self, query: &EarningsQuery) -> HistoricalEarnings {
        self.records
            .iter()
            .filter(|record| Self::matches(record, query))
            .fold(HistoricalEarnings::default(), |mut total, record| {
                let e = &record.earnings;
                total.wages += e.wages;
                total.overtime_wages += e.overtime_wages;
                total.vacation_pay += e.vacation_pay;
                total.holiday_pay += e.holiday_pay;
                total.commission += e.commission;
                total.days_worked += e.days_worked;
                total.hours_worked += e.hours_worked;
                total
            })
    }
}

impl EarningsFetcher for InMemoryEarningsFetcher {
    async fn fetch_earnings(&self, query: &EarningsQuery) -> EngineResult<HistoricalEarnings> {
        Ok(self.aggregate(query))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 6, d).unwrap()
    }

    fn record(run_id: Uuid, status: RunStatus, pay_date: NaiveDate, wages: i64) -> EarningsRecord {
        EarningsRecord {
            employee_id: "emp_001".to_string(),
            run_id,
            status,
            pay_date,
            earnings: HistoricalEarnings {
                wages: Decimal::from(wages),
                days_worked: 5,
                ..HistoricalEarnings::default()
            },
        }
    }

    fn query(exclude: Option<Uuid>) -> EarningsQuery {
        EarningsQuery {
            employee_id: "emp_001".to_string(),
            window_start: date(1),
            window_end: date(30),
            statuses: RunStatus::COMPLETED.to_vec(),
            exclude_run_id: exclude,
        }
    }

    #[tokio::test]
    async fn test_only_completed_runs_in_window_count() {
        let fetcher = InMemoryEarningsFetcher::new(vec![
            record(Uuid::new_v4(), RunStatus::Paid, date(6), 1000),
            record(Uuid::new_v4(), RunStatus::Approved, date(20), 1000),
            record(Uuid::new_v4(), RunStatus::Draft, date(13), 1000),
            record(Uuid::new_v4(), RunStatus::Paid, NaiveDate::from_ymd_opt(2025, 5, 30).unwrap(), 1000),
        ]);

        let history = fetcher.fetch_earnings(&query(None)).await.unwrap();
        assert_eq!(history.wages, Decimal::from(2000));
        assert_eq!(history.days_worked, 10);
    }

    #[tokio::test]
    async fn test_in_progress_run_is_excluded() {
        let current = Uuid::new_v4();
        let fetcher = InMemoryEarningsFetcher::new(vec![
            record(Uuid::new_v4(), RunStatus::Paid, date(6), 1000),
            record(current, RunStatus::Approved, date(20), 1000),
        ]);

        let history = fetcher.fetch_earnings(&query(Some(current))).await.unwrap();
        assert_eq!(history.wages, Decimal::from(1000));
    }

    #[tokio::test]
    async fn test_other_employees_are_ignored() {
        let mut other = record(Uuid::new_v4(), RunStatus::Paid, date(6), 5000);
        other.employee_id = "emp_002".to_string();
        let mut fetcher = InMemoryEarningsFetcher::default();
        fetcher.push(other);

        let history = fetcher.fetch_earnings(&query(None)).await.unwrap();
        assert!(history.is_empty());
    }
}
