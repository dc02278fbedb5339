//! Performance benchmarks for the Payroll Deduction Engine.
//!
//! This benchmark suite covers the hot paths of a payroll run:
//! - Single pay period with regular pay only
//! - Single pay period with bonus and retroactive pay
//! - A full 26-period year for one employee
//! - Batch of 1000 employees
//! - Overtime split over two weeks of hours
//! - Holiday pay with an in-memory earnings fetcher
//!
//! Run with: `cargo bench`
//! HTML reports are generated in `target/criterion/`

use chrono::{Duration, NaiveDate};
use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use rust_decimal::Decimal;
use uuid::Uuid;

use payroll_engine::calculation::{
    EarningsRecord, HolidayPayInput, InMemoryEarningsFetcher, split_overtime,
};
use payroll_engine::config::{CachedTaxTables, ConfigLoader};
use payroll_engine::engine::PayrollEngine;
use payroll_engine::models::{
    CompensationType, DailyHoursEntry, Employee, EmploymentType, HistoricalEarnings,
    Jurisdiction, PayPeriodInput, RunStatus, YtdAccumulators,
};

/// Creates an engine over the shipped tables.
fn create_engine() -> PayrollEngine<CachedTaxTables<ConfigLoader>> {
    let loader = ConfigLoader::new("./config").expect("Failed to load config");
    PayrollEngine::new(CachedTaxTables::new(loader))
}

/// Creates a bi-weekly pay period request.
fn create_request(
    employee_id: &str,
    jurisdiction: &str,
    earnings: serde_json::Value,
) -> PayPeriodInput {
    let request_json = serde_json::json!({
        "employee_id": employee_id,
        "jurisdiction": jurisdiction,
        "pay_date": "2025-03-14",
        "frequency": "bi_weekly",
        "earnings": earnings,
        "deductions": { "rrsp": "100.00", "union_dues": "20.00" }
    });

    serde_json::from_value(request_json).expect("Failed to create request")
}

/// Creates two weeks of daily hours, starting on a Monday.
fn create_hours(days: usize) -> Vec<DailyHoursEntry> {
    let monday = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
    (0..days)
        .map(|i| {
            let hours = if i % 3 == 0 { 12 } else { 8 };
            DailyHoursEntry::new(
                (monday + Duration::days(i as i64)).to_string(),
                Decimal::from(hours),
            )
        })
        .collect()
}

/// Benchmark: Single pay period with regular pay.
fn bench_single_period(c: &mut Criterion) {
    let engine = create_engine();
    let request = create_request("emp_bench_001", "ON", serde_json::json!({ "regular": "2500.00" }));
    let ytd = YtdAccumulators::default();

    // Warm the table cache
    engine.calculate_period(&request, &ytd).unwrap();

    c.bench_function("single_period", |b| {
        b.iter(|| black_box(engine.calculate_period(black_box(&request), &ytd).unwrap()))
    });
}

/// Benchmark: Single pay period with bonus and retroactive pay.
fn bench_supplemental_period(c: &mut Criterion) {
    let engine = create_engine();
    let request = create_request(
        "emp_bench_002",
        "BC",
        serde_json::json!({ "regular": "2500.00", "bonus": "5000.00", "retroactive": "750.00" }),
    );
    let ytd = YtdAccumulators::default();
    engine.calculate_period(&request, &ytd).unwrap();

    c.bench_function("supplemental_period", |b| {
        b.iter(|| black_box(engine.calculate_period(black_box(&request), &ytd).unwrap()))
    });
}

/// Benchmark: One employee across a full bi-weekly year.
fn bench_full_year(c: &mut Criterion) {
    let engine = create_engine();
    let request = create_request("emp_bench_003", "AB", serde_json::json!({ "regular": "3500.00" }));
    engine
        .calculate_period(&request, &YtdAccumulators::default())
        .unwrap();

    let mut group = c.benchmark_group("full_year");
    group.throughput(Throughput::Elements(26));

    group.bench_function("periods_26", |b| {
        b.iter(|| {
            let mut ytd = YtdAccumulators::default();
            for _ in 0..26 {
                ytd = engine.calculate_period(&request, &ytd).unwrap().ytd;
            }
            black_box(ytd)
        })
    });

    group.finish();
}

/// Benchmark: Batch of 1000 employees across every province.
fn bench_batch_1000(c: &mut Criterion) {
    let engine = create_engine();
    let provinces = [
        "AB", "BC", "MB", "NB", "NL", "NS", "NT", "NU", "ON", "PE", "SK", "YT",
    ];

    // Pre-create 1000 different requests
    let requests: Vec<PayPeriodInput> = (0..1000)
        .map(|i| {
            let regular = format!("{}.00", 1500 + (i % 40) * 100);
            create_request(
                &format!("emp_batch_{:04}", i),
                provinces[i % provinces.len()],
                serde_json::json!({ "regular": regular }),
            )
        })
        .collect();
    let ytd = YtdAccumulators::default();
    for request in &requests {
        engine.calculate_period(request, &ytd).unwrap();
    }

    let mut group = c.benchmark_group("batch_processing");
    group.throughput(Throughput::Elements(1000));
    // Reduce sample size for large batches to keep benchmark time reasonable
    group.sample_size(10);

    group.bench_function("batch_1000", |b| {
        b.iter(|| {
            let results: Vec<_> = requests
                .iter()
                .map(|request| engine.calculate_period(request, &ytd).unwrap())
                .collect();
            black_box(results)
        })
    });

    group.finish();
}

/// Benchmark: Overtime split at various timesheet lengths.
fn bench_overtime_split(c: &mut Criterion) {
    let mut group = c.benchmark_group("overtime_split");

    for days in [1, 5, 7, 14].iter() {
        let entries = create_hours(*days);
        group.throughput(Throughput::Elements(*days as u64));
        group.bench_with_input(BenchmarkId::new("days", days), days, |b, _| {
            b.iter(|| black_box(split_overtime(black_box(&entries), "BC", 1).unwrap()))
        });
    }

    group.finish();
}

/// Benchmark: Holiday pay over 30 days of paid history.
fn bench_holiday_pay(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let engine = create_engine();
    let records: Vec<EarningsRecord> = (1..=30)
        .map(|day| EarningsRecord {
            employee_id: "emp_bench_004".to_string(),
            run_id: Uuid::new_v4(),
            status: RunStatus::Paid,
            pay_date: NaiveDate::from_ymd_opt(2025, 6, day).unwrap(),
            earnings: HistoricalEarnings {
                wages: Decimal::from(200),
                days_worked: 1,
                hours_worked: Decimal::from(8),
                ..HistoricalEarnings::default()
            },
        })
        .collect();
    let fetcher = InMemoryEarningsFetcher::new(records);
    let input = HolidayPayInput {
        employee: Employee {
            id: "emp_bench_004".to_string(),
            employment_type: EmploymentType::FullTime,
            compensation_type: CompensationType::Hourly,
            hire_date: NaiveDate::from_ymd_opt(2020, 1, 6).unwrap(),
            hourly_rate: Some(Decimal::from(25)),
        },
        holiday_date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
        run_id: Uuid::new_v4(),
        hours_worked_on_holiday: Decimal::from(8),
        hourly_rate: None,
        current_period_gross: Decimal::from(2000),
        current_period_days_worked: 10,
        worked_last_scheduled_day: true,
        worked_next_scheduled_day: true,
    };

    c.bench_function("holiday_pay", |b| {
        b.to_async(&rt).iter(|| async {
            black_box(
                engine
                    .calculate_holiday_pay(Jurisdiction::BritishColumbia, &input, &fetcher)
                    .await
                    .unwrap(),
            )
        })
    });
}

criterion_group!(
    benches,
    bench_single_period,
    bench_supplemental_period,
    bench_full_year,
    bench_batch_1000,
    bench_overtime_split,
    bench_holiday_pay,
);
criterion_main!(benches);
