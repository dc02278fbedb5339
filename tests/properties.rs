//! Property-based tests for the deduction calculators.
//!
//! These check invariants that must hold for any input:
//! - CPP and EI never exceed their annual maxima
//! - Period tax does not fall as earnings rise
//! - Marginal-rate tax never exceeds naive annualization of the payment
//! - Marginal-rate bonus tax stays within the top combined rate
//! - The overtime split conserves hours
//! - Holiday premium pay does not depend on the regular-pay formula

use std::str::FromStr;
use std::sync::LazyLock;

use chrono::{Duration, NaiveDate};
use proptest::prelude::*;
use rust_decimal::{Decimal, RoundingStrategy};
use uuid::Uuid;

use payroll_engine::calculation::{
    AnnualTaxInput, CppInput, EiInput, HolidayPayInput, InMemoryEarningsFetcher,
    SupplementalIncome, annual_tax, calculate_cpp, calculate_ei, marginal_tax, split_overtime,
};
use payroll_engine::config::{CachedTaxTables, ConfigLoader, TaxTableProvider};
use payroll_engine::engine::PayrollEngine;
use payroll_engine::models::{
    CompensationType, DailyHoursEntry, Employee, EmploymentType, Jurisdiction, PayFrequency,
    PayPeriodInput, PeriodEarnings, YtdAccumulators,
};

static ENGINE: LazyLock<PayrollEngine<CachedTaxTables<ConfigLoader>>> = LazyLock::new(|| {
    let loader = ConfigLoader::new("./config").expect("Failed to load config");
    PayrollEngine::new(CachedTaxTables::new(loader))
});

fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn cents(amount: u64) -> Decimal {
    Decimal::new(amount as i64, 2)
}

fn biweekly(jurisdiction: Jurisdiction, earnings: PeriodEarnings) -> PayPeriodInput {
    PayPeriodInput {
        employee_id: "emp_prop".to_string(),
        jurisdiction,
        pay_date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
        frequency: PayFrequency::BiWeekly,
        earnings,
        retroactive_periods: 1,
        deductions: Default::default(),
        claims: Default::default(),
        exemptions: Default::default(),
    }
}

fn jurisdiction_strategy() -> impl Strategy<Value = Jurisdiction> {
    prop::sample::select(vec![
        Jurisdiction::Alberta,
        Jurisdiction::BritishColumbia,
        Jurisdiction::Manitoba,
        Jurisdiction::NewBrunswick,
        Jurisdiction::NewfoundlandAndLabrador,
        Jurisdiction::NovaScotia,
        Jurisdiction::NorthwestTerritories,
        Jurisdiction::Nunavut,
        Jurisdiction::Ontario,
        Jurisdiction::PrinceEdwardIsland,
        Jurisdiction::Saskatchewan,
        Jurisdiction::Yukon,
    ])
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn test_cpp_never_exceeds_annual_maximum(
        earnings in 0u64..2_000_000u64,
        ytd_base in 0u64..=403_410u64,
        ytd_additional in 0u64..=39_600u64,
    ) {
        let config = ENGINE.tables().cpp_config(2025).unwrap();
        let result = calculate_cpp(
            &CppInput {
                pensionable_earnings: cents(earnings),
                ytd_base: cents(ytd_base),
                ytd_additional: cents(ytd_additional),
                periods_per_year: 26,
                cpp_exempt: false,
                cpp2_exempt: false,
            },
            &config,
            1,
        ).unwrap();

        prop_assert!(result.base >= Decimal::ZERO);
        prop_assert!(result.additional >= Decimal::ZERO);
        prop_assert!(result.ytd_base <= config.max_base_contribution);
        prop_assert!(result.ytd_additional <= config.max_additional_contribution);
        prop_assert!(result.enhancement <= result.base);
    }

    #[test]
    fn test_cpp_top_up_is_remaining_room(ytd_base in 390_000u64..=403_410u64) {
        let config = ENGINE.tables().cpp_config(2025).unwrap();
        let ytd = cents(ytd_base);
        let result = calculate_cpp(
            &CppInput {
                pensionable_earnings: dec("5000.00"),
                ytd_base: ytd,
                ytd_additional: Decimal::ZERO,
                periods_per_year: 26,
                cpp_exempt: false,
                cpp2_exempt: false,
            },
            &config,
            1,
        ).unwrap();

        prop_assert_eq!(result.base, config.max_base_contribution - ytd);
    }

    #[test]
    fn test_ei_never_exceeds_annual_maximum(
        earnings in 0u64..2_000_000u64,
        ytd_insurable in 0u64..=6_570_000u64,
    ) {
        let config = ENGINE.tables().ei_config(2025).unwrap();
        let ytd_insurable = cents(ytd_insurable);
        let ytd_premium = (ytd_insurable * config.rate).round_dp(2);
        let result = calculate_ei(
            &EiInput {
                insurable_earnings: cents(earnings),
                ytd_insurable_earnings: ytd_insurable,
                ytd_premium,
                ei_exempt: false,
            },
            &config,
            1,
        );

        prop_assert!(result.employee_premium >= Decimal::ZERO);
        prop_assert!(result.ytd_premium <= config.max_employee_premium);
        prop_assert!(result.ytd_insurable_earnings <= config.max_insurable_earnings);
    }

    #[test]
    fn test_period_tax_is_monotonic(
        jurisdiction in jurisdiction_strategy(),
        low in 0u64..1_000_000u64,
        raise in 0u64..200_000u64,
    ) {
        let low = cents(low);
        let high = low + cents(raise);
        let at = |regular: Decimal| {
            ENGINE
                .calculate_period(
                    &biweekly(jurisdiction, PeriodEarnings { regular, ..PeriodEarnings::default() }),
                    &YtdAccumulators::default(),
                )
                .unwrap()
        };
        let (a, b) = (at(low), at(high));

        prop_assert!(b.deductions.federal_tax + Decimal::ONE >= a.deductions.federal_tax);
        prop_assert!(b.deductions.provincial_tax + Decimal::ONE >= a.deductions.provincial_tax);
        prop_assert!(b.net_pay + Decimal::ONE >= a.net_pay);
    }

    #[test]
    fn test_marginal_tax_never_exceeds_naive_annualization(
        base in 100_000u64..30_000_000u64,
        payment in 100_000u64..10_000_000u64,
    ) {
        let tables = ENGINE.tables();
        let federal = tables.tax_config(Jurisdiction::Federal, 2025, None).unwrap();
        let cpp = tables.cpp_config(2025).unwrap();
        let ei = tables.ei_config(2025).unwrap();
        let periods = Decimal::from(26);
        let base = cents(base);
        let payment = cents(payment);
        let at = |income: Decimal| AnnualTaxInput {
            annual_income: income,
            claim_amount: None,
            annual_cpp: Decimal::ZERO,
            annual_ei: Decimal::ZERO,
            other_credits: Decimal::ZERO,
        };

        let marginal = marginal_tax(
            &federal,
            &cpp,
            &ei,
            &at(base),
            &SupplementalIncome {
                taxable_amount: payment,
                cpp_contribution: Decimal::ZERO,
                ei_premium: Decimal::ZERO,
            },
        );
        let naive = (annual_tax(&federal, &cpp, &ei, &at(base + payment * periods)).annual_tax
            - annual_tax(&federal, &cpp, &ei, &at(base)).annual_tax)
            / periods;

        prop_assert!(
            marginal.tax <= naive + Decimal::ONE,
            "marginal {} exceeds naive {}",
            marginal.tax,
            naive
        );
    }

    #[test]
    fn test_bonus_tax_within_top_marginal_rate(
        regular in 100_000u64..800_000u64,
        bonus in 1u64..10_000_000u64,
    ) {
        let bonus = cents(bonus);
        let result = ENGINE
            .calculate_period(
                &biweekly(
                    Jurisdiction::BritishColumbia,
                    PeriodEarnings {
                        regular: cents(regular),
                        bonus,
                        ..PeriodEarnings::default()
                    },
                ),
                &YtdAccumulators::default(),
            )
            .unwrap();

        prop_assert!(result.deductions.bonus_tax >= Decimal::ZERO);
        prop_assert!(result.deductions.bonus_tax <= bonus * dec("0.54") + Decimal::ONE);
    }

    #[test]
    fn test_overtime_split_conserves_hours(
        code in prop::sample::select(vec!["BC", "AB", "SK", "ON", "NS", "NL"]),
        quarter_hours in prop::collection::vec(0u32..=64u32, 1..14),
    ) {
        let monday = NaiveDate::from_ymd_opt(2025, 3, 3).unwrap();
        let entries: Vec<DailyHoursEntry> = quarter_hours
            .iter()
            .enumerate()
            .map(|(i, q)| {
                let date = monday + Duration::days(i as i64);
                DailyHoursEntry::new(date.to_string(), Decimal::new(i64::from(*q) * 25, 2))
            })
            .collect();
        let total: Decimal = entries.iter().map(|e| e.hours).sum();

        let result = split_overtime(&entries, code, 1).unwrap();

        prop_assert_eq!(
            result.regular_hours + result.overtime_hours + result.double_time_hours,
            total
        );
        for week in &result.weeks {
            prop_assert!(week.regular_hours <= result.rule.weekly_threshold);
            if !result.rule.is_daily() {
                prop_assert_eq!(week.double_time_hours, Decimal::ZERO);
            }
        }
    }

    #[test]
    fn test_holiday_premium_independent_of_formula(
        quarter_hours in 0u32..=48u32,
        rate_cents in 1_500u64..10_000u64,
    ) {
        let hours = Decimal::new(i64::from(quarter_hours) * 25, 2);
        let rate = cents(rate_cents);
        let input = HolidayPayInput {
            employee: Employee {
                id: "emp_prop".to_string(),
                employment_type: EmploymentType::FullTime,
                compensation_type: CompensationType::Hourly,
                hire_date: NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
                hourly_rate: Some(rate),
            },
            holiday_date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            run_id: Uuid::new_v4(),
            hours_worked_on_holiday: hours,
            hourly_rate: None,
            current_period_gross: dec("2000.00"),
            current_period_days_worked: 10,
            worked_last_scheduled_day: false,
            worked_next_scheduled_day: true,
        };
        let expected = (hours * rate * dec("1.5"))
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        let fetcher = InMemoryEarningsFetcher::default();
        let rt = tokio::runtime::Runtime::new().unwrap();

        for jurisdiction in [
            Jurisdiction::BritishColumbia,
            Jurisdiction::Ontario,
            Jurisdiction::Alberta,
            Jurisdiction::Yukon,
        ] {
            let result = rt
                .block_on(ENGINE.calculate_holiday_pay(jurisdiction, &input, &fetcher))
                .unwrap();
            prop_assert_eq!(result.premium_pay, expected);
            prop_assert_eq!(result.total, result.regular_pay + result.premium_pay);
        }
    }
}
