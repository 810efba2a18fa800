//! The data access the report builders need, and its SQLite implementation.

use rusqlite::Connection;
use rust_decimal::Decimal;
use time::Date;

use crate::{
    Error,
    auth::UserID,
    budget::{Budget, get_budgets},
    calendar::{DateRange, YearMonth},
    expense::{
        CategorySpending, get_expense_months, sum_expenses_by_category,
        sum_expenses_by_category_between, sum_expenses_by_month,
    },
    saving::sum_savings,
    settings::{get_or_create_learning_start_date, get_settings},
};

/// Read access to a user's budgets, expenses and savings.
///
/// Every method is scoped to a single user.
pub trait ReportStore {
    /// The user's budgets.
    fn budgets(&self, user_id: UserID) -> Result<Vec<Budget>, Error>;

    /// The date the user started tracking, if set.
    fn tracking_start(&self, user_id: UserID) -> Result<Option<Date>, Error>;

    /// Expense totals and counts per category within the half-open `range`.
    fn sum_expenses_by_category(
        &self,
        user_id: UserID,
        range: &DateRange,
    ) -> Result<Vec<CategorySpending>, Error>;

    /// Expense totals per category between two optional, inclusive dates.
    fn sum_expenses_by_category_between(
        &self,
        user_id: UserID,
        start: Option<Date>,
        end: Option<Date>,
    ) -> Result<Vec<CategorySpending>, Error>;

    /// Expense totals per month from `since` onwards, oldest first.
    fn sum_expenses_by_month(
        &self,
        user_id: UserID,
        since: Date,
    ) -> Result<Vec<(YearMonth, Decimal)>, Error>;

    /// The months with at least one expense, oldest first.
    fn expense_months(&self, user_id: UserID) -> Result<Vec<YearMonth>, Error>;

    /// The total saved within the half-open `range`.
    fn sum_savings(&self, user_id: UserID, range: &DateRange) -> Result<Decimal, Error>;

    /// The start of the learning period, starting it `today` if it has not started yet.
    fn learning_start_date(&self, user_id: UserID, today: Date) -> Result<Date, Error>;
}

/// A [ReportStore] backed by the application's SQLite database.
#[derive(Debug, Clone, Copy)]
pub struct SQLiteReportStore<'a> {
    connection: &'a Connection,
}

impl<'a> SQLiteReportStore<'a> {
    /// Create a store that queries `connection`.
    pub fn new(connection: &'a Connection) -> Self {
        Self { connection }
    }
}

impl ReportStore for SQLiteReportStore<'_> {
    fn budgets(&self, user_id: UserID) -> Result<Vec<Budget>, Error> {
        get_budgets(user_id, self.connection)
    }

    fn tracking_start(&self, user_id: UserID) -> Result<Option<Date>, Error> {
        get_settings(user_id, self.connection).map(|settings| settings.tracking_start_date)
    }

    fn sum_expenses_by_category(
        &self,
        user_id: UserID,
        range: &DateRange,
    ) -> Result<Vec<CategorySpending>, Error> {
        sum_expenses_by_category(user_id, range, self.connection)
    }

    fn sum_expenses_by_category_between(
        &self,
        user_id: UserID,
        start: Option<Date>,
        end: Option<Date>,
    ) -> Result<Vec<CategorySpending>, Error> {
        sum_expenses_by_category_between(user_id, start, end, self.connection)
    }

    fn sum_expenses_by_month(
        &self,
        user_id: UserID,
        since: Date,
    ) -> Result<Vec<(YearMonth, Decimal)>, Error> {
        sum_expenses_by_month(user_id, since, self.connection)
    }

    fn expense_months(&self, user_id: UserID) -> Result<Vec<YearMonth>, Error> {
        get_expense_months(user_id, self.connection)
    }

    fn sum_savings(&self, user_id: UserID, range: &DateRange) -> Result<Decimal, Error> {
        sum_savings(user_id, range, self.connection)
    }

    fn learning_start_date(&self, user_id: UserID, today: Date) -> Result<Date, Error> {
        get_or_create_learning_start_date(user_id, today, self.connection)
    }
}

#[cfg(test)]
pub(crate) mod stub {
    //! An in-memory [ReportStore] for testing report builders without a database.

    use std::cell::Cell;

    use rust_decimal::Decimal;
    use time::Date;

    use crate::{
        Error,
        auth::UserID,
        budget::Budget,
        calendar::{DateRange, YearMonth},
        expense::CategorySpending,
    };

    use super::ReportStore;

    /// One expense: date, category and amount.
    pub(crate) type StubExpense = (Date, &'static str, Decimal);

    #[derive(Debug, Default)]
    pub(crate) struct StubReportStore {
        pub budgets: Vec<Budget>,
        pub tracking_start: Option<Date>,
        pub expenses: Vec<StubExpense>,
        pub savings: Vec<(Date, Decimal)>,
        pub learning_start: Cell<Option<Date>>,
        /// Number of store calls, for checking validation happens first.
        pub calls: Cell<u32>,
    }

    impl StubReportStore {
        fn record_call(&self) {
            self.calls.set(self.calls.get() + 1);
        }

        fn group(&self, include: impl Fn(Date) -> bool) -> Vec<CategorySpending> {
            let mut groups: Vec<CategorySpending> = Vec::new();

            for (date, category, amount) in &self.expenses {
                if !include(*date) {
                    continue;
                }

                match groups.iter_mut().find(|group| group.category == *category) {
                    Some(group) => {
                        group.total += *amount;
                        group.count += 1;
                    }
                    None => groups.push(CategorySpending {
                        category: (*category).to_owned(),
                        total: *amount,
                        count: 1,
                    }),
                }
            }

            groups.sort_by(|a, b| a.category.cmp(&b.category));
            groups
        }
    }

    impl ReportStore for StubReportStore {
        fn budgets(&self, _user_id: UserID) -> Result<Vec<Budget>, Error> {
            self.record_call();
            Ok(self.budgets.clone())
        }

        fn tracking_start(&self, _user_id: UserID) -> Result<Option<Date>, Error> {
            self.record_call();
            Ok(self.tracking_start)
        }

        fn sum_expenses_by_category(
            &self,
            _user_id: UserID,
            range: &DateRange,
        ) -> Result<Vec<CategorySpending>, Error> {
            self.record_call();
            Ok(self.group(|date| range.contains(date)))
        }

        fn sum_expenses_by_category_between(
            &self,
            _user_id: UserID,
            start: Option<Date>,
            end: Option<Date>,
        ) -> Result<Vec<CategorySpending>, Error> {
            self.record_call();
            Ok(self.group(|date| {
                start.is_none_or(|start| date >= start) && end.is_none_or(|end| date <= end)
            }))
        }

        fn sum_expenses_by_month(
            &self,
            _user_id: UserID,
            since: Date,
        ) -> Result<Vec<(YearMonth, Decimal)>, Error> {
            self.record_call();
            let mut totals: Vec<(YearMonth, Decimal)> = Vec::new();

            for (date, _, amount) in self.expenses.iter().filter(|(date, ..)| *date >= since) {
                let month = YearMonth::of(*date);
                match totals.iter_mut().find(|(other, _)| *other == month) {
                    Some((_, total)) => *total += *amount,
                    None => totals.push((month, *amount)),
                }
            }

            totals.sort();
            Ok(totals)
        }

        fn expense_months(&self, _user_id: UserID) -> Result<Vec<YearMonth>, Error> {
            self.record_call();
            let mut months: Vec<_> = self
                .expenses
                .iter()
                .map(|(date, ..)| YearMonth::of(*date))
                .collect();
            months.sort();
            months.dedup();
            Ok(months)
        }

        fn sum_savings(&self, _user_id: UserID, range: &DateRange) -> Result<Decimal, Error> {
            self.record_call();
            Ok(self
                .savings
                .iter()
                .filter(|(date, _)| range.contains(*date))
                .map(|(_, amount)| *amount)
                .sum())
        }

        fn learning_start_date(&self, _user_id: UserID, today: Date) -> Result<Date, Error> {
            self.record_call();
            let start = self.learning_start.get().unwrap_or(today);
            self.learning_start.set(Some(start));
            Ok(start)
        }
    }
}
