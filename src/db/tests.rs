#![allow(clippy::unwrap_used)]

use super::*;
use chrono::NaiveDateTime;
use rust_decimal_macros::dec;

fn ts(s: &str) -> NaiveDateTime {
    parse_timestamp(s).unwrap()
}

fn user(name: &str) -> UserId {
    UserId::new(name).unwrap()
}

fn expense(owner: &UserId, title: &str, amount: Decimal, category: &str, date: &str) -> Expense {
    Expense {
        id: None,
        user_id: owner.clone(),
        title: title.into(),
        amount,
        category: category.into(),
        date: ts(date),
    }
}

fn budget(owner: &UserId, category: &str, limit: Decimal, period: Period, start: &str) -> Budget {
    Budget {
        id: None,
        user_id: owner.clone(),
        category: category.into(),
        limit,
        period,
        start_date: ts(start),
    }
}

fn window(start: &str, end: &str) -> DateWindow {
    DateWindow::between(ts(start), ts(end))
}

// ── Schema ────────────────────────────────────────────────────

#[test]
fn test_schema_version_recorded() {
    let db = Database::open_in_memory().unwrap();
    let version: i32 = db
        .conn
        .query_row("SELECT version FROM schema_version", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, schema::CURRENT_VERSION);
}

#[test]
fn test_open_fails_when_schema_version_row_missing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracker.db");
    Database::open(&path).unwrap();
    rusqlite::Connection::open(&path)
        .unwrap()
        .execute("DELETE FROM schema_version", [])
        .unwrap();

    let err = Database::open(&path).err().unwrap();
    assert_eq!(err.status_code(), 500);

    // The table was left alone rather than migrated from scratch
    let rows: i64 = rusqlite::Connection::open(&path)
        .unwrap()
        .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
        .unwrap();
    assert_eq!(rows, 0);
}

#[test]
fn test_open_fails_when_schema_version_unreadable() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracker.db");
    Database::open(&path).unwrap();
    rusqlite::Connection::open(&path)
        .unwrap()
        .execute("UPDATE schema_version SET version = 'abc'", [])
        .unwrap();

    let err = Database::open(&path).err().unwrap();
    assert!(matches!(err, TrackerError::Storage(_)));
}

#[test]
fn test_reopen_file_keeps_data() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracker.db");
    let alice = user("alice");

    {
        let db = Database::open(&path).unwrap();
        db.insert_expense(&expense(&alice, "Lunch", dec!(12.50), "Food", "2025-09-02 12:00:00"))
            .unwrap();
    }

    let db = Database::open(&path).unwrap();
    let all = db.get_expenses(&alice, &ExpenseFilter::default()).unwrap();
    assert_eq!(all.len(), 1);
    assert_eq!(all[0].amount, dec!(12.50));
}

// ── Expense CRUD ──────────────────────────────────────────────

#[test]
fn test_expense_crud() {
    let db = Database::open_in_memory().unwrap();
    let alice = user("alice");

    let created = db
        .insert_expense(&expense(&alice, "Groceries", dec!(42.10), "Food", "2025-09-02 09:15:00"))
        .unwrap();
    let id = created.id.unwrap();

    let fetched = db.get_expense(&alice, id).unwrap().unwrap();
    assert_eq!(fetched, created);
    assert_eq!(fetched.month_year(), "September 2025");

    let update = ExpenseUpdate {
        amount: Some(dec!(40)),
        date: Some(ts("2025-10-01 08:00:00")),
        ..Default::default()
    };
    let updated = db.update_expense(&alice, id, &update).unwrap().unwrap();
    assert_eq!(updated.amount, dec!(40));
    assert_eq!(updated.title, "Groceries");
    assert_eq!(updated.month_year(), "October 2025");

    let stored = db.get_expense(&alice, id).unwrap().unwrap();
    assert_eq!(stored, updated);

    assert!(db.delete_expense(&alice, id).unwrap());
    assert!(db.get_expense(&alice, id).unwrap().is_none());
    assert!(!db.delete_expense(&alice, id).unwrap());
}

#[test]
fn test_expense_not_found() {
    let db = Database::open_in_memory().unwrap();
    let alice = user("alice");
    assert!(db.get_expense(&alice, 99999).unwrap().is_none());

    let update = ExpenseUpdate {
        title: Some("x".into()),
        ..Default::default()
    };
    assert!(db.update_expense(&alice, 99999, &update).unwrap().is_none());
}

#[test]
fn test_expenses_are_private_to_owner() {
    let db = Database::open_in_memory().unwrap();
    let alice = user("alice");
    let bob = user("bob");

    let id = db
        .insert_expense(&expense(&alice, "Rent", dec!(900), "Housing", "2025-09-01 00:00:00"))
        .unwrap()
        .id
        .unwrap();

    assert!(db.get_expense(&bob, id).unwrap().is_none());
    assert!(db.get_expenses(&bob, &ExpenseFilter::default()).unwrap().is_empty());

    let update = ExpenseUpdate {
        amount: Some(dec!(1)),
        ..Default::default()
    };
    assert!(db.update_expense(&bob, id, &update).unwrap().is_none());
    assert!(!db.delete_expense(&bob, id).unwrap());

    let untouched = db.get_expense(&alice, id).unwrap().unwrap();
    assert_eq!(untouched.amount, dec!(900));
}

#[test]
fn test_expenses_newest_first() {
    let db = Database::open_in_memory().unwrap();
    let alice = user("alice");
    for date in ["2025-09-02 10:00:00", "2025-09-05 10:00:00", "2025-08-30 10:00:00"] {
        db.insert_expense(&expense(&alice, "Coffee", dec!(3), "Food", date)).unwrap();
    }
    let dates: Vec<String> = db
        .get_expenses(&alice, &ExpenseFilter::default())
        .unwrap()
        .iter()
        .map(|e| format_timestamp(&e.date))
        .collect();
    assert_eq!(
        dates,
        ["2025-09-05 10:00:00", "2025-09-02 10:00:00", "2025-08-30 10:00:00"]
    );
}

#[test]
fn test_expense_window_is_half_open() {
    let db = Database::open_in_memory().unwrap();
    let alice = user("alice");
    for date in [
        "2025-08-31 23:59:59",
        "2025-09-01 00:00:00",
        "2025-09-30 23:59:59",
        "2025-10-01 00:00:00",
    ] {
        db.insert_expense(&expense(&alice, "Item", dec!(1), "Misc", date)).unwrap();
    }

    let filter = ExpenseFilter {
        window: window("2025-09-01 00:00:00", "2025-10-01 00:00:00"),
        category: None,
    };
    let found = db.get_expenses(&alice, &filter).unwrap();
    assert_eq!(found.len(), 2);
    assert!(found.iter().all(|e| filter.window.contains(&e.date)));
}

#[test]
fn test_expense_category_filter() {
    let db = Database::open_in_memory().unwrap();
    let alice = user("alice");
    db.insert_expense(&expense(&alice, "Bus", dec!(2.75), "Travel", "2025-09-02 08:00:00"))
        .unwrap();
    db.insert_expense(&expense(&alice, "Lunch", dec!(11), "Food", "2025-09-02 12:00:00"))
        .unwrap();

    let filter = ExpenseFilter {
        category: Some("Travel".into()),
        ..Default::default()
    };
    let found = db.get_expenses(&alice, &filter).unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].title, "Bus");
}

#[test]
fn test_decimal_amount_exact_round_trip() {
    let db = Database::open_in_memory().unwrap();
    let alice = user("alice");
    let id = db
        .insert_expense(&expense(&alice, "Split", dec!(0.10), "Food", "2025-09-02 12:00:00"))
        .unwrap()
        .id
        .unwrap();
    let stored = db.get_expense(&alice, id).unwrap().unwrap();
    assert_eq!(stored.amount, dec!(0.10));
}

#[test]
fn test_corrupt_amount_is_reported() {
    let db = Database::open_in_memory().unwrap();
    db.conn
        .execute(
            "INSERT INTO expenses (user_id, title, amount, category, date)
             VALUES ('alice', 'Broken', 'twelve', 'Food', '2025-09-02 12:00:00')",
            [],
        )
        .unwrap();
    let err = db
        .get_expenses(&user("alice"), &ExpenseFilter::default())
        .unwrap_err();
    assert!(matches!(
        err,
        TrackerError::CorruptRecord {
            column: "amount",
            ..
        }
    ));
    assert_eq!(err.status_code(), 500);
}

// ── Budget CRUD ───────────────────────────────────────────────

#[test]
fn test_budget_crud() {
    let db = Database::open_in_memory().unwrap();
    let alice = user("alice");

    let created = db
        .insert_budget(&budget(&alice, "Food", dec!(300), Period::Monthly, "2025-09-01 00:00:00"))
        .unwrap();
    let id = created.id.unwrap();
    assert_eq!(db.get_budget(&alice, id).unwrap().unwrap(), created);

    let update = BudgetUpdate {
        limit: Some(dec!(350)),
        period: Some(Period::Weekly),
        ..Default::default()
    };
    let updated = db.update_budget(&alice, id, &update).unwrap().unwrap();
    assert_eq!(updated.limit, dec!(350));
    assert_eq!(updated.period, Period::Weekly);
    assert_eq!(updated.category, "Food");
    assert_eq!(db.get_budget(&alice, id).unwrap().unwrap(), updated);

    assert!(db.delete_budget(&alice, id).unwrap());
    assert!(db.get_budget(&alice, id).unwrap().is_none());
}

#[test]
fn test_budgets_are_private_to_owner() {
    let db = Database::open_in_memory().unwrap();
    let alice = user("alice");
    let bob = user("bob");
    let id = db
        .insert_budget(&budget(&alice, "Food", dec!(300), Period::Monthly, "2025-09-01 00:00:00"))
        .unwrap()
        .id
        .unwrap();

    assert!(db.get_budget(&bob, id).unwrap().is_none());
    assert!(db.get_budgets(&bob, &BudgetFilter::default()).unwrap().is_empty());
    assert!(db.get_budget_months(&bob).unwrap().is_empty());

    let update = BudgetUpdate {
        limit: Some(dec!(1)),
        ..Default::default()
    };
    assert!(db.update_budget(&bob, id, &update).unwrap().is_none());
    assert!(!db.delete_budget(&bob, id).unwrap());
}

#[test]
fn test_budget_filters() {
    let db = Database::open_in_memory().unwrap();
    let alice = user("alice");
    db.insert_budget(&budget(&alice, "Food", dec!(300), Period::Monthly, "2025-09-01 00:00:00"))
        .unwrap();
    db.insert_budget(&budget(&alice, "Coffee", dec!(20), Period::Weekly, "2025-09-14 00:00:00"))
        .unwrap();
    db.insert_budget(&budget(&alice, "Food", dec!(280), Period::Monthly, "2025-08-01 00:00:00"))
        .unwrap();

    let monthly = db
        .get_budgets(
            &alice,
            &BudgetFilter {
                period: Some(Period::Monthly),
                ..Default::default()
            },
        )
        .unwrap();
    let limits: Vec<Decimal> = monthly.iter().map(|b| b.limit).collect();
    assert_eq!(limits, [dec!(300), dec!(280)]);

    let september = db
        .get_budgets(
            &alice,
            &BudgetFilter {
                window: window("2025-09-01 00:00:00", "2025-10-01 00:00:00"),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(september.len(), 2);
    assert!(september.iter().all(|b| b.month_year() == "September 2025"));

    let coffee = db
        .get_budgets(
            &alice,
            &BudgetFilter {
                category: Some("Coffee".into()),
                ..Default::default()
            },
        )
        .unwrap();
    assert_eq!(coffee.len(), 1);
    assert_eq!(coffee[0].period, Period::Weekly);
}

#[test]
fn test_budget_months_distinct_and_chronological() {
    let db = Database::open_in_memory().unwrap();
    let alice = user("alice");
    for start in [
        "2025-09-01 00:00:00",
        "2024-12-01 00:00:00",
        "2025-09-15 00:00:00",
        "2025-01-01 00:00:00",
    ] {
        db.insert_budget(&budget(&alice, "Food", dec!(100), Period::Monthly, start))
            .unwrap();
    }
    assert_eq!(
        db.get_budget_months(&alice).unwrap(),
        ["December 2024", "January 2025", "September 2025"]
    );
}

#[test]
fn test_budget_month_follows_start_date_update() {
    let db = Database::open_in_memory().unwrap();
    let alice = user("alice");
    let id = db
        .insert_budget(&budget(&alice, "Food", dec!(100), Period::Monthly, "2025-09-01 00:00:00"))
        .unwrap()
        .id
        .unwrap();

    let update = BudgetUpdate {
        start_date: Some(ts("2025-11-01 00:00:00")),
        ..Default::default()
    };
    db.update_budget(&alice, id, &update).unwrap();
    assert_eq!(db.get_budget_months(&alice).unwrap(), ["November 2025"]);
}

#[test]
fn test_record_source_delegates() {
    let db = Database::open_in_memory().unwrap();
    let alice = user("alice");
    db.insert_expense(&expense(&alice, "Lunch", dec!(11), "Food", "2025-09-02 12:00:00"))
        .unwrap();
    db.insert_budget(&budget(&alice, "Food", dec!(100), Period::Monthly, "2025-09-01 00:00:00"))
        .unwrap();

    let source: &dyn RecordSource = &db;
    assert_eq!(source.find_expenses(&alice, &ExpenseFilter::default()).unwrap().len(), 1);
    assert_eq!(source.find_budgets(&alice, &BudgetFilter::default()).unwrap().len(), 1);
}
