//! Upgrades older snapshot layouts to the current one.
//!
//! Versions `1.0` and `2.0` stored a flat camelCase state with numeric money
//! values and a cached `remaining` per bucket. `1.0` values may be strings or
//! integers. Migration runs on raw JSON so it never depends on the current
//! Rust types being able to read the old shape.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::{prelude::FromPrimitive, Decimal};
use serde_json::{json, Map, Value};
use tracing::info;

use crate::{
    errors::{BudgetError, Result},
    ledger::{month_start, BucketKey},
    money::Money,
};

use super::CURRENT_VERSION;

const LEGACY_PLAN_FIELDS: [&str; 3] = ["monthlyAllowance", "fixedWeek1Budget", "weeks2to4Budget"];

/// Brings `snapshot` up to [`CURRENT_VERSION`] in place and returns a note per step.
///
/// `fallback_month` anchors states that never recorded which month they belong to.
pub fn upgrade(snapshot: &mut Value, fallback_month: NaiveDate) -> Result<Vec<String>> {
    let mut notes = Vec::new();
    loop {
        let version = snapshot_version(snapshot)?;
        match version.as_str() {
            "1.0" => {
                v1_to_v2(snapshot)?;
                notes.push("1.0 -> 2.0: normalized monetary fields".to_string());
            }
            "2.0" => {
                v2_to_v3(snapshot, fallback_month)?;
                notes.push("2.0 -> 3.0: added week, lock and income history fields".to_string());
            }
            CURRENT_VERSION => break,
            other => {
                return Err(BudgetError::StorageError(format!(
                    "snapshot version {other} is not supported (current is {CURRENT_VERSION})"
                )))
            }
        }
    }
    for note in &notes {
        info!(step = note.as_str(), "snapshot migrated");
    }
    Ok(notes)
}

/// Reads the version tag. Untagged snapshots are treated as `1.0`.
pub fn snapshot_version(snapshot: &Value) -> Result<String> {
    match snapshot.get("version") {
        None | Some(Value::Null) => Ok("1.0".to_string()),
        Some(Value::String(tag)) => Ok(tag.clone()),
        Some(Value::Number(number)) => Ok(format!("{:.1}", number.as_f64().unwrap_or_default())),
        Some(other) => Err(BudgetError::StorageError(format!(
            "unexpected snapshot version tag {other}"
        ))),
    }
}

/// Converts a legacy money value (number, numeric string or null) into the
/// canonical two-place string.
pub fn coerce_money(value: &Value) -> Result<Value> {
    let money = match value {
        Value::Null => Money::ZERO,
        Value::Number(number) => {
            let decimal = match number.as_i64() {
                Some(int) => Some(Decimal::from(int)),
                None => number.as_f64().and_then(Decimal::from_f64),
            };
            decimal.map(Money::new).ok_or_else(|| {
                BudgetError::StorageError(format!("cannot read monetary value {number}"))
            })?
        }
        Value::String(raw) if raw.trim().is_empty() => Money::ZERO,
        Value::String(raw) => Money::from_str(raw)
            .map_err(|_| BudgetError::StorageError(format!("cannot read monetary value `{raw}`")))?,
        other => {
            return Err(BudgetError::StorageError(format!(
                "cannot read monetary value {other}"
            )))
        }
    };
    Ok(Value::String(money.to_string()))
}

fn v1_to_v2(snapshot: &mut Value) -> Result<()> {
    let state = state_object(snapshot)?;
    for field in LEGACY_PLAN_FIELDS {
        coerce_field(state, field)?;
    }
    if let Some(Value::Object(needs)) = state.get_mut("needs") {
        for bucket in needs.values_mut() {
            if let Value::Object(bucket) = bucket {
                for field in ["allocated", "spent"] {
                    coerce_field(bucket, field)?;
                }
                bucket.remove("remaining");
                coerce_expense_list(bucket.get_mut("expenses"))?;
            }
        }
    }
    if let Some(Value::Object(income)) = state.get_mut("income") {
        coerce_field(income, "total")?;
        for kind in ["savings", "personal"] {
            if let Some(Value::Object(account)) = income.get_mut(kind) {
                coerce_field(account, "balance")?;
                coerce_field(account, "spent")?;
                coerce_expense_list(account.get_mut("expenses"))?;
            }
        }
    }
    coerce_expense_list(state.get_mut("allExpenses"))?;
    set_version(snapshot, "2.0");
    Ok(())
}

fn v2_to_v3(snapshot: &mut Value, fallback_month: NaiveDate) -> Result<()> {
    let recorded_at = snapshot
        .get("lastSaved")
        .or_else(|| snapshot.get("saved_at"))
        .and_then(Value::as_str)
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|instant| instant.with_timezone(&Utc));
    let saved_at = recorded_at.unwrap_or_else(Utc::now);
    let legacy = state_object(snapshot)?.clone();

    let mut all_expenses: Vec<Value> = Vec::new();
    let mut needs = Map::new();
    for key in BucketKey::ALL {
        let bucket = legacy
            .get("needs")
            .and_then(|needs| needs.get(key.key()))
            .cloned()
            .unwrap_or(Value::Null);
        let expenses = convert_expenses(bucket.get("expenses"), key.key())?;
        all_expenses.extend(expenses.iter().cloned());
        needs.insert(
            key.key().to_string(),
            json!({
                "key": key.key(),
                "allocated": coerce_money(bucket.get("allocated").unwrap_or(&Value::Null))?,
                "spent": coerce_money(bucket.get("spent").unwrap_or(&Value::Null))?,
                "expenses": expenses,
                "ended": false,
            }),
        );
    }

    let mut income = Map::new();
    for kind in ["savings", "personal"] {
        let account = legacy
            .get("income")
            .and_then(|income| income.get(kind))
            .cloned()
            .unwrap_or(Value::Null);
        let expenses = convert_expenses(account.get("expenses"), kind)?;
        all_expenses.extend(expenses.iter().cloned());
        income.insert(
            kind.to_string(),
            json!({
                "kind": kind,
                "balance": coerce_money(account.get("balance").unwrap_or(&Value::Null))?,
                "spent": coerce_money(account.get("spent").unwrap_or(&Value::Null))?,
                "expenses": expenses,
            }),
        );
    }

    let mut ordered: Vec<(String, i64)> = all_expenses
        .iter()
        .filter_map(|expense| {
            let id = expense.get("id")?.as_i64()?;
            let timestamp = expense.get("timestamp")?.as_str()?.to_string();
            Some((timestamp, id))
        })
        .collect();
    ordered.sort_by(|a, b| b.cmp(a));
    let history: Vec<i64> = ordered.iter().map(|(_, id)| *id).collect();
    let last_entry_id = ordered.iter().map(|(_, id)| *id).max();

    let allowance = coerce_money(legacy.get("monthlyAllowance").unwrap_or(&Value::Null))?;
    let week1 = coerce_money(legacy.get("fixedWeek1Budget").unwrap_or(&Value::Null))?;
    let weekly = coerce_money(legacy.get("weeks2to4Budget").unwrap_or(&Value::Null))?;
    let locked = needs.values().any(|bucket| {
        bucket
            .get("allocated")
            .and_then(Value::as_str)
            .and_then(|raw| Money::from_str(raw).ok())
            .is_some_and(Money::is_positive)
    });
    let month_anchor = legacy
        .get("lastResetDate")
        .and_then(Value::as_str)
        .and_then(|raw| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
        .or_else(|| recorded_at.map(|instant| instant.date_naive()))
        .unwrap_or(fallback_month);

    let mut state = json!({
        "plan": {
            "monthly_allowance": allowance,
            "fixed_week1_budget": week1,
            "weeks2to4_budget": weekly,
            "leftover": "0.00",
            "locked": locked,
        },
        "needs": needs,
        "income": income,
        "history": history,
        "external_income": [],
        "month_anchor": month_start(month_anchor).to_string(),
    });
    if let (Some(id), Value::Object(map)) = (last_entry_id, &mut state) {
        map.insert("last_entry_id".to_string(), json!(id));
    }

    *snapshot = json!({
        "version": "3.0",
        "saved_at": saved_at.to_rfc3339(),
        "saved_by": "",
        "state": state,
    });
    Ok(())
}

fn state_object(snapshot: &mut Value) -> Result<&mut Map<String, Value>> {
    snapshot
        .get_mut("state")
        .and_then(Value::as_object_mut)
        .ok_or_else(|| BudgetError::StorageError("snapshot has no state object".into()))
}

fn set_version(snapshot: &mut Value, version: &str) {
    if let Value::Object(map) = snapshot {
        map.insert("version".to_string(), Value::String(version.to_string()));
    }
}

fn coerce_field(object: &mut Map<String, Value>, field: &str) -> Result<()> {
    let value = object.get(field).cloned().unwrap_or(Value::Null);
    object.insert(field.to_string(), coerce_money(&value)?);
    Ok(())
}

fn coerce_expense_list(list: Option<&mut Value>) -> Result<()> {
    if let Some(Value::Array(expenses)) = list {
        for expense in expenses.iter_mut() {
            if let Value::Object(expense) = expense {
                coerce_field(expense, "amount")?;
            }
        }
    }
    Ok(())
}

/// Rewrites legacy expenses into the current shape, filling in a category
/// from the owner and a timestamp from the date when they are missing.
fn convert_expenses(list: Option<&Value>, owner: &str) -> Result<Vec<Value>> {
    let Some(Value::Array(expenses)) = list else {
        return Ok(Vec::new());
    };
    let mut converted = Vec::with_capacity(expenses.len());
    for expense in expenses {
        let id = expense
            .get("id")
            .and_then(|id| id.as_i64().or_else(|| id.as_f64().map(|float| float as i64)))
            .ok_or_else(|| BudgetError::StorageError("legacy expense without an id".into()))?;
        let date = expense
            .get("date")
            .and_then(Value::as_str)
            .ok_or_else(|| BudgetError::StorageError(format!("legacy expense {id} has no date")))?;
        let timestamp = expense
            .get("timestamp")
            .and_then(Value::as_str)
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|instant| instant.with_timezone(&Utc).to_rfc3339())
            .unwrap_or_else(|| format!("{date}T00:00:00+00:00"));
        converted.push(json!({
            "id": id,
            "amount": coerce_money(expense.get("amount").unwrap_or(&Value::Null))?,
            "category": expense.get("category").and_then(Value::as_str).unwrap_or(owner),
            "description": expense.get("description").and_then(Value::as_str).unwrap_or(""),
            "date": date,
            "timestamp": timestamp,
        }));
    }
    Ok(converted)
}
