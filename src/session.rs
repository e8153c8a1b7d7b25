//! The people and expenses of one splitting session.
//!
//! A [`Session`] is owned by its caller and plays both registries: it assigns
//! stable ids, rejects invalid input before it reaches the engine and keeps
//! every expense pointing at existing people by cascading removals.

use std::collections::HashMap;

use chrono::Utc;
use serde::Serialize;
use tracing::{debug, info};

use crate::balance::{compute_balances, Balances};
use crate::error::{Result, SplitError};
use crate::schemas::{Expense, ExpenseId, NewExpense, Person, PersonId, Settlement};
use crate::settlement::compute_settlements;

#[derive(Clone, Debug, Default)]
pub struct Session {
    people: Vec<Person>,
    expenses: Vec<Expense>,
    next_person_id: PersonId,
    next_expense_id: ExpenseId,
}

/// A removed person together with the expenses that went with them.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct RemovedPerson {
    pub person: Person,
    pub expenses: Vec<Expense>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn people(&self) -> &[Person] {
        &self.people
    }

    pub fn expenses(&self) -> &[Expense] {
        &self.expenses
    }

    pub fn person(&self, id: PersonId) -> Option<&Person> {
        self.people.iter().find(|person| person.id == id)
    }

    pub fn people_by_id(&self) -> HashMap<PersonId, Person> {
        self.people
            .iter()
            .map(|person| (person.id, person.clone()))
            .collect()
    }

    pub fn add_person(&mut self, name: &str) -> Result<Person> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SplitError::Validation("name must not be empty".into()));
        }
        let lowercase = name.to_lowercase();
        if self
            .people
            .iter()
            .any(|person| person.name.to_lowercase() == lowercase)
        {
            return Err(SplitError::DuplicateName(name.to_string()));
        }

        self.next_person_id += 1;
        let person = Person {
            id: self.next_person_id,
            name: name.to_string(),
        };
        info!(id = person.id, name = %person.name, "person added");
        self.people.push(person.clone());
        Ok(person)
    }

    /// Removes a person and every expense they paid for or share.
    pub fn remove_person(&mut self, id: PersonId) -> Result<RemovedPerson> {
        let position = self
            .people
            .iter()
            .position(|person| person.id == id)
            .ok_or(SplitError::PersonNotFound(id))?;
        let person = self.people.remove(position);

        let (removed, kept): (Vec<Expense>, Vec<Expense>) = self
            .expenses
            .drain(..)
            .partition(|expense| expense.involves(id));
        self.expenses = kept;

        info!(
            id,
            name = %person.name,
            cascaded = removed.len(),
            "person removed"
        );
        Ok(RemovedPerson {
            person,
            expenses: removed,
        })
    }

    pub fn add_expense(&mut self, new_expense: NewExpense) -> Result<Expense> {
        let description = new_expense.description.trim();
        if description.is_empty() {
            return Err(SplitError::Validation(
                "description must not be empty".into(),
            ));
        }
        validate_amount(new_expense.amount)?;
        if self.person(new_expense.paid_by).is_none() {
            return Err(SplitError::PersonNotFound(new_expense.paid_by));
        }
        if new_expense.for_whom.is_empty() {
            return Err(SplitError::Validation(
                "an expense needs at least one beneficiary".into(),
            ));
        }

        let mut for_whom: Vec<PersonId> = Vec::with_capacity(new_expense.for_whom.len());
        for id in new_expense.for_whom {
            if self.person(id).is_none() {
                return Err(SplitError::PersonNotFound(id));
            }
            if !for_whom.contains(&id) {
                for_whom.push(id);
            }
        }

        self.next_expense_id += 1;
        let expense = Expense {
            id: self.next_expense_id,
            description: description.to_string(),
            amount: new_expense.amount,
            paid_by: new_expense.paid_by,
            for_whom,
            created_at: Utc::now(),
        };
        info!(
            id = expense.id,
            amount = expense.amount,
            paid_by = expense.paid_by,
            beneficiaries = expense.for_whom.len(),
            "expense added"
        );
        self.expenses.push(expense.clone());
        Ok(expense)
    }

    pub fn remove_expense(&mut self, id: ExpenseId) -> Result<Expense> {
        let position = self
            .expenses
            .iter()
            .position(|expense| expense.id == id)
            .ok_or(SplitError::ExpenseNotFound(id))?;
        let expense = self.expenses.remove(position);
        info!(id, "expense removed");
        Ok(expense)
    }

    // Adding expenses only makes sense once there is someone to split with
    pub fn can_add_expenses(&self) -> bool {
        self.people.len() >= 2
    }

    pub fn can_settle(&self) -> bool {
        !self.expenses.is_empty()
    }

    pub fn balances(&self) -> Result<Balances> {
        compute_balances(&self.people, &self.expenses)
    }

    pub fn settlements(&self) -> Result<Vec<Settlement>> {
        let balances = self.balances()?;
        compute_settlements(&balances, &self.people_by_id())
    }

    pub fn reset(&mut self) {
        debug!(
            people = self.people.len(),
            expenses = self.expenses.len(),
            "session reset"
        );
        *self = Session::default();
    }
}

/// Parses a raw amount as typed by a user.
pub fn parse_amount(raw: &str) -> Result<f64> {
    let amount = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| SplitError::Validation(format!("`{}` is not a valid amount", raw.trim())))?;
    validate_amount(amount)?;
    Ok(amount)
}

fn validate_amount(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(SplitError::Validation(format!(
            "amount must be a positive number, got {amount}"
        )));
    }
    Ok(())
}
