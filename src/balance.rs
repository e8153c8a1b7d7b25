use std::collections::HashMap;

use serde::Serialize;
use tracing::debug;

use crate::error::{Result, SplitError};
use crate::schemas::{Expense, Person, PersonId};

/// Smallest balance magnitude treated as nonzero (one cent).
pub const TOLERANCE: f64 = 0.01;

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PersonalBalance {
    pub id: PersonId,
    pub balance: f64,
}

/// Net balance per person, positive when owed and negative when owing.
///
/// Entries keep the order of the people they were computed from, which is the
/// order settlements fall back to when two balances are equal.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Balances {
    entries: Vec<PersonalBalance>,
    index: HashMap<PersonId, usize>,
}

impl Balances {
    fn with_people(people: &[Person]) -> Self {
        let mut balances = Balances::default();
        for person in people {
            balances.insert(person.id, 0.0);
        }
        balances
    }

    /// Inserts a balance, replacing the existing one for the same person.
    pub fn insert(&mut self, id: PersonId, balance: f64) {
        match self.index.get(&id) {
            Some(&position) => self.entries[position].balance = balance,
            None => {
                self.index.insert(id, self.entries.len());
                self.entries.push(PersonalBalance { id, balance });
            }
        }
    }

    pub fn get(&self, id: PersonId) -> Option<f64> {
        self.index.get(&id).map(|&position| self.entries[position].balance)
    }

    fn get_mut(&mut self, id: PersonId) -> Result<&mut f64> {
        let position = *self.index.get(&id).ok_or(SplitError::PersonNotFound(id))?;
        Ok(&mut self.entries[position].balance)
    }

    pub fn iter(&self) -> impl Iterator<Item = &PersonalBalance> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn total(&self) -> f64 {
        self.entries.iter().map(|entry| entry.balance).sum()
    }

    // Two-decimal view for display; settlements work on the unrounded values
    pub fn rounded(&self) -> Vec<PersonalBalance> {
        self.entries
            .iter()
            .map(|entry| PersonalBalance {
                id: entry.id,
                balance: round_to_2_decimals(entry.balance),
            })
            .collect()
    }
}

impl FromIterator<(PersonId, f64)> for Balances {
    fn from_iter<I: IntoIterator<Item = (PersonId, f64)>>(iter: I) -> Self {
        let mut balances = Balances::default();
        for (id, balance) in iter {
            balances.insert(id, balance);
        }
        balances
    }
}

/// Computes every person's net balance from scratch.
///
/// The payer is credited the full amount and each beneficiary is debited an
/// equal share, so a payer who is also a beneficiary ends up owing their own
/// share. Without expenses the result is empty.
pub fn compute_balances(people: &[Person], expenses: &[Expense]) -> Result<Balances> {
    if expenses.is_empty() {
        return Ok(Balances::default());
    }

    let mut balances = Balances::with_people(people);
    for expense in expenses {
        if expense.for_whom.is_empty() {
            return Err(SplitError::Validation(format!(
                "expense {} has no beneficiaries",
                expense.id
            )));
        }
        let amount = expense.amount;
        *balances.get_mut(expense.paid_by)? += amount;

        let amount_per_receiver = amount / expense.for_whom.len() as f64;
        for &receiver in &expense.for_whom {
            *balances.get_mut(receiver)? -= amount_per_receiver;
        }
    }

    debug!(
        people = people.len(),
        expenses = expenses.len(),
        "computed balances"
    );
    Ok(balances)
}

pub fn round_to_2_decimals(n: f64) -> f64 {
    (n * 100.0).round() / 100.0
}
