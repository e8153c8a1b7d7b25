use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type PersonId = u64;
pub type ExpenseId = u64;

#[derive(Clone, Debug, PartialEq, Eq, Hash, Deserialize, Serialize)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
}

#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct Expense {
    pub id: ExpenseId,
    pub description: String,
    pub amount: f64,
    pub paid_by: PersonId,
    pub for_whom: Vec<PersonId>,
    pub created_at: DateTime<Utc>,
}

impl Expense {
    /// Whether the person paid for this expense or shares its cost.
    pub fn involves(&self, person: PersonId) -> bool {
        self.paid_by == person || self.for_whom.contains(&person)
    }
}

// What a caller submits before the session assigns an id
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct NewExpense {
    pub description: String,
    pub amount: f64,
    pub paid_by: PersonId,
    pub for_whom: Vec<PersonId>,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Settlement {
    pub from: Person,
    pub to: Person,
    pub amount: f64,
}
