use std::collections::HashMap;

use tracing::debug;

use crate::balance::{round_to_2_decimals, Balances, PersonalBalance, TOLERANCE};
use crate::error::{Result, SplitError};
use crate::schemas::{Person, PersonId, Settlement};

// Greedy matching: the largest debt is paid to the largest credit until one of
// them is cleared. This does not always reach the theoretical minimum number
// of transfers, but every round clears at least one party so it emits at most
// n - 1 settlements.
pub fn compute_settlements(
    balances: &Balances,
    people_by_id: &HashMap<PersonId, Person>,
) -> Result<Vec<Settlement>> {
    let mut debtors: Vec<PersonalBalance> = balances
        .iter()
        .filter(|entry| entry.balance < -TOLERANCE)
        .cloned()
        .collect();
    let mut creditors: Vec<PersonalBalance> = balances
        .iter()
        .filter(|entry| entry.balance > TOLERANCE)
        .cloned()
        .collect();

    // Stable sorts, so equal balances keep the order of the people list
    debtors.sort_by(|a, b| a.balance.total_cmp(&b.balance));
    creditors.sort_by(|a, b| b.balance.total_cmp(&a.balance));

    let mut settlements = Vec::new();
    let (mut d, mut c) = (0, 0);

    while d < debtors.len() && c < creditors.len() {
        let debtor = &mut debtors[d];
        let creditor = &mut creditors[c];
        let amount = (-debtor.balance).min(creditor.balance);

        if amount > TOLERANCE {
            settlements.push(Settlement {
                from: lookup(people_by_id, debtor.id)?,
                to: lookup(people_by_id, creditor.id)?,
                amount: round_to_2_decimals(amount),
            });
        }

        debtor.balance += amount;
        creditor.balance -= amount;

        if debtor.balance.abs() < TOLERANCE {
            d += 1;
        }
        if creditor.balance.abs() < TOLERANCE {
            c += 1;
        }
    }

    debug!(
        people = balances.len(),
        debtors = debtors.len(),
        creditors = creditors.len(),
        settlements = settlements.len(),
        "computed settlements"
    );
    Ok(settlements)
}

fn lookup(people_by_id: &HashMap<PersonId, Person>, id: PersonId) -> Result<Person> {
    people_by_id
        .get(&id)
        .cloned()
        .ok_or(SplitError::PersonNotFound(id))
}
