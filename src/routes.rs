use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use actix_web::{delete, get, post, web, HttpResponse};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use crate::balance::Balances;
use crate::error::{Result, SplitError};
use crate::schemas::{Expense, ExpenseId, NewExpense, Person, PersonId};
use crate::session::{parse_amount, Session};

pub type SharedSession = web::Data<Mutex<Session>>;

#[derive(Deserialize, Serialize)]
struct PersonNameJson {
    name: String,
}

// Form fields arrive as typed text, API clients send numbers
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AmountJson {
    Number(f64),
    Text(String),
}

#[derive(Debug, Deserialize)]
struct ExpenseJson {
    description: String,
    amount: AmountJson,
    paid_by: PersonId,
    for_whom: Vec<PersonId>,
}

impl ExpenseJson {
    fn into_new_expense(self) -> Result<NewExpense> {
        let amount = match self.amount {
            AmountJson::Number(amount) => amount,
            AmountJson::Text(raw) => parse_amount(&raw)?,
        };
        Ok(NewExpense {
            description: self.description,
            amount,
            paid_by: self.paid_by,
            for_whom: self.for_whom,
        })
    }
}

#[derive(Debug, Serialize)]
struct SessionOverview<'a> {
    people: &'a [Person],
    expenses: &'a [Expense],
    can_add_expenses: bool,
    can_settle: bool,
}

#[derive(Debug, PartialEq, Serialize)]
struct BalanceLine {
    id: PersonId,
    name: String,
    balance: f64,
}

fn balance_lines(
    balances: &Balances,
    people_by_id: &HashMap<PersonId, Person>,
) -> Result<Vec<BalanceLine>> {
    balances
        .rounded()
        .into_iter()
        .map(|entry| {
            let person = people_by_id
                .get(&entry.id)
                .ok_or(SplitError::PersonNotFound(entry.id))?;
            Ok(BalanceLine {
                id: entry.id,
                name: person.name.clone(),
                balance: entry.balance,
            })
        })
        .collect()
}

fn lock(session: &SharedSession) -> Result<MutexGuard<'_, Session>> {
    session.lock().map_err(|_| SplitError::SessionUnavailable)
}

#[get("/health")]
async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

#[get("/people")]
async fn list_people(session: SharedSession) -> Result<HttpResponse> {
    let session = lock(&session)?;
    Ok(HttpResponse::Ok().json(session.people()))
}

#[post("/people")]
async fn add_person(
    session: SharedSession,
    json: web::Json<PersonNameJson>,
) -> Result<HttpResponse> {
    let person = lock(&session)?.add_person(&json.into_inner().name)?;
    Ok(HttpResponse::Created().json(person))
}

#[delete("/people/{id}")]
async fn remove_person(session: SharedSession, id: web::Path<PersonId>) -> Result<HttpResponse> {
    let removed = lock(&session)?.remove_person(id.into_inner())?;
    Ok(HttpResponse::Ok().json(removed))
}

#[get("/expenses")]
async fn list_expenses(session: SharedSession) -> Result<HttpResponse> {
    let session = lock(&session)?;
    Ok(HttpResponse::Ok().json(session.expenses()))
}

#[post("/expenses")]
async fn add_expense(
    session: SharedSession,
    expense: web::Json<ExpenseJson>,
) -> Result<HttpResponse> {
    let new_expense = expense.into_inner().into_new_expense()?;
    let expense = lock(&session)?.add_expense(new_expense)?;
    Ok(HttpResponse::Created().json(expense))
}

#[delete("/expenses/{id}")]
async fn remove_expense(
    session: SharedSession,
    id: web::Path<ExpenseId>,
) -> Result<HttpResponse> {
    let expense = lock(&session)?.remove_expense(id.into_inner())?;
    Ok(HttpResponse::Ok().json(expense))
}

#[get("/balances")]
async fn get_balances(session: SharedSession) -> Result<HttpResponse> {
    let session = lock(&session)?;
    let lines = balance_lines(&session.balances()?, &session.people_by_id())?;
    Ok(HttpResponse::Ok().json(lines))
}

#[get("/settlements")]
async fn get_settlements(session: SharedSession) -> Result<HttpResponse> {
    let settlements = lock(&session)?.settlements()?;
    info!(count = settlements.len(), "settlements served");
    Ok(HttpResponse::Ok().json(settlements))
}

#[get("/session")]
async fn get_session(session: SharedSession) -> Result<HttpResponse> {
    let session = lock(&session)?;
    Ok(HttpResponse::Ok().json(SessionOverview {
        people: session.people(),
        expenses: session.expenses(),
        can_add_expenses: session.can_add_expenses(),
        can_settle: session.can_settle(),
    }))
}

#[delete("/session")]
async fn reset_session(session: SharedSession) -> Result<HttpResponse> {
    lock(&session)?.reset();
    Ok(HttpResponse::NoContent().finish())
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(health)
        .service(list_people)
        .service(add_person)
        .service(remove_person)
        .service(list_expenses)
        .service(add_expense)
        .service(remove_expense)
        .service(get_balances)
        .service(get_settlements)
        .service(get_session)
        .service(reset_session);
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::Value;

    fn shared() -> SharedSession {
        web::Data::new(Mutex::new(Session::new()))
    }

    #[actix_web::test]
    async fn splits_a_dinner_over_http() {
        let session = shared();
        let app =
            test::init_service(App::new().app_data(session.clone()).configure(configure)).await;

        for name in ["Ana", "Luis"] {
            let req = test::TestRequest::post()
                .uri("/people")
                .set_json(json!({ "name": name }))
                .to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::CREATED);
        }

        let req = test::TestRequest::post()
            .uri("/expenses")
            .set_json(json!({
                "description": "Dinner",
                "amount": 100.0,
                "paid_by": 1,
                "for_whom": [1, 2]
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);

        let req = test::TestRequest::get().uri("/balances").to_request();
        let balances: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            balances,
            json!([
                { "id": 1, "name": "Ana", "balance": 50.0 },
                { "id": 2, "name": "Luis", "balance": -50.0 }
            ])
        );

        let req = test::TestRequest::get().uri("/settlements").to_request();
        let settlements: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            settlements,
            json!([{
                "from": { "id": 2, "name": "Luis" },
                "to": { "id": 1, "name": "Ana" },
                "amount": 50.0
            }])
        );
    }

    #[actix_web::test]
    async fn reports_errors_as_json() {
        let session = shared();
        let app =
            test::init_service(App::new().app_data(session.clone()).configure(configure)).await;

        for _ in 0..2 {
            let req = test::TestRequest::post()
                .uri("/people")
                .set_json(json!({ "name": "Ana" }))
                .to_request();
            test::call_service(&app, req).await;
        }
        let req = test::TestRequest::post()
            .uri("/people")
            .set_json(json!({ "name": "ana" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CONFLICT);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["type"], "duplicate_name");

        let req = test::TestRequest::delete().uri("/expenses/7").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    }

    #[actix_web::test]
    async fn accepts_typed_amounts() {
        let session = shared();
        {
            let mut session = session.lock().unwrap();
            session.add_person("A").unwrap();
            session.add_person("B").unwrap();
        }
        let app =
            test::init_service(App::new().app_data(session.clone()).configure(configure)).await;

        let req = test::TestRequest::post()
            .uri("/expenses")
            .set_json(json!({
                "description": "Groceries",
                "amount": " 42.50 ",
                "paid_by": 2,
                "for_whom": [1, 2]
            }))
            .to_request();
        let expense: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(expense["amount"], 42.5);

        let req = test::TestRequest::post()
            .uri("/expenses")
            .set_json(json!({
                "description": "Groceries",
                "amount": "forty",
                "paid_by": 2,
                "for_whom": [1, 2]
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["error"]["type"], "validation_error");
        assert_eq!(session.lock().unwrap().expenses().len(), 1);
    }

    #[actix_web::test]
    async fn session_overview_reports_progress() {
        let session = shared();
        let app =
            test::init_service(App::new().app_data(session.clone()).configure(configure)).await;

        let req = test::TestRequest::get().uri("/session").to_request();
        let overview: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(
            overview,
            json!({
                "people": [],
                "expenses": [],
                "can_add_expenses": false,
                "can_settle": false
            })
        );

        {
            let mut session = session.lock().unwrap();
            let a = session.add_person("A").unwrap().id;
            let b = session.add_person("B").unwrap().id;
            session
                .add_expense(NewExpense {
                    description: "Tickets".to_string(),
                    amount: 12.0,
                    paid_by: a,
                    for_whom: vec![b],
                })
                .unwrap();
        }

        let req = test::TestRequest::get().uri("/session").to_request();
        let overview: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(overview["people"].as_array().map(Vec::len), Some(2));
        assert_eq!(overview["expenses"].as_array().map(Vec::len), Some(1));
        assert_eq!(overview["can_add_expenses"], true);
        assert_eq!(overview["can_settle"], true);
    }

    #[::core::prelude::v1::test]
    fn balance_for_unknown_person_is_an_error() {
        let balances: Balances = [(1, 5.0), (2, -5.0)].into_iter().collect();
        let people: HashMap<PersonId, Person> = [(
            1,
            Person {
                id: 1,
                name: "A".to_string(),
            },
        )]
        .into_iter()
        .collect();

        assert_eq!(
            balance_lines(&balances, &people),
            Err(SplitError::PersonNotFound(2))
        );
    }

    #[actix_web::test]
    async fn removing_a_person_prunes_expenses() {
        let session = shared();
        {
            let mut session = session.lock().unwrap();
            let a = session.add_person("A").unwrap().id;
            let b = session.add_person("B").unwrap().id;
            session
                .add_expense(NewExpense {
                    description: "Taxi".to_string(),
                    amount: 30.0,
                    paid_by: a,
                    for_whom: vec![a, b],
                })
                .unwrap();
        }
        let app =
            test::init_service(App::new().app_data(session.clone()).configure(configure)).await;

        let req = test::TestRequest::delete().uri("/people/2").to_request();
        let removed: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(removed["person"]["name"], "B");
        assert_eq!(removed["expenses"].as_array().map(Vec::len), Some(1));

        let req = test::TestRequest::get().uri("/expenses").to_request();
        let expenses: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(expenses, json!([]));

        let req = test::TestRequest::delete().uri("/session").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::NO_CONTENT);
        assert!(session.lock().unwrap().people().is_empty());
    }
}
