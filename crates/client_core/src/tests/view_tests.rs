use super::*;
use crate::test_support::{client_with, person_id, FakeTransport, Reply};
use serde_json::json;
use shared::{domain::Avatar, error::ErrorKind};

fn ready_len(state: &ViewState<PersonList>) -> Option<usize> {
    state.ready().map(|persons| persons.len())
}

#[tokio::test]
async fn last_dispatch_wins_over_slower_earlier_one() {
    let transport = FakeTransport::new();
    let slow = transport.gate(5);
    let client = client_with(transport.clone());
    let list = PersonListController::new(client);

    let first = list
        .dispatch(PersonsQuery::politicians(5))
        .expect("dispatch 5")
        .expect("fetch spawned");
    assert!(list.state().is_loading());

    let second = list
        .dispatch(PersonsQuery::politicians(12))
        .expect("dispatch 12")
        .expect("fetch spawned");
    second.await.expect("join 12");
    assert_eq!(ready_len(&list.state()), Some(12));

    slow.notify_one();
    first.await.expect("join 5");
    assert_eq!(ready_len(&list.state()), Some(12));
    assert_eq!(list.current_query(), Some(PersonsQuery::politicians(12)));
}

#[tokio::test]
async fn unmounted_view_ignores_late_result() {
    let transport = FakeTransport::new();
    let gate = transport.gate(4);
    let client = client_with(transport.clone());
    let list = PersonListController::new(Arc::clone(&client));
    let mut rx = list.subscribe();

    let handle = list
        .dispatch(PersonsQuery::politicians(4))
        .expect("dispatch")
        .expect("fetch spawned");
    assert!(rx.borrow_and_update().is_loading());

    list.unmount();
    assert!(!list.is_mounted());
    gate.notify_one();
    handle.await.expect("join");

    assert!(!rx.has_changed().expect("sender alive"));
    assert!(list.state().is_loading());
    // The shared store still takes the result.
    let cached = client.cached(&PersonsQuery::politicians(4)).expect("key");
    assert_eq!(cached.map(|persons| persons.len()), Some(4));
}

#[tokio::test]
async fn dispatch_after_unmount_is_a_no_op() {
    let transport = FakeTransport::new();
    let list = PersonListController::new(client_with(transport.clone()));
    list.unmount();

    let handle = list
        .dispatch(PersonsQuery::politicians(2))
        .expect("dispatch");
    assert!(handle.is_none());
    assert_eq!(transport.calls(), 0);
    assert_eq!(list.current_query(), None);
}

#[tokio::test]
async fn dropping_controller_mid_flight_is_harmless() {
    let transport = FakeTransport::new();
    let gate = transport.gate(3);
    let client = client_with(transport.clone());

    let list = PersonListController::new(Arc::clone(&client));
    let handle = list
        .dispatch(PersonsQuery::politicians(3))
        .expect("dispatch")
        .expect("fetch spawned");
    drop(list);

    gate.notify_one();
    handle.await.expect("task finishes without panicking");
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn invalid_limit_is_rejected_without_state_change() {
    let transport = FakeTransport::new();
    let list = PersonListController::new(client_with(transport.clone()));
    let mut rx = list.subscribe();
    rx.borrow_and_update();

    let err = list
        .dispatch(PersonsQuery::politicians(-1))
        .expect_err("negative limit");
    assert_eq!(err.kind, ErrorKind::InvalidParameters);
    assert_eq!(transport.calls(), 0);
    assert!(!rx.has_changed().expect("sender alive"));
    assert_eq!(list.current_query(), None);
}

#[tokio::test]
async fn cached_result_settles_without_fetching() {
    let transport = FakeTransport::new();
    let client = client_with(transport.clone());
    let query = PersonsQuery::billionaires(6);
    client.fetch(&query).await.expect("warm cache");

    let list = PersonListController::new(client);
    let handle = list.dispatch(query).expect("dispatch");
    assert!(handle.is_none());
    assert_eq!(ready_len(&list.state()), Some(6));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn error_then_retry_reaches_ready() {
    let transport = FakeTransport::new();
    let list = PersonListController::new(client_with(transport.clone()));
    transport.fail_next(CoreError::network("offline"));

    list.dispatch(PersonsQuery::politicians(2))
        .expect("dispatch")
        .expect("fetch spawned")
        .await
        .expect("join");
    let state = list.state();
    assert_eq!(state.error().map(|err| err.kind), Some(ErrorKind::NetworkError));
    assert!(list.cards().expect("cards").is_empty());

    list.retry()
        .expect("retry")
        .expect("fetch spawned")
        .await
        .expect("join");
    assert_eq!(ready_len(&list.state()), Some(2));
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn retry_before_any_dispatch_is_invalid() {
    let list = PersonListController::new(client_with(FakeTransport::new()));
    let err = list.retry().expect_err("nothing to retry");
    assert_eq!(err.kind, ErrorKind::InvalidParameters);
}

#[tokio::test]
async fn links_resolve_by_index_and_id() {
    let transport = FakeTransport::new();
    let list = PersonListController::new(client_with(transport.clone()));
    assert!(list.link_at(0).is_none());

    list.dispatch(PersonsQuery::politicians(3))
        .expect("dispatch")
        .expect("fetch spawned")
        .await
        .expect("join");

    let link = list.link_at(2).expect("third entry");
    assert_eq!(link.id.as_str(), person_id(3, 2));
    assert_eq!(link.full_name, "Member 2");
    assert!(list.link_at(3).is_none());

    let by_id = list
        .link_for(&PersonId::new(person_id(3, 0)))
        .expect("first entry");
    assert_eq!(by_id.full_name, "Member 0");
    assert!(list.link_for(&PersonId::new("nobody")).is_none());
}

#[tokio::test]
async fn cards_carry_formatted_amounts() {
    let transport = FakeTransport::new();
    transport.push_reply(Reply::Body(json!({
        "data": { "persons": [{
            "id": "b-1",
            "fullName": "Ada Fortune",
            "type": "BILLIONAIRE",
            "yearlyPassiveIncome": 1234567.4,
            "wealthTaxContribution": 9_980_000.0,
            "estimatedWealth": 1_000_000_000.0
        }] }
    })));
    let list = PersonListController::new(client_with(transport));

    list.dispatch(PersonsQuery::billionaires(1))
        .expect("dispatch")
        .expect("fetch spawned")
        .await
        .expect("join");

    let cards = list.cards().expect("cards");
    assert_eq!(cards.len(), 1);
    assert_eq!(cards[0].name, "Ada Fortune");
    assert_eq!(cards[0].avatar, Avatar::Placeholder('A'));
    assert_eq!(cards[0].yearly_passive_income, "£1,234,567");
    assert_eq!(cards[0].wealth_tax_contribution, "£9,980,000");
    assert_eq!(cards[0].estimated_wealth.as_deref(), Some("£1,000,000,000"));
}

#[tokio::test]
async fn detail_uses_link_name_until_loaded_then_cache() {
    let transport = FakeTransport::new();
    transport.push_reply(Reply::Body(json!({
        "data": { "persons": [{
            "id": "mp-9",
            "fullName": "Jane Doe",
            "title": "Rt Hon",
            "constituency": "Holborn",
            "party": "Labour"
        }] }
    })));
    let client = client_with(transport.clone());
    let source = PersonsQuery::politicians(1);
    let list = PersonListController::new(Arc::clone(&client));
    list.dispatch(source.clone())
        .expect("dispatch")
        .expect("fetch spawned")
        .await
        .expect("join");

    let link = list.link_at(0).expect("link");
    let detail = PersonDetailController::open(Arc::clone(&client), link, source);
    assert_eq!(detail.title(), "Jane Doe");
    assert_eq!(detail.card().expect("card"), None);

    assert!(detail.load().expect("load").is_none());
    assert_eq!(detail.title(), "Rt Hon Jane Doe");
    let card = detail.card().expect("card").expect("ready");
    assert_eq!(card.subtitle.as_deref(), Some("Holborn • Labour"));
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn detail_fetches_source_query_when_not_cached() {
    let transport = FakeTransport::new();
    let client = client_with(transport.clone());
    let link = PersonLink {
        id: PersonId::new(person_id(3, 1)),
        full_name: "Member 1".to_string(),
    };
    let detail = PersonDetailController::open(client, link, PersonsQuery::politicians(3));

    detail
        .load()
        .expect("load")
        .expect("fetch spawned")
        .await
        .expect("join");
    let state = detail.state();
    let person = state.ready().expect("ready");
    assert_eq!(person.id(), detail.id());
    assert_eq!(transport.calls(), 1);
}

#[tokio::test]
async fn detail_reports_not_found_for_absent_id() {
    let transport = FakeTransport::new();
    let link = PersonLink {
        id: PersonId::new("ghost"),
        full_name: "Nobody".to_string(),
    };
    let detail =
        PersonDetailController::open(client_with(transport), link, PersonsQuery::politicians(2));

    detail
        .load()
        .expect("load")
        .expect("fetch spawned")
        .await
        .expect("join");
    assert_eq!(
        detail.state().error().map(|err| err.kind),
        Some(ErrorKind::NotFound)
    );
    assert_eq!(detail.title(), "Nobody");
}

#[tokio::test]
async fn unmounted_detail_ignores_load() {
    let transport = FakeTransport::new();
    let link = PersonLink {
        id: PersonId::new("x"),
        full_name: "X".to_string(),
    };
    let detail = PersonDetailController::open(
        client_with(transport.clone()),
        link,
        PersonsQuery::politicians(1),
    );
    detail.unmount();
    assert!(detail.load().expect("load").is_none());
    assert_eq!(transport.calls(), 0);
}
