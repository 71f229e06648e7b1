use super::*;
use crate::error::{RejectionKind, StoreError};
use crate::memory::MemoryBackend;

async fn store() -> ContactStore<MemoryBackend> {
    let mut store = ContactStore::new(MemoryBackend::new());
    store.initialize_schema().await.unwrap();
    store
}

async fn add(
    store: &mut ContactStore<MemoryBackend>,
    first_name: &str,
    surname: &str,
    email: &str,
    phone: Option<&str>,
) -> AddedClient {
    store
        .add_client(NewClient::new(first_name, surname, email), phone)
        .await
        .unwrap()
        .unwrap()
}

fn ids(clients: &[Client]) -> Vec<i32> {
    clients.iter().map(|c| c.client_id).collect()
}

#[tokio::test]
async fn schema_operations_are_idempotent() {
    let mut store = store().await;
    add(&mut store, "Ivan", "Ivanov", "ivan@mail.ru", None).await;

    store.initialize_schema().await.unwrap();
    assert_eq!(store.backend().client_count(), 1);

    store.drop_schema().await.unwrap();
    store.drop_schema().await.unwrap();
    assert!(store.find_by_client_id(1).await.is_err());

    store.initialize_schema().await.unwrap();
    assert!(store.find_by_client_id(1).await.unwrap().is_none());
}

#[tokio::test]
async fn add_client_assigns_fresh_ids() {
    let mut store = store().await;
    let first = add(&mut store, "Ivan", "Ivanov", "ivan@mail.ru", None).await;
    let second = add(&mut store, "Ivan", "Petrov", "ivanpetrov@mail.ru", None).await;

    assert!(first.client.client_id > 0);
    assert_ne!(first.client.client_id, second.client.client_id);
    assert!(first.phone.is_none());
    assert_eq!(
        store.find_by_email("ivanpetrov@mail.ru").await.unwrap(),
        Some(second.client)
    );
}

#[tokio::test]
async fn add_client_with_phone() {
    let mut store = store().await;
    let added = add(&mut store, "Petr", "Petrov", "petr@mail.ru", Some("100")).await;

    let phone = added.phone.unwrap();
    assert_eq!(phone.phone_number, "100");
    assert_eq!(phone.client_id, added.client.client_id);
    assert_eq!(store.find_by_phone_number("100").await.unwrap(), Some(phone));
}

#[tokio::test]
async fn add_client_with_taken_email_changes_nothing() {
    let mut store = store().await;
    add(&mut store, "Ivan", "Ivanov", "ivan@mail.ru", None).await;

    let rejected = store
        .add_client(NewClient::new("Sidr", "Sidorov", "ivan@mail.ru"), Some("900"))
        .await
        .unwrap()
        .unwrap_err();

    assert_eq!(rejected, Rejection::EmailTaken("ivan@mail.ru".into()));
    assert_eq!(rejected.kind(), RejectionKind::Conflict);
    assert_eq!(store.backend().client_count(), 1);
    assert_eq!(store.backend().phone_count(), 0);
}

#[tokio::test]
async fn add_client_with_taken_phone_is_atomic() {
    let mut store = store().await;
    add(&mut store, "Petr", "Petrov", "petr@mail.ru", Some("100")).await;

    let rejected = store
        .add_client(NewClient::new("Sidr", "Sidorov", "sidr@mail.ru"), Some("100"))
        .await
        .unwrap()
        .unwrap_err();

    assert_eq!(rejected, Rejection::PhoneTaken("100".into()));
    assert!(store.find_by_email("sidr@mail.ru").await.unwrap().is_none());
    assert_eq!(store.backend().client_count(), 1);
}

#[tokio::test]
async fn add_client_with_over_long_values_fails() {
    let mut store = store().await;

    let result = store
        .add_client(
            NewClient::new("Aleksandra-Konstantina", "Ivanova", "aleksandra@mail.ru"),
            Some("+7 999 123 45 67"),
        )
        .await;

    assert!(matches!(result, Err(StoreError::ValueTooLong(_))));
    assert_eq!(store.backend().client_count(), 0);
    assert_eq!(store.backend().phone_count(), 0);
}

#[tokio::test]
async fn add_phone_number_conflicts_across_clients() {
    let mut store = store().await;
    let ivan = add(&mut store, "Ivan", "Ivanov", "ivan@mail.ru", None).await.client;
    let petr = add(&mut store, "Petr", "Petrov", "petr@mail.ru", None).await.client;

    let phone = store
        .add_phone_number(ivan.client_id, "300")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(phone.client_id, ivan.client_id);

    for owner in [ivan.client_id, petr.client_id] {
        let rejected = store
            .add_phone_number(owner, "300")
            .await
            .unwrap()
            .unwrap_err();
        assert_eq!(rejected, Rejection::PhoneTaken("300".into()));
    }
    assert_eq!(store.backend().phone_count(), 1);
}

#[tokio::test]
async fn add_phone_number_to_unknown_client() {
    let mut store = store().await;

    let rejected = store.add_phone_number(6, "600").await.unwrap().unwrap_err();

    assert_eq!(rejected, Rejection::ClientNotFound(6));
    assert_eq!(rejected.kind(), RejectionKind::NotFound);
    assert_eq!(store.backend().phone_count(), 0);
}

#[tokio::test]
async fn list_phone_numbers_in_insertion_order() {
    let mut store = store().await;
    let ivan = add(&mut store, "Ivan", "Ivanov", "ivan@mail.ru", Some("300")).await.client;
    store.add_phone_number(ivan.client_id, "400").await.unwrap().unwrap();
    store.add_phone_number(ivan.client_id, "500").await.unwrap().unwrap();

    let numbers: Vec<String> = store
        .list_phone_numbers(ivan.client_id)
        .await
        .unwrap()
        .into_iter()
        .map(|p| p.phone_number)
        .collect();
    assert_eq!(numbers, ["300", "400", "500"]);
    assert!(store.list_phone_numbers(99).await.unwrap().is_empty());
}

#[tokio::test]
async fn update_client_fields() {
    let mut store = store().await;
    let ivan = add(&mut store, "Ivan", "Ivanov", "ivan@mail.ru", None).await.client;

    let updated = store
        .update_client(ivan.client_id, ClientUpdate::new("Ivan1", "Ivanov1", "ivan1@mail.ru"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.phone, PhoneChange::NotRequested);
    assert_eq!(
        store.find_by_client_id(ivan.client_id).await.unwrap(),
        Some(Client {
            client_id: ivan.client_id,
            first_name: "Ivan1".into(),
            surname: "Ivanov1".into(),
            email: "ivan1@mail.ru".into(),
        })
    );
}

#[tokio::test]
async fn update_client_may_keep_its_own_email() {
    let mut store = store().await;
    let ivan = add(&mut store, "Ivan", "Ivanov", "ivan@mail.ru", None).await.client;

    let updated = store
        .update_client(ivan.client_id, ClientUpdate::new("Ivan", "Sidorov", "ivan@mail.ru"))
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.client.surname, "Sidorov");
    assert_eq!(updated.client.email, "ivan@mail.ru");
}

#[tokio::test]
async fn update_client_to_another_clients_email() {
    let mut store = store().await;
    let ivan = add(&mut store, "Ivan", "Ivanov", "ivan@mail.ru", None).await.client;
    add(&mut store, "Petr", "Petrov", "petr@mail.ru", None).await;

    let rejected = store
        .update_client(ivan.client_id, ClientUpdate::new("Ivan1", "Ivanov1", "petr@mail.ru"))
        .await
        .unwrap()
        .unwrap_err();

    assert_eq!(rejected, Rejection::EmailTaken("petr@mail.ru".into()));
    assert_eq!(store.find_by_client_id(ivan.client_id).await.unwrap(), Some(ivan));
}

#[tokio::test]
async fn update_unknown_client() {
    let mut store = store().await;

    let rejected = store
        .update_client(6, ClientUpdate::new("Ivan1", "Ivanov1", "ivan@mail.ru11"))
        .await
        .unwrap()
        .unwrap_err();

    assert_eq!(rejected, Rejection::ClientNotFound(6));
    assert_eq!(store.backend().client_count(), 0);
}

#[tokio::test]
async fn update_client_renumbers_phone() {
    let mut store = store().await;
    let added = add(&mut store, "Ivan", "Ivanov", "ivan@mail.ru", Some("300")).await;
    let phone_id = added.phone.unwrap().phone_id;

    let updated = store
        .update_client(
            added.client.client_id,
            ClientUpdate::new("Ivan", "Ivanov", "ivan@mail.ru").with_phone(phone_id, "700"),
        )
        .await
        .unwrap()
        .unwrap();

    match updated.phone {
        PhoneChange::Updated(phone) => {
            assert_eq!(phone.phone_id, phone_id);
            assert_eq!(phone.phone_number, "700");
        }
        other => panic!("expected phone update, got {other:?}"),
    }
    assert!(store.find_by_phone_number("300").await.unwrap().is_none());
}

#[tokio::test]
async fn update_client_keeps_its_own_phone_number() {
    let mut store = store().await;
    let added = add(&mut store, "Ivan", "Ivanov", "ivan@mail.ru", Some("300")).await;
    let phone = added.phone.unwrap();

    let updated = store
        .update_client(
            added.client.client_id,
            ClientUpdate::new("Ivan", "Ivanov", "ivan@mail.ru").with_phone(phone.phone_id, "300"),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.phone, PhoneChange::Updated(phone.clone()));
    assert_eq!(store.find_by_phone_number("300").await.unwrap(), Some(phone));
}

#[tokio::test]
async fn update_client_with_taken_phone_still_updates_fields() {
    let mut store = store().await;
    let petr = add(&mut store, "Petr", "Petrov", "petr@mail.ru", Some("100")).await;
    add(&mut store, "Ivan", "Ivanov", "ivan@mail.ru", Some("700")).await;
    let phone_id = petr.phone.unwrap().phone_id;

    let updated = store
        .update_client(
            petr.client.client_id,
            ClientUpdate::new("Petr1", "Petrov1", "petr@mail.ru1").with_phone(phone_id, "700"),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        updated.phone,
        PhoneChange::Rejected(Rejection::PhoneTaken("700".into()))
    );
    assert_eq!(updated.client.first_name, "Petr1");
    assert_eq!(
        store.find_by_phone_number("100").await.unwrap().map(|p| p.phone_id),
        Some(phone_id)
    );
}

#[tokio::test]
async fn update_client_with_foreign_phone_id() {
    let mut store = store().await;
    let ivan = add(&mut store, "Ivan", "Ivanov", "ivan@mail.ru", None).await.client;
    let petr = add(&mut store, "Petr", "Petrov", "petr@mail.ru", Some("100")).await;
    let petrs_phone = petr.phone.unwrap().phone_id;

    let updated = store
        .update_client(
            ivan.client_id,
            ClientUpdate::new("Ivan", "Ivanov", "ivan@mail.ru").with_phone(petrs_phone, "800"),
        )
        .await
        .unwrap()
        .unwrap();

    assert_eq!(
        updated.phone,
        PhoneChange::Rejected(Rejection::PhoneNotOwned {
            client_id: ivan.client_id,
            phone_id: petrs_phone,
        })
    );
    assert!(store.find_by_phone_number("100").await.unwrap().is_some());
    assert!(store.find_by_phone_number("800").await.unwrap().is_none());
}

#[tokio::test]
async fn update_client_phone_needs_both_halves() {
    let mut store = store().await;
    let ivan = add(&mut store, "Ivan", "Ivanov", "ivan@mail.ru", Some("300")).await.client;

    let mut update = ClientUpdate::new("Ivan", "Ivanov", "ivan@mail.ru");
    update.phone_number = Some("900".into());

    let updated = store
        .update_client(ivan.client_id, update)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(updated.phone, PhoneChange::NotRequested);
    assert!(store.find_by_phone_number("300").await.unwrap().is_some());
}

#[tokio::test]
async fn delete_phone_number_once() {
    let mut store = store().await;
    add(&mut store, "Ivan", "Ivanov", "ivan@mail.ru", Some("700")).await;

    let removed = store.delete_phone_number("700").await.unwrap().unwrap();
    assert_eq!(removed.phone_number, "700");

    let rejected = store.delete_phone_number("700").await.unwrap().unwrap_err();
    assert_eq!(rejected, Rejection::PhoneNotFound("700".into()));
    assert_eq!(store.backend().client_count(), 1);
}

#[tokio::test]
async fn delete_client_cascades_to_phones() {
    let mut store = store().await;
    let ivan = add(&mut store, "Ivan", "Ivanov", "ivan@mail.ru", Some("300")).await.client;
    store.add_phone_number(ivan.client_id, "400").await.unwrap().unwrap();
    let petr = add(&mut store, "Petr", "Petrov", "petr@mail.ru", Some("100")).await.client;

    let deleted = store.delete_client(ivan.client_id).await.unwrap().unwrap();

    assert_eq!(deleted.client, ivan);
    assert_eq!(deleted.phones.len(), 2);
    assert!(store.backend().is_referentially_intact());
    assert!(store.find_by_phone_number("300").await.unwrap().is_none());
    assert!(store.find_by_phone_number("400").await.unwrap().is_none());
    assert_eq!(store.list_phone_numbers(petr.client_id).await.unwrap().len(), 1);

    let rejected = store.delete_client(ivan.client_id).await.unwrap().unwrap_err();
    assert_eq!(rejected, Rejection::ClientNotFound(ivan.client_id));
}

#[tokio::test]
async fn find_client_ors_only_supplied_fields() {
    let mut store = store().await;
    let ivan = add(&mut store, "Ivan", "Ivanov", "ivan@mail.ru", None).await.client;
    let ivan_petrov = add(&mut store, "Ivan", "Petrov", "ivanpetrov@mail.ru", None).await.client;
    let petr = add(&mut store, "Petr", "Petrov", "petr@mail.ru", None).await.client;
    let sobol = add(&mut store, "Sobol", "Sobolev", "sobol@mail.ru", None).await.client;

    let by_name = store
        .find_client(&ClientQuery::default().first_name("Ivan"))
        .await
        .unwrap();
    assert_eq!(ids(&by_name), [ivan.client_id, ivan_petrov.client_id]);

    let by_surname = store
        .find_client(&ClientQuery::default().surname("Petrov"))
        .await
        .unwrap();
    assert_eq!(ids(&by_surname), [ivan_petrov.client_id, petr.client_id]);

    let either = store
        .find_client(&ClientQuery::default().first_name("Sobol").email("ivan@mail.ru"))
        .await
        .unwrap();
    assert_eq!(ids(&either), [ivan.client_id, sobol.client_id]);

    let none = store
        .find_client(&ClientQuery::default().first_name("Ivan1"))
        .await
        .unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn find_client_by_phone_pattern() {
    let mut store = store().await;
    let ivan = add(&mut store, "Ivan", "Ivanov", "ivan@mail.ru", Some("300")).await.client;
    store.add_phone_number(ivan.client_id, "400").await.unwrap().unwrap();
    store.add_phone_number(ivan.client_id, "401").await.unwrap().unwrap();
    let petr = add(&mut store, "Petr", "Petrov", "petr@mail.ru", Some("4000")).await.client;

    let exact = store
        .find_client(&ClientQuery::default().phone_number("400"))
        .await
        .unwrap();
    assert_eq!(ids(&exact), [ivan.client_id]);

    let prefix = store
        .find_client(&ClientQuery::default().phone_number("40%"))
        .await
        .unwrap();
    assert_eq!(ids(&prefix), [ivan.client_id, petr.client_id]);

    let missing = store
        .find_client(&ClientQuery::default().phone_number("5000"))
        .await
        .unwrap();
    assert!(missing.is_empty());
}

#[tokio::test]
async fn find_client_identity_fields_win_over_phone() {
    let mut store = store().await;
    let ivan = add(&mut store, "Ivan", "Ivanov", "ivan@mail.ru", Some("300")).await.client;
    add(&mut store, "Petr", "Petrov", "petr@mail.ru", Some("100")).await;

    let found = store
        .find_client(&ClientQuery::default().first_name("Ivan").phone_number("100"))
        .await
        .unwrap();
    assert_eq!(ids(&found), [ivan.client_id]);

    assert!(store.find_client(&ClientQuery::default()).await.unwrap().is_empty());
}

#[tokio::test]
async fn store_over_borrowed_backend() {
    let mut backend = MemoryBackend::with_schema();
    {
        let mut store = ContactStore::new(&mut backend);
        store
            .add_client(NewClient::new("Ivan", "Ivanov", "ivan@mail.ru"), None)
            .await
            .unwrap()
            .unwrap();
    }
    assert_eq!(backend.client_count(), 1);
}

#[tokio::test]
async fn end_to_end_scenario() {
    let mut store = store().await;

    let ivan = add(&mut store, "Ivan", "Ivanov", "ivan@mail.ru", None).await.client;
    assert_eq!(ivan.client_id, 1);

    let duplicate = store
        .add_client(NewClient::new("Ivan", "Ivanov", "ivan@mail.ru"), None)
        .await
        .unwrap();
    assert_eq!(duplicate, Err(Rejection::EmailTaken("ivan@mail.ru".into())));
    assert_eq!(store.backend().client_count(), 1);

    assert!(store.add_phone_number(1, "100").await.unwrap().is_ok());
    assert_eq!(
        store.add_phone_number(1, "100").await.unwrap(),
        Err(Rejection::PhoneTaken("100".into()))
    );

    let deleted = store.delete_client(1).await.unwrap().unwrap();
    assert_eq!(deleted.phones.len(), 1);

    assert!(store.find_by_client_id(1).await.unwrap().is_none());
    assert!(store.find_by_phone_number("100").await.unwrap().is_none());
    assert_eq!(
        store.delete_client(1).await.unwrap(),
        Err(Rejection::ClientNotFound(1))
    );
    assert_eq!(
        store.add_phone_number(1, "100").await.unwrap(),
        Err(Rejection::ClientNotFound(1))
    );
}
