//! The storage seam driven by [`ContactStore`](crate::ContactStore).
//!
//! A backend is the caller-owned connection handle. It runs plain statements
//! and enforces the schema constraints; business rules (guard checks and the
//! outcomes they produce) live in the store.

use async_trait::async_trait;

use crate::error::Result;
use crate::models::{Client, ClientQuery, NewClient, Phone};

#[async_trait]
pub trait ContactBackend: Send {
    /// Create `client_info` and `phone` if they are absent.
    async fn create_schema(&mut self) -> Result<()>;

    /// Drop `phone` and `client_info` if they are present.
    async fn drop_schema(&mut self) -> Result<()>;

    async fn client_by_id(&mut self, client_id: i32) -> Result<Option<Client>>;

    async fn client_by_email(&mut self, email: &str) -> Result<Option<Client>>;

    async fn phone_by_number(&mut self, phone_number: &str) -> Result<Option<Phone>>;

    /// Phones owned by a client, ordered by `phone_id`.
    async fn phones_of_client(&mut self, client_id: i32) -> Result<Vec<Phone>>;

    /// Insert a client and, optionally, its first phone number as one unit.
    /// Either both rows are written or neither is.
    async fn insert_client(
        &mut self,
        client: &NewClient,
        phone_number: Option<&str>,
    ) -> Result<(Client, Option<Phone>)>;

    async fn insert_phone(&mut self, client_id: i32, phone_number: &str) -> Result<Phone>;

    /// Overwrite name and email of `client.client_id`. Returns the stored row,
    /// or `None` if no such client exists.
    async fn update_client(&mut self, client: &Client) -> Result<Option<Client>>;

    /// Renumber the phone identified by `(client_id, phone_id)`. Returns `None`
    /// when that pair matches no row.
    async fn update_phone(
        &mut self,
        client_id: i32,
        phone_id: i32,
        phone_number: &str,
    ) -> Result<Option<Phone>>;

    /// Delete the phone with this number, returning the removed row.
    async fn delete_phone(&mut self, phone_number: &str) -> Result<Option<Phone>>;

    /// Delete every phone of the client, then the client, as one unit.
    /// Returns the removed phones.
    async fn delete_client(&mut self, client_id: i32) -> Result<Vec<Phone>>;

    /// Clients matching ANY of the set first name, surname or email fields,
    /// ordered by `client_id`. Unset fields take no part in the filter.
    async fn search_clients(&mut self, query: &ClientQuery) -> Result<Vec<Client>>;

    /// Distinct clients owning a phone whose number matches the `LIKE` pattern,
    /// ordered by `client_id`.
    async fn search_by_phone(&mut self, pattern: &str) -> Result<Vec<Client>>;
}

#[async_trait]
impl<B: ContactBackend + ?Sized> ContactBackend for &mut B {
    async fn create_schema(&mut self) -> Result<()> {
        (**self).create_schema().await
    }

    async fn drop_schema(&mut self) -> Result<()> {
        (**self).drop_schema().await
    }

    async fn client_by_id(&mut self, client_id: i32) -> Result<Option<Client>> {
        (**self).client_by_id(client_id).await
    }

    async fn client_by_email(&mut self, email: &str) -> Result<Option<Client>> {
        (**self).client_by_email(email).await
    }

    async fn phone_by_number(&mut self, phone_number: &str) -> Result<Option<Phone>> {
        (**self).phone_by_number(phone_number).await
    }

    async fn phones_of_client(&mut self, client_id: i32) -> Result<Vec<Phone>> {
        (**self).phones_of_client(client_id).await
    }

    async fn insert_client(
        &mut self,
        client: &NewClient,
        phone_number: Option<&str>,
    ) -> Result<(Client, Option<Phone>)> {
        (**self).insert_client(client, phone_number).await
    }

    async fn insert_phone(&mut self, client_id: i32, phone_number: &str) -> Result<Phone> {
        (**self).insert_phone(client_id, phone_number).await
    }

    async fn update_client(&mut self, client: &Client) -> Result<Option<Client>> {
        (**self).update_client(client).await
    }

    async fn update_phone(
        &mut self,
        client_id: i32,
        phone_id: i32,
        phone_number: &str,
    ) -> Result<Option<Phone>> {
        (**self).update_phone(client_id, phone_id, phone_number).await
    }

    async fn delete_phone(&mut self, phone_number: &str) -> Result<Option<Phone>> {
        (**self).delete_phone(phone_number).await
    }

    async fn delete_client(&mut self, client_id: i32) -> Result<Vec<Phone>> {
        (**self).delete_client(client_id).await
    }

    async fn search_clients(&mut self, query: &ClientQuery) -> Result<Vec<Client>> {
        (**self).search_clients(query).await
    }

    async fn search_by_phone(&mut self, pattern: &str) -> Result<Vec<Client>> {
        (**self).search_by_phone(pattern).await
    }
}
