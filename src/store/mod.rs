//! Client and phone bookkeeping on top of a [`ContactBackend`].
//!
//! Every mutation is guarded by a lookup that turns the common business-rule
//! failures into a [`Rejection`]. The lookups only produce the friendlier
//! outcome; the unique and foreign-key constraints of the backend remain the
//! actual guarantee, and a violation that slips past a guard comes back as a
//! [`StoreError`](crate::StoreError).

use tracing::{debug, info, warn};

use crate::backend::ContactBackend;
use crate::error::{Outcome, Rejection, Result};
use crate::models::{Client, ClientQuery, ClientUpdate, NewClient, Phone};

mod outcome;

pub use outcome::{AddedClient, DeletedClient, PhoneChange, UpdatedClient};

/// Drives a caller-supplied connection handle.
///
/// The store holds no connection state of its own; construct it over
/// `&mut conn` to keep ownership of the connection with the caller.
pub struct ContactStore<B> {
    backend: B,
}

impl<B: ContactBackend> ContactStore<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn into_inner(self) -> B {
        self.backend
    }

    /// Create both tables if absent. Safe to call repeatedly.
    pub async fn initialize_schema(&mut self) -> Result<()> {
        self.backend.create_schema().await?;
        info!("tables client_info and phone created");
        Ok(())
    }

    /// Drop both tables if present. Every stored client and phone is lost.
    pub async fn drop_schema(&mut self) -> Result<()> {
        self.backend.drop_schema().await?;
        info!("tables phone and client_info dropped");
        Ok(())
    }

    pub async fn find_by_client_id(&mut self, client_id: i32) -> Result<Option<Client>> {
        self.backend.client_by_id(client_id).await
    }

    pub async fn find_by_email(&mut self, email: &str) -> Result<Option<Client>> {
        self.backend.client_by_email(email).await
    }

    pub async fn find_by_phone_number(&mut self, phone_number: &str) -> Result<Option<Phone>> {
        self.backend.phone_by_number(phone_number).await
    }

    /// Phones owned by a client, oldest first. Empty for an unknown client.
    pub async fn list_phone_numbers(&mut self, client_id: i32) -> Result<Vec<Phone>> {
        self.backend.phones_of_client(client_id).await
    }

    /// Create a client, optionally with its first phone number.
    ///
    /// Both the email and the phone number are checked before anything is
    /// written, and the two rows are inserted together: a taken phone number
    /// rejects the whole operation and leaves the store unchanged.
    pub async fn add_client(
        &mut self,
        client: NewClient,
        phone_number: Option<&str>,
    ) -> Result<Outcome<AddedClient>> {
        if self.backend.client_by_email(&client.email).await?.is_some() {
            return Ok(self.reject(Rejection::EmailTaken(client.email)));
        }
        if let Some(number) = phone_number {
            if self.backend.phone_by_number(number).await?.is_some() {
                return Ok(self.reject(Rejection::PhoneTaken(number.to_string())));
            }
        }

        let (client, phone) = self.backend.insert_client(&client, phone_number).await?;
        info!(
            client_id = client.client_id,
            email = %client.email,
            phone = phone.as_ref().map(|p| p.phone_number.as_str()),
            "client added"
        );

        Ok(Ok(AddedClient { client, phone }))
    }

    /// Attach a phone number to an existing client.
    pub async fn add_phone_number(
        &mut self,
        client_id: i32,
        phone_number: &str,
    ) -> Result<Outcome<Phone>> {
        if self.backend.client_by_id(client_id).await?.is_none() {
            return Ok(self.reject(Rejection::ClientNotFound(client_id)));
        }
        if self.backend.phone_by_number(phone_number).await?.is_some() {
            return Ok(self.reject(Rejection::PhoneTaken(phone_number.to_string())));
        }

        let phone = self.backend.insert_phone(client_id, phone_number).await?;
        info!(
            client_id,
            phone_id = phone.phone_id,
            phone = %phone.phone_number,
            "phone number added"
        );

        Ok(Ok(phone))
    }

    /// Overwrite a client's name and email, and optionally renumber one of
    /// its phones.
    ///
    /// The email may stay the same; it is only rejected when it belongs to a
    /// different client. The phone part is applied after the client fields
    /// and is reported separately in [`UpdatedClient::phone`]: a rejected
    /// phone change does not undo the client update.
    pub async fn update_client(
        &mut self,
        client_id: i32,
        update: ClientUpdate,
    ) -> Result<Outcome<UpdatedClient>> {
        if self.backend.client_by_id(client_id).await?.is_none() {
            return Ok(self.reject(Rejection::ClientNotFound(client_id)));
        }
        if let Some(owner) = self.backend.client_by_email(&update.email).await? {
            if owner.client_id != client_id {
                return Ok(self.reject(Rejection::EmailTaken(update.email)));
            }
        }

        let phone_change = update
            .phone_change()
            .map(|(phone_id, number)| (phone_id, number.to_string()));

        let row = Client {
            client_id,
            first_name: update.first_name,
            surname: update.surname,
            email: update.email,
        };
        let Some(client) = self.backend.update_client(&row).await? else {
            return Ok(self.reject(Rejection::ClientNotFound(client_id)));
        };
        info!(client_id, "client updated");

        let phone = match phone_change {
            Some((phone_id, number)) => self.change_phone(client_id, phone_id, &number).await?,
            None => PhoneChange::NotRequested,
        };

        Ok(Ok(UpdatedClient { client, phone }))
    }

    async fn change_phone(
        &mut self,
        client_id: i32,
        phone_id: i32,
        phone_number: &str,
    ) -> Result<PhoneChange> {
        if let Some(existing) = self.backend.phone_by_number(phone_number).await? {
            if existing.phone_id != phone_id {
                let rejection = Rejection::PhoneTaken(phone_number.to_string());
                warn!(client_id, phone_id, %rejection, "phone change rejected");
                return Ok(PhoneChange::Rejected(rejection));
            }
        }

        match self
            .backend
            .update_phone(client_id, phone_id, phone_number)
            .await?
        {
            Some(phone) => {
                info!(client_id, phone_id, phone = %phone.phone_number, "phone number changed");
                Ok(PhoneChange::Updated(phone))
            }
            None => {
                let rejection = Rejection::PhoneNotOwned { client_id, phone_id };
                warn!(%rejection, "phone change rejected");
                Ok(PhoneChange::Rejected(rejection))
            }
        }
    }

    /// Remove a single phone number.
    pub async fn delete_phone_number(&mut self, phone_number: &str) -> Result<Outcome<Phone>> {
        if self.backend.phone_by_number(phone_number).await?.is_none() {
            return Ok(self.reject(Rejection::PhoneNotFound(phone_number.to_string())));
        }

        match self.backend.delete_phone(phone_number).await? {
            Some(phone) => {
                info!(
                    phone_id = phone.phone_id,
                    phone = %phone.phone_number,
                    "phone number deleted"
                );
                Ok(Ok(phone))
            }
            None => Ok(self.reject(Rejection::PhoneNotFound(phone_number.to_string()))),
        }
    }

    /// Remove a client together with all of its phone numbers.
    pub async fn delete_client(&mut self, client_id: i32) -> Result<Outcome<DeletedClient>> {
        let Some(client) = self.backend.client_by_id(client_id).await? else {
            return Ok(self.reject(Rejection::ClientNotFound(client_id)));
        };

        let phones = self.backend.delete_client(client_id).await?;
        info!(client_id, phones = phones.len(), "client deleted");

        Ok(Ok(DeletedClient { client, phones }))
    }

    /// Search clients.
    ///
    /// When any of first name, surname or email is set, returns clients
    /// matching any of the set fields exactly. Otherwise the phone number is
    /// used as a `LIKE` pattern over phone numbers. An empty result means no
    /// client was found.
    pub async fn find_client(&mut self, query: &ClientQuery) -> Result<Vec<Client>> {
        let clients = if query.has_identity_fields() {
            self.backend.search_clients(query).await?
        } else if let Some(pattern) = query.phone_number.as_deref() {
            self.backend.search_by_phone(pattern).await?
        } else {
            Vec::new()
        };
        debug!(?query, found = clients.len(), "client search");

        Ok(clients)
    }

    fn reject<T>(&self, rejection: Rejection) -> Outcome<T> {
        warn!(kind = ?rejection.kind(), %rejection, "operation rejected");
        Err(rejection)
    }
}

#[cfg(test)]
mod tests;
