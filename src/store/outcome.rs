use std::fmt;

use crate::error::Rejection;
use crate::models::{Client, Phone};

/// A client created by [`ContactStore::add_client`](super::ContactStore::add_client).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AddedClient {
    pub client: Client,
    pub phone: Option<Phone>,
}

/// Result of [`ContactStore::update_client`](super::ContactStore::update_client).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpdatedClient {
    pub client: Client,
    pub phone: PhoneChange,
}

/// What happened to the phone part of a client update.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhoneChange {
    NotRequested,
    Updated(Phone),
    Rejected(Rejection),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeletedClient {
    pub client: Client,
    pub phones: Vec<Phone>,
}

impl fmt::Display for AddedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let c = &self.client;
        write!(
            f,
            "Added client {}: {} {} <{}>",
            c.client_id, c.first_name, c.surname, c.email
        )?;
        if let Some(phone) = &self.phone {
            write!(f, ", phone {}", phone.phone_number)?;
        }
        Ok(())
    }
}

impl fmt::Display for UpdatedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Updated client {}", self.client.client_id)?;
        match &self.phone {
            PhoneChange::NotRequested => Ok(()),
            PhoneChange::Updated(phone) => {
                write!(f, ", phone {} is now {}", phone.phone_id, phone.phone_number)
            }
            PhoneChange::Rejected(rejection) => {
                write!(f, "; phone not changed: {rejection}")
            }
        }
    }
}

impl fmt::Display for DeletedClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Deleted client {} and {} phone number(s)",
            self.client.client_id,
            self.phones.len()
        )
    }
}
