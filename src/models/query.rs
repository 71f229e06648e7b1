/// Search criteria for [`ContactStore::find_client`](crate::ContactStore::find_client).
///
/// Name and email fields are matched by equality and OR-ed together; only the
/// fields that are set take part. The phone number is a `LIKE` pattern and is
/// consulted only when no name or email field is set.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClientQuery {
    pub first_name: Option<String>,
    pub surname: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
}

impl ClientQuery {
    pub fn first_name(mut self, value: impl Into<String>) -> Self {
        self.first_name = Some(value.into());
        self
    }

    pub fn surname(mut self, value: impl Into<String>) -> Self {
        self.surname = Some(value.into());
        self
    }

    pub fn email(mut self, value: impl Into<String>) -> Self {
        self.email = Some(value.into());
        self
    }

    pub fn phone_number(mut self, value: impl Into<String>) -> Self {
        self.phone_number = Some(value.into());
        self
    }

    /// True when at least one of first name, surname or email is set.
    pub fn has_identity_fields(&self) -> bool {
        self.first_name.is_some() || self.surname.is_some() || self.email.is_some()
    }
}
