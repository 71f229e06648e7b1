/// A row of `client_info`.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct Client {
    pub client_id: i32,
    pub first_name: String,
    pub surname: String,
    pub email: String,
}

/// Fields required to create a client; the id is generated by the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewClient {
    pub first_name: String,
    pub surname: String,
    pub email: String,
}

impl NewClient {
    pub fn new(
        first_name: impl Into<String>,
        surname: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            surname: surname.into(),
            email: email.into(),
        }
    }
}

/// Replacement values for a client, optionally renumbering one of its phones.
///
/// The phone change only applies when both `phone_number` and `phone_id`
/// are present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientUpdate {
    pub first_name: String,
    pub surname: String,
    pub email: String,
    pub phone_number: Option<String>,
    pub phone_id: Option<i32>,
}

impl ClientUpdate {
    pub fn new(
        first_name: impl Into<String>,
        surname: impl Into<String>,
        email: impl Into<String>,
    ) -> Self {
        Self {
            first_name: first_name.into(),
            surname: surname.into(),
            email: email.into(),
            phone_number: None,
            phone_id: None,
        }
    }

    pub fn with_phone(mut self, phone_id: i32, phone_number: impl Into<String>) -> Self {
        self.phone_id = Some(phone_id);
        self.phone_number = Some(phone_number.into());
        self
    }

    /// The `(phone_id, phone_number)` pair when both halves were supplied.
    pub fn phone_change(&self) -> Option<(i32, &str)> {
        match (self.phone_id, self.phone_number.as_deref()) {
            (Some(id), Some(number)) => Some((id, number)),
            _ => None,
        }
    }
}
