//! An in-process backend holding both tables in memory.
//!
//! It enforces the same rules as the PostgreSQL schema: identity columns that
//! never hand out an id twice, `VARCHAR` widths, unique emails and phone
//! numbers, and phones that must reference an existing client. Operations on
//! a dropped (or never created) schema fail like a missing relation would.

use async_trait::async_trait;

use crate::backend::ContactBackend;
use crate::error::{Result, StoreError};
use crate::models::{Client, ClientQuery, NewClient, Phone};

const FIRST_NAME_WIDTH: usize = 20;
const SURNAME_WIDTH: usize = 30;
const EMAIL_WIDTH: usize = 50;
const PHONE_NUMBER_WIDTH: usize = 12;

/// `VARCHAR(n)` counts characters, not bytes.
fn check_width(value: &str, width: usize) -> Result<()> {
    if value.chars().count() > width {
        return Err(StoreError::ValueTooLong(format!(
            "value too long for type character varying({width})"
        )));
    }
    Ok(())
}

fn check_client_widths(first_name: &str, surname: &str, email: &str) -> Result<()> {
    check_width(first_name, FIRST_NAME_WIDTH)?;
    check_width(surname, SURNAME_WIDTH)?;
    check_width(email, EMAIL_WIDTH)
}

#[derive(Debug, Default)]
struct Tables {
    clients: Vec<Client>,
    phones: Vec<Phone>,
    last_client_id: i32,
    last_phone_id: i32,
}

impl Tables {
    fn email_owner(&self, email: &str) -> Option<i32> {
        self.clients
            .iter()
            .find(|c| c.email == email)
            .map(|c| c.client_id)
    }

    fn number_owner(&self, phone_number: &str) -> Option<i32> {
        self.phones
            .iter()
            .find(|p| p.phone_number == phone_number)
            .map(|p| p.phone_id)
    }

    fn check_phone_insert(&self, client_id: i32, phone_number: &str) -> Result<()> {
        check_width(phone_number, PHONE_NUMBER_WIDTH)?;
        if self.number_owner(phone_number).is_some() {
            return Err(StoreError::Constraint(format!(
                "duplicate key value violates unique constraint: phone_number = {phone_number}"
            )));
        }
        if !self.clients.iter().any(|c| c.client_id == client_id) {
            return Err(StoreError::Constraint(format!(
                "foreign key violation: client_id = {client_id} is not present in client_info"
            )));
        }
        Ok(())
    }

    fn push_phone(&mut self, client_id: i32, phone_number: &str) -> Phone {
        self.last_phone_id += 1;
        let phone = Phone {
            phone_id: self.last_phone_id,
            phone_number: phone_number.to_string(),
            client_id,
        };
        self.phones.push(phone.clone());
        phone
    }
}

/// Contact tables kept in memory, for tests and dry runs.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    tables: Option<Tables>,
}

impl MemoryBackend {
    /// An empty database without the contact tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// An empty database with the contact tables already created.
    pub fn with_schema() -> Self {
        Self {
            tables: Some(Tables::default()),
        }
    }

    pub fn client_count(&self) -> usize {
        self.tables.as_ref().map_or(0, |t| t.clients.len())
    }

    pub fn phone_count(&self) -> usize {
        self.tables.as_ref().map_or(0, |t| t.phones.len())
    }

    /// True when every phone references an existing client.
    pub fn is_referentially_intact(&self) -> bool {
        self.tables.as_ref().is_none_or(|t| {
            t.phones
                .iter()
                .all(|p| t.clients.iter().any(|c| c.client_id == p.client_id))
        })
    }

    fn tables(&self) -> Result<&Tables> {
        self.tables.as_ref().ok_or(StoreError::MissingTable("client_info"))
    }

    fn tables_mut(&mut self) -> Result<&mut Tables> {
        self.tables.as_mut().ok_or(StoreError::MissingTable("client_info"))
    }
}

#[async_trait]
impl ContactBackend for MemoryBackend {
    async fn create_schema(&mut self) -> Result<()> {
        if self.tables.is_none() {
            self.tables = Some(Tables::default());
        }
        Ok(())
    }

    async fn drop_schema(&mut self) -> Result<()> {
        self.tables = None;
        Ok(())
    }

    async fn client_by_id(&mut self, client_id: i32) -> Result<Option<Client>> {
        Ok(self
            .tables()?
            .clients
            .iter()
            .find(|c| c.client_id == client_id)
            .cloned())
    }

    async fn client_by_email(&mut self, email: &str) -> Result<Option<Client>> {
        Ok(self
            .tables()?
            .clients
            .iter()
            .find(|c| c.email == email)
            .cloned())
    }

    async fn phone_by_number(&mut self, phone_number: &str) -> Result<Option<Phone>> {
        Ok(self
            .tables()?
            .phones
            .iter()
            .find(|p| p.phone_number == phone_number)
            .cloned())
    }

    async fn phones_of_client(&mut self, client_id: i32) -> Result<Vec<Phone>> {
        let mut phones: Vec<Phone> = self
            .tables()?
            .phones
            .iter()
            .filter(|p| p.client_id == client_id)
            .cloned()
            .collect();
        phones.sort_by_key(|p| p.phone_id);
        Ok(phones)
    }

    async fn insert_client(
        &mut self,
        client: &NewClient,
        phone_number: Option<&str>,
    ) -> Result<(Client, Option<Phone>)> {
        let tables = self.tables_mut()?;

        check_client_widths(&client.first_name, &client.surname, &client.email)?;
        if let Some(number) = phone_number {
            check_width(number, PHONE_NUMBER_WIDTH)?;
        }
        if tables.email_owner(&client.email).is_some() {
            return Err(StoreError::Constraint(format!(
                "duplicate key value violates unique constraint: email = {}",
                client.email
            )));
        }
        if let Some(number) = phone_number {
            if tables.number_owner(number).is_some() {
                return Err(StoreError::Constraint(format!(
                    "duplicate key value violates unique constraint: phone_number = {number}"
                )));
            }
        }

        tables.last_client_id += 1;
        let created = Client {
            client_id: tables.last_client_id,
            first_name: client.first_name.clone(),
            surname: client.surname.clone(),
            email: client.email.clone(),
        };
        tables.clients.push(created.clone());

        let phone = phone_number.map(|number| tables.push_phone(created.client_id, number));

        Ok((created, phone))
    }

    async fn insert_phone(&mut self, client_id: i32, phone_number: &str) -> Result<Phone> {
        let tables = self.tables_mut()?;
        tables.check_phone_insert(client_id, phone_number)?;
        Ok(tables.push_phone(client_id, phone_number))
    }

    async fn update_client(&mut self, client: &Client) -> Result<Option<Client>> {
        let tables = self.tables_mut()?;

        check_client_widths(&client.first_name, &client.surname, &client.email)?;
        if let Some(owner) = tables.email_owner(&client.email) {
            if owner != client.client_id {
                return Err(StoreError::Constraint(format!(
                    "duplicate key value violates unique constraint: email = {}",
                    client.email
                )));
            }
        }

        let Some(row) = tables
            .clients
            .iter_mut()
            .find(|c| c.client_id == client.client_id)
        else {
            return Ok(None);
        };
        row.first_name = client.first_name.clone();
        row.surname = client.surname.clone();
        row.email = client.email.clone();

        Ok(Some(row.clone()))
    }

    async fn update_phone(
        &mut self,
        client_id: i32,
        phone_id: i32,
        phone_number: &str,
    ) -> Result<Option<Phone>> {
        let tables = self.tables_mut()?;

        check_width(phone_number, PHONE_NUMBER_WIDTH)?;
        let Some(index) = tables
            .phones
            .iter()
            .position(|p| p.client_id == client_id && p.phone_id == phone_id)
        else {
            return Ok(None);
        };
        if let Some(owner) = tables.number_owner(phone_number) {
            if owner != phone_id {
                return Err(StoreError::Constraint(format!(
                    "duplicate key value violates unique constraint: phone_number = {phone_number}"
                )));
            }
        }

        let row = &mut tables.phones[index];
        row.phone_number = phone_number.to_string();
        Ok(Some(row.clone()))
    }

    async fn delete_phone(&mut self, phone_number: &str) -> Result<Option<Phone>> {
        let tables = self.tables_mut()?;
        let removed = tables
            .phones
            .iter()
            .position(|p| p.phone_number == phone_number)
            .map(|index| tables.phones.remove(index));
        Ok(removed)
    }

    async fn delete_client(&mut self, client_id: i32) -> Result<Vec<Phone>> {
        let tables = self.tables_mut()?;

        let (removed, kept): (Vec<Phone>, Vec<Phone>) = tables
            .phones
            .drain(..)
            .partition(|p| p.client_id == client_id);
        tables.phones = kept;
        tables.clients.retain(|c| c.client_id != client_id);

        Ok(removed)
    }

    async fn search_clients(&mut self, query: &ClientQuery) -> Result<Vec<Client>> {
        let tables = self.tables()?;
        let equals = |field: &Option<String>, value: &str| field.as_deref() == Some(value);

        Ok(tables
            .clients
            .iter()
            .filter(|c| {
                equals(&query.first_name, &c.first_name)
                    || equals(&query.surname, &c.surname)
                    || equals(&query.email, &c.email)
            })
            .cloned()
            .collect())
    }

    async fn search_by_phone(&mut self, pattern: &str) -> Result<Vec<Client>> {
        let tables = self.tables()?;
        let pattern: Vec<char> = pattern.chars().collect();

        Ok(tables
            .clients
            .iter()
            .filter(|c| {
                tables.phones.iter().any(|p| {
                    p.client_id == c.client_id
                        && like(&pattern, &p.phone_number.chars().collect::<Vec<_>>())
                })
            })
            .cloned()
            .collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LikeToken {
    AnyRun,
    AnyChar,
    Literal(char),
}

fn tokenize(pattern: &[char]) -> Vec<LikeToken> {
    let mut tokens = Vec::with_capacity(pattern.len());
    let mut chars = pattern.iter().copied();
    while let Some(ch) = chars.next() {
        let token = match ch {
            '%' => LikeToken::AnyRun,
            '_' => LikeToken::AnyChar,
            '\\' => LikeToken::Literal(chars.next().unwrap_or('\\')),
            other => LikeToken::Literal(other),
        };
        if token == LikeToken::AnyRun && tokens.last() == Some(&LikeToken::AnyRun) {
            continue;
        }
        tokens.push(token);
    }
    tokens
}

/// SQL `LIKE`: `%` matches any run, `_` one character, `\` escapes the next.
///
/// Greedy match that backtracks only to the most recent `%`, so it runs in
/// `O(pattern * text)` at worst.
fn like(pattern: &[char], text: &[char]) -> bool {
    let tokens = tokenize(pattern);
    let (mut p, mut t) = (0, 0);
    let mut resume: Option<(usize, usize)> = None;

    while t < text.len() {
        match tokens.get(p) {
            Some(LikeToken::AnyRun) => {
                p += 1;
                resume = Some((p, t));
            }
            Some(LikeToken::AnyChar) => {
                p += 1;
                t += 1;
            }
            Some(LikeToken::Literal(ch)) if *ch == text[t] => {
                p += 1;
                t += 1;
            }
            _ => match resume {
                Some((after_run, start)) => {
                    p = after_run;
                    t = start + 1;
                    resume = Some((after_run, start + 1));
                }
                None => return false,
            },
        }
    }

    tokens[p..].iter().all(|token| *token == LikeToken::AnyRun)
}
