use async_trait::async_trait;
use sqlx::postgres::PgConnection;
use sqlx::{Connection, Postgres, QueryBuilder};
use tracing::debug;

use crate::backend::ContactBackend;
use crate::config::Config;
use crate::error::{Result, StoreError};
use crate::models::{Client, ClientQuery, NewClient, Phone};

mod schema;

const CLIENT_COLUMNS: &str = "client_id, first_name, surname, email";
const PHONE_COLUMNS: &str = "phone_id, phone_number, client_id";

/// Open a single connection to the configured database.
///
/// The caller owns the connection and passes it to
/// [`ContactStore`](crate::ContactStore); there is no pool.
pub async fn connect(config: &Config) -> anyhow::Result<PgConnection> {
    let options = config.connect_options()?;
    let conn = PgConnection::connect_with(&options).await?;
    debug!(database = %config.database_label(), "database connection established");
    Ok(conn)
}

// SQLSTATE string_data_right_truncation
const VALUE_TOO_LONG: &str = "22001";

/// Unique and foreign-key violations become [`StoreError::Constraint`],
/// over-long values [`StoreError::ValueTooLong`], everything else stays a
/// database error.
fn classify(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() || db.is_foreign_key_violation() => {
            StoreError::Constraint(db.message().to_string())
        }
        sqlx::Error::Database(db) if db.code().as_deref() == Some(VALUE_TOO_LONG) => {
            StoreError::ValueTooLong(db.message().to_string())
        }
        _ => StoreError::Database(err),
    }
}

#[async_trait]
impl ContactBackend for PgConnection {
    async fn create_schema(&mut self) -> Result<()> {
        let mut tx = self.begin().await?;
        for statement in schema::CREATE {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn drop_schema(&mut self) -> Result<()> {
        let mut tx = self.begin().await?;
        for statement in schema::DROP {
            sqlx::query(statement).execute(&mut *tx).await?;
        }
        tx.commit().await?;
        Ok(())
    }

    async fn client_by_id(&mut self, client_id: i32) -> Result<Option<Client>> {
        let client = sqlx::query_as::<_, Client>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM client_info WHERE client_id = $1"
        ))
        .bind(client_id)
        .fetch_optional(&mut *self)
        .await?;

        Ok(client)
    }

    async fn client_by_email(&mut self, email: &str) -> Result<Option<Client>> {
        let client = sqlx::query_as::<_, Client>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM client_info WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&mut *self)
        .await?;

        Ok(client)
    }

    async fn phone_by_number(&mut self, phone_number: &str) -> Result<Option<Phone>> {
        let phone = sqlx::query_as::<_, Phone>(&format!(
            "SELECT {PHONE_COLUMNS} FROM phone WHERE phone_number = $1"
        ))
        .bind(phone_number)
        .fetch_optional(&mut *self)
        .await?;

        Ok(phone)
    }

    async fn phones_of_client(&mut self, client_id: i32) -> Result<Vec<Phone>> {
        let phones = sqlx::query_as::<_, Phone>(&format!(
            "SELECT {PHONE_COLUMNS} FROM phone WHERE client_id = $1 ORDER BY phone_id"
        ))
        .bind(client_id)
        .fetch_all(&mut *self)
        .await?;

        Ok(phones)
    }

    async fn insert_client(
        &mut self,
        client: &NewClient,
        phone_number: Option<&str>,
    ) -> Result<(Client, Option<Phone>)> {
        let mut tx = self.begin().await?;

        let created = sqlx::query_as::<_, Client>(&format!(
            r#"
            INSERT INTO client_info (first_name, surname, email)
            VALUES ($1, $2, $3)
            RETURNING {CLIENT_COLUMNS}
            "#
        ))
        .bind(&client.first_name)
        .bind(&client.surname)
        .bind(&client.email)
        .fetch_one(&mut *tx)
        .await
        .map_err(classify)?;

        let phone = match phone_number {
            Some(number) => Some(
                sqlx::query_as::<_, Phone>(&format!(
                    r#"
                    INSERT INTO phone (phone_number, client_id)
                    VALUES ($1, $2)
                    RETURNING {PHONE_COLUMNS}
                    "#
                ))
                .bind(number)
                .bind(created.client_id)
                .fetch_one(&mut *tx)
                .await
                .map_err(classify)?,
            ),
            None => None,
        };

        // Dropping the transaction on an early return rolls both inserts back
        tx.commit().await?;

        Ok((created, phone))
    }

    async fn insert_phone(&mut self, client_id: i32, phone_number: &str) -> Result<Phone> {
        sqlx::query_as::<_, Phone>(&format!(
            r#"
            INSERT INTO phone (phone_number, client_id)
            VALUES ($1, $2)
            RETURNING {PHONE_COLUMNS}
            "#
        ))
        .bind(phone_number)
        .bind(client_id)
        .fetch_one(&mut *self)
        .await
        .map_err(classify)
    }

    async fn update_client(&mut self, client: &Client) -> Result<Option<Client>> {
        sqlx::query_as::<_, Client>(&format!(
            r#"
            UPDATE client_info
            SET first_name = $1, surname = $2, email = $3
            WHERE client_id = $4
            RETURNING {CLIENT_COLUMNS}
            "#
        ))
        .bind(&client.first_name)
        .bind(&client.surname)
        .bind(&client.email)
        .bind(client.client_id)
        .fetch_optional(&mut *self)
        .await
        .map_err(classify)
    }

    async fn update_phone(
        &mut self,
        client_id: i32,
        phone_id: i32,
        phone_number: &str,
    ) -> Result<Option<Phone>> {
        sqlx::query_as::<_, Phone>(&format!(
            r#"
            UPDATE phone
            SET phone_number = $1
            WHERE client_id = $2 AND phone_id = $3
            RETURNING {PHONE_COLUMNS}
            "#
        ))
        .bind(phone_number)
        .bind(client_id)
        .bind(phone_id)
        .fetch_optional(&mut *self)
        .await
        .map_err(classify)
    }

    async fn delete_phone(&mut self, phone_number: &str) -> Result<Option<Phone>> {
        let phone = sqlx::query_as::<_, Phone>(&format!(
            "DELETE FROM phone WHERE phone_number = $1 RETURNING {PHONE_COLUMNS}"
        ))
        .bind(phone_number)
        .fetch_optional(&mut *self)
        .await?;

        Ok(phone)
    }

    async fn delete_client(&mut self, client_id: i32) -> Result<Vec<Phone>> {
        let mut tx = self.begin().await?;

        // Phones first, the foreign key on phone.client_id forbids orphans
        let phones = sqlx::query_as::<_, Phone>(&format!(
            "DELETE FROM phone WHERE client_id = $1 RETURNING {PHONE_COLUMNS}"
        ))
        .bind(client_id)
        .fetch_all(&mut *tx)
        .await?;

        sqlx::query("DELETE FROM client_info WHERE client_id = $1")
            .bind(client_id)
            .execute(&mut *tx)
            .await
            .map_err(classify)?;

        tx.commit().await?;

        Ok(phones)
    }

    async fn search_clients(&mut self, query: &ClientQuery) -> Result<Vec<Client>> {
        if !query.has_identity_fields() {
            return Ok(Vec::new());
        }

        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {CLIENT_COLUMNS} FROM client_info WHERE "
        ));
        {
            let mut filters = builder.separated(" OR ");
            let fields = [
                ("first_name", &query.first_name),
                ("surname", &query.surname),
                ("email", &query.email),
            ];
            for (column, value) in fields {
                if let Some(value) = value {
                    filters.push(format!("{column} = "));
                    filters.push_bind_unseparated(value.clone());
                }
            }
        }
        builder.push(" ORDER BY client_id");

        let clients = builder
            .build_query_as::<Client>()
            .fetch_all(&mut *self)
            .await?;

        Ok(clients)
    }

    async fn search_by_phone(&mut self, pattern: &str) -> Result<Vec<Client>> {
        let clients = sqlx::query_as::<_, Client>(
            r#"
            SELECT DISTINCT c.client_id, c.first_name, c.surname, c.email
            FROM client_info c
            JOIN phone p ON p.client_id = c.client_id
            WHERE p.phone_number LIKE $1
            ORDER BY c.client_id
            "#,
        )
        .bind(pattern)
        .fetch_all(&mut *self)
        .await?;

        Ok(clients)
    }
}
