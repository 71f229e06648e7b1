/// A row of `phone`, owned by exactly one client.
#[derive(sqlx::FromRow, Debug, Clone, PartialEq, Eq)]
pub struct Phone {
    pub phone_id: i32,
    pub phone_number: String,
    pub client_id: i32,
}
