//! DDL for the two contact tables.

pub(super) const CREATE: [&str; 2] = [
    r#"
    CREATE TABLE IF NOT EXISTS client_info (
        client_id  INTEGER     PRIMARY KEY GENERATED ALWAYS AS IDENTITY,
        first_name VARCHAR(20) NOT NULL,
        surname    VARCHAR(30) NOT NULL,
        email      VARCHAR(50) UNIQUE NOT NULL
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS phone (
        phone_id     INTEGER     PRIMARY KEY GENERATED ALWAYS AS IDENTITY,
        phone_number VARCHAR(12) UNIQUE,
        client_id    INTEGER     REFERENCES client_info (client_id)
    )
    "#,
];

// phone references client_info, so it goes first
pub(super) const DROP: [&str; 2] = [
    "DROP TABLE IF EXISTS phone",
    "DROP TABLE IF EXISTS client_info",
];
