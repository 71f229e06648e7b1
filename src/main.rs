use std::fmt::Display;

use anyhow::Result;
use clap::{Parser, Subcommand};
use sqlx::Connection;

use contact_book::{
    Client, ClientQuery, ClientUpdate, Config, ContactBackend, ContactStore, MemoryBackend,
    NewClient, Outcome, Phone, db, logging,
};

#[derive(Parser)]
#[command(name = "contact-book", version, about = "Manage clients and their phone numbers")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the client_info and phone tables if they do not exist
    Init,
    /// Drop both tables and everything in them
    Drop,
    /// Add a new client, optionally with a phone number
    AddClient {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        surname: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: Option<String>,
    },
    /// Add a phone number to an existing client
    AddPhone { client_id: i32, phone: String },
    /// Replace a client's name and email, optionally renumbering one phone
    UpdateClient {
        client_id: i32,
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        surname: String,
        #[arg(long)]
        email: String,
        #[arg(long, requires = "phone")]
        phone_id: Option<i32>,
        #[arg(long, requires = "phone_id")]
        phone: Option<String>,
    },
    /// Delete a single phone number
    DeletePhone { phone: String },
    /// Delete a client and all of their phone numbers
    DeleteClient { client_id: i32 },
    /// Find clients by name, surname or email (any match), or by phone pattern
    Find {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        surname: Option<String>,
        #[arg(long)]
        email: Option<String>,
        /// SQL LIKE pattern, used only when no other field is given
        #[arg(long)]
        phone: Option<String>,
    },
    /// Show a client and their phone numbers
    Show { client_id: i32 },
    /// Replay a sample session against a fresh schema
    Demo {
        /// Run against an in-memory store instead of the database
        #[arg(long)]
        in_memory: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    if let Command::Demo { in_memory: true } = cli.command {
        logging::init("info");
        let mut store = ContactStore::new(MemoryBackend::new());
        return demo(&mut store).await;
    }

    let config = Config::load()?;
    logging::init(&config.log_level);

    let mut conn = db::connect(&config).await?;
    let result = {
        let mut store = ContactStore::new(&mut conn);
        run(cli.command, &mut store).await
    };
    conn.close().await?;

    result
}

async fn run<B: ContactBackend>(command: Command, store: &mut ContactStore<B>) -> Result<()> {
    match command {
        Command::Init => {
            store.initialize_schema().await?;
            println!("Tables client_info and phone created.");
        }
        Command::Drop => {
            store.drop_schema().await?;
            println!("Tables dropped.");
        }
        Command::AddClient {
            first_name,
            surname,
            email,
            phone,
        } => {
            let client = NewClient::new(first_name, surname, email);
            report(store.add_client(client, phone.as_deref()).await?);
        }
        Command::AddPhone { client_id, phone } => {
            report(
                store
                    .add_phone_number(client_id, &phone)
                    .await?
                    .map(|p| format!("Added phone {}", describe_phone(&p))),
            );
        }
        Command::UpdateClient {
            client_id,
            first_name,
            surname,
            email,
            phone_id,
            phone,
        } => {
            let mut update = ClientUpdate::new(first_name, surname, email);
            update.phone_id = phone_id;
            update.phone_number = phone;
            report(store.update_client(client_id, update).await?);
        }
        Command::DeletePhone { phone } => {
            report(
                store
                    .delete_phone_number(&phone)
                    .await?
                    .map(|p| format!("Deleted phone {}", describe_phone(&p))),
            );
        }
        Command::DeleteClient { client_id } => {
            report(store.delete_client(client_id).await?);
        }
        Command::Find {
            first_name,
            surname,
            email,
            phone,
        } => {
            let query = ClientQuery {
                first_name,
                surname,
                email,
                phone_number: phone,
            };
            print_clients(&store.find_client(&query).await?);
        }
        Command::Show { client_id } => match store.find_by_client_id(client_id).await? {
            Some(client) => {
                println!("{}", describe_client(&client));
                for phone in store.list_phone_numbers(client_id).await? {
                    println!("  {}", describe_phone(&phone));
                }
            }
            None => println!("No client with client_id = {client_id}."),
        },
        Command::Demo { .. } => demo(store).await?,
    }

    Ok(())
}

async fn demo<B: ContactBackend>(store: &mut ContactStore<B>) -> Result<()> {
    store.drop_schema().await?;
    store.initialize_schema().await?;

    println!("== add clients");
    for (first_name, surname, email, phone) in [
        ("Ivan", "Ivanov", "ivan@mail.ru", None),
        ("Ivan", "Petrov", "ivanpetrov@mail.ru", None),
        ("Petr", "Petrov", "petr@mail.ru", Some("100")),
        ("Sidr", "Sidorov", "ivan@mail.ru", None),
        ("Sidr", "Sidorov", "sidr@mail.ru", Some("100")),
        ("Sobol", "Sobolev", "sobol@mail.ru", Some("200")),
    ] {
        let client = NewClient::new(first_name, surname, email);
        report(store.add_client(client, phone).await?);
    }

    println!("== add phone numbers");
    let additions = [
        (1, "300"),
        (1, "400"),
        (1, "500"),
        (2, "300"),
        (3, "300"),
        (6, "600"),
    ];
    for (client_id, phone) in additions {
        report(
            store
                .add_phone_number(client_id, phone)
                .await?
                .map(|p| format!("Added phone {}", describe_phone(&p))),
        );
    }

    println!("== update clients");
    let updates = [
        (1, ClientUpdate::new("Ivan1", "Ivanov1", "ivan@mail.ru1")),
        (1, ClientUpdate::new("Ivan1", "Ivanov1", "petr@mail.ru")),
        (6, ClientUpdate::new("Ivan1", "Ivanov1", "ivan@mail.ru1")),
        (1, ClientUpdate::new("Ivan", "Ivanov", "ivan@mail.ru").with_phone(3, "700")),
        (3, ClientUpdate::new("Petr1", "Petrov1", "petr@mail.ru1").with_phone(1, "700")),
    ];
    for (client_id, update) in updates {
        report(store.update_client(client_id, update).await?);
    }

    println!("== delete phone numbers");
    for phone in ["700", "700"] {
        report(
            store
                .delete_phone_number(phone)
                .await?
                .map(|p| format!("Deleted phone {}", describe_phone(&p))),
        );
    }

    println!("== delete clients");
    for client_id in [2, 2] {
        report(store.delete_client(client_id).await?);
    }

    println!("== find clients");
    let queries = [
        ClientQuery::default().first_name("Sobol"),
        ClientQuery::default().first_name("Ivan"),
        ClientQuery::default().surname("Petrov1"),
        ClientQuery::default().email("sobol@mail.ru"),
        ClientQuery::default().first_name("Ivan1"),
        ClientQuery::default().phone_number("400"),
        ClientQuery::default().phone_number("4000"),
    ];
    for query in &queries {
        println!("{query:?}");
        print_clients(&store.find_client(query).await?);
    }

    Ok(())
}

fn report<T: Display>(outcome: Outcome<T>) {
    match outcome {
        Ok(done) => println!("{done}"),
        Err(rejection) => println!("Rejected: {rejection}."),
    }
}

fn print_clients(clients: &[Client]) {
    if clients.is_empty() {
        println!("No client found.");
    }
    for client in clients {
        println!("{}", describe_client(client));
    }
}

fn describe_client(client: &Client) -> String {
    format!(
        "{}: {} {} <{}>",
        client.client_id, client.first_name, client.surname, client.email
    )
}

fn describe_phone(phone: &Phone) -> String {
    format!(
        "{} (phone_id = {}, client_id = {})",
        phone.phone_number, phone.phone_id, phone.client_id
    )
}
