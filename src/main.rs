//! Library Client - command-line front end
//!
//! Each subcommand plays the part of one screen of the library application.

use std::sync::Arc;

use anyhow::{bail, Context};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use library_client::{
    config::AppConfig,
    models::{Book, BookForm, BookQuery, Listing, Transaction},
    navigation::{Navigator, ScreenNavigator, LOGIN_PATH},
    session::FileSessionStore,
    ClientError, Services,
};

#[derive(Debug, Parser)]
#[command(version, about = "Library Management System client")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Sign in and remember the session
    Login {
        username: String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
    /// Create an account and sign in
    Register {
        username: String,
        email: String,
        /// Prompted for when omitted
        #[arg(long)]
        password: Option<String>,
    },
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Browse or search the catalog
    Books {
        /// Search title, author or ISBN
        #[arg(long)]
        search: Option<String>,
        #[arg(long)]
        author: Option<String>,
        /// Browse the full catalog, including books with no copy available
        #[arg(long, conflicts_with_all = ["search", "author"])]
        all: bool,
        #[arg(long, default_value_t = 1)]
        page: u32,
    },
    /// Show one book
    Book { id: i64 },
    /// Borrow a book
    Checkout { book_id: i64 },
    /// Return a borrowed book
    Return { transaction_id: i64 },
    /// Loans currently held, overdue first
    MyBooks,
    /// All past and current loans
    History,
    Profile,
    Dashboard,
    /// Manage the catalog
    Admin {
        #[command(subcommand)]
        action: AdminCommand,
    },
    /// Request a password reset link
    ForgotPassword { email: String },
    /// Set a new password from a reset link
    ResetPassword {
        uid: String,
        token: String,
        #[command(flatten)]
        password: NewPasswordArgs,
    },
    /// Request a 6-digit reset code
    RequestResetCode { email: String },
    /// Set a new password with a reset code
    ResetPasswordCode {
        email: String,
        code: String,
        #[command(flatten)]
        password: NewPasswordArgs,
    },
}

/// New password and its confirmation, prompted for when omitted
#[derive(Debug, Args)]
struct NewPasswordArgs {
    #[arg(long)]
    password: Option<String>,
    #[arg(long, requires = "password")]
    confirm: Option<String>,
}

impl NewPasswordArgs {
    fn resolve(self) -> anyhow::Result<(String, String)> {
        let password = password_or_prompt(self.password, "New password: ")?;
        let confirm = password_or_prompt(self.confirm, "Repeat the password: ")?;
        Ok((password, confirm))
    }
}

fn password_or_prompt(value: Option<String>, prompt: &str) -> anyhow::Result<String> {
    match value {
        Some(password) => Ok(password),
        None => rpassword::prompt_password(prompt).context("Failed to read password"),
    }
}

#[derive(Debug, Subcommand)]
enum AdminCommand {
    Add(BookArgs),
    Edit {
        id: i64,
        #[command(flatten)]
        book: BookArgs,
    },
    Delete { id: i64 },
}

#[derive(Debug, Args)]
struct BookArgs {
    #[arg(long)]
    title: String,
    #[arg(long)]
    author: String,
    #[arg(long)]
    isbn: String,
    /// Publication date, YYYY-MM-DD
    #[arg(long)]
    published: NaiveDate,
    #[arg(long, default_value_t = 1)]
    copies: i32,
}

impl From<BookArgs> for BookForm {
    fn from(args: BookArgs) -> Self {
        Self {
            title: args.title,
            author: args.author,
            isbn: args.isbn,
            published_date: args.published,
            copies_available: args.copies,
        }
    }
}

impl Command {
    /// Screen this command stands for
    fn screen(&self) -> String {
        match self {
            Command::Login { .. } => LOGIN_PATH.to_string(),
            Command::Register { .. } => "/register".to_string(),
            Command::Logout | Command::Whoami => "/".to_string(),
            Command::Books { .. } => "/books".to_string(),
            Command::Book { id } => format!("/books/{}", id),
            Command::Checkout { book_id } => format!("/books/{}", book_id),
            Command::Return { .. } | Command::MyBooks => "/my-books".to_string(),
            Command::History => "/history".to_string(),
            Command::Profile => "/profile".to_string(),
            Command::Dashboard => "/dashboard".to_string(),
            Command::Admin { .. } => "/admin/books".to_string(),
            Command::ForgotPassword { .. } | Command::RequestResetCode { .. } => {
                "/forgot-password".to_string()
            }
            Command::ResetPassword { .. } | Command::ResetPasswordCode { .. } => {
                "/reset-password".to_string()
            }
        }
    }

    /// Screens behind the sign-in guard
    fn requires_login(&self) -> bool {
        matches!(
            self,
            Command::Checkout { .. }
                | Command::Return { .. }
                | Command::MyBooks
                | Command::History
                | Command::Profile
                | Command::Dashboard
                | Command::Admin { .. }
        )
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = AppConfig::load().context("Failed to load configuration")?;
    init_tracing(&config);

    tracing::debug!("Library client v{} against {}", env!("CARGO_PKG_VERSION"), config.api.resolved_base_url());

    let session = Arc::new(
        FileSessionStore::open(&config.session.path).context("Failed to open session store")?,
    );
    let navigator = Arc::new(ScreenNavigator::new(&cli.command.screen()));
    let services = Services::from_config(&config, session, navigator.clone())?;

    let outcome = run(cli.command, &services).await;

    if navigator.redirects().iter().any(|path| path == LOGIN_PATH) {
        eprintln!("Your session has expired. Please log in again.");
    }

    if let Err(e) = outcome {
        match e.downcast_ref::<ClientError>() {
            Some(client_error) => eprintln!("Error: {}", client_error.user_message()),
            None => eprintln!("Error: {:#}", e),
        }
        std::process::exit(1);
    }
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("library_client={}", config.logging.level).into());

    let json = config.logging.format.eq_ignore_ascii_case("json");
    let json_layer = json.then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr));
    let pretty_layer = (!json).then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr));

    tracing_subscriber::registry()
        .with(filter)
        .with(json_layer)
        .with(pretty_layer)
        .init();
}

async fn run(command: Command, services: &Services) -> anyhow::Result<()> {
    let user = services.auth.restore()?;
    if command.requires_login() && user.is_none() {
        bail!("Please log in first (library-client login <username>)");
    }

    let today = Local::now().date_naive();

    match command {
        Command::Login { username, password } => {
            let password = password_or_prompt(password, "Password: ")?;
            let user = services.auth.login(&username, &password).await?;
            println!("Welcome back, {} ({})", user.username, user.role.label());
        }
        Command::Register {
            username,
            email,
            password,
        } => {
            let password = password_or_prompt(password, "Password: ")?;
            let user = services.auth.register(&username, &email, &password).await?;
            println!("Account created. Signed in as {}", user.username);
        }
        Command::Logout => {
            services.auth.logout().await?;
            println!("Signed out.");
        }
        Command::Whoami => match user {
            Some(user) => println!("{} ({})", user.username, user.role.label()),
            None => println!("Not signed in."),
        },
        Command::Books {
            search,
            author,
            all,
            page,
        } => {
            let books = if all {
                services.catalog.list_books_page(page).await?
            } else {
                let mut query = BookQuery::search(search.as_deref().unwrap_or_default()).page(page);
                query.author = author;
                services.catalog.search_available(&query).await?
            };
            print_books(&books);
        }
        Command::Book { id } => {
            let book = services.catalog.get_book(id).await?;
            print_book_detail(&book);
        }
        Command::Checkout { book_id } => {
            let tx = services.loans.checkout(book_id, today).await?;
            match tx.due_date {
                Some(due) => println!("Book checked out successfully! Due {}", due),
                None => println!("Book checked out successfully!"),
            }
        }
        Command::Return { transaction_id } => {
            services.loans.return_book(transaction_id, today).await?;
            println!("Book returned.");
        }
        Command::MyBooks => {
            let (current, overdue) =
                tokio::join!(services.loans.my_books(), services.loans.overdue_books());
            let overdue = overdue?;
            if !overdue.items().is_empty() {
                println!("Overdue:");
                for tx in overdue.items() {
                    print_transaction(tx, today);
                }
                println!();
            }
            let current = current?;
            println!("Borrowed ({}):", current.total());
            for tx in current.items() {
                print_transaction(tx, today);
            }
        }
        Command::History => {
            let history = services.loans.transaction_history().await?;
            if history.items().is_empty() {
                println!("No transactions yet.");
            }
            for tx in history.items() {
                print_transaction(tx, today);
            }
        }
        Command::Profile => {
            let profile = services.profile.my_profile().await?;
            println!("{}", profile.username);
            if let Some(since) = profile.date_of_membership {
                println!("  Member since  {}", since);
            }
            println!("  Email         {}", profile.email.as_deref().unwrap_or("-"));
            println!("  Role          {}", profile.role.label());
            println!("  Loan duration {} days", profile.loan_days());
            println!(
                "  Status        {}",
                if profile.is_active() { "Active" } else { "Inactive" }
            );
        }
        Command::Dashboard => {
            let stats = services.stats.dashboard().await;
            println!("Total books     {}", stats.total_books);
            println!("Available books {}", stats.available_books);
            println!("My books        {}", stats.my_books);
            println!("Overdue books   {}", stats.overdue_books);
        }
        Command::Admin { action } => match action {
            AdminCommand::Add(args) => {
                let book = services.catalog.create_book(&args.into()).await?;
                println!("Created book #{}", book.id);
            }
            AdminCommand::Edit { id, book } => {
                services.catalog.update_book(id, &book.into()).await?;
                println!("Updated book #{}", id);
            }
            AdminCommand::Delete { id } => {
                services.catalog.delete_book(id).await?;
                println!("Deleted book #{}", id);
            }
        },
        Command::ForgotPassword { email } => {
            let response = services.auth.request_password_reset(&email).await?;
            println!("{}", response.message.unwrap_or_default());
        }
        Command::ResetPassword {
            uid,
            token,
            password,
        } => {
            let (password, confirm) = password.resolve()?;
            let message = services
                .auth
                .confirm_password_reset(&uid, &token, &password, &confirm)
                .await?;
            println!("{}", message);
        }
        Command::RequestResetCode { email } => {
            let response = services.auth.request_password_reset_otp(&email).await?;
            println!("{}", response.message.unwrap_or_default());
            if response.suggest_signup == Some(true) {
                println!("Create an account with: library-client register <username> {}", email.trim());
            }
        }
        Command::ResetPasswordCode {
            email,
            code,
            password,
        } => {
            let (password, confirm) = password.resolve()?;
            let message = services
                .auth
                .verify_password_reset_otp(&email, &code, &password, &confirm)
                .await?;
            println!("{}", message);
        }
    }

    Ok(())
}

fn print_books(books: &Listing<Book>) {
    if books.items().is_empty() {
        println!("No books found.");
        return;
    }
    for book in books.items() {
        println!(
            "#{:<5} {} by {} ({} available)",
            book.id, book.title, book.author, book.copies_available
        );
    }
    if books.has_next() {
        println!("... {} books in total, use --page for more", books.total());
    }
}

fn print_book_detail(book: &Book) {
    println!("{}", book.title);
    println!("  Author     {}", book.author);
    println!("  ISBN       {}", book.isbn);
    if let Some(published) = book.published_date {
        println!("  Published  {}", published);
    }
    println!(
        "  Copies     {}{}",
        book.copies_available,
        if book.is_available() { "" } else { " (not available)" }
    );
}

fn print_transaction(tx: &Transaction, today: NaiveDate) {
    let title = tx
        .book
        .title()
        .map(str::to_string)
        .unwrap_or_else(|| format!("book #{}", tx.book.id()));
    let due = tx
        .due_date
        .map(|d| d.to_string())
        .unwrap_or_else(|| "N/A".to_string());
    print!("#{:<5} {:<8} {} (due {})", tx.id, tx.status(today), title, due);
    if tx.penalty() > rust_decimal::Decimal::ZERO {
        print!(" penalty ${:.2}", tx.penalty());
    }
    println!();
}
