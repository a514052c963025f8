//! birthday-book command-line entry point
//!
//! Native only; on wasm32 the library is driven by the host page instead.

#[cfg(not(target_arch = "wasm32"))]
mod cli {
    use std::fs;
    use std::path::PathBuf;

    use anyhow::{Context, Result, bail};
    use chrono::Datelike;
    use clap::{Parser, Subcommand};
    use dialoguer::{Confirm, Password};

    use birthday_book::backup::restore;
    use birthday_book::calendar::{ordinal, today};
    use birthday_book::config::REMOTE_URL_VAR;
    use birthday_book::remote::RemoteBirthday;
    use birthday_book::{
        BirthdayRecord, BirthdayStore, BirthdayView, Config, FileStorage, REMOTE_AUTH_KEY,
        RemoteClient, Session, Storage, backup_file_name, export_backup, rank_today,
    };

    #[derive(Parser)]
    #[command(author, version, about, long_about = None)]
    pub struct Cli {
        /// Directory holding the local store (overrides BIRTHDAY_BOOK_DIR)
        #[arg(long, global = true, value_name = "DIR")]
        data_dir: Option<PathBuf>,

        /// Base URL of the hosted backend (overrides BIRTHDAY_BOOK_REMOTE_URL)
        #[arg(long, global = true, value_name = "URL")]
        remote_url: Option<String>,

        #[command(subcommand)]
        command: Commands,
    }

    #[derive(Subcommand)]
    enum Commands {
        /// Add a birthday, replacing any existing one for the same name
        Add {
            name:  String,
            /// Month number, 1-12
            month: u8,
            day:   u8,
            #[arg(long)]
            year:  Option<u16>,
        },

        /// Show all birthdays grouped by month
        List,

        /// Delete a birthday
        Remove {
            name: String,
            /// Skip the confirmation prompt
            #[arg(short, long)]
            yes:  bool,
        },

        /// Write every birthday to birthday-backup-<date>.json
        Backup {
            /// Directory to write the backup into
            #[arg(short, long, default_value = ".")]
            output: PathBuf,
        },

        /// Replace every birthday with the contents of a backup file
        Restore { file: PathBuf },

        /// Work with the hosted birthdays collection
        #[command(subcommand)]
        Remote(RemoteCommands),
    }

    #[derive(Subcommand)]
    enum RemoteCommands {
        /// Sign in and remember the session
        Login {
            email:    String,
            /// Prompted for when omitted
            #[arg(long)]
            password: Option<String>,
        },

        /// Forget the remembered session
        Logout,

        /// Create an account (does not sign in)
        Register {
            email:    String,
            #[arg(long)]
            password: Option<String>,
        },

        /// List hosted birthdays ordered by date
        List,

        /// Add a hosted birthday
        Add {
            name:     String,
            /// Date in YYYY-MM-DD form
            birthday: String,
        },
    }

    pub async fn run(cli: Cli) -> Result<()> {
        let remote_url = cli.remote_url.as_deref().map(|url| (REMOTE_URL_VAR, url));
        let mut config = Config::from_env_with(remote_url.as_slice())?;
        if let Some(dir) = cli.data_dir {
            config.data_dir = dir;
        }

        let storage = FileStorage::new(&config.data_dir);
        let mut store = BirthdayStore::new(storage.clone());

        match cli.command {
            Commands::Add {
                name,
                month,
                day,
                year,
            } => {
                let record = BirthdayRecord::new(month, day, year)?;
                match store.upsert(&name, record)? {
                    Some(previous) => println!("Updated {name}: {previous} -> {record}"),
                    None => println!("Added {name}: {record}"),
                }
            },
            Commands::List => print_view(&rank_today(&store.load()?)),
            Commands::Remove { name, yes } => {
                if store.get(&name)?.is_none() {
                    println!("No birthday stored for {name}");
                    return Ok(());
                }
                let confirmed = yes
                    || Confirm::new()
                        .with_prompt(format!("Are you sure you want to delete {name}'s birthday?"))
                        .default(false)
                        .interact()?;
                if confirmed && store.remove(&name)? {
                    println!("Deleted {name}");
                }
            },
            Commands::Backup { output } => {
                let map = store.load()?;
                let path = output.join(backup_file_name(today()));
                fs::write(&path, export_backup(&map)?)
                    .with_context(|| format!("Failed to write backup to {}", path.display()))?;
                println!("Saved {} birthdays to {}", map.len(), path.display());
            },
            Commands::Restore { file } => {
                let bytes = fs::read(&file)
                    .with_context(|| format!("Failed to read {}", file.display()))?;
                let map = restore(&mut store, &bytes).with_context(|| {
                    format!(
                        "Failed to restore {}. Please ensure the file is a valid backup",
                        file.display()
                    )
                })?;
                println!("Restored {} birthdays from {}", map.len(), file.display());
            },
            Commands::Remote(command) => run_remote(command, &config, storage).await?,
        }
        Ok(())
    }

    async fn run_remote(
        command: RemoteCommands,
        config: &Config,
        mut storage: FileStorage,
    ) -> Result<()> {
        let mut client = RemoteClient::new(config.remote_url.as_str(), config.timeout)?
            .with_session(load_session(&storage)?);

        match command {
            RemoteCommands::Login { email, password } => {
                let password = password_or_prompt(password, false)?;
                let session = client.authenticate(&email, &password).await?;
                storage.set_item(REMOTE_AUTH_KEY, &serde_json::to_string(session)?)?;
                println!("Signed in as {email}");
            },
            RemoteCommands::Logout => {
                client.logout();
                storage.set_item(REMOTE_AUTH_KEY, "null")?;
                println!("Signed out");
            },
            RemoteCommands::Register { email, password } => {
                let password = password_or_prompt(password, true)?;
                client.register(&email, &password, &password).await?;
                println!("Registered {email}; sign in with `remote login`");
            },
            RemoteCommands::List => {
                let birthdays: Vec<RemoteBirthday> = client.list_birthdays().await?;
                if birthdays.is_empty() {
                    println!("No hosted birthdays yet.");
                }
                for birthday in birthdays {
                    println!("{}  {}", birthday.birthday, birthday.name);
                }
            },
            RemoteCommands::Add { name, birthday } => {
                let created = client.create_birthday(&name, &birthday).await?;
                println!("Created {} ({})", created.name, created.id);
            },
        }
        Ok(())
    }

    fn load_session(storage: &FileStorage) -> Result<Option<Session>> {
        let Some(json) = storage.get_item(REMOTE_AUTH_KEY)? else {
            return Ok(None);
        };
        Ok(serde_json::from_str(&json).unwrap_or_else(|e| {
            log::warn!("Ignoring unreadable remote session: {e}");
            None
        }))
    }

    fn password_or_prompt(password: Option<String>, confirm: bool) -> Result<String> {
        if let Some(password) = password {
            return Ok(password);
        }
        let prompt = Password::new().with_prompt("Password");
        let prompt = if confirm {
            prompt.with_confirmation("Confirm password", "Passwords do not match")
        } else {
            prompt
        };
        let password = prompt.interact()?;
        if password.is_empty() {
            bail!("Password must not be empty");
        }
        Ok(password)
    }

    fn print_view(view: &BirthdayView) {
        if view.is_empty() {
            println!("No birthdays added yet. Add your first one!");
            return;
        }

        for group in &view.groups {
            if group.is_current_month {
                println!("{} (this month)", group.name.to_uppercase());
            } else {
                println!("{}", group.name);
            }
            for entry in &group.entries {
                let marker = if entry.is_today {
                    " 🎂".to_owned()
                } else if let Some(next) = view.next.as_ref().filter(|_| entry.is_next) {
                    match next.days_away {
                        0 => "  <- observed today (no Feb 29 this year)".to_owned(),
                        1 => "  <- next, tomorrow".to_owned(),
                        days => format!("  <- next, in {days} days"),
                    }
                } else {
                    String::new()
                };
                println!("  {:>5}  {}{marker}", entry.ordinal, entry.name);
            }
            println!();
        }

        if view.todays.is_empty() {
            return;
        }
        let names: Vec<&str> = view.todays.iter().map(String::as_str).collect();
        println!(
            "Happy birthday to {} today, the {} of {}!",
            names.join(" and "),
            ordinal(view.today.day()),
            view.groups
                .iter()
                .find(|g| g.is_current_month)
                .map_or("", |g| g.name)
        );
    }
}

#[cfg(not(target_arch = "wasm32"))]
#[tokio::main]
async fn main() -> std::process::ExitCode {
    use clap::Parser;

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match cli::run(cli::Cli::parse()).await {
        Ok(()) => std::process::ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            std::process::ExitCode::FAILURE
        },
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The browser drives the library directly
}
