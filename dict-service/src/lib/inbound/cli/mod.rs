use std::io;
use std::io::BufRead;
use std::io::Write;

use auth::Role;
use clap::Parser;
use clap::Subcommand;

use crate::identity::models::CreateUserCommand;
use crate::identity::models::EmailAddress;
use crate::identity::models::IdentityId;
use crate::identity::models::RegisterCommand;
use crate::identity::models::Username;
use crate::identity::reset::ResetState;
use crate::identity::service::IdentityService;
use crate::lexicon::models::EntryId;
use crate::lexicon::models::Word;
use crate::lexicon::service::LexiconService;
use crate::outbound::email::TracingCodeSender;
use crate::repositories::PostgresIdentityRepository;
use crate::repositories::PostgresLexiconRepository;

type ResetService =
    crate::identity::reset::PasswordResetService<PostgresIdentityRepository, TracingCodeSender>;

/// Concrete services the command handlers dispatch into.
pub struct App {
    pub identities: IdentityService<PostgresIdentityRepository>,
    pub resets: ResetService,
    pub lexicon: LexiconService<PostgresLexiconRepository>,
}

#[derive(Debug, Parser)]
#[command(name = "dict-service", about = "Role-based english/farsi dictionary")]
pub struct Cli {
    /// Session token; most commands require one.
    #[arg(long, env = "DICT_TOKEN", global = true, default_value = "")]
    pub token: String,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Create an account and print a session token.
    Register {
        username: String,
        email: String,
        password: String,
    },
    /// Authenticate and print a session token.
    Login { username: String, password: String },
    /// Reset a forgotten password via an emailed code.
    ResetPassword { email: String },

    /// Farsi translations of an english word.
    EnglishToFarsi { word: String },
    /// English translations of a farsi word.
    FarsiToEnglish { word: String },
    /// Every dictionary entry with its author.
    ListEntries,
    /// Add an entry authored by you.
    AddEntry { english: String, farsi: String },
    /// Edit an entry; `--any` edits entries you did not author (admin).
    EditEntry {
        id: String,
        english: String,
        farsi: String,
        #[arg(long)]
        any: bool,
    },
    /// Delete an entry; `--any` deletes entries you did not author (admin).
    DeleteEntry {
        id: String,
        #[arg(long)]
        any: bool,
    },

    /// All users except yourself (admin).
    ListUsers,
    /// Blocked users (admin).
    ListBlocked,
    /// Unblocked users except yourself (admin).
    ListUnblocked,
    /// Create a user with an explicit role (admin).
    CreateUser {
        username: String,
        email: String,
        password: String,
        role: Role,
        /// Required when the new role is admin: acknowledges your own
        /// demotion to power_user.
        #[arg(long)]
        confirm_admin_downgrade: bool,
    },
    /// Change another user's role (admin).
    ChangeRole {
        user_id: String,
        role: Role,
        #[arg(long)]
        confirm_admin_downgrade: bool,
    },
    /// Block another user's account (admin).
    BlockUser { user_id: String },
    /// Unblock another user's account (admin).
    UnblockUser { user_id: String },
}

/// Dispatch one parsed command against the services.
pub async fn run(app: &App, cli: Cli) -> Result<(), anyhow::Error> {
    let token = cli.token;

    match cli.command {
        Command::Register {
            username,
            email,
            password,
        } => {
            let command = RegisterCommand::new(
                Username::new(username)?,
                EmailAddress::new(email)?,
                password,
            );
            let token = app.identities.register(command).await?;
            println!("Registered. Your session token:\n{token}");
        }
        Command::Login { username, password } => {
            let token = app.identities.login(&username, &password).await?;
            println!("Logged in. Your session token:\n{token}");
        }
        Command::ResetPassword { email } => {
            reset_password(app, &email).await?;
        }

        Command::EnglishToFarsi { word } => {
            let word = Word::new(word)?;
            for translation in app.lexicon.english_to_farsi(&token, &word).await? {
                println!("{}     =>    {}", translation.text, translation.author);
            }
        }
        Command::FarsiToEnglish { word } => {
            let word = Word::new(word)?;
            for translation in app.lexicon.farsi_to_english(&token, &word).await? {
                println!("{} => {}", translation.text, translation.author);
            }
        }
        Command::ListEntries => {
            let entries = app.lexicon.list_entries(&token).await?;
            if entries.is_empty() {
                println!("Dictionary is empty.");
            }
            for entry in entries {
                println!(
                    "{}) {} = {}     =>    {}",
                    entry.id, entry.english, entry.farsi, entry.author
                );
            }
        }
        Command::AddEntry { english, farsi } => {
            let entry = app
                .lexicon
                .add_entry(&token, &Word::new(english)?, &Word::new(farsi)?)
                .await?;
            println!("Entry {} added.", entry.id);
        }
        Command::EditEntry {
            id,
            english,
            farsi,
            any,
        } => {
            let id = EntryId::from_string(&id)?;
            let english = Word::new(english)?;
            let farsi = Word::new(farsi)?;
            if any {
                app.lexicon
                    .edit_any_entry(&token, &id, &english, &farsi)
                    .await?;
            } else {
                app.lexicon
                    .edit_own_entry(&token, &id, &english, &farsi)
                    .await?;
            }
            println!("Entry {id} updated.");
        }
        Command::DeleteEntry { id, any } => {
            let id = EntryId::from_string(&id)?;
            if any {
                app.lexicon.delete_any_entry(&token, &id).await?;
            } else {
                app.lexicon.delete_own_entry(&token, &id).await?;
            }
            println!("Entry {id} deleted.");
        }

        Command::ListUsers => {
            for identity in app.identities.list_users(&token).await? {
                print_identity(&identity);
            }
        }
        Command::ListBlocked => {
            let blocked = app.identities.list_blocked(&token).await?;
            if blocked.is_empty() {
                println!("No blocked users found.");
            }
            for identity in blocked {
                print_identity(&identity);
            }
        }
        Command::ListUnblocked => {
            for identity in app.identities.list_unblocked(&token).await? {
                print_identity(&identity);
            }
        }
        Command::CreateUser {
            username,
            email,
            password,
            role,
            confirm_admin_downgrade,
        } => {
            let command = CreateUserCommand {
                username: Username::new(username)?,
                email: EmailAddress::new(email)?,
                password,
                role,
                confirm_admin_downgrade,
            };
            let created = app.identities.create_user(&token, command).await?;
            if created.role == Role::Admin {
                println!(
                    "User '{}' created as admin. Your role is now power_user.",
                    created.username
                );
            } else {
                println!(
                    "User '{}' created with role '{}'.",
                    created.username, created.role
                );
            }
        }
        Command::ChangeRole {
            user_id,
            role,
            confirm_admin_downgrade,
        } => {
            let target = IdentityId::from_string(&user_id)?;
            app.identities
                .change_role(&token, &target, role, confirm_admin_downgrade)
                .await?;
            if role == Role::Admin {
                println!("Role updated. You are now a power_user.");
            } else {
                println!("Role updated to '{role}'.");
            }
        }
        Command::BlockUser { user_id } => {
            let target = IdentityId::from_string(&user_id)?;
            app.identities.block_user(&token, &target).await?;
            println!("User blocked.");
        }
        Command::UnblockUser { user_id } => {
            let target = IdentityId::from_string(&user_id)?;
            app.identities.unblock_user(&token, &target).await?;
            println!("User unblocked.");
        }
    }

    Ok(())
}

fn print_identity(identity: &crate::identity::models::Identity) {
    println!(
        "{} | {} | {} | {}",
        identity.id, identity.username, identity.email, identity.role
    );
}

/// Interactive flow: code from stdin, then the replacement password.
async fn reset_password(app: &App, email: &str) -> Result<(), anyhow::Error> {
    let mut flow = app.resets.initiate(email).await?;
    let stdin = io::stdin();

    while flow.state() == ResetState::CodeSent {
        print!("Enter the 4-digit code: ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            anyhow::bail!("Input closed; reset aborted.");
        }

        // Unparseable input counts as a wrong code; 0 is outside the code
        // range, so it always mismatches and burns an attempt.
        let code = line.trim().parse::<u16>().unwrap_or(0);
        if flow.verify(code) {
            break;
        }
        if flow.state() == ResetState::CodeSent {
            println!("Wrong code. {} attempt(s) left.", flow.attempts_left());
        }
    }

    if flow.state() != ResetState::Verified {
        anyhow::bail!("Too many wrong codes; start the reset again.");
    }

    print!("New password: ");
    io::stdout().flush()?;
    let mut password = String::new();
    stdin.lock().read_line(&mut password)?;

    let token = app.resets.complete(&mut flow, password.trim()).await?;
    println!("Password updated. Your session token:\n{token}");
    Ok(())
}
