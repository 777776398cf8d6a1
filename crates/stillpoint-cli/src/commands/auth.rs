use std::io::BufRead;

use clap::Subcommand;
use stillpoint_core::backend::{AccountUpdate, Credentials, SignupForm};
use stillpoint_core::Config;

use super::{clear_session, client, print_json, save_session, CmdResult};

#[derive(Subcommand)]
pub enum AuthAction {
    /// Log in and keep the session for later commands
    Login {
        username: String,
        /// Read from stdin when omitted
        #[arg(long, env = "STILLPOINT_PASSWORD", hide_env_values = true)]
        password: Option<String>,
    },
    /// Create an account
    Signup {
        username: String,
        #[arg(long, env = "STILLPOINT_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        #[arg(long)]
        age: Option<u32>,
    },
    /// End the session
    Logout,
    /// Check whether the saved session is still valid
    Verify,
    /// Show the account profile
    Account {
        #[arg(long)]
        json: bool,
    },
    /// Change username, password or age
    UpdateAccount {
        /// Current password, required for any change
        #[arg(long, env = "STILLPOINT_PASSWORD", hide_env_values = true)]
        password: Option<String>,
        #[arg(long)]
        username: Option<String>,
        #[arg(long)]
        new_password: Option<String>,
        #[arg(long)]
        age: Option<u32>,
    },
}

fn password_or_stdin(password: Option<String>) -> Result<String, Box<dyn std::error::Error>> {
    if let Some(password) = password {
        return Ok(password);
    }
    eprint!("password: ");
    let mut line = String::new();
    std::io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        return Err("a password is required".into());
    }
    Ok(password)
}

pub async fn run(action: AuthAction) -> CmdResult {
    let config = Config::load()?;
    match action {
        AuthAction::Login { username, password } => {
            let api = client(&config)?;
            let credentials = Credentials {
                username,
                password: password_or_stdin(password)?,
            };
            let ack = api.login(&credentials).await?;
            save_session(&api)?;
            println!("{}", ack.message.as_deref().unwrap_or("Logged in"));
        }
        AuthAction::Signup {
            username,
            password,
            age,
        } => {
            let form = SignupForm {
                username,
                password: password_or_stdin(password)?,
                age,
            };
            let ack = client(&config)?.signup(&form).await?;
            println!("{}", ack.message.as_deref().unwrap_or("Account created"));
        }
        AuthAction::Logout => {
            let result = client(&config)?.logout().await;
            // The local session goes away even if the backend is unreachable.
            clear_session()?;
            result?;
            println!("Logged out");
        }
        AuthAction::Verify => {
            if client(&config)?.verify().await? {
                println!("Session is valid");
            } else {
                return Err("not logged in".into());
            }
        }
        AuthAction::Account { json } => {
            let account = client(&config)?.account().await?;
            if json {
                return print_json(&account);
            }
            println!("Username: {}", account.username);
            if let Some(age) = account.age {
                println!("Age:      {age}");
            }
        }
        AuthAction::UpdateAccount {
            password,
            username,
            new_password,
            age,
        } => {
            let api = client(&config)?;
            let username = match username {
                Some(name) => name,
                None => api.account().await?.username,
            };
            let update = AccountUpdate {
                username,
                password: password_or_stdin(password)?,
                new_password,
                age,
            };
            let ack = api.update_account(&update).await?;
            println!("{}", ack.message.as_deref().unwrap_or("Account updated"));
        }
    }
    Ok(())
}
