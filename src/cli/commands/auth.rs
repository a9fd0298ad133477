use std::io::{self, BufRead, Write};

use clap::Subcommand;
use serde_json::json;

use crate::api::{ApiClient, AuthApi};
use crate::cli::utils::{output_structured, output_success};
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Login to the CRM backend")]
    Login {
        #[arg(help = "Email address")]
        email: String,
        #[arg(long, help = "Password (read from stdin if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Logout and clear the stored session")]
    Logout,

    #[command(about = "Show current authentication status")]
    Status,

    #[command(about = "Show current user information")]
    Whoami,
}

pub async fn handle(cmd: AuthCommands, client: &ApiClient, output_format: OutputFormat) -> anyhow::Result<()> {
    let auth = AuthApi::new(client);

    match cmd {
        AuthCommands::Login { email, password } => {
            let password = match password {
                Some(password) => password,
                None => read_password()?,
            };
            let response = auth.login(&email, &password).await?;
            let who = response
                .user
                .as_ref()
                .map(|u| u.email.clone())
                .unwrap_or(email);
            output_success(
                output_format,
                &format!("Logged in as {}", who),
                Some(json!({ "user": response.user, "token_type": response.token_type })),
            )
        }
        AuthCommands::Logout => {
            let message = if auth.logout()? { "Logged out" } else { "No active session" };
            output_success(output_format, message, None)
        }
        AuthCommands::Status => {
            let authenticated = client.session().credential().is_some();
            match output_format {
                OutputFormat::Text => {
                    if authenticated {
                        println!("Authenticated against {}", client.base_url());
                    } else {
                        println!("Not authenticated (server: {})", client.base_url());
                    }
                }
                _ => output_structured(
                    output_format,
                    &json!({ "authenticated": authenticated, "api_url": client.base_url() }),
                )?,
            }
            Ok(())
        }
        AuthCommands::Whoami => {
            let identity = auth.whoami();
            match (output_format, identity) {
                (OutputFormat::Text, Some(user)) => {
                    println!("{}", user.email);
                    if let Some(name) = &user.name {
                        println!("Name: {}", name);
                    }
                    if let Some(role) = &user.role {
                        println!("Role: {}", role);
                    }
                }
                (OutputFormat::Text, None) => println!("Not logged in"),
                (_, identity) => output_structured(output_format, &json!({ "user": identity }))?,
            }
            Ok(())
        }
    }
}

fn read_password() -> anyhow::Result<String> {
    eprint!("Password: ");
    io::stderr().flush()?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        anyhow::bail!("Password is required");
    }
    Ok(password)
}
