//! Login, logout and whoami.

use std::io::BufRead;
use std::sync::Arc;

use secrecy::SecretString;

use casanet_core::{FileSessionStore, Hub, SessionManager, User};

use crate::cli::{GlobalOpts, LoginArgs};
use crate::config;
use crate::error::CliError;
use crate::output;

use super::util;

fn read_password(from_stdin: bool) -> Result<SecretString, CliError> {
    let password = if from_stdin {
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        line.trim_end_matches(['\r', '\n']).to_owned()
    } else {
        rpassword::prompt_password("Password: ")?
    };
    if password.is_empty() {
        return Err(CliError::Validation {
            field: "password".into(),
            reason: "password cannot be empty".into(),
        });
    }
    Ok(SecretString::from(password))
}

fn user_detail(user: &User) -> String {
    let name = if user.display_name.is_empty() {
        "-"
    } else {
        &user.display_name
    };
    [
        format!("Email: {}", user.email),
        format!("Name:  {name}"),
        format!("Scope: {}", user.scope),
    ]
    .join("\n")
}

pub async fn login(hub: &Hub, args: LoginArgs, global: &GlobalOpts) -> Result<(), CliError> {
    let password = read_password(args.password_stdin)?;
    let user = hub.login(&args.email, &password).await?;
    util::status_line(global, &format!("Logged in to {} as {}", hub.config().url, user.email));
    Ok(())
}

pub async fn logout(hub: &Hub, global: &GlobalOpts) -> Result<(), CliError> {
    hub.logout().await?;
    util::status_line(global, "Logged out");
    Ok(())
}

/// Show the stored session of the active profile without contacting the hub.
pub fn whoami(global: &GlobalOpts) -> Result<(), CliError> {
    let cfg = config::load_config_or_default();
    let profile = config::active_profile_name(global, &cfg);
    let path = config::session_path(&profile);

    let session = SessionManager::new(Arc::new(FileSessionStore::open(path)), true);
    let user = session
        .profile()
        .ok_or_else(|| CliError::NotLoggedIn { profile })?;

    let out = output::render_single(&global.output, &user, user_detail, |u| u.email.clone())?;
    output::print_output(&out, global.quiet);
    Ok(())
}
