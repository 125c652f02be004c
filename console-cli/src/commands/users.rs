///! User commands

use anyhow::{anyhow, bail, Result};
use tabled::Tabled;

use console_common::auth::{Role, User};
use console_common::user_table::{Passwords, UserRow, UserTable, UserTableState};

use super::{CliDialogs, Context};
use crate::api::ApiClient;
use crate::output;
use crate::UsersCommands;

#[derive(Tabled)]
struct UserRowView {
    #[tabled(rename = "USERNAME")]
    username: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "EMAIL")]
    email: String,
    #[tabled(rename = "ENABLED")]
    enabled: String,
    #[tabled(rename = "ROLE")]
    role: String,
}

impl UserRowView {
    fn new(user: &User, state: &UserTableState) -> Self {
        let name = [user.first_name.as_deref(), user.last_name.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ");
        Self {
            username: user.username.clone(),
            name,
            email: user.email.clone().unwrap_or_default(),
            enabled: if user.enabled { "yes" } else { "no" }.to_string(),
            role: user
                .id
                .as_deref()
                .and_then(|id| state.role_of(id))
                .map(|r| r.name.clone())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

#[derive(Tabled)]
struct RoleRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "NAME")]
    name: String,
    #[tabled(rename = "DESCRIPTION")]
    description: String,
}

impl From<&Role> for RoleRow {
    fn from(role: &Role) -> Self {
        Self {
            id: role.id.clone(),
            name: role.name.clone(),
            description: role.description.clone().unwrap_or_default(),
        }
    }
}

/// Composite role id for a role given by name or id
fn resolve_role(roles: &[Role], wanted: &str) -> Result<String> {
    roles
        .iter()
        .find(|r| r.id == wanted || r.name == wanted)
        .map(|r| r.id.clone())
        .ok_or_else(|| anyhow!("Unknown role '{}'", wanted))
}

/// Ask for the password twice. The repeat is compared by the user table so a
/// typo is rejected before anything is sent.
fn prompt_passwords() -> Result<Passwords> {
    use dialoguer::Password;

    let password = Password::new().with_prompt("Password").interact()?;
    let repeat = Password::new().with_prompt("Repeat password").interact()?;
    Ok(Passwords::new(password, repeat))
}

fn find_user(state: &UserTableState, username: &str) -> Result<User> {
    state
        .users()
        .iter()
        .find(|u| u.username == username)
        .cloned()
        .ok_or_else(|| anyhow!("No user named '{}'", username))
}

fn apply_field(target: &mut Option<String>, value: Option<String>) {
    if value.is_some() {
        *target = value;
    }
}

pub async fn handle_users_command(command: UsersCommands, ctx: &Context) -> Result<()> {
    let yes = matches!(command, UsersCommands::Delete { yes: true, .. });
    let table: UserTable<ApiClient, CliDialogs> =
        UserTable::new(ctx.api.clone(), CliDialogs { assume_yes: yes }, ctx.session());
    table.load().await?;

    match command {
        UsersCommands::List => {
            let state = table.state();
            let rows: Vec<UserRowView> = state.users().iter().map(|u| UserRowView::new(u, &state)).collect();
            output::print_output(rows, &state.users(), ctx.format)?;
        }

        UsersCommands::Roles => {
            let state = table.state();
            let rows: Vec<RoleRow> = state.composite_roles().iter().map(RoleRow::from).collect();
            output::print_output(rows, &state.composite_roles(), ctx.format)?;
        }

        UsersCommands::Create {
            username,
            email,
            first_name,
            last_name,
            role,
            password,
            disabled,
        } => {
            if table.state().users().iter().any(|u| u.username == username) {
                bail!("User '{}' already exists", username);
            }
            let role = match role {
                Some(wanted) => Some(resolve_role(table.state().composite_roles(), &wanted)?),
                None => None,
            };
            let passwords = if password { prompt_passwords()? } else { Passwords::default() };

            let mut user = User::new_enabled();
            user.username = username;
            user.email = email;
            user.first_name = first_name;
            user.last_name = last_name;
            user.enabled = !disabled;

            let created = table.create(UserRow { user, passwords, role }).await?;
            output::print_created(
                "User",
                &created.username,
                created.id.as_deref().unwrap_or_default(),
            );
        }

        UsersCommands::Update {
            username,
            email,
            first_name,
            last_name,
            role,
            password,
            enable,
            disable,
        } => {
            let mut user = find_user(&table.state(), &username)?;
            let role = match role {
                Some(wanted) => {
                    if !table.can_change_role(&user) {
                        bail!("You can't change your own role");
                    }
                    Some(resolve_role(table.state().composite_roles(), &wanted)?)
                }
                None => None,
            };
            let passwords = if password { prompt_passwords()? } else { Passwords::default() };

            apply_field(&mut user.email, email);
            apply_field(&mut user.first_name, first_name);
            apply_field(&mut user.last_name, last_name);
            if enable {
                user.enabled = true;
            } else if disable {
                user.enabled = false;
            }

            table.update(UserRow { user, passwords, role }).await?;
            output::print_success(&format!("User updated: {}", username));
        }

        UsersCommands::Delete { username, .. } => {
            let user = find_user(&table.state(), &username)?;
            if table.delete(&user).await? {
                output::print_success(&format!("User deleted: {}", username));
            } else {
                println!("Deletion cancelled");
            }
        }
    }

    Ok(())
}
